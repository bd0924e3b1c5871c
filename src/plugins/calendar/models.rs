use crate::error::{request_error, PluginResult};
use serde::{Deserialize, Serialize, Serializer};

/// Snapshot of one calendar row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSummary {
    pub calendar_id: i64,
    #[serde(serialize_with = "empty_if_none", default)]
    pub display_name: Option<String>,
    #[serde(serialize_with = "empty_if_none", default)]
    pub account_name: Option<String>,
    #[serde(serialize_with = "empty_if_none", default)]
    pub owner_name: Option<String>,
}

/// One occurrence of an event inside a queried window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventInstance {
    pub event_id: i64,
    /// Epoch milliseconds
    pub begin_time: i64,
    /// Epoch milliseconds
    pub end_time: i64,
    #[serde(serialize_with = "empty_if_none", default)]
    pub title: Option<String>,
}

impl EventInstance {
    /// An instance must not end before it begins
    pub fn is_well_formed(&self) -> bool {
        self.begin_time <= self.end_time
    }

    /// Inclusive intersection test against a range
    pub fn overlaps(&self, range_start: i64, range_end: i64) -> bool {
        self.begin_time <= range_end && self.end_time >= range_start
    }
}

/// Exact-match account selector for calendars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFilter {
    pub account_name: String,
    pub account_type: String,
    pub owner_account: String,
}

impl AccountFilter {
    pub fn new(
        account_name: impl Into<String>,
        account_type: impl Into<String>,
        owner_account: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_type: account_type.into(),
            owner_account: owner_account.into(),
        }
    }

    /// All three fields must be equal; a missing stored field never matches
    pub fn matches(
        &self,
        account_name: Option<&str>,
        account_type: Option<&str>,
        owner_account: Option<&str>,
    ) -> bool {
        account_name == Some(self.account_name.as_str())
            && account_type == Some(self.account_type.as_str())
            && owner_account == Some(self.owner_account.as_str())
    }
}

/// Closed time window in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Create a range, rejecting one that ends before it starts
    pub fn new(start: i64, end: i64) -> PluginResult<Self> {
        if start > end {
            return Err(request_error(&format!(
                "Range start {} is after range end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }
}

/// A query against the calendar store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarRequest {
    /// Visible primary calendars
    ListAllCalendars,
    /// Calendars owned by one account
    ListCalendarsByAccount(AccountFilter),
    /// Event instances intersecting a window
    ListEvents(TimeRange),
}

/// Result of a [`CalendarRequest`], in the store's natural order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarResponse {
    Calendars(Vec<CalendarSummary>),
    Events(Vec<EventInstance>),
}

impl CalendarResponse {
    /// Take the calendars out of the response, if this is a calendar listing
    pub fn into_calendars(self) -> Option<Vec<CalendarSummary>> {
        match self {
            CalendarResponse::Calendars(calendars) => Some(calendars),
            CalendarResponse::Events(_) => None,
        }
    }

    /// Take the events out of the response, if this is an event listing
    pub fn into_events(self) -> Option<Vec<EventInstance>> {
        match self {
            CalendarResponse::Events(events) => Some(events),
            CalendarResponse::Calendars(_) => None,
        }
    }
}

/// Absent text is sent as an empty string so the row shape stays fixed
fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}
