//! Read-only access to the local calendar store.
//!
//! Stores apply the selection rules themselves: an account filter matches on
//! all three account fields, an unfiltered listing returns only visible primary
//! calendars, and event instances are selected by inclusive overlap with the
//! requested window. Permission checks are not the store's concern.

use super::models::{AccountFilter, CalendarSummary, EventInstance};
use crate::error::{store_error, PluginResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Source of calendar metadata and event instances
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// List calendars, either the visible primary ones or those matching `filter`
    async fn list_calendars(
        &self,
        filter: Option<&AccountFilter>,
    ) -> PluginResult<Vec<CalendarSummary>>;

    /// List event instances intersecting `[range_start, range_end]`
    async fn list_event_instances(
        &self,
        range_start: i64,
        range_end: i64,
    ) -> PluginResult<Vec<EventInstance>>;
}

/// A calendar row as kept in the store, including the columns used for selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoredCalendar {
    pub id: i64,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub owner_account: Option<String>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub is_primary: bool,
}

impl StoredCalendar {
    /// Project the row onto the fields sent to the remote device
    pub fn summary(&self) -> CalendarSummary {
        CalendarSummary {
            calendar_id: self.id,
            display_name: self.display_name.clone(),
            account_name: self.account_name.clone(),
            owner_name: self.owner_account.clone(),
        }
    }

    fn is_selected_by(&self, filter: Option<&AccountFilter>) -> bool {
        match filter {
            Some(filter) => filter.matches(
                self.account_name.as_deref(),
                self.account_type.as_deref(),
                self.owner_account.as_deref(),
            ),
            None => self.visible && self.is_primary,
        }
    }
}

/// Full contents of a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreContents {
    #[serde(default)]
    pub calendars: Vec<StoredCalendar>,
    #[serde(default)]
    pub instances: Vec<EventInstance>,
}

impl StoreContents {
    fn select_calendars(&self, filter: Option<&AccountFilter>) -> Vec<CalendarSummary> {
        self.calendars
            .iter()
            .filter(|row| row.is_selected_by(filter))
            .map(StoredCalendar::summary)
            .collect()
    }

    fn select_instances(&self, range_start: i64, range_end: i64) -> Vec<EventInstance> {
        self.instances
            .iter()
            .filter(|instance| instance.overlaps(range_start, range_end))
            .cloned()
            .collect()
    }
}

/// Store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: StoreContents,
}

impl MemoryStore {
    /// Create a store from existing contents
    pub fn new(contents: StoreContents) -> Self {
        Self { contents }
    }

    /// Add a calendar row
    pub fn with_calendar(mut self, calendar: StoredCalendar) -> Self {
        self.contents.calendars.push(calendar);
        self
    }

    /// Add an event instance row
    pub fn with_instance(mut self, instance: EventInstance) -> Self {
        self.contents.instances.push(instance);
        self
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn list_calendars(
        &self,
        filter: Option<&AccountFilter>,
    ) -> PluginResult<Vec<CalendarSummary>> {
        Ok(self.contents.select_calendars(filter))
    }

    async fn list_event_instances(
        &self,
        range_start: i64,
        range_end: i64,
    ) -> PluginResult<Vec<EventInstance>> {
        Ok(self.contents.select_instances(range_start, range_end))
    }
}

/// Store backed by a JSON document on disk, re-read on every query
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn open(&self) -> PluginResult<StoreContents> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            store_error(&format!("Unable to open {:?}: {}", self.path, e))
        })?;

        let contents: StoreContents = serde_json::from_str(&content).map_err(|e| {
            store_error(&format!("Unable to parse {:?}: {}", self.path, e))
        })?;

        debug!(
            "Loaded {} calendars and {} instances from {:?}",
            contents.calendars.len(),
            contents.instances.len(),
            self.path
        );
        Ok(contents)
    }
}

#[async_trait]
impl CalendarStore for JsonFileStore {
    async fn list_calendars(
        &self,
        filter: Option<&AccountFilter>,
    ) -> PluginResult<Vec<CalendarSummary>> {
        Ok(self.open().await?.select_calendars(filter))
    }

    async fn list_event_instances(
        &self,
        range_start: i64,
        range_end: i64,
    ) -> PluginResult<Vec<EventInstance>> {
        Ok(self.open().await?.select_instances(range_start, range_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn calendar(id: i64, account: &str, visible: bool, is_primary: bool) -> StoredCalendar {
        StoredCalendar {
            id,
            display_name: Some(format!("Calendar {}", id)),
            account_name: Some(account.to_string()),
            account_type: Some("com.google".to_string()),
            owner_account: Some(account.to_string()),
            visible,
            is_primary,
        }
    }

    fn instance(event_id: i64, begin_time: i64, end_time: i64) -> EventInstance {
        EventInstance {
            event_id,
            begin_time,
            end_time,
            title: Some(format!("Event {}", event_id)),
        }
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let store = MemoryStore::default();
        assert!(store.list_calendars(None).await.unwrap().is_empty());
        assert!(store.list_event_instances(0, i64::MAX).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_listing_needs_visible_and_primary() {
        let store = MemoryStore::default()
            .with_calendar(calendar(1, "a@x.com", true, true))
            .with_calendar(calendar(2, "a@x.com", false, true))
            .with_calendar(calendar(3, "a@x.com", true, false))
            .with_calendar(calendar(4, "b@x.com", true, true));

        let ids: Vec<i64> = store
            .list_calendars(None)
            .await
            .unwrap()
            .iter()
            .map(|c| c.calendar_id)
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[tokio::test]
    async fn test_filtered_listing_ignores_visibility() {
        let store = MemoryStore::default()
            .with_calendar(calendar(1, "a@x.com", true, true))
            .with_calendar(calendar(2, "a@x.com", false, false))
            .with_calendar(calendar(3, "b@x.com", true, true));

        let filter = AccountFilter::new("a@x.com", "com.google", "a@x.com");
        let ids: Vec<i64> = store
            .list_calendars(Some(&filter))
            .await
            .unwrap()
            .iter()
            .map(|c| c.calendar_id)
            .collect();
        assert_eq!(ids, vec![1, 2]);

        let nobody = AccountFilter::new("z@x.com", "com.google", "z@x.com");
        assert!(store.list_calendars(Some(&nobody)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_instances_selected_by_overlap() {
        let store = MemoryStore::default()
            .with_instance(instance(1, 0, 50))
            .with_instance(instance(2, 90, 110))
            .with_instance(instance(3, 150, 160))
            .with_instance(instance(4, 200, 300));

        let ids: Vec<i64> = store
            .list_event_instances(100, 200)
            .await
            .unwrap()
            .iter()
            .map(|e| e.event_id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_file_store_reads_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.json");
        std::fs::write(
            &path,
            r#"{
                "calendars": [
                    {"id": 1, "displayName": "Personal", "accountName": "a@x.com",
                     "accountType": "com.google", "ownerAccount": "a@x.com",
                     "visible": true, "isPrimary": true},
                    {"id": 2, "displayName": "Holidays", "visible": true}
                ],
                "instances": [
                    {"eventId": 7, "beginTime": 1000, "endTime": 2000, "title": null}
                ]
            }"#,
        )
        .unwrap();

        let store = JsonFileStore::new(&path);
        let calendars = store.list_calendars(None).await.unwrap();
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].display_name.as_deref(), Some("Personal"));
        assert_eq!(calendars[0].owner_name.as_deref(), Some("a@x.com"));

        let events = store.list_event_instances(1500, 1600).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, None);
    }

    #[tokio::test]
    async fn test_file_store_rereads_on_every_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.json");
        std::fs::write(&path, r#"{"calendars": []}"#).unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.list_calendars(None).await.unwrap().is_empty());

        std::fs::write(
            &path,
            r#"{"calendars": [{"id": 5, "visible": true, "isPrimary": true}]}"#,
        )
        .unwrap();
        assert_eq!(store.list_calendars(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();

        let missing = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(matches!(
            missing.list_calendars(None).await,
            Err(Error::StoreUnavailable(_))
        ));

        let corrupt_path = dir.path().join("corrupt.json");
        std::fs::write(&corrupt_path, "[1, 2").unwrap();
        let corrupt = JsonFileStore::new(&corrupt_path);
        assert!(matches!(
            corrupt.list_event_instances(0, 1).await,
            Err(Error::StoreUnavailable(_))
        ));
    }
}
