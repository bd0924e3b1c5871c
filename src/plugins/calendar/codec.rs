//! Mapping between calendar packets and typed requests/responses.

use super::models::{AccountFilter, CalendarSummary, EventInstance, TimeRange};
use crate::error::{encoding_error, request_error, Error, PluginResult};
use crate::packet::NetworkPacket;
use serde_json::Value;
use std::collections::HashSet;

pub const PACKET_TYPE_REQUEST_ALL_CALENDARS: &str = "kdeconnect.calendar.request_all_calendars";
pub const PACKET_TYPE_RESPONSE_CALENDARS: &str = "kdeconnect.calendar.response_calendars";
pub const PACKET_TYPE_REQUEST_ALL_EVENTS: &str = "kdeconnect.calendar.request_all_events";
pub const PACKET_TYPE_RESPONSE_EVENTS: &str = "kdeconnect.calendar.response_events";

/// Packet types this plugin answers
pub const SUPPORTED_PACKET_TYPES: &[&str] = &[
    PACKET_TYPE_REQUEST_ALL_CALENDARS,
    PACKET_TYPE_REQUEST_ALL_EVENTS,
];

/// Packet types this plugin sends
pub const OUTGOING_PACKET_TYPES: &[&str] =
    &[PACKET_TYPE_RESPONSE_CALENDARS, PACKET_TYPE_RESPONSE_EVENTS];

// Body keys shared by requests
const KEY_ACCOUNT_NAME: &str = "accountName";
const KEY_ACCOUNT_TYPE: &str = "accountType";
const KEY_OWNER_ACCOUNT: &str = "ownerAccount";
const KEY_RANGE_START: &str = "rangeStart";
const KEY_RANGE_END: &str = "rangeEnd";

// Body keys of responses
const KEY_CALENDARS_ALL: &str = "calendars1";
const KEY_CALENDARS_BY_ACCOUNT: &str = "calendars2";
const KEY_EVENTS: &str = "events";

/// An inbound calendar request packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketRequest {
    /// Calendars, calendars of one account, and events in one response
    AllCalendars {
        account: Option<AccountFilter>,
        range: Option<TimeRange>,
    },
    /// Events only
    AllEvents { range: Option<TimeRange> },
}

impl PacketRequest {
    /// Wire type of this request
    pub fn packet_type(&self) -> &'static str {
        match self {
            PacketRequest::AllCalendars { .. } => PACKET_TYPE_REQUEST_ALL_CALENDARS,
            PacketRequest::AllEvents { .. } => PACKET_TYPE_REQUEST_ALL_EVENTS,
        }
    }
}

/// Observability hook for rows dropped during encoding
pub trait RowSkipHook: Send + Sync {
    /// Called once for every row left out of a response
    fn row_skipped(&self, field: &str, error: &Error);
}

/// Hook that ignores skipped rows
pub struct IgnoreSkippedRows;

impl RowSkipHook for IgnoreSkippedRows {
    fn row_skipped(&self, _field: &str, _error: &Error) {}
}

/// Decode an inbound packet into a request
///
/// Unknown packet types yield [`Error::UnsupportedRequest`]; known types with bad
/// parameters yield [`Error::MalformedRequest`].
pub fn decode_request(packet: &NetworkPacket) -> PluginResult<PacketRequest> {
    match packet.packet_type() {
        PACKET_TYPE_REQUEST_ALL_CALENDARS => Ok(PacketRequest::AllCalendars {
            account: decode_account(packet)?,
            range: decode_range(packet)?,
        }),
        PACKET_TYPE_REQUEST_ALL_EVENTS => Ok(PacketRequest::AllEvents {
            range: decode_range(packet)?,
        }),
        other => Err(Error::UnsupportedRequest(other.to_string())),
    }
}

/// Encode a request into a packet, as the paired device would send it
pub fn encode_request(request: &PacketRequest) -> NetworkPacket {
    let mut packet = NetworkPacket::new(request.packet_type());

    let range = match request {
        PacketRequest::AllCalendars { account, range } => {
            if let Some(filter) = account {
                packet.set(KEY_ACCOUNT_NAME, filter.account_name.clone());
                packet.set(KEY_ACCOUNT_TYPE, filter.account_type.clone());
                packet.set(KEY_OWNER_ACCOUNT, filter.owner_account.clone());
            }
            range
        }
        PacketRequest::AllEvents { range } => range,
    };

    if let Some(range) = range {
        packet.set(KEY_RANGE_START, range.start());
        packet.set(KEY_RANGE_END, range.end());
    }

    packet
}

/// Build the `response_calendars` packet
pub fn encode_calendars_response(
    all_calendars: &[CalendarSummary],
    account_calendars: &[CalendarSummary],
    events: &[EventInstance],
    hook: &dyn RowSkipHook,
) -> NetworkPacket {
    let mut packet = NetworkPacket::new(PACKET_TYPE_RESPONSE_CALENDARS);
    packet.set(KEY_CALENDARS_ALL, encode_calendars(KEY_CALENDARS_ALL, all_calendars, hook));
    packet.set(
        KEY_CALENDARS_BY_ACCOUNT,
        encode_calendars(KEY_CALENDARS_BY_ACCOUNT, account_calendars, hook),
    );
    packet.set(KEY_EVENTS, encode_events(events, hook));
    packet
}

/// Build the `response_events` packet
pub fn encode_events_response(events: &[EventInstance], hook: &dyn RowSkipHook) -> NetworkPacket {
    let mut packet = NetworkPacket::new(PACKET_TYPE_RESPONSE_EVENTS);
    packet.set(KEY_EVENTS, encode_events(events, hook));
    packet
}

/// Encode a calendar sequence, dropping rows whose id was already sent
pub fn encode_calendars(field: &str, calendars: &[CalendarSummary], hook: &dyn RowSkipHook) -> Value {
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(calendars.len());

    for calendar in calendars {
        let row = if seen.insert(calendar.calendar_id) {
            serde_json::to_value(calendar).map_err(|e| {
                encoding_error(&format!("calendar {}: {}", calendar.calendar_id, e))
            })
        } else {
            Err(encoding_error(&format!(
                "duplicate calendarId {}",
                calendar.calendar_id
            )))
        };

        match row {
            Ok(row) => rows.push(row),
            Err(e) => hook.row_skipped(field, &e),
        }
    }

    Value::Array(rows)
}

/// Encode an event sequence, dropping instances that end before they begin
pub fn encode_events(events: &[EventInstance], hook: &dyn RowSkipHook) -> Value {
    let mut rows = Vec::with_capacity(events.len());

    for event in events {
        match encode_event(event) {
            Ok(row) => rows.push(row),
            Err(e) => hook.row_skipped(KEY_EVENTS, &e),
        }
    }

    Value::Array(rows)
}

fn encode_event(event: &EventInstance) -> PluginResult<Value> {
    if !event.is_well_formed() {
        return Err(encoding_error(&format!(
            "event {} ends at {} before it begins at {}",
            event.event_id, event.end_time, event.begin_time
        )));
    }

    serde_json::to_value(event)
        .map_err(|e| encoding_error(&format!("event {}: {}", event.event_id, e)))
}

/// Decode the calendars of a `response_calendars` packet field
pub fn decode_calendars(packet: &NetworkPacket, field: &str) -> PluginResult<Vec<CalendarSummary>> {
    match packet.get(field) {
        Some(value) => Ok(serde_json::from_value(value.clone())?),
        None => Ok(Vec::new()),
    }
}

/// Decode the events of a response packet
pub fn decode_events(packet: &NetworkPacket) -> PluginResult<Vec<EventInstance>> {
    match packet.get(KEY_EVENTS) {
        Some(value) => Ok(serde_json::from_value(value.clone())?),
        None => Ok(Vec::new()),
    }
}

fn decode_account(packet: &NetworkPacket) -> PluginResult<Option<AccountFilter>> {
    let fields = [
        optional_str(packet, KEY_ACCOUNT_NAME)?,
        optional_str(packet, KEY_ACCOUNT_TYPE)?,
        optional_str(packet, KEY_OWNER_ACCOUNT)?,
    ];

    match fields {
        [Some(name), Some(account_type), Some(owner)] => {
            Ok(Some(AccountFilter::new(name, account_type, owner)))
        }
        [None, None, None] => Ok(None),
        _ => Err(request_error(
            "accountName, accountType and ownerAccount must be given together",
        )),
    }
}

fn decode_range(packet: &NetworkPacket) -> PluginResult<Option<TimeRange>> {
    match (
        optional_i64(packet, KEY_RANGE_START)?,
        optional_i64(packet, KEY_RANGE_END)?,
    ) {
        (Some(start), Some(end)) => TimeRange::new(start, end).map(Some),
        (None, None) => Ok(None),
        _ => Err(request_error("rangeStart and rangeEnd must be given together")),
    }
}

fn optional_str<'a>(packet: &'a NetworkPacket, key: &str) -> PluginResult<Option<&'a str>> {
    if !packet.has(key) {
        return Ok(None);
    }
    packet
        .get_str(key)
        .map(Some)
        .ok_or_else(|| request_error(&format!("{} must be a string", key)))
}

fn optional_i64(packet: &NetworkPacket, key: &str) -> PluginResult<Option<i64>> {
    if !packet.has(key) {
        return Ok(None);
    }
    packet
        .get_i64(key)
        .map(Some)
        .ok_or_else(|| request_error(&format!("{} must be an integer", key)))
}
