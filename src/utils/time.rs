use crate::error::{request_error, PluginResult};
use crate::plugins::calendar::models::TimeRange;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Window starting at `now` and lasting `days` days, in epoch milliseconds
pub fn window_from(now: DateTime<Utc>, days: i64) -> PluginResult<TimeRange> {
    let end = Duration::try_days(days)
        .and_then(|length| now.checked_add_signed(length))
        .ok_or_else(|| request_error(&format!("Event window of {} days is out of range", days)))?;

    TimeRange::new(now.timestamp_millis(), end.timestamp_millis())
}

/// Convert epoch milliseconds to a UTC datetime
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Render epoch milliseconds for log output
pub fn format_millis(millis: i64) -> String {
    match millis_to_datetime(millis) {
        Some(dt) => dt.to_rfc3339(),
        None => format!("{}ms", millis),
    }
}
