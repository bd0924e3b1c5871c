use super::models::{CalendarRequest, CalendarResponse};
use super::store::CalendarStore;
use crate::error::{store_error, PluginResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Resolves calendar requests against a store
///
/// Every call goes to the store; nothing is cached between requests. Each store
/// call is bounded by `store_timeout` so an unresponsive store cannot stall the
/// dispatcher.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn CalendarStore>,
    store_timeout: Duration,
}

impl QueryEngine {
    /// Create a new query engine over a store
    pub fn new(store: Arc<dyn CalendarStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Execute one request
    pub async fn execute(&self, request: &CalendarRequest) -> PluginResult<CalendarResponse> {
        match request {
            CalendarRequest::ListAllCalendars => self
                .bounded(self.store.list_calendars(None))
                .await
                .map(CalendarResponse::Calendars),
            CalendarRequest::ListCalendarsByAccount(filter) => self
                .bounded(self.store.list_calendars(Some(filter)))
                .await
                .map(CalendarResponse::Calendars),
            CalendarRequest::ListEvents(range) => self
                .bounded(self.store.list_event_instances(range.start(), range.end()))
                .await
                .map(CalendarResponse::Events),
        }
    }

    async fn bounded<T>(&self, query: impl Future<Output = PluginResult<T>>) -> PluginResult<T> {
        timeout(self.store_timeout, query).await.map_err(|_| {
            store_error(&format!(
                "Store query timed out after {}ms",
                self.store_timeout.as_millis()
            ))
        })?
    }
}
