#![allow(dead_code)]

use async_trait::async_trait;
use calendar_plugin::error::{store_error, transport_error, PluginResult};
use calendar_plugin::packet::NetworkPacket;
use calendar_plugin::permissions::PermissionCheck;
use calendar_plugin::plugins::calendar::{
    AccountFilter, CalendarStore, CalendarSummary, EventInstance, MemoryStore, StoredCalendar,
};
use calendar_plugin::transport::PacketTransport;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Transport that keeps every packet it is asked to send
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<NetworkPacket>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following send fail
    pub fn fail_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<NetworkPacket> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl PacketTransport for RecordingTransport {
    async fn send_packet(&self, packet: NetworkPacket) -> PluginResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(transport_error("link down"));
        }
        self.sent.lock().await.push(packet);
        Ok(())
    }
}

/// Permission check whose answer can be flipped during a test
#[derive(Debug)]
pub struct SwitchablePermission {
    granted: AtomicBool,
}

impl SwitchablePermission {
    pub fn new(granted: bool) -> Arc<Self> {
        Arc::new(Self {
            granted: AtomicBool::new(granted),
        })
    }

    pub fn set(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

impl PermissionCheck for SwitchablePermission {
    fn has_read_access(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }
}

/// Store wrapper that counts queries and can fail or stall on demand
pub struct FlakyStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: None,
        }
    }

    pub fn failing(inner: MemoryStore) -> Self {
        let store = Self::new(inner);
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    pub fn stalled(inner: MemoryStore, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(inner)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn before_query(&self) -> PluginResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(store_error("provider not running"));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarStore for FlakyStore {
    async fn list_calendars(
        &self,
        filter: Option<&AccountFilter>,
    ) -> PluginResult<Vec<CalendarSummary>> {
        self.before_query().await?;
        self.inner.list_calendars(filter).await
    }

    async fn list_event_instances(
        &self,
        range_start: i64,
        range_end: i64,
    ) -> PluginResult<Vec<EventInstance>> {
        self.before_query().await?;
        self.inner.list_event_instances(range_start, range_end).await
    }
}

/// The single visible primary "Personal" calendar used by most scenarios
pub fn personal_calendar() -> StoredCalendar {
    StoredCalendar {
        id: 1,
        display_name: Some("Personal".to_string()),
        account_name: Some("a@x.com".to_string()),
        account_type: Some("com.google".to_string()),
        owner_account: Some("a@x.com".to_string()),
        visible: true,
        is_primary: true,
    }
}

pub fn event(event_id: i64, begin_time: i64, end_time: i64, title: &str) -> EventInstance {
    EventInstance {
        event_id,
        begin_time,
        end_time,
        title: Some(title.to_string()),
    }
}

/// Store with the Personal calendar, a hidden one and a few events
pub fn sample_store() -> MemoryStore {
    MemoryStore::default()
        .with_calendar(personal_calendar())
        .with_calendar(StoredCalendar {
            id: 2,
            display_name: Some("Birthdays".to_string()),
            account_name: Some("a@x.com".to_string()),
            account_type: Some("com.google".to_string()),
            owner_account: Some("a@x.com".to_string()),
            visible: false,
            is_primary: false,
        })
        .with_instance(event(10, 1_000, 2_000, "Standup"))
        .with_instance(event(11, 5_000, 6_000, "Lunch"))
}
