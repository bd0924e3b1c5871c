use super::actor::{CalendarActor, CalendarActorHandle, DispatchOutcome};
use super::query::QueryEngine;
use super::stats::{DispatchStats, StatsSnapshot};
use super::store::CalendarStore;
use crate::error::PluginResult;
use crate::packet::NetworkPacket;
use crate::permissions::PermissionCheck;
use crate::transport::PacketTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Settings the dispatcher needs from the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Upper bound for one store query
    pub store_timeout: Duration,
    /// Event window used when a request names no range
    pub event_window_days: i64,
}

/// Handle for interacting with the calendar actor
#[derive(Clone)]
pub struct CalendarHandle {
    actor_handle: CalendarActorHandle,
    stats: Arc<DispatchStats>,
    _actor_task: Arc<JoinHandle<()>>,
}

impl CalendarHandle {
    /// Create a new CalendarHandle and spawn the actor
    pub fn new(
        settings: DispatcherSettings,
        store: Arc<dyn CalendarStore>,
        permissions: Arc<dyn PermissionCheck>,
        transport: Arc<dyn PacketTransport>,
    ) -> Self {
        let stats = Arc::new(DispatchStats::new());
        let engine = QueryEngine::new(store, settings.store_timeout);

        // Create the actor and get its handle
        let (mut actor, handle) = CalendarActor::new(
            engine,
            permissions,
            transport,
            settings.event_window_days,
            Arc::clone(&stats),
        );

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            stats,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Handle one inbound packet
    pub async fn dispatch(&self, packet: NetworkPacket) -> PluginResult<DispatchOutcome> {
        self.actor_handle.dispatch(packet).await
    }

    /// Get the dispatcher counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> PluginResult<()> {
        self.actor_handle.shutdown().await
    }

    /// Wait until the actor loop has exited
    pub async fn stopped(&self) {
        self.actor_handle.stopped().await
    }
}
