mod actor;
pub mod codec;
mod handle;
pub mod models;
mod query;
mod stats;
pub mod store;

pub use actor::DispatchOutcome;
pub use handle::{CalendarHandle, DispatcherSettings};
pub use models::{AccountFilter, CalendarRequest, CalendarResponse, CalendarSummary, EventInstance, TimeRange};
pub use query::QueryEngine;
pub use stats::StatsSnapshot;
pub use store::{CalendarStore, JsonFileStore, MemoryStore, StoreContents, StoredCalendar};

use crate::config::Config;
use crate::error::PluginResult;
use crate::packet::NetworkPacket;
use crate::permissions::{Permission, PermissionCheck};
use crate::transport::PacketTransport;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Calendar plugin exposing the local calendar store to the paired device
pub struct CalendarPlugin {
    store: Arc<dyn CalendarStore>,
    permissions: Arc<dyn PermissionCheck>,
    handle: RwLock<Option<CalendarHandle>>,
}

impl CalendarPlugin {
    /// Create a new calendar plugin
    pub fn new(store: Arc<dyn CalendarStore>, permissions: Arc<dyn PermissionCheck>) -> Self {
        Self {
            store,
            permissions,
            handle: RwLock::new(None),
        }
    }

    /// Get the handle if the plugin has been initialized
    pub async fn get_handle(&self) -> Option<CalendarHandle> {
        let handle_lock = self.handle.read().await;
        handle_lock.clone()
    }
}

#[async_trait]
impl super::Plugin for CalendarPlugin {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn display_name(&self) -> &'static str {
        "Calendar"
    }

    fn description(&self) -> &'static str {
        "Share calendars and upcoming events with the paired device"
    }

    fn supported_packet_types(&self) -> &'static [&'static str] {
        codec::SUPPORTED_PACKET_TYPES
    }

    fn outgoing_packet_types(&self) -> &'static [&'static str] {
        codec::OUTGOING_PACKET_TYPES
    }

    fn required_permissions(&self) -> &'static [Permission] {
        // Write is declared for future use; nothing writes yet
        &[Permission::ReadCalendar, Permission::WriteCalendar]
    }

    async fn init(
        &self,
        config: Arc<RwLock<Config>>,
        transport: Arc<dyn PacketTransport>,
    ) -> PluginResult<()> {
        let settings = {
            let config_read = config.read().await;
            DispatcherSettings {
                store_timeout: config_read.store_timeout(),
                event_window_days: config_read.event_window_days,
            }
        };

        // Create a new handle if one doesn't exist
        let mut handle_lock = self.handle.write().await;
        if handle_lock.is_none() {
            *handle_lock = Some(CalendarHandle::new(
                settings,
                Arc::clone(&self.store),
                Arc::clone(&self.permissions),
                transport,
            ));
        }

        Ok(())
    }

    async fn on_packet_received(&self, packet: NetworkPacket) -> PluginResult<bool> {
        let Some(handle) = self.get_handle().await else {
            warn!(
                "Calendar plugin not initialized, ignoring {}",
                packet.packet_type()
            );
            return Ok(false);
        };

        let outcome = handle.dispatch(packet).await?;
        Ok(outcome.is_handled())
    }

    async fn shutdown(&self) -> PluginResult<()> {
        // Shutdown the handle if it exists
        let mut handle_lock = self.handle.write().await;
        if let Some(handle) = handle_lock.take() {
            handle.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
