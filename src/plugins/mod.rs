use crate::config::Config;
use crate::error::PluginResult;
use crate::packet::NetworkPacket;
use crate::permissions::{GrantedPermissions, Permission};
use crate::transport::PacketTransport;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

// Export plugins
pub mod calendar;

// Re-export the calendar plugin
pub use calendar::CalendarPlugin;

/// Plugin trait that all plugins must implement
#[async_trait]
pub trait Plugin: Send + Sync + Any {
    /// Get the name of the plugin, used as its configuration key
    fn name(&self) -> &'static str;

    /// Human readable name
    fn display_name(&self) -> &'static str;

    /// Human readable description
    fn description(&self) -> &'static str;

    /// Packet types this plugin accepts
    fn supported_packet_types(&self) -> &'static [&'static str];

    /// Packet types this plugin may send
    fn outgoing_packet_types(&self) -> &'static [&'static str];

    /// Capabilities the host must grant
    fn required_permissions(&self) -> &'static [Permission];

    /// Initialize the plugin
    async fn init(
        &self,
        config: Arc<RwLock<Config>>,
        transport: Arc<dyn PacketTransport>,
    ) -> PluginResult<()>;

    /// Handle an inbound packet, returning whether it was handled
    async fn on_packet_received(&self, packet: NetworkPacket) -> PluginResult<bool>;

    /// Shutdown the plugin
    async fn shutdown(&self) -> PluginResult<()>;

    /// Convert to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Manager for all plugins
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
    config: Arc<RwLock<Config>>,
    transport: Arc<dyn PacketTransport>,
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugin_count", &self.plugins.len())
            .field("config", &self.config)
            .finish()
    }
}

impl PluginManager {
    /// Create a new plugin manager
    pub fn new(config: Arc<RwLock<Config>>, transport: Arc<dyn PacketTransport>) -> Self {
        Self {
            plugins: Vec::new(),
            config,
            transport,
        }
    }

    /// Register a plugin
    pub fn register<T: Plugin + 'static>(&mut self, plugin: T) {
        info!("Registering plugin: {}", plugin.name());
        self.plugins.push(Box::new(plugin));
    }

    /// Initialize all enabled plugins
    pub async fn init_all(&self) -> PluginResult<()> {
        let (enabled, granted) = {
            let config = self.config.read().await;
            let enabled: Vec<bool> = self
                .plugins
                .iter()
                .map(|p| config.is_plugin_enabled(p.name()))
                .collect();
            (
                enabled,
                GrantedPermissions::new(config.granted_permissions.iter().copied()),
            )
        };

        for (plugin, enabled) in self.plugins.iter().zip(enabled) {
            if !enabled {
                info!("Plugin {} is disabled, skipping", plugin.name());
                continue;
            }

            let missing = granted.missing(plugin.required_permissions());
            if !missing.is_empty() {
                let names: Vec<&str> = missing.iter().map(|p| p.as_str()).collect();
                warn!(
                    "Plugin {} is missing permissions: {}",
                    plugin.name(),
                    names.join(", ")
                );
            }

            info!("Initializing plugin: {}", plugin.name());

            if let Err(e) = plugin
                .init(Arc::clone(&self.config), Arc::clone(&self.transport))
                .await
            {
                // Log error but continue with other plugins
                tracing::error!("Error initializing plugin {}: {:?}", plugin.name(), e);
            }
        }

        Ok(())
    }

    /// Shutdown all plugins
    pub async fn shutdown_all(&self) -> PluginResult<()> {
        info!("Shutting down all plugins");

        for plugin in &self.plugins {
            info!("Shutting down plugin: {}", plugin.name());

            if let Err(e) = plugin.shutdown().await {
                // Log error but continue with other plugins
                tracing::error!("Error shutting down plugin {}: {:?}", plugin.name(), e);
            }
        }

        Ok(())
    }

    /// Get a plugin by name
    pub fn get_plugin_by_name(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    /// Union of the packet types accepted by registered plugins
    pub fn supported_packet_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self
            .plugins
            .iter()
            .flat_map(|p| p.supported_packet_types().iter().copied())
            .collect();
        types.sort_unstable();
        types.dedup();
        types
    }

    /// Route an inbound packet to the plugin that accepts its type
    ///
    /// Returns false when no plugin handled the packet.
    pub async fn on_packet_received(&self, packet: NetworkPacket) -> bool {
        let packet_type = packet.packet_type().to_string();

        let Some(plugin) = self
            .plugins
            .iter()
            .find(|p| p.supported_packet_types().contains(&packet_type.as_str()))
        else {
            debug!("No plugin accepts packet type {}", packet_type);
            return false;
        };

        match plugin.on_packet_received(packet).await {
            Ok(handled) => handled,
            Err(e) => {
                tracing::error!(
                    "Plugin {} failed on {}: {:?}",
                    plugin.name(),
                    packet_type,
                    e
                );
                false
            }
        }
    }
}
