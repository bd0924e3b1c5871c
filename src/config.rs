use crate::error::{env_error, PluginResult};
use crate::permissions::{parse_permissions, Permission};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default location of the JSON calendar store
pub const DEFAULT_STORE_PATH: &str = "calendar.json";

/// Default upper bound for a single store query
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

/// Default length of the event window used when a request carries no range
pub const DEFAULT_EVENT_WINDOW_DAYS: i64 = 28;

/// Default grants when `GRANTED_PERMISSIONS` is not set
pub const DEFAULT_GRANTED_PERMISSIONS: &str = "calendar.read";

/// File holding the plugin enable/disable map
pub const PLUGINS_CONFIG_PATH: &str = "config/plugins.toml";

/// Main configuration structure for the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the JSON calendar store
    pub store_path: String,
    /// Timeout for one store query, in milliseconds
    pub store_timeout_ms: u64,
    /// Event window used when a request does not name a range
    pub event_window_days: i64,
    /// Capabilities granted by the host
    pub granted_permissions: Vec<Permission>,
    /// Map of plugin names to their enabled status
    pub plugins: HashMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        let mut plugins = HashMap::new();
        plugins.insert("calendar".to_string(), true);

        Self {
            store_path: DEFAULT_STORE_PATH.to_string(),
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            event_window_days: DEFAULT_EVENT_WINDOW_DAYS,
            granted_permissions: vec![Permission::ReadCalendar],
            plugins,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> PluginResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_lookup(|key| env::var(key).ok())?;

        // Load plugin configuration from file if it exists
        if let Ok(content) = fs::read_to_string(PLUGINS_CONFIG_PATH) {
            config.merge_plugins(&content);
        }

        Ok(config)
    }

    /// Build a configuration from a key lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PluginResult<Self> {
        let defaults = Self::default();

        let store_path = lookup("CALENDAR_STORE_PATH").unwrap_or(defaults.store_path);

        let store_timeout_ms = match lookup("STORE_TIMEOUT_MS") {
            Some(value) => value
                .parse::<u64>()
                .map_err(|_| env_error("STORE_TIMEOUT_MS"))?,
            None => defaults.store_timeout_ms,
        };

        let event_window_days = match lookup("EVENT_WINDOW_DAYS") {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|days| *days >= 0)
                .ok_or_else(|| env_error("EVENT_WINDOW_DAYS"))?,
            None => defaults.event_window_days,
        };

        let granted = lookup("GRANTED_PERMISSIONS")
            .unwrap_or_else(|| DEFAULT_GRANTED_PERMISSIONS.to_string());
        let granted_permissions = parse_permissions(&granted)?;

        Ok(Config {
            store_path,
            store_timeout_ms,
            event_window_days,
            granted_permissions,
            plugins: defaults.plugins,
        })
    }

    /// Merge a TOML plugin map over the current one, ignoring unparsable content
    pub fn merge_plugins(&mut self, content: &str) {
        if let Ok(file_plugins) = toml::from_str::<HashMap<String, bool>>(content) {
            for (key, value) in file_plugins {
                self.plugins.insert(key, value);
            }
        }
    }

    /// Timeout for one store query
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Check if a plugin is enabled
    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        *self.plugins.get(name).unwrap_or(&false)
    }

    /// Save plugin configuration to file
    pub fn save_plugins(&self, path: &Path) -> PluginResult<()> {
        // Create config directory if it doesn't exist
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let toml_str = toml::to_string(&self.plugins)?;
        fs::write(path, toml_str)?;

        Ok(())
    }
}
