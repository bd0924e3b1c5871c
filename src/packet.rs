//! The JSON packet envelope exchanged with the paired device.
//!
//! On the wire every packet is a single JSON object on its own line:
//! `{"id": <epoch ms>, "type": "<packet type>", "body": {...}}`.

use crate::error::PluginResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed JSON message exchanged with a paired device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPacket {
    pub id: i64,
    #[serde(rename = "type")]
    pub packet_type: String,
    #[serde(default)]
    pub body: Map<String, Value>,
}

impl NetworkPacket {
    /// Create an empty packet of the given type, stamped with the current time
    pub fn new(packet_type: impl Into<String>) -> Self {
        Self {
            id: Utc::now().timestamp_millis(),
            packet_type: packet_type.into(),
            body: Map::new(),
        }
    }

    /// Get the packet type
    pub fn packet_type(&self) -> &str {
        &self.packet_type
    }

    /// Set a body field, replacing any previous value
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.body.insert(key.to_string(), value.into());
    }

    /// Check whether a body field is present and not null
    pub fn has(&self, key: &str) -> bool {
        self.body.get(key).is_some_and(|v| !v.is_null())
    }

    /// Get a body field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Get a string body field
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(|v| v.as_str())
    }

    /// Get an integer body field
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.body.get(key).and_then(|v| v.as_i64())
    }

    /// Parse a packet from one line of JSON
    pub fn from_json(line: &str) -> PluginResult<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Serialize the packet into one line of JSON
    pub fn to_json(&self) -> PluginResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
