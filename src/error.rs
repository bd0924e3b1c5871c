use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the plugin service
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Permission denied: {0}")]
    #[diagnostic(code(calendar_plugin::permission_denied))]
    PermissionDenied(String),

    #[error("Calendar store unavailable: {0}")]
    #[diagnostic(code(calendar_plugin::store_unavailable))]
    StoreUnavailable(String),

    #[error("Unsupported request packet type: {0}")]
    #[diagnostic(code(calendar_plugin::unsupported_request))]
    UnsupportedRequest(String),

    #[error("Malformed request: {0}")]
    #[diagnostic(code(calendar_plugin::malformed_request))]
    MalformedRequest(String),

    #[error("Row encoding error: {0}")]
    #[diagnostic(code(calendar_plugin::encoding))]
    Encoding(String),

    #[error("Transport error: {0}")]
    #[diagnostic(code(calendar_plugin::transport))]
    Transport(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(calendar_plugin::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_plugin::config))]
    Config(String),

    #[error("Plugin error: {0}")]
    #[diagnostic(code(calendar_plugin::plugin))]
    Plugin(String),

    #[error(transparent)]
    #[diagnostic(code(calendar_plugin::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_plugin::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_plugin::other))]
    Other(String),
}

// Implement From for JSON errors
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML serialization errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type PluginResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create calendar store errors
pub fn store_error(message: &str) -> Error {
    Error::StoreUnavailable(message.to_string())
}

/// Helper to create malformed request errors
pub fn request_error(message: &str) -> Error {
    Error::MalformedRequest(message.to_string())
}

/// Helper to create per-row encoding errors
pub fn encoding_error(message: &str) -> Error {
    Error::Encoding(message.to_string())
}

/// Helper to create transport errors
pub fn transport_error(message: &str) -> Error {
    Error::Transport(message.to_string())
}

/// Helper to create plugin errors
pub fn plugin_error(message: &str) -> Error {
    Error::Plugin(message.to_string())
}
