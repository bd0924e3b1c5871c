//! Host-granted capabilities that gate calendar queries.

use crate::error::{config_error, PluginResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A capability the host must grant before a plugin may touch the calendar store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "calendar.read")]
    ReadCalendar,
    #[serde(rename = "calendar.write")]
    WriteCalendar,
}

impl Permission {
    /// Name used in configuration and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadCalendar => "calendar.read",
            Permission::WriteCalendar => "calendar.write",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> PluginResult<Self> {
        match s.trim() {
            "calendar.read" => Ok(Permission::ReadCalendar),
            "calendar.write" => Ok(Permission::WriteCalendar),
            other => Err(config_error(&format!("Unknown permission: {}", other))),
        }
    }
}

/// Capability check injected into the dispatcher
pub trait PermissionCheck: Send + Sync {
    /// Whether the calendar store may currently be read
    fn has_read_access(&self) -> bool;
}

/// Fixed set of permissions granted by the host at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantedPermissions {
    granted: HashSet<Permission>,
}

impl GrantedPermissions {
    /// Create a permission set from the given grants
    pub fn new(granted: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }

    /// Check if a permission has been granted
    pub fn is_granted(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    /// Get the permissions from `required` that have not been granted
    pub fn missing(&self, required: &[Permission]) -> Vec<Permission> {
        required
            .iter()
            .copied()
            .filter(|p| !self.is_granted(*p))
            .collect()
    }
}

impl PermissionCheck for GrantedPermissions {
    fn has_read_access(&self) -> bool {
        self.is_granted(Permission::ReadCalendar)
    }
}

/// Parse a comma separated permission list such as `calendar.read,calendar.write`
pub fn parse_permissions(list: &str) -> PluginResult<Vec<Permission>> {
    list.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(Permission::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_permissions() {
        assert_eq!(
            parse_permissions("calendar.read, calendar.write").unwrap(),
            vec![Permission::ReadCalendar, Permission::WriteCalendar]
        );
        assert!(parse_permissions("").unwrap().is_empty());
        assert!(parse_permissions("calendar.read,contacts.read").is_err());
    }

    #[test]
    fn test_read_access() {
        let none = GrantedPermissions::default();
        assert!(!none.has_read_access());

        // Write alone does not allow reading
        let write_only = GrantedPermissions::new([Permission::WriteCalendar]);
        assert!(!write_only.has_read_access());

        let read = GrantedPermissions::new([Permission::ReadCalendar]);
        assert!(read.has_read_access());
    }

    #[test]
    fn test_missing_permissions() {
        let read = GrantedPermissions::new([Permission::ReadCalendar]);
        assert_eq!(
            read.missing(&[Permission::ReadCalendar, Permission::WriteCalendar]),
            vec![Permission::WriteCalendar]
        );
    }
}
