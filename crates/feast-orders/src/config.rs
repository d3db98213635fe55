//! # Order Service Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     FEAST_STATUS_POLICY=terminal_lock                                   │
//! │     FEAST_FIRST_ITEM_ID=1000                                            │
//! │     FEAST_LOG=debug                                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     path passed to load(), else the platform config dir:                │
//! │     ~/.config/feast/feast.toml (Linux)                                  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     unrestricted status policy, item ids from 1, "info" logging         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [service]
//! name = "feast-orders"
//!
//! [orders]
//! status_policy = "unrestricted"  # unrestricted | terminal_lock
//! first_item_id = 1
//!
//! [logging]
//! filter = "info,feast_orders=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use feast_core::{TerminalLock, TransitionPolicy, Unrestricted};

use crate::error::{OrdersError, OrdersResult};

// =============================================================================
// Status Policy
// =============================================================================

/// Which transition policy the order book applies to status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicyKind {
    /// Any status may follow any other.
    #[default]
    Unrestricted,

    /// Delivered and Cancelled orders cannot change status again.
    TerminalLock,
}

impl StatusPolicyKind {
    pub fn policy(&self) -> Box<dyn TransitionPolicy> {
        match self {
            StatusPolicyKind::Unrestricted => Box::new(Unrestricted),
            StatusPolicyKind::TerminalLock => Box::new(TerminalLock),
        }
    }
}

impl std::fmt::Display for StatusPolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusPolicyKind::Unrestricted => write!(f, "unrestricted"),
            StatusPolicyKind::TerminalLock => write!(f, "terminal_lock"),
        }
    }
}

impl std::str::FromStr for StatusPolicyKind {
    type Err = OrdersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unrestricted" | "any" | "open" => Ok(StatusPolicyKind::Unrestricted),
            "terminal_lock" | "terminal-lock" | "locked" => Ok(StatusPolicyKind::TerminalLock),
            other => Err(OrdersError::InvalidConfig(format!(
                "Unknown status policy: '{}'. Valid options: unrestricted, terminal_lock",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Name reported in logs.
    #[serde(default = "default_service_name")]
    pub name: String,
}

fn default_service_name() -> String {
    "feast-orders".to_string()
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            name: default_service_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSettings {
    #[serde(default)]
    pub status_policy: StatusPolicyKind,

    /// First id handed to a new order line.
    #[serde(default = "default_first_item_id")]
    pub first_item_id: u64,
}

fn default_first_item_id() -> u64 {
    1
}

impl Default for OrderSettings {
    fn default() -> Self {
        OrderSettings {
            status_policy: StatusPolicyKind::default(),
            first_item_id: default_first_item_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersConfig {
    #[serde(default)]
    pub service: ServiceSettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl OrdersConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (feast.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> OrdersResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading order service config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load order service config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document; missing sections and keys take defaults.
    pub fn from_toml(contents: &str) -> OrdersResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> OrdersResult<()> {
        if self.service.name.trim().is_empty() {
            return Err(OrdersError::InvalidConfig(
                "service.name must not be empty".into(),
            ));
        }

        if self.orders.first_item_id == 0 {
            return Err(OrdersError::InvalidConfig(
                "orders.first_item_id must be greater than 0".into(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(OrdersError::InvalidConfig(
                "logging.filter must not be empty".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(policy) = std::env::var("FEAST_STATUS_POLICY") {
            match policy.parse() {
                Ok(parsed) => {
                    debug!(policy = %policy, "Overriding status policy from environment");
                    self.orders.status_policy = parsed;
                }
                Err(_) => warn!(policy = %policy, "Unknown status policy in environment"),
            }
        }

        if let Ok(first) = std::env::var("FEAST_FIRST_ITEM_ID") {
            match first.parse::<u64>() {
                Ok(id) => self.orders.first_item_id = id,
                Err(_) => warn!(value = %first, "FEAST_FIRST_ITEM_ID is not a number"),
            }
        }

        if let Ok(filter) = std::env::var("FEAST_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "feast", "feast")
            .map(|dirs| dirs.config_dir().join("feast.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_policy_parsing() {
        assert_eq!(
            "unrestricted".parse::<StatusPolicyKind>().unwrap(),
            StatusPolicyKind::Unrestricted
        );
        assert_eq!(
            "Terminal-Lock".parse::<StatusPolicyKind>().unwrap(),
            StatusPolicyKind::TerminalLock
        );
        assert!("strict".parse::<StatusPolicyKind>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = OrdersConfig::default();
        assert_eq!(config.orders.status_policy, StatusPolicyKind::Unrestricted);
        assert_eq!(config.orders.first_item_id, 1);
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = OrdersConfig::from_toml(
            r#"
            [orders]
            status_policy = "terminal_lock"
            "#,
        )
        .unwrap();

        assert_eq!(config.orders.status_policy, StatusPolicyKind::TerminalLock);
        assert_eq!(config.orders.first_item_id, 1);
        assert_eq!(config.service.name, "feast-orders");
    }

    #[test]
    fn test_config_validation() {
        let mut config = OrdersConfig::default();
        config.orders.first_item_id = 0;
        assert!(config.validate().is_err());

        config.orders.first_item_id = 10;
        config.service.name = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = OrdersConfig::default();
        config.orders.status_policy = StatusPolicyKind::TerminalLock;
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = OrdersConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.orders.status_policy, StatusPolicyKind::TerminalLock);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let path = std::env::temp_dir().join(format!("feast-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[orders]\nfirst_item_id = 500\n").unwrap();

        let config = OrdersConfig::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();

        if std::env::var("FEAST_FIRST_ITEM_ID").is_err() {
            assert_eq!(config.orders.first_item_id, 500);
        }
    }
}
