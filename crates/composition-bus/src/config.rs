//! Bus configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use composition_bus::{BusConfig, WiringMode};
//!
//! let config = BusConfig::from_env()
//!     .with_wiring(WiringMode::Global)
//!     .with_notify_self(true);
//! config.validate()?;
//! ```

use std::env;
use std::str::FromStr;

use bus_types::{Envelope, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::DEFAULT_CHANNEL_CAPACITY;

/// How the dispatch engine is attached to the channel adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WiringMode {
    /// One inbound hook for the whole instance.
    Global,
    /// One inbound hook per subscribed topic, added with the first
    /// subscriber and removed with the last.
    #[default]
    PerTopic,
}

impl FromStr for WiringMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "per-topic" | "per_topic" | "topic" => Ok(Self::PerTopic),
            other => Err(ConfigError::UnknownWiring(other.to_string())),
        }
    }
}

/// Configuration for one bus instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Prefix for instance ids and the envelope type marker.
    pub namespace: String,

    /// Deliver `a.b.c` to subscribers of `a` and `a.b` as well.
    pub hierarchical: bool,

    /// Hook wiring strategy.
    pub wiring: WiringMode,

    /// Initial value of the publishing flag.
    pub publishing: bool,

    /// Also dispatch own publishes locally, for transports that never
    /// deliver to the sender.
    pub notify_self: bool,

    /// Buffer size for queue-backed transports.
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            hierarchical: true,
            wiring: WiringMode::default(),
            publishing: true,
            notify_self: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl BusConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `COMPOSITION_BUS_NAMESPACE` (default: SmartComposition)
    /// - `COMPOSITION_BUS_HIERARCHICAL` (default: true)
    /// - `COMPOSITION_BUS_WIRING`: `global` or `per-topic` (default: per-topic)
    /// - `COMPOSITION_BUS_PUBLISHING` (default: true)
    /// - `COMPOSITION_BUS_NOTIFY_SELF` (default: false)
    /// - `COMPOSITION_BUS_CHANNEL_CAPACITY` (default: 1000)
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: env::var("COMPOSITION_BUS_NAMESPACE").unwrap_or(defaults.namespace),
            hierarchical: env_flag("COMPOSITION_BUS_HIERARCHICAL").unwrap_or(defaults.hierarchical),
            wiring: env::var("COMPOSITION_BUS_WIRING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.wiring),
            publishing: env_flag("COMPOSITION_BUS_PUBLISHING").unwrap_or(defaults.publishing),
            notify_self: env_flag("COMPOSITION_BUS_NOTIFY_SELF").unwrap_or(defaults.notify_self),
            channel_capacity: env::var("COMPOSITION_BUS_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.channel_capacity),
        }
    }

    /// Check the configuration before a bus is built from it.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self
            .namespace
            .chars()
            .any(|c| c.is_whitespace() || c == bus_types::topic::SEPARATOR)
        {
            return Err(ConfigError::InvalidNamespace(self.namespace.clone()));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Envelope type marker for this namespace.
    #[must_use]
    pub fn marker(&self) -> String {
        Envelope::marker(&self.namespace)
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_hierarchical(mut self, hierarchical: bool) -> Self {
        self.hierarchical = hierarchical;
        self
    }

    #[must_use]
    pub fn with_wiring(mut self, wiring: WiringMode) -> Self {
        self.wiring = wiring;
        self
    }

    #[must_use]
    pub fn with_publishing(mut self, publishing: bool) -> Self {
        self.publishing = publishing;
        self
    }

    #[must_use]
    pub fn with_notify_self(mut self, notify_self: bool) -> Self {
        self.notify_self = notify_self;
        self
    }

    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| {
        let v = v.trim().to_lowercase();
        v == "true" || v == "1" || v == "yes" || v == "on"
    })
}
