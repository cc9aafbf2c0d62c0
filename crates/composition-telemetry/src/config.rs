//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Name of the composed context this process hosts, tagged on log lines
    pub context: String,

    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit JSON lines instead of plain text
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            context: "main".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SC_CONTEXT`: Context name (default: main)
    /// - `SC_LOG_LEVEL`: Log filter when `RUST_LOG` is unset (default: info)
    /// - `SC_JSON_LOGS`: `true`/`1` for JSON lines (default: false)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            context: lookup("SC_CONTEXT")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.context),
            log_level: lookup("SC_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logs: lookup("SC_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(TelemetryConfig::from_lookup(lookup(&[])), TelemetryConfig::default());
    }

    #[test]
    fn test_reads_variables() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("SC_CONTEXT", "viewer"),
            ("SC_LOG_LEVEL", "composition_bus=debug"),
            ("SC_JSON_LOGS", "TRUE"),
        ]));
        assert_eq!(config.context, "viewer");
        assert_eq!(config.log_level, "composition_bus=debug");
        assert!(config.json_logs);
    }

    #[test]
    fn test_empty_context_and_odd_flag() {
        let config =
            TelemetryConfig::from_lookup(lookup(&[("SC_CONTEXT", ""), ("SC_JSON_LOGS", "yes")]));
        assert_eq!(config.context, "main");
        assert!(!config.json_logs);
        assert_eq!(config.with_context("editor").context, "editor");
    }
}
