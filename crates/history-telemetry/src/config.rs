//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging output.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Network label (mainnet, testnet, devnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "portal-history".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "mainnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `PH_SERVICE_NAME`: Service name (default: portal-history)
    /// - `PH_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `PH_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `PH_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `PH_NETWORK`: Network name (default: mainnet)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("PH_SERVICE_NAME")
                .unwrap_or_else(|_| "portal-history".to_string()),

            log_level: env::var("PH_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("PH_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("PH_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            network: env::var("PH_NETWORK").unwrap_or_else(|_| "mainnet".to_string()),
        }
    }

    /// Configuration for a named network instance (e.g. "history", "beacon").
    pub fn for_instance(instance: &str) -> Self {
        let mut config = Self::from_env();
        config.service_name = format!("portal-{}", instance);
        config
    }
}
