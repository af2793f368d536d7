//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use checkout::CheckoutSettings;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Credentials for the hosted payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: Option<String>,
    pub key_id: String,
    pub key_secret: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT` (default `0.0.0.0:3000`)
/// - `RUST_LOG` (default `info`), `LOG_FORMAT` (`pretty` or `json`)
/// - `DATABASE_URL` (unset runs on the in-memory store), `DATABASE_MAX_CONNECTIONS`
/// - `GATEWAY_BASE_URL` (unset runs the in-memory gateway), `GATEWAY_KEY_ID`,
///   `GATEWAY_KEY_SECRET`, `GATEWAY_CALLBACK_URL`, `GATEWAY_TIMEOUT_MS`
/// - `CURRENCY`, `STORE_NAME`, `FRONTEND_URL`
/// - `PAYMENT_EXPIRY_SECS`, `DELIVERY_DAYS`, `SWEEP_INTERVAL_SECS`, `MAIL_TIMEOUT_MS`
///
/// Unparseable numbers fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub gateway: GatewayConfig,
    pub checkout: CheckoutSettings,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let base = &defaults.checkout;

        Self {
            host: text("HOST", &defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: text("RUST_LOG", &defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            gateway: GatewayConfig {
                base_url: lookup("GATEWAY_BASE_URL").filter(|v| !v.trim().is_empty()),
                key_id: text("GATEWAY_KEY_ID", &defaults.gateway.key_id),
                key_secret: text("GATEWAY_KEY_SECRET", &defaults.gateway.key_secret),
            },
            checkout: CheckoutSettings {
                currency: text("CURRENCY", &base.currency),
                store_name: text("STORE_NAME", &base.store_name),
                callback_url: text("GATEWAY_CALLBACK_URL", &base.callback_url),
                frontend_url: text("FRONTEND_URL", &base.frontend_url),
                payment_window: parsed("PAYMENT_EXPIRY_SECS")
                    .and_then(|s| i64::try_from(s).ok())
                    .and_then(chrono::TimeDelta::try_seconds)
                    .unwrap_or(base.payment_window),
                delivery_days: parsed("DELIVERY_DAYS")
                    .and_then(|d| i64::try_from(d).ok())
                    .filter(|d| chrono::TimeDelta::try_days(*d).is_some())
                    .unwrap_or(base.delivery_days),
                gateway_timeout: parsed("GATEWAY_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(base.gateway_timeout),
                mail_timeout: parsed("MAIL_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(base.mail_timeout),
                sweep_interval: parsed("SWEEP_INTERVAL_SECS")
                    .filter(|s| *s > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(base.sweep_interval),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 10,
            gateway: GatewayConfig {
                base_url: None,
                key_id: "local_key".to_string(),
                key_secret: "local_secret".to_string(),
            },
            checkout: CheckoutSettings::default(),
        }
    }
}
