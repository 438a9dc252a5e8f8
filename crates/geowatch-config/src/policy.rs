//! Validated configuration structures

use crate::schema::{RawConfig, RawMonitorConfig, RawNotifierConfig};
use geowatch_util::EntityId;
use std::time::Duration;

/// Default seconds between ticks
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Default excursion length before the follow-up alert
pub const DEFAULT_DEBOUNCE_SECS: u64 = 300;

/// Default deadline for a single position lookup
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;

/// Default time allowed for queued alerts to drain on shutdown
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 10;

/// Default SMTP submission port
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default environment variable holding the SMTP password
pub const DEFAULT_SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";

/// Validated configuration ready for use by the service
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub monitor: MonitorSettings,
    pub source: SourceSettings,
    pub notifier: NotifierSettings,
}

impl MonitorConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            monitor: MonitorSettings::from_raw(raw.monitor),
            source: SourceSettings {
                base_url: raw
                    .source
                    .base_url
                    .map(|url| url.trim().trim_end_matches('/').to_string())
                    .unwrap_or_default(),
            },
            notifier: raw
                .notifier
                .map(NotifierSettings::from_raw)
                .unwrap_or(NotifierSettings::Log),
        }
    }
}

/// Scheduling and tracking parameters
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Monitored entities in configuration order (the per-tick order)
    pub entities: Vec<EntityId>,
    pub poll_interval: Duration,
    /// None means run until cancelled
    pub run_duration: Option<Duration>,
    pub debounce: Duration,
    pub fetch_timeout: Duration,
    pub drain_timeout: Duration,
}

impl MonitorSettings {
    fn from_raw(raw: RawMonitorConfig) -> Self {
        Self {
            entities: raw
                .entities
                .into_iter()
                .map(|id| EntityId::new(id.to_string()))
                .collect(),
            poll_interval: Duration::from_secs(
                raw.poll_interval_seconds.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            run_duration: raw.run_duration_seconds.map(Duration::from_secs),
            debounce: Duration::from_secs(raw.debounce_seconds.unwrap_or(DEFAULT_DEBOUNCE_SECS)),
            fetch_timeout: Duration::from_secs(
                raw.fetch_timeout_seconds.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
            drain_timeout: Duration::from_secs(
                raw.drain_timeout_seconds.unwrap_or(DEFAULT_DRAIN_TIMEOUT_SECS),
            ),
        }
    }
}

/// Position source settings
#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// Base URL without a trailing slash
    pub base_url: String,
}

/// Notifier selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierSettings {
    Log,
    Smtp(SmtpSettings),
}

impl NotifierSettings {
    fn from_raw(raw: RawNotifierConfig) -> Self {
        match raw {
            RawNotifierConfig::Log => Self::Log,
            RawNotifierConfig::Smtp {
                host,
                port,
                username,
                password_env,
                sender,
                recipient,
            } => Self::Smtp(SmtpSettings {
                host,
                port: port.unwrap_or(DEFAULT_SMTP_PORT),
                username,
                password_env: password_env.unwrap_or_else(|| DEFAULT_SMTP_PASSWORD_ENV.to_string()),
                sender,
                recipient,
            }),
        }
    }
}

/// SMTP relay settings. The password itself is never stored in the config
/// file; `password_env` names the variable it is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password_env: String,
    pub sender: String,
    pub recipient: String,
}
