//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// What to monitor and how often
    #[serde(default)]
    pub monitor: RawMonitorConfig,

    /// Where positions come from
    #[serde(default)]
    pub source: RawSourceConfig,

    /// Where alerts go (default: log only)
    #[serde(default)]
    pub notifier: Option<RawNotifierConfig>,
}

/// Monitoring settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMonitorConfig {
    /// Monitored entity ids, integers or strings
    #[serde(default)]
    pub entities: Vec<RawEntityId>,

    /// Seconds between poll ticks (default: 300)
    pub poll_interval_seconds: Option<u64>,

    /// Total run length in seconds; absent means run until cancelled
    pub run_duration_seconds: Option<u64>,

    /// Excursion length before the follow-up alert (default: 300)
    pub debounce_seconds: Option<u64>,

    /// Per-request deadline for the position source (default: 5)
    pub fetch_timeout_seconds: Option<u64>,

    /// How long queued alerts may keep draining at shutdown (default: 10)
    pub drain_timeout_seconds: Option<u64>,
}

/// Entity id as written in TOML
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawEntityId {
    Number(u64),
    Name(String),
}

impl fmt::Display for RawEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Name(s) => write!(f, "{}", s),
        }
    }
}

/// Position source settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSourceConfig {
    /// Base URL of the status API, e.g. `https://api.example.com`
    pub base_url: Option<String>,
}

/// Notifier settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawNotifierConfig {
    /// Write alerts to the service log only
    Log,

    /// Send alerts by e-mail through an SMTP relay (STARTTLS)
    Smtp {
        host: String,
        /// Default: 587
        port: Option<u16>,
        username: String,
        /// Environment variable holding the password (default: SMTP_PASSWORD)
        password_env: Option<String>,
        sender: String,
        recipient: String,
    },
}
