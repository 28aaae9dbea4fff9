//! Start-up settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::query::QueryConfig;

/// Where student data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The REST API at `api_url`.
    Http,
    /// An in-process store seeded with sample records.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Base URL of the API; requests go to `{api_url}/students`.
    pub api_url: String,
    pub backend: Backend,
    pub page_size: u32,
    pub list_timeout_ms: u64,
    pub detail_stale_time_ms: u64,
    pub stale_time_ms: u64,
    pub cache_time_ms: u64,
    pub toast_ms: u64,
    pub frame_rate: u32,
    pub log_dir: PathBuf,
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub log_filter: String,
}

impl Settings {
    /// Load settings: defaults, then the file named by `ROSTER_CONFIG`
    /// (`roster.toml` if unset, skipped when missing), then `ROSTER__*`
    /// environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("ROSTER_CONFIG").unwrap_or_else(|_| "roster.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("api_url", "http://localhost:4000")?
            .set_default("backend", "http")?
            .set_default("page_size", 10_i64)?
            .set_default("list_timeout_ms", 5_000_i64)?
            .set_default("detail_stale_time_ms", 10_000_i64)?
            .set_default("stale_time_ms", 0_i64)?
            .set_default("cache_time_ms", 300_000_i64)?
            .set_default("toast_ms", 3_000_i64)?
            .set_default("frame_rate", 30_i64)?
            .set_default("log_dir", "logs")?
            .set_default("log_filter", "roster=info")?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        builder
            .add_source(config::Environment::with_prefix("ROSTER").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub const fn list_timeout(&self) -> Duration {
        Duration::from_millis(self.list_timeout_ms)
    }

    pub const fn detail_stale_time(&self) -> Duration {
        Duration::from_millis(self.detail_stale_time_ms)
    }

    pub const fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub const fn query_config(&self) -> QueryConfig {
        QueryConfig::new(
            Duration::from_millis(self.stale_time_ms),
            Duration::from_millis(self.cache_time_ms),
        )
    }
}
