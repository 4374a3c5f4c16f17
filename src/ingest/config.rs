// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::builder::RecordBuilder;
use crate::ingest::convert::LocalZone;
use crate::ingest::mapping::FieldMapping;
use crate::ingest::providers::http::DEFAULT_FEED_URL;
use crate::ingest::BatchPolicy;
use crate::store::ConflictPolicy;

pub const ENV_CONFIG_PATH: &str = "ORDER_INGEST_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/ingest.toml";

pub const ENV_FEED_URL: &str = "ORDER_FEED_URL";
pub const ENV_FEED_TZ: &str = "ORDER_FEED_TZ";
pub const ENV_BATCH_POLICY: &str = "ORDER_BATCH_POLICY";
pub const ENV_ON_DUPLICATE: &str = "ORDER_ON_DUPLICATE";
pub const ENV_STORE_PATH: &str = "ORDER_STORE_PATH";

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}
fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_http_timeout_secs() -> u64 {
    30
}

/// Ingestion settings, deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// `local`, `UTC`, or a fixed offset such as `+01:00`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub batch_policy: BatchPolicy,
    #[serde(default)]
    pub on_duplicate: ConflictPolicy,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Field name -> path expression.
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
    /// Field name -> strftime format (date/time fields only).
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            timezone: default_timezone(),
            batch_policy: BatchPolicy::default(),
            on_duplicate: ConflictPolicy::default(),
            store_path: None,
            http_timeout_secs: default_http_timeout_secs(),
            paths: BTreeMap::new(),
            formats: BTreeMap::new(),
        }
    }
}

impl IngestConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: IngestConfig = toml::from_str(s).context("parsing ingest config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading ingest config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $ORDER_INGEST_CONFIG
    /// 2) config/ingest.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if p.exists() {
                Self::load_from(&p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Override individual fields from `ORDER_*` env vars.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var(ENV_FEED_URL) {
            self.feed_url = v;
        }
        if let Ok(v) = std::env::var(ENV_FEED_TZ) {
            self.timezone = v;
        }
        if let Ok(v) = std::env::var(ENV_BATCH_POLICY) {
            self.batch_policy = v.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Ok(v) = std::env::var(ENV_ON_DUPLICATE) {
            self.on_duplicate = v.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Ok(v) = std::env::var(ENV_STORE_PATH) {
            self.store_path = Some(PathBuf::from(v));
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        self.zone()?;
        self.mapping()?;
        if self.feed_url.trim().is_empty() {
            return Err(anyhow!("feed_url must not be empty"));
        }
        Ok(())
    }

    pub fn zone(&self) -> Result<LocalZone> {
        self.timezone.parse().map_err(|e: String| anyhow!(e))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Default mapping table with the configured overrides applied.
    pub fn mapping(&self) -> Result<FieldMapping> {
        let mut m = FieldMapping::lengow();
        for (field, expr) in &self.paths {
            m = m.with_path(field, expr)?;
        }
        for (field, fmt) in &self.formats {
            m = m.with_format(field, fmt)?;
        }
        Ok(m)
    }

    pub fn record_builder(&self) -> Result<RecordBuilder> {
        Ok(RecordBuilder::new(self.mapping()?, self.zone()?))
    }
}
