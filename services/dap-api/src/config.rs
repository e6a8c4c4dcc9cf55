//! DAP service configuration loading and types.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service configuration, loaded from an optional YAML file and then
/// overridden by environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DapConfig {
    /// Listen address.
    pub listen: String,

    /// Directory holding the served Zarr groups.
    pub data_root: PathBuf,

    /// Path prefix of the protocol routes.
    pub route_prefix: String,

    /// Lifetime of protocol responses in client caches, in seconds.
    pub page_expiry_secs: u64,

    /// Revision mixed into every ETag, so a deploy invalidates cached pages.
    pub build_revision: String,

    /// Hostnames served over https.
    pub secure_hostnames: Vec<String>,

    /// Number of worker threads (defaults to the number of cores).
    pub worker_threads: Option<usize>,
}

impl Default for DapConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8090".to_string(),
            data_root: PathBuf::from("./data"),
            route_prefix: "/dap".to_string(),
            page_expiry_secs: 5,
            build_revision: env!("CARGO_PKG_VERSION").to_string(),
            secure_hostnames: Vec::new(),
            worker_threads: None,
        }
    }
}

impl DapConfig {
    /// Load from `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a YAML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse: {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override settings from `DAP_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(root) = var("DAP_DATA_ROOT") {
            self.data_root = PathBuf::from(root);
        }
        if let Some(secs) = var("DAP_PAGE_EXPIRY_SECS") {
            match secs.parse() {
                Ok(secs) => self.page_expiry_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid DAP_PAGE_EXPIRY_SECS {:?}", secs),
            }
        }
        if let Some(rev) = var("DAP_BUILD_REV") {
            self.build_revision = rev;
        }
        if let Some(hosts) = var("DAP_SECURE_HOSTNAMES") {
            self.secure_hostnames = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    pub fn page_expiry(&self) -> Duration {
        Duration::from_secs(self.page_expiry_secs)
    }
}
