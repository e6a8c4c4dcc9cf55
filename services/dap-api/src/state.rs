//! Application state for the DAP API.

use std::sync::Arc;

use dap_protocol::DatasetResolver;
use dap_store::ZarrResolver;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::DapConfig;

/// Shared application state.
pub struct AppState {
    /// Service configuration.
    pub config: DapConfig,

    /// Maps object ids to datasets.
    pub resolver: Arc<dyn DatasetResolver>,

    /// Renders `/metrics`; absent when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State serving the Zarr groups below `config.data_root`.
    pub fn new(config: DapConfig) -> Self {
        let resolver = Arc::new(ZarrResolver::new(config.data_root.clone()));
        Self::with_resolver(config, resolver)
    }

    pub fn with_resolver(config: DapConfig, resolver: Arc<dyn DatasetResolver>) -> Self {
        Self {
            config,
            resolver,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
