use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::bus::MessageBus;
use crate::kv::KvStore;
use crate::seed_window::SeedWindow;

/// Shared handles the HTTP surface borrows. Built once in `main` and
/// cloned (cheaply, it's all `Arc`s) into every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub kv: Arc<dyn KvStore>,
    pub bus: Arc<dyn MessageBus>,
    pub seed_window: Arc<SeedWindow>,
    pub metrics: PrometheusHandle,
    pub log_filter: reload::Handle<EnvFilter, Registry>,
}
