//! Job context for dependency injection

use crate::bridge::AnalyticsBridge;
use crate::metrics::Metrics;
use crate::store::MemStore;
use std::sync::Arc;

/// Dependencies handed to job execution.
///
/// The store and bridge are injected explicitly so tests can swap in a
/// fresh store and a stub bridge per case.
pub struct JobContext {
    pub store: Arc<MemStore>,
    pub bridge: Arc<dyn AnalyticsBridge + Send + Sync>,
    pub metrics: Option<Arc<Metrics>>,
}

impl JobContext {
    pub fn new(
        store: Arc<MemStore>,
        bridge: Arc<dyn AnalyticsBridge + Send + Sync>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            store,
            bridge,
            metrics,
        }
    }
}
