//! Application state.

use crate::cluster::{ClusterAdmin, KafkaClusterAdmin};
use crate::config::AdminConfig;
use std::sync::Arc;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Cluster administration client factory
    pub cluster: Arc<dyn ClusterAdmin>,
}

impl AppState {
    /// Create app state backed by the Kafka cluster named in `config`
    pub fn new(config: &AdminConfig) -> Self {
        Self::with_cluster(Arc::new(KafkaClusterAdmin::new(config.kafka.clone())))
    }

    /// Create app state over an arbitrary cluster implementation
    pub fn with_cluster(cluster: Arc<dyn ClusterAdmin>) -> Self {
        Self { cluster }
    }
}
