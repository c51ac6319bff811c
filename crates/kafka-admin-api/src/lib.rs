//! REST admin API over a Kafka cluster.
//!
//! Each request is validated, forwarded as one administrative call through a
//! [`cluster::ClusterAdmin`], and the outcome rendered as JSON.

pub mod api;
pub mod cluster;
pub mod config;
pub mod error;
pub mod state;
pub mod telemetry;

pub use config::AdminConfig;
pub use error::{AdminError, AdminResult};
pub use state::AppState;
