//! Broker endpoints.

use super::ApiStatus;
use crate::{cluster::BrokerInfo, error::AdminResult, state::AppState};
use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

/// Broker information
#[derive(Debug, Serialize, ToSchema)]
pub struct Broker {
    /// Broker ID
    pub id: i32,

    /// Hostname
    pub host: String,

    /// Port
    pub port: i32,
}

/// Broker listing
#[derive(Debug, Serialize, ToSchema)]
pub struct BrokerList {
    pub brokers: Vec<Broker>,
    pub count: usize,
    pub status: ApiStatus,
}

impl From<BrokerInfo> for Broker {
    fn from(broker: BrokerInfo) -> Self {
        Self {
            id: broker.id,
            host: broker.host,
            port: broker.port,
        }
    }
}

/// List brokers
#[utoipa::path(
    get,
    path = "/brokers",
    responses(
        (status = 200, description = "Brokers in the cluster metadata", body = BrokerList),
        (status = 500, description = "Cluster unreachable or request timed out"),
    ),
    tag = "brokers"
)]
pub async fn list_brokers(State(state): State<AppState>) -> AdminResult<Json<BrokerList>> {
    let mut brokers: Vec<Broker> = state
        .cluster
        .brokers()
        .await?
        .into_iter()
        .map(Broker::from)
        .collect();
    brokers.sort_by_key(|b| b.id);

    info!(count = brokers.len(), "Listed brokers");
    Ok(Json(BrokerList {
        count: brokers.len(),
        brokers,
        status: ApiStatus::Success,
    }))
}
