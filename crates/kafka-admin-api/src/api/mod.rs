//! API routes and OpenAPI documentation.

pub mod brokers;
pub mod consumer_groups;
pub mod health;
pub mod topics;

use crate::error::{AdminError, AdminResult};
use crate::state::AppState;
use axum::{routing::get, Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};

/// Outcome marker carried by every successful response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
}

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(health::health_check).fallback(method_not_allowed),
        )
        .route(
            "/brokers",
            get(brokers::list_brokers).fallback(method_not_allowed),
        )
        .route(
            "/topics",
            get(topics::list_topics)
                .post(topics::create_topic)
                .fallback(method_not_allowed),
        )
        .route(
            "/topics/:name",
            get(topics::describe_topic)
                .put(topics::alter_topic_config)
                .fallback(method_not_allowed),
        )
        .route(
            "/consumer-groups",
            get(consumer_groups::list_groups).fallback(method_not_allowed),
        )
        .route(
            "/consumer-groups/:id",
            get(consumer_groups::describe_group).fallback(method_not_allowed),
        )
        .route(
            "/api-doc/openapi.json",
            get(openapi_json).fallback(method_not_allowed),
        )
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn route_not_found() -> AdminError {
    AdminError::NotFound("Route not found".to_string())
}

async fn method_not_allowed() -> AdminError {
    AdminError::MethodNotAllowed
}

/// Parse an optional JSON object body.
///
/// An empty body or a literal `null` yields `None`; anything other than an
/// object is rejected.
pub(crate) fn parse_object_body<T: DeserializeOwned>(body: &[u8]) -> AdminResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AdminError::bad_request(format!("Malformed JSON body: {}", e)))?;

    match value {
        Value::Null => Ok(None),
        Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| AdminError::bad_request(format!("Invalid request body: {}", e))),
        _ => Err(AdminError::bad_request("Request body must be a JSON object")),
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        brokers::list_brokers,
        topics::list_topics,
        topics::create_topic,
        topics::describe_topic,
        topics::alter_topic_config,
        consumer_groups::list_groups,
        consumer_groups::describe_group,
    ),
    components(
        schemas(
            ApiStatus,
            health::HealthStatus,
            brokers::Broker,
            brokers::BrokerList,
            topics::TopicSummary,
            topics::TopicList,
            topics::CreateTopicRequest,
            topics::CreateTopicResponse,
            topics::Partition,
            topics::ConfigEntry,
            topics::TopicDetail,
            topics::AlterTopicConfigRequest,
            topics::AlterTopicConfigResponse,
            consumer_groups::GroupSummary,
            consumer_groups::GroupList,
            consumer_groups::GroupMember,
            consumer_groups::TopicPartition,
            consumer_groups::GroupDetail,
        )
    ),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "brokers", description = "Broker endpoints"),
        (name = "topics", description = "Topic management endpoints"),
        (name = "consumer-groups", description = "Consumer group endpoints"),
    )
)]
pub struct ApiDoc;
