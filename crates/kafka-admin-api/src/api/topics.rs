//! Topic management endpoints.

use super::{parse_object_body, ApiStatus};
use crate::{
    cluster::{ConfigEntryInfo, NewTopicSpec, PartitionInfo, TopicMetadata},
    error::{AdminError, AdminResult},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::info;
use utoipa::ToSchema;

const CONFIGS_REQUIRED: &str = "Request body must contain 'configs' object";

/// Topic summary
#[derive(Debug, Serialize, ToSchema)]
pub struct TopicSummary {
    pub topic_name: String,

    /// Number of partitions
    pub partition_count: usize,

    /// Replica count of the first partition, 0 without partitions
    pub replication_factor: usize,
}

/// Topic listing, internal topics excluded
#[derive(Debug, Serialize, ToSchema)]
pub struct TopicList {
    pub topics: Vec<TopicSummary>,
    pub count: usize,
    pub status: ApiStatus,
}

/// Create topic request
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "topic_name": "topic-1",
    "partitions": 3,
    "replication_factor": 3,
    "configs": {"retention.ms": "604800000", "compression.type": "gzip"}
}))]
pub struct CreateTopicRequest {
    /// Topic name (required)
    pub topic_name: Option<String>,

    /// Number of partitions, default 1
    pub partitions: Option<i32>,

    /// Replication factor, default 1
    pub replication_factor: Option<i32>,

    /// Topic-level configuration overrides
    #[schema(value_type = Object)]
    pub configs: Option<Map<String, Value>>,
}

/// Create topic response
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateTopicResponse {
    pub message: String,
    pub topic_name: String,
    pub partitions: i32,
    pub replication_factor: i32,
    #[schema(value_type = Object)]
    pub configs: Map<String, Value>,
    pub status: ApiStatus,
}

/// Partition information
#[derive(Debug, Serialize, ToSchema)]
pub struct Partition {
    pub partition_id: i32,

    /// Leader broker ID
    pub leader: i32,

    /// Replica broker IDs
    pub replicas: Vec<i32>,

    /// In-sync replica broker IDs
    pub isrs: Vec<i32>,
}

/// Topic-level configuration entry
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigEntry {
    pub value: Option<String>,
    pub is_default: bool,
    pub is_sensitive: bool,
}

/// Topic description
#[derive(Debug, Serialize, ToSchema)]
pub struct TopicDetail {
    pub topic_name: String,
    pub partition_count: usize,
    pub replication_factor: usize,
    pub partitions: Vec<Partition>,
    pub configurations: BTreeMap<String, ConfigEntry>,
    pub status: ApiStatus,
}

/// Alter topic configuration request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AlterTopicConfigRequest {
    #[schema(value_type = Object)]
    pub configs: Option<Value>,
}

/// Alter topic configuration response
#[derive(Debug, Serialize, ToSchema)]
pub struct AlterTopicConfigResponse {
    pub message: String,
    pub topic_name: String,
    #[schema(value_type = Object)]
    pub updated_configs: Map<String, Value>,
    pub status: ApiStatus,
}

impl From<&TopicMetadata> for TopicSummary {
    fn from(topic: &TopicMetadata) -> Self {
        Self {
            topic_name: topic.name.clone(),
            partition_count: topic.partition_count(),
            replication_factor: topic.replication_factor(),
        }
    }
}

impl From<PartitionInfo> for Partition {
    fn from(p: PartitionInfo) -> Self {
        Self {
            partition_id: p.id,
            leader: p.leader,
            replicas: p.replicas,
            isrs: p.isr,
        }
    }
}

impl From<ConfigEntryInfo> for ConfigEntry {
    fn from(entry: ConfigEntryInfo) -> Self {
        Self {
            value: entry.value,
            is_default: entry.is_default,
            is_sensitive: entry.is_sensitive,
        }
    }
}

/// List topics
#[utoipa::path(
    get,
    path = "/topics",
    responses(
        (status = 200, description = "User-visible topics", body = TopicList),
        (status = 500, description = "Cluster unreachable or request timed out"),
    ),
    tag = "topics"
)]
pub async fn list_topics(State(state): State<AppState>) -> AdminResult<Json<TopicList>> {
    let mut topics: Vec<TopicSummary> = state
        .cluster
        .topics()
        .await?
        .iter()
        .filter(|t| !t.is_internal())
        .map(TopicSummary::from)
        .collect();
    topics.sort_by(|a, b| a.topic_name.cmp(&b.topic_name));

    info!(count = topics.len(), "Listed topics");
    Ok(Json(TopicList {
        count: topics.len(),
        topics,
        status: ApiStatus::Success,
    }))
}

/// Create topic
#[utoipa::path(
    post,
    path = "/topics",
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Topic created", body = CreateTopicResponse),
        (status = 400, description = "Missing body or topic_name"),
        (status = 500, description = "Cluster rejected the topic"),
    ),
    tag = "topics"
)]
pub async fn create_topic(
    State(state): State<AppState>,
    body: Bytes,
) -> AdminResult<(StatusCode, Json<CreateTopicResponse>)> {
    let req: CreateTopicRequest = parse_object_body(&body)?
        .ok_or_else(|| AdminError::bad_request("Request body is required"))?;

    let topic_name = match req.topic_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(AdminError::bad_request("topic_name is required")),
    };
    let partitions = req.partitions.unwrap_or(1);
    let replication_factor = req.replication_factor.unwrap_or(1);
    let configs = req.configs.unwrap_or_default();

    let spec = NewTopicSpec {
        name: topic_name.clone(),
        partitions,
        replication_factor,
        configs: config_strings(&configs)?,
    };
    state.cluster.create_topic(&spec).await?;

    info!(
        topic = %topic_name,
        partitions,
        replication_factor,
        "Created topic"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateTopicResponse {
            message: format!("Topic '{}' created successfully", topic_name),
            topic_name,
            partitions,
            replication_factor,
            configs,
            status: ApiStatus::Success,
        }),
    ))
}

/// Describe topic
#[utoipa::path(
    get,
    path = "/topics/{name}",
    params(
        ("name" = String, Path, description = "Topic name")
    ),
    responses(
        (status = 200, description = "Partitions and configuration", body = TopicDetail),
        (status = 404, description = "Topic not found"),
    ),
    tag = "topics"
)]
pub async fn describe_topic(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AdminResult<Json<TopicDetail>> {
    let description = state
        .cluster
        .describe_topic(&name)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("Topic '{}' not found", name)))?;

    let metadata = description.metadata;
    let partition_count = metadata.partition_count();
    let replication_factor = metadata.replication_factor();

    Ok(Json(TopicDetail {
        topic_name: metadata.name,
        partition_count,
        replication_factor,
        partitions: metadata.partitions.into_iter().map(Partition::from).collect(),
        configurations: description
            .configs
            .into_iter()
            .map(|(key, entry)| (key, ConfigEntry::from(entry)))
            .collect(),
        status: ApiStatus::Success,
    }))
}

/// Alter topic configuration
#[utoipa::path(
    put,
    path = "/topics/{name}",
    params(
        ("name" = String, Path, description = "Topic name")
    ),
    request_body = AlterTopicConfigRequest,
    responses(
        (status = 200, description = "Configuration applied", body = AlterTopicConfigResponse),
        (status = 400, description = "Missing configs object"),
        (status = 404, description = "Topic not found"),
    ),
    tag = "topics"
)]
pub async fn alter_topic_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> AdminResult<Json<AlterTopicConfigResponse>> {
    let req: Option<AlterTopicConfigRequest> = parse_object_body(&body)?;
    let configs = match req.and_then(|r| r.configs) {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => {
            return Err(AdminError::bad_request_with_example(
                CONFIGS_REQUIRED,
                alter_config_example(),
            ))
        }
    };

    state
        .cluster
        .alter_topic_configs(&name, &config_strings(&configs)?)
        .await?;

    info!(topic = %name, entries = configs.len(), "Updated topic configuration");
    Ok(Json(AlterTopicConfigResponse {
        message: format!("Topic '{}' configuration updated successfully", name),
        topic_name: name,
        updated_configs: configs,
        status: ApiStatus::Success,
    }))
}

fn alter_config_example() -> Value {
    json!({
        "configs": {
            "retention.ms": "604800000",
            "compression.type": "gzip"
        }
    })
}

/// Render JSON config values as the strings the cluster expects
fn config_strings(configs: &Map<String, Value>) -> AdminResult<BTreeMap<String, String>> {
    configs
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(AdminError::bad_request(format!(
                        "Config '{}' must be a string, number or boolean",
                        key
                    )))
                }
            };
            Ok((key.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_strings() {
        let configs = json!({
            "retention.ms": 604800000,
            "compression.type": "gzip",
            "unclean.leader.election.enable": false
        });
        let rendered = config_strings(configs.as_object().unwrap()).unwrap();
        assert_eq!(rendered["retention.ms"], "604800000");
        assert_eq!(rendered["compression.type"], "gzip");
        assert_eq!(rendered["unclean.leader.election.enable"], "false");
    }

    #[test]
    fn test_config_strings_rejects_nested_values() {
        let configs = json!({"cleanup.policy": ["delete", "compact"]});
        assert!(matches!(
            config_strings(configs.as_object().unwrap()),
            Err(AdminError::BadRequest { .. })
        ));
        let configs = json!({"retention.ms": null});
        assert!(config_strings(configs.as_object().unwrap()).is_err());
    }
}
