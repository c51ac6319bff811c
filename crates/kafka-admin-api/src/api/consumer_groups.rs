//! Consumer group endpoints.

use super::{brokers::Broker, ApiStatus};
use crate::{
    cluster::{self, GroupDescription, GroupListing},
    error::{AdminError, AdminResult},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

const UNKNOWN_STATE: &str = "UNKNOWN";

/// Consumer group summary
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupSummary {
    pub group_id: String,

    /// True for groups without a group protocol (manual assignment only)
    pub is_simple_consumer_group: bool,

    /// "UNKNOWN" when the cluster does not report a state
    pub state: String,
}

/// Consumer group listing
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupList {
    pub consumer_groups: Vec<GroupSummary>,
    pub count: usize,
    pub status: ApiStatus,
}

/// Group member
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupMember {
    pub member_id: String,
    pub client_id: String,

    /// Client host
    pub host: String,

    pub assignment: Vec<TopicPartition>,
}

/// Topic partition
#[derive(Debug, Serialize, ToSchema)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

/// Consumer group description
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupDetail {
    pub group_id: String,
    pub state: String,
    pub protocol_type: String,

    /// Assignment strategy, e.g. "range"
    pub protocol: String,

    /// Group coordinator broker
    pub coordinator: Broker,

    pub members: Vec<GroupMember>,
    pub member_count: usize,
    pub status: ApiStatus,
}

impl From<GroupListing> for GroupSummary {
    fn from(group: GroupListing) -> Self {
        Self {
            group_id: group.group_id,
            is_simple_consumer_group: group.is_simple_consumer_group,
            state: if group.state.is_empty() {
                UNKNOWN_STATE.to_string()
            } else {
                group.state
            },
        }
    }
}

impl From<cluster::GroupMember> for GroupMember {
    fn from(member: cluster::GroupMember) -> Self {
        Self {
            member_id: member.member_id,
            client_id: member.client_id,
            host: member.host,
            assignment: member
                .assignment
                .into_iter()
                .map(|tp| TopicPartition {
                    topic: tp.topic,
                    partition: tp.partition,
                })
                .collect(),
        }
    }
}

impl From<GroupDescription> for GroupDetail {
    fn from(group: GroupDescription) -> Self {
        let members: Vec<GroupMember> = group.members.into_iter().map(GroupMember::from).collect();
        Self {
            group_id: group.group_id,
            state: group.state,
            protocol_type: group.protocol_type,
            protocol: group.protocol,
            coordinator: Broker::from(group.coordinator),
            member_count: members.len(),
            members,
            status: ApiStatus::Success,
        }
    }
}

/// List consumer groups
#[utoipa::path(
    get,
    path = "/consumer-groups",
    responses(
        (status = 200, description = "Consumer groups", body = GroupList),
        (status = 500, description = "Cluster unreachable or request timed out"),
    ),
    tag = "consumer-groups"
)]
pub async fn list_groups(State(state): State<AppState>) -> AdminResult<Json<GroupList>> {
    let mut groups: Vec<GroupSummary> = state
        .cluster
        .consumer_groups()
        .await?
        .into_iter()
        .map(GroupSummary::from)
        .collect();
    groups.sort_by(|a, b| a.group_id.cmp(&b.group_id));

    info!(count = groups.len(), "Listed consumer groups");
    Ok(Json(GroupList {
        count: groups.len(),
        consumer_groups: groups,
        status: ApiStatus::Success,
    }))
}

/// Describe consumer group
#[utoipa::path(
    get,
    path = "/consumer-groups/{id}",
    params(
        ("id" = String, Path, description = "Group ID")
    ),
    responses(
        (status = 200, description = "Group state and members", body = GroupDetail),
        (status = 404, description = "Group not found"),
    ),
    tag = "consumer-groups"
)]
pub async fn describe_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AdminResult<Json<GroupDetail>> {
    let group = state
        .cluster
        .describe_consumer_group(&id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("Consumer group '{}' not found", id)))?;

    Ok(Json(GroupDetail::from(group)))
}
