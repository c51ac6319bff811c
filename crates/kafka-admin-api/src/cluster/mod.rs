//! Cluster administration seam.
//!
//! Handlers talk to the cluster only through [`ClusterAdmin`]. The production
//! implementation is [`KafkaClusterAdmin`]; every value returned here is an
//! owned snapshot fetched for one request and dropped after serialization.

pub mod assignment;
pub mod kafka;

use crate::error::AdminResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub use kafka::KafkaClusterAdmin;

/// Topic name prefixes hidden from topic listings
pub const INTERNAL_TOPIC_PREFIXES: &[&str] = &["_", "connect-"];

/// Administrative operations against the cluster
#[async_trait]
pub trait ClusterAdmin: Send + Sync {
    /// All brokers in the cluster metadata
    async fn brokers(&self) -> AdminResult<Vec<BrokerInfo>>;

    /// All topics in the cluster metadata, internal ones included
    async fn topics(&self) -> AdminResult<Vec<TopicMetadata>>;

    /// Partition layout and topic-level configuration, `None` if unknown
    async fn describe_topic(&self, name: &str) -> AdminResult<Option<TopicDescription>>;

    /// Create one topic and wait for the controller to acknowledge it
    async fn create_topic(&self, spec: &NewTopicSpec) -> AdminResult<()>;

    /// Apply topic-level configuration values
    async fn alter_topic_configs(
        &self,
        name: &str,
        configs: &BTreeMap<String, String>,
    ) -> AdminResult<()>;

    async fn consumer_groups(&self) -> AdminResult<Vec<GroupListing>>;

    /// Group state and membership, `None` if the cluster does not know the group
    async fn describe_consumer_group(&self, group_id: &str)
        -> AdminResult<Option<GroupDescription>>;
}

/// Broker endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

/// Partition leadership and replica placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfo {
    pub id: i32,
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

/// Topic as seen in cluster metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub name: String,
    /// Sorted by partition id
    pub partitions: Vec<PartitionInfo>,
}

impl TopicMetadata {
    pub fn new(name: impl Into<String>, mut partitions: Vec<PartitionInfo>) -> Self {
        partitions.sort_by_key(|p| p.id);
        Self {
            name: name.into(),
            partitions,
        }
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Replica count of the first partition, 0 for a topic without partitions
    pub fn replication_factor(&self) -> usize {
        self.partitions.first().map_or(0, |p| p.replicas.len())
    }

    /// Broker-internal or connector-framework topic
    pub fn is_internal(&self) -> bool {
        is_internal_topic(&self.name)
    }
}

pub fn is_internal_topic(name: &str) -> bool {
    INTERNAL_TOPIC_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// One topic-level configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntryInfo {
    pub value: Option<String>,
    pub is_default: bool,
    pub is_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDescription {
    pub metadata: TopicMetadata,
    pub configs: BTreeMap<String, ConfigEntryInfo>,
}

/// Parameters of a topic creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopicSpec {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
    pub configs: BTreeMap<String, String>,
}

/// Consumer group summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListing {
    pub group_id: String,
    pub is_simple_consumer_group: bool,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDescription {
    pub group_id: String,
    pub state: String,
    pub protocol_type: String,
    pub protocol: String,
    pub coordinator: BrokerInfo,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub member_id: String,
    pub client_id: String,
    pub host: String,
    pub assignment: Vec<TopicPartition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(id: i32, replicas: Vec<i32>) -> PartitionInfo {
        PartitionInfo {
            id,
            leader: replicas[0],
            isr: replicas.clone(),
            replicas,
        }
    }

    #[test]
    fn test_replication_factor_from_first_partition() {
        let topic = TopicMetadata::new(
            "orders",
            vec![partition(1, vec![2, 3]), partition(0, vec![1, 2, 3])],
        );
        assert_eq!(topic.partitions[0].id, 0);
        assert_eq!(topic.partition_count(), 2);
        assert_eq!(topic.replication_factor(), 3);
    }

    #[test]
    fn test_replication_factor_without_partitions() {
        let topic = TopicMetadata::new("empty", Vec::new());
        assert_eq!(topic.partition_count(), 0);
        assert_eq!(topic.replication_factor(), 0);
    }

    #[test]
    fn test_internal_topics() {
        assert!(is_internal_topic("__consumer_offsets"));
        assert!(is_internal_topic("_schemas"));
        assert!(is_internal_topic("connect-offsets"));
        assert!(!is_internal_topic("orders"));
        assert!(!is_internal_topic("my_connect-topic"));
        assert!(!is_internal_topic("connector-events"));
    }
}
