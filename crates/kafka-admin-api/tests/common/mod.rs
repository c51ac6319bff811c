//! In-memory cluster used by the API tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use kafka_admin_api::cluster::{
    BrokerInfo, ClusterAdmin, ConfigEntryInfo, GroupDescription, GroupListing, GroupMember,
    NewTopicSpec, PartitionInfo, TopicDescription, TopicMetadata, TopicPartition,
};
use kafka_admin_api::{api, AdminError, AdminResult, AppState};
use parking_lot::Mutex;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

#[derive(Default)]
pub struct MockCluster {
    pub brokers: Mutex<Vec<BrokerInfo>>,
    pub topics: Mutex<BTreeMap<String, TopicDescription>>,
    pub groups: Mutex<Vec<GroupListing>>,
    pub group_details: Mutex<BTreeMap<String, GroupDescription>>,
    /// Every create request received
    pub created: Mutex<Vec<NewTopicSpec>>,
    /// Every alter request received
    pub altered: Mutex<Vec<(String, BTreeMap<String, String>)>>,
    /// Fail every call as an unreachable cluster would
    pub unreachable: Mutex<bool>,
    calls: AtomicUsize,
}

impl MockCluster {
    /// Three brokers, a few topics and one consumer group
    pub fn populated() -> Arc<Self> {
        let cluster = Self::default();

        *cluster.brokers.lock() = vec![
            broker(3, "kafka-3.internal"),
            broker(1, "kafka-1.internal"),
            broker(2, "kafka-2.internal"),
        ];

        cluster.add_topic("orders", 3, 3);
        cluster.add_topic("payments", 1, 2);
        cluster.add_topic("__consumer_offsets", 50, 3);
        cluster.add_topic("_schemas", 1, 3);
        cluster.add_topic("connect-configs", 1, 3);
        cluster.add_topic("empty-topic", 0, 0);
        cluster.topics.lock().get_mut("orders").unwrap().configs.insert(
            "retention.ms".to_string(),
            ConfigEntryInfo {
                value: Some("604800000".to_string()),
                is_default: false,
                is_sensitive: false,
            },
        );
        cluster.topics.lock().get_mut("orders").unwrap().configs.insert(
            "sasl.jaas.config".to_string(),
            ConfigEntryInfo {
                value: None,
                is_default: true,
                is_sensitive: true,
            },
        );

        *cluster.groups.lock() = vec![
            GroupListing {
                group_id: "order-processor".to_string(),
                is_simple_consumer_group: false,
                state: "Stable".to_string(),
            },
            GroupListing {
                group_id: "legacy-offsets".to_string(),
                is_simple_consumer_group: true,
                state: String::new(),
            },
        ];
        cluster.group_details.lock().insert(
            "order-processor".to_string(),
            GroupDescription {
                group_id: "order-processor".to_string(),
                state: "Stable".to_string(),
                protocol_type: "consumer".to_string(),
                protocol: "range".to_string(),
                coordinator: broker(2, "kafka-2.internal"),
                members: vec![
                    GroupMember {
                        member_id: "consumer-1-abc".to_string(),
                        client_id: "consumer-1".to_string(),
                        host: "/10.0.3.14".to_string(),
                        assignment: vec![
                            TopicPartition {
                                topic: "orders".to_string(),
                                partition: 0,
                            },
                            TopicPartition {
                                topic: "orders".to_string(),
                                partition: 1,
                            },
                        ],
                    },
                    GroupMember {
                        member_id: "consumer-2-def".to_string(),
                        client_id: "consumer-2".to_string(),
                        host: "/10.0.3.15".to_string(),
                        assignment: Vec::new(),
                    },
                ],
            },
        );

        Arc::new(cluster)
    }

    pub fn add_topic(&self, name: &str, partitions: i32, replication_factor: i32) {
        let broker_ids: Vec<i32> = (1..=replication_factor).collect();
        let partitions = (0..partitions)
            .map(|id| PartitionInfo {
                id,
                leader: broker_ids.first().copied().unwrap_or(-1),
                replicas: broker_ids.clone(),
                isr: broker_ids.clone(),
            })
            .collect();
        self.topics.lock().insert(
            name.to_string(),
            TopicDescription {
                metadata: TopicMetadata::new(name, partitions),
                configs: BTreeMap::new(),
            },
        );
    }

    pub fn set_unreachable(&self) {
        *self.unreachable.lock() = true;
    }

    /// Number of cluster calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self) -> AdminResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.unreachable.lock() {
            return Err(AdminError::Kafka(KafkaError::MetadataFetch(
                RDKafkaErrorCode::OperationTimedOut,
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterAdmin for MockCluster {
    async fn brokers(&self) -> AdminResult<Vec<BrokerInfo>> {
        self.call()?;
        Ok(self.brokers.lock().clone())
    }

    async fn topics(&self) -> AdminResult<Vec<TopicMetadata>> {
        self.call()?;
        Ok(self
            .topics
            .lock()
            .values()
            .map(|t| t.metadata.clone())
            .collect())
    }

    async fn describe_topic(&self, name: &str) -> AdminResult<Option<TopicDescription>> {
        self.call()?;
        Ok(self.topics.lock().get(name).cloned())
    }

    async fn create_topic(&self, spec: &NewTopicSpec) -> AdminResult<()> {
        self.call()?;
        self.created.lock().push(spec.clone());

        if self.topics.lock().contains_key(&spec.name) {
            return Err(AdminError::Upstream(
                "Failed to create topic: Broker: Topic already exists".to_string(),
            ));
        }
        if (spec.replication_factor as usize) > self.brokers.lock().len() {
            return Err(AdminError::Upstream(
                "Failed to create topic: Broker: Invalid replication factor".to_string(),
            ));
        }

        self.add_topic(&spec.name, spec.partitions, spec.replication_factor);
        Ok(())
    }

    async fn alter_topic_configs(
        &self,
        name: &str,
        configs: &BTreeMap<String, String>,
    ) -> AdminResult<()> {
        self.call()?;
        self.altered
            .lock()
            .push((name.to_string(), configs.clone()));

        let mut topics = self.topics.lock();
        let topic = topics
            .get_mut(name)
            .ok_or_else(|| AdminError::NotFound(format!("Topic '{}' not found", name)))?;
        for (key, value) in configs {
            topic.configs.insert(
                key.clone(),
                ConfigEntryInfo {
                    value: Some(value.clone()),
                    is_default: false,
                    is_sensitive: false,
                },
            );
        }
        Ok(())
    }

    async fn consumer_groups(&self) -> AdminResult<Vec<GroupListing>> {
        self.call()?;
        Ok(self.groups.lock().clone())
    }

    async fn describe_consumer_group(
        &self,
        group_id: &str,
    ) -> AdminResult<Option<GroupDescription>> {
        self.call()?;
        Ok(self.group_details.lock().get(group_id).cloned())
    }
}

pub fn broker(id: i32, host: &str) -> BrokerInfo {
    BrokerInfo {
        id,
        host: host.to_string(),
        port: 9092,
    }
}

pub fn app(cluster: Arc<MockCluster>) -> Router {
    let state = AppState::with_cluster(cluster);
    api::create_router(state)
}

/// Send one request and decode the JSON response body
pub async fn send(app: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
