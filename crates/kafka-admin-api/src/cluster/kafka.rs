//! rdkafka-backed cluster administration.
//!
//! Every operation builds its own `AdminClient` from the shared connection
//! settings and drops it when the operation returns. librdkafka calls that
//! block the calling thread (metadata and group listing) run on the blocking
//! pool. Every call is bounded by the configured timeout and never retried.
//! librdkafka's own log and error callbacks are forwarded to `tracing`.

use super::assignment::{decode_assignment, CONSUMER_PROTOCOL_TYPE};
use super::{
    BrokerInfo, ClusterAdmin, ConfigEntryInfo, GroupDescription, GroupListing, GroupMember,
    NewTopicSpec, PartitionInfo, TopicDescription, TopicMetadata, TopicPartition,
};
use crate::config::KafkaConfig;
use crate::error::{AdminError, AdminResult};
use async_trait::async_trait;
use rdkafka::admin::{
    AdminClient, AdminOptions, AlterConfig, NewTopic, ResourceSpecifier, TopicReplication,
};
use rdkafka::bindings as rdsys;
use rdkafka::client::ClientContext;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::metadata::{Metadata, MetadataTopic};
use std::collections::BTreeMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};

type Admin = AdminClient<TracingContext>;

/// Group state the coordinator reports for groups it does not know
const DEAD_GROUP_STATE: &str = "Dead";

/// Client context routing librdkafka diagnostics through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingContext;

impl ClientContext for TracingContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        let level = log_level(level);
        if level == Level::ERROR {
            error!(target: "librdkafka", facility = fac, "{}", log_message);
        } else if level == Level::WARN {
            warn!(target: "librdkafka", facility = fac, "{}", log_message);
        } else if level == Level::INFO {
            info!(target: "librdkafka", facility = fac, "{}", log_message);
        } else {
            debug!(target: "librdkafka", facility = fac, "{}", log_message);
        }
    }

    fn error(&self, error: KafkaError, reason: &str) {
        // Request failures are reported by the caller; these are background broker errors.
        warn!(target: "librdkafka", error = %error, "{}", reason);
    }
}

fn log_level(level: RDKafkaLogLevel) -> Level {
    match level {
        RDKafkaLogLevel::Emerg
        | RDKafkaLogLevel::Alert
        | RDKafkaLogLevel::Critical
        | RDKafkaLogLevel::Error => Level::ERROR,
        RDKafkaLogLevel::Warning => Level::WARN,
        RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => Level::INFO,
        RDKafkaLogLevel::Debug => Level::DEBUG,
    }
}

/// Cluster administration through librdkafka
#[derive(Debug, Clone)]
pub struct KafkaClusterAdmin {
    config: Arc<KafkaConfig>,
}

impl KafkaClusterAdmin {
    pub fn new(config: KafkaConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    fn timeout(&self) -> Duration {
        self.config.request_timeout()
    }

    /// Short-lived admin handle for one request
    fn connect(&self) -> AdminResult<Arc<Admin>> {
        let admin: Admin = self
            .config
            .client_config()
            .create_with_context(TracingContext)?;
        Ok(Arc::new(admin))
    }

    fn options(&self) -> AdminOptions {
        AdminOptions::new()
            .request_timeout(Some(self.timeout()))
            .operation_timeout(Some(self.timeout()))
    }

    /// Fetch full cluster metadata on the blocking pool
    async fn fetch_metadata<T, F>(&self, admin: &Arc<Admin>, extract: F) -> AdminResult<T>
    where
        F: FnOnce(&Metadata) -> T + Send + 'static,
        T: Send + 'static,
    {
        let admin = Arc::clone(admin);
        let timeout = self.timeout();
        tokio::task::spawn_blocking(move || -> AdminResult<T> {
            let metadata = admin.inner().fetch_metadata(None, timeout)?;
            Ok(extract(&metadata))
        })
        .await?
    }
}

#[async_trait]
impl ClusterAdmin for KafkaClusterAdmin {
    async fn brokers(&self) -> AdminResult<Vec<BrokerInfo>> {
        debug!(bootstrap = %self.config.bootstrap_servers, "Fetching broker metadata");
        let admin = self.connect()?;
        self.fetch_metadata(&admin, |metadata| {
            metadata
                .brokers()
                .iter()
                .map(|b| BrokerInfo {
                    id: b.id(),
                    host: b.host().to_string(),
                    port: b.port(),
                })
                .collect()
        })
        .await
    }

    async fn topics(&self) -> AdminResult<Vec<TopicMetadata>> {
        debug!("Fetching topic metadata");
        let admin = self.connect()?;
        self.fetch_metadata(&admin, |metadata| {
            metadata.topics().iter().map(topic_metadata).collect()
        })
        .await
    }

    async fn describe_topic(&self, name: &str) -> AdminResult<Option<TopicDescription>> {
        debug!(topic = name, "Describing topic");
        let admin = self.connect()?;

        // Full listing rather than a targeted fetch, which could auto-create the topic.
        let wanted = name.to_string();
        let metadata = self
            .fetch_metadata(&admin, move |metadata| {
                metadata
                    .topics()
                    .iter()
                    .find(|t| t.name() == wanted)
                    .map(topic_metadata)
            })
            .await?;
        let Some(metadata) = metadata else {
            return Ok(None);
        };

        let results = admin
            .describe_configs(&[ResourceSpecifier::Topic(name)], &self.options())
            .await?;

        let mut configs = BTreeMap::new();
        for result in results {
            let resource = result.map_err(|code| {
                AdminError::Upstream(format!("Failed to describe topic configuration: {}", code))
            })?;
            for entry in resource.entries {
                configs.insert(
                    entry.name,
                    ConfigEntryInfo {
                        value: entry.value,
                        is_default: entry.is_default,
                        is_sensitive: entry.is_sensitive,
                    },
                );
            }
        }

        Ok(Some(TopicDescription { metadata, configs }))
    }

    async fn create_topic(&self, spec: &NewTopicSpec) -> AdminResult<()> {
        debug!(
            topic = %spec.name,
            partitions = spec.partitions,
            replication_factor = spec.replication_factor,
            "Creating topic"
        );
        let admin = self.connect()?;

        let mut topic = NewTopic::new(
            &spec.name,
            spec.partitions,
            TopicReplication::Fixed(spec.replication_factor),
        );
        for (key, value) in &spec.configs {
            topic = topic.set(key, value);
        }

        let results = admin.create_topics(&[topic], &self.options()).await?;
        for result in results {
            if let Err((name, code)) = result {
                warn!(topic = %name, error = %code, "Topic creation rejected");
                return Err(AdminError::Upstream(format!(
                    "Failed to create topic: {}",
                    code
                )));
            }
        }
        Ok(())
    }

    async fn alter_topic_configs(
        &self,
        name: &str,
        configs: &BTreeMap<String, String>,
    ) -> AdminResult<()> {
        debug!(topic = name, entries = configs.len(), "Altering topic configuration");
        let admin = self.connect()?;

        let mut alter = AlterConfig::new(ResourceSpecifier::Topic(name));
        for (key, value) in configs {
            alter = alter.set(key, value);
        }

        let results = admin.alter_configs(&[alter], &self.options()).await?;
        for result in results {
            if let Err((_, code)) = result {
                if code == RDKafkaErrorCode::UnknownTopicOrPartition {
                    return Err(AdminError::NotFound(format!("Topic '{}' not found", name)));
                }
                warn!(topic = name, error = %code, "Configuration change rejected");
                return Err(AdminError::Upstream(format!(
                    "Failed to alter topic configuration: {}",
                    code
                )));
            }
        }
        Ok(())
    }

    async fn consumer_groups(&self) -> AdminResult<Vec<GroupListing>> {
        debug!("Listing consumer groups");
        let admin = self.connect()?;
        let timeout = self.timeout();

        tokio::task::spawn_blocking(move || -> AdminResult<Vec<GroupListing>> {
            let list = list_groups(&admin, None, timeout)?;
            // SAFETY: every pointer read here is owned by `list`.
            let groups: Vec<GroupListing> = unsafe {
                list.groups()
                    .iter()
                    .filter_map(|g| {
                        group_listing(
                            RDKafkaErrorCode::from(g.err),
                            c_string(g.group),
                            c_string(g.state),
                            &c_string(g.protocol_type),
                        )
                    })
                    .collect()
            };
            Ok(groups)
        })
        .await?
    }

    async fn describe_consumer_group(
        &self,
        group_id: &str,
    ) -> AdminResult<Option<GroupDescription>> {
        debug!(group = group_id, "Describing consumer group");
        let group = CString::new(group_id)
            .map_err(|_| AdminError::bad_request("group id must not contain NUL bytes"))?;
        let admin = self.connect()?;
        let timeout = self.timeout();

        tokio::task::spawn_blocking(move || describe_group_blocking(&admin, &group, timeout))
            .await?
    }
}

fn topic_metadata(topic: &MetadataTopic) -> TopicMetadata {
    TopicMetadata::new(
        topic.name(),
        topic
            .partitions()
            .iter()
            .map(|p| PartitionInfo {
                id: p.id(),
                leader: p.leader(),
                replicas: p.replicas().to_vec(),
                isr: p.isr().to_vec(),
            })
            .collect(),
    )
}

/// Owned `rd_kafka_group_list`, destroyed on drop
struct NativeGroupList(*const rdsys::rd_kafka_group_list);

impl NativeGroupList {
    /// Group entries of the listing.
    ///
    /// # Safety
    /// The returned slice and the pointers inside it must not outlive `self`.
    unsafe fn groups(&self) -> &[rdsys::rd_kafka_group_info] {
        if self.0.is_null() {
            return &[];
        }
        native_slice(
            (*self.0).groups as *const rdsys::rd_kafka_group_info,
            (*self.0).group_cnt,
        )
    }
}

impl Drop for NativeGroupList {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { rdsys::rd_kafka_group_list_destroy(self.0) };
        }
    }
}

/// librdkafka group listing, for one group or for all of them.
///
/// rdkafka's safe `GroupInfo` omits the coordinator broker and the per-group
/// error, so the native structure is read directly.
fn list_groups(
    admin: &Admin,
    group: Option<&CStr>,
    timeout: Duration,
) -> AdminResult<NativeGroupList> {
    let timeout_ms = timeout.as_millis().min(c_int::MAX as u128) as c_int;
    let mut list_ptr: *const rdsys::rd_kafka_group_list = ptr::null();

    let err = unsafe {
        rdsys::rd_kafka_list_groups(
            admin.inner().native_ptr(),
            group.map_or(ptr::null(), CStr::as_ptr),
            &mut list_ptr,
            timeout_ms,
        )
    };
    let code = RDKafkaErrorCode::from(err);
    if code != RDKafkaErrorCode::NoError {
        return Err(KafkaError::GroupListFetch(code).into());
    }
    Ok(NativeGroupList(list_ptr))
}

/// Listing entry for a group the coordinator described without error
fn group_listing(
    err: RDKafkaErrorCode,
    group_id: String,
    state: String,
    protocol_type: &str,
) -> Option<GroupListing> {
    if err != RDKafkaErrorCode::NoError {
        debug!(group = %group_id, error = %err, "Skipping group that failed to describe");
        return None;
    }
    Some(GroupListing {
        group_id,
        is_simple_consumer_group: protocol_type.is_empty(),
        state,
    })
}

/// Whether a described group exists. Unknown and dead groups do not; any
/// other per-group error fails the request.
fn group_visible(err: RDKafkaErrorCode, state: &str) -> AdminResult<bool> {
    match err {
        RDKafkaErrorCode::NoError => Ok(state != DEAD_GROUP_STATE),
        RDKafkaErrorCode::GroupIdNotFound => Ok(false),
        code => Err(KafkaError::GroupListFetch(code).into()),
    }
}

fn describe_group_blocking(
    admin: &Admin,
    group: &CStr,
    timeout: Duration,
) -> AdminResult<Option<GroupDescription>> {
    let list = list_groups(admin, Some(group), timeout)?;
    let wanted = group.to_string_lossy();

    // SAFETY: `list` stays alive until the end of this function and every
    // pointer read below is owned by it.
    unsafe {
        let Some(info) = list.groups().iter().find(|g| c_string(g.group) == wanted) else {
            return Ok(None);
        };

        let state = c_string(info.state);
        if !group_visible(RDKafkaErrorCode::from(info.err), &state)? {
            return Ok(None);
        }

        let protocol_type = c_string(info.protocol_type);
        let native_members = native_slice(
            info.members as *const rdsys::rd_kafka_group_member_info,
            info.member_cnt,
        );
        let members = native_members
            .iter()
            .map(|m| {
                let member_id = c_string(m.member_id);
                let bytes = native_slice(
                    m.member_assignment as *const u8,
                    m.member_assignment_size,
                );
                GroupMember {
                    assignment: member_assignment(&protocol_type, &member_id, bytes),
                    client_id: c_string(m.client_id),
                    host: c_string(m.client_host),
                    member_id,
                }
            })
            .collect();

        Ok(Some(GroupDescription {
            group_id: c_string(info.group),
            state,
            protocol: c_string(info.protocol),
            protocol_type,
            coordinator: BrokerInfo {
                id: info.broker.id,
                host: c_string(info.broker.host),
                port: info.broker.port,
            },
            members,
        }))
    }
}

fn member_assignment(
    protocol_type: &str,
    member_id: &str,
    bytes: &[u8],
) -> Vec<TopicPartition> {
    if protocol_type != CONSUMER_PROTOCOL_TYPE {
        return Vec::new();
    }
    decode_assignment(bytes).unwrap_or_else(|e| {
        warn!(member = member_id, error = %e, "Ignoring undecodable member assignment");
        Vec::new()
    })
}

unsafe fn c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

unsafe fn native_slice<'a, T>(ptr: *const T, len: c_int) -> &'a [T] {
    if ptr.is_null() || len <= 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityProtocol;

    // ConsumerProtocolAssignment v0: one topic "orders" with partitions 0 and 1
    const ORDERS_ASSIGNMENT: &[u8] = &[
        0, 0, 0, 0, 0, 1, 0, 6, b'o', b'r', b'd', b'e', b'r', b's', 0, 0, 0, 2, 0, 0, 0, 0, 0, 0,
        0, 1, 0, 0, 0, 0,
    ];

    #[test]
    fn test_member_assignment_for_consumer_groups() {
        let assignment = member_assignment("consumer", "member-1", ORDERS_ASSIGNMENT);
        assert_eq!(
            assignment,
            vec![
                TopicPartition { topic: "orders".to_string(), partition: 0 },
                TopicPartition { topic: "orders".to_string(), partition: 1 },
            ]
        );
    }

    #[test]
    fn test_member_assignment_ignores_other_protocols() {
        assert!(member_assignment("connect", "worker-1", ORDERS_ASSIGNMENT).is_empty());
        assert!(member_assignment("", "member-1", ORDERS_ASSIGNMENT).is_empty());
    }

    #[test]
    fn test_member_assignment_tolerates_garbage() {
        assert!(member_assignment("consumer", "member-1", &[0xff, 0xff, 0x00]).is_empty());
    }

    #[test]
    fn test_group_visibility() {
        assert!(group_visible(RDKafkaErrorCode::NoError, "Stable").unwrap());
        assert!(group_visible(RDKafkaErrorCode::NoError, "Empty").unwrap());
        assert!(!group_visible(RDKafkaErrorCode::NoError, "Dead").unwrap());
        assert!(!group_visible(RDKafkaErrorCode::GroupIdNotFound, "").unwrap());
    }

    #[test]
    fn test_group_describe_error_fails_request() {
        let err = group_visible(RDKafkaErrorCode::CoordinatorNotAvailable, "Stable").unwrap_err();
        assert!(matches!(
            err,
            AdminError::Kafka(KafkaError::GroupListFetch(RDKafkaErrorCode::CoordinatorNotAvailable))
        ));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_group_listing_skips_failed_groups() {
        let listing = group_listing(
            RDKafkaErrorCode::NoError,
            "order-processor".to_string(),
            "Stable".to_string(),
            "consumer",
        )
        .unwrap();
        assert!(!listing.is_simple_consumer_group);
        assert_eq!(listing.state, "Stable");

        let simple = group_listing(
            RDKafkaErrorCode::NoError,
            "offsets-only".to_string(),
            String::new(),
            "",
        )
        .unwrap();
        assert!(simple.is_simple_consumer_group);

        assert!(group_listing(
            RDKafkaErrorCode::CoordinatorLoadInProgress,
            "loading".to_string(),
            String::new(),
            "consumer",
        )
        .is_none());
    }

    #[test]
    fn test_librdkafka_log_levels() {
        assert_eq!(log_level(RDKafkaLogLevel::Critical), Level::ERROR);
        assert_eq!(log_level(RDKafkaLogLevel::Error), Level::ERROR);
        assert_eq!(log_level(RDKafkaLogLevel::Warning), Level::WARN);
        assert_eq!(log_level(RDKafkaLogLevel::Notice), Level::INFO);
        assert_eq!(log_level(RDKafkaLogLevel::Debug), Level::DEBUG);
    }

    #[test]
    fn test_timeouts_follow_config() {
        let admin = KafkaClusterAdmin::new(KafkaConfig {
            request_timeout_secs: 3,
            security_protocol: SecurityProtocol::Plaintext,
            ..Default::default()
        });
        assert_eq!(admin.timeout(), Duration::from_secs(3));
    }
}
