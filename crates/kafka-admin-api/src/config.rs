//! Admin API configuration.
//!
//! Configuration is resolved once at startup: defaults, then an optional TOML
//! file named by `KAFKA_ADMIN_CONFIG`, then environment overrides.
//!
//! ```bash
//! BOOTSTRAP_SERVERS=broker-1:9092,broker-2:9092
//! SECURITY_PROTOCOL=SASL_SSL
//! SASL_MECHANISM=SCRAM-SHA-512
//! SASL_USERNAME=admin
//! SASL_PASSWORD=secret
//! SSL_VERIFY_CERTIFICATES=false
//! KAFKA_REQUEST_TIMEOUT_SECS=10
//! ADMIN_API_PORT=2020
//! ```

use rdkafka::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an optional TOML config file
pub const CONFIG_FILE_ENV: &str = "KAFKA_ADMIN_CONFIG";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Admin API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Kafka connection parameters shared by every admin client handle
    pub kafka: KafkaConfig,

    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub address: String,

    /// Listen port
    pub port: u16,
}

/// Kafka connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Comma-separated host:port list
    pub bootstrap_servers: String,

    /// Transport security
    pub security_protocol: SecurityProtocol,

    /// SASL settings, required for the SASL protocols
    pub sasl: Option<SaslConfig>,

    /// Verify broker certificates and hostnames
    pub ssl_verify_certificates: bool,

    /// CA bundle path
    pub ssl_ca_location: Option<String>,

    /// Client id reported to the brokers
    pub client_id: String,

    /// Bound on every cluster call, in seconds
    pub request_timeout_secs: u64,
}

/// Transport security mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityProtocol {
    #[serde(rename = "PLAINTEXT", alias = "plaintext")]
    Plaintext,
    #[serde(rename = "SSL", alias = "ssl")]
    Ssl,
    #[serde(rename = "SASL_PLAINTEXT", alias = "sasl_plaintext")]
    SaslPlaintext,
    #[serde(rename = "SASL_SSL", alias = "sasl_ssl")]
    SaslSsl,
}

/// SASL mechanism and credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct SaslConfig {
    /// Mechanism, e.g. SCRAM-SHA-512 or PLAIN
    #[serde(default = "default_sasl_mechanism")]
    pub mechanism: String,

    /// Username
    pub username: String,

    /// Password
    pub password: String,
}

fn default_sasl_mechanism() -> String {
    "SCRAM-SHA-512".to_string()
}

impl fmt::Debug for SaslConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslConfig")
            .field("mechanism", &self.mechanism)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SecurityProtocol {
    /// librdkafka `security.protocol` value
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityProtocol::Plaintext => "PLAINTEXT",
            SecurityProtocol::Ssl => "SSL",
            SecurityProtocol::SaslPlaintext => "SASL_PLAINTEXT",
            SecurityProtocol::SaslSsl => "SASL_SSL",
        }
    }

    pub fn uses_sasl(&self) -> bool {
        matches!(self, SecurityProtocol::SaslPlaintext | SecurityProtocol::SaslSsl)
    }

    pub fn uses_tls(&self) -> bool {
        matches!(self, SecurityProtocol::Ssl | SecurityProtocol::SaslSsl)
    }
}

impl FromStr for SecurityProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLAINTEXT" => Ok(SecurityProtocol::Plaintext),
            "SSL" | "TLS" => Ok(SecurityProtocol::Ssl),
            "SASL_PLAINTEXT" => Ok(SecurityProtocol::SaslPlaintext),
            "SASL_SSL" => Ok(SecurityProtocol::SaslSsl),
            _ => Err(ConfigError::InvalidValue {
                key: "SECURITY_PROTOCOL",
                value: s.to_string(),
            }),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            kafka: KafkaConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 2020,
        }
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            security_protocol: SecurityProtocol::Plaintext,
            sasl: None,
            ssl_verify_certificates: true,
            ssl_ca_location: None,
            client_id: "kafka-admin-api".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl AdminConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve environment variables
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_FILE_ENV) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup("ADMIN_API_ADDRESS") {
            self.server.address = address;
        }
        if let Some(port) = lookup("ADMIN_API_PORT") {
            self.server.port = parse_value("ADMIN_API_PORT", &port)?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }

        let kafka = &mut self.kafka;
        if let Some(servers) = lookup("BOOTSTRAP_SERVERS") {
            kafka.bootstrap_servers = servers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(",");
        }
        if let Some(protocol) = lookup("SECURITY_PROTOCOL") {
            kafka.security_protocol = protocol.parse()?;
        }
        if let Some(verify) = lookup("SSL_VERIFY_CERTIFICATES") {
            kafka.ssl_verify_certificates = parse_bool("SSL_VERIFY_CERTIFICATES", &verify)?;
        }
        if let Some(ca) = lookup("SSL_CA_LOCATION") {
            kafka.ssl_ca_location = Some(ca);
        }
        if let Some(client_id) = lookup("KAFKA_CLIENT_ID") {
            kafka.client_id = client_id;
        }
        if let Some(timeout) = lookup("KAFKA_REQUEST_TIMEOUT_SECS") {
            kafka.request_timeout_secs = parse_value("KAFKA_REQUEST_TIMEOUT_SECS", &timeout)?;
        }

        let mechanism = lookup("SASL_MECHANISM");
        let username = lookup("SASL_USERNAME");
        let password = lookup("SASL_PASSWORD");
        if mechanism.is_some() || username.is_some() || password.is_some() {
            let sasl = kafka.sasl.get_or_insert_with(|| SaslConfig {
                mechanism: default_sasl_mechanism(),
                username: String::new(),
                password: String::new(),
            });
            if let Some(mechanism) = mechanism {
                sasl.mechanism = mechanism;
            }
            if let Some(username) = username {
                sasl.username = username;
            }
            if let Some(password) = password {
                sasl.password = password;
            }
        }

        Ok(())
    }

    /// Check settings that would otherwise only fail on the first request
    pub fn validate(&self) -> Result<(), ConfigError> {
        let kafka = &self.kafka;
        if kafka.bootstrap_servers.trim().is_empty() {
            return Err(ConfigError::Invalid("bootstrap_servers cannot be empty".to_string()));
        }
        if kafka.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".to_string()));
        }
        if kafka.security_protocol.uses_sasl() {
            match &kafka.sasl {
                Some(sasl) if !sasl.username.is_empty() && !sasl.password.is_empty() => {}
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "{} requires SASL username and password",
                        kafka.security_protocol.as_str()
                    )))
                }
            }
        }
        Ok(())
    }
}

impl KafkaConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the rdkafka client configuration for an admin client handle
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("client.id", &self.client_id)
            .set("security.protocol", self.security_protocol.as_str())
            .set(
                "socket.timeout.ms",
                self.request_timeout().as_millis().to_string(),
            );

        if self.security_protocol.uses_sasl() {
            if let Some(sasl) = &self.sasl {
                config
                    .set("sasl.mechanism", &sasl.mechanism)
                    .set("sasl.username", &sasl.username)
                    .set("sasl.password", &sasl.password);
            }
        }

        if self.security_protocol.uses_tls() {
            if let Some(ca) = &self.ssl_ca_location {
                config.set("ssl.ca.location", ca);
            }
            if !self.ssl_verify_certificates {
                config
                    .set("enable.ssl.certificate.verification", "false")
                    .set("ssl.endpoint.identification.algorithm", "none");
            }
        }

        config
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
