//! Configuration for the event publishing core.
//!
//! Transport policy (acks, retries, backoff, compression, batching) is
//! configured once here and consumed by the broker client; the producer
//! never reimplements it.

use crate::schema::{MappingRule, SchemaMapping};
use crate::{EventError, EventResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Acknowledgement level required from the broker before a send counts
/// as successful.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AckPolicy {
    /// Fire and forget.
    None,
    /// Partition leader only.
    Leader,
    /// Full in-sync replica set.
    #[default]
    All,
}

/// Transport-level send policy, consumed by the broker client at
/// construction time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProducerSettings {
    /// Required acknowledgement level.
    pub acks: AckPolicy,
    /// Maximum send attempts inside the broker client.
    pub max_retries: u32,
    /// Backoff between retry attempts, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Compression codec ("snappy", "gzip", "none").
    pub compression: String,
    /// Messages per client-side batch flush.
    pub batch_size: usize,
    /// Maximum linger before a batch flush, in milliseconds.
    pub batch_timeout_ms: u64,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            acks: AckPolicy::All,
            max_retries: 5,
            retry_backoff_ms: 100,
            compression: "snappy".to_string(),
            batch_size: 100,
            batch_timeout_ms: 10,
        }
    }
}

impl ProducerSettings {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }
}

/// Top-level configuration for the event publishing core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EventsConfig {
    /// Destination topic for published events.
    pub topic: String,
    /// Directory of `*.json` schema documents, registered by file stem.
    pub schema_dir: Option<PathBuf>,
    /// Whether schema validation runs on the publish path.
    pub validation_enabled: bool,
    /// Transport send policy.
    pub producer: ProducerSettings,
    /// Event-type to schema-name rules. Empty means the built-in
    /// game-domain table.
    pub mapping: Vec<MappingRule>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            topic: "game-events".to_string(),
            schema_dir: None,
            validation_enabled: true,
            producer: ProducerSettings::default(),
            mapping: Vec::new(),
        }
    }
}

impl EventsConfig {
    /// Loads configuration from a JSON file, then applies environment
    /// overrides (`GAME_EVENTS_TOPIC`, `GAME_EVENTS_SCHEMA_DIR`).
    pub fn from_file(path: impl AsRef<Path>) -> EventResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .map_err(|e| EventError::Config(format!("failed to read {}: {e}", path.display())))?;
        let mut config: Self = serde_json::from_slice(&raw)
            .map_err(|e| EventError::Config(format!("invalid config {}: {e}", path.display())))?;
        config.apply_env();
        Ok(config)
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(topic) = std::env::var("GAME_EVENTS_TOPIC") {
            if !topic.is_empty() {
                self.topic = topic;
            }
        }
        if let Ok(dir) = std::env::var("GAME_EVENTS_SCHEMA_DIR") {
            if !dir.is_empty() {
                self.schema_dir = Some(PathBuf::from(dir));
            }
        }
    }

    /// The mapping table this configuration selects.
    pub fn schema_mapping(&self) -> SchemaMapping {
        if self.mapping.is_empty() {
            SchemaMapping::game_defaults()
        } else {
            SchemaMapping::from_rules(self.mapping.clone())
        }
    }
}
