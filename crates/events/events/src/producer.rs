//! Event producer: validates events and hands them to the broker.

use crate::broker::{BrokerClient, BrokerRecord, RecordCoordinates};
use crate::config::{EventsConfig, ProducerSettings};
use crate::event::Event;
use crate::metrics::{ErrorKind, MetricsSink};
use crate::schema::SchemaRegistry;
use crate::{EventError, EventResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Turns validated events into transport messages on behalf of any
/// number of concurrent callers.
///
/// The producer starts no background tasks; every publish runs on the
/// calling task and blocks for the duration of the synchronous send.
/// The only internal shared state is the closed flag: every public
/// method takes its read lock, `close` alone takes the write lock. The
/// broker client underneath must be safe for concurrent sends (see
/// [`BrokerClient`]); the producer depends on that contract rather than
/// serializing sends itself.
///
/// The producer never retries. Retry and backoff policy live in the
/// [`ProducerSettings`] the broker client was configured with.
pub struct EventProducer {
    broker: Arc<dyn BrokerClient>,
    topic: String,
    registry: Arc<SchemaRegistry>,
    metrics: Arc<dyn MetricsSink>,
    settings: ProducerSettings,
    validation_enabled: bool,
    closed: RwLock<bool>,
}

impl EventProducer {
    /// Creates a producer bound to a broker client, topic, schema
    /// registry, and metrics sink.
    ///
    /// `settings` is the transport send policy the broker client is
    /// expected to honor; it is fixed here and logged for operators.
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        topic: impl Into<String>,
        registry: Arc<SchemaRegistry>,
        metrics: Arc<dyn MetricsSink>,
        settings: ProducerSettings,
    ) -> Self {
        let topic = topic.into();
        tracing::info!(
            topic = %topic,
            acks = ?settings.acks,
            max_retries = settings.max_retries,
            retry_backoff_ms = settings.retry_backoff_ms,
            compression = %settings.compression,
            batch_size = settings.batch_size,
            "Event producer initialized"
        );

        Self {
            broker,
            topic,
            registry,
            metrics,
            settings,
            validation_enabled: true,
            closed: RwLock::new(false),
        }
    }

    /// Creates a producer from loaded configuration.
    pub fn from_config(
        broker: Arc<dyn BrokerClient>,
        registry: Arc<SchemaRegistry>,
        metrics: Arc<dyn MetricsSink>,
        config: &EventsConfig,
    ) -> Self {
        let mut producer = Self::new(
            broker,
            config.topic.clone(),
            registry,
            metrics,
            config.producer.clone(),
        );
        producer.validation_enabled = config.validation_enabled;
        producer
    }

    /// The topic this producer publishes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The transport send policy fixed at construction.
    pub fn settings(&self) -> &ProducerSettings {
        &self.settings
    }

    /// Whether `close` has been called.
    pub async fn is_closed(&self) -> bool {
        *self.closed.read().await
    }

    /// Validates and publishes a single event.
    ///
    /// On success, returns the partition and offset the broker assigned.
    /// On failure, the matching error metric has already been recorded
    /// and the event was not handed to the broker (validation failures)
    /// or was explicitly rejected by it (transport failures); either
    /// way, the caller learns about it.
    pub async fn publish_event(&self, event: &Event) -> EventResult<RecordCoordinates> {
        self.ensure_open().await?;
        let start = Instant::now();

        let (payload, size) = match self.prepare_payload(event) {
            Ok(prepared) => prepared,
            Err(e) => {
                let kind = match &e {
                    EventError::Validation { .. } => ErrorKind::Validation,
                    _ => ErrorKind::Serialization,
                };
                self.metrics.record_event_error(kind);
                return Err(e);
            }
        };

        if let Err(e) = self.validate(event, &payload).await {
            self.metrics.record_event_error(ErrorKind::Validation);
            return Err(e);
        }

        let record = self.build_record(event, payload);
        match self.broker.send(record).await {
            Ok(coords) => {
                self.metrics
                    .record_event_published(&self.topic, start.elapsed(), size);
                tracing::debug!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    topic = %self.topic,
                    partition = coords.partition,
                    offset = coords.offset,
                    "Event published"
                );
                Ok(coords)
            }
            Err(e) => {
                self.metrics.record_event_error(ErrorKind::Publish);
                Err(EventError::Publish {
                    topic: self.topic.clone(),
                    event_id: event.event_id.clone(),
                    event_type: event.type_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Publishes a single event, abandoning the attempt after `timeout`.
    ///
    /// An abandoned send is best-effort only: the broker may still
    /// deliver the message after the caller has given up on it.
    pub async fn publish_event_timeout(
        &self,
        event: &Event,
        timeout: Duration,
    ) -> EventResult<RecordCoordinates> {
        match tokio::time::timeout(timeout, self.publish_event(event)).await {
            Ok(result) => result,
            Err(_) => {
                self.metrics.record_event_error(ErrorKind::Publish);
                Err(EventError::Publish {
                    topic: self.topic.clone(),
                    event_id: event.event_id.clone(),
                    event_type: event.type_string(),
                    reason: format!(
                        "send abandoned after {}ms; the broker may still deliver it",
                        timeout.as_millis()
                    ),
                })
            }
        }
    }

    /// Validates and publishes a batch of events.
    ///
    /// Every event is serialized and validated before anything is sent;
    /// if the event at index `i` fails, the whole call aborts with an
    /// error naming `i` and the broker sees nothing. On success the full
    /// list goes to the broker as one atomic batch call; there is no
    /// partial-success bookkeeping.
    pub async fn publish_events(&self, events: &[Event]) -> EventResult<Vec<RecordCoordinates>> {
        self.ensure_open().await?;
        if events.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();

        let mut records = Vec::with_capacity(events.len());
        let mut total_bytes = 0u64;
        for (index, event) in events.iter().enumerate() {
            let prepared = self.prepare_payload(event).map_err(|e| {
                self.metrics.record_event_error(ErrorKind::BatchPublish);
                EventError::BatchPublish {
                    topic: self.topic.clone(),
                    index: Some(index),
                    reason: e.to_string(),
                }
            });
            let (payload, size) = match prepared {
                Ok(p) => p,
                Err(e) => return Err(e),
            };

            if let Err(e) = self.validate(event, &payload).await {
                self.metrics.record_event_error(ErrorKind::BatchPublish);
                return Err(EventError::BatchPublish {
                    topic: self.topic.clone(),
                    index: Some(index),
                    reason: e.to_string(),
                });
            }

            total_bytes += size;
            records.push(self.build_record(event, payload));
        }

        match self.broker.send_batch(records).await {
            Ok(coords) => {
                self.metrics.record_batch_published(
                    &self.topic,
                    events.len(),
                    start.elapsed(),
                    total_bytes,
                );
                tracing::debug!(
                    topic = %self.topic,
                    batch_size = events.len(),
                    total_bytes,
                    "Batch published"
                );
                Ok(coords)
            }
            Err(e) => {
                self.metrics.record_event_error(ErrorKind::BatchPublish);
                Err(EventError::BatchPublish {
                    topic: self.topic.clone(),
                    index: None,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Proves broker reachability with a lightweight synthetic publish.
    ///
    /// A failure means the producer is unusable regardless of anything
    /// else; a closed producer refuses the check outright.
    pub async fn health_check(&self) -> EventResult<()> {
        self.ensure_open().await?;

        let probe = Event::simple(
            crate::game_event_types::SYSTEM_HEALTH_CHECK,
            serde_json::json!({"status": "ok"}),
        )
        .with_source("event-producer");

        let payload = self.registry.serialize_event(&probe)?;
        let record = self.build_record(&probe, payload);

        self.broker.send(record).await.map_err(|e| {
            self.metrics.record_event_error(ErrorKind::Publish);
            EventError::Publish {
                topic: self.topic.clone(),
                event_id: probe.event_id.clone(),
                event_type: probe.type_string(),
                reason: format!("health check failed: {e}"),
            }
        })?;

        Ok(())
    }

    /// Closes the producer and releases the broker client.
    ///
    /// Idempotent: the first successful call flips the closed flag;
    /// every later call returns success without touching the client.
    /// A failed teardown leaves the producer open so the caller can
    /// retry the close.
    pub async fn close(&self) -> EventResult<()> {
        let mut closed = self.closed.write().await;
        if *closed {
            return Ok(());
        }

        self.broker.close().await?;
        *closed = true;
        tracing::info!(topic = %self.topic, "Event producer closed");
        Ok(())
    }

    async fn ensure_open(&self) -> EventResult<()> {
        if *self.closed.read().await {
            self.metrics.record_event_error(ErrorKind::Closed);
            return Err(EventError::ProducerClosed);
        }
        Ok(())
    }

    /// Serializes the event and stamps the measured size onto a derived
    /// copy, leaving the caller's event untouched. The size is measured
    /// with `size_bytes` zeroed first, so whatever the caller put there
    /// never influences the result. Returns the wire bytes and their
    /// length.
    fn prepare_payload(&self, event: &Event) -> EventResult<(Vec<u8>, u64)> {
        if event.source.is_empty() {
            return Err(EventError::Validation {
                event_type: event.type_string(),
                reason: "event source must not be empty".to_string(),
            });
        }
        if event.version.is_empty() {
            return Err(EventError::Validation {
                event_type: event.type_string(),
                reason: "event version must not be empty".to_string(),
            });
        }

        let mut stamped = event.clone();
        stamped.metadata.size_bytes = 0;
        let measured = self.registry.serialize_event(&stamped)?;

        stamped.metadata.size_bytes = measured.len() as u64;
        let payload = self.registry.serialize_event(&stamped)?;
        let size = payload.len() as u64;

        Ok((payload, size))
    }

    async fn validate(&self, event: &Event, payload: &[u8]) -> EventResult<()> {
        if !self.validation_enabled {
            return Ok(());
        }
        self.registry.validate_event(&event.event_type, payload).await
    }

    fn build_record(&self, event: &Event, payload: Vec<u8>) -> BrokerRecord {
        let mut headers = vec![
            ("event_type".to_string(), event.type_string()),
            ("source".to_string(), event.source.clone()),
            ("version".to_string(), event.version.clone()),
        ];

        if let Some(id) = &event.correlation_id {
            headers.push(("correlation_id".to_string(), id.clone()));
        }
        if let Some(id) = &event.session_id {
            headers.push(("session_id".to_string(), id.clone()));
        }
        if let Some(id) = &event.player_id {
            headers.push(("player_id".to_string(), id.clone()));
        }
        headers.push(("priority".to_string(), event.metadata.priority.to_string()));
        if let Some(ttl) = event.metadata.ttl {
            headers.push(("ttl_ms".to_string(), ttl.as_millis().to_string()));
        }

        BrokerRecord {
            topic: self.topic.clone(),
            key: event.event_id.clone(),
            payload,
            headers,
        }
    }
}
