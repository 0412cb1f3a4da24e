//! Metrics sink abstraction.
//!
//! The producer reports every outcome here before returning, so failure
//! rates stay observable even when callers swallow errors. The sink is a
//! collaborator: production wiring plugs in a real metrics backend, the
//! bundled implementations cover logging and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// The error classes the producer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Serialization,
    Validation,
    Publish,
    BatchPublish,
    Closed,
}

impl ErrorKind {
    /// Stable label for metric tagging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Serialization => "serialization",
            ErrorKind::Validation => "validation",
            ErrorKind::Publish => "publish",
            ErrorKind::BatchPublish => "batch_publish",
            ErrorKind::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Instrumentation collaborator for the producer.
///
/// Implementations must be safe to call from many tasks concurrently.
pub trait MetricsSink: Send + Sync {
    /// A single event reached the broker.
    fn record_event_published(&self, topic: &str, duration: Duration, size_bytes: u64);

    /// A publish attempt failed; `kind` names the failing stage.
    fn record_event_error(&self, kind: ErrorKind);

    /// A batch reached the broker.
    fn record_batch_published(
        &self,
        topic: &str,
        batch_size: usize,
        duration: Duration,
        total_bytes: u64,
    );
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_event_published(&self, _topic: &str, _duration: Duration, _size_bytes: u64) {}

    fn record_event_error(&self, _kind: ErrorKind) {}

    fn record_batch_published(
        &self,
        _topic: &str,
        _batch_size: usize,
        _duration: Duration,
        _total_bytes: u64,
    ) {
    }
}

/// Sink that emits structured trace records, for deployments without a
/// dedicated metrics backend.
#[derive(Debug, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record_event_published(&self, topic: &str, duration: Duration, size_bytes: u64) {
        tracing::debug!(
            topic,
            duration_ms = duration.as_millis() as u64,
            size_bytes,
            "Event published"
        );
    }

    fn record_event_error(&self, kind: ErrorKind) {
        tracing::warn!(error_kind = %kind, "Event publish error");
    }

    fn record_batch_published(
        &self,
        topic: &str,
        batch_size: usize,
        duration: Duration,
        total_bytes: u64,
    ) {
        tracing::debug!(
            topic,
            batch_size,
            duration_ms = duration.as_millis() as u64,
            total_bytes,
            "Batch published"
        );
    }
}

/// Counting sink for tests and introspection.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    events_published: AtomicU64,
    batches_published: AtomicU64,
    events_in_batches: AtomicU64,
    bytes_published: AtomicU64,
    errors: RwLock<HashMap<ErrorKind, usize>>,
    total_errors: AtomicUsize,
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::SeqCst)
    }

    pub fn batches_published(&self) -> u64 {
        self.batches_published.load(Ordering::SeqCst)
    }

    pub fn events_in_batches(&self) -> u64 {
        self.events_in_batches.load(Ordering::SeqCst)
    }

    pub fn bytes_published(&self) -> u64 {
        self.bytes_published.load(Ordering::SeqCst)
    }

    pub fn total_errors(&self) -> usize {
        self.total_errors.load(Ordering::SeqCst)
    }

    /// Number of errors recorded for one kind.
    pub fn errors_of(&self, kind: ErrorKind) -> usize {
        self.errors
            .read()
            .map(|map| map.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl MetricsSink for CountingMetrics {
    fn record_event_published(&self, _topic: &str, _duration: Duration, size_bytes: u64) {
        self.events_published.fetch_add(1, Ordering::SeqCst);
        self.bytes_published.fetch_add(size_bytes, Ordering::SeqCst);
    }

    fn record_event_error(&self, kind: ErrorKind) {
        self.total_errors.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut map) = self.errors.write() {
            *map.entry(kind).or_insert(0) += 1;
        }
    }

    fn record_batch_published(
        &self,
        _topic: &str,
        batch_size: usize,
        _duration: Duration,
        total_bytes: u64,
    ) {
        self.batches_published.fetch_add(1, Ordering::SeqCst);
        self.events_in_batches
            .fetch_add(batch_size as u64, Ordering::SeqCst);
        self.bytes_published.fetch_add(total_bytes, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_metrics() {
        let metrics = CountingMetrics::new();

        metrics.record_event_published("game-events", Duration::from_millis(3), 128);
        metrics.record_batch_published("game-events", 5, Duration::from_millis(9), 640);
        metrics.record_event_error(ErrorKind::Validation);
        metrics.record_event_error(ErrorKind::Validation);
        metrics.record_event_error(ErrorKind::Publish);

        assert_eq!(metrics.events_published(), 1);
        assert_eq!(metrics.batches_published(), 1);
        assert_eq!(metrics.events_in_batches(), 5);
        assert_eq!(metrics.bytes_published(), 768);
        assert_eq!(metrics.errors_of(ErrorKind::Validation), 2);
        assert_eq!(metrics.errors_of(ErrorKind::Publish), 1);
        assert_eq!(metrics.errors_of(ErrorKind::Serialization), 0);
        assert_eq!(metrics.total_errors(), 3);
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::Validation.as_str(), "validation");
        assert_eq!(ErrorKind::BatchPublish.to_string(), "batch_publish");
    }
}
