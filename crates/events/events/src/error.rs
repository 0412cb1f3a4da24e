//! Event error types.

use thiserror::Error;

/// Result type for event operations.
pub type EventResult<T> = Result<T, EventError>;

/// Error type for event validation and publishing.
///
/// Errors carry the topic and event coordinates so callers can diagnose
/// a failure without re-deriving producer state. The producer never
/// retries internally; retry and backoff policy live in the broker
/// client configuration.
#[derive(Debug, Error)]
pub enum EventError {
    /// Event could not be turned into wire bytes.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Payload failed the schema bound to its event type.
    #[error("Validation error for {event_type}: {reason}")]
    Validation { event_type: String, reason: String },

    /// A schema file exists but could not be compiled.
    #[error("Schema '{name}' failed to compile: {reason}")]
    SchemaCompile { name: String, reason: String },

    /// Transport rejected a single send.
    #[error("Publish to '{topic}' failed for event {event_id} ({event_type}): {reason}")]
    Publish {
        topic: String,
        event_id: String,
        event_type: String,
        reason: String,
    },

    /// Transport or validation rejected a batch. When the failure is
    /// attributable to one event, `index` names its position in the batch.
    #[error("Batch publish to '{topic}' failed{}: {reason}", fmt_index(.index))]
    BatchPublish {
        topic: String,
        index: Option<usize>,
        reason: String,
    },

    /// Method called after `close()`.
    #[error("Producer is closed")]
    ProducerClosed,

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn fmt_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" at index {i}"),
        None => String::new(),
    }
}

impl EventError {
    /// The batch index this error is attributable to, when determinable.
    pub fn batch_index(&self) -> Option<usize> {
        match self {
            EventError::BatchPublish { index, .. } => *index,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_error_names_index() {
        let err = EventError::BatchPublish {
            topic: "game-events".to_string(),
            index: Some(1),
            reason: "missing required field".to_string(),
        };
        assert_eq!(err.batch_index(), Some(1));
        assert!(err.to_string().contains("index 1"));

        let err = EventError::BatchPublish {
            topic: "game-events".to_string(),
            index: None,
            reason: "broker unreachable".to_string(),
        };
        assert_eq!(err.batch_index(), None);
        assert!(!err.to_string().contains("index"));
    }

    #[test]
    fn test_publish_error_context() {
        let err = EventError::Publish {
            topic: "game-events".to_string(),
            event_id: "e-1".to_string(),
            event_type: "combat.session.start".to_string(),
            reason: "timed out".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("game-events"));
        assert!(msg.contains("e-1"));
        assert!(msg.contains("combat.session.start"));
    }
}
