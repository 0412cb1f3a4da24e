//! Event types and structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// An immutable domain event destined for the message bus.
///
/// The `event_id` doubles as the broker partition key, so two messages
/// carrying the same id always land on the same partition. It is generated
/// once at construction and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Unique identifier for this event instance. Broker partition key.
    pub event_id: String,
    /// The event type (dot-namespaced, e.g. "combat.session.start").
    pub event_type: EventType,
    /// Service that produced the event.
    pub source: String,
    /// Schema version tag for the payload.
    pub version: String,
    /// Timestamp when the event was created.
    pub timestamp: DateTime<Utc>,
    /// The event payload. This is the part validated against a schema.
    pub data: Value,
    /// Optional correlation ID for tracing related events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Optional combat/game session this event belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Optional player the event is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    /// Optional game instance the event is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    /// Optional distributed trace ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Ordered list of free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Event metadata.
    #[serde(default)]
    pub metadata: EventMetadata,
}

impl Event {
    /// Creates a new event with the given type and payload.
    pub fn new(event_type: EventType, data: impl Serialize) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type,
            source: String::new(),
            version: "1.0".to_string(),
            timestamp: Utc::now(),
            data: serde_json::to_value(data).unwrap_or(Value::Null),
            correlation_id: None,
            session_id: None,
            player_id: None,
            game_id: None,
            trace_id: None,
            tags: Vec::new(),
            metadata: EventMetadata::default(),
        }
    }

    /// Creates a new event from a simple type string (e.g., "combat.session.start").
    pub fn simple(event_type: impl Into<String>, data: impl Serialize) -> Self {
        Self::new(EventType::from_string(event_type), data)
    }

    /// Sets the producing service.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the schema version tag.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the correlation ID for tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Sets the session this event belongs to.
    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Sets the player the event is about.
    pub fn with_player_id(mut self, id: impl Into<String>) -> Self {
        self.player_id = Some(id.into());
        self
    }

    /// Sets the game instance the event is about.
    pub fn with_game_id(mut self, id: impl Into<String>) -> Self {
        self.game_id = Some(id.into());
        self
    }

    /// Sets the distributed trace ID.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Appends a tag. Tag order is preserved.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the delivery priority.
    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.metadata.priority = priority;
        self
    }

    /// Sets a time-to-live after which consumers may discard the event.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.metadata.ttl = Some(ttl);
        self
    }

    /// Returns the full event type string (e.g., "combat.session.start").
    pub fn type_string(&self) -> String {
        self.event_type.to_string()
    }

    /// Deserializes the payload to a specific type.
    pub fn data_as<T: for<'de> Deserialize<'de>>(&self) -> Option<T> {
        serde_json::from_value(self.data.clone()).ok()
    }
}

/// Event type identifier with a namespace and a dotted name.
///
/// Serialized on the wire as its dot-joined string form, so
/// `combat.session.start` round-trips as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub struct EventType {
    /// Domain namespace (e.g., "combat", "economy", "social").
    pub namespace: String,
    /// Event name within the namespace (e.g., "session.start").
    pub name: String,
}

impl EventType {
    /// Creates a new event type.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parses an event type from a string like "combat.session.start".
    ///
    /// The first segment becomes the namespace; the rest is the name.
    pub fn from_string(s: impl Into<String>) -> Self {
        let s = s.into();
        match s.split_once('.') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Self::new("unknown", s),
        }
    }

    /// Checks if this event type matches a pattern (supports wildcards).
    ///
    /// Patterns support:
    /// - Exact match: "combat.session.start"
    /// - Prefix wildcard: "combat.session.*" or "combat.*"
    /// - All events: "*"
    pub fn matches(&self, pattern: &str) -> bool {
        let full = self.to_string();

        if pattern == "*" {
            return true;
        }

        if let Some(prefix) = pattern.strip_suffix(".*") {
            return full == prefix || full.starts_with(&format!("{prefix}."));
        }

        full == pattern
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl From<EventType> for String {
    fn from(et: EventType) -> Self {
        et.to_string()
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Delivery priority carried in the transport headers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl std::fmt::Display for EventPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventPriority::Low => "low",
            EventPriority::Normal => "normal",
            EventPriority::High => "high",
            EventPriority::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Metadata associated with an event.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EventMetadata {
    /// Delivery priority.
    #[serde(default)]
    pub priority: EventPriority,
    /// Time-to-live after which the event may be discarded by consumers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Duration>,
    /// Number of delivery attempts so far. Maintained by consumers.
    #[serde(default)]
    pub retry_count: u32,
    /// Compression codec applied to the payload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    /// Serialized size in bytes. Derived from the actual wire bytes,
    /// never trusted from the caller.
    #[serde(default)]
    pub size_bytes: u64,
}
