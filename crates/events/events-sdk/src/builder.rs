//! Event builder utilities for calling services.

use game_events::{Event, EventPriority, EventType};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Builder for creating events with service-specific defaults.
///
/// A service constructs one of these once and stamps its provenance
/// (source, correlation, tags) onto every event it builds.
pub struct ServiceEventBuilder {
    source: String,
    version: Option<String>,
    default_tags: Vec<String>,
    correlation_id: Option<String>,
}

impl ServiceEventBuilder {
    /// Creates a new builder for a source service.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            version: None,
            default_tags: Vec::new(),
            correlation_id: None,
        }
    }

    /// Sets the schema version tag applied to all events.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Adds a default tag appended to all events.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tags.push(tag.into());
        self
    }

    /// Sets the correlation ID for event tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builds an event with the configured defaults.
    pub fn build(&self, event_type: EventType, data: impl Serialize) -> Event {
        let mut event = Event::new(event_type, data).with_source(&self.source);

        if let Some(ref version) = self.version {
            event = event.with_version(version);
        }
        for tag in &self.default_tags {
            event = event.with_tag(tag);
        }
        if let Some(ref correlation_id) = self.correlation_id {
            event = event.with_correlation_id(correlation_id);
        }

        event
    }

    /// Builds an event from a type string.
    pub fn build_simple(&self, event_type: impl Into<String>, data: impl Serialize) -> Event {
        self.build(EventType::from_string(event_type), data)
    }

    /// Creates a child builder bound to a specific correlation ID.
    pub fn child(&self, correlation_id: impl Into<String>) -> Self {
        Self {
            source: self.source.clone(),
            version: self.version.clone(),
            default_tags: self.default_tags.clone(),
            correlation_id: Some(correlation_id.into()),
        }
    }
}

/// Builder for constructing event payloads field by field.
pub struct EventPayloadBuilder {
    data: HashMap<String, Value>,
    priority: Option<EventPriority>,
}

impl EventPayloadBuilder {
    /// Creates a new payload builder.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            priority: None,
        }
    }

    /// Adds a field to the payload.
    pub fn field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.data.insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
        self
    }

    /// Adds an optional field (only if Some).
    pub fn optional<T: Serialize>(self, key: impl Into<String>, value: Option<T>) -> Self {
        if let Some(v) = value {
            self.field(key, v)
        } else {
            self
        }
    }

    /// Sets the priority on the produced event.
    pub fn priority(mut self, priority: EventPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Builds the payload as a JSON Value.
    pub fn build(self) -> Value {
        Value::Object(self.data.into_iter().collect())
    }

    /// Builds the payload and creates an event of the given type.
    pub fn into_event(self, event_type: impl Into<String>) -> Event {
        let priority = self.priority;
        let mut event = Event::simple(event_type, self.build());
        if let Some(priority) = priority {
            event = event.with_priority(priority);
        }
        event
    }
}

impl Default for EventPayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_event_builder() {
        let builder = ServiceEventBuilder::new("combat-service")
            .with_version("2.0")
            .with_tag("eu-west")
            .with_correlation_id("corr-1");

        let event = builder.build_simple(
            "combat.session.start",
            serde_json::json!({"session_id": "s-1"}),
        );

        assert_eq!(event.source, "combat-service");
        assert_eq!(event.version, "2.0");
        assert_eq!(event.tags, vec!["eu-west"]);
        assert_eq!(event.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(event.event_type.namespace, "combat");
    }

    #[test]
    fn test_child_builder_overrides_correlation() {
        let builder = ServiceEventBuilder::new("economy-service");
        let child = builder.child("corr-2");

        let event = child.build_simple("economy.trade.completed", serde_json::json!({}));
        assert_eq!(event.correlation_id.as_deref(), Some("corr-2"));
        assert_eq!(event.source, "economy-service");
    }

    #[test]
    fn test_payload_builder() {
        let payload = EventPayloadBuilder::new()
            .field("buyer_id", "p-1")
            .field("seller_id", "p-2")
            .field("gold", 120)
            .field("escrow", true)
            .optional("note", Some("first trade"))
            .optional::<String>("discount", None)
            .build();

        assert_eq!(payload["buyer_id"], "p-1");
        assert_eq!(payload["gold"], 120);
        assert_eq!(payload["escrow"], true);
        assert_eq!(payload["note"], "first trade");
        assert!(payload.get("discount").is_none());
    }

    #[test]
    fn test_payload_builder_into_event() {
        let event = EventPayloadBuilder::new()
            .field("tick", 42)
            .priority(EventPriority::Low)
            .into_event("world.tick");

        assert_eq!(event.event_type.namespace, "world");
        assert_eq!(event.metadata.priority, EventPriority::Low);
    }
}
