//! Per-domain publish helpers for calling services.

use crate::builder::ServiceEventBuilder;
use game_events::{Event, EventProducer, EventResult, RecordCoordinates};
use serde::Serialize;
use std::sync::Arc;

/// Convenience wrapper around an [`EventProducer`] that stamps service
/// provenance and fills the common correlation fields per domain.
pub struct GameEventPublisher {
    producer: Arc<EventProducer>,
    builder: ServiceEventBuilder,
}

impl GameEventPublisher {
    /// Creates a publisher for a source service.
    pub fn new(producer: Arc<EventProducer>, source: impl Into<String>) -> Self {
        Self {
            producer,
            builder: ServiceEventBuilder::new(source),
        }
    }

    /// Creates a publisher with a preconfigured builder.
    pub fn with_builder(producer: Arc<EventProducer>, builder: ServiceEventBuilder) -> Self {
        Self { producer, builder }
    }

    /// The underlying producer.
    pub fn producer(&self) -> &EventProducer {
        &self.producer
    }

    /// Publishes a fully built event.
    pub async fn publish(&self, event: &Event) -> EventResult<RecordCoordinates> {
        self.producer.publish_event(event).await
    }

    /// Publishes an event about a player.
    pub async fn publish_player_event(
        &self,
        player_id: impl Into<String>,
        event_type: impl Into<String>,
        data: impl Serialize,
    ) -> EventResult<RecordCoordinates> {
        let event = self
            .builder
            .build_simple(event_type, data)
            .with_player_id(player_id);
        self.producer.publish_event(&event).await
    }

    /// Publishes an event about a game instance.
    pub async fn publish_game_event(
        &self,
        game_id: impl Into<String>,
        event_type: impl Into<String>,
        data: impl Serialize,
    ) -> EventResult<RecordCoordinates> {
        let event = self
            .builder
            .build_simple(event_type, data)
            .with_game_id(game_id);
        self.producer.publish_event(&event).await
    }

    /// Publishes an event scoped to a combat/game session.
    pub async fn publish_session_event(
        &self,
        session_id: impl Into<String>,
        event_type: impl Into<String>,
        data: impl Serialize,
    ) -> EventResult<RecordCoordinates> {
        let event = self
            .builder
            .build_simple(event_type, data)
            .with_session_id(session_id);
        self.producer.publish_event(&event).await
    }

    /// Publishes a system-wide event.
    pub async fn publish_system_event(
        &self,
        event_type: impl Into<String>,
        data: impl Serialize,
    ) -> EventResult<RecordCoordinates> {
        let event = self.builder.build_simple(event_type, data);
        self.producer.publish_event(&event).await
    }
}
