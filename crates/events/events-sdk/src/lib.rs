//! # Game Events SDK
//!
//! SDK for services that publish game events.
//!
//! This crate sits on top of `game_events` and provides:
//! - A builder that stamps service provenance onto every event
//! - Per-domain publish helpers for player, game, session, and system events
//!
//! ## Example
//!
//! ```rust,ignore
//! use game_events_sdk::GameEventPublisher;
//! use serde_json::json;
//!
//! let publisher = GameEventPublisher::new(producer, "matchmaking-service");
//!
//! publisher
//!     .publish_player_event("p-42", "social.interaction", json!({"kind": "wave"}))
//!     .await?;
//! ```

mod builder;
mod publisher;

pub use builder::{EventPayloadBuilder, ServiceEventBuilder};
pub use publisher::GameEventPublisher;

// Re-export core event types for convenience
pub use game_events::{
    BrokerClient, BrokerRecord, Event, EventError, EventMetadata, EventPriority, EventProducer,
    EventResult, EventType, MetricsSink, RecordCoordinates, SchemaRegistry, game_event_types,
};
