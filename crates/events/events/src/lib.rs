//! # Game Events
//!
//! Event validation and publishing core for the game platform:
//! - Structured domain events (combat sessions, economy actions, social
//!   events, world ticks) with correlation metadata
//! - Schema registry with compiled JSON Schema validation and a
//!   declarative event-type to schema mapping
//! - A producer that validates events before handing them to a
//!   partitioned, append-only broker behind a narrow publish-only trait
//! - Metrics sink collaborator so every outcome is observable
//!
//! ## Example
//!
//! ```rust,ignore
//! use game_events::{Event, EventProducer, InMemoryBroker, ProducerSettings,
//!     SchemaRegistry, TracingMetrics};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SchemaRegistry::new());
//! registry.register_schema("combat-session-events", "schemas/combat-session.json").await?;
//!
//! let producer = EventProducer::new(
//!     Arc::new(InMemoryBroker::new()),
//!     "game-events",
//!     registry,
//!     Arc::new(TracingMetrics),
//!     ProducerSettings::default(),
//! );
//!
//! let event = Event::simple("combat.session.start", serde_json::json!({
//!     "session_id": "s-1",
//!     "map": "arena",
//! }))
//! .with_source("combat-service");
//!
//! let coords = producer.publish_event(&event).await?;
//! ```

mod broker;
mod config;
mod error;
mod event;
mod metrics;
mod producer;
pub mod schema;

pub use broker::{BrokerClient, BrokerRecord, InMemoryBroker, RecordCoordinates};
pub use config::{AckPolicy, EventsConfig, ProducerSettings};
pub use error::{EventError, EventResult};
pub use event::{Event, EventMetadata, EventPriority, EventType};
pub use metrics::{CountingMetrics, ErrorKind, MetricsSink, NoopMetrics, TracingMetrics};
pub use producer::EventProducer;
pub use schema::{
    CompiledSchema, MappingRule, SchemaMapping, SchemaRegistry, SchemaStats, ValidationIssue,
    ValidationOutcome,
};

/// Standard game event type constants.
pub mod game_event_types {
    /// Event emitted when a combat session starts.
    pub const COMBAT_SESSION_START: &str = "combat.session.start";
    /// Event emitted when a combat session ends.
    pub const COMBAT_SESSION_END: &str = "combat.session.end";
    /// Event emitted when a combat action is performed.
    pub const COMBAT_ACTION_PERFORMED: &str = "combat.action.performed";
    /// Event emitted when a trade completes.
    pub const ECONOMY_TRADE_COMPLETED: &str = "economy.trade.completed";
    /// Event emitted when a market listing is created.
    pub const ECONOMY_LISTING_CREATED: &str = "economy.listing.created";
    /// Event emitted when a guild changes.
    pub const SOCIAL_GUILD_UPDATED: &str = "social.guild.updated";
    /// Event emitted on a social interaction between players.
    pub const SOCIAL_INTERACTION: &str = "social.interaction";
    /// Event emitted on every world simulation tick.
    pub const WORLD_TICK: &str = "world.tick";
    /// Event emitted for operator-facing notifications.
    pub const SYSTEM_NOTIFICATION: &str = "system.notification";
    /// Synthetic event used by producer health checks.
    pub const SYSTEM_HEALTH_CHECK: &str = "system.health.check";
}
