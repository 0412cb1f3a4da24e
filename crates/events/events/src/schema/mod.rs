//! Event Schema Registry and Validation
//!
//! Provides the shape contract enforced on event payloads before they
//! leave the process:
//! - Schema compilation and registration from JSON Schema documents
//! - Declarative event-type to schema-name mapping
//! - Payload validation with a deliberate fail-open policy when no
//!   schema applies

mod mapping;
mod registry;
mod validator;

pub use mapping::{MappingRule, SchemaMapping};
pub use registry::{SchemaRegistry, SchemaStats, DEFAULT_EVENT_SIZE_ESTIMATE};
pub use validator::{CompiledSchema, ValidationIssue, ValidationOutcome};
