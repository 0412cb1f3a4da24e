use crate::event::{Event, EventType};
use crate::schema::mapping::{SchemaMapping, FALLBACK_SCHEMA};
use crate::schema::validator::CompiledSchema;
use crate::{EventError, EventResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

/// Size returned by [`SchemaRegistry::event_size`] when the event cannot
/// be serialized. That path never errors.
pub const DEFAULT_EVENT_SIZE_ESTIMATE: u64 = 1024;

/// Catalog of compiled validation schemas plus the serialization services
/// built on it.
///
/// Registration happens at startup and takes the write lock; validation
/// and lookup run on every publish and take the read lock, so concurrent
/// validations never block each other. There is no unregistration path.
///
/// When an event type resolves to no registered schema (and no
/// `base-event` fallback is registered either), validation succeeds.
/// This fail-open policy favors availability over strictness: an
/// optional or not-yet-shipped schema never blocks publishing.
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, CompiledSchema>>,
    mapping: SchemaMapping,
}

impl SchemaRegistry {
    /// Creates a registry with the built-in game-domain mapping table.
    pub fn new() -> Self {
        Self::with_mapping(SchemaMapping::game_defaults())
    }

    /// Creates a registry with an explicit mapping table.
    pub fn with_mapping(mapping: SchemaMapping) -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            mapping,
        }
    }

    /// The mapping table in use.
    pub fn mapping(&self) -> &SchemaMapping {
        &self.mapping
    }

    /// Compiles and registers the schema document at `path`.
    ///
    /// A missing file is not an error: optional schemas that have not
    /// shipped yet must never block startup, so this logs a warning and
    /// returns success. A file that exists but cannot be read, parsed,
    /// or compiled is an error returned to the caller.
    pub async fn register_schema(
        &self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> EventResult<()> {
        let name = name.into();
        let path = path.as_ref();

        if tokio::fs::metadata(path).await.is_err() {
            tracing::warn!(
                schema = %name,
                path = %path.display(),
                "Schema file not found, skipping registration"
            );
            return Ok(());
        }

        let raw = tokio::fs::read(path).await.map_err(|e| EventError::SchemaCompile {
            name: name.clone(),
            reason: format!("failed to read {}: {e}", path.display()),
        })?;

        let document: Value =
            serde_json::from_slice(&raw).map_err(|e| EventError::SchemaCompile {
                name: name.clone(),
                reason: format!("invalid JSON in {}: {e}", path.display()),
            })?;

        self.register_schema_document(name, document).await
    }

    /// Compiles and registers an in-memory schema document.
    pub async fn register_schema_document(
        &self,
        name: impl Into<String>,
        document: Value,
    ) -> EventResult<()> {
        let name = name.into();
        let compiled = CompiledSchema::compile(name.clone(), document)?;

        let mut schemas = self.schemas.write().await;
        schemas.insert(name.clone(), compiled);

        tracing::info!(schema = %name, "Registered schema");
        Ok(())
    }

    /// Registers every `*.json` file in `dir` under its file stem.
    ///
    /// A missing directory gets the same treatment as a missing file:
    /// warn and continue.
    pub async fn load_dir(&self, dir: impl AsRef<Path>) -> EventResult<usize> {
        let dir = dir.as_ref();

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(_) => {
                tracing::warn!(
                    path = %dir.display(),
                    "Schema directory not found, skipping"
                );
                return Ok(0);
            }
        };

        let mut registered = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            EventError::SchemaCompile {
                name: dir.display().to_string(),
                reason: format!("failed to list schema directory: {e}"),
            }
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            self.register_schema(stem, &path).await?;
            registered += 1;
        }

        Ok(registered)
    }

    /// Validates serialized event bytes against the schema bound to
    /// `event_type`.
    ///
    /// Resolution order: mapping table, then the `base-event` fallback,
    /// then the fail-open skip. When a schema is found, the payload is
    /// parsed and its `data` member (or the whole value, when no `data`
    /// member exists) is validated against it.
    pub async fn validate_event(
        &self,
        event_type: &EventType,
        serialized: &[u8],
    ) -> EventResult<()> {
        let type_str = event_type.to_string();
        let schemas = self.schemas.read().await;

        let schema = match self.mapping.resolve(event_type) {
            Some(name) => schemas.get(name),
            None => None,
        };
        let schema = match schema.or_else(|| schemas.get(FALLBACK_SCHEMA)) {
            Some(schema) => schema,
            None => {
                // Fail-open: no contract exists for this type, let it through.
                tracing::debug!(event_type = %type_str, "No schema registered, skipping validation");
                return Ok(());
            }
        };

        let parsed: Value =
            serde_json::from_slice(serialized).map_err(|e| EventError::Validation {
                event_type: type_str.clone(),
                reason: format!("payload is not valid JSON: {e}"),
            })?;
        let payload = parsed.get("data").unwrap_or(&parsed);

        schema.validate(payload).into_event_result(&type_str)
    }

    /// Serializes an event to its JSON wire bytes.
    pub fn serialize_event(&self, event: &Event) -> EventResult<Vec<u8>> {
        Ok(serde_json::to_vec(event)?)
    }

    /// Deserializes an event from its JSON wire bytes.
    pub fn deserialize_event(&self, bytes: &[u8]) -> EventResult<Event> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Returns the serialized size of an event in bytes.
    ///
    /// Falls back to [`DEFAULT_EVENT_SIZE_ESTIMATE`] when serialization
    /// fails; this path never errors.
    pub fn event_size(&self, event: &Event) -> u64 {
        match serde_json::to_vec(event) {
            Ok(bytes) => bytes.len() as u64,
            Err(_) => DEFAULT_EVENT_SIZE_ESTIMATE,
        }
    }

    /// Returns the compiled schema registered under `name`.
    pub async fn get_schema(&self, name: &str) -> Option<CompiledSchema> {
        let schemas = self.schemas.read().await;
        schemas.get(name).cloned()
    }

    /// Lists the names of all registered schemas, sorted.
    pub async fn list_schemas(&self) -> Vec<String> {
        let schemas = self.schemas.read().await;
        let mut names: Vec<String> = schemas.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns statistics about the catalog.
    pub async fn stats(&self) -> SchemaStats {
        let schemas = self.schemas.read().await;

        let mut by_domain = HashMap::new();
        for name in schemas.keys() {
            let domain = name.split('-').next().unwrap_or("unknown");
            *by_domain.entry(domain.to_string()).or_insert(0) += 1;
        }

        SchemaStats {
            total_schemas: schemas.len(),
            by_domain,
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the schema catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaStats {
    pub total_schemas: usize,
    pub by_domain: HashMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn session_schema() -> Value {
        json!({
            "type": "object",
            "required": ["session_id", "map"],
            "properties": {
                "session_id": {"type": "string"},
                "map": {"type": "string"}
            }
        })
    }

    fn session_event(data: Value) -> Event {
        Event::simple("combat.session.start", data)
            .with_source("combat-service")
    }

    #[tokio::test]
    async fn test_validate_against_mapped_schema() {
        let registry = SchemaRegistry::new();
        registry
            .register_schema_document("combat-session-events", session_schema())
            .await
            .unwrap();

        let event = session_event(json!({"session_id": "s-1", "map": "arena"}));
        let bytes = registry.serialize_event(&event).unwrap();

        assert!(registry.validate_event(&event.event_type, &bytes).await.is_ok());
    }

    #[tokio::test]
    async fn test_validation_failure_is_typed() {
        let registry = SchemaRegistry::new();
        registry
            .register_schema_document("combat-session-events", session_schema())
            .await
            .unwrap();

        let event = session_event(json!({"session_id": "s-1"}));
        let bytes = registry.serialize_event(&event).unwrap();

        let err = registry
            .validate_event(&event.event_type, &bytes)
            .await
            .unwrap_err();
        match err {
            EventError::Validation { event_type, reason } => {
                assert_eq!(event_type, "combat.session.start");
                assert!(reason.contains("map"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fail_open_when_no_schema_exists() {
        // No schemas registered at all: validation must succeed.
        let registry = SchemaRegistry::new();
        let event = session_event(json!({"anything": true}));
        let bytes = registry.serialize_event(&event).unwrap();

        assert!(registry.validate_event(&event.event_type, &bytes).await.is_ok());

        // Same for a type outside every mapping rule.
        let event = Event::simple("telemetry.frame.rendered", json!({"fps": 144}));
        let bytes = registry.serialize_event(&event).unwrap();
        assert!(registry.validate_event(&event.event_type, &bytes).await.is_ok());
    }

    #[tokio::test]
    async fn test_base_event_fallback() {
        let registry = SchemaRegistry::new();
        registry
            .register_schema_document(
                "base-event",
                json!({
                    "type": "object",
                    "required": ["kind"]
                }),
            )
            .await
            .unwrap();

        // Unmapped type now validates against base-event.
        let event = Event::simple("telemetry.frame.rendered", json!({"fps": 144}));
        let bytes = registry.serialize_event(&event).unwrap();
        assert!(registry.validate_event(&event.event_type, &bytes).await.is_err());

        let event = Event::simple("telemetry.frame.rendered", json!({"kind": "frame"}));
        let bytes = registry.serialize_event(&event).unwrap();
        assert!(registry.validate_event(&event.event_type, &bytes).await.is_ok());
    }

    #[tokio::test]
    async fn test_register_missing_file_is_not_an_error() {
        let registry = SchemaRegistry::new();
        let result = registry
            .register_schema("combat-session-events", "/nonexistent/schemas/session.json")
            .await;

        assert!(result.is_ok());
        assert!(registry.get_schema("combat-session-events").await.is_none());
    }

    #[tokio::test]
    async fn test_register_unparsable_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let registry = SchemaRegistry::new();
        let err = registry
            .register_schema("combat-session-events", file.path())
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::SchemaCompile { .. }));
    }

    #[tokio::test]
    async fn test_register_from_file_and_validate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        serde_json::to_writer(&mut file, &session_schema()).unwrap();
        file.flush().unwrap();

        let registry = SchemaRegistry::new();
        registry
            .register_schema("combat-session-events", file.path())
            .await
            .unwrap();

        let event = session_event(json!({"session_id": "s-1", "map": "arena"}));
        let bytes = registry.serialize_event(&event).unwrap();
        assert!(registry.validate_event(&event.event_type, &bytes).await.is_ok());
    }

    #[tokio::test]
    async fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("combat-session-events.json"),
            serde_json::to_vec(&session_schema()).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let registry = SchemaRegistry::new();
        let count = registry.load_dir(dir.path()).await.unwrap();
        assert_eq!(count, 1);
        assert!(registry.get_schema("combat-session-events").await.is_some());

        // Missing directory is a warning, not an error.
        let count = registry.load_dir("/nonexistent/schemas").await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_every_field() {
        let registry = SchemaRegistry::new();
        let event = Event::simple("economy.trade.completed", json!({"gold": 120}))
            .with_source("economy-service")
            .with_version("2.1")
            .with_correlation_id("corr-7")
            .with_session_id("s-3")
            .with_player_id("p-9")
            .with_game_id("g-4")
            .with_trace_id("t-1")
            .with_tag("marketplace")
            .with_priority(crate::event::EventPriority::Critical)
            .with_ttl(std::time::Duration::from_secs(30));

        let bytes = registry.serialize_event(&event).unwrap();
        let back = registry.deserialize_event(&bytes).unwrap();

        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn test_event_size_matches_serialized_length() {
        let registry = SchemaRegistry::new();
        let event = Event::simple("world.tick", json!({"tick": 42}));

        let bytes = registry.serialize_event(&event).unwrap();
        assert_eq!(registry.event_size(&event), bytes.len() as u64);
    }

    #[tokio::test]
    async fn test_list_and_stats() {
        let registry = SchemaRegistry::new();
        registry
            .register_schema_document("combat-session-events", session_schema())
            .await
            .unwrap();
        registry
            .register_schema_document("combat-action-events", json!({"type": "object"}))
            .await
            .unwrap();
        registry
            .register_schema_document("economy-trade-events", json!({"type": "object"}))
            .await
            .unwrap();

        let names = registry.list_schemas().await;
        assert_eq!(
            names,
            vec![
                "combat-action-events",
                "combat-session-events",
                "economy-trade-events"
            ]
        );

        let stats = registry.stats().await;
        assert_eq!(stats.total_schemas, 3);
        assert_eq!(stats.by_domain.get("combat"), Some(&2));
        assert_eq!(stats.by_domain.get("economy"), Some(&1));
    }
}
