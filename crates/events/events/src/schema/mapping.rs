//! Declarative event-type to schema-name mapping.
//!
//! The table is data, not code: new event types get a schema by adding a
//! rule to configuration, never by editing a match statement.

use crate::event::EventType;
use serde::{Deserialize, Serialize};

/// Schema name used when no mapping rule matches an event type.
pub const FALLBACK_SCHEMA: &str = "base-event";

/// A single pattern-to-schema rule.
///
/// Patterns use the same wildcard syntax as [`EventType::matches`]:
/// exact strings, `prefix.*`, or `*`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingRule {
    pub pattern: String,
    pub schema_name: String,
}

impl MappingRule {
    pub fn new(pattern: impl Into<String>, schema_name: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            schema_name: schema_name.into(),
        }
    }
}

/// Ordered mapping table from event-type patterns to schema names.
///
/// Rules are evaluated in order; the first match wins, so more specific
/// patterns must come before broader ones.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SchemaMapping {
    pub rules: Vec<MappingRule>,
}

impl SchemaMapping {
    /// Creates an empty mapping (every lookup falls through to the
    /// `base-event` fallback).
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates a mapping from an explicit rule list.
    pub fn from_rules(rules: Vec<MappingRule>) -> Self {
        Self { rules }
    }

    /// The built-in table covering the game domains.
    pub fn game_defaults() -> Self {
        Self::from_rules(vec![
            MappingRule::new("combat.session.*", "combat-session-events"),
            MappingRule::new("combat.action.*", "combat-action-events"),
            MappingRule::new("combat.*", "combat-events"),
            MappingRule::new("economy.trade.*", "economy-trade-events"),
            MappingRule::new("economy.*", "economy-events"),
            MappingRule::new("social.guild.*", "social-guild-events"),
            MappingRule::new("social.*", "social-events"),
            MappingRule::new("world.*", "world-events"),
            MappingRule::new("system.*", "system-events"),
        ])
    }

    /// Appends a rule at the end of the table.
    pub fn add_rule(&mut self, rule: MappingRule) {
        self.rules.push(rule);
    }

    /// Resolves the schema name for an event type, if any rule matches.
    pub fn resolve(&self, event_type: &EventType) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| event_type.matches(&rule.pattern))
            .map(|rule| rule.schema_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let mapping = SchemaMapping::game_defaults();

        let et = EventType::from_string("combat.session.start");
        assert_eq!(mapping.resolve(&et), Some("combat-session-events"));

        // Falls past the session/action rules to the domain catch-all.
        let et = EventType::from_string("combat.damage.dealt");
        assert_eq!(mapping.resolve(&et), Some("combat-events"));
    }

    #[test]
    fn test_domain_coverage() {
        let mapping = SchemaMapping::game_defaults();

        for (type_str, schema) in [
            ("combat.action.performed", "combat-action-events"),
            ("economy.trade.completed", "economy-trade-events"),
            ("economy.listing.created", "economy-events"),
            ("social.guild.updated", "social-guild-events"),
            ("world.tick", "world-events"),
            ("system.notification", "system-events"),
        ] {
            let et = EventType::from_string(type_str);
            assert_eq!(mapping.resolve(&et), Some(schema), "for {type_str}");
        }
    }

    #[test]
    fn test_unmatched_type_resolves_to_none() {
        let mapping = SchemaMapping::game_defaults();
        let et = EventType::from_string("telemetry.frame.rendered");
        assert_eq!(mapping.resolve(&et), None);
    }

    #[test]
    fn test_mapping_is_configuration_loadable() {
        let raw = serde_json::json!({
            "rules": [
                {"pattern": "quest.*", "schema_name": "quest-events"}
            ]
        });

        let mapping: SchemaMapping = serde_json::from_value(raw).unwrap();
        let et = EventType::from_string("quest.completed");
        assert_eq!(mapping.resolve(&et), Some("quest-events"));
    }
}
