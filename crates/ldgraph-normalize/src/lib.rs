//! Graph normalization for expanded JSON-LD.
//!
//! Turns a list of already-expanded JSON-LD nodes (arbitrarily nested, possibly
//! cyclic) into an [`EntityCollection`]:
//!
//! - a flat `id -> entity` map,
//! - a `type -> [id]` index in discovery order,
//! - a global `relation -> [edge]` index that counts every edge occurrence.
//!
//! ```text
//! [node, node, ...]
//!     │
//!     ├──> walk (explicit stack, visited set)
//!     │      ├─ literals      -> entity.properties
//!     │      └─ @id objects   -> entity.relationships + global edge index
//!     │
//!     └──> reverse pass
//!            └─ A -R-> B  adds  B -_reverse_R-> A  (three spellings)
//! ```
//!
//! The collection is immutable once built; callers share it by reference.

pub mod config;
pub mod iri;
mod normalize;

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub use config::GraphConfig;
pub use normalize::{nodes_from_document, normalize, normalize_with_config};

// ============================================================================
// Entities
// ============================================================================

/// A property value: one scalar, or a sequence of scalars.
///
/// Scalars are plain JSON values with `@value` wrappers already removed.
/// Anonymous nested objects (no `@id`) are kept as object scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Many(Vec<Value>),
    Single(Value),
}

impl PropertyValue {
    /// The first scalar (the only one for `Single`).
    pub fn first(&self) -> Option<&Value> {
        match self {
            PropertyValue::Single(value) => Some(value),
            PropertyValue::Many(values) => values.first(),
        }
    }

    pub fn values(&self) -> &[Value] {
        match self {
            PropertyValue::Single(value) => std::slice::from_ref(value),
            PropertyValue::Many(values) => values,
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, PropertyValue::Many(_))
    }
}

/// One materialized node of the input graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEntity {
    pub id: String,
    /// Canonical compact type (`namespace:LocalName`) this entity is indexed by.
    pub type_name: String,
    /// Every declared type, canonicalized, in source order. Only the first is
    /// indexed.
    pub all_types: Vec<String>,
    /// Field name (literal source spelling) -> value.
    pub properties: BTreeMap<String, PropertyValue>,
    /// Relation name (literal source spelling, or a reverse alias) -> target ids.
    pub relationships: BTreeMap<String, Vec<String>>,
    /// The original node, for display only.
    pub source_data: Value,
}

impl NormalizedEntity {
    /// Look up a property by literal key, falling back to any key with the same
    /// canonical name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        if let Some(value) = self.properties.get(name) {
            return Some(value);
        }
        let wanted = iri::local_name(name);
        self.properties
            .iter()
            .find(|(key, _)| iri::local_name(key) == wanted)
            .map(|(_, value)| value)
    }

    /// Target ids recorded under exactly `relation` (no spelling fallback).
    pub fn targets(&self, relation: &str) -> &[String] {
        self.relationships
            .get(relation)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Relationships as they appeared in the source, without reverse aliases.
    pub fn forward_relationships(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.relationships
            .iter()
            .filter(|(name, _)| !iri::is_reverse_relation(name))
    }
}

// ============================================================================
// Collection
// ============================================================================

/// A `source -[relation]-> target` occurrence in the global edge index.
///
/// `target` may be dangling: referenced, but never defined in the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

/// Flat, indexed view over a normalized JSON-LD graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityCollection {
    entities: BTreeMap<String, NormalizedEntity>,
    types: BTreeMap<String, Vec<String>>,
    relationships: BTreeMap<String, Vec<Edge>>,
    #[serde(skip)]
    config: GraphConfig,
}

impl EntityCollection {
    pub(crate) fn new(config: GraphConfig) -> Self {
        Self {
            entities: BTreeMap::new(),
            types: BTreeMap::new(),
            relationships: BTreeMap::new(),
            config,
        }
    }

    /// Number of materialized entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn get(&self, id: &str) -> Option<&NormalizedEntity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// All entities, ordered by id.
    pub fn entities(&self) -> impl Iterator<Item = &NormalizedEntity> {
        self.entities.values()
    }

    /// Canonical type names present in the collection.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// The `type -> ids` index.
    pub fn type_index(&self) -> &BTreeMap<String, Vec<String>> {
        &self.types
    }

    /// Resolve a caller-supplied type name to the canonical key used by the
    /// type index.
    ///
    /// Tries the literal name, then its compact form (so a full type IRI
    /// works), then a local-name match (`Incident` finds `ns:Incident`).
    /// Local-name matches are checked in sorted order; the first wins.
    pub fn resolve_type(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.types.get_key_value(name) {
            return Some(key.as_str());
        }
        let compact = iri::compact_type(name, &self.config);
        if let Some((key, _)) = self.types.get_key_value(&compact) {
            return Some(key.as_str());
        }
        let wanted = iri::local_name(name);
        self.types
            .keys()
            .find(|key| iri::local_name(key) == wanted)
            .map(String::as_str)
    }

    /// Ids of the given type in discovery order (empty for unknown types).
    pub fn ids_of_type(&self, type_name: &str) -> &[String] {
        self.resolve_type(type_name)
            .and_then(|key| self.types.get(key))
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Entities of the given type in discovery order.
    pub fn entities_of_type<'a>(
        &'a self,
        type_name: &str,
    ) -> impl Iterator<Item = &'a NormalizedEntity> + 'a {
        self.ids_of_type(type_name)
            .iter()
            .filter_map(move |id| self.entities.get(id))
    }

    /// The global `relation -> edges` index (forward edges only).
    pub fn relationship_index(&self) -> &BTreeMap<String, Vec<Edge>> {
        &self.relationships
    }

    /// Edges recorded under exactly `relation`.
    pub fn edges(&self, relation: &str) -> &[Edge] {
        self.relationships
            .get(relation)
            .map(|edges| edges.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of recorded edge occurrences.
    pub fn edge_count(&self) -> usize {
        self.relationships.values().map(Vec::len).sum()
    }

    pub(crate) fn insert_entity(&mut self, entity: NormalizedEntity) {
        self.types
            .entry(entity.type_name.clone())
            .or_default()
            .push(entity.id.clone());
        self.entities.insert(entity.id.clone(), entity);
    }

    pub(crate) fn record_edge(&mut self, relation: &str, source: &str, target: &str) {
        self.relationships
            .entry(relation.to_string())
            .or_default()
            .push(Edge {
                source: source.to_string(),
                target: target.to_string(),
            });
    }

    /// For every edge `A -R-> B` with `B` materialized, add `A` to `B` under the
    /// three reverse-alias spellings of `R`.
    pub(crate) fn synthesize_reverse_edges(&mut self) {
        for (relation, edges) in &self.relationships {
            if iri::is_reverse_relation(relation) {
                continue;
            }
            let aliases = iri::reverse_aliases(relation, &self.config);
            for edge in edges {
                let Some(target) = self.entities.get_mut(&edge.target) else {
                    continue;
                };
                for alias in &aliases {
                    let sources = target.relationships.entry(alias.clone()).or_default();
                    if !sources.contains(&edge.source) {
                        sources.push(edge.source.clone());
                    }
                }
            }
        }
    }
}
