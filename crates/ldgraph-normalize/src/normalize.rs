//! Depth-first flattening of expanded JSON-LD nodes.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::iri::compact_type;
use crate::{EntityCollection, GraphConfig, NormalizedEntity, PropertyValue};

type Node = Map<String, Value>;

/// Normalize with the default [`GraphConfig`].
pub fn normalize(nodes: &[Value]) -> EntityCollection {
    normalize_with_config(nodes, &GraphConfig::default())
}

/// Flatten `nodes` into an [`EntityCollection`].
///
/// Never fails: non-object nodes, top-level nodes without `@id` and
/// malformed values are skipped.
pub fn normalize_with_config(nodes: &[Value], config: &GraphConfig) -> EntityCollection {
    let mut walker = Walker {
        config,
        collection: EntityCollection::new(config.clone()),
        visited: HashSet::new(),
    };
    for node in nodes {
        walker.walk(node);
    }

    let mut collection = walker.collection;
    collection.synthesize_reverse_edges();
    debug!(
        entities = collection.len(),
        types = collection.type_index().len(),
        edges = collection.edge_count(),
        "normalized JSON-LD graph"
    );
    collection
}

/// Pull the node list out of an expanded document.
///
/// Accepts a top-level array, an object carrying `@graph`, or a single node
/// object. Anything else yields no nodes.
pub fn nodes_from_document(document: &Value) -> Vec<Value> {
    match document {
        Value::Array(items) => items
            .iter()
            .flat_map(|item| match item.get("@graph") {
                Some(graph) if item.get("@id").is_none() => nodes_from_document(graph),
                _ => vec![item.clone()],
            })
            .collect(),
        Value::Object(obj) => match obj.get("@graph") {
            Some(graph) if !obj.contains_key("@id") => nodes_from_document(graph),
            _ => vec![document.clone()],
        },
        _ => {
            debug!("document is neither an array nor an object; no nodes");
            Vec::new()
        }
    }
}

fn node_id(node: &Node) -> Option<&str> {
    node.get("@id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// A node whose only key is `@id`: a pointer to an entity defined elsewhere.
fn is_reference_stub(node: &Node) -> bool {
    node.len() == 1 && node.contains_key("@id")
}

fn node_types(node: &Node, config: &GraphConfig) -> Vec<String> {
    let raw: Vec<&str> = match node.get("@type") {
        Some(Value::String(ty)) => vec![ty.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for ty in raw {
        let canonical = compact_type(ty, config);
        if !out.contains(&canonical) {
            out.push(canonical);
        }
    }
    out
}

/// Split a property value into literal scalars and `@id`-bearing objects.
fn classify<'n>(value: &'n Value, literals: &mut Vec<Value>, targets: &mut Vec<&'n Node>) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                classify(item, literals, targets);
            }
        }
        Value::Object(obj) => {
            if node_id(obj).is_some() {
                targets.push(obj);
            } else if let Some(inner) = obj.get("@value") {
                if !inner.is_null() {
                    literals.push(inner.clone());
                }
            } else if let Some(list) = obj.get("@list").or_else(|| obj.get("@set")) {
                classify(list, literals, targets);
            } else {
                literals.push(value.clone());
            }
        }
        scalar => literals.push(scalar.clone()),
    }
}

struct Walker<'c> {
    config: &'c GraphConfig,
    collection: EntityCollection,
    /// Ids materialized in this pass.
    visited: HashSet<String>,
}

impl Walker<'_> {
    fn walk(&mut self, root: &Value) {
        let Some(root) = root.as_object() else {
            debug!("skipping non-object top-level node");
            return;
        };
        if node_id(root).is_none() {
            debug!("skipping top-level node without @id");
            return;
        }

        let mut stack: Vec<&Node> = vec![root];
        while let Some(node) = stack.pop() {
            let Some(id) = node_id(node) else {
                continue;
            };
            if is_reference_stub(node) || self.visited.contains(id) {
                continue;
            }
            self.visited.insert(id.to_string());

            let children = self.materialize(id, node);
            // Reversed so the first child is walked first.
            stack.extend(children.into_iter().rev());
        }
    }

    /// Build and insert the entity for `node`; returns the child nodes to walk.
    fn materialize<'n>(&mut self, id: &str, node: &'n Node) -> Vec<&'n Node> {
        let all_types = node_types(node, self.config);
        let type_name = all_types
            .first()
            .cloned()
            .unwrap_or_else(|| self.config.fallback_type.clone());

        let mut properties = BTreeMap::new();
        let mut relationships: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut children = Vec::new();

        for (key, value) in node {
            if self.config.is_ignored_key(key) {
                continue;
            }

            let mut literals = Vec::new();
            let mut targets = Vec::new();
            classify(value, &mut literals, &mut targets);

            for target in targets {
                let Some(target_id) = node_id(target) else {
                    continue;
                };
                self.collection.record_edge(key, id, target_id);
                relationships
                    .entry(key.clone())
                    .or_default()
                    .push(target_id.to_string());
                children.push(target);
            }

            // Expanded JSON-LD wraps every value in an array; a lone literal
            // is stored as a scalar.
            match literals.len() {
                0 => {}
                1 => {
                    let literal = literals.pop().unwrap_or(Value::Null);
                    properties.insert(key.clone(), PropertyValue::Single(literal));
                }
                _ => {
                    properties.insert(key.clone(), PropertyValue::Many(literals));
                }
            }
        }

        self.collection.insert_entity(NormalizedEntity {
            id: id.to_string(),
            type_name,
            all_types,
            properties,
            relationships,
            source_data: Value::Object(node.clone()),
        });
        children
    }
}
