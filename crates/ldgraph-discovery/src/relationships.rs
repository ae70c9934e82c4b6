use ldgraph_normalize::iri::{is_reverse_relation, local_name};
use ldgraph_normalize::EntityCollection;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One relationship observed leaving an entity population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipInfo {
    /// Canonical (local) relation name; reverse aliases keep their
    /// `_reverse_` marker.
    pub name: String,
    /// Distinct canonical types of resolved targets.
    pub target_types: BTreeSet<String>,
    /// Entities exhibiting the relation / entities of the type.
    pub frequency: f64,
    /// Distinct `(entity, target)` pairs across the population.
    pub edge_count: usize,
    /// Synthesized from incoming edges rather than present in the source.
    pub reverse: bool,
    /// Raw relation keys that canonicalized to `name`, sorted.
    pub spellings: Vec<String>,
}

#[derive(Default)]
struct RelAcc {
    count: usize,
    edge_count: usize,
    target_types: BTreeSet<String>,
    spellings: BTreeSet<String>,
}

/// Relationships observed on entities of `type_name`, most frequent first
/// (ties by name).
///
/// Every relationship key counts, including the synthesized reverse aliases;
/// their three spellings collapse into a single entry flagged `reverse`.
pub fn discover_relationships(
    collection: &EntityCollection,
    type_name: &str,
) -> Vec<RelationshipInfo> {
    let mut population = 0usize;
    let mut acc: BTreeMap<String, RelAcc> = BTreeMap::new();

    for entity in collection.entities_of_type(type_name) {
        population += 1;

        // canonical name -> distinct targets on this entity
        let mut per_entity: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (key, targets) in &entity.relationships {
            if targets.is_empty() {
                continue;
            }
            let name = local_name(key);
            acc.entry(name.to_string())
                .or_default()
                .spellings
                .insert(key.clone());
            per_entity
                .entry(name)
                .or_default()
                .extend(targets.iter().map(String::as_str));
        }

        for (name, targets) in per_entity {
            let slot = acc.entry(name.to_string()).or_default();
            slot.count += 1;
            slot.edge_count += targets.len();
            for target in targets {
                if let Some(target) = collection.get(target) {
                    slot.target_types.insert(target.type_name.clone());
                }
            }
        }
    }

    if population == 0 {
        debug!(type_name, "no entities; no relationships to discover");
        return Vec::new();
    }

    let mut relationships: Vec<RelationshipInfo> = acc
        .into_iter()
        .map(|(name, slot)| RelationshipInfo {
            frequency: slot.count as f64 / population as f64,
            edge_count: slot.edge_count,
            target_types: slot.target_types,
            reverse: is_reverse_relation(&name),
            spellings: slot.spellings.into_iter().collect(),
            name,
        })
        .collect();

    relationships.sort_by(|a, b| {
        b.frequency
            .total_cmp(&a.frequency)
            .then_with(|| a.name.cmp(&b.name))
    });
    relationships
}

/// Types a grouping dimension may have when measuring `measure_type`.
///
/// Without a relation (or with an empty one) the dimension is a field on the
/// measure entity itself, so the answer is the measure type. Otherwise it is
/// the set of target types discovered for that relation, in any spelling;
/// unknown relations give an empty set.
pub fn compatible_dimension_types(
    collection: &EntityCollection,
    measure_type: &str,
    relation: Option<&str>,
) -> BTreeSet<String> {
    let measure = collection
        .resolve_type(measure_type)
        .unwrap_or(measure_type)
        .to_string();

    let Some(relation) = relation.map(str::trim).filter(|r| !r.is_empty()) else {
        return BTreeSet::from([measure]);
    };

    let wanted = local_name(relation);
    discover_relationships(collection, &measure)
        .into_iter()
        .find(|info| info.name == wanted)
        .map(|info| info.target_types)
        .unwrap_or_default()
}
