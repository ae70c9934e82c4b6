use ldgraph_normalize::EntityCollection;
use serde::Serialize;
use std::collections::BTreeSet;

/// Entity count for one canonical type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub type_name: String,
    pub count: usize,
}

/// Collection-wide statistics for one relation, from the global edge index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipStats {
    /// Relation name as spelled in the source.
    pub name: String,
    /// Every recorded occurrence, duplicates included.
    pub edge_count: usize,
    pub distinct_sources: usize,
    pub distinct_targets: usize,
    /// Distinct targets that were referenced but never defined.
    pub dangling_targets: usize,
}

/// Types present in the collection, largest population first (ties by name).
pub fn type_summaries(collection: &EntityCollection) -> Vec<TypeSummary> {
    let mut out: Vec<TypeSummary> = collection
        .type_index()
        .iter()
        .map(|(type_name, ids)| TypeSummary {
            type_name: type_name.clone(),
            count: ids.len(),
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.type_name.cmp(&b.type_name)));
    out
}

/// Per-relation edge statistics, most edges first (ties by name).
pub fn relationship_stats(collection: &EntityCollection) -> Vec<RelationshipStats> {
    let mut out: Vec<RelationshipStats> = collection
        .relationship_index()
        .iter()
        .map(|(name, edges)| {
            let sources: BTreeSet<&str> = edges.iter().map(|e| e.source.as_str()).collect();
            let targets: BTreeSet<&str> = edges.iter().map(|e| e.target.as_str()).collect();
            let dangling = targets.iter().filter(|t| !collection.contains(t)).count();
            RelationshipStats {
                name: name.clone(),
                edge_count: edges.len(),
                distinct_sources: sources.len(),
                distinct_targets: targets.len(),
                dangling_targets: dangling,
            }
        })
        .collect();
    out.sort_by(|a, b| b.edge_count.cmp(&a.edge_count).then_with(|| a.name.cmp(&b.name)));
    out
}
