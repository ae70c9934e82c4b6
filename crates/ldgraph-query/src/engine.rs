use ldgraph_discovery::{discover_fields, discover_relationships, FieldType};
use ldgraph_normalize::iri::{local_name, same_local_name, REVERSE_PREFIX};
use ldgraph_normalize::{EntityCollection, NormalizedEntity};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::aggregate::{accumulate, aggregate, sort_rows};
use crate::dimension::{field_label, forward_targets, reverse_targets, year_bucket};
use crate::error::{QueryError, Result};
use crate::request::{Aggregation, QueryConfig, QueryRow, QuerySpec};

/// Field names preferred as group labels when none is given.
const LABEL_FIELDS: [&str; 3] = ["name", "label", "title"];

/// A query with every optional part settled against the collection.
#[derive(Debug)]
struct Plan {
    dimension_type: String,
    dimension_field: String,
    via: Option<String>,
    /// Follow incoming edges of `via` instead of outgoing ones.
    incoming: bool,
    bucket_years: bool,
}

/// Run `spec` with the default sentinel labels.
pub fn execute(collection: &EntityCollection, spec: &QuerySpec) -> Result<Vec<QueryRow>> {
    execute_with_config(collection, spec, &QueryConfig::default())
}

/// Run `spec`: group the measure population by dimension label, aggregate,
/// sort, truncate.
pub fn execute_with_config(
    collection: &EntityCollection,
    spec: &QuerySpec,
    config: &QueryConfig,
) -> Result<Vec<QueryRow>> {
    let measure_field = spec
        .measure_field
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());
    if spec.aggregation.needs_field() && measure_field.is_none() {
        return Err(QueryError::MissingMeasureField(spec.aggregation));
    }

    let Some(measure_type) = collection.resolve_type(&spec.measure_type) else {
        debug!(measure = %spec.measure_type, "measure type not present; empty result");
        return Ok(Vec::new());
    };
    let population: Vec<&NormalizedEntity> = collection.entities_of_type(measure_type).collect();
    if population.is_empty() {
        return Ok(Vec::new());
    }

    let plan = plan(collection, spec, measure_type, &population)?;
    debug!(?plan, population = population.len(), "query plan");

    // label -> index into `groups`; groups stay in discovery order
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&NormalizedEntity>)> = Vec::new();

    for entity in population {
        for label in labels_for(collection, entity, &plan, config) {
            let slot = *index.entry(label.clone()).or_insert_with(|| {
                groups.push((label, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(entity);
        }
    }

    let mut rows: Vec<QueryRow> = groups
        .into_iter()
        .map(|(label, members)| QueryRow {
            value: aggregate(&members, spec.aggregation, measure_field),
            support_count: members.len(),
            label,
        })
        .collect();

    sort_rows(&mut rows, spec.sort);
    if spec.aggregation == Aggregation::Cumulative {
        accumulate(&mut rows);
    }
    if let Some(limit) = spec.limit {
        rows.truncate(limit);
    }
    Ok(rows)
}

fn plan(
    collection: &EntityCollection,
    spec: &QuerySpec,
    measure_type: &str,
    population: &[&NormalizedEntity],
) -> Result<Plan> {
    let dimension_type = match spec.dimension_type.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => collection.resolve_type(name).unwrap_or(name).to_string(),
        _ => measure_type.to_string(),
    };

    let via = match spec.via.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(via) => {
            let incoming_name = format!("{REVERSE_PREFIX}{}", local_name(via));
            let reaches = discover_relationships(collection, measure_type)
                .iter()
                .any(|info| {
                    (same_local_name(&info.name, via) || info.name == incoming_name)
                        && info.target_types.contains(&dimension_type)
                });
            if !reaches {
                warn!(via, dimension = %dimension_type, "relation never reaches the dimension type");
            }
            Some(via.to_string())
        }
        None if dimension_type != measure_type => {
            let chosen = discover_relationships(collection, measure_type)
                .into_iter()
                .find(|info| info.target_types.contains(&dimension_type))
                .ok_or_else(|| QueryError::NoRelationToDimension {
                    measure_type: measure_type.to_string(),
                    dimension_type: dimension_type.clone(),
                })?;
            debug!(via = %chosen.name, "relation picked from discovery");
            Some(chosen.name)
        }
        None => None,
    };

    // Direction is settled for the whole population: a relation the measure
    // type uses outgoing is never read backwards for entities lacking it.
    let incoming = via.as_deref().is_some_and(|via| {
        let config = collection.config();
        population
            .iter()
            .all(|entity| forward_targets(entity, via, config).is_empty())
    });
    if incoming {
        debug!(via = ?via, "no outgoing edges; following incoming edges");
    }

    let fields = discover_fields(collection, &dimension_type);
    let dimension_field = match spec.dimension_field.as_deref().map(str::trim) {
        Some(field) if !field.is_empty() => field.to_string(),
        _ => LABEL_FIELDS
            .iter()
            .find_map(|wanted| fields.iter().find(|f| f.name == *wanted))
            .or_else(|| fields.first())
            .map(|f| f.name.clone())
            .ok_or_else(|| QueryError::NoDimensionField(dimension_type.clone()))?,
    };

    let bucket_years = fields
        .iter()
        .find(|f| same_local_name(&f.name, &dimension_field))
        .map(|f| f.field_type == FieldType::Date)
        .unwrap_or_else(|| {
            ldgraph_discovery::infer_field_type(&dimension_field, None) == FieldType::Date
        });

    Ok(Plan {
        dimension_type,
        dimension_field,
        via,
        incoming,
        bucket_years,
    })
}

/// Distinct labels `entity` contributes to, in first-seen order.
fn labels_for(
    collection: &EntityCollection,
    entity: &NormalizedEntity,
    plan: &Plan,
    config: &QueryConfig,
) -> Vec<String> {
    let label_of = |e: &NormalizedEntity| {
        let label = field_label(e, &plan.dimension_field)
            .unwrap_or_else(|| config.unknown_label.clone());
        if plan.bucket_years {
            year_bucket(&label)
        } else {
            label
        }
    };

    let Some(via) = plan.via.as_deref() else {
        return vec![label_of(entity)];
    };

    let targets = if plan.incoming {
        reverse_targets(entity, via, collection.config())
    } else {
        forward_targets(entity, via, collection.config())
    };

    let mut labels: Vec<String> = Vec::new();
    for target in targets {
        let Some(target) = collection.get(target) else {
            continue;
        };
        if target.type_name != plan.dimension_type {
            continue;
        }
        let label = label_of(target);
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    if labels.is_empty() {
        labels.push(format!("{} {}", config.missing_relation_prefix, local_name(via)));
    }
    labels
}
