//! Dimension label resolution: how a measure entity maps to group labels.

use chrono::{Datelike, NaiveDate};
use ldgraph_normalize::iri::{is_hierarchical_iri, local_name, relation_spellings, reverse_aliases};
use ldgraph_normalize::{GraphConfig, NormalizedEntity, PropertyValue};
use serde_json::Value;

/// Canonical display text for one scalar.
///
/// Absolute IRIs collapse to their local name, numbers and booleans render
/// as JSON text, arrays use their first renderable element. Blank strings,
/// nulls and objects have no label.
pub fn scalar_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else if is_hierarchical_iri(s) {
                Some(local_name(s).to_string())
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.iter().find_map(scalar_label),
        Value::Null | Value::Object(_) => None,
    }
}

/// Label of `field` on `entity`, if present and renderable.
pub fn field_label(entity: &NormalizedEntity, field: &str) -> Option<String> {
    entity
        .property(field)
        .map(PropertyValue::values)
        .and_then(|values| values.iter().find_map(scalar_label))
}

/// Collapse a date-like label to its calendar year. Labels that do not
/// parse as a date are returned unchanged.
pub fn year_bucket(label: &str) -> String {
    match parse_calendar(label) {
        Some(date) => date.year().to_string(),
        None => label.to_string(),
    }
}

/// Parse a label for chronological comparison.
///
/// Accepts `YYYY-MM-DD` (with any trailing time part), `YYYY-MM` and bare
/// four-digit years.
pub fn parse_calendar(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    if let Some(date) = label
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        return Some(date);
    }
    if label.len() == 7 {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{label}-01"), "%Y-%m-%d") {
            return Some(date);
        }
    }
    if label.len() == 4 && label.bytes().all(|b| b.is_ascii_digit()) {
        return label
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }
    None
}

/// First non-empty target list among `candidates`, then among keys with the
/// same canonical name as `wanted`.
fn first_targets<'e>(
    entity: &'e NormalizedEntity,
    candidates: &[String],
    wanted: &str,
) -> &'e [String] {
    if let Some(targets) = candidates
        .iter()
        .map(|candidate| entity.targets(candidate))
        .find(|targets| !targets.is_empty())
    {
        return targets;
    }
    entity
        .relationships
        .iter()
        .find(|(key, targets)| !targets.is_empty() && local_name(key) == wanted)
        .map(|(_, targets)| targets.as_slice())
        .unwrap_or(&[])
}

/// Outgoing targets of `relation`: the literal, prefixed and URI-qualified
/// spellings, then any key with the same canonical name.
///
/// Synthesized reverse keys never match a forward relation name, since their
/// canonical names carry the `_reverse_` marker.
pub fn forward_targets<'e>(
    entity: &'e NormalizedEntity,
    relation: &str,
    config: &GraphConfig,
) -> &'e [String] {
    first_targets(entity, &relation_spellings(relation, config), local_name(relation))
}

/// Incoming sources of `relation`, read from the synthesized reverse aliases.
pub fn reverse_targets<'e>(
    entity: &'e NormalizedEntity,
    relation: &str,
    config: &GraphConfig,
) -> &'e [String] {
    let aliases = reverse_aliases(relation, config);
    first_targets(entity, &aliases, &aliases[0])
}

/// Targets of `relation` on `entity`, tolerant of spelling: the outgoing
/// edges when there are any, otherwise the incoming ones.
pub fn resolve_targets<'e>(
    entity: &'e NormalizedEntity,
    relation: &str,
    config: &GraphConfig,
) -> &'e [String] {
    let forward = forward_targets(entity, relation, config);
    if forward.is_empty() {
        reverse_targets(entity, relation, config)
    } else {
        forward
    }
}
