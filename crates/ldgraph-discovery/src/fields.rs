use chrono::NaiveDate;
use ldgraph_normalize::iri::local_name;
use ldgraph_normalize::{EntityCollection, PropertyValue};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use tracing::debug;

use crate::{COMMON_FIELD_THRESHOLD, MAX_SAMPLES};

/// Inferred value type of a discovered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Date,
    Number,
    Array,
    Object,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Number => "number",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        f.write_str(s)
    }
}

/// One field observed on an entity population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    /// Canonical (local) name.
    pub name: String,
    /// Display label derived from `name`.
    pub label: String,
    pub field_type: FieldType,
    /// Entities with the field / entities of the type, in `0..=1`.
    pub frequency: f64,
    pub samples: Vec<Value>,
    pub common: bool,
    /// Raw keys that canonicalized to `name`, sorted.
    pub spellings: Vec<String>,
}

/// True for strings starting with a valid `YYYY-MM-DD` calendar date.
pub fn looks_like_date(s: &str) -> bool {
    s.trim()
        .get(..10)
        .is_some_and(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok())
}

/// Infer a field's type: name heuristics first, then the shape of a sample.
pub fn infer_field_type(name: &str, sample: Option<&PropertyValue>) -> FieldType {
    let lower = local_name(name).to_lowercase();
    if lower.contains("date") || lower.contains("time") {
        return FieldType::Date;
    }
    if lower.contains("id") || lower.contains("count") {
        return FieldType::String;
    }

    match sample {
        Some(PropertyValue::Many(_)) => FieldType::Array,
        Some(PropertyValue::Single(value)) => match value {
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Object,
            Value::Number(_) => FieldType::Number,
            Value::String(s) if looks_like_date(s) => FieldType::Date,
            _ => FieldType::String,
        },
        None => FieldType::String,
    }
}

/// Turn a field or relation name into a display label
/// (`deployedBy` -> `Deployed By`, `date_of_birth` -> `Date Of Birth`).
pub fn humanize(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in local_name(name).chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Default)]
struct FieldAcc<'a> {
    count: usize,
    first_value: Option<&'a PropertyValue>,
    samples: Vec<Value>,
    spellings: BTreeSet<String>,
}

/// Fields observed on entities of `type_name`, most frequent first.
///
/// Ties break alphabetically by label. An unknown or empty type yields an
/// empty list.
pub fn discover_fields(collection: &EntityCollection, type_name: &str) -> Vec<FieldInfo> {
    let mut population = 0usize;
    let mut acc: BTreeMap<String, FieldAcc<'_>> = BTreeMap::new();

    for entity in collection.entities_of_type(type_name) {
        population += 1;
        let mut seen: HashSet<&str> = HashSet::new();
        for (key, value) in &entity.properties {
            let name = local_name(key);
            let slot = acc.entry(name.to_string()).or_default();
            slot.spellings.insert(key.clone());
            if slot.first_value.is_none() {
                slot.first_value = Some(value);
            }
            for sample in value.values() {
                if slot.samples.len() >= MAX_SAMPLES {
                    break;
                }
                if !slot.samples.contains(sample) {
                    slot.samples.push(sample.clone());
                }
            }
            if seen.insert(name) {
                slot.count += 1;
            }
        }
    }

    if population == 0 {
        debug!(type_name, "no entities; no fields to discover");
        return Vec::new();
    }

    let mut fields: Vec<FieldInfo> = acc
        .into_iter()
        .map(|(name, slot)| {
            let frequency = slot.count as f64 / population as f64;
            FieldInfo {
                label: humanize(&name),
                field_type: infer_field_type(&name, slot.first_value),
                frequency,
                samples: slot.samples,
                common: frequency > COMMON_FIELD_THRESHOLD,
                spellings: slot.spellings.into_iter().collect(),
                name,
            }
        })
        .collect();

    fields.sort_by(|a, b| {
        b.frequency
            .total_cmp(&a.frequency)
            .then_with(|| a.label.cmp(&b.label))
    });
    fields
}
