use ldgraph_normalize::NormalizedEntity;
use serde_json::Value;
use std::cmp::Ordering;

use crate::dimension::parse_calendar;
use crate::request::{Aggregation, QueryRow, SortOrder};

/// Numeric reading of a measure field: JSON numbers, or strings that parse
/// as finite floats. Sequences use their first element.
pub fn numeric_value(entity: &NormalizedEntity, field: &str) -> Option<f64> {
    let value = entity.property(field)?.first()?;
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Combine one group's members.
///
/// `cumulative` yields the plain group sum here; the running total is laid
/// over the rows after sorting.
pub(crate) fn aggregate(
    members: &[&NormalizedEntity],
    aggregation: Aggregation,
    field: Option<&str>,
) -> Option<f64> {
    let numbers = || {
        members
            .iter()
            .filter_map(move |entity| field.and_then(|f| numeric_value(entity, f)))
    };
    match aggregation {
        Aggregation::Count => Some(members.len() as f64),
        Aggregation::Sum | Aggregation::Cumulative => Some(numbers().sum()),
        Aggregation::Average => {
            if members.is_empty() {
                None
            } else {
                Some(numbers().sum::<f64>() / members.len() as f64)
            }
        }
        Aggregation::Min => numbers().reduce(f64::min),
        Aggregation::Max => numbers().reduce(f64::max),
    }
}

fn cmp_value(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_chrono(a: &str, b: &str, descending: bool) -> Ordering {
    match (parse_calendar(a), parse_calendar(b)) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort. Missing values and unparseable dates go last in either
/// direction.
pub(crate) fn sort_rows(rows: &mut [QueryRow], order: SortOrder) {
    match order {
        SortOrder::ValueAsc => rows.sort_by(|a, b| cmp_value(a.value, b.value, false)),
        SortOrder::ValueDesc => rows.sort_by(|a, b| cmp_value(a.value, b.value, true)),
        SortOrder::LabelAsc => rows.sort_by(|a, b| a.label.cmp(&b.label)),
        SortOrder::LabelDesc => rows.sort_by(|a, b| b.label.cmp(&a.label)),
        SortOrder::ChronoAsc => rows.sort_by(|a, b| cmp_chrono(&a.label, &b.label, false)),
        SortOrder::ChronoDesc => rows.sort_by(|a, b| cmp_chrono(&a.label, &b.label, true)),
    }
}

/// Replace per-group sums with their running total, in row order.
pub(crate) fn accumulate(rows: &mut [QueryRow]) {
    let mut running = 0.0;
    for row in rows {
        running += row.value.unwrap_or(0.0);
        row.value = Some(running);
    }
}
