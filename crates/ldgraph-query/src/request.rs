use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// How a group's measure values are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Count,
    Sum,
    Average,
    Min,
    Max,
    /// Running total of per-group sums, in final row order.
    Cumulative,
}

impl Aggregation {
    pub fn needs_field(self) -> bool {
        !matches!(self, Aggregation::Count)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Aggregation::Count => "count",
            Aggregation::Sum => "sum",
            Aggregation::Average => "average",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Cumulative => "cumulative",
        };
        f.write_str(s)
    }
}

impl FromStr for Aggregation {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Aggregation::Count),
            "sum" => Ok(Aggregation::Sum),
            "average" | "avg" | "mean" => Ok(Aggregation::Average),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "cumulative" | "running" => Ok(Aggregation::Cumulative),
            other => Err(QueryError::UnknownAggregation(other.to_string())),
        }
    }
}

/// Row ordering. All sorts are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    ValueAsc,
    #[default]
    ValueDesc,
    LabelAsc,
    LabelDesc,
    ChronoAsc,
    ChronoDesc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortOrder::ValueAsc => "value-asc",
            SortOrder::ValueDesc => "value-desc",
            SortOrder::LabelAsc => "label-asc",
            SortOrder::LabelDesc => "label-desc",
            SortOrder::ChronoAsc => "chrono-asc",
            SortOrder::ChronoDesc => "chrono-desc",
        };
        f.write_str(s)
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "value-asc" => Ok(SortOrder::ValueAsc),
            "value-desc" => Ok(SortOrder::ValueDesc),
            "label-asc" => Ok(SortOrder::LabelAsc),
            "label-desc" => Ok(SortOrder::LabelDesc),
            "chrono-asc" => Ok(SortOrder::ChronoAsc),
            "chrono-desc" => Ok(SortOrder::ChronoDesc),
            other => Err(QueryError::UnknownSortOrder(other.to_string())),
        }
    }
}

/// A measure/dimension query.
///
/// ```
/// use ldgraph_query::{Aggregation, QuerySpec, SortOrder};
///
/// let spec = QuerySpec::new("Incident")
///     .aggregate(Aggregation::Sum, "cost")
///     .group_by("Organization", "name")
///     .via("deployedBy")
///     .sort(SortOrder::LabelAsc)
///     .limit(5);
/// assert_eq!(spec.measure_field.as_deref(), Some("cost"));
/// assert_eq!(spec.limit, Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub measure_type: String,
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Required for every aggregation but `count`.
    #[serde(default)]
    pub measure_field: Option<String>,
    /// Defaults to the measure type.
    #[serde(default)]
    pub dimension_type: Option<String>,
    /// Picked from discovery when absent (`name` if present, else the most
    /// frequent field).
    #[serde(default)]
    pub dimension_field: Option<String>,
    /// Single-hop relation from measure to dimension entities. Picked from
    /// discovery when absent and the dimension type differs.
    #[serde(default)]
    pub via: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
    /// `None` means unbounded.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl QuerySpec {
    /// Count entities of `measure_type`, grouped by one of their own fields.
    pub fn new(measure_type: impl Into<String>) -> Self {
        Self {
            measure_type: measure_type.into(),
            aggregation: Aggregation::Count,
            measure_field: None,
            dimension_type: None,
            dimension_field: None,
            via: None,
            sort: SortOrder::default(),
            limit: None,
        }
    }

    pub fn aggregate(mut self, aggregation: Aggregation, field: impl Into<String>) -> Self {
        self.aggregation = aggregation;
        self.measure_field = Some(field.into());
        self
    }

    pub fn group_by(mut self, dimension_type: impl Into<String>, field: impl Into<String>) -> Self {
        self.dimension_type = Some(dimension_type.into());
        self.dimension_field = Some(field.into());
        self
    }

    /// Group by `field` on the measure entities themselves.
    pub fn group_by_field(mut self, field: impl Into<String>) -> Self {
        self.dimension_type = None;
        self.dimension_field = Some(field.into());
        self
    }

    pub fn via(mut self, relation: impl Into<String>) -> Self {
        self.via = Some(relation.into());
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Sentinel group labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Label for a dimension entity (or measure entity) lacking the field.
    pub unknown_label: String,
    /// Prefix for entities with no usable relation target: `"<prefix> <relation>"`.
    pub missing_relation_prefix: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            unknown_label: "Unknown".to_string(),
            missing_relation_prefix: "No".to_string(),
        }
    }
}

/// One output group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRow {
    pub label: String,
    /// `None` when `min`/`max` saw no numeric value.
    pub value: Option<f64>,
    /// Measure entities in the group.
    pub support_count: usize,
}
