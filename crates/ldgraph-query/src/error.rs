use thiserror::Error;

use crate::request::Aggregation;

pub type Result<T> = std::result::Result<T, QueryError>;

/// Caller mistakes in a query. Data anomalies never produce one of these;
/// they land in sentinel groups instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("aggregation `{0}` needs a measure field")]
    MissingMeasureField(Aggregation),

    #[error("no relationship from `{measure_type}` reaches `{dimension_type}`; name one explicitly")]
    NoRelationToDimension {
        measure_type: String,
        dimension_type: String,
    },

    #[error("dimension type `{0}` has no fields to group by")]
    NoDimensionField(String),

    #[error("unknown aggregation `{0}` (expected count|sum|average|min|max|cumulative)")]
    UnknownAggregation(String),

    #[error("unknown sort order `{0}` (expected value-asc|value-desc|label-asc|label-desc|chrono-asc|chrono-desc)")]
    UnknownSortOrder(String),
}
