//! Schema discovery over a normalized entity collection.
//!
//! Nothing here is told the schema. For a given entity type we re-scan the
//! population on every call and report:
//!
//! - which fields exist, how often, and what they probably hold
//!   ([`discover_fields`]);
//! - which relationships leave that type and where they point
//!   ([`discover_relationships`]);
//! - which types a grouping dimension may legitimately have
//!   ([`compatible_dimension_types`]).
//!
//! Field and relation names are merged across spellings (`date`, `ns:date`,
//! `https://example.org/ns#date`) by their local name. Results are plain data;
//! nothing is cached, so a rebuilt collection never sees stale statistics.

mod fields;
mod relationships;
mod summary;

pub use fields::{discover_fields, humanize, infer_field_type, looks_like_date, FieldInfo, FieldType};
pub use relationships::{compatible_dimension_types, discover_relationships, RelationshipInfo};
pub use summary::{relationship_stats, type_summaries, RelationshipStats, TypeSummary};

/// Maximum number of distinct sample values kept per field.
pub const MAX_SAMPLES: usize = 3;

/// Fields present on more than this share of the population are "common".
pub const COMMON_FIELD_THRESHOLD: f64 = 0.5;
