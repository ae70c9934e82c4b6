//! Measure/dimension analytics over an [`EntityCollection`].
//!
//! A query counts or aggregates a *measure* population (entities of one
//! type), grouped by a *dimension* label: a field on the measure entity
//! itself, or on entities one relation hop away.
//!
//! ```text
//! measure entities ──[via]──> dimension entities ──[field]──> label
//!        │                                                      │
//!        └──────────────── aggregate per label <────────────────┘
//!                                │
//!                          sort ─┴─ limit
//! ```
//!
//! Data anomalies never fail a query. Missing field values go to an
//! `"Unknown"` group and entities without a usable relation target go to
//! `"No <relation>"`. Only malformed requests return [`QueryError`].
//!
//! [`EntityCollection`]: ldgraph_normalize::EntityCollection

mod aggregate;
pub mod dimension;
mod engine;
pub mod error;
mod request;

pub use aggregate::numeric_value;
pub use engine::{execute, execute_with_config};
pub use error::{QueryError, Result};
pub use request::{Aggregation, QueryConfig, QueryRow, QuerySpec, SortOrder};
