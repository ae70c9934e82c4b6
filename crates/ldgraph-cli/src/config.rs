//! `--config` file: one JSON document holding the graph and query settings.

use anyhow::{Context, Result};
use ldgraph_normalize::GraphConfig;
use ldgraph_query::QueryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Both sections are optional; missing keys take their defaults.
///
/// ```json
/// {
///   "graph": { "namespace_prefix": "ex", "namespace_iri": "https://example.org/ns#" },
///   "query": { "unknown_label": "n/a" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdgraphConfig {
    pub graph: GraphConfig,
    pub query: QueryConfig,
}

pub fn load(path: Option<&Path>) -> Result<LdgraphConfig> {
    let Some(path) = path else {
        return Ok(LdgraphConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: LdgraphConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!(?config, "loaded config");
    Ok(config)
}
