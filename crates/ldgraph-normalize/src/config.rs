use serde::{Deserialize, Serialize};

/// Normalization settings shared by every stage that needs to spell names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Prefix given to bare names (`Incident` -> `schema:Incident`) and used for
    /// the namespace-qualified spelling of relations that carry none.
    pub namespace_prefix: String,
    /// Namespace IRI used for the URI-qualified spelling of bare relations.
    /// Must end in `/` or `#`.
    pub namespace_iri: String,
    /// Key prefixes holding UI annotations rather than data (`ui:` by default).
    /// Keys starting with `@` are always structural and skipped.
    pub ignored_key_prefixes: Vec<String>,
    /// Canonical type for nodes that declare no `@type`.
    pub fallback_type: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            namespace_prefix: "schema".to_string(),
            namespace_iri: "https://schema.org/".to_string(),
            ignored_key_prefixes: vec!["ui:".to_string()],
            fallback_type: "rdfs:Resource".to_string(),
        }
    }
}

impl GraphConfig {
    /// True for keys that never become properties or relationships.
    pub fn is_ignored_key(&self, key: &str) -> bool {
        key.starts_with('@')
            || self
                .ignored_key_prefixes
                .iter()
                .any(|prefix| key.starts_with(prefix.as_str()))
    }
}
