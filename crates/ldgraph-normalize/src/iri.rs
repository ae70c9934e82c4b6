//! Name and IRI canonicalization.
//!
//! Upstream JSON-LD expansion does not always resolve a term the same way, so
//! the same logical field shows up as `date`, `ns:date` or
//! `https://example.org/ns#date`. Everything downstream compares names through
//! [`local_name`]; only reverse-edge synthesis stores more than one spelling.

use crate::GraphConfig;

/// Marker prepended to the local name of a synthesized reverse relation.
pub const REVERSE_PREFIX: &str = "_reverse_";

/// Returns true for IRIs with a hierarchical part (`scheme://...`).
///
/// Compact IRIs such as `schema:name` are *not* hierarchical even though
/// `schema` is a syntactically valid scheme.
pub fn is_hierarchical_iri(s: &str) -> bool {
    let Some((scheme, rest)) = s.split_once(':') else {
        return false;
    };
    let mut bytes = scheme.bytes();
    let valid_scheme = bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.');
    valid_scheme && rest.starts_with("//")
}

/// Parse a compact IRI like `schema:name` into `(prefix, suffix)`.
///
/// Returns `None` for bare names and for hierarchical IRIs.
pub fn parse_prefix(s: &str) -> Option<(&str, &str)> {
    let (prefix, suffix) = s.split_once(':')?;
    if prefix.is_empty() || suffix.is_empty() || prefix.contains('/') || suffix.starts_with("//")
    {
        return None;
    }
    Some((prefix, suffix))
}

/// Strip any namespace prefix, scheme, path or fragment down to the bare local
/// name.
///
/// ```
/// use ldgraph_normalize::iri::local_name;
///
/// assert_eq!(local_name("date"), "date");
/// assert_eq!(local_name("ns:date"), "date");
/// assert_eq!(local_name("https://example.org/ns#date"), "date");
/// assert_eq!(local_name("https://schema.org/author/"), "author");
/// ```
pub fn local_name(s: &str) -> &str {
    let s = s.trim();
    let trimmed = s.trim_end_matches(['/', '#']);
    if trimmed.is_empty() {
        return s;
    }

    let local = if let Some((_, fragment)) = trimmed.rsplit_once('#') {
        fragment
    } else if let Some((_, segment)) = trimmed.rsplit_once('/') {
        segment
    } else if let Some((_, rest)) = trimmed.rsplit_once(':') {
        rest
    } else {
        trimmed
    };

    if local.is_empty() {
        trimmed
    } else {
        local
    }
}

/// True when `a` and `b` are spellings of the same canonical name.
pub fn same_local_name(a: &str, b: &str) -> bool {
    local_name(a) == local_name(b)
}

/// True for relation names synthesized by reverse-edge aliasing, in any of
/// their three spellings.
pub fn is_reverse_relation(name: &str) -> bool {
    local_name(name).starts_with(REVERSE_PREFIX)
}

/// Namespace IRI (everything up to and including the last `#` or `/`) of a
/// hierarchical IRI.
fn iri_base(iri: &str) -> Option<&str> {
    if !is_hierarchical_iri(iri) {
        return None;
    }
    let trimmed = iri.trim().trim_end_matches(['/', '#']);
    let local = local_name(trimmed);
    let base = trimmed.strip_suffix(local)?;
    if base.ends_with(['/', '#']) {
        Some(base)
    } else {
        None
    }
}

/// Short label for the namespace of a hierarchical IRI, used to build compact
/// type names.
///
/// The last path segment that does not look like a version wins
/// (`http://xmlns.com/foaf/0.1/Person` -> `foaf`); without a usable path the
/// host's first label is used (`https://schema.org/Person` -> `schema`).
fn namespace_label(iri: &str) -> Option<String> {
    let base = iri_base(iri)?.trim_end_matches(['/', '#']);
    let (_, authority_and_path) = base.split_once("://")?;
    let (host, path) = authority_and_path
        .split_once('/')
        .unwrap_or((authority_and_path, ""));

    let segment = path
        .rsplit('/')
        .find(|seg| !seg.is_empty() && !seg.starts_with(|c: char| c.is_ascii_digit()));
    if let Some(segment) = segment {
        return Some(segment.to_string());
    }

    let host = host.split(':').next().unwrap_or(host);
    host.split('.')
        .find(|label| !label.is_empty() && *label != "www")
        .map(str::to_string)
}

/// Collapse a type IRI to its canonical two-part `namespace:LocalName` form.
///
/// Fragment-delimited, path-delimited and already-compact spellings of the
/// same type collapse to the same value; bare names get the configured
/// default prefix.
pub fn compact_type(raw: &str, config: &GraphConfig) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return config.fallback_type.clone();
    }

    if is_hierarchical_iri(raw) {
        let local = local_name(raw);
        let prefix = namespace_label(raw).unwrap_or_else(|| config.namespace_prefix.clone());
        return format!("{prefix}:{local}");
    }

    if parse_prefix(raw).is_some() {
        return raw.to_string();
    }

    format!("{}:{raw}", config.namespace_prefix)
}

/// Prefix and namespace IRI under which `name` is spelled.
///
/// A hierarchical name keeps its own namespace. A bare name, or one carrying
/// the configured prefix, uses `config`. Any other prefix has no known IRI.
fn qualifiers<'a>(name: &'a str, config: &'a GraphConfig) -> (&'a str, Option<&'a str>) {
    if let Some(base) = iri_base(name) {
        return (config.namespace_prefix.as_str(), Some(base));
    }
    match parse_prefix(name) {
        Some((prefix, _)) if prefix != config.namespace_prefix => (prefix, None),
        _ => (config.namespace_prefix.as_str(), Some(config.namespace_iri.as_str())),
    }
}

/// Literal, prefixed and URI-qualified spellings of `local`.
///
/// Without a known namespace IRI the URI slot repeats the prefixed spelling;
/// such keys are only reachable through [`local_name`] matching.
fn spellings(literal: String, local: &str, name: &str, config: &GraphConfig) -> [String; 3] {
    let (prefix, base) = qualifiers(name, config);
    let prefixed = format!("{prefix}:{local}");
    let uri = match base {
        Some(base) => format!("{base}{local}"),
        None => prefixed.clone(),
    };
    [literal, prefixed, uri]
}

/// The literal, prefixed and URI-qualified spellings of a relation name, in
/// lookup order.
///
/// The prefix and namespace come from the name itself when it carries one,
/// otherwise from `config`.
pub fn relation_spellings(name: &str, config: &GraphConfig) -> [String; 3] {
    spellings(name.to_string(), local_name(name), name, config)
}

/// The three alias spellings under which an incoming `relation` edge is
/// recorded on its target: bare, namespace-qualified and URI-qualified.
///
/// ```
/// use ldgraph_normalize::{iri::reverse_aliases, GraphConfig};
///
/// let config = GraphConfig::default();
/// let [bare, prefixed, uri] = reverse_aliases("https://example.org/ns#reports", &config);
/// assert_eq!(bare, "_reverse_reports");
/// assert_eq!(prefixed, "schema:_reverse_reports");
/// assert_eq!(uri, "https://example.org/ns#_reverse_reports");
/// ```
pub fn reverse_aliases(relation: &str, config: &GraphConfig) -> [String; 3] {
    let reversed = format!("{REVERSE_PREFIX}{}", local_name(relation));
    spellings(reversed.clone(), &reversed, relation, config)
}
