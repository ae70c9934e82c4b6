//! Plain-text tables for terminal output.

use colored::Colorize;
use ldgraph_discovery::{FieldInfo, RelationshipInfo, RelationshipStats, TypeSummary};
use ldgraph_query::QueryRow;
use std::fmt::Write;

fn width<'a>(header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells.map(|c| c.chars().count()).fold(header.len(), usize::max)
}

fn percent(frequency: f64) -> String {
    format!("{:.0}%", frequency * 100.0)
}

/// Whole numbers print without decimals; missing values print as `-`.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        None => "-".to_string(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
    }
}

pub fn types(summaries: &[TypeSummary]) -> String {
    let total: usize = summaries.iter().map(|s| s.count).sum();
    let w = width("TYPE", summaries.iter().map(|s| s.type_name.as_str()));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} entities, {} types)",
        "Types".green().bold(),
        total,
        summaries.len()
    );
    let header = format!("{:<w$}  {:>6}", "TYPE", "COUNT");
    let _ = writeln!(out, "  {}", header.bold());
    for s in summaries {
        let _ = writeln!(out, "  {:<w$}  {:>6}", s.type_name, s.count);
    }
    out
}

pub fn fields(type_name: &str, fields: &[FieldInfo]) -> String {
    let w = width("FIELD", fields.iter().map(|f| f.name.as_str()));

    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Fields of".green().bold(), type_name.cyan());
    if fields.is_empty() {
        let _ = writeln!(out, "  (none)");
        return out;
    }
    for f in fields {
        let samples: Vec<String> = f.samples.iter().map(|s| s.to_string()).collect();
        let marker = if f.common { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} {:<w$}  {:<6}  {:>4}  {}",
            marker,
            f.name,
            f.field_type.to_string(),
            percent(f.frequency),
            samples.join(", ").dimmed()
        );
    }
    out
}

pub fn relations(type_name: &str, relations: &[RelationshipInfo]) -> String {
    let w = width("RELATION", relations.iter().map(|r| r.name.as_str()));

    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Relations of".green().bold(), type_name.cyan());
    if relations.is_empty() {
        let _ = writeln!(out, "  (none)");
        return out;
    }
    for r in relations {
        let targets: Vec<&str> = r.target_types.iter().map(String::as_str).collect();
        let targets = if targets.is_empty() {
            "(unresolved)".to_string()
        } else {
            targets.join(", ")
        };
        let name = format!("{:<w$}", r.name);
        let name = if r.reverse {
            name.yellow().to_string()
        } else {
            name
        };
        let _ = writeln!(
            out,
            "  {}  {:>4}  {:>5} edges  {} {}",
            name,
            percent(r.frequency),
            r.edge_count,
            "→".cyan(),
            targets
        );
    }
    out
}

pub fn edges(stats: &[RelationshipStats]) -> String {
    let w = width("RELATION", stats.iter().map(|s| s.name.as_str()));

    let mut out = String::new();
    let _ = writeln!(out, "{}", "Relationships".green().bold());
    let header = format!(
        "{:<w$}  {:>6}  {:>7}  {:>7}  {:>8}",
        "RELATION", "EDGES", "SOURCES", "TARGETS", "DANGLING"
    );
    let _ = writeln!(out, "  {}", header.bold());
    for s in stats {
        let _ = writeln!(
            out,
            "  {:<w$}  {:>6}  {:>7}  {:>7}  {:>8}",
            s.name, s.edge_count, s.distinct_sources, s.distinct_targets, s.dangling_targets
        );
    }
    out
}

pub fn rows(title: &str, rows: &[QueryRow]) -> String {
    let w = width("GROUP", rows.iter().map(|r| r.label.as_str()));

    let mut out = String::new();
    let _ = writeln!(out, "{}", title.green().bold());
    let header = format!("{:<w$}  {:>12}  {:>7}", "GROUP", "VALUE", "SUPPORT");
    let _ = writeln!(out, "  {}", header.bold());
    for r in rows {
        let _ = writeln!(
            out,
            "  {:<w$}  {:>12}  {:>7}",
            r.label,
            format_value(r.value),
            r.support_count
        );
    }
    out
}
