//! Incident report demo
//!
//! Walks the whole pipeline on a small inline graph:
//! 1. Normalize a nested, cyclic JSON-LD document
//! 2. Discover the schema of each type
//! 3. Answer a few analytics questions
//!
//! Run with: cargo run --example incident_report

use anyhow::Result;
use ldgraph_discovery::{discover_fields, discover_relationships, type_summaries};
use ldgraph_normalize::{nodes_from_document, normalize};
use ldgraph_query::{execute, Aggregation, QueryRow, QuerySpec, SortOrder};
use serde_json::json;

fn print_rows(title: &str, rows: &[QueryRow]) {
    println!("  {title}");
    for row in rows {
        let value = row
            .value
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!("    {:<16} {:>8}  (n={})", row.label, value, row.support_count);
    }
    println!();
}

fn main() -> Result<()> {
    let document = json!({
        "@graph": [
            {
                "@id": "urn:org:acme", "@type": "Organization", "name": "Acme",
                "partnerOf": {"@id": "urn:org:globex", "@type": "Organization", "name": "Globex",
                              "partnerOf": {"@id": "urn:org:acme"}}
            },
            {"@id": "urn:inc:1", "@type": "Incident", "title": "Outage", "cost": 1200,
             "reportedDate": "2023-02-11", "deployedBy": {"@id": "urn:org:acme"}},
            {"@id": "urn:inc:2", "@type": "Incident", "title": "Leak", "cost": 300,
             "reportedDate": "2023-07-02", "deployedBy": {"@id": "urn:org:acme"}},
            {"@id": "urn:inc:3", "@type": "Incident", "title": "Fire", "cost": 4500,
             "reportedDate": "2024-03-19", "deployedBy": {"@id": "urn:org:globex"}},
            {"@id": "urn:inc:4", "@type": "Incident", "title": "Flood", "cost": "800",
             "reportedDate": "2024-11-05"}
        ]
    });

    println!("━━━ Step 1: Normalize ━━━");
    let collection = normalize(&nodes_from_document(&document));
    println!(
        "  {} entities, {} edges",
        collection.len(),
        collection.edge_count()
    );
    for summary in type_summaries(&collection) {
        println!("    {:<22} {}", summary.type_name, summary.count);
    }
    println!();

    println!("━━━ Step 2: Discover ━━━");
    for type_name in ["Incident", "Organization"] {
        println!("  {type_name}");
        for field in discover_fields(&collection, type_name) {
            println!(
                "    field    {:<14} {:<7} {:>4.0}%",
                field.name,
                field.field_type.to_string(),
                field.frequency * 100.0
            );
        }
        for rel in discover_relationships(&collection, type_name) {
            let targets: Vec<&str> = rel.target_types.iter().map(String::as_str).collect();
            println!("    relation {:<20} -> {}", rel.name, targets.join(", "));
        }
    }
    println!();

    println!("━━━ Step 3: Query ━━━");
    let by_org = QuerySpec::new("Incident")
        .group_by("Organization", "name")
        .via("deployedBy");
    print_rows("incidents per organization", &execute(&collection, &by_org)?);
    print_rows(
        "total cost per organization",
        &execute(&collection, &by_org.clone().aggregate(Aggregation::Sum, "cost"))?,
    );
    print_rows(
        "running cost by year",
        &execute(
            &collection,
            &QuerySpec::new("Incident")
                .aggregate(Aggregation::Cumulative, "cost")
                .group_by_field("reportedDate")
                .sort(SortOrder::ChronoAsc),
        )?,
    );
    print_rows(
        "incidents seen from each organization",
        &execute(
            &collection,
            &QuerySpec::new("Organization")
                .via("_reverse_deployedBy")
                .group_by("Incident", "title")
                .sort(SortOrder::LabelAsc),
        )?,
    );
    Ok(())
}
