use anyhow::Result;
use ldgraph_normalize::{normalize, EntityCollection};
use ldgraph_query::{execute, Aggregation, QueryError, QueryRow, QuerySpec, SortOrder};
use serde_json::{json, Value};

fn flat(rows: &[QueryRow]) -> Vec<(&str, Option<f64>, usize)> {
    rows.iter()
        .map(|r| (r.label.as_str(), r.value, r.support_count))
        .collect()
}

fn org(id: &str, name: &str) -> Value {
    json!({"@id": id, "@type": "Organization", "name": name})
}

fn incidents() -> EntityCollection {
    normalize(&[
        json!({"@id": "urn:i:1", "@type": "Incident", "title": "Outage", "cost": 100,
               "deployedBy": org("urn:o:acme", "Acme")}),
        json!({"@id": "urn:i:2", "@type": "Incident", "title": "Leak", "cost": 50,
               "deployedBy": {"@id": "urn:o:acme"}}),
        json!({"@id": "urn:i:3", "@type": "Incident", "title": "Fire", "cost": "20",
               "deployedBy": org("urn:o:globex", "Globex")}),
    ])
}

fn by_org() -> QuerySpec {
    QuerySpec::new("Incident")
        .group_by("Organization", "name")
        .via("deployedBy")
}

#[test]
fn count_incidents_per_organization() -> Result<()> {
    let rows = execute(&incidents(), &by_org())?;
    assert_eq!(
        flat(&rows),
        vec![("Acme", Some(2.0), 2), ("Globex", Some(1.0), 1)]
    );
    Ok(())
}

#[test]
fn incident_without_relation_gets_sentinel_group() -> Result<()> {
    let collection = normalize(&[
        json!({"@id": "urn:i:1", "@type": "Incident", "deployedBy": org("urn:o:acme", "Acme")}),
        json!({"@id": "urn:i:2", "@type": "Incident", "deployedBy": {"@id": "urn:o:acme"}}),
        json!({"@id": "urn:i:3", "@type": "Incident"}),
    ]);
    let rows = execute(&collection, &by_org())?;
    assert_eq!(
        flat(&rows),
        vec![("Acme", Some(2.0), 2), ("No deployedBy", Some(1.0), 1)]
    );
    assert_eq!(rows.iter().map(|r| r.support_count).sum::<usize>(), 3);
    Ok(())
}

#[test]
fn limit_one_keeps_the_top_row() -> Result<()> {
    let rows = execute(&incidents(), &by_org().limit(1))?;
    assert_eq!(flat(&rows), vec![("Acme", Some(2.0), 2)]);

    let none = execute(&incidents(), &by_org().limit(0))?;
    assert!(none.is_empty());
    Ok(())
}

#[test]
fn sum_average_and_cumulative() -> Result<()> {
    let collection = incidents();

    let sum = execute(
        &collection,
        &by_org().aggregate(Aggregation::Sum, "cost").sort(SortOrder::LabelAsc),
    )?;
    assert_eq!(
        flat(&sum),
        vec![("Acme", Some(150.0), 2), ("Globex", Some(20.0), 1)]
    );

    let avg = execute(&collection, &by_org().aggregate(Aggregation::Average, "cost"))?;
    assert_eq!(
        flat(&avg),
        vec![("Acme", Some(75.0), 2), ("Globex", Some(20.0), 1)]
    );

    let running = execute(
        &collection,
        &by_org()
            .aggregate(Aggregation::Cumulative, "cost")
            .sort(SortOrder::ValueAsc),
    )?;
    assert_eq!(
        flat(&running),
        vec![("Globex", Some(20.0), 1), ("Acme", Some(170.0), 2)]
    );
    Ok(())
}

#[test]
fn max_without_numbers_sorts_last() -> Result<()> {
    let collection = normalize(&[
        json!({"@id": "urn:1", "@type": "Reading", "site": "north", "level": "high"}),
        json!({"@id": "urn:2", "@type": "Reading", "site": "south", "level": 4}),
        json!({"@id": "urn:3", "@type": "Reading", "site": "south", "level": 9}),
    ]);
    let spec = QuerySpec::new("Reading")
        .aggregate(Aggregation::Max, "level")
        .group_by_field("site");
    let rows = execute(&collection, &spec)?;
    assert_eq!(flat(&rows), vec![("south", Some(9.0), 2), ("north", None, 1)]);
    Ok(())
}

#[test]
fn date_dimension_buckets_by_year() -> Result<()> {
    let collection = normalize(&[
        json!({"@id": "urn:e:1", "@type": "Event", "startDate": "2021-02-02"}),
        json!({"@id": "urn:e:2", "@type": "Event", "startDate": "2020-01-05"}),
        json!({"@id": "urn:e:3", "@type": "Event", "startDate": "2020-06-01T09:00:00Z"}),
        json!({"@id": "urn:e:4", "@type": "Event"}),
    ]);
    let spec = QuerySpec::new("Event")
        .group_by_field("startDate")
        .sort(SortOrder::ChronoAsc);
    let rows = execute(&collection, &spec)?;
    assert_eq!(
        flat(&rows),
        vec![
            ("2020", Some(2.0), 2),
            ("2021", Some(1.0), 1),
            ("Unknown", Some(1.0), 1)
        ]
    );
    Ok(())
}

#[test]
fn relation_and_field_are_picked_from_discovery() -> Result<()> {
    let collection = incidents();
    let spec = QuerySpec {
        dimension_type: Some("Organization".to_string()),
        ..QuerySpec::new("Incident")
    };
    let rows = execute(&collection, &spec)?;
    assert_eq!(
        flat(&rows),
        vec![("Acme", Some(2.0), 2), ("Globex", Some(1.0), 1)]
    );

    // Organization -> Incident is only reachable through the reverse alias;
    // `title` is the preferred label field on incidents.
    let back = QuerySpec {
        dimension_type: Some("Incident".to_string()),
        sort: SortOrder::LabelAsc,
        ..QuerySpec::new("Organization")
    };
    let rows = execute(&collection, &back)?;
    assert_eq!(
        flat(&rows),
        vec![
            ("Fire", Some(1.0), 1),
            ("Leak", Some(1.0), 1),
            ("Outage", Some(1.0), 1)
        ]
    );
    Ok(())
}

#[test]
fn unreachable_dimension_type_is_an_error() {
    let mut nodes = vec![json!({"@id": "urn:p:1", "@type": "Person", "name": "Ann"})];
    nodes.push(json!({"@id": "urn:i:1", "@type": "Incident", "title": "Outage"}));
    let collection = normalize(&nodes);

    let spec = QuerySpec {
        dimension_type: Some("Person".to_string()),
        ..QuerySpec::new("Incident")
    };
    assert!(matches!(
        execute(&collection, &spec),
        Err(QueryError::NoRelationToDimension { .. })
    ));
}

#[test]
fn dimension_without_fields_is_an_error() {
    let collection = normalize(&[json!({
        "@id": "urn:i:1", "@type": "Incident",
        "deployedBy": {"@id": "urn:o:1", "@type": "Organization"}
    })]);
    let spec = QuerySpec {
        dimension_type: Some("Organization".to_string()),
        ..QuerySpec::new("Incident")
    };
    assert_eq!(
        execute(&collection, &spec),
        Err(QueryError::NoDimensionField("schema:Organization".to_string()))
    );
}

#[test]
fn reverse_alias_grouping_mirrors_forward_grouping() -> Result<()> {
    let collection = normalize(&[
        json!({"@id": "urn:e:1", "@type": "Employee", "name": "Ann",
               "reportsTo": {"@id": "urn:m:1", "@type": "Manager", "name": "Mia"}}),
        json!({"@id": "urn:e:2", "@type": "Employee", "name": "Bo",
               "ns:reportsTo": {"@id": "urn:m:1"}}),
        json!({"@id": "urn:e:3", "@type": "Employee", "name": "Cy",
               "https://schema.org/reportsTo": {"@id": "urn:m:2", "@type": "Manager", "name": "Max"}}),
    ]);

    let forward = execute(
        &collection,
        &QuerySpec::new("Employee")
            .group_by("Manager", "name")
            .via("reportsTo"),
    )?;
    assert_eq!(
        flat(&forward),
        vec![("Mia", Some(2.0), 2), ("Max", Some(1.0), 1)]
    );

    let backward = execute(
        &collection,
        &QuerySpec::new("Manager")
            .group_by("Employee", "name")
            .via("_reverse_reportsTo")
            .sort(SortOrder::LabelAsc),
    )?;
    assert_eq!(
        flat(&backward),
        vec![
            ("Ann", Some(1.0), 1),
            ("Bo", Some(1.0), 1),
            ("Cy", Some(1.0), 1)
        ]
    );

    let forward_edges: usize = forward.iter().map(|r| r.support_count).sum();
    let backward_edges: usize = backward.iter().map(|r| r.support_count).sum();
    assert_eq!(forward_edges, backward_edges);
    Ok(())
}

#[test]
fn self_typed_relation_in_foreign_namespace_follows_outgoing_edges() -> Result<()> {
    let person = |id: &str, name: &str, knows: Option<&str>| {
        let mut node = json!({
            "@id": id,
            "@type": ["https://example.org/ns#Person"],
            "https://example.org/ns#name": [{"@value": name}]
        });
        if let Some(target) = knows {
            node["https://example.org/ns#knows"] = json!([{"@id": target}]);
        }
        node
    };
    let collection = normalize(&[
        person("urn:p:a", "A", Some("urn:p:b")),
        person("urn:p:b", "B", Some("urn:p:c")),
        person("urn:p:c", "C", None),
    ]);

    let rows = execute(
        &collection,
        &QuerySpec::new("Person")
            .group_by("Person", "name")
            .via("knows")
            .sort(SortOrder::LabelAsc),
    )?;
    assert_eq!(
        flat(&rows),
        vec![
            ("B", Some(1.0), 1),
            ("C", Some(1.0), 1),
            ("No knows", Some(1.0), 1)
        ]
    );
    Ok(())
}

#[test]
fn relation_only_seen_incoming_follows_reverse_edges() -> Result<()> {
    let rows = execute(
        &incidents(),
        &QuerySpec::new("Organization")
            .group_by("Incident", "title")
            .via("deployedBy")
            .sort(SortOrder::LabelAsc),
    )?;
    assert_eq!(
        flat(&rows),
        vec![
            ("Fire", Some(1.0), 1),
            ("Leak", Some(1.0), 1),
            ("Outage", Some(1.0), 1)
        ]
    );
    Ok(())
}

#[test]
fn entity_contributes_once_per_label() -> Result<()> {
    let collection = normalize(&[json!({
        "@id": "urn:i:1", "@type": "Incident",
        "deployedBy": [
            {"@id": "urn:o:1", "@type": "Organization", "name": "Acme"},
            {"@id": "urn:o:2", "@type": "Organization", "name": "Acme"},
            {"@id": "urn:o:3", "@type": "Organization", "name": "Globex"}
        ]
    })]);
    let rows = execute(&collection, &by_org().sort(SortOrder::LabelAsc))?;
    assert_eq!(
        flat(&rows),
        vec![("Acme", Some(1.0), 1), ("Globex", Some(1.0), 1)]
    );
    Ok(())
}

mod conservation {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn support_counts_sum_to_population(
            owners in proptest::collection::vec(proptest::option::of(0usize..4), 1..30)
        ) {
            let mut nodes = Vec::new();
            for k in 0..4 {
                nodes.push(org(&format!("urn:o:{k}"), &format!("Org {k}")));
            }
            for (i, owner) in owners.iter().enumerate() {
                let mut node = json!({"@id": format!("urn:i:{i}"), "@type": "Incident"});
                if let Some(k) = owner {
                    node["deployedBy"] = json!({"@id": format!("urn:o:{k}")});
                }
                nodes.push(node);
            }
            let collection = normalize(&nodes);

            let rows = execute(&collection, &by_org()).unwrap();
            let support: usize = rows.iter().map(|r| r.support_count).sum();
            prop_assert_eq!(support, owners.len());

            let total: f64 = rows.iter().filter_map(|r| r.value).sum();
            prop_assert_eq!(total, owners.len() as f64);

            for pair in rows.windows(2) {
                prop_assert!(pair[0].value >= pair[1].value);
            }
        }
    }
}
