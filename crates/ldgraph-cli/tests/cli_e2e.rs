use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn ldgraph_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ldgraph"))
}

fn incidents_document() -> Value {
    json!({
        "@graph": [
            {"@id": "urn:i:1", "@type": "Incident", "title": "Outage", "cost": 100,
             "deployedBy": {"@id": "urn:o:acme", "@type": "Organization", "name": "Acme"}},
            {"@id": "urn:i:2", "@type": "Incident", "title": "Leak", "cost": 50,
             "deployedBy": {"@id": "urn:o:acme"}},
            {"@id": "urn:i:3", "@type": "Incident", "title": "Fire", "cost": 20,
             "deployedBy": {"@id": "urn:o:globex", "@type": "Organization", "name": "Globex"}},
            {"@id": "urn:i:4", "@type": "Incident", "title": "Flood", "cost": 5}
        ]
    })
}

fn write_fixture(dir: &TempDir, name: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(value)?)?;
    Ok(path)
}

fn run(args: &[&str]) -> Result<Output> {
    Ok(Command::new(ldgraph_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()?)
}

fn run_json(args: &[&str]) -> Result<Value> {
    let out = run(args)?;
    if !out.status.success() {
        return Err(anyhow!(
            "ldgraph {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        ));
    }
    Ok(serde_json::from_slice(&out.stdout)?)
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap_or_default()
}

#[test]
fn types_lists_populations() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_fixture(&dir, "incidents.json", &incidents_document())?;

    let types = run_json(&["types", path_str(&input), "--format", "json"])?;
    assert_eq!(
        types,
        json!([
            {"type_name": "schema:Incident", "count": 4},
            {"type_name": "schema:Organization", "count": 2}
        ])
    );
    Ok(())
}

#[test]
fn query_counts_per_organization() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_fixture(&dir, "incidents.json", &incidents_document())?;

    let rows = run_json(&[
        "query",
        path_str(&input),
        "--measure",
        "Incident",
        "--dimension",
        "Organization",
        "--by",
        "name",
        "--via",
        "deployedBy",
        "--format",
        "json",
    ])?;
    assert_eq!(
        rows,
        json!([
            {"label": "Acme", "value": 2.0, "support_count": 2},
            {"label": "Globex", "value": 1.0, "support_count": 1},
            {"label": "No deployedBy", "value": 1.0, "support_count": 1}
        ])
    );
    Ok(())
}

#[test]
fn query_sum_with_limit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_fixture(&dir, "incidents.json", &incidents_document())?;

    let rows = run_json(&[
        "query",
        path_str(&input),
        "--measure",
        "Incident",
        "--aggregate",
        "sum",
        "--field",
        "cost",
        "--dimension",
        "Organization",
        "--limit",
        "1",
        "--format",
        "json",
    ])?;
    assert_eq!(
        rows,
        json!([{"label": "Acme", "value": 150.0, "support_count": 2}])
    );
    Ok(())
}

#[test]
fn missing_measure_field_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_fixture(&dir, "incidents.json", &incidents_document())?;

    let out = run(&["query", path_str(&input), "--measure", "Incident", "--aggregate", "sum"])?;
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("needs a measure field"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn reads_stdin_with_dash() -> Result<()> {
    let mut child = Command::new(ldgraph_bin())
        .args(["fields", "-", "--type", "Incident", "--format", "json"])
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    {
        let stdin = child
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("stdin not captured"))?;
        stdin.write_all(serde_json::to_string(&incidents_document())?.as_bytes())?;
    }
    let out = child.wait_with_output()?;
    assert!(out.status.success());

    let fields: Value = serde_json::from_slice(&out.stdout)?;
    let names: Vec<&str> = fields
        .as_array()
        .ok_or_else(|| anyhow!("expected an array"))?
        .iter()
        .filter_map(|f| f["name"].as_str())
        .collect();
    assert_eq!(names, vec!["cost", "title"]);
    assert_eq!(fields[0]["field_type"], "number");
    Ok(())
}

#[test]
fn config_file_changes_namespace_and_sentinels() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_fixture(&dir, "incidents.json", &incidents_document())?;
    let config = write_fixture(
        &dir,
        "ldgraph.json",
        &json!({
            "graph": {"namespace_prefix": "ex", "namespace_iri": "https://example.org/ns#"},
            "query": {"missing_relation_prefix": "Without"}
        }),
    )?;

    let types = run_json(&["--config", path_str(&config), "types", path_str(&input), "--format", "json"])?;
    assert_eq!(types[0]["type_name"], "ex:Incident");

    let rows = run_json(&[
        "query",
        path_str(&input),
        "--config",
        path_str(&config),
        "--measure",
        "Incident",
        "--dimension",
        "Organization",
        "--sort",
        "label-asc",
        "--format",
        "json",
    ])?;
    let labels: Vec<&str> = rows
        .as_array()
        .ok_or_else(|| anyhow!("expected an array"))?
        .iter()
        .filter_map(|r| r["label"].as_str())
        .collect();
    assert_eq!(labels, vec!["Acme", "Globex", "Without deployedBy"]);
    Ok(())
}

#[test]
fn text_output_and_edges() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_fixture(&dir, "incidents.json", &incidents_document())?;

    let out = run(&["edges", path_str(&input), "--no-color"])?;
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout)?;
    let line = text
        .lines()
        .find(|l| l.trim_start().starts_with("deployedBy"))
        .ok_or_else(|| anyhow!("no deployedBy row in:\n{text}"))?;
    let cells: Vec<&str> = line.split_whitespace().collect();
    assert_eq!(cells, vec!["deployedBy", "3", "3", "2", "0"]);
    Ok(())
}

#[test]
fn unreadable_input_reports_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("nope.json");
    let out = run(&["types", path_str(&missing)])?;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("nope.json"));
    Ok(())
}
