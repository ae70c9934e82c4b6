//! ldgraph CLI
//!
//! Command-line front end for the ldgraph crates:
//! - listing entity types and relationship statistics of a JSON-LD document
//! - discovering the fields and relationships of one type
//! - running measure/dimension aggregation queries
//!
//! Every command reads one expanded JSON-LD document (a node array, a
//! `{"@graph": [...]}` wrapper, or a single node) from a file or stdin (`-`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ldgraph_discovery::{
    discover_fields, discover_relationships, relationship_stats, type_summaries,
};
use ldgraph_normalize::{nodes_from_document, normalize_with_config, EntityCollection, GraphConfig};
use ldgraph_query::{execute_with_config, Aggregation, QuerySpec, SortOrder};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

#[derive(Parser)]
#[command(name = "ldgraph")]
#[command(author, version, about = "ldgraph: schema discovery and analytics over JSON-LD graphs")]
struct Cli {
    /// JSON config file (`{"graph": {...}, "query": {...}}`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// More log output on stderr (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Entity types and their populations
    Types {
        /// Input document (`-` for stdin)
        input: PathBuf,
    },

    /// Fields observed on one entity type
    Fields {
        /// Input document (`-` for stdin)
        input: PathBuf,
        /// Entity type (any spelling: `Incident`, `ns:Incident`, full IRI)
        #[arg(long = "type")]
        type_name: String,
    },

    /// Relationships leaving one entity type
    Relations {
        /// Input document (`-` for stdin)
        input: PathBuf,
        /// Entity type (any spelling)
        #[arg(long = "type")]
        type_name: String,
    },

    /// Edge statistics per relation across the whole document
    Edges {
        /// Input document (`-` for stdin)
        input: PathBuf,
    },

    /// Group, aggregate, sort and limit a measure population
    Query {
        /// Input document (`-` for stdin)
        input: PathBuf,
        /// Type of the entities being measured
        #[arg(long)]
        measure: String,
        /// count | sum | average | min | max | cumulative
        #[arg(long, default_value_t = Aggregation::Count)]
        aggregate: Aggregation,
        /// Numeric field on the measure entities (required unless counting)
        #[arg(long)]
        field: Option<String>,
        /// Type of the grouping entities (defaults to the measure type)
        #[arg(long)]
        dimension: Option<String>,
        /// Field giving the group label (picked automatically when omitted)
        #[arg(long)]
        by: Option<String>,
        /// Relation from measure to dimension entities (picked automatically when omitted)
        #[arg(long)]
        via: Option<String>,
        /// value-asc | value-desc | label-asc | label-desc | chrono-asc | chrono-desc
        #[arg(long, default_value_t = SortOrder::ValueDesc)]
        sort: SortOrder,
        /// Keep at most this many groups
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = config::load(cli.config.as_deref())?;
    let format = cli.format;

    match cli.command {
        Commands::Types { input } => {
            let collection = load_collection(&input, &config.graph)?;
            let summaries = type_summaries(&collection);
            emit(format, &summaries, || render::types(&summaries))
        }
        Commands::Fields { input, type_name } => {
            let collection = load_collection(&input, &config.graph)?;
            let fields = discover_fields(&collection, &type_name);
            let shown = display_type(&collection, &type_name);
            emit(format, &fields, || render::fields(shown, &fields))
        }
        Commands::Relations { input, type_name } => {
            let collection = load_collection(&input, &config.graph)?;
            let relations = discover_relationships(&collection, &type_name);
            let shown = display_type(&collection, &type_name);
            emit(format, &relations, || render::relations(shown, &relations))
        }
        Commands::Edges { input } => {
            let collection = load_collection(&input, &config.graph)?;
            let stats = relationship_stats(&collection);
            emit(format, &stats, || render::edges(&stats))
        }
        Commands::Query {
            input,
            measure,
            aggregate,
            field,
            dimension,
            by,
            via,
            sort,
            limit,
        } => {
            let collection = load_collection(&input, &config.graph)?;
            let spec = QuerySpec {
                measure_type: measure,
                aggregation: aggregate,
                measure_field: field,
                dimension_type: dimension,
                dimension_field: by,
                via,
                sort,
                limit,
            };
            let rows = execute_with_config(&collection, &spec, &config.query)
                .with_context(|| format!("query over {}", spec.measure_type))?;
            info!(groups = rows.len(), "query done");
            emit(format, &rows, || render::rows(&query_title(&spec), &rows))
        }
    }
}

/// Read and normalize `input` (`-` reads stdin).
fn load_collection(input: &Path, graph: &GraphConfig) -> Result<EntityCollection> {
    let text = if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?
    };
    let document: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing JSON from {}", input.display()))?;

    let nodes = nodes_from_document(&document);
    let collection = normalize_with_config(&nodes, graph);
    info!(
        nodes = nodes.len(),
        entities = collection.len(),
        edges = collection.edge_count(),
        "normalized {}",
        input.display()
    );
    Ok(collection)
}

fn display_type<'a>(collection: &'a EntityCollection, name: &'a str) -> &'a str {
    collection.resolve_type(name).unwrap_or(name)
}

fn query_title(spec: &QuerySpec) -> String {
    let mut title = match &spec.measure_field {
        Some(field) => format!("{}({}) of {}", spec.aggregation, field, spec.measure_type),
        None => format!("{} of {}", spec.aggregation, spec.measure_type),
    };
    if let Some(dimension) = &spec.dimension_type {
        title.push_str(&format!(" by {dimension}"));
    }
    if let Some(via) = &spec.via {
        title.push_str(&format!(" via {via}"));
    }
    title
}

fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
    text: impl FnOnce() -> String,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => print!("{}", text()),
    }
    Ok(())
}
