use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gqlmap_cli::{pipeline, GqlmapConfig};
use gqlmap_enrichment::ConnectionMode;
use gqlmap_graph::GraphSummary;
use gqlmap_protocol::{serialize_json_pretty, service_graph_json_schema};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gqlmap")]
#[command(about = "Map GraphQL schema types, resolvers and their data sources", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (JSON or TOML); defaults to ./gqlmap.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full service graph (schema + resolvers + connections)
    Analyze(AnalyzeArgs),

    /// Print schema nodes and the type dependency map
    Schema(SchemaArgs),

    /// Classify resolvers without building the graph
    Classify(ClassifyArgs),

    /// Print the JSON Schema of the graph output
    #[command(name = "schema-json")]
    SchemaJson,
}

#[derive(Args)]
struct SourceArgs {
    /// SDL file path or inline SDL text
    #[arg(short, long)]
    schema: Option<String>,

    /// Resolver source files or directories
    resolvers: Vec<PathBuf>,

    /// JSON resolver bindings ({"Type": {"field": "<source>"}})
    #[arg(long)]
    bindings: Option<PathBuf>,

    /// Only scan files under these prefixes (repeatable)
    #[arg(long = "include")]
    include_paths: Vec<String>,

    /// Skip files under these prefixes (repeatable)
    #[arg(long = "exclude")]
    exclude_paths: Vec<String>,

    /// Glob or substring that scanned file paths must match
    #[arg(long)]
    file_pattern: Option<String>,

    /// Scan files ignored by .gitignore too
    #[arg(long)]
    no_gitignore: bool,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    sources: SourceArgs,

    /// Write the graph to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a summary (counts, unknown resolvers, data sources) to stdout
    #[arg(long)]
    summary: bool,

    /// Ask the configured model about unclassified resolvers
    #[arg(long)]
    enrich: bool,

    /// Enrichment provider: anthropic|openai
    #[arg(long)]
    provider: Option<String>,

    /// Enrichment model id
    #[arg(long)]
    model: Option<String>,

    /// Enrichment request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Which connections to keep when enrichment succeeds
    #[arg(long, value_enum)]
    connections: Option<ConnectionsArg>,
}

#[derive(Args)]
struct SchemaArgs {
    /// SDL file path or inline SDL text
    #[arg(short, long)]
    schema: Option<String>,
}

#[derive(Args)]
struct ClassifyArgs {
    #[command(flatten)]
    sources: SourceArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConnectionsArg {
    Static,
    External,
}

impl From<ConnectionsArg> for ConnectionMode {
    fn from(arg: ConnectionsArg) -> Self {
        match arg {
            ConnectionsArg::Static => ConnectionMode::Static,
            ConnectionsArg::External => ConnectionMode::External,
        }
    }
}

impl SourceArgs {
    /// Flags override file values; list flags replace file lists when given.
    fn apply(self, config: &mut GqlmapConfig) {
        if let Some(schema) = self.schema {
            config.schema = Some(schema);
        }
        if !self.resolvers.is_empty() {
            config.resolvers = self.resolvers;
        }
        if self.bindings.is_some() {
            config.bindings = self.bindings;
        }
        if !self.include_paths.is_empty() {
            config.scan.include_paths = self.include_paths;
        }
        if !self.exclude_paths.is_empty() {
            config.scan.exclude_paths = self.exclude_paths;
        }
        if self.file_pattern.is_some() {
            config.scan.file_pattern = self.file_pattern;
        }
        if self.no_gitignore {
            config.scan.respect_gitignore = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    if let Commands::SchemaJson = cli.command {
        return print_json(&service_graph_json_schema());
    }

    let workdir = env::current_dir().context("Failed to resolve working directory")?;
    let mut config = GqlmapConfig::discover(&workdir, cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => run_analyze(args, config).await?,
        Commands::Schema(args) => {
            if let Some(schema) = args.schema {
                config.schema = Some(schema);
            }
            print_json(&pipeline::schema_report(&config)?)?;
        }
        Commands::Classify(args) => {
            args.sources.apply(&mut config);
            config.validate()?;
            let (resolvers, _) = pipeline::classify(&config)?;
            print_json(&resolvers)?;
        }
        Commands::SchemaJson => unreachable!("handled before config loading"),
    }

    Ok(())
}

async fn run_analyze(args: AnalyzeArgs, mut config: GqlmapConfig) -> Result<()> {
    args.sources.apply(&mut config);
    if args.enrich {
        config.enrichment.enabled = true;
    }
    if let Some(provider) = args.provider {
        config.enrichment.provider = provider;
    }
    if args.model.is_some() {
        config.enrichment.model = args.model;
    }
    if args.timeout_secs.is_some() {
        config.enrichment.timeout_secs = args.timeout_secs;
    }
    if let Some(mode) = args.connections {
        config.enrichment.connections = mode.into();
    }
    config.validate()?;

    let graph = pipeline::analyze(&config, None).await?;

    match args.output.as_deref() {
        Some(path) => write_json(path, &graph)?,
        None if !args.summary => print_json(&graph)?,
        None => {}
    }
    if args.summary {
        print_json(&GraphSummary::from_service_graph(&graph))?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serialize_json_pretty(value)?);
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, serialize_json_pretty(value)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Graph written to {}", path.display());
    Ok(())
}
