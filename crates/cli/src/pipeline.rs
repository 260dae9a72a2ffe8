//! One analysis run: schema and resolvers in, `ServiceGraph` out.

use crate::config::GqlmapConfig;
use anyhow::{anyhow, Context as AnyhowContext, Result};
use gqlmap_classifier::{ResolverClassifier, ScanReport, StaticBindings};
use gqlmap_enrichment::{enrich, EnrichmentOracle, HttpOracle, MergeOutcome};
use gqlmap_protocol::{ResolverInfo, SchemaNode, ServiceGraph};
use gqlmap_schema::{SchemaAnalyzer, SchemaSource};
use serde::Serialize;
use std::collections::BTreeMap;

/// Output of the `schema` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReport {
    pub nodes: Vec<SchemaNode>,
    pub type_dependencies: BTreeMap<String, Vec<String>>,
}

/// Load the configured schema. Any failure here is fatal for the run.
pub fn load_schema(config: &GqlmapConfig) -> Result<SchemaAnalyzer> {
    let raw = config
        .schema
        .as_deref()
        .ok_or_else(|| anyhow!("No schema given (use --schema or `schema` in the config)"))?;

    let source = SchemaSource::detect(raw);
    let mut analyzer = SchemaAnalyzer::new();
    analyzer.load(&source).with_context(|| match &source {
        SchemaSource::Path(path) => format!("Failed to load schema {}", path.display()),
        SchemaSource::Inline(_) => "Failed to load inline schema".to_string(),
    })?;
    Ok(analyzer)
}

pub fn schema_report(config: &GqlmapConfig) -> Result<SchemaReport> {
    let analyzer = load_schema(config)?;
    Ok(SchemaReport {
        nodes: analyzer.nodes()?,
        type_dependencies: analyzer.type_dependencies()?,
    })
}

/// Source scan plus schema-attached bindings, concatenated in that order.
pub fn classify(config: &GqlmapConfig) -> Result<(Vec<ResolverInfo>, ScanReport)> {
    let classifier =
        ResolverClassifier::new(config.scan.clone()).context("Invalid [scan] configuration")?;

    let mut report = if config.resolvers.is_empty() {
        ScanReport::default()
    } else {
        classifier.classify_paths(&config.resolvers)
    };
    for failure in &report.failures {
        log::warn!("Skipped {}: {}", failure.path.display(), failure.reason);
    }

    let mut resolvers = std::mem::take(&mut report.resolvers);
    if let Some(path) = config.bindings.as_deref() {
        let bindings = StaticBindings::from_path(path)
            .with_context(|| format!("Failed to load bindings {}", path.display()))?;
        resolvers.extend(classifier.classify_executable(&bindings));
    }

    Ok((resolvers, report))
}

/// Full pipeline. `oracle` overrides the configured HTTP oracle (tests).
pub async fn analyze(
    config: &GqlmapConfig,
    oracle: Option<&dyn EnrichmentOracle>,
) -> Result<ServiceGraph> {
    let analyzer = load_schema(config)?;
    let nodes = analyzer.nodes()?;
    let (resolvers, _) = classify(config)?;

    let outcome = if config.enrichment.enabled {
        run_enrichment(config, oracle, &nodes, resolvers).await
    } else {
        MergeOutcome::unchanged(resolvers)
    };

    let graph = outcome.into_service_graph(nodes, config.enrichment.connections);
    report_unknown(&graph);
    Ok(graph)
}

async fn run_enrichment(
    config: &GqlmapConfig,
    oracle: Option<&dyn EnrichmentOracle>,
    nodes: &[SchemaNode],
    resolvers: Vec<ResolverInfo>,
) -> MergeOutcome {
    if let Some(oracle) = oracle {
        return enrich(oracle, nodes, resolvers).await;
    }

    match HttpOracle::from_config(&config.enrichment) {
        Ok(http) => enrich(&http, nodes, resolvers).await,
        Err(e) => {
            log::warn!("{e}; keeping static classifications");
            MergeOutcome::unchanged(resolvers)
        }
    }
}

fn report_unknown(graph: &ServiceGraph) {
    let unknown = graph.unknown_resolvers();
    if unknown.is_empty() {
        return;
    }
    log::warn!(
        "{} of {} resolvers could not be classified: {}",
        unknown.len(),
        graph.resolvers.len(),
        unknown.join(", ")
    );
}
