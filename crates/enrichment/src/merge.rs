use crate::config::ConnectionMode;
use crate::payload::{EnrichmentPayload, ResolverInsight};
use gqlmap_graph::synthesize;
use gqlmap_protocol::{Connection, ResolverInfo, SchemaNode, ServiceGraph};
use std::collections::HashMap;

/// Result of folding an oracle payload into the static resolvers.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub resolvers: Vec<ResolverInfo>,

    /// Oracle connections; `None` when no payload was merged
    pub external_connections: Option<Vec<Connection>>,

    /// Resolvers that went from `unknown` to a known kind
    pub upgraded: usize,
}

impl MergeOutcome {
    /// Static resolvers, untouched.
    pub fn unchanged(resolvers: Vec<ResolverInfo>) -> Self {
        Self {
            resolvers,
            external_connections: None,
            upgraded: 0,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.external_connections.is_some()
    }

    /// Assemble the final graph. Exactly one connection source is used:
    /// the oracle's list in external mode when enrichment succeeded, the
    /// synthesized one otherwise.
    pub fn into_service_graph(self, schema: Vec<SchemaNode>, mode: ConnectionMode) -> ServiceGraph {
        let connections = match (mode, self.external_connections) {
            (ConnectionMode::External, Some(external)) => external,
            (ConnectionMode::External, None) => {
                log::info!("No external connections available; synthesizing statically");
                synthesize(&schema, &self.resolvers)
            }
            (ConnectionMode::Static, _) => synthesize(&schema, &self.resolvers),
        };
        ServiceGraph::new(schema, self.resolvers, connections)
    }
}

/// Apply insights by path. Known classifications are kept; unknown ones adopt
/// the insight's classification; dependencies are always unioned. Insights for
/// paths not in `resolvers` are ignored.
pub fn merge_insights(
    mut resolvers: Vec<ResolverInfo>,
    insights: &[ResolverInsight],
) -> (Vec<ResolverInfo>, usize) {
    let by_path: HashMap<&str, &ResolverInsight> = insights
        .iter()
        .map(|insight| (insight.path.as_str(), insight))
        .collect();

    let mut upgraded = 0;
    for resolver in &mut resolvers {
        let Some(insight) = by_path.get(resolver.path.as_str()) else {
            continue;
        };
        if resolver.absorb(insight.classification(), insight.dependencies.iter().cloned()) {
            upgraded += 1;
        }
    }

    let unmatched = insights
        .iter()
        .filter(|insight| !resolvers.iter().any(|r| r.path == insight.path))
        .count();
    if unmatched > 0 {
        log::debug!("Ignored {unmatched} insights for resolvers outside the static scan");
    }

    (resolvers, upgraded)
}

/// Merge a raw oracle response. A response without a well-formed payload is
/// logged and leaves `resolvers` exactly as given.
pub fn merge_response(resolvers: Vec<ResolverInfo>, response: &str) -> MergeOutcome {
    match EnrichmentPayload::parse(response) {
        Ok(payload) => merge_payload(resolvers, payload),
        Err(e) => {
            log::warn!("Discarding enrichment response: {e}");
            MergeOutcome::unchanged(resolvers)
        }
    }
}

pub fn merge_payload(resolvers: Vec<ResolverInfo>, payload: EnrichmentPayload) -> MergeOutcome {
    let (resolvers, upgraded) = merge_insights(resolvers, &payload.resolver_insights);
    log::info!(
        "Enrichment upgraded {upgraded} resolvers and proposed {} connections",
        payload.connections.len()
    );
    MergeOutcome {
        resolvers,
        external_connections: Some(payload.connections),
        upgraded,
    }
}
