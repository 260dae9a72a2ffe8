use crate::types::{ConnectionGraph, VertexKind};
use gqlmap_protocol::{SchemaNodeKind, ServiceGraph};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Quality overview of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub schema_types: usize,
    pub resolvers: usize,
    pub connections: usize,

    /// Resolver count per `sourceKind`
    pub resolvers_by_source: BTreeMap<String, usize>,

    /// Connection count per connection type
    pub connections_by_type: BTreeMap<String, usize>,

    /// Resolvers nothing could classify, in resolver order
    pub unknown_resolvers: Vec<String>,

    pub data_sources: Vec<String>,

    /// Query, Mutation and object types with no resolver attached
    pub types_without_resolvers: Vec<String>,
}

impl GraphSummary {
    pub fn from_service_graph(service: &ServiceGraph) -> Self {
        let graph = ConnectionGraph::from_service_graph(service);

        let mut resolvers_by_source = BTreeMap::new();
        for resolver in &service.resolvers {
            *resolvers_by_source
                .entry(resolver.source_kind().to_string())
                .or_insert(0) += 1;
        }

        let mut connections_by_type = BTreeMap::new();
        for connection in &service.connections {
            *connections_by_type
                .entry(connection.kind.to_string())
                .or_insert(0) += 1;
        }

        let data_sources: BTreeSet<&str> = graph.vertices_of_kind(VertexKind::DataSource).collect();

        let types_without_resolvers = service
            .schema
            .iter()
            .filter(|node| {
                matches!(
                    node.kind,
                    SchemaNodeKind::Query | SchemaNodeKind::Mutation | SchemaNodeKind::ObjectType
                )
            })
            .filter(|node| {
                graph
                    .resolvers_of(&node.name)
                    .map(|resolvers| resolvers.is_empty())
                    .unwrap_or(true)
            })
            .map(|node| node.name.clone())
            .collect();

        Self {
            schema_types: service.schema.len(),
            resolvers: service.resolvers.len(),
            connections: service.connections.len(),
            resolvers_by_source,
            connections_by_type,
            unknown_resolvers: service
                .unknown_resolvers()
                .into_iter()
                .map(str::to_string)
                .collect(),
            data_sources: data_sources.into_iter().map(str::to_string).collect(),
            types_without_resolvers,
        }
    }
}
