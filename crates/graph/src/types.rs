use crate::synthesizer::is_data_source_id;
use gqlmap_protocol::{Connection, ConnectionKind, ServiceGraph};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a graph vertex stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VertexKind {
    SchemaType,
    Resolver,
    DataSource,
}

impl VertexKind {
    /// Kind of an id seen only as a connection endpoint.
    pub fn infer(id: &str) -> Self {
        if is_data_source_id(id) {
            VertexKind::DataSource
        } else if id.contains('.') {
            VertexKind::Resolver
        } else {
            VertexKind::SchemaType
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VertexKind::SchemaType => "schema type",
            VertexKind::Resolver => "resolver",
            VertexKind::DataSource => "data source",
        }
    }
}

/// Node in the connection graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    /// Schema type name, resolver path or data source id
    pub id: String,
    pub kind: VertexKind,
}

/// Edge in the connection graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub kind: ConnectionKind,
    pub description: String,
}

/// Directed multigraph over schema types, resolvers and data sources
pub struct ConnectionGraph {
    pub graph: DiGraph<Vertex, GraphEdge>,

    /// Vertex id -> NodeIndex mapping for fast lookup
    pub index: HashMap<String, NodeIndex>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Every schema node and resolver becomes a vertex even when no
    /// connection touches it.
    pub fn from_service_graph(service: &ServiceGraph) -> Self {
        let mut graph = Self::new();
        for node in &service.schema {
            graph.add_vertex(&node.name, VertexKind::SchemaType);
        }
        for resolver in &service.resolvers {
            graph.add_vertex(&resolver.path, VertexKind::Resolver);
        }
        for connection in &service.connections {
            graph.add_connection(connection);
        }
        graph
    }

    pub fn from_connections(connections: &[Connection]) -> Self {
        let mut graph = Self::new();
        for connection in connections {
            graph.add_connection(connection);
        }
        graph
    }

    /// Insert a vertex, or return the existing one with the same id.
    pub fn add_vertex(&mut self, id: &str, kind: VertexKind) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(Vertex {
            id: id.to_string(),
            kind,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add one edge; unseen endpoints get a vertex with an inferred kind.
    pub fn add_connection(&mut self, connection: &Connection) {
        let from = self.add_vertex(&connection.from, VertexKind::infer(&connection.from));
        let to = self.add_vertex(&connection.to, VertexKind::infer(&connection.to));
        self.graph.add_edge(
            from,
            to,
            GraphEdge {
                kind: connection.kind,
                description: connection.description.clone(),
            },
        );
    }

    /// Find vertex by id
    pub fn find_node(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn get_node(&self, idx: NodeIndex) -> Option<&Vertex> {
        self.graph.node_weight(idx)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.raw_nodes().iter().map(|node| &node.weight)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for ConnectionGraph {
    fn default() -> Self {
        Self::new()
    }
}
