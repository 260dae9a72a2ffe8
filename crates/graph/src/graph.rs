use crate::error::{GraphError, Result};
use crate::types::{ConnectionGraph, VertexKind};
use gqlmap_protocol::ConnectionKind;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashSet};

impl ConnectionGraph {
    /// Resolvers with a `resolves` edge into `type_name`, in insertion order.
    pub fn resolvers_of(&self, type_name: &str) -> Result<Vec<&str>> {
        let node = self.expect_kind(type_name, VertexKind::SchemaType)?;
        let mut seen = HashSet::new();
        let mut resolvers: Vec<(NodeIndex, &str)> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .filter(|e| e.weight().kind == ConnectionKind::Resolves)
            .filter(|e| seen.insert(e.source()))
            .map(|e| (e.source(), self.graph[e.source()].id.as_str()))
            .collect();
        resolvers.sort_by_key(|(idx, _)| *idx);
        Ok(resolvers.into_iter().map(|(_, id)| id).collect())
    }

    /// Outgoing `calls` targets of a resolver (data sources and other resolvers)
    pub fn callees(&self, path: &str) -> Result<Vec<&str>> {
        let node = self
            .find_node(path)
            .ok_or_else(|| GraphError::node_not_found(path))?;
        Ok(self
            .calls_from(node)
            .map(|idx| self.graph[idx].id.as_str())
            .collect())
    }

    /// Data sources reached by following `calls` edges transitively, starting
    /// from a resolver or from every resolver of a schema type.
    pub fn data_sources_for(&self, id: &str) -> Result<BTreeSet<String>> {
        let node = self
            .find_node(id)
            .ok_or_else(|| GraphError::node_not_found(id))?;

        let mut queue: Vec<NodeIndex> = match self.graph[node].kind {
            VertexKind::SchemaType => self
                .graph
                .edges_directed(node, Direction::Incoming)
                .filter(|e| e.weight().kind == ConnectionKind::Resolves)
                .map(|e| e.source())
                .collect(),
            VertexKind::Resolver | VertexKind::DataSource => vec![node],
        };

        let mut visited = HashSet::new();
        let mut sources = BTreeSet::new();
        while let Some(current) = queue.pop() {
            if !visited.insert(current) {
                continue;
            }
            let vertex = &self.graph[current];
            if vertex.kind == VertexKind::DataSource {
                sources.insert(vertex.id.clone());
                continue;
            }
            queue.extend(self.calls_from(current).filter(|idx| !visited.contains(idx)));
        }

        Ok(sources)
    }

    /// Types named by `references` edges out of `type_name`, deduplicated.
    pub fn referenced_types(&self, type_name: &str) -> Result<BTreeSet<&str>> {
        let node = self.expect_kind(type_name, VertexKind::SchemaType)?;
        Ok(self
            .graph
            .edges(node)
            .filter(|e| e.weight().kind == ConnectionKind::References)
            .map(|e| self.graph[e.target()].id.as_str())
            .collect())
    }

    pub fn vertices_of_kind(&self, kind: VertexKind) -> impl Iterator<Item = &str> {
        self.vertices()
            .filter(move |v| v.kind == kind)
            .map(|v| v.id.as_str())
    }

    fn calls_from(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut seen = HashSet::new();
        let mut targets: Vec<NodeIndex> = self
            .graph
            .edges(node)
            .filter(|e| e.weight().kind == ConnectionKind::Calls)
            .map(|e| e.target())
            .filter(|idx| seen.insert(*idx))
            .collect();
        targets.sort();
        targets.into_iter()
    }

    fn expect_kind(&self, id: &str, expected: VertexKind) -> Result<NodeIndex> {
        let node = self
            .find_node(id)
            .ok_or_else(|| GraphError::node_not_found(id))?;
        let actual = self.graph[node].kind;
        if actual != expected {
            return Err(GraphError::WrongNodeKind {
                id: id.to_string(),
                expected: expected.as_str(),
                actual: actual.as_str(),
            });
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlmap_protocol::Connection;
    use pretty_assertions::assert_eq;

    fn sample() -> ConnectionGraph {
        ConnectionGraph::from_connections(&[
            Connection::new("Query.posts", "Query", ConnectionKind::Resolves, ""),
            Connection::new("Query.posts", "DB:post", ConnectionKind::Calls, ""),
            Connection::new("Query.feed", "Query", ConnectionKind::Resolves, ""),
            Connection::new("Query.feed", "Query.posts", ConnectionKind::Calls, ""),
            Connection::new("Query.feed", "API:https://ads", ConnectionKind::Calls, ""),
            Connection::new("Post.author", "Post", ConnectionKind::Resolves, ""),
            Connection::new("Query", "Post", ConnectionKind::References, ""),
            Connection::new("Post", "User", ConnectionKind::References, ""),
            Connection::new("Post", "User", ConnectionKind::References, ""),
        ])
    }

    #[test]
    fn resolvers_of_type() {
        let graph = sample();
        assert_eq!(graph.resolvers_of("Query").unwrap(), vec!["Query.posts", "Query.feed"]);
        assert_eq!(graph.resolvers_of("User").unwrap(), Vec::<&str>::new());
        assert!(matches!(
            graph.resolvers_of("Missing"),
            Err(GraphError::NodeNotFound(_))
        ));
        assert!(matches!(
            graph.resolvers_of("DB:post"),
            Err(GraphError::WrongNodeKind { .. })
        ));
    }

    #[test]
    fn data_sources_follow_calls_transitively() {
        let graph = sample();
        let from_type: Vec<String> = graph.data_sources_for("Query").unwrap().into_iter().collect();
        assert_eq!(from_type, vec!["API:https://ads".to_string(), "DB:post".to_string()]);

        let from_resolver = graph.data_sources_for("Query.posts").unwrap();
        assert_eq!(from_resolver.len(), 1);
        assert!(graph.data_sources_for("Post").unwrap().is_empty());
    }

    #[test]
    fn callees_and_references() {
        let graph = sample();
        assert_eq!(
            graph.callees("Query.feed").unwrap(),
            vec!["Query.posts", "API:https://ads"]
        );
        let referenced: Vec<&str> = graph.referenced_types("Post").unwrap().into_iter().collect();
        assert_eq!(referenced, vec!["User"]);
        assert_eq!(graph.edge_count(), 9);
    }

    #[test]
    fn cycles_terminate() {
        let graph = ConnectionGraph::from_connections(&[
            Connection::new("A.x", "A.y", ConnectionKind::Calls, ""),
            Connection::new("A.y", "A.x", ConnectionKind::Calls, ""),
            Connection::new("A.y", "DB:a", ConnectionKind::Calls, ""),
        ]);
        assert_eq!(graph.data_sources_for("A.x").unwrap().len(), 1);
    }
}
