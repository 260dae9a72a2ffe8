//! Static connection synthesis.
//!
//! Edges are emitted per resolver first, in input order, then per schema node
//! field. Nothing is deduplicated: two fields of `Post` typed `User` give two
//! `Post → User` edges.

use gqlmap_protocol::{
    is_builtin_scalar, Classification, Connection, ConnectionKind, ResolverInfo, SchemaNode,
    ServiceGraph,
};

pub const DATABASE_PREFIX: &str = "DB:";
pub const API_PREFIX: &str = "API:";

const UNKNOWN_MODEL: &str = "unknown";

/// Synthesized id of the data source behind a classification, if it names one.
pub fn data_source_id(classification: &Classification) -> Option<String> {
    match classification {
        Classification::Database { detail } => Some(format!(
            "{DATABASE_PREFIX}{}",
            detail.model.as_deref().unwrap_or(UNKNOWN_MODEL)
        )),
        Classification::Api { detail } => Some(format!(
            "{API_PREFIX}{}",
            detail.endpoint.as_deref().unwrap_or(&detail.protocol)
        )),
        Classification::Computed | Classification::Unknown => None,
    }
}

pub fn is_data_source_id(id: &str) -> bool {
    id.starts_with(DATABASE_PREFIX) || id.starts_with(API_PREFIX)
}

pub fn synthesize(nodes: &[SchemaNode], resolvers: &[ResolverInfo]) -> Vec<Connection> {
    let mut connections = Vec::new();

    for resolver in resolvers {
        connections.push(Connection::new(
            &resolver.path,
            resolver.declaring_type(),
            ConnectionKind::Resolves,
            format!("{} resolves a field of {}", resolver.path, resolver.declaring_type()),
        ));

        if let Some(source) = data_source_id(&resolver.classification) {
            let description = match &resolver.classification {
                Classification::Database { detail } => match detail.operation.as_deref() {
                    Some(op) => format!("{} via {op}", detail.engine),
                    None => format!("{} access", detail.engine),
                },
                Classification::Api { detail } => match detail.method.as_deref() {
                    Some(method) => format!("{} {method}", detail.protocol),
                    None => format!("{} call", detail.protocol),
                },
                Classification::Computed | Classification::Unknown => String::new(),
            };
            connections.push(Connection::new(
                &resolver.path,
                source,
                ConnectionKind::Calls,
                description,
            ));
        }

        for dependency in &resolver.dependencies {
            connections.push(Connection::new(
                &resolver.path,
                dependency,
                ConnectionKind::Calls,
                "delegates to another resolver",
            ));
        }
    }

    for node in nodes {
        for field in &node.fields {
            if is_builtin_scalar(&field.declared_type) {
                continue;
            }
            connections.push(Connection::new(
                &node.name,
                &field.declared_type,
                ConnectionKind::References,
                format!("{}.{}", node.name, field.name),
            ));
        }
    }

    log::debug!(
        "Synthesized {} connections from {} schema nodes and {} resolvers",
        connections.len(),
        nodes.len(),
        resolvers.len()
    );
    connections
}

/// The full static graph: schema, resolvers and synthesized connections.
pub fn build_service_graph(nodes: Vec<SchemaNode>, resolvers: Vec<ResolverInfo>) -> ServiceGraph {
    let connections = synthesize(&nodes, &resolvers);
    ServiceGraph::new(nodes, resolvers, connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlmap_protocol::{ApiDetail, DatabaseDetail, SchemaField, SchemaNodeKind};
    use pretty_assertions::assert_eq;

    fn field(name: &str, declared_type: &str) -> SchemaField {
        SchemaField {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            is_non_null: false,
            is_list: false,
            description: None,
        }
    }

    fn node(kind: SchemaNodeKind, name: &str, fields: Vec<SchemaField>) -> SchemaNode {
        SchemaNode {
            kind,
            name: name.to_string(),
            fields,
            description: None,
        }
    }

    fn edges(connections: &[Connection]) -> Vec<(&str, &str, ConnectionKind)> {
        connections
            .iter()
            .map(|c| (c.from.as_str(), c.to.as_str(), c.kind))
            .collect()
    }

    fn blog() -> (Vec<SchemaNode>, Vec<ResolverInfo>) {
        let nodes = vec![
            node(SchemaNodeKind::Query, "Query", vec![field("posts", "Post")]),
            node(
                SchemaNodeKind::ObjectType,
                "Post",
                vec![field("id", "ID"), field("title", "String"), field("author", "User")],
            ),
            node(SchemaNodeKind::ObjectType, "User", vec![field("id", "ID")]),
        ];
        let resolvers = vec![
            ResolverInfo::new("Query.posts").with_classification(Classification::Database {
                detail: DatabaseDetail {
                    engine: "prisma".to_string(),
                    model: Some("post".to_string()),
                    operation: Some("findMany".to_string()),
                },
            }),
            ResolverInfo::new("Post.author")
                .with_classification(Classification::Api {
                    detail: ApiDetail {
                        protocol: "REST".to_string(),
                        endpoint: None,
                        method: Some("GET".to_string()),
                    },
                })
                .with_dependencies(["Query.user"]),
            ResolverInfo::new("formatResolver").with_classification(Classification::Computed),
        ];
        (nodes, resolvers)
    }

    #[test]
    fn resolver_edges_precede_schema_edges() {
        let (nodes, resolvers) = blog();
        let connections = synthesize(&nodes, &resolvers);

        assert_eq!(
            edges(&connections),
            vec![
                ("Query.posts", "Query", ConnectionKind::Resolves),
                ("Query.posts", "DB:post", ConnectionKind::Calls),
                ("Post.author", "Post", ConnectionKind::Resolves),
                ("Post.author", "API:REST", ConnectionKind::Calls),
                ("Post.author", "Query.user", ConnectionKind::Calls),
                ("formatResolver", "formatResolver", ConnectionKind::Resolves),
                ("Query", "Post", ConnectionKind::References),
                ("Post", "User", ConnectionKind::References),
            ]
        );
    }

    #[test]
    fn post_author_gives_single_reference() {
        let (nodes, _) = blog();
        let references: Vec<_> = synthesize(&nodes[1..2], &[])
            .into_iter()
            .filter(|c| c.kind == ConnectionKind::References)
            .collect();
        assert_eq!(references.len(), 1);
        assert_eq!((references[0].from.as_str(), references[0].to.as_str()), ("Post", "User"));
    }

    #[test]
    fn synthesis_is_deterministic() {
        let (nodes, resolvers) = blog();
        assert_eq!(synthesize(&nodes, &resolvers), synthesize(&nodes, &resolvers));
    }

    #[test]
    fn parallel_edges_are_kept() {
        let nodes = vec![node(
            SchemaNodeKind::ObjectType,
            "Post",
            vec![field("author", "User"), field("editor", "User")],
        )];
        assert_eq!(synthesize(&nodes, &[]).len(), 2);
    }

    #[test]
    fn data_source_ids() {
        let db_without_model = Classification::Database {
            detail: DatabaseDetail {
                engine: "sql".to_string(),
                model: None,
                operation: None,
            },
        };
        assert_eq!(data_source_id(&db_without_model).as_deref(), Some("DB:unknown"));

        let api_with_endpoint = Classification::Api {
            detail: ApiDetail {
                protocol: "GraphQL".to_string(),
                endpoint: Some("https://gw/graphql".to_string()),
                method: None,
            },
        };
        assert_eq!(
            data_source_id(&api_with_endpoint).as_deref(),
            Some("API:https://gw/graphql")
        );
        assert_eq!(data_source_id(&Classification::Unknown), None);
        assert!(is_data_source_id("DB:unknown"));
        assert!(!is_data_source_id("Query.me"));
    }
}
