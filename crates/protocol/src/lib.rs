//! # gqlmap protocol
//!
//! Plain data exchanged between the extraction stages and handed to whatever
//! renders the final graph. Nothing in here is executable: every type is a
//! serde value with a JSON Schema.
//!
//! ```text
//! SchemaNode[]  ──┐
//!                 ├──> Connection[] ──> ServiceGraph
//! ResolverInfo[] ─┘
//! ```

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub mod path_filters;

pub const GRAPH_SCHEMA_VERSION: u32 = 1;

/// Scalars every GraphQL schema has without declaring them.
pub const BUILTIN_SCALARS: [&str; 5] = ["ID", "String", "Int", "Float", "Boolean"];

/// Prefix reserved for introspection types and fields.
pub const INTROSPECTION_PREFIX: &str = "__";

pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

pub fn is_introspection_name(name: &str) -> bool {
    name.starts_with(INTROSPECTION_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SchemaNodeKind {
    Query,
    Mutation,
    ObjectType,
    Interface,
    Union,
    Enum,
    InputType,
}

impl SchemaNodeKind {
    /// Kinds whose nodes carry a field list.
    pub fn has_fields(self) -> bool {
        matches!(
            self,
            SchemaNodeKind::Query
                | SchemaNodeKind::Mutation
                | SchemaNodeKind::ObjectType
                | SchemaNodeKind::Interface
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaNodeKind::Query => "Query",
            SchemaNodeKind::Mutation => "Mutation",
            SchemaNodeKind::ObjectType => "ObjectType",
            SchemaNodeKind::Interface => "Interface",
            SchemaNodeKind::Union => "Union",
            SchemaNodeKind::Enum => "Enum",
            SchemaNodeKind::InputType => "InputType",
        }
    }
}

impl fmt::Display for SchemaNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a schema node, with wrapper types already unwrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub name: String,

    /// Named type at the bottom of the wrapper chain (never contains `[`, `]`, `!`)
    pub declared_type: String,

    pub is_non_null: bool,

    pub is_list: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One schema-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    pub kind: SchemaNodeKind,

    pub name: String,

    /// Only populated for Query, Mutation, ObjectType and Interface
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<SchemaField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Database,
    Api,
    Computed,
    Unknown,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Database => "database",
            SourceKind::Api => "api",
            SourceKind::Computed => "computed",
            SourceKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseDetail {
    /// Access technology (e.g., "prisma", "mongodb", "sql")
    pub engine: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Normalized CRUD verb (findMany, findUnique, create, update, delete, other)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApiDetail {
    /// "REST" or "GraphQL"
    pub protocol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Upper-case HTTP verb when the call form names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Source kind and its detail as a single value.
///
/// Serialized flat as `sourceKind` plus `databaseDetail` / `apiDetail`, so a
/// detail object can only ever appear next to its own kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "sourceKind", rename_all = "lowercase")]
pub enum Classification {
    Database {
        #[serde(rename = "databaseDetail")]
        detail: DatabaseDetail,
    },
    Api {
        #[serde(rename = "apiDetail")]
        detail: ApiDetail,
    },
    Computed,
    #[default]
    Unknown,
}

impl Classification {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Classification::Database { .. } => SourceKind::Database,
            Classification::Api { .. } => SourceKind::Api,
            Classification::Computed => SourceKind::Computed,
            Classification::Unknown => SourceKind::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Classification::Unknown)
    }
}

/// One detected resolver implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolverInfo {
    /// `"<TypeName>.<fieldName>"`, or a bare name for standalone resolvers
    pub path: String,

    #[serde(flatten)]
    pub classification: Classification,

    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

impl ResolverInfo {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            classification: Classification::Unknown,
            dependencies: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    #[must_use]
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn source_kind(&self) -> SourceKind {
        self.classification.source_kind()
    }

    pub fn database_detail(&self) -> Option<&DatabaseDetail> {
        match &self.classification {
            Classification::Database { detail } => Some(detail),
            _ => None,
        }
    }

    pub fn api_detail(&self) -> Option<&ApiDetail> {
        match &self.classification {
            Classification::Api { detail } => Some(detail),
            _ => None,
        }
    }

    /// Type that owns this resolver: text before the first dot, or the whole path.
    pub fn declaring_type(&self) -> &str {
        self.path
            .split_once('.')
            .map_or(self.path.as_str(), |(owner, _)| owner)
    }

    pub fn field_name(&self) -> Option<&str> {
        self.path.split_once('.').map(|(_, field)| field)
    }

    /// Fold another observation of the same path into this record.
    ///
    /// A known classification is never replaced; an unknown one takes the
    /// incoming classification. Dependencies are always unioned. Returns
    /// `true` when the classification changed.
    pub fn absorb<I>(&mut self, classification: Classification, dependencies: I) -> bool
    where
        I: IntoIterator<Item = String>,
    {
        self.dependencies.extend(dependencies);
        if self.classification.is_known() || !classification.is_known() {
            return false;
        }
        self.classification = classification;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Resolver → type that declares the resolved field
    Resolves,
    /// Resolver → data source or another resolver
    Calls,
    /// Type → type named by one of its fields
    References,
}

impl ConnectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionKind::Resolves => "resolves",
            ConnectionKind::Calls => "calls",
            ConnectionKind::References => "references",
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed, typed edge. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Connection {
    pub from: String,
    pub to: String,
    /// Written as `kind`; oracle output that says `type` is accepted too
    #[serde(alias = "type")]
    pub kind: ConnectionKind,
    #[serde(default)]
    pub description: String,
}

impl Connection {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        kind: ConnectionKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            description: description.into(),
        }
    }
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceGraph {
    pub schema_version: u32,
    pub schema: Vec<SchemaNode>,
    pub resolvers: Vec<ResolverInfo>,
    pub connections: Vec<Connection>,
}

impl ServiceGraph {
    pub fn new(
        schema: Vec<SchemaNode>,
        resolvers: Vec<ResolverInfo>,
        connections: Vec<Connection>,
    ) -> Self {
        Self {
            schema_version: GRAPH_SCHEMA_VERSION,
            schema,
            resolvers,
            connections,
        }
    }

    /// Paths of resolvers nothing could classify.
    pub fn unknown_resolvers(&self) -> Vec<&str> {
        self.resolvers
            .iter()
            .filter(|r| !r.classification.is_known())
            .map(|r| r.path.as_str())
            .collect()
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// JSON Schema of the graph handed to renderers.
pub fn service_graph_json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(ServiceGraph)).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn database_resolver_serializes_flat() {
        let info = ResolverInfo::new("Query.users").with_classification(Classification::Database {
            detail: DatabaseDetail {
                engine: "prisma".to_string(),
                model: Some("user".to_string()),
                operation: Some("findMany".to_string()),
            },
        });

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(
            value,
            json!({
                "path": "Query.users",
                "sourceKind": "database",
                "databaseDetail": {"engine": "prisma", "model": "user", "operation": "findMany"},
                "dependencies": []
            })
        );
        assert!(value.get("apiDetail").is_none());
    }

    #[test]
    fn unknown_resolver_has_no_detail() {
        let value = serde_json::to_value(ResolverInfo::new("Query.me")).unwrap();
        assert_eq!(value["sourceKind"], "unknown");
        assert!(value.get("databaseDetail").is_none());
        assert!(value.get("apiDetail").is_none());
    }

    #[test]
    fn resolver_round_trips_through_wire_shape() {
        let raw = json!({
            "path": "User.avatar",
            "sourceKind": "api",
            "apiDetail": {"protocol": "REST", "method": "GET"},
            "dependencies": ["Query.user"]
        });
        let info: ResolverInfo = serde_json::from_value(raw).unwrap();
        assert_eq!(info.source_kind(), SourceKind::Api);
        assert_eq!(info.api_detail().unwrap().method.as_deref(), Some("GET"));
        assert!(info.database_detail().is_none());
        assert!(info.dependencies.contains("Query.user"));
    }

    #[test]
    fn declaring_type_falls_back_to_whole_path() {
        assert_eq!(ResolverInfo::new("Query.users").declaring_type(), "Query");
        assert_eq!(ResolverInfo::new("userResolver").declaring_type(), "userResolver");
        assert_eq!(ResolverInfo::new("userResolver").field_name(), None);
    }

    #[test]
    fn absorb_keeps_first_known_classification() {
        let mut info = ResolverInfo::new("Query.feed").with_dependencies(["Query.me"]);
        assert!(info.absorb(Classification::Computed, vec!["User.posts".to_string()]));
        assert_eq!(info.source_kind(), SourceKind::Computed);

        let api = Classification::Api {
            detail: ApiDetail {
                protocol: "REST".to_string(),
                endpoint: None,
                method: None,
            },
        };
        assert!(!info.absorb(api, Vec::new()));
        assert!(!info.absorb(Classification::Unknown, Vec::new()));
        assert_eq!(info.source_kind(), SourceKind::Computed);
        assert_eq!(
            info.dependencies.iter().cloned().collect::<Vec<_>>(),
            vec!["Query.me".to_string(), "User.posts".to_string()]
        );
    }

    #[test]
    fn connection_kind_key() {
        let edge = Connection::new("Post", "User", ConnectionKind::References, "Post.author");
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["kind"], "references");
        assert!(value.get("type").is_none());

        let from_oracle: Connection =
            serde_json::from_str(r#"{"from": "Query.me", "to": "API:auth", "type": "calls"}"#)
                .unwrap();
        assert_eq!(from_oracle.kind, ConnectionKind::Calls);
        assert_eq!(from_oracle.description, "");
    }

    #[test]
    fn builtin_scalars_and_introspection_names() {
        assert!(is_builtin_scalar("ID"));
        assert!(!is_builtin_scalar("DateTime"));
        assert!(is_introspection_name("__Schema"));
        assert!(!is_introspection_name("_Service"));
    }
}
