use crate::error::{EnrichmentError, Result};
use gqlmap_protocol::{ResolverInfo, SchemaNode};
use serde::Serialize;

pub const SYSTEM_PROMPT: &str = "You are a GraphQL architecture analyst. You infer where \
resolvers get their data from and answer with a single JSON object only.";

const INSTRUCTION: &str = r#"Below are the schema types and the statically detected resolvers of a GraphQL service.
Resolvers with "sourceKind": "unknown" could not be classified from source.

Return one JSON object with these keys:
- "connections": array of {"from", "to", "type", "description"} where "type" is one of
  "resolves" (resolver -> type), "calls" (resolver -> data source or resolver),
  "references" (type -> type). Name data sources "DB:<model>" or "API:<endpoint or protocol>".
- "resolverInsights": array of {"path", "sourceKind", "databaseDetail"?, "apiDetail"?, "dependencies"?}
  where "sourceKind" is "database", "api", "computed" or "unknown",
  "databaseDetail" is {"engine", "model", "operation"} and "apiDetail" is {"protocol", "endpoint", "method"}.
- "architecturePatterns": array of short strings.
"#;

#[derive(Serialize)]
struct PromptContext<'a> {
    schema: &'a [SchemaNode],
    resolvers: &'a [ResolverInfo],
}

/// User message carrying the serialized schema and resolvers.
pub fn build_prompt(schema: &[SchemaNode], resolvers: &[ResolverInfo]) -> Result<String> {
    let context = serde_json::to_string_pretty(&PromptContext { schema, resolvers })
        .map_err(|e| EnrichmentError::invalid_config(format!("cannot serialize prompt: {e}")))?;
    Ok(format!("{INSTRUCTION}\n```json\n{context}\n```\n"))
}
