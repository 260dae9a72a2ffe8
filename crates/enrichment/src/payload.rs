//! Parsing of oracle responses.
//!
//! Responses are free text. The first balanced `{ ... }` block is taken as the
//! payload; braces inside JSON strings do not count toward the balance.

use crate::error::{EnrichmentError, Result};
use gqlmap_protocol::{ApiDetail, Classification, Connection, DatabaseDetail, SourceKind};
use serde::de;
use serde::{Deserialize, Deserializer};

const UNKNOWN_DETAIL: &str = "unknown";

/// What the oracle proposed for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentPayload {
    pub connections: Vec<Connection>,
    pub resolver_insights: Vec<ResolverInsight>,
    /// Carried through for callers that want it; never merged
    pub architecture_patterns: Vec<serde_json::Value>,
}

/// The oracle's opinion about one resolver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverInsight {
    #[serde(default)]
    pub path: String,

    #[serde(default = "unknown_kind", deserialize_with = "source_kind")]
    pub source_kind: SourceKind,

    #[serde(default)]
    pub database_detail: Option<InsightDetail>,

    #[serde(default)]
    pub api_detail: Option<InsightDetail>,

    #[serde(default, deserialize_with = "dependencies")]
    pub dependencies: Vec<String>,
}

/// Detail fields as the oracle sends them; every one may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InsightDetail {
    pub engine: Option<String>,
    pub model: Option<String>,
    pub operation: Option<String>,
    pub protocol: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
}

fn unknown_kind() -> SourceKind {
    SourceKind::Unknown
}

/// Kind names are matched case-insensitively; anything else rejects the insight.
fn source_kind<'de, D>(deserializer: D) -> std::result::Result<SourceKind, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(SourceKind::Unknown);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "database" => Ok(SourceKind::Database),
        "api" => Ok(SourceKind::Api),
        "computed" => Ok(SourceKind::Computed),
        "unknown" | "" => Ok(SourceKind::Unknown),
        other => Err(de::Error::unknown_variant(
            other,
            &["database", "api", "computed", "unknown"],
        )),
    }
}

fn dependencies<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResolverInsight {
    /// Classification carried by this insight. Missing detail fields that the
    /// data contract requires become `"unknown"`.
    pub fn classification(&self) -> Classification {
        match self.source_kind {
            SourceKind::Database => {
                let detail = self.database_detail.clone().unwrap_or_default();
                Classification::Database {
                    detail: DatabaseDetail {
                        engine: detail.engine.unwrap_or_else(|| UNKNOWN_DETAIL.to_string()),
                        model: detail.model,
                        operation: detail.operation,
                    },
                }
            }
            SourceKind::Api => {
                let detail = self.api_detail.clone().unwrap_or_default();
                Classification::Api {
                    detail: ApiDetail {
                        protocol: detail.protocol.unwrap_or_else(|| UNKNOWN_DETAIL.to_string()),
                        endpoint: detail.endpoint,
                        method: detail.method,
                    },
                }
            }
            SourceKind::Computed => Classification::Computed,
            SourceKind::Unknown => Classification::Unknown,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    #[serde(default)]
    connections: Vec<serde_json::Value>,

    #[serde(default)]
    resolver_insights: serde_json::Value,

    #[serde(default)]
    architecture_patterns: Vec<serde_json::Value>,
}

/// Insights arrive either as a list with `path` on each entry or as an object
/// keyed by path. Entries that do not read as an insight are dropped one by
/// one; a value of any other shape is an error.
fn collect_insights(value: serde_json::Value) -> Result<Vec<ResolverInsight>> {
    let entries: Vec<(Option<String>, serde_json::Value)> = match value {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::Array(list) => list.into_iter().map(|entry| (None, entry)).collect(),
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(path, entry)| (Some(path), entry))
            .collect(),
        other => {
            return Err(EnrichmentError::parse(format!(
                "resolverInsights must be a list or an object, got {other}"
            )))
        }
    };

    let mut insights = Vec::with_capacity(entries.len());
    for (key, entry) in entries {
        match serde_json::from_value::<ResolverInsight>(entry) {
            Ok(mut insight) => {
                if insight.path.is_empty() {
                    insight.path = key.unwrap_or_default();
                }
                insights.push(insight);
            }
            Err(e) => log::debug!(
                "Dropping unusable insight{}: {e}",
                key.map(|k| format!(" for {k}")).unwrap_or_default()
            ),
        }
    }
    Ok(insights)
}

impl EnrichmentPayload {
    /// Parse the first balanced JSON object found in `response`.
    pub fn parse(response: &str) -> Result<Self> {
        let block = first_json_block(response)
            .ok_or_else(|| EnrichmentError::parse("no JSON object in response"))?;
        let raw: RawPayload =
            serde_json::from_str(block).map_err(|e| EnrichmentError::parse(e.to_string()))?;

        let mut connections = Vec::with_capacity(raw.connections.len());
        for value in raw.connections {
            match serde_json::from_value::<Connection>(value) {
                Ok(connection) => connections.push(connection),
                Err(e) => log::debug!("Dropping unusable connection: {e}"),
            }
        }

        Ok(Self {
            connections,
            resolver_insights: collect_insights(raw.resolver_insights)?
                .into_iter()
                .filter(|insight| !insight.path.is_empty())
                .collect(),
            architecture_patterns: raw.architecture_patterns,
        })
    }
}

/// First `{ ... }` block whose braces balance, skipping braces inside strings.
pub fn first_json_block(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, &byte) in bytes.iter().enumerate().skip(start) {
            if in_string {
                match byte {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match byte {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..=i]);
                    }
                }
                _ => {}
            }
        }

        // Unbalanced from this brace on; a later one cannot balance either.
        if depth > 0 {
            return None;
        }
        search_from = start + 1;
    }

    None
}
