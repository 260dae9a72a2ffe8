//! Schema-driven resolver discovery.
//!
//! When resolvers are attached to a built schema object instead of living in
//! scannable resolver maps, the schema itself lists which fields carry an
//! implementation. [`ExecutableSchema`] is the seam for that view.

use crate::error::{ClassifierError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Object types, their fields, and the resolver source attached to each field.
pub trait ExecutableSchema {
    /// Object type names, in a stable order.
    fn object_types(&self) -> Vec<&str>;

    fn fields(&self, type_name: &str) -> Vec<&str>;

    /// Source text of the resolver attached to `type_name.field`, if any.
    fn resolver_source(&self, type_name: &str, field: &str) -> Option<&str>;
}

/// Resolver bindings loaded from JSON: `{"Type": {"field": "<source>" | null}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticBindings {
    types: BTreeMap<String, BTreeMap<String, Option<String>>>,
}

impl StaticBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ClassifierError::parse(format!("Invalid resolver bindings: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ClassifierError::file_access(path, e))?;
        Self::from_json_str(&raw)
    }

    /// Attach (or replace) the resolver for `type_name.field`.
    pub fn bind(
        &mut self,
        type_name: impl Into<String>,
        field: impl Into<String>,
        source: Option<String>,
    ) {
        self.types
            .entry(type_name.into())
            .or_default()
            .insert(field.into(), source);
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ExecutableSchema for StaticBindings {
    fn object_types(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    fn fields(&self, type_name: &str) -> Vec<&str> {
        self.types
            .get(type_name)
            .map(|fields| fields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn resolver_source(&self, type_name: &str, field: &str) -> Option<&str> {
        self.types.get(type_name)?.get(field)?.as_deref()
    }
}
