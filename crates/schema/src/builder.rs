use crate::error::{Result, SchemaError};
use crate::model::{DeclKind, FieldDecl, TypeDecl, TypeRef};
use crate::sdl::strip_schema_extensions;
use gqlmap_protocol::{
    is_builtin_scalar, is_introspection_name, SchemaField, SchemaNode, SchemaNodeKind,
};
use graphql_parser::schema::{
    parse_schema, Definition, Document, Field, InputValue, TypeDefinition, TypeExtension,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Names a subgraph schema may reference without declaring them.
const FEDERATION_TYPES: &[&str] = &[
    "_Any",
    "_Entity",
    "_Service",
    "_FieldSet",
    "FieldSet",
    "link__Import",
    "federation__FieldSet",
];

/// Where SDL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    Inline(String),
    Path(PathBuf),
}

impl SchemaSource {
    /// Treat `raw` as a path when it names an existing file or looks like an
    /// SDL file name, otherwise as inline SDL.
    pub fn detect(raw: &str) -> Self {
        let trimmed = raw.trim();
        let path = Path::new(trimmed);
        let looks_like_file = !trimmed.contains(char::is_whitespace)
            && !trimmed.contains('{')
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "graphql" | "graphqls" | "gql"));

        if looks_like_file || (!trimmed.contains('{') && path.is_file()) {
            SchemaSource::Path(path.to_path_buf())
        } else {
            SchemaSource::Inline(raw.to_string())
        }
    }
}

#[derive(Debug, Clone)]
struct LoadedSchema {
    types: Vec<TypeDecl>,
    query_root: String,
    mutation_root: String,
}

/// Schema model builder.
///
/// Holds at most one loaded schema. Every query fails with
/// [`SchemaError::NotLoaded`] until a load succeeds; a failed load leaves the
/// previous schema (if any) in place.
#[derive(Debug, Default)]
pub struct SchemaAnalyzer {
    loaded: Option<LoadedSchema>,
}

impl SchemaAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sdl(sdl: &str) -> Result<Self> {
        let mut analyzer = Self::new();
        analyzer.load_str(sdl)?;
        Ok(analyzer)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn load(&mut self, source: &SchemaSource) -> Result<()> {
        match source {
            SchemaSource::Inline(sdl) => self.load_str(sdl),
            SchemaSource::Path(path) => self.load_path(path),
        }
    }

    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let sdl = std::fs::read_to_string(path).map_err(|source| SchemaError::FileAccessError {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loading schema from {}", path.display());
        self.load_str(&sdl)
    }

    pub fn load_str(&mut self, sdl: &str) -> Result<()> {
        let prepared = strip_schema_extensions(sdl);
        let document = parse_schema::<String>(&prepared)
            .map_err(|e| SchemaError::parse(e.to_string()))?;
        let loaded = collect(&document)?;

        log::info!("Loaded schema: {} types", loaded.types.len());
        self.loaded = Some(loaded);
        Ok(())
    }

    /// Ordered schema nodes, introspection types and scalars excluded.
    pub fn nodes(&self) -> Result<Vec<SchemaNode>> {
        let schema = self.schema()?;
        Ok(schema
            .types
            .iter()
            .filter(|decl| !is_introspection_name(&decl.name))
            .filter_map(|decl| schema.to_node(decl))
            .collect())
    }

    pub fn node(&self, name: &str) -> Result<Option<SchemaNode>> {
        let schema = self.schema()?;
        if is_introspection_name(name) {
            return Ok(None);
        }
        Ok(schema
            .types
            .iter()
            .find(|decl| decl.name == name)
            .and_then(|decl| schema.to_node(decl)))
    }

    /// Type name → distinct non-builtin type names used by its fields.
    ///
    /// Every declared type gets an entry; unions, enums and scalars have no
    /// fields and map to an empty list.
    pub fn type_dependencies(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let schema = self.schema()?;
        let mut map = BTreeMap::new();

        for decl in &schema.types {
            if is_introspection_name(&decl.name) {
                continue;
            }

            let mut deps: Vec<String> = Vec::new();
            for field in &decl.fields {
                let name = field.ty.named();
                if !is_builtin_scalar(name) && !deps.iter().any(|d| d == name) {
                    deps.push(name.to_string());
                }
            }
            map.insert(decl.name.clone(), deps);
        }

        Ok(map)
    }

    fn schema(&self) -> Result<&LoadedSchema> {
        self.loaded.as_ref().ok_or(SchemaError::NotLoaded)
    }
}

impl LoadedSchema {
    fn node_kind(&self, decl: &TypeDecl) -> Option<SchemaNodeKind> {
        match decl.kind {
            DeclKind::Object if decl.name == self.query_root => Some(SchemaNodeKind::Query),
            DeclKind::Object if decl.name == self.mutation_root => Some(SchemaNodeKind::Mutation),
            DeclKind::Object => Some(SchemaNodeKind::ObjectType),
            DeclKind::Interface => Some(SchemaNodeKind::Interface),
            DeclKind::Union => Some(SchemaNodeKind::Union),
            DeclKind::Enum => Some(SchemaNodeKind::Enum),
            DeclKind::InputObject => Some(SchemaNodeKind::InputType),
            DeclKind::Scalar => None,
        }
    }

    fn to_node(&self, decl: &TypeDecl) -> Option<SchemaNode> {
        let kind = self.node_kind(decl)?;
        let fields = if kind.has_fields() {
            decl.fields
                .iter()
                .filter(|field| !is_introspection_name(&field.name))
                .map(|field| {
                    let unwrapped = field.ty.unwrap();
                    SchemaField {
                        name: field.name.clone(),
                        declared_type: unwrapped.name,
                        is_non_null: unwrapped.is_non_null,
                        is_list: unwrapped.is_list,
                        description: field.description.clone(),
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Some(SchemaNode {
            kind,
            name: decl.name.clone(),
            fields,
            description: decl.description.clone(),
        })
    }
}

/// Merges definitions and extensions into one declaration per type name.
#[derive(Default)]
struct Collector {
    types: Vec<TypeDecl>,
    index: HashMap<String, usize>,
}

impl Collector {
    fn entry(&mut self, kind: DeclKind, name: &str, definition: bool) -> Result<&mut TypeDecl> {
        let idx = match self.index.get(name) {
            Some(&idx) => {
                let existing = &self.types[idx];
                if existing.kind != kind {
                    return Err(SchemaError::parse(format!(
                        "Type \"{name}\" is declared both as {} and as {}",
                        existing.kind.as_str(),
                        kind.as_str()
                    )));
                }
                if definition && existing.defined {
                    return Err(SchemaError::parse(format!(
                        "There can be only one type named \"{name}\""
                    )));
                }
                idx
            }
            None => {
                self.types.push(TypeDecl::new(kind, name));
                let idx = self.types.len() - 1;
                self.index.insert(name.to_string(), idx);
                idx
            }
        };

        let decl = &mut self.types[idx];
        if definition {
            decl.defined = true;
        }
        Ok(decl)
    }

    fn define(&mut self, def: &TypeDefinition<'_, String>) -> Result<()> {
        match def {
            TypeDefinition::Scalar(t) => {
                let decl = self.entry(DeclKind::Scalar, &t.name, true)?;
                decl.description = t.description.clone();
            }
            TypeDefinition::Object(t) => {
                let decl = self.entry(DeclKind::Object, &t.name, true)?;
                decl.description = t.description.clone();
                push_fields(decl, t.fields.iter().map(output_field));
            }
            TypeDefinition::Interface(t) => {
                let decl = self.entry(DeclKind::Interface, &t.name, true)?;
                decl.description = t.description.clone();
                push_fields(decl, t.fields.iter().map(output_field));
            }
            TypeDefinition::Union(t) => {
                let decl = self.entry(DeclKind::Union, &t.name, true)?;
                decl.description = t.description.clone();
                decl.members.extend(t.types.iter().cloned());
            }
            TypeDefinition::Enum(t) => {
                let decl = self.entry(DeclKind::Enum, &t.name, true)?;
                decl.description = t.description.clone();
            }
            TypeDefinition::InputObject(t) => {
                let decl = self.entry(DeclKind::InputObject, &t.name, true)?;
                decl.description = t.description.clone();
                push_fields(decl, t.fields.iter().map(input_field));
            }
        }
        Ok(())
    }

    fn extend(&mut self, ext: &TypeExtension<'_, String>) -> Result<()> {
        match ext {
            TypeExtension::Scalar(t) => {
                self.entry(DeclKind::Scalar, &t.name, false)?;
            }
            TypeExtension::Object(t) => {
                let decl = self.entry(DeclKind::Object, &t.name, false)?;
                push_fields(decl, t.fields.iter().map(output_field));
            }
            TypeExtension::Interface(t) => {
                let decl = self.entry(DeclKind::Interface, &t.name, false)?;
                push_fields(decl, t.fields.iter().map(output_field));
            }
            TypeExtension::Union(t) => {
                let decl = self.entry(DeclKind::Union, &t.name, false)?;
                decl.members.extend(t.types.iter().cloned());
            }
            TypeExtension::Enum(t) => {
                self.entry(DeclKind::Enum, &t.name, false)?;
            }
            TypeExtension::InputObject(t) => {
                let decl = self.entry(DeclKind::InputObject, &t.name, false)?;
                push_fields(decl, t.fields.iter().map(input_field));
            }
        }
        Ok(())
    }
}

fn output_field(field: &Field<'_, String>) -> FieldDecl {
    FieldDecl {
        name: field.name.clone(),
        ty: TypeRef::from(&field.field_type),
        description: field.description.clone(),
    }
}

fn input_field(value: &InputValue<'_, String>) -> FieldDecl {
    FieldDecl {
        name: value.name.clone(),
        ty: TypeRef::from(&value.value_type),
        description: value.description.clone(),
    }
}

fn push_fields(decl: &mut TypeDecl, fields: impl Iterator<Item = FieldDecl>) {
    for field in fields {
        if decl.fields.iter().any(|f| f.name == field.name) {
            log::debug!("Ignoring repeated field {}.{}", decl.name, field.name);
            continue;
        }
        decl.fields.push(field);
    }
}

fn collect(document: &Document<'_, String>) -> Result<LoadedSchema> {
    let mut collector = Collector::default();
    let mut query_root = "Query".to_string();
    let mut mutation_root = "Mutation".to_string();

    for definition in &document.definitions {
        match definition {
            Definition::SchemaDefinition(schema) => {
                if let Some(query) = &schema.query {
                    query_root = query.clone();
                }
                if let Some(mutation) = &schema.mutation {
                    mutation_root = mutation.clone();
                }
            }
            Definition::TypeDefinition(def) => collector.define(def)?,
            Definition::TypeExtension(ext) => collector.extend(ext)?,
            Definition::DirectiveDefinition(_) => {}
        }
    }

    validate(&collector.types)?;

    Ok(LoadedSchema {
        types: collector.types,
        query_root,
        mutation_root,
    })
}

/// Every referenced type must be declared (or be a builtin/federation name).
fn validate(types: &[TypeDecl]) -> Result<()> {
    let known: HashSet<&str> = types
        .iter()
        .map(|decl| decl.name.as_str())
        .chain(FEDERATION_TYPES.iter().copied())
        .collect();
    let is_known = |name: &str| is_builtin_scalar(name) || known.contains(name);

    for decl in types {
        for field in &decl.fields {
            let name = field.ty.named();
            if !is_known(name) {
                return Err(SchemaError::parse(format!(
                    "Unknown type \"{name}\" referenced by {}.{}",
                    decl.name, field.name
                )));
            }
        }

        for member in &decl.members {
            match types.iter().find(|t| &t.name == member) {
                Some(t) if t.kind == DeclKind::Object => {}
                Some(_) => {
                    return Err(SchemaError::parse(format!(
                        "Union \"{}\" can only include object types, found \"{member}\"",
                        decl.name
                    )));
                }
                None if FEDERATION_TYPES.contains(&member.as_str()) => {}
                None => {
                    return Err(SchemaError::parse(format!(
                        "Unknown type \"{member}\" in union \"{}\"",
                        decl.name
                    )));
                }
            }
        }
    }

    if !types.iter().any(|decl| decl.kind == DeclKind::Object) {
        return Err(SchemaError::parse("Schema declares no object types"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_fail_before_load() {
        let analyzer = SchemaAnalyzer::new();
        assert!(matches!(analyzer.nodes(), Err(SchemaError::NotLoaded)));
        assert!(matches!(analyzer.node("Query"), Err(SchemaError::NotLoaded)));
        assert!(matches!(
            analyzer.type_dependencies(),
            Err(SchemaError::NotLoaded)
        ));
    }

    #[test]
    fn detect_source_kind() {
        assert_eq!(
            SchemaSource::detect("schema.graphql"),
            SchemaSource::Path(PathBuf::from("schema.graphql"))
        );
        assert!(matches!(
            SchemaSource::detect("type Query { a: Int }"),
            SchemaSource::Inline(_)
        ));
    }

    #[test]
    fn custom_root_names_map_to_query_and_mutation() {
        let analyzer = SchemaAnalyzer::from_sdl(
            "schema { query: Root mutation: Writes }\n\
             type Root { a: Int }\n\
             type Writes { b: Int }",
        )
        .unwrap();
        let nodes = analyzer.nodes().unwrap();
        assert_eq!(nodes[0].kind, SchemaNodeKind::Query);
        assert_eq!(nodes[1].kind, SchemaNodeKind::Mutation);
    }

    #[test]
    fn failed_reload_keeps_previous_schema() {
        let mut analyzer = SchemaAnalyzer::from_sdl("type Query { a: Int }").unwrap();
        assert!(analyzer.load_str("type Query {").is_err());
        assert_eq!(analyzer.nodes().unwrap().len(), 1);
    }
}
