//! Resolver candidate detection over JavaScript/TypeScript syntax trees.
//!
//! Two shapes are recognized:
//!
//! * **Resolver maps**: object literals whose entries are functions. The map's
//!   name comes from the enclosing property key (`Query: { ... }`) or from the
//!   variable it is bound to (`const userResolvers = { ... }`). A property value
//!   always counts as a map; a variable only when its name contains
//!   `resolver`. This asymmetry lets plain option objects passed as property
//!   values through (false positives) and misses maps bound to variables with
//!   other names (false negatives).
//! * **Standalone resolvers**: functions bound to a variable, or declared,
//!   under a name containing `resolver`.

use crate::error::{ClassifierError, Result};
use crate::language::Language;
use crate::types::Candidate;
use tree_sitter::{Node, Parser};

const FUNCTION_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// Expression wrappers that do not change what the wrapped value is.
const TRANSPARENT_KINDS: &[&str] = &[
    "parenthesized_expression",
    "as_expression",
    "satisfies_expression",
    "non_null_expression",
];

const RESOLVER_MARKER: &str = "resolver";

/// Locates resolver implementations in one language's sources
pub struct CandidateDetector {
    parser: Parser,
    language: Language,
}

impl CandidateDetector {
    pub fn new(language: Language) -> Result<Self> {
        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ClassifierError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser, language })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Candidates in document order.
    pub fn detect(&mut self, content: &str) -> Result<Vec<Candidate>> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| ClassifierError::parse("Failed to parse source code"))?;

        let root = tree.root_node();
        if root.has_error() {
            log::debug!(
                "{} source contains syntax errors; detecting on the recovered tree",
                self.language.as_str()
            );
        }

        let mut candidates = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "object" => collect_map_entries(content, node, &mut candidates),
                "variable_declarator" => collect_bound_function(content, node, &mut candidates),
                "function_declaration" => {
                    collect_declared_function(content, node, &mut candidates)
                }
                _ => {}
            }

            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        Ok(candidates)
    }
}

fn collect_map_entries(content: &str, object: Node, out: &mut Vec<Candidate>) {
    let Some(map_name) = resolver_map_name(content, object) else {
        return;
    };

    let mut cursor = object.walk();
    for entry in object.named_children(&mut cursor) {
        let (key, implementation) = match entry.kind() {
            "pair" => {
                let Some(key) = entry.child_by_field_name("key") else {
                    continue;
                };
                let Some(value) = entry.child_by_field_name("value").map(unwrap_transparent)
                else {
                    continue;
                };
                if !is_function(value) {
                    continue;
                }
                (key, value)
            }
            "method_definition" => {
                let Some(name) = entry.child_by_field_name("name") else {
                    continue;
                };
                (name, entry)
            }
            _ => continue,
        };

        if key.kind() != "property_identifier" {
            continue;
        }

        out.push(Candidate {
            path: format!("{map_name}.{}", text(content, key)),
            source: text(content, implementation).to_string(),
            line: implementation.start_position().row + 1,
        });
    }
}

/// Name of the map an object literal represents, if it represents one.
fn resolver_map_name(content: &str, object: Node) -> Option<String> {
    let (slot, parent) = climb_transparent(object)?;

    match parent.kind() {
        "pair" if parent.child_by_field_name("value") == Some(slot) => {
            property_key_name(content, parent.child_by_field_name("key")?)
        }
        "variable_declarator" if parent.child_by_field_name("value") == Some(slot) => {
            let name = parent.child_by_field_name("name")?;
            if name.kind() != "identifier" {
                return None;
            }
            let name = text(content, name);
            mentions_resolver(name).then(|| name.to_string())
        }
        _ => None,
    }
}

fn collect_bound_function(content: &str, declarator: Node, out: &mut Vec<Candidate>) {
    let Some(name) = declarator.child_by_field_name("name") else {
        return;
    };
    let Some(value) = declarator.child_by_field_name("value").map(unwrap_transparent) else {
        return;
    };
    if name.kind() != "identifier" || !is_function(value) {
        return;
    }

    let name = text(content, name);
    if mentions_resolver(name) {
        out.push(Candidate {
            path: name.to_string(),
            source: text(content, value).to_string(),
            line: value.start_position().row + 1,
        });
    }
}

fn collect_declared_function(content: &str, declaration: Node, out: &mut Vec<Candidate>) {
    let Some(name) = declaration.child_by_field_name("name") else {
        return;
    };
    let name = text(content, name);
    if mentions_resolver(name) {
        out.push(Candidate {
            path: name.to_string(),
            source: text(content, declaration).to_string(),
            line: declaration.start_position().row + 1,
        });
    }
}

fn property_key_name(content: &str, key: Node) -> Option<String> {
    match key.kind() {
        "property_identifier" => Some(text(content, key).to_string()),
        "string" => {
            let raw = text(content, key);
            let unquoted = raw
                .strip_prefix(['"', '\''])
                .and_then(|s| s.strip_suffix(['"', '\'']))
                .unwrap_or(raw);
            (!unquoted.is_empty()).then(|| unquoted.to_string())
        }
        _ => None,
    }
}

/// First non-wrapper ancestor of `node`, paired with the child it holds.
fn climb_transparent(node: Node) -> Option<(Node, Node)> {
    let mut slot = node;
    let mut parent = node.parent()?;
    while TRANSPARENT_KINDS.contains(&parent.kind()) {
        slot = parent;
        parent = parent.parent()?;
    }
    Some((slot, parent))
}

fn unwrap_transparent(mut node: Node) -> Node {
    while TRANSPARENT_KINDS.contains(&node.kind()) {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn is_function(node: Node) -> bool {
    FUNCTION_KINDS.contains(&node.kind())
}

fn mentions_resolver(name: &str) -> bool {
    name.to_lowercase().contains(RESOLVER_MARKER)
}

fn text<'a>(content: &'a str, node: Node) -> &'a str {
    &content[node.byte_range()]
}
