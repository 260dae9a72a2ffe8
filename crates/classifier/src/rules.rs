//! Ordered classification rules.
//!
//! Each rule is a predicate plus an extractor. [`classify`] walks [`RULES`] top
//! to bottom and the first rule whose predicate matches produces the
//! classification; later rules never see that text. Database rules precede API
//! rules, which precede the computed fallback.

use gqlmap_protocol::{ApiDetail, Classification, DatabaseDetail, SourceKind};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

pub const OP_FIND_MANY: &str = "findMany";
pub const OP_FIND_UNIQUE: &str = "findUnique";
pub const OP_CREATE: &str = "create";
pub const OP_UPDATE: &str = "update";
pub const OP_DELETE: &str = "delete";
pub const OP_OTHER: &str = "other";

pub const PROTOCOL_REST: &str = "REST";
pub const PROTOCOL_GRAPHQL: &str = "GraphQL";

/// One predicate/extractor pair.
pub struct Rule {
    pub name: &'static str,
    pub kind: SourceKind,
    pub matches: fn(&str) -> bool,
    pub extract: fn(&str) -> Classification,
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "orm-client",
        kind: SourceKind::Database,
        matches: orm_client_matches,
        extract: orm_client_detail,
    },
    Rule {
        name: "document-store",
        kind: SourceKind::Database,
        matches: document_store_matches,
        extract: document_store_detail,
    },
    Rule {
        name: "repository",
        kind: SourceKind::Database,
        matches: repository_matches,
        extract: repository_detail,
    },
    Rule {
        name: "raw-sql",
        kind: SourceKind::Database,
        matches: raw_sql_matches,
        extract: raw_sql_detail,
    },
    Rule {
        name: "http-client",
        kind: SourceKind::Api,
        matches: http_client_matches,
        extract: http_client_detail,
    },
    Rule {
        name: "graphql-client",
        kind: SourceKind::Api,
        matches: graphql_client_matches,
        extract: graphql_client_detail,
    },
    Rule {
        name: "computed",
        kind: SourceKind::Computed,
        matches: computed_matches,
        extract: |_| Classification::Computed,
    },
];

/// Classify resolver source text; `Unknown` when no rule matches.
pub fn classify(text: &str) -> Classification {
    matching_rule(text)
        .map(|rule| (rule.extract)(text))
        .unwrap_or_default()
}

/// First rule whose predicate accepts `text`.
pub fn matching_rule(text: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.matches)(text))
}

pub fn rule(name: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.name == name)
}

/// Paths referenced as `<Type>.resolvers.<field>`.
pub fn extract_dependencies(text: &str) -> BTreeSet<String> {
    patterns::DEPENDENCY
        .captures_iter(text)
        .map(|caps| format!("{}.{}", &caps[1], &caps[2]))
        .collect()
}

mod patterns {
    use super::*;

    pub static ORM_CLIENT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\bprisma\s*\.\s*[\w$]").expect("Invalid ORM client regex"));

    /// `prisma.<model>.<operation>(`
    pub static ORM_CALL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\bprisma\s*\.\s*(\w+)\s*\.\s*(\w+)\s*\(").expect("Invalid ORM call regex")
    });

    /// `<receiver>.find|findById|findOne|create(`
    pub static DOCUMENT_CALL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"([A-Za-z_$][\w$]*)\s*\.\s*(findById|findOne|find|create)\s*\(")
            .expect("Invalid document store regex")
    });

    /// `getRepository(Model).<method>(`
    pub static GET_REPOSITORY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"getRepository\s*\(\s*([A-Za-z_$][\w$]*)\s*\)(?:\s*\.\s*(\w+)\s*\()?")
            .expect("Invalid getRepository regex")
    });

    /// `<name>Repository.<method>(` / `<name>Repo.<method>(`
    pub static REPOSITORY_CALL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\b([A-Za-z_$][\w$]*?)(?:Repository|Repo)\s*\.\s*(\w+)\s*\(")
            .expect("Invalid repository regex")
    });

    pub static SQL_KEYWORD: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(SELECT|INSERT|UPDATE|DELETE|FROM)\b").expect("Invalid SQL keyword regex")
    });

    pub static SQL_VERB: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(SELECT|INSERT|UPDATE|DELETE)\b").expect("Invalid SQL verb regex")
    });

    pub static SQL_TABLE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?i)\b(?:FROM|INTO|UPDATE)\s+["'`]?([A-Za-z_][\w.]*)"#)
            .expect("Invalid SQL table regex")
    });

    pub static FETCH_CALL: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\bfetch\s*\(").expect("Invalid fetch regex"));

    pub static HTTP_METHOD_CALL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\.\s*(get|post|put|delete|patch)\s*\(").expect("Invalid HTTP method regex")
    });

    /// Method call with its string-literal first argument, when there is one.
    pub static HTTP_METHOD_ENDPOINT: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"\.\s*(get|post|put|delete|patch)\s*\(\s*(?:['"`]([^'"`]*)['"`])?"#)
            .expect("Invalid HTTP endpoint regex")
    });

    pub static REQUEST_CALL: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\brequest\s*\(").expect("Invalid request regex"));

    pub static GRAPHQL_MARKER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\bgql\s*`|\bgraphql\s*`|\bGraphQLClient\b|\bapolloClient\b|\.\s*(?:query|mutate)\s*\(\s*\{")
            .expect("Invalid GraphQL client regex")
    });

    pub static GRAPHQL_ENDPOINT: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"GraphQLClient\s*\(\s*['"`]([^'"`]+)['"`]"#)
            .expect("Invalid GraphQL endpoint regex")
    });

    /// Expression after `return`, up to the end of the statement.
    pub static RETURN_EXPR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\breturn\b([^;}]*)").expect("Invalid return regex"));

    /// Concise arrow body: `=> expr` without a block.
    pub static ARROW_EXPR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"=>\s*([^{\s][^;]*)").expect("Invalid arrow body regex"));

    pub static OPERATOR_OR_MEMBER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[-+*/%<>!?&|]|==|\$\{|\.\s*[A-Za-z_$]|\[").expect("Invalid operator regex")
    });

    pub static DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"([A-Za-z_$][\w$]*)\s*\.\s*resolvers\s*\.\s*([A-Za-z_$][\w$]*)")
            .expect("Invalid dependency regex")
    });
}

fn database(engine: &str, model: Option<String>, operation: Option<&str>) -> Classification {
    Classification::Database {
        detail: DatabaseDetail {
            engine: engine.to_string(),
            model,
            operation: operation.map(str::to_string),
        },
    }
}

fn api(protocol: &str, endpoint: Option<String>, method: Option<String>) -> Classification {
    Classification::Api {
        detail: ApiDetail {
            protocol: protocol.to_string(),
            endpoint,
            method,
        },
    }
}

fn orm_client_matches(text: &str) -> bool {
    patterns::ORM_CLIENT.is_match(text)
}

fn orm_client_detail(text: &str) -> Classification {
    match patterns::ORM_CALL.captures(text) {
        Some(caps) => database(
            "prisma",
            Some(caps[1].to_string()),
            Some(orm_operation(&caps[2])),
        ),
        None => database("prisma", None, None),
    }
}

fn orm_operation(method: &str) -> &'static str {
    match method {
        "findMany" => OP_FIND_MANY,
        "findUnique" | "findUniqueOrThrow" | "findFirst" | "findFirstOrThrow" => OP_FIND_UNIQUE,
        "create" | "createMany" => OP_CREATE,
        "update" | "updateMany" => OP_UPDATE,
        "delete" | "deleteMany" => OP_DELETE,
        _ => OP_OTHER,
    }
}

fn document_store_matches(text: &str) -> bool {
    patterns::DOCUMENT_CALL.is_match(text)
}

fn document_store_detail(text: &str) -> Classification {
    let Some(caps) = patterns::DOCUMENT_CALL.captures(text) else {
        return database("mongodb", None, None);
    };
    let operation = match &caps[2] {
        "find" => OP_FIND_MANY,
        "findById" | "findOne" => OP_FIND_UNIQUE,
        _ => OP_CREATE,
    };
    database("mongodb", Some(caps[1].to_string()), Some(operation))
}

fn repository_matches(text: &str) -> bool {
    patterns::GET_REPOSITORY.is_match(text) || patterns::REPOSITORY_CALL.is_match(text)
}

fn repository_detail(text: &str) -> Classification {
    let from_getter = |caps: Captures<'_>| {
        (
            caps[1].to_string(),
            caps.get(2).map(|m| repository_operation(m.as_str())),
        )
    };
    let from_call = |caps: Captures<'_>| {
        (
            caps[1].to_string(),
            Some(repository_operation(&caps[2])),
        )
    };

    let found = patterns::GET_REPOSITORY
        .captures(text)
        .map(from_getter)
        .or_else(|| patterns::REPOSITORY_CALL.captures(text).map(from_call));

    match found {
        Some((model, operation)) if !model.is_empty() => database("typeorm", Some(model), operation),
        Some((_, operation)) => database("typeorm", None, operation),
        None => database("typeorm", None, None),
    }
}

fn repository_operation(method: &str) -> &'static str {
    match method {
        "find" | "findBy" | "findAndCount" => OP_FIND_MANY,
        "findOne" | "findOneBy" | "findOneOrFail" | "findOneByOrFail" => OP_FIND_UNIQUE,
        "save" | "insert" | "create" => OP_CREATE,
        "update" => OP_UPDATE,
        "delete" | "remove" | "softDelete" => OP_DELETE,
        _ => OP_OTHER,
    }
}

fn raw_sql_matches(text: &str) -> bool {
    patterns::SQL_KEYWORD.is_match(text)
}

fn raw_sql_detail(text: &str) -> Classification {
    let model = patterns::SQL_TABLE
        .captures(text)
        .map(|caps| caps[1].to_string());
    let operation = patterns::SQL_VERB
        .captures(text)
        .map(|caps| match caps[1].to_ascii_uppercase().as_str() {
            "SELECT" => OP_FIND_MANY,
            "INSERT" => OP_CREATE,
            "UPDATE" => OP_UPDATE,
            _ => OP_DELETE,
        });
    database("sql", model, operation)
}

fn http_client_matches(text: &str) -> bool {
    patterns::FETCH_CALL.is_match(text)
        || patterns::HTTP_METHOD_CALL.is_match(text)
        || patterns::REQUEST_CALL.is_match(text)
}

fn http_client_detail(text: &str) -> Classification {
    // Method and endpoint come from the same call: the first one with a
    // literal URL, else the first method call at all.
    let calls: Vec<_> = patterns::HTTP_METHOD_ENDPOINT.captures_iter(text).collect();
    let call = calls
        .iter()
        .find(|caps| caps.get(2).is_some_and(|url| !url.as_str().is_empty()))
        .or_else(|| calls.first());

    let method = call.map(|caps| caps[1].to_ascii_uppercase());
    let endpoint = call
        .and_then(|caps| caps.get(2))
        .map(|url| url.as_str().to_string())
        .filter(|endpoint| !endpoint.is_empty());
    api(PROTOCOL_REST, endpoint, method)
}

fn graphql_client_matches(text: &str) -> bool {
    patterns::GRAPHQL_MARKER.is_match(text)
}

fn graphql_client_detail(text: &str) -> Classification {
    let endpoint = patterns::GRAPHQL_ENDPOINT
        .captures(text)
        .map(|caps| caps[1].to_string());
    api(PROTOCOL_GRAPHQL, endpoint, None)
}

fn computed_matches(text: &str) -> bool {
    let returns = patterns::RETURN_EXPR
        .captures_iter(text)
        .chain(patterns::ARROW_EXPR.captures_iter(text));
    for caps in returns {
        if patterns::OPERATOR_OR_MEMBER.is_match(&caps[1]) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn db(text: &str) -> DatabaseDetail {
        match classify(text) {
            Classification::Database { detail } => detail,
            other => panic!("expected database for {text:?}, got {other:?}"),
        }
    }

    fn http(text: &str) -> ApiDetail {
        match classify(text) {
            Classification::Api { detail } => detail,
            other => panic!("expected api for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn rules_are_ordered_database_api_computed() {
        let kinds: Vec<SourceKind> = RULES.iter().map(|r| r.kind).collect();
        let first_api = kinds.iter().position(|k| *k == SourceKind::Api).unwrap();
        let last_db = kinds.iter().rposition(|k| *k == SourceKind::Database).unwrap();
        assert!(last_db < first_api);
        assert_eq!(kinds.last(), Some(&SourceKind::Computed));
    }

    #[test]
    fn prisma_find_many() {
        let detail = db("return prisma.user.findMany()");
        assert_eq!(detail.engine, "prisma");
        assert_eq!(detail.model.as_deref(), Some("user"));
        assert_eq!(detail.operation.as_deref(), Some("findMany"));
    }

    #[test]
    fn prisma_operation_variants_normalize() {
        assert_eq!(db("ctx.prisma.post.findFirst({})").operation.as_deref(), Some("findUnique"));
        assert_eq!(db("prisma.post.updateMany({})").operation.as_deref(), Some("update"));
        assert_eq!(db("prisma.post.deleteMany()").operation.as_deref(), Some("delete"));
        assert_eq!(db("prisma.post.upsert({})").operation.as_deref(), Some("other"));
    }

    #[test]
    fn prisma_without_model_call_still_database() {
        let detail = db("await prisma.$transaction(ops)");
        assert_eq!(detail.engine, "prisma");
        assert_eq!(detail.model, None);
    }

    #[test]
    fn document_store_calls() {
        let detail = db("async (_, { id }) => User.findById(id)");
        assert_eq!(detail.engine, "mongodb");
        assert_eq!(detail.model.as_deref(), Some("User"));
        assert_eq!(detail.operation.as_deref(), Some("findUnique"));

        assert_eq!(db("Post.find({ author: id })").operation.as_deref(), Some("findMany"));
    }

    #[test]
    fn repository_pattern_calls() {
        let detail = db("getRepository(Order).save(input)");
        assert_eq!(detail.engine, "typeorm");
        assert_eq!(detail.model.as_deref(), Some("Order"));
        assert_eq!(detail.operation.as_deref(), Some("create"));

        let detail = db("this.invoiceRepository.remove(entity)");
        assert_eq!(detail.model.as_deref(), Some("invoice"));
        assert_eq!(detail.operation.as_deref(), Some("delete"));
    }

    #[test]
    fn raw_sql_keywords_case_insensitive() {
        let detail = db("return db.query('select * from orders where id = $1', [id])");
        assert_eq!(detail.engine, "sql");
        assert_eq!(detail.model.as_deref(), Some("orders"));
        assert_eq!(detail.operation.as_deref(), Some("findMany"));
    }

    #[test]
    fn sql_beats_http_when_both_present() {
        let text = "const rows = await pool.query('SELECT id FROM users'); await fetch(url); return rows";
        assert_eq!(classify(text).source_kind(), SourceKind::Database);
        assert_eq!(matching_rule(text).unwrap().name, "raw-sql");
    }

    #[test]
    fn fetch_has_no_method_or_endpoint() {
        let detail = http("return fetch('https://x/y').then(r=>r.json())");
        assert_eq!(detail.protocol, "REST");
        assert_eq!(detail.method, None);
        assert_eq!(detail.endpoint, None);
    }

    #[test]
    fn http_method_and_literal_endpoint() {
        let detail = http("const res = await axios.get('https://api.example.com/users'); return res.data");
        assert_eq!(detail.method.as_deref(), Some("GET"));
        assert_eq!(detail.endpoint.as_deref(), Some("https://api.example.com/users"));

        let detail = http("return client.post(url, body)");
        assert_eq!(detail.method.as_deref(), Some("POST"));
        assert_eq!(detail.endpoint, None);
    }

    #[test]
    fn method_comes_from_the_call_with_the_endpoint() {
        let detail = http(
            "const cached = cache.get(key); return axios.post('https://api.x/orders', body)",
        );
        assert_eq!(detail.method.as_deref(), Some("POST"));
        assert_eq!(detail.endpoint.as_deref(), Some("https://api.x/orders"));

        let detail = http("const v = map.get(id); return api.put(target, v)");
        assert_eq!(detail.method.as_deref(), Some("GET"));
        assert_eq!(detail.endpoint, None);
    }

    #[test]
    fn graphql_client_marker() {
        let detail = http("const c = new GraphQLClient('https://gw/graphql'); return c.rawRequest(QUERY)");
        assert_eq!(detail.protocol, "GraphQL");
        assert_eq!(detail.endpoint.as_deref(), Some("https://gw/graphql"));
    }

    #[test]
    fn computed_fallback() {
        assert_eq!(
            classify("(parent) => { return parent.firstName + ' ' + parent.lastName; }"),
            Classification::Computed
        );
        assert_eq!(classify("(user) => user.email"), Classification::Computed);
    }

    #[test]
    fn plain_values_stay_unknown() {
        assert_eq!(classify("() => { return 42; }"), Classification::Unknown);
        assert_eq!(classify("(_, args, ctx) => { loader(args) }"), Classification::Unknown);
    }

    #[test]
    fn dependencies_are_qualified() {
        let deps = extract_dependencies(
            "(p, a, c, i) => User.resolvers.posts(p, a, c, i).concat(Query.resolvers.feed(p))",
        );
        let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
        assert_eq!(deps, vec!["Query.feed", "User.posts"]);
    }

    #[test]
    fn rule_lookup_by_name() {
        let rule = rule("http-client").unwrap();
        assert!((rule.matches)("fetch(url)"));
        assert!(!(rule.matches)("return 1"));
        assert!(super::rule("nope").is_none());
    }
}
