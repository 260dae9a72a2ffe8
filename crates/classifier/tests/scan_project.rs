use gqlmap_classifier::{ClassifierConfig, ResolverClassifier};
use gqlmap_protocol::{Classification, SourceKind};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn classifier() -> ResolverClassifier {
    ResolverClassifier::new(ClassifierConfig::default()).expect("default config is valid")
}

const QUERY_RESOLVERS: &str = r#"
import { prisma } from '../db';

export const resolvers = {
  Query: {
    posts: () => prisma.post.findMany({ where: { published: true } }),
    post: (_, { id }) => prisma.post.findUnique({ where: { id } }),
    weather: async (_, { city }) => {
      const res = await fetch(`https://wx.example.com/${city}`);
      return res.json();
    },
  },
  Post: {
    excerpt: (post) => post.body.slice(0, 80),
    author: (post, _, ctx) => ctx.loaders.user.load(post.authorId),
  },
};
"#;

const MUTATION_RESOLVERS: &str = r#"
export const mutationResolvers = {
  createOrder: async (_, { input }) => getRepository(Order).save(input),
  refund: async (_, { id }) => {
    await db.query('UPDATE payments SET refunded = true WHERE id = $1', [id]);
    return Query.resolvers.order(null, { id });
  },
};

export function searchResolver(_, { term }) {
  return searchClient.post('/search', { term });
}
"#;

#[test]
fn classifies_a_project_tree() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(root, "src/query.ts", QUERY_RESOLVERS);
    write(root, "src/mutation.js", MUTATION_RESOLVERS);
    write(root, "node_modules/lib/index.js", "const resolvers = { Query: { x: () => fetch('/') } };");

    let report = classifier().classify_paths(&[root.to_path_buf()]);

    assert_eq!(report.files_scanned, 2);
    assert!(report.failures.is_empty());

    let summary: Vec<(&str, SourceKind)> = report
        .resolvers
        .iter()
        .map(|r| (r.path.as_str(), r.source_kind()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("mutationResolvers.createOrder", SourceKind::Database),
            ("mutationResolvers.refund", SourceKind::Database),
            ("searchResolver", SourceKind::Api),
            ("Query.posts", SourceKind::Database),
            ("Query.post", SourceKind::Database),
            ("Query.weather", SourceKind::Api),
            ("Post.excerpt", SourceKind::Computed),
            ("Post.author", SourceKind::Computed),
        ]
    );

    let refund = &report.resolvers[1];
    assert_eq!(refund.database_detail().unwrap().engine, "sql");
    assert_eq!(refund.database_detail().unwrap().model.as_deref(), Some("payments"));
    assert!(refund.dependencies.contains("Query.order"));

    let search = report.resolvers[2].api_detail().unwrap();
    assert_eq!(search.method.as_deref(), Some("POST"));
    assert_eq!(search.endpoint.as_deref(), Some("/search"));
}

#[test]
fn detail_objects_match_source_kind() {
    let temp = tempdir().unwrap();
    write(temp.path(), "query.ts", QUERY_RESOLVERS);
    write(temp.path(), "mutation.js", MUTATION_RESOLVERS);

    let report = classifier().classify_paths(&[temp.path().to_path_buf()]);
    for info in &report.resolvers {
        match &info.classification {
            Classification::Database { .. } => {
                assert!(info.database_detail().is_some() && info.api_detail().is_none())
            }
            Classification::Api { .. } => {
                assert!(info.api_detail().is_some() && info.database_detail().is_none())
            }
            Classification::Computed | Classification::Unknown => {
                assert!(info.api_detail().is_none() && info.database_detail().is_none())
            }
        }
    }
}

#[test]
fn unreadable_files_are_skipped_not_fatal() {
    let temp = tempdir().unwrap();
    let good = write(temp.path(), "ok.js", "const userResolver = (u) => u.name;");
    let bad = temp.path().join("bad.js");
    fs::write(&bad, [0xff, 0xfe, 0x00, 0x80]).unwrap();
    let missing = temp.path().join("missing.ts");

    let report = classifier().classify_paths(&[good, bad.clone(), missing.clone()]);

    assert_eq!(report.resolvers.len(), 1);
    assert_eq!(report.resolvers[0].path, "userResolver");
    assert_eq!(report.files_scanned, 1);
    let failed: Vec<&PathBuf> = report.failures.iter().map(|f| &f.path).collect();
    assert_eq!(failed, vec![&missing, &bad]);
}

#[test]
fn same_path_across_files_is_merged() {
    let temp = tempdir().unwrap();
    write(
        temp.path(),
        "a.js",
        "export const resolvers = { User: { avatar: () => {} } };",
    );
    write(
        temp.path(),
        "b.js",
        "export const resolvers = { User: { avatar: (u) => fetch(u.avatarUrl) } };",
    );

    let report = classifier().classify_paths(&[temp.path().to_path_buf()]);
    assert_eq!(report.resolvers.len(), 1);
    assert_eq!(report.resolvers[0].source_kind(), SourceKind::Api);
    assert_eq!(report.unknown_count(), 0);
}
