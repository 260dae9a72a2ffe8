use crate::config::ClassifierConfig;
use crate::language::Language;
use crate::types::FileFailure;
use gqlmap_protocol::path_filters::PathFilter;
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Files selected for classification plus the roots that could not be used.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

/// Expands resolver locations (files or directories) into source files
pub struct SourceScanner<'a> {
    config: &'a ClassifierConfig,
    filter: PathFilter,
}

impl<'a> SourceScanner<'a> {
    pub fn new(config: &'a ClassifierConfig) -> Self {
        Self {
            config,
            filter: config.path_filter(),
        }
    }

    /// Explicit files are taken as-is when their language is supported;
    /// directories are walked recursively (.gitignore aware).
    pub fn discover(&self, roots: &[PathBuf]) -> Discovery {
        let mut discovery = Discovery::default();

        for root in roots {
            let meta = match std::fs::metadata(root) {
                Ok(meta) => meta,
                Err(e) => {
                    log::warn!("Cannot access {}: {e}", root.display());
                    discovery.failures.push(FileFailure {
                        path: root.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if meta.is_dir() {
                self.walk(root, &mut discovery.files);
            } else if Language::from_path(root).is_supported() {
                discovery.files.push(root.clone());
            } else {
                log::warn!("Skipping {}: no resolver grammar for it", root.display());
                discovery.failures.push(FileFailure {
                    path: root.clone(),
                    reason: "unsupported language".to_string(),
                });
            }
        }

        log::info!("Found {} resolver source files", discovery.files.len());
        discovery
    }

    fn walk(&self, root: &Path, files: &mut Vec<PathBuf>) {
        let scope_root = root.to_path_buf();
        let respect_gitignore = self.config.respect_gitignore;

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(respect_gitignore)
            .git_global(respect_gitignore)
            .git_exclude(respect_gitignore)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.filter_entry(move |entry| !is_ignored_scope(entry.path(), &scope_root));

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Failed to read entry: {e}");
                    continue;
                }
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let path = entry.path();
            if !self.is_source_file(path) || is_noise_file(path) {
                continue;
            }

            if let Ok(meta) = entry.metadata() {
                if meta.len() > self.config.max_file_size_bytes {
                    log::debug!(
                        "Skipping large file {} ({} bytes > {})",
                        path.display(),
                        meta.len(),
                        self.config.max_file_size_bytes
                    );
                    continue;
                }
            }

            if self.filter.is_active() {
                let relative = path.strip_prefix(root).unwrap_or(path);
                if !self.filter.allows(&relative.to_string_lossy()) {
                    continue;
                }
            }

            files.push(path.to_path_buf());
        }
    }

    fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.accepts_extension(ext))
    }
}

fn is_ignored_scope(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| match component {
        Component::Normal(name) => {
            let lowered = name.to_string_lossy().to_lowercase();
            IGNORED_SCOPES.iter().any(|ignored| *ignored == lowered)
        }
        _ => false,
    })
}

/// Type declarations and bundles never hold resolver implementations.
fn is_noise_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_lowercase())
        .is_some_and(|name| {
            NOISE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        })
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".yarn",
    ".npm",
    // caches / builds
    ".cache",
    "node_modules",
    ".next",
    ".turbo",
    ".parcel-cache",
    ".output",
    ".nuxt",
    ".vite",
    ".vercel",
    ".svelte-kit",
    "build",
    "dist",
    "coverage",
    "storybook-static",
    // vendor
    "vendor",
    "third_party",
    "third-party",
];

const NOISE_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts", ".min.js", ".bundle.js"];

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "export const resolvers = {};").unwrap();
        path
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn walks_directories_by_extension() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(root, "src/a.ts");
        touch(root, "src/b.js");
        touch(root, "src/types.d.ts");
        touch(root, "src/notes.md");
        touch(root, "node_modules/pkg/index.js");
        touch(root, "dist/out.js");

        let config = ClassifierConfig::default();
        let discovery = SourceScanner::new(&config).discover(&[root.to_path_buf()]);

        assert_eq!(relative(root, &discovery.files), vec!["src/a.ts", "src/b.js"]);
        assert!(discovery.failures.is_empty());
    }

    #[test]
    fn gitignore_is_respected_without_a_repository() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join(".gitignore"), "generated/\n").unwrap();
        touch(root, "generated/schema.ts");
        touch(root, "src/resolvers.ts");

        let config = ClassifierConfig::default();
        let discovery = SourceScanner::new(&config).discover(&[root.to_path_buf()]);
        assert_eq!(relative(root, &discovery.files), vec!["src/resolvers.ts"]);

        let config = ClassifierConfig {
            respect_gitignore: false,
            ..Default::default()
        };
        let discovery = SourceScanner::new(&config).discover(&[root.to_path_buf()]);
        assert_eq!(discovery.files.len(), 2);
    }

    #[test]
    fn path_filter_restricts_walk() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(root, "src/graphql/user.resolver.ts");
        touch(root, "src/graphql/user.test.ts");
        touch(root, "scripts/seed.ts");

        let config = ClassifierConfig {
            include_paths: vec!["src".to_string()],
            file_pattern: Some("*.resolver.ts".to_string()),
            ..Default::default()
        };
        let discovery = SourceScanner::new(&config).discover(&[root.to_path_buf()]);
        assert_eq!(
            relative(root, &discovery.files),
            vec!["src/graphql/user.resolver.ts"]
        );
    }

    #[test]
    fn oversized_files_are_skipped() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(root, "small.js");
        fs::write(root.join("big.js"), "x".repeat(64)).unwrap();

        let config = ClassifierConfig {
            max_file_size_bytes: 40,
            ..Default::default()
        };
        let discovery = SourceScanner::new(&config).discover(&[root.to_path_buf()]);
        assert_eq!(relative(root, &discovery.files), vec!["small.js"]);
    }

    #[test]
    fn explicit_files_and_missing_roots() {
        let temp = tempdir().unwrap();
        let file = touch(temp.path(), "resolvers.mjs");
        let missing = temp.path().join("gone");
        let readme = temp.path().join("README.md");
        fs::write(&readme, "# hi").unwrap();

        let config = ClassifierConfig::default();
        let discovery =
            SourceScanner::new(&config).discover(&[file.clone(), missing.clone(), readme.clone()]);

        assert_eq!(discovery.files, vec![file]);
        let failed: Vec<&PathBuf> = discovery.failures.iter().map(|f| &f.path).collect();
        assert_eq!(failed, vec![&missing, &readme]);
    }
}
