use crate::config::ClassifierConfig;
use crate::detector::CandidateDetector;
use crate::error::{ClassifierError, Result};
use crate::executable::ExecutableSchema;
use crate::language::Language;
use crate::rules;
use crate::scanner::SourceScanner;
use crate::types::{Candidate, FileFailure, ScanReport};
use gqlmap_protocol::{Classification, ResolverInfo};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Classifies resolver implementations by their data-access pattern
pub struct ResolverClassifier {
    config: ClassifierConfig,
}

impl ResolverClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Scan files and directories. Unreadable or unparsable files are logged,
    /// recorded in the report and skipped.
    pub fn classify_paths(&self, roots: &[PathBuf]) -> ScanReport {
        let discovery = SourceScanner::new(&self.config).discover(roots);
        let mut report = ScanReport {
            failures: discovery.failures,
            ..Default::default()
        };

        let mut detectors: HashMap<Language, CandidateDetector> = HashMap::new();
        let mut resolvers = ResolverSet::default();

        for path in discovery.files {
            match self.classify_file_with(&path, &mut detectors) {
                Ok(found) => {
                    report.files_scanned += 1;
                    log::debug!("{}: {} resolvers", path.display(), found.len());
                    for info in found {
                        resolvers.insert(info);
                    }
                }
                Err(e) => {
                    log::warn!("Skipping {}: {e}", path.display());
                    report.failures.push(FileFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.resolvers = resolvers.into_vec();
        log::info!(
            "Classified {} resolvers from {} files ({} unknown, {} failed)",
            report.resolvers.len(),
            report.files_scanned,
            report.unknown_count(),
            report.failures.len()
        );
        report
    }

    pub fn classify_file(&self, path: impl AsRef<Path>) -> Result<Vec<ResolverInfo>> {
        self.classify_file_with(path.as_ref(), &mut HashMap::new())
    }

    /// Classify one source text; `file_path` selects the grammar.
    pub fn classify_source(
        &self,
        content: &str,
        file_path: impl AsRef<Path>,
    ) -> Result<Vec<ResolverInfo>> {
        let language = Language::from_path(file_path.as_ref());
        let mut detector = CandidateDetector::new(language)?;
        classify_with(&mut detector, content)
    }

    /// Classify every field of an executable schema that carries a resolver.
    pub fn classify_executable(&self, schema: &impl ExecutableSchema) -> Vec<ResolverInfo> {
        let mut resolvers = Vec::new();
        for type_name in schema.object_types() {
            for field in schema.fields(type_name) {
                if let Some(source) = schema.resolver_source(type_name, field) {
                    resolvers.push(resolve_text(format!("{type_name}.{field}"), source));
                }
            }
        }
        log::debug!("Classified {} schema-attached resolvers", resolvers.len());
        resolvers
    }

    fn classify_file_with(
        &self,
        path: &Path,
        detectors: &mut HashMap<Language, CandidateDetector>,
    ) -> Result<Vec<ResolverInfo>> {
        let language = Language::from_path(path);
        if !language.is_supported() {
            return Err(ClassifierError::unsupported_language(
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or(language.as_str()),
            ));
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ClassifierError::file_access(path, e))?;

        let detector = match detectors.entry(language) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(CandidateDetector::new(language)?)
            }
        };
        classify_with(detector, &content)
    }
}

/// Classification of a resolver body alone.
pub fn classify_text(text: &str) -> Classification {
    rules::classify(text)
}

pub fn extract_dependencies(text: &str) -> BTreeSet<String> {
    rules::extract_dependencies(text)
}

fn classify_with(detector: &mut CandidateDetector, content: &str) -> Result<Vec<ResolverInfo>> {
    let mut resolvers = ResolverSet::default();
    for Candidate { path, source, line } in detector.detect(content)? {
        let info = resolve_text(path, &source);
        log::trace!("line {line}: {} -> {}", info.path, info.source_kind());
        resolvers.insert(info);
    }
    Ok(resolvers.into_vec())
}

fn resolve_text(path: String, source: &str) -> ResolverInfo {
    ResolverInfo::new(path)
        .with_classification(classify_text(source))
        .with_dependencies(extract_dependencies(source))
}

/// Insertion-ordered resolvers keyed by path; repeated paths are folded in
/// with [`ResolverInfo::absorb`].
#[derive(Default)]
struct ResolverSet {
    order: Vec<ResolverInfo>,
    index: HashMap<String, usize>,
}

impl ResolverSet {
    fn insert(&mut self, info: ResolverInfo) {
        match self.index.get(&info.path) {
            Some(&slot) => {
                let existing = &mut self.order[slot];
                if existing.absorb(info.classification, info.dependencies) {
                    log::debug!("{} reclassified from a later definition", existing.path);
                }
            }
            None => {
                self.index.insert(info.path.clone(), self.order.len());
                self.order.push(info);
            }
        }
    }

    fn into_vec(self) -> Vec<ResolverInfo> {
        self.order
    }
}
