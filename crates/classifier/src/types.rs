use gqlmap_protocol::ResolverInfo;
use std::path::PathBuf;

/// A resolver implementation located in source, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// `Type.field` for map entries, the binding name for standalone functions
    pub path: String,

    /// Source text of the implementation (function node, including its body)
    pub source: String,

    /// 1-based line of the implementation
    pub line: usize,
}

/// A file that could not be read or parsed; the scan continued without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one source scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub resolvers: Vec<ResolverInfo>,
    pub files_scanned: usize,
    pub failures: Vec<FileFailure>,
}

impl ScanReport {
    pub fn unknown_count(&self) -> usize {
        self.resolvers
            .iter()
            .filter(|info| !info.classification.is_known())
            .count()
    }
}
