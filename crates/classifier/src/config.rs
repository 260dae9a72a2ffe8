use crate::error::{ClassifierError, Result};
use crate::language::{Language, DEFAULT_EXTENSIONS};
use gqlmap_protocol::path_filters::PathFilter;
use serde::{Deserialize, Serialize};

/// Files larger than this are skipped during directory walks (1 MB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 1_048_576;

/// Configuration for resolver source discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Extensions expanded from directories (without the leading dot)
    pub extensions: Vec<String>,

    /// Directory prefixes, relative to each scanned root; empty means everything
    pub include_paths: Vec<String>,

    pub exclude_paths: Vec<String>,

    /// Glob when it contains `*` or `?`, otherwise a substring match
    pub file_pattern: Option<String>,

    pub max_file_size_bytes: u64,

    /// Honor `.gitignore`, global git excludes and `.git/info/exclude`
    pub respect_gitignore: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
            file_pattern: None,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            respect_gitignore: true,
        }
    }
}

impl ClassifierConfig {
    pub fn path_filter(&self) -> PathFilter {
        PathFilter::new(
            self.include_paths.clone(),
            self.exclude_paths.clone(),
            self.file_pattern.clone(),
        )
    }

    pub fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(ClassifierError::invalid_config("extensions must not be empty"));
        }

        if let Some(ext) = self
            .extensions
            .iter()
            .find(|ext| !Language::from_extension(ext.trim_start_matches('.')).is_supported())
        {
            return Err(ClassifierError::invalid_config(format!(
                "extension '{ext}' has no resolver grammar"
            )));
        }

        if self.max_file_size_bytes == 0 {
            return Err(ClassifierError::invalid_config(
                "max_file_size_bytes must be > 0",
            ));
        }

        if let Some(pattern) = self.file_pattern.as_deref() {
            if (pattern.contains('*') || pattern.contains('?'))
                && glob::Pattern::new(pattern).is_err()
            {
                return Err(ClassifierError::invalid_config(format!(
                    "file_pattern '{pattern}' is not a valid glob"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ClassifierConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.accepts_extension("tsx"));
        assert!(config.accepts_extension(".JS"));
        assert!(!config.accepts_extension("py"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let config = ClassifierConfig {
            extensions: vec!["ts".to_string(), "py".to_string()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("py"));
    }

    #[test]
    fn zero_size_limit_is_rejected() {
        let config = ClassifierConfig {
            max_file_size_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn broken_glob_is_rejected() {
        let mut config = ClassifierConfig::default();
        config.file_pattern = Some("src/[*.ts".to_string());
        assert!(config.validate().is_err());
    }
}
