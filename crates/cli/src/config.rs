//! `gqlmap.toml` / `--config` loading.
//!
//! Files may be JSON or TOML. JSON is tried first; on failure the text is
//! parsed as TOML and converted, so both go through the same serde model and
//! the same unknown-field checks.

use anyhow::{anyhow, Context as AnyhowContext, Result};
use gqlmap_classifier::ClassifierConfig;
use gqlmap_enrichment::EnrichmentConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "gqlmap.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GqlmapConfig {
    /// SDL file path or inline SDL text
    pub schema: Option<String>,

    /// Resolver source files and directories
    pub resolvers: Vec<PathBuf>,

    /// JSON resolver bindings for the schema-driven entry point
    pub bindings: Option<PathBuf>,

    pub scan: ClassifierConfig,

    pub enrichment: EnrichmentConfig,
}

impl GqlmapConfig {
    /// Load `explicit` if given (it must exist), else `gqlmap.toml` under
    /// `workdir` if present, else defaults. Relative paths in a loaded file are
    /// resolved against the file's directory.
    pub fn discover(workdir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = workdir.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    log::debug!("No {DEFAULT_CONFIG_FILE} in {}", workdir.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config =
            parse_raw(&bytes).with_context(|| format!("Invalid config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scan
            .validate()
            .map_err(|e| anyhow!("[scan] {e}"))?;
        self.enrichment
            .validate()
            .map_err(|e| anyhow!("[enrichment] {e}"))?;
        Ok(())
    }

    fn rebase(&mut self, base: &Path) {
        let rebase = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        };

        for path in &mut self.resolvers {
            *path = rebase(path);
        }
        if let Some(bindings) = self.bindings.as_mut() {
            *bindings = rebase(bindings);
        }
        if let Some(schema) = self.schema.as_mut() {
            if looks_like_schema_path(schema) {
                *schema = rebase(Path::new(schema)).to_string_lossy().into_owned();
            }
        }
    }
}

/// A relative SDL file name rather than inline SDL text.
fn looks_like_schema_path(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.contains(['{', '\n'])
        && [".graphql", ".graphqls", ".gql"]
            .iter()
            .any(|ext| trimmed.ends_with(ext))
}

fn parse_raw(bytes: &[u8]) -> Result<GqlmapConfig> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                anyhow!("Config is not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}")
            })?;
            serde_json::to_value(toml_value)
                .map_err(|err| anyhow!("Failed to convert TOML config to JSON: {err}"))?
        }
    };

    serde_json::from_value(value).map_err(|err| anyhow!("Config parse error: {err}"))
}
