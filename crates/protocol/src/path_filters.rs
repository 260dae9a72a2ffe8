//! Include/exclude rules applied to resolver source paths before scanning.

use serde::{Deserialize, Serialize};

/// Filter over project-relative paths.
///
/// `include_paths` and `exclude_paths` are directory prefixes matched on path
/// component boundaries; `file_pattern` is a glob when it contains `*` or `?`,
/// otherwise a plain substring. Exclusion always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFilter {
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub file_pattern: Option<String>,
}

impl PathFilter {
    pub fn new(
        include_paths: Vec<String>,
        exclude_paths: Vec<String>,
        file_pattern: Option<String>,
    ) -> Self {
        Self {
            include_paths,
            exclude_paths,
            file_pattern,
        }
    }

    /// True when at least one rule would reject something.
    pub fn is_active(&self) -> bool {
        self.includes().next().is_some()
            || self.excludes().next().is_some()
            || self.pattern().is_some()
    }

    pub fn allows(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.replace('\\', "/");
        let rel_path = rel_path.trim_start_matches("./");

        let mut includes = self.includes().peekable();
        if includes.peek().is_some() && !includes.any(|prefix| is_prefix_of(&prefix, rel_path)) {
            return false;
        }

        if self.excludes().any(|prefix| is_prefix_of(&prefix, rel_path)) {
            return false;
        }

        match self.pattern() {
            None => true,
            Some(pattern) if !pattern.contains('*') && !pattern.contains('?') => {
                rel_path.contains(pattern)
            }
            Some(pattern) => glob::Pattern::new(pattern)
                .map(|p| p.matches(rel_path))
                .unwrap_or(false),
        }
    }

    fn includes(&self) -> impl Iterator<Item = String> + '_ {
        self.include_paths
            .iter()
            .map(|p| normalize_prefix(p))
            .filter(|p| !p.is_empty())
    }

    fn excludes(&self) -> impl Iterator<Item = String> + '_ {
        self.exclude_paths
            .iter()
            .map(|p| normalize_prefix(p))
            .filter(|p| !p.is_empty())
    }

    fn pattern(&self) -> Option<&str> {
        self.file_pattern
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

fn normalize_prefix(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    while let Some(rest) = value.strip_prefix("./") {
        value = rest.to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        String::new()
    } else {
        value.to_string()
    }
}

fn is_prefix_of(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str], pattern: Option<&str>) -> PathFilter {
        PathFilter::new(
            include.iter().map(|s| s.to_string()).collect(),
            exclude.iter().map(|s| s.to_string()).collect(),
            pattern.map(str::to_string),
        )
    }

    #[test]
    fn include_is_component_prefix() {
        let f = filter(&["src/resolvers"], &[], None);
        assert!(f.allows("src/resolvers/user.ts"));
        assert!(!f.allows("src/resolvers2/user.ts"));
        assert!(!f.allows("src/schema.ts"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let f = filter(&["src"], &["src/generated"], None);
        assert!(f.allows("src/resolvers.ts"));
        assert!(!f.allows("src/generated/types.ts"));
    }

    #[test]
    fn pattern_is_glob_or_substring() {
        assert!(filter(&[], &[], Some("resolvers")).allows("src/resolvers.js"));
        assert!(!filter(&[], &[], Some("resolvers")).allows("src/index.js"));
        assert!(filter(&[], &[], Some("src/*.ts")).allows("src/user.ts"));
        assert!(!filter(&[], &[], Some("src/*.ts")).allows("src/user.js"));
    }

    #[test]
    fn degenerate_prefixes_are_ignored() {
        let f = filter(&["", ".", "./", "/"], &["////"], Some("  "));
        assert!(!f.is_active());
        assert!(f.allows("anything/at/all.ts"));
    }
}
