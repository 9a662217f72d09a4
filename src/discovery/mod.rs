//! File Discovery: glob expansion with exclusions, and rule-set lookup.
//!
//! Output is always absolute, deduplicated and sorted, so two runs over an
//! unchanged tree see identical file lists.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

/// Conventional location of rule-set documents, relative to the base path.
pub const DOMAINS_DIR: &str = ".flight/domains";

/// Suffix of rule-set documents found by auto-discovery.
pub const RULES_SUFFIX: &str = ".rules.json";

/// Baseline exclusions applied to every rule set, matched against paths
/// relative to the base directory.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // dependencies
    "**/node_modules/**",
    "**/bower_components/**",
    "**/vendor/**",
    "**/.venv/**",
    "**/venv/**",
    // build output
    "**/dist/**",
    "**/build/**",
    "**/target/**",
    "**/.next/**",
    // VCS
    "**/.git/**",
    "**/.hg/**",
    "**/.svn/**",
    // IDE
    "**/.idea/**",
    "**/.vscode/**",
    // coverage & caches
    "**/coverage/**",
    "**/.cache/**",
    "**/__pycache__/**",
    "**/.pytest_cache/**",
    // fixtures that contain violations on purpose
    "**/fixtures/**",
    "**/test-fixtures/**",
    // the linter's own directory
    "**/.flight/**",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Additional exclusions on top of the defaults and the rule set's own.
    pub extra_excludes: Vec<String>,
    /// Also drop files ignored by `<base>/.gitignore`.
    pub respect_gitignore: bool,
}

/// Expand `patterns` under `base`, minus [`DEFAULT_EXCLUDES`] and
/// `exclude_patterns`.
pub fn discover_files(patterns: &[String], exclude_patterns: &[String], base: &Path) -> Vec<PathBuf> {
    discover_files_with(patterns, exclude_patterns, base, &DiscoveryOptions::default())
}

pub fn discover_files_with(
    patterns: &[String],
    exclude_patterns: &[String],
    base: &Path,
    options: &DiscoveryOptions,
) -> Vec<PathBuf> {
    let base = match base.canonicalize() {
        Ok(base) => base,
        Err(e) => {
            tracing::warn!(base = %base.display(), error = %e, "cannot resolve base path");
            return Vec::new();
        }
    };

    let excludes = ExcludeSet::new(
        DEFAULT_EXCLUDES
            .iter()
            .copied()
            .chain(exclude_patterns.iter().map(String::as_str))
            .chain(options.extra_excludes.iter().map(String::as_str)),
    );
    let gitignore = if options.respect_gitignore {
        load_gitignore(&base)
    } else {
        None
    };

    let escaped_base = Pattern::escape(&base.to_string_lossy());
    let mut files = BTreeSet::new();

    for pattern in patterns {
        let pattern = pattern.trim_start_matches("./");
        let full = format!("{}/{}", escaped_base.trim_end_matches('/'), pattern);
        let paths = match glob::glob_with(&full, MATCH_OPTIONS) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!(pattern, error = %e, "invalid file pattern, skipping");
                continue;
            }
        };

        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "unreadable path during discovery");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&base) else {
                continue;
            };
            if excludes.matches(relative) {
                continue;
            }
            if let Some(gi) = &gitignore {
                if gi.matched_path_or_any_parents(&path, false).is_ignore() {
                    continue;
                }
            }
            files.insert(path);
        }
    }

    files.into_iter().collect()
}

/// Rule-set documents under `<base>/.flight/domains`, sorted. A missing
/// directory yields an empty list.
pub fn discover_rule_sets(base: &Path) -> Vec<PathBuf> {
    discover_rule_sets_in(&base.join(DOMAINS_DIR))
}

pub fn discover_rule_sets_in(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "no domains directory");
        return Vec::new();
    }

    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable entry in domains directory");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(RULES_SUFFIX))
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    fn new<'a>(raw: impl IntoIterator<Item = &'a str>) -> Self {
        let patterns = raw
            .into_iter()
            .filter_map(|p| {
                let p = p.trim_start_matches("./");
                match Pattern::new(p) {
                    Ok(pattern) => Some(pattern),
                    Err(e) => {
                        tracing::warn!(pattern = p, error = %e, "invalid exclude pattern, ignoring");
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    fn matches(&self, relative: &Path) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }
}

fn load_gitignore(base: &Path) -> Option<ignore::gitignore::Gitignore> {
    let path = base.join(".gitignore");
    if !path.is_file() {
        return None;
    }
    let mut builder = ignore::gitignore::GitignoreBuilder::new(base);
    if let Some(e) = builder.add(&path) {
        tracing::warn!(path = %path.display(), error = %e, "problem reading .gitignore");
    }
    match builder.build() {
        Ok(gi) => Some(gi),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unusable .gitignore");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x").unwrap();
        }
        dir
    }

    fn rel(base: &Path, files: &[PathBuf]) -> Vec<String> {
        let base = base.canonicalize().unwrap();
        files
            .iter()
            .map(|f| f.strip_prefix(&base).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn pats(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn expands_sorts_and_dedupes() {
        let dir = tree(&["src/b.js", "src/a.js", "src/nested/c.js", "lib/d.js", "e.ts"]);
        let files = discover_files(&pats(&["**/*.js", "src/*.js"]), &[], dir.path());
        assert_eq!(
            rel(dir.path(), &files),
            vec!["lib/d.js", "src/a.js", "src/b.js", "src/nested/c.js"]
        );
        assert!(files.iter().all(|f| f.is_absolute()));
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let dir = tree(&["top.py", "pkg/inner.py"]);
        let files = discover_files(&pats(&["*.py"]), &[], dir.path());
        assert_eq!(rel(dir.path(), &files), vec!["top.py"]);
    }

    #[test]
    fn default_excludes_apply() {
        let dir = tree(&[
            "src/app.js",
            "node_modules/pkg/index.js",
            "dist/app.js",
            ".git/hooks/x.js",
            "tests/fixtures/bad.js",
            ".flight/domains/helper.js",
            "coverage/lcov.js",
        ]);
        let files = discover_files(&pats(&["**/*.js"]), &[], dir.path());
        assert_eq!(rel(dir.path(), &files), vec!["src/app.js"]);
    }

    #[test]
    fn rule_set_excludes_are_merged() {
        let dir = tree(&["src/app.js", "src/legacy/old.js", "src/app.test.js"]);
        let files = discover_files(
            &pats(&["src/**/*.js"]),
            &pats(&["src/legacy/**", "**/*.test.js"]),
            dir.path(),
        );
        assert_eq!(rel(dir.path(), &files), vec!["src/app.js"]);
    }

    #[test]
    fn extra_excludes_from_options() {
        let dir = tree(&["a.go", "gen/b.go"]);
        let options = DiscoveryOptions {
            extra_excludes: pats(&["gen/**"]),
            ..Default::default()
        };
        let files = discover_files_with(&pats(&["**/*.go"]), &[], dir.path(), &options);
        assert_eq!(rel(dir.path(), &files), vec!["a.go"]);
    }

    #[test]
    fn directories_are_not_returned() {
        let dir = tree(&["weird.js/inner.txt", "real.js"]);
        let files = discover_files(&pats(&["*.js"]), &[], dir.path());
        assert_eq!(rel(dir.path(), &files), vec!["real.js"]);
    }

    #[test]
    fn gitignore_respected_when_enabled() {
        let dir = tree(&["keep.rs", "generated/skip.rs"]);
        fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();

        let plain = discover_files(&pats(&["**/*.rs"]), &[], dir.path());
        assert_eq!(plain.len(), 2);

        let options = DiscoveryOptions {
            respect_gitignore: true,
            ..Default::default()
        };
        let filtered = discover_files_with(&pats(&["**/*.rs"]), &[], dir.path(), &options);
        assert_eq!(rel(dir.path(), &filtered), vec!["keep.rs"]);
    }

    #[test]
    fn invalid_pattern_and_missing_base_yield_nothing() {
        let dir = tree(&["a.js"]);
        assert!(discover_files(&pats(&["[*.js"]), &[], dir.path()).is_empty());
        assert!(discover_files(&pats(&["*.js"]), &[], Path::new("/no/such/base")).is_empty());
    }

    #[test]
    fn discovery_is_deterministic() {
        let dir = tree(&["z.js", "m/a.js", "a.js", "m/z.js"]);
        let first = discover_files(&pats(&["**/*.js"]), &[], dir.path());
        let second = discover_files(&pats(&["**/*.js"]), &[], dir.path());
        assert_eq!(first, second);
    }

    #[test]
    fn finds_rule_sets_sorted() {
        let dir = tree(&[
            ".flight/domains/typescript.rules.json",
            ".flight/domains/python.rules.json",
            ".flight/domains/python.flight",
            ".flight/domains/archive/old.rules.json",
        ]);
        let found = discover_rule_sets(dir.path());
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["python.rules.json", "typescript.rules.json"]);
    }

    #[test]
    fn no_domains_directory_is_not_an_error() {
        let dir = tree(&["src/a.js"]);
        assert!(discover_rule_sets(dir.path()).is_empty());
    }
}
