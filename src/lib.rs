//! flight-lint: rule-based static analysis over tree-sitter syntax trees.
//!
//! Rule sets ("domains") are JSON documents listing structural queries and
//! regex rules. Each rule set selects files with glob patterns; every file is
//! parsed once and all compatible rules run against it. Matches inside
//! comments and strings never fire for AST rules because they query syntax,
//! not text.
//!
//! # Quick Start
//!
//! ```no_run
//! use flightlint::{lint, LintOptions};
//!
//! let options = LintOptions {
//!     auto_discover: true,
//!     ..LintOptions::default()
//! };
//! let report = lint(&options).unwrap();
//! println!("Pass: {}, exit code: {}", report.verdict.pass, report.exit_code());
//! ```

pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod output;
pub mod parser;
pub mod rules;

use std::path::{Path, PathBuf};

use config::{Config, CONFIG_FILE};
use discovery::DiscoveryOptions;
use engine::{LintSummary, RuleEngine, RuleError};
use error::{LintError, Result};
use output::OutputFormat;
use parser::ParserRegistry;
use rules::policy::PolicyVerdict;
use rules::{RuleSet, Severity};

/// Options for a lint invocation.
#[derive(Debug, Clone)]
pub struct LintOptions {
    /// Explicit rule-set documents. Each one must exist.
    pub rule_paths: Vec<PathBuf>,
    /// Also pick up every `*.rules.json` in the configured domains directory.
    pub auto_discover: bool,
    /// Root that file patterns (and the domains directory) are relative to.
    pub base_path: PathBuf,
    /// Path to config file (defaults to `.flight-lint.toml` in the base path).
    pub config_path: Option<PathBuf>,
    /// CLI override for `policy.min_severity`.
    pub min_severity_override: Option<Severity>,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            rule_paths: Vec::new(),
            auto_discover: false,
            base_path: PathBuf::from("."),
            config_path: None,
            min_severity_override: None,
        }
    }
}

/// Complete lint report for one invocation.
#[derive(Debug)]
pub struct LintReport {
    pub rule_sets: Vec<RuleSet>,
    /// One per rule set, in load order, after policy filtering.
    pub summaries: Vec<LintSummary>,
    pub verdict: PolicyVerdict,
}

impl LintReport {
    /// `2` when any rule could not run, `1` when a `NEVER`/`MUST` violation
    /// survived the policy, `0` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.summaries.iter().any(|s| !s.errors.is_empty()) {
            2
        } else if !self.verdict.pass {
            1
        } else {
            0
        }
    }

    /// `(domain, error)` for every rule that was skipped.
    pub fn rule_errors(&self) -> impl Iterator<Item = (&str, &RuleError)> {
        self.summaries
            .iter()
            .flat_map(|s| s.errors.iter().map(move |e| (s.domain.as_str(), e)))
    }
}

/// Load the config that applies to `options`.
pub fn load_config(options: &LintOptions) -> Result<Config> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| options.base_path.join(CONFIG_FILE));
    Config::load(&config_path)
}

/// Rule-set documents to load: explicit paths first (each must exist), then
/// auto-discovered ones, without duplicates.
pub fn resolve_rule_set_paths(options: &LintOptions, config: &Config) -> Result<Vec<PathBuf>> {
    if options.rule_paths.is_empty() && !options.auto_discover {
        return Err(LintError::Config(
            "no rule sets given; pass rule-set paths or use --auto".into(),
        ));
    }

    let mut paths = Vec::new();
    for path in &options.rule_paths {
        if !path.is_file() {
            return Err(LintError::RuleSetNotFound(path.display().to_string()));
        }
        paths.push(path.clone());
    }

    if options.auto_discover {
        let dir = options.base_path.join(&config.lint.domains_dir);
        let found = discovery::discover_rule_sets_in(&dir);
        if found.is_empty() {
            tracing::info!(dir = %dir.display(), "no rule sets configured");
        }
        for path in found {
            if !paths.iter().any(|p| same_file(p, &path)) {
                paths.push(path);
            }
        }
    }

    Ok(paths)
}

/// Load every document; the first invalid one aborts.
pub fn load_rule_sets(paths: &[PathBuf]) -> Result<Vec<RuleSet>> {
    paths.iter().map(|p| rules::load_rule_set(p)).collect()
}

/// Run a complete lint: load config and rule sets, discover files, execute,
/// apply policy.
pub fn lint(options: &LintOptions) -> Result<LintReport> {
    let mut config = load_config(options)?;
    if let Some(min) = options.min_severity_override {
        config.policy.min_severity = min;
    }

    let paths = resolve_rule_set_paths(options, &config)?;
    let rule_sets = load_rule_sets(&paths)?;

    let registry = ParserRegistry::new();
    let engine = RuleEngine::new(&registry);
    let discovery_options = DiscoveryOptions {
        extra_excludes: config.lint.exclude.clone(),
        respect_gitignore: config.lint.respect_gitignore,
    };

    let mut summaries = Vec::with_capacity(rule_sets.len());
    let mut total_results = 0;

    for rule_set in &rule_sets {
        let files = discovery::discover_files_with(
            &rule_set.file_patterns,
            &rule_set.exclude_patterns,
            &options.base_path,
            &discovery_options,
        );
        tracing::debug!(domain = %rule_set.domain, files = files.len(), "discovered files");

        let mut summary = engine.lint_files(rule_set, &files);
        total_results += summary.results.len();
        summary.results = config.policy.apply(&rule_set.domain, &summary.results);
        summaries.push(summary);
    }

    let effective: Vec<_> = summaries.iter().flat_map(|s| s.results.iter()).collect();
    let verdict = config.policy.evaluate(total_results, &effective);

    Ok(LintReport {
        rule_sets,
        summaries,
        verdict,
    })
}

/// Render a lint report in the specified format.
pub fn render_report(report: &LintReport, format: OutputFormat, color: bool) -> Result<String> {
    output::render(
        &report.summaries,
        &report.rule_sets,
        &report.verdict,
        format,
        color,
    )
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn auto(name: &str) -> LintOptions {
        LintOptions {
            auto_discover: true,
            base_path: fixture(name),
            ..LintOptions::default()
        }
    }

    fn located(report: &LintReport, domain: &str) -> Vec<(String, usize, usize, String)> {
        report
            .summaries
            .iter()
            .find(|s| s.domain == domain)
            .unwrap()
            .results
            .iter()
            .map(|r| {
                (
                    r.file.file_name().unwrap().to_string_lossy().into_owned(),
                    r.line,
                    r.column,
                    r.rule_id.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn project_fixture_end_to_end() {
        let report = lint(&auto("project")).unwrap();

        let domains: Vec<&str> = report.summaries.iter().map(|s| s.domain.as_str()).collect();
        assert_eq!(domains, vec!["javascript", "python"]);

        // legacy/, node_modules/ and .ts files are out of the javascript set
        assert_eq!(report.summaries[0].files_linted, 2);
        assert_eq!(
            located(&report, "javascript"),
            vec![
                ("app.js".to_string(), 4, 1, "S1".to_string()),
                ("widget.jsx".to_string(), 2, 16, "N1".to_string()),
            ]
        );

        assert_eq!(report.summaries[1].files_linted, 2);
        assert_eq!(
            located(&report, "python"),
            vec![
                // rule order within a file: N1 before N3
                ("handler.py".to_string(), 2, 13, "N1".to_string()),
                ("handler.py".to_string(), 1, 20, "N3".to_string()),
            ]
        );

        assert!(!report.verdict.pass);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn advisory_only_results_pass() {
        let report = lint(&auto("advisory")).unwrap();
        let found = located(&report, "rust");
        let rules: Vec<&str> = found.iter().map(|f| f.3.as_str()).collect();
        // transmute only appears in comments and strings
        assert!(!rules.contains(&"N2"));
        assert!(rules.contains(&"S4"));
        assert!(rules.contains(&"G1"));
        assert!(report.verdict.pass);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn min_severity_hides_advisory_results() {
        let options = LintOptions {
            min_severity_override: Some(Severity::Must),
            ..auto("advisory")
        };
        let report = lint(&options).unwrap();
        assert!(report.summaries[0].results.is_empty());
        assert_eq!(report.verdict.total_results, 2);
        assert_eq!(report.verdict.effective_results, 0);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn broken_rule_set_fails_to_load() {
        let err = lint(&auto("broken")).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, LintError::Load { .. }));
        assert!(message.contains("go.rules.json"), "{message}");
        assert!(message.contains("rules[2]"), "{message}");
        assert!(message.contains("id=N3"), "{message}");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn bad_query_is_skipped_but_fails_the_run() {
        let report = lint(&auto("bad_query")).unwrap();
        assert_eq!(
            located(&report, "go"),
            vec![("main.go".to_string(), 5, 2, "N2".to_string())]
        );
        let errors: Vec<(&str, &str)> = report
            .rule_errors()
            .map(|(domain, e)| (domain, e.rule_id.as_str()))
            .collect();
        assert_eq!(errors, vec![("go", "N1")]);
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn explicit_paths_must_exist() {
        let options = LintOptions {
            rule_paths: vec![fixture("project").join("missing.rules.json")],
            base_path: fixture("project"),
            ..LintOptions::default()
        };
        let err = lint(&options).unwrap_err();
        assert!(matches!(err, LintError::RuleSetNotFound(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn explicit_path_selects_one_domain() {
        let options = LintOptions {
            rule_paths: vec![fixture("project").join(".flight/domains/python.rules.json")],
            base_path: fixture("project"),
            ..LintOptions::default()
        };
        let report = lint(&options).unwrap();
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].domain, "python");
    }

    #[test]
    fn explicit_and_auto_do_not_duplicate() {
        let options = LintOptions {
            rule_paths: vec![fixture("project").join(".flight/domains/python.rules.json")],
            ..auto("project")
        };
        let report = lint(&options).unwrap();
        let domains: Vec<&str> = report.summaries.iter().map(|s| s.domain.as_str()).collect();
        assert_eq!(domains, vec!["python", "javascript"]);
    }

    #[test]
    fn nothing_configured_is_a_clean_pass() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = LintOptions {
            auto_discover: true,
            base_path: dir.path().to_path_buf(),
            ..LintOptions::default()
        };
        let report = lint(&options).unwrap();
        assert!(report.summaries.is_empty());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn no_paths_and_no_auto_is_a_config_error() {
        let err = lint(&LintOptions::default()).unwrap_err();
        assert!(matches!(err, LintError::Config(_)));
    }

    #[test]
    fn repeated_runs_render_identically() {
        let first = lint(&auto("project")).unwrap();
        let second = lint(&auto("project")).unwrap();
        assert_eq!(first.summaries, second.summaries);
        assert_eq!(
            render_report(&first, OutputFormat::Json, false).unwrap(),
            render_report(&second, OutputFormat::Json, false).unwrap()
        );
    }

    #[test]
    fn sarif_keeps_same_rule_id_apart_per_domain() {
        let report = lint(&auto("project")).unwrap();
        let sarif: serde_json::Value =
            serde_json::from_str(&render_report(&report, OutputFormat::Sarif, false).unwrap())
                .unwrap();
        let run = &sarif["runs"][0];
        let rules = run["tool"]["driver"]["rules"].as_array().unwrap();
        let n1: Vec<&str> = rules
            .iter()
            .filter(|r| r["properties"]["ruleId"] == "N1")
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(n1, vec!["javascript/N1", "python/N1"]);

        for result in run["results"].as_array().unwrap() {
            let descriptor = &rules[result["ruleIndex"].as_u64().unwrap() as usize];
            assert_eq!(descriptor["properties"]["domain"], result["properties"]["domain"]);
        }
    }
}
