//! Query/Pattern Executor.
//!
//! [`RuleEngine::lint_files`] runs a whole rule set over a discovered file
//! list. Each file is read and parsed once; every applicable rule then runs
//! against that single tree (AST rules) or text (grep rules).
//!
//! A rule whose query does not compile, or whose language is unsupported,
//! is dropped for the rest of its rule set and recorded as a [`RuleError`]
//! on the summary. Other rules and files keep running.
//! [`RuleEngine::lint_source`] is the strict single-file variant that
//! propagates those errors instead.

pub mod pattern;
pub mod query;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tree_sitter::Tree;

use crate::error::{LintError, Result};
use crate::parser::{detect_language, Language, ParserRegistry};
use crate::rules::{Rule, RuleCheck, RuleSet, Severity};

pub use query::{CompiledQuery, VIOLATION_CAPTURE};

/// Internal match record: 1-indexed position plus the matched source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub line: usize,
    pub column: usize,
    pub text: String,
}

/// One located violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintResult {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    /// Matched source text. Kept for fingerprinting, never printed.
    #[serde(skip)]
    pub snippet: String,
}

impl LintResult {
    fn new(file: &Path, rule: &Rule, m: Match) -> Self {
        Self {
            file: file.to_path_buf(),
            line: m.line,
            column: m.column,
            rule_id: rule.id.clone(),
            severity: rule.severity,
            message: rule.message.clone(),
            snippet: m.text,
        }
    }
}

/// A rule that could not run. Kept apart from results: it is a problem in
/// the rules, not in the code being checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleError {
    pub rule_id: String,
    pub message: String,
}

/// Outcome of one rule set over one file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintSummary {
    pub domain: String,
    /// Files that had at least one compatible rule and were read (and, when
    /// needed, parsed) successfully.
    pub files_linted: usize,
    pub results: Vec<LintResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RuleError>,
}

/// Runs rule sets against files, sharing one grammar registry.
pub struct RuleEngine<'r> {
    registry: &'r ParserRegistry,
}

impl<'r> RuleEngine<'r> {
    pub fn new(registry: &'r ParserRegistry) -> Self {
        Self { registry }
    }

    /// Lint every file in `files` with `rule_set`. Files are visited in the
    /// order given; results come back grouped by file path.
    pub fn lint_files(&self, rule_set: &RuleSet, files: &[PathBuf]) -> LintSummary {
        let mut queries = QueryCache::new(self.registry, &rule_set.rules);
        let mut results = Vec::new();
        let mut files_linted = 0;

        for path in files {
            let file_language = detect_language(path);
            let applicable: Vec<usize> = (0..rule_set.rules.len())
                .filter(|&idx| queries.applies(idx, file_language))
                .collect();
            if applicable.is_empty() {
                tracing::debug!(file = %path.display(), "no compatible rules, skipping");
                continue;
            }

            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "cannot read file, skipping");
                    continue;
                }
            };

            let needs_tree = applicable
                .iter()
                .any(|&idx| matches!(rule_set.rules[idx].check, RuleCheck::Ast { .. }));
            let tree = match (needs_tree, file_language) {
                (true, Some(language)) => match self.registry.parse(&source, language) {
                    Ok(tree) => Some(tree),
                    Err(e) => {
                        tracing::warn!(
                            file = %path.display(),
                            error = %e,
                            "cannot parse file, running grep rules only"
                        );
                        None
                    }
                },
                _ => None,
            };

            let mut ran_any = false;
            for idx in applicable {
                let rule = &rule_set.rules[idx];
                let found = match &rule.check {
                    RuleCheck::Grep { pattern } => pattern::find_matches(pattern, &source),
                    RuleCheck::Ast { .. } => {
                        let (Some(tree), Some(language)) = (&tree, file_language) else {
                            continue;
                        };
                        match queries.get(idx, language) {
                            Some(query) => query.run(tree, &source),
                            None => continue,
                        }
                    }
                };
                ran_any = true;
                tracing::trace!(rule = %rule.id, file = %path.display(), matches = found.len(), "rule ran");
                results.extend(found.into_iter().map(|m| LintResult::new(path, rule, m)));
            }

            if ran_any {
                files_linted += 1;
            }
        }

        results.sort_by(|a, b| a.file.cmp(&b.file));

        let errors = queries.into_errors();
        for error in &errors {
            tracing::error!(
                domain = %rule_set.domain,
                rule = %error.rule_id,
                error = %error.message,
                "rule skipped"
            );
        }

        LintSummary {
            domain: rule_set.domain.clone(),
            files_linted,
            results,
            errors,
        }
    }

    /// Lint one in-memory file. Unlike [`lint_files`](Self::lint_files), any
    /// unsupported language or query-compile error is returned as an error.
    pub fn lint_source(&self, rules: &[Rule], path: &Path, source: &str) -> Result<Vec<LintResult>> {
        let file_language = detect_language(path);
        let mut tree: Option<Tree> = None;
        let mut results = Vec::new();

        for rule in rules {
            let found = match &rule.check {
                RuleCheck::Grep { pattern } => pattern::find_matches(pattern, source),
                RuleCheck::Ast { language, query } => {
                    let declared = resolve_language(self.registry, language)?;
                    let Some(file_language) = file_language.filter(|l| declared.accepts(*l)) else {
                        continue;
                    };
                    if query.trim().is_empty() {
                        continue;
                    }
                    let grammar = self.registry.grammar(file_language)?;
                    let compiled = CompiledQuery::compile(&rule.id, &grammar, query)?;
                    if tree.is_none() {
                        tree = Some(self.registry.parse(source, file_language)?);
                    }
                    match &tree {
                        Some(tree) => compiled.run(tree, source),
                        None => continue,
                    }
                }
            };
            results.extend(found.into_iter().map(|m| LintResult::new(path, rule, m)));
        }

        Ok(results)
    }
}

fn resolve_language(registry: &ParserRegistry, name: &str) -> Result<Language> {
    let language = Language::from_name(name).ok_or_else(|| LintError::UnsupportedLanguage {
        requested: name.to_string(),
        supported: registry
            .supported()
            .iter()
            .map(|l| l.name())
            .collect::<Vec<_>>()
            .join(", "),
    })?;
    // fails for languages compiled out of this build
    registry.grammar(language)?;
    Ok(language)
}

/// Per-rule-set state: each AST rule's declared language, its queries
/// compiled per file grammar, and the rules that failed.
struct QueryCache<'a> {
    registry: &'a ParserRegistry,
    rules: &'a [Rule],
    declared: HashMap<usize, Language>,
    compiled: HashMap<(usize, Language), CompiledQuery>,
    broken: BTreeMap<usize, RuleError>,
}

impl<'a> QueryCache<'a> {
    /// Resolves every AST rule up front so a broken query is reported even
    /// when no file ever reaches it.
    fn new(registry: &'a ParserRegistry, rules: &'a [Rule]) -> Self {
        let mut cache = Self {
            registry,
            rules,
            declared: HashMap::new(),
            compiled: HashMap::new(),
            broken: BTreeMap::new(),
        };

        for (idx, rule) in rules.iter().enumerate() {
            let RuleCheck::Ast { language, query } = &rule.check else {
                continue;
            };
            if query.trim().is_empty() {
                tracing::warn!(rule = %rule.id, "ast rule has an empty query, skipping");
                continue;
            }
            match resolve_language(registry, language) {
                Ok(declared) => {
                    cache.declared.insert(idx, declared);
                    cache.get(idx, declared);
                }
                Err(e) => cache.fail(idx, e),
            }
        }
        cache
    }

    fn applies(&self, idx: usize, file_language: Option<Language>) -> bool {
        if self.broken.contains_key(&idx) {
            return false;
        }
        match &self.rules[idx].check {
            RuleCheck::Grep { .. } => true,
            RuleCheck::Ast { .. } => match (self.declared.get(&idx), file_language) {
                (Some(declared), Some(file)) => declared.accepts(file),
                _ => false,
            },
        }
    }

    /// The rule's query compiled for `language`, compiling on first use.
    fn get(&mut self, idx: usize, language: Language) -> Option<&CompiledQuery> {
        if self.broken.contains_key(&idx) {
            return None;
        }
        if !self.compiled.contains_key(&(idx, language)) {
            let rules = self.rules;
            let rule = &rules[idx];
            let RuleCheck::Ast { query, .. } = &rule.check else {
                return None;
            };
            let compiled = self
                .registry
                .grammar(language)
                .and_then(|grammar| CompiledQuery::compile(&rule.id, &grammar, query));
            match compiled {
                Ok(compiled) => {
                    self.compiled.insert((idx, language), compiled);
                }
                Err(e) => {
                    self.fail(idx, e);
                    return None;
                }
            }
        }
        self.compiled.get(&(idx, language))
    }

    fn fail(&mut self, idx: usize, error: LintError) {
        let rule_id = self.rules[idx].id.clone();
        self.broken.entry(idx).or_insert(RuleError {
            rule_id,
            message: error.to_string(),
        });
    }

    fn into_errors(self) -> Vec<RuleError> {
        self.broken.into_values().collect()
    }
}
