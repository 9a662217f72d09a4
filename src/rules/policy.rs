use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::Severity;
use crate::engine::LintResult;

/// Policy verdict: the final pass/fail decision after applying the
/// severity floor, ignore list and overrides to raw results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub pass: bool,
    pub total_results: usize,
    pub effective_results: usize,
    pub highest_severity: Option<Severity>,
    pub min_severity: Severity,
}

/// Policy configuration loaded from `.flight-lint.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Results below this severity are dropped before display and exit-code
    /// evaluation.
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,
    /// Rule IDs to ignore entirely: `"N1"` (any domain) or `"python/N1"`.
    #[serde(default)]
    pub ignore_rules: HashSet<String>,
    /// Per-rule severity overrides, keyed like `ignore_rules`.
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

fn default_min_severity() -> Severity {
    Severity::Guidance
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            min_severity: Severity::Guidance,
            ignore_rules: HashSet::new(),
            overrides: HashMap::new(),
        }
    }
}

impl Policy {
    fn is_ignored(&self, domain: &str, rule_id: &str) -> bool {
        self.ignore_rules.contains(rule_id)
            || self.ignore_rules.contains(&format!("{domain}/{rule_id}"))
    }

    fn effective_severity(&self, domain: &str, result: &LintResult) -> Severity {
        self.overrides
            .get(&format!("{domain}/{}", result.rule_id))
            .or_else(|| self.overrides.get(&result.rule_id))
            .copied()
            .unwrap_or(result.severity)
    }

    /// Filter results: drop ignored rules, apply overrides, then drop
    /// anything below `min_severity`. Order is preserved.
    pub fn apply(&self, domain: &str, results: &[LintResult]) -> Vec<LintResult> {
        results
            .iter()
            .filter(|r| !self.is_ignored(domain, &r.rule_id))
            .map(|r| {
                let mut r = r.clone();
                r.severity = self.effective_severity(domain, &r);
                r
            })
            .filter(|r| r.severity >= self.min_severity)
            .collect()
    }

    /// Two-tier verdict over already-applied results: any `NEVER`/`MUST`
    /// fails, everything else passes.
    pub fn evaluate(&self, total_results: usize, effective: &[&LintResult]) -> PolicyVerdict {
        let highest = effective.iter().map(|r| r.severity).max();
        let failed = effective.iter().any(|r| r.severity.is_blocking());

        PolicyVerdict {
            pass: !failed,
            total_results,
            effective_results: effective.len(),
            highest_severity: highest,
            min_severity: self.min_severity,
        }
    }
}
