//! Rule model: severities, rules, and rule sets ("domains").
//!
//! Rule sets are produced by [`loader::load_rule_set`] and are immutable
//! afterwards. A rule's [`RuleCheck`] tag decides how the engine runs it.

pub mod loader;
pub mod policy;
pub mod provenance;

use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use loader::{load_rule_set, parse_rule_set};
pub use provenance::{DomainProvenance, RuleProvenance};

/// Enforcement tier. Ordered from least (`Guidance`) to most severe (`Never`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Guidance,
    Should,
    Must,
    Never,
}

impl Severity {
    /// Exact match on the serialized (uppercase) form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEVER" => Some(Self::Never),
            "MUST" => Some(Self::Must),
            "SHOULD" => Some(Self::Should),
            "GUIDANCE" => Some(Self::Guidance),
            _ => None,
        }
    }

    pub fn from_str_lenient(s: &str) -> Option<Self> {
        Self::parse(s.trim().to_uppercase().as_str())
    }

    /// `NEVER` and `MUST` break the build.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Never | Self::Must)
    }

    /// Display tier shared by the text and SARIF renderers.
    pub fn level(self) -> &'static str {
        match self {
            Self::Never | Self::Must => "error",
            Self::Should => "warning",
            Self::Guidance => "note",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Never => write!(f, "NEVER"),
            Self::Must => write!(f, "MUST"),
            Self::Should => write!(f, "SHOULD"),
            Self::Guidance => write!(f, "GUIDANCE"),
        }
    }
}

/// How a rule is matched. Exactly one payload exists per kind.
#[derive(Debug, Clone)]
pub enum RuleCheck {
    /// Structural query; only `@violation` captures are reported.
    Ast { language: String, query: String },
    /// Regex over raw file text, compiled at load time.
    Grep { pattern: Regex },
}

impl RuleCheck {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ast { .. } => "ast",
            Self::Grep { .. } => "grep",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub check: RuleCheck,
    pub message: String,
    pub provenance: Option<RuleProvenance>,
}

impl Rule {
    /// Declared target language; grep rules have none.
    pub fn language(&self) -> Option<&str> {
        match &self.check {
            RuleCheck::Ast { language, .. } => Some(language),
            RuleCheck::Grep { .. } => None,
        }
    }

    pub fn metadata(&self, domain: &str) -> RuleMetadata {
        RuleMetadata {
            domain: domain.to_string(),
            id: self.id.clone(),
            title: self.title.clone(),
            severity: self.severity,
            kind: self.check.kind().to_string(),
            language: self.language().map(str::to_string),
            message: self.message.clone(),
        }
    }
}

/// A named, versioned collection of rules plus discovery configuration.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub domain: String,
    pub version: String,
    /// Informational only; each rule's own language is authoritative.
    pub language: Option<String>,
    pub file_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub rules: Vec<Rule>,
    pub provenance: Option<DomainProvenance>,
    /// Document this set was loaded from.
    pub source: PathBuf,
}

impl RuleSet {
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

/// Metadata about a rule, used for `list-rules` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub domain: String,
    pub id: String,
    pub title: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: String,
    pub language: Option<String>,
    pub message: String,
}
