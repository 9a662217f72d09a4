//! Verification metadata attached to rules and rule sets. Purely
//! informational: nothing here influences matching.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleProvenance {
    #[serde(default)]
    pub last_verified: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub re_verify_after: Option<String>,
    #[serde(default)]
    pub superseded_by: Option<SupersededBy>,
    #[serde(default)]
    pub sources: Vec<SourceReference>,
}

impl RuleProvenance {
    /// True when `re_verify_after` is a valid date strictly before `today`.
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.re_verify_after
            .as_deref()
            .and_then(parse_date)
            .is_some_and(|due| due < today)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupersededBy {
    #[serde(default)]
    pub replacement: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Either a bare URL or a detailed citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceReference {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        accessed: Option<String>,
        #[serde(default)]
        quote: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainProvenance {
    #[serde(default)]
    pub last_full_audit: Option<String>,
    #[serde(default)]
    pub audited_by: Option<String>,
    #[serde(default)]
    pub next_audit_due: Option<String>,
    #[serde(default)]
    pub sources_consulted: Vec<SourceReference>,
}

impl DomainProvenance {
    pub fn audit_overdue(&self, today: NaiveDate) -> bool {
        self.next_audit_due
            .as_deref()
            .and_then(parse_date)
            .is_some_and(|due| due < today)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
