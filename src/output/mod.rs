pub mod console;
pub mod json;
pub mod sarif;

use crate::engine::LintSummary;
use crate::error::Result;
use crate::rules::policy::PolicyVerdict;
use crate::rules::RuleSet;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Sarif,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "console" | "human" => Some(Self::Text),
            "json" => Some(Self::Json),
            "sarif" => Some(Self::Sarif),
            _ => None,
        }
    }
}

/// Render one run's summaries into the specified format. `color` only
/// affects [`OutputFormat::Text`].
pub fn render(
    summaries: &[LintSummary],
    rule_sets: &[RuleSet],
    verdict: &PolicyVerdict,
    format: OutputFormat,
    color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(console::render(summaries, verdict, color)),
        OutputFormat::Json => json::render(summaries),
        OutputFormat::Sarif => sarif::render(summaries, rule_sets),
    }
}
