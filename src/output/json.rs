use crate::engine::LintSummary;
use crate::error::Result;

/// Render summaries as a pretty JSON array, one object per rule set.
pub fn render(summaries: &[LintSummary]) -> Result<String> {
    let json = serde_json::to_string_pretty(summaries)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LintResult, RuleError};
    use crate::rules::Severity;
    use serde_json::Value;
    use std::path::PathBuf;

    #[test]
    fn mirrors_summary_fields() {
        let summaries = vec![
            LintSummary {
                domain: "python".into(),
                files_linted: 2,
                results: vec![LintResult {
                    file: PathBuf::from("/repo/app.py"),
                    line: 4,
                    column: 5,
                    rule_id: "N1".into(),
                    severity: Severity::Never,
                    message: "No bare except.".into(),
                    snippet: "except:".into(),
                }],
                errors: vec![],
            },
            LintSummary {
                domain: "go".into(),
                files_linted: 0,
                results: vec![],
                errors: vec![RuleError {
                    rule_id: "N2".into(),
                    message: "bad query".into(),
                }],
            },
        ];

        let parsed: Value = serde_json::from_str(&render(&summaries).unwrap()).unwrap();
        assert_eq!(parsed[0]["domain"], "python");
        assert_eq!(parsed[0]["files_linted"], 2);
        assert_eq!(parsed[0]["results"][0]["rule_id"], "N1");
        assert_eq!(parsed[0]["results"][0]["severity"], "NEVER");
        assert_eq!(parsed[0]["results"][0]["line"], 4);
        assert!(parsed[0]["results"][0].get("snippet").is_none());
        assert!(parsed[0].get("errors").is_none());
        assert_eq!(parsed[1]["errors"][0]["rule_id"], "N2");
    }
}
