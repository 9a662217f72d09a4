use owo_colors::OwoColorize;

use crate::engine::{LintResult, LintSummary};
use crate::rules::policy::PolicyVerdict;
use crate::rules::Severity;

/// Render summaries as human-readable text, grouped by rule set, then by
/// file path, then in discovery order within each file.
pub fn render(summaries: &[LintSummary], verdict: &PolicyVerdict, color: bool) -> String {
    let mut output = String::new();
    let mut counts = [0usize; 3];

    for summary in summaries {
        output.push_str(&format!(
            "\n  {} ({} file(s) linted)\n",
            bold(&summary.domain, color),
            summary.files_linted
        ));

        for error in &summary.errors {
            output.push_str(&format!(
                "    {} rule {} skipped: {}\n",
                paint("RULE ERROR", Severity::Never, color),
                error.rule_id,
                error.message
            ));
        }

        if summary.results.is_empty() {
            output.push_str("    No violations found.\n");
            continue;
        }

        let mut sorted: Vec<&LintResult> = summary.results.iter().collect();
        sorted.sort_by(|a, b| a.file.cmp(&b.file));

        let mut current_file = None;
        for result in sorted {
            if current_file != Some(&result.file) {
                current_file = Some(&result.file);
                output.push_str(&format!(
                    "\n    {}\n",
                    bold(&result.file.display().to_string(), color)
                ));
            }
            counts[level_index(result.severity)] += 1;
            let position = format!("{}:{}", result.line, result.column);
            let label = format!("{:<8}", result.severity.to_string());
            output.push_str(&format!(
                "      {:<9} {}  {}  {}\n",
                position,
                paint(&label, result.severity, color),
                result.message,
                dim(&result.rule_id, color)
            ));
        }
    }

    let total: usize = counts.iter().sum();
    output.push('\n');
    if total > 0 {
        output.push_str(&format!(
            "  {} problem(s) ({} error(s), {} warning(s), {} note(s))\n",
            total, counts[0], counts[1], counts[2]
        ));
    }

    let status = if verdict.pass {
        paint("PASS", Severity::Guidance, color)
    } else {
        paint("FAIL", Severity::Never, color)
    };
    output.push_str(&format!(
        "  Result: {} (highest: {})\n\n",
        status,
        verdict
            .highest_severity
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".into()),
    ));

    output
}

fn level_index(severity: Severity) -> usize {
    match severity {
        Severity::Never | Severity::Must => 0,
        Severity::Should => 1,
        Severity::Guidance => 2,
    }
}

fn paint(text: &str, severity: Severity, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match severity {
        Severity::Never | Severity::Must => text.red().bold().to_string(),
        Severity::Should => text.yellow().bold().to_string(),
        Severity::Guidance => text.blue().to_string(),
    }
}

fn bold(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn dim(text: &str, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}
