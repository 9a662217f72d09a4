use std::collections::HashMap;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::engine::{LintResult, LintSummary};
use crate::error::Result;
use crate::rules::RuleSet;

const SARIF_SCHEMA: &str =
    "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json";

/// Render every summary of one invocation as a single SARIF 2.1.0 run.
///
/// Rule ids are only unique within a domain, so every reporting descriptor
/// and every result uses `<domain>/<id>` as its SARIF rule id. Rule errors
/// are reported as tool execution notifications, never as results.
pub fn render(summaries: &[LintSummary], rule_sets: &[RuleSet]) -> Result<String> {
    let mut rules = Vec::new();
    let mut rule_index: HashMap<String, usize> = HashMap::new();
    for set in rule_sets {
        for rule in &set.rules {
            let id = sarif_rule_id(&set.domain, &rule.id);
            if rule_index.contains_key(&id) {
                continue;
            }
            let mut descriptor = json!({
                "id": id,
                "name": rule.title,
                "shortDescription": { "text": rule.title },
                "fullDescription": { "text": rule.message },
                "defaultConfiguration": { "level": rule.severity.level() },
                "properties": {
                    "domain": set.domain,
                    "ruleId": rule.id,
                    "severity": rule.severity.to_string(),
                    "type": rule.check.kind(),
                },
            });
            if let Some(language) = rule.language() {
                descriptor["properties"]["language"] = json!(language);
            }
            rule_index.insert(id, rules.len());
            rules.push(descriptor);
        }
    }

    let results: Vec<Value> = summaries
        .iter()
        .flat_map(|s| {
            let rule_index = &rule_index;
            s.results
                .iter()
                .map(move |r| sarif_result(&s.domain, r, rule_index))
        })
        .collect();

    let notifications: Vec<Value> = summaries
        .iter()
        .flat_map(|s| {
            s.errors.iter().map(move |e| {
                json!({
                    "level": "error",
                    "message": { "text": e.message },
                    "descriptor": { "id": sarif_rule_id(&s.domain, &e.rule_id) },
                    "properties": { "domain": s.domain },
                })
            })
        })
        .collect();

    let domains: Vec<&str> = summaries.iter().map(|s| s.domain.as_str()).collect();

    let sarif = json!({
        "$schema": SARIF_SCHEMA,
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "flight-lint",
                    "version": env!("CARGO_PKG_VERSION"),
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "invocations": [{
                "executionSuccessful": notifications.is_empty(),
                "toolExecutionNotifications": notifications,
            }],
            "results": results,
            "automationDetails": {
                "id": format!("flight-lint/{}/", domains.join("+")),
                "guid": uuid::Uuid::new_v4().to_string(),
            },
        }],
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

fn sarif_rule_id(domain: &str, rule_id: &str) -> String {
    format!("{domain}/{rule_id}")
}

fn sarif_result(domain: &str, result: &LintResult, rule_index: &HashMap<String, usize>) -> Value {
    let uri = artifact_uri(result);
    let id = sarif_rule_id(domain, &result.rule_id);
    let mut value = json!({
        "ruleId": id,
        "level": result.severity.level(),
        "message": { "text": result.message },
        "locations": [{
            "physicalLocation": {
                "artifactLocation": { "uri": uri },
                "region": {
                    "startLine": result.line,
                    "startColumn": result.column,
                },
            },
        }],
        "partialFingerprints": {
            "flightLint/v1": fingerprint(domain, result, &uri),
        },
        "properties": { "domain": domain },
    });
    if let Some(index) = rule_index.get(&id) {
        value["ruleIndex"] = json!(index);
    }
    value
}

fn artifact_uri(result: &LintResult) -> String {
    result.file.to_string_lossy().replace('\\', "/")
}

/// Stable across line shifts: keyed on what matched, not where.
fn fingerprint(domain: &str, result: &LintResult, uri: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [domain, result.rule_id.as_str(), uri, result.snippet.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}
