//! Rules Loader: reads one `<domain>.rules.json` document and validates it
//! into a [`RuleSet`].
//!
//! Loading is atomic. The first problem found fails the whole document, with
//! the path and the offending field (and rule index/id) in the message.

use std::collections::HashSet;
use std::path::Path;

use regex::RegexBuilder;
use serde_json::{Map, Value};

use super::{DomainProvenance, Rule, RuleCheck, RuleProvenance, RuleSet, Severity};
use crate::error::{LintError, Result};

/// Load and validate a rule-set document from disk.
pub fn load_rule_set(path: &Path) -> Result<RuleSet> {
    if !path.is_file() {
        return Err(LintError::RuleSetNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let rule_set = parse_rule_set(&content, path)?;

    let today = chrono::Local::now().date_naive();
    for rule in &rule_set.rules {
        if rule.provenance.as_ref().is_some_and(|p| p.is_stale(today)) {
            tracing::warn!(
                domain = %rule_set.domain,
                rule = %rule.id,
                "rule is past its re-verification date"
            );
        }
    }
    if rule_set
        .provenance
        .as_ref()
        .is_some_and(|p| p.audit_overdue(today))
    {
        tracing::warn!(domain = %rule_set.domain, "domain audit is overdue");
    }

    tracing::debug!(
        domain = %rule_set.domain,
        rules = rule_set.rules.len(),
        path = %path.display(),
        "loaded rule set"
    );
    Ok(rule_set)
}

/// Validate an already-read document. `path` is only used for error messages
/// and recorded as [`RuleSet::source`].
pub fn parse_rule_set(content: &str, path: &Path) -> Result<RuleSet> {
    let doc: Value = serde_json::from_str(content)
        .map_err(|e| LintError::load(path, format!("invalid document: {e}")))?;
    let root = doc
        .as_object()
        .ok_or_else(|| LintError::load(path, "invalid document: expected a top-level object"))?;

    let field_err = |message: String| LintError::load(path, message);

    let domain = required_str(root, "domain").map_err(field_err)?;
    let version = required_str(root, "version").map_err(field_err)?;
    let language = optional_str(root, "language").map_err(field_err)?;
    let file_patterns = string_list(root, "file_patterns", true).map_err(field_err)?;
    let exclude_patterns = string_list(root, "exclude_patterns", false).map_err(field_err)?;
    let provenance: Option<DomainProvenance> =
        optional_object(root, "provenance").map_err(field_err)?;

    let raw_rules = root
        .get("rules")
        .and_then(Value::as_array)
        .ok_or_else(|| field_err("\"rules\" must be a list".into()))?;

    let mut rules = Vec::with_capacity(raw_rules.len());
    let mut seen = HashSet::new();
    for (idx, raw) in raw_rules.iter().enumerate() {
        let rule = parse_rule(raw, idx).map_err(field_err)?;
        if !seen.insert(rule.id.clone()) {
            return Err(field_err(format!(
                "rules[{idx}] (id={}): duplicate rule id",
                rule.id
            )));
        }
        rules.push(rule);
    }

    Ok(RuleSet {
        domain,
        version,
        language,
        file_patterns,
        exclude_patterns,
        rules,
        provenance,
        source: path.to_path_buf(),
    })
}

fn parse_rule(raw: &Value, idx: usize) -> std::result::Result<Rule, String> {
    let obj = raw
        .as_object()
        .ok_or_else(|| format!("rules[{idx}]: expected an object"))?;

    let id = required_str(obj, "id").map_err(|e| format!("rules[{idx}]: {e}"))?;
    let at = |e: String| format!("rules[{idx}] (id={id}): {e}");

    let title = required_str(obj, "title").map_err(at)?;
    let severity_raw = required_str(obj, "severity").map_err(at)?;
    let severity = Severity::parse(&severity_raw).ok_or_else(|| {
        at(format!(
            "unknown severity \"{severity_raw}\" (expected NEVER, MUST, SHOULD or GUIDANCE)"
        ))
    })?;
    let message = required_str(obj, "message").map_err(at)?;

    // Exactly one payload field may be non-null, and it must match the type.
    let query = optional_str(obj, "query").map_err(at)?;
    let pattern = optional_str(obj, "pattern").map_err(at)?;
    let kind = optional_str(obj, "type").map_err(at)?;

    let check = match kind.as_deref().unwrap_or("grep") {
        "ast" => {
            if pattern.is_some() {
                return Err(at("ast rule must not carry a \"pattern\"".into()));
            }
            let language = optional_str(obj, "language")
                .map_err(at)?
                .filter(|l| !l.is_empty())
                .ok_or_else(|| at("ast rule requires a \"language\"".into()))?;
            let query = query
                .filter(|q| !q.trim().is_empty())
                .ok_or_else(|| at("ast rule requires a non-empty \"query\"".into()))?;
            RuleCheck::Ast { language, query }
        }
        "grep" => {
            if query.is_some() {
                return Err(at("grep rule must not carry a \"query\"".into()));
            }
            let pattern = pattern
                .filter(|p| !p.is_empty())
                .ok_or_else(|| at("grep rule requires a non-empty \"pattern\"".into()))?;
            let compiled = RegexBuilder::new(&pattern)
                .multi_line(true)
                .build()
                .map_err(|e| at(format!("invalid \"pattern\": {e}")))?;
            RuleCheck::Grep { pattern: compiled }
        }
        other => return Err(at(format!("unknown type \"{other}\" (expected ast or grep)"))),
    };

    let provenance: Option<RuleProvenance> = optional_object(obj, "provenance").map_err(at)?;

    Ok(Rule {
        id,
        title,
        severity,
        check,
        message,
        provenance,
    })
}

fn required_str(obj: &Map<String, Value>, key: &str) -> std::result::Result<String, String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(format!("\"{key}\" must not be empty")),
        Some(Value::Null) | None => Err(format!("missing \"{key}\"")),
        Some(_) => Err(format!("\"{key}\" must be a string")),
    }
}

fn optional_str(obj: &Map<String, Value>, key: &str) -> std::result::Result<Option<String>, String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(format!("\"{key}\" must be a string or null")),
    }
}

fn string_list(
    obj: &Map<String, Value>,
    key: &str,
    required: bool,
) -> std::result::Result<Vec<String>, String> {
    let items = match obj.get(key) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) if !required => return Ok(Vec::new()),
        _ => return Err(format!("\"{key}\" must be a list")),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("\"{key}\"[{i}] must be a string"))
        })
        .collect()
}

fn optional_object<T: serde::de::DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &str,
) -> std::result::Result<Option<T>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Object(_)) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| format!("invalid \"{key}\": {e}")),
        Some(_) => Err(format!("\"{key}\" must be an object")),
    }
}
