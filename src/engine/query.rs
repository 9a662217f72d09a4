use std::collections::HashSet;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor, Tree};

use super::Match;
use crate::error::{LintError, Result};

/// The only capture name that produces reportable locations. Every other
/// capture exists to express structural predicates.
pub const VIOLATION_CAPTURE: &str = "violation";

/// A rule's query compiled against one grammar.
pub struct CompiledQuery {
    query: Query,
    violation: u32,
}

impl CompiledQuery {
    /// Errors name `rule_id`, so a broken rule is blamed rather than a file.
    pub fn compile(rule_id: &str, grammar: &tree_sitter::Language, source: &str) -> Result<Self> {
        let query = Query::new(grammar, source).map_err(|e| LintError::QueryCompile {
            rule_id: rule_id.to_string(),
            message: e.to_string(),
        })?;
        let violation = query
            .capture_index_for_name(VIOLATION_CAPTURE)
            .ok_or_else(|| LintError::QueryCompile {
                rule_id: rule_id.to_string(),
                message: format!("query has no @{VIOLATION_CAPTURE} capture"),
            })?;
        Ok(Self { query, violation })
    }

    /// Every `@violation` node in `tree`, in document order of discovery.
    /// A node captured by several matches is reported once.
    pub fn run(&self, tree: &Tree, source: &str) -> Vec<Match> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, tree.root_node(), source.as_bytes());
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        while let Some(m) = matches.next() {
            for capture in m.captures.iter().filter(|c| c.index == self.violation) {
                let node = capture.node;
                if seen.insert((node.start_byte(), node.end_byte())) {
                    found.push(node_match(node, source));
                }
            }
        }
        found
    }
}

/// Tree-sitter rows and columns are 0-indexed and columns count bytes;
/// reported positions are 1-indexed and count characters.
fn node_match(node: Node, source: &str) -> Match {
    let start = node.start_position();
    let line_start = node.start_byte() - start.column;
    let column = source
        .get(line_start..node.start_byte())
        .map_or(start.column, |prefix| prefix.chars().count());
    Match {
        line: start.row + 1,
        column: column + 1,
        text: node.utf8_text(source.as_bytes()).unwrap_or("").to_string(),
    }
}
