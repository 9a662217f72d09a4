use regex::Regex;

use super::Match;

/// Byte offsets of line starts, for offset -> (line, column) lookups.
pub struct LineIndex<'s> {
    source: &'s str,
    starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    pub fn new(source: &'s str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, starts }
    }

    /// 1-indexed line and character column of a byte offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let start = self.starts[line];
        let column = self.source[start..offset].chars().count();
        (line + 1, column + 1)
    }
}

/// One match per non-overlapping occurrence, located at its start offset.
/// A match spanning several lines is reported once, on its first line.
pub fn find_matches(pattern: &Regex, source: &str) -> Vec<Match> {
    let index = LineIndex::new(source);
    pattern
        .find_iter(source)
        .map(|m| {
            let (line, column) = index.position(m.start());
            Match {
                line,
                column,
                text: m.as_str().to_string(),
            }
        })
        .collect()
}
