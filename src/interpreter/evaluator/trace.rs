use std::{collections::HashMap, collections::VecDeque, fmt::Write as _, sync::Arc};

use crate::{error::RuntimeError, interpreter::token::Position};

/// Most positions the trace keeps; older entries fall off the bottom.
pub const TRACE_CAPACITY: usize = 64;

/// A bounded stack of the positions of the nodes being evaluated.
#[derive(Debug, Clone, Default)]
pub struct ErrorTrace {
    entries: VecDeque<Position>,
}

impl ErrorTrace {
    /// Records entry into a node at `position`.
    pub fn enter(&mut self, position: &Position) {
        if self.entries.len() == TRACE_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(position.clone());
    }

    /// Records leaving the innermost node.
    pub fn leave(&mut self) {
        self.entries.pop_back();
    }

    /// Attaches the innermost `depth` positions to `error`, innermost first,
    /// unless it already carries a trace.
    #[must_use]
    pub fn attach(&self, mut error: RuntimeError, depth: usize) -> RuntimeError {
        if error.is_untraced() {
            error.trace = self.entries.iter().rev().take(depth).cloned().collect();
            error.trace.dedup();
        }
        error
    }

    /// Current number of recorded positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is being evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source text by file name, for printing the lines an error points at.
///
/// Collects the main program, imported modules and `eval` strings.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: HashMap<Arc<str>, Arc<str>>,
}

impl SourceMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the text of `file`.
    pub fn insert(&mut self, file: &str, source: &str) {
        self.files.insert(Arc::from(file), Arc::from(source));
    }

    /// The 1-indexed `line` of `file`, if known.
    #[must_use]
    pub fn line(&self, file: &str, line: usize) -> Option<&str> {
        self.files.get(file)?.lines().nth(line.checked_sub(1)?)
    }
}

impl RuntimeError {
    /// Renders the error for humans: the `EvaluatorError:` headline, then a
    /// location line and the source line for every traced position.
    ///
    /// # Example
    /// ```
    /// use blue::{error::RuntimeError, interpreter::evaluator::trace::SourceMap};
    ///
    /// let rendered = RuntimeError::name("identifier not found: x").render(&SourceMap::new());
    /// assert_eq!(rendered, "EvaluatorError: NameError: identifier not found: x");
    /// ```
    #[must_use]
    pub fn render(&self, sources: &SourceMap) -> String {
        let mut out = format!("EvaluatorError: {self}");
        for position in &self.trace {
            let _ = write!(out, "\n  at {position}");
            if let Some(text) = sources.line(&position.file, position.line) {
                let _ = write!(out, "\n    {}", text.trim_end());
                let _ = write!(out,
                               "\n    {}^",
                               " ".repeat(position.column.saturating_sub(1)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize) -> Position {
        Position::new(&Arc::from("main"), line, 1)
    }

    #[test]
    fn attaches_innermost_first() {
        let mut trace = ErrorTrace::default();
        trace.enter(&at(1));
        trace.enter(&at(2));
        trace.enter(&at(3));
        let error = trace.attach(RuntimeError::range("index out of bounds"), 2);
        assert_eq!(error.trace, vec![at(3), at(2)]);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut trace = ErrorTrace::default();
        for line in 1..=100 {
            trace.enter(&at(line));
        }
        assert_eq!(trace.len(), TRACE_CAPACITY);
    }

    #[test]
    fn render_points_at_the_column() {
        let mut sources = SourceMap::new();
        sources.insert("main", "var x = 1\nx / 0");
        let mut error = RuntimeError::division_by_zero();
        error.trace = vec![Position::new(&Arc::from("main"), 2, 3)];
        let rendered = error.render(&sources);
        assert!(rendered.contains("at main:2:3"));
        assert!(rendered.contains("    x / 0\n      ^"));
    }
}
