mod code;
mod position;

use once_cell::unsync::OnceCell;

/// Line and column of a byte offset into a source expression (both 1-based).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Source text wrapper that memoizes line-break offsets for diagnostic
/// rendering. Positions are computed on demand and cached.
pub struct Code<'c> {
    pub value: &'c str,
    line_breaks: OnceCell<Vec<usize>>,
}
