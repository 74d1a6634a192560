use indexmap::IndexMap;

use crate::value::Value;

/// A last-in-first-out stack of lexical scopes, modeled on the reference
/// implementation's `ScopedChainDict`. Lookup walks the stack from the most
/// recently pushed frame to the oldest, returning the first match.
///
/// The dialect implemented here has no grammar production that pushes a
/// frame (no `let` form), so in practice this stack stays empty for the
/// lifetime of an evaluation; it is kept as public API so a grammar
/// extension could use it without further plumbing.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<IndexMap<String, Value>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push_scope(&mut self, frame: IndexMap<String, Value>) {
        self.frames.push(frame);
    }

    pub fn pop_scope(&mut self) -> Option<IndexMap<String, Value>> {
        self.frames.pop()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
