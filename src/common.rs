//! Common types shared across the front end and the interpreter

use serde::{Deserialize, Serialize};

/// Remaining stack below which recursive walkers switch to a fresh segment
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each extra stack segment
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Run `f`, first moving to a heap-allocated stack segment if the current
/// one is nearly exhausted
///
/// Every recursive walk over guest-controlled structure (parsing, evaluation,
/// printing, comparison) goes through here, so nesting is limited by the
/// depth caps and not by the host thread's stack size.
pub fn ensure_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, f)
}

/// Byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `pos`
    pub fn point(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}
