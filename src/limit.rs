use std::fmt;

/// Guards the recursion depth of nested `{ ... }` blocks.
///
/// The dispatcher's nested-block handler re-enters `EntryParser::parse_entry`
/// for every `{ ... }` body it finds, and that recursion lives on the Rust
/// call stack. Deeply nested configuration (however unlikely from a human
/// operator) would otherwise be able to exhaust the stack; `DepthTracker`
/// turns that into a reported [`crate::CfgError::RecursionLimit`] instead.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct DepthTracker {
    current: usize,
    /// High-water mark of nesting depth reached so far.
    pub high: usize,
    /// Configured limit.
    pub limit: usize,
}

/// Chosen experimentally along the same lines as upstream recursive-descent
/// parsers: comfortably below where an unoptimized debug build starts
/// smashing the stack, while still far beyond any realistic configuration
/// file's nesting depth.
const DEFAULT_DEPTH_LIMIT: usize = 500;

impl Default for DepthTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH_LIMIT)
    }
}

impl DepthTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    pub fn limited(&self) -> bool {
        self.current > self.limit
    }

    pub fn enter(&mut self) {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
    }

    pub fn exit(&mut self) {
        self.current -= 1;
    }
}

impl fmt::Debug for DepthTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "depth limit: {}, high: {}", self.limit, self.high)
    }
}
