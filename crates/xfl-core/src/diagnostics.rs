use std::collections::HashSet;
use tracing::warn;

/// What a de-duplicated warning is about.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WarnKey {
    MissingSymbol(String),
    MissingBitmap(String),
    SymbolRecursion(String),
    UnknownColor(String),
}

/// Remembers which data-quality problems were already reported, so each one
/// is logged once per player rather than once per frame.
#[derive(Debug, Default)]
pub struct WarnOnce {
    seen: HashSet<WarnKey>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `key` the first time it is seen. Returns whether it was logged.
    pub fn warn(&mut self, key: WarnKey) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        match &key {
            WarnKey::MissingSymbol(name) => warn!(symbol = %name, "symbol not found, instance skipped"),
            WarnKey::MissingBitmap(name) => warn!(bitmap = %name, "bitmap not found, nothing drawn"),
            WarnKey::SymbolRecursion(name) => {
                warn!(symbol = %name, "symbol nesting too deep or self-referencing, branch skipped")
            }
            WarnKey::UnknownColor(color) => {
                warn!(color = %color, "color syntax not recognised, passed through to the surface")
            }
        }
        self.seen.insert(key);
        true
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
