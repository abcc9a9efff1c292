//! The set of preprocessor symbols a condition is evaluated against.

use std::collections::HashSet;

/// Defined preprocessor symbols.
///
/// Built from the active build configuration and extended by `#define` records on the span stack. Each
/// evaluation works on its own snapshot; nothing mutates a set while a condition is being evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinedSymbolSet {
    symbols: HashSet<String>,
}

impl DefinedSymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.symbols.insert(name.into())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.symbols.remove(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.symbols.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S: Into<String>> FromIterator<S> for DefinedSymbolSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().map(Into::into).collect(),
        }
    }
}
