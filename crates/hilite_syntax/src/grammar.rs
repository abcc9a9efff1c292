//! Immutable highlighting grammar.
//!
//! The grammar is built once at startup and shared by reference (`Arc<Grammar>`) with every open document. It is
//! never mutated afterward, so documents can be scanned on any thread.

use std::collections::HashMap;

use hilite_core::lang::keywords::{self, KeywordId};
use hilite_core::lang::styles::StyleTag;

#[derive(Debug, Clone)]
pub struct Grammar {
    keywords: HashMap<&'static str, KeywordId>,
    contextual: HashMap<&'static str, StyleTag>,
}

impl Grammar {
    /// The C# grammar: reserved keywords are lexical, contextual keywords are left to the semantic overlay.
    pub fn csharp() -> Self {
        let keywords = keywords::KEYWORDS.iter().map(|info| (info.canonical, info.id)).collect();
        let contextual = keywords::CONTEXTUAL_KEYWORDS
            .iter()
            .map(|info| (info.spelling, info.category.style()))
            .collect();
        Self { keywords, contextual }
    }

    pub fn keyword(&self, word: &str) -> Option<KeywordId> {
        self.keywords.get(word).copied()
    }

    /// Style of a contextual keyword, when `word` is one.
    pub fn contextual_style(&self, word: &str) -> Option<StyleTag> {
        self.contextual.get(word).copied()
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::csharp()
    }
}
