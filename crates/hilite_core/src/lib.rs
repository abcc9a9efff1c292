//! Provide the canonical highlighting vocabulary shared by the `hilite` syntax layer and engine.
//!
//! This crate is intentionally small and dependency-free. It holds registry tables that both the line
//! scanner and the semantic overlay consult, so that spellings and style names are never duplicated as
//! string literals across the workspace.
//!
//! ## Notes
//!
//! - This is a “vocabulary” crate: **no IO**, no global mutable state, and no syntax-tree types.
//! - Current scope: C# reserved keywords, contextual keywords, preprocessor directives, and the style tags
//!   (color names) produced by the lexical and semantic layers.

pub mod lang;
