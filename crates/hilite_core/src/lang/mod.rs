//! Highlighting vocabulary registries.
//!
//! Callers work with **stable IDs** (`KeywordId`, `DirectiveId`, `StyleTag`) and look up spellings and
//! metadata via registry tables instead of comparing strings ad hoc.
//!
//! ## Notes
//! - Registries are **pure**: no AST types, no IO, no side effects.
//! - The scanner enforces syntax; registries only provide spellings and metadata.
//!
//! ## Examples
//! ```rust
//! use hilite_core::lang::keywords::{self, KeywordId};
//! use hilite_core::lang::styles::StyleTag;
//!
//! assert_eq!(keywords::from_str("foreach"), Some(KeywordId::Foreach));
//! assert_eq!(keywords::style_of(KeywordId::Foreach), StyleTag::KeywordIteration);
//! ```

pub mod directives;
pub mod keywords;
pub mod styles;
