#![forbid(unsafe_code)]
//! Incremental C# highlighting engine.
//!
//! Lexical highlighting, preprocessor state and the outline parser live in `hilite_syntax`. This crate adds the
//! semantic layer on top: a background semantic pass per reparse, per-line segment indexes built from its
//! model, and a renderer that merges both into the styles an editor paints.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Render path**: never fails. Anything unexpected while consulting a segment index or model falls back to the
//!   lexical style.

pub mod cli;
pub mod config;
pub mod error;
pub mod reactor;
pub mod render;
pub mod segment_index;
pub mod semantic;
pub mod session;

pub use config::{BuildConfiguration, HighlightSettings};
pub use error::{HighlightError, HighlightResult};
pub use reactor::{PassOutcome, SemanticReactor};
pub use render::{ChunkRenderer, StyledChunk};
pub use segment_index::{LineSegments, SegmentIndex, StyledSegment};
pub use session::{DocumentSession, EngineContext, Workbench};
