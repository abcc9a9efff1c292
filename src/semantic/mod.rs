//! Semantic layer: models, the outline binder, the per-line overlay and the unresolved-name visitor.
//!
//! Nothing in here touches a segment index owned by a session. The background pass produces a model and a task
//! list; the render path turns the model into segments on demand.

pub mod binder;
pub mod model;
pub mod overlay;
pub mod tasks;

pub use binder::{OutlineModel, OutlineModelProvider};
pub use model::{DocumentSnapshot, ModelProvider, SemanticModel, SymbolInfo, SymbolKind};
pub use overlay::{build_line_overlay, classify};
pub use tasks::{QuickTask, Severity, collect_quick_tasks};
