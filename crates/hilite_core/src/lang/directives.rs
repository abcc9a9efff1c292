//! Define the preprocessor directive vocabulary.
//!
//! Directives are recognized by the line scanner when `#` is the first non-whitespace character of a line
//! outside comments and strings. Only the conditional and symbol directives change scanner state; the rest
//! are painted and otherwise ignored.
//!
//! ## Examples
//! ```rust
//! use hilite_core::lang::directives::{self, DirectiveId, DirectiveKind};
//!
//! assert_eq!(directives::from_str("elif"), Some(DirectiveId::Elif));
//! assert_eq!(directives::kind(DirectiveId::Elif), DirectiveKind::Conditional);
//! ```

/// Stable identifier for every directive.
///
/// The discriminant order matches [`DIRECTIVES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveId {
    If,
    Elif,
    Else,
    Endif,
    Define,
    Undef,
    Region,
    EndRegion,
    Pragma,
    Warning,
    Error,
    Line,
    Nullable,
}

/// What a directive does to scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// Opens, continues or closes a conditional block.
    Conditional,
    /// Adds or removes a defined symbol.
    Symbol,
    /// No effect on scanner state.
    Other,
}

/// Metadata for a directive.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveInfo {
    pub id: DirectiveId,
    pub canonical: &'static str,
    pub kind: DirectiveKind,
    /// Whether the directive takes an argument after its name.
    pub takes_argument: bool,
}

/// Registry of all directives, in [`DirectiveId`] discriminant order.
pub const DIRECTIVES: &[DirectiveInfo] = &[
    info(DirectiveId::If, "if", DirectiveKind::Conditional, true),
    info(DirectiveId::Elif, "elif", DirectiveKind::Conditional, true),
    info(DirectiveId::Else, "else", DirectiveKind::Conditional, false),
    info(DirectiveId::Endif, "endif", DirectiveKind::Conditional, false),
    info(DirectiveId::Define, "define", DirectiveKind::Symbol, true),
    info(DirectiveId::Undef, "undef", DirectiveKind::Symbol, true),
    info(DirectiveId::Region, "region", DirectiveKind::Other, true),
    info(DirectiveId::EndRegion, "endregion", DirectiveKind::Other, false),
    info(DirectiveId::Pragma, "pragma", DirectiveKind::Other, true),
    info(DirectiveId::Warning, "warning", DirectiveKind::Other, true),
    info(DirectiveId::Error, "error", DirectiveKind::Other, true),
    info(DirectiveId::Line, "line", DirectiveKind::Other, true),
    info(DirectiveId::Nullable, "nullable", DirectiveKind::Other, true),
];

/// Canonical spelling (without the leading `#`).
pub fn as_str(id: DirectiveId) -> &'static str {
    info_for(id).canonical
}

/// Scanner effect of a directive.
pub fn kind(id: DirectiveId) -> DirectiveKind {
    info_for(id).kind
}

/// Metadata lookup by discriminant.
pub fn info_for(id: DirectiveId) -> &'static DirectiveInfo {
    &DIRECTIVES[id as usize]
}

/// Lookup by directive name (the word after `#`), case-sensitive.
pub fn from_str(s: &str) -> Option<DirectiveId> {
    DIRECTIVES.iter().find(|d| d.canonical == s).map(|d| d.id)
}

const fn info(id: DirectiveId, canonical: &'static str, kind: DirectiveKind, takes_argument: bool) -> DirectiveInfo {
    DirectiveInfo {
        id,
        canonical,
        kind,
        takes_argument,
    }
}
