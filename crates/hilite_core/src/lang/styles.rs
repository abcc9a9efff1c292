//! Define the style tags (color names) produced by the highlighting layers.
//!
//! A style tag is what a chunk of text is finally painted with. The canonical spelling of each tag is the
//! color-scheme key a host editor looks up, e.g. `"User Types(Interfaces)"`.
//!
//! ## Notes
//! - Lexical tags come from the line scanner; semantic tags only ever come from the semantic overlay.
//! - [`StyleLayer`] records which layer may produce a tag. Guardrail tests keep the two layers disjoint.
//!
//! ## Examples
//! ```rust
//! use hilite_core::lang::styles::{self, StyleTag};
//!
//! assert_eq!(StyleTag::ExcludedCode.as_str(), "Excluded Code");
//! assert_eq!(styles::from_str("User Method Usage"), Some(StyleTag::MethodUsage));
//! ```

use std::fmt;

/// Stable identifier for every style tag.
///
/// The discriminant order matches [`STYLE_TAGS`]; see [`info_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleTag {
    // Lexical
    PlainText,
    Punctuation,
    Number,
    String,
    VerbatimString,
    CharLiteral,
    CommentLine,
    CommentBlock,
    CommentDoc,
    CommentTag,
    Link,
    Preprocessor,
    ExcludedCode,
    KeywordAccess,
    KeywordOperator,
    KeywordSelection,
    KeywordIteration,
    KeywordJump,
    KeywordException,
    KeywordConstants,
    KeywordModifiers,
    KeywordType,
    KeywordVoid,
    KeywordNamespace,
    KeywordDeclaration,
    KeywordParameter,
    KeywordProperty,
    KeywordOther,

    // Semantic
    UserTypes,
    UserValueTypes,
    UserInterfaces,
    UserEnums,
    UserTypeParameters,
    UserDelegates,
    MethodUsage,
    MethodDeclaration,
    EventDeclaration,
    EventUsage,
    FieldDeclaration,
    FieldUsage,
    PropertyDeclaration,
    PropertyUsage,
    VariableDeclaration,
    VariableUsage,
    ParameterDeclaration,
    ParameterUsage,
    KeywordContext,
}

/// Which highlighting layer produces a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleLayer {
    /// Produced by the line scanner (keywords, literals, comments, preprocessor state).
    Lexical,
    /// Produced by the semantic overlay from resolved symbols.
    Semantic,
}

/// Metadata for a style tag.
#[derive(Debug, Clone, Copy)]
pub struct StyleInfo {
    pub id: StyleTag,
    pub canonical: &'static str,
    pub layer: StyleLayer,
}

/// Registry of all style tags, in [`StyleTag`] discriminant order.
pub const STYLE_TAGS: &[StyleInfo] = &[
    lexical(StyleTag::PlainText, "Plain Text"),
    lexical(StyleTag::Punctuation, "Punctuation"),
    lexical(StyleTag::Number, "Number"),
    lexical(StyleTag::String, "String"),
    lexical(StyleTag::VerbatimString, "String(Verbatim)"),
    lexical(StyleTag::CharLiteral, "String(Char)"),
    lexical(StyleTag::CommentLine, "Comment(Line)"),
    lexical(StyleTag::CommentBlock, "Comment(Block)"),
    lexical(StyleTag::CommentDoc, "Comment(Doc)"),
    lexical(StyleTag::CommentTag, "Comment Tag"),
    lexical(StyleTag::Link, "Link"),
    lexical(StyleTag::Preprocessor, "Preprocessor"),
    lexical(StyleTag::ExcludedCode, "Excluded Code"),
    lexical(StyleTag::KeywordAccess, "Keyword(Access)"),
    lexical(StyleTag::KeywordOperator, "Keyword(Operator)"),
    lexical(StyleTag::KeywordSelection, "Keyword(Selection)"),
    lexical(StyleTag::KeywordIteration, "Keyword(Iteration)"),
    lexical(StyleTag::KeywordJump, "Keyword(Jump)"),
    lexical(StyleTag::KeywordException, "Keyword(Exception)"),
    lexical(StyleTag::KeywordConstants, "Keyword(Constants)"),
    lexical(StyleTag::KeywordModifiers, "Keyword(Modifiers)"),
    lexical(StyleTag::KeywordType, "Keyword(Type)"),
    lexical(StyleTag::KeywordVoid, "Keyword(Void)"),
    lexical(StyleTag::KeywordNamespace, "Keyword(Namespace)"),
    lexical(StyleTag::KeywordDeclaration, "Keyword(Declaration)"),
    lexical(StyleTag::KeywordParameter, "Keyword(Parameter)"),
    lexical(StyleTag::KeywordProperty, "Keyword(Property)"),
    lexical(StyleTag::KeywordOther, "Keyword(Other)"),
    semantic(StyleTag::UserTypes, "User Types"),
    semantic(StyleTag::UserValueTypes, "User Types(Value types)"),
    semantic(StyleTag::UserInterfaces, "User Types(Interfaces)"),
    semantic(StyleTag::UserEnums, "User Types(Enums)"),
    semantic(StyleTag::UserTypeParameters, "User Types(Type parameters)"),
    semantic(StyleTag::UserDelegates, "User Types(Delegates)"),
    semantic(StyleTag::MethodUsage, "User Method Usage"),
    semantic(StyleTag::MethodDeclaration, "User Method Declaration"),
    semantic(StyleTag::EventDeclaration, "User Event Declaration"),
    semantic(StyleTag::EventUsage, "User Event Usage"),
    semantic(StyleTag::FieldDeclaration, "User Field Declaration"),
    semantic(StyleTag::FieldUsage, "User Field Usage"),
    semantic(StyleTag::PropertyDeclaration, "User Property Declaration"),
    semantic(StyleTag::PropertyUsage, "User Property Usage"),
    semantic(StyleTag::VariableDeclaration, "User Variable Declaration"),
    semantic(StyleTag::VariableUsage, "User Variable Usage"),
    semantic(StyleTag::ParameterDeclaration, "User Parameter Declaration"),
    semantic(StyleTag::ParameterUsage, "User Parameter Usage"),
    semantic(StyleTag::KeywordContext, "Keyword(Context)"),
];

impl StyleTag {
    /// Canonical color-scheme key for this tag.
    pub fn as_str(self) -> &'static str {
        info_for(self).canonical
    }

    /// Layer that produces this tag.
    pub fn layer(self) -> StyleLayer {
        info_for(self).layer
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata lookup.
///
/// ## Notes
/// - Indexes [`STYLE_TAGS`] by discriminant; the registry guardrail tests pin the ordering.
pub fn info_for(id: StyleTag) -> &'static StyleInfo {
    &STYLE_TAGS[id as usize]
}

/// Lookup by canonical spelling (case-sensitive).
pub fn from_str(s: &str) -> Option<StyleTag> {
    STYLE_TAGS.iter().find(|info| info.canonical == s).map(|info| info.id)
}

// --- helpers -----------------------------------------------------------------

const fn lexical(id: StyleTag, canonical: &'static str) -> StyleInfo {
    StyleInfo {
        id,
        canonical,
        layer: StyleLayer::Lexical,
    }
}

const fn semantic(id: StyleTag, canonical: &'static str) -> StyleInfo {
    StyleInfo {
        id,
        canonical,
        layer: StyleLayer::Semantic,
    }
}
