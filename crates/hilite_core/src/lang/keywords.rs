//! Define the reserved keyword vocabulary for C# source highlighting.
//!
//! This module is the single source of truth for reserved words: a stable identifier ([`KeywordId`]) plus a
//! const metadata table ([`KEYWORDS`]) that records canonical spellings and categories. The category decides
//! the lexical style a keyword is painted with.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Contextual keywords that are only keywords in some positions (currently `value`) are *not* in [`KEYWORDS`];
//!   they live in [`CONTEXTUAL_KEYWORDS`] and are colored by the semantic overlay instead of the scanner.
//!
//! ## Examples
//! ```rust
//! use hilite_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("namespace"), Some(KeywordId::Namespace));
//! assert_eq!(keywords::as_str(KeywordId::Namespace), "namespace");
//! assert_eq!(keywords::from_str("value"), None);
//! ```

use super::styles::StyleTag;

/// Stable identifier for every reserved keyword.
///
/// The discriminant order matches [`KEYWORDS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Access
    This,
    Base,

    // Operators
    As,
    Is,
    New,
    Sizeof,
    Typeof,
    Stackalloc,

    // Selection
    If,
    Else,
    Switch,
    Case,
    Default,

    // Iteration
    Do,
    For,
    Foreach,
    In,
    While,

    // Jump
    Break,
    Continue,
    Goto,
    Return,
    Yield,

    // Exceptions
    Try,
    Throw,
    Catch,
    Finally,

    // Constants
    True,
    False,
    Null,

    // Modifiers
    Abstract,
    Async,
    Const,
    Event,
    Extern,
    Override,
    Readonly,
    Sealed,
    Static,
    Virtual,
    Volatile,
    Public,
    Protected,
    Private,
    Internal,
    Partial,
    Unsafe,

    // Builtin types
    Bool,
    Byte,
    Char,
    Decimal,
    Double,
    Float,
    Int,
    Long,
    Object,
    Sbyte,
    Short,
    String,
    Uint,
    Ulong,
    Ushort,
    Dynamic,
    Void,

    // Namespaces
    Namespace,
    Using,

    // Declarations
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
    Record,
    Operator,
    Implicit,
    Explicit,

    // Parameters
    Params,
    Ref,
    Out,

    // Accessors
    Get,
    Set,
    Init,
    Add,
    Remove,

    // Other
    Lock,
    Fixed,
    Checked,
    Unchecked,
    Await,
    Where,
}

/// Grouping that decides the lexical style of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    Access,
    Operator,
    Selection,
    Iteration,
    Jump,
    Exception,
    Constant,
    Modifier,
    Type,
    Void,
    Namespace,
    Declaration,
    Parameter,
    Accessor,
    Context,
    Other,
}

impl KeywordCategory {
    /// Style tag painted for keywords of this category.
    pub fn style(self) -> StyleTag {
        match self {
            KeywordCategory::Access => StyleTag::KeywordAccess,
            KeywordCategory::Operator => StyleTag::KeywordOperator,
            KeywordCategory::Selection => StyleTag::KeywordSelection,
            KeywordCategory::Iteration => StyleTag::KeywordIteration,
            KeywordCategory::Jump => StyleTag::KeywordJump,
            KeywordCategory::Exception => StyleTag::KeywordException,
            KeywordCategory::Constant => StyleTag::KeywordConstants,
            KeywordCategory::Modifier => StyleTag::KeywordModifiers,
            KeywordCategory::Type => StyleTag::KeywordType,
            KeywordCategory::Void => StyleTag::KeywordVoid,
            KeywordCategory::Namespace => StyleTag::KeywordNamespace,
            KeywordCategory::Declaration => StyleTag::KeywordDeclaration,
            KeywordCategory::Parameter => StyleTag::KeywordParameter,
            KeywordCategory::Accessor => StyleTag::KeywordProperty,
            KeywordCategory::Context => StyleTag::KeywordContext,
            KeywordCategory::Other => StyleTag::KeywordOther,
        }
    }
}

/// Metadata for a keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
}

/// Metadata for a contextual keyword (a word that is only a keyword in some syntactic positions).
#[derive(Debug, Clone, Copy)]
pub struct ContextualKeywordInfo {
    pub spelling: &'static str,
    pub category: KeywordCategory,
}

/// Registry of all reserved keywords, in [`KeywordId`] discriminant order.
pub const KEYWORDS: &[KeywordInfo] = &[
    // Access
    info(KeywordId::This, "this", KeywordCategory::Access),
    info(KeywordId::Base, "base", KeywordCategory::Access),
    // Operators
    info(KeywordId::As, "as", KeywordCategory::Operator),
    info(KeywordId::Is, "is", KeywordCategory::Operator),
    info(KeywordId::New, "new", KeywordCategory::Operator),
    info(KeywordId::Sizeof, "sizeof", KeywordCategory::Operator),
    info(KeywordId::Typeof, "typeof", KeywordCategory::Operator),
    info(KeywordId::Stackalloc, "stackalloc", KeywordCategory::Operator),
    // Selection
    info(KeywordId::If, "if", KeywordCategory::Selection),
    info(KeywordId::Else, "else", KeywordCategory::Selection),
    info(KeywordId::Switch, "switch", KeywordCategory::Selection),
    info(KeywordId::Case, "case", KeywordCategory::Selection),
    info(KeywordId::Default, "default", KeywordCategory::Selection),
    // Iteration
    info(KeywordId::Do, "do", KeywordCategory::Iteration),
    info(KeywordId::For, "for", KeywordCategory::Iteration),
    info(KeywordId::Foreach, "foreach", KeywordCategory::Iteration),
    info(KeywordId::In, "in", KeywordCategory::Iteration),
    info(KeywordId::While, "while", KeywordCategory::Iteration),
    // Jump
    info(KeywordId::Break, "break", KeywordCategory::Jump),
    info(KeywordId::Continue, "continue", KeywordCategory::Jump),
    info(KeywordId::Goto, "goto", KeywordCategory::Jump),
    info(KeywordId::Return, "return", KeywordCategory::Jump),
    info(KeywordId::Yield, "yield", KeywordCategory::Jump),
    // Exceptions
    info(KeywordId::Try, "try", KeywordCategory::Exception),
    info(KeywordId::Throw, "throw", KeywordCategory::Exception),
    info(KeywordId::Catch, "catch", KeywordCategory::Exception),
    info(KeywordId::Finally, "finally", KeywordCategory::Exception),
    // Constants
    info(KeywordId::True, "true", KeywordCategory::Constant),
    info(KeywordId::False, "false", KeywordCategory::Constant),
    info(KeywordId::Null, "null", KeywordCategory::Constant),
    // Modifiers
    info(KeywordId::Abstract, "abstract", KeywordCategory::Modifier),
    info(KeywordId::Async, "async", KeywordCategory::Modifier),
    info(KeywordId::Const, "const", KeywordCategory::Modifier),
    info(KeywordId::Event, "event", KeywordCategory::Modifier),
    info(KeywordId::Extern, "extern", KeywordCategory::Modifier),
    info(KeywordId::Override, "override", KeywordCategory::Modifier),
    info(KeywordId::Readonly, "readonly", KeywordCategory::Modifier),
    info(KeywordId::Sealed, "sealed", KeywordCategory::Modifier),
    info(KeywordId::Static, "static", KeywordCategory::Modifier),
    info(KeywordId::Virtual, "virtual", KeywordCategory::Modifier),
    info(KeywordId::Volatile, "volatile", KeywordCategory::Modifier),
    info(KeywordId::Public, "public", KeywordCategory::Modifier),
    info(KeywordId::Protected, "protected", KeywordCategory::Modifier),
    info(KeywordId::Private, "private", KeywordCategory::Modifier),
    info(KeywordId::Internal, "internal", KeywordCategory::Modifier),
    info(KeywordId::Partial, "partial", KeywordCategory::Modifier),
    info(KeywordId::Unsafe, "unsafe", KeywordCategory::Modifier),
    // Builtin types
    info(KeywordId::Bool, "bool", KeywordCategory::Type),
    info(KeywordId::Byte, "byte", KeywordCategory::Type),
    info(KeywordId::Char, "char", KeywordCategory::Type),
    info(KeywordId::Decimal, "decimal", KeywordCategory::Type),
    info(KeywordId::Double, "double", KeywordCategory::Type),
    info(KeywordId::Float, "float", KeywordCategory::Type),
    info(KeywordId::Int, "int", KeywordCategory::Type),
    info(KeywordId::Long, "long", KeywordCategory::Type),
    info(KeywordId::Object, "object", KeywordCategory::Type),
    info(KeywordId::Sbyte, "sbyte", KeywordCategory::Type),
    info(KeywordId::Short, "short", KeywordCategory::Type),
    info(KeywordId::String, "string", KeywordCategory::Type),
    info(KeywordId::Uint, "uint", KeywordCategory::Type),
    info(KeywordId::Ulong, "ulong", KeywordCategory::Type),
    info(KeywordId::Ushort, "ushort", KeywordCategory::Type),
    info(KeywordId::Dynamic, "dynamic", KeywordCategory::Type),
    info(KeywordId::Void, "void", KeywordCategory::Void),
    // Namespaces
    info(KeywordId::Namespace, "namespace", KeywordCategory::Namespace),
    info(KeywordId::Using, "using", KeywordCategory::Namespace),
    // Declarations
    info(KeywordId::Class, "class", KeywordCategory::Declaration),
    info(KeywordId::Interface, "interface", KeywordCategory::Declaration),
    info(KeywordId::Struct, "struct", KeywordCategory::Declaration),
    info(KeywordId::Enum, "enum", KeywordCategory::Declaration),
    info(KeywordId::Delegate, "delegate", KeywordCategory::Declaration),
    info(KeywordId::Record, "record", KeywordCategory::Declaration),
    info(KeywordId::Operator, "operator", KeywordCategory::Declaration),
    info(KeywordId::Implicit, "implicit", KeywordCategory::Declaration),
    info(KeywordId::Explicit, "explicit", KeywordCategory::Declaration),
    // Parameters
    info(KeywordId::Params, "params", KeywordCategory::Parameter),
    info(KeywordId::Ref, "ref", KeywordCategory::Parameter),
    info(KeywordId::Out, "out", KeywordCategory::Parameter),
    // Accessors
    info(KeywordId::Get, "get", KeywordCategory::Accessor),
    info(KeywordId::Set, "set", KeywordCategory::Accessor),
    info(KeywordId::Init, "init", KeywordCategory::Accessor),
    info(KeywordId::Add, "add", KeywordCategory::Accessor),
    info(KeywordId::Remove, "remove", KeywordCategory::Accessor),
    // Other
    info(KeywordId::Lock, "lock", KeywordCategory::Other),
    info(KeywordId::Fixed, "fixed", KeywordCategory::Other),
    info(KeywordId::Checked, "checked", KeywordCategory::Other),
    info(KeywordId::Unchecked, "unchecked", KeywordCategory::Other),
    info(KeywordId::Await, "await", KeywordCategory::Other),
    info(KeywordId::Where, "where", KeywordCategory::Other),
];

/// Contextual keywords colored by the semantic overlay rather than the scanner.
pub const CONTEXTUAL_KEYWORDS: &[ContextualKeywordInfo] = &[ContextualKeywordInfo {
    spelling: "value",
    category: KeywordCategory::Context,
}];

/// Canonical spelling.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Category of a keyword.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// Lexical style of a keyword.
pub fn style_of(id: KeywordId) -> StyleTag {
    info_for(id).category.style()
}

/// Metadata lookup.
///
/// ## Notes
/// - Indexes [`KEYWORDS`] by discriminant; the registry guardrail tests pin the ordering.
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    &KEYWORDS[id as usize]
}

/// Lookup by spelling.
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling is a reserved keyword.
/// - `None` otherwise, including for contextual keywords.
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == s).map(|k| k.id)
}

/// Lookup a contextual keyword by spelling.
pub fn contextual(s: &str) -> Option<&'static ContextualKeywordInfo> {
    CONTEXTUAL_KEYWORDS.iter().find(|k| k.spelling == s)
}

/// Check whether a keyword can start or appear in a type position (`int`, `string`, `void`, ...).
pub fn is_type_keyword(id: KeywordId) -> bool {
    matches!(category(id), KeywordCategory::Type | KeywordCategory::Void)
}

/// Check whether a keyword is a declaration modifier (`public`, `static`, ...).
pub fn is_modifier(id: KeywordId) -> bool {
    category(id) == KeywordCategory::Modifier && id != KeywordId::Event
}

// --- helpers -----------------------------------------------------------------

const fn info(id: KeywordId, canonical: &'static str, category: KeywordCategory) -> KeywordInfo {
    KeywordInfo { id, canonical, category }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_contextual_only() {
        assert_eq!(from_str("value"), None);
        let info = contextual("value").unwrap();
        assert_eq!(info.category.style(), StyleTag::KeywordContext);
    }

    #[test]
    fn test_type_keywords() {
        assert!(is_type_keyword(KeywordId::Int));
        assert!(is_type_keyword(KeywordId::Void));
        assert!(!is_type_keyword(KeywordId::Class));
    }

    #[test]
    fn test_event_is_not_a_plain_modifier() {
        assert!(is_modifier(KeywordId::Static));
        assert!(!is_modifier(KeywordId::Event));
    }
}
