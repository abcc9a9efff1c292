//! Per-line semantic overlay.
//!
//! [`build_line_overlay`] walks the part of the model's tree that overlaps one line and records a styled segment
//! for every classifiable name on it. The result is cached per line by the session and discarded whole on the
//! next published model.

use hilite_core::lang::styles::StyleTag;
use hilite_syntax::ast::Span;
use hilite_syntax::{NodeKind, SyntaxNode, TypeKind, WalkControl};

use super::model::{SemanticModel, SymbolInfo, SymbolKind};
use crate::segment_index::SegmentIndex;

fn type_style(kind: TypeKind) -> StyleTag {
    match kind {
        TypeKind::Class | TypeKind::Record => StyleTag::UserTypes,
        TypeKind::Struct => StyleTag::UserValueTypes,
        TypeKind::Interface => StyleTag::UserInterfaces,
        TypeKind::Enum => StyleTag::UserEnums,
        TypeKind::Delegate => StyleTag::UserDelegates,
    }
}

/// Style for a name node given what it resolved to.
pub fn classify(node: &SyntaxNode, symbol: Option<&SymbolInfo>) -> Option<StyleTag> {
    match node.kind {
        NodeKind::ContextualKeyword => return Some(StyleTag::KeywordContext),
        NodeKind::TypeDeclaration(kind) => return Some(type_style(kind)),
        // `var` only reads as a keyword when no type named `var` is in scope
        NodeKind::TypeReference if symbol.is_none() && node.name_text() == Some("var") => {
            return Some(StyleTag::KeywordType);
        }
        _ => {}
    }

    let symbol = symbol?;
    let declaration = node.kind.is_declaration();
    let pick = |decl: StyleTag, usage: StyleTag| if declaration { decl } else { usage };
    let style = match symbol.kind {
        SymbolKind::Namespace => return None,
        SymbolKind::Class => StyleTag::UserTypes,
        SymbolKind::Struct => StyleTag::UserValueTypes,
        SymbolKind::Interface => StyleTag::UserInterfaces,
        SymbolKind::Enum => StyleTag::UserEnums,
        SymbolKind::Delegate => StyleTag::UserDelegates,
        SymbolKind::TypeParameter => StyleTag::UserTypeParameters,
        SymbolKind::Method => pick(StyleTag::MethodDeclaration, StyleTag::MethodUsage),
        SymbolKind::Field | SymbolKind::EnumMember => pick(StyleTag::FieldDeclaration, StyleTag::FieldUsage),
        SymbolKind::Property => pick(StyleTag::PropertyDeclaration, StyleTag::PropertyUsage),
        SymbolKind::Event => pick(StyleTag::EventDeclaration, StyleTag::EventUsage),
        SymbolKind::Parameter => pick(StyleTag::ParameterDeclaration, StyleTag::ParameterUsage),
        SymbolKind::Local => pick(StyleTag::VariableDeclaration, StyleTag::VariableUsage),
    };
    Some(style)
}

/// Segments for every classifiable name intersecting `line`, clipped to it.
#[tracing::instrument(skip_all, fields(line_start = line.start, line_end = line.end))]
pub fn build_line_overlay(model: &dyn SemanticModel, line: Span) -> SegmentIndex {
    let mut index = SegmentIndex::new();
    model.syntax_root().walk(&mut |node| {
        if node.kind != NodeKind::CompilationUnit && !node.span.intersects(line) {
            return WalkControl::SkipChildren;
        }
        if let Some(span) = node.name_span().filter(|span| span.intersects(line)) {
            let symbol = model.symbol_info(node);
            if let Some(style) = classify(node, symbol.as_ref()) {
                index.insert(span.start.max(line.start), span.end.min(line.end), style);
            }
        }
        WalkControl::Continue
    });
    tracing::trace!(segments = index.len(), "line overlay built");
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::binder::OutlineModel;
    use hilite_syntax::outline::parse_outline;
    use hilite_syntax::{DefinedSymbolSet, Grammar};
    use tokio_util::sync::CancellationToken;

    fn model(text: &str) -> OutlineModel {
        let root = parse_outline(text, &Grammar::csharp(), &DefinedSymbolSet::new());
        OutlineModel::bind(root, &CancellationToken::new()).unwrap()
    }

    fn styles(index: &SegmentIndex, text: &str) -> Vec<(String, StyleTag)> {
        index
            .iter()
            .map(|segment| (text[segment.start..segment.end].to_string(), segment.style))
            .collect()
    }

    #[test]
    fn test_classify_declaration_vs_usage() {
        let info = SymbolInfo::new("x", SymbolKind::Local, None);
        let decl = SyntaxNode::new(NodeKind::Local, Span::new(0, 1)).with_name("x", Span::new(0, 1));
        let usage = SyntaxNode::reference(NodeKind::IdentifierName, "x", Span::new(4, 5));
        assert_eq!(classify(&decl, Some(&info)), Some(StyleTag::VariableDeclaration));
        assert_eq!(classify(&usage, Some(&info)), Some(StyleTag::VariableUsage));
        assert_eq!(classify(&usage, None), None);
    }

    #[test]
    fn test_classify_var_and_value() {
        let var = SyntaxNode::reference(NodeKind::TypeReference, "var", Span::new(0, 3));
        assert_eq!(classify(&var, None), Some(StyleTag::KeywordType));
        let user_var = SymbolInfo::new("var", SymbolKind::Class, None);
        assert_eq!(classify(&var, Some(&user_var)), Some(StyleTag::UserTypes));

        let value = SyntaxNode::reference(NodeKind::ContextualKeyword, "value", Span::new(0, 5));
        assert_eq!(classify(&value, None), Some(StyleTag::KeywordContext));
    }

    #[test]
    fn test_overlay_is_line_restricted() {
        let text = "class Point {\n  int x;\n  int Get() { return x; }\n}";
        let model = model(text);
        let second = text.find("  int x;").unwrap();
        let line = Span::new(second, second + "  int x;".len());
        let index = build_line_overlay(&model, line);
        assert_eq!(styles(&index, text), vec![("x".to_string(), StyleTag::FieldDeclaration)]);

        let third = text.find("  int Get").unwrap();
        let end = text[third..].find('\n').map_or(text.len(), |i| i + third);
        let index = build_line_overlay(&model, Span::new(third, end));
        assert_eq!(
            styles(&index, text),
            vec![
                ("Get".to_string(), StyleTag::MethodDeclaration),
                ("x".to_string(), StyleTag::FieldUsage),
            ]
        );
    }

    #[test]
    fn test_overlay_types_and_contextual_keywords() {
        let text = "struct S { int v; public int V { set { v = value; } } S Copy() { var s = this; return s; } }";
        let model = model(text);
        let index = build_line_overlay(&model, Span::new(0, text.len()));
        let found = styles(&index, text);
        assert!(found.contains(&("S".to_string(), StyleTag::UserValueTypes)));
        assert!(found.contains(&("V".to_string(), StyleTag::PropertyDeclaration)));
        assert!(found.contains(&("value".to_string(), StyleTag::KeywordContext)));
        assert!(found.contains(&("var".to_string(), StyleTag::KeywordType)));
        assert!(found.contains(&("s".to_string(), StyleTag::VariableDeclaration)));
        assert!(found.contains(&("s".to_string(), StyleTag::VariableUsage)));
    }
}
