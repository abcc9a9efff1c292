//! Precedence-ladder parser for preprocessor conditions.
//!
//! `||` → `&&` → `==`/`!=` → `<`/`<=`/`>`/`>=` → `|` → `^` → `&` → `!` → primary.

use super::ExprError;
use super::lexer::{CondToken, CondTokenKind, tokenize};
use crate::ast::{BinaryOp, CondExpr, Literal, Span, Spanned, UnaryOp};

struct Parser<'a> {
    tokens: &'a [CondToken],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [CondToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Spanned<CondExpr>, ExprError> {
        if self.check(&CondTokenKind::Eof) {
            return Err(ExprError::Empty);
        }
        let expr = self.or_expr()?;
        if !self.check(&CondTokenKind::Eof) {
            return Err(self.unexpected("end of condition"));
        }
        Ok(expr)
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> &CondToken {
        // The stream always ends with Eof and we never advance past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: &CondTokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> &CondToken {
        let index = self.pos.min(self.tokens.len() - 1);
        if !matches!(self.tokens[index].kind, CondTokenKind::Eof) {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    fn match_token(&mut self, kind: &CondTokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &'static str) -> ExprError {
        let token = self.peek();
        ExprError::UnexpectedToken {
            expected,
            found: token.kind.to_string(),
            span: token.span,
        }
    }

    fn binary(left: Spanned<CondExpr>, op: BinaryOp, right: Spanned<CondExpr>) -> Spanned<CondExpr> {
        let span = left.span.merge(right.span);
        Spanned::new(CondExpr::Binary(Box::new(left), op, Box::new(right)), span)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn or_expr(&mut self) -> Result<Spanned<CondExpr>, ExprError> {
        let mut left = self.and_expr()?;
        while self.match_token(&CondTokenKind::OrOr) {
            let right = self.and_expr()?;
            left = Self::binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Spanned<CondExpr>, ExprError> {
        let mut left = self.equality()?;
        while self.match_token(&CondTokenKind::AndAnd) {
            let right = self.equality()?;
            left = Self::binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Spanned<CondExpr>, ExprError> {
        let mut left = self.relational()?;
        loop {
            let op = if self.match_token(&CondTokenKind::EqEq) {
                BinaryOp::Eq
            } else if self.match_token(&CondTokenKind::NotEq) {
                BinaryOp::NotEq
            } else {
                break;
            };
            let right = self.relational()?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn relational(&mut self) -> Result<Spanned<CondExpr>, ExprError> {
        let mut left = self.bit_or()?;
        loop {
            let op = match self.peek().kind {
                CondTokenKind::Lt => BinaryOp::Lt,
                CondTokenKind::LtEq => BinaryOp::LtEq,
                CondTokenKind::Gt => BinaryOp::Gt,
                CondTokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.bit_or()?;
            left = Self::binary(left, op, right);
        }
        Ok(left)
    }

    fn bit_or(&mut self) -> Result<Spanned<CondExpr>, ExprError> {
        let mut left = self.bit_xor()?;
        while self.match_token(&CondTokenKind::Pipe) {
            let right = self.bit_xor()?;
            left = Self::binary(left, BinaryOp::BitOr, right);
        }
        Ok(left)
    }

    fn bit_xor(&mut self) -> Result<Spanned<CondExpr>, ExprError> {
        let mut left = self.bit_and()?;
        while self.match_token(&CondTokenKind::Caret) {
            let right = self.bit_and()?;
            left = Self::binary(left, BinaryOp::BitXor, right);
        }
        Ok(left)
    }

    fn bit_and(&mut self) -> Result<Spanned<CondExpr>, ExprError> {
        let mut left = self.unary()?;
        while self.match_token(&CondTokenKind::Amp) {
            let right = self.unary()?;
            left = Self::binary(left, BinaryOp::BitAnd, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Spanned<CondExpr>, ExprError> {
        if self.check(&CondTokenKind::Bang) {
            let start = self.advance().span.start;
            let operand = self.unary()?;
            let span = Span::new(start, operand.span.end);
            return Ok(Spanned::new(CondExpr::Unary(UnaryOp::Not, Box::new(operand)), span));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Spanned<CondExpr>, ExprError> {
        let token = self.peek().clone();
        let node = match token.kind {
            CondTokenKind::True => CondExpr::Bool(true),
            CondTokenKind::False => CondExpr::Bool(false),
            CondTokenKind::Int(value) => CondExpr::Literal(Literal::Int(value)),
            CondTokenKind::Str(value) => CondExpr::Literal(Literal::Str(value)),
            CondTokenKind::Ident(name) => CondExpr::Ident(name),
            CondTokenKind::LParen => {
                self.advance();
                let inner = self.or_expr()?;
                if !self.check(&CondTokenKind::RParen) {
                    return Err(self.unexpected("')'"));
                }
                let end = self.advance().span.end;
                let span = Span::new(token.span.start, end);
                return Ok(Spanned::new(CondExpr::Paren(Box::new(inner)), span));
            }
            _ => return Err(self.unexpected("a symbol, literal or '('")),
        };
        self.advance();
        Ok(Spanned::new(node, token.span))
    }
}

/// Parse condition text into an expression tree.
///
/// ## Errors
/// Returns an [`ExprError`] for empty input, unknown characters, and malformed or trailing tokens. Spans in
/// the tree and in errors are relative to the start of `text`.
#[tracing::instrument(level = "trace", skip_all, fields(text_len = text.len()))]
pub fn parse_condition(text: &str) -> Result<Spanned<CondExpr>, ExprError> {
    let tokens = tokenize(text)?;
    Parser::new(&tokens).parse()
}
