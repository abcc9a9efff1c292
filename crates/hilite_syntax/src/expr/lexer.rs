//! Tokenizer for preprocessor conditions.

use std::fmt;

use super::ExprError;
use crate::ast::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum CondTokenKind {
    True,
    False,
    Int(i64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    Bang,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Amp,
    Pipe,
    Caret,
    Eof,
}

impl fmt::Display for CondTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CondTokenKind::True => write!(f, "'true'"),
            CondTokenKind::False => write!(f, "'false'"),
            CondTokenKind::Int(v) => write!(f, "'{v}'"),
            CondTokenKind::Str(s) => write!(f, "\"{s}\""),
            CondTokenKind::Ident(name) => write!(f, "'{name}'"),
            CondTokenKind::LParen => write!(f, "'('"),
            CondTokenKind::RParen => write!(f, "')'"),
            CondTokenKind::Bang => write!(f, "'!'"),
            CondTokenKind::AndAnd => write!(f, "'&&'"),
            CondTokenKind::OrOr => write!(f, "'||'"),
            CondTokenKind::EqEq => write!(f, "'=='"),
            CondTokenKind::NotEq => write!(f, "'!='"),
            CondTokenKind::Lt => write!(f, "'<'"),
            CondTokenKind::LtEq => write!(f, "'<='"),
            CondTokenKind::Gt => write!(f, "'>'"),
            CondTokenKind::GtEq => write!(f, "'>='"),
            CondTokenKind::Amp => write!(f, "'&'"),
            CondTokenKind::Pipe => write!(f, "'|'"),
            CondTokenKind::Caret => write!(f, "'^'"),
            CondTokenKind::Eof => write!(f, "end of condition"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondToken {
    pub kind: CondTokenKind,
    pub span: Span,
}

impl CondToken {
    pub fn new(kind: CondTokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    tokens: Vec<CondToken>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            tokens: Vec::new(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<CondToken>, ExprError> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }
            self.scan_token()?;
        }
        let end = self.source.len();
        self.tokens.push(CondToken::new(CondTokenKind::Eof, Span::new(end, end)));
        Ok(self.tokens)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.current_pos = pos + c.len_utf8();
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn push(&mut self, kind: CondTokenKind, start: usize) {
        self.tokens.push(CondToken::new(kind, Span::new(start, self.current_pos)));
    }

    fn scan_token(&mut self) -> Result<(), ExprError> {
        let start = self.current_pos;
        let Some(c) = self.advance() else {
            return Ok(());
        };

        let kind = match c {
            '(' => CondTokenKind::LParen,
            ')' => CondTokenKind::RParen,
            '^' => CondTokenKind::Caret,
            '!' => {
                if self.match_char('=') {
                    CondTokenKind::NotEq
                } else {
                    CondTokenKind::Bang
                }
            }
            '=' => {
                if self.match_char('=') {
                    CondTokenKind::EqEq
                } else {
                    return Err(ExprError::UnexpectedChar {
                        ch: '=',
                        span: Span::new(start, self.current_pos),
                    });
                }
            }
            '&' => {
                if self.match_char('&') {
                    CondTokenKind::AndAnd
                } else {
                    CondTokenKind::Amp
                }
            }
            '|' => {
                if self.match_char('|') {
                    CondTokenKind::OrOr
                } else {
                    CondTokenKind::Pipe
                }
            }
            '<' => {
                if self.match_char('=') {
                    CondTokenKind::LtEq
                } else {
                    CondTokenKind::Lt
                }
            }
            '>' => {
                if self.match_char('=') {
                    CondTokenKind::GtEq
                } else {
                    CondTokenKind::Gt
                }
            }
            '"' => self.string(start)?,
            c if c.is_ascii_digit() => self.number(start),
            c if c.is_alphabetic() || c == '_' => self.word(start),
            other => {
                return Err(ExprError::UnexpectedChar {
                    ch: other,
                    span: Span::new(start, self.current_pos),
                });
            }
        };
        self.push(kind, start);
        Ok(())
    }

    fn string(&mut self, start: usize) -> Result<CondTokenKind, ExprError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(CondTokenKind::Str(value)),
                Some(c) => value.push(c),
                None => {
                    return Err(ExprError::UnterminatedString {
                        span: Span::new(start, self.current_pos),
                    });
                }
            }
        }
    }

    fn number(&mut self, start: usize) -> CondTokenKind {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        // Out-of-range integers are still "a non-boolean literal"
        let value = self.source[start..self.current_pos].parse().unwrap_or(i64::MAX);
        CondTokenKind::Int(value)
    }

    fn word(&mut self, start: usize) -> CondTokenKind {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        match &self.source[start..self.current_pos] {
            "true" => CondTokenKind::True,
            "false" => CondTokenKind::False,
            name => CondTokenKind::Ident(name.to_string()),
        }
    }
}

/// Tokenize condition text. The stream always ends with an `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<CondToken>, ExprError> {
    Lexer::new(source).tokenize()
}
