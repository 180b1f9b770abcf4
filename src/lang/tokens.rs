use std::fmt;

use super::source::InputPosition;

/// How many operands a token consumes from the value stack, and on which side
/// of the operator they were written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Nullary,
    LeftUnary,
    RightUnary,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Name,
    Assign,
    Plus,
    Minus,
    Star,
    Comma,
    Call,
    Pipe,
    Member,
    Group,
    Array,
    Sequence,
    BlockBegin,
    BlockEnd,
    End,
}

/// A token of the postfix stream handed to the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub arity: Arity,
    pub text: String,
    pub position: InputPosition,
}

impl Token {
    pub fn new<S: ToString>(kind: TokenKind, arity: Arity, text: S, position: InputPosition) -> Self {
        Self { kind, arity, text: text.to_string(), position }
    }

    pub fn number<S: ToString>(text: S) -> Self {
        Self::new(TokenKind::Number, Arity::Nullary, text, InputPosition::default())
    }

    pub fn name<S: ToString>(text: S) -> Self {
        Self::new(TokenKind::Name, Arity::Nullary, text, InputPosition::default())
    }

    pub fn operator(kind: TokenKind, arity: Arity) -> Self {
        Self::new(kind, arity, String::new(), InputPosition::default())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Number | TokenKind::Name => f.write_str(&self.text),
            TokenKind::Assign => f.write_str(":="),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus if self.arity == Arity::RightUnary => f.write_str("neg"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Call if self.arity == Arity::LeftUnary => f.write_str("apply"),
            TokenKind::Call => f.write_str("call"),
            TokenKind::Pipe => f.write_str("|>"),
            TokenKind::Member => f.write_str("."),
            TokenKind::Group => f.write_str("()"),
            TokenKind::Array => f.write_str("[]"),
            TokenKind::Sequence => f.write_str(";"),
            TokenKind::BlockBegin => f.write_str("{"),
            TokenKind::BlockEnd => f.write_str("}"),
            TokenKind::End => f.write_str("end"),
        }
    }
}
