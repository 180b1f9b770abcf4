/// parser.rs
///
/// Binding-power parser turning lexemes into the arity-annotated postfix
/// stream consumed by the analyzer. The expression tree only lives for the
/// duration of `parse`.
///
/// Function application is juxtaposition (`pow x`). A pipe (`x |> f`, or the
/// tighter `x.f`) binds loosely to its left and tightly to its right, so that
/// in `x |> f a` the callee is `f` and `a` becomes an extra argument:
///
/// ```text
/// 2 |> pow 8 |> pow 2   =>   2 pow |> 8 call pow |> 2 call
/// ```
///
/// A pipe that is not followed by an argument is completed by a left-unary
/// call right away, which keeps the callee and the piped value adjacent in
/// the instruction stream.

use crate::common::*;
use super::lexer::{Lexeme, LexemeKind};
use super::source::InputPosition;
use super::tokens::{Arity, Token, TokenKind};

const BP_SEQUENCE: (u8, u8) = (1, 2);
const BP_ASSIGN: (u8, u8) = (4, 3);
const BP_COMMA: (u8, u8) = (5, 6);
const BP_PIPE: (u8, u8) = (7, 17);
const BP_ADDITIVE: (u8, u8) = (9, 10);
const BP_MULTIPLICATIVE: (u8, u8) = (11, 12);
const BP_NEGATE: u8 = 13;
const BP_CALL: (u8, u8) = (15, 16);
const BP_DOT: (u8, u8) = (19, 20);

#[derive(Debug)]
enum Expr {
    Number(String, InputPosition),
    Name(String, InputPosition),
    Negate(Box<Expr>, InputPosition),
    Binary(TokenKind, Box<Expr>, Box<Expr>, InputPosition),
    Pipe { value: Box<Expr>, callee: Box<Expr>, arg: Option<Box<Expr>>, position: InputPosition },
    Member { subject: Box<Expr>, name: String, position: InputPosition },
    Group(Box<Expr>, InputPosition),
    Array(Box<Expr>, InputPosition),
    Block(Box<Expr>, InputPosition, InputPosition),
}

/// `_1`, `_2`, ... name tuple members.
pub(crate) fn is_member_name(name: &str) -> bool {
    name.len() > 1 && name.starts_with('_') && name[1..].bytes().all(|b| b.is_ascii_digit())
}

pub(crate) struct Parser {
    lexemes: Vec<Lexeme>,
    idx: usize,
}

impl Parser {
    pub(crate) fn new(lexemes: Vec<Lexeme>) -> Self {
        Self { lexemes, idx: 0 }
    }

    /// Parses the complete program and returns its postfix form, terminated
    /// by an `End` token.
    pub(crate) fn parse(mut self) -> Result<Vec<Token>, Error> {
        if self.lexemes.is_empty() {
            return Err(Error::new_at(ErrorKind::Syntax, InputPosition::default(), "expected an expression"));
        }

        let expr = self.parse_expr(0)?;
        if let Some(lexeme) = self.peek() {
            return Err(Error::new_at(
                ErrorKind::Syntax, lexeme.position,
                format!("unexpected '{}'", lexeme.text),
            ));
        }

        let end_position = self.lexemes.last().map(|l| l.position).unwrap_or_default();
        let mut tokens = Vec::with_capacity(self.lexemes.len() * 2);
        emit(&expr, &mut tokens);
        tokens.push(Token::new(TokenKind::End, Arity::LeftUnary, "", end_position));
        Ok(tokens)
    }

    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.idx)
    }

    fn expect(&mut self, kind: LexemeKind, what: &str, opened_at: InputPosition) -> Result<InputPosition, Error> {
        match self.peek() {
            Some(lexeme) if lexeme.kind == kind => {
                let position = lexeme.position;
                self.idx += 1;
                Ok(position)
            },
            Some(lexeme) => Err(
                Error::new_at(ErrorKind::Syntax, lexeme.position, format!("expected '{}', found '{}'", what, lexeme.text))
                    .with_postfixed_info(Some(opened_at), "to close the bracket opened here")
            ),
            None => Err(
                Error::new_at(ErrorKind::Syntax, opened_at, format!("missing closing '{}'", what))
            ),
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr, Error> {
        let lexeme = match self.peek() {
            Some(lexeme) => lexeme.clone(),
            None => {
                let position = self.lexemes.last().map(|l| l.position).unwrap_or_default();
                return Err(Error::new_at(ErrorKind::Syntax, position, "expected an expression"));
            },
        };
        self.idx += 1;

        match lexeme.kind {
            LexemeKind::Number => Ok(Expr::Number(lexeme.text, lexeme.position)),
            LexemeKind::Name => Ok(Expr::Name(lexeme.text, lexeme.position)),
            LexemeKind::Minus => {
                let operand = self.parse_expr(BP_NEGATE)?;
                Ok(Expr::Negate(Box::new(operand), lexeme.position))
            },
            LexemeKind::OpenParen => {
                let inner = self.parse_expr(0)?;
                self.expect(LexemeKind::CloseParen, ")", lexeme.position)?;
                Ok(Expr::Group(Box::new(inner), lexeme.position))
            },
            LexemeKind::OpenBracket => {
                let inner = self.parse_expr(0)?;
                self.expect(LexemeKind::CloseBracket, "]", lexeme.position)?;
                Ok(Expr::Array(Box::new(inner), lexeme.position))
            },
            LexemeKind::OpenCurly => {
                let inner = self.parse_expr(0)?;
                let end = self.expect(LexemeKind::CloseCurly, "}", lexeme.position)?;
                Ok(Expr::Block(Box::new(inner), lexeme.position, end))
            },
            _ => Err(Error::new_at(
                ErrorKind::Syntax, lexeme.position,
                format!("expected an expression, found '{}'", lexeme.text),
            )),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, Error> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let lexeme = match self.peek() {
                Some(lexeme) => lexeme.clone(),
                None => break,
            };

            let (kind, (l_bp, r_bp)) = match lexeme.kind {
                LexemeKind::Semicolon => (TokenKind::Sequence, BP_SEQUENCE),
                LexemeKind::Assign => (TokenKind::Assign, BP_ASSIGN),
                LexemeKind::Comma => (TokenKind::Comma, BP_COMMA),
                LexemeKind::PipeArrow => (TokenKind::Pipe, BP_PIPE),
                LexemeKind::Dot => (TokenKind::Pipe, BP_DOT),
                LexemeKind::Plus => (TokenKind::Plus, BP_ADDITIVE),
                LexemeKind::Minus => (TokenKind::Minus, BP_ADDITIVE),
                LexemeKind::Star => (TokenKind::Star, BP_MULTIPLICATIVE),
                LexemeKind::Number | LexemeKind::Name |
                LexemeKind::OpenParen | LexemeKind::OpenBracket | LexemeKind::OpenCurly => {
                    (TokenKind::Call, BP_CALL)
                },
                LexemeKind::CloseParen | LexemeKind::CloseBracket | LexemeKind::CloseCurly => break,
            };
            if l_bp < min_bp {
                break;
            }

            // Juxtaposition has no operator lexeme of its own
            if kind != TokenKind::Call {
                self.idx += 1;
            }

            lhs = match kind {
                TokenKind::Pipe => {
                    if lexeme.kind == LexemeKind::Dot {
                        if let Some(member) = self.peek().filter(|l| l.kind == LexemeKind::Name && is_member_name(&l.text)) {
                            let name = member.text.clone();
                            self.idx += 1;
                            lhs = Expr::Member { subject: Box::new(lhs), name, position: lexeme.position };
                            continue;
                        }
                    }
                    let callee = self.parse_expr(r_bp)?;
                    Expr::Pipe { value: Box::new(lhs), callee: Box::new(callee), arg: None, position: lexeme.position }
                },
                TokenKind::Call => {
                    let arg = self.parse_expr(r_bp)?;
                    match lhs {
                        Expr::Pipe { value, callee, arg: None, position } => {
                            Expr::Pipe { value, callee, arg: Some(Box::new(arg)), position }
                        },
                        lhs => Expr::Binary(TokenKind::Call, Box::new(lhs), Box::new(arg), lexeme.position),
                    }
                },
                kind => {
                    let rhs = self.parse_expr(r_bp)?;
                    Expr::Binary(kind, Box::new(lhs), Box::new(rhs), lexeme.position)
                },
            };
        }

        Ok(lhs)
    }
}

fn emit(expr: &Expr, tokens: &mut Vec<Token>) {
    match expr {
        Expr::Number(text, position) => {
            tokens.push(Token::new(TokenKind::Number, Arity::Nullary, text, *position));
        },
        Expr::Name(text, position) => {
            tokens.push(Token::new(TokenKind::Name, Arity::Nullary, text, *position));
        },
        Expr::Negate(operand, position) => {
            emit(operand, tokens);
            tokens.push(Token::new(TokenKind::Minus, Arity::RightUnary, "-", *position));
        },
        Expr::Binary(kind, lhs, rhs, position) => {
            emit(lhs, tokens);
            emit(rhs, tokens);
            tokens.push(Token::new(*kind, Arity::Binary, "", *position));
        },
        Expr::Pipe { value, callee, arg, position } => {
            emit(value, tokens);
            emit(callee, tokens);
            tokens.push(Token::new(TokenKind::Pipe, Arity::Binary, "|>", *position));
            match arg {
                Some(arg) => {
                    emit(arg, tokens);
                    tokens.push(Token::new(TokenKind::Call, Arity::Binary, "", *position));
                },
                None => {
                    tokens.push(Token::new(TokenKind::Call, Arity::LeftUnary, "", *position));
                },
            }
        },
        Expr::Member { subject, name, position } => {
            emit(subject, tokens);
            tokens.push(Token::new(TokenKind::Name, Arity::Nullary, name, *position));
            tokens.push(Token::new(TokenKind::Member, Arity::Binary, ".", *position));
        },
        Expr::Group(inner, position) => {
            emit(inner, tokens);
            tokens.push(Token::new(TokenKind::Group, Arity::LeftUnary, "()", *position));
        },
        Expr::Array(inner, position) => {
            emit(inner, tokens);
            tokens.push(Token::new(TokenKind::Array, Arity::LeftUnary, "[]", *position));
        },
        Expr::Block(inner, position, end) => {
            tokens.push(Token::new(TokenKind::BlockBegin, Arity::Nullary, "{", *position));
            emit(inner, tokens);
            tokens.push(Token::new(TokenKind::BlockEnd, Arity::LeftUnary, "}", *end));
        },
    }
}
