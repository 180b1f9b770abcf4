use lazy_static::lazy_static;

use crate::common::*;
use super::source::{InputPosition, InputSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum LexemeKind {
    Number,
    Name,
    Assign,
    Plus,
    Minus,
    Star,
    Comma,
    Dot,
    PipeArrow,
    Semicolon,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
}

#[derive(Debug, Clone)]
pub(crate) struct Lexeme {
    pub kind: LexemeKind,
    pub text: String,
    pub position: InputPosition,
}

lazy_static! {
    static ref OPERATORS: HashMap<&'static [u8], LexemeKind> = hashmap! {
        &b":="[..] => LexemeKind::Assign,
        &b"|>"[..] => LexemeKind::PipeArrow,
        &b"+"[..] => LexemeKind::Plus,
        &b"-"[..] => LexemeKind::Minus,
        &b"*"[..] => LexemeKind::Star,
        &b","[..] => LexemeKind::Comma,
        &b"."[..] => LexemeKind::Dot,
        &b";"[..] => LexemeKind::Semicolon,
        &b"("[..] => LexemeKind::OpenParen,
        &b")"[..] => LexemeKind::CloseParen,
        &b"["[..] => LexemeKind::OpenBracket,
        &b"]"[..] => LexemeKind::CloseBracket,
        &b"{"[..] => LexemeKind::OpenCurly,
        &b"}"[..] => LexemeKind::CloseCurly,
    };
}

fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_identifier_remaining(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Splits the source into lexemes. Whitespace and `#` line comments are
/// skipped.
pub(crate) fn lex(source: &mut InputSource) -> Result<Vec<Lexeme>, Error> {
    let mut lexemes = Vec::new();

    loop {
        consume_whitespace_and_comments(source);
        let c = match source.next() {
            Some(c) => c,
            None => break,
        };
        let position = source.pos();

        if c.is_ascii_digit() {
            consume_number(source);
            lexemes.push(Lexeme {
                kind: LexemeKind::Number,
                text: String::from_utf8_lossy(source.section(position)).to_string(),
                position,
            });
        } else if is_identifier_start(c) {
            while source.next().map_or(false, is_identifier_remaining) {
                source.consume();
            }
            lexemes.push(Lexeme {
                kind: LexemeKind::Name,
                text: String::from_utf8_lossy(source.section(position)).to_string(),
                position,
            });
        } else {
            let kind = match source.lookahead(1).and_then(|d| OPERATORS.get(&[c, d][..])) {
                Some(kind) => {
                    source.consume();
                    source.consume();
                    *kind
                },
                None => match OPERATORS.get(&[c][..]) {
                    Some(kind) => {
                        source.consume();
                        *kind
                    },
                    None => {
                        return Err(Error::new_at(
                            ErrorKind::Syntax, position,
                            format!("unexpected character '{}'", c as char),
                        ));
                    },
                },
            };
            lexemes.push(Lexeme {
                kind,
                text: String::from_utf8_lossy(source.section(position)).to_string(),
                position,
            });
        }
    }

    Ok(lexemes)
}

fn consume_whitespace_and_comments(source: &mut InputSource) {
    loop {
        match source.next() {
            Some(c) if c.is_ascii_whitespace() => source.consume(),
            Some(b'#') => {
                while source.next().map_or(false, |c| c != b'\n') {
                    source.consume();
                }
            },
            _ => return,
        }
    }
}

/// Digits with an optional fractional part. A dot only belongs to the number
/// when a digit follows it, so `1.f` stays a pipe into `f`.
fn consume_number(source: &mut InputSource) {
    while source.next().map_or(false, |c| c.is_ascii_digit()) {
        source.consume();
    }
    if source.next() == Some(b'.') && source.lookahead(1).map_or(false, |c| c.is_ascii_digit()) {
        source.consume();
        while source.next().map_or(false, |c| c.is_ascii_digit()) {
            source.consume();
        }
    }
}
