use std::fmt;

use super::source::{InputPosition, InputSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorKind {
    #[display(fmt = "syntax error")]
    Syntax,
    #[display(fmt = "undefined identifier")]
    UndefinedId,
    #[display(fmt = "calling a non-function")]
    CallingNonFunction,
    #[display(fmt = "array element type mismatch")]
    ArrayElementTypeMismatch,
    #[display(fmt = "unknown member name")]
    UnknownMemberName,
    #[display(fmt = "duplicate binding")]
    DuplicateBinding,
    #[display(fmt = "type mismatch")]
    TypeMismatch,
    #[display(fmt = "internal error")]
    InternalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Info,
    Error,
}

/// One message of an error, optionally tied to a place in the source. The
/// `context` holds the source line once the error is attached to a source.
#[derive(Debug, Clone)]
pub struct ErrorStatement {
    pub(crate) statement_kind: StatementKind,
    pub(crate) position: Option<InputPosition>,
    pub(crate) context: String,
    pub(crate) message: String,
}

impl ErrorStatement {
    fn new(statement_kind: StatementKind, position: Option<InputPosition>, message: String) -> Self {
        Self { statement_kind, position, context: String::new(), message }
    }

    fn attach_source(&mut self, source: &InputSource) {
        if let Some(position) = self.position {
            self.context = source.line_at(position);
        }
    }
}

impl fmt::Display for ErrorStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.statement_kind {
            StatementKind::Info => write!(f, " INFO: ")?,
            StatementKind::Error => write!(f, "ERROR: ")?,
        }
        writeln!(f, "{}", &self.message)?;

        let position = match self.position {
            Some(position) => position,
            None => return Ok(()),
        };
        writeln!(f, " +- at {}", position)?;
        if self.context.is_empty() {
            return Ok(());
        }

        // Source line, then a caret under the offending column
        writeln!(f, " | ")?;
        writeln!(f, " | {}", self.context)?;
        let mut arrow = String::with_capacity(self.context.len() + 3);
        arrow.push_str(" | ");
        for (char_col, char) in self.context.chars().enumerate() {
            if char_col + 1 == position.column() {
                break;
            }
            arrow.push(if char == '\t' { '\t' } else { ' ' });
        }
        arrow.push('^');
        writeln!(f, "{}", arrow)
    }
}

/// Error produced while lexing, parsing, analyzing or evaluating a program.
/// Everything except `InternalError` is a problem with the program itself.
#[derive(Debug, Clone)]
pub struct Error {
    pub(crate) kind: ErrorKind,
    pub(crate) statements: Vec<ErrorStatement>,
}

impl Error {
    pub fn new<S: ToString>(kind: ErrorKind, msg: S) -> Self {
        Self { kind, statements: vec![ErrorStatement::new(StatementKind::Error, None, msg.to_string())] }
    }

    pub fn new_at<S: ToString>(kind: ErrorKind, position: InputPosition, msg: S) -> Self {
        Self {
            kind,
            statements: vec![ErrorStatement::new(StatementKind::Error, Some(position), msg.to_string())],
        }
    }

    pub fn internal<S: ToString>(msg: S) -> Self {
        Self::new(ErrorKind::InternalError, msg)
    }

    pub fn with_postfixed_info<S: ToString>(mut self, position: Option<InputPosition>, msg: S) -> Self {
        self.statements.push(ErrorStatement::new(StatementKind::Info, position, msg.to_string()));
        self
    }

    /// Fills in the source lines the statements point at.
    pub fn with_source(mut self, source: &InputSource) -> Self {
        for statement in self.statements.iter_mut() {
            statement.attach_source(source);
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.statements[0].message
    }

    pub fn position(&self) -> Option<InputPosition> {
        self.statements[0].position
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::InternalError
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        for statement in self.statements.iter() {
            statement.fmt(f)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
