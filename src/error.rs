use std::io;

use thiserror::Error;

use crate::ast::Span;

pub type Result<T> = std::result::Result<T, ShoalError>;

/// Broad failure categories, used to pick the report label and to let the
/// REPL tell "keep reading input" apart from a real error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexer,
    Parser,
    /// Input ended before a construct closed. The REPL keeps accumulating
    /// lines instead of reporting this.
    IncompleteInput,
    Type,
    Resolution,
    Structural,
    Completeness,
    Writability,
    Module,
    Io,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ShoalError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl ShoalError {
    fn new(kind: ErrorKind, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn lexer_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lexer, message, Some(span))
    }

    pub fn parser_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parser, message, Some(span))
    }

    pub fn incomplete_input(span: Span) -> Self {
        Self::new(
            ErrorKind::IncompleteInput,
            "input ended before the construct closed",
            Some(span),
        )
    }

    pub fn type_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message, Some(span))
    }

    pub fn resolution_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolution, message, Some(span))
    }

    pub fn structural_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, message, Some(span))
    }

    pub fn completeness_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Completeness, message, Some(span))
    }

    pub fn writability_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Writability, message, Some(span))
    }

    pub fn module_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Module, message, Some(span))
    }

    pub fn is_incomplete(&self) -> bool {
        self.kind == ErrorKind::IncompleteInput
    }

    /// The single-line report printed by the CLI and the REPL.
    pub fn report(&self, file: &str) -> String {
        let label = match self.kind {
            ErrorKind::Lexer => "LexError",
            ErrorKind::Parser | ErrorKind::IncompleteInput => "ParseError",
            ErrorKind::Io => "IoError",
            _ => "TypecheckError",
        };
        let span = self.span.unwrap_or_default();
        format!(
            "{} in {}, line {} col {} to line {} col {}: {}",
            label,
            file,
            span.start.line,
            span.start.column,
            span.end.line,
            span.end.column,
            self.message
        )
    }
}

impl From<io::Error> for ShoalError {
    fn from(err: io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string(), None)
    }
}
