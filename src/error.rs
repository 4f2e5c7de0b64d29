//! Crate-level error plumbing.
//!
//! Each pipeline stage (lexer, parser, annotator) owns its own diagnostic
//! type; this module supplies the shared [`Position`] they all carry and the
//! [`Error`] enum the binary uses to unify them into a single `Result`.

use std::error::Error as StdError;
use std::fmt;

use colored::Colorize;

use crate::annotator::error::AnnotatorError;
use crate::lexer::LexError;
use crate::parser::ParseError;

/// 1-based source position. Tabs advance to the next multiple-of-eight
/// column boundary, per the lexer's column accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }

    /// Renders `message` with the source line this position falls on and a
    /// caret underneath the offending column, for the binary's reporting.
    pub fn render(&self, message: &str, source: &str) -> String {
        let Some(line_text) = source.lines().nth(self.line.saturating_sub(1)) else {
            return message.to_string();
        };
        let caret_pad = " ".repeat(self.column.saturating_sub(1));
        format!("{message}\n{line_text}\n{caret_pad}{}", "^".red().bold())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A diagnostic from any stage of the front-end, carrying enough context for
/// the binary to report it and exit non-zero.
#[derive(Debug)]
pub enum Error {
    Lex(LexError),
    Parse(ParseError),
    Annotate(AnnotatorError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex(e) => write!(f, "{e}"),
            Error::Parse(e) => write!(f, "{e}"),
            Error::Annotate(e) => write!(f, "{e}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Lex(e) => Some(e),
            Error::Parse(e) => Some(e),
            Error::Annotate(e) => Some(e),
        }
    }
}

impl From<LexError> for Error {
    fn from(e: LexError) -> Self {
        Error::Lex(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<AnnotatorError> for Error {
    fn from(e: AnnotatorError) -> Self {
        Error::Annotate(e)
    }
}

impl Error {
    pub fn position(&self) -> Position {
        match self {
            Error::Lex(e) => e.position(),
            Error::Parse(e) => e.position(),
            Error::Annotate(e) => e.position(),
        }
    }
}
