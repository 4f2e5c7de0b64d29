//! Annotator failure modes.
//!
//! Mirrors the crate's other stages: a thin enum wrapping per-kind payload
//! structs, each with its own `Display`, so the top-level message stays a
//! one-liner while the payload remains inspectable on its own.

use std::error::Error as StdError;
use std::fmt;

use crate::error::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotatorError {
    UndefinedVariable(UndefinedVariable, Position),
    PatternMatchOnFunction(PatternMatchOnFunction, Position),
}

impl fmt::Display for AnnotatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotatorError::UndefinedVariable(e, pos) => write!(f, "{pos}: {e}"),
            AnnotatorError::PatternMatchOnFunction(e, pos) => write!(f, "{pos}: {e}"),
        }
    }
}

impl StdError for AnnotatorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AnnotatorError::UndefinedVariable(e, _) => Some(e),
            AnnotatorError::PatternMatchOnFunction(e, _) => Some(e),
        }
    }
}

impl AnnotatorError {
    pub fn position(&self) -> Position {
        match self {
            AnnotatorError::UndefinedVariable(_, pos) | AnnotatorError::PatternMatchOnFunction(_, pos) => *pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedVariable {
    pub variable_name: String,
}

impl fmt::Display for UndefinedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Undefined variable {}", self.variable_name)
    }
}

impl StdError for UndefinedVariable {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatchOnFunction {
    pub variable_name: String,
}

impl fmt::Display for PatternMatchOnFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern matching on functions not supported ({})", self.variable_name)
    }
}

impl StdError for PatternMatchOnFunction {}
