//! Front-end for the Diamant language: lexer, parser, and scope/liveness
//! annotator. The three stages are deliberately decoupled — each has its own
//! error type in [`error::Error`] — so a caller can stop at whichever stage
//! it needs (tokens, a raw AST, or the fully annotated one).

pub mod annotator;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::{Error, Position};

/// Tokenizes `source` to completion, stopping at the first lex error.
pub fn lex(source: &str) -> Result<Vec<lexer::Token>, Error> {
    lexer::tokenize(source).map_err(Error::from)
}

/// Lexes and parses `source` into a validated, unannotated AST.
pub fn parse(source: &str) -> Result<parser::Node<()>, Error> {
    parser::parse(source).map_err(Error::from)
}

/// Lexes, parses, and annotates `source` with scope and access-tag info.
pub fn annotate(source: &str) -> Result<parser::Node<annotator::Annotation>, Error> {
    let ast = parse(source)?;
    annotator::annotate(ast).map_err(Error::from)
}
