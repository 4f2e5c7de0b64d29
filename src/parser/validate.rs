//! Post-parse dual validation.
//!
//! Two mutually-aware walks over the shared expression/pattern grammar:
//! `validate_expr` rejects `=` and `regex` everywhere except the positions
//! the data model calls out as legal (a `do`-sequence entry, a function
//! clause's left-hand side); `validate_pattern` rejects every construct that
//! isn't meaningful to match against. Each is a total function over
//! `Kind<A>`'s variants, so an unhandled `syntax` is a compile error rather
//! than a missed runtime check.

use super::ast::{BinOp, Kind, Node, UnOp};
use super::ParseError;

/// Validates a node that must stand in expression position. `do`-sequence
/// entries are validated through [`validate_seq_entry`] instead, since a
/// top-level `=` is legal there.
pub fn validate_expr<A>(node: &Node<A>) -> Result<(), ParseError> {
    match &node.kind {
        Kind::Assign { .. } => Err(ParseError::invalid_context("=", "expression", node.pos())),
        Kind::Regex(_) => Err(ParseError::invalid_context("regex", "expression", node.pos())),
        Kind::Lit(_) | Kind::Var(_) => Ok(()),
        Kind::Array(elems) => elems.iter().try_for_each(validate_expr),
        Kind::Dict(entries) => entries.iter().try_for_each(validate_expr),
        Kind::Entry { key, value } => {
            validate_expr(key)?;
            validate_expr(value)
        }
        Kind::DictUp { subj, entries } => {
            validate_expr(subj)?;
            entries.iter().try_for_each(validate_expr)
        }
        Kind::Apply { func, args } => {
            validate_expr(func)?;
            args.iter().try_for_each(validate_expr)
        }
        Kind::Case { subj, clauses } => {
            validate_expr(subj)?;
            clauses.iter().try_for_each(validate_clause)
        }
        Kind::Clause { .. } => unreachable!("clauses are validated via validate_clause"),
        Kind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            validate_expr(cond)?;
            validate_expr(then_branch)?;
            validate_expr(else_branch)
        }
        Kind::Do { seq, defs } => {
            seq.iter().try_for_each(validate_seq_entry)?;
            defs.values().try_for_each(validate_funcdef)
        }
        Kind::FuncDef { .. } => unreachable!("function definitions are validated via validate_funcdef"),
        Kind::Binary { left, right, .. } => {
            validate_expr(left)?;
            validate_expr(right)
        }
        Kind::Unary { right, .. } => validate_expr(right),
    }
}

/// A `do`-sequence (or top-level-program) entry: `=` is legal here, once,
/// at the outermost level — its right-hand side is an expression, its
/// left-hand side a pattern (the variable or destructuring being bound).
pub fn validate_seq_entry<A>(node: &Node<A>) -> Result<(), ParseError> {
    if let Kind::Assign { left, right } = &node.kind {
        validate_expr(right)?;
        return validate_pattern(left);
    }
    validate_expr(node)
}

fn validate_clause<A>(node: &Node<A>) -> Result<(), ParseError> {
    match &node.kind {
        Kind::Clause { pats, body } => {
            pats.iter().try_for_each(validate_pattern)?;
            validate_expr(body)
        }
        _ => unreachable!("case/function clauses are always Kind::Clause"),
    }
}

fn validate_funcdef<A>(node: &Node<A>) -> Result<(), ParseError> {
    match &node.kind {
        Kind::FuncDef { clauses, .. } => clauses.iter().try_for_each(validate_clause),
        _ => unreachable!("do.defs values are always Kind::FuncDef"),
    }
}

/// Validates a node that must stand in pattern position (a clause's `pats`,
/// or the left-hand side of a binding/match).
pub fn validate_pattern<A>(node: &Node<A>) -> Result<(), ParseError> {
    match &node.kind {
        Kind::Lit(_) | Kind::Var(_) | Kind::Regex(_) => Ok(()),
        Kind::Array(elems) => elems.iter().try_for_each(validate_pattern),
        Kind::Dict(entries) => entries.iter().try_for_each(validate_pattern),
        Kind::Entry { key, value } => {
            validate_pattern(key)?;
            validate_pattern(value)
        }
        Kind::DictUp { subj, entries } => {
            validate_pattern(subj)?;
            entries.iter().try_for_each(validate_pattern)
        }
        Kind::Binary {
            op: BinOp::Concat | BinOp::Merge,
            left,
            right,
        } => {
            validate_pattern(left)?;
            validate_pattern(right)
        }
        Kind::Binary { op, .. } => Err(ParseError::invalid_context(&op.to_string(), "pattern", node.pos())),
        Kind::Unary { op, .. } => Err(ParseError::invalid_context(&op.to_string(), "pattern", node.pos())),
        Kind::Assign { left, right } => {
            validate_pattern(left)?;
            validate_pattern(right)
        }
        Kind::Do { .. } => Err(ParseError::invalid_context("do", "pattern", node.pos())),
        Kind::If { .. } => Err(ParseError::invalid_context("if", "pattern", node.pos())),
        Kind::Case { .. } => Err(ParseError::invalid_context("case", "pattern", node.pos())),
        Kind::Apply { .. } => Err(ParseError::invalid_context("apply", "pattern", node.pos())),
        Kind::Clause { .. } | Kind::FuncDef { .. } => {
            unreachable!("clauses/function definitions never stand in pattern position")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn pattern_rejects_expression_form() {
        let err = parse("case x of (a + b) -> 0 end").unwrap_err();
        assert_eq!(err.to_string(), "1:14: Unexpected + in pattern context.");
    }

    #[test]
    fn regex_rejected_in_expression_context() {
        let err = parse("x = /a/ + 1").unwrap_err();
        assert!(err.to_string().contains("regex"));
    }

    #[test]
    fn top_level_assign_is_allowed() {
        assert!(parse("x = 1").is_ok());
    }
}
