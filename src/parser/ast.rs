//! The parse tree.
//!
//! `Node<A>` is generic over its annotation type, mirroring the staged
//! generic-AST idiom: `A = ()` fresh out of the parser, `A = Annotation`
//! once the annotator has run. A single `Kind<A>` enum covers every
//! `syntax` discriminator from the data model instead of one struct per
//! node kind — validation (`parser::validate`) and the annotator both
//! become total matches over its variants.

use std::fmt;

use indexmap::IndexMap;

use crate::error::Position;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum BinOp {
    And,
    Or,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    Add,
    Sub,
    Concat,
    Merge,
    Mul,
    Div,
    IntDiv,
    Mod,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinOp::*;
        let s = match self {
            And => "and",
            Or => "or",
            Lt => "<",
            Gt => ">",
            Le => "=<",
            Ge => ">=",
            Eq => "==",
            Ne => "!=",
            Add => "+",
            Sub => "-",
            Concat => "~",
            Merge => "@",
            Mul => "*",
            Div => "/",
            IntDiv => "div",
            Mod => "mod",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum UnOp {
    Neg,
    Not,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnOp::Neg => "-",
            UnOp::Not => "not",
        })
    }
}

/// A node's `syntax`-specific fields. Generic over the annotation type `A`
/// carried by every nested `Node<A>`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Kind<A> {
    Lit(Value),
    Var(String),
    Regex(String),
    Array(Vec<Node<A>>),
    /// Each element is a `Kind::Entry`.
    Dict(Vec<Node<A>>),
    Entry {
        key: Box<Node<A>>,
        value: Box<Node<A>>,
    },
    DictUp {
        subj: Box<Node<A>>,
        entries: Vec<Node<A>>,
    },
    Apply {
        func: Box<Node<A>>,
        args: Vec<Node<A>>,
    },
    /// Each clause is a `Kind::Clause`.
    Case {
        subj: Box<Node<A>>,
        clauses: Vec<Node<A>>,
    },
    Clause {
        pats: Vec<Node<A>>,
        body: Box<Node<A>>,
    },
    If {
        cond: Box<Node<A>>,
        then_branch: Box<Node<A>>,
        else_branch: Box<Node<A>>,
    },
    Do {
        seq: Vec<Node<A>>,
        /// Each value is a `Kind::FuncDef`.
        defs: IndexMap<String, Node<A>>,
    },
    FuncDef {
        name: String,
        arity: usize,
        /// Each clause is a `Kind::Clause`.
        clauses: Vec<Node<A>>,
    },
    Binary {
        op: BinOp,
        left: Box<Node<A>>,
        right: Box<Node<A>>,
    },
    Unary {
        op: UnOp,
        right: Box<Node<A>>,
    },
    Assign {
        left: Box<Node<A>>,
        right: Box<Node<A>>,
    },
}

impl<A> Kind<A> {
    pub fn syntax(&self) -> &'static str {
        match self {
            Kind::Lit(_) => "lit",
            Kind::Var(_) => "var",
            Kind::Regex(_) => "regex",
            Kind::Array(_) => "array",
            Kind::Dict(_) => "dict",
            Kind::Entry { .. } => "entry",
            Kind::DictUp { .. } => "dictup",
            Kind::Apply { .. } => "apply",
            Kind::Case { .. } => "case",
            Kind::Clause { .. } => "clause",
            Kind::If { .. } => "if",
            Kind::Do { .. } => "do",
            Kind::FuncDef { .. } => "funcdef",
            Kind::Binary { .. } => "binary",
            Kind::Unary { .. } => "unary",
            Kind::Assign { .. } => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Node<A> {
    pub line: usize,
    pub column: usize,
    pub info: A,
    pub kind: Kind<A>,
}

impl<A> Node<A> {
    pub fn new(line: usize, column: usize, info: A, kind: Kind<A>) -> Self {
        Node {
            line,
            column,
            info,
            kind,
        }
    }

    pub fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

impl Node<()> {
    pub fn fresh(line: usize, column: usize, kind: Kind<()>) -> Self {
        Node::new(line, column, (), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_names_match_data_model_kinds() {
        let n: Node<()> = Node::fresh(1, 1, Kind::Var("x".into()));
        assert_eq!(n.kind.syntax(), "var");
        let n: Node<()> = Node::fresh(1, 1, Kind::Assign {
            left: Box::new(Node::fresh(1, 1, Kind::Var("x".into()))),
            right: Box::new(Node::fresh(1, 1, Kind::Lit(Value::Int(1)))),
        });
        assert_eq!(n.kind.syntax(), "=");
    }
}
