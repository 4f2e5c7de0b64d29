//! End-to-end scenarios against the public `diamant` API: source text in,
//! tokens/AST/annotated-AST out. Named after the concrete scenarios they
//! exercise.

use pretty_assertions::assert_eq;

use diamant::annotator::ActionTag;
use diamant::lexer::{Op, TokenData};
use diamant::parser::{BinOp, Kind};
use diamant::value::Value;

#[test]
fn division_vs_regex() {
    let tokens = diamant::lex("x / 2 ; y = /a*/").expect("lexes");
    let shape: Vec<(Op, TokenData)> = tokens.iter().map(|t| (t.op, t.data.clone())).collect();
    assert_eq!(
        shape,
        vec![
            (Op::Ident, TokenData::Ident("x".into())),
            (Op::Slash, TokenData::None),
            (Op::Lit, TokenData::Lit(Value::Int(2))),
            (Op::Semi, TokenData::None),
            (Op::Ident, TokenData::Ident("y".into())),
            (Op::Assign, TokenData::None),
            (Op::Regex, TokenData::Regex("a*".into())),
            (Op::Eof, TokenData::None),
        ]
    );
}

#[test]
fn off_side_block() {
    let ast = diamant::parse("do\n  x = 1\n  y = 2\n  x + y").expect("parses");
    let Kind::Do { seq, defs } = &ast.kind else { panic!("program root is always Do") };
    assert_eq!(seq.len(), 1, "single top-level entry: the explicit do-block");
    assert!(defs.is_empty());

    let Kind::Do { seq, defs } = &seq[0].kind else { panic!("expected a nested do") };
    assert!(defs.is_empty());
    assert_eq!(seq.len(), 3);
    assert!(matches!(&seq[0].kind, Kind::Assign { .. }));
    assert!(matches!(&seq[1].kind, Kind::Assign { .. }));
    assert!(matches!(&seq[2].kind, Kind::Binary { op: BinOp::Add, .. }));
}

#[test]
fn function_clauses_grouped() {
    let ast = diamant::parse("f(0) = 42 ; f(n) = n - 1").expect("parses");
    let Kind::Do { defs, .. } = &ast.kind else { panic!() };
    let Kind::FuncDef { name, arity, clauses } = &defs["f"].kind else { panic!() };
    assert_eq!(name, "f");
    assert_eq!(*arity, 1);
    assert_eq!(clauses.len(), 2);

    let Kind::Clause { pats, body } = &clauses[0].kind else { panic!() };
    assert!(matches!(&pats[0].kind, Kind::Lit(Value::Int(0))));
    assert!(matches!(&body.kind, Kind::Lit(Value::Int(42))));

    let Kind::Clause { pats, body } = &clauses[1].kind else { panic!() };
    assert!(matches!(&pats[0].kind, Kind::Var(n) if n == "n"));
    assert!(matches!(&body.kind, Kind::Binary { op: BinOp::Sub, .. }));
}

#[test]
fn closure_capture() {
    let ast = diamant::annotate("do y = 42 ; f(x) = x + y ; f(1) end").expect("annotates");
    let Kind::Do { seq, .. } = &ast.kind else { panic!() };
    let Kind::Do { defs, seq: inner_seq, .. } = &seq[0].kind else { panic!() };

    let f = &defs["f"];
    assert_eq!(f.info.env.as_ref().unwrap().get("y"), Some(&ActionTag::Last));

    let Kind::Assign { left, .. } = &inner_seq[0].kind else { panic!() };
    assert_eq!(left.info.action, Some(ActionTag::Bind));

    let Kind::FuncDef { clauses, .. } = &f.kind else { panic!() };
    let Kind::Clause { body, .. } = &clauses[0].kind else { panic!() };
    let Kind::Binary { right, .. } = &body.kind else { panic!() };
    assert_eq!(right.info.action, Some(ActionTag::Last));
}

#[test]
fn undefined_variable() {
    let err = diamant::annotate("do x = z ; x end").unwrap_err();
    assert_eq!(err.to_string(), "1:8: Undefined variable z");
}

#[test]
fn no_letrec_for_ordinary_bindings() {
    let err = diamant::annotate("do x = y ; y = 1 end").unwrap_err();
    assert_eq!(err.to_string(), "1:8: Undefined variable y");
}

#[test]
fn pattern_rejects_expression_form() {
    let err = diamant::parse("case x of (a + b) -> 0 end").unwrap_err();
    assert_eq!(err.to_string(), "1:14: Unexpected + in pattern context.");
}
