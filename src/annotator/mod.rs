//! Scope resolution, closure capture, and access-tag annotation.
//!
//! Walks a validated [`Node<()>`] and produces a [`Node<Annotation>`]: every
//! `var` resolves against a nested [`Scope`], every function definition gets
//! a closure environment (the free variables its clauses read), and every
//! binding gets a final [`ActionTag`] recording how it is last used. The
//! walk is bottom-up for the varset (a container's varset is the merge of
//! its children's) and does two extra passes per closing scope — clause or
//! `do` — to mark last/first access once the whole region has been seen.

mod access;
pub mod error;
mod scope;

use indexmap::IndexMap;

pub use error::AnnotatorError;

use crate::error::Position;
use crate::parser::{Kind, Node};
use access::mark_access_tags;
use error::{PatternMatchOnFunction, UndefinedVariable};
use scope::{Scope, ScopeEntry};

/// Ordered name -> action-tag mapping. A container node's varset is the
/// multiset union of its children's, merging a name's tags so that `bind`
/// and `access` on the same name collapse to `access` (a binding read
/// somewhere in its own defining construct is, from the outside, just
/// another access of that name).
pub type Varset = IndexMap<String, ActionTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ActionTag {
    /// Introduces the name (a pattern occurrence).
    Bind,
    /// Bound but never read before its scope closed.
    Discard,
    /// An ordinary read, not (yet) known to be the last or first one.
    Access,
    /// The first read of the name within its defining construct.
    First,
    /// The last read of the name within its defining construct.
    Last,
    /// Both the first and the last (and therefore only) read.
    Only,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Annotation {
    pub varset: Varset,
    /// Set only on `Var` nodes; `None` everywhere else.
    pub action: Option<ActionTag>,
    /// Set only on `FuncDef` nodes: the closure's free-variable set.
    pub env: Option<Varset>,
}

impl Annotation {
    fn empty() -> Self {
        Annotation::default()
    }
}

/// Annotates a validated program. The root node is always a `Kind::Do`
/// (the whole program's entries wrapped into one block by the parser).
pub fn annotate(node: Node<()>) -> Result<Node<Annotation>, AnnotatorError> {
    let mut scope = Scope::new();
    annotate_do(node, &mut scope)
}

fn merge_varset(into: &mut Varset, other: Varset) {
    for (name, tag) in other {
        into.entry(name).and_modify(|existing| *existing = merge_tag(*existing, tag)).or_insert(tag);
    }
}

fn merge_tag(a: ActionTag, b: ActionTag) -> ActionTag {
    match (a, b) {
        (ActionTag::Access, _) | (_, ActionTag::Access) => ActionTag::Access,
        _ => a,
    }
}

fn union_varsets(nodes: &[Node<Annotation>]) -> Varset {
    let mut out = Varset::new();
    for n in nodes {
        merge_varset(&mut out, n.info.varset.clone());
    }
    out
}

fn single_varset(name: &str, tag: ActionTag) -> Varset {
    let mut v = Varset::new();
    v.insert(name.to_string(), tag);
    v
}

fn leaf(line: usize, column: usize, kind: Kind<Annotation>) -> Node<Annotation> {
    Node::new(line, column, Annotation::empty(), kind)
}

fn annotate_do(node: Node<()>, scope: &mut Scope) -> Result<Node<Annotation>, AnnotatorError> {
    let Node { line, column, kind, .. } = node;
    let Kind::Do { seq, defs } = kind else {
        unreachable!("annotate_do is only ever called on a Kind::Do node")
    };

    scope.push();
    for name in defs.keys() {
        scope.bind_function(name);
    }

    // A function's clauses are resolved against this scope before `seq` has
    // actually run, so a closure that captures a sibling `x = ...` binding
    // must see that name already known regardless of source order (the
    // spec's closure-capture scenario). But that forward visibility is for
    // closure-capture resolution only — it must not leak into how `seq`
    // resolves its own entries, or plain sibling bindings used before their
    // own assignment would stop being rejected (no letrec). So the lookahead
    // names live in a frame pushed on top just for the defs loop, and are
    // gone again before `seq` is annotated for real.
    scope.push();
    for entry in &seq {
        if let Kind::Assign { left, .. } = &entry.kind {
            let mut names = Vec::new();
            collect_pattern_names(left, &mut names);
            for name in names {
                if !defs.contains_key(&name) {
                    scope.bind_variable(&name);
                }
            }
        }
    }

    let mut annotated_defs: IndexMap<String, Node<Annotation>> = IndexMap::new();
    for (name, def_node) in defs {
        let annotated = annotate_funcdef(def_node, scope)?;
        let env = annotated.info.env.clone().unwrap_or_default();
        scope.set_function_env(&name, env);
        annotated_defs.insert(name, annotated);
    }
    scope.pop();

    let mut annotated_seq = Vec::with_capacity(seq.len());
    for entry in seq {
        annotated_seq.push(annotate_seq_entry(entry, scope)?);
    }

    let local_names = scope.current_names();
    scope.pop();

    // The last-access search (see `access::mark_access_tags`) has to be able
    // to land inside a function body — a name captured only by a sibling
    // closure is "last used" there, not at any call site in `seq`. Wrap
    // `seq`+`defs` into one region so the shared `Kind::Do` traversal rule
    // can walk into both, then unwrap it again afterward.
    let mut search_varset = union_varsets(&annotated_seq);
    for def in annotated_defs.values() {
        merge_varset(&mut search_varset, def.info.varset.clone());
    }
    let mut region = Node::new(
        line,
        column,
        Annotation { varset: search_varset, action: None, env: None },
        Kind::Do { seq: annotated_seq, defs: annotated_defs },
    );
    let warnings = mark_access_tags(std::slice::from_mut(&mut region), &local_names);
    for w in &warnings {
        log::warn!("{w}");
    }
    let Node {
        kind: Kind::Do { seq: annotated_seq, defs: mut annotated_defs },
        ..
    } = region
    else {
        unreachable!()
    };

    // `env` was captured in `annotate_funcdef`, before this pass ran, so a
    // captured name's tag there is still whatever it was pre-retag (usually
    // `access`). Re-derive it from the actual (now-mutated) occurrences in
    // the def's own clauses so a sole capture reads `last`, not `access`.
    for def in annotated_defs.values_mut() {
        refresh_funcdef_env(def);
    }

    let mut varset = union_varsets(&annotated_seq);
    for def in annotated_defs.values() {
        merge_varset(&mut varset, def.info.varset.clone());
    }
    for name in &local_names {
        varset.shift_remove(name);
    }

    Ok(Node::new(
        line,
        column,
        Annotation { varset, action: None, env: None },
        Kind::Do { seq: annotated_seq, defs: annotated_defs },
    ))
}

fn annotate_funcdef(node: Node<()>, scope: &mut Scope) -> Result<Node<Annotation>, AnnotatorError> {
    let Node { line, column, kind, .. } = node;
    let Kind::FuncDef { name, arity, clauses } = kind else {
        unreachable!("do.defs values are always Kind::FuncDef")
    };
    let mut annotated_clauses = Vec::with_capacity(clauses.len());
    for clause in clauses {
        annotated_clauses.push(annotate_clause(clause, scope)?);
    }
    let env = union_varsets(&annotated_clauses);
    Ok(Node::new(
        line,
        column,
        Annotation { varset: env.clone(), action: None, env: Some(env) },
        Kind::FuncDef { name, arity, clauses: annotated_clauses },
    ))
}

/// Shared by case alternatives and function clauses: push a fresh scope,
/// bind the patterns into it, annotate the body, then pop and mark access
/// tags for everything bound directly in this clause.
fn annotate_clause(node: Node<()>, scope: &mut Scope) -> Result<Node<Annotation>, AnnotatorError> {
    let Node { line, column, kind, .. } = node;
    let Kind::Clause { pats, body } = kind else {
        unreachable!("case/function clauses are always Kind::Clause")
    };

    scope.push();
    let mut annotated_pats = Vec::with_capacity(pats.len());
    for pat in pats {
        annotated_pats.push(annotate_pattern(pat, scope)?);
    }
    let annotated_body = annotate_expr(*body, scope)?;
    let local_names = scope.current_names();
    scope.pop();

    let mut search_varset = annotated_body.info.varset.clone();
    merge_varset(&mut search_varset, union_varsets(&annotated_pats));
    let mut clause_node = Node::new(
        line,
        column,
        Annotation { varset: search_varset, action: None, env: None },
        Kind::Clause { pats: annotated_pats, body: Box::new(annotated_body) },
    );
    let warnings = mark_access_tags(std::slice::from_mut(&mut clause_node), &local_names);
    for w in &warnings {
        log::warn!("{w}");
    }

    let Kind::Clause { pats, body } = &clause_node.kind else {
        unreachable!()
    };
    let mut varset = body.info.varset.clone();
    merge_varset(&mut varset, union_varsets(pats));
    for name in &local_names {
        varset.shift_remove(name);
    }
    clause_node.info.varset = varset;
    Ok(clause_node)
}

fn annotate_seq_entry(entry: Node<()>, scope: &mut Scope) -> Result<Node<Annotation>, AnnotatorError> {
    let Node { line, column, kind, .. } = entry;
    match kind {
        Kind::Assign { left, right } => {
            let annotated_right = annotate_expr(*right, scope)?;
            let annotated_left = annotate_pattern(*left, scope)?;
            let mut varset = annotated_left.info.varset.clone();
            merge_varset(&mut varset, annotated_right.info.varset.clone());
            Ok(Node::new(
                line,
                column,
                Annotation { varset, action: None, env: None },
                Kind::Assign { left: Box::new(annotated_left), right: Box::new(annotated_right) },
            ))
        }
        other => annotate_expr(Node::new(line, column, (), other), scope),
    }
}

fn annotate_entry(node: Node<()>, scope: &mut Scope) -> Result<Node<Annotation>, AnnotatorError> {
    let Node { line, column, kind, .. } = node;
    let Kind::Entry { key, value } = kind else {
        unreachable!("dict/dictup elements are always Kind::Entry")
    };
    let key = annotate_expr(*key, scope)?;
    let value = annotate_expr(*value, scope)?;
    let mut varset = key.info.varset.clone();
    merge_varset(&mut varset, value.info.varset.clone());
    Ok(Node::new(
        line,
        column,
        Annotation { varset, action: None, env: None },
        Kind::Entry { key: Box::new(key), value: Box::new(value) },
    ))
}

fn annotate_pattern_entry(node: Node<()>, scope: &mut Scope) -> Result<Node<Annotation>, AnnotatorError> {
    let Node { line, column, kind, .. } = node;
    let Kind::Entry { key, value } = kind else {
        unreachable!("dict/dictup elements are always Kind::Entry")
    };
    let key = annotate_pattern(*key, scope)?;
    let value = annotate_pattern(*value, scope)?;
    let mut varset = key.info.varset.clone();
    merge_varset(&mut varset, value.info.varset.clone());
    Ok(Node::new(
        line,
        column,
        Annotation { varset, action: None, env: None },
        Kind::Entry { key: Box::new(key), value: Box::new(value) },
    ))
}

/// Purely syntactic: the set of names a pattern would bind, with no scope
/// interaction. Used only to pre-declare a `do`'s seq-level bindings before
/// its function definitions are resolved against them.
fn collect_pattern_names(node: &Node<()>, out: &mut Vec<String>) {
    match &node.kind {
        Kind::Var(name) => out.push(name.clone()),
        Kind::Array(elems) => elems.iter().for_each(|e| collect_pattern_names(e, out)),
        Kind::Dict(entries) => entries.iter().for_each(|e| collect_pattern_names(e, out)),
        Kind::Entry { key, value } => {
            collect_pattern_names(key, out);
            collect_pattern_names(value, out);
        }
        Kind::DictUp { subj, entries } => {
            collect_pattern_names(subj, out);
            entries.iter().for_each(|e| collect_pattern_names(e, out));
        }
        Kind::Binary { left, right, .. } => {
            collect_pattern_names(left, out);
            collect_pattern_names(right, out);
        }
        Kind::Assign { left, right } => {
            collect_pattern_names(left, out);
            collect_pattern_names(right, out);
        }
        _ => {}
    }
}

/// Re-derives a function definition's closure environment from the actual
/// tags its captured names carry after the enclosing `do`'s access-tag pass
/// has run. `annotate_funcdef` fills `env` in before that pass exists to
/// run, so without this the env would report every capture as a plain
/// `access` even when it turns out to be the closure's last (or only) read.
fn refresh_funcdef_env(def: &mut Node<Annotation>) {
    let Some(old_env) = def.info.env.clone() else { return };
    let mut refreshed = Varset::new();
    {
        let Kind::FuncDef { clauses, .. } = &def.kind else {
            unreachable!("do.defs values are always Kind::FuncDef")
        };
        for name in old_env.keys() {
            let mut tags = Vec::new();
            for clause in clauses {
                collect_var_tags(clause, name, &mut tags);
            }
            let best = tags.into_iter().max_by_key(|t| tag_rank(*t)).unwrap_or(ActionTag::Access);
            refreshed.insert(name.clone(), best);
        }
    }
    def.info.env = Some(refreshed.clone());
    def.info.varset = refreshed;
}

/// Every tag a name's `Var` occurrences carry within `node`, in no
/// particular order; used to pick the most specific one (see [`tag_rank`]).
fn collect_var_tags(node: &Node<Annotation>, name: &str, out: &mut Vec<ActionTag>) {
    if let Kind::Var(n) = &node.kind {
        if n == name {
            if let Some(tag) = node.info.action {
                out.push(tag);
            }
        }
    }
    match &node.kind {
        Kind::Var(_) | Kind::Lit(_) | Kind::Regex(_) => {}
        Kind::Array(elems) | Kind::Dict(elems) => {
            for e in elems {
                collect_var_tags(e, name, out);
            }
        }
        Kind::Entry { key, value } => {
            collect_var_tags(key, name, out);
            collect_var_tags(value, name, out);
        }
        Kind::DictUp { subj, entries } => {
            collect_var_tags(subj, name, out);
            for e in entries {
                collect_var_tags(e, name, out);
            }
        }
        Kind::Apply { func, args } => {
            collect_var_tags(func, name, out);
            for a in args {
                collect_var_tags(a, name, out);
            }
        }
        Kind::Case { subj, clauses } => {
            collect_var_tags(subj, name, out);
            for c in clauses {
                collect_var_tags(c, name, out);
            }
        }
        Kind::Clause { pats, body } => {
            for p in pats {
                collect_var_tags(p, name, out);
            }
            collect_var_tags(body, name, out);
        }
        Kind::If { cond, then_branch, else_branch } => {
            collect_var_tags(cond, name, out);
            collect_var_tags(then_branch, name, out);
            collect_var_tags(else_branch, name, out);
        }
        Kind::Do { seq, defs } => {
            for e in seq {
                collect_var_tags(e, name, out);
            }
            for d in defs.values() {
                collect_var_tags(d, name, out);
            }
        }
        Kind::FuncDef { clauses, .. } => {
            for c in clauses {
                collect_var_tags(c, name, out);
            }
        }
        Kind::Binary { left, right, .. } => {
            collect_var_tags(left, name, out);
            collect_var_tags(right, name, out);
        }
        Kind::Unary { right, .. } => collect_var_tags(right, name, out),
        Kind::Assign { left, right } => {
            collect_var_tags(left, name, out);
            collect_var_tags(right, name, out);
        }
    }
}

fn tag_rank(tag: ActionTag) -> u8 {
    match tag {
        ActionTag::Only => 5,
        ActionTag::Last => 4,
        ActionTag::First => 3,
        ActionTag::Discard => 2,
        ActionTag::Access => 1,
        ActionTag::Bind => 0,
    }
}

fn annotate_all<F>(items: Vec<Node<()>>, scope: &mut Scope, f: F) -> Result<Vec<Node<Annotation>>, AnnotatorError>
where
    F: Fn(Node<()>, &mut Scope) -> Result<Node<Annotation>, AnnotatorError>,
{
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(f(item, scope)?);
    }
    Ok(out)
}

/// Resolves a `var` node standing in expression position: an ordinary
/// binding reads as a single access; a function reads as an access of every
/// name its closure captures (each of which must already be bound in an
/// enclosing scope).
fn annotate_var(line: usize, column: usize, name: String, scope: &mut Scope) -> Result<Node<Annotation>, AnnotatorError> {
    let pos = Position::new(line, column);
    match scope.lookup(&name) {
        None => Err(AnnotatorError::UndefinedVariable(
            UndefinedVariable { variable_name: name },
            pos,
        )),
        Some(ScopeEntry::Variable) => Ok(Node::new(
            line,
            column,
            Annotation { varset: single_varset(&name, ActionTag::Access), action: Some(ActionTag::Access), env: None },
            Kind::Var(name),
        )),
        Some(ScopeEntry::Function(env)) => {
            let env = env.clone();
            let mut varset = Varset::new();
            for captured_name in env.keys() {
                if scope.lookup(captured_name).is_none() {
                    return Err(AnnotatorError::UndefinedVariable(
                        UndefinedVariable { variable_name: captured_name.clone() },
                        pos,
                    ));
                }
                varset.insert(captured_name.clone(), ActionTag::Access);
            }
            Ok(Node::new(line, column, Annotation { varset, action: Some(ActionTag::Access), env: None }, Kind::Var(name)))
        }
    }
}

/// Annotates a node standing in expression position. `Assign` and `Regex`
/// are unreachable here: `parser::validate` already rejected any occurrence
/// outside a `do`-sequence entry / pattern before the annotator ever runs.
fn annotate_expr(node: Node<()>, scope: &mut Scope) -> Result<Node<Annotation>, AnnotatorError> {
    let Node { line, column, kind, .. } = node;
    match kind {
        Kind::Lit(v) => Ok(leaf(line, column, Kind::Lit(v))),
        Kind::Regex(_) => unreachable!("validated: regex never reaches expression position"),
        Kind::Assign { .. } => unreachable!("validated: '=' never reaches expression position"),
        Kind::Var(name) => annotate_var(line, column, name, scope),
        Kind::Array(elems) => {
            let out = annotate_all(elems, scope, annotate_expr)?;
            let varset = union_varsets(&out);
            Ok(Node::new(line, column, Annotation { varset, action: None, env: None }, Kind::Array(out)))
        }
        Kind::Dict(entries) => {
            let out = annotate_all(entries, scope, annotate_entry)?;
            let varset = union_varsets(&out);
            Ok(Node::new(line, column, Annotation { varset, action: None, env: None }, Kind::Dict(out)))
        }
        Kind::DictUp { subj, entries } => {
            let subj = annotate_expr(*subj, scope)?;
            let entries = annotate_all(entries, scope, annotate_entry)?;
            let mut varset = subj.info.varset.clone();
            merge_varset(&mut varset, union_varsets(&entries));
            Ok(Node::new(
                line,
                column,
                Annotation { varset, action: None, env: None },
                Kind::DictUp { subj: Box::new(subj), entries },
            ))
        }
        Kind::Apply { func, args } => {
            let func = annotate_expr(*func, scope)?;
            let args = annotate_all(args, scope, annotate_expr)?;
            let mut varset = func.info.varset.clone();
            merge_varset(&mut varset, union_varsets(&args));
            Ok(Node::new(
                line,
                column,
                Annotation { varset, action: None, env: None },
                Kind::Apply { func: Box::new(func), args },
            ))
        }
        Kind::Case { subj, clauses } => {
            let subj = annotate_expr(*subj, scope)?;
            let mut annotated_clauses = Vec::with_capacity(clauses.len());
            for clause in clauses {
                annotated_clauses.push(annotate_clause(clause, scope)?);
            }
            let mut varset = subj.info.varset.clone();
            merge_varset(&mut varset, union_varsets(&annotated_clauses));
            Ok(Node::new(
                line,
                column,
                Annotation { varset, action: None, env: None },
                Kind::Case { subj: Box::new(subj), clauses: annotated_clauses },
            ))
        }
        Kind::Clause { .. } => unreachable!("clauses are annotated via annotate_clause"),
        Kind::If { cond, then_branch, else_branch } => {
            let cond = annotate_expr(*cond, scope)?;
            let then_branch = annotate_expr(*then_branch, scope)?;
            let else_branch = annotate_expr(*else_branch, scope)?;
            let mut varset = cond.info.varset.clone();
            merge_varset(&mut varset, then_branch.info.varset.clone());
            merge_varset(&mut varset, else_branch.info.varset.clone());
            Ok(Node::new(
                line,
                column,
                Annotation { varset, action: None, env: None },
                Kind::If { cond: Box::new(cond), then_branch: Box::new(then_branch), else_branch: Box::new(else_branch) },
            ))
        }
        Kind::Do { seq, defs } => annotate_do(Node::new(line, column, (), Kind::Do { seq, defs }), scope),
        Kind::FuncDef { .. } => unreachable!("function definitions are annotated via annotate_funcdef"),
        Kind::Binary { op, left, right } => {
            let left = annotate_expr(*left, scope)?;
            let right = annotate_expr(*right, scope)?;
            let mut varset = left.info.varset.clone();
            merge_varset(&mut varset, right.info.varset.clone());
            Ok(Node::new(
                line,
                column,
                Annotation { varset, action: None, env: None },
                Kind::Binary { op, left: Box::new(left), right: Box::new(right) },
            ))
        }
        Kind::Unary { op, right } => {
            let right = annotate_expr(*right, scope)?;
            let varset = right.info.varset.clone();
            Ok(Node::new(line, column, Annotation { varset, action: None, env: None }, Kind::Unary { op, right: Box::new(right) }))
        }
    }
}

/// Annotates a node standing in pattern position: every `var` binds a fresh
/// name into `scope` rather than resolving one.
fn annotate_pattern(node: Node<()>, scope: &mut Scope) -> Result<Node<Annotation>, AnnotatorError> {
    let Node { line, column, kind, .. } = node;
    let pos = Position::new(line, column);
    match kind {
        Kind::Var(name) => {
            if matches!(scope.lookup(&name), Some(ScopeEntry::Function(_))) {
                return Err(AnnotatorError::PatternMatchOnFunction(
                    PatternMatchOnFunction { variable_name: name },
                    pos,
                ));
            }
            scope.bind_variable(&name);
            Ok(Node::new(
                line,
                column,
                Annotation { varset: single_varset(&name, ActionTag::Bind), action: Some(ActionTag::Bind), env: None },
                Kind::Var(name),
            ))
        }
        Kind::Lit(v) => Ok(leaf(line, column, Kind::Lit(v))),
        Kind::Regex(r) => Ok(leaf(line, column, Kind::Regex(r))),
        Kind::Array(elems) => {
            let out = annotate_all(elems, scope, annotate_pattern)?;
            let varset = union_varsets(&out);
            Ok(Node::new(line, column, Annotation { varset, action: None, env: None }, Kind::Array(out)))
        }
        Kind::Dict(entries) => {
            let out = annotate_all(entries, scope, annotate_pattern_entry)?;
            let varset = union_varsets(&out);
            Ok(Node::new(line, column, Annotation { varset, action: None, env: None }, Kind::Dict(out)))
        }
        Kind::DictUp { subj, entries } => {
            let subj = annotate_pattern(*subj, scope)?;
            let entries = annotate_all(entries, scope, annotate_pattern_entry)?;
            let mut varset = subj.info.varset.clone();
            merge_varset(&mut varset, union_varsets(&entries));
            Ok(Node::new(
                line,
                column,
                Annotation { varset, action: None, env: None },
                Kind::DictUp { subj: Box::new(subj), entries },
            ))
        }
        Kind::Binary { op, left, right } => {
            let left = annotate_pattern(*left, scope)?;
            let right = annotate_pattern(*right, scope)?;
            let mut varset = left.info.varset.clone();
            merge_varset(&mut varset, right.info.varset.clone());
            Ok(Node::new(
                line,
                column,
                Annotation { varset, action: None, env: None },
                Kind::Binary { op, left: Box::new(left), right: Box::new(right) },
            ))
        }
        Kind::Assign { left, right } => {
            let left = annotate_pattern(*left, scope)?;
            let right = annotate_pattern(*right, scope)?;
            let mut varset = left.info.varset.clone();
            merge_varset(&mut varset, right.info.varset.clone());
            Ok(Node::new(
                line,
                column,
                Annotation { varset, action: None, env: None },
                Kind::Assign { left: Box::new(left), right: Box::new(right) },
            ))
        }
        other => unreachable!("validate_pattern rejects {} in pattern position", other.syntax()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn annotated(src: &str) -> Node<Annotation> {
        annotate(parse(src).expect("parses")).expect("annotates")
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let err = annotate(parse("x + 1").unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "1:1: Undefined variable x");
    }

    #[test]
    fn last_access_is_unique_and_bind_stays_bind() {
        let tree = annotated("x = 1\nx + x");
        let Kind::Do { seq, .. } = &tree.kind else { panic!() };
        let Kind::Assign { left, .. } = &seq[0].kind else { panic!() };
        assert_eq!(left.info.action, Some(ActionTag::Bind));
        let Kind::Binary { left, right, .. } = &seq[1].kind else { panic!() };
        assert_eq!(left.info.action, Some(ActionTag::First));
        assert_eq!(right.info.action, Some(ActionTag::Last));
    }

    #[test]
    fn single_use_is_only() {
        let tree = annotated("x = 1\nx");
        let Kind::Do { seq, .. } = &tree.kind else { panic!() };
        let Kind::Var(_) = &seq[1].kind else { panic!() };
        assert_eq!(seq[1].info.action, Some(ActionTag::Only));
    }

    #[test]
    fn unused_binding_is_discarded() {
        let tree = annotated("x = 1\n2");
        let Kind::Do { seq, .. } = &tree.kind else { panic!() };
        let Kind::Assign { left, .. } = &seq[0].kind else { panic!() };
        assert_eq!(left.info.action, Some(ActionTag::Discard));
    }

    #[test]
    fn closure_capture_resolves_against_enclosing_scope() {
        // Spec scenario 4: the function appears between the variable it
        // captures and the call site, and still resolves.
        let tree = annotated("do y = 42 ; f(x) = x + y ; f(1) end");
        let Kind::Do { seq, .. } = &tree.kind else { panic!() };
        let Kind::Do { defs, seq: inner_seq, .. } = &seq[0].kind else { panic!() };
        let f = &defs["f"];
        assert_eq!(f.info.env.as_ref().unwrap().get("y"), Some(&ActionTag::Last));
        let Kind::Assign { left, .. } = &inner_seq[0].kind else { panic!() };
        assert_eq!(left.info.action, Some(ActionTag::Bind));
    }

    #[test]
    fn ordinary_forward_reference_among_siblings_is_still_undefined() {
        // No letrec: a plain `seq` binding used before its own `=` is an
        // error, even though a sibling closure may legally forward-capture
        // the same kind of binding (see `closure_capture_...` above).
        let err = annotate(parse("do x = y ; y = 1 end").unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "1:8: Undefined variable y");
    }

    #[test]
    fn pattern_matching_on_a_function_is_rejected() {
        let err = annotate(parse("f() = 1\nf = 2\nf").unwrap()).unwrap_err();
        assert!(matches!(err, AnnotatorError::PatternMatchOnFunction(..)));
    }

    #[test]
    fn function_clause_arity_and_pattern_bound_params() {
        let tree = annotated("add(a, b) = a + b\nadd(1, 2)");
        let Kind::Do { defs, .. } = &tree.kind else { panic!() };
        let Kind::FuncDef { clauses, .. } = &defs["add"].kind else { panic!() };
        let Kind::Clause { pats, body } = &clauses[0].kind else { panic!() };
        assert_eq!(pats.len(), 2);
        assert!(matches!(&body.kind, Kind::Binary { .. }));
    }
}
