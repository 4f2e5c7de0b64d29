//! Last-access and first-access marking.
//!
//! A closing construct (a `do`'s sequence, a clause's patterns-and-body)
//! calls [`mark_access_tags`] once it knows which names it bound locally.
//! For each name this locates the *unique* textual occurrence that reads it
//! last (per the per-construct traversal order below) and retags that one
//! `Var` node `last` (or `only`, if the same occurrence is also the first
//! read); every other read of the name stays `access`. A name never read
//! after its binding is retagged `discard` and produces a warning. This
//! search already reaches into a `do`'s `defs` (see the `Do` arm below), so
//! a name captured only by a sibling closure is still "found" there — its
//! occurrence inside the function body gets the `last`/`only` tag, while the
//! binding occurrence itself is untouched and stays `bind`.
//!
//! Locating is done in two passes rather than threaded booleans: find the
//! occurrence's source position, then walk again to patch the one node at
//! that position. Positions are unique per token, so this is unambiguous.

use super::{ActionTag, Annotation};
use crate::parser::{Kind, Node};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

pub fn mark_access_tags(roots: &mut [Node<Annotation>], names: &[String]) -> Vec<String> {
    let mut warnings = Vec::new();
    for name in names {
        match locate(roots, name, Direction::Backward) {
            Some(last_pos) => {
                let first_pos = locate(roots, name, Direction::Forward);
                let is_only = first_pos == Some(last_pos);
                retag_at(roots, name, last_pos, if is_only { ActionTag::Only } else { ActionTag::Last });
                if !is_only {
                    if let Some(first_pos) = first_pos {
                        retag_at(roots, name, first_pos, ActionTag::First);
                    }
                }
            }
            None => {
                if let Some(pos) = find_bind_occurrence(roots, name) {
                    retag_at(roots, name, pos, ActionTag::Discard);
                    if !name.starts_with('_') {
                        warnings.push(format!("variable '{name}' is bound but never accessed"));
                    }
                }
            }
        }
    }
    warnings
}

fn locate(nodes: &[Node<Annotation>], name: &str, dir: Direction) -> Option<crate::error::Position> {
    let indices: Box<dyn Iterator<Item = &Node<Annotation>>> = match dir {
        Direction::Forward => Box::new(nodes.iter()),
        Direction::Backward => Box::new(nodes.iter().rev()),
    };
    for node in indices {
        if node.info.varset.contains_key(name) {
            if let Some(pos) = locate_within(node, name, dir) {
                return Some(pos);
            }
        }
    }
    None
}

fn locate_within(node: &Node<Annotation>, name: &str, dir: Direction) -> Option<crate::error::Position> {
    match &node.kind {
        // A binding occurrence isn't a read: it never qualifies as a first
        // or last *access*, only as the fallback `find_bind_occurrence`
        // target when a name is never read at all.
        Kind::Var(n) if n == name && !matches!(node.info.action, Some(ActionTag::Bind)) => Some(node.pos()),
        Kind::Var(_) | Kind::Lit(_) | Kind::Regex(_) => None,
        Kind::Array(elems) | Kind::Dict(elems) => locate(elems, name, dir),
        Kind::Entry { key, value } => match dir {
            Direction::Backward => locate_within(value, name, dir).or_else(|| locate_within(key, name, dir)),
            Direction::Forward => locate_within(key, name, dir).or_else(|| locate_within(value, name, dir)),
        },
        Kind::DictUp { subj, entries } => match dir {
            Direction::Backward => locate(entries, name, dir).or_else(|| locate_within(subj, name, dir)),
            Direction::Forward => locate_within(subj, name, dir).or_else(|| locate(entries, name, dir)),
        },
        Kind::Apply { func, args } => match dir {
            Direction::Backward => locate(args, name, dir).or_else(|| locate_within(func, name, dir)),
            Direction::Forward => locate_within(func, name, dir).or_else(|| locate(args, name, dir)),
        },
        Kind::Case { subj, clauses } => {
            let all_carry = !clauses.is_empty() && clauses.iter().all(|c| c.info.varset.contains_key(name));
            if all_carry {
                locate(clauses, name, dir)
            } else {
                locate_within(subj, name, dir)
            }
        }
        Kind::Clause { pats, body } => match dir {
            Direction::Backward => locate_within(body, name, dir).or_else(|| locate(pats, name, dir)),
            Direction::Forward => locate(pats, name, dir).or_else(|| locate_within(body, name, dir)),
        },
        Kind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let then_has = then_branch.info.varset.contains_key(name);
            let else_has = else_branch.info.varset.contains_key(name);
            if then_has && else_has {
                match dir {
                    Direction::Backward => {
                        locate_within(else_branch, name, dir).or_else(|| locate_within(then_branch, name, dir))
                    }
                    Direction::Forward => {
                        locate_within(then_branch, name, dir).or_else(|| locate_within(else_branch, name, dir))
                    }
                }
            } else {
                locate_within(cond, name, dir)
            }
        }
        // Asymmetric on purpose: a name read only inside a sibling closure
        // (never directly in `seq`) still needs a last-access site, so the
        // backward search falls back into `defs`. The forward search stays
        // `seq`-only — such a name has no access to call "first" against,
        // so it comes out `last`, not `only` (spec scenario 4).
        Kind::Do { seq, defs } => match dir {
            Direction::Backward => {
                locate(seq, name, dir).or_else(|| defs.values().rev().find_map(|d| locate_within(d, name, dir)))
            }
            Direction::Forward => locate(seq, name, dir),
        },
        Kind::FuncDef { clauses, .. } => locate(clauses, name, dir),
        Kind::Binary { left, right, .. } => match dir {
            Direction::Backward => locate_within(right, name, dir).or_else(|| locate_within(left, name, dir)),
            Direction::Forward => locate_within(left, name, dir).or_else(|| locate_within(right, name, dir)),
        },
        Kind::Unary { right, .. } => locate_within(right, name, dir),
        Kind::Assign { left, right } => match dir {
            Direction::Backward => locate_within(right, name, dir).or_else(|| locate_within(left, name, dir)),
            Direction::Forward => locate_within(left, name, dir).or_else(|| locate_within(right, name, dir)),
        },
    }
}

fn retag_at(nodes: &mut [Node<Annotation>], name: &str, pos: crate::error::Position, tag: ActionTag) -> bool {
    nodes.iter_mut().any(|n| retag_within(n, name, pos, tag))
}

fn retag_within(node: &mut Node<Annotation>, name: &str, pos: crate::error::Position, tag: ActionTag) -> bool {
    if node.pos() == pos {
        if let Kind::Var(n) = &node.kind {
            if n == name {
                node.info.action = Some(tag);
                return true;
            }
        }
    }
    match &mut node.kind {
        Kind::Var(_) | Kind::Lit(_) | Kind::Regex(_) => false,
        Kind::Array(elems) | Kind::Dict(elems) => retag_at(elems, name, pos, tag),
        Kind::Entry { key, value } => retag_within(value, name, pos, tag) || retag_within(key, name, pos, tag),
        Kind::DictUp { subj, entries } => {
            retag_at(entries, name, pos, tag) || retag_within(subj, name, pos, tag)
        }
        Kind::Apply { func, args } => retag_at(args, name, pos, tag) || retag_within(func, name, pos, tag),
        Kind::Case { subj, clauses } => retag_at(clauses, name, pos, tag) || retag_within(subj, name, pos, tag),
        Kind::Clause { pats, body } => retag_within(body, name, pos, tag) || retag_at(pats, name, pos, tag),
        Kind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            retag_within(then_branch, name, pos, tag)
                || retag_within(else_branch, name, pos, tag)
                || retag_within(cond, name, pos, tag)
        }
        Kind::Do { seq, defs } => {
            retag_at(seq, name, pos, tag) || defs.values_mut().any(|d| retag_within(d, name, pos, tag))
        }
        Kind::FuncDef { clauses, .. } => retag_at(clauses, name, pos, tag),
        Kind::Binary { left, right, .. } => retag_within(left, name, pos, tag) || retag_within(right, name, pos, tag),
        Kind::Unary { right, .. } => retag_within(right, name, pos, tag),
        Kind::Assign { left, right } => retag_within(left, name, pos, tag) || retag_within(right, name, pos, tag),
    }
}

/// Finds the `bind`-tagged `Var` occurrence for `name` among the pattern
/// pieces a `do`-sequence entry's left-hand side can contain. Used only to
/// downgrade an unused top-level binding to `discard`; clause-level unused
/// bindings go through the same path via `mark_access_tags`'s `Clause` arm.
fn find_bind_occurrence(nodes: &[Node<Annotation>], name: &str) -> Option<crate::error::Position> {
    nodes.iter().find_map(|n| find_bind_within(n, name))
}

fn find_bind_within(node: &Node<Annotation>, name: &str) -> Option<crate::error::Position> {
    if let Kind::Var(n) = &node.kind {
        if n == name && node.info.action == Some(ActionTag::Bind) {
            return Some(node.pos());
        }
    }
    match &node.kind {
        Kind::Array(elems) | Kind::Dict(elems) => find_bind_occurrence(elems, name),
        Kind::Entry { key, value } => find_bind_within(key, name).or_else(|| find_bind_within(value, name)),
        Kind::DictUp { subj, entries } => {
            find_bind_within(subj, name).or_else(|| find_bind_occurrence(entries, name))
        }
        Kind::Binary { left, right, .. } => find_bind_within(left, name).or_else(|| find_bind_within(right, name)),
        Kind::Assign { left, right } => find_bind_within(left, name).or_else(|| find_bind_within(right, name)),
        Kind::Clause { pats, .. } => find_bind_occurrence(pats, name),
        Kind::Do { seq, .. } => find_bind_occurrence(seq, name),
        _ => None,
    }
}
