//! The nested scope stack the annotator threads through its traversal.
//!
//! Mirrors the teacher's `Scope`/`Frame` shape (a `Vec` of frames, innermost
//! last) but without the type-unification machinery that crate needs and
//! this one doesn't: a binding is either an ordinary variable or a function
//! whose closure environment (`Varset`) is filled in once its clauses have
//! been annotated.

use indexmap::IndexMap;

use super::Varset;

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeEntry {
    Variable,
    Function(Varset),
}

#[derive(Debug, Default)]
struct Frame {
    bindings: IndexMap<String, ScopeEntry>,
}

#[derive(Debug, Default)]
pub struct Scope {
    stack: Vec<Frame>,
}

impl Scope {
    pub fn new() -> Self {
        Scope { stack: Vec::new() }
    }

    pub fn push(&mut self) {
        self.stack.push(Frame::default());
    }

    pub fn pop(&mut self) {
        self.stack.pop().expect("scope stack underflow");
    }

    pub fn bind_variable(&mut self, name: &str) {
        self.top_mut().bindings.insert(name.to_string(), ScopeEntry::Variable);
    }

    pub fn bind_function(&mut self, name: &str) {
        self.top_mut()
            .bindings
            .insert(name.to_string(), ScopeEntry::Function(Varset::new()));
    }

    /// Searches innermost-out, like `lookup`, rather than assuming `name`
    /// lives in the current top frame: a funcdef's env is filled in while a
    /// lookahead frame for sibling captures sits on top of the frame that
    /// actually bound the function's name.
    pub fn set_function_env(&mut self, name: &str, env: Varset) {
        for frame in self.stack.iter_mut().rev() {
            if let Some(entry) = frame.bindings.get_mut(name) {
                *entry = ScopeEntry::Function(env);
                return;
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&ScopeEntry> {
        self.stack.iter().rev().find_map(|frame| frame.bindings.get(name))
    }

    /// Names bound directly in the innermost frame — the "locally bound
    /// names" a closing construct subtracts from its exposed varset.
    pub fn current_names(&self) -> Vec<String> {
        self.stack
            .last()
            .map(|frame| frame.bindings.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().expect("scope stack is empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut scope = Scope::new();
        scope.push();
        scope.bind_variable("x");
        scope.push();
        scope.bind_variable("x");
        assert!(matches!(scope.lookup("x"), Some(ScopeEntry::Variable)));
        scope.pop();
        assert!(matches!(scope.lookup("x"), Some(ScopeEntry::Variable)));
        scope.pop();
        assert!(scope.lookup("x").is_none());
    }

    #[test]
    fn function_env_fills_in_after_binding() {
        let mut scope = Scope::new();
        scope.push();
        scope.bind_function("f");
        assert!(matches!(scope.lookup("f"), Some(ScopeEntry::Function(env)) if env.is_empty()));
        let mut env = Varset::new();
        env.insert("y".to_string(), super::super::ActionTag::Last);
        scope.set_function_env("f", env);
        assert!(matches!(scope.lookup("f"), Some(ScopeEntry::Function(env)) if !env.is_empty()));
    }
}
