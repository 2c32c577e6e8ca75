use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::Error;
use crate::ast::Value;
use crate::interner::{Symbol, intern};

/// A bound value. Every frame holding the binding shares the same cell, so an
/// assignment through one holder is seen by all of them.
pub type Binding = Rc<RefCell<Value>>;

#[derive(Default)]
struct Frame {
    /// Oldest first; lookups scan from the back so the newest binding wins.
    bindings: RefCell<Vec<(Symbol, Binding)>>,
    parent: Option<Environment>,
}

/// A chain of binding frames, innermost first.
///
/// Cloning an `Environment` is cheap and aliases the same frames: closures keep
/// the chain they were created in alive, and `bind` on a shared frame is visible
/// through every clone. The outermost frame of every chain is the global frame.
#[derive(Clone, Default)]
pub struct Environment(Rc<Frame>);

impl Environment {
    /// A fresh chain consisting of a single (global) frame
    pub fn new() -> Self {
        Environment::default()
    }

    /// Push a new innermost frame holding `bindings` in front of this chain.
    ///
    /// When a symbol appears more than once, its earliest entry is the one found.
    pub fn extend(&self, bindings: Vec<(Symbol, Value)>) -> Environment {
        let bindings = bindings
            .into_iter()
            .rev()
            .map(|(symbol, value)| (symbol, Rc::new(RefCell::new(value))))
            .collect();
        Environment(Rc::new(Frame {
            bindings: RefCell::new(bindings),
            parent: Some(self.clone()),
        }))
    }

    /// The outermost frame of this chain
    pub fn global(&self) -> Environment {
        let mut env = self;
        while let Some(parent) = &env.0.parent {
            env = parent;
        }
        env.clone()
    }

    /// Find the binding cell for `symbol`, innermost frame first and newest
    /// binding first within a frame.
    pub fn lookup(&self, symbol: Symbol) -> Option<Binding> {
        let mut env = Some(self);
        while let Some(Environment(frame)) = env {
            let found = frame
                .bindings
                .borrow()
                .iter()
                .rev()
                .find(|(bound, _)| *bound == symbol)
                .map(|(_, binding)| Rc::clone(binding));
            if found.is_some() {
                return found;
            }
            env = frame.parent.as_ref();
        }
        None
    }

    /// Add a binding to this (innermost) frame. An existing binding of the same
    /// symbol in the frame is shadowed, not replaced.
    pub fn bind(&self, symbol: Symbol, value: Value) {
        self.0
            .bindings
            .borrow_mut()
            .push((symbol, Rc::new(RefCell::new(value))));
    }

    /// Register a host function in this frame under `name`.
    ///
    /// # Example
    /// ```
    /// use conslisp::ast::Value;
    /// use conslisp::evaluator::create_global_env;
    /// use conslisp::{Error, rep};
    ///
    /// fn length(args: &Value) -> Result<Value, Error> {
    ///     Ok(Value::Number(args.car().iter().count() as i64))
    /// }
    ///
    /// let env = create_global_env();
    /// env.register_builtin_function("length", length);
    /// assert_eq!(rep("(length '(a b c))", &env), "3");
    /// ```
    pub fn register_builtin_function(&self, name: &str, func: fn(&Value) -> Result<Value, Error>) {
        self.bind(intern(name), Value::native(name, Rc::new(func)));
    }

    /// Every visible binding as (name, current value), inner frames shadowing
    /// outer ones, sorted by name.
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut visible: HashMap<Symbol, Value> = HashMap::new();
        let mut env = Some(self);
        while let Some(Environment(frame)) = env {
            for (symbol, binding) in frame.bindings.borrow().iter().rev() {
                visible
                    .entry(*symbol)
                    .or_insert_with(|| binding.borrow().clone());
            }
            env = frame.parent.as_ref();
        }

        let mut result: Vec<_> = visible
            .into_iter()
            .map(|(symbol, value)| (symbol.name(), value))
            .collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut depth = 0;
        let mut env = Some(self);
        while let Some(Environment(frame)) = env {
            depth += 1;
            env = frame.parent.as_ref();
        }
        write!(f, "Environment(frames={depth})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{sym, val};

    fn value_of(env: &Environment, name: &str) -> Option<Value> {
        env.lookup(intern(name))
            .map(|binding| binding.borrow().clone())
    }

    #[test]
    fn test_lookup_walks_outward() {
        let global = Environment::new();
        global.bind(intern("outer"), val(1));
        let inner = global.extend(vec![(intern("inner"), val(2))]);

        assert_eq!(value_of(&inner, "outer"), Some(val(1)));
        assert_eq!(value_of(&inner, "inner"), Some(val(2)));
        assert_eq!(value_of(&global, "inner"), None);
        assert_eq!(value_of(&inner, "missing"), None);
    }

    #[test]
    fn test_newest_binding_in_frame_wins() {
        let env = Environment::new();
        env.bind(intern("x"), val(1));
        env.bind(intern("x"), val(2));
        assert_eq!(value_of(&env, "x"), Some(val(2)));
        // the shadowed entry is still there
        assert_eq!(env.0.bindings.borrow().len(), 2);
    }

    #[test]
    fn test_inner_frame_shadows_outer() {
        let global = Environment::new();
        global.bind(intern("x"), val(1));
        let inner = global.extend(vec![(intern("x"), val(2))]);
        assert_eq!(value_of(&inner, "x"), Some(val(2)));
        assert_eq!(value_of(&global, "x"), Some(val(1)));
    }

    #[test]
    fn test_extend_first_duplicate_wins() {
        let env = Environment::new().extend(vec![(intern("p"), val(1)), (intern("p"), val(2))]);
        assert_eq!(value_of(&env, "p"), Some(val(1)));
    }

    #[test]
    fn test_binding_cells_are_shared() {
        let global = Environment::new();
        global.bind(intern("counter"), val(0));
        let a = global.extend(vec![]);
        let b = global.extend(vec![]);

        if let Some(cell) = a.lookup(intern("counter")) {
            *cell.borrow_mut() = val(5);
        }
        assert_eq!(value_of(&b, "counter"), Some(val(5)));
    }

    #[test]
    fn test_bind_on_shared_frame_is_visible_to_clones() {
        let global = Environment::new();
        let captured = global.extend(vec![]);
        global.bind(intern("later"), sym("yes"));
        assert_eq!(value_of(&captured, "later"), Some(sym("yes")));
    }

    #[test]
    fn test_global_is_root() {
        let global = Environment::new();
        let inner = global.extend(vec![]).extend(vec![]);
        assert_eq!(inner.global(), global);
        assert_ne!(inner, global);
        assert_eq!(global.global(), global);
    }

    #[test]
    fn test_bindings_listing() {
        let global = Environment::new();
        global.bind(intern("b"), val(1));
        global.bind(intern("a"), val(2));
        let inner = global.extend(vec![(intern("b"), val(3))]);

        assert_eq!(
            inner.bindings(),
            vec![("a".to_owned(), val(2)), ("b".to_owned(), val(3))]
        );
    }
}
