//! This module defines the runtime value model shared by the reader, the
//! evaluator and the printer. The main enum, [`Value`], covers every kind of
//! value the language can produce: Nil, integers, interned symbols, error
//! values, mutable pairs and the two kinds of function. Code is data, so the
//! same type doubles as the AST.
//!
//! Pairs are reference counted and their two fields are individually mutable:
//! cloning a `Value::Pair` aliases the cell, and a mutation through one alias is
//! seen through all of them. Nothing guards against a pair chain that loops back
//! on itself; the printer copes, structural equality does not.
//!
//! Helper functions such as [`sym`], [`val`], [`nil`] and [`cons`] keep AST
//! construction in code and tests short.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Error;
use crate::evaluator::Environment;
use crate::interner::{Symbol, intern};

/// Type alias for number values in interpreter
pub type NumberType = i64;

/// Canonical native function signature: takes the evaluated argument list
/// (a proper list of values) and returns the result.
pub type OperationFn = dyn Fn(&Value) -> Result<Value, Error>;

/// Core value type of the interpreter
#[derive(Clone)]
pub enum Value {
    /// The empty list, false, and the "nothing here" sentinel
    Nil,
    /// Numbers (integers only)
    Number(NumberType),
    /// Interned identifiers, compared by handle
    Symbol(Symbol),
    /// A diagnostic carried as an ordinary value
    Error(String),
    /// A mutable cons cell
    Pair(Rc<Pair>),
    /// Host function; `id` is the name it was registered under
    NativeFunction { id: String, func: Rc<OperationFn> },
    /// User-defined function closed over its defining environment
    Closure(Rc<Closure>),
}

/// A cons cell. Both fields may be rewritten after creation.
pub struct Pair {
    first: RefCell<Value>,
    rest: RefCell<Value>,
}

impl Pair {
    pub fn first(&self) -> Value {
        self.first.borrow().clone()
    }

    pub fn rest(&self) -> Value {
        self.rest.borrow().clone()
    }

    pub fn set_first(&self, value: Value) {
        *self.first.borrow_mut() = value;
    }

    pub fn set_rest(&self, value: Value) {
        *self.rest.borrow_mut() = value;
    }
}

/// A `lambda`: parameter list, body forms, and the environment it was created in
pub struct Closure {
    pub params: Value,
    pub body: Value,
    pub env: Environment,
}

impl Value {
    /// Build an error value from its message
    pub fn error(message: impl Into<String>) -> Value {
        Value::Error(message.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    /// `first` of a pair; Nil for anything else
    pub fn car(&self) -> Value {
        match self {
            Value::Pair(pair) => pair.first(),
            _ => Value::Nil,
        }
    }

    /// `rest` of a pair; Nil for anything else
    pub fn cdr(&self) -> Value {
        match self {
            Value::Pair(pair) => pair.rest(),
            _ => Value::Nil,
        }
    }

    /// Iterate the elements of the list portion, stopping at the first non-pair.
    pub fn iter(&self) -> ListIter {
        ListIter {
            next: self.clone(),
        }
    }

    /// Reverse a list in place by relinking its cells, returning the new head.
    /// The old head becomes the last cell; a dotted terminator is dropped.
    pub fn nreverse(self) -> Value {
        let mut reversed = Value::Nil;
        let mut rest = self;
        while let Value::Pair(pair) = rest {
            rest = pair.rest();
            pair.set_rest(reversed);
            reversed = Value::Pair(pair);
        }
        reversed
    }

    /// Build a closure value
    pub fn closure(params: Value, body: Value, env: Environment) -> Value {
        Value::Closure(Rc::new(Closure { params, body, env }))
    }

    /// Wrap a host function
    pub fn native(id: &str, func: Rc<OperationFn>) -> Value {
        Value::NativeFunction {
            id: id.to_owned(),
            func,
        }
    }

    /// Identity comparison: same number, same symbol, same object, or both Nil.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunction { func: a, .. }, Value::NativeFunction { func: b, .. }) => {
                Rc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

/// Iterator over the elements of a (possibly dotted) list
pub struct ListIter {
    next: Value,
}

impl Iterator for ListIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match std::mem::replace(&mut self.next, Value::Nil) {
            Value::Pair(pair) => {
                self.next = pair.rest();
                Some(pair.first())
            }
            _ => None,
        }
    }
}

impl FromIterator<Value> for Value {
    /// Collect into a proper list, preserving order.
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut reversed = Value::Nil;
        for item in iter {
            reversed = cons(item, reversed);
        }
        reversed.nreverse()
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Symbol(s) => write!(f, "{s:?}"),
            Value::Error(msg) => write!(f, "Error({msg:?})"),
            Value::Pair(_) => write!(f, "Pair{self}"),
            Value::NativeFunction { id, .. } => write!(f, "NativeFunction({id})"),
            Value::Closure(closure) => {
                write!(f, "Closure(params={}, body={})", closure.params, closure.body)
            }
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<Error> for Value {
    fn from(err: Error) -> Self {
        Value::Error(err.to_string())
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        v.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        arr.into_iter().map(Into::into).collect()
    }
}

impl TryFrom<&Value> for NumberType {
    type Error = Error;

    fn try_from(value: &Value) -> Result<NumberType, Error> {
        if let Value::Number(n) = value {
            Ok(*n)
        } else {
            Err(Error::wrong_type())
        }
    }
}

/// Symbol value for `name`; the text `nil` always yields [`Value::Nil`].
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    match name.as_ref() {
        "nil" => Value::Nil,
        name => Value::Symbol(intern(name)),
    }
}

/// Helper function for creating Values from anything convertible
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// The empty list
pub fn nil() -> Value {
    Value::Nil
}

/// Allocate a fresh pair
pub fn cons(first: Value, rest: Value) -> Value {
    Value::Pair(Rc::new(Pair {
        first: RefCell::new(first),
        rest: RefCell::new(rest),
    }))
}

/// Structural equality: pairs compare element-wise, functions by identity,
/// errors by message. Do not use on circular structure.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => {
                Rc::ptr_eq(a, b) || (a.first() == b.first() && a.rest() == b.rest())
            }
            (Value::NativeFunction { id: a, .. }, Value::NativeFunction { id: b, .. }) => a == b,
            _ => self.is_same(other),
        }
    }
}
