//! Built-in operations registry.
//!
//! A single table lists every name the interpreter knows natively, tagged with
//! how it is evaluated:
//!
//! - **Functions** receive their arguments already evaluated, as a list value,
//!   and are bound in the global environment like any other value
//!   (`car`, `cons`, `+`, ...). They can be passed around and rebound.
//! - **Special forms** receive their argument list unevaluated together with
//!   the current environment (`quote`, `if`, `lambda`, `defun`, `setq`). They
//!   are recognised by the evaluator through the operator symbol and are never
//!   bound in the environment.
//!
//! ## Argument Conventions
//!
//! Functions read their arguments with the safe list accessors: a missing
//! argument reads as Nil and surplus arguments are ignored. Predicates answer
//! with the symbol `t` or with Nil.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** with the signature `fn(args: &Value) -> Result<Value, Error>`
//! 2. **Add it to BUILTIN_OPS** under its Lisp name
//! 3. **Add tests** covering the happy path and each error value it can produce

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::{NumberType, Value, cons, sym};
use crate::evaluator::{
    Environment, eval_defun, eval_if, eval_lambda, eval_quote, eval_setq,
};
use crate::interner::{Symbol, intern};

/// Native function: evaluated argument list in, value out
pub type NativeFn = fn(&Value) -> Result<Value, Error>;

/// Special form: unevaluated argument list and the current environment in, value out
pub type SpecialFormFn = fn(&Value, &Environment) -> Value;

/// Represents the implementation of a built-in expression (function or special form)
#[derive(Clone, Copy)]
pub enum OpKind {
    Function(NativeFn),
    SpecialForm(SpecialFormFn),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// The Lisp name of this operation
    pub id: &'static str,
    pub op_kind: OpKind,
}

impl BuiltinOp {
    pub fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }
}

//
// Builtin Function Implementations
//

fn truth(b: bool) -> Value {
    if b { sym("t") } else { Value::Nil }
}

/// The first two arguments
fn two_args(args: &Value) -> (Value, Value) {
    (args.car(), args.cdr().car())
}

fn builtin_car(args: &Value) -> Result<Value, Error> {
    Ok(args.car().car())
}

fn builtin_cdr(args: &Value) -> Result<Value, Error> {
    Ok(args.car().cdr())
}

fn builtin_cons(args: &Value) -> Result<Value, Error> {
    let (first, rest) = two_args(args);
    Ok(cons(first, rest))
}

fn builtin_eq(args: &Value) -> Result<Value, Error> {
    let (x, y) = two_args(args);
    Ok(truth(x.is_same(&y)))
}

fn builtin_atom(args: &Value) -> Result<Value, Error> {
    Ok(truth(!args.car().is_pair()))
}

fn builtin_numberp(args: &Value) -> Result<Value, Error> {
    Ok(truth(matches!(args.car(), Value::Number(_))))
}

fn builtin_symbolp(args: &Value) -> Result<Value, Error> {
    Ok(truth(matches!(args.car(), Value::Symbol(_))))
}

fn overflow() -> Error {
    Error::EvalError("integer overflow".to_owned())
}

fn division_by_zero() -> Error {
    Error::EvalError("division by zero".to_owned())
}

// Folds over every argument; each must be a number
macro_rules! numeric_fold {
    ($name:ident, $init:expr, $checked_op:ident) => {
        fn $name(args: &Value) -> Result<Value, Error> {
            let mut acc: NumberType = $init;
            for arg in args.iter() {
                acc = acc
                    .$checked_op(NumberType::try_from(&arg)?)
                    .ok_or_else(overflow)?;
            }
            Ok(Value::Number(acc))
        }
    };
}

numeric_fold!(builtin_add, 0, checked_add);
numeric_fold!(builtin_mul, 1, checked_mul);

// Applies to exactly the first two arguments; both must be numbers
macro_rules! numeric_binary {
    ($name:ident, $op:expr) => {
        fn $name(args: &Value) -> Result<Value, Error> {
            let (x, y) = two_args(args);
            let x = NumberType::try_from(&x)?;
            let y = NumberType::try_from(&y)?;
            let op: fn(NumberType, NumberType) -> Result<NumberType, Error> = $op;
            op(x, y).map(Value::Number)
        }
    };
}

numeric_binary!(builtin_sub, |x, y| x.checked_sub(y).ok_or_else(overflow));
numeric_binary!(builtin_div, floor_div);
numeric_binary!(builtin_mod, floor_mod);

/// Quotient rounded toward negative infinity
fn floor_div(x: NumberType, y: NumberType) -> Result<NumberType, Error> {
    if y == 0 {
        return Err(division_by_zero());
    }
    let q = x.checked_div(y).ok_or_else(overflow)?;
    if x % y != 0 && ((x < 0) != (y < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Remainder carrying the sign of the divisor
fn floor_mod(x: NumberType, y: NumberType) -> Result<NumberType, Error> {
    if y == 0 {
        return Err(division_by_zero());
    }
    let r = x.checked_rem(y).ok_or_else(overflow)?;
    if r != 0 && ((r < 0) != (y < 0)) {
        Ok(r + y)
    } else {
        Ok(r)
    }
}

/// Global registry of all built-in operations, in registration order.
static BUILTIN_OPS: &[BuiltinOp] = &[
    // Special forms
    BuiltinOp {
        id: "quote",
        op_kind: OpKind::SpecialForm(eval_quote),
    },
    BuiltinOp {
        id: "if",
        op_kind: OpKind::SpecialForm(eval_if),
    },
    BuiltinOp {
        id: "lambda",
        op_kind: OpKind::SpecialForm(eval_lambda),
    },
    BuiltinOp {
        id: "defun",
        op_kind: OpKind::SpecialForm(eval_defun),
    },
    BuiltinOp {
        id: "setq",
        op_kind: OpKind::SpecialForm(eval_setq),
    },
    // List operations
    BuiltinOp {
        id: "car",
        op_kind: OpKind::Function(builtin_car),
    },
    BuiltinOp {
        id: "cdr",
        op_kind: OpKind::Function(builtin_cdr),
    },
    BuiltinOp {
        id: "cons",
        op_kind: OpKind::Function(builtin_cons),
    },
    // Predicates
    BuiltinOp {
        id: "eq",
        op_kind: OpKind::Function(builtin_eq),
    },
    BuiltinOp {
        id: "atom",
        op_kind: OpKind::Function(builtin_atom),
    },
    BuiltinOp {
        id: "numberp",
        op_kind: OpKind::Function(builtin_numberp),
    },
    BuiltinOp {
        id: "symbolp",
        op_kind: OpKind::Function(builtin_symbolp),
    },
    // Arithmetic
    BuiltinOp {
        id: "+",
        op_kind: OpKind::Function(builtin_add),
    },
    BuiltinOp {
        id: "*",
        op_kind: OpKind::Function(builtin_mul),
    },
    BuiltinOp {
        id: "-",
        op_kind: OpKind::Function(builtin_sub),
    },
    BuiltinOp {
        id: "/",
        op_kind: OpKind::Function(builtin_div),
    },
    BuiltinOp {
        id: "mod",
        op_kind: OpKind::Function(builtin_mod),
    },
];

/// Special forms keyed by their interned operator symbol
static SPECIAL_FORMS: LazyLock<HashMap<Symbol, &'static BuiltinOp>> = LazyLock::new(|| {
    BUILTIN_OPS
        .iter()
        .filter(|op| op.is_special_form())
        .map(|op| (intern(op.id), op))
        .collect()
});

/// Get all builtin operations (for internal use by evaluator)
pub(crate) fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}

/// Find the special form named by `symbol`, if it names one
pub(crate) fn find_special_form(symbol: Symbol) -> Option<SpecialFormFn> {
    match SPECIAL_FORMS.get(&symbol)?.op_kind {
        OpKind::SpecialForm(form) => Some(form),
        OpKind::Function(_) => None,
    }
}
