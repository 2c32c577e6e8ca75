use crate::Error;
use crate::ast::{Value, cons};
use crate::builtinops::{OpKind, find_special_form, get_builtin_ops};
use crate::interner::{Symbol, intern};

mod environment;

pub use environment::{Binding, Environment};

/// Evaluate an expression (public API)
///
/// Errors never escape as `Err`: they come back as [`Value::Error`].
pub fn eval(expr: &Value, env: &Environment) -> Value {
    match expr {
        // Self-evaluating forms
        Value::Nil
        | Value::Number(_)
        | Value::Error(_)
        | Value::NativeFunction { .. }
        | Value::Closure(_) => expr.clone(),

        // Variable lookup
        Value::Symbol(symbol) => match env.lookup(*symbol) {
            Some(binding) => binding.borrow().clone(),
            None => Error::UnboundVariable(symbol.name()).into(),
        },

        // Special form or function application
        Value::Pair(pair) => {
            let operator = pair.first();
            let args = pair.rest();
            if let Value::Symbol(symbol) = &operator
                && let Some(special_form) = find_special_form(*symbol)
            {
                return special_form(&args, env);
            }
            let callee = eval(&operator, env);
            let args = evlis(&args, env);
            apply(&callee, &args, env)
        }
    }
}

/// Evaluate every element of `list` left to right, returning the list of
/// results in the same order. The first error value is returned as is and
/// later elements are not evaluated.
pub fn evlis(list: &Value, env: &Environment) -> Value {
    let mut reversed = Value::Nil;
    for expr in list.iter() {
        let value = eval(&expr, env);
        if value.is_error() {
            return value;
        }
        reversed = cons(value, reversed);
    }
    reversed.nreverse()
}

/// Evaluate `body` forms in order and return the value of the last one.
/// An empty body evaluates to Nil.
pub fn progn(body: &Value, env: &Environment) -> Value {
    body.iter()
        .fold(Value::Nil, |_, expr| eval(&expr, env))
}

/// Apply a function value to an already evaluated argument list.
///
/// `_env` is the caller's environment; closures run in the environment they
/// captured instead.
pub fn apply(callee: &Value, args: &Value, _env: &Environment) -> Value {
    match (callee, args) {
        (Value::Error(_), _) => callee.clone(),
        (_, Value::Error(_)) => args.clone(),
        (Value::NativeFunction { func, .. }, _) => func(args).unwrap_or_else(Value::from),
        (Value::Closure(closure), _) => {
            let frame = pair_parameters(&closure.params, args);
            progn(&closure.body, &closure.env.extend(frame))
        }
        _ => Error::NotAFunction(callee.to_string()).into(),
    }
}

/// Pair parameters with arguments positionally, stopping at the shorter list.
/// A parameter that is not a symbol consumes its argument but binds nothing.
fn pair_parameters(params: &Value, args: &Value) -> Vec<(Symbol, Value)> {
    params
        .iter()
        .zip(args.iter())
        .filter_map(|(param, arg)| match param {
            Value::Symbol(symbol) => Some((symbol, arg)),
            _ => None,
        })
        .collect()
}

fn expect_symbol(value: &Value) -> Result<Symbol, Error> {
    match value {
        Value::Symbol(symbol) => Ok(*symbol),
        other => Err(Error::EvalError(format!("{other} is not symbol"))),
    }
}

/// `(quote e)`: `e` unevaluated
pub(crate) fn eval_quote(args: &Value, _env: &Environment) -> Value {
    args.car()
}

/// `(if cond then else)`: only Nil selects `else`, so an error value is true.
/// A missing branch reads as Nil.
pub(crate) fn eval_if(args: &Value, env: &Environment) -> Value {
    match eval(&args.car(), env) {
        Value::Nil => eval(&args.cdr().cdr().car(), env),
        _ => eval(&args.cdr().car(), env),
    }
}

/// `(lambda params body...)`
pub(crate) fn eval_lambda(args: &Value, env: &Environment) -> Value {
    Value::closure(args.car(), args.cdr(), env.clone())
}

/// `(defun name params body...)`: binds `name` in the global frame, whatever
/// the current scope, and returns the name.
pub(crate) fn eval_defun(args: &Value, env: &Environment) -> Value {
    let name = args.car();
    let symbol = match expect_symbol(&name) {
        Ok(symbol) => symbol,
        Err(err) => return err.into(),
    };
    let function = eval_lambda(&args.cdr(), env);
    env.global().bind(symbol, function);
    name
}

/// `(setq name expr)`: assigns through the innermost existing binding of
/// `name`, or creates one in the global frame. Returns the assigned value,
/// which may itself be an error value.
pub(crate) fn eval_setq(args: &Value, env: &Environment) -> Value {
    let symbol = match expect_symbol(&args.car()) {
        Ok(symbol) => symbol,
        Err(err) => return err.into(),
    };
    let value = eval(&args.cdr().car(), env);
    match env.lookup(symbol) {
        Some(binding) => *binding.borrow_mut() = value.clone(),
        None => env.global().bind(symbol, value.clone()),
    }
    value
}

/// Create a global environment with the built-in functions and `t` bound
pub fn create_global_env() -> Environment {
    let env = Environment::new();

    for builtin_op in get_builtin_ops() {
        if let OpKind::Function(func) = builtin_op.op_kind {
            env.register_builtin_function(builtin_op.id, func);
        }
    }
    let t = intern("t");
    env.bind(t, Value::Symbol(t));

    env
}
