//! Value to text.
//!
//! Atoms print as their literal text, functions as opaque markers, and pair
//! chains as parenthesized lists with a ` . tail` before the closing parenthesis
//! when the chain does not end in Nil. A pair met again while it is still being
//! printed is written as `...`, so circular structure terminates.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Pair, Value};

/// Canonical textual form of `value`
pub fn print(value: &Value) -> String {
    value.to_string()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, &mut HashSet::new())
    }
}

/// `open` holds every pair on the path from the root to the value being written.
fn write_value(
    f: &mut fmt::Formatter<'_>,
    value: &Value,
    open: &mut HashSet<*const Pair>,
) -> fmt::Result {
    match value {
        Value::Nil => write!(f, "nil"),
        Value::Number(n) => write!(f, "{n}"),
        Value::Symbol(s) => write!(f, "{s}"),
        Value::Error(msg) => write!(f, "<error: {msg}>"),
        Value::Pair(pair) => write_list(f, pair, open),
        Value::NativeFunction { .. } => write!(f, "<subr>"),
        Value::Closure(_) => write!(f, "<expr>"),
    }
}

fn write_list(
    f: &mut fmt::Formatter<'_>,
    head: &Rc<Pair>,
    open: &mut HashSet<*const Pair>,
) -> fmt::Result {
    if open.contains(&Rc::as_ptr(head)) {
        return write!(f, "...");
    }

    let mut entered = Vec::new();
    let result = write_elements(f, head, open, &mut entered);
    for ptr in entered {
        open.remove(&ptr);
    }
    result
}

fn write_elements(
    f: &mut fmt::Formatter<'_>,
    head: &Rc<Pair>,
    open: &mut HashSet<*const Pair>,
    entered: &mut Vec<*const Pair>,
) -> fmt::Result {
    write!(f, "(")?;
    let mut cell = Rc::clone(head);
    loop {
        if !entered.is_empty() {
            write!(f, " ")?;
        }
        entered.push(Rc::as_ptr(&cell));
        open.insert(Rc::as_ptr(&cell));
        write_value(f, &cell.first(), open)?;

        match cell.rest() {
            Value::Nil => break,
            Value::Pair(next) if open.contains(&Rc::as_ptr(&next)) => {
                write!(f, " ...")?;
                break;
            }
            Value::Pair(next) => cell = next,
            tail => {
                write!(f, " . ")?;
                write_value(f, &tail, open)?;
                break;
            }
        }
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{cons, nil, sym, val};
    use crate::evaluator::create_global_env;
    use crate::interner::intern;

    #[test]
    fn test_print_data_driven() {
        let test_cases = vec![
            (nil(), "nil"),
            (val(42), "42"),
            (val(-7), "-7"),
            (sym("foo"), "foo"),
            (Value::error("empty input"), "<error: empty input>"),
            (val([1, 2, 3]), "(1 2 3)"),
            (val(vec![sym("a"), val([sym("b"), sym("c")]), nil()]), "(a (b c) nil)"),
            (cons(val(1), val(2)), "(1 . 2)"),
            (cons(val(1), cons(val(2), sym("tail"))), "(1 2 . tail)"),
            (cons(nil(), nil()), "(nil)"),
            (val(vec![sym("quote"), sym("x")]), "(quote x)"),
            (val(vec![Value::error("oops")]), "(<error: oops>)"),
        ];

        for (i, (value, expected)) in test_cases.iter().enumerate() {
            assert_eq!(print(value), *expected, "Print test #{} failed", i + 1);
        }
    }

    #[test]
    fn test_print_functions() {
        let env = create_global_env();
        let car = env
            .lookup(intern("car"))
            .map(|binding| binding.borrow().clone())
            .unwrap_or(Value::Nil);
        assert_eq!(print(&car), "<subr>");
        assert_eq!(print(&Value::closure(nil(), nil(), env)), "<expr>");
    }

    #[test]
    fn test_circular_rest_terminates() {
        let list = val([1, 2]);
        if let Value::Pair(last) = list.cdr() {
            last.set_rest(list.clone());
        }
        assert_eq!(print(&list), "(1 2 ...)");
    }

    #[test]
    fn test_circular_first_terminates() {
        let cell = cons(nil(), nil());
        if let Value::Pair(pair) = &cell {
            pair.set_first(cell.clone());
        }
        assert_eq!(print(&cell), "(...)");
    }

    #[test]
    fn test_shared_but_acyclic_structure_prints_fully() {
        let shared = val([1]);
        let list = val(vec![shared.clone(), shared]);
        assert_eq!(print(&list), "((1) (1))");
    }
}
