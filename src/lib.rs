//! conslisp - a minimal Lisp interpreter over mutable cons cells
//!
//! This crate implements a small, dynamically typed Lisp. Text is read one
//! expression at a time, evaluated against a persistent global environment
//! and printed back in canonical form:
//!
//! ```lisp
//! (+ 1 2 3)                 ; => 6
//! (defun sq (x) (* x x))    ; => sq
//! (sq 4)                    ; => 16
//! (cons 1 2)                ; => (1 . 2)
//! (car '(a b c))            ; => a
//! ```
//!
//! ## Errors Are Values
//!
//! Nothing in the language raises. A failed read, an unbound symbol or a bad
//! operand produces a [`ast::Value::Error`] that flows through ordinary value
//! channels; argument evaluation short-circuits on the first one and the
//! printer renders it as `<error: message>`. Inside the crate the usual
//! `Result<_, Error>` plumbing is used and converted at the language boundary.
//!
//! ## Modules
//!
//! - `ast`: the value model (atoms, mutable pairs, functions)
//! - `interner`: process-wide symbol table
//! - `reader`: text to value
//! - `printer`: value to text
//! - `evaluator`: `eval`/`apply`, special forms and the environment
//! - `builtinops`: native functions installed in the global environment
//!
//! ```
//! use conslisp::evaluator::create_global_env;
//! use conslisp::rep;
//!
//! let env = create_global_env();
//! assert_eq!(rep("(defun sq (x) (* x x))", &env), "sq");
//! assert_eq!(rep("(sq 4)", &env), "16");
//! ```

use std::fmt;

/// Maximum list/quote nesting accepted by the reader.
/// Deeper input yields a "too deeply nested" error value instead of recursing further.
pub const MAX_READ_DEPTH: usize = 512;

/// Categorizes the different kinds of reader errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Nothing but whitespace was left to read
    EmptyInput,
    /// A token that cannot start an expression (a stray close parenthesis)
    InvalidSyntax,
    /// Input ended inside a list
    Incomplete,
    /// Nesting exceeded [`MAX_READ_DEPTH`]
    TooDeeplyNested,
    /// Well-formed syntax the implementation cannot represent (integer range)
    ImplementationLimit,
}

/// A reader failure. `message` is the exact text carried by the resulting error value.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn empty_input() -> Self {
        Self::new(ParseErrorKind::EmptyInput, "empty input")
    }

    /// `rest` is the unread input, starting at the offending character
    pub(crate) fn invalid_syntax(rest: &str) -> Self {
        Self::new(
            ParseErrorKind::InvalidSyntax,
            format!("invalid syntax: {rest}"),
        )
    }

    pub(crate) fn unfinished_list() -> Self {
        Self::new(ParseErrorKind::Incomplete, "unfinished parenthesis")
    }

    pub(crate) fn too_deeply_nested() -> Self {
        Self::new(ParseErrorKind::TooDeeplyNested, "too deeply nested")
    }

    pub(crate) fn number_out_of_range(token: &str) -> Self {
        Self::new(
            ParseErrorKind::ImplementationLimit,
            format!("number out of range: {token}"),
        )
    }
}

/// Error types for the interpreter
///
/// The `Display` text of each variant is the payload of the error value the
/// language sees, so it is kept short and stable.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ParseError(ParseError),
    /// Symbol name that has no binding
    UnboundVariable(String),
    TypeError(String),
    /// Printed form of the value that was applied
    NotAFunction(String),
    EvalError(String),
}

impl Error {
    /// The operand type error every arithmetic builtin reports
    pub(crate) fn wrong_type() -> Self {
        Error::TypeError("wrong type".to_owned())
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::ParseError(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(e) => write!(f, "{}", e.message),
            Error::UnboundVariable(name) => write!(f, "{name} has no value"),
            Error::TypeError(msg) | Error::EvalError(msg) => write!(f, "{msg}"),
            Error::NotAFunction(callee) => write!(f, "{callee} is not function"),
        }
    }
}

impl std::error::Error for Error {}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod interner;
pub mod printer;
pub mod reader;

use ast::Value;
use evaluator::Environment;

/// Read one expression from `line`, evaluate it and return its value.
///
/// Text after the first complete expression is discarded, as the REPL does.
pub fn eval_str(line: &str, env: &Environment) -> Value {
    let (expr, _rest) = reader::read(line);
    evaluator::eval(&expr, env)
}

/// Read, evaluate and print: the whole per-line job of the REPL.
pub fn rep(line: &str, env: &Environment) -> String {
    printer::print(&eval_str(line, env))
}
