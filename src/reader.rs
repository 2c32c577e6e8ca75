//! Text to value.
//!
//! [`read`] parses exactly one expression from the front of its input and
//! hands back the unconsumed remainder. Token-level recognition (whitespace,
//! atom tokens, integer literals, the closing parenthesis) is done with nom
//! combinators; list and quote structure is plain recursive descent on top.
//!
//! Grammar, informally:
//!
//! ```text
//! expr  := list | quote | atom
//! list  := '(' expr* ')'
//! quote := '\'' expr                  ; read as (quote expr)
//! atom  := integer | symbol           ; delimited by ( ) ' or whitespace
//! integer := [+-]? digit+
//! ```
//!
//! The symbol text `nil` reads as Nil itself. There is no dotted-pair syntax: a
//! lone `.` is an ordinary symbol.

use nom::{
    IResult, Parser,
    bytes::complete::{take_till1, take_while},
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, opt, recognize},
    sequence::pair,
};

use crate::ast::{NumberType, Value, cons, sym};
use crate::{Error, MAX_READ_DEPTH, ParseError};

/// A successfully read expression and the input left after it
type ReadResult<'a> = Result<(Value, &'a str), ParseError>;

/// Characters that end an atom; they are never part of one
fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '\'') || c.is_whitespace()
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace).parse(input)
}

fn skip_whitespace(input: &str) -> &str {
    whitespace(input).map_or(input, |(rest, _)| rest)
}

fn close_paren(input: &str) -> IResult<&str, char> {
    char(')').parse(input)
}

/// The maximal run of non-delimiter characters
fn atom_token(input: &str) -> IResult<&str, &str> {
    take_till1(is_delimiter).parse(input)
}

/// Succeeds only if the whole token is an optional sign followed by digits
fn integer_literal(token: &str) -> IResult<&str, &str> {
    all_consuming(recognize(pair(opt(one_of("+-")), digit1))).parse(token)
}

/// Read one expression from the front of `input`.
///
/// Returns the value read and the rest of the input, which starts exactly at
/// the first character not consumed. A malformed expression yields an error
/// value and an empty remainder.
pub fn read(input: &str) -> (Value, &str) {
    match read_sexpr(input, 0) {
        Ok(read) => read,
        Err(err) => (Error::from(err).into(), ""),
    }
}

fn read_sexpr(input: &str, depth: usize) -> ReadResult<'_> {
    let input = skip_whitespace(input);
    let mut chars = input.chars();
    match chars.next() {
        None => Err(ParseError::empty_input()),
        Some(')') => Err(ParseError::invalid_syntax(input)),
        Some(c @ ('(' | '\'')) => {
            let depth = depth + 1;
            if depth > MAX_READ_DEPTH {
                return Err(ParseError::too_deeply_nested());
            }
            if c == '(' {
                read_list(chars.as_str(), depth)
            } else {
                read_quote(chars.as_str(), depth)
            }
        }
        Some(_) => read_atom(input),
    }
}

/// Elements up to and including the matching `)`; the opening `(` is already consumed.
fn read_list(mut input: &str, depth: usize) -> ReadResult<'_> {
    let mut reversed = Value::Nil;
    loop {
        input = skip_whitespace(input);
        if input.is_empty() {
            return Err(ParseError::unfinished_list());
        }
        if let Ok((rest, _)) = close_paren(input) {
            return Ok((reversed.nreverse(), rest));
        }
        let (element, rest) = read_sexpr(input, depth)?;
        reversed = cons(element, reversed);
        input = rest;
    }
}

fn read_quote(input: &str, depth: usize) -> ReadResult<'_> {
    let (quoted, rest) = read_sexpr(input, depth)?;
    Ok((Value::from(vec![sym("quote"), quoted]), rest))
}

fn read_atom(input: &str) -> ReadResult<'_> {
    let (rest, token) = atom_token(input).map_err(|_| ParseError::invalid_syntax(input))?;
    let value = if integer_literal(token).is_ok() {
        let n: NumberType = token
            .parse()
            .map_err(|_| ParseError::number_out_of_range(token))?;
        Value::Number(n)
    } else {
        sym(token)
    };
    Ok((value, rest))
}
