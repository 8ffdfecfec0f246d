//! S-expression reader.
//!
//! Parses textual source into the cons-cell tree consumed by the macro
//! expander and analyzer. The reader produces plain [`Value`] trees and
//! performs no compilation or rewriting of its own.
//!
//! Surface syntax: atoms (numbers, strings, booleans, symbols), proper
//! lists, dotted tails `(a b . c)`, and the reader abbreviations
//! `'x` → `(quote x)`, `` `x `` → `(quasiquote x)`, `,x` → `(unquote x)`,
//! `,@x` → `(unquote-splicing x)`. Comments run from `;` to end of line
//! and count as whitespace.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1, one_of},
    combinator::{opt, recognize, value},
    error::ErrorKind,
    multi::many0,
    sequence::{preceded, terminated},
};

use crate::ast::{NumberType, SYMBOL_SPECIAL_CHARS, Value, cons, is_valid_symbol, list, sym};
use crate::{Error, MAX_READ_DEPTH, ParseError, ParseErrorKind};

/// Convert nom parsing errors to structured reader errors.
///
/// Fatal conditions inside tokens (unknown escape, unterminated string,
/// bad numeric form, depth overflow) are raised as `nom::Err::Failure`
/// with a reserved [`ErrorKind`] so they survive `alt` backtracking and
/// can be told apart here.
fn reader_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::TooLarge => ParseError::from_message(
                    ParseErrorKind::TooDeeplyNested,
                    format!("expression too deeply nested (max depth: {MAX_READ_DEPTH})"),
                ),
                ErrorKind::Escaped => ParseError::with_context(
                    ParseErrorKind::UnknownEscape,
                    "unknown escape sequence in string",
                    input,
                    position,
                ),
                ErrorKind::Verify => ParseError::with_context(
                    ParseErrorKind::UnterminatedString,
                    "unterminated string",
                    input,
                    position,
                ),
                ErrorKind::Digit => ParseError::with_context(
                    ParseErrorKind::InvalidNumber,
                    "invalid numeric form",
                    input,
                    position,
                ),
                _ => {
                    if position >= input.len() {
                        ParseError::from_message(
                            ParseErrorKind::Incomplete,
                            "unexpected end of input",
                        )
                    } else {
                        ParseError::with_context(
                            ParseErrorKind::InvalidSyntax,
                            "invalid syntax",
                            input,
                            position,
                        )
                    }
                }
            }
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "incomplete input")
        }
    }
}

/// A `;` comment running to end of line.
fn comment(input: &str) -> IResult<&str, &str> {
    preceded(char(';'), take_while(|c| c != '\n')).parse(input)
}

/// Whitespace between tokens, including comments.
fn intertoken_space(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, comment)))).parse(input)
}

/// True when a token may legally end at this position: whitespace, a
/// paren, quote punctuation, a string or comment opener, or end of input.
fn at_delimiter(input: &str) -> bool {
    match input.chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || "()'`,;\"".contains(c),
    }
}

/// Parse a number: optional sign, digits, optional fraction and exponent.
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize((
        opt(one_of("+-")),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(preceded(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            one_of("eE"),
            opt(one_of("+-")),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    if !at_delimiter(rest) {
        // A token with a decimal point can never become a symbol either,
        // so "1.2.3" is reported as a bad number. "123abc" backtracks and
        // fails in the symbol parser instead.
        if text.contains('.') || rest.starts_with('.') {
            return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                ErrorKind::Digit,
            )));
        }
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Digit,
        )));
    }

    match text.parse::<NumberType>() {
        Ok(n) => Ok((rest, Value::Number(n))),
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Digit,
        ))),
    }
}

/// Parse a boolean (#t or #f)
fn parse_bool(input: &str) -> IResult<&str, Value> {
    let (rest, b) = alt((
        value(Value::Bool(true), tag("#t")),
        value(Value::Bool(false), tag("#f")),
    ))
    .parse(input)?;

    if at_delimiter(rest) {
        Ok((rest, b))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Tag,
        )))
    }
}

/// Parse a symbol (identifier)
fn parse_symbol(input: &str) -> IResult<&str, Value> {
    let (rest, candidate) =
        take_while1(|c: char| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
            .parse(input)?;

    if is_valid_symbol(candidate) && at_delimiter(rest) {
        Ok((rest, sym(candidate)))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        )))
    }
}

/// Parse a string literal
fn parse_string(input: &str) -> IResult<&str, Value> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut chars = Vec::new();

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => {
                let text: String = chars.into_iter().collect();
                return Ok((char_iter.as_str(), Value::from(text)));
            }
            Some('\\') => {
                match char_iter.next() {
                    Some('n') => chars.push('\n'),
                    Some('t') => chars.push('\t'),
                    Some('r') => chars.push('\r'),
                    Some('\\') => chars.push('\\'),
                    Some('"') => chars.push('"'),
                    Some(_) => {
                        return Err(nom::Err::Failure(nom::error::Error::new(
                            remaining,
                            ErrorKind::Escaped,
                        )));
                    }
                    None => {
                        // Backslash at end of input
                        return Err(nom::Err::Failure(nom::error::Error::new(
                            remaining,
                            ErrorKind::Verify,
                        )));
                    }
                }
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                chars.push(ch);
                remaining = char_iter.as_str();
            }
            None => {
                // End of input without a closing quote
                return Err(nom::Err::Failure(nom::error::Error::new(
                    remaining,
                    ErrorKind::Verify,
                )));
            }
        }
    }
}

/// Parse a reader abbreviation and wrap its datum in the long form.
fn parse_abbreviation(input: &str, depth: usize) -> IResult<&str, Value> {
    // ",@" must be tried before ","
    let (rest, marker) = alt((tag(",@"), tag("'"), tag("`"), tag(","))).parse(input)?;
    let name = match marker {
        "'" => "quote",
        "`" => "quasiquote",
        "," => "unquote",
        _ => "unquote-splicing",
    };
    let (rest, datum) = parse_datum(rest, depth + 1)?;
    Ok((rest, list([sym(name), datum])))
}

/// Parse a parenthesized list, proper or dotted.
fn parse_list(input: &str, depth: usize) -> IResult<&str, Value> {
    let (mut rest, _) = char('(').parse(input)?;
    let mut elements: Vec<Value> = Vec::new();

    loop {
        let (r, ()) = intertoken_space(rest)?;
        rest = r;

        if let Ok((r, _)) = char::<&str, nom::error::Error<&str>>(')').parse(rest) {
            return Ok((r, list(elements)));
        }

        // A lone "." introduces the dotted tail: exactly one datum, then ")"
        if let Some(after) = rest.strip_prefix('.')
            && at_delimiter(after)
        {
            if elements.is_empty() {
                // "(. x)" has no car for the pair
                return Err(nom::Err::Failure(nom::error::Error::new(
                    rest,
                    ErrorKind::Tag,
                )));
            }
            let (r, tail) = parse_datum(after, depth + 1)?;
            let (r, ()) = intertoken_space(r)?;
            let (r, _) = char(')').parse(r)?;
            let spine = elements.into_iter().rev().fold(tail, |t, h| cons(h, t));
            return Ok((r, spine));
        }

        let (r, datum) = parse_datum(rest, depth + 1)?;
        elements.push(datum);
        rest = r;
    }
}

/// Parse one datum, skipping leading whitespace and comments.
fn parse_datum(input: &str, depth: usize) -> IResult<&str, Value> {
    if depth >= MAX_READ_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    preceded(
        intertoken_space,
        alt((
            |input| parse_abbreviation(input, depth),
            |input| parse_list(input, depth),
            parse_bool,
            parse_number,
            parse_string,
            parse_symbol,
        )),
    )
    .parse(input)
}

/// Read exactly one datum from the input.
///
/// Trailing content after the datum (other than whitespace and comments)
/// is an error; use [`read_program`] for multi-form sources.
pub fn read_form(input: &str) -> Result<Value, Error> {
    match terminated(|i| parse_datum(i, 0), intertoken_space).parse(input) {
        Ok(("", datum)) => Ok(datum),
        Ok((remaining, _)) => Err(Error::ParseError(ParseError::with_context(
            ParseErrorKind::TrailingContent,
            "unexpected input after expression",
            input,
            input.len() - remaining.len(),
        ))),
        Err(e) => Err(Error::ParseError(reader_error(input, e))),
    }
}

/// Read zero or more data until end of input.
pub fn read_program(input: &str) -> Result<Vec<Value>, Error> {
    let mut forms = Vec::new();
    let mut rest = input;
    loop {
        rest = match intertoken_space(rest) {
            Ok((r, ())) => r,
            Err(e) => return Err(Error::ParseError(reader_error(input, e))),
        };
        if rest.is_empty() {
            return Ok(forms);
        }
        match parse_datum(rest, 0) {
            Ok((r, datum)) => {
                forms.push(datum);
                rest = r;
            }
            Err(e) => return Err(Error::ParseError(reader_error(input, e))),
        }
    }
}
