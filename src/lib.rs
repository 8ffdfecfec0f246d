//! Schemin - a minimal Scheme interpreter
//!
//! This crate implements a small Scheme dialect as a four-stage pipeline:
//! textual source is read into a tree of cons cells, macro invocations are
//! rewritten away, the resulting tree is compiled ("analyzed") into a tree
//! of Rust closures, and those closures are driven against lexically scoped
//! environment frames.
//!
//! ```scheme
//! (define (fact n)
//!   (if (< n 2) 1 (* n (fact (- n 1)))))
//! (fact 5)            ; => 120
//! ```
//!
//! The dialect supports first-class procedures with variadic parameters,
//! `set!` mutation, quasiquotation, user-defined procedure macros via
//! `define-macro`, and proper tail calls: every application in tail
//! position is deferred through a trampoline, so self- and mutually
//! recursive loops run in constant stack space.
//!
//! ## Modules
//!
//! - `reader`: s-expression parsing from text
//! - `ast`: the value model (atoms, pairs, procedures)
//! - `evaluator`: macro expansion, analysis, environments, the trampoline
//! - `builtinops`: the primitive procedure registry

use std::fmt;

/// Maximum reader nesting depth. Bounds recursion while parsing so that
/// pathologically nested input fails cleanly instead of overflowing the
/// stack.
pub const MAX_READ_DEPTH: usize = 128;

/// Maximum number of whole-tree macro expansion passes before the
/// expander gives up. Expansion iterates to a fixed point; a macro that
/// keeps producing new macro invocations would otherwise loop forever.
pub const MAX_EXPANSION_PASSES: usize = 1000;

/// Categorizes the different kinds of reader errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// Input ended before the expression was complete (EOF, unclosed parens)
    Incomplete,
    /// A token that began like a number but does not denote one
    InvalidNumber,
    /// A string literal with an escape sequence the reader does not know
    UnknownEscape,
    /// A string literal with no closing quote
    UnterminatedString,
    /// Extra input found after a complete, valid expression
    TrailingContent,
    /// Expression nesting exceeded the maximum read depth
    TooDeeplyNested,
}

/// A structured error providing detailed information about a reader failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
}

impl ParseError {
    /// Create a simple ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Create a ParseError with context extracted from input at a given offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        // Show some context before the error position as well
        let context_start = error_offset.saturating_sub(20);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }

        // Newlines would garble single-line error output
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        ParseError {
            kind,
            message: message.into(),
            context: Some(display_context),
        }
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ParseError(ParseError),
    EvalError(String),
    TypeError(String),
    UnboundVariable(String),
    ArityError {
        expected: usize,
        got: usize,
        /// Optional operation name for context
        operation: Option<String>,
    },
}

impl Error {
    /// Create an ArityError without an operation name
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected,
            got,
            operation: None,
        }
    }

    /// Create an ArityError naming the operation that was misapplied
    pub fn arity_error_in(operation: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected,
            got,
            operation: Some(operation.into()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(e) => {
                write!(f, "ParseError: {}", e.message)?;
                if let Some(context) = &e.context {
                    write!(f, "\nContext: {context}")?;
                }
                Ok(())
            }
            Error::EvalError(msg) => write!(f, "EvaluationError: {msg}"),
            Error::TypeError(msg) => write!(f, "Type error: {msg}"),
            Error::UnboundVariable(var) => write!(f, "Unbound variable: {var}"),
            Error::ArityError {
                expected,
                got,
                operation,
            } => match operation {
                Some(op) => write!(
                    f,
                    "ArityError: {op}: expected {expected} arguments, got {got}"
                ),
                None => write!(
                    f,
                    "ArityError: function expected {expected} arguments but got {got}"
                ),
            },
        }
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod intooperation;
pub mod reader;
