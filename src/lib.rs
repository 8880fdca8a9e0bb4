//! nscm - a small Scheme-like expression language
//!
//! This crate implements a classical tree-walking interpreter: source text is
//! parsed into a typed expression tree, which is then reduced against a
//! lexically-scoped environment chain. The language covers the usual core of
//! a minimal Scheme: integer and float arithmetic, comparisons, type
//! predicates, list operations, `if`/`define`/`set!`/`lambda`, quoted list
//! literals, and user-defined procedures with closure capture and recursion.
//!
//! ```scheme
//! (define fact (lambda (n) (if (< n 2) 1 (* n (fact (- n 1))))))
//! (fact 10)                               ; => 3628800
//! (map (lambda (x) (* x x)) '(1 2 3 4))  ; => (1 4 9 16)
//! ```
//!
//! ## Modules
//!
//! - `ast`: the tagged `Value` expression tree
//! - `parser`: s-expression parsing from text
//! - `builtinops`: the primitive operator registry and strict operators
//! - `evaluator`: the environment chain and the evaluation engine
//!
//! The `nscm` binary wires these into a REPL and a `.scm` file runner.

use std::fmt;

/// Maximum parsing depth to prevent stack overflow from deeply nested input
pub const MAX_PARSE_DEPTH: usize = 32;

/// Maximum evaluation depth to prevent stack overflow in recursive evaluation.
/// Set well above the parse depth so legitimately recursive user procedures
/// have headroom before the guard trips.
pub const MAX_EVAL_DEPTH: usize = 4096;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// An opening bracket with no matching close before end of input
    UnmatchedBracket,
    /// A closing bracket with no matching open
    UnmatchedClose,
    /// Empty input where at least one expression was required
    EmptyExpression,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
    /// Extra input found after a complete, valid expression
    TrailingContent,
    /// Valid-looking syntax that this language intentionally rejects
    Unsupported,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    /// Create a ParseError with all fields
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a simple ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError carrying a one-line snippet of the input around
    /// the failure offset, with truncation marked by an ellipsis on either
    /// side.
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        // A short lead-in before the failure, then the snippet itself
        const LEAD_IN: usize = 16;
        const SNIPPET: usize = 60;

        let skipped = input
            .char_indices()
            .take_while(|(byte_pos, _)| *byte_pos < error_offset)
            .count()
            .saturating_sub(LEAD_IN);

        let mut context = String::new();
        if skipped > 0 {
            context.push_str("...");
        }
        let mut window = input.chars().skip(skipped);
        for ch in window.by_ref().take(SNIPPET) {
            match ch {
                '\n' => context.push_str("\\n"),
                '\r' => {}
                other => context.push(other),
            }
        }
        if window.next().is_some() {
            context.push_str("...");
        }

        Self::new(kind, message, Some(context), None)
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed tokens or brackets
    Syntax(ParseError),
    /// Wrong argument count for a form or procedure call
    Arity {
        expected: usize,
        got: usize,
        expression: Option<String>,
    },
    /// Operand type does not match an operator's contract
    Type(String),
    /// `/` or `mod` with a zero divisor
    DivisionByZero(String),
    /// Lookup of an unknown name at evaluation time
    UnboundIdentifier(String),
    /// Attempt to call an unresolved name
    UnboundProcedure(String),
    /// Procedure parameter list element that is not an identifier
    MalformedParameter(String),
    /// Evaluation-machinery failures: depth limit, arithmetic overflow,
    /// application of an empty form
    Eval(String),
}

impl Error {
    /// Create an arity error without expression context
    pub fn arity(expected: usize, got: usize) -> Self {
        Error::Arity {
            expected,
            got,
            expression: None,
        }
    }

    /// Create an arity error with expression context
    pub fn arity_with_expr(expected: usize, got: usize, expression: String) -> Self {
        Error::Arity {
            expected,
            got,
            expression: Some(expression),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Syntax(e) => {
                write!(f, "SyntaxError: {}", e.message)?;
                if let Some(found) = &e.found {
                    write!(f, "\nFound: {found}")?;
                }
                if let Some(context) = &e.context {
                    write!(f, "\nContext: {context}")?;
                }
                Ok(())
            }
            Error::Arity {
                expected,
                got,
                expression,
            } => match expression {
                Some(expr) => write!(
                    f,
                    "ArityMismatch: expression {expr}: expected {expected} arguments, got {got}"
                ),
                None => write!(f, "ArityMismatch: expected {expected} arguments, got {got}"),
            },
            Error::Type(msg) => write!(f, "TypeError: {msg}"),
            Error::DivisionByZero(msg) => write!(f, "DivisionByZero: {msg}"),
            Error::UnboundIdentifier(name) => write!(f, "UnboundIdentifier: '{name}'"),
            Error::UnboundProcedure(name) => write!(f, "UnboundProcedure: '{name}'"),
            Error::MalformedParameter(msg) => write!(f, "MalformedParameter: {msg}"),
            Error::Eval(msg) => write!(f, "EvaluationError: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod parser;
