//! This module defines the core expression tree for the interpreter. The main
//! enum, [`Value`], has one case per language data type: numbers (integer and
//! float), symbols, string literals, booleans, nil, lists, unreduced primitive
//! forms, and user-defined procedures. Ergonomic helper functions such as
//! [`val`], [`sym`], and [`nil`] are provided for convenient tree construction
//! in tests, together with conversion traits from common Rust types. Equality
//! and display logic are customized to match the language's semantics: `nil`
//! and the empty list are interchangeable, string literals render bare, and
//! unspecified values never compare equal.

use crate::builtinops::BuiltinOp;
use crate::evaluator::Environment;

/// Type alias for integer values in the interpreter
pub(crate) type NumberType = i64;

/// Type alias for float values in the interpreter
pub(crate) type FloatType = f64;

/// Allowed non-alphanumeric characters in symbol names.
/// Most represent mathematical operators or predicate suffixes ("?").
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "+-*/<>=!?_$";

/// Check if a string is a valid symbol name
/// Valid: non-empty, no leading digit, no "-digit" prefix, alphanumeric + SYMBOL_SPECIAL_CHARS
/// Note: This function is tested as part of the parser tests in parser.rs
pub(crate) fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        None => false, // name is empty
        Some(first_char) => {
            if first_char.is_ascii_digit() {
                return false;
            }

            if first_char == '-'
                && let Some(second_char) = chars.next()
                && second_char.is_ascii_digit()
            {
                return false;
            }

            // Check all characters are valid
            // The first character is checked here again, but it's a cheap operation.
            name.chars()
                .all(|c| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
        }
    }
}

/// Core expression type in the interpreter
///
/// Unquoted `(head args...)` forms whose head is a primitive keyword are
/// compiled to `PrimForm` during parsing; all other parenthesised forms stay
/// `List` and are treated as procedure calls by the evaluator. Quoted list
/// literals also parse to `List`, but reach the evaluator only as inert data
/// behind the `quote` operator.
///
/// To build a tree in tests, use the ergonomic helper functions:
/// - `val(42)` for values, `sym("name")` for symbols, `nil()` for empty lists
/// - `val([1, 2, 3])` for homogeneous lists
/// - `val(vec![sym("f"), val(42)])` for mixed lists
#[derive(Clone)]
pub enum Value {
    /// Integers
    Number(NumberType),
    /// Floats
    Float(FloatType),
    /// Symbols (identifiers)
    Symbol(String),
    /// String literals
    String(String),
    /// Boolean values
    Bool(bool),
    /// The nil literal; equal to, and printed like, the empty list
    Nil,
    /// Lists (list literals, parameter lists, procedure-call forms)
    List(Vec<Value>),
    /// Unreduced application of a primitive operator (compiled during parsing)
    PrimForm {
        op: &'static BuiltinOp,
        args: Vec<Value>,
    },
    /// User-defined procedures (params, body, captured environment chain)
    Function {
        params: Vec<String>,
        body: Box<Value>,
        env: Environment,
    },
    /// Unspecified values (the result of define and set!)
    /// These values never equal themselves or any other value
    Unspecified,
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::String(s) => write!(f, "String(\"{s}\")"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Nil => write!(f, "Nil"),
            Value::List(list) => {
                write!(f, "List(")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
            Value::PrimForm { op, args } => {
                write!(f, "PrimForm({}, args=[", op.keyword)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a:?}")?;
                }
                write!(f, "])")
            }
            // Captured environments are omitted: they may hold the procedure
            // itself (recursive define), which would recurse forever.
            Value::Function { params, body, .. } => {
                write!(f, "Function(params={params:?}, body={body:?})")
            }
            Value::Unspecified => write!(f, "Unspecified"),
        }
    }
}

// From trait implementations for Value - enables .into() conversion

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<FloatType> for Value {
    fn from(x: FloatType) -> Self {
        Value::Float(x)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(n as i64)
            }
        }
    };
}

// Generate From implementations for all integer types
impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType); // Special case - no casting
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(slice: &[T]) -> Self {
        Value::List(slice.iter().cloned().map(|x| x.into()).collect())
    }
}

/// Helper function for creating symbols - works great in mixed lists!
/// Accepts both &str and String
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values - works great in mixed lists!
/// Accepts any type that can be converted to Value
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating empty lists (nil)
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn nil() -> Value {
    Value::List(vec![])
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Symbol(s) => write!(f, "{s}"),
            // String literals render bare: (define greeting "hi") then
            // greeting prints hi, not "hi".
            Value::String(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Nil => write!(f, "()"),
            Value::List(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            Value::PrimForm { op, .. } => match op.keyword {
                "lambda" => write!(f, "<closure>"),
                "define" | "set!" => Ok(()),
                _ => write!(f, "<primitive>"),
            },
            Value::Function { .. } => write!(f, "<procedure>"),
            Value::Unspecified => Ok(()),
        }
    }
}

impl Value {
    /// Reconstruct the source-shaped list for an unreduced form, used when
    /// reporting parse-time arity errors
    pub(crate) fn to_source_form(&self) -> Value {
        match self {
            Value::PrimForm { op, args } => {
                let mut elements = vec![Value::Symbol(op.keyword.to_owned())];
                for arg in args {
                    elements.push(arg.to_source_form());
                }
                Value::List(elements)
            }
            Value::List(elements) => {
                Value::List(elements.iter().map(|e| e.to_source_form()).collect())
            }
            other => other.clone(),
        }
    }

    /// Check if a value represents nil (the nil literal or the empty list)
    #[cfg_attr(not(test), expect(dead_code))]
    pub(crate) fn is_nil(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::List(list) => list.is_empty(),
            _ => false,
        }
    }

    /// View a value as a list slice. `Nil` counts as the empty list.
    pub(crate) fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            Value::Nil => Some(&[]),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // Nil is the empty list: cdr of a one-element list yields Nil,
            // which must compare equal to '().
            (Value::Nil, Value::Nil) => true,
            (Value::Nil, Value::List(l)) | (Value::List(l), Value::Nil) => l.is_empty(),
            (Value::List(a), Value::List(b)) => a == b,
            (
                Value::PrimForm { op: op1, args: args1 },
                Value::PrimForm { op: op2, args: args2 },
            ) => op1.keyword == op2.keyword && args1 == args2,
            (
                Value::Function {
                    params: p1,
                    body: b1,
                    env: e1,
                },
                Value::Function {
                    params: p2,
                    body: b2,
                    env: e2,
                },
            ) => p1 == p2 && b1 == b2 && e1 == e2,
            (Value::Unspecified, _) | (_, Value::Unspecified) => false, // Unspecified never equals anything
            _ => false, // Different variants are never equal
        }
    }
}
