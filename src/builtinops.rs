//! Primitive operator registry.
//!
//! Every keyword of the language maps to one [`BuiltinOp`] record holding its
//! implementation and arity. The parser consults this table to compile
//! `(keyword args...)` forms into `PrimForm` nodes and to reject arity
//! mismatches before evaluation starts.
//!
//! ## Functions vs Special Forms
//!
//! - **Functions**: strict operators applied to already-evaluated arguments
//!   (e.g. `+`, `car`, `number?`)
//! - **Special Forms**: operators that control the evaluation of their
//!   arguments or need the environment (e.g. `if`, `define`, `lambda`,
//!   `map`)
//!
//! Special form implementations live in the evaluator; this module carries
//! the strict operators and the registry itself.
//!
//! ## Numeric model
//!
//! Arithmetic works over 64-bit integers and doubles. Integer accumulation
//! uses checked operations and reports overflow as an error; the first float
//! operand switches a fold to float arithmetic. `+` and `*` collapse an
//! integral float result back to an integer, `-` and `/` keep the float.

use crate::Error;
use crate::ast::{FloatType, NumberType, Value};
use crate::evaluator::{
    Environment, eval_define, eval_filter, eval_if, eval_lambda, eval_map, eval_quote, eval_set,
};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Expected number of arguments for a builtin operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    /// Exactly this many arguments
    Exact(usize),
    /// This many arguments or more
    AtLeast(usize),
    /// Any number of arguments
    Any,
}

impl Arity {
    /// Check an argument count against this arity requirement
    pub(crate) fn validate(&self, arg_count: usize) -> Result<(), Error> {
        match self {
            Arity::Exact(n) if arg_count == *n => Ok(()),
            Arity::AtLeast(n) if arg_count >= *n => Ok(()),
            Arity::Any => Ok(()),
            Arity::Exact(n) | Arity::AtLeast(n) => Err(Error::arity(*n, arg_count)),
        }
    }
}

/// Represents the implementation of a builtin operator
#[derive(Clone)]
pub enum OpKind {
    /// Strict operator: receives its arguments already evaluated
    Function(fn(&[Value]) -> Result<Value, Error>),
    /// Special form: receives unevaluated arguments, the environment, and the
    /// current evaluation depth
    SpecialForm(fn(&[Value], &Environment, usize) -> Result<Value, Error>),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Definition of a builtin operator
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// The source keyword for this operator
    pub keyword: &'static str,
    /// The implementation (strict function or special form)
    pub op_kind: OpKind,
    /// Expected number of arguments, validated at parse time
    pub arity: Arity,
}

impl BuiltinOp {
    /// Check if this operator is a special form
    #[cfg_attr(not(test), expect(dead_code))]
    pub(crate) fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }

    /// Check if the given number of arguments is valid for this operator
    pub(crate) fn validate_arity(&self, arg_count: usize) -> Result<(), Error> {
        self.arity.validate(arg_count)
    }
}

//
// Numeric helpers
//

/// A number mid-fold: integer until the first float operand appears
#[derive(Clone, Copy)]
enum Num {
    Int(NumberType),
    Float(FloatType),
}

impl Num {
    fn to_float(self) -> FloatType {
        match self {
            Num::Int(n) => n as FloatType,
            Num::Float(x) => x,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(n) => n == 0,
            Num::Float(x) => x == 0.0,
        }
    }
}

fn as_num(value: &Value, op: &str) -> Result<Num, Error> {
    match value {
        Value::Number(n) => Ok(Num::Int(*n)),
        Value::Float(x) => Ok(Num::Float(*x)),
        other => Err(Error::Type(format!(
            "'{op}' requires numeric arguments, got {other:?}"
        ))),
    }
}

/// Fold result rule for `+` and `*`: a float that lost its fractional part
/// along the way comes back as an integer.
fn collapse_integral(n: Num) -> Value {
    match n {
        Num::Int(i) => Value::Number(i),
        Num::Float(f) => {
            if f.is_finite()
                && f.fract() == 0.0
                && f >= NumberType::MIN as FloatType
                && f <= NumberType::MAX as FloatType
            {
                Value::Number(f as NumberType)
            } else {
                Value::Float(f)
            }
        }
    }
}

//
// Builtin function implementations
//

fn builtin_add(args: &[Value]) -> Result<Value, Error> {
    let mut sum = Num::Int(0);
    for arg in args {
        sum = match (sum, as_num(arg, "+")?) {
            (Num::Int(a), Num::Int(b)) => Num::Int(
                a.checked_add(b)
                    .ok_or_else(|| Error::Eval("integer overflow in addition".into()))?,
            ),
            (a, b) => Num::Float(a.to_float() + b.to_float()),
        };
    }
    Ok(collapse_integral(sum))
}

fn builtin_mul(args: &[Value]) -> Result<Value, Error> {
    let mut product = Num::Int(1);
    for arg in args {
        product = match (product, as_num(arg, "*")?) {
            (Num::Int(a), Num::Int(b)) => Num::Int(
                a.checked_mul(b)
                    .ok_or_else(|| Error::Eval("integer overflow in multiplication".into()))?,
            ),
            (a, b) => Num::Float(a.to_float() * b.to_float()),
        };
    }
    Ok(collapse_integral(product))
}

fn builtin_sub(args: &[Value]) -> Result<Value, Error> {
    let [lhs, rhs] = args else {
        return Err(Error::arity(2, args.len()));
    };
    match (as_num(lhs, "-")?, as_num(rhs, "-")?) {
        (Num::Int(a), Num::Int(b)) => a
            .checked_sub(b)
            .map(Value::Number)
            .ok_or_else(|| Error::Eval("integer overflow in subtraction".into())),
        (a, b) => Ok(Value::Float(a.to_float() - b.to_float())),
    }
}

fn builtin_div(args: &[Value]) -> Result<Value, Error> {
    let [lhs, rhs] = args else {
        return Err(Error::arity(2, args.len()));
    };
    let divisor = as_num(rhs, "/")?;
    if divisor.is_zero() {
        return Err(Error::DivisionByZero("division by zero in '/'".into()));
    }
    match (as_num(lhs, "/")?, divisor) {
        // Integer division truncates
        (Num::Int(a), Num::Int(b)) => a
            .checked_div(b)
            .map(Value::Number)
            .ok_or_else(|| Error::Eval("integer overflow in division".into())),
        (a, b) => Ok(Value::Float(a.to_float() / b.to_float())),
    }
}

fn builtin_mod(args: &[Value]) -> Result<Value, Error> {
    let [lhs, rhs] = args else {
        return Err(Error::arity(2, args.len()));
    };
    match (lhs, rhs) {
        (Value::Number(_), Value::Number(0)) => {
            Err(Error::DivisionByZero("division by zero in 'mod'".into()))
        }
        (Value::Number(a), Value::Number(b)) => a
            .checked_rem(*b)
            .map(Value::Number)
            .ok_or_else(|| Error::Eval("integer overflow in modulo".into())),
        _ => Err(Error::Type("'mod' requires integer arguments".into())),
    }
}

// Macro to generate the numeric comparison operators. Comparisons take
// exactly two operands and compare across integer/float freely.
macro_rules! numeric_comparison {
    ($name:ident, $op:tt, $op_str:expr) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            let [lhs, rhs] = args else {
                return Err(Error::arity(2, args.len()));
            };
            let result = match (as_num(lhs, $op_str)?, as_num(rhs, $op_str)?) {
                (Num::Int(a), Num::Int(b)) => a $op b,
                (a, b) => a.to_float() $op b.to_float(),
            };
            Ok(Value::Bool(result))
        }
    };
}

numeric_comparison!(builtin_gt, >, ">");
numeric_comparison!(builtin_lt, <, "<");
numeric_comparison!(builtin_ge, >=, ">=");
numeric_comparison!(builtin_le, <=, "<=");

// Macro to generate the type predicates: one evaluated argument, tag check.
macro_rules! type_predicate {
    ($name:ident, $pattern:pat) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            let [arg] = args else {
                return Err(Error::arity(1, args.len()));
            };
            Ok(Value::Bool(matches!(arg, $pattern)))
        }
    };
}

type_predicate!(builtin_is_number, Value::Number(_) | Value::Float(_));
type_predicate!(builtin_is_symbol, Value::Symbol(_));
type_predicate!(builtin_is_procedure, Value::Function { .. });
type_predicate!(builtin_is_list, Value::List(_) | Value::Nil);
type_predicate!(builtin_is_boolean, Value::Bool(_));
type_predicate!(builtin_is_string, Value::String(_));

fn builtin_null(args: &[Value]) -> Result<Value, Error> {
    let [arg] = args else {
        return Err(Error::arity(1, args.len()));
    };
    match arg.as_list() {
        Some(list) => Ok(Value::Bool(list.is_empty())),
        None => Err(Error::Type(format!(
            "'null?' requires a list argument, got {arg:?}"
        ))),
    }
}

fn builtin_car(args: &[Value]) -> Result<Value, Error> {
    let [arg] = args else {
        return Err(Error::arity(1, args.len()));
    };
    match arg.as_list() {
        Some(list) => Ok(list.first().cloned().unwrap_or(Value::Nil)),
        None => Err(Error::Type(format!(
            "'car' requires a list argument, got {arg:?}"
        ))),
    }
}

fn builtin_cdr(args: &[Value]) -> Result<Value, Error> {
    let [arg] = args else {
        return Err(Error::arity(1, args.len()));
    };
    match arg.as_list() {
        // The tail of a list shorter than two elements is nil
        Some(list) if list.len() < 2 => Ok(Value::Nil),
        Some(list) => Ok(Value::List(list[1..].to_vec())),
        None => Err(Error::Type(format!(
            "'cdr' requires a list argument, got {arg:?}"
        ))),
    }
}

fn builtin_cons(args: &[Value]) -> Result<Value, Error> {
    let [first, rest] = args else {
        return Err(Error::arity(2, args.len()));
    };
    // Nil is the empty list, so it is rejected here too
    if first.as_list().is_some() {
        return Err(Error::Type(
            "'cons' cannot take a list as its first argument".into(),
        ));
    }
    match rest.as_list() {
        Some(tail) => {
            let mut new_list = Vec::with_capacity(tail.len() + 1);
            new_list.push(first.clone());
            new_list.extend_from_slice(tail);
            Ok(Value::List(new_list))
        }
        None => Err(Error::Type(
            "'cons' requires a list as its second argument".into(),
        )),
    }
}

fn builtin_append(args: &[Value]) -> Result<Value, Error> {
    let [lhs, rhs] = args else {
        return Err(Error::arity(2, args.len()));
    };
    match (lhs.as_list(), rhs.as_list()) {
        (Some(a), Some(b)) => {
            let mut joined = Vec::with_capacity(a.len() + b.len());
            joined.extend_from_slice(a);
            joined.extend_from_slice(b);
            Ok(Value::List(joined))
        }
        _ => Err(Error::Type("'append' requires two list arguments".into())),
    }
}

/// Global registry of all builtin operators, in keyword-table order.
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    vec![
        // Control flow and binding
        BuiltinOp {
            keyword: "if",
            op_kind: OpKind::SpecialForm(eval_if),
            arity: Arity::Exact(3),
        },
        BuiltinOp {
            keyword: "define",
            op_kind: OpKind::SpecialForm(eval_define),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: "set!",
            op_kind: OpKind::SpecialForm(eval_set),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: "lambda",
            op_kind: OpKind::SpecialForm(eval_lambda),
            arity: Arity::Exact(2),
        },
        // Quote is the longhand spelling of the '(...) reader syntax
        BuiltinOp {
            keyword: "quote",
            op_kind: OpKind::SpecialForm(eval_quote),
            arity: Arity::Exact(1),
        },
        // Arithmetic
        BuiltinOp {
            keyword: "+",
            op_kind: OpKind::Function(builtin_add),
            arity: Arity::Any,
        },
        BuiltinOp {
            keyword: "-",
            op_kind: OpKind::Function(builtin_sub),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: "*",
            op_kind: OpKind::Function(builtin_mul),
            arity: Arity::Any,
        },
        BuiltinOp {
            keyword: "/",
            op_kind: OpKind::Function(builtin_div),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: "mod",
            op_kind: OpKind::Function(builtin_mod),
            arity: Arity::Exact(2),
        },
        // Comparison
        BuiltinOp {
            keyword: ">",
            op_kind: OpKind::Function(builtin_gt),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: "<",
            op_kind: OpKind::Function(builtin_lt),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: ">=",
            op_kind: OpKind::Function(builtin_ge),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: "<=",
            op_kind: OpKind::Function(builtin_le),
            arity: Arity::Exact(2),
        },
        // Type predicates
        BuiltinOp {
            keyword: "number?",
            op_kind: OpKind::Function(builtin_is_number),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            keyword: "symbol?",
            op_kind: OpKind::Function(builtin_is_symbol),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            keyword: "procedure?",
            op_kind: OpKind::Function(builtin_is_procedure),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            keyword: "list?",
            op_kind: OpKind::Function(builtin_is_list),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            keyword: "boolean?",
            op_kind: OpKind::Function(builtin_is_boolean),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            keyword: "string?",
            op_kind: OpKind::Function(builtin_is_string),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            keyword: "null?",
            op_kind: OpKind::Function(builtin_null),
            arity: Arity::Exact(1),
        },
        // List operations
        BuiltinOp {
            keyword: "car",
            op_kind: OpKind::Function(builtin_car),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            keyword: "cdr",
            op_kind: OpKind::Function(builtin_cdr),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            keyword: "cons",
            op_kind: OpKind::Function(builtin_cons),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: "append",
            op_kind: OpKind::Function(builtin_append),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: "map",
            op_kind: OpKind::SpecialForm(eval_map),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            keyword: "filter",
            op_kind: OpKind::SpecialForm(eval_filter),
            arity: Arity::Exact(2),
        },
    ]
});

/// Lazy static map from keyword to BuiltinOp (private - use find_op)
static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static BuiltinOp>> = LazyLock::new(|| {
    let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
    ops.iter().map(|op| (op.keyword, op)).collect()
});

/// Find a builtin operator by its source keyword
pub(crate) fn find_op(keyword: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_INDEX.get(keyword).copied()
}

/// Get the quote operator - guaranteed to exist
pub(crate) fn get_quote_op() -> &'static BuiltinOp {
    find_op("quote").expect("quote operator must be registered")
}
