//! The environment chain and the evaluation engine.
//!
//! Environments are chains of frames, innermost first. Frames are shared
//! (`Rc`) and interior-mutable (`RefCell`), so a closure captures the frame
//! chain itself rather than a snapshot of it. That is what makes recursive
//! and forward references work through ordinary lookup: `define` can bind a
//! procedure into the very frame the procedure captured, and the body finds
//! the binding at call time.
//!
//! Evaluation is a depth-tracked recursive descent over the value tree:
//! atoms are identity, symbols resolve through the chain, compiled primitive
//! forms dispatch to their operator, and any other parenthesised form is a
//! procedure call.

use crate::Error;
use crate::MAX_EVAL_DEPTH;
use crate::ast::Value;
use crate::builtinops::OpKind;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Environment for variable bindings: a shared chain of frames
#[derive(Clone)]
pub struct Environment {
    inner: Rc<Frame>,
}

struct Frame {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Environment>,
}

impl Environment {
    /// Create a root environment with an empty frame and no parent
    pub fn new() -> Self {
        Environment {
            inner: Rc::new(Frame {
                bindings: RefCell::new(HashMap::new()),
                parent: None,
            }),
        }
    }

    /// Create a new empty frame whose parent is this environment
    pub fn child(&self) -> Self {
        Environment {
            inner: Rc::new(Frame {
                bindings: RefCell::new(HashMap::new()),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Bind a name in the current frame, replacing any existing binding here.
    /// Outer frames are never touched.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.inner.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Look a name up, walking from the current frame outward
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = self;
        loop {
            if let Some(value) = current.inner.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            match &current.inner.parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Check whether a name resolves anywhere in the chain
    pub fn has(&self, name: &str) -> bool {
        let mut current = self;
        loop {
            if current.inner.bindings.borrow().contains_key(name) {
                return true;
            }
            match &current.inner.parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Overwrite an existing binding in the frame that owns it. Fails when
    /// the name resolves nowhere in the chain.
    pub fn set(&self, name: &str, value: Value) -> Result<(), Error> {
        let mut current = self;
        loop {
            if current.inner.bindings.borrow().contains_key(name) {
                current
                    .inner
                    .bindings
                    .borrow_mut()
                    .insert(name.to_owned(), value);
                return Ok(());
            }
            match &current.inner.parent {
                Some(parent) => current = parent,
                None => return Err(Error::UnboundIdentifier(name.to_owned())),
            }
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// Identity comparison: two environment handles are equal when they share the
// same frame. Structural comparison would recurse through captured closures.
impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Bindings may contain closures that captured this frame; printing
        // them would never terminate. Names only.
        let mut names: Vec<String> = self.inner.bindings.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

/// Create the global environment. The global frame starts empty: primitives
/// are keywords compiled away during parsing, not first-class bindings.
pub fn create_global_env() -> Environment {
    Environment::new()
}

/// Evaluate an expression (public API)
pub fn eval(expr: &Value, env: &Environment) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, env, 0)
}

/// Evaluate an expression with depth tracking to prevent stack overflow
fn eval_with_depth_tracking(expr: &Value, env: &Environment, depth: usize) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::Eval(format!(
            "evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
        )));
    }
    match expr {
        // Self-evaluating forms
        Value::Number(_)
        | Value::Float(_)
        | Value::String(_)
        | Value::Bool(_)
        | Value::Nil
        | Value::Function { .. }
        | Value::Unspecified => Ok(expr.clone()),

        // Variable lookup
        Value::Symbol(name) => env
            .get(name)
            .ok_or_else(|| Error::UnboundIdentifier(name.clone())),

        // Compiled primitive form. Strict operators get their arguments
        // reduced left-to-right; special forms get them raw plus the
        // environment and handle their own recursion.
        // Arity was already validated at parse time.
        Value::PrimForm { op, args } => match &op.op_kind {
            OpKind::Function(func) => {
                let evaluated_args = eval_args(args, env, depth)?;
                func(&evaluated_args)
            }
            OpKind::SpecialForm(special_form) => special_form(args, env, depth),
        },

        // Any other parenthesised form is a procedure call
        Value::List(elements) => eval_call(elements, env, depth),
    }
}

/// Helper function to evaluate a sequence of argument expressions in order
fn eval_args(args: &[Value], env: &Environment, depth: usize) -> Result<Vec<Value>, Error> {
    args.iter()
        .map(|arg| eval_with_depth_tracking(arg, env, depth + 1))
        .collect()
}

/// Evaluate a procedure-call form `(f a1 a2 ...)`
fn eval_call(elements: &[Value], env: &Environment, depth: usize) -> Result<Value, Error> {
    match elements {
        [] => Err(Error::Eval("cannot evaluate the empty form ()".to_owned())),

        [func_expr, arg_exprs @ ..] => {
            // Calling a name that resolves nowhere is an unbound-procedure
            // failure, distinct from an unbound identifier in operand position
            if let Value::Symbol(name) = func_expr
                && !env.has(name)
            {
                return Err(Error::UnboundProcedure(name.clone()));
            }

            let func = eval_with_depth_tracking(func_expr, env, depth + 1)?;
            let args = eval_args(arg_exprs, env, depth)?;
            apply_function(&func, args, depth)
        }
    }
}

/// Apply a procedure value to already-evaluated arguments: fresh frame on the
/// captured chain, parameters bound in order, body evaluated there.
fn apply_function(func: &Value, args: Vec<Value>, depth: usize) -> Result<Value, Error> {
    match func {
        Value::Function {
            params,
            body,
            env: closure_env,
        } => {
            if params.len() != args.len() {
                return Err(Error::arity(params.len(), args.len()));
            }

            let call_env = closure_env.child();
            for (param, arg) in params.iter().zip(args) {
                call_env.define(param.clone(), arg);
            }

            eval_with_depth_tracking(body, &call_env, depth + 1)
        }
        other => Err(Error::Type(format!(
            "cannot apply non-procedure value: {other:?}"
        ))),
    }
}

/// Truthiness for `if`: the true literal and positive numbers. Everything
/// else, including nil, zero, and negatives, is falsey.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => *n > 0,
        Value::Float(x) => *x > 0.0,
        _ => false,
    }
}

/// Evaluate the `if` special form: reduce the condition, then only the
/// selected branch.
pub(crate) fn eval_if(args: &[Value], env: &Environment, depth: usize) -> Result<Value, Error> {
    let [cond_expr, then_expr, else_expr] = args else {
        return Err(Error::arity(3, args.len()));
    };
    let cond = eval_with_depth_tracking(cond_expr, env, depth + 1)?;
    if is_truthy(&cond) {
        eval_with_depth_tracking(then_expr, env, depth + 1)
    } else {
        eval_with_depth_tracking(else_expr, env, depth + 1)
    }
}

/// Evaluate the `define` special form: bind the reduced value in the current
/// frame.
pub(crate) fn eval_define(args: &[Value], env: &Environment, depth: usize) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            let value = eval_with_depth_tracking(expr, env, depth + 1)?;
            env.define(name.clone(), value);
            Ok(Value::Unspecified)
        }
        [_, _] => Err(Error::Type("'define' requires a symbol name".to_owned())),
        _ => Err(Error::arity(2, args.len())),
    }
}

/// Evaluate the `set!` special form: overwrite the owning frame's binding,
/// failing on names that resolve nowhere.
pub(crate) fn eval_set(args: &[Value], env: &Environment, depth: usize) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            let value = eval_with_depth_tracking(expr, env, depth + 1)?;
            env.set(name, value)?;
            Ok(Value::Unspecified)
        }
        [_, _] => Err(Error::Type("'set!' requires a symbol name".to_owned())),
        _ => Err(Error::arity(2, args.len())),
    }
}

/// Evaluate the `lambda` special form into a procedure value capturing the
/// current environment chain.
pub(crate) fn eval_lambda(args: &[Value], env: &Environment, _depth: usize) -> Result<Value, Error> {
    let [params_expr, body] = args else {
        return Err(Error::arity(2, args.len()));
    };
    let Value::List(param_list) = params_expr else {
        return Err(Error::MalformedParameter(
            "lambda parameters must be a parenthesised list".to_owned(),
        ));
    };

    let mut params = Vec::with_capacity(param_list.len());
    for param in param_list {
        match param {
            Value::Symbol(name) => {
                if params.contains(name) {
                    return Err(Error::MalformedParameter(format!(
                        "duplicate parameter name: {name}"
                    )));
                }
                params.push(name.clone());
            }
            other => {
                return Err(Error::MalformedParameter(format!(
                    "parameter is not an identifier: {other:?}"
                )));
            }
        }
    }

    Ok(Value::Function {
        params,
        body: Box::new(body.clone()),
        env: env.clone(),
    })
}

/// Evaluate the `quote` special form: the datum, untouched
pub(crate) fn eval_quote(args: &[Value], _env: &Environment, _depth: usize) -> Result<Value, Error> {
    match args {
        [datum] => Ok(datum.clone()),
        _ => Err(Error::arity(1, args.len())),
    }
}

/// Evaluate the `map` special form: apply a one-argument procedure to each
/// list element, collecting the results.
pub(crate) fn eval_map(args: &[Value], env: &Environment, depth: usize) -> Result<Value, Error> {
    let (func, elements) = eval_procedure_and_list("map", args, env, depth)?;
    let mut results = Vec::with_capacity(elements.len());
    for element in &elements {
        results.push(apply_function(&func, vec![element.clone()], depth)?);
    }
    Ok(Value::List(results))
}

/// Evaluate the `filter` special form: keep the elements for which the
/// predicate returns the true literal. A non-boolean predicate result is a
/// type error.
pub(crate) fn eval_filter(args: &[Value], env: &Environment, depth: usize) -> Result<Value, Error> {
    let (pred, elements) = eval_procedure_and_list("filter", args, env, depth)?;
    let mut kept = Vec::new();
    for element in &elements {
        match apply_function(&pred, vec![element.clone()], depth)? {
            Value::Bool(true) => kept.push(element.clone()),
            Value::Bool(false) => {}
            other => {
                return Err(Error::Type(format!(
                    "'filter' predicate must return a boolean, got {other:?}"
                )));
            }
        }
    }
    Ok(Value::List(kept))
}

/// Shared argument reduction for `map` and `filter`: a procedure and a list
fn eval_procedure_and_list(
    op: &str,
    args: &[Value],
    env: &Environment,
    depth: usize,
) -> Result<(Value, Vec<Value>), Error> {
    let [func_expr, list_expr] = args else {
        return Err(Error::arity(2, args.len()));
    };
    let func = eval_with_depth_tracking(func_expr, env, depth + 1)?;
    if !matches!(func, Value::Function { .. }) {
        return Err(Error::Type(format!(
            "'{op}' requires a procedure as its first argument, got {func:?}"
        )));
    }
    let list_val = eval_with_depth_tracking(list_expr, env, depth + 1)?;
    match list_val.as_list() {
        Some(elements) => Ok((func, elements.to_vec())),
        None => Err(Error::Type(format!(
            "'{op}' requires a list as its second argument, got {list_val:?}"
        ))),
    }
}
