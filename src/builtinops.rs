//! Built-in procedure registry.
//!
//! Every primitive the dialect exposes is defined here once, as a plain
//! typed Rust function, and wired through the adapter layer in
//! [`crate::intooperation`] into the erased signature the evaluator
//! calls. The registry pairs each implementation with its name and arity;
//! arity is validated before the call, so the implementations can assume
//! a well-shaped argument vector.
//!
//! ## Functions, not special forms
//!
//! Builtins receive fully evaluated arguments. Forms that control
//! evaluation (`if`, `and`, `quote`, ...) are recognized by the analyzer
//! and never appear in this table.
//!
//! ## Adding a new operation
//!
//! 1. Implement it as a typed function (use a [`Rest`] tail for variadic
//!    operations) or, when it needs raw values, with the erased
//!    signature directly.
//! 2. Add a registry entry with its name and [`Arity`].
//! 3. Add cases to the data-driven test table below.

use std::rc::Rc;

use crate::Error;
use crate::ast::{self, Builtin, NumberType, Value};
use crate::evaluator::call_procedure;
use crate::intooperation::{IntoOperation, IntoVariadicOperation, OperationFn, Rest};

/// Expected number of arguments for a builtin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Check whether the given argument count is acceptable.
    pub(crate) fn validate(&self, operation: &str, got: usize) -> Result<(), Error> {
        let expected = match self {
            Arity::Exact(n) if got != *n => *n,
            Arity::AtLeast(n) if got < *n => *n,
            _ => return Ok(()),
        };
        Err(Error::arity_error_in(operation, expected, got))
    }
}

/// Definition of a built-in operation.
pub(crate) struct BuiltinOp {
    /// The identifier the operation is bound to in the global frame
    pub id: &'static str,
    /// Expected number of arguments, validated before the call
    pub arity: Arity,
    /// The erased implementation
    pub func: Rc<OperationFn>,
}

//
// Builtin implementations
//

fn builtin_add(args: Rest<NumberType>) -> NumberType {
    args.iter().sum()
}

fn builtin_sub(first: NumberType, rest: Rest<NumberType>) -> NumberType {
    if rest.is_empty() {
        -first
    } else {
        rest.iter().fold(first, |acc, n| acc - n)
    }
}

fn builtin_mul(args: Rest<NumberType>) -> NumberType {
    args.iter().product()
}

fn builtin_div(first: NumberType, rest: Rest<NumberType>) -> NumberType {
    if rest.is_empty() {
        1.0 / first
    } else {
        rest.iter().fold(first, |acc, n| acc / n)
    }
}

fn builtin_abs(n: NumberType) -> NumberType {
    n.abs()
}

fn builtin_sqrt(n: NumberType) -> NumberType {
    n.sqrt()
}

fn builtin_floor(n: NumberType) -> NumberType {
    n.floor()
}

fn builtin_ceiling(n: NumberType) -> NumberType {
    n.ceil()
}

fn builtin_truncate(n: NumberType) -> NumberType {
    n.trunc()
}

fn builtin_round(n: NumberType) -> NumberType {
    n.round()
}

/// Result carries the sign of the dividend.
fn builtin_remainder(a: NumberType, b: NumberType) -> NumberType {
    a % b
}

/// Result carries the sign of the divisor.
fn builtin_modulo(a: NumberType, b: NumberType) -> NumberType {
    ((a % b) + b) % b
}

// Macro to generate numeric comparison functions: n-ary chains, true iff
// every adjacent pair satisfies the relation.
macro_rules! numeric_comparison {
    ($name:ident, $op:tt) => {
        #[allow(clippy::float_cmp)] // numeric = compares raw host doubles
        fn $name(first: NumberType, rest: Rest<NumberType>) -> bool {
            let mut prev = first;
            for &current in rest.iter() {
                if !(prev $op current) {
                    return false;
                }
                prev = current;
            }
            true
        }
    };
}

numeric_comparison!(builtin_lt, <);
numeric_comparison!(builtin_gt, >);
numeric_comparison!(builtin_le, <=);
numeric_comparison!(builtin_ge, >=);
numeric_comparison!(builtin_num_eq, ==);

fn builtin_cons(car: Value, cdr: Value) -> Value {
    ast::cons(car, cdr)
}

fn builtin_car(value: Value) -> Result<Value, Error> {
    match value {
        Value::Pair(p) => Ok(p.car.clone()),
        other => Err(Error::TypeError(format!("car: expected cons, got {other}"))),
    }
}

fn builtin_cdr(value: Value) -> Result<Value, Error> {
    match value {
        Value::Pair(p) => Ok(p.cdr.clone()),
        other => Err(Error::TypeError(format!("cdr: expected cons, got {other}"))),
    }
}

fn builtin_is_null(value: Value) -> bool {
    matches!(value, Value::Nil)
}

fn builtin_is_pair(value: Value) -> bool {
    matches!(value, Value::Pair(_))
}

fn builtin_is_list(value: Value) -> bool {
    value.is_proper_list()
}

fn builtin_is_symbol(value: Value) -> bool {
    matches!(value, Value::Symbol(_))
}

fn builtin_is_procedure(value: Value) -> bool {
    matches!(value, Value::Builtin(_) | Value::Closure(_))
}

/// `eq?` and `eqv?`: structural equality for numbers, booleans, nil,
/// strings, and symbols (by name); identity for pairs and procedures.
fn builtin_eq(a: Value, b: Value) -> bool {
    match (&a, &b) {
        // Raw host equality; NaN behavior is host-dependent
        #[allow(clippy::float_cmp)]
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Nil, Value::Nil) => true,
        (Value::Pair(x), Value::Pair(y)) => Rc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => Rc::ptr_eq(x, y),
        (Value::Closure(x), Value::Closure(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

fn builtin_not(value: Value) -> bool {
    !value.is_truthy()
}

fn builtin_list(args: Rest<Value>) -> Value {
    ast::list(args.into_vec())
}

fn builtin_length(value: Value) -> Result<NumberType, Error> {
    match value.list_elements() {
        Some(items) => Ok(items.len() as NumberType),
        None => Err(Error::TypeError(format!(
            "length: expected a list, got {value}"
        ))),
    }
}

/// `(append list... tail)`: every argument but the last must be a proper
/// list; the last supplies the result's tail and may be any value.
fn builtin_append(args: Rest<Value>) -> Result<Value, Error> {
    let mut args = args.into_vec();
    let Some(last) = args.pop() else {
        return Ok(Value::Nil);
    };
    let mut result = last;
    for arg in args.iter().rev() {
        let Some(items) = arg.list_elements() else {
            return Err(Error::TypeError(format!(
                "append: expected a list, got {arg}"
            )));
        };
        for item in items.into_iter().rev() {
            result = ast::cons(item, result);
        }
    }
    Ok(result)
}

/// `(apply proc arg... list)`: call `proc` with the intermediate
/// arguments followed by the elements of the final list.
fn builtin_apply(mut args: Vec<Value>) -> Result<Value, Error> {
    let Some(last) = args.pop() else {
        return Err(Error::arity_error_in("apply", 2, 0));
    };
    if args.is_empty() {
        return Err(Error::arity_error_in("apply", 2, 1));
    }
    let func = args.remove(0);
    let Some(tail) = last.list_elements() else {
        return Err(Error::TypeError(
            "apply: last argument must be a list".to_owned(),
        ));
    };
    let mut call_args = args;
    call_args.extend(tail);
    call_procedure(func, call_args)
}

/// `(log arg...)`: format each argument (strings raw, everything else
/// through the printer) and emit one line to the host.
fn builtin_log(args: Vec<Value>) -> Result<Value, Error> {
    println!("{}", format_fragments(&args));
    Ok(Value::Nil)
}

/// `(error arg...)`: abort the current top-level form with a message
/// built from the arguments.
fn builtin_error(args: Vec<Value>) -> Result<Value, Error> {
    let message = if args.is_empty() {
        "Error".to_owned()
    } else {
        format_fragments(&args)
    };
    Err(Error::EvalError(message))
}

/// Strings render raw, everything else through the printer.
fn format_fragments(args: &[Value]) -> String {
    let parts: Vec<String> = args
        .iter()
        .map(|value| match value {
            Value::String(s) => s.to_string(),
            other => format!("{other}"),
        })
        .collect();
    parts.join(" ")
}

/// All built-in operations.
///
/// The table is built per interpreter instance: builtin values hold
/// `Rc`s, which rules out a process-wide static registry.
pub(crate) fn builtin_ops() -> Vec<BuiltinOp> {
    fn fixed<Args, R, F>(f: F) -> Rc<OperationFn>
    where
        F: IntoOperation<Args, R>,
    {
        f.into_operation()
    }

    fn variadic<Args, R, F>(f: F) -> Rc<OperationFn>
    where
        F: IntoVariadicOperation<Args, R>,
    {
        f.into_variadic_operation()
    }

    fn raw(f: fn(Vec<Value>) -> Result<Value, Error>) -> Rc<OperationFn> {
        Rc::new(f)
    }

    type Num = NumberType;

    vec![
        // Arithmetic operations
        BuiltinOp {
            id: "+",
            arity: Arity::Any, // identity element 0
            func: variadic::<(Rest<Num>,), _, _>(builtin_add),
        },
        BuiltinOp {
            id: "-",
            arity: Arity::AtLeast(1), // unary form negates
            func: variadic::<(Num, Rest<Num>), _, _>(builtin_sub),
        },
        BuiltinOp {
            id: "*",
            arity: Arity::Any, // identity element 1
            func: variadic::<(Rest<Num>,), _, _>(builtin_mul),
        },
        BuiltinOp {
            id: "/",
            arity: Arity::AtLeast(1), // unary form reciprocates
            func: variadic::<(Num, Rest<Num>), _, _>(builtin_div),
        },
        BuiltinOp {
            id: "abs",
            arity: Arity::Exact(1),
            func: fixed::<(Num,), _, _>(builtin_abs),
        },
        BuiltinOp {
            id: "sqrt",
            arity: Arity::Exact(1),
            func: fixed::<(Num,), _, _>(builtin_sqrt),
        },
        BuiltinOp {
            id: "floor",
            arity: Arity::Exact(1),
            func: fixed::<(Num,), _, _>(builtin_floor),
        },
        BuiltinOp {
            id: "ceiling",
            arity: Arity::Exact(1),
            func: fixed::<(Num,), _, _>(builtin_ceiling),
        },
        BuiltinOp {
            id: "truncate",
            arity: Arity::Exact(1),
            func: fixed::<(Num,), _, _>(builtin_truncate),
        },
        BuiltinOp {
            id: "round",
            arity: Arity::Exact(1),
            func: fixed::<(Num,), _, _>(builtin_round),
        },
        BuiltinOp {
            id: "remainder",
            arity: Arity::Exact(2),
            func: fixed::<(Num, Num), _, _>(builtin_remainder),
        },
        BuiltinOp {
            id: "modulo",
            arity: Arity::Exact(2),
            func: fixed::<(Num, Num), _, _>(builtin_modulo),
        },
        // Comparison operations
        BuiltinOp {
            id: "<",
            arity: Arity::AtLeast(2),
            func: variadic::<(Num, Rest<Num>), _, _>(builtin_lt),
        },
        BuiltinOp {
            id: ">",
            arity: Arity::AtLeast(2),
            func: variadic::<(Num, Rest<Num>), _, _>(builtin_gt),
        },
        BuiltinOp {
            id: "<=",
            arity: Arity::AtLeast(2),
            func: variadic::<(Num, Rest<Num>), _, _>(builtin_le),
        },
        BuiltinOp {
            id: ">=",
            arity: Arity::AtLeast(2),
            func: variadic::<(Num, Rest<Num>), _, _>(builtin_ge),
        },
        BuiltinOp {
            id: "=",
            arity: Arity::AtLeast(2),
            func: variadic::<(Num, Rest<Num>), _, _>(builtin_num_eq),
        },
        // Pair and list operations
        BuiltinOp {
            id: "cons",
            arity: Arity::Exact(2),
            func: fixed::<(Value, Value), _, _>(builtin_cons),
        },
        BuiltinOp {
            id: "car",
            arity: Arity::Exact(1),
            func: fixed::<(Value,), _, _>(builtin_car),
        },
        BuiltinOp {
            id: "cdr",
            arity: Arity::Exact(1),
            func: fixed::<(Value,), _, _>(builtin_cdr),
        },
        BuiltinOp {
            id: "list",
            arity: Arity::Any,
            func: variadic::<(Rest<Value>,), _, _>(builtin_list),
        },
        BuiltinOp {
            id: "length",
            arity: Arity::Exact(1),
            func: fixed::<(Value,), _, _>(builtin_length),
        },
        BuiltinOp {
            id: "append",
            arity: Arity::Any,
            func: variadic::<(Rest<Value>,), _, _>(builtin_append),
        },
        // Predicates
        BuiltinOp {
            id: "null?",
            arity: Arity::Exact(1),
            func: fixed::<(Value,), _, _>(builtin_is_null),
        },
        BuiltinOp {
            id: "pair?",
            arity: Arity::Exact(1),
            func: fixed::<(Value,), _, _>(builtin_is_pair),
        },
        BuiltinOp {
            id: "list?",
            arity: Arity::Exact(1),
            func: fixed::<(Value,), _, _>(builtin_is_list),
        },
        BuiltinOp {
            id: "symbol?",
            arity: Arity::Exact(1),
            func: fixed::<(Value,), _, _>(builtin_is_symbol),
        },
        BuiltinOp {
            id: "procedure?",
            arity: Arity::Exact(1),
            func: fixed::<(Value,), _, _>(builtin_is_procedure),
        },
        // Equality
        BuiltinOp {
            id: "eq?",
            arity: Arity::Exact(2),
            func: fixed::<(Value, Value), _, _>(builtin_eq),
        },
        BuiltinOp {
            id: "eqv?",
            arity: Arity::Exact(2),
            func: fixed::<(Value, Value), _, _>(builtin_eq),
        },
        // Logic
        BuiltinOp {
            id: "not",
            arity: Arity::Exact(1),
            func: fixed::<(Value,), _, _>(builtin_not),
        },
        // Application
        BuiltinOp {
            id: "apply",
            arity: Arity::AtLeast(2),
            func: raw(builtin_apply),
        },
        // I/O
        BuiltinOp {
            id: "log",
            arity: Arity::Any,
            func: raw(builtin_log),
        },
        // Error handling
        BuiltinOp {
            id: "error",
            arity: Arity::Any,
            func: raw(builtin_error),
        },
    ]
}

/// Global-frame bindings: every builtin wrapped with its arity check and
/// packed into a value.
pub(crate) fn global_bindings() -> Vec<(&'static str, Value)> {
    builtin_ops()
        .into_iter()
        .map(|BuiltinOp { id, arity, func }| {
            let checked: Rc<OperationFn> = Rc::new(move |args: Vec<Value>| {
                arity.validate(id, args.len())?;
                func(args)
            });
            (
                id,
                Value::Builtin(Rc::new(Builtin {
                    id: id.to_owned(),
                    func: checked,
                })),
            )
        })
        .collect()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{cons, list, sym, val};

    /// Invoke a builtin through the global bindings, exercising both the
    /// arity wrapper and the adapter layer.
    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, Error> {
        let bindings = global_bindings();
        let (_, value) = bindings
            .iter()
            .find(|(id, _)| *id == name)
            .unwrap_or_else(|| panic!("builtin not found: {name}"));
        match value {
            Value::Builtin(b) => (b.func)(args.to_vec()),
            other => panic!("expected builtin value, got {other:?}"),
        }
    }

    /// Fetch a builtin as a value (for apply tests).
    fn builtin_value(name: &str) -> Value {
        let bindings = global_bindings();
        let (_, value) = bindings.iter().find(|(id, _)| *id == name).unwrap();
        value.clone()
    }

    /// Micro-helper for success cases
    fn success<T: Into<Value>>(value: T) -> Option<Value> {
        Some(value.into())
    }

    /// Macro to create test cases, invoking builtins via the registry.
    macro_rules! test {
        ($name:expr, $args:expr, $expected:expr) => {
            ($name, call_builtin($name, $args), $expected)
        };
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_builtin_implementations_data_driven() {
        type TestCase = (&'static str, Result<Value, Error>, Option<Value>);

        let one_two = list([val(1), val(2)]);
        let pair_12 = cons(val(1), val(2));

        let test_cases: Vec<TestCase> = vec![
            // =================================================================
            // ARITHMETIC
            // =================================================================
            test!("+", &[], success(0)),
            test!("+", &[val(5)], success(5)),
            test!("+", &[val(1), val(2), val(3)], success(6)),
            test!("+", &[val(-5), val(10)], success(5)),
            test!("+", &[val(0.5), val(0.25)], success(0.75)),
            test!("+", &[val("no")], None), // Invalid type
            test!("-", &[val(10), val(3), val(2)], success(5)),
            test!("-", &[val(10)], success(-10)), // Unary negation
            test!("-", &[], None),               // Needs at least 1 arg
            test!("*", &[], success(1)),
            test!("*", &[val(2), val(3), val(4)], success(24)),
            test!("*", &[val(7)], success(7)),
            test!("/", &[val(20), val(4), val(2)], success(2.5)),
            test!("/", &[val(2)], success(0.5)), // Unary reciprocal
            test!("/", &[], None),
            test!("abs", &[val(-3)], success(3)),
            test!("abs", &[val(3)], success(3)),
            test!("sqrt", &[val(9)], success(3)),
            test!("sqrt", &[val(2.25)], success(1.5)),
            test!("floor", &[val(2.7)], success(2)),
            test!("floor", &[val(-2.1)], success(-3)),
            test!("ceiling", &[val(2.1)], success(3)),
            test!("ceiling", &[val(-2.7)], success(-2)),
            test!("truncate", &[val(2.9)], success(2)),
            test!("truncate", &[val(-2.9)], success(-2)),
            test!("round", &[val(2.4)], success(2)),
            test!("round", &[val(2.6)], success(3)),
            // remainder takes the sign of the dividend
            test!("remainder", &[val(7), val(2)], success(1)),
            test!("remainder", &[val(-7), val(2)], success(-1)),
            test!("remainder", &[val(7), val(-2)], success(1)),
            // modulo takes the sign of the divisor
            test!("modulo", &[val(7), val(2)], success(1)),
            test!("modulo", &[val(-7), val(2)], success(1)),
            test!("modulo", &[val(7), val(-2)], success(-1)),
            test!("modulo", &[val(-7), val(-2)], success(-1)),
            test!("remainder", &[val(1)], None), // Arity
            // =================================================================
            // COMPARISON CHAINS
            // =================================================================
            test!("<", &[val(1), val(2)], success(true)),
            test!("<", &[val(2), val(1)], success(false)),
            test!("<", &[val(1), val(2), val(3)], success(true)),
            test!("<", &[val(1), val(3), val(2)], success(false)),
            test!("<", &[val(1), val(1)], success(false)),
            test!(">", &[val(9), val(6), val(2)], success(true)),
            test!(">", &[val(9), val(6), val(7)], success(false)),
            test!("<=", &[val(1), val(1), val(2)], success(true)),
            test!(">=", &[val(3), val(3), val(1)], success(true)),
            test!("=", &[val(5), val(5), val(5)], success(true)),
            test!("=", &[val(5), val(5), val(4)], success(false)),
            test!("<", &[val(5)], None),           // Too few args
            test!("<", &[val("a"), val(3)], None), // Wrong type
            // =================================================================
            // PAIRS AND LISTS
            // =================================================================
            test!("cons", &[val(1), one_two.clone()], success(list([val(1), val(1), val(2)]))),
            // cons builds dotted pairs freely
            test!("cons", &[val(1), val(2)], success(cons(val(1), val(2)))),
            test!("cons", &[val(1), Value::Nil], success(list([val(1)]))),
            test!("car", &[one_two.clone()], success(1)),
            test!("car", &[pair_12.clone()], success(1)),
            test!("cdr", &[one_two.clone()], success(list([val(2)]))),
            test!("cdr", &[pair_12.clone()], success(2)),
            test!("car", &[Value::Nil], None),  // car: expected cons
            test!("cdr", &[Value::Nil], None),
            test!("car", &[val(42)], None),
            test!("list", &[], Some(Value::Nil)),
            test!(
                "list",
                &[val(1), val("two"), val(true)],
                success(list([val(1), val("two"), val(true)]))
            ),
            test!("length", &[Value::Nil], success(0)),
            test!("length", &[one_two.clone()], success(2)),
            test!("length", &[pair_12.clone()], None), // Improper list
            test!("length", &[val(5)], None),
            test!(
                "append",
                &[one_two.clone(), one_two.clone()],
                success(list([val(1), val(2), val(1), val(2)]))
            ),
            test!("append", &[], Some(Value::Nil)),
            test!("append", &[one_two.clone()], success(one_two.clone())),
            test!("append", &[Value::Nil, one_two.clone()], success(one_two.clone())),
            // Last argument may be any value; earlier ones must be lists
            test!("append", &[one_two.clone(), val(3)], success(cons(val(1), cons(val(2), val(3))))),
            test!("append", &[val(3), one_two.clone()], None),
            // =================================================================
            // PREDICATES
            // =================================================================
            test!("null?", &[Value::Nil], success(true)),
            test!("null?", &[one_two.clone()], success(false)),
            test!("null?", &[val(false)], success(false)),
            test!("pair?", &[one_two.clone()], success(true)),
            test!("pair?", &[pair_12.clone()], success(true)),
            test!("pair?", &[Value::Nil], success(false)),
            test!("list?", &[Value::Nil], success(true)),
            test!("list?", &[one_two.clone()], success(true)),
            test!("list?", &[pair_12.clone()], success(false)),
            test!("list?", &[val(1)], success(false)),
            test!("symbol?", &[sym("a")], success(true)),
            test!("symbol?", &[val("a")], success(false)),
            test!("procedure?", &[builtin_value("+")], success(true)),
            test!("procedure?", &[sym("+")], success(false)),
            // =================================================================
            // EQUALITY
            // =================================================================
            test!("eq?", &[sym("a"), sym("a")], success(true)),
            test!("eq?", &[sym("a"), sym("b")], success(false)),
            test!("eq?", &[val(5), val(5)], success(true)),
            test!("eq?", &[val(5), val(6)], success(false)),
            test!("eq?", &[val(true), val(true)], success(true)),
            test!("eq?", &[Value::Nil, Value::Nil], success(true)),
            test!("eq?", &[val("s"), val("s")], success(true)),
            // Fresh pairs are never eq?, even with equal contents
            test!(
                "eq?",
                &[cons(val(1), val(2)), cons(val(1), val(2))],
                success(false)
            ),
            // The same allocation is eq? to itself
            test!("eq?", &[pair_12.clone(), pair_12.clone()], success(true)),
            test!("eq?", &[val(0), val(false)], success(false)),
            test!("eq?", &[Value::Nil, val(false)], success(false)),
            test!("eqv?", &[sym("a"), sym("a")], success(true)),
            test!(
                "eqv?",
                &[cons(val(1), val(2)), cons(val(1), val(2))],
                success(false)
            ),
            test!("eq?", &[builtin_value("+"), builtin_value("+")], success(true)),
            test!("eq?", &[builtin_value("+"), builtin_value("-")], success(false)),
            // =================================================================
            // LOGIC
            // =================================================================
            test!("not", &[val(false)], success(true)),
            test!("not", &[val(true)], success(false)),
            // Only #f is false
            test!("not", &[val(0)], success(false)),
            test!("not", &[Value::Nil], success(false)),
            test!("not", &[val("")], success(false)),
            test!("not", &[], None), // Arity
            // =================================================================
            // APPLY
            // =================================================================
            test!(
                "apply",
                &[builtin_value("+"), list([val(1), val(2), val(3)])],
                success(6)
            ),
            test!(
                "apply",
                &[builtin_value("+"), val(1), val(2), list([val(3), val(4)])],
                success(10)
            ),
            test!("apply", &[builtin_value("+"), Value::Nil], success(0)),
            test!("apply", &[builtin_value("+"), val(3)], None), // Last arg must be a list
            test!("apply", &[builtin_value("+"), pair_12.clone()], None), // Improper list
            test!("apply", &[val(1), Value::Nil], None),         // Not a function
            test!("apply", &[builtin_value("+")], None),         // Arity
            // =================================================================
            // ERROR
            // =================================================================
            test!("error", &[], None),
            test!("error", &[val("boom")], None),
            test!("error", &[val("code"), val(42)], None),
        ];

        for (test_expr, result, expected) in test_cases {
            match (result, expected) {
                (Ok(actual), Some(expected_val)) => {
                    assert_eq!(actual, expected_val, "Failed for test case: {test_expr}");
                }
                (Err(_), None) => {} // Expected error
                (actual, expected) => panic!(
                    "Unexpected result for test case: {}\nGot ok: {:?}, expected ok: {:?}",
                    test_expr,
                    actual.is_ok(),
                    expected.is_some()
                ),
            }
        }
    }

    #[test]
    fn test_error_message_construction() {
        type ErrorTest = (Vec<Value>, &'static str);
        let test_cases: Vec<ErrorTest> = vec![
            (vec![val("Simple message")], "Simple message"),
            (
                vec![val("Code:"), val(404), val("Not Found")],
                "Code: 404 Not Found",
            ),
            (
                vec![val(true), val(42), val("mixed"), Value::Nil],
                "#t 42 mixed ()",
            ),
        ];

        for (args, expected_msg) in test_cases {
            match call_builtin("error", &args).unwrap_err() {
                Error::EvalError(msg) => {
                    assert_eq!(msg, expected_msg, "Failed for args: {args:?}");
                }
                other => panic!("Expected EvalError for args: {args:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_specific_error_messages() {
        let err = call_builtin("car", &[val(42)]).unwrap_err();
        assert!(format!("{err}").contains("car: expected cons"));

        let err = call_builtin("apply", &[builtin_value("+"), val(3)]).unwrap_err();
        assert!(format!("{err}").contains("apply: last argument must be a list"));
    }

    #[test]
    fn test_arity_validation() {
        use Arity::*;

        Exact(2).validate("x", 2).unwrap();
        Exact(2).validate("x", 1).unwrap_err();
        Exact(2).validate("x", 3).unwrap_err();

        AtLeast(1).validate("x", 1).unwrap();
        AtLeast(1).validate("x", 5).unwrap();
        AtLeast(1).validate("x", 0).unwrap_err();

        Any.validate("x", 0).unwrap();
        Any.validate("x", 100).unwrap();

        match Exact(2).validate("cons", 1).unwrap_err() {
            Error::ArityError {
                expected,
                got,
                operation,
            } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
                assert_eq!(operation.as_deref(), Some("cons"));
            }
            other => panic!("Expected ArityError, got {other:?}"),
        }
    }

    #[test]
    fn test_registry_has_no_duplicate_ids() {
        let ops = builtin_ops();
        for (i, a) in ops.iter().enumerate() {
            for b in &ops[i + 1..] {
                assert_ne!(a.id, b.id, "duplicate builtin id: {}", a.id);
            }
        }
    }
}
