//! Typed builtin registration adapters.
//!
//! Builtins are stored behind one erased signature, [`OperationFn`], but
//! written as ordinary typed Rust functions (`fn(f64) -> f64`,
//! `fn(Value, Value) -> bool`, ...). The traits here convert between the
//! two: [`FromParam`] extracts each argument, [`IntoValue`] converts the
//! return value, and [`IntoResult`] lets a builtin return either a plain
//! value or a `Result`.
//!
//! Variadic builtins take a [`Rest`] parameter in the last position,
//! which collects the remaining arguments (optionally converted, e.g.
//! `Rest<f64>` for a numeric tail).

use std::rc::Rc;

use crate::Error;
use crate::ast::{NumberType, Value};

/// Canonical erased builtin function type used by the evaluator.
///
/// Builtins receive ownership of their argument vector, enabling
/// implementations that consume or rearrange arguments if desired.
pub type OperationFn = dyn Fn(Vec<Value>) -> Result<Value, Error>;

/// Conversion from one argument value into a typed parameter.
pub trait FromParam: Sized {
    fn from_arg(value: &Value) -> Result<Self, Error>;
}

impl FromParam for NumberType {
    fn from_arg(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Number(n) => Ok(*n),
            other => Err(Error::TypeError(format!("expected number, got {other}"))),
        }
    }
}

impl FromParam for bool {
    fn from_arg(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(Error::TypeError(format!("expected boolean, got {other}"))),
        }
    }
}

impl FromParam for Value {
    fn from_arg(value: &Value) -> Result<Self, Error> {
        Ok(value.clone())
    }
}

/// Convert strongly-typed Rust results into values.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for NumberType {
    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::from(self)
    }
}

/// Normalize both plain values and `Result`-returning functions into
/// `Result<T, Error>`.
pub trait IntoResult<T> {
    fn into_result(self) -> Result<T, Error>;
}

impl<T> IntoResult<T> for T
where
    T: IntoValue,
{
    fn into_result(self) -> Result<T, Error> {
        Ok(self)
    }
}

impl<T> IntoResult<T> for Result<T, Error> {
    fn into_result(self) -> Result<T, Error> {
        self
    }
}

/// Marker type for variadic "rest" parameters: a thin newtype over
/// `Vec<T>` that behaves like a slice via `Deref`.
#[derive(Debug, Clone)]
pub struct Rest<T> {
    items: Vec<T>,
}

impl<T> Rest<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Rest { items }
    }

    /// Consume the wrapper and return the owned rest arguments.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> std::ops::Deref for Rest<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

/// Conversion of the argument tail into a typed rest parameter.
pub trait FromRest: Sized {
    fn from_rest(values: Vec<Value>) -> Result<Self, Error>;
}

impl FromRest for Rest<Value> {
    fn from_rest(values: Vec<Value>) -> Result<Self, Error> {
        Ok(Rest::new(values))
    }
}

impl FromRest for Rest<NumberType> {
    fn from_rest(values: Vec<Value>) -> Result<Self, Error> {
        let mut numbers = Vec::with_capacity(values.len());
        for value in &values {
            numbers.push(NumberType::from_arg(value)?);
        }
        Ok(Rest::new(numbers))
    }
}

/// Convert a strongly-typed fixed-arity Rust function into the erased
/// [`OperationFn`], parameterized by an argument tuple type.
pub trait IntoOperation<Args, R> {
    fn into_operation(self) -> Rc<OperationFn>;
}

/// Convert a Rust function with a trailing [`Rest`] parameter into the
/// erased [`OperationFn`]. Minimum argument counts beyond the fixed
/// prefix are validated by the registry's arity metadata, not here.
pub trait IntoVariadicOperation<Args, R> {
    fn into_variadic_operation(self) -> Rc<OperationFn>;
}

/// Implement `IntoOperation` for functions of the given arity using
/// pattern matching on the argument slice.
macro_rules! impl_into_operation_for_arity {
    ($arity:expr, $( $v:ident : $A:ident ),+ ) => {
        impl<F, FR, R, $( $A ),+> IntoOperation<($( $A, )+), R> for F
        where
            F: Fn($( $A ),+) -> FR + 'static,
            FR: IntoResult<R> + 'static,
            R: IntoValue + 'static,
            $( $A: FromParam, )+
        {
            fn into_operation(self) -> Rc<OperationFn> {
                Rc::new(move |args: Vec<Value>| match &args[..] {
                    [ $( $v ),+ ] => {
                        let result: FR = (self)( $( <$A as FromParam>::from_arg($v)? ),+ );
                        Ok(result.into_result()?.into_value())
                    }
                    _ => Err(Error::arity_error($arity, args.len())),
                })
            }
        }
    };
}

impl_into_operation_for_arity!(1, v0: A1);
impl_into_operation_for_arity!(2, v0: A1, v1: A2);
impl_into_operation_for_arity!(3, v0: A1, v1: A2, v2: A3);

// Rest-only variadic functions: every argument lands in the tail.
impl<F, FR, R, RestT> IntoVariadicOperation<(RestT,), R> for F
where
    RestT: FromRest,
    F: Fn(RestT) -> FR + 'static,
    FR: IntoResult<R> + 'static,
    R: IntoValue + 'static,
{
    fn into_variadic_operation(self) -> Rc<OperationFn> {
        Rc::new(move |args: Vec<Value>| {
            let rest = RestT::from_rest(args)?;
            let result: FR = (self)(rest);
            Ok(result.into_result()?.into_value())
        })
    }
}

// One fixed parameter plus the rest tail.
impl<F, FR, R, A1, RestT> IntoVariadicOperation<(A1, RestT), R> for F
where
    A1: FromParam,
    RestT: FromRest,
    F: Fn(A1, RestT) -> FR + 'static,
    FR: IntoResult<R> + 'static,
    R: IntoValue + 'static,
{
    fn into_variadic_operation(self) -> Rc<OperationFn> {
        Rc::new(move |mut args: Vec<Value>| {
            if args.is_empty() {
                return Err(Error::arity_error(1, 0));
            }
            let rest_values = args.split_off(1);
            let first = A1::from_arg(&args[0])?;
            let rest = RestT::from_rest(rest_values)?;
            let result: FR = (self)(first, rest);
            Ok(result.into_result()?.into_value())
        })
    }
}
