//! The evaluator pipeline: environment frames, the analyzer that compiles
//! expressions into Rust closures, and the trampoline that drives deferred
//! tail calls.
//!
//! Evaluation of a form proceeds in two phases. *Analysis* walks the
//! (already macro-expanded) tree once and produces a [`Compiled`]
//! closure for every node; a body evaluated N times is analyzed once.
//! *Execution* runs those closures against an [`Environment`] frame.
//!
//! Every compiled expression returns an [`Evaluation`]: either a final
//! value or a deferred tail call. The analyzer threads a `tail` flag so
//! that only applications in tail position defer; everything else forces
//! its sub-results locally, and the outermost driver loop unwinds the
//! chain iteratively. This is what makes unbounded tail recursion run in
//! constant Rust stack space.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Builtin, Closure, Value, cons, list};
use crate::builtinops::global_bindings;
use crate::intooperation::{IntoOperation, OperationFn};
use crate::reader;
use crate::Error;

mod expander;

/// One lexical scope: name to value bindings plus an optional parent link.
#[derive(Debug, Default)]
struct Frame {
    bindings: HashMap<Rc<str>, Value>,
    parent: Option<Environment>,
}

/// Shared handle to an environment frame.
///
/// Frames are shared by every closure captured under them: cloning the
/// handle clones the reference, not the scope, so a `set!` performed
/// through one closure is visible to all its siblings. A frame lives as
/// long as the longest-lived closure that captured it.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    head: Rc<RefCell<Frame>>,
}

impl Environment {
    /// Create a root frame with no parent.
    pub fn new() -> Self {
        Environment::default()
    }

    /// Push a fresh frame whose parent is this one.
    pub fn child(&self) -> Self {
        Environment {
            head: Rc::new(RefCell::new(Frame {
                bindings: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Bind a name in this frame. Never walks parents; an existing
    /// binding in an ancestor frame is shadowed, not replaced.
    pub fn define(&self, name: Rc<str>, value: Value) {
        self.head.borrow_mut().bindings.insert(name, value);
    }

    /// Look a name up, walking parent links to the root.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut cursor = Some(self.clone());
        while let Some(env) = cursor {
            let frame = env.head.borrow();
            if let Some(value) = frame.bindings.get(name) {
                return Some(value.clone());
            }
            cursor = frame.parent.clone();
        }
        None
    }

    /// Assign to the nearest frame that already holds the name.
    /// Returns false when no frame in the chain has the binding.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut cursor = Some(self.clone());
        while let Some(env) = cursor {
            let mut frame = env.head.borrow_mut();
            if let Some(slot) = frame.bindings.get_mut(name) {
                *slot = value;
                return true;
            }
            cursor = frame.parent.clone();
        }
        false
    }

    /// Register a custom builtin procedure in this frame for use from
    /// the dialect.
    ///
    /// This is the low-level API: it accepts a function that already
    /// works on `Vec<Value>`. For most new code, prefer the typed
    /// [`Environment::register_builtin_operation`] instead of
    /// manipulating `Value` directly.
    ///
    /// # Example
    /// ```
    /// use schemin::Error;
    /// use schemin::ast::Value;
    /// use schemin::evaluator::Interpreter;
    ///
    /// fn arg_count(args: Vec<Value>) -> Result<Value, Error> {
    ///     Ok(Value::Number(args.len() as f64))
    /// }
    ///
    /// let interp = Interpreter::new();
    /// interp.global_env().register_builtin_function("arg-count", arg_count);
    /// assert_eq!(interp.eval_str("(arg-count 'a 'b)").unwrap(), Value::Number(2.0));
    /// ```
    pub fn register_builtin_function(
        &self,
        name: &str,
        func: fn(Vec<Value>) -> Result<Value, Error>,
    ) {
        let wrapped: Rc<OperationFn> = Rc::new(func);
        self.define(
            Rc::from(name),
            Value::Builtin(Rc::new(Builtin {
                id: name.to_owned(),
                func: wrapped,
            })),
        );
    }

    /// Register a strongly-typed Rust function as a builtin using
    /// automatic argument extraction and result conversion.
    ///
    /// This allows writing natural Rust functions like:
    ///
    /// ```
    /// fn hypot(a: f64, b: f64) -> f64 { (a * a + b * b).sqrt() }
    ///
    /// let interp = schemin::evaluator::Interpreter::new();
    /// interp.global_env().register_builtin_operation::<(f64, f64), _, _>("hypot", hypot);
    /// assert_eq!(interp.eval_str("(hypot 3 4)").unwrap(), schemin::ast::Value::Number(5.0));
    /// ```
    ///
    /// Supported parameter types are those implementing
    /// [`crate::intooperation::FromParam`] (`f64`, `bool`, `Value`);
    /// returns may be any [`crate::intooperation::IntoValue`] type or a
    /// `Result` thereof. Arity is enforced by the adapter.
    pub fn register_builtin_operation<Args, R, F>(&self, name: &str, func: F)
    where
        F: IntoOperation<Args, R> + 'static,
    {
        self.define(
            Rc::from(name),
            Value::Builtin(Rc::new(Builtin {
                id: name.to_owned(),
                func: func.into_operation(),
            })),
        );
    }
}

/// A compiled expression: a function from a frame to a trampoline result.
pub type Compiled = Rc<dyn Fn(&Environment) -> Result<Evaluation, Error>>;

/// Result space of every compiled expression.
///
/// `Pending` is produced only by applications compiled with the tail
/// flag set; every non-tail consumer forces its sub-results, so a
/// `Pending` never escapes except as a tail return.
pub enum Evaluation {
    /// The evaluation has a final value
    Done(Value),
    /// One more deferred tail call remains
    Pending(Thunk),
}

/// A deferred tail application: the callee plus its evaluated arguments.
pub struct Thunk {
    closure: Rc<Closure>,
    args: Vec<Value>,
}

impl Thunk {
    /// Perform one step: bind the arguments in a fresh frame parented by
    /// the closure's captured environment and run the compiled body.
    fn step(self) -> Result<Evaluation, Error> {
        let frame = self.closure.env.child();
        bind_parameters(&self.closure, self.args, &frame);
        (self.closure.body)(&frame)
    }
}

/// Drive a trampoline result to a final value, forcing deferred tail
/// calls iteratively.
pub(crate) fn force(mut evaluation: Evaluation) -> Result<Value, Error> {
    loop {
        match evaluation {
            Evaluation::Done(value) => return Ok(value),
            Evaluation::Pending(thunk) => evaluation = thunk.step()?,
        }
    }
}

/// Bind arguments positionally. A rest parameter receives the trailing
/// arguments as a freshly constructed proper list; missing fixed
/// arguments leave their slot undefined, and extra arguments without a
/// rest parameter are dropped.
fn bind_parameters(closure: &Closure, args: Vec<Value>, frame: &Environment) {
    let mut args = args.into_iter();
    for param in &closure.params {
        match args.next() {
            Some(value) => frame.define(param.clone(), value),
            None => break,
        }
    }
    if let Some(rest) = &closure.rest {
        frame.define(rest.clone(), list(args));
    }
}

/// Apply a procedure to already-evaluated arguments.
///
/// A closure applied in tail position returns a `Pending` thunk for the
/// caller's trampoline; in non-tail position the call is driven to a
/// value on the spot. Builtins always return final values.
pub(crate) fn apply(func: Value, args: Vec<Value>, tail: bool) -> Result<Evaluation, Error> {
    match func {
        Value::Builtin(builtin) => Ok(Evaluation::Done((builtin.func)(args)?)),
        Value::Closure(closure) => {
            let thunk = Thunk { closure, args };
            if tail {
                Ok(Evaluation::Pending(thunk))
            } else {
                Ok(Evaluation::Done(force(Evaluation::Pending(thunk))?))
            }
        }
        other => Err(Error::TypeError(format!("Not a function: {other}"))),
    }
}

/// Call a procedure from native code and drive it to a value. Used by
/// the `apply` builtin and by the macro expander to run transformers.
pub fn call_procedure(func: Value, args: Vec<Value>) -> Result<Value, Error> {
    force(apply(func, args, false)?)
}

/// Table of procedure macros, keyed by name. Shared between the
/// expander and the compiled `define-macro` forms that populate it.
type MacroTable = Rc<RefCell<HashMap<Rc<str>, Rc<Closure>>>>;

/// One interpreter instance: the global frame plus the macro table.
///
/// Instances are fully independent; a macro or binding registered in one
/// is invisible to another.
pub struct Interpreter {
    global: Environment,
    macros: MacroTable,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    /// Create an interpreter whose global frame holds all builtins.
    pub fn new() -> Self {
        let global = Environment::new();
        for (name, value) in global_bindings() {
            global.define(Rc::from(name), value);
        }
        Interpreter {
            global,
            macros: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// The top-level frame. Definitions made here persist across forms.
    pub fn global_env(&self) -> &Environment {
        &self.global
    }

    /// Run one form through the whole pipeline: expand, analyze,
    /// evaluate in the global frame.
    pub fn eval(&self, form: &Value) -> Result<Value, Error> {
        let expanded = self.expand(form)?;
        let compiled = self.analyze(&expanded, false)?;
        force(compiled(&self.global)?)
    }

    /// Read a single form from source text and evaluate it.
    pub fn eval_str(&self, source: &str) -> Result<Value, Error> {
        self.eval(&reader::read_form(source)?)
    }

    /// Evaluate every form in a source text, returning the last value
    /// (`()` for empty input).
    pub fn eval_program(&self, source: &str) -> Result<Value, Error> {
        let mut result = Value::Nil;
        for form in reader::read_program(source)? {
            result = self.eval(&form)?;
        }
        Ok(result)
    }

    /// Compile an expression into an executable closure.
    ///
    /// `tail` marks whether the expression sits in tail position of the
    /// enclosing procedure body; only there may an application defer
    /// through the trampoline.
    pub(crate) fn analyze(&self, expr: &Value, tail: bool) -> Result<Compiled, Error> {
        match expr {
            // Self-evaluating forms
            Value::Number(_)
            | Value::String(_)
            | Value::Bool(_)
            | Value::Nil
            | Value::Builtin(_)
            | Value::Closure(_) => {
                let literal = expr.clone();
                Ok(Rc::new(move |_env| Ok(Evaluation::Done(literal.clone()))))
            }

            // Variable reference
            Value::Symbol(name) => {
                let name = name.clone();
                Ok(Rc::new(move |env| {
                    env.lookup(&name)
                        .map(Evaluation::Done)
                        .ok_or_else(|| Error::UnboundVariable(name.to_string()))
                }))
            }

            Value::Pair(pair) => self.analyze_form(&pair.car, &pair.cdr, tail),
        }
    }

    /// Dispatch a compound form on its head symbol, falling back to
    /// procedure application.
    fn analyze_form(&self, head: &Value, rest: &Value, tail: bool) -> Result<Compiled, Error> {
        let (args, args_tail) = rest.spine();
        if !matches!(args_tail, Value::Nil) {
            return Err(Error::EvalError(format!(
                "malformed form: dotted argument list in ({head} ...)"
            )));
        }

        if let Value::Symbol(name) = head {
            match &**name {
                "quote" => return self.analyze_quote(&args),
                "if" => return self.analyze_if(&args, tail),
                "and" => return self.analyze_and(&args, tail),
                "or" => return self.analyze_or(&args, tail),
                "define" => return self.analyze_define(&args),
                "set!" => return self.analyze_set(&args),
                "lambda" => return self.analyze_lambda(&args),
                "begin" => return self.analyze_body(&args, tail, "begin"),
                "define-macro" => return self.analyze_define_macro(&args),
                "quasiquote" => return self.analyze_quasiquote(&args),
                "unquote" | "unquote-splicing" => {
                    return Err(Error::EvalError(format!(
                        "{name}: only valid inside quasiquote"
                    )));
                }
                _ => {}
            }
        }

        self.analyze_application(head, &args, tail)
    }

    /// `(quote x)` returns `x` unevaluated.
    fn analyze_quote(&self, args: &[Value]) -> Result<Compiled, Error> {
        match args {
            [datum] => {
                let datum = datum.clone();
                Ok(Rc::new(move |_env| Ok(Evaluation::Done(datum.clone()))))
            }
            _ => Err(Error::arity_error_in("quote", 1, args.len())),
        }
    }

    /// `(if c t e...)`: the chosen branch inherits the tail flag. An
    /// absent alternative evaluates to `#f`.
    fn analyze_if(&self, args: &[Value], tail: bool) -> Result<Compiled, Error> {
        match args {
            [condition, consequent, alternative @ ..] => {
                let condition = self.analyze(condition, false)?;
                let consequent = self.analyze(consequent, tail)?;
                let alternative = if alternative.is_empty() {
                    None
                } else {
                    Some(self.analyze_body(alternative, tail, "if")?)
                };
                Ok(Rc::new(move |env| {
                    if force(condition(env)?)?.is_truthy() {
                        consequent(env)
                    } else {
                        match &alternative {
                            Some(alternative) => alternative(env),
                            None => Ok(Evaluation::Done(Value::Bool(false))),
                        }
                    }
                }))
            }
            _ => Err(Error::arity_error_in("if", 2, args.len())),
        }
    }

    /// A body sequence: every expression but the last is forced for
    /// effect; the last inherits the tail flag.
    fn analyze_body(&self, body: &[Value], tail: bool, form: &str) -> Result<Compiled, Error> {
        match body {
            [] => Err(Error::EvalError(format!("{form}: empty body"))),
            [only] => self.analyze(only, tail),
            [firsts @ .., last] => {
                let firsts = firsts
                    .iter()
                    .map(|expr| self.analyze(expr, false))
                    .collect::<Result<Vec<_>, _>>()?;
                let last = self.analyze(last, tail)?;
                Ok(Rc::new(move |env| {
                    for expr in &firsts {
                        force(expr(env)?)?;
                    }
                    last(env)
                }))
            }
        }
    }

    /// `(and e...)`: short-circuit on the first false value; empty is
    /// `#t`. Only the final operand is in tail position.
    fn analyze_and(&self, args: &[Value], tail: bool) -> Result<Compiled, Error> {
        if args.is_empty() {
            return Ok(Rc::new(|_env| Ok(Evaluation::Done(Value::Bool(true)))));
        }
        let (firsts, last) = args.split_at(args.len() - 1);
        let firsts = firsts
            .iter()
            .map(|expr| self.analyze(expr, false))
            .collect::<Result<Vec<_>, _>>()?;
        let last = self.analyze(&last[0], tail)?;
        Ok(Rc::new(move |env| {
            for expr in &firsts {
                let value = force(expr(env)?)?;
                if !value.is_truthy() {
                    return Ok(Evaluation::Done(value));
                }
            }
            last(env)
        }))
    }

    /// `(or e...)`: return the first truthy value; empty is `#f`. Only
    /// the final operand is in tail position.
    fn analyze_or(&self, args: &[Value], tail: bool) -> Result<Compiled, Error> {
        if args.is_empty() {
            return Ok(Rc::new(|_env| Ok(Evaluation::Done(Value::Bool(false)))));
        }
        let (firsts, last) = args.split_at(args.len() - 1);
        let firsts = firsts
            .iter()
            .map(|expr| self.analyze(expr, false))
            .collect::<Result<Vec<_>, _>>()?;
        let last = self.analyze(&last[0], tail)?;
        Ok(Rc::new(move |env| {
            for expr in &firsts {
                let value = force(expr(env)?)?;
                if value.is_truthy() {
                    return Ok(Evaluation::Done(value));
                }
            }
            last(env)
        }))
    }

    /// `(define x v)` or `(define (f a...) body...)`. Binds in the frame
    /// passed at evaluation time; never walks parents.
    fn analyze_define(&self, args: &[Value]) -> Result<Compiled, Error> {
        match args {
            [Value::Symbol(name), expr] => {
                let name = name.clone();
                let value = self.analyze(expr, false)?;
                Ok(Rc::new(move |env| {
                    let value = force(value(env)?)?;
                    env.define(name.clone(), value);
                    Ok(Evaluation::Done(Value::Nil))
                }))
            }
            [Value::Pair(signature), body @ ..] if !body.is_empty() => {
                let Value::Symbol(name) = &signature.car else {
                    return Err(Error::TypeError(
                        "define: procedure name must be a symbol".to_owned(),
                    ));
                };
                let name = name.clone();
                let lambda = self.analyze_lambda_parts(&signature.cdr, body)?;
                Ok(Rc::new(move |env| {
                    let value = force(lambda(env)?)?;
                    env.define(name.clone(), value);
                    Ok(Evaluation::Done(Value::Nil))
                }))
            }
            [_, _] => Err(Error::TypeError(
                "define: first argument must be a symbol or a signature".to_owned(),
            )),
            _ => Err(Error::arity_error_in("define", 2, args.len())),
        }
    }

    /// `(set! x v)`: assign in the nearest frame holding `x`.
    fn analyze_set(&self, args: &[Value]) -> Result<Compiled, Error> {
        match args {
            [Value::Symbol(name), expr] => {
                let name = name.clone();
                let value = self.analyze(expr, false)?;
                Ok(Rc::new(move |env| {
                    let value = force(value(env)?)?;
                    if env.assign(&name, value) {
                        Ok(Evaluation::Done(Value::Nil))
                    } else {
                        Err(Error::EvalError(format!("set!: Unbound variable: {name}")))
                    }
                }))
            }
            [_, _] => Err(Error::TypeError(
                "set!: first argument must be a symbol".to_owned(),
            )),
            _ => Err(Error::arity_error_in("set!", 2, args.len())),
        }
    }

    /// `(lambda params body...)` builds a closure over the current frame.
    fn analyze_lambda(&self, args: &[Value]) -> Result<Compiled, Error> {
        match args {
            [params, body @ ..] if !body.is_empty() => self.analyze_lambda_parts(params, body),
            _ => Err(Error::arity_error_in("lambda", 2, args.len())),
        }
    }

    /// Compile a parameter specification plus body into a closure
    /// constructor. The body is a tail position.
    fn analyze_lambda_parts(&self, params: &Value, body: &[Value]) -> Result<Compiled, Error> {
        let (fixed, rest) = parse_parameter_list(params)?;
        let body = self.analyze_body(body, true, "lambda")?;
        Ok(Rc::new(move |env| {
            Ok(Evaluation::Done(Value::Closure(Rc::new(Closure {
                params: fixed.clone(),
                rest: rest.clone(),
                body: body.clone(),
                env: env.clone(),
            }))))
        }))
    }

    /// `(define-macro (n a...) body...)`: build the transformer closure
    /// in the defining frame and register it in the macro table.
    fn analyze_define_macro(&self, args: &[Value]) -> Result<Compiled, Error> {
        match args {
            [Value::Pair(signature), body @ ..] if !body.is_empty() => {
                let Value::Symbol(name) = &signature.car else {
                    return Err(Error::TypeError(
                        "define-macro: macro name must be a symbol".to_owned(),
                    ));
                };
                let name = name.clone();
                let lambda = self.analyze_lambda_parts(&signature.cdr, body)?;
                let macros = Rc::clone(&self.macros);
                Ok(Rc::new(move |env| {
                    match force(lambda(env)?)? {
                        Value::Closure(transformer) => {
                            macros.borrow_mut().insert(name.clone(), transformer);
                            Ok(Evaluation::Done(Value::Nil))
                        }
                        // Only closures may be macros
                        other => Err(Error::TypeError(format!(
                            "define-macro: transformer must be a procedure, got {other}"
                        ))),
                    }
                }))
            }
            _ => Err(Error::EvalError(
                "define-macro: expected ((name params...) body...)".to_owned(),
            )),
        }
    }

    /// `(op arg...)`: operator and operands analyze in non-tail
    /// position; the application itself defers when `tail` is set.
    fn analyze_application(
        &self,
        operator: &Value,
        operands: &[Value],
        tail: bool,
    ) -> Result<Compiled, Error> {
        let operator = self.analyze(operator, false)?;
        let operands = operands
            .iter()
            .map(|expr| self.analyze(expr, false))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Rc::new(move |env| {
            let func = force(operator(env)?)?;
            let mut args = Vec::with_capacity(operands.len());
            for operand in &operands {
                args.push(force(operand(env)?)?);
            }
            apply(func, args, tail)
        }))
    }

    /// `` `template ``: compile the template into a builder function.
    fn analyze_quasiquote(&self, args: &[Value]) -> Result<Compiled, Error> {
        match args {
            [template] => self.analyze_template(template),
            _ => Err(Error::arity_error_in("quasiquote", 1, args.len())),
        }
    }

    /// One-level template walk: atoms yield themselves, `(unquote e)`
    /// escapes to evaluation, `(unquote-splicing e)` splices the
    /// elements of its (proper-list) value into the surrounding spine.
    fn analyze_template(&self, template: &Value) -> Result<Compiled, Error> {
        if let Some(expr) = unquote_payload(template, "unquote") {
            return self.analyze(expr, false);
        }
        if unquote_payload(template, "unquote-splicing").is_some() {
            return Err(Error::EvalError(
                "unquote-splicing: only valid inside a list template".to_owned(),
            ));
        }
        if !matches!(template, Value::Pair(_)) {
            let literal = template.clone();
            return Ok(Rc::new(move |_env| Ok(Evaluation::Done(literal.clone()))));
        }

        // Walk the spine, compiling each element. A dotted tail (or a
        // `(template . ,expr)` escape in cdr position) compiles as a
        // nested template supplying the final cdr.
        let mut segments: Vec<Segment> = Vec::new();
        let mut cursor = template.clone();
        let tail = loop {
            if unquote_payload(&cursor, "unquote").is_some() {
                break Some(self.analyze_template(&cursor)?);
            }
            match cursor {
                Value::Pair(pair) => {
                    if let Some(expr) = unquote_payload(&pair.car, "unquote-splicing") {
                        segments.push(Segment::Splice(self.analyze(expr, false)?));
                    } else {
                        segments.push(Segment::One(self.analyze_template(&pair.car)?));
                    }
                    cursor = pair.cdr.clone();
                }
                Value::Nil => break None,
                other => break Some(self.analyze_template(&other)?),
            }
        };

        Ok(Rc::new(move |env| {
            let mut built = match &tail {
                Some(tail) => force(tail(env)?)?,
                None => Value::Nil,
            };
            for segment in segments.iter().rev() {
                match segment {
                    Segment::One(element) => built = cons(force(element(env)?)?, built),
                    Segment::Splice(expr) => {
                        let spliced = force(expr(env)?)?;
                        let Some(items) = spliced.list_elements() else {
                            return Err(Error::TypeError(
                                "unquote-splicing: expected a list".to_owned(),
                            ));
                        };
                        for item in items.into_iter().rev() {
                            built = cons(item, built);
                        }
                    }
                }
            }
            Ok(Evaluation::Done(built))
        }))
    }
}

/// What one element of a list template contributes when the list is
/// built at run time.
enum Segment {
    /// A single element
    One(Compiled),
    /// An `(unquote-splicing e)` element whose value's elements are
    /// spliced in
    Splice(Compiled),
}

/// If `value` has the two-element shape `(marker payload)`, return the
/// payload.
fn unquote_payload<'a>(value: &'a Value, marker: &str) -> Option<&'a Value> {
    let Value::Pair(outer) = value else {
        return None;
    };
    let Value::Symbol(head) = &outer.car else {
        return None;
    };
    if &**head != marker {
        return None;
    }
    match &outer.cdr {
        Value::Pair(rest) if matches!(rest.cdr, Value::Nil) => Some(&rest.car),
        _ => None,
    }
}

/// Parse `(a b)`, `(a b . r)`, or a bare rest symbol into fixed
/// parameter names plus the optional rest name.
fn parse_parameter_list(params: &Value) -> Result<(Vec<Rc<str>>, Option<Rc<str>>), Error> {
    // Bare symbol: every argument is collected into one rest list
    if let Value::Symbol(name) = params {
        return Ok((Vec::new(), Some(name.clone())));
    }
    if !matches!(params, Value::Nil | Value::Pair(_)) {
        return Err(Error::TypeError(
            "lambda: parameters must be a list or a symbol".to_owned(),
        ));
    }

    let (elements, tail) = params.spine();
    let mut fixed = Vec::with_capacity(elements.len());
    for element in &elements {
        match element {
            Value::Symbol(name) => {
                if fixed.contains(name) {
                    return Err(Error::EvalError(format!(
                        "lambda: duplicate parameter name: {name}"
                    )));
                }
                fixed.push(name.clone());
            }
            other => {
                return Err(Error::TypeError(format!(
                    "lambda: parameter names must be symbols, got {other}"
                )));
            }
        }
    }
    let rest = match tail {
        Value::Nil => None,
        Value::Symbol(name) => {
            if fixed.contains(&name) {
                return Err(Error::EvalError(format!(
                    "lambda: duplicate parameter name: {name}"
                )));
            }
            Some(name)
        }
        other => {
            return Err(Error::TypeError(format!(
                "lambda: rest parameter must be a symbol, got {other}"
            )));
        }
    };
    Ok((fixed, rest))
}
