//! Macro expansion.
//!
//! Given a freshly read tree, rewrite every invocation of a registered
//! procedure macro until none remain. A single bottom-up pass is not
//! enough: macro output may itself contain macro invocations, or build
//! new pairs with macros at their head. The expander therefore repeats
//! whole-tree passes until one reports no change.

use super::{Interpreter, call_procedure};
use crate::ast::{Value, cons};
use crate::{Error, MAX_EXPANSION_PASSES};

impl Interpreter {
    /// Rewrite the tree until no subtree has a symbol head registered in
    /// the macro table.
    ///
    /// The pass count is capped: a macro that keeps producing fresh
    /// invocations (directly or mutually) never converges, and an error
    /// beats looping forever.
    pub fn expand(&self, form: &Value) -> Result<Value, Error> {
        let mut current = form.clone();
        for _ in 0..MAX_EXPANSION_PASSES {
            let (next, changed) = self.expand_pass(&current)?;
            if !changed {
                return Ok(next);
            }
            current = next;
        }
        Err(Error::EvalError(format!(
            "macro expansion did not converge after {MAX_EXPANSION_PASSES} passes"
        )))
    }

    /// One whole-tree rewrite pass. Returns the (possibly rebuilt) node
    /// and whether anything changed.
    fn expand_pass(&self, node: &Value) -> Result<(Value, bool), Error> {
        let Value::Pair(pair) = node else {
            return Ok((node.clone(), false));
        };

        if let Value::Symbol(head) = &pair.car {
            // Literals and templates are not expanded at this stage;
            // unquoted subforms are reached when the analyzer walks the
            // template.
            if matches!(&**head, "quote" | "quasiquote") {
                return Ok((node.clone(), false));
            }

            let transformer = self.macros.borrow().get(head).cloned();
            if let Some(transformer) = transformer {
                // The transformer receives the raw, unevaluated operands
                let Some(operands) = pair.cdr.list_elements() else {
                    return Err(Error::EvalError(format!(
                        "{head}: macro invocation must be a proper list"
                    )));
                };
                let rewritten = call_procedure(Value::Closure(transformer), operands)?;
                return Ok((rewritten, true));
            }
        }

        let (car, car_changed) = self.expand_pass(&pair.car)?;
        let (cdr, cdr_changed) = self.expand_pass(&pair.cdr)?;
        if car_changed || cdr_changed {
            Ok((cons(car, cdr), true))
        } else {
            Ok((node.clone(), false))
        }
    }
}
