// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Proper tail call trampoline (component C6).
//!
//! A `function_call` node in tail position does not recurse into
//! [`invoke`] again; it returns [`crate::status::AirStatus::Ptc`] up to
//! its own enclosing `invoke`, which swaps in the new target/args and
//! loops. The native call stack therefore grows with the number of
//! *non-tail* calls only — a PTC chain of any script-visible depth runs in
//! one native frame, which is the whole point of §4.5.
//!
//! Hook firing around a hop is split across two places on purpose:
//! `exec_fns::function_call` fires `on_call` for the hop's target before
//! it ever hands us the `Ptc` (so that fires exactly once, at the call
//! site, same as a non-tail call). What `invoke` owes each tail-replaced
//! activation is its `on_return` — but that can't fire the moment the hop
//! is taken, since the hopped-to function hasn't run yet. Instead each
//! hop's call site is queued in `pending_returns` and drained, innermost
//! first, once the chain actually produces a value — so `on_call`/
//! `on_return` each still fire exactly once per logical call, in source
//! order (§8), even though no native frame was ever pushed for the hop.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::ExecutiveContext;
use crate::error::RuntimeError;
use crate::reference::Reference;
use crate::sloc::SourceLocation;
use crate::status::AirStatus;
use crate::value::Value;

/// Invoke `target` with `args`, following any proper tail calls it makes
/// without growing the native stack.
#[tracing::instrument(level = "trace", skip(ctx, args, _sloc), fields(nargs = args.len()))]
pub fn invoke(
    ctx: &mut ExecutiveContext,
    target: &Value,
    args: Vec<Reference>,
    _sloc: &SourceLocation,
) -> Result<Value, RuntimeError> {
    ctx.check_recursion()
        .map_err(|e| RuntimeError::new(e.to_string(), Value::Null))?;

    let mut current_target = target.clone();
    let mut current_args = args;
    // One entry per PTC hop taken, innermost last. `function_call` already
    // fires `on_call` for the hop's target before handing us the `Ptc`
    // status, so we must not fire it again here — we only owe each
    // tail-replaced activation its `on_return`, deferred until the chain
    // actually produces a value (§8: exactly once, in source order).
    let mut pending_returns: Vec<SourceLocation> = Vec::new();

    loop {
        let Value::Function(func) = &current_target else {
            return Err(RuntimeError::new(
                format!(
                    "attempt to call a value of type `{}`",
                    current_target.type_name()
                ),
                Value::Null,
            ));
        };

        let mut callee_ctx = ctx.nested_with_bound(func.name(), func.bound().clone());
        callee_ctx
            .check_recursion()
            .map_err(|e| RuntimeError::new(e.to_string(), Value::Null))?;

        for (i, param) in func.params().iter().enumerate() {
            let value = current_args.get(i).map(Reference::read).unwrap_or(Value::Null);
            let slot = Rc::new(RefCell::new(value));
            callee_ctx.scopes_mut().declare_here(param.clone(), slot);
        }
        if func.is_variadic() {
            let rest: Vec<Value> = current_args
                .iter()
                .skip(func.params().len())
                .map(Reference::read)
                .collect();
            let slot = Rc::new(RefCell::new(Value::Array(Rc::new(RefCell::new(rest)))));
            callee_ctx.scopes_mut().declare_here("__variadic__", slot);
        }

        callee_ctx.hooks().on_function_enter(func.name());
        let status = func.body().execute(&mut callee_ctx);
        callee_ctx.hooks().on_function_leave(func.name());

        match status? {
            AirStatus::ReturnVal | AirStatus::ReturnRef => {
                let value = callee_ctx
                    .pop(1)
                    .into_iter()
                    .next()
                    .map(|r| r.read())
                    .unwrap_or(Value::Null);
                for hop_sloc in pending_returns.iter().rev() {
                    ctx.hooks().on_return(hop_sloc, true);
                }
                return Ok(value);
            }
            AirStatus::ReturnVoid | AirStatus::Next => {
                for hop_sloc in pending_returns.iter().rev() {
                    ctx.hooks().on_return(hop_sloc, true);
                }
                return Ok(Value::Null);
            }
            AirStatus::Ptc(deferred) => {
                tracing::trace!(sloc = %deferred.call_sloc, "tail call hop");
                pending_returns.push(deferred.call_sloc.clone());
                current_target = deferred.target;
                current_args = deferred.args;
            }
            other => {
                return Err(RuntimeError::new(
                    format!(
                        "a function body fell out of a {other:?} with no enclosing loop/switch"
                    ),
                    Value::Null,
                ));
            }
        }
    }
}
