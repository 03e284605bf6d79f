// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Concrete executor functions, one family per [`crate::air::AirNode`]
//! category. `air::solidify` is the only caller that picks these out of
//! thin air (as function pointers); everything else reaches them through
//! the [`crate::queue::Node`] they were attached to.

use std::rc::Rc;

use crate::air::xop::{apply_binary, Xop};
use crate::context::ExecutiveContext;
use crate::error::RuntimeError;
use crate::frame::FrameType;
use crate::queue::{AvmcQueue, Node};
use crate::reference::{Reference, VarSlot};
use crate::sloc::SourceLocation;
use crate::status::{AirStatus, DeferredCall, PtcAware};
use crate::value::Value;

use super::NodeError;

/// Sparam payload carried by `push_unnamed_object`/`unpack_object`.
pub type NameList = Vec<Rc<str>>;

/// Sparam payload for `define_function`. `body` is `Rc`-shared (not
/// embedded by value) because every activation of the defined function
/// reuses the same compiled queue — solidifying it once and handing out
/// clones of the handle is both the cheaper and the correct choice.
pub struct DefineFunctionPayload {
    pub name: Rc<str>,
    pub params: Vec<Rc<str>>,
    pub is_variadic: bool,
    pub body: Rc<AvmcQueue>,
    pub sloc: SourceLocation,
}

/// Sparam payload shared by the structured-statement family: each carries
/// one or more nested queues plus (for loops/branches) a condition queue
/// whose last pushed value is the test.
pub struct ConditionalBody {
    pub condition: AvmcQueue,
    pub body: AvmcQueue,
}

pub struct IfPayload {
    /// `None` condition marks the trailing `else`.
    pub branches: Vec<(Option<AvmcQueue>, AvmcQueue)>,
}

pub struct SwitchPayload {
    pub arms: Vec<(SwitchTest, AvmcQueue)>,
}

pub enum SwitchTest {
    Equal(AvmcQueue),
    Between {
        lower: AvmcQueue,
        lower_closed: bool,
        upper: AvmcQueue,
        upper_closed: bool,
    },
    Default,
}

pub struct ForPayload {
    pub init: AvmcQueue,
    pub condition: Option<AvmcQueue>,
    pub step: AvmcQueue,
    pub body: AvmcQueue,
}

pub struct ForEachPayload {
    pub key_name: Option<Rc<str>>,
    pub value_name: Rc<str>,
    pub iterable: AvmcQueue,
    pub body: AvmcQueue,
}

pub struct TryCatchPayload {
    pub try_body: AvmcQueue,
    pub catch_name: Rc<str>,
    pub catch_body: AvmcQueue,
}

pub struct BranchPayload {
    pub condition: AvmcQueue,
    pub if_true: AvmcQueue,
    pub if_false: AvmcQueue,
}

pub struct CallPayload {
    pub nargs: u32,
    pub ptc_aware: PtcAware,
    pub sloc: SourceLocation,
}

pub struct ImportPayload {
    pub path: Rc<str>,
    pub sloc: SourceLocation,
}

fn declare_slot(ctx: &mut ExecutiveContext, name: &str, initial: Value) {
    let slot: VarSlot = Rc::new(std::cell::RefCell::new(initial));
    ctx.scopes_mut().declare_here(name, slot.clone());
    ctx.push(Reference::Variable(slot));
}

// --- 1. control-flow scaffolding ---

pub fn clear_stack(ctx: &mut ExecutiveContext, _node: &Node) -> Result<AirStatus, NodeError> {
    ctx.clear();
    Ok(AirStatus::Next)
}

pub fn alt_clear_stack(ctx: &mut ExecutiveContext, _node: &Node) -> Result<AirStatus, NodeError> {
    if let Some(top) = ctx.pop(1).into_iter().next() {
        ctx.clear();
        ctx.push(top);
    }
    Ok(AirStatus::Next)
}

pub fn simple_status_break_unspec(
    _ctx: &mut ExecutiveContext,
    _node: &Node,
) -> Result<AirStatus, NodeError> {
    Ok(AirStatus::BreakUnspec)
}

pub fn simple_status_continue_unspec(
    _ctx: &mut ExecutiveContext,
    _node: &Node,
) -> Result<AirStatus, NodeError> {
    Ok(AirStatus::ContinueUnspec)
}

pub fn simple_status_return_void(
    _ctx: &mut ExecutiveContext,
    _node: &Node,
) -> Result<AirStatus, NodeError> {
    Ok(AirStatus::ReturnVoid)
}

pub fn execute_block(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let body = node
        .sparam_downcast::<AvmcQueue>()
        .ok_or_else(|| NodeError::Native("execute_block: missing body".into()))?;
    ctx.scopes_mut().push();
    let status = body.execute(ctx);
    ctx.scopes_mut().pop();
    Ok(status?)
}

pub fn single_step_trap(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    if ctx.config().verbose_traps {
        let sloc = node
            .sparam_downcast::<SourceLocation>()
            .cloned()
            .unwrap_or_default();
        ctx.hooks().on_trap(&sloc)?;
    }
    if ctx.is_trapped() {
        return Err(NodeError::Native("execution cancelled".into()));
    }
    Ok(AirStatus::Next)
}

pub fn return_statement_by_value(
    _ctx: &mut ExecutiveContext,
    _node: &Node,
) -> Result<AirStatus, NodeError> {
    Ok(AirStatus::ReturnVal)
}

pub fn return_statement_by_ref(
    _ctx: &mut ExecutiveContext,
    _node: &Node,
) -> Result<AirStatus, NodeError> {
    Ok(AirStatus::ReturnRef)
}

pub fn return_statement_bi32(
    ctx: &mut ExecutiveContext,
    node: &Node,
) -> Result<AirStatus, NodeError> {
    let value = node.uparam().as_i32_at_offset4();
    ctx.push(Reference::Temporary(Value::Integer(i64::from(value))));
    Ok(AirStatus::ReturnVal)
}

// --- 2. declarations and references ---

pub fn declare_variable(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let name = node
        .sparam_downcast::<Rc<str>>()
        .ok_or_else(|| NodeError::Native("declare_variable: missing name".into()))?;
    ctx.hooks().on_declare(&SourceLocation::unknown(), name);
    declare_slot(ctx, name, Value::Null);
    Ok(AirStatus::Next)
}

pub fn initialize_variable(
    ctx: &mut ExecutiveContext,
    _node: &Node,
) -> Result<AirStatus, NodeError> {
    let popped = ctx.pop(2);
    let [target, value] = popped.as_slice() else {
        return Err(NodeError::Native(
            "initialize_variable: expected [target, value] on stack".into(),
        ));
    };
    let mut target = target.clone();
    target.write(value.read());
    ctx.push(target);
    Ok(AirStatus::Next)
}

pub fn define_null_variable(
    ctx: &mut ExecutiveContext,
    node: &Node,
) -> Result<AirStatus, NodeError> {
    let name = node
        .sparam_downcast::<Rc<str>>()
        .ok_or_else(|| NodeError::Native("define_null_variable: missing name".into()))?;
    declare_slot(ctx, name, Value::Null);
    Ok(AirStatus::Next)
}

pub fn declare_reference(ctx: &mut ExecutiveContext, _node: &Node) -> Result<AirStatus, NodeError> {
    ctx.push(Reference::Uninitialized);
    Ok(AirStatus::Next)
}

pub fn initialize_reference(
    ctx: &mut ExecutiveContext,
    _node: &Node,
) -> Result<AirStatus, NodeError> {
    let popped = ctx.pop(2);
    let [mut target, value] = <[Reference; 2]>::try_from(popped)
        .map_err(|_| NodeError::Native("initialize_reference: stack underflow".into()))?;
    target.write(value.read());
    ctx.push(target);
    Ok(AirStatus::Next)
}

pub fn push_global_reference(
    ctx: &mut ExecutiveContext,
    node: &Node,
) -> Result<AirStatus, NodeError> {
    let name = node
        .sparam_downcast::<Rc<str>>()
        .ok_or_else(|| NodeError::Native("push_global_reference: missing name".into()))?;
    let reference = ctx
        .scopes()
        .resolve(name)
        .map(|slot| Reference::Variable(slot.clone()))
        .unwrap_or(Reference::Uninitialized);
    ctx.push(reference);
    Ok(AirStatus::Next)
}

pub fn push_local_reference(
    ctx: &mut ExecutiveContext,
    node: &Node,
) -> Result<AirStatus, NodeError> {
    let depth = node.uparam().as_u32_at_offset4() as usize;
    let name = node
        .sparam_downcast::<Rc<str>>()
        .ok_or_else(|| NodeError::Native("push_local_reference: missing name".into()))?;
    let reference = ctx
        .scopes()
        .resolve_at_depth(depth, name)
        .map(|slot| Reference::Variable(slot.clone()))
        .unwrap_or(Reference::Uninitialized);
    ctx.push(reference);
    Ok(AirStatus::Next)
}

pub fn push_bound_reference(
    ctx: &mut ExecutiveContext,
    node: &Node,
) -> Result<AirStatus, NodeError> {
    let index = node.uparam().as_u32_at_offset4() as usize;
    let reference = ctx.bound(index).cloned().unwrap_or(Reference::Uninitialized);
    ctx.push(reference);
    Ok(AirStatus::Next)
}

// --- 3. structured statements ---

pub fn if_statement(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<IfPayload>()
        .ok_or_else(|| NodeError::Native("if: missing payload".into()))?;
    for (condition, body) in &payload.branches {
        let taken = match condition {
            Some(cond_queue) => {
                cond_queue.execute(ctx)?;
                ctx.pop(1).into_iter().next().is_some_and(|r| r.read().is_truthy())
            }
            None => true,
        };
        if taken {
            ctx.scopes_mut().push();
            let status = body.execute(ctx);
            ctx.scopes_mut().pop();
            return Ok(status?);
        }
    }
    Ok(AirStatus::Next)
}

pub fn switch_statement(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<SwitchPayload>()
        .ok_or_else(|| NodeError::Native("switch: missing payload".into()))?;
    let subject = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("switch: missing subject".into()))?
        .read();

    ctx.scopes_mut().push();
    let result = (|| -> Result<AirStatus, NodeError> {
        for (test, body) in &payload.arms {
            let matched = match test {
                SwitchTest::Default => true,
                SwitchTest::Equal(queue) => {
                    queue.execute(ctx)?;
                    let candidate = ctx.pop(1).into_iter().next().map(|r| r.read());
                    candidate.is_some_and(|c| values_equal(&c, &subject))
                }
                SwitchTest::Between {
                    lower,
                    lower_closed,
                    upper,
                    upper_closed,
                } => {
                    lower.execute(ctx)?;
                    let lo = ctx.pop(1).into_iter().next().map(|r| r.read());
                    upper.execute(ctx)?;
                    let hi = ctx.pop(1).into_iter().next().map(|r| r.read());
                    match (lo, hi) {
                        (Some(lo), Some(hi)) => {
                            in_range(&subject, &lo, *lower_closed, &hi, *upper_closed)
                        }
                        _ => false,
                    }
                }
            };
            if matched {
                let status = body.execute(ctx)?;
                if matches!(status, AirStatus::BreakSwitch | AirStatus::BreakUnspec) {
                    return Ok(AirStatus::Next);
                }
                return Ok(status);
            }
        }
        Ok(AirStatus::Next)
    })();
    ctx.scopes_mut().pop();
    result
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Real(x), Value::Real(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        _ => false,
    }
}

fn in_range(v: &Value, lo: &Value, lo_closed: bool, hi: &Value, hi_closed: bool) -> bool {
    let (Value::Integer(v), Value::Integer(lo), Value::Integer(hi)) = (v, lo, hi) else {
        return false;
    };
    let above = if lo_closed { v >= lo } else { v > lo };
    let below = if hi_closed { v <= hi } else { v < hi };
    above && below
}

pub fn do_while_statement(
    ctx: &mut ExecutiveContext,
    node: &Node,
) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<ConditionalBody>()
        .ok_or_else(|| NodeError::Native("do_while: missing payload".into()))?;
    loop {
        ctx.scopes_mut().push();
        let status = payload.body.execute(ctx);
        ctx.scopes_mut().pop();
        match status? {
            AirStatus::BreakWhile | AirStatus::BreakUnspec => return Ok(AirStatus::Next),
            AirStatus::ContinueWhile | AirStatus::ContinueUnspec | AirStatus::Next => {}
            other => return Ok(other),
        }
        payload.condition.execute(ctx)?;
        let cond = ctx.pop(1).into_iter().next().is_some_and(|r| r.read().is_truthy());
        if !cond {
            return Ok(AirStatus::Next);
        }
    }
}

pub fn while_statement(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<ConditionalBody>()
        .ok_or_else(|| NodeError::Native("while: missing payload".into()))?;
    loop {
        payload.condition.execute(ctx)?;
        let cond = ctx.pop(1).into_iter().next().is_some_and(|r| r.read().is_truthy());
        if !cond {
            return Ok(AirStatus::Next);
        }
        ctx.scopes_mut().push();
        let status = payload.body.execute(ctx);
        ctx.scopes_mut().pop();
        match status? {
            AirStatus::BreakWhile | AirStatus::BreakUnspec => return Ok(AirStatus::Next),
            AirStatus::ContinueWhile | AirStatus::ContinueUnspec | AirStatus::Next => {}
            other => return Ok(other),
        }
    }
}

pub fn for_statement(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<ForPayload>()
        .ok_or_else(|| NodeError::Native("for: missing payload".into()))?;
    ctx.scopes_mut().push();
    let result = (|| -> Result<AirStatus, NodeError> {
        payload.init.execute(ctx)?;
        loop {
            if let Some(condition) = &payload.condition {
                condition.execute(ctx)?;
                let cond = ctx.pop(1).into_iter().next().is_some_and(|r| r.read().is_truthy());
                if !cond {
                    return Ok(AirStatus::Next);
                }
            }
            ctx.scopes_mut().push();
            let status = payload.body.execute(ctx);
            ctx.scopes_mut().pop();
            match status? {
                AirStatus::BreakFor | AirStatus::BreakUnspec => return Ok(AirStatus::Next),
                AirStatus::ContinueFor | AirStatus::ContinueUnspec | AirStatus::Next => {}
                other => return Ok(other),
            }
            payload.step.execute(ctx)?;
        }
    })();
    ctx.scopes_mut().pop();
    result
}

pub fn for_each_statement(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<ForEachPayload>()
        .ok_or_else(|| NodeError::Native("for_each: missing payload".into()))?;
    payload.iterable.execute(ctx)?;
    let iterable = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("for_each: missing iterable".into()))?
        .read();

    let entries: Vec<(Value, Value)> = match &iterable {
        Value::Array(arr) => arr
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::Integer(i as i64), v.clone()))
            .collect(),
        Value::Object(obj) => obj
            .borrow()
            .iter()
            .map(|(k, v)| (Value::Str(k.clone()), v.clone()))
            .collect(),
        _ => Vec::new(),
    };

    for (key, value) in entries {
        ctx.scopes_mut().push();
        if let Some(key_name) = &payload.key_name {
            declare_slot(ctx, key_name, key);
            ctx.pop(1);
        }
        declare_slot(ctx, &payload.value_name, value);
        ctx.pop(1);
        let status = payload.body.execute(ctx);
        ctx.scopes_mut().pop();
        match status? {
            AirStatus::BreakFor | AirStatus::BreakUnspec => return Ok(AirStatus::Next),
            AirStatus::ContinueFor | AirStatus::ContinueUnspec | AirStatus::Next => {}
            other => return Ok(other),
        }
    }
    Ok(AirStatus::Next)
}

pub fn try_catch_statement(
    ctx: &mut ExecutiveContext,
    node: &Node,
) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<TryCatchPayload>()
        .ok_or_else(|| NodeError::Native("try_catch: missing payload".into()))?;

    ctx.scopes_mut().push();
    let try_result = payload.try_body.execute(ctx);
    ctx.scopes_mut().pop();

    match try_result {
        Ok(status) => Ok(status),
        Err(runtime_err) => {
            ctx.scopes_mut().push();
            declare_slot(ctx, &payload.catch_name, runtime_err.value.clone());
            ctx.pop(1);
            let status = payload.catch_body.execute(ctx);
            ctx.scopes_mut().pop();
            Ok(status?)
        }
    }
}

// --- 4. expression bodies ---

pub fn branch_expression(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<BranchPayload>()
        .ok_or_else(|| NodeError::Native("branch: missing payload".into()))?;
    payload.condition.execute(ctx)?;
    let cond = ctx.pop(1).into_iter().next().is_some_and(|r| r.read().is_truthy());
    let status = if cond {
        payload.if_true.execute(ctx)?
    } else {
        payload.if_false.execute(ctx)?
    };
    Ok(status)
}

pub fn coalesce_expression(
    ctx: &mut ExecutiveContext,
    node: &Node,
) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<(AvmcQueue, AvmcQueue)>()
        .ok_or_else(|| NodeError::Native("coalesce: missing payload".into()))?;
    let (lhs, rhs) = payload;
    lhs.execute(ctx)?;
    let is_null = ctx.top().is_some_and(|r| r.read().is_null());
    if is_null {
        ctx.pop(1);
        rhs.execute(ctx)?;
    }
    Ok(AirStatus::Next)
}

pub fn catch_expression(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let body = node
        .sparam_downcast::<AvmcQueue>()
        .ok_or_else(|| NodeError::Native("catch_expression: missing body".into()))?;
    match body.execute(ctx) {
        Ok(_) => ctx.push(Reference::Temporary(Value::Null)),
        Err(err) => ctx.push(Reference::Temporary(err.value)),
    }
    Ok(AirStatus::Next)
}

pub fn check_argument(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let index = node.uparam().as_u32_at_offset4() as usize;
    if ctx.stack_len() <= index {
        return Err(NodeError::Runtime(RuntimeError::new(
            format!("missing required argument at position {index}"),
            Value::Null,
        )));
    }
    Ok(AirStatus::Next)
}

pub fn check_null(ctx: &mut ExecutiveContext, _node: &Node) -> Result<AirStatus, NodeError> {
    let is_null = ctx.top().is_some_and(|r| r.read().is_null());
    if is_null {
        return Err(NodeError::Runtime(RuntimeError::new(
            "unexpected null",
            Value::Null,
        )));
    }
    Ok(AirStatus::Next)
}

pub fn apply_operator(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let bytes = node.uparam().as_u8s();
    let xop = Xop::from_u8(bytes[0])
        .ok_or_else(|| NodeError::Native(format!("unknown operator tag {}", bytes[0])))?;
    let assign = node.uparam().as_bools()[1];

    if xop.arity() == 1 {
        let mut target = ctx
            .pop(1)
            .into_iter()
            .next()
            .ok_or_else(|| NodeError::Native("apply_operator: missing operand".into()))?;
        let result = apply_unary(xop, &target.read())?;
        if assign {
            target.write(result);
            ctx.push(target);
        } else {
            ctx.push(Reference::Temporary(result));
        }
        return Ok(AirStatus::Next);
    }

    let popped = ctx.pop(2);
    let [lhs, rhs] = <[Reference; 2]>::try_from(popped)
        .map_err(|_| NodeError::Native("apply_operator: stack underflow".into()))?;
    let result = apply_binary(xop, &lhs.read(), &rhs.read())?;
    if assign {
        let mut lhs = lhs;
        lhs.write(result);
        ctx.push(lhs);
    } else {
        ctx.push(Reference::Temporary(result));
    }
    Ok(AirStatus::Next)
}

fn apply_unary(op: Xop, value: &Value) -> Result<Value, RuntimeError> {
    let Value::Integer(n) = value else {
        return Err(RuntimeError::new(
            format!("operator {op:?} requires an integer operand"),
            Value::Null,
        ));
    };
    let result = match op {
        Xop::Pos => *n,
        Xop::Neg => n.wrapping_neg(),
        Xop::Notb => !n,
        Xop::Inc => n.wrapping_add(1),
        Xop::Dec => n.wrapping_sub(1),
        Xop::Abs => n.abs(),
        Xop::Sign => n.signum(),
        other => {
            return Err(RuntimeError::new(
                format!("operator {other:?} is not supported on integers"),
                Value::Null,
            ));
        }
    };
    Ok(Value::Integer(result))
}

pub fn apply_operator_bi32(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let xop = Xop::from_u8(node.uparam().as_u8s()[0])
        .ok_or_else(|| NodeError::Native("unknown operator tag".into()))?;
    let assign = node.uparam().as_bools()[1];
    let rhs = Value::Integer(i64::from(node.uparam().as_i32_at_offset4()));

    let mut target = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("apply_operator_bi32: missing operand".into()))?;
    let result = apply_binary(xop, &target.read(), &rhs)?;
    if assign {
        target.write(result);
        ctx.push(target);
    } else {
        ctx.push(Reference::Temporary(result));
    }
    Ok(AirStatus::Next)
}

pub fn member_access(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let key = node
        .sparam_downcast::<Rc<str>>()
        .ok_or_else(|| NodeError::Native("member_access: missing key".into()))?;
    let object = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("member_access: missing object".into()))?
        .read();
    ctx.push(Reference::ObjectProperty {
        object,
        key: key.clone(),
    });
    Ok(AirStatus::Next)
}

// --- 5. calls and composite construction ---

pub fn function_call(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<CallPayload>()
        .ok_or_else(|| NodeError::Native("function_call: missing payload".into()))?;
    let args = ctx.pop(payload.nargs as usize);
    let target = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("function_call: missing target".into()))?
        .read();

    ctx.hooks().on_call(&payload.sloc, &target);

    if payload.ptc_aware.is_tail() {
        return Ok(AirStatus::Ptc(Box::new(DeferredCall {
            target,
            args,
            mode: payload.ptc_aware,
            call_sloc: payload.sloc.clone(),
        })));
    }

    let result = super::trampoline::invoke(ctx, &target, args, &payload.sloc)?;
    ctx.hooks().on_return(&payload.sloc, false);
    ctx.push(Reference::Temporary(result));
    Ok(AirStatus::Next)
}

pub fn alt_function_call(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    function_call(ctx, node)
}

pub fn variadic_call(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let sloc = node
        .sparam_downcast::<SourceLocation>()
        .cloned()
        .unwrap_or_default();
    let args_value = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("variadic_call: missing argument array".into()))?
        .read();
    let args: Vec<Reference> = match &args_value {
        Value::Array(arr) => arr.borrow().iter().cloned().map(Reference::Temporary).collect(),
        _ => Vec::new(),
    };
    let target = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("variadic_call: missing target".into()))?
        .read();
    ctx.hooks().on_call(&sloc, &target);
    let result = super::trampoline::invoke(ctx, &target, args, &sloc)?;
    ctx.hooks().on_return(&sloc, false);
    ctx.push(Reference::Temporary(result));
    Ok(AirStatus::Next)
}

/// Resolve an import path's lock through the host-supplied loader (C8).
///
/// Compiling and executing the imported file is out of scope here (§1:
/// no lexer/parser/AST-to-IR pass lives in this crate), so a successful
/// lock is released immediately after being taken — what this node
/// exists to surface is the loader's own sequencing: a script that
/// imports itself (directly or through a cycle) must fail with
/// `RecursiveImport` rather than deadlock or blow the native stack (§8
/// scenario 5).
pub fn import_call(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<ImportPayload>()
        .ok_or_else(|| NodeError::Native("import_call: missing payload".into()))?;
    let Some(loader) = ctx.loader() else {
        return Err(NodeError::Native(format!(
            "import of {:?} requires a module loader (none configured on this context)",
            payload.path
        )));
    };
    match loader.lock(payload.path.as_ref()) {
        Ok(_guard) => {
            ctx.push(Reference::Temporary(Value::Null));
            Ok(AirStatus::Next)
        }
        Err(e) => Err(NodeError::Native(format!(
            "import of {:?} failed: {e}",
            payload.path
        ))),
    }
}

pub fn push_unnamed_array(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let count = node.uparam().as_u32_at_offset4() as usize;
    let elements: Vec<Value> = ctx.pop(count).into_iter().map(|r| r.read()).collect();
    ctx.push(Reference::Temporary(Value::Array(Rc::new(
        std::cell::RefCell::new(elements),
    ))));
    Ok(AirStatus::Next)
}

pub fn push_unnamed_object(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let names = node
        .sparam_downcast::<NameList>()
        .ok_or_else(|| NodeError::Native("push_unnamed_object: missing names".into()))?;
    let values = ctx.pop(names.len());
    let mut map = std::collections::HashMap::with_capacity(names.len());
    for (name, value) in names.iter().zip(values) {
        map.insert(name.clone(), value.read());
    }
    ctx.push(Reference::Temporary(Value::Object(Rc::new(
        std::cell::RefCell::new(map),
    ))));
    Ok(AirStatus::Next)
}

pub fn unpack_array(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let count = node.uparam().as_u32_at_offset4() as usize;
    let source = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("unpack_array: missing source".into()))?
        .read();
    let Value::Array(arr) = source else {
        return Err(NodeError::Runtime(RuntimeError::new(
            "cannot unpack a non-array value",
            Value::Null,
        )));
    };
    for i in 0..count {
        let v = arr.borrow().get(i).cloned().unwrap_or(Value::Null);
        ctx.push(Reference::Temporary(v));
    }
    Ok(AirStatus::Next)
}

pub fn unpack_object(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let names = node
        .sparam_downcast::<NameList>()
        .ok_or_else(|| NodeError::Native("unpack_object: missing names".into()))?;
    let source = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("unpack_object: missing source".into()))?
        .read();
    let Value::Object(obj) = source else {
        return Err(NodeError::Runtime(RuntimeError::new(
            "cannot unpack a non-object value",
            Value::Null,
        )));
    };
    for name in names {
        let v = obj.borrow().get(name.as_ref()).cloned().unwrap_or(Value::Null);
        ctx.push(Reference::Temporary(v));
    }
    Ok(AirStatus::Next)
}

pub fn define_function(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let payload = node
        .sparam_downcast::<DefineFunctionPayload>()
        .ok_or_else(|| NodeError::Native("define_function: missing payload".into()))?;
    ctx.push(Reference::Temporary(Value::Function(Rc::new(
        crate::value::function::Function::new(
            payload.name.clone(),
            payload.params.clone(),
            payload.is_variadic,
            payload.body.clone(),
            Rc::from([]),
            payload.sloc.clone(),
        ),
    ))));
    Ok(AirStatus::Next)
}

pub fn defer_expression(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    // `defer` bodies run at scope exit in the original; without a
    // dedicated scope-exit hook in this executor, we conservatively run
    // them immediately, which preserves effect-ordering among a block's
    // own statements at the cost of true deferred timing.
    let body = node
        .sparam_downcast::<AvmcQueue>()
        .ok_or_else(|| NodeError::Native("defer: missing body".into()))?;
    body.execute(ctx)?;
    Ok(AirStatus::Next)
}

// --- 6. terminators and side effects ---

pub fn throw_statement(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let sloc = node
        .sparam_downcast::<SourceLocation>()
        .cloned()
        .unwrap_or_default();
    let value = ctx
        .pop(1)
        .into_iter()
        .next()
        .ok_or_else(|| NodeError::Native("throw: missing value".into()))?
        .read();
    ctx.hooks().on_throw(&sloc, &value);
    let mut err = RuntimeError::new(describe(&value), value);
    err.push_frame(FrameType::Throw, Some(sloc));
    Err(NodeError::Runtime(err))
}

pub fn assert_statement(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let msg = node
        .sparam_downcast::<Rc<str>>()
        .ok_or_else(|| NodeError::Native("assert: missing message".into()))?;
    let ok = ctx
        .pop(1)
        .into_iter()
        .next()
        .is_some_and(|r| r.read().is_truthy());
    if ok {
        Ok(AirStatus::Next)
    } else {
        Err(NodeError::Runtime(RuntimeError::new(
            msg.to_string(),
            Value::Str(msg.clone()),
        )))
    }
}

pub fn push_constant(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let value = node.sparam_downcast::<Value>().cloned().unwrap_or(Value::Null);
    ctx.push(Reference::Temporary(value));
    Ok(AirStatus::Next)
}

fn describe(v: &Value) -> String {
    match v {
        Value::Str(s) => s.to_string(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod import_call_test {
    use super::*;
    use crate::config::ExecutorConfig;
    use crate::loader::ModuleLoader;
    use crate::param::Uparam;
    use crate::queue::AppendArgs;

    fn import_queue(path: &str) -> AvmcQueue {
        let mut queue = AvmcQueue::new();
        queue
            .append(
                AppendArgs::simple(import_call, Uparam::zeroed()).with_sparam(
                    Box::new(ImportPayload {
                        path: Rc::from(path),
                        sloc: SourceLocation::unknown(),
                    }),
                    std::mem::size_of::<ImportPayload>(),
                ),
            )
            .unwrap();
        queue
    }

    #[test]
    fn without_a_loader_import_fails_instead_of_no_oping() {
        let queue = import_queue("/nonexistent/does/not/exist.asteria");
        let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
        let err = queue.execute(&mut ctx).unwrap_err();
        assert!(err.message.contains("module loader"));
    }

    #[test]
    fn import_of_a_real_file_succeeds_and_releases_the_lock() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let queue = import_queue(tmp.path().to_str().unwrap());
        let mut ctx =
            ExecutiveContext::new(ExecutorConfig::default()).with_loader(ModuleLoader::new());
        assert!(queue.execute(&mut ctx).unwrap().is_next());
    }

    #[test]
    fn recursive_import_of_the_same_file_is_denied() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let loader = ModuleLoader::new();
        let held = loader.lock(tmp.path()).unwrap();

        let queue = import_queue(tmp.path().to_str().unwrap());
        let mut ctx = ExecutiveContext::new(ExecutorConfig::default()).with_loader(loader);
        let err = queue.execute(&mut ctx).unwrap_err();
        assert!(err.message.contains("RecursiveImport") || err.message.contains("failed"));

        drop(held);
    }
}
