// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Solidification: turn an [`super::AirNode`] tree into an
//! [`crate::queue::AvmcQueue`] by picking the matching executor function
//! pointer from [`crate::executor::exec_fns`] and packing its Uparam/
//! sparam.

use std::rc::Rc;

use crate::executor::exec_fns::{
    self, BranchPayload, CallPayload, ConditionalBody, DefineFunctionPayload, ForEachPayload,
    ForPayload, IfPayload, ImportPayload, NameList, SwitchPayload, SwitchTest, TryCatchPayload,
};
use crate::param::Uparam;
use crate::queue::{AppendArgs, AvmcQueue, QueueError};

use super::{AirNode, FunctionOpts, IfBranch, SimpleStatusKind, SwitchArm, SwitchClause};

/// Solidify a full block (a `Vec<AirNode>`, e.g. a function or loop body)
/// into one queue.
pub fn solidify_block(body: &[AirNode]) -> Result<AvmcQueue, QueueError> {
    let mut queue = AvmcQueue::new();
    for node in body {
        solidify_into(node, &mut queue)?;
    }
    Ok(queue)
}

fn solidify_into(node: &AirNode, queue: &mut AvmcQueue) -> Result<(), QueueError> {
    match node {
        AirNode::ClearStack => {
            queue.append(AppendArgs::simple(exec_fns::clear_stack, Uparam::zeroed()))?;
        }
        AirNode::AltClearStack => {
            queue.append(AppendArgs::simple(
                exec_fns::alt_clear_stack,
                Uparam::zeroed(),
            ))?;
        }
        AirNode::SimpleStatus(kind) => {
            let executor = match kind {
                SimpleStatusKind::Break => exec_fns::simple_status_break_unspec,
                SimpleStatusKind::Continue => exec_fns::simple_status_continue_unspec,
                SimpleStatusKind::ReturnVoid => exec_fns::simple_status_return_void,
            };
            queue.append(AppendArgs::simple(executor, Uparam::zeroed()))?;
        }
        AirNode::ExecuteBlock(body) => {
            let inner = solidify_block(body)?;
            queue.append(
                AppendArgs::simple(exec_fns::execute_block, Uparam::zeroed())
                    .with_sparam(Box::new(inner), 8)
                    .with_variable_getter(Box::new(|node, staged, temp| {
                        if let Some(inner) = node.sparam_downcast::<AvmcQueue>() {
                            crate::collect::collect_variables(inner, staged, temp);
                        }
                    })),
            )?;
        }
        AirNode::SingleStepTrap(sloc) => {
            queue.append(
                AppendArgs::simple(exec_fns::single_step_trap, Uparam::zeroed())
                    .with_sparam(Box::new(sloc.clone()), 8)
                    .with_sloc(sloc.clone()),
            )?;
        }
        AirNode::ReturnStatement {
            sloc,
            by_ref,
            is_void,
        } => {
            let executor = if *is_void {
                exec_fns::simple_status_return_void
            } else if *by_ref {
                exec_fns::return_statement_by_ref
            } else {
                exec_fns::return_statement_by_value
            };
            queue.append(
                AppendArgs::simple(executor, Uparam::zeroed()).with_sloc(sloc.clone()),
            )?;
        }
        AirNode::ReturnStatementBi32 { sloc, value } => {
            queue.append(
                AppendArgs::simple(
                    exec_fns::return_statement_bi32,
                    Uparam::from_i32_at_offset4(*value),
                )
                .with_sloc(sloc.clone()),
            )?;
        }

        AirNode::DeclareVariable(name) => {
            queue.append(
                AppendArgs::simple(exec_fns::declare_variable, Uparam::zeroed())
                    .with_sparam(Box::new(name.clone()), name.len()),
            )?;
        }
        AirNode::InitializeVariable(_name) => {
            queue.append(AppendArgs::simple(
                exec_fns::initialize_variable,
                Uparam::zeroed(),
            ))?;
        }
        AirNode::DefineNullVariable(name) => {
            queue.append(
                AppendArgs::simple(exec_fns::define_null_variable, Uparam::zeroed())
                    .with_sparam(Box::new(name.clone()), name.len()),
            )?;
        }
        AirNode::DeclareReference(_name) => {
            queue.append(AppendArgs::simple(
                exec_fns::declare_reference,
                Uparam::zeroed(),
            ))?;
        }
        AirNode::InitializeReference(_name) => {
            queue.append(AppendArgs::simple(
                exec_fns::initialize_reference,
                Uparam::zeroed(),
            ))?;
        }
        AirNode::PushGlobalReference(name) => {
            queue.append(
                AppendArgs::simple(exec_fns::push_global_reference, Uparam::zeroed())
                    .with_sparam(Box::new(name.clone()), name.len()),
            )?;
        }
        AirNode::PushLocalReference { depth, name } => {
            queue.append(
                AppendArgs::simple(
                    exec_fns::push_local_reference,
                    Uparam::from_u32_at_offset4(*depth),
                )
                .with_sparam(Box::new(name.clone()), name.len()),
            )?;
        }
        AirNode::PushBoundReference(index) => {
            queue.append(AppendArgs::simple(
                exec_fns::push_bound_reference,
                Uparam::from_u32_at_offset4(*index as u32),
            ))?;
        }

        AirNode::If(branches) => {
            let mut solid_branches = Vec::with_capacity(branches.len());
            for IfBranch { condition, body } in branches {
                let cond = condition
                    .as_ref()
                    .map(|c| solidify_block(std::slice::from_ref(c.as_ref())))
                    .transpose()?;
                solid_branches.push((cond, solidify_block(body)?));
            }
            queue.append(
                AppendArgs::simple(exec_fns::if_statement, Uparam::zeroed()).with_sparam(
                    Box::new(IfPayload {
                        branches: solid_branches,
                    }),
                    8,
                ),
            )?;
        }
        AirNode::Switch(arms) => {
            let mut solid_arms = Vec::with_capacity(arms.len());
            for SwitchArm { clause, body } in arms {
                let test = match clause {
                    SwitchClause::CaseEqual(expr) => {
                        SwitchTest::Equal(solidify_block(std::slice::from_ref(expr.as_ref()))?)
                    }
                    SwitchClause::CaseBetween {
                        lower,
                        lower_closed,
                        upper,
                        upper_closed,
                    } => SwitchTest::Between {
                        lower: solidify_block(std::slice::from_ref(lower.as_ref()))?,
                        lower_closed: *lower_closed,
                        upper: solidify_block(std::slice::from_ref(upper.as_ref()))?,
                        upper_closed: *upper_closed,
                    },
                    SwitchClause::Default => SwitchTest::Default,
                };
                solid_arms.push((test, solidify_block(body)?));
            }
            queue.append(
                AppendArgs::simple(exec_fns::switch_statement, Uparam::zeroed())
                    .with_sparam(Box::new(SwitchPayload { arms: solid_arms }), 8),
            )?;
        }
        AirNode::DoWhile { body, condition } => {
            let payload = ConditionalBody {
                condition: solidify_block(std::slice::from_ref(condition.as_ref()))?,
                body: solidify_block(body)?,
            };
            queue.append(
                AppendArgs::simple(exec_fns::do_while_statement, Uparam::zeroed())
                    .with_sparam(Box::new(payload), 8),
            )?;
        }
        AirNode::While { condition, body } => {
            let payload = ConditionalBody {
                condition: solidify_block(std::slice::from_ref(condition.as_ref()))?,
                body: solidify_block(body)?,
            };
            queue.append(
                AppendArgs::simple(exec_fns::while_statement, Uparam::zeroed())
                    .with_sparam(Box::new(payload), 8),
            )?;
        }
        AirNode::For {
            init,
            condition,
            step,
            body,
        } => {
            let payload = ForPayload {
                init: solidify_block(init)?,
                condition: condition
                    .as_ref()
                    .map(|c| solidify_block(std::slice::from_ref(c.as_ref())))
                    .transpose()?,
                step: solidify_block(step)?,
                body: solidify_block(body)?,
            };
            queue.append(
                AppendArgs::simple(exec_fns::for_statement, Uparam::zeroed())
                    .with_sparam(Box::new(payload), 8),
            )?;
        }
        AirNode::ForEach {
            key_name,
            value_name,
            iterable,
            body,
        } => {
            let payload = ForEachPayload {
                key_name: key_name.clone(),
                value_name: value_name.clone(),
                iterable: solidify_block(std::slice::from_ref(iterable.as_ref()))?,
                body: solidify_block(body)?,
            };
            queue.append(
                AppendArgs::simple(exec_fns::for_each_statement, Uparam::zeroed())
                    .with_sparam(Box::new(payload), 8),
            )?;
        }
        AirNode::TryCatch {
            try_body,
            catch_name,
            catch_body,
        } => {
            let payload = TryCatchPayload {
                try_body: solidify_block(try_body)?,
                catch_name: catch_name.clone(),
                catch_body: solidify_block(catch_body)?,
            };
            queue.append(
                AppendArgs::simple(exec_fns::try_catch_statement, Uparam::zeroed())
                    .with_sparam(Box::new(payload), 8),
            )?;
        }

        AirNode::BranchExpression {
            condition,
            if_true,
            if_false,
        } => {
            let payload = BranchPayload {
                condition: solidify_block(std::slice::from_ref(condition.as_ref()))?,
                if_true: solidify_block(std::slice::from_ref(if_true.as_ref()))?,
                if_false: solidify_block(std::slice::from_ref(if_false.as_ref()))?,
            };
            queue.append(
                AppendArgs::simple(exec_fns::branch_expression, Uparam::zeroed())
                    .with_sparam(Box::new(payload), 8),
            )?;
        }
        AirNode::CoalesceExpression { lhs, rhs } => {
            let payload = (
                solidify_block(std::slice::from_ref(lhs.as_ref()))?,
                solidify_block(std::slice::from_ref(rhs.as_ref()))?,
            );
            queue.append(
                AppendArgs::simple(exec_fns::coalesce_expression, Uparam::zeroed())
                    .with_sparam(Box::new(payload), 8),
            )?;
        }
        AirNode::CatchExpression(body) => {
            let inner = solidify_block(std::slice::from_ref(body.as_ref()))?;
            queue.append(
                AppendArgs::simple(exec_fns::catch_expression, Uparam::zeroed())
                    .with_sparam(Box::new(inner), 8),
            )?;
        }
        AirNode::CheckArgument(index) => {
            queue.append(AppendArgs::simple(
                exec_fns::check_argument,
                Uparam::from_u32_at_offset4(*index),
            ))?;
        }
        AirNode::CheckNull => {
            queue.append(AppendArgs::simple(exec_fns::check_null, Uparam::zeroed()))?;
        }
        AirNode::ApplyOperator { xop, assign } => {
            queue.append(AppendArgs::simple(
                exec_fns::apply_operator,
                Uparam::from_u8s([xop.as_u8(), u8::from(*assign), 0, 0, 0, 0]),
            ))?;
        }
        AirNode::ApplyOperatorBi32 {
            xop,
            assign,
            int_rhs,
        } => {
            let mut uparam = Uparam::from_i32_at_offset4(*int_rhs);
            let mut bytes = uparam.as_u8s();
            bytes[0] = xop.as_u8();
            bytes[1] = u8::from(*assign);
            uparam = Uparam::from_u8s(bytes);
            queue.append(AppendArgs::simple(exec_fns::apply_operator_bi32, uparam))?;
        }
        AirNode::MemberAccess(name) => {
            queue.append(
                AppendArgs::simple(exec_fns::member_access, Uparam::zeroed())
                    .with_sparam(Box::new(name.clone()), name.len()),
            )?;
        }

        AirNode::FunctionCall {
            sloc,
            nargs,
            ptc_aware,
        } => {
            queue.append(
                AppendArgs::simple(exec_fns::function_call, Uparam::zeroed())
                    .with_sparam(
                        Box::new(CallPayload {
                            nargs: *nargs,
                            ptc_aware: *ptc_aware,
                            sloc: sloc.clone(),
                        }),
                        8,
                    )
                    .with_sloc(sloc.clone()),
            )?;
        }
        AirNode::AltFunctionCall { sloc, nargs } => {
            queue.append(
                AppendArgs::simple(exec_fns::alt_function_call, Uparam::zeroed())
                    .with_sparam(
                        Box::new(CallPayload {
                            nargs: *nargs,
                            ptc_aware: crate::status::PtcAware::None,
                            sloc: sloc.clone(),
                        }),
                        8,
                    )
                    .with_sloc(sloc.clone()),
            )?;
        }
        AirNode::VariadicCall(sloc) => {
            queue.append(
                AppendArgs::simple(exec_fns::variadic_call, Uparam::zeroed())
                    .with_sparam(Box::new(sloc.clone()), 8)
                    .with_sloc(sloc.clone()),
            )?;
        }
        AirNode::ImportCall { sloc, path } => {
            queue.append(
                AppendArgs::simple(exec_fns::import_call, Uparam::zeroed())
                    .with_sparam(
                        Box::new(ImportPayload {
                            path: path.clone(),
                            sloc: sloc.clone(),
                        }),
                        8,
                    )
                    .with_sloc(sloc.clone()),
            )?;
        }
        AirNode::PushUnnamedArray(count) => {
            queue.append(AppendArgs::simple(
                exec_fns::push_unnamed_array,
                Uparam::from_u32_at_offset4(*count),
            ))?;
        }
        AirNode::PushUnnamedObject(names) => {
            queue.append(
                AppendArgs::simple(exec_fns::push_unnamed_object, Uparam::zeroed())
                    .with_sparam(Box::new(names.clone() as NameList), 8),
            )?;
        }
        AirNode::UnpackArray(count) => {
            queue.append(AppendArgs::simple(
                exec_fns::unpack_array,
                Uparam::from_u32_at_offset4(*count),
            ))?;
        }
        AirNode::UnpackObject(names) => {
            queue.append(
                AppendArgs::simple(exec_fns::unpack_object, Uparam::zeroed())
                    .with_sparam(Box::new(names.clone() as NameList), 8),
            )?;
        }
        AirNode::DefineFunction {
            opts: FunctionOpts { is_variadic },
            sloc,
            name,
            params,
            body,
        } => {
            let payload = DefineFunctionPayload {
                name: name.clone(),
                params: params.clone(),
                is_variadic: *is_variadic,
                body: Rc::new(solidify_block(body)?),
                sloc: sloc.clone(),
            };
            queue.append(
                AppendArgs::simple(exec_fns::define_function, Uparam::zeroed())
                    .with_sparam(Box::new(payload), 8)
                    .with_sloc(sloc.clone())
                    .with_variable_getter(Box::new(|node, staged, temp| {
                        if let Some(payload) = node.sparam_downcast::<DefineFunctionPayload>() {
                            crate::collect::collect_variables(&payload.body, staged, temp);
                        }
                    })),
            )?;
        }
        AirNode::DeferExpression { sloc, body } => {
            let inner = solidify_block(body)?;
            queue.append(
                AppendArgs::simple(exec_fns::defer_expression, Uparam::zeroed())
                    .with_sparam(Box::new(inner), 8)
                    .with_sloc(sloc.clone()),
            )?;
        }

        AirNode::ThrowStatement(sloc) => {
            queue.append(
                AppendArgs::simple(exec_fns::throw_statement, Uparam::zeroed())
                    .with_sparam(Box::new(sloc.clone()), 8)
                    .with_sloc(sloc.clone()),
            )?;
        }
        AirNode::AssertStatement { sloc, msg } => {
            queue.append(
                AppendArgs::simple(exec_fns::assert_statement, Uparam::zeroed())
                    .with_sparam(Box::new(msg.clone()), msg.len())
                    .with_sloc(sloc.clone()),
            )?;
        }
        AirNode::PushConstant(value) => {
            queue.append(
                AppendArgs::simple(exec_fns::push_constant, Uparam::zeroed())
                    .with_sparam(Box::new(value.clone()), 8)
                    .with_variable_getter(Box::new(|node, staged, _temp| {
                        if let Some(value) = node.sparam_downcast::<crate::value::Value>() {
                            crate::collect::report_value(value, staged);
                        }
                    })),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod solidify_test {
    use super::*;
    use crate::config::ExecutorConfig;
    use crate::context::ExecutiveContext;
    use crate::sloc::SourceLocation;
    use crate::value::Value;

    #[test]
    fn push_constant_then_return_solidifies_and_executes() {
        let body = vec![
            AirNode::PushConstant(Value::Integer(5)),
            AirNode::ReturnStatement {
                sloc: SourceLocation::new("t", 1, 1),
                by_ref: false,
                is_void: false,
            },
        ];
        let queue = solidify_block(&body).unwrap();
        let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
        let status = queue.execute(&mut ctx).unwrap();
        assert!(matches!(status, crate::status::AirStatus::ReturnVal));
        assert!(matches!(
            ctx.top().map(crate::reference::Reference::read),
            Some(Value::Integer(5))
        ));
    }

    #[test]
    fn throw_is_caught_and_annotated() {
        let body = vec![
            AirNode::PushConstant(Value::Str(Rc::from("boom"))),
            AirNode::ThrowStatement(SourceLocation::new("t", 3, 4)),
        ];
        let queue = solidify_block(&body).unwrap();
        let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
        let err = queue.execute(&mut ctx).unwrap_err();
        assert_eq!(err.frames.len(), 2); // pushed by throw_statement + annotate()
    }

    #[test]
    fn if_else_picks_the_right_branch() {
        let body = vec![AirNode::If(vec![
            IfBranch {
                condition: Some(Box::new(AirNode::PushConstant(Value::Boolean(false)))),
                body: vec![AirNode::PushConstant(Value::Integer(1))],
            },
            IfBranch {
                condition: None,
                body: vec![AirNode::PushConstant(Value::Integer(2))],
            },
        ])];
        let queue = solidify_block(&body).unwrap();
        let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
        queue.execute(&mut ctx).unwrap();
        assert!(matches!(
            ctx.top().map(crate::reference::Reference::read),
            Some(Value::Integer(2))
        ));
    }
}
