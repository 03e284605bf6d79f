// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Rebind pass: rewrite `push_local_reference` into `push_bound_reference`
//! wherever a name resolves to a reference a closure has already captured,
//! so the solidified form never re-walks the scope chain for captured
//! names at call time.
//!
//! Idempotent by construction: once a node has become
//! `push_bound_reference`, nothing in [`rebind`] matches it again, so
//! running the pass twice over the same tree is a no-op the second time.

use std::rc::Rc;

use super::{AirNode, IfBranch, SwitchArm, SwitchClause};

/// Names captured by the enclosing closure, in bound-index order.
#[derive(Default, Clone)]
pub struct RebindCtx {
    bound_names: Rc<[Rc<str>]>,
}

impl RebindCtx {
    #[must_use]
    pub fn new(bound_names: Vec<Rc<str>>) -> Self {
        Self {
            bound_names: bound_names.into(),
        }
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.bound_names.iter().position(|n| n.as_ref() == name)
    }
}

/// Rewrite every `push_local_reference` in `body` whose name is in
/// `ctx`'s bound set into a `push_bound_reference`, recursing into every
/// nested block. `define_function` bodies are rebound against *their own*
/// closure's bound set, which the caller is expected to have already
/// computed (this pass does not infer capture sets — that analysis
/// belongs to lowering, upstream of this crate).
pub fn rebind_block(body: &mut [AirNode], ctx: &RebindCtx) {
    for node in body {
        rebind_node(node, ctx);
    }
}

fn rebind_node(node: &mut AirNode, ctx: &RebindCtx) {
    if let AirNode::PushLocalReference { name, .. } = node {
        if let Some(index) = ctx.index_of(name) {
            *node = AirNode::PushBoundReference(index);
            return;
        }
    }

    match node {
        AirNode::ExecuteBlock(body) => rebind_block(body, ctx),
        AirNode::If(branches) => {
            for IfBranch { condition, body } in branches {
                if let Some(condition) = condition {
                    rebind_node(condition, ctx);
                }
                rebind_block(body, ctx);
            }
        }
        AirNode::Switch(arms) => {
            for SwitchArm { clause, body } in arms {
                match clause {
                    SwitchClause::CaseEqual(expr) => rebind_node(expr, ctx),
                    SwitchClause::CaseBetween { lower, upper, .. } => {
                        rebind_node(lower, ctx);
                        rebind_node(upper, ctx);
                    }
                    SwitchClause::Default => {}
                }
                rebind_block(body, ctx);
            }
        }
        AirNode::DoWhile { body, condition } | AirNode::While { condition, body } => {
            rebind_node(condition, ctx);
            rebind_block(body, ctx);
        }
        AirNode::For {
            init,
            condition,
            step,
            body,
        } => {
            rebind_block(init, ctx);
            if let Some(condition) = condition {
                rebind_node(condition, ctx);
            }
            rebind_block(step, ctx);
            rebind_block(body, ctx);
        }
        AirNode::ForEach { iterable, body, .. } => {
            rebind_node(iterable, ctx);
            rebind_block(body, ctx);
        }
        AirNode::TryCatch {
            try_body,
            catch_body,
            ..
        } => {
            rebind_block(try_body, ctx);
            rebind_block(catch_body, ctx);
        }
        AirNode::BranchExpression {
            condition,
            if_true,
            if_false,
        } => {
            rebind_node(condition, ctx);
            rebind_node(if_true, ctx);
            rebind_node(if_false, ctx);
        }
        AirNode::CoalesceExpression { lhs, rhs } => {
            rebind_node(lhs, ctx);
            rebind_node(rhs, ctx);
        }
        AirNode::CatchExpression(body) => rebind_node(body, ctx),
        AirNode::DeferExpression { body, .. } => rebind_block(body, ctx),
        // `define_function` introduces a new closure boundary; its body is
        // rebound separately by whoever solidifies it with that closure's
        // own bound set, not by this outer walk.
        _ => {}
    }
}

#[cfg(test)]
mod rebind_test {
    use super::*;

    #[test]
    fn local_reference_in_bound_set_becomes_bound_reference() {
        let ctx = RebindCtx::new(vec![Rc::from("x")]);
        let mut body = vec![AirNode::PushLocalReference {
            depth: 1,
            name: Rc::from("x"),
        }];
        rebind_block(&mut body, &ctx);
        assert!(matches!(body[0], AirNode::PushBoundReference(0)));
    }

    #[test]
    fn unrelated_name_is_left_alone() {
        let ctx = RebindCtx::new(vec![Rc::from("x")]);
        let mut body = vec![AirNode::PushLocalReference {
            depth: 1,
            name: Rc::from("y"),
        }];
        rebind_block(&mut body, &ctx);
        assert!(matches!(body[0], AirNode::PushLocalReference { .. }));
    }

    #[test]
    fn rebind_is_idempotent() {
        let ctx = RebindCtx::new(vec![Rc::from("x")]);
        let mut body = vec![AirNode::PushLocalReference {
            depth: 1,
            name: Rc::from("x"),
        }];
        rebind_block(&mut body, &ctx);
        let once = format!("{:?}", body[0]);
        rebind_block(&mut body, &ctx);
        let twice = format!("{:?}", body[0]);
        assert_eq!(once, twice);
    }

    #[test]
    fn recurses_into_nested_blocks() {
        let ctx = RebindCtx::new(vec![Rc::from("x")]);
        let mut body = vec![AirNode::ExecuteBlock(vec![AirNode::PushLocalReference {
            depth: 2,
            name: Rc::from("x"),
        }])];
        rebind_block(&mut body, &ctx);
        let AirNode::ExecuteBlock(inner) = &body[0] else {
            panic!("expected ExecuteBlock");
        };
        assert!(matches!(inner[0], AirNode::PushBoundReference(0)));
    }
}
