// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! §8: "Rebind idempotence: for any IR subtree T and any context C,
//! `rebind(rebind(T, C), C)` produces an equal subtree to `rebind(T, C)`."
//!
//! `AirNode` has no `PartialEq`, so equality is checked through its `Debug`
//! rendering, matching the pattern already used by the concrete-case test
//! in `air::rebind::rebind_test`.

use std::rc::Rc;

use asteria_air::air::rebind::{rebind_block, RebindCtx};
use asteria_air::air::AirNode;
use asteria_air::value::Value;
use proptest::prelude::*;

const NAMES: [&str; 3] = ["x", "y", "z"];

/// Deterministically turn a byte stream into a small `AirNode` tree using
/// only node kinds `rebind` inspects: local/bound references, constants,
/// and nested blocks.
fn build_tree(ops: &[u8], depth: usize) -> Vec<AirNode> {
    let mut nodes = Vec::new();
    let mut i = 0;
    while i < ops.len() && nodes.len() < 6 {
        let op = ops[i];
        i += 1;
        match op % 4 {
            0 => nodes.push(AirNode::PushLocalReference {
                depth: 1,
                name: Rc::from(NAMES[op as usize % NAMES.len()]),
            }),
            1 => nodes.push(AirNode::PushBoundReference(op as usize % NAMES.len())),
            2 if depth > 0 && i < ops.len() => {
                let take = (ops[i] as usize % ops.len().max(1)).min(ops.len() - i);
                let inner = build_tree(&ops[i..i + take], depth - 1);
                i += take;
                nodes.push(AirNode::ExecuteBlock(inner));
            }
            _ => nodes.push(AirNode::PushConstant(Value::Integer(i64::from(op)))),
        }
    }
    nodes
}

proptest! {
    #[test]
    fn rebind_is_idempotent_on_generated_trees(
        ops in proptest::collection::vec(any::<u8>(), 0..16),
        bound_count in 0usize..=3,
    ) {
        let bound_names: Vec<Rc<str>> = NAMES[..bound_count].iter().map(|n| Rc::from(*n)).collect();
        let ctx = RebindCtx::new(bound_names);

        let mut body = build_tree(&ops, 3);
        rebind_block(&mut body, &ctx);
        let once = format!("{body:?}");

        rebind_block(&mut body, &ctx);
        let twice = format!("{body:?}");

        prop_assert_eq!(once, twice);
    }
}
