// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use crate::config::ExecutorConfig;
use crate::value::Value;

fn next_executor(_ctx: &mut ExecutiveContext, _node: &Node) -> Result<AirStatus, NodeError> {
    Ok(AirStatus::Next)
}

fn return_void_executor(_ctx: &mut ExecutiveContext, _node: &Node) -> Result<AirStatus, NodeError> {
    Ok(AirStatus::ReturnVoid)
}

fn push_const_executor(ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
    let value = node
        .sparam_downcast::<Value>()
        .cloned()
        .unwrap_or(Value::Null);
    ctx.push(crate::reference::Reference::Temporary(value));
    Ok(AirStatus::Next)
}

fn return_val_executor(_ctx: &mut ExecutiveContext, _node: &Node) -> Result<AirStatus, NodeError> {
    Ok(AirStatus::ReturnVal)
}

fn failing_executor(_ctx: &mut ExecutiveContext, _node: &Node) -> Result<AirStatus, NodeError> {
    Err(NodeError::Native("boom".into()))
}

#[test]
fn empty_queue_returns_next() {
    let queue = AvmcQueue::new();
    let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
    assert!(queue.execute(&mut ctx).unwrap().is_next());
}

#[test]
fn simple_status_return_void() {
    let mut queue = AvmcQueue::new();
    queue
        .append(AppendArgs::simple(return_void_executor, Uparam::zeroed()))
        .unwrap();
    let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
    assert!(queue.execute(&mut ctx).unwrap().is_return());
}

#[test]
fn push_constant_then_return_val() {
    let mut queue = AvmcQueue::new();
    queue
        .append(
            AppendArgs::simple(push_const_executor, Uparam::zeroed())
                .with_sparam(Box::new(Value::Integer(42)), 8),
        )
        .unwrap();
    queue
        .append(AppendArgs::simple(return_val_executor, Uparam::zeroed()))
        .unwrap();

    let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
    let status = queue.execute(&mut ctx).unwrap();
    assert!(matches!(status, AirStatus::ReturnVal));
    assert!(matches!(ctx.top(), Some(crate::reference::Reference::Temporary(Value::Integer(42)))));
}

#[test]
fn nodes_execute_in_insertion_order() {
    use std::cell::RefCell;
    use std::rc::Rc;

    thread_local! {
        static LOG: RefCell<Vec<u8>> = RefCell::new(Vec::new());
    }

    fn logging_executor(_ctx: &mut ExecutiveContext, node: &Node) -> Result<AirStatus, NodeError> {
        let tag = node.uparam().as_u8s()[0];
        LOG.with(|log| log.borrow_mut().push(tag));
        Ok(AirStatus::Next)
    }

    let mut queue = AvmcQueue::new();
    for i in 0..5u8 {
        queue
            .append(AppendArgs::simple(
                logging_executor,
                Uparam::from_u8s([i, 0, 0, 0, 0, 0]),
            ))
            .unwrap();
    }
    let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
    queue.execute(&mut ctx).unwrap();
    LOG.with(|log| assert_eq!(*log.borrow(), vec![0, 1, 2, 3, 4]));
    let _ = Rc::new(()); // keep Rc import meaningful if log grows to use it later
}

#[test]
fn queue_length_invariant_holds() {
    let mut queue = AvmcQueue::new();
    for _ in 0..10 {
        queue
            .append(AppendArgs::simple(next_executor, Uparam::zeroed()))
            .unwrap();
    }
    assert_eq!(queue.len(), 10);
}

#[test]
fn oversized_sparam_is_rejected() {
    let mut queue = AvmcQueue::new();
    let err = queue
        .append(
            AppendArgs::simple(next_executor, Uparam::zeroed())
                .with_sparam(Box::new(()), MAX_SPARAM_BYTES + 1),
        )
        .unwrap_err();
    assert_eq!(err, QueueError::SparamTooLarge(MAX_SPARAM_BYTES + 1));
}

#[test]
fn finalize_blocks_further_appends() {
    let mut queue = AvmcQueue::new();
    queue.finalize();
    let err = queue
        .append(AppendArgs::simple(next_executor, Uparam::zeroed()))
        .unwrap_err();
    assert_eq!(err, QueueError::Finalized);
}

#[test]
fn native_error_is_wrapped_and_annotated_with_sloc() {
    let mut queue = AvmcQueue::new();
    queue
        .append(
            AppendArgs::simple(failing_executor, Uparam::zeroed())
                .with_sloc(SourceLocation::new("a.asteria", 4, 2)),
        )
        .unwrap();
    let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
    let err = queue.execute(&mut ctx).unwrap_err();
    assert_eq!(err.message, "boom");
    assert_eq!(err.frames.len(), 1);
    assert_eq!(err.frames[0].sloc.to_string(), "a.asteria:4:2");
}

#[test]
fn native_error_without_sloc_is_not_annotated() {
    let mut queue = AvmcQueue::new();
    queue
        .append(AppendArgs::simple(failing_executor, Uparam::zeroed()))
        .unwrap();
    let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
    let err = queue.execute(&mut ctx).unwrap_err();
    assert!(err.frames.is_empty());
}

#[test]
fn used_slots_equals_sum_of_one_plus_nheaders() {
    let mut queue = AvmcQueue::new();
    queue
        .append(AppendArgs::simple(next_executor, Uparam::zeroed()))
        .unwrap();
    queue
        .append(
            AppendArgs::simple(next_executor, Uparam::zeroed())
                .with_sparam(Box::new([0u8; 64]), 64),
        )
        .unwrap();
    queue
        .append(AppendArgs::simple(next_executor, Uparam::zeroed()).with_sloc(SourceLocation::new("a.asteria", 1, 1)))
        .unwrap();

    let expected: usize = queue
        .nodes
        .iter()
        .map(|n| 1 + n.header().nheaders as usize)
        .sum();
    assert_eq!(queue.used(), expected);
}

#[test]
fn meta_ver_none_iff_no_metadata() {
    let mut queue = AvmcQueue::new();
    queue
        .append(AppendArgs::simple(next_executor, Uparam::zeroed()))
        .unwrap();
    queue
        .append(AppendArgs::simple(next_executor, Uparam::zeroed()).with_sloc(SourceLocation::new("a.asteria", 1, 1)))
        .unwrap();

    for node in &queue.nodes {
        assert_eq!(
            node.header().meta_ver == MetaVersion::None,
            node.metadata().is_none()
        );
    }
}

#[test]
fn clearing_drops_nodes_and_runs_destructors_once() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let counter = Arc::new(AtomicUsize::new(0));
    let c = counter.clone();

    let mut queue = AvmcQueue::new();
    queue
        .append(
            AppendArgs::simple(next_executor, Uparam::zeroed())
                .with_destructor(Box::new(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })),
        )
        .unwrap();

    queue.clear();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
