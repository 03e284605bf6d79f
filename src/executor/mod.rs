// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The executor (component C6): the function-pointer alphabet every queue
//! node dispatches through, the error type those functions return, and the
//! proper-tail-call trampoline that drives one function activation to
//! completion.

pub mod exec_fns;
pub mod trampoline;

use thiserror::Error;

use crate::context::ExecutiveContext;
use crate::error::RuntimeError;
use crate::queue::Node;
use crate::status::AirStatus;

/// The function pointer stored inline on a node (or inside its
/// [`crate::header::Metadata`]). One exists per distinct AIR op; see
/// `exec_fns` for the concrete implementations and `air::solidify` for how
/// an [`crate::air::AirNode`] picks one.
pub type Executor = fn(&mut ExecutiveContext, &Node) -> Result<AirStatus, NodeError>;

/// What a node executor can fail with, before the queue wraps it into a
/// full [`RuntimeError`] with a backtrace frame (`queue::annotate`).
#[derive(Debug, Error)]
pub enum NodeError {
    /// Already a fully-formed script exception (e.g. a nested queue's
    /// `execute` propagated one, or `throw_statement` raised one).
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// A host-side failure with no script value attached yet (hook
    /// rejection, recursion sentry trip, malformed node payload).
    #[error("{0}")]
    Native(String),
}

#[cfg(test)]
mod executor_test {
    use super::*;
    use crate::config::ExecutorConfig;
    use crate::param::Uparam;
    use crate::queue::{AppendArgs, AvmcQueue};
    use crate::value::Value;

    fn push_one(_ctx: &mut ExecutiveContext, _node: &Node) -> Result<AirStatus, NodeError> {
        Ok(AirStatus::Next)
    }

    #[test]
    fn native_error_converts_to_node_error_message() {
        let err: NodeError = NodeError::Native("bad".into());
        assert_eq!(err.to_string(), "bad");
    }

    #[test]
    fn runtime_error_round_trips_through_node_error() {
        let rt = RuntimeError::new("boom", Value::Null);
        let err: NodeError = rt.clone().into();
        match err {
            NodeError::Runtime(e) => assert_eq!(e.message, rt.message),
            NodeError::Native(_) => panic!("expected Runtime variant"),
        }
    }

    #[test]
    fn executor_fn_pointer_is_usable_standalone() {
        let mut queue = AvmcQueue::new();
        queue
            .append(AppendArgs::simple(push_one, Uparam::zeroed()))
            .unwrap();
        let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
        assert!(queue.execute(&mut ctx).unwrap().is_next());
    }
}
