// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! One record in an [`crate::queue::AvmcQueue`].
//!
//! The original stores `sparam` as a raw, `max_align_t`-aligned byte region
//! placement-constructed and placement-destructed via node-supplied
//! function pointers — a type-erased inline payload whose concrete shape
//! only the node's own executor knows. `Box<dyn Any + Send>` is the direct,
//! safe Rust expression of that same idea: type-erased, owned by the node,
//! freed automatically on drop (no hand-written destructor table needed).
//! `nheaders` is still tracked, purely so the queue-length invariant in
//! spec §8 ("sum over nodes of `(1 + nheaders)` equals `used`") continues
//! to hold for anyone auditing this port against the original's accounting.

use std::any::Any;

use crate::executor::Executor;
use crate::header::{Metadata, MetaVersion, NodeHeader};
use crate::param::Uparam;

/// Node-specific payload, type-erased. Concrete shapes used by the
/// executor functions in `executor::exec_fns` include nested
/// [`crate::queue::AvmcQueue`]s (block bodies, `if`/`while`/`switch` arms),
/// interned names (`Rc<str>`), and constant [`crate::value::Value`]s.
pub type Sparam = Box<dyn Any + Send>;

/// One queue record: bookkeeping header, packed parameter word, optional
/// type-erased side payload, and either an inline executor pointer or a
/// [`Metadata`] box, depending on `meta_ver`.
pub struct Node {
    header: NodeHeader,
    uparam: Uparam,
    sparam: Option<Sparam>,
    inline_executor: Option<Executor>,
    metadata: Option<Box<Metadata>>,
}

impl Node {
    pub(crate) fn new_inline(uparam: Uparam, sparam: Option<Sparam>, executor: Executor) -> Self {
        Self {
            header: NodeHeader {
                nheaders: NodeHeader::nheaders_for(sparam_size_hint(&sparam)),
                meta_ver: MetaVersion::None,
            },
            uparam,
            sparam,
            inline_executor: Some(executor),
            metadata: None,
        }
    }

    pub(crate) fn new_with_metadata(
        uparam: Uparam,
        sparam: Option<Sparam>,
        metadata: Metadata,
    ) -> Self {
        let meta_ver = metadata.meta_ver();
        Self {
            header: NodeHeader {
                nheaders: NodeHeader::nheaders_for(sparam_size_hint(&sparam)),
                meta_ver,
            },
            uparam,
            sparam,
            inline_executor: None,
            metadata: Some(Box::new(metadata)),
        }
    }

    #[must_use]
    pub const fn header(&self) -> &NodeHeader {
        &self.header
    }

    #[must_use]
    pub const fn uparam(&self) -> Uparam {
        self.uparam
    }

    #[must_use]
    pub fn sparam(&self) -> Option<&(dyn Any + Send)> {
        self.sparam.as_deref()
    }

    #[must_use]
    pub fn sparam_downcast<T: 'static>(&self) -> Option<&T> {
        self.sparam.as_ref()?.downcast_ref::<T>()
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_deref()
    }

    /// Resolve the executor to invoke: inline when `meta_ver == None`, via
    /// metadata otherwise. Panics only if the invariant in
    /// `AvmcQueue::append` was somehow violated (it never is via the public
    /// API).
    #[must_use]
    pub fn executor(&self) -> Executor {
        match (&self.inline_executor, &self.metadata) {
            (Some(e), None) => *e,
            (None, Some(m)) => m.executor,
            _ => unreachable!("node invariant: exactly one of inline executor / metadata"),
        }
    }

    #[must_use]
    pub fn sloc(&self) -> Option<&crate::sloc::SourceLocation> {
        self.metadata.as_ref().and_then(|m| m.sloc.as_ref())
    }
}

impl Drop for Node {
    /// Runs the node's destructor (if any) exactly once, then lets `Box`
    /// drop the metadata record and `sparam` — this is the entirety of the
    /// original's "walk nodes; run destructor; deallocate metadata; free
    /// buffer" queue-destruction sequence, expressed as ordinary Rust
    /// ownership instead of a manual teardown loop.
    fn drop(&mut self) {
        if let Some(metadata) = &mut self.metadata {
            if let Some(dtor) = &mut metadata.destructor {
                dtor();
            }
        }
    }
}

/// `nheaders` only has meaning for the queue-length invariant, not for real
/// memory layout; we derive a stand-in byte count from `size_of_val` so the
/// bookkeeping tracks roughly the same growth shape the original exhibits.
fn sparam_size_hint(sparam: &Option<Sparam>) -> usize {
    sparam.as_ref().map_or(0, |b| std::mem::size_of_val(&**b))
}
