// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Node header and side metadata (component C2, prefix half).
//!
//! Every record in an [`crate::queue::AvmcQueue`] begins with a fixed
//! header: how many extra slots its `sparam` consumes, and which metadata
//! version it carries. The original packs this into the first two bytes of
//! the node's `Uparam` word; we give it its own field instead (see
//! `param.rs`'s module doc for why) while keeping the same two-byte
//! vocabulary and the same invariants.

use crate::executor::Executor;
use crate::sloc::SourceLocation;

/// Size, in header-sized slots, that one `sparam` byte region consumes.
///
/// The original expresses `sparam`'s capacity as `nheaders * sizeof(header)`;
/// since our re-architected queue stores `sparam` as an owned byte buffer
/// rather than packed slots, `HEADER_SLOT_BYTES` exists purely so the
/// `nheaders` bookkeeping field (kept for invariant-compatibility with
/// §8's testable properties) computes the same way the original does.
pub const HEADER_SLOT_BYTES: usize = 8;

/// Maximum `sparam` size in bytes (`nheaders` is a `u8`, so at most 255
/// additional slots).
pub const MAX_SPARAM_BYTES: usize = 255 * HEADER_SLOT_BYTES - 1;

/// `meta_ver` byte values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MetaVersion {
    /// No metadata: the executor pointer is stored inline on the node.
    None = 0,
    /// Metadata present, no source location.
    Basic = 1,
    /// Metadata present, with source location.
    WithSloc = 2,
}

impl MetaVersion {
    /// Decode a raw byte, rejecting anything above `2` (spec §9, Open
    /// Question 3: reserved values are a hard invariant failure rather than
    /// being silently treated as `WithSloc`).
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::None),
            1 => Some(Self::Basic),
            2 => Some(Self::WithSloc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Fixed bookkeeping prefix of a node.
#[derive(Clone, Copy, Debug)]
pub struct NodeHeader {
    /// Number of additional header-sized slots consumed by this node's
    /// `sparam`, kept for parity with the spec's queue-length invariant
    /// (§8: "sum over nodes of `(1 + nheaders)` equals `used`").
    pub nheaders: u8,
    /// Metadata presence/shape.
    pub meta_ver: MetaVersion,
}

impl NodeHeader {
    /// Compute `nheaders` for a given `sparam` size, per §4.1's formula:
    /// `ceil((sparam_bytes + header_size) / header_size) - 1`.
    #[must_use]
    pub fn nheaders_for(sparam_bytes: usize) -> u8 {
        let slots = (sparam_bytes + HEADER_SLOT_BYTES).div_ceil(HEADER_SLOT_BYTES);
        debug_assert!(slots >= 1);
        (slots - 1) as u8
    }
}

/// Destructor hook run once, at queue clear/destroy time.
pub type Destructor = Box<dyn FnMut() + Send>;

/// Live-reference reporter invoked by [`crate::collect::collect_variables`].
pub type VariableGetter =
    Box<dyn Fn(&crate::queue::node::Node, &mut crate::collect::RefMap, &mut crate::collect::RefMap) + Send>;

/// Side record allocated when a node needs more than an inline executor
/// pointer: a destructor, a variable getter, and/or a source location.
///
/// Owned exclusively by its node; never shared, never mutated by the
/// executor (§5's shared-resource policy).
pub struct Metadata {
    pub executor: Executor,
    pub destructor: Option<Destructor>,
    pub variable_getter: Option<VariableGetter>,
    pub sloc: Option<SourceLocation>,
}

impl Metadata {
    #[must_use]
    pub fn meta_ver(&self) -> MetaVersion {
        if self.sloc.is_some() {
            MetaVersion::WithSloc
        } else {
            MetaVersion::Basic
        }
    }
}
