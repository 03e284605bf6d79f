// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! AIR status: the executor's return alphabet (§6, §4.3).

use crate::reference::Reference;
use crate::sloc::SourceLocation;
use crate::value::Value;

/// Proper-tail-call mode a call-emitting node may carry (§4.2, §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PtcAware {
    /// Not a tail call; invoke normally.
    None,
    /// Tail call whose result is returned by reference.
    ByRef,
    /// Tail call whose result is returned by value.
    ByVal,
    /// Tail call in void-return position (result discarded).
    Void,
}

impl PtcAware {
    #[must_use]
    pub const fn is_tail(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A pending deferred tail call, produced by a node marked `ptc_aware !=
/// none` instead of invoking its target directly.
///
/// Consumed exactly once, at the enclosing activation's executor loop,
/// which frees its own frame and re-enters against `target`'s queue — see
/// `executor::trampoline`.
#[derive(Clone)]
pub struct DeferredCall {
    pub target: Value,
    pub args: Vec<Reference>,
    pub mode: PtcAware,
    pub call_sloc: SourceLocation,
}

/// What a node executor returns after running.
pub enum AirStatus {
    /// Fall through to the next node.
    Next,
    /// Terminate the function; disposition is implied by the variant.
    ReturnVoid,
    ReturnRef,
    ReturnVal,
    /// Structured jumps, resolved by the nearest enclosing matching block.
    BreakUnspec,
    BreakSwitch,
    BreakWhile,
    BreakFor,
    ContinueUnspec,
    ContinueWhile,
    ContinueFor,
    /// A proper tail call awaiting trampoline consumption.
    Ptc(Box<DeferredCall>),
}

impl AirStatus {
    #[must_use]
    pub const fn is_next(&self) -> bool {
        matches!(self, Self::Next)
    }

    #[must_use]
    pub const fn is_break(&self) -> bool {
        matches!(
            self,
            Self::BreakUnspec | Self::BreakSwitch | Self::BreakWhile | Self::BreakFor
        )
    }

    #[must_use]
    pub const fn is_continue(&self) -> bool {
        matches!(
            self,
            Self::ContinueUnspec | Self::ContinueWhile | Self::ContinueFor
        )
    }

    #[must_use]
    pub const fn is_return(&self) -> bool {
        matches!(self, Self::ReturnVoid | Self::ReturnRef | Self::ReturnVal)
    }
}

#[cfg(test)]
mod status_test {
    use super::*;

    #[test]
    fn ptc_aware_tail_detection() {
        assert!(!PtcAware::None.is_tail());
        assert!(PtcAware::ByVal.is_tail());
        assert!(PtcAware::ByRef.is_tail());
        assert!(PtcAware::Void.is_tail());
    }

    #[test]
    fn status_classification() {
        assert!(AirStatus::Next.is_next());
        assert!(AirStatus::BreakFor.is_break());
        assert!(AirStatus::ContinueWhile.is_continue());
        assert!(AirStatus::ReturnVal.is_return());
    }
}
