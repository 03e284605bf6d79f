// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Abstract hooks (component C7): an observer invoked at defined execution
//! points, with every method defaulted to a no-op. Only `on_trap` may fail;
//! the rest are infallible observers (§5).

use crate::error::RuntimeError;
use crate::sloc::SourceLocation;
use crate::value::Value;

/// Capability trait implemented by embedders who want visibility into
/// execution. The context holds at most one `Arc<dyn Hooks>` (§5: "shared
/// by reference").
pub trait Hooks: Send + Sync {
    /// Invoked by `single_step_trap` nodes when verbose single-step traps
    /// are enabled. May throw (e.g. to honor a cancellation signal); this
    /// is the only hook permitted to fail.
    fn on_trap(&self, _sloc: &SourceLocation) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// Invoked before a function call, including the first visit to each
    /// hop of a PTC chain.
    fn on_call(&self, _sloc: &SourceLocation, _target: &Value) {}

    /// Invoked before returning. For PTC, `sloc` is the call site of the
    /// tail call, not the return statement (§4.5).
    fn on_return(&self, _sloc: &SourceLocation, _ptc: bool) {}

    /// Invoked after an exception value has been materialized, before it
    /// is thrown.
    fn on_throw(&self, _sloc: &SourceLocation, _value: &Value) {}

    /// Invoked before the initializer of a variable/reference is evaluated.
    fn on_declare(&self, _sloc: &SourceLocation, _name: &str) {}

    /// Invoked around native execution of a user-defined function body;
    /// instrumentation only.
    fn on_function_enter(&self, _name: &str) {}
    fn on_function_leave(&self, _name: &str) {}
}

/// The default, inert implementation: a context constructed without an
/// explicit hooks handle uses this.
pub struct NullHooks;

impl Hooks for NullHooks {}

#[cfg(test)]
mod hooks_test {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingHooks {
        calls: RefCell<Vec<String>>,
    }

    impl Hooks for RecordingHooks {
        fn on_call(&self, _sloc: &SourceLocation, _target: &Value) {
            self.calls.borrow_mut().push("call".into());
        }
        fn on_return(&self, _sloc: &SourceLocation, _ptc: bool) {
            self.calls.borrow_mut().push("return".into());
        }
    }

    #[test]
    fn null_hooks_are_infallible_noops() {
        let hooks = NullHooks;
        assert!(hooks.on_trap(&SourceLocation::unknown()).is_ok());
        hooks.on_call(&SourceLocation::unknown(), &Value::Null);
    }

    #[test]
    fn recording_hooks_capture_order() {
        let hooks = RecordingHooks::default();
        hooks.on_call(&SourceLocation::unknown(), &Value::Null);
        hooks.on_return(&SourceLocation::unknown(), false);
        assert_eq!(*hooks.calls.borrow(), vec!["call", "return"]);
    }
}
