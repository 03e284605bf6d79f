// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared scaffolding for the end-to-end scenario tests in this directory.
//!
//! This crate owns no lexer/parser (§1), so a "script" here is an
//! [`asteria_air::AirNode`] tree assembled by hand rather than source text.

#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use asteria_air::error::RuntimeError;
use asteria_air::hooks::Hooks;
use asteria_air::sloc::SourceLocation;
use asteria_air::value::Value;

/// Records `on_call`/`on_return` events keyed by the call site's source
/// location — the only identity `Hooks::on_return` carries (§4.5), since it
/// gets the tail call's call site rather than the callee's name.
#[derive(Default)]
pub struct RecordingHooks {
    pub events: RefCell<Vec<String>>,
}

impl Hooks for RecordingHooks {
    fn on_call(&self, sloc: &SourceLocation, _target: &Value) {
        self.events.borrow_mut().push(format!("call@{sloc}"));
    }

    fn on_return(&self, sloc: &SourceLocation, _ptc: bool) {
        self.events.borrow_mut().push(format!("return@{sloc}"));
    }
}

/// A hook whose `on_trap` throws once `flag` is set, for the single-step
/// trap cancellation scenario.
pub struct TrapOnSignal {
    pub flag: Arc<AtomicBool>,
}

impl Hooks for TrapOnSignal {
    fn on_trap(&self, _sloc: &SourceLocation) -> Result<(), RuntimeError> {
        if self.flag.load(Ordering::Acquire) {
            Err(RuntimeError::new("cancelled by trap signal", Value::Null))
        } else {
            Ok(())
        }
    }
}
