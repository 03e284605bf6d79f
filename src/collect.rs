// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Variable-collection walk (component C9): drives
//! [`crate::queue::AvmcQueue::collect_variables`] over a compiled function
//! body, staging live references for a cycle-collecting GC to trace.
//!
//! §1 scopes the GC itself out of this crate; what lives here is the
//! walk's shape — reporting into a `staged`/`temp` pair of maps, recursing
//! into nested queues the way `push_constant`/`define_function`/structured
//! statements were solidified with variable getters for.

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// Live-reference map keyed by heap identity (the address behind a
/// value's `Rc`), the way the original keys its registry by raw pointer.
/// `staged` accumulates references found during one walk; `temp` is
/// scratch the collector reuses between walks without reallocating.
pub type RefMap = HashMap<usize, Value>;

fn identity_of(value: &Value) -> Option<usize> {
    match value {
        Value::Array(a) => Some(Rc::as_ptr(a) as usize),
        Value::Object(o) => Some(Rc::as_ptr(o) as usize),
        Value::Function(f) => Some(Rc::as_ptr(f) as usize),
        Value::Opaque(o) => Some(Rc::as_ptr(o) as *const () as usize),
        Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Real(_) | Value::Str(_) => {
            None
        }
    }
}

/// Report `value` into `staged` if it carries its own heap identity, then
/// recurse one level into arrays/objects (their elements may themselves
/// be reference-counted).
pub fn report_value(value: &Value, staged: &mut RefMap) {
    let Some(id) = identity_of(value) else {
        return;
    };
    if staged.contains_key(&id) {
        return;
    }
    staged.insert(id, value.clone());
    match value {
        Value::Array(arr) => {
            for element in arr.borrow().iter() {
                report_value(element, staged);
            }
        }
        Value::Object(obj) => {
            for v in obj.borrow().values() {
                report_value(v, staged);
            }
        }
        Value::Function(func) => {
            for bound in func.bound().iter() {
                report_value(&bound.read(), staged);
            }
        }
        Value::Opaque(_) | Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Real(_)
        | Value::Str(_) => {}
    }
}

/// Run the collection walk over a compiled function body, returning the
/// set of live references it found. `temp` is exposed for callers that
/// repeat this walk across many queues and want to reuse the allocation.
pub fn collect_variables(queue: &crate::queue::AvmcQueue, staged: &mut RefMap, temp: &mut RefMap) {
    queue.collect_variables(staged, temp);
}

#[cfg(test)]
mod collect_test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn scalars_report_nothing() {
        let mut staged = RefMap::new();
        report_value(&Value::Integer(1), &mut staged);
        report_value(&Value::Null, &mut staged);
        assert!(staged.is_empty());
    }

    #[test]
    fn array_reports_itself_and_nested_elements() {
        let inner = Value::Array(Rc::new(RefCell::new(vec![Value::Integer(1)])));
        let outer = Value::Array(Rc::new(RefCell::new(vec![inner.clone()])));
        let mut staged = RefMap::new();
        report_value(&outer, &mut staged);
        assert_eq!(staged.len(), 2);
    }

    #[test]
    fn revisiting_the_same_identity_is_a_no_op() {
        let shared = Value::Array(Rc::new(RefCell::new(vec![])));
        let mut staged = RefMap::new();
        report_value(&shared, &mut staged);
        let before = staged.len();
        report_value(&shared, &mut staged);
        assert_eq!(staged.len(), before);
    }
}
