// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Reference stack element.
//!
//! §4.3: "A reference stack (LIFO of references, each being either a
//! variable reference, a materialized value, a property accessor, etc.)".

use std::cell::RefCell;
use std::rc::Rc;

use crate::value::Value;

/// A storage slot a variable name binds to.
///
/// Shared via `Rc<RefCell<_>>` so that closures, `push_bound_reference`,
/// and the scope chain can all alias the same slot.
pub type VarSlot = Rc<RefCell<Value>>;

/// One entry on the executive context's reference stack.
#[derive(Clone)]
pub enum Reference {
    /// A plain materialized value (not addressable).
    Temporary(Value),
    /// A reference to a named variable's storage slot.
    Variable(VarSlot),
    /// A reference into an array element, addressed by index.
    ArrayElement { array: Value, index: usize },
    /// A reference into an object property, addressed by key.
    ObjectProperty { object: Value, key: Rc<str> },
    /// An unset reference (declared but not yet initialized).
    Uninitialized,
}

impl Reference {
    /// Read the current value, materializing accessor references.
    pub fn read(&self) -> Value {
        match self {
            Self::Temporary(v) => v.clone(),
            Self::Variable(slot) => slot.borrow().clone(),
            Self::ArrayElement { array, index } => {
                let Value::Array(arr) = array else {
                    return Value::Null;
                };
                arr.borrow().get(*index).cloned().unwrap_or(Value::Null)
            }
            Self::ObjectProperty { object, key } => {
                let Value::Object(obj) = object else {
                    return Value::Null;
                };
                obj.borrow().get(key.as_ref()).cloned().unwrap_or(Value::Null)
            }
            Self::Uninitialized => Value::Null,
        }
    }

    /// Write a new value into this reference's storage, where addressable.
    ///
    /// Writing into a `Temporary` or `Uninitialized` reference replaces the
    /// reference itself with a new temporary (this mirrors the original's
    /// "materialize on assign" behavior for non-lvalue references).
    pub fn write(&mut self, value: Value) {
        match self {
            Self::Variable(slot) => *slot.borrow_mut() = value,
            Self::ArrayElement { array, index } => {
                if let Value::Array(arr) = array {
                    let mut arr = arr.borrow_mut();
                    if *index >= arr.len() {
                        arr.resize(*index + 1, Value::Null);
                    }
                    arr[*index] = value;
                }
            }
            Self::ObjectProperty { object, key } => {
                if let Value::Object(obj) = object {
                    obj.borrow_mut().insert(key.clone(), value);
                }
            }
            Self::Temporary(_) | Self::Uninitialized => *self = Self::Temporary(value),
        }
    }

    #[must_use]
    pub const fn is_uninitialized(&self) -> bool {
        matches!(self, Self::Uninitialized)
    }
}

impl From<Value> for Reference {
    fn from(value: Value) -> Self {
        Self::Temporary(value)
    }
}
