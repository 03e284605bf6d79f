// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Compiled-function value: the callable shape that `function_call`/
//! `define_function` nodes produce and consume.

use std::rc::Rc;

use crate::queue::AvmcQueue;
use crate::reference::Reference;
use crate::sloc::SourceLocation;

/// A compiled Asteria function: parameter names, its body queue, and any
/// references it closed over at definition time.
pub struct Function {
    name: Rc<str>,
    params: Vec<Rc<str>>,
    is_variadic: bool,
    body: Rc<AvmcQueue>,
    bound: Rc<[Reference]>,
    sloc: SourceLocation,
}

impl Function {
    #[must_use]
    pub fn new(
        name: impl Into<Rc<str>>,
        params: Vec<Rc<str>>,
        is_variadic: bool,
        body: Rc<AvmcQueue>,
        bound: Rc<[Reference]>,
        sloc: SourceLocation,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            is_variadic,
            body,
            bound,
            sloc,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[Rc<str>] {
        &self.params
    }

    #[must_use]
    pub const fn is_variadic(&self) -> bool {
        self.is_variadic
    }

    #[must_use]
    pub fn body(&self) -> &Rc<AvmcQueue> {
        &self.body
    }

    #[must_use]
    pub fn bound(&self) -> &Rc<[Reference]> {
        &self.bound
    }

    #[must_use]
    pub const fn sloc(&self) -> &SourceLocation {
        &self.sloc
    }
}
