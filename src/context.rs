// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Executive context (§4.3): the per-activation mutable state an executor
//! reads and writes.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ExecutorConfig;
use crate::hooks::{Hooks, NullHooks};
use crate::loader::ModuleLoader;
use crate::reference::Reference;
use crate::scope::ScopeChain;
use crate::sentry::RecursionSentry;

/// Per-activation execution state, scoped to one function activation and
/// borrowed by node executors.
pub struct ExecutiveContext {
    stack: Vec<Reference>,
    scopes: ScopeChain,
    current_function: Option<Rc<str>>,
    /// References a closure captured at `define_function` time, addressed
    /// by `push_bound_reference`'s index (§4.2 category 2).
    bound: Rc<[Reference]>,
    hooks: Arc<dyn Hooks>,
    sentry: RecursionSentry,
    config: ExecutorConfig,
    /// Cooperative cancellation flag checked by `single_step_trap` nodes;
    /// shared across activations of the same top-level evaluation.
    trap_signal: Arc<AtomicBool>,
    /// Host-supplied module loader for `import_call` (C8). `None` unless
    /// the host wires one in via [`Self::with_loader`]; an import attempted
    /// without one fails rather than silently no-oping.
    loader: Option<ModuleLoader>,
}

impl ExecutiveContext {
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            stack: Vec::new(),
            scopes: ScopeChain::new(),
            current_function: None,
            bound: Rc::from([]),
            hooks: Arc::new(NullHooks),
            sentry: RecursionSentry::here_with_window(config.recursion_window_bits),
            config,
            trap_signal: Arc::new(AtomicBool::new(false)),
            loader: None,
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn Hooks>) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: ModuleLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build a fresh activation context that inherits this one's recursion
    /// sentry base, hooks, and trap signal — used when entering a nested
    /// function call (including PTC hops), so the native-stack bound in
    /// §4.4 holds regardless of script nesting depth.
    #[must_use]
    pub fn nested(&self, function_name: impl Into<Rc<str>>) -> Self {
        self.nested_with_bound(function_name, Rc::from([]))
    }

    /// Like [`Self::nested`], but also installs the closure's captured
    /// bound references, addressed later by `push_bound_reference`.
    #[must_use]
    pub fn nested_with_bound(
        &self,
        function_name: impl Into<Rc<str>>,
        bound: Rc<[Reference]>,
    ) -> Self {
        Self {
            stack: Vec::new(),
            scopes: ScopeChain::new(),
            current_function: Some(function_name.into()),
            bound,
            hooks: self.hooks.clone(),
            sentry: self.sentry,
            config: self.config,
            trap_signal: self.trap_signal.clone(),
            loader: self.loader.clone(),
        }
    }

    #[must_use]
    pub fn bound(&self, index: usize) -> Option<&Reference> {
        self.bound.get(index)
    }

    // --- reference stack ---

    pub fn push(&mut self, r: Reference) {
        self.stack.push(r);
    }

    pub fn pop(&mut self, n: usize) -> Vec<Reference> {
        let at = self.stack.len().saturating_sub(n);
        self.stack.split_off(at)
    }

    #[must_use]
    pub fn top(&self) -> Option<&Reference> {
        self.stack.last()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    #[must_use]
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    // --- scope chain ---

    pub fn scopes(&self) -> &ScopeChain {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeChain {
        &mut self.scopes
    }

    // --- identity / hooks / sentry ---

    #[must_use]
    pub fn current_function(&self) -> Option<&str> {
        self.current_function.as_deref()
    }

    #[must_use]
    pub fn hooks(&self) -> &Arc<dyn Hooks> {
        &self.hooks
    }

    #[must_use]
    pub fn loader(&self) -> Option<&ModuleLoader> {
        self.loader.as_ref()
    }

    #[must_use]
    pub const fn sentry(&self) -> RecursionSentry {
        self.sentry
    }

    #[must_use]
    pub const fn config(&self) -> ExecutorConfig {
        self.config
    }

    /// Re-check the recursion sentry from the current native stack
    /// position; called on entry to nested executor invocations.
    pub fn check_recursion(&self) -> Result<(), crate::sentry::SentryError> {
        let probe = 0usize;
        self.sentry.check(core::ptr::addr_of!(probe) as usize)
    }

    // --- cancellation ---

    #[must_use]
    pub fn trap_signal(&self) -> Arc<AtomicBool> {
        self.trap_signal.clone()
    }

    #[must_use]
    pub fn is_trapped(&self) -> bool {
        self.trap_signal.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod context_test {
    use super::*;
    use crate::value::Value;

    #[test]
    fn stack_push_pop_top() {
        let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
        ctx.push(Reference::Temporary(Value::Integer(1)));
        ctx.push(Reference::Temporary(Value::Integer(2)));
        assert!(matches!(ctx.top(), Some(Reference::Temporary(Value::Integer(2)))));
        let popped = ctx.pop(1);
        assert_eq!(popped.len(), 1);
        assert!(matches!(ctx.top(), Some(Reference::Temporary(Value::Integer(1)))));
    }

    #[test]
    fn nested_inherits_sentry_base() {
        let ctx = ExecutiveContext::new(ExecutorConfig::default());
        let child = ctx.nested("f");
        assert_eq!(ctx.sentry().base(), child.sentry().base());
    }

    #[test]
    fn clear_empties_stack() {
        let mut ctx = ExecutiveContext::new(ExecutorConfig::default());
        ctx.push(Reference::Temporary(Value::Null));
        ctx.clear();
        assert_eq!(ctx.stack_len(), 0);
    }

    #[test]
    fn no_loader_by_default() {
        let ctx = ExecutiveContext::new(ExecutorConfig::default());
        assert!(ctx.loader().is_none());
    }

    #[test]
    fn with_loader_is_inherited_by_nested_contexts() {
        let ctx = ExecutiveContext::new(ExecutorConfig::default())
            .with_loader(crate::loader::ModuleLoader::new());
        let child = ctx.nested("f");
        assert!(child.loader().is_some());
    }
}
