// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Executor configuration, analogous to the teacher's compile-time
//! `MAX_CALL_DEPTH`/`X_REG_COUNT` constants, but runtime-tunable since this
//! crate is embedded into host programs with varying recursion budgets.

/// Tunables for one [`crate::context::ExecutiveContext`].
#[derive(Clone, Copy, Debug)]
pub struct ExecutorConfig {
    /// Recursion sentry window, in bits (default 20 == 1 MiB, per §3).
    pub recursion_window_bits: u32,
    /// Whether `single_step_trap` nodes actually invoke `Hooks::on_trap`.
    /// Verbose traps cost a hook dispatch per node; disabled by default.
    pub verbose_traps: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            recursion_window_bits: crate::sentry::DEFAULT_WINDOW_BITS,
            verbose_traps: false,
        }
    }
}
