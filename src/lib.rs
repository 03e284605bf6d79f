// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `asteria-air`: the bytecode queue, IR, executor loop, and proper-tail-call
//! trampoline for the Asteria scripting language's execution core.
//!
//! This crate deliberately does not include a lexer, parser, AST-to-IR
//! lowering pass, or the full value model — those are external
//! collaborators. What it owns is the compiled representation
//! ([`queue`], [`air`]) and everything needed to run it correctly: proper
//! tail calls ([`executor::trampoline`]), exception backtraces ([`error`],
//! [`frame`]), a recursion sentry ([`sentry`]), observability hooks
//! ([`hooks`]), live-variable collection for an external GC ([`collect`]),
//! and import-cycle prevention ([`loader`]).

pub mod air;
pub mod collect;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod frame;
pub mod header;
pub mod hooks;
pub mod loader;
pub mod param;
pub mod queue;
pub mod reference;
pub mod scope;
pub mod sentry;
pub mod sloc;
pub mod status;
pub mod value;

pub use air::AirNode;
pub use context::ExecutiveContext;
pub use error::RuntimeError;
pub use frame::{BacktraceFrame, FrameType};
pub use queue::AvmcQueue;
pub use sloc::SourceLocation;
pub use status::AirStatus;
pub use value::Value;
