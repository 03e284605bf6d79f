// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Script-visible runtime error, with backtrace framing (§3, §7).

use std::fmt;

use crate::frame::BacktraceFrame;
use crate::sloc::SourceLocation;
use crate::value::Value;

/// A script-visible runtime error: a value (the thrown payload, or a
/// synthesized message) plus the stack of frames it has passed through,
/// innermost first.
#[derive(Clone, Debug)]
pub struct RuntimeError {
    pub value: Value,
    pub message: String,
    pub frames: Vec<BacktraceFrame>,
}

impl RuntimeError {
    #[must_use]
    pub fn new(message: impl Into<String>, value: Value) -> Self {
        Self {
            value,
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Wrap a host/native error that is not already a `RuntimeError`.
    ///
    /// §9 Open Question 2 resolution: always wrap first, then attempt to
    /// annotate with a frame iff a source location is available — this is
    /// the single policy applied regardless of which node threw.
    #[must_use]
    pub fn wrap(native: impl fmt::Display) -> Self {
        let message = native.to_string();
        Self::new(message, Value::Null)
    }

    /// Append a frame as execution unwinds past a node with a known
    /// source location. No-op (per the wrap-then-annotate policy) when
    /// `sloc` is `None` — the node simply had no location to annotate with.
    pub fn push_frame(&mut self, frame_type: crate::frame::FrameType, sloc: Option<SourceLocation>) {
        if let Some(sloc) = sloc {
            self.frames.push(BacktraceFrame::new(frame_type, sloc, None));
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Runtime_Error: {}", self.message)?;
        for frame in &self.frames {
            writeln!(f, "  at {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod error_test {
    use super::*;
    use crate::frame::FrameType;

    #[test]
    fn push_frame_noop_without_sloc() {
        let mut e = RuntimeError::new("boom", Value::Null);
        e.push_frame(FrameType::Plain, None);
        assert!(e.frames.is_empty());
    }

    #[test]
    fn push_frame_appends_with_sloc() {
        let mut e = RuntimeError::new("boom", Value::Null);
        e.push_frame(FrameType::Throw, Some(SourceLocation::new("a", 1, 1)));
        assert_eq!(e.frames.len(), 1);
    }

    #[test]
    fn display_renders_frames_innermost_first() {
        let mut e = RuntimeError::new("boom", Value::Null);
        e.push_frame(FrameType::Throw, Some(SourceLocation::new("a.asteria", 1, 1)));
        e.push_frame(FrameType::Call, Some(SourceLocation::new("a.asteria", 2, 1)));
        let rendered = e.to_string();
        let throw_pos = rendered.find("throw @").unwrap();
        let call_pos = rendered.find("call @").unwrap();
        assert!(throw_pos < call_pos);
    }
}
