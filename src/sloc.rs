// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Source location (component C3, first half).

use std::fmt;
use std::sync::Arc;

/// An immutable `(file, line, column)` triple carried from lowering through
/// to exception frames.
///
/// `file` is reference-counted: the same source file is named by many nodes,
/// and source locations are copied liberally (into every node that opts into
/// `meta_ver == 2`, and again into every frame a throw passes through).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    file: Arc<str>,
    line: i32,
    column: i32,
}

impl SourceLocation {
    /// The default location used when nothing better is known.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            file: Arc::from("[unknown]"),
            line: -1,
            column: -1,
        }
    }

    #[must_use]
    pub fn new(file: impl Into<Arc<str>>, line: i32, column: i32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    #[must_use]
    pub const fn line(&self) -> i32 {
        self.line
    }

    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod sloc_test {
    use super::*;

    #[test]
    fn unknown_defaults() {
        let s = SourceLocation::unknown();
        assert_eq!(s.file(), "[unknown]");
        assert_eq!(s.line(), -1);
        assert_eq!(s.column(), -1);
    }

    #[test]
    fn display_format() {
        let s = SourceLocation::new("a.asteria", 3, 7);
        assert_eq!(s.to_string(), "a.asteria:3:7");
    }
}
