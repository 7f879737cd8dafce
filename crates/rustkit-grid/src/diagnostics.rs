//! Non-fatal layout diagnostics.
//!
//! Nothing in the grid engine fails outward. Every degraded outcome (a dropped
//! property, a clamped line, a collapsed auto-repeat) is recorded here, logged
//! through `tracing`, and handed back to the host with the layout result.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::style::Axis;

/// What an unknown named line reference fell back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineFallback {
    /// The ordinal was used as a plain line number.
    Numeric(i32),
    /// The edge was treated as `auto`.
    Auto,
    /// A named span was treated as `span 1`.
    SpanOne,
}

impl fmt::Display for LineFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineFallback::Numeric(line) => write!(f, "using line {}", line),
            LineFallback::Auto => f.write_str("treated as auto"),
            LineFallback::SpanOne => f.write_str("treated as span 1"),
        }
    }
}

/// A recoverable problem found while laying out a grid.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum Diagnostic {
    #[error("{property}: invalid value {value:?} ({reason}); property ignored")]
    InvalidTemplate {
        property: String,
        value: String,
        reason: String,
    },

    #[error("{property}: line names inside auto-repeat dropped: {names:?}")]
    AutoRepeatLineNames { property: String, names: Vec<String> },

    #[error("{property}: repeat count {requested} clamped to {limit}")]
    RepeatCountClamped {
        property: String,
        requested: u32,
        limit: u32,
    },

    #[error("{axis} auto-repeat with indefinite available size collapsed to a single track")]
    AutoRepeatIndefinite { axis: Axis },

    #[error("item {item}: unknown {axis} line name {name:?}, {fallback}")]
    UnknownLineName {
        item: usize,
        axis: Axis,
        name: String,
        fallback: LineFallback,
    },

    #[error("item {item}: {axis} line {name:?} #{ordinal} requested but only {available} exist")]
    LineOrdinalClamped {
        item: usize,
        axis: Axis,
        name: String,
        ordinal: i32,
        available: usize,
    },

    #[error("item {item}: {axis} line 0 is not a grid line, treated as auto")]
    InvalidLine { item: usize, axis: Axis },

    #[error("item {item}: {axis} line {line} clamped to {clamped}")]
    LineClamped {
        item: usize,
        axis: Axis,
        line: i32,
        clamped: i32,
    },

    #[error("item {item}: {axis} span {start}..{end} exceeds {tracks} tracks; clamped")]
    SpanClamped {
        item: usize,
        axis: Axis,
        start: usize,
        end: usize,
        tracks: usize,
    },

    #[error("{axis} intrinsic sizing did not settle within {passes} passes")]
    IntrinsicSizingUnsettled { axis: Axis, passes: u32 },
}

/// Collects diagnostics for one layout invocation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(target: "rustkit_grid", "{}", diagnostic);
        self.entries.push(diagnostic);
    }

    /// Record several diagnostics, e.g. ones replayed from a cached parse.
    pub fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, diagnostics: I) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Consume the collector.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
