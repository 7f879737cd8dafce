//! Typed style values consumed by the grid engine.
//!
//! These come out of the host's cascade already resolved. The grid-specific
//! sub-grammars (track lists, area strings, implicit track lists) stay as raw
//! strings here and are parsed by [`crate::template::TemplateParser`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lines::{parse_grid_area, parse_grid_axis, GridLine, GridPlacement};
use crate::template::TemplateError;

/// Grid axis. Columns are laid out along the horizontal axis, rows along the
/// vertical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Get the perpendicular axis.
    pub fn cross(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    /// Name of the tracks running along this axis.
    pub fn track_kind(self) -> &'static str {
        match self {
            Axis::Horizontal => "column",
            Axis::Vertical => "row",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.track_kind())
    }
}

/// Reference sizes for font-relative units in templates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontContext {
    /// Computed font size of the grid container (`em`).
    pub em: f32,
    /// Computed font size of the root element (`rem`).
    pub rem: f32,
}

impl Default for FontContext {
    fn default() -> Self {
        Self { em: 16.0, rem: 16.0 }
    }
}

/// A length in pixels or a percentage of the container's content box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPercentage {
    Px(f32),
    Percent(f32),
}

impl Default for LengthPercentage {
    fn default() -> Self {
        LengthPercentage::Px(0.0)
    }
}

impl LengthPercentage {
    /// Resolve against a basis. Percentages of an indefinite basis stay
    /// unresolved.
    pub fn resolve(self, basis: Option<f32>) -> Option<f32> {
        match self {
            LengthPercentage::Px(px) => Some(px),
            LengthPercentage::Percent(pct) => basis.map(|b| b * pct / 100.0),
        }
    }

    /// Resolve against a basis, treating an unresolvable percentage as zero.
    pub fn resolve_or_zero(self, basis: Option<f32>) -> f32 {
        self.resolve(basis).unwrap_or(0.0)
    }
}

/// Grid auto flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridAutoFlow {
    #[default]
    Row,
    Column,
    RowDense,
    ColumnDense,
}

impl GridAutoFlow {
    /// Check if this is a row-based flow.
    pub fn is_row(self) -> bool {
        matches!(self, GridAutoFlow::Row | GridAutoFlow::RowDense)
    }

    /// Check if this uses dense packing.
    pub fn is_dense(self) -> bool {
        matches!(self, GridAutoFlow::RowDense | GridAutoFlow::ColumnDense)
    }

    /// Parse a `grid-auto-flow` value (`row`, `column dense`, `dense`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        let mut column = None;
        let mut dense = false;
        for word in value.split_whitespace() {
            match word.to_ascii_lowercase().as_str() {
                "row" if column.is_none() => column = Some(false),
                "column" if column.is_none() => column = Some(true),
                "dense" if !dense => dense = true,
                _ => return None,
            }
        }
        if column.is_none() && !dense {
            return None;
        }
        Some(match (column.unwrap_or(false), dense) {
            (false, false) => GridAutoFlow::Row,
            (false, true) => GridAutoFlow::RowDense,
            (true, false) => GridAutoFlow::Column,
            (true, true) => GridAutoFlow::ColumnDense,
        })
    }
}

/// Self alignment of an item inside its grid area (`justify-self`,
/// `align-self`, and the container's `justify-items` / `align-items`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfAlignment {
    /// Defer to the container's `*-items` value.
    #[default]
    Auto,
    Start,
    End,
    Center,
    Stretch,
}

impl SelfAlignment {
    /// Resolve `auto` against the container default.
    pub fn or_default(self, items: SelfAlignment) -> SelfAlignment {
        match (self, items) {
            (SelfAlignment::Auto, SelfAlignment::Auto) => SelfAlignment::Stretch,
            (SelfAlignment::Auto, items) => items,
            (other, _) => other,
        }
    }
}

/// Available content-box size of the container. `None` means indefinite.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AvailableSpace {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl AvailableSpace {
    /// Both axes definite.
    pub fn definite(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Definite width, indefinite height (the usual block-flow case).
    pub fn width_only(width: f32) -> Self {
        Self {
            width: Some(width),
            height: None,
        }
    }

    /// Size along an axis.
    pub fn get(&self, axis: Axis) -> Option<f32> {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

/// Grid container properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridStyle {
    pub grid_template_columns: String,
    pub grid_template_rows: String,
    pub grid_template_areas: String,
    pub grid_auto_columns: String,
    pub grid_auto_rows: String,
    pub grid_auto_flow: GridAutoFlow,
    pub column_gap: LengthPercentage,
    pub row_gap: LengthPercentage,
    pub justify_items: SelfAlignment,
    pub align_items: SelfAlignment,
    pub font: FontContext,
}

impl GridStyle {
    /// Container with the given column template and everything else default.
    pub fn with_columns(columns: &str) -> Self {
        Self {
            grid_template_columns: columns.to_string(),
            ..Self::default()
        }
    }

    /// Set both gaps to the same pixel value.
    pub fn gap(mut self, px: f32) -> Self {
        self.column_gap = LengthPercentage::Px(px);
        self.row_gap = LengthPercentage::Px(px);
        self
    }

    /// The template string for tracks along an axis.
    pub fn template(&self, axis: Axis) -> &str {
        match axis {
            Axis::Horizontal => &self.grid_template_columns,
            Axis::Vertical => &self.grid_template_rows,
        }
    }

    /// The implicit track list string for an axis.
    pub fn auto_tracks(&self, axis: Axis) -> &str {
        match axis {
            Axis::Horizontal => &self.grid_auto_columns,
            Axis::Vertical => &self.grid_auto_rows,
        }
    }

    /// The gap between tracks along an axis.
    pub fn gap_for(&self, axis: Axis) -> LengthPercentage {
        match axis {
            Axis::Horizontal => self.column_gap,
            Axis::Vertical => self.row_gap,
        }
    }

    /// The container default alignment along an axis.
    pub fn items_alignment(&self, axis: Axis) -> SelfAlignment {
        match axis {
            Axis::Horizontal => self.justify_items,
            Axis::Vertical => self.align_items,
        }
    }
}

/// Grid item properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridItemStyle {
    pub placement: GridPlacement,
    pub justify_self: SelfAlignment,
    pub align_self: SelfAlignment,
}

impl GridItemStyle {
    /// An item with every placement property `auto`.
    pub fn auto() -> Self {
        Self::default()
    }

    /// Apply a `grid-row` shorthand value.
    pub fn with_row(mut self, value: &str) -> Result<Self, TemplateError> {
        let (start, end) = parse_grid_axis(value)?;
        self.placement.row_start = start;
        self.placement.row_end = end;
        Ok(self)
    }

    /// Apply a `grid-column` shorthand value.
    pub fn with_column(mut self, value: &str) -> Result<Self, TemplateError> {
        let (start, end) = parse_grid_axis(value)?;
        self.placement.column_start = start;
        self.placement.column_end = end;
        Ok(self)
    }

    /// Apply a `grid-area` shorthand value.
    pub fn with_area(mut self, value: &str) -> Result<Self, TemplateError> {
        self.placement = parse_grid_area(value)?;
        Ok(self)
    }

    /// Start and end lines along an axis.
    pub fn lines(&self, axis: Axis) -> (&GridLine, &GridLine) {
        match axis {
            Axis::Horizontal => (&self.placement.column_start, &self.placement.column_end),
            Axis::Vertical => (&self.placement.row_start, &self.placement.row_end),
        }
    }

    /// Self alignment along an axis.
    pub fn alignment(&self, axis: Axis) -> SelfAlignment {
        match axis {
            Axis::Horizontal => self.justify_self,
            Axis::Vertical => self.align_self,
        }
    }
}

/// Engine limits and tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Upper bound on intrinsic sizing passes over spanning items.
    pub max_intrinsic_passes: u32,
    /// `repeat(N, ...)` counts above this are clamped.
    pub max_repeat_count: u32,
    /// Line numbers are clamped to `-max_line..=max_line`.
    pub max_line: i32,
    /// Parsed templates kept by the engine's cache. Zero disables caching.
    pub template_cache_capacity: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_intrinsic_passes: 32,
            max_repeat_count: 10_000,
            max_line: 10_000,
            template_cache_capacity: 64,
        }
    }
}
