//! Host sizer with fixed content sizes.

use std::cell::Cell;

use rustkit_grid::{Axis, IntrinsicSizer, IntrinsicSizingMode};

/// Min/max-content sizes of one item, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemContent {
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
}

impl ItemContent {
    pub fn new(min_width: f32, max_width: f32, min_height: f32, max_height: f32) -> Self {
        Self {
            min_width,
            max_width,
            min_height,
            max_height,
        }
    }

    /// Same size in every mode.
    pub fn fixed(width: f32, height: f32) -> Self {
        Self::new(width, width, height, height)
    }
}

/// Answers intrinsic size queries from a table and counts them.
pub struct ContentSizer {
    items: Vec<ItemContent>,
    queries: Cell<usize>,
}

impl ContentSizer {
    pub fn new(items: Vec<ItemContent>) -> Self {
        Self {
            items,
            queries: Cell::new(0),
        }
    }

    /// `count` items with identical content.
    pub fn uniform(count: usize, content: ItemContent) -> Self {
        Self::new(vec![content; count])
    }

    /// Number of times the engine asked.
    pub fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl IntrinsicSizer for ContentSizer {
    fn intrinsic_size(&self, item: usize, axis: Axis, mode: IntrinsicSizingMode, _cross_size: Option<f32>) -> f32 {
        self.queries.set(self.queries.get() + 1);
        let Some(content) = self.items.get(item) else {
            return 0.0;
        };
        match (axis, mode) {
            (Axis::Horizontal, IntrinsicSizingMode::MinContent) => content.min_width,
            (Axis::Horizontal, IntrinsicSizingMode::MaxContent) => content.max_width,
            (Axis::Vertical, IntrinsicSizingMode::MinContent) => content.min_height,
            (Axis::Vertical, IntrinsicSizingMode::MaxContent) => content.max_height,
        }
    }
}
