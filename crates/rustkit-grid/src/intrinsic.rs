//! Intrinsic size queries for grid items.
//!
//! The host answers min-content / max-content questions through
//! [`IntrinsicSizer`]. Answers are expensive (they walk the item's subtree), and
//! track sizing asks the same question several times, so every layout
//! invocation wraps the sizer in an [`IntrinsicCache`] keyed by
//! (item, axis, mode, cross size). The cache lives only as long as the
//! invocation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::style::Axis;

/// Intrinsic sizing mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntrinsicSizingMode {
    /// Minimum content size - the smallest size that doesn't cause overflow.
    /// For text, this is typically the width of the longest word.
    MinContent,
    /// Maximum content size - the size needed to fit all content without wrapping.
    MaxContent,
}

/// Host callback answering intrinsic size questions.
///
/// `item` is the item's index in the slice passed to the engine. `cross_size`
/// is the definite size of the item's area on the other axis when known (row
/// sizing passes the resolved column width so text can wrap).
pub trait IntrinsicSizer {
    fn intrinsic_size(
        &self,
        item: usize,
        axis: Axis,
        mode: IntrinsicSizingMode,
        cross_size: Option<f32>,
    ) -> f32;
}

impl<F> IntrinsicSizer for F
where
    F: Fn(usize, Axis, IntrinsicSizingMode, Option<f32>) -> f32,
{
    fn intrinsic_size(
        &self,
        item: usize,
        axis: Axis,
        mode: IntrinsicSizingMode,
        cross_size: Option<f32>,
    ) -> f32 {
        self(item, axis, mode, cross_size)
    }
}

/// (item, axis, mode, cross size bits)
type CacheKey = (usize, Axis, IntrinsicSizingMode, Option<u32>);

/// Lookup counters for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntrinsicCacheStats {
    pub lookups: usize,
    pub hits: usize,
}

/// Per-invocation memo in front of the host sizer.
pub struct IntrinsicCache<'a> {
    sizer: &'a dyn IntrinsicSizer,
    entries: HashMap<CacheKey, f32>,
    stats: IntrinsicCacheStats,
}

impl<'a> IntrinsicCache<'a> {
    pub fn new(sizer: &'a dyn IntrinsicSizer) -> Self {
        Self {
            sizer,
            entries: HashMap::new(),
            stats: IntrinsicCacheStats::default(),
        }
    }

    /// Intrinsic size of an item. Negative or non-finite answers count as 0.
    pub fn size(
        &mut self,
        item: usize,
        axis: Axis,
        mode: IntrinsicSizingMode,
        cross_size: Option<f32>,
    ) -> f32 {
        self.stats.lookups += 1;
        let key = (item, axis, mode, cross_size.map(f32::to_bits));
        if let Some(&size) = self.entries.get(&key) {
            self.stats.hits += 1;
            return size;
        }

        let raw = self.sizer.intrinsic_size(item, axis, mode, cross_size);
        let size = if raw.is_finite() && raw > 0.0 { raw } else { 0.0 };
        trace!(item, %axis, ?mode, ?cross_size, size, "intrinsic size");
        self.entries.insert(key, size);
        size
    }

    pub fn min_content(&mut self, item: usize, axis: Axis, cross_size: Option<f32>) -> f32 {
        self.size(item, axis, IntrinsicSizingMode::MinContent, cross_size)
    }

    pub fn max_content(&mut self, item: usize, axis: Axis, cross_size: Option<f32>) -> f32 {
        // max-content never falls below min-content
        let max = self.size(item, axis, IntrinsicSizingMode::MaxContent, cross_size);
        max.max(self.min_content(item, axis, cross_size))
    }

    pub fn stats(&self) -> IntrinsicCacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_closure_sizer() {
        let sizer = |item: usize, _axis: Axis, mode: IntrinsicSizingMode, _cross: Option<f32>| match mode {
            IntrinsicSizingMode::MinContent => 10.0 * item as f32,
            IntrinsicSizingMode::MaxContent => 20.0 * item as f32,
        };
        let mut cache = IntrinsicCache::new(&sizer);
        assert_eq!(cache.min_content(2, Axis::Horizontal, None), 20.0);
        assert_eq!(cache.max_content(2, Axis::Horizontal, None), 40.0);
    }

    #[test]
    fn test_queries_host_once_per_key() {
        let calls = Cell::new(0);
        let sizer = |_item: usize, _axis: Axis, _mode: IntrinsicSizingMode, _cross: Option<f32>| {
            calls.set(calls.get() + 1);
            5.0
        };
        let mut cache = IntrinsicCache::new(&sizer);

        for _ in 0..3 {
            cache.size(0, Axis::Vertical, IntrinsicSizingMode::MinContent, Some(100.0));
        }
        assert_eq!(calls.get(), 1);

        // A different cross size is a different question.
        cache.size(0, Axis::Vertical, IntrinsicSizingMode::MinContent, Some(50.0));
        assert_eq!(calls.get(), 2);

        let stats = cache.stats();
        assert_eq!(stats.lookups, 4);
        assert_eq!(stats.hits, 2);
    }

    #[test]
    fn test_invalid_answers_are_zero() {
        let sizer = |item: usize, _axis: Axis, _mode: IntrinsicSizingMode, _cross: Option<f32>| {
            if item == 0 {
                -4.0
            } else {
                f32::NAN
            }
        };
        let mut cache = IntrinsicCache::new(&sizer);
        assert_eq!(cache.min_content(0, Axis::Horizontal, None), 0.0);
        assert_eq!(cache.min_content(1, Axis::Horizontal, None), 0.0);
    }

    #[test]
    fn test_max_content_not_below_min_content() {
        let sizer = |_item: usize, _axis: Axis, mode: IntrinsicSizingMode, _cross: Option<f32>| match mode {
            IntrinsicSizingMode::MinContent => 30.0,
            IntrinsicSizingMode::MaxContent => 10.0,
        };
        let mut cache = IntrinsicCache::new(&sizer);
        assert_eq!(cache.max_content(0, Axis::Horizontal, None), 30.0);
    }
}
