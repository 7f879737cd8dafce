//! Custom assertions for grid layout tests.

use rustkit_grid::{Axis, GridLayout, TrackSpan};

/// Assert the used sizes of every track along an axis.
#[track_caller]
pub fn assert_track_sizes(layout: &GridLayout, axis: Axis, expected: &[f32]) {
    let actual: Vec<f32> = layout.tracks(axis).iter().map(|track| track.size).collect();
    assert_eq!(
        actual, expected,
        "{} sizes mismatch: expected {:?}, got {:?}",
        axis, expected, actual
    );
}

/// Assert the 0-based half-open track range an item covers.
#[track_caller]
pub fn assert_item_span(layout: &GridLayout, item: usize, axis: Axis, start: usize, end: usize) {
    let geometry = &layout.items[item];
    let actual = match axis {
        Axis::Horizontal => geometry.columns,
        Axis::Vertical => geometry.rows,
    };
    assert_eq!(
        actual,
        TrackSpan { start, end },
        "item {} {} span mismatch",
        item,
        axis
    );
}

/// Assert that no diagnostics were produced.
#[track_caller]
pub fn assert_clean(layout: &GridLayout) {
    assert!(
        layout.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        layout.diagnostics
    );
}

/// Bit patterns of every float in a layout, for exact comparisons.
pub fn layout_bits(layout: &GridLayout) -> Vec<u32> {
    let mut bits = Vec::new();
    for track in layout.columns.iter().chain(&layout.rows) {
        bits.push(track.offset.to_bits());
        bits.push(track.size.to_bits());
    }
    for item in &layout.items {
        for rect in [item.area, item.rect] {
            bits.extend([rect.x, rect.y, rect.width, rect.height].map(f32::to_bits));
        }
    }
    bits.push(layout.width.to_bits());
    bits.push(layout.height.to_bits());
    bits
}
