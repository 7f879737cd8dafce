//! Item geometry: grid areas from sized tracks, then self-alignment.

use serde::Serialize;
use tracing::trace;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::intrinsic::IntrinsicCache;
use crate::placement::{PlacedItem, TrackSpan};
use crate::sizing::Track;
use crate::style::{Axis, GridItemStyle, GridStyle, SelfAlignment};

/// A 2D rectangle in the container's content-box space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    fn offset(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    fn size(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

/// Final geometry of one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ItemGeometry {
    /// The grid area the item occupies.
    pub area: Rect,
    /// The item's box inside its area after alignment.
    pub rect: Rect,
    /// Columns covered (0-based, half-open, after clamping).
    pub columns: TrackSpan,
    /// Rows covered (0-based, half-open, after clamping).
    pub rows: TrackSpan,
}

/// Turns placed items and sized tracks into rectangles.
pub struct GeometryResolver<'a> {
    columns: &'a [Track],
    rows: &'a [Track],
    justify_items: SelfAlignment,
    align_items: SelfAlignment,
}

impl<'a> GeometryResolver<'a> {
    pub fn new(columns: &'a [Track], rows: &'a [Track], style: &GridStyle) -> Self {
        Self {
            columns,
            rows,
            justify_items: style.justify_items,
            align_items: style.align_items,
        }
    }

    fn tracks(&self, axis: Axis) -> &'a [Track] {
        match axis {
            Axis::Horizontal => self.columns,
            Axis::Vertical => self.rows,
        }
    }

    /// Offset and size of a track range. Ranges past the last track clamp to
    /// it with a diagnostic; an empty track list gives `(0, 0)`.
    pub fn area_span(
        &self,
        item: usize,
        axis: Axis,
        span: TrackSpan,
        diagnostics: &mut Diagnostics,
    ) -> (TrackSpan, f32, f32) {
        let tracks = self.tracks(axis);
        if tracks.is_empty() {
            return (span, 0.0, 0.0);
        }

        let count = tracks.len();
        let clamped = if span.end > count || span.is_empty() {
            let start = span.start.min(count - 1);
            let clamped = TrackSpan {
                start,
                end: span.end.clamp(start + 1, count),
            };
            diagnostics.push(Diagnostic::SpanClamped {
                item,
                axis,
                start: span.start,
                end: span.end,
                tracks: count,
            });
            clamped
        } else {
            span
        };

        let offset = tracks[clamped.start].offset;
        let extent = tracks[clamped.end - 1].end() - offset;
        (clamped, offset, extent.max(0.0))
    }

    /// Area and aligned box for one placed item.
    pub fn resolve(
        &self,
        index: usize,
        placed: &PlacedItem,
        style: &GridItemStyle,
        cache: &mut IntrinsicCache<'_>,
        diagnostics: &mut Diagnostics,
    ) -> ItemGeometry {
        let (columns, x, width) = self.area_span(index, Axis::Horizontal, placed.columns, diagnostics);
        let (rows, y, height) = self.area_span(index, Axis::Vertical, placed.rows, diagnostics);
        let area = Rect::new(x, y, width, height);

        let justify = style.justify_self.or_default(self.justify_items);
        let (rect_x, rect_width) = align_in_area(justify, &area, Axis::Horizontal, index, None, cache);
        let align = style.align_self.or_default(self.align_items);
        let (rect_y, rect_height) = align_in_area(align, &area, Axis::Vertical, index, Some(rect_width), cache);

        let rect = Rect::new(rect_x, rect_y, rect_width, rect_height);
        trace!(item = index, ?area, ?rect, "item geometry");

        ItemGeometry {
            area,
            rect,
            columns,
            rows,
        }
    }
}

/// Position an item along one axis of its area. Non-stretch items use their
/// fit-content size: `min(max-content, max(min-content, area))`.
fn align_in_area(
    alignment: SelfAlignment,
    area: &Rect,
    axis: Axis,
    item: usize,
    cross_size: Option<f32>,
    cache: &mut IntrinsicCache<'_>,
) -> (f32, f32) {
    let offset = area.offset(axis);
    let available = area.size(axis);

    if matches!(alignment, SelfAlignment::Stretch | SelfAlignment::Auto) {
        return (offset, available);
    }

    let min_content = cache.min_content(item, axis, cross_size);
    let max_content = cache.max_content(item, axis, cross_size);
    let size = max_content.min(min_content.max(available));
    match alignment {
        SelfAlignment::End => (offset + available - size, size),
        SelfAlignment::Center => (offset + (available - size) / 2.0, size),
        _ => (offset, size),
    }
}
