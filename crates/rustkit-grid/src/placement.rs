//! Grid item placement.
//!
//! Resolves every item's `grid-row-*` / `grid-column-*` lines to a track range
//! and auto-places the rest, following the CSS Grid placement algorithm:
//!
//! 1. Definite lines are resolved for all items. Negative numbers count back
//!    from a provisional extent (explicit lines, or the largest positive line
//!    any item names, whichever is larger). Lines before line 1 create leading
//!    implicit tracks.
//! 2. Items definite on both axes occupy their cells.
//! 3. Items locked to a major track (a row, for `row` flow) search along it.
//! 4. Everything else is placed in document order with a cursor. Sparse
//!    packing only moves the cursor forward; dense packing restarts from the
//!    grid origin for each item.
//!
//! All output ranges are 0-based and half-open.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::diagnostics::{Diagnostic, Diagnostics, LineFallback};
use crate::lines::{GridLine, LineNameResolver};
use crate::style::{Axis, GridAutoFlow, GridConfig, GridItemStyle};

/// A half-open range of tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TrackSpan {
    pub start: usize,
    pub end: usize,
}

impl TrackSpan {
    pub fn new(start: usize, span: usize) -> Self {
        Self {
            start,
            end: start + span.max(1),
        }
    }

    /// Number of tracks covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, track: usize) -> bool {
        track >= self.start && track < self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Where one item ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacedItem {
    pub columns: TrackSpan,
    pub rows: TrackSpan,
}

impl PlacedItem {
    pub fn span(&self, axis: Axis) -> TrackSpan {
        match axis {
            Axis::Horizontal => self.columns,
            Axis::Vertical => self.rows,
        }
    }
}

/// Placement result for a whole container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedGrid {
    /// One entry per input item, in input order.
    pub items: Vec<PlacedItem>,
    pub column_count: usize,
    pub row_count: usize,
    /// Explicit columns within the final grid.
    pub explicit_columns: TrackSpan,
    /// Explicit rows within the final grid.
    pub explicit_rows: TrackSpan,
}

impl PlacedGrid {
    /// Total tracks along an axis.
    pub fn track_count(&self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.column_count,
            Axis::Vertical => self.row_count,
        }
    }

    /// Explicit track range along an axis.
    pub fn explicit(&self, axis: Axis) -> TrackSpan {
        match axis {
            Axis::Horizontal => self.explicit_columns,
            Axis::Vertical => self.explicit_rows,
        }
    }

    /// Implicit tracks added before the explicit grid.
    pub fn leading_implicit(&self, axis: Axis) -> usize {
        self.explicit(axis).start
    }

    /// Which tracks along an axis hold at least one item.
    pub fn occupied_tracks(&self, axis: Axis) -> Vec<bool> {
        let mut occupied = vec![false; self.track_count(axis)];
        for item in &self.items {
            for track in item.span(axis).range() {
                if let Some(slot) = occupied.get_mut(track) {
                    *slot = true;
                }
            }
        }
        occupied
    }
}

/// Cell occupancy in flow-relative coordinates (major = the flow direction's
/// track axis, rows for `row` flow). Cells outside the grid count as vacant.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cells: Vec<Option<u32>>,
    majors: usize,
    minors: usize,
}

impl OccupancyGrid {
    pub fn new(majors: usize, minors: usize) -> Self {
        Self {
            cells: vec![None; majors * minors],
            majors,
            minors,
        }
    }

    pub fn majors(&self) -> usize {
        self.majors
    }

    pub fn minors(&self) -> usize {
        self.minors
    }

    /// Grow to at least `majors` x `minors`.
    pub fn ensure(&mut self, majors: usize, minors: usize) {
        let majors = majors.max(self.majors);
        let minors = minors.max(self.minors);
        if minors != self.minors {
            let mut cells = vec![None; majors * minors];
            for major in 0..self.majors {
                let from = major * self.minors;
                cells[major * minors..major * minors + self.minors]
                    .copy_from_slice(&self.cells[from..from + self.minors]);
            }
            self.cells = cells;
        } else if majors != self.majors {
            self.cells.resize(majors * minors, None);
        }
        self.majors = majors;
        self.minors = minors;
    }

    /// Item occupying a cell.
    pub fn occupant(&self, major: usize, minor: usize) -> Option<u32> {
        if major >= self.majors || minor >= self.minors {
            return None;
        }
        self.cells[major * self.minors + minor]
    }

    pub fn is_area_vacant(&self, major: TrackSpan, minor: TrackSpan) -> bool {
        major
            .range()
            .all(|ma| minor.range().all(|mi| self.occupant(ma, mi).is_none()))
    }

    /// Mark an area as taken, growing the grid to fit it.
    pub fn occupy(&mut self, major: TrackSpan, minor: TrackSpan, item: u32) {
        self.ensure(major.end, minor.end);
        for ma in major.range() {
            for mi in minor.range() {
                self.cells[ma * self.minors + mi] = Some(item);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

impl Edge {
    fn suffix(self) -> &'static str {
        match self {
            Edge::Start => "start",
            Edge::End => "end",
        }
    }
}

/// Per-axis placement before auto-placement, in CSS line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinePlacement {
    Definite { start: i32, end: i32 },
    Auto { span: usize },
}

/// Per-axis placement in 0-based tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Fixed(TrackSpan),
    Auto(usize),
}

/// Places grid items into cells.
pub struct PlacementEngine<'a> {
    columns: &'a LineNameResolver,
    rows: &'a LineNameResolver,
    flow: GridAutoFlow,
    max_line: i32,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(
        columns: &'a LineNameResolver,
        rows: &'a LineNameResolver,
        flow: GridAutoFlow,
        config: &GridConfig,
    ) -> Self {
        Self {
            columns,
            rows,
            flow,
            max_line: config.max_line.max(1),
        }
    }

    fn resolver(&self, axis: Axis) -> &'a LineNameResolver {
        match axis {
            Axis::Horizontal => self.columns,
            Axis::Vertical => self.rows,
        }
    }

    /// Place every item. Never fails; problems become diagnostics.
    ///
    /// Items locked to a major track are placed before fully automatic
    /// items, so document order only holds within each of the three passes.
    pub fn place(&self, items: &[GridItemStyle], diagnostics: &mut Diagnostics) -> PlacedGrid {
        let (column_slots, explicit_columns, column_count) = self.resolve_axis(items, Axis::Horizontal, diagnostics);
        let (row_slots, explicit_rows, row_count) = self.resolve_axis(items, Axis::Vertical, diagnostics);

        let row_flow = self.flow.is_row();
        let dense = self.flow.is_dense();
        let (major_slots, minor_slots, majors, minors) = if row_flow {
            (row_slots, column_slots, row_count, column_count)
        } else {
            (column_slots, row_slots, column_count, row_count)
        };

        // The minor axis is wide enough for the widest auto span up front.
        let widest_auto = minor_slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Auto(span) => Some(*span),
                Slot::Fixed(_) => None,
            })
            .max()
            .unwrap_or(0);

        let mut grid = OccupancyGrid::new(majors, minors.max(widest_auto));
        let mut placed: Vec<Option<(TrackSpan, TrackSpan)>> = vec![None; items.len()];

        // Definite on both axes.
        for (index, (major, minor)) in major_slots.iter().zip(&minor_slots).enumerate() {
            if let (Slot::Fixed(major), Slot::Fixed(minor)) = (major, minor) {
                grid.occupy(*major, *minor, index as u32);
                placed[index] = Some((*major, *minor));
            }
        }

        // Locked to a major track, auto on the minor axis.
        let mut lane_cursors: BTreeMap<usize, usize> = BTreeMap::new();
        for (index, (major, minor)) in major_slots.iter().zip(&minor_slots).enumerate() {
            let (Slot::Fixed(major), Slot::Auto(span)) = (major, minor) else {
                continue;
            };
            let mut minor_start = if dense {
                0
            } else {
                lane_cursors.get(&major.start).copied().unwrap_or(0)
            };
            let minor = loop {
                let candidate = TrackSpan::new(minor_start, *span);
                if grid.is_area_vacant(*major, candidate) {
                    break candidate;
                }
                minor_start += 1;
            };
            lane_cursors.insert(major.start, minor.end);
            grid.occupy(*major, minor, index as u32);
            placed[index] = Some((*major, minor));
        }

        // Remaining items in document order.
        let mut cursor = (0usize, 0usize);
        for (index, (major, minor)) in major_slots.iter().zip(&minor_slots).enumerate() {
            if placed[index].is_some() {
                continue;
            }
            let area = match (*major, *minor) {
                (Slot::Auto(major_span), Slot::Fixed(minor)) => {
                    let mut major_start = if dense {
                        0
                    } else if minor.start < cursor.1 {
                        cursor.0 + 1
                    } else {
                        cursor.0
                    };
                    let major = loop {
                        let candidate = TrackSpan::new(major_start, major_span);
                        if grid.is_area_vacant(candidate, minor) {
                            break candidate;
                        }
                        major_start += 1;
                    };
                    cursor = (major.start, minor.start);
                    (major, minor)
                }
                (Slot::Auto(major_span), Slot::Auto(minor_span)) => {
                    let (mut major_start, mut minor_start) = if dense { (0, 0) } else { cursor };
                    let area = loop {
                        if minor_start + minor_span > grid.minors() {
                            major_start += 1;
                            minor_start = 0;
                            continue;
                        }
                        let major = TrackSpan::new(major_start, major_span);
                        let minor = TrackSpan::new(minor_start, minor_span);
                        if grid.is_area_vacant(major, minor) {
                            break (major, minor);
                        }
                        minor_start += 1;
                    };
                    cursor = (area.0.start, area.1.start);
                    area
                }
                // Placed by the earlier passes.
                (Slot::Fixed(_), _) => continue,
            };
            grid.occupy(area.0, area.1, index as u32);
            placed[index] = Some(area);
        }

        let items: Vec<PlacedItem> = placed
            .into_iter()
            .map(|area| {
                let (major, minor) = area.unwrap_or_default();
                if row_flow {
                    PlacedItem {
                        columns: minor,
                        rows: major,
                    }
                } else {
                    PlacedItem {
                        columns: major,
                        rows: minor,
                    }
                }
            })
            .collect();

        for (index, item) in items.iter().enumerate() {
            trace!(
                item = index,
                columns = ?item.columns.range(),
                rows = ?item.rows.range(),
                "placed grid item"
            );
        }

        let (column_count, row_count) = if row_flow {
            (grid.minors(), grid.majors())
        } else {
            (grid.majors(), grid.minors())
        };

        debug!(
            items = items.len(),
            columns = column_count,
            rows = row_count,
            flow = ?self.flow,
            "Grid items placed"
        );

        PlacedGrid {
            items,
            column_count,
            row_count,
            explicit_columns,
            explicit_rows,
        }
    }

    /// Resolve one axis for all items: the slot per item, the explicit range
    /// and the initial track count.
    fn resolve_axis(
        &self,
        items: &[GridItemStyle],
        axis: Axis,
        diagnostics: &mut Diagnostics,
    ) -> (Vec<Slot>, TrackSpan, usize) {
        let resolver = self.resolver(axis);
        let explicit_lines = resolver.count_explicit_lines().max(1) as i32;

        // Collect the provisional extent before any negative line resolves.
        let provisional = items
            .iter()
            .flat_map(|item| {
                let (start, end) = item.lines(axis);
                [start, end]
            })
            .filter_map(|line| match line {
                GridLine::Number(n) if *n > 0 => Some((*n).min(self.max_line)),
                _ => None,
            })
            .fold(explicit_lines, i32::max);

        let lines: Vec<LinePlacement> = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let (start, end) = item.lines(axis);
                self.resolve_lines(index, axis, start, end, provisional, diagnostics)
            })
            .collect();

        let min_line = lines
            .iter()
            .filter_map(|placement| match placement {
                LinePlacement::Definite { start, .. } => Some(*start),
                LinePlacement::Auto { .. } => None,
            })
            .fold(1, i32::min);
        let leading = (1 - min_line) as usize;
        let explicit_tracks = (explicit_lines - 1) as usize;
        let explicit = TrackSpan {
            start: leading,
            end: leading + explicit_tracks,
        };

        let to_track = |line: i32| (line - 1 + leading as i32) as usize;
        let slots: Vec<Slot> = lines
            .iter()
            .map(|placement| match *placement {
                LinePlacement::Definite { start, end } => Slot::Fixed(TrackSpan {
                    start: to_track(start),
                    end: to_track(end),
                }),
                LinePlacement::Auto { span } => Slot::Auto(span),
            })
            .collect();

        let count = slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Fixed(span) => Some(span.end),
                Slot::Auto(_) => None,
            })
            .fold(explicit.end, usize::max);

        if leading > 0 {
            debug!(%axis, leading, "leading implicit tracks");
        }

        (slots, explicit, count)
    }

    fn resolve_lines(
        &self,
        item: usize,
        axis: Axis,
        start: &GridLine,
        end: &GridLine,
        provisional: i32,
        diagnostics: &mut Diagnostics,
    ) -> LinePlacement {
        let resolver = self.resolver(axis);
        let start_line = self.resolve_edge(item, axis, start, Edge::Start, provisional, diagnostics);
        let end_line = self.resolve_edge(item, axis, end, Edge::End, provisional, diagnostics);

        let (start, end) = match (start_line, end_line) {
            (Some(s), Some(e)) if s == e => (s, s + 1),
            (Some(s), Some(e)) => (s.min(e), s.max(e)),
            (Some(s), None) => match end {
                GridLine::Span(n) => (s, s + self.span_len(*n)),
                GridLine::SpanNamed { name, count } => match resolver.find_after(name, s, *count) {
                    Some(found) => (s, found.line),
                    None => {
                        self.unknown_span(item, axis, name, diagnostics);
                        (s, s + 1)
                    }
                },
                _ => (s, s + 1),
            },
            (None, Some(e)) => match start {
                GridLine::Span(n) => (e - self.span_len(*n), e),
                GridLine::SpanNamed { name, count } => match resolver.find_before(name, e, *count) {
                    Some(found) => (found.line, e),
                    None => {
                        self.unknown_span(item, axis, name, diagnostics);
                        (e - 1, e)
                    }
                },
                _ => (e - 1, e),
            },
            (None, None) => {
                let span = match (start, end) {
                    (GridLine::Span(n), _) => self.span_len(*n),
                    (GridLine::SpanNamed { .. }, _) => 1,
                    (_, GridLine::Span(n)) => self.span_len(*n),
                    _ => 1,
                };
                return LinePlacement::Auto { span: span as usize };
            }
        };

        let start = self.clamp_line(item, axis, start, diagnostics);
        let end = self.clamp_line(item, axis, end, diagnostics);
        let (start, end) = if end > start {
            (start, end)
        } else if start >= self.max_line {
            (end - 1, end)
        } else {
            (start, start + 1)
        };
        LinePlacement::Definite { start, end }
    }

    fn resolve_edge(
        &self,
        item: usize,
        axis: Axis,
        line: &GridLine,
        edge: Edge,
        provisional: i32,
        diagnostics: &mut Diagnostics,
    ) -> Option<i32> {
        match line {
            GridLine::Number(n) => self.numeric_line(item, axis, *n, provisional, diagnostics),
            GridLine::Named { name, ordinal } => {
                self.named_line(item, axis, name, *ordinal, edge, provisional, diagnostics)
            }
            GridLine::Auto | GridLine::Span(_) | GridLine::SpanNamed { .. } => None,
        }
    }

    /// Line 0 is not a grid line; it becomes `auto`.
    fn numeric_line(
        &self,
        item: usize,
        axis: Axis,
        line: i32,
        provisional: i32,
        diagnostics: &mut Diagnostics,
    ) -> Option<i32> {
        if line == 0 {
            diagnostics.push(Diagnostic::InvalidLine { item, axis });
            return None;
        }
        let clamped = line.clamp(-self.max_line, self.max_line);
        if clamped != line {
            diagnostics.push(Diagnostic::LineClamped {
                item,
                axis,
                line,
                clamped,
            });
        }
        if clamped > 0 {
            Some(clamped)
        } else {
            Some(provisional + 1 + clamped)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn named_line(
        &self,
        item: usize,
        axis: Axis,
        name: &str,
        ordinal: Option<i32>,
        edge: Edge,
        provisional: i32,
        diagnostics: &mut Diagnostics,
    ) -> Option<i32> {
        let resolver = self.resolver(axis);

        if ordinal.is_none() {
            let area_line = format!("{}-{}", name, edge.suffix());
            if let Some(found) = resolver.resolve(&area_line, 1, false) {
                return Some(found.line);
            }
        }

        let requested = ordinal.unwrap_or(1);
        let from_end = requested < 0;
        match resolver.resolve(name, requested.unsigned_abs(), from_end) {
            Some(found) => {
                if found.clamped {
                    diagnostics.push(Diagnostic::LineOrdinalClamped {
                        item,
                        axis,
                        name: name.to_string(),
                        ordinal: requested,
                        available: found.available,
                    });
                }
                Some(found.line)
            }
            None => match ordinal {
                Some(n) => {
                    diagnostics.push(Diagnostic::UnknownLineName {
                        item,
                        axis,
                        name: name.to_string(),
                        fallback: LineFallback::Numeric(n),
                    });
                    self.numeric_line(item, axis, n, provisional, diagnostics)
                }
                None => {
                    diagnostics.push(Diagnostic::UnknownLineName {
                        item,
                        axis,
                        name: name.to_string(),
                        fallback: LineFallback::Auto,
                    });
                    None
                }
            },
        }
    }

    fn unknown_span(&self, item: usize, axis: Axis, name: &str, diagnostics: &mut Diagnostics) {
        diagnostics.push(Diagnostic::UnknownLineName {
            item,
            axis,
            name: name.to_string(),
            fallback: LineFallback::SpanOne,
        });
    }

    fn span_len(&self, span: u32) -> i32 {
        span.clamp(1, self.max_line as u32) as i32
    }

    fn clamp_line(&self, item: usize, axis: Axis, line: i32, diagnostics: &mut Diagnostics) -> i32 {
        let clamped = line.clamp(-self.max_line, self.max_line);
        if clamped != line {
            diagnostics.push(Diagnostic::LineClamped {
                item,
                axis,
                line,
                clamped,
            });
        }
        clamped
    }
}
