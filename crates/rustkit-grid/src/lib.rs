//! # RustKit Grid
//!
//! CSS Grid layout engine for the RustKit browser engine.
//!
//! ## Pipeline
//!
//! 1. **Templates**: parse track lists, implicit track lists and areas
//!    ([`TemplateParser`], memoized by [`TemplateCache`])
//! 2. **Auto-repeat**: resolve `auto-fill` / `auto-fit` against the available size
//! 3. **Line names**: build the name table for each axis ([`LineNameResolver`])
//! 4. **Placement**: resolve item lines and auto-place the rest ([`PlacementEngine`])
//! 5. **Track sizing**: columns first, then rows with known column widths
//!    ([`TrackSizingAlgorithm`])
//! 6. **Geometry**: item areas and self-alignment ([`GeometryResolver`])
//!
//! Layout never fails. Anything the engine had to ignore, clamp or guess is
//! returned in [`GridLayout::diagnostics`] and logged at `warn` level.
//!
//! ```no_run
//! use rustkit_grid::{layout_grid, AvailableSpace, Axis, GridItemStyle, GridStyle, IntrinsicSizingMode};
//!
//! let style = GridStyle::with_columns("100px 1fr").gap(8.0);
//! let items = vec![GridItemStyle::auto(), GridItemStyle::auto()];
//! let sizer = |_item: usize, _axis: Axis, _mode: IntrinsicSizingMode, _cross: Option<f32>| 20.0;
//!
//! let layout = layout_grid(&style, &items, AvailableSpace::width_only(400.0), &sizer);
//! assert_eq!(layout.items[1].area.x, 108.0);
//! ```

pub mod cache;
pub mod diagnostics;
pub mod geometry;
pub mod intrinsic;
pub mod lines;
pub mod placement;
pub mod sizing;
pub mod style;
pub mod template;

pub use cache::{CacheStats, TemplateCache};
pub use diagnostics::{Diagnostic, Diagnostics, LineFallback};
pub use geometry::{GeometryResolver, ItemGeometry, Rect};
pub use intrinsic::{IntrinsicCache, IntrinsicSizer, IntrinsicSizingMode};
pub use lines::{parse_grid_area, parse_grid_axis, parse_grid_line, GridLine, GridPlacement, LineNameResolver};
pub use placement::{PlacedGrid, PlacedItem, PlacementEngine, TrackSpan};
pub use sizing::{AxisItem, ExpandedTracks, Track, TrackSizingAlgorithm};
pub use style::{
    AvailableSpace, Axis, FontContext, GridAutoFlow, GridConfig, GridItemStyle, GridStyle, LengthPercentage,
    SelfAlignment,
};
pub use template::{AreaGrid, TemplateError, TemplateParser, TemplateProperty, TrackDefinition, TrackSize};

use serde::Serialize;
use tracing::debug;

use crate::sizing::{assemble_track_sizes, expand_track_definition};

/// Result of laying out one grid container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridLayout {
    /// Sized columns, leading implicit tracks first.
    pub columns: Vec<Track>,
    /// Sized rows, leading implicit tracks first.
    pub rows: Vec<Track>,
    /// One entry per input item, in input order.
    pub items: Vec<ItemGeometry>,
    /// Explicit columns within `columns`.
    pub explicit_columns: TrackSpan,
    /// Explicit rows within `rows`.
    pub explicit_rows: TrackSpan,
    /// Extent of the column tracks, gaps included.
    pub width: f32,
    /// Extent of the row tracks, gaps included.
    pub height: f32,
    pub diagnostics: Vec<Diagnostic>,
}

impl GridLayout {
    /// Tracks along an axis.
    pub fn tracks(&self, axis: Axis) -> &[Track] {
        match axis {
            Axis::Horizontal => &self.columns,
            Axis::Vertical => &self.rows,
        }
    }
}

/// Per-axis inputs gathered before placement.
struct AxisTemplate {
    expanded: ExpandedTracks,
    pattern: Vec<TrackSize>,
    available: Option<f32>,
    gap: f32,
}

/// Grid layout engine. Holds configuration and the template cache; every
/// other piece of state is created per invocation.
pub struct GridLayoutEngine {
    config: GridConfig,
    cache: TemplateCache,
}

impl Default for GridLayoutEngine {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridLayoutEngine {
    pub fn new(config: GridConfig) -> Self {
        let cache = TemplateCache::new(config.template_cache_capacity);
        Self { config, cache }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> &CacheStats {
        self.cache.stats()
    }

    /// Lay out one container.
    pub fn layout(
        &mut self,
        style: &GridStyle,
        items: &[GridItemStyle],
        available: AvailableSpace,
        sizer: &dyn IntrinsicSizer,
    ) -> GridLayout {
        let mut diagnostics = Diagnostics::new();
        let parser = TemplateParser::new(style.font, &self.config);

        let areas = self.cache.areas(&parser, &style.grid_template_areas);
        diagnostics.extend(areas.diagnostics);
        let areas = areas.value;

        let columns = self.axis_template(&parser, style, Axis::Horizontal, available, &mut diagnostics);
        let rows = self.axis_template(&parser, style, Axis::Vertical, available, &mut diagnostics);

        let column_lines = LineNameResolver::new(Axis::Horizontal, &columns.expanded.line_names, areas.as_ref());
        let row_lines = LineNameResolver::new(Axis::Vertical, &rows.expanded.line_names, areas.as_ref());
        let placed =
            PlacementEngine::new(&column_lines, &row_lines, style.grid_auto_flow, &self.config).place(items, &mut diagnostics);

        let mut intrinsic = IntrinsicCache::new(sizer);
        let column_tracks = self.size_axis(Axis::Horizontal, &placed, &columns, &[], &mut intrinsic, &mut diagnostics);
        let row_tracks = self.size_axis(
            Axis::Vertical,
            &placed,
            &rows,
            &column_tracks,
            &mut intrinsic,
            &mut diagnostics,
        );

        let resolver = GeometryResolver::new(&column_tracks, &row_tracks, style);
        let geometry: Vec<ItemGeometry> = placed
            .items
            .iter()
            .zip(items)
            .enumerate()
            .map(|(index, (item, item_style))| resolver.resolve(index, item, item_style, &mut intrinsic, &mut diagnostics))
            .collect();

        let width = column_tracks.last().map_or(0.0, Track::end);
        let height = row_tracks.last().map_or(0.0, Track::end);
        let stats = intrinsic.stats();
        debug!(
            items = items.len(),
            columns = column_tracks.len(),
            rows = row_tracks.len(),
            width,
            height,
            intrinsic_lookups = stats.lookups,
            intrinsic_hits = stats.hits,
            diagnostics = diagnostics.len(),
            "Grid layout complete"
        );

        GridLayout {
            columns: column_tracks,
            rows: row_tracks,
            items: geometry,
            explicit_columns: placed.explicit_columns,
            explicit_rows: placed.explicit_rows,
            width,
            height,
            diagnostics: diagnostics.into_vec(),
        }
    }

    fn axis_template(
        &mut self,
        parser: &TemplateParser,
        style: &GridStyle,
        axis: Axis,
        available: AvailableSpace,
        diagnostics: &mut Diagnostics,
    ) -> AxisTemplate {
        let available = available.get(axis);
        let gap = style.gap_for(axis).resolve_or_zero(available).max(0.0);

        let definition = self
            .cache
            .track_list(parser, TemplateProperty::template(axis), style.template(axis));
        diagnostics.extend(definition.diagnostics);
        let expanded = expand_track_definition(&definition.value, available, gap, axis, &self.config, diagnostics);

        let pattern = self
            .cache
            .auto_tracks(parser, TemplateProperty::auto(axis), style.auto_tracks(axis));
        diagnostics.extend(pattern.diagnostics);

        AxisTemplate {
            expanded,
            pattern: pattern.value,
            available,
            gap,
        }
    }

    /// Size the tracks of one axis. `cross_tracks` are the already sized
    /// tracks of the other axis (empty when sizing columns).
    fn size_axis(
        &self,
        axis: Axis,
        placed: &PlacedGrid,
        template: &AxisTemplate,
        cross_tracks: &[Track],
        intrinsic: &mut IntrinsicCache<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Track> {
        let explicit = placed.explicit(axis);
        let sizes = assemble_track_sizes(
            &template.expanded.sizes,
            &template.pattern,
            explicit.start,
            placed.track_count(axis),
        );

        let mut collapsed = vec![false; sizes.len()];
        if let Some(auto_fit) = template.expanded.auto_fit {
            let occupied = placed.occupied_tracks(axis);
            for track in auto_fit.range().map(|track| track + explicit.start) {
                if !occupied.get(track).copied().unwrap_or(false) {
                    if let Some(slot) = collapsed.get_mut(track) {
                        *slot = true;
                    }
                }
            }
        }

        let items: Vec<AxisItem> = placed
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| AxisItem {
                index,
                span: item.span(axis),
                cross_size: span_extent(cross_tracks, item.span(axis.cross())),
            })
            .collect();

        TrackSizingAlgorithm::new(axis, template.available, template.gap, &self.config).run(
            &sizes,
            &collapsed,
            &items,
            intrinsic,
            diagnostics,
        )
    }
}

/// Size of a track range, gaps included. `None` if the range is not covered.
fn span_extent(tracks: &[Track], span: TrackSpan) -> Option<f32> {
    if span.is_empty() || span.end > tracks.len() {
        return None;
    }
    Some(tracks[span.end - 1].end() - tracks[span.start].offset)
}

/// Lay out one container with the default configuration and no cache reuse.
pub fn layout_grid(
    style: &GridStyle,
    items: &[GridItemStyle],
    available: AvailableSpace,
    sizer: &dyn IntrinsicSizer,
) -> GridLayout {
    GridLayoutEngine::default().layout(style, items, available, sizer)
}
