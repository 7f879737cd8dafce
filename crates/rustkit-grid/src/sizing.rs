//! Track sizing for RustKit Grid.
//!
//! Two jobs live here:
//!
//! - Auto-repeat resolution: `repeat(auto-fill | auto-fit, ...)` becomes a
//!   concrete number of tracks once the available size is known, and the
//!   final per-track sizing functions are assembled (leading implicit,
//!   explicit, trailing implicit).
//! - The track sizing algorithm: base sizes and growth limits from the sizing
//!   functions, item contributions (single-span first, then spanning items in
//!   ascending span order), free space distribution, `fr` expansion, `auto`
//!   stretching and finally offsets with gaps between non-collapsed tracks.

use serde::Serialize;
use tracing::{debug, trace};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::intrinsic::IntrinsicCache;
use crate::placement::TrackSpan;
use crate::style::{Axis, GridConfig};
use crate::template::{AutoRepeat, LineName, RepeatMode, SlotSizing, TrackBreadth, TrackDefinition, TrackSize};

const EPSILON: f32 = 1e-3;

// ==================== Auto Repeat ====================

/// A track list with its auto-repeat resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedTracks {
    /// Sizing function per explicit track.
    pub sizes: Vec<TrackSize>,
    /// Names per explicit line (`sizes.len() + 1` entries).
    pub line_names: Vec<Vec<LineName>>,
    /// Tracks produced by `repeat(auto-fit, ...)`, if any.
    pub auto_fit: Option<TrackSpan>,
}

/// Resolve the auto-repeat (if any) of a track definition.
///
/// `available` is the container's content-box size on this axis and `gap` the
/// resolved gap between tracks.
pub fn expand_track_definition(
    definition: &TrackDefinition,
    available: Option<f32>,
    gap: f32,
    axis: Axis,
    config: &GridConfig,
    diagnostics: &mut Diagnostics,
) -> ExpandedTracks {
    let repetitions = definition
        .auto_repeat()
        .map_or(0, |repeat| auto_repeat_count(definition, repeat, available, gap, axis, config, diagnostics));

    let mut sizes = Vec::new();
    let mut line_names = Vec::new();
    let mut auto_fit = None;

    for slot in &definition.slots {
        match &slot.sizing {
            SlotSizing::Track(size) => {
                line_names.push(slot.line_names.clone());
                sizes.push(*size);
            }
            SlotSizing::AutoRepeat(repeat) => {
                let start = sizes.len();
                // Without a definite size the group collapses to its first track.
                let group = match available {
                    Some(_) => &repeat.tracks[..],
                    None => &repeat.tracks[..repeat.tracks.len().min(1)],
                };
                for repetition in 0..repetitions {
                    for (index, size) in group.iter().enumerate() {
                        if repetition == 0 && index == 0 {
                            line_names.push(slot.line_names.clone());
                        } else {
                            line_names.push(Vec::new());
                        }
                        sizes.push(*size);
                    }
                }
                if repeat.mode == RepeatMode::AutoFit {
                    auto_fit = Some(TrackSpan {
                        start,
                        end: sizes.len(),
                    });
                }
            }
        }
    }
    line_names.push(definition.trailing_names.clone());

    ExpandedTracks {
        sizes,
        line_names,
        auto_fit,
    }
}

/// How many times an auto-repeat group fits: the largest count whose tracks
/// and gaps do not overflow `available`, at least one.
fn auto_repeat_count(
    definition: &TrackDefinition,
    repeat: &AutoRepeat,
    available: Option<f32>,
    gap: f32,
    axis: Axis,
    config: &GridConfig,
    diagnostics: &mut Diagnostics,
) -> usize {
    let Some(available) = available else {
        diagnostics.push(Diagnostic::AutoRepeatIndefinite { axis });
        return 1;
    };

    let basis = Some(available);
    let fixed: f32 = definition.fixed_tracks().map(|size| size.repeat_basis(basis)).sum();
    let other_tracks = definition.fixed_tracks().count() as f32;
    let group: f32 = repeat.tracks.iter().map(|size| size.repeat_basis(basis)).sum();
    let group_len = repeat.tracks.len() as f32;

    let space = available - fixed - other_tracks * gap + gap;
    let per_repetition = group + group_len * gap;
    if per_repetition <= EPSILON {
        return 1;
    }

    let count = (space / per_repetition).floor();
    let limit = config.max_repeat_count.max(1) as f32;
    let repetitions = count.clamp(1.0, limit) as usize;

    trace!(
        %axis,
        repetitions,
        available,
        per_repetition,
        "auto-repeat resolved"
    );
    repetitions
}

/// Sizing functions for every track of the final grid.
///
/// `explicit` covers the template tracks; explicit tracks beyond it (from
/// `grid-template-areas`) and trailing implicit tracks cycle `pattern`
/// forwards, leading implicit tracks cycle it backwards.
pub fn assemble_track_sizes(
    explicit: &[TrackSize],
    pattern: &[TrackSize],
    leading: usize,
    total: usize,
) -> Vec<TrackSize> {
    let pattern: &[TrackSize] = if pattern.is_empty() {
        &[TrackSize::Auto]
    } else {
        pattern
    };
    let n = pattern.len();

    let mut sizes = Vec::with_capacity(total);
    for j in 0..leading.min(total) {
        let k = leading - j;
        sizes.push(pattern[(n - 1) - ((k - 1) % n)]);
    }
    sizes.extend(explicit.iter().copied().take(total - sizes.len()));

    let mut forward = 0;
    while sizes.len() < total {
        sizes.push(pattern[forward % n]);
        forward += 1;
    }
    sizes
}

// ==================== Track Sizing ====================

/// A sized track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Track {
    /// Offset from the content-box start.
    pub offset: f32,
    /// Used size.
    pub size: f32,
    /// Empty `auto-fit` track collapsed to zero (no gaps on either side).
    pub collapsed: bool,
}

impl Track {
    pub fn end(&self) -> f32 {
        self.offset + self.size
    }
}

/// One item's footprint on the axis being sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisItem {
    /// Index of the item in the container's item list.
    pub index: usize,
    pub span: TrackSpan,
    /// Size of the item's area on the other axis, when already known.
    pub cross_size: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MinKind {
    Fixed,
    MinContent,
    MaxContent,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MaxKind {
    Fixed,
    MinContent,
    MaxContent,
    Auto,
    FitContent(f32),
    Flex(f32),
}

#[derive(Debug, Clone)]
struct SizingTrack {
    min: MinKind,
    max: MaxKind,
    base: f32,
    /// Infinite until an item contributes (or always, for flex tracks).
    growth: f32,
    collapsed: bool,
}

impl SizingTrack {
    fn new(size: &TrackSize, basis: Option<f32>, collapsed: bool) -> Self {
        if collapsed {
            return Self {
                min: MinKind::Fixed,
                max: MaxKind::Fixed,
                base: 0.0,
                growth: 0.0,
                collapsed,
            };
        }

        let (min, base) = match size.min_breadth() {
            TrackBreadth::Px(px) => (MinKind::Fixed, px),
            TrackBreadth::Percent(pct) => (MinKind::Fixed, basis.map_or(0.0, |b| b * pct / 100.0)),
            TrackBreadth::MinContent => (MinKind::MinContent, 0.0),
            TrackBreadth::MaxContent => (MinKind::MaxContent, 0.0),
            TrackBreadth::Auto | TrackBreadth::Fr(_) => (MinKind::Auto, 0.0),
        };

        let (max, growth) = match (size.max_breadth(), size.fit_content_limit()) {
            (TrackBreadth::Px(px), _) => (MaxKind::Fixed, px),
            (TrackBreadth::Percent(pct), _) => (MaxKind::Fixed, basis.map_or(0.0, |b| b * pct / 100.0)),
            (TrackBreadth::Fr(fr), _) => (MaxKind::Flex(fr), f32::INFINITY),
            (TrackBreadth::MinContent, _) => (MaxKind::MinContent, f32::INFINITY),
            (TrackBreadth::MaxContent, Some(limit)) => (
                MaxKind::FitContent(limit.resolve(basis).unwrap_or(f32::INFINITY)),
                f32::INFINITY,
            ),
            (TrackBreadth::MaxContent, None) => (MaxKind::MaxContent, f32::INFINITY),
            (TrackBreadth::Auto, _) => (MaxKind::Auto, f32::INFINITY),
        };

        Self {
            min,
            max,
            base,
            growth: growth.max(base),
            collapsed,
        }
    }

    fn is_flex(&self) -> bool {
        matches!(self.max, MaxKind::Flex(_))
    }

    fn flex_factor(&self) -> f32 {
        match self.max {
            MaxKind::Flex(fr) => fr,
            _ => 0.0,
        }
    }

    fn has_intrinsic_min(&self) -> bool {
        matches!(self.min, MinKind::MinContent | MinKind::MaxContent | MinKind::Auto)
    }

    fn has_intrinsic_max(&self) -> bool {
        matches!(
            self.max,
            MaxKind::MinContent | MaxKind::MaxContent | MaxKind::Auto | MaxKind::FitContent(_)
        )
    }

    /// Growth limit for planning, with "no contribution yet" read as the base.
    fn planned_growth(&self) -> f32 {
        if self.growth.is_finite() {
            self.growth
        } else {
            self.base
        }
    }

    fn raise_growth(&mut self, value: f32) {
        self.growth = if self.growth.is_finite() {
            self.growth.max(value)
        } else {
            value
        };
    }

    fn clamp_growth(&mut self) {
        if self.growth.is_finite() && self.growth < self.base {
            self.growth = self.base;
        }
    }
}

/// Share `amount` over targets in proportion to `weights` (equally when the
/// weights are all zero), never giving a target more than its cap. Capped
/// targets freeze and the rest is redistributed. With `spill`, whatever is
/// left once every target is frozen is shared equally past the caps.
fn distribute(amount: f32, weights: &[f32], caps: &[f32], spill: bool) -> Vec<f32> {
    let n = weights.len();
    let mut shares = vec![0.0; n];
    if n == 0 {
        return shares;
    }
    let mut frozen = vec![false; n];
    let mut remaining = amount;

    while remaining > EPSILON {
        let active: Vec<usize> = (0..n).filter(|&i| !frozen[i]).collect();
        if active.is_empty() {
            break;
        }
        let total_weight: f32 = active.iter().map(|&i| weights[i]).sum();
        let portions: Vec<(usize, f32)> = active
            .iter()
            .map(|&i| {
                let portion = if total_weight > EPSILON {
                    remaining * weights[i] / total_weight
                } else {
                    remaining / active.len() as f32
                };
                (i, portion)
            })
            .collect();

        let over: Vec<usize> = portions
            .iter()
            .filter(|(i, portion)| *portion >= caps[*i] - shares[*i])
            .map(|(i, _)| *i)
            .collect();

        if over.is_empty() {
            for (i, portion) in portions {
                shares[i] += portion;
            }
            remaining = 0.0;
            break;
        }

        for i in over {
            let room = (caps[i] - shares[i]).max(0.0);
            shares[i] += room;
            remaining -= room;
            frozen[i] = true;
        }
    }

    if spill && remaining > EPSILON {
        let each = remaining / n as f32;
        for share in &mut shares {
            *share += each;
        }
    }
    shares
}

/// The track sizing algorithm for one axis.
pub struct TrackSizingAlgorithm {
    axis: Axis,
    available: Option<f32>,
    gap: f32,
    max_passes: u32,
}

impl TrackSizingAlgorithm {
    pub fn new(axis: Axis, available: Option<f32>, gap: f32, config: &GridConfig) -> Self {
        Self {
            axis,
            available: available.filter(|size| size.is_finite()).map(|size| size.max(0.0)),
            gap: gap.max(0.0),
            max_passes: config.max_intrinsic_passes,
        }
    }

    /// Size `sizes.len()` tracks. `collapsed[i]` marks empty auto-fit tracks.
    pub fn run(
        &self,
        sizes: &[TrackSize],
        collapsed: &[bool],
        items: &[AxisItem],
        cache: &mut IntrinsicCache<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Track> {
        let mut tracks: Vec<SizingTrack> = sizes
            .iter()
            .enumerate()
            .map(|(i, size)| SizingTrack::new(size, self.available, collapsed.get(i).copied().unwrap_or(false)))
            .collect();
        if tracks.is_empty() {
            return Vec::new();
        }

        let items: Vec<AxisItem> = items
            .iter()
            .filter_map(|item| {
                let end = item.span.end.min(tracks.len());
                (item.span.start < end).then_some(AxisItem {
                    span: TrackSpan {
                        start: item.span.start,
                        end,
                    },
                    ..*item
                })
            })
            .collect();

        self.size_single_span_items(&mut tracks, &items, cache);
        self.size_spanning_items(&mut tracks, &items, cache, diagnostics);

        for track in tracks.iter_mut().filter(|t| !t.is_flex()) {
            if !track.growth.is_finite() {
                track.growth = track.base;
            }
        }

        self.maximize_tracks(&mut tracks);
        if tracks.iter().any(|t| !t.collapsed && t.is_flex()) {
            self.expand_flexible_tracks(&mut tracks);
        } else {
            self.stretch_auto_tracks(&mut tracks);
        }

        let result = self.position_tracks(&tracks);
        debug!(
            axis = %self.axis,
            tracks = result.len(),
            extent = result.last().map_or(0.0, Track::end),
            "Tracks sized"
        );
        result
    }

    fn gaps_total(&self, tracks: &[SizingTrack]) -> f32 {
        let visible = tracks.iter().filter(|t| !t.collapsed).count();
        visible.saturating_sub(1) as f32 * self.gap
    }

    fn free_space(&self, tracks: &[SizingTrack]) -> Option<f32> {
        let used: f32 = tracks.iter().map(|t| t.base).sum();
        self.available.map(|available| available - used - self.gaps_total(tracks))
    }

    fn size_single_span_items(
        &self,
        tracks: &mut [SizingTrack],
        items: &[AxisItem],
        cache: &mut IntrinsicCache<'_>,
    ) {
        for item in items.iter().filter(|item| item.span.len() == 1) {
            let track = &mut tracks[item.span.start];
            if track.collapsed {
                continue;
            }

            match track.min {
                MinKind::MinContent | MinKind::Auto => {
                    track.base = track.base.max(cache.min_content(item.index, self.axis, item.cross_size));
                }
                MinKind::MaxContent => {
                    track.base = track.base.max(cache.max_content(item.index, self.axis, item.cross_size));
                }
                MinKind::Fixed => {}
            }

            match track.max {
                MaxKind::MinContent => {
                    track.raise_growth(cache.min_content(item.index, self.axis, item.cross_size));
                }
                MaxKind::MaxContent | MaxKind::Auto => {
                    track.raise_growth(cache.max_content(item.index, self.axis, item.cross_size));
                }
                MaxKind::FitContent(limit) => {
                    let max_content = cache.max_content(item.index, self.axis, item.cross_size);
                    track.raise_growth(max_content.min(limit));
                }
                MaxKind::Fixed | MaxKind::Flex(_) => {}
            }
            track.clamp_growth();
        }
    }

    fn size_spanning_items(
        &self,
        tracks: &mut [SizingTrack],
        items: &[AxisItem],
        cache: &mut IntrinsicCache<'_>,
        diagnostics: &mut Diagnostics,
    ) {
        let mut spanning: Vec<&AxisItem> = items.iter().filter(|item| item.span.len() > 1).collect();
        if spanning.is_empty() {
            return;
        }
        spanning.sort_by_key(|item| item.span.len());

        let mut settled = false;
        for pass in 0..self.max_passes {
            let mut changed = false;
            for item in &spanning {
                let min_content = cache.min_content(item.index, self.axis, item.cross_size);
                changed |= self.grow_base_sizes(tracks, item.span, min_content);
                let max_content = cache.max_content(item.index, self.axis, item.cross_size);
                changed |= self.grow_limits(tracks, item.span, max_content);
            }
            trace!(axis = %self.axis, pass, changed, "spanning items pass");
            if !changed {
                settled = true;
                break;
            }
        }

        if !settled {
            diagnostics.push(Diagnostic::IntrinsicSizingUnsettled {
                axis: self.axis,
                passes: self.max_passes,
            });
        }
    }

    /// Raise base sizes of the spanned intrinsic-min tracks so they hold
    /// `contribution`. Returns whether anything grew.
    fn grow_base_sizes(&self, tracks: &mut [SizingTrack], span: TrackSpan, contribution: f32) -> bool {
        let spanned: Vec<usize> = span.range().filter(|&i| !tracks[i].collapsed).collect();
        if spanned.is_empty() {
            return false;
        }
        let crosses_flex = spanned.iter().any(|&i| tracks[i].is_flex());
        let targets: Vec<usize> = spanned
            .iter()
            .copied()
            .filter(|&i| tracks[i].has_intrinsic_min() && (!crosses_flex || tracks[i].is_flex()))
            .collect();
        if targets.is_empty() {
            return false;
        }

        let interior_gaps = (spanned.len() - 1) as f32 * self.gap;
        let current: f32 = spanned.iter().map(|&i| tracks[i].base).sum::<f32>() + interior_gaps;
        let excess = contribution - current;
        if excess <= EPSILON {
            return false;
        }

        let weights: Vec<f32> = targets.iter().map(|&i| tracks[i].base).collect();
        let caps: Vec<f32> = targets
            .iter()
            .map(|&i| {
                let track = &tracks[i];
                if track.growth.is_finite() {
                    (track.growth - track.base).max(0.0)
                } else {
                    f32::INFINITY
                }
            })
            .collect();

        let shares = distribute(excess, &weights, &caps, true);
        for (&i, share) in targets.iter().zip(shares) {
            tracks[i].base += share;
            tracks[i].clamp_growth();
        }
        true
    }

    /// Raise growth limits of the spanned intrinsic-max tracks so they hold
    /// `contribution`. Returns whether anything changed.
    fn grow_limits(&self, tracks: &mut [SizingTrack], span: TrackSpan, contribution: f32) -> bool {
        let spanned: Vec<usize> = span.range().filter(|&i| !tracks[i].collapsed).collect();
        if spanned.is_empty() || spanned.iter().any(|&i| tracks[i].is_flex()) {
            return false;
        }
        let targets: Vec<usize> = spanned
            .iter()
            .copied()
            .filter(|&i| tracks[i].has_intrinsic_max())
            .collect();
        if targets.is_empty() {
            return false;
        }

        let interior_gaps = (spanned.len() - 1) as f32 * self.gap;
        let current: f32 = spanned.iter().map(|&i| tracks[i].planned_growth()).sum::<f32>() + interior_gaps;
        let excess = (contribution - current).max(0.0);

        let weights: Vec<f32> = targets.iter().map(|&i| tracks[i].planned_growth()).collect();
        let caps: Vec<f32> = targets
            .iter()
            .map(|&i| match tracks[i].max {
                MaxKind::FitContent(limit) => (limit - tracks[i].planned_growth()).max(0.0),
                _ => f32::INFINITY,
            })
            .collect();
        let shares = distribute(excess, &weights, &caps, false);

        let mut changed = false;
        for (&i, share) in targets.iter().zip(shares) {
            let track = &mut tracks[i];
            let grown = track.planned_growth() + share;
            if !track.growth.is_finite() || grown > track.growth + EPSILON {
                track.growth = grown;
                changed = true;
            }
            track.clamp_growth();
        }
        changed
    }

    /// Grow non-flexible tracks toward their growth limits with the free space.
    /// An indefinite container has unlimited free space.
    fn maximize_tracks(&self, tracks: &mut [SizingTrack]) {
        let Some(free) = self.free_space(tracks) else {
            for track in tracks.iter_mut().filter(|t| !t.collapsed && !t.is_flex()) {
                track.base = track.base.max(track.growth);
            }
            return;
        };
        if free <= EPSILON {
            return;
        }

        let targets: Vec<usize> = (0..tracks.len())
            .filter(|&i| !tracks[i].collapsed && !tracks[i].is_flex() && tracks[i].growth > tracks[i].base)
            .collect();
        if targets.is_empty() {
            return;
        }

        let weights = vec![1.0; targets.len()];
        let caps: Vec<f32> = targets.iter().map(|&i| tracks[i].growth - tracks[i].base).collect();
        for (&i, share) in targets.iter().zip(distribute(free, &weights, &caps, false)) {
            tracks[i].base += share;
        }
    }

    /// Size `fr` tracks from the leftover space. Tracks whose base already
    /// exceeds their share are treated as inflexible.
    fn expand_flexible_tracks(&self, tracks: &mut [SizingTrack]) {
        let Some(available) = self.available else {
            return;
        };
        let gaps = self.gaps_total(tracks);
        let mut flexible: Vec<usize> = (0..tracks.len())
            .filter(|&i| !tracks[i].collapsed && tracks[i].is_flex())
            .collect();

        let fr_size = loop {
            let inflexible: f32 = (0..tracks.len())
                .filter(|i| !flexible.contains(i))
                .map(|i| tracks[i].base)
                .sum();
            let space = available - gaps - inflexible;
            let flex_sum: f32 = flexible.iter().map(|&i| tracks[i].flex_factor()).sum();
            let hypothetical = space / flex_sum.max(1.0);

            let before = flexible.len();
            flexible.retain(|&i| tracks[i].base <= hypothetical * tracks[i].flex_factor() + EPSILON);
            if flexible.len() == before {
                break hypothetical;
            }
        };

        trace!(axis = %self.axis, fr_size, "flexible track size");
        for i in flexible {
            let track = &mut tracks[i];
            track.base = track.base.max(fr_size * track.flex_factor());
        }
    }

    /// Without flexible tracks, leftover space goes to `auto` tracks equally.
    fn stretch_auto_tracks(&self, tracks: &mut [SizingTrack]) {
        let Some(free) = self.free_space(tracks) else {
            return;
        };
        if free <= EPSILON {
            return;
        }
        let auto: Vec<usize> = (0..tracks.len())
            .filter(|&i| !tracks[i].collapsed && tracks[i].max == MaxKind::Auto)
            .collect();
        if auto.is_empty() {
            return;
        }
        let each = free / auto.len() as f32;
        for i in auto {
            tracks[i].base += each;
        }
    }

    /// Offsets, with a gap between each pair of adjacent non-collapsed tracks.
    fn position_tracks(&self, tracks: &[SizingTrack]) -> Vec<Track> {
        let mut position = 0.0;
        let mut seen_visible = false;
        tracks
            .iter()
            .enumerate()
            .map(|(i, track)| {
                if !track.collapsed {
                    if seen_visible {
                        position += self.gap;
                    }
                    seen_visible = true;
                }
                let size = if track.collapsed { 0.0 } else { track.base };
                let offset = position;
                position += size;
                trace!(axis = %self.axis, track = i, offset, size, "track positioned");
                Track {
                    offset,
                    size,
                    collapsed: track.collapsed,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intrinsic::{IntrinsicSizer, IntrinsicSizingMode};
    use crate::style::{FontContext, LengthPercentage};
    use crate::template::{TemplateParser, TemplateProperty};

    /// Items with fixed (min, max) content sizes on every axis.
    struct FixedSizer(Vec<(f32, f32)>);

    impl IntrinsicSizer for FixedSizer {
        fn intrinsic_size(&self, item: usize, _axis: Axis, mode: IntrinsicSizingMode, _cross: Option<f32>) -> f32 {
            let (min, max) = self.0[item];
            match mode {
                IntrinsicSizingMode::MinContent => min,
                IntrinsicSizingMode::MaxContent => max,
            }
        }
    }

    fn item(index: usize, start: usize, span: usize) -> AxisItem {
        AxisItem {
            index,
            span: TrackSpan::new(start, span),
            cross_size: None,
        }
    }

    fn size_with(
        sizes: &[TrackSize],
        collapsed: &[bool],
        available: Option<f32>,
        gap: f32,
        items: &[AxisItem],
        contents: Vec<(f32, f32)>,
    ) -> Vec<Track> {
        let sizer = FixedSizer(contents);
        let mut cache = IntrinsicCache::new(&sizer);
        let mut diagnostics = Diagnostics::new();
        TrackSizingAlgorithm::new(Axis::Horizontal, available, gap, &GridConfig::default()).run(
            sizes,
            collapsed,
            items,
            &mut cache,
            &mut diagnostics,
        )
    }

    fn size(sizes: &[TrackSize], available: Option<f32>, items: &[AxisItem], contents: Vec<(f32, f32)>) -> Vec<f32> {
        size_with(sizes, &[], available, 0.0, items, contents)
            .iter()
            .map(|t| t.size)
            .collect()
    }

    #[test]
    fn test_track_sizing_with_fixed() {
        let tracks = size_with(
            &[TrackSize::Px(100.0), TrackSize::Px(200.0)],
            &[],
            Some(500.0),
            10.0,
            &[],
            vec![],
        );
        assert_eq!(tracks[0].offset, 0.0);
        assert_eq!(tracks[0].size, 100.0);
        assert_eq!(tracks[1].offset, 110.0);
        assert_eq!(tracks[1].size, 200.0);
    }

    #[test]
    fn test_equal_fr_tracks() {
        let sizes = size(&[TrackSize::Fr(1.0); 3], Some(300.0), &[], vec![]);
        assert_eq!(sizes, vec![100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_fr_tracks_with_gap_and_fixed() {
        let tracks = size_with(
            &[TrackSize::Px(100.0), TrackSize::Fr(1.0), TrackSize::Fr(3.0)],
            &[],
            Some(520.0),
            10.0,
            &[],
            vec![],
        );
        // 520 - 100 - 2 * 10 = 400 shared 1:3
        assert_eq!(tracks[1].size, 100.0);
        assert_eq!(tracks[2].size, 300.0);
        assert_eq!(tracks[2].offset, 220.0);
    }

    #[test]
    fn test_fr_sum_below_one() {
        let sizes = size(&[TrackSize::Fr(0.5)], Some(100.0), &[], vec![]);
        assert_eq!(sizes, vec![50.0]);
    }

    #[test]
    fn test_fr_track_with_large_content_becomes_inflexible() {
        let sizes = size(
            &[TrackSize::Fr(1.0), TrackSize::Fr(1.0)],
            Some(100.0),
            &[item(0, 0, 1)],
            vec![(80.0, 90.0)],
        );
        assert_eq!(sizes, vec![80.0, 20.0]);
    }

    #[test]
    fn test_fr_indefinite_stays_at_base() {
        let sizes = size(&[TrackSize::Fr(1.0)], None, &[item(0, 0, 1)], vec![(15.0, 40.0)]);
        assert_eq!(sizes, vec![15.0]);
    }

    #[test]
    fn test_auto_tracks_grow_then_stretch() {
        let sizes = size(
            &[TrackSize::Auto, TrackSize::Px(50.0)],
            Some(200.0),
            &[item(0, 0, 1)],
            vec![(30.0, 60.0)],
        );
        assert_eq!(sizes, vec![150.0, 50.0]);
    }

    #[test]
    fn test_auto_track_indefinite_uses_max_content() {
        let sizes = size(&[TrackSize::Auto], None, &[item(0, 0, 1)], vec![(30.0, 60.0)]);
        assert_eq!(sizes, vec![60.0]);
    }

    #[test]
    fn test_min_and_max_content_tracks() {
        let sizes = size(
            &[TrackSize::MinContent, TrackSize::MaxContent],
            Some(1000.0),
            &[item(0, 0, 1), item(1, 1, 1)],
            vec![(40.0, 100.0), (40.0, 100.0)],
        );
        assert_eq!(sizes, vec![40.0, 100.0]);
    }

    #[test]
    fn test_fit_content_clamps_at_limit() {
        let sizes = size(
            &[TrackSize::FitContent(LengthPercentage::Px(50.0))],
            Some(500.0),
            &[item(0, 0, 1)],
            vec![(20.0, 100.0)],
        );
        assert_eq!(sizes, vec![50.0]);

        let sizes = size(
            &[TrackSize::FitContent(LengthPercentage::Px(50.0))],
            Some(500.0),
            &[item(0, 0, 1)],
            vec![(20.0, 30.0)],
        );
        assert_eq!(sizes, vec![30.0]);
    }

    #[test]
    fn test_minmax_fixed_bounds() {
        let sizes = size(
            &[TrackSize::MinMax(TrackBreadth::Px(100.0), TrackBreadth::Px(150.0))],
            Some(400.0),
            &[],
            vec![],
        );
        assert_eq!(sizes, vec![150.0]);

        let sizes = size(
            &[TrackSize::MinMax(TrackBreadth::Px(100.0), TrackBreadth::Fr(1.0))],
            Some(60.0),
            &[],
            vec![],
        );
        // Flexible track never shrinks below its fixed minimum.
        assert_eq!(sizes, vec![100.0]);
    }

    #[test]
    fn test_percentage_tracks() {
        let sizes = size(&[TrackSize::Percent(25.0), TrackSize::Percent(50.0)], Some(400.0), &[], vec![]);
        assert_eq!(sizes, vec![100.0, 200.0]);

        // Indefinite: both bounds resolve to 0, content cannot grow the track.
        let sizes = size(&[TrackSize::Percent(25.0)], None, &[item(0, 0, 1)], vec![(10.0, 35.0)]);
        assert_eq!(sizes, vec![0.0]);
    }

    #[test]
    fn test_spanning_item_distributes_proportionally() {
        // Excess 40 split 30:10 by base size; no free space is left to grow into.
        let sizes = size(
            &[TrackSize::Auto, TrackSize::Auto],
            Some(80.0),
            &[item(0, 0, 1), item(1, 1, 1), item(2, 0, 2)],
            vec![(30.0, 200.0), (10.0, 200.0), (80.0, 80.0)],
        );
        assert_eq!(sizes, vec![60.0, 20.0]);

        // Indefinite: tracks grow to their growth limits.
        let sizes = size(
            &[TrackSize::Auto, TrackSize::Auto],
            None,
            &[item(0, 0, 1), item(1, 1, 1), item(2, 0, 2)],
            vec![(30.0, 200.0), (10.0, 200.0), (80.0, 80.0)],
        );
        assert_eq!(sizes, vec![200.0, 200.0]);

        // Both tracks are capped at min-content, so the excess is shared equally past the caps.
        let sizes = size(
            &[TrackSize::MinContent, TrackSize::MinContent],
            None,
            &[item(0, 0, 1), item(1, 1, 1), item(2, 0, 2)],
            vec![(30.0, 200.0), (10.0, 200.0), (80.0, 80.0)],
        );
        assert_eq!(sizes, vec![50.0, 30.0]);
    }

    #[test]
    fn test_spanning_item_respects_caps() {
        let sizes = size(
            &[
                TrackSize::MinMax(TrackBreadth::Auto, TrackBreadth::Px(20.0)),
                TrackSize::MinMax(TrackBreadth::Auto, TrackBreadth::MinContent),
            ],
            None,
            &[item(0, 0, 2)],
            vec![(100.0, 100.0)],
        );
        assert_eq!(sizes, vec![20.0, 80.0]);
    }

    #[test]
    fn test_spanning_item_includes_gaps() {
        let tracks = size_with(
            &[TrackSize::MinContent, TrackSize::MinContent],
            &[],
            None,
            20.0,
            &[item(0, 0, 2)],
            vec![(100.0, 100.0)],
        );
        assert_eq!(tracks[0].size + tracks[1].size, 80.0);
    }

    #[test]
    fn test_spanning_item_over_fixed_tracks_has_no_effect() {
        let sizes = size(
            &[TrackSize::Px(10.0), TrackSize::Px(10.0)],
            None,
            &[item(0, 0, 2)],
            vec![(100.0, 100.0)],
        );
        assert_eq!(sizes, vec![10.0, 10.0]);
    }

    #[test]
    fn test_unsettled_intrinsic_sizing_reported() {
        let sizer = FixedSizer(vec![(100.0, 100.0)]);
        let mut cache = IntrinsicCache::new(&sizer);
        let mut diagnostics = Diagnostics::new();
        let config = GridConfig {
            max_intrinsic_passes: 1,
            ..GridConfig::default()
        };
        TrackSizingAlgorithm::new(Axis::Vertical, None, 0.0, &config).run(
            &[TrackSize::Auto, TrackSize::Auto],
            &[],
            &[item(0, 0, 2)],
            &mut cache,
            &mut diagnostics,
        );
        assert!(matches!(
            diagnostics.iter().next(),
            Some(Diagnostic::IntrinsicSizingUnsettled { passes: 1, .. })
        ));
    }

    #[test]
    fn test_collapsed_tracks_drop_gaps() {
        let tracks = size_with(
            &[TrackSize::Px(100.0); 3],
            &[false, true, false],
            Some(500.0),
            10.0,
            &[],
            vec![],
        );
        assert_eq!(tracks[1].size, 0.0);
        assert!(tracks[1].collapsed);
        assert_eq!(tracks[1].offset, 100.0);
        assert_eq!(tracks[2].offset, 110.0);
        assert_eq!(tracks[2].end(), 210.0);
    }

    #[test]
    fn test_all_collapsed() {
        let tracks = size_with(&[TrackSize::Px(100.0); 2], &[true, true], Some(500.0), 10.0, &[], vec![]);
        assert!(tracks.iter().all(|t| t.size == 0.0 && t.offset == 0.0));
    }

    fn parse(value: &str) -> TrackDefinition {
        TemplateParser::new(FontContext::default(), &GridConfig::default())
            .parse_track_list(TemplateProperty::TemplateColumns, value)
            .value
    }

    fn expand(value: &str, available: Option<f32>, gap: f32) -> (ExpandedTracks, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_track_definition(
            &parse(value),
            available,
            gap,
            Axis::Horizontal,
            &GridConfig::default(),
            &mut diagnostics,
        );
        (expanded, diagnostics)
    }

    #[test]
    fn test_auto_fill_expansion_basic() {
        let (expanded, _) = expand("repeat(auto-fill, 100px)", Some(350.0), 0.0);
        assert_eq!(expanded.sizes.len(), 3);
        assert_eq!(expanded.line_names.len(), 4);
        assert!(expanded.auto_fit.is_none());
    }

    #[test]
    fn test_auto_fill_expansion_with_gap_and_fixed() {
        let (expanded, _) = expand("20px repeat(auto-fill, 100px)", Some(350.0), 10.0);
        // 20 + 3 * 100 + 3 gaps = 350
        assert_eq!(expanded.sizes.len(), 4);

        let (expanded, _) = expand("repeat(auto-fill, 100px 50px)", Some(340.0), 10.0);
        // Each repetition costs 150 plus two gaps.
        assert_eq!(expanded.sizes.len(), 4);
    }

    #[test]
    fn test_auto_fill_minmax_uses_min() {
        let (expanded, _) = expand("repeat(auto-fill, minmax(120px, 1fr))", Some(500.0), 0.0);
        assert_eq!(expanded.sizes.len(), 4);
    }

    #[test]
    fn test_auto_fill_minimum_one_repetition() {
        let (expanded, diagnostics) = expand("repeat(auto-fill, 500px)", Some(100.0), 0.0);
        assert_eq!(expanded.sizes.len(), 1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_auto_repeat_indefinite() {
        let (expanded, diagnostics) = expand("[a] 20px repeat(auto-fit, 100px 50px) [z]", None, 0.0);
        assert_eq!(expanded.sizes, vec![TrackSize::Px(20.0), TrackSize::Px(100.0)]);
        assert_eq!(expanded.line_names.len(), 3);
        assert_eq!(expanded.auto_fit, Some(TrackSpan { start: 1, end: 2 }));
        assert!(matches!(
            diagnostics.iter().next(),
            Some(Diagnostic::AutoRepeatIndefinite { axis: Axis::Horizontal })
        ));
    }

    #[test]
    fn test_auto_fit_span_and_names() {
        let (expanded, _) = expand("[a] 10px [b] repeat(auto-fit, 100px) [c]", Some(330.0), 0.0);
        assert_eq!(expanded.sizes.len(), 4);
        assert_eq!(expanded.auto_fit, Some(TrackSpan { start: 1, end: 4 }));
        assert_eq!(expanded.line_names[0], vec![LineName::new("a")]);
        assert_eq!(expanded.line_names[1], vec![LineName::new("b")]);
        assert!(expanded.line_names[2].is_empty());
        assert_eq!(expanded.line_names[4], vec![LineName::new("c")]);
    }

    #[test]
    fn test_assemble_track_sizes() {
        let a = TrackSize::Px(1.0);
        let b = TrackSize::Px(2.0);
        let c = TrackSize::Px(3.0);
        let explicit = TrackSize::Fr(1.0);

        let sizes = assemble_track_sizes(&[explicit], &[a, b, c], 4, 9);
        assert_eq!(sizes, vec![c, a, b, c, explicit, a, b, c, a]);

        let sizes = assemble_track_sizes(&[], &[], 1, 2);
        assert_eq!(sizes, vec![TrackSize::Auto, TrackSize::Auto]);
    }
}
