//! # Grid templates
//!
//! Parsing of the grid-specific sub-grammars the cascade hands over as raw
//! strings:
//!
//! - `grid-template-columns` / `grid-template-rows` into a [`TrackDefinition`]
//! - `grid-auto-columns` / `grid-auto-rows` into an implicit track pattern
//! - `grid-template-areas` into an [`AreaGrid`]
//!
//! `repeat(N, ...)` is expanded here. `repeat(auto-fill | auto-fit, ...)` is
//! kept as a single deferred slot because the number of repetitions depends on
//! the available space, which is only known at sizing time.
//!
//! Parsing never fails outward: an invalid declaration yields the property's
//! initial value and a [`Diagnostic`].

use std::collections::BTreeMap;
use std::fmt;
use std::mem;

use thiserror::Error;
use tracing::trace;

use crate::diagnostics::Diagnostic;
use crate::lines::is_custom_ident;
use crate::style::{Axis, FontContext, GridConfig, LengthPercentage};

/// Errors produced by the template and grid-line grammars.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("invalid track size {0:?}")]
    InvalidTrackSize(String),

    #[error("invalid repeat count {0:?}")]
    InvalidRepeatCount(String),

    #[error("repeat() cannot be nested")]
    NestedRepeat,

    #[error("repeat() needs at least one track")]
    EmptyRepeat,

    #[error("only one auto-fill/auto-fit repeat is allowed")]
    MultipleAutoRepeat,

    #[error("tracks next to an auto-repeat must have a fixed size")]
    AutoRepeatNotFixed,

    #[error("minmax() minimum cannot be flexible")]
    FlexibleMinimum,

    #[error("line names without any track")]
    NoTracks,

    #[error("invalid line name {0:?}")]
    InvalidLineName(String),

    #[error("unterminated area string")]
    UnterminatedString,

    #[error("expected a quoted area string at {0:?}")]
    InvalidAreaString(String),

    #[error("invalid area name {0:?}")]
    InvalidAreaName(String),

    #[error("area row {0} is empty")]
    EmptyAreaRow(usize),

    #[error("area row {row} has {found} cells, expected {expected}")]
    RaggedAreas {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("area {0:?} is not a rectangle")]
    NonRectangularArea(String),

    #[error("invalid grid line {0:?}")]
    InvalidGridLine(String),
}

/// Which property a template string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateProperty {
    TemplateColumns,
    TemplateRows,
    AutoColumns,
    AutoRows,
    TemplateAreas,
}

impl TemplateProperty {
    /// CSS property name.
    pub fn name(self) -> &'static str {
        match self {
            TemplateProperty::TemplateColumns => "grid-template-columns",
            TemplateProperty::TemplateRows => "grid-template-rows",
            TemplateProperty::AutoColumns => "grid-auto-columns",
            TemplateProperty::AutoRows => "grid-auto-rows",
            TemplateProperty::TemplateAreas => "grid-template-areas",
        }
    }

    /// The explicit template property for an axis.
    pub fn template(axis: Axis) -> Self {
        match axis {
            Axis::Horizontal => TemplateProperty::TemplateColumns,
            Axis::Vertical => TemplateProperty::TemplateRows,
        }
    }

    /// The implicit track property for an axis.
    pub fn auto(axis: Axis) -> Self {
        match axis {
            Axis::Horizontal => TemplateProperty::AutoColumns,
            Axis::Vertical => TemplateProperty::AutoRows,
        }
    }
}

// ==================== Track Sizes ====================

/// One bound of a track sizing function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackBreadth {
    /// Fixed length in pixels.
    Px(f32),
    /// Percentage of the container's content box.
    Percent(f32),
    /// Flexible factor (`fr`). Only valid as a maximum.
    Fr(f32),
    MinContent,
    MaxContent,
    Auto,
}

impl TrackBreadth {
    /// Check if this is a flexible breadth.
    pub fn is_flexible(self) -> bool {
        matches!(self, TrackBreadth::Fr(_))
    }

    /// Check if this breadth is sized from item content.
    pub fn is_intrinsic(self) -> bool {
        matches!(
            self,
            TrackBreadth::MinContent | TrackBreadth::MaxContent | TrackBreadth::Auto
        )
    }

    /// Definite size in pixels, if this breadth resolves without content.
    pub fn definite(self, basis: Option<f32>) -> Option<f32> {
        match self {
            TrackBreadth::Px(px) => Some(px),
            TrackBreadth::Percent(pct) => basis.map(|b| b * pct / 100.0),
            _ => None,
        }
    }

    fn is_fixed(self) -> bool {
        matches!(self, TrackBreadth::Px(_) | TrackBreadth::Percent(_))
    }
}

/// A grid track sizing function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackSize {
    /// Fixed length in pixels.
    Px(f32),
    /// Percentage of container.
    Percent(f32),
    /// Fractional unit (flexible).
    Fr(f32),
    /// Size based on content minimum.
    MinContent,
    /// Size based on content maximum.
    MaxContent,
    /// Auto sizing.
    Auto,
    /// Minimum/maximum constraint.
    MinMax(TrackBreadth, TrackBreadth),
    /// `fit-content(limit)`.
    FitContent(LengthPercentage),
}

impl Default for TrackSize {
    fn default() -> Self {
        TrackSize::Auto
    }
}

impl From<TrackBreadth> for TrackSize {
    fn from(breadth: TrackBreadth) -> Self {
        match breadth {
            TrackBreadth::Px(px) => TrackSize::Px(px),
            TrackBreadth::Percent(pct) => TrackSize::Percent(pct),
            TrackBreadth::Fr(fr) => TrackSize::Fr(fr),
            TrackBreadth::MinContent => TrackSize::MinContent,
            TrackBreadth::MaxContent => TrackSize::MaxContent,
            TrackBreadth::Auto => TrackSize::Auto,
        }
    }
}

impl TrackSize {
    /// Create a minmax constraint.
    pub fn minmax(min: TrackBreadth, max: TrackBreadth) -> Self {
        TrackSize::MinMax(min, max)
    }

    /// The minimum track sizing function. A bare `fr` has an `auto` minimum.
    pub fn min_breadth(&self) -> TrackBreadth {
        match *self {
            TrackSize::Px(px) => TrackBreadth::Px(px),
            TrackSize::Percent(pct) => TrackBreadth::Percent(pct),
            TrackSize::MinContent => TrackBreadth::MinContent,
            TrackSize::MaxContent => TrackBreadth::MaxContent,
            TrackSize::MinMax(min, _) => min,
            TrackSize::Fr(_) | TrackSize::Auto | TrackSize::FitContent(_) => TrackBreadth::Auto,
        }
    }

    /// The maximum track sizing function. `fit-content()` reports
    /// `max-content`; its limit is available from [`Self::fit_content_limit`].
    pub fn max_breadth(&self) -> TrackBreadth {
        match *self {
            TrackSize::Px(px) => TrackBreadth::Px(px),
            TrackSize::Percent(pct) => TrackBreadth::Percent(pct),
            TrackSize::Fr(fr) => TrackBreadth::Fr(fr),
            TrackSize::MinContent => TrackBreadth::MinContent,
            TrackSize::MaxContent | TrackSize::FitContent(_) => TrackBreadth::MaxContent,
            TrackSize::Auto => TrackBreadth::Auto,
            TrackSize::MinMax(_, max) => max,
        }
    }

    /// Check if this is a flexible track (contains fr units).
    pub fn is_flexible(&self) -> bool {
        self.max_breadth().is_flexible()
    }

    /// The `fit-content()` limit, if any.
    pub fn fit_content_limit(&self) -> Option<LengthPercentage> {
        match *self {
            TrackSize::FitContent(limit) => Some(limit),
            _ => None,
        }
    }

    /// Whether the track has a definite min or max breadth, as required next
    /// to an auto-repeat.
    pub fn has_fixed_breadth(&self) -> bool {
        match *self {
            TrackSize::Px(_) | TrackSize::Percent(_) => true,
            TrackSize::MinMax(min, max) => min.is_fixed() || (max.is_fixed() && !min.is_flexible()),
            _ => false,
        }
    }

    /// Size used to count auto-repeat repetitions: the max breadth when it is
    /// definite, otherwise the min breadth.
    pub fn repeat_basis(&self, basis: Option<f32>) -> f32 {
        self.max_breadth()
            .definite(basis)
            .or_else(|| self.min_breadth().definite(basis))
            .unwrap_or(0.0)
    }
}

// ==================== Track Definitions ====================

/// A line name. Copies produced by `repeat(N, ...)` carry their occurrence so
/// that successive duplicates read `foo`, `foo 2`, `foo 3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineName {
    pub ident: String,
    pub occurrence: u32,
}

impl LineName {
    pub fn new(ident: impl Into<String>) -> Self {
        Self::with_occurrence(ident, 1)
    }

    pub fn with_occurrence(ident: impl Into<String>, occurrence: u32) -> Self {
        Self {
            ident: ident.into(),
            occurrence,
        }
    }
}

impl fmt::Display for LineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.occurrence > 1 {
            write!(f, "{} {}", self.ident, self.occurrence)
        } else {
            f.write_str(&self.ident)
        }
    }
}

/// `auto-fill` vs `auto-fit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    /// As many repetitions as fit.
    AutoFill,
    /// As many as fit, collapsing the ones left empty.
    AutoFit,
}

/// A deferred `repeat(auto-fill | auto-fit, ...)` group.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoRepeat {
    pub mode: RepeatMode,
    pub tracks: Vec<TrackSize>,
}

/// What a slot contributes to the track list.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotSizing {
    Track(TrackSize),
    AutoRepeat(AutoRepeat),
}

/// A track slot with the line names attached just before it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSlot {
    pub line_names: Vec<LineName>,
    pub sizing: SlotSizing,
}

/// A parsed `grid-template-columns` / `grid-template-rows` value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackDefinition {
    /// Track slots in order, `repeat(N, ...)` already expanded.
    pub slots: Vec<TrackSlot>,
    /// Line names after the last slot.
    pub trailing_names: Vec<LineName>,
}

impl TrackDefinition {
    /// Create an empty template (no explicit tracks).
    pub fn none() -> Self {
        Self::default()
    }

    /// Create from a list of track sizes.
    pub fn from_sizes(sizes: impl IntoIterator<Item = TrackSize>) -> Self {
        Self {
            slots: sizes
                .into_iter()
                .map(|size| TrackSlot {
                    line_names: Vec::new(),
                    sizing: SlotSizing::Track(size),
                })
                .collect(),
            trailing_names: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The auto-repeat group, if the list has one.
    pub fn auto_repeat(&self) -> Option<&AutoRepeat> {
        self.slots.iter().find_map(|slot| match &slot.sizing {
            SlotSizing::AutoRepeat(repeat) => Some(repeat),
            SlotSizing::Track(_) => None,
        })
    }

    /// Sizes of the slots that are not an auto-repeat.
    pub fn fixed_tracks(&self) -> impl Iterator<Item = &TrackSize> {
        self.slots.iter().filter_map(|slot| match &slot.sizing {
            SlotSizing::Track(size) => Some(size),
            SlotSizing::AutoRepeat(_) => None,
        })
    }
}

// ==================== Template Areas ====================

/// Named grid area, as 1-based lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridArea {
    pub name: String,
    pub row_start: usize,
    pub row_end: usize,
    pub column_start: usize,
    pub column_end: usize,
}

/// A validated `grid-template-areas` value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaGrid {
    /// Cells row by row; `None` is a null (`.`) cell.
    pub rows: Vec<Vec<Option<String>>>,
    /// Named areas in order of first appearance.
    pub areas: Vec<GridArea>,
}

impl AreaGrid {
    /// Parse a `grid-template-areas` value. `none` and the empty string give
    /// `Ok(None)`.
    pub fn parse(value: &str) -> Result<Option<Self>, TemplateError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(None);
        }

        let mut rows = Vec::new();
        let mut rest = trimmed;
        loop {
            rest = rest.trim_start();
            let Some(quote) = rest.chars().next() else {
                break;
            };
            if quote != '"' && quote != '\'' {
                return Err(TemplateError::InvalidAreaString(rest.to_string()));
            }
            let body = &rest[1..];
            let close = body.find(quote).ok_or(TemplateError::UnterminatedString)?;
            rows.push(Self::parse_row(&body[..close], rows.len() + 1)?);
            rest = &body[close + 1..];
        }

        let expected = rows[0].len();
        for (index, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(TemplateError::RaggedAreas {
                    row: index + 1,
                    found: row.len(),
                    expected,
                });
            }
        }

        let areas = Self::collect_areas(&rows)?;
        Ok(Some(Self { rows, areas }))
    }

    fn parse_row(row: &str, number: usize) -> Result<Vec<Option<String>>, TemplateError> {
        let cells = row
            .split_whitespace()
            .map(|token| {
                if token.chars().all(|c| c == '.') {
                    Ok(None)
                } else if is_custom_ident(token) {
                    Ok(Some(token.to_string()))
                } else {
                    Err(TemplateError::InvalidAreaName(token.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if cells.is_empty() {
            return Err(TemplateError::EmptyAreaRow(number));
        }
        Ok(cells)
    }

    fn collect_areas(rows: &[Vec<Option<String>>]) -> Result<Vec<GridArea>, TemplateError> {
        // (row_min, row_max, col_min, col_max, cells)
        let mut bounds: BTreeMap<&str, (usize, usize, usize, usize, usize)> = BTreeMap::new();
        let mut order = Vec::new();

        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let Some(name) = cell.as_deref() else {
                    continue;
                };
                let entry = bounds.entry(name).or_insert_with(|| {
                    order.push(name);
                    (r, r, c, c, 0)
                });
                entry.0 = entry.0.min(r);
                entry.1 = entry.1.max(r);
                entry.2 = entry.2.min(c);
                entry.3 = entry.3.max(c);
                entry.4 += 1;
            }
        }

        order
            .into_iter()
            .map(|name| {
                let (row_min, row_max, col_min, col_max, cells) = bounds[name];
                if cells != (row_max - row_min + 1) * (col_max - col_min + 1) {
                    return Err(TemplateError::NonRectangularArea(name.to_string()));
                }
                Ok(GridArea {
                    name: name.to_string(),
                    row_start: row_min + 1,
                    row_end: row_max + 2,
                    column_start: col_min + 1,
                    column_end: col_max + 2,
                })
            })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Number of tracks the areas cover along an axis.
    pub fn track_count(&self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.column_count(),
            Axis::Vertical => self.row_count(),
        }
    }

    /// Get area by name.
    pub fn get_area(&self, name: &str) -> Option<&GridArea> {
        self.areas.iter().find(|a| a.name == name)
    }
}

// ==================== Parser ====================

/// A parse result together with the diagnostics produced on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    OpenBracket,
    CloseBracket,
    /// A function name; the opening parenthesis is consumed with it.
    Function(&'a str),
    CloseParen,
    Comma,
    Word(&'a str),
}

impl Token<'_> {
    fn describe(&self) -> String {
        match self {
            Token::OpenBracket => "'['".to_string(),
            Token::CloseBracket => "']'".to_string(),
            Token::Function(name) => format!("function {}()", name),
            Token::CloseParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Word(word) => format!("{:?}", word),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let single = match c {
            '[' => Some(Token::OpenBracket),
            ']' => Some(Token::CloseBracket),
            ')' => Some(Token::CloseParen),
            ',' => Some(Token::Comma),
            '(' => return Err(TemplateError::UnexpectedToken("'('".to_string())),
            _ => None,
        };
        if c.is_whitespace() || single.is_some() {
            chars.next();
            tokens.extend(single);
            continue;
        }

        let mut end = input.len();
        let mut function = false;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || matches!(c, '[' | ']' | ')' | ',') {
                end = i;
                break;
            }
            chars.next();
            if c == '(' {
                end = i;
                function = true;
                break;
            }
        }
        let word = &input[start..end];
        tokens.push(if function {
            Token::Function(word)
        } else {
            Token::Word(word)
        });
    }

    Ok(tokens)
}

struct Cursor<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token<'a>) -> Result<(), TemplateError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(TemplateError::UnexpectedToken(token.describe())),
            None => Err(TemplateError::UnexpectedEnd),
        }
    }

    fn expect_word(&mut self) -> Result<&'a str, TemplateError> {
        match self.next() {
            Some(Token::Word(word)) => Ok(word),
            Some(token) => Err(TemplateError::UnexpectedToken(token.describe())),
            None => Err(TemplateError::UnexpectedEnd),
        }
    }
}

/// Tracks inside a `repeat()` with the raw names before each one.
struct RepeatGroup {
    tracks: Vec<(Vec<String>, TrackSize)>,
    trailing: Vec<String>,
}

enum Repeat {
    Count { count: u32, group: RepeatGroup },
    Auto(AutoRepeat),
}

fn push_name(names: &mut Vec<LineName>, name: LineName) {
    if !names.iter().any(|existing| existing.ident == name.ident) {
        names.push(name);
    }
}

/// Parser for the grid template sub-grammars.
#[derive(Debug, Clone)]
pub struct TemplateParser {
    font: FontContext,
    max_repeat_count: u32,
}

impl TemplateParser {
    pub fn new(font: FontContext, config: &GridConfig) -> Self {
        Self {
            font,
            max_repeat_count: config.max_repeat_count.max(1),
        }
    }

    /// Font reference sizes used for `em` / `rem`.
    pub fn font(&self) -> FontContext {
        self.font
    }

    /// Parse a track list. Invalid input gives an empty definition and an
    /// [`Diagnostic::InvalidTemplate`].
    pub fn parse_track_list(&self, property: TemplateProperty, value: &str) -> Parsed<TrackDefinition> {
        let mut diagnostics = Vec::new();
        match self.try_parse_track_list(property, value, &mut diagnostics) {
            Ok(definition) => {
                trace!(property = property.name(), slots = definition.slots.len(), "parsed track list");
                Parsed {
                    value: definition,
                    diagnostics,
                }
            }
            Err(err) => Parsed {
                value: TrackDefinition::none(),
                diagnostics: vec![invalid(property, value, &err)],
            },
        }
    }

    /// Parse a track list, reporting the first syntax error. Recoverable
    /// problems (dropped names, clamped counts) go to `diagnostics`.
    pub fn try_parse_track_list(
        &self,
        property: TemplateProperty,
        value: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<TrackDefinition, TemplateError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(TrackDefinition::none());
        }

        let mut cursor = Cursor::new(tokenize(trimmed)?);
        let mut slots = Vec::new();
        let mut pending: Vec<LineName> = Vec::new();
        let mut has_auto_repeat = false;

        while let Some(token) = cursor.peek() {
            match token {
                Token::OpenBracket => {
                    cursor.next();
                    for name in self.parse_line_names(&mut cursor)? {
                        push_name(&mut pending, LineName::new(name));
                    }
                }
                Token::Function(name) if name.eq_ignore_ascii_case("repeat") => {
                    cursor.next();
                    match self.parse_repeat(&mut cursor, property, diagnostics)? {
                        Repeat::Count { count, group } => {
                            for occurrence in 1..=count {
                                for (names, size) in &group.tracks {
                                    let mut line_names = mem::take(&mut pending);
                                    for name in names {
                                        push_name(&mut line_names, LineName::with_occurrence(name.as_str(), occurrence));
                                    }
                                    slots.push(TrackSlot {
                                        line_names,
                                        sizing: SlotSizing::Track(*size),
                                    });
                                }
                                for name in &group.trailing {
                                    push_name(&mut pending, LineName::with_occurrence(name.as_str(), occurrence));
                                }
                            }
                        }
                        Repeat::Auto(repeat) => {
                            if has_auto_repeat {
                                return Err(TemplateError::MultipleAutoRepeat);
                            }
                            has_auto_repeat = true;
                            slots.push(TrackSlot {
                                line_names: mem::take(&mut pending),
                                sizing: SlotSizing::AutoRepeat(repeat),
                            });
                        }
                    }
                }
                _ => {
                    let size = self.parse_track_size(&mut cursor)?;
                    slots.push(TrackSlot {
                        line_names: mem::take(&mut pending),
                        sizing: SlotSizing::Track(size),
                    });
                }
            }
        }

        if slots.is_empty() {
            return Err(TemplateError::NoTracks);
        }

        let definition = TrackDefinition {
            slots,
            trailing_names: pending,
        };
        if has_auto_repeat && !definition.fixed_tracks().all(TrackSize::has_fixed_breadth) {
            return Err(TemplateError::AutoRepeatNotFixed);
        }
        Ok(definition)
    }

    /// Parse a `grid-auto-columns` / `grid-auto-rows` list. Empty input and
    /// invalid input both give `[auto]`.
    pub fn parse_auto_tracks(&self, property: TemplateProperty, value: &str) -> Parsed<Vec<TrackSize>> {
        match self.try_parse_auto_tracks(value) {
            Ok(sizes) => Parsed {
                value: sizes,
                diagnostics: Vec::new(),
            },
            Err(err) => Parsed {
                value: vec![TrackSize::Auto],
                diagnostics: vec![invalid(property, value, &err)],
            },
        }
    }

    pub fn try_parse_auto_tracks(&self, value: &str) -> Result<Vec<TrackSize>, TemplateError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(vec![TrackSize::Auto]);
        }
        let mut cursor = Cursor::new(tokenize(trimmed)?);
        let mut sizes = Vec::new();
        while cursor.peek().is_some() {
            sizes.push(self.parse_track_size(&mut cursor)?);
        }
        Ok(sizes)
    }

    /// Parse `grid-template-areas`. Any invalid row or non-rectangular area
    /// drops the whole property.
    pub fn parse_areas(&self, value: &str) -> Parsed<Option<AreaGrid>> {
        match AreaGrid::parse(value) {
            Ok(areas) => Parsed {
                value: areas,
                diagnostics: Vec::new(),
            },
            Err(err) => Parsed {
                value: None,
                diagnostics: vec![invalid(TemplateProperty::TemplateAreas, value, &err)],
            },
        }
    }

    fn parse_line_names(&self, cursor: &mut Cursor<'_>) -> Result<Vec<String>, TemplateError> {
        let mut names = Vec::new();
        loop {
            match cursor.next() {
                Some(Token::CloseBracket) => return Ok(names),
                Some(Token::Word(word)) if is_custom_ident(word) => names.push(word.to_string()),
                Some(Token::Word(word)) => return Err(TemplateError::InvalidLineName(word.to_string())),
                Some(token) => return Err(TemplateError::UnexpectedToken(token.describe())),
                None => return Err(TemplateError::UnexpectedEnd),
            }
        }
    }

    fn parse_repeat(
        &self,
        cursor: &mut Cursor<'_>,
        property: TemplateProperty,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Repeat, TemplateError> {
        let count_word = cursor.expect_word()?;
        let mode = match count_word.to_ascii_lowercase().as_str() {
            "auto-fill" => Some(RepeatMode::AutoFill),
            "auto-fit" => Some(RepeatMode::AutoFit),
            _ => None,
        };
        cursor.expect(Token::Comma)?;
        let group = self.parse_repeat_group(cursor)?;

        let Some(mode) = mode else {
            let requested = count_word
                .parse::<u32>()
                .ok()
                .filter(|count| *count >= 1)
                .ok_or_else(|| TemplateError::InvalidRepeatCount(count_word.to_string()))?;
            let count = if requested > self.max_repeat_count {
                diagnostics.push(Diagnostic::RepeatCountClamped {
                    property: property.name().to_string(),
                    requested,
                    limit: self.max_repeat_count,
                });
                self.max_repeat_count
            } else {
                requested
            };
            return Ok(Repeat::Count { count, group });
        };

        let names: Vec<String> = group
            .tracks
            .iter()
            .flat_map(|(names, _)| names.iter().cloned())
            .chain(group.trailing.iter().cloned())
            .collect();
        if !names.is_empty() {
            diagnostics.push(Diagnostic::AutoRepeatLineNames {
                property: property.name().to_string(),
                names,
            });
        }
        if !group.tracks.iter().all(|(_, size)| size.has_fixed_breadth()) {
            return Err(TemplateError::AutoRepeatNotFixed);
        }

        Ok(Repeat::Auto(AutoRepeat {
            mode,
            tracks: group.tracks.into_iter().map(|(_, size)| size).collect(),
        }))
    }

    fn parse_repeat_group(&self, cursor: &mut Cursor<'_>) -> Result<RepeatGroup, TemplateError> {
        let mut tracks = Vec::new();
        let mut pending = Vec::new();
        loop {
            match cursor.peek() {
                None => return Err(TemplateError::UnexpectedEnd),
                Some(Token::CloseParen) => {
                    cursor.next();
                    break;
                }
                Some(Token::OpenBracket) => {
                    cursor.next();
                    pending.extend(self.parse_line_names(cursor)?);
                }
                Some(Token::Function(name)) if name.eq_ignore_ascii_case("repeat") => {
                    return Err(TemplateError::NestedRepeat);
                }
                Some(_) => {
                    let size = self.parse_track_size(cursor)?;
                    tracks.push((mem::take(&mut pending), size));
                }
            }
        }
        if tracks.is_empty() {
            return Err(TemplateError::EmptyRepeat);
        }
        Ok(RepeatGroup {
            tracks,
            trailing: pending,
        })
    }

    fn parse_track_size(&self, cursor: &mut Cursor<'_>) -> Result<TrackSize, TemplateError> {
        match cursor.next() {
            Some(Token::Word(word)) => self.parse_breadth(word).map(TrackSize::from),
            Some(Token::Function(name)) if name.eq_ignore_ascii_case("minmax") => {
                let min = self.parse_breadth(cursor.expect_word()?)?;
                cursor.expect(Token::Comma)?;
                let max = self.parse_breadth(cursor.expect_word()?)?;
                cursor.expect(Token::CloseParen)?;
                if min.is_flexible() {
                    return Err(TemplateError::FlexibleMinimum);
                }
                Ok(TrackSize::MinMax(min, max))
            }
            Some(Token::Function(name)) if name.eq_ignore_ascii_case("fit-content") => {
                let word = cursor.expect_word()?;
                let limit = match self.parse_breadth(word)? {
                    TrackBreadth::Px(px) => LengthPercentage::Px(px),
                    TrackBreadth::Percent(pct) => LengthPercentage::Percent(pct),
                    _ => return Err(TemplateError::InvalidTrackSize(word.to_string())),
                };
                cursor.expect(Token::CloseParen)?;
                Ok(TrackSize::FitContent(limit))
            }
            Some(token) => Err(TemplateError::UnexpectedToken(token.describe())),
            None => Err(TemplateError::UnexpectedEnd),
        }
    }

    fn parse_breadth(&self, word: &str) -> Result<TrackBreadth, TemplateError> {
        match word.to_ascii_lowercase().as_str() {
            "auto" => return Ok(TrackBreadth::Auto),
            "min-content" => return Ok(TrackBreadth::MinContent),
            "max-content" => return Ok(TrackBreadth::MaxContent),
            _ => {}
        }

        let invalid = || TemplateError::InvalidTrackSize(word.to_string());
        let split = word
            .find(|c: char| c.is_ascii_alphabetic() || c == '%')
            .unwrap_or(word.len());
        let (number, unit) = word.split_at(split);
        let value: f32 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }

        match unit.to_ascii_lowercase().as_str() {
            "px" => Ok(TrackBreadth::Px(value)),
            "em" => Ok(TrackBreadth::Px(value * self.font.em)),
            "rem" => Ok(TrackBreadth::Px(value * self.font.rem)),
            "pt" => Ok(TrackBreadth::Px(value * 4.0 / 3.0)),
            "%" => Ok(TrackBreadth::Percent(value)),
            "fr" => Ok(TrackBreadth::Fr(value)),
            "" if value == 0.0 => Ok(TrackBreadth::Px(0.0)),
            _ => Err(invalid()),
        }
    }
}

fn invalid(property: TemplateProperty, value: &str, err: &TemplateError) -> Diagnostic {
    Diagnostic::InvalidTemplate {
        property: property.name().to_string(),
        value: value.to_string(),
        reason: err.to_string(),
    }
}
