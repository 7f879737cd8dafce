//! Grid lines.
//!
//! The `grid-row-start` / `grid-column-end` value grammar ([`GridLine`]), the
//! `grid-row` / `grid-column` / `grid-area` shorthands, and the
//! [`LineNameResolver`] that maps line names to 1-based line numbers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::style::Axis;
use crate::template::{AreaGrid, LineName, TemplateError};

/// A grid line reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridLine {
    /// Auto placement.
    #[default]
    Auto,
    /// Specific line number (1-based, can be negative).
    Number(i32),
    /// Named line, optionally the nth one (`2 aside`, `-1 aside`).
    Named { name: String, ordinal: Option<i32> },
    /// Span a number of tracks.
    Span(u32),
    /// Span to the nth line with a name.
    SpanNamed { name: String, count: u32 },
}

impl GridLine {
    pub fn is_auto(&self) -> bool {
        matches!(self, GridLine::Auto)
    }

    pub fn is_span(&self) -> bool {
        matches!(self, GridLine::Span(_) | GridLine::SpanNamed { .. })
    }

    /// A line that pins an edge: a number or a name.
    pub fn is_definite(&self) -> bool {
        matches!(self, GridLine::Number(_) | GridLine::Named { .. })
    }

    /// Bare `<custom-ident>` with no ordinal.
    fn bare_name(&self) -> Option<&str> {
        match self {
            GridLine::Named { name, ordinal: None } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for GridLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridLine::Auto => f.write_str("auto"),
            GridLine::Number(n) => write!(f, "{}", n),
            GridLine::Named { name, ordinal: None } => f.write_str(name),
            GridLine::Named {
                name,
                ordinal: Some(n),
            } => write!(f, "{} {}", n, name),
            GridLine::Span(n) => write!(f, "span {}", n),
            GridLine::SpanNamed { name, count } => write!(f, "span {} {}", count, name),
        }
    }
}

/// Grid placement for an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridPlacement {
    /// Row start line.
    pub row_start: GridLine,
    /// Row end line.
    pub row_end: GridLine,
    /// Column start line.
    pub column_start: GridLine,
    /// Column end line.
    pub column_end: GridLine,
}

impl GridPlacement {
    /// Create placement from a named area.
    pub fn from_area(name: &str) -> Self {
        let line = GridLine::Named {
            name: name.to_string(),
            ordinal: None,
        };
        Self {
            row_start: line.clone(),
            row_end: line.clone(),
            column_start: line.clone(),
            column_end: line,
        }
    }

    /// Create placement from explicit lines.
    pub fn from_lines(col_start: i32, col_end: i32, row_start: i32, row_end: i32) -> Self {
        Self {
            row_start: GridLine::Number(row_start),
            row_end: GridLine::Number(row_end),
            column_start: GridLine::Number(col_start),
            column_end: GridLine::Number(col_end),
        }
    }
}

/// Whether `word` is usable as a line or area name.
pub(crate) fn is_custom_ident(word: &str) -> bool {
    const RESERVED: [&str; 6] = ["auto", "span", "inherit", "initial", "unset", "default"];
    if RESERVED.iter().any(|r| word.eq_ignore_ascii_case(r)) {
        return false;
    }

    let ident_char = |c: char| c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii();
    let mut chars = word.chars();
    let first_ok = match chars.next() {
        None => false,
        Some('-') => matches!(chars.clone().next(), Some(c) if !c.is_ascii_digit() && ident_char(c)),
        Some(c) => !c.is_ascii_digit() && ident_char(c),
    };
    first_ok && word.chars().all(ident_char)
}

/// Parse one `grid-*-start` / `grid-*-end` value.
pub fn parse_grid_line(value: &str) -> Result<GridLine, TemplateError> {
    let invalid = || TemplateError::InvalidGridLine(value.trim().to_string());
    let words: Vec<&str> = value.split_whitespace().collect();
    if words.len() == 1 && words[0].eq_ignore_ascii_case("auto") {
        return Ok(GridLine::Auto);
    }

    let mut span = false;
    let mut number: Option<i32> = None;
    let mut name: Option<&str> = None;
    for word in &words {
        if word.eq_ignore_ascii_case("span") && !span {
            span = true;
        } else if let Ok(n) = word.parse::<i32>() {
            if number.replace(n).is_some() {
                return Err(invalid());
            }
        } else if is_custom_ident(word) {
            if name.replace(word).is_some() {
                return Err(invalid());
            }
        } else {
            return Err(invalid());
        }
    }

    let name = name.map(str::to_string);
    match (span, number, name) {
        (false, Some(0), _) => Err(invalid()),
        (false, Some(n), None) => Ok(GridLine::Number(n)),
        (false, ordinal, Some(name)) => Ok(GridLine::Named { name, ordinal }),
        (true, Some(n), _) if n <= 0 => Err(invalid()),
        (true, Some(n), None) => Ok(GridLine::Span(n as u32)),
        (true, Some(n), Some(name)) => Ok(GridLine::SpanNamed { name, count: n as u32 }),
        (true, None, Some(name)) => Ok(GridLine::SpanNamed { name, count: 1 }),
        _ => Err(invalid()),
    }
}

/// Parse a `grid-row` / `grid-column` shorthand (`start [/ end]`).
///
/// A lone `<custom-ident>` start is copied to the end; anything else leaves
/// the end `auto`.
pub fn parse_grid_axis(value: &str) -> Result<(GridLine, GridLine), TemplateError> {
    let parts: Vec<&str> = value.split('/').collect();
    if parts.len() > 2 {
        return Err(TemplateError::InvalidGridLine(value.trim().to_string()));
    }
    let start = parse_grid_line(parts[0])?;
    let end = match parts.get(1) {
        Some(part) => parse_grid_line(part)?,
        None => copy_if_ident(&start),
    };
    Ok((start, end))
}

/// Parse a `grid-area` shorthand (`row-start / column-start / row-end /
/// column-end`, trailing parts optional).
pub fn parse_grid_area(value: &str) -> Result<GridPlacement, TemplateError> {
    let parts: Vec<&str> = value.split('/').collect();
    if parts.len() > 4 {
        return Err(TemplateError::InvalidGridLine(value.trim().to_string()));
    }
    let lines = parts
        .iter()
        .map(|part| parse_grid_line(part))
        .collect::<Result<Vec<_>, _>>()?;

    let row_start = lines[0].clone();
    let column_start = lines.get(1).cloned().unwrap_or_else(|| copy_if_ident(&row_start));
    let row_end = lines.get(2).cloned().unwrap_or_else(|| copy_if_ident(&row_start));
    let column_end = lines.get(3).cloned().unwrap_or_else(|| copy_if_ident(&column_start));

    Ok(GridPlacement {
        row_start,
        row_end,
        column_start,
        column_end,
    })
}

fn copy_if_ident(line: &GridLine) -> GridLine {
    if line.bare_name().is_some() {
        line.clone()
    } else {
        GridLine::Auto
    }
}

// ==================== Line Name Resolution ====================

/// A named line lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedName {
    /// 1-based line number.
    pub line: i32,
    /// How many lines carry the name.
    pub available: usize,
    /// The ordinal asked for more lines than exist.
    pub clamped: bool,
}

/// Name → line table for one axis.
///
/// Names come from the expanded track list and from `grid-template-areas`
/// (`<area>-start` / `<area>-end`). Names never extend into implicit tracks.
#[derive(Debug, Clone)]
pub struct LineNameResolver {
    axis: Axis,
    names: BTreeMap<String, Vec<i32>>,
    explicit_lines: usize,
}

impl LineNameResolver {
    /// Build the table. `line_names[i]` holds the names of line `i + 1`.
    pub fn new(axis: Axis, line_names: &[Vec<LineName>], areas: Option<&AreaGrid>) -> Self {
        let mut names: BTreeMap<String, Vec<i32>> = BTreeMap::new();

        for (index, line) in line_names.iter().enumerate() {
            for name in line {
                names.entry(name.ident.clone()).or_default().push(index as i32 + 1);
            }
        }

        let mut explicit_lines = line_names.len();
        if let Some(areas) = areas {
            explicit_lines = explicit_lines.max(areas.track_count(axis) + 1);
            for area in &areas.areas {
                let (start, end) = match axis {
                    Axis::Horizontal => (area.column_start, area.column_end),
                    Axis::Vertical => (area.row_start, area.row_end),
                };
                names
                    .entry(format!("{}-start", area.name))
                    .or_default()
                    .push(start as i32);
                names.entry(format!("{}-end", area.name)).or_default().push(end as i32);
            }
        }

        for lines in names.values_mut() {
            lines.sort_unstable();
            lines.dedup();
        }

        trace!(%axis, names = names.len(), explicit_lines, "line name table built");

        Self {
            axis,
            names,
            explicit_lines,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Number of explicit grid lines (explicit tracks + 1).
    pub fn count_explicit_lines(&self) -> usize {
        self.explicit_lines
    }

    /// All lines carrying `name`, ascending.
    pub fn lines(&self, name: &str) -> &[i32] {
        self.names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// The `ordinal`-th line named `name`, counting from the last line when
    /// `from_end` is set. Ordinals past the available lines clamp to the last
    /// (or first) match.
    pub fn resolve(&self, name: &str, ordinal: u32, from_end: bool) -> Option<ResolvedName> {
        let lines = self.names.get(name)?;
        let available = lines.len();
        if available == 0 {
            return None;
        }
        let wanted = (ordinal.max(1)) as usize;
        let index = wanted.min(available);
        let line = if from_end {
            lines[available - index]
        } else {
            lines[index - 1]
        };
        Some(ResolvedName {
            line,
            available,
            clamped: wanted > available,
        })
    }

    /// The `count`-th line named `name` strictly after `line`.
    pub fn find_after(&self, name: &str, line: i32, count: u32) -> Option<ResolvedName> {
        let after: Vec<i32> = self.lines(name).iter().copied().filter(|&l| l > line).collect();
        Self::pick(&after, count, false)
    }

    /// The `count`-th line named `name` strictly before `line`, counting
    /// backwards.
    pub fn find_before(&self, name: &str, line: i32, count: u32) -> Option<ResolvedName> {
        let before: Vec<i32> = self.lines(name).iter().copied().filter(|&l| l < line).collect();
        Self::pick(&before, count, true)
    }

    fn pick(lines: &[i32], count: u32, from_end: bool) -> Option<ResolvedName> {
        if lines.is_empty() {
            return None;
        }
        let wanted = count.max(1) as usize;
        let index = wanted.min(lines.len());
        let line = if from_end {
            lines[lines.len() - index]
        } else {
            lines[index - 1]
        };
        Some(ResolvedName {
            line,
            available: lines.len(),
            clamped: wanted > lines.len(),
        })
    }
}
