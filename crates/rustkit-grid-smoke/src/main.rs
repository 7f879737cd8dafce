//! RustKit Grid Smoke Harness
//!
//! Loads a JSON fixture (container style plus items with fixed content
//! sizes), runs the grid engine over it and prints the resulting tracks and
//! item geometry. Without `--fixture` a built-in holy-grail layout is used.
//!
//! ```text
//! rustkit-grid-smoke --fixture fixtures/auto-fit-cards.json --width 800 --json
//! ```

use anyhow::{bail, Context, Result};
use rustkit_grid::{
    AvailableSpace, Axis, GridConfig, GridItemStyle, GridLayout, GridLayoutEngine, GridStyle, IntrinsicSizer,
    IntrinsicSizingMode, SelfAlignment, Track,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FIXTURE: &str = include_str!("../fixtures/holy-grail.json");

/// Parse command line arguments
struct Args {
    fixture: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    json: bool,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = std::env::args().skip(1);
        let mut fixture = None;
        let mut width = None;
        let mut height = None;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--fixture" => {
                    fixture = args.next();
                }
                "--width" => {
                    width = Some(parse_size("--width", args.next())?);
                }
                "--height" => {
                    height = Some(parse_size("--height", args.next())?);
                }
                "--json" => json = true,
                other => warn!(argument = other, "Ignoring unknown argument"),
            }
        }

        Ok(Self {
            fixture,
            width,
            height,
            json,
        })
    }

    /// Load the fixture file or fall back to the built-in one.
    fn load_fixture(&self) -> Result<Fixture> {
        let (source, text) = match &self.fixture {
            Some(path) => (
                path.as_str(),
                std::fs::read_to_string(path).with_context(|| format!("failed to read fixture {}", path))?,
            ),
            None => ("built-in holy-grail", DEFAULT_FIXTURE.to_string()),
        };
        let fixture: Fixture =
            serde_json::from_str(&text).with_context(|| format!("failed to parse fixture {}", source))?;
        info!(source, items = fixture.items.len(), "Fixture loaded");
        Ok(fixture)
    }
}

fn parse_size(flag: &str, value: Option<String>) -> Result<f32> {
    let Some(value) = value else {
        bail!("{} needs a value", flag);
    };
    let size: f32 = value
        .parse()
        .with_context(|| format!("invalid {} value {:?}", flag, value))?;
    if !size.is_finite() || size < 0.0 {
        bail!("{} must be a non-negative number, got {}", flag, size);
    }
    Ok(size)
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    style: GridStyle,
    items: Vec<FixtureItem>,
    #[serde(default)]
    config: GridConfig,
    width: Option<f32>,
    height: Option<f32>,
}

/// One grid item: placement shorthands plus fixed content sizes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FixtureItem {
    name: Option<String>,
    row: Option<String>,
    column: Option<String>,
    area: Option<String>,
    justify_self: SelfAlignment,
    align_self: SelfAlignment,
    min_width: f32,
    max_width: f32,
    min_height: f32,
    max_height: f32,
}

impl FixtureItem {
    fn style(&self, index: usize) -> Result<GridItemStyle> {
        let mut style = GridItemStyle {
            justify_self: self.justify_self,
            align_self: self.align_self,
            ..GridItemStyle::auto()
        };
        if let Some(area) = &self.area {
            style = style
                .with_area(area)
                .with_context(|| format!("item {}: invalid grid-area {:?}", index, area))?;
        }
        if let Some(row) = &self.row {
            style = style
                .with_row(row)
                .with_context(|| format!("item {}: invalid grid-row {:?}", index, row))?;
        }
        if let Some(column) = &self.column {
            style = style
                .with_column(column)
                .with_context(|| format!("item {}: invalid grid-column {:?}", index, column))?;
        }
        Ok(style)
    }

    fn label(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("item-{}", index))
    }
}

/// Answers intrinsic size queries from the fixture's content sizes.
struct FixtureSizer<'a> {
    items: &'a [FixtureItem],
}

impl IntrinsicSizer for FixtureSizer<'_> {
    fn intrinsic_size(&self, item: usize, axis: Axis, mode: IntrinsicSizingMode, _cross_size: Option<f32>) -> f32 {
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

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let fixture = args.load_fixture()?;

    let items = fixture
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| item.style(index))
        .collect::<Result<Vec<_>>>()?;

    let available = AvailableSpace {
        width: args.width.or(fixture.width),
        height: args.height.or(fixture.height),
    };
    info!(width = ?available.width, height = ?available.height, "Running grid layout");

    let mut engine = GridLayoutEngine::new(fixture.config.clone());
    let sizer = FixtureSizer {
        items: &fixture.items,
    };
    let layout = engine.layout(&fixture.style, &items, available, &sizer);

    if args.json {
        let labels: Vec<String> = fixture
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| item.label(index))
            .collect();
        let output = json!({
            "available": available,
            "labels": labels,
            "layout": layout,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_layout(&layout, &fixture.items);
    }

    info!(
        columns = layout.columns.len(),
        rows = layout.rows.len(),
        diagnostics = layout.diagnostics.len(),
        "Smoke run complete"
    );
    Ok(())
}

fn print_tracks(label: &str, tracks: &[Track]) {
    for (index, track) in tracks.iter().enumerate() {
        let collapsed = if track.collapsed { " (collapsed)" } else { "" };
        println!(
            "  {} {:>2}: offset {:>8.2}  size {:>8.2}{}",
            label, index, track.offset, track.size, collapsed
        );
    }
}

fn print_layout(layout: &GridLayout, items: &[FixtureItem]) {
    println!("grid {:.2} x {:.2}", layout.width, layout.height);
    println!(
        "explicit columns {}..{}, rows {}..{}",
        layout.explicit_columns.start, layout.explicit_columns.end, layout.explicit_rows.start, layout.explicit_rows.end
    );

    println!("tracks:");
    print_tracks("column", &layout.columns);
    print_tracks("row", &layout.rows);

    println!("items:");
    for (index, (geometry, item)) in layout.items.iter().zip(items).enumerate() {
        let area = geometry.area;
        let rect = geometry.rect;
        println!(
            "  {:<12} cols {}..{} rows {}..{}  area ({:.2}, {:.2}) {:.2}x{:.2}  box ({:.2}, {:.2}) {:.2}x{:.2}",
            item.label(index),
            geometry.columns.start,
            geometry.columns.end,
            geometry.rows.start,
            geometry.rows.end,
            area.x,
            area.y,
            area.width,
            area.height,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
        );
    }

    if !layout.diagnostics.is_empty() {
        println!("diagnostics:");
        for diagnostic in &layout.diagnostics {
            println!("  {}", diagnostic);
        }
    }
}
