//! End-to-end layout tests for RustKit Grid.

mod support;

use rustkit_grid::{
    layout_grid, AvailableSpace, Axis, Diagnostic, GridAutoFlow, GridConfig, GridItemStyle, GridLayout,
    GridLayoutEngine, GridStyle, SelfAlignment, TrackSpan,
};
use support::*;

fn items(count: usize) -> Vec<GridItemStyle> {
    vec![GridItemStyle::auto(); count]
}

fn column(value: &str) -> GridItemStyle {
    GridItemStyle::auto().with_column(value).unwrap()
}

fn area(value: &str) -> GridItemStyle {
    GridItemStyle::auto().with_area(value).unwrap()
}

fn layout(style: &GridStyle, items: &[GridItemStyle], width: f32) -> GridLayout {
    init_tracing();
    let sizer = ContentSizer::uniform(items.len(), ItemContent::new(10.0, 40.0, 20.0, 20.0));
    layout_grid(style, items, AvailableSpace::width_only(width), &sizer)
}

// ==================== Track sizing ====================

#[test]
fn fixed_tracks_fill_exactly_their_sum_plus_gaps() {
    let style = GridStyle::with_columns("100px 150px 50px").gap(20.0);
    let result = layout(&style, &items(3), 400.0);

    assert_track_sizes(&result, Axis::Horizontal, &[100.0, 150.0, 50.0]);
    assert_eq!(result.width, 300.0 + 2.0 * 20.0);
    assert_clean(&result);
}

#[test]
fn fixed_tracks_never_shrink() {
    let style = GridStyle::with_columns("100px 150px 50px").gap(20.0);
    let result = layout(&style, &items(3), 120.0);

    assert_track_sizes(&result, Axis::Horizontal, &[100.0, 150.0, 50.0]);
    assert_eq!(result.width, 340.0);
}

#[test]
fn repeat_fr_splits_space_evenly() {
    let style = GridStyle::with_columns("repeat(3, 1fr)");
    let result = layout(&style, &items(3), 300.0);

    assert_track_sizes(&result, Axis::Horizontal, &[100.0, 100.0, 100.0]);
    let offsets: Vec<f32> = result.columns.iter().map(|t| t.offset).collect();
    assert_eq!(offsets, vec![0.0, 100.0, 200.0]);
}

#[test]
fn implicit_rows_follow_auto_rows_pattern() {
    let style = GridStyle {
        grid_auto_rows: "40px 60px".to_string(),
        ..GridStyle::with_columns("1fr")
    };
    let result = layout(&style, &items(3), 100.0);
    assert_track_sizes(&result, Axis::Vertical, &[40.0, 60.0, 40.0]);
    assert_eq!(result.height, 140.0);
}

#[test]
fn percentage_rows_without_definite_height_are_zero() {
    let style = GridStyle {
        grid_template_rows: "25%".to_string(),
        ..GridStyle::with_columns("100px")
    };
    init_tracing();
    let sizer = ContentSizer::uniform(1, ItemContent::new(10.0, 10.0, 20.0, 35.0));
    let result = layout_grid(&style, &items(1), AvailableSpace::width_only(100.0), &sizer);
    assert_track_sizes(&result, Axis::Vertical, &[0.0]);
    assert_eq!(result.height, 0.0);

    let result = layout_grid(&style, &items(1), AvailableSpace::definite(100.0, 200.0), &sizer);
    assert_track_sizes(&result, Axis::Vertical, &[50.0]);
}

#[test]
fn spanning_items_settle_within_default_passes() {
    let style = GridStyle {
        grid_template_rows: "auto auto auto".to_string(),
        ..GridStyle::with_columns("auto auto auto")
    };
    let items = vec![
        column("1 / 3"),
        column("2 / 4"),
        column("1 / 4"),
        GridItemStyle::auto(),
    ];
    let sizer = ContentSizer::new(vec![
        ItemContent::fixed(120.0, 10.0),
        ItemContent::fixed(90.0, 10.0),
        ItemContent::fixed(300.0, 10.0),
        ItemContent::fixed(20.0, 10.0),
    ]);
    let result = layout_grid(&style, &items, AvailableSpace::default(), &sizer);

    assert!(!result
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::IntrinsicSizingUnsettled { .. })));
    let columns = &result.columns;
    assert!(columns[0].size + columns[1].size >= 120.0 - 1e-3);
    assert!(columns[1].size + columns[2].size >= 90.0 - 1e-3);
    assert!(result.width >= 300.0 - 1e-3);
}

#[test]
fn intrinsic_sizes_are_queried_once_per_key() {
    let style = GridStyle {
        grid_template_rows: "auto".to_string(),
        ..GridStyle::with_columns("auto min-content max-content fit-content(30px)")
    };
    let items = vec![
        GridItemStyle::auto(),
        GridItemStyle::auto(),
        column("3 / 5"),
        GridItemStyle {
            justify_self: SelfAlignment::Center,
            ..column("1 / 3")
        },
    ];
    let sizer = ContentSizer::uniform(items.len(), ItemContent::new(15.0, 45.0, 10.0, 12.0));
    let result = layout_grid(&style, &items, AvailableSpace::width_only(600.0), &sizer);

    // At most (min, max) x (column, row) per item; alignment reuses answers.
    assert!(sizer.queries() <= items.len() * 4, "{} queries", sizer.queries());
    assert_eq!(result.items.len(), 4);
}

// ==================== Placement ====================

#[test]
fn explicit_columns_ignore_other_items() {
    let style = GridStyle::with_columns("repeat(4, 50px)");
    let items = vec![GridItemStyle::auto(), GridItemStyle::auto(), column("2 / 4")];
    let result = layout(&style, &items, 200.0);

    assert_item_span(&result, 0, Axis::Horizontal, 0, 1);
    assert_item_span(&result, 1, Axis::Horizontal, 1, 2);
    assert_item_span(&result, 2, Axis::Horizontal, 1, 3);
    // Column 2 of the first row is taken.
    assert_item_span(&result, 2, Axis::Vertical, 1, 2);

    let alone = layout(&style, &[column("2 / 4")], 200.0);
    assert_eq!(alone.items[0].columns, result.items[2].columns);
    assert_eq!(alone.items[0].area.x, result.items[2].area.x);
    assert_eq!(alone.items[0].area.width, result.items[2].area.width);
}

#[test]
fn first_span_item_starts_at_origin() {
    let style = GridStyle::with_columns("repeat(4, 50px)");
    let result = layout(&style, &[column("span 2")], 200.0);

    assert_item_span(&result, 0, Axis::Horizontal, 0, 2);
    assert_eq!(result.items[0].area.width, 100.0);
}

#[test]
fn sparse_and_dense_packing_differ() {
    let placed = |flow: GridAutoFlow| {
        let style = GridStyle {
            grid_auto_flow: flow,
            ..GridStyle::with_columns("repeat(3, 50px)")
        };
        let items = vec![column("span 2"), column("span 2"), GridItemStyle::auto()];
        layout(&style, &items, 150.0)
    };

    let sparse = placed(GridAutoFlow::Row);
    assert_item_span(&sparse, 1, Axis::Vertical, 1, 2);
    assert_item_span(&sparse, 2, Axis::Vertical, 1, 2);
    assert_item_span(&sparse, 2, Axis::Horizontal, 2, 3);

    let dense = placed(GridAutoFlow::RowDense);
    assert_item_span(&dense, 2, Axis::Vertical, 0, 1);
    assert_item_span(&dense, 2, Axis::Horizontal, 2, 3);
}

#[test]
fn column_flow_fills_columns_first() {
    let style = GridStyle {
        grid_template_rows: "repeat(2, 30px)".to_string(),
        grid_auto_flow: GridAutoFlow::Column,
        grid_auto_columns: "80px".to_string(),
        ..GridStyle::default()
    };
    let result = layout(&style, &items(3), 400.0);

    assert_item_span(&result, 1, Axis::Vertical, 1, 2);
    assert_item_span(&result, 2, Axis::Horizontal, 1, 2);
    assert_item_span(&result, 2, Axis::Vertical, 0, 1);
    assert_track_sizes(&result, Axis::Horizontal, &[80.0, 80.0]);
}

#[test]
fn negative_lines_count_from_the_end() {
    let style = GridStyle::with_columns("repeat(3, 50px)");
    let result = layout(&style, &[column("1 / -1")], 150.0);
    assert_item_span(&result, 0, Axis::Horizontal, 0, 3);
    assert_eq!(result.items[0].area.width, 150.0);
}

#[test]
fn named_lines_place_items() {
    let style = GridStyle::with_columns("[full-start] 1fr [main-start] 2fr [main-end] 1fr [full-end]");
    let items = vec![column("main"), column("full")];
    let result = layout(&style, &items, 400.0);

    assert_item_span(&result, 0, Axis::Horizontal, 1, 2);
    assert_eq!(result.items[0].area.x, 100.0);
    assert_eq!(result.items[0].area.width, 200.0);
    assert_item_span(&result, 1, Axis::Horizontal, 0, 3);
    assert_clean(&result);
}

#[test]
fn template_areas_place_named_items() {
    let style = GridStyle {
        grid_template_areas: "\"a a\" \"b c\"".to_string(),
        grid_template_rows: "30px 40px".to_string(),
        ..GridStyle::with_columns("100px 50px")
    };
    let items = vec![area("a"), area("b"), area("c")];
    let result = layout(&style, &items, 150.0);

    assert_item_span(&result, 0, Axis::Vertical, 0, 1);
    assert_item_span(&result, 0, Axis::Horizontal, 0, 2);
    assert_item_span(&result, 1, Axis::Vertical, 1, 2);
    assert_item_span(&result, 1, Axis::Horizontal, 0, 1);
    assert_item_span(&result, 2, Axis::Vertical, 1, 2);
    assert_item_span(&result, 2, Axis::Horizontal, 1, 2);
    assert_eq!(result.items[2].area.x, 100.0);
    assert_eq!(result.items[2].area.y, 30.0);
    assert_clean(&result);
}

#[test]
fn non_rectangular_areas_drop_the_property() {
    let style = GridStyle {
        grid_template_areas: "\"a a\" \"b a\"".to_string(),
        ..GridStyle::default()
    };
    let result = layout(&style, &[area("a")], 150.0);

    assert!(result.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::InvalidTemplate { property, .. } if property == "grid-template-areas"
    )));
    assert_eq!(result.explicit_columns, TrackSpan { start: 0, end: 0 });
    assert_eq!(result.explicit_rows, TrackSpan { start: 0, end: 0 });
    // The area name no longer exists, so the item is auto-placed.
    assert_item_span(&result, 0, Axis::Horizontal, 0, 1);
}

// ==================== Auto repeat ====================

#[test]
fn auto_fill_fits_as_many_tracks_as_possible() {
    let style = GridStyle::with_columns("repeat(auto-fill, minmax(100px, 1fr))").gap(10.0);
    let result = layout(&style, &items(2), 450.0);

    // (450 + 10) / 110 = 4 repetitions, flexed to fill the container.
    assert_eq!(result.columns.len(), 4);
    assert_eq!(result.width, 450.0);
    assert_clean(&result);
}

#[test]
fn auto_fit_collapses_empty_repetitions() {
    let style = GridStyle::with_columns("repeat(auto-fit, minmax(100px, 1fr))").gap(10.0);
    let result = layout(&style, &items(2), 450.0);

    assert_eq!(result.columns.len(), 4);
    assert!(result.columns[2].collapsed && result.columns[3].collapsed);
    // Two visible tracks share the whole width.
    assert_eq!(result.columns[0].size, 220.0);
    assert_eq!(result.columns[1].size, 220.0);
    assert_eq!(result.width, 450.0);
}

#[test]
fn auto_repeat_without_available_size_reports() {
    let style = GridStyle::with_columns("repeat(auto-fill, 100px 50px)");
    init_tracing();
    let sizer = ContentSizer::uniform(1, ItemContent::fixed(10.0, 10.0));
    let result = layout_grid(&style, &items(1), AvailableSpace::default(), &sizer);

    // The group collapses to its first track.
    assert_track_sizes(&result, Axis::Horizontal, &[100.0]);
    assert_eq!(result.explicit_columns, TrackSpan { start: 0, end: 1 });
    assert!(matches!(
        result.diagnostics.as_slice(),
        [Diagnostic::AutoRepeatIndefinite { axis: Axis::Horizontal }]
    ));
}

// ==================== Determinism ====================

#[test]
fn identical_inputs_give_identical_geometry() {
    let style = GridStyle {
        grid_template_rows: "auto 1fr".to_string(),
        grid_template_areas: "\"head head head\" \"nav main aside\"".to_string(),
        ..GridStyle::with_columns("minmax(80px, max-content) 1fr fit-content(120px)").gap(7.5)
    };
    let items = vec![
        area("head"),
        area("nav"),
        area("main"),
        GridItemStyle {
            align_self: SelfAlignment::Center,
            ..area("aside")
        },
        column("span 2"),
    ];
    let contents = vec![
        ItemContent::new(50.0, 333.3, 11.0, 17.0),
        ItemContent::new(70.0, 90.0, 40.0, 40.0),
        ItemContent::new(10.0, 600.0, 13.7, 29.1),
        ItemContent::new(30.0, 150.0, 8.0, 9.5),
        ItemContent::new(45.0, 45.0, 12.0, 12.0),
    ];

    let run = || {
        let sizer = ContentSizer::new(contents.clone());
        layout_grid(&style, &items, AvailableSpace::definite(717.0, 400.0), &sizer)
    };
    let first = run();
    let second = run();
    assert_eq!(layout_bits(&first), layout_bits(&second));

    // A warm template cache must not change the answer.
    let mut engine = GridLayoutEngine::new(GridConfig::default());
    let sizer = ContentSizer::new(contents.clone());
    let cold = engine.layout(&style, &items, AvailableSpace::definite(717.0, 400.0), &sizer);
    let warm = engine.layout(&style, &items, AvailableSpace::definite(717.0, 400.0), &sizer);
    assert_eq!(layout_bits(&cold), layout_bits(&first));
    assert_eq!(layout_bits(&warm), layout_bits(&first));
}

#[test]
fn layout_serializes_to_json() {
    let style = GridStyle::with_columns("100px 1fr");
    let result = layout(&style, &items(2), 300.0);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["columns"][1]["size"], 200.0);
    assert_eq!(json["items"][1]["columns"]["start"], 1);
    assert!(json["diagnostics"].as_array().unwrap().is_empty());
}
