use salmon_signals::viz::ChartKind;
use salmon_signals::{
    AggFunc, Aggregation, Palettes, PlotSeries, Table, Value, aggregate, assign_colors,
    build_series,
};

fn table() -> Table {
    let mut rows = Vec::new();
    for (doy, species, year, count) in [
        (1, "Coho", 2019, Some(5)),
        (2, "Coho", 2019, Some(5)),
        (1, "Chinook", 2020, Some(40)),
        (2, "Chinook", 2020, Some(60)),
        (1, "Sockeye", 2018, Some(20)),
        (2, "Sockeye", 2018, None),
    ] {
        rows.push(vec![
            Value::Int(doy),
            species.into(),
            Value::Int(year),
            count.map(Value::Int).unwrap_or(Value::Null),
        ]);
    }
    Table::new(
        vec![
            "DOY".into(),
            "SPECIES".into(),
            "YEAR".into(),
            "COUNT".into(),
        ],
        rows,
    )
    .unwrap()
}

fn series_with(func: AggFunc, kind: ChartKind, color_by: Option<&str>) -> Vec<PlotSeries> {
    let plan = Aggregation::new("DOY", "COUNT", &["SPECIES", "YEAR"], Some(func));
    let agg = aggregate(&table(), &plan).unwrap();
    let colors = assign_colors(&agg, color_by, &Palettes::default(), 50).unwrap();
    build_series(&agg, &colors, color_by, kind).unwrap()
}

fn series(kind: ChartKind, color_by: Option<&str>) -> Vec<PlotSeries> {
    series_with(AggFunc::Sum, kind, color_by)
}

#[test]
fn area_draws_largest_total_first() {
    let s = series(ChartKind::Area, None);
    let labels: Vec<&str> = s.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Chinook-2020", "Sockeye-2018", "Coho-2019"]);
    for pair in s.windows(2) {
        assert!(pair[0].total >= pair[1].total);
        assert!(pair[0].z_order < pair[1].z_order);
    }
}

#[test]
fn null_values_are_dropped_from_points() {
    // the mean of an all-null group is null
    let s = series_with(AggFunc::Mean, ChartKind::Line, None);
    let sockeye = s.iter().find(|s| s.label == "Sockeye-2018").unwrap();
    assert_eq!(sockeye.points, vec![(Value::Int(1), 20.0)]);
    assert_eq!(sockeye.total, 20.0);
}

#[test]
fn line_orders_by_color_value() {
    let s = series(ChartKind::Line, Some("YEAR"));
    let labels: Vec<&str> = s.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Sockeye-2018", "Coho-2019", "Chinook-2020"]);
    assert_eq!(
        s.iter().map(|s| s.z_order).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn points_are_sorted_by_x() {
    for s in series(ChartKind::Bar, None) {
        let xs: Vec<&Value> = s.points.iter().map(|(x, _)| x).collect();
        let mut sorted = xs.clone();
        sorted.sort();
        assert_eq!(xs, sorted);
    }
}
