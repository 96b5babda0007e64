use chrono::NaiveDate;
use salmon_signals::pipeline::prepare;
use salmon_signals::viz::{self, ChartKind, ChartOptions, LegendMode};
use salmon_signals::{Palettes, PlotSeries, Selection, Table, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn sample_table() -> Table {
    let mut rows = Vec::new();
    for (day, loc, sp, c) in [
        (1, "Bonneville", "Chinook", 120),
        (2, "Bonneville", "Chinook", 3400),
        (3, "Bonneville", "Chinook", 2100),
        (1, "McNary", "Coho", 40),
        (2, "McNary", "Coho", 75),
        (3, "Wells", "Sockeye", 900),
    ] {
        let d = NaiveDate::from_ymd_opt(2020, 6, day).unwrap();
        rows.push(vec![
            Value::Date(d),
            Value::Int(152 + day as i64),
            loc.into(),
            sp.into(),
            Value::Int(c),
        ]);
    }
    Table::new(
        vec![
            "DATE".into(),
            "DOY".into(),
            "LOCATION".into(),
            "SPECIES".into(),
            "COUNT".into(),
        ],
        rows,
    )
    .unwrap()
}

fn series_for(x: &str, kind: ChartKind) -> Vec<PlotSeries> {
    let sel = Selection {
        x: x.into(),
        group_by: vec!["LOCATION".into(), "SPECIES".into()],
        color_by: Some("LOCATION".into()),
        ..Selection::default()
    };
    prepare(&sample_table(), &sel, &Palettes::default(), 50, kind)
        .unwrap()
        .series
}

fn write_and_check<F: Fn(&PathBuf)>(maker: F, name: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join(name);
    maker(&path);
    let meta = fs::metadata(&path).expect("file created");
    assert!(meta.len() > 0, "chart has content");
}

#[test]
fn chart_kinds_produce_files() {
    for (i, kind) in [ChartKind::Line, ChartKind::Bar, ChartKind::Area]
        .into_iter()
        .enumerate()
    {
        let series = series_for("DOY", kind);
        write_and_check(
            |p| {
                let opts = ChartOptions {
                    title: "Columbia River Dam Analysis".into(),
                    x_label: "Doy".into(),
                    y_label: "Count".into(),
                    ..Default::default()
                };
                viz::render_chart(&series, kind, p, &opts).unwrap();
            },
            &format!("kind{i}.svg"),
        );
    }
}

#[test]
fn legend_modes_produce_files() {
    let series = series_for("LOCATION", ChartKind::Line);
    for (i, legend) in [LegendMode::Inside, LegendMode::Right, LegendMode::Bottom]
        .into_iter()
        .enumerate()
    {
        write_and_check(
            |p| {
                let opts = ChartOptions {
                    legend,
                    locale: "de".into(),
                    ..Default::default()
                };
                viz::render_chart(&series, ChartKind::Bar, p, &opts).unwrap();
            },
            &format!("legend{i}.svg"),
        );
    }
}

#[test]
fn date_axis_renders_png() {
    let series = series_for("DATE", ChartKind::Line);
    write_and_check(
        |p| {
            let opts = ChartOptions {
                width: 640,
                height: 400,
                ..Default::default()
            };
            viz::render_chart(&series, ChartKind::Line, p, &opts).unwrap();
        },
        "dates.png",
    );
}

#[test]
fn table_kind_and_empty_input_are_errors() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("x.svg");
    let opts = ChartOptions::default();
    let series = series_for("DOY", ChartKind::Line);
    assert!(viz::render_chart(&series, ChartKind::Table, &out, &opts).is_err());
    assert!(viz::render_chart(&[], ChartKind::Line, &out, &opts).is_err());
}
