use salmon_signals::color::{ColorPolicy, DAM_COLORS, DAM_PALETTE, OFFICE10, SEQUENTIAL5};
use salmon_signals::series::build_series;
use salmon_signals::viz::ChartKind;
use salmon_signals::{
    AggFunc, Aggregation, Palettes, Rgb, Selection, SeriesKey, Table, Value, aggregate,
    assign_colors,
};

fn counts(rows: &[(i64, i64, &str, i64)]) -> Table {
    Table::new(
        vec![
            "DOY".into(),
            "YEAR".into(),
            "LOCATION".into(),
            "COUNT".into(),
        ],
        rows.iter()
            .map(|(doy, year, loc, c)| {
                vec![Value::Int(*doy), Value::Int(*year), (*loc).into(), Value::Int(*c)]
            })
            .collect(),
    )
    .unwrap()
}

fn by(group: &[&str]) -> Aggregation {
    Aggregation::new("DOY", "COUNT", group, Some(AggFunc::Sum))
}

#[test]
fn equal_numeric_values_all_get_first_stop() {
    let t = counts(&[
        (1, 2020, "Bonneville", 3),
        (1, 2020, "McNary", 4),
        (2, 2020, "Wells", 5),
    ]);
    let agg = aggregate(&t, &by(&["YEAR", "LOCATION"])).unwrap();
    let cmap = assign_colors(&agg, Some("YEAR"), &Palettes::default(), 50).unwrap();
    let first = Rgb::from_hex(SEQUENTIAL5[0]).unwrap();
    assert_eq!(cmap.colors.len(), 3);
    assert!(cmap.colors.values().all(|c| *c == first));
    assert!(matches!(
        cmap.policy,
        ColorPolicy::Continuous { min, max, .. } if min == 2020.0 && max == 2020.0
    ));
}

#[test]
fn numeric_extremes_map_to_palette_ends() {
    let t = counts(&[
        (1, 2018, "Bonneville", 3),
        (1, 2019, "Bonneville", 4),
        (1, 2020, "Bonneville", 5),
    ]);
    let agg = aggregate(&t, &by(&["YEAR"])).unwrap();
    let cmap = assign_colors(&agg, Some("YEAR"), &Palettes::default(), 50).unwrap();
    let keys = agg.series_keys();
    assert_eq!(cmap.get(&keys[0]), Some(Rgb::from_hex(SEQUENTIAL5[0]).unwrap()));
    assert_eq!(cmap.get(&keys[2]), Some(Rgb::from_hex(SEQUENTIAL5[4]).unwrap()));
    assert_ne!(cmap.get(&keys[1]), cmap.get(&keys[0]));
}

#[test]
fn assignment_is_deterministic() {
    let t = counts(&[
        (3, 2019, "Wells", 1),
        (1, 2020, "Bonneville", 2),
        (2, 2018, "McNary", 3),
        (1, 2019, "Bonneville", 4),
    ]);
    let agg = aggregate(&t, &by(&["YEAR", "LOCATION"])).unwrap();
    let palettes = Palettes::default();
    for col in [None, Some("YEAR"), Some("LOCATION")] {
        let a = assign_colors(&agg, col, &palettes, 50).unwrap();
        let b = assign_colors(&agg, col, &palettes, 50).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn categorical_palette_cycles_in_sorted_order() {
    let names: Vec<String> = (0..DAM_PALETTE.len() + 2)
        .map(|i| format!("Dam {i:02}"))
        .collect();
    let rows: Vec<(i64, i64, &str, i64)> =
        names.iter().map(|n| (1, 2020, n.as_str(), 1)).collect();
    let agg = aggregate(&counts(&rows), &by(&["LOCATION"])).unwrap();
    let cmap = assign_colors(&agg, Some("LOCATION"), &Palettes::default(), 50).unwrap();
    assert_eq!(cmap.policy, ColorPolicy::Categorical);

    let color_of = |name: &str| {
        let key = agg
            .series_keys()
            .into_iter()
            .find(|k| k.label() == name)
            .unwrap();
        cmap.get(&key).unwrap()
    };
    let pal = |i: usize| Rgb::from_hex(DAM_PALETTE[i]).unwrap();
    assert_eq!(color_of("Dam 00"), pal(0));
    assert_eq!(color_of("Dam 16"), pal(16));
    assert_eq!(color_of("Dam 17"), pal(0));
    assert_eq!(color_of("Dam 18"), pal(1));
}

#[test]
fn no_color_by_uses_default_palette_in_appearance_order() {
    let t = counts(&[(1, 2020, "Wells", 1), (2, 2020, "Bonneville", 2)]);
    let agg = aggregate(&t, &by(&["LOCATION"])).unwrap();
    let cmap = assign_colors(&agg, None, &Palettes::default(), 50).unwrap();
    let series = build_series(&agg, &cmap, None, ChartKind::Line).unwrap();
    assert_eq!(series[0].label, "Wells");
    assert_eq!(series[0].color, Rgb::from_hex(OFFICE10[0]).unwrap());
    assert_eq!(series[1].color, Rgb::from_hex(OFFICE10[1]).unwrap());
}

#[test]
fn empty_palette_is_rejected() {
    let ok = vec!["#000000".to_string()];
    assert!(Palettes::from_hex(&[], &ok, &ok).is_err());
    assert!(Palettes::from_hex(&ok, &ok, &["#GGGGGG".to_string()]).is_err());
}

#[test]
fn dam_keeps_its_color_when_another_is_filtered_out() {
    let t = counts(&[
        (1, 2020, "Bonneville", 3),
        (1, 2020, "McNary", 4),
        (1, 2020, "Wells", 5),
    ]);
    let palettes = Palettes::default();
    let color_of = |locations: &[&str], dam: &str| {
        let sel = Selection {
            x: "DOY".into(),
            group_by: vec!["LOCATION".into()],
            func: Some(AggFunc::Sum),
            color_by: Some("LOCATION".into()),
            locations: Some(locations.iter().map(|s| s.to_string()).collect()),
            ..Selection::default()
        };
        let agg = sel.apply(&t).unwrap();
        let cmap = assign_colors(&agg, Some("LOCATION"), &palettes, 50).unwrap();
        cmap.get(&SeriesKey(vec![Value::Text(dam.into())])).unwrap()
    };

    let wells = Rgb::from_hex("#A5BE00").unwrap();
    assert_eq!(color_of(&["Bonneville", "McNary", "Wells"], "Wells"), wells);
    assert_eq!(color_of(&["Bonneville", "Wells"], "Wells"), wells);
    assert_eq!(color_of(&["Wells"], "Wells"), wells);
    assert_eq!(
        color_of(&["McNary", "Wells"], "McNary"),
        Rgb::from_hex(DAM_COLORS[7].1).unwrap()
    );
}

#[test]
fn unnamed_values_cycle_after_named_ones_are_pinned() {
    let t = counts(&[
        (1, 2020, "Bonneville", 1),
        (1, 2020, "Zeta Weir", 1),
        (1, 2020, "Alpha Weir", 1),
    ]);
    let agg = aggregate(&t, &by(&["LOCATION"])).unwrap();
    let cmap = assign_colors(&agg, Some("LOCATION"), &Palettes::default(), 50).unwrap();
    let get = |name: &str| cmap.get(&SeriesKey(vec![Value::Text(name.into())])).unwrap();
    let pal = |i: usize| Rgb::from_hex(DAM_PALETTE[i]).unwrap();
    assert_eq!(get("Bonneville"), Rgb::from_hex("#0BB4FF").unwrap());
    assert_eq!(get("Alpha Weir"), pal(0));
    assert_eq!(get("Zeta Weir"), pal(1));
}
