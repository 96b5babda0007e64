use chrono::NaiveDate;
use salmon_signals::models::columns;
use salmon_signals::{AggFunc, Aggregation, Error, Selection, Table, Value, aggregate};
use std::collections::BTreeSet;

fn date(y: i32, m: u32, d: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Two Bonneville Chinook rows in January 2020.
fn bonneville() -> Table {
    Table::new(
        vec![
            "DATE".into(),
            "LOCATION".into(),
            "SPECIES".into(),
            "MONTH".into(),
            "COUNT".into(),
        ],
        vec![
            vec![
                date(2020, 1, 1),
                "Bonneville".into(),
                "Chinook".into(),
                Value::Int(1),
                Value::Int(10),
            ],
            vec![
                date(2020, 1, 2),
                "Bonneville".into(),
                "Chinook".into(),
                Value::Int(1),
                Value::Int(20),
            ],
        ],
    )
    .unwrap()
}

fn mixed() -> Table {
    let mut rows = Vec::new();
    for (doy, loc, sp, count) in [
        (1, "Bonneville", "Chinook", 5),
        (1, "Bonneville", "Chinook", 7),
        (1, "Bonneville", "Coho", 2),
        (2, "Bonneville", "Chinook", 9),
        (1, "The Dalles", "Chinook", 4),
        (2, "The Dalles", "Coho", 3),
        (2, "The Dalles", "Coho", 1),
    ] {
        rows.push(vec![
            Value::Int(doy),
            loc.into(),
            sp.into(),
            Value::Int(count),
        ]);
    }
    Table::new(
        vec![
            "DOY".into(),
            "LOCATION".into(),
            "SPECIES".into(),
            "COUNT".into(),
        ],
        rows,
    )
    .unwrap()
}

#[test]
fn daily_x_keeps_both_rows() {
    let plan = Aggregation::new("DATE", "COUNT", &["SPECIES"], Some(AggFunc::Sum));
    let agg = aggregate(&bonneville(), &plan).unwrap();
    assert_eq!(agg.table.len(), 2);
    assert_eq!(
        agg.table.column("COUNT").unwrap(),
        vec![&Value::Int(10), &Value::Int(20)]
    );
    let uids = agg.table.column(columns::UID).unwrap();
    assert!(uids.iter().all(|u| **u == Value::Text("Chinook".into())));
}

#[test]
fn monthly_x_sums_to_one_row() {
    let plan = Aggregation::new("MONTH", "COUNT", &["SPECIES"], Some(AggFunc::Sum));
    let agg = aggregate(&bonneville(), &plan).unwrap();
    assert_eq!(agg.table.len(), 1);
    assert_eq!(agg.table.column("COUNT").unwrap(), vec![&Value::Int(30)]);
    assert_eq!(agg.table.columns(), &["SPECIES", "MONTH", "COUNT", "UID"]);
}

#[test]
fn row_count_matches_distinct_key_tuples() {
    let t = mixed();
    for group in [
        vec!["SPECIES"],
        vec!["LOCATION"],
        vec!["LOCATION", "SPECIES"],
    ] {
        for func in [AggFunc::Mean, AggFunc::Median, AggFunc::Sum, AggFunc::StdDev] {
            let plan = Aggregation::new("DOY", "COUNT", &group, Some(func));
            let agg = aggregate(&t, &plan).unwrap();

            let mut key_cols = group.clone();
            key_cols.push("DOY");
            let idx: Vec<usize> = key_cols
                .iter()
                .map(|c| t.column_index(c).unwrap())
                .collect();
            let distinct: BTreeSet<Vec<Value>> = t
                .rows()
                .iter()
                .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
                .collect();
            assert_eq!(agg.table.len(), distinct.len(), "{group:?} {func}");
        }
    }
}

#[test]
fn summing_twice_changes_nothing() {
    let plan = Aggregation::new("DOY", "COUNT", &["LOCATION", "SPECIES"], Some(AggFunc::Sum));
    let once = aggregate(&mixed(), &plan).unwrap();
    let input = once.table.select(&["DOY", "LOCATION", "SPECIES", "COUNT"]).unwrap();
    let twice = aggregate(&input, &plan).unwrap();
    assert_eq!(once.table, twice.table);
}

#[test]
fn mean_median_and_std_per_group() {
    let plan = |f| Aggregation::new("DOY", "COUNT", &["LOCATION", "SPECIES"], Some(f));
    let mean = aggregate(&mixed(), &plan(AggFunc::Mean)).unwrap();
    // DOY 1 first, then LOCATION, then SPECIES
    assert_eq!(mean.table.rows()[0][3], Value::Float(6.0));

    let sd = aggregate(&mixed(), &plan(AggFunc::StdDev)).unwrap();
    let v = sd.table.rows()[0][3].as_f64().unwrap();
    assert!((v - 2f64.sqrt()).abs() < 1e-9);
    // single-value groups have no sample deviation
    assert!(sd.table.rows()[1][3].is_null());
}

#[test]
fn rows_sorted_by_x() {
    let plan = Aggregation::new("DOY", "COUNT", &["SPECIES"], Some(AggFunc::Mean));
    let agg = aggregate(&mixed(), &plan).unwrap();
    let xs: Vec<&Value> = agg.table.column("DOY").unwrap();
    let mut sorted = xs.clone();
    sorted.sort();
    assert_eq!(xs, sorted);
}

#[test]
fn unknown_function_passes_rows_through() {
    let plan = Aggregation::with_func_name("DOY", "COUNT", &["SPECIES"], "mode");
    assert_eq!(plan.func, None);
    let agg = aggregate(&mixed(), &plan).unwrap();
    assert_eq!(agg.table.len(), mixed().len());
}

#[test]
fn missing_column_is_reported() {
    let plan = Aggregation::new("DOY", "COUNT", &["RUN"], Some(AggFunc::Mean));
    match aggregate(&mixed(), &plan) {
        Err(Error::InvalidColumn { column, available }) => {
            assert_eq!(column, "RUN");
            assert!(available.contains(&"SPECIES".to_string()));
        }
        other => panic!("expected InvalidColumn, got {other:?}"),
    }
}

#[test]
fn text_value_column_is_rejected() {
    let plan = Aggregation::new("DOY", "SPECIES", &["LOCATION"], Some(AggFunc::Sum));
    assert!(matches!(
        aggregate(&mixed(), &plan),
        Err(Error::NonNumeric { .. })
    ));
}

#[test]
fn selection_filters_before_grouping() {
    let sel = Selection {
        group_by: vec!["LOCATION".into()],
        func: Some(AggFunc::Sum),
        species: Some(["Coho".to_string()].into_iter().collect()),
        ..Selection::default()
    };
    let agg = sel.apply(&mixed()).unwrap();
    let counts: Vec<&Value> = agg.table.column("COUNT").unwrap();
    assert_eq!(counts, vec![&Value::Int(2), &Value::Int(4)]);
}

#[test]
fn color_by_outside_group_by_is_rejected() {
    let sel = Selection {
        color_by: Some("LOCATION".into()),
        ..Selection::default()
    };
    assert!(matches!(
        sel.apply(&mixed()),
        Err(Error::InvalidColumn { .. })
    ));
}

#[test]
fn aggregate_off_keeps_every_row() {
    let sel = Selection {
        aggregate: false,
        color_by: Some("LOCATION".into()),
        ..Selection::default()
    };
    assert_eq!(sel.effective_color_by(), None);
    let agg = sel.apply(&mixed()).unwrap();
    assert_eq!(agg.table.len(), mixed().len());
    assert_eq!(agg.uid_columns, vec!["LOCATION".to_string(), "SPECIES".to_string()]);
}

#[test]
fn title_lists_sorted_groups() {
    let sel = Selection {
        group_by: vec!["SPECIES".into(), "LOCATION".into()],
        ..Selection::default()
    };
    assert_eq!(
        sel.title("Columbia River", &mixed()),
        "Columbia River Dam Analysis: SPECIES by LOCATION, SPECIES over DOY"
    );
}
