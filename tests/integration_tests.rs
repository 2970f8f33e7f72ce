use datapivot::filter;
use datapivot::ir::{RenderRow, SeriesKey};
use datapivot::settings::{
    ConditionType, ConditionalFormat, DatapointSettings, DescriptionSettings, FilterLogic,
    FilterRule, Quantifier, RowOverride, RuleValue, SortOrder, SortRule,
};
use datapivot::style::Style;
use datapivot::{apply_transformations, Action, Dataset, OverrideTableState, Row, Settings, SettingsStore};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn endpoints() -> Dataset {
    Dataset::from_json(&json!([
        {"study": "Smith 2001", "endpoint": "liver weight", "noel": 10, "loel": 30, "study id": 11},
        {"study": "Jones 1999", "endpoint": "body weight", "noel": 3, "loel": 10, "study id": 12},
        {"study": "Smith 2001", "endpoint": "kidney lesions", "noel": "NR", "loel": 100, "study id": 11},
        {"study": "Adams 2010", "endpoint": "liver weight", "noel": 1, "loel": null, "study id": 13},
        {"study": "Brown 2005", "endpoint": "survival", "noel": null, "loel": null, "study id": 14}
    ]))
    .unwrap()
}

fn settings() -> Settings {
    Settings::from_json_str(
        r#"{
            "datapoint_settings": [
                {"field_name": "noel", "header_name": "NOEL", "marker_style": "circle hollow"},
                {"field_name": "loel", "header_name": "LOEL", "marker_style": "circle filled"}
            ],
            "description_settings": [
                {"field_name": "study", "header_name": "Study", "dpe": "study"},
                {"field_name": "endpoint", "header_name": "Endpoint"}
            ],
            "sorts": [{"field_name": "study", "order": "asc"}]
        }"#,
    )
    .unwrap()
}

fn pks(rows: &[RenderRow]) -> Vec<usize> {
    rows.iter().map(|r| r.pk).collect()
}

#[test]
fn test_end_to_end_render_data() {
    let out = apply_transformations(&endpoints(), &settings());

    // Brown has no numeric series value
    assert_eq!(pks(&out.rows), vec![3, 1, 0, 2]);
    assert_eq!(out.headers.len(), 2);
    assert_eq!(out.headers[0].text, "Study");

    let first = &out.rows[0];
    assert_eq!(first.descriptions, vec!["Adams 2010", "liver weight"]);
    assert_eq!(first.links[0].as_ref().unwrap().id, "13");
    match first.style(SeriesKey::Points(1)) {
        Some(Style::Symbol(s)) => assert_eq!(s.name, "circle filled"),
        other => panic!("unexpected style {:?}", other),
    }
}

#[test]
fn test_filters_sorts_and_overrides_compose() {
    let mut settings = settings();
    settings.filters.push(FilterRule::new("endpoint", Quantifier::Contains, RuleValue::Text("weight".into())));
    settings.sorts = vec![SortRule::new("noel", SortOrder::Desc)];
    settings.row_overrides.push(RowOverride { index: Some(0), ..RowOverride::new(3) });

    let out = apply_transformations(&endpoints(), &settings);
    assert_eq!(pks(&out.rows), vec![3, 0, 1]);
    let indexes: Vec<usize> = out.rows.iter().map(|r| r.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[test]
fn test_custom_query_and_bad_query() {
    let mut settings = settings();
    settings.filters = vec![
        FilterRule::new("study", Quantifier::Contains, RuleValue::Text("smith".into())),
        FilterRule::new("noel", Quantifier::Lte, RuleValue::Number(3.0)),
    ];
    settings.plot_settings.filter_logic = FilterLogic::Custom;

    settings.plot_settings.filter_query = "1 or 2".into();
    let out = apply_transformations(&endpoints(), &settings);
    assert_eq!(pks(&out.rows), vec![3, 1, 0, 2]);

    settings.plot_settings.filter_query = "not 1 and 2".into();
    let out = apply_transformations(&endpoints(), &settings);
    assert_eq!(pks(&out.rows), vec![3, 1]);

    settings.plot_settings.filter_query = "1 and 3".into();
    assert!(apply_transformations(&endpoints(), &settings).rows.is_empty());
}

#[test]
fn test_merged_descriptions() {
    let mut settings = settings();
    settings.plot_settings.merge_descriptions = true;
    settings.plot_settings.merge_until = Some(0);
    let out = apply_transformations(&endpoints(), &settings);

    // the two Smith rows are adjacent after sorting
    assert_eq!(out.rows[3].descriptions, vec!["", "kidney lesions"]);
    assert!(out.rows[3].merged);
    assert!(!out.rows[2].merged);
}

#[test]
fn test_store_edits_render() {
    let mut store = SettingsStore::new(endpoints(), settings());
    store.dispatch(Action::SyncLegend).unwrap();
    store
        .dispatch(Action::AddFilter(FilterRule::new("loel", Quantifier::Gte, RuleValue::Number(30.0))))
        .unwrap();
    assert_eq!(store.override_state(), OverrideTableState::RebuildRequired);
    store.dispatch(Action::RebuildOverrides).unwrap();

    let out = store.render();
    assert_eq!(pks(&out.rows), vec![0, 2]);
    assert_eq!(out.legend.len(), 2);
    assert_eq!(out.legend[0].label, "NOEL");

    let reloaded = Settings::from_json_str(&store.persist().unwrap()).unwrap();
    assert_eq!(reloaded.row_overrides, store.settings().row_overrides);
}

#[test]
fn test_empty_dataset() {
    let out = apply_transformations(&Dataset::new(Vec::new()), &settings());
    assert!(out.rows.is_empty());
    assert_eq!(out.headers.len(), 2);
}

// =============================================================================
// Properties
// =============================================================================

fn numbered_rows(values: &[i32]) -> Vec<RenderRow> {
    values
        .iter()
        .enumerate()
        .map(|(pk, v)| RenderRow::new(pk, Row::new().with("v", *v as f64).with("g", (v % 3) as f64)))
        .collect()
}

fn size_of(row: &RenderRow) -> f64 {
    match row.style(SeriesKey::Points(0)) {
        Some(Style::Symbol(s)) => s.size,
        _ => f64::NAN,
    }
}

proptest! {
    #[test]
    fn prop_and_filter_idempotent(values in prop::collection::vec(-50i32..50, 0..40), bound in -50i32..50) {
        let rules = vec![FilterRule::new("v", Quantifier::Gt, RuleValue::Number(bound as f64))];
        let once = filter::apply(numbered_rows(&values), &rules, FilterLogic::And, "");
        let twice = filter::apply(once.clone(), &rules, FilterLogic::And, "");
        prop_assert_eq!(pks(&once), pks(&twice));
    }

    #[test]
    fn prop_or_filter_is_union(values in prop::collection::vec(-50i32..50, 0..40)) {
        let rules = vec![
            FilterRule::new("v", Quantifier::Lt, RuleValue::Number(0.0)),
            FilterRule::new("g", Quantifier::Exact, RuleValue::Number(0.0)),
        ];
        let mut kept = pks(&filter::apply(numbered_rows(&values), &rules, FilterLogic::Or, ""));
        kept.sort_unstable();
        let expected: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v < 0 || **v % 3 == 0)
            .map(|(pk, _)| pk)
            .collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn prop_sort_is_stable(values in prop::collection::vec(0i32..5, 0..40)) {
        let sorted = datapivot::sort::sort(numbered_rows(&values), &[SortRule::new("v", SortOrder::Asc)]);
        for pair in sorted.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.field("v") == b.field("v") {
                prop_assert!(a.pk < b.pk);
            }
        }
        let untouched = datapivot::sort::sort(numbered_rows(&values), &[]);
        prop_assert_eq!(pks(&untouched), (0..values.len()).collect::<Vec<_>>());
    }

    #[test]
    fn prop_sort_dotted_values_is_ordered(values in prop::collection::vec("[0-9a.]{0,7}", 0..40)) {
        let rows: Vec<RenderRow> = values
            .iter()
            .enumerate()
            .map(|(pk, v)| RenderRow::new(pk, Row::new().with("v", v.as_str())))
            .collect();
        let sorted = datapivot::sort::sort(rows, &[SortRule::new("v", SortOrder::Asc)]);
        prop_assert_eq!(sorted.len(), values.len());
        for pair in sorted.windows(2) {
            let (a, b) = (pair[0].field("v").to_string(), pair[1].field("v").to_string());
            prop_assert_ne!(datapivot::sort::natural_cmp(&a, &b), std::cmp::Ordering::Greater);
        }
    }

    #[test]
    fn prop_point_size_monotonic(values in prop::collection::vec(0i32..1000, 2..30)) {
        let data = Dataset::new(values.iter().map(|v| Row::new().with("v", *v as f64)).collect());
        let mut settings = Settings::default();
        settings.datapoint_settings.push(DatapointSettings {
            field_name: "v".into(),
            conditional_formatting: vec![ConditionalFormat::new("v", ConditionType::PointSize)],
            ..DatapointSettings::default()
        });
        let out = apply_transformations(&data, &settings);
        for a in &out.rows {
            let size = size_of(a);
            prop_assert!((50.0..=150.0).contains(&size));
            for b in &out.rows {
                if a.field("v").as_number() < b.field("v").as_number() {
                    prop_assert!(size <= size_of(b));
                }
            }
        }
    }
}

// =============================================================================
// Binary
// =============================================================================

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("datapivot-it-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn run_datapivot(data: &PathBuf, settings: &PathBuf) -> Result<Value, String> {
    let output = Command::new(env!("CARGO_BIN_EXE_datapivot"))
        .arg(data)
        .arg(settings)
        .output()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if output.status.success() {
        serde_json::from_slice(&output.stdout).map_err(|e| e.to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

#[test]
fn test_cli_csv_input() {
    let data = write_temp("rows.csv", "study,dose\nB,10\nA,5\nC,\n");
    let settings = write_temp(
        "csv-settings.json",
        &json!({
            "datapoint_settings": [{"field_name": "dose"}],
            "description_settings": [{"field_name": "study"}],
            "sorts": [{"field_name": "study", "order": "asc"}]
        })
        .to_string(),
    );

    let out = run_datapivot(&data, &settings).unwrap();
    let rows = out["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["descriptions"], json!(["A"]));
    assert_eq!(rows[0]["styles"]["points_0"]["type"], "symbol");
}

#[test]
fn test_cli_rejects_bad_settings() {
    let data = write_temp("rows.json", r#"[{"dose": 1}]"#);
    let settings = write_temp("bad-settings.json", "{not json");
    let err = run_datapivot(&data, &settings).unwrap_err();
    assert!(err.contains("settings"), "stderr: {}", err);
}

#[test]
fn test_description_defaults_deserialize() {
    let d: DescriptionSettings = serde_json::from_str(r#"{"field_name": "study"}"#).unwrap();
    assert_eq!(d.header_style, "header");
    assert_eq!(d.text_style, "base");
}
