mod common;

use chrono::NaiveDate;
use common::{campaign_csv, market_csv, text_table};
use csv_insight::{
    analysis::analyze,
    config::AnalysisConfig,
    data::Table,
    error::AnalysisError,
    io_utils::read_csv_table,
    recommend::Priority,
    trend::TrendDirection,
};
use encoding_rs::UTF_8;
use proptest::prelude::*;

fn load(csv: &str) -> Table {
    read_csv_table(csv.as_bytes(), b',', UTF_8).expect("csv")
}

#[test]
fn structurally_empty_tables_fail_without_a_result() {
    let no_columns = load("");
    assert_eq!(
        analyze(&no_columns, &AnalysisConfig::default()),
        Err(AnalysisError::NoColumns)
    );

    let header_only = load("a,b,c\n");
    assert_eq!(
        analyze(&header_only, &AnalysisConfig::default()),
        Err(AnalysisError::EmptyTable)
    );
}

#[test]
fn campaign_export_gets_campaign_kpis() {
    let result = analyze(&load(campaign_csv()), &AnalysisConfig::default()).expect("analysis");
    let summary = &result.summary;
    assert!(summary.campaign_metrics);
    assert_eq!(summary.total_records, 6);
    assert_eq!(summary.total_columns, 8);
    assert_eq!(summary.date_columns, 1);
    assert_eq!(summary.categorical_columns, 2);
    assert_eq!(summary.numeric_columns, 5);

    let kpi = |label: &str| {
        summary
            .kpis
            .iter()
            .find(|k| k.label == label)
            .map(|k| k.value)
            .unwrap_or_else(|| panic!("missing KPI {label}"))
    };
    assert!((kpi("Total Spend") - 163.5).abs() < 1e-9);
    assert!((kpi("Total Revenue") - 640.0).abs() < 1e-9);
    assert!((kpi("CTR") - 305.0 / 11800.0 * 100.0).abs() < 1e-9);
    assert!((kpi("ROI") - (640.0 - 163.5) / 163.5 * 100.0).abs() < 1e-9);
}

#[test]
fn segments_demographics_and_timeline_are_reported() {
    let result = analyze(&load(campaign_csv()), &AnalysisConfig::default()).expect("analysis");

    let performance = result.performance.as_ref().expect("segments");
    assert_eq!(performance.dimension, "channel");
    assert_eq!(performance.metric, "impressions");
    let labels = performance
        .segments
        .iter()
        .map(|s| s.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels, ["social", "search", "display"]);
    assert_eq!(performance.segments[1].count, 3);

    assert_eq!(result.demographics.len(), 1);
    let region = &result.demographics[0];
    assert_eq!(region.column, "region");
    assert_eq!(region.distinct, 3);
    assert_eq!(region.top_values[0].value, "north");
    assert_eq!(region.top_values[0].count, 3);
    assert!((region.top_values[0].percent - 50.0).abs() < 1e-9);

    let temporal = result.temporal.as_ref().expect("temporal");
    assert_eq!(temporal.column, "date");
    assert_eq!(temporal.start, NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"));
    assert_eq!(temporal.span_days, 5);
    assert_eq!(temporal.distinct_dates, 6);
}

#[test]
fn rising_market_gets_an_upward_headline_trend() {
    let result = analyze(&load(&market_csv(20)), &AnalysisConfig::default()).expect("analysis");
    let trend = result.trend.as_ref().expect("trend");
    assert_eq!(trend.direction, TrendDirection::Upward);
    assert_eq!(trend.points, 20);
    assert!(
        result
            .recommendations
            .iter()
            .any(|r| r.priority == Priority::Low && r.category == "trend")
    );
}

#[test]
fn incomplete_columns_raise_high_priority_recommendations() {
    let table = text_table(
        &["id", "score"],
        &[
            &["1", "10"],
            &["2", ""],
            &["3", ""],
            &["4", "7"],
            &["5", "9"],
        ],
    );
    let result = analyze(&table, &AnalysisConfig::default()).expect("analysis");
    let score = result
        .quality
        .columns
        .iter()
        .find(|c| c.column == "score")
        .expect("score quality");
    assert!((score.completeness - 60.0).abs() < 1e-9);
    assert_eq!(result.recommendations[0].priority, Priority::High);
    assert!(result.recommendations[0].title.contains("score"));
    for window in result.recommendations.windows(2) {
        assert!(window[0].priority <= window[1].priority);
    }
}

#[test]
fn presets_differ_only_where_configured() {
    let table = load(campaign_csv());
    let exploratory = analyze(&table, &AnalysisConfig::exploratory()).expect("exploratory");
    let comprehensive = analyze(&table, &AnalysisConfig::comprehensive()).expect("comprehensive");
    assert!(
        exploratory.correlations.len() >= comprehensive.correlations.len(),
        "a higher floor never reports more pairs"
    );
    assert!(
        comprehensive
            .correlations
            .iter()
            .all(|c| c.coefficient.abs() > 0.3)
    );
    assert_eq!(
        exploratory.classifications.dates(),
        comprehensive.classifications.dates()
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn analysis_is_deterministic(
        rows in prop::collection::vec(
            (
                0u32..5,
                -500.0f64..500.0,
                prop_oneof![Just(String::new()), (0i64..1000).prop_map(|n| n.to_string())],
            ),
            1..40,
        )
    ) {
        let mut csv = String::from("segment,amount,count\n");
        for (segment, amount, count) in &rows {
            csv.push_str(&format!("s{segment},{amount:.3},{count}\n"));
        }
        let table = load(&csv);
        let config = AnalysisConfig::default();
        let first = analyze(&table, &config).expect("analysis");
        let second = analyze(&table, &config).expect("analysis");
        prop_assert_eq!(
            serde_json::to_string(&first).expect("json"),
            serde_json::to_string(&second).expect("json")
        );

        let kinds = first.classifications.len();
        prop_assert_eq!(
            kinds,
            first.summary.numeric_columns
                + first.summary.date_columns
                + first.summary.categorical_columns
        );
    }
}
