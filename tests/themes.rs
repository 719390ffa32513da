mod common;

use common::{market_csv, numeric_column, text_table};
use csv_insight::{
    analysis::{analyze, column_statistics},
    classify::classify,
    config::AnalysisConfig,
    data::{Cell, Table},
    io_utils::read_csv_table,
    themes::{RULES, ThemeContext, ThemeKind, close_price_trend, detect_themes},
};
use encoding_rs::UTF_8;

fn themes_for(table: &Table) -> Vec<csv_insight::themes::Theme> {
    let config = AnalysisConfig::default();
    let classifications = classify(table, &config);
    let statistics = column_statistics(table, &classifications.numeric());
    let trend = close_price_trend(table, config.trend_min_rows);
    detect_themes(&ThemeContext {
        table,
        classifications: &classifications,
        statistics: &statistics,
        price_trend: trend.as_ref(),
        trend_min_rows: config.trend_min_rows,
    })
}

#[test]
fn ohlc_records_are_financial_market_data() {
    let records = serde_json::json!([
        {"open": 10, "high": 12, "low": 9, "close": 11},
        {"open": 11, "high": 13, "low": 10, "close": 12}
    ]);
    let table = Table::from_json_records(&records).expect("table");
    let themes = themes_for(&table);

    let market = themes
        .iter()
        .find(|t| t.name == "Financial Market Data")
        .expect("financial market theme");
    assert_eq!(market.confidence, 0.95);
    assert_eq!(market.indicators, ["open", "high", "low", "close"]);
    assert_eq!(market.kind, ThemeKind::Domain);
}

#[test]
fn two_rows_are_too_few_for_a_price_trend() {
    let table = text_table(
        &["open", "high", "low", "close"],
        &[&["10", "12", "9", "11"], &["11", "13", "10", "12"]],
    );
    assert!(close_price_trend(&table, 10).is_none());
    let themes = themes_for(&table);
    assert!(!themes.iter().any(|t| t.kind == ThemeKind::Trend));
}

#[test]
fn full_market_table_fires_rules_in_order() {
    let table = read_csv_table(market_csv(15).as_bytes(), b',', UTF_8).expect("csv");
    let themes = themes_for(&table);
    let names = themes.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();

    assert_eq!(
        &names[..5],
        [
            "Financial Market Data",
            "Trading Volume Analysis",
            "Time Series Data",
            "Price Volatility Patterns",
            "Upward Price Trend",
        ]
    );
    assert!(names[5..].iter().all(|n| n.ends_with("Distribution")));
    let trend = &themes[4];
    assert_eq!(trend.confidence, 0.8);
    assert!((trend.metrics["slope"] - 1.0).abs() < 1e-9);
}

#[test]
fn volatility_ignores_zero_lows() {
    let table = text_table(
        &["high", "low"],
        &[&["12", "10"], &["5", "0"], &["22", "20"]],
    );
    let themes = themes_for(&table);
    let volatility = themes
        .iter()
        .find(|t| t.kind == ThemeKind::Volatility)
        .expect("volatility theme");
    let average = volatility.metrics["average_volatility"];
    assert!((average - 0.15).abs() < 1e-12, "average {average}");
    assert_eq!(volatility.metrics["rows"], 2.0);
}

#[test]
fn volatility_needs_a_usable_row() {
    let table = text_table(&["high", "low"], &[&["5", "0"], &["x", "y"]]);
    assert!(!themes_for(&table).iter().any(|t| t.kind == ThemeKind::Volatility));
}

#[test]
fn skewed_column_yields_right_skewed_theme() {
    let table = numeric_column("spend", &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
    let themes = themes_for(&table);
    assert_eq!(themes.len(), 1);
    assert_eq!(themes[0].name, "Right-Skewed Distribution");
    assert_eq!(themes[0].indicators, ["spend"]);
}

#[test]
fn flat_close_prices_trend_sideways() {
    let rows = (0..12)
        .map(|_| vec![Cell::Number(50.0)])
        .collect::<Vec<_>>();
    let table = Table::new(vec!["Close".to_string()], rows);
    let themes = themes_for(&table);
    let trend = themes
        .iter()
        .find(|t| t.kind == ThemeKind::Trend)
        .expect("trend theme");
    assert_eq!(trend.name, "Sideways Price Trend");
    assert_eq!(trend.confidence, 0.5);
    assert_eq!(trend.indicators, ["Close"]);
}

#[test]
fn analysis_reports_the_same_themes() {
    let table = read_csv_table(market_csv(15).as_bytes(), b',', UTF_8).expect("csv");
    let result = analyze(&table, &AnalysisConfig::default()).expect("analysis");
    assert_eq!(result.themes, themes_for(&table));
    assert_eq!(RULES.len(), 6);
}
