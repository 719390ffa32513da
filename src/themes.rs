//! Rule-based theme detection.
//!
//! [`RULES`] is an ordered battery of independent rules. Each inspects a
//! [`ThemeContext`] and contributes zero or more [`Theme`]s; output order is
//! rule order and nothing is deduplicated or re-sorted. Column names are
//! matched case-insensitively against a fixed vocabulary, never fuzzily.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::{
    classify::Classifications,
    data::Table,
    stats::{ColumnStatistics, DistributionShape},
    trend::{self, TrendDirection, TrendResult},
};

const MARKET_COLUMNS: &[&str] = &["open", "high", "low", "close"];
const VOLATILITY_COLUMNS: &[&str] = &["high", "low"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeKind {
    Domain,
    Temporal,
    Volatility,
    Trend,
    Distribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub name: String,
    pub description: String,
    pub confidence: f64,
    pub indicators: Vec<String>,
    pub kind: ThemeKind,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

impl Theme {
    fn new(name: impl Into<String>, kind: ThemeKind, confidence: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            confidence,
            indicators: Vec::new(),
            kind,
            metrics: BTreeMap::new(),
        }
    }

    fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn indicators<I, S>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indicators = indicators.into_iter().map(Into::into).collect();
        self
    }

    fn metric(mut self, name: &str, value: f64) -> Self {
        if value.is_finite() {
            self.metrics.insert(name.to_string(), value);
        }
        self
    }
}

/// Everything a rule may look at.
pub struct ThemeContext<'a> {
    pub table: &'a Table,
    pub classifications: &'a Classifications,
    pub statistics: &'a [ColumnStatistics],
    /// Trend over the `close` column from [`close_price_trend`]; the trend
    /// rule reports nothing without it.
    pub price_trend: Option<&'a TrendResult>,
    pub trend_min_rows: usize,
}

impl ThemeContext<'_> {
    /// Stored names for every vocabulary entry, or `None` if any is missing.
    fn find_all(&self, vocabulary: &[&str]) -> Option<Vec<String>> {
        vocabulary
            .iter()
            .map(|name| self.table.find_column(name).map(str::to_string))
            .collect()
    }
}

pub struct ThemeRule {
    pub name: &'static str,
    pub evaluate: fn(&ThemeContext<'_>) -> Vec<Theme>,
}

pub const RULES: &[ThemeRule] = &[
    ThemeRule {
        name: "financial_market",
        evaluate: financial_market,
    },
    ThemeRule {
        name: "trading_volume",
        evaluate: trading_volume,
    },
    ThemeRule {
        name: "time_series",
        evaluate: time_series,
    },
    ThemeRule {
        name: "price_volatility",
        evaluate: price_volatility,
    },
    ThemeRule {
        name: "price_trend",
        evaluate: price_trend,
    },
    ThemeRule {
        name: "distribution",
        evaluate: distributions,
    },
];

pub fn detect_themes(context: &ThemeContext<'_>) -> Vec<Theme> {
    let mut themes = Vec::new();
    for rule in RULES {
        let found = (rule.evaluate)(context);
        debug!("Theme rule '{}' produced {} theme(s)", rule.name, found.len());
        themes.extend(found);
    }
    themes
}

/// Trend of the `close` column, computed only when the table has more than
/// `min_rows` rows.
pub fn close_price_trend(table: &Table, min_rows: usize) -> Option<TrendResult> {
    let close = table.find_column("close")?;
    if table.row_count() <= min_rows {
        return None;
    }
    let values = table.column_values(close).ok()?;
    Some(trend::fit_indexed(values.map(|cell| cell.as_number())))
}

fn financial_market(context: &ThemeContext<'_>) -> Vec<Theme> {
    let Some(columns) = context.find_all(MARKET_COLUMNS) else {
        return Vec::new();
    };
    vec![
        Theme::new("Financial Market Data", ThemeKind::Domain, 0.95)
            .describe("OHLC price columns indicate financial market or trading data")
            .indicators(columns),
    ]
}

fn trading_volume(context: &ThemeContext<'_>) -> Vec<Theme> {
    let Some(volume) = context.table.find_column("volume") else {
        return Vec::new();
    };
    vec![
        Theme::new("Trading Volume Analysis", ThemeKind::Domain, 0.9)
            .describe("A volume column enables liquidity and market-activity analysis")
            .indicators([volume]),
    ]
}

fn time_series(context: &ThemeContext<'_>) -> Vec<Theme> {
    let dates = context.classifications.dates();
    if dates.is_empty() {
        return Vec::new();
    }
    vec![
        Theme::new("Time Series Data", ThemeKind::Temporal, 0.85)
            .describe(format!(
                "Date column(s) {} support analysis over time",
                dates.join(", ")
            ))
            .indicators(dates),
    ]
}

fn price_volatility(context: &ThemeContext<'_>) -> Vec<Theme> {
    let Some(columns) = context.find_all(VOLATILITY_COLUMNS) else {
        return Vec::new();
    };
    let (Some(high), Some(low)) = (
        context.table.column_index(&columns[0]),
        context.table.column_index(&columns[1]),
    ) else {
        return Vec::new();
    };
    let ranges = context
        .table
        .rows()
        .iter()
        .filter_map(|row| {
            let high = row[high].as_number()?;
            let low = row[low].as_number()?;
            (low != 0.0).then(|| (high - low) / low)
        })
        .collect::<Vec<_>>();
    if ranges.is_empty() {
        return Vec::new();
    }
    let average = ranges.iter().sum::<f64>() / ranges.len() as f64;
    vec![
        Theme::new("Price Volatility Patterns", ThemeKind::Volatility, 0.8)
            .describe(format!(
                "Average intraday range of {:.2}% of the low price across {} row(s)",
                average * 100.0,
                ranges.len()
            ))
            .indicators(columns)
            .metric("average_volatility", average)
            .metric("rows", ranges.len() as f64),
    ]
}

fn price_trend(context: &ThemeContext<'_>) -> Vec<Theme> {
    let Some(close) = context.table.find_column("close") else {
        return Vec::new();
    };
    let Some(trend) = context.price_trend else {
        return Vec::new();
    };
    if trend.direction == TrendDirection::InsufficientData {
        return Vec::new();
    }
    let confidence = if trend.is_significant() { 0.8 } else { 0.5 };
    vec![
        Theme::new(
            format!("{} Price Trend", trend.direction.label()),
            ThemeKind::Trend,
            confidence,
        )
        .describe(format!(
            "Closing prices move {} with a fitted slope of {:.4} per row",
            trend.direction.label().to_ascii_lowercase(),
            trend.slope
        ))
        .indicators([close])
        .metric("slope", trend.slope),
    ]
}

fn distributions(context: &ThemeContext<'_>) -> Vec<Theme> {
    context
        .statistics
        .iter()
        .filter_map(|entry| {
            let stats = entry.stats.as_ref()?;
            let shape = stats.distribution();
            let description = match shape {
                DistributionShape::Normal => format!(
                    "'{}' is roughly symmetric (skewness {:.2})",
                    entry.column, stats.skewness
                ),
                DistributionShape::RightSkewed => format!(
                    "'{}' has a long right tail (skewness {:.2}); high values pull the mean above the median",
                    entry.column, stats.skewness
                ),
                DistributionShape::LeftSkewed => format!(
                    "'{}' has a long left tail (skewness {:.2}); low values pull the mean below the median",
                    entry.column, stats.skewness
                ),
            };
            Some(
                Theme::new(
                    format!("{} Distribution", shape.label()),
                    ThemeKind::Distribution,
                    0.7,
                )
                .describe(description)
                .indicators([entry.column.as_str()])
                .metric("skewness", stats.skewness)
                .metric("mean", stats.mean)
                .metric("median", stats.median),
            )
        })
        .collect()
}

pub fn render_rows(themes: &[Theme]) -> Vec<Vec<String>> {
    themes
        .iter()
        .map(|theme| {
            vec![
                theme.name.clone(),
                format!("{:.2}", theme.confidence),
                theme.indicators.join(", "),
                theme.description.clone(),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classify, config::AnalysisConfig, data::Cell, stats};

    fn table(columns: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        Table::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn run(table: &Table) -> Vec<Theme> {
        let config = AnalysisConfig::default();
        let classifications = classify::classify(table, &config);
        let statistics = classifications
            .numeric()
            .into_iter()
            .map(|column| ColumnStatistics {
                stats: stats::compute_stats(table.column_values(&column).expect("column")),
                column,
            })
            .collect::<Vec<_>>();
        let trend = close_price_trend(table, config.trend_min_rows);
        detect_themes(&ThemeContext {
            table,
            classifications: &classifications,
            statistics: &statistics,
            price_trend: trend.as_ref(),
            trend_min_rows: config.trend_min_rows,
        })
    }

    fn ohlc_rows(count: usize) -> Vec<Vec<Cell>> {
        (0..count)
            .map(|i| {
                let base = 10.0 + i as f64;
                vec![
                    Cell::Number(base),
                    Cell::Number(base + 2.0),
                    Cell::Number(base - 1.0),
                    Cell::Number(base + 1.0),
                ]
            })
            .collect()
    }

    #[test]
    fn market_columns_match_case_insensitively() {
        let t = table(&["Open", "HIGH", "low", "Close"], ohlc_rows(2));
        let themes = run(&t);
        let market = themes
            .iter()
            .find(|t| t.name == "Financial Market Data")
            .expect("market theme");
        assert_eq!(market.confidence, 0.95);
        assert_eq!(market.indicators, ["Open", "HIGH", "low", "Close"]);
    }

    #[test]
    fn rule_order_is_preserved() {
        let t = table(&["open", "high", "low", "close"], ohlc_rows(12));
        let names = run(&t).into_iter().map(|t| t.kind).collect::<Vec<_>>();
        assert_eq!(names[0], ThemeKind::Domain);
        assert_eq!(names[1], ThemeKind::Volatility);
        assert_eq!(names[2], ThemeKind::Trend);
        assert!(names[3..].iter().all(|k| *k == ThemeKind::Distribution));
        assert_eq!(names.len(), 3 + 4);
    }

    #[test]
    fn price_trend_requires_more_than_min_rows() {
        let t = table(&["open", "high", "low", "close"], ohlc_rows(10));
        assert!(run(&t).iter().all(|theme| theme.kind != ThemeKind::Trend));

        let t = table(&["open", "high", "low", "close"], ohlc_rows(11));
        let trend = run(&t)
            .into_iter()
            .find(|theme| theme.kind == ThemeKind::Trend)
            .expect("trend theme");
        assert_eq!(trend.name, "Upward Price Trend");
        assert_eq!(trend.confidence, 0.8);
    }

    #[test]
    fn trend_rule_reports_the_supplied_trend() {
        let t = table(&["open", "high", "low", "close"], ohlc_rows(12));
        let config = AnalysisConfig::default();
        let classifications = classify::classify(&t, &config);
        let mut context = ThemeContext {
            table: &t,
            classifications: &classifications,
            statistics: &[],
            price_trend: None,
            trend_min_rows: config.trend_min_rows,
        };
        assert!(price_trend(&context).is_empty());

        let falling = TrendResult {
            direction: TrendDirection::Downward,
            slope: -2.0,
            points: 12,
        };
        context.price_trend = Some(&falling);
        let themes = price_trend(&context);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, "Downward Price Trend");
        assert_eq!(themes[0].metrics["slope"], -2.0);
    }

    #[test]
    fn flat_close_gives_low_confidence_trend() {
        let rows = (0..12)
            .map(|_| vec![Cell::Number(5.0)])
            .collect::<Vec<_>>();
        let t = table(&["close"], rows);
        let trend = run(&t)
            .into_iter()
            .find(|theme| theme.kind == ThemeKind::Trend)
            .expect("trend theme");
        assert_eq!(trend.name, "Sideways Price Trend");
        assert_eq!(trend.confidence, 0.5);
    }

    #[test]
    fn volatility_skips_zero_lows() {
        let rows = vec![
            vec![Cell::Number(12.0), Cell::Number(10.0)],
            vec![Cell::Number(5.0), Cell::Number(0.0)],
        ];
        let t = table(&["high", "low"], rows);
        let volatility = run(&t)
            .into_iter()
            .find(|theme| theme.kind == ThemeKind::Volatility)
            .expect("volatility theme");
        assert!((volatility.metrics["average_volatility"] - 0.2).abs() < 1e-12);
        assert_eq!(volatility.metrics["rows"], 1.0);
    }

    #[test]
    fn tables_without_vocabulary_only_get_distributions() {
        let rows = vec![
            vec![Cell::Text("a".into()), Cell::Number(1.0)],
            vec![Cell::Text("b".into()), Cell::Number(2.0)],
        ];
        let t = table(&["label", "amount"], rows);
        let themes = run(&t);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, "Normal Distribution");
        assert_eq!(themes[0].indicators, ["amount"]);
    }
}
