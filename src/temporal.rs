use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    data::Table,
    trend::{self, TrendResult},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalAnalysis {
    pub column: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub span_days: i64,
    pub distinct_dates: usize,
    /// Metric trended against days since `start`.
    pub metric: Option<String>,
    pub trend: Option<TrendResult>,
}

/// Date coverage of the first date column and, when a numeric column exists,
/// the trend of the first numeric column over elapsed days.
pub fn analyze(table: &Table, dates: &[String], numeric: &[String]) -> Option<TemporalAnalysis> {
    let column = dates.first()?;
    let date_idx = table.column_index(column)?;
    let parsed = table
        .rows()
        .iter()
        .map(|row| row[date_idx].as_date())
        .collect::<Vec<_>>();
    let distinct = parsed.iter().flatten().copied().collect::<BTreeSet<_>>();
    let start = *distinct.first()?;
    let end = *distinct.last()?;

    let metric_idx = numeric
        .first()
        .and_then(|name| table.column_index(name).map(|idx| (name, idx)));
    let (metric, trend) = match metric_idx {
        Some((name, idx)) => {
            let points = table.rows().iter().zip(&parsed).filter_map(|(row, date)| {
                let elapsed = (*date)?.signed_duration_since(start).num_days() as f64;
                Some((elapsed, row[idx].as_number()?))
            });
            (Some(name.clone()), Some(trend::fit_trend(points)))
        }
        None => (None, None),
    };

    Some(TemporalAnalysis {
        column: column.clone(),
        start,
        end,
        span_days: end.signed_duration_since(start).num_days(),
        distinct_dates: distinct.len(),
        metric,
        trend,
    })
}
