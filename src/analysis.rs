//! End-to-end analysis of one table.
//!
//! [`analyze`] sequences classification, quality, summary, segment, temporal,
//! statistical and correlation passes, then the theme rules and the narrative
//! layer, and returns a single [`AnalysisResult`]. The pipeline is synchronous
//! and deterministic: the same table and configuration always produce the same
//! result, and the table is never mutated.

use log::{debug, info};
use serde::Serialize;

use crate::{
    classify::{self, Classifications},
    config::AnalysisConfig,
    correlation::{self, Correlation},
    data::Table,
    error::AnalysisError,
    quality::{self, DataQuality},
    recommend::{self, Findings, Insight, Recommendation},
    segments::{self, DemographicBreakdown, SegmentPerformance},
    stats::{self, ColumnStatistics},
    summary::{self, ExecutiveSummary},
    temporal::{self, TemporalAnalysis},
    themes::{self, Theme, ThemeContext},
    trend::TrendResult,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub summary: ExecutiveSummary,
    pub classifications: Classifications,
    pub quality: DataQuality,
    pub statistics: Vec<ColumnStatistics>,
    pub correlations: Vec<Correlation>,
    /// Trend of the `close` column when the table is long enough.
    pub trend: Option<TrendResult>,
    pub temporal: Option<TemporalAnalysis>,
    pub performance: Option<SegmentPerformance>,
    pub demographics: Vec<DemographicBreakdown>,
    pub themes: Vec<Theme>,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    /// Free-text summary returned by a remote insight service, if one was merged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_summary: Option<String>,
}

/// Rejects tables with no shape to analyze.
pub fn ensure_analyzable(table: &Table) -> Result<(), AnalysisError> {
    if table.column_count() == 0 {
        return Err(AnalysisError::NoColumns);
    }
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }
    Ok(())
}

/// Descriptive statistics for each named column, in the given order.
pub fn column_statistics(table: &Table, columns: &[String]) -> Vec<ColumnStatistics> {
    columns
        .iter()
        .filter_map(|column| {
            let values = table.column_values(column).ok()?;
            Some(ColumnStatistics {
                column: column.clone(),
                stats: stats::compute_stats(values),
            })
        })
        .collect()
}

pub fn analyze(table: &Table, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
    ensure_analyzable(table)?;

    let classifications = classify::classify(table, config);
    let numeric = classifications.numeric();
    let dates = classifications.dates();
    let categorical = classifications.categorical();
    info!(
        "Classified {} column(s): {} numeric, {} date, {} categorical",
        classifications.len(),
        numeric.len(),
        dates.len(),
        categorical.len()
    );

    let quality = quality::assess(table);
    debug!("Data quality score {:.1}%", quality.score);

    let summary = summary::summarize(table, &numeric, dates.len(), categorical.len());
    let performance = segments::performance(table, &categorical, &numeric, config.max_segments);
    let demographics = segments::demographics(table, &categorical, config.top_values);
    let temporal = temporal::analyze(table, &dates, &numeric);
    let statistics = column_statistics(table, &numeric);
    let correlations =
        correlation::compute_correlations(table, &numeric, config.correlation_threshold);
    debug!(
        "Kept {} correlation(s) above |r| > {}",
        correlations.len(),
        config.correlation_threshold
    );
    let trend = themes::close_price_trend(table, config.trend_min_rows);

    let themes = themes::detect_themes(&ThemeContext {
        table,
        classifications: &classifications,
        statistics: &statistics,
        price_trend: trend.as_ref(),
        trend_min_rows: config.trend_min_rows,
    });
    info!("Detected {} theme(s)", themes.len());

    let findings = Findings {
        quality: &quality,
        statistics: &statistics,
        correlations: &correlations,
        trend: trend.as_ref(),
        temporal: temporal.as_ref(),
        performance: performance.as_ref(),
        completeness_target: config.completeness_target,
    };
    let insights = recommend::insights(&findings);
    let recommendations = recommend::recommendations(&findings);

    Ok(AnalysisResult {
        summary,
        classifications,
        quality,
        statistics,
        correlations,
        trend,
        temporal,
        performance,
        demographics,
        themes,
        insights,
        recommendations,
        remote_summary: None,
    })
}
