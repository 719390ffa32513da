//! Narrative insights and prioritized recommendations.
//!
//! Both are derived purely from already computed results; no new statistics
//! are calculated here.

use serde::Serialize;

use crate::{
    correlation::{Correlation, CorrelationStrength},
    quality::DataQuality,
    segments::SegmentPerformance,
    stats::{ColumnStatistics, DistributionShape},
    temporal::TemporalAnalysis,
    trend::{TrendDirection, TrendResult},
};

/// Completeness below this percentage makes a quality gap high priority.
const CRITICAL_COMPLETENESS: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Rules,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub category: String,
    pub title: String,
    pub detail: String,
    pub source: Source,
}

impl Insight {
    pub fn new(category: &str, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            title: title.into(),
            detail: detail.into(),
            source: Source::Rules,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub title: String,
    pub detail: String,
    pub source: Source,
}

impl Recommendation {
    pub fn new(
        priority: Priority,
        category: &str,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            priority,
            category: category.to_string(),
            title: title.into(),
            detail: detail.into(),
            source: Source::Rules,
        }
    }
}

/// Inputs shared by the insight and recommendation rules.
pub struct Findings<'a> {
    pub quality: &'a DataQuality,
    pub statistics: &'a [ColumnStatistics],
    pub correlations: &'a [Correlation],
    pub trend: Option<&'a TrendResult>,
    pub temporal: Option<&'a TemporalAnalysis>,
    pub performance: Option<&'a SegmentPerformance>,
    pub completeness_target: f64,
}

impl Findings<'_> {
    /// The headline trend, falling back to the date-ordered trend.
    fn headline_trend(&self) -> Option<(&TrendResult, String)> {
        if let Some(trend) = self.trend {
            return Some((trend, "close".to_string()));
        }
        let temporal = self.temporal?;
        let trend = temporal.trend.as_ref()?;
        let metric = temporal.metric.clone().unwrap_or_default();
        Some((trend, metric))
    }
}

pub fn insights(findings: &Findings<'_>) -> Vec<Insight> {
    let mut insights = Vec::new();

    insights.push(Insight::new(
        "quality",
        format!("Data completeness {:.1}%", findings.quality.score),
        format!(
            "{} of {} column(s) are fully populated",
            findings
                .quality
                .columns
                .iter()
                .filter(|c| c.missing == 0)
                .count(),
            findings.quality.columns.len()
        ),
    ));

    if let Some(strongest) = findings.correlations.first() {
        insights.push(Insight::new(
            "correlation",
            format!(
                "{} relationship between {} and {}",
                strongest.strength.label(),
                strongest.column_a,
                strongest.column_b
            ),
            format!(
                "Pearson r = {:.3} across {} paired row(s)",
                strongest.coefficient, strongest.pairs
            ),
        ));
    }

    if let Some((trend, metric)) = findings.headline_trend()
        && trend.direction != TrendDirection::InsufficientData
    {
        insights.push(Insight::new(
            "trend",
            format!("{} trend in {metric}", trend.direction.label()),
            format!(
                "Least-squares slope {:.4} over {} point(s)",
                trend.slope, trend.points
            ),
        ));
    }

    if let Some(temporal) = findings.temporal {
        insights.push(Insight::new(
            "temporal",
            format!("{} day(s) of history in {}", temporal.span_days, temporal.column),
            format!(
                "From {} to {} with {} distinct date(s)",
                temporal.start, temporal.end, temporal.distinct_dates
            ),
        ));
    }

    for entry in findings.statistics {
        if let Some(stats) = &entry.stats
            && !stats.outliers.is_empty()
        {
            insights.push(Insight::new(
                "statistics",
                format!("{} outlier(s) in {}", stats.outliers.len(), entry.column),
                format!(
                    "Values outside [{:.2}, {:.2}] fall beyond 1.5 x IQR",
                    stats.lower_fence, stats.upper_fence
                ),
            ));
        }
    }

    if let Some(performance) = findings.performance
        && let Some(best) = performance.best()
    {
        insights.push(Insight::new(
            "performance",
            format!("{} leads {}", best.label, performance.dimension),
            format!(
                "{} total {} across {} row(s)",
                crate::data::format_number(best.total),
                performance.metric,
                best.count
            ),
        ));
    }

    insights
}

pub fn recommendations(findings: &Findings<'_>) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for column in findings.quality.below(findings.completeness_target) {
        let priority = if column.completeness < CRITICAL_COMPLETENESS {
            Priority::High
        } else {
            Priority::Medium
        };
        recommendations.push(Recommendation::new(
            priority,
            "data_quality",
            format!("Fill missing values in {}", column.column),
            format!(
                "{} of {} row(s) are empty ({:.1}% complete)",
                column.missing,
                column.missing + column.present,
                column.completeness
            ),
        ));
    }

    if let Some((trend, metric)) = findings.headline_trend() {
        match trend.direction {
            TrendDirection::Downward => recommendations.push(Recommendation::new(
                Priority::High,
                "trend",
                format!("Investigate the decline in {metric}"),
                format!("The fitted slope is {:.4} per step", trend.slope),
            )),
            TrendDirection::Upward => recommendations.push(Recommendation::new(
                Priority::Low,
                "trend",
                format!("Sustain the growth in {metric}"),
                format!("The fitted slope is {:.4} per step", trend.slope),
            )),
            TrendDirection::Sideways | TrendDirection::InsufficientData => {}
        }
    }

    if let Some(performance) = findings.performance {
        if let Some(best) = performance.best() {
            recommendations.push(Recommendation::new(
                Priority::Medium,
                "performance",
                format!("Scale what works in {}", best.label),
                format!(
                    "Highest {} total by {} ({})",
                    performance.metric,
                    performance.dimension,
                    crate::data::format_number(best.total)
                ),
            ));
        }
        if let Some(worst) = performance.worst() {
            recommendations.push(Recommendation::new(
                Priority::Medium,
                "performance",
                format!("Review {}", worst.label),
                format!(
                    "Lowest {} total by {} ({})",
                    performance.metric,
                    performance.dimension,
                    crate::data::format_number(worst.total)
                ),
            ));
        }
    }

    for correlation in findings
        .correlations
        .iter()
        .filter(|c| c.strength == CorrelationStrength::VeryStrong)
    {
        recommendations.push(Recommendation::new(
            Priority::Medium,
            "correlation",
            format!(
                "Use {} as a leading indicator for {}",
                correlation.column_a, correlation.column_b
            ),
            format!("r = {:.3}", correlation.coefficient),
        ));
    }

    for entry in findings.statistics {
        if let Some(stats) = &entry.stats
            && stats.distribution() == DistributionShape::RightSkewed
            && !stats.outliers.is_empty()
        {
            recommendations.push(Recommendation::new(
                Priority::Low,
                "statistics",
                format!("Report the median for {}", entry.column),
                format!(
                    "Median {:.2} is more robust than mean {:.2} for this right-skewed column",
                    stats.median, stats.mean
                ),
            ));
        }
    }

    recommendations.sort_by_key(|r| r.priority);
    recommendations
}

pub fn render_rows(recommendations: &[Recommendation]) -> Vec<Vec<String>> {
    recommendations
        .iter()
        .map(|r| {
            vec![
                r.priority.as_str().to_string(),
                r.category.clone(),
                r.title.clone(),
                r.detail.clone(),
            ]
        })
        .collect()
}
