//! Plain-text report for an [`AnalysisResult`].

use crate::{
    analysis::AnalysisResult,
    classify::Classifications,
    correlation, quality, recommend, segments, stats,
    table::render_section,
    themes,
};

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|h| h.to_string()).collect()
}

pub fn classification_rows(classifications: &Classifications) -> Vec<Vec<String>> {
    classifications
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.kind.to_string(),
                c.sampled.to_string(),
                format!("{:.0}%", c.numeric_ratio * 100.0),
                format!("{:.0}%", c.date_ratio * 100.0),
            ]
        })
        .collect()
}

pub fn classification_headers() -> Vec<String> {
    headers(&["column", "kind", "sampled", "numeric", "date"])
}

pub fn correlation_headers() -> Vec<String> {
    headers(&["column_a", "column_b", "r", "strength", "direction", "pairs"])
}

pub fn theme_headers() -> Vec<String> {
    headers(&["theme", "confidence", "indicators", "description"])
}

pub fn render(result: &AnalysisResult) -> String {
    let mut sections = Vec::new();

    let summary = &result.summary;
    let mut overview = vec![
        vec!["records".to_string(), summary.total_records.to_string()],
        vec!["columns".to_string(), summary.total_columns.to_string()],
        vec!["numeric".to_string(), summary.numeric_columns.to_string()],
        vec!["date".to_string(), summary.date_columns.to_string()],
        vec![
            "categorical".to_string(),
            summary.categorical_columns.to_string(),
        ],
        vec![
            "quality score".to_string(),
            format!("{:.1}%", result.quality.score),
        ],
    ];
    overview.extend(
        summary
            .kpis
            .iter()
            .map(|kpi| vec![kpi.label.clone(), kpi.display_value()]),
    );
    sections.push(render_section(
        "Executive Summary",
        &headers(&["metric", "value"]),
        &overview,
    ));

    sections.push(render_section(
        "Column Types",
        &classification_headers(),
        &classification_rows(&result.classifications),
    ));
    sections.push(render_section(
        "Data Quality",
        &headers(&[
            "column",
            "present",
            "missing",
            "distinct",
            "completeness",
            "uniqueness",
        ]),
        &quality::render_rows(&result.quality),
    ));
    sections.push(render_section(
        "Statistics",
        &stats::render_headers(),
        &stats::render_rows(&result.statistics),
    ));
    sections.push(render_section(
        "Correlations",
        &correlation_headers(),
        &correlation::render_rows(&result.correlations),
    ));

    if let Some(temporal) = &result.temporal {
        let mut rows = vec![
            vec!["column".to_string(), temporal.column.clone()],
            vec!["start".to_string(), temporal.start.to_string()],
            vec!["end".to_string(), temporal.end.to_string()],
            vec!["span (days)".to_string(), temporal.span_days.to_string()],
            vec![
                "distinct dates".to_string(),
                temporal.distinct_dates.to_string(),
            ],
        ];
        if let (Some(metric), Some(trend)) = (&temporal.metric, &temporal.trend) {
            rows.push(vec![
                format!("{metric} trend"),
                format!("{} ({:.4}/day)", trend.direction.label(), trend.slope),
            ]);
        }
        sections.push(render_section(
            "Temporal",
            &headers(&["field", "value"]),
            &rows,
        ));
    }

    if let Some(performance) = &result.performance {
        sections.push(render_section(
            &format!("{} by {}", performance.metric, performance.dimension),
            &headers(&["segment", "rows", "total", "mean"]),
            &segments::render_segment_rows(performance),
        ));
    }
    if !result.demographics.is_empty() {
        sections.push(render_section(
            "Demographics",
            &headers(&["column", "value", "count", "percent"]),
            &segments::render_demographic_rows(&result.demographics),
        ));
    }

    sections.push(render_section(
        "Themes",
        &theme_headers(),
        &themes::render_rows(&result.themes),
    ));
    sections.push(render_section(
        "Insights",
        &headers(&["category", "insight", "detail"]),
        &result
            .insights
            .iter()
            .map(|i| vec![i.category.clone(), i.title.clone(), i.detail.clone()])
            .collect::<Vec<_>>(),
    ));
    if let Some(summary) = &result.remote_summary {
        sections.push(format!("Remote Summary\n==============\n{summary}\n"));
    }
    sections.push(render_section(
        "Recommendations",
        &headers(&["priority", "category", "recommendation", "detail"]),
        &recommend::render_rows(&result.recommendations),
    ));

    sections.join("\n")
}
