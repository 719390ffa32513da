//! Segment performance and demographic breakdowns.
//!
//! Both are frequency accumulations over categorical columns. Performance
//! groups a numeric metric by the first usable categorical column; demographics
//! count the most common values of columns whose names describe an audience.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::data::{Cell, Table};

const EMPTY_LABEL: &str = "<empty>";

pub const DEMOGRAPHIC_COLUMNS: &[&str] = &[
    "age",
    "age_group",
    "gender",
    "sex",
    "region",
    "country",
    "location",
    "device",
    "platform",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub label: String,
    pub count: usize,
    pub total: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentPerformance {
    pub dimension: String,
    pub metric: String,
    /// Sorted by total descending, then label.
    pub segments: Vec<Segment>,
}

impl SegmentPerformance {
    pub fn best(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn worst(&self) -> Option<&Segment> {
        (self.segments.len() > 1)
            .then(|| self.segments.last())
            .flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueShare {
    pub value: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicBreakdown {
    pub column: String,
    pub distinct: usize,
    pub top_values: Vec<ValueShare>,
}

fn label_for(cell: &Cell) -> String {
    if cell.is_empty() {
        EMPTY_LABEL.to_string()
    } else {
        cell.as_display().trim().to_string()
    }
}

fn distinct_labels(table: &Table, idx: usize) -> usize {
    table
        .rows()
        .iter()
        .filter(|row| !row[idx].is_empty())
        .map(|row| label_for(&row[idx]))
        .collect::<HashSet<_>>()
        .len()
}

#[derive(Default)]
struct SegmentAccumulator {
    groups: HashMap<String, (usize, f64)>,
}

impl SegmentAccumulator {
    fn ingest(&mut self, label: String, value: f64) {
        let entry = self.groups.entry(label).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += value;
    }

    fn finish(self) -> Vec<Segment> {
        let mut segments = self
            .groups
            .into_iter()
            .map(|(label, (count, total))| Segment {
                label,
                count,
                total,
                mean: total / count as f64,
            })
            .collect::<Vec<_>>();
        segments.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.label.cmp(&b.label))
        });
        segments
    }
}

/// Groups the first numeric column by the first categorical column that has
/// between two and `max_segments` distinct values.
pub fn performance(
    table: &Table,
    categorical: &[String],
    numeric: &[String],
    max_segments: usize,
) -> Option<SegmentPerformance> {
    let metric = numeric.first()?;
    let metric_idx = table.column_index(metric)?;
    let (dimension, dimension_idx) = categorical.iter().find_map(|name| {
        let idx = table.column_index(name)?;
        let distinct = distinct_labels(table, idx);
        (2..=max_segments)
            .contains(&distinct)
            .then_some((name, idx))
    })?;

    let mut accumulator = SegmentAccumulator::default();
    for row in table.rows() {
        if row[dimension_idx].is_empty() {
            continue;
        }
        if let Some(value) = row[metric_idx].as_number() {
            accumulator.ingest(label_for(&row[dimension_idx]), value);
        }
    }
    let segments = accumulator.finish();
    (!segments.is_empty()).then(|| SegmentPerformance {
        dimension: dimension.clone(),
        metric: metric.clone(),
        segments,
    })
}

/// Value shares for every categorical column named in [`DEMOGRAPHIC_COLUMNS`].
pub fn demographics(
    table: &Table,
    categorical: &[String],
    top: usize,
) -> Vec<DemographicBreakdown> {
    categorical
        .iter()
        .filter(|name| {
            let lowered = name.trim().to_ascii_lowercase();
            DEMOGRAPHIC_COLUMNS.contains(&lowered.as_str())
        })
        .filter_map(|name| {
            let idx = table.column_index(name)?;
            let mut counts: HashMap<String, usize> = HashMap::new();
            for row in table.rows() {
                *counts.entry(label_for(&row[idx])).or_insert(0) += 1;
            }
            let total = table.row_count();
            let distinct = counts.keys().filter(|k| *k != EMPTY_LABEL).count();
            let mut items = counts.into_iter().collect::<Vec<_>>();
            items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            if top > 0 && items.len() > top {
                items.truncate(top);
            }
            let top_values = items
                .into_iter()
                .map(|(value, count)| ValueShare {
                    value,
                    count,
                    percent: if total == 0 {
                        0.0
                    } else {
                        count as f64 / total as f64 * 100.0
                    },
                })
                .collect();
            Some(DemographicBreakdown {
                column: name.clone(),
                distinct,
                top_values,
            })
        })
        .collect()
}

pub fn render_segment_rows(performance: &SegmentPerformance) -> Vec<Vec<String>> {
    performance
        .segments
        .iter()
        .map(|s| {
            vec![
                s.label.clone(),
                s.count.to_string(),
                crate::data::format_number(s.total),
                format!("{:.2}", s.mean),
            ]
        })
        .collect()
}

pub fn render_demographic_rows(breakdowns: &[DemographicBreakdown]) -> Vec<Vec<String>> {
    breakdowns
        .iter()
        .flat_map(|b| {
            b.top_values.iter().map(move |v| {
                vec![
                    b.column.clone(),
                    v.value.clone(),
                    v.count.to_string(),
                    format!("{:.2}%", v.percent),
                ]
            })
        })
        .collect()
}
