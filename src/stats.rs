use log::debug;
use serde::Serialize;

use crate::data::{Cell, format_number};

/// Multiplier applied to the interquartile range to place the outlier fences.
pub const IQR_FENCE: f64 = 1.5;

/// Summary statistics for one numeric column.
///
/// Variance is the population variance (divides by `count`). Quartiles use the
/// nearest-rank rule at sorted indices `floor(0.25 * n)` and `floor(0.75 * n)`
/// without interpolation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Values outside the fences, in their original order.
    pub outliers: Vec<f64>,
}

impl DescriptiveStats {
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower_fence || value > self.upper_fence
    }

    pub fn distribution(&self) -> DistributionShape {
        DistributionShape::from_skewness(self.skewness)
    }

    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionShape {
    Normal,
    RightSkewed,
    LeftSkewed,
}

impl DistributionShape {
    pub fn from_skewness(skewness: f64) -> Self {
        if skewness > 1.0 {
            DistributionShape::RightSkewed
        } else if skewness < -1.0 {
            DistributionShape::LeftSkewed
        } else {
            DistributionShape::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DistributionShape::Normal => "Normal",
            DistributionShape::RightSkewed => "Right-Skewed",
            DistributionShape::LeftSkewed => "Left-Skewed",
        }
    }
}

/// Named statistics for a column, as carried in the analysis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub column: String,
    pub stats: Option<DescriptiveStats>,
}

/// Parses every cell, discarding anything that is not a finite number.
pub fn numeric_values<'a, I>(cells: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Cell>,
{
    cells.into_iter().filter_map(Cell::as_number).collect()
}

/// Computes statistics over the parseable cells; `None` when there are none.
pub fn compute_stats<'a, I>(cells: I) -> Option<DescriptiveStats>
where
    I: IntoIterator<Item = &'a Cell>,
{
    describe(&numeric_values(cells))
}

pub fn describe(values: &[f64]) -> Option<DescriptiveStats> {
    if values.is_empty() {
        return None;
    }
    let count = values.len();
    let n = count as f64;
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let (min, max) = (sorted[0], sorted[count - 1]);

    // Identical values have no spread; the two-pass mean can leave rounding
    // residue in the deviations, so don't derive moments from them.
    let (mean, variance, std_dev, skewness) = if min == max {
        (min, 0.0, 0.0, 0.0)
    } else {
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.max(0.0).sqrt();
        let skewness = if std_dev > 0.0 {
            values
                .iter()
                .map(|v| ((v - mean) / std_dev).powi(3))
                .sum::<f64>()
                / n
        } else {
            0.0
        };
        (mean, variance, std_dev, skewness)
    };

    let mid = count / 2;
    let median = if count.is_multiple_of(2) {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    let q1 = sorted[count / 4];
    let q3 = sorted[(count * 3) / 4];
    let iqr = q3 - q1;
    let lower_fence = q1 - IQR_FENCE * iqr;
    let upper_fence = q3 + IQR_FENCE * iqr;
    let outliers = values
        .iter()
        .copied()
        .filter(|v| *v < lower_fence || *v > upper_fence)
        .collect::<Vec<_>>();

    debug!(
        "Described {count} value(s): mean {mean}, std {std_dev}, {} outlier(s)",
        outliers.len()
    );

    Some(DescriptiveStats {
        count,
        mean,
        median,
        variance,
        std_dev,
        skewness,
        min,
        max,
        q1,
        q3,
        iqr,
        lower_fence,
        upper_fence,
        outliers,
    })
}

pub fn render_rows(statistics: &[ColumnStatistics]) -> Vec<Vec<String>> {
    statistics
        .iter()
        .map(|entry| match &entry.stats {
            Some(stats) => vec![
                entry.column.clone(),
                stats.count.to_string(),
                format_number(stats.min),
                format_number(stats.max),
                format_number(stats.mean),
                format_number(stats.median),
                format_number(stats.std_dev),
                format!("{:.4}", stats.skewness),
                format_number(stats.q1),
                format_number(stats.q3),
                stats.outliers.len().to_string(),
            ],
            None => {
                let mut row = vec![entry.column.clone(), "0".to_string()];
                row.extend(std::iter::repeat_n(String::new(), 9));
                row
            }
        })
        .collect()
}

pub fn render_headers() -> Vec<String> {
    [
        "column", "count", "min", "max", "mean", "median", "std_dev", "skewness", "q1", "q3",
        "outliers",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn median_averages_central_pair_for_even_counts() {
        let stats = describe(&[4.0, 1.0, 3.0, 2.0]).expect("stats");
        assert!(approx(stats.median, 2.5));
        let stats = describe(&[3.0, 1.0, 2.0]).expect("stats");
        assert!(approx(stats.median, 2.0));
    }

    #[test]
    fn quartiles_use_floor_index_nearest_rank() {
        let stats = describe(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).expect("stats");
        assert_eq!(stats.q1, 3.0);
        assert_eq!(stats.q3, 7.0);
        assert_eq!(stats.iqr, 4.0);
        assert_eq!(stats.upper_fence, 13.0);
        assert!(!stats.is_outlier(13.0));
        assert!(stats.is_outlier(14.0));
    }

    #[test]
    fn variance_divides_by_population_size() {
        let stats = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).expect("stats");
        assert!(approx(stats.mean, 5.0));
        assert!(approx(stats.variance, 4.0));
        assert!(approx(stats.std_dev, 2.0));
    }

    #[test]
    fn unparseable_cells_are_filtered() {
        let cells = vec![
            Cell::Text("1".into()),
            Cell::Text("abc".into()),
            Cell::Empty,
            Cell::Number(3.0),
        ];
        let stats = compute_stats(&cells).expect("stats");
        assert_eq!(stats.count, 2);
        assert!(approx(stats.mean, 2.0));
    }

    #[test]
    fn no_parseable_values_yields_none() {
        let cells = vec![Cell::Text("x".into()), Cell::Empty];
        assert!(compute_stats(&cells).is_none());
    }

    #[test]
    fn single_value_has_zero_spread() {
        let stats = describe(&[42.0]).expect("stats");
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn distribution_shape_boundaries_are_inclusive_for_normal() {
        assert_eq!(DistributionShape::from_skewness(1.0), DistributionShape::Normal);
        assert_eq!(DistributionShape::from_skewness(-1.0), DistributionShape::Normal);
        assert_eq!(
            DistributionShape::from_skewness(1.01),
            DistributionShape::RightSkewed
        );
        assert_eq!(
            DistributionShape::from_skewness(-1.01),
            DistributionShape::LeftSkewed
        );
    }

    #[test]
    fn render_rows_leaves_blanks_for_missing_stats() {
        let rows = render_rows(&[ColumnStatistics {
            column: "empty".into(),
            stats: None,
        }]);
        assert_eq!(rows[0].len(), render_headers().len());
        assert_eq!(rows[0][1], "0");
    }
}
