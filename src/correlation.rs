//! Pairwise Pearson correlation across numeric columns.

use itertools::Itertools;
use log::debug;
use serde::Serialize;

use crate::data::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl CorrelationStrength {
    pub fn from_coefficient(coefficient: f64) -> Self {
        let magnitude = coefficient.abs();
        if magnitude >= 0.8 {
            CorrelationStrength::VeryStrong
        } else if magnitude >= 0.6 {
            CorrelationStrength::Strong
        } else if magnitude >= 0.4 {
            CorrelationStrength::Moderate
        } else if magnitude >= 0.2 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::VeryWeak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CorrelationStrength::VeryStrong => "Very Strong",
            CorrelationStrength::Strong => "Strong",
            CorrelationStrength::Moderate => "Moderate",
            CorrelationStrength::Weak => "Weak",
            CorrelationStrength::VeryWeak => "Very Weak",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub column_a: String,
    pub column_b: String,
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
    /// Rows where both columns held a number.
    pub pairs: usize,
}

/// Pearson's r over paired samples, or `None` when undefined.
///
/// Requires at least two pairs and non-zero variance in both series. Sums are
/// taken over deviations from the mean.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let len = xs.len().min(ys.len());
    if len < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..len], &ys[..len]);
    if !has_spread(xs) || !has_spread(ys) {
        return None;
    }
    let n = len as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut spread_x = 0.0;
    let mut spread_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        spread_x += dx * dx;
        spread_y += dy * dy;
    }
    let denominator = (spread_x * spread_y).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    let r = covariance / denominator;
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn has_spread(values: &[f64]) -> bool {
    values.iter().any(|v| *v != values[0])
}

/// Rows where both columns parse as numbers, as parallel vectors.
fn paired_values(table: &Table, a: usize, b: usize) -> (Vec<f64>, Vec<f64>) {
    table
        .rows()
        .iter()
        .filter_map(|row| Some((row[a].as_number()?, row[b].as_number()?)))
        .unzip()
}

/// Correlates every unordered pair of `numeric_columns`, keeping `|r| > threshold`.
///
/// Pairs are reported with the earlier column (in `numeric_columns` order) first
/// and the result is sorted by descending `|r|`; ties keep pair order.
pub fn compute_correlations(
    table: &Table,
    numeric_columns: &[String],
    threshold: f64,
) -> Vec<Correlation> {
    let indexed = numeric_columns
        .iter()
        .filter_map(|name| table.column_index(name).map(|idx| (name, idx)))
        .collect::<Vec<_>>();

    let mut correlations = indexed
        .iter()
        .tuple_combinations()
        .filter_map(|((name_a, idx_a), (name_b, idx_b))| {
            let (xs, ys) = paired_values(table, *idx_a, *idx_b);
            let coefficient = pearson(&xs, &ys)?;
            if coefficient.abs() <= threshold {
                debug!("Skipping {name_a}/{name_b}: r = {coefficient:.4} within noise floor");
                return None;
            }
            Some(Correlation {
                column_a: (*name_a).clone(),
                column_b: (*name_b).clone(),
                coefficient,
                strength: CorrelationStrength::from_coefficient(coefficient),
                direction: if coefficient >= 0.0 {
                    CorrelationDirection::Positive
                } else {
                    CorrelationDirection::Negative
                },
                pairs: xs.len(),
            })
        })
        .collect::<Vec<_>>();

    correlations.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));
    correlations
}

pub fn render_rows(correlations: &[Correlation]) -> Vec<Vec<String>> {
    correlations
        .iter()
        .map(|c| {
            vec![
                c.column_a.clone(),
                c.column_b.clone(),
                format!("{:.4}", c.coefficient),
                c.strength.label().to_string(),
                match c.direction {
                    CorrelationDirection::Positive => "positive".to_string(),
                    CorrelationDirection::Negative => "negative".to_string(),
                },
                c.pairs.to_string(),
            ]
        })
        .collect()
}
