//! Column type inference.
//!
//! Each column is sampled from the first `sample_rows` rows. Non-empty values
//! are tallied as numeric or date candidates and the column is assigned exactly
//! one [`ColumnKind`]: numeric wins first, then date, otherwise categorical.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::{
    config::{AnalysisConfig, DateDetection},
    data::{Cell, Table},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Date,
    Categorical,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Date => "date",
            ColumnKind::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnClassification {
    pub name: String,
    pub kind: ColumnKind,
    /// Non-empty values seen in the sample.
    pub sampled: usize,
    pub numeric_ratio: f64,
    pub date_ratio: f64,
}

/// Classifications for every column, in table column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Classifications {
    columns: Vec<ColumnClassification>,
}

impl Classifications {
    pub fn iter(&self) -> impl Iterator<Item = &ColumnClassification> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.kind)
    }

    pub fn names_of(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn numeric(&self) -> Vec<String> {
        self.names_of(ColumnKind::Numeric)
    }

    pub fn dates(&self) -> Vec<String> {
        self.names_of(ColumnKind::Date)
    }

    pub fn categorical(&self) -> Vec<String> {
        self.names_of(ColumnKind::Categorical)
    }
}

#[derive(Debug, Clone, Default)]
struct KindCandidate {
    non_empty: usize,
    numeric_matches: usize,
    date_matches: usize,
}

impl KindCandidate {
    fn update(&mut self, cell: &Cell) {
        if cell.is_empty() {
            return;
        }
        self.non_empty += 1;
        if cell.as_number().is_some() {
            self.numeric_matches += 1;
        } else if cell.as_date().is_some() {
            self.date_matches += 1;
        }
    }

    fn ratio(&self, matches: usize) -> f64 {
        if self.non_empty == 0 {
            0.0
        } else {
            matches as f64 / self.non_empty as f64
        }
    }

    fn decide(&self, name: &str, threshold: f64, date_detection: DateDetection) -> ColumnKind {
        if self.non_empty == 0 {
            return ColumnKind::Categorical;
        }
        if self.ratio(self.numeric_matches) > threshold {
            ColumnKind::Numeric
        } else if self.ratio(self.date_matches) > threshold && date_detection.accepts_name(name) {
            ColumnKind::Date
        } else {
            ColumnKind::Categorical
        }
    }
}

pub fn classify(table: &Table, config: &AnalysisConfig) -> Classifications {
    let mut candidates = vec![KindCandidate::default(); table.column_count()];
    for row in table.rows().iter().take(config.sample_rows) {
        for (idx, cell) in row.iter().enumerate() {
            candidates[idx].update(cell);
        }
    }

    let columns = table
        .columns()
        .iter()
        .zip(candidates)
        .map(|(name, candidate)| {
            let kind = candidate.decide(name, config.type_threshold, config.date_detection);
            debug!(
                "Column '{name}' classified as {kind} ({} sampled, {} numeric, {} date)",
                candidate.non_empty, candidate.numeric_matches, candidate.date_matches
            );
            ColumnClassification {
                name: name.clone(),
                kind,
                sampled: candidate.non_empty,
                numeric_ratio: candidate.ratio(candidate.numeric_matches),
                date_ratio: candidate.ratio(candidate.date_matches),
            }
        })
        .collect();
    Classifications { columns }
}
