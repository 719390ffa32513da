use std::collections::HashSet;

use serde::Serialize;

use crate::data::Table;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnQuality {
    pub column: String,
    pub present: usize,
    pub missing: usize,
    pub distinct: usize,
    /// Percentage of rows holding a non-empty value.
    pub completeness: f64,
    /// Percentage of non-empty values that are distinct.
    pub uniqueness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    pub columns: Vec<ColumnQuality>,
    /// Mean completeness across columns.
    pub score: f64,
}

impl DataQuality {
    pub fn below(&self, target: f64) -> impl Iterator<Item = &ColumnQuality> {
        self.columns.iter().filter(move |c| c.completeness < target)
    }
}

pub fn assess(table: &Table) -> DataQuality {
    let rows = table.row_count();
    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut seen = HashSet::new();
            let mut present = 0usize;
            for row in table.rows() {
                let cell = &row[idx];
                if cell.is_empty() {
                    continue;
                }
                present += 1;
                seen.insert(cell.as_display().trim().to_string());
            }
            ColumnQuality {
                column: name.clone(),
                present,
                missing: rows - present,
                distinct: seen.len(),
                completeness: percent(present, rows),
                uniqueness: percent(seen.len(), present),
            }
        })
        .collect::<Vec<_>>();
    let score = if columns.is_empty() {
        0.0
    } else {
        columns.iter().map(|c| c.completeness).sum::<f64>() / columns.len() as f64
    };
    DataQuality { columns, score }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn render_rows(quality: &DataQuality) -> Vec<Vec<String>> {
    quality
        .columns
        .iter()
        .map(|c| {
            vec![
                c.column.clone(),
                c.present.to_string(),
                c.missing.to_string(),
                c.distinct.to_string(),
                format!("{:.1}%", c.completeness),
                format!("{:.1}%", c.uniqueness),
            ]
        })
        .collect()
}
