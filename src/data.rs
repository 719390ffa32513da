use std::{collections::HashSet, fmt};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::error::AnalysisError;

/// Earliest year accepted when a text cell is read as a calendar date.
pub const MIN_DATE_YEAR: i32 = 1900;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// A raw cell as delivered by the CSV or JSON decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Builds a cell from decoded text, mapping blank values to [`Cell::Empty`].
    pub fn from_text(value: &str) -> Self {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Finite numeric reading of the cell, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Text(s) => parse_calendar_date(s.trim()),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Empty => String::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Text(s) => serde_json::Value::String(s.clone()),
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Cell::Empty => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

/// Parses `value` as a calendar date with a year after [`MIN_DATE_YEAR`].
///
/// Date-only formats are tried first, then date-time formats (truncated to the
/// date), then RFC 3339.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })?;
    (parsed.year() > MIN_DATE_YEAR).then_some(parsed)
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

/// An in-memory table: a fixed column list and positional rows aligned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table, dropping any row whose field count differs from the header.
    ///
    /// Repeated column names are made unique with a numeric suffix (`a`, `a_2`)
    /// so every name-based lookup addresses exactly one column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns = unique_column_names(columns);
        let width = columns.len();
        let total = rows.len();
        let rows: Vec<Vec<Cell>> = rows.into_iter().filter(|row| row.len() == width).collect();
        if rows.len() < total {
            log::warn!(
                "Dropped {} row(s) whose field count did not match the {} column header",
                total - rows.len(),
                width
            );
        }
        Self { columns, rows }
    }

    /// Builds a table from an array of JSON objects.
    ///
    /// Columns come from the first object's keys in their original order. Keys
    /// missing from later objects become empty cells; extra keys are ignored.
    pub fn from_json_records(value: &serde_json::Value) -> anyhow::Result<Self> {
        let records = value
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Expected a JSON array of objects"))?;
        let columns: Vec<String> = match records.first() {
            Some(serde_json::Value::Object(first)) => first.keys().cloned().collect(),
            Some(_) => anyhow::bail!("Expected JSON records to be objects"),
            None => Vec::new(),
        };
        let mut rows = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let object = record
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("Record {} is not a JSON object", idx + 1))?;
            let row = columns
                .iter()
                .map(|column| object.get(column).map(json_to_cell).unwrap_or(Cell::Empty))
                .collect();
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Case-insensitive exact lookup, returning the column's stored name.
    pub fn find_column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.trim().eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn column_values(&self, name: &str) -> Result<impl Iterator<Item = &Cell>, AnalysisError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| AnalysisError::UnknownColumn(name.to_string()))?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Returns the row at `index` as a JSON object keyed by column name.
    pub fn row_as_json(&self, index: usize) -> Option<serde_json::Value> {
        let row = self.rows.get(index)?;
        let object = self
            .columns
            .iter()
            .zip(row)
            .map(|(column, cell)| (column.clone(), cell.to_json()))
            .collect::<serde_json::Map<_, _>>();
        Some(serde_json::Value::Object(object))
    }
}

fn unique_column_names(columns: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(columns.len());
    let mut unique = Vec::with_capacity(columns.len());
    for name in columns {
        if seen.insert(name.clone()) {
            unique.push(name);
            continue;
        }
        let renamed = (2..)
            .map(|n| format!("{name}_{n}"))
            .find(|candidate| !seen.contains(candidate))
            .unwrap_or_else(|| name.clone());
        log::warn!("Duplicate column '{name}' renamed to '{renamed}'");
        seen.insert(renamed.clone());
        unique.push(renamed);
    }
    unique
}

fn json_to_cell(value: &serde_json::Value) -> Cell {
    match value {
        serde_json::Value::Null => Cell::Empty,
        serde_json::Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        serde_json::Value::String(s) => Cell::from_text(s),
        serde_json::Value::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::Text(other.to_string()),
    }
}
