//! Structural failures surfaced to callers of the analysis pipeline.
//!
//! Unparseable cells and degenerate statistics are never errors; they are
//! filtered or short-circuited where they are consumed. Only input that has no
//! shape to analyze at all ends up here.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("The table has no columns; supply a file with a header row or keyed records")]
    NoColumns,
    #[error("The table has no data rows; nothing to analyze")]
    EmptyTable,
    #[error("Column '{0}' not found in table")]
    UnknownColumn(String),
}
