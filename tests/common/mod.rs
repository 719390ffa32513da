#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_insight::data::{Cell, Table};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Builds a table from string cells, the same way the CSV loader does.
pub fn text_table(headers: &[&str], rows: &[&[&str]]) -> Table {
    Table::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|v| Cell::from_text(v)).collect())
            .collect(),
    )
}

/// Builds a single-column numeric table.
pub fn numeric_column(name: &str, values: &[f64]) -> Table {
    Table::new(
        vec![name.to_string()],
        values.iter().map(|v| vec![Cell::Number(*v)]).collect(),
    )
}

/// Daily OHLCV rows with a steadily rising close.
pub fn market_csv(rows: usize) -> String {
    let mut csv = String::from("date,open,high,low,close,volume\n");
    for day in 0..rows {
        let base = 100.0 + day as f64;
        csv.push_str(&format!(
            "2024-01-{:02},{:.2},{:.2},{:.2},{:.2},{}\n",
            day + 1,
            base,
            base + 2.5,
            base - 1.5,
            base + 1.0,
            1_000 + (day * 37) % 400
        ));
    }
    csv
}

/// An ad campaign export with a categorical channel and demographics.
pub fn campaign_csv() -> &'static str {
    "date,channel,region,impressions,clicks,spend,revenue,conversions\n\
     2024-03-01,search,north,1000,50,25.00,120.00,5\n\
     2024-03-02,social,south,2000,40,30.00,60.00,2\n\
     2024-03-03,search,north,1500,60,27.50,150.00,6\n\
     2024-03-04,display,east,3000,30,20.00,40.00,1\n\
     2024-03-05,social,north,2500,55,32.00,90.00,4\n\
     2024-03-06,search,south,1800,70,29.00,180.00,7\n"
}
