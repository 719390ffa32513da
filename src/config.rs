//! Analysis tuning knobs and their YAML persistence.
//!
//! Two presets capture the known divergences between the exploratory and the
//! comprehensive analyzers: the correlation noise floor, the type-inference
//! threshold, and whether date columns need a name hint. Every field can be
//! overridden from a YAML file or from the command line.

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DATE_NAME_HINTS: &[&str] = &[
    "date",
    "time",
    "day",
    "month",
    "year",
    "period",
    "timestamp",
];

pub const EXPLORATORY_CORRELATION_THRESHOLD: f64 = 0.1;
pub const SIGNIFICANT_CORRELATION_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Exploratory,
    Comprehensive,
}

/// How date columns are recognized once the numeric test has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateDetection {
    /// Parse rate above the type threshold is enough.
    ParseRate,
    /// Parse rate above the threshold and a name containing one of [`DATE_NAME_HINTS`].
    NameHint,
}

impl DateDetection {
    pub fn accepts_name(&self, column: &str) -> bool {
        match self {
            DateDetection::ParseRate => true,
            DateDetection::NameHint => {
                let lowered = column.to_ascii_lowercase();
                DATE_NAME_HINTS.iter().any(|hint| lowered.contains(hint))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    /// Environment variable holding the bearer token, if the endpoint needs one.
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub sample_rows: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key_env: Some("CSV_INSIGHT_API_KEY".to_string()),
            model: None,
            timeout_secs: 30,
            sample_rows: 10,
        }
    }
}

impl RemoteConfig {
    pub fn effective_sample_rows(&self) -> usize {
        self.sample_rows.clamp(10, 20)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sample_rows: usize,
    pub type_threshold: f64,
    pub date_detection: DateDetection,
    pub correlation_threshold: f64,
    pub trend_min_rows: usize,
    pub max_segments: usize,
    pub top_values: usize,
    pub completeness_target: f64,
    pub remote: Option<RemoteConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::exploratory()
    }
}

impl AnalysisConfig {
    pub fn exploratory() -> Self {
        Self {
            sample_rows: 100,
            type_threshold: 0.8,
            date_detection: DateDetection::ParseRate,
            correlation_threshold: EXPLORATORY_CORRELATION_THRESHOLD,
            trend_min_rows: 10,
            max_segments: 20,
            top_values: 5,
            completeness_target: 95.0,
            remote: None,
        }
    }

    pub fn comprehensive() -> Self {
        Self {
            type_threshold: 0.7,
            date_detection: DateDetection::NameHint,
            correlation_threshold: SIGNIFICANT_CORRELATION_THRESHOLD,
            ..Self::exploratory()
        }
    }

    pub fn for_preset(preset: Preset) -> Self {
        match preset {
            Preset::Exploratory => Self::exploratory(),
            Preset::Comprehensive => Self::comprehensive(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing config file {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.sample_rows > 0,
            "sample_rows must be at least 1 (got {})",
            self.sample_rows
        );
        ensure!(
            (0.0..1.0).contains(&self.type_threshold),
            "type_threshold must be in [0, 1) (got {})",
            self.type_threshold
        );
        ensure!(
            (0.0..1.0).contains(&self.correlation_threshold),
            "correlation_threshold must be in [0, 1) (got {})",
            self.correlation_threshold
        );
        ensure!(self.max_segments >= 2, "max_segments must be at least 2");
        if let Some(remote) = &self.remote {
            ensure!(
                !remote.endpoint.trim().is_empty(),
                "remote.endpoint must not be empty when remote insights are configured"
            );
            ensure!(remote.timeout_secs > 0, "remote.timeout_secs must be positive");
        }
        Ok(())
    }
}
