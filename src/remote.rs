//! Optional remote insight service.
//!
//! A summary of the table (column names, a handful of sample rows and the
//! per-column statistics) is posted to an external endpoint that returns
//! free-text insights. The call is bounded by a timeout and is never fatal:
//! [`enrich`] merges a fully successful response in one step and otherwise
//! leaves the rule-based result untouched.

use std::{env, time::Duration};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    analysis::AnalysisResult,
    config::RemoteConfig,
    data::Table,
    recommend::{Insight, Priority, Recommendation, Source},
    stats::ColumnStatistics,
};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timed out after {0}s waiting for the insight service")]
    Timeout(u64),
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    #[error("Malformed insight response: {0}")]
    Parse(String),
    #[error("API key environment variable '{0}' is not set")]
    MissingApiKey(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub columns: Vec<String>,
    pub sample_rows: Vec<serde_json::Value>,
    pub column_stats: Vec<ColumnStatistics>,
}

impl InsightRequest {
    pub fn build(table: &Table, statistics: &[ColumnStatistics], sample_rows: usize) -> Self {
        Self {
            model: None,
            columns: table.columns().to_vec(),
            sample_rows: (0..table.row_count().min(sample_rows))
                .filter_map(|idx| table.row_as_json(idx))
                .collect(),
            column_stats: statistics.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteInsights {
    pub summary: Option<String>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

impl RemoteInsights {
    fn is_empty(&self) -> bool {
        self.summary.as_deref().is_none_or(|s| s.trim().is_empty())
            && self.insights.is_empty()
            && self.recommendations.is_empty()
    }
}

pub trait InsightService {
    fn summarize(&self, request: &InsightRequest) -> Result<RemoteInsights, RemoteError>;
}

/// Blocking JSON-over-HTTP client for an insight endpoint.
pub struct HttpInsightService {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: u64,
}

impl HttpInsightService {
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let api_key = match &config.api_key_env {
            Some(var) => match env::var(var) {
                Ok(key) if !key.trim().is_empty() => Some(key),
                _ => return Err(RemoteError::MissingApiKey(var.clone())),
            },
            None => None,
        };
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("csv-insight/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }
}

impl InsightService for HttpInsightService {
    fn summarize(&self, request: &InsightRequest) -> Result<RemoteInsights, RemoteError> {
        let mut body = request.clone();
        if body.model.is_none() {
            body.model = self.model.clone();
        }
        let mut builder = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.timeout_secs)
            } else {
                RemoteError::Network(e.to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(RemoteError::Http(status.as_u16(), text));
        }
        response
            .json::<RemoteInsights>()
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

/// Asks `service` for insights and folds them into `result`.
///
/// Returns `true` when remote content was merged. Any failure, or an empty
/// response, is logged and leaves `result` exactly as it was.
pub fn enrich(
    result: &mut AnalysisResult,
    table: &Table,
    service: &dyn InsightService,
    sample_rows: usize,
) -> bool {
    let request = InsightRequest::build(table, &result.statistics, sample_rows);
    let remote = match service.summarize(&request) {
        Ok(remote) if remote.is_empty() => {
            warn!("Insight service returned no content; keeping rule-based output");
            return false;
        }
        Ok(remote) => remote,
        Err(err) => {
            warn!("Insight service unavailable, keeping rule-based output: {err}");
            return false;
        }
    };

    info!(
        "Merging {} remote insight(s) and {} recommendation(s)",
        remote.insights.len(),
        remote.recommendations.len()
    );
    result.remote_summary = remote.summary.filter(|s| !s.trim().is_empty());
    result
        .insights
        .extend(remote.insights.into_iter().map(|text| Insight {
            category: "remote".to_string(),
            title: text.clone(),
            detail: text,
            source: Source::Remote,
        }));
    result
        .recommendations
        .extend(remote.recommendations.into_iter().map(|text| Recommendation {
            priority: Priority::Medium,
            category: "remote".to_string(),
            title: text.clone(),
            detail: text,
            source: Source::Remote,
        }));
    result.recommendations.sort_by_key(|r| r.priority);
    true
}
