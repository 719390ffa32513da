//! Executive summary: headline counts plus KPIs.
//!
//! Advertising tables (impressions, clicks, spend, revenue, conversions) get
//! campaign KPIs; any other table gets totals for its leading numeric columns.

use serde::Serialize;

use crate::{data::Table, stats::numeric_values};

const GENERIC_TOTAL_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiFormat {
    Number,
    Currency,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: f64,
    pub format: KpiFormat,
}

impl Kpi {
    fn new(label: impl Into<String>, value: f64, format: KpiFormat) -> Option<Self> {
        value.is_finite().then(|| Self {
            label: label.into(),
            value,
            format,
        })
    }

    pub fn display_value(&self) -> String {
        match self.format {
            KpiFormat::Number => crate::data::format_number(self.value),
            KpiFormat::Currency => format!("{:.2}", self.value),
            KpiFormat::Percent => format!("{:.2}%", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub total_records: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub date_columns: usize,
    pub categorical_columns: usize,
    /// True when the advertising vocabulary drove the KPIs.
    pub campaign_metrics: bool,
    pub kpis: Vec<Kpi>,
}

/// Column names for the advertising vocabulary, resolved case-insensitively.
#[derive(Debug)]
struct CampaignColumns<'a> {
    impressions: Option<&'a str>,
    clicks: Option<&'a str>,
    spend: Option<&'a str>,
    revenue: Option<&'a str>,
    conversions: Option<&'a str>,
}

impl<'a> CampaignColumns<'a> {
    fn resolve(table: &'a Table) -> Self {
        let first = |names: &[&str]| names.iter().find_map(|n| table.find_column(n));
        Self {
            impressions: first(&["impressions"]),
            clicks: first(&["clicks"]),
            spend: first(&["spend", "cost"]),
            revenue: first(&["revenue", "sales"]),
            conversions: first(&["conversions"]),
        }
    }

    fn is_campaign(&self) -> bool {
        self.spend.is_some()
            || (self.impressions.is_some() && self.clicks.is_some())
            || (self.clicks.is_some() && self.conversions.is_some())
    }
}

fn column_total(table: &Table, column: &str) -> Option<f64> {
    let values = numeric_values(table.column_values(column).ok()?);
    (!values.is_empty()).then(|| values.iter().sum())
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (numerator, denominator) = (numerator?, denominator?);
    (denominator != 0.0).then(|| numerator / denominator)
}

pub fn summarize(
    table: &Table,
    numeric: &[String],
    dates: usize,
    categorical: usize,
) -> ExecutiveSummary {
    let campaign = CampaignColumns::resolve(table);
    let campaign_metrics = campaign.is_campaign();
    let kpis = if campaign_metrics {
        campaign_kpis(table, &campaign)
    } else {
        numeric
            .iter()
            .take(GENERIC_TOTAL_COLUMNS)
            .filter_map(|column| {
                let total = column_total(table, column)?;
                Kpi::new(format!("Total {column}"), total, KpiFormat::Number)
            })
            .collect()
    };
    ExecutiveSummary {
        total_records: table.row_count(),
        total_columns: table.column_count(),
        numeric_columns: numeric.len(),
        date_columns: dates,
        categorical_columns: categorical,
        campaign_metrics,
        kpis,
    }
}

fn campaign_kpis(table: &Table, columns: &CampaignColumns<'_>) -> Vec<Kpi> {
    let total = |column: Option<&str>| column.and_then(|c| column_total(table, c));
    let impressions = total(columns.impressions);
    let clicks = total(columns.clicks);
    let spend = total(columns.spend);
    let revenue = total(columns.revenue);
    let conversions = total(columns.conversions);

    let roi = match (revenue, spend) {
        (Some(revenue), Some(spend)) if spend != 0.0 => Some((revenue - spend) / spend * 100.0),
        _ => None,
    };

    [
        spend.and_then(|v| Kpi::new("Total Spend", v, KpiFormat::Currency)),
        revenue.and_then(|v| Kpi::new("Total Revenue", v, KpiFormat::Currency)),
        impressions.and_then(|v| Kpi::new("Total Impressions", v, KpiFormat::Number)),
        clicks.and_then(|v| Kpi::new("Total Clicks", v, KpiFormat::Number)),
        ratio(clicks, impressions).and_then(|v| Kpi::new("CTR", v * 100.0, KpiFormat::Percent)),
        ratio(spend, clicks).and_then(|v| Kpi::new("CPC", v, KpiFormat::Currency)),
        ratio(conversions, clicks)
            .and_then(|v| Kpi::new("Conversion Rate", v * 100.0, KpiFormat::Percent)),
        roi.and_then(|v| Kpi::new("ROI", v, KpiFormat::Percent)),
    ]
    .into_iter()
    .flatten()
    .collect()
}
