//! Chart-ready projections of dashboard state

use serde::Serialize;

use crate::models::{Analytics, HistoryRecord, PredictionResult};

/// A single labelled series, ready for a bar or line chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: &'static str,
    /// Dataset label
    pub label: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    fn new(title: &'static str, label: &'static str) -> Self {
        Self {
            title,
            label,
            labels: Vec::new(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Summary widgets shown above the charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widgets {
    pub total_predictions: u64,
    /// Rounded to two decimals
    pub avg_risk: f64,
    pub high_risk_count: u64,
}

impl Widgets {
    /// `avg_risk` as shown, e.g. `"42.50%"`
    pub fn avg_risk_display(&self) -> String {
        format!("{:.2}%", self.avg_risk)
    }
}

/// Company name → risk score, in history order
pub fn risk_trend(history: &[HistoryRecord]) -> ChartSeries {
    let mut series = ChartSeries::new("Risk Score Trend", "Risk Score");
    for record in history {
        series.push(record.company_name.as_str(), record.risk_score);
    }
    series
}

/// Factor name → contribution for the current prediction
pub fn risk_factor_chart(prediction: Option<&PredictionResult>) -> Option<ChartSeries> {
    let prediction = prediction?;
    let mut series = ChartSeries::new("Risk Factors Impact", "Impact");
    for (name, value) in &prediction.risk_factors {
        series.push(name.as_str(), *value);
    }
    Some(series)
}

/// Period → average risk
pub fn monthly_trend_chart(analytics: &Analytics) -> ChartSeries {
    let mut series = ChartSeries::new("Monthly Risk Trends", "Average Risk Trend");
    for trend in &analytics.monthly_trends {
        series.push(trend.period.as_str(), trend.avg_risk);
    }
    series
}

pub fn widgets(analytics: &Analytics) -> Widgets {
    Widgets {
        total_predictions: analytics.total_predictions,
        avg_risk: (analytics.avg_risk * 100.0).round() / 100.0,
        high_risk_count: analytics.high_risk_count,
    }
}
