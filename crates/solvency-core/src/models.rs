//! Domain models for Solvency

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Scores above this count as high risk (matches the backend's aggregation)
pub const HIGH_RISK_THRESHOLD: f64 = 60.0;

/// Scores below this count as low risk
pub const LOW_RISK_THRESHOLD: f64 = 20.0;

/// A named field of the financial input form, in submission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CompanyName,
    Email,
    Assets,
    Liabilities,
    NetIncome,
    CashFlow,
    DebtEquity,
    CurrentRatio,
    Revenue,
}

impl Field {
    /// All fields in form order
    pub const ALL: [Field; 9] = [
        Field::CompanyName,
        Field::Email,
        Field::Assets,
        Field::Liabilities,
        Field::NetIncome,
        Field::CashFlow,
        Field::DebtEquity,
        Field::CurrentRatio,
        Field::Revenue,
    ];

    /// Wire name used in the multipart form and in insight maps
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::CompanyName => "company_name",
            Field::Email => "email",
            Field::Assets => "assets",
            Field::Liabilities => "liabilities",
            Field::NetIncome => "net_income",
            Field::CashFlow => "cash_flow",
            Field::DebtEquity => "debt_equity",
            Field::CurrentRatio => "current_ratio",
            Field::Revenue => "revenue",
        }
    }

    /// Label shown next to the input
    pub fn label(&self) -> &'static str {
        match self {
            Field::CompanyName => "Company Name",
            Field::Email => "Email for Alerts",
            Field::Assets => "Total Assets",
            Field::Liabilities => "Total Liabilities",
            Field::NetIncome => "Net Income",
            Field::CashFlow => "Cash Flow",
            Field::DebtEquity => "Debt-to-Equity Ratio",
            Field::CurrentRatio => "Current Ratio",
            Field::Revenue => "Revenue",
        }
    }

    /// Whether the value must parse as a number
    ///
    /// Only the company name and the alert email are free text.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Field::CompanyName | Field::Email)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("Unknown field: {}", s))
    }
}

/// Raw financial figures as typed by the user
///
/// Values are kept as text; see [`crate::validate`] for what makes them
/// acceptable for submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinancialInput {
    values: [String; 9],
}

impl FinancialInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    /// Parsed numeric value of a field, if it holds a number
    pub fn number(&self, field: Field) -> Option<f64> {
        crate::validate::parse_number(self.get(field))
    }

    /// Iterate over (field, value) pairs in form order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL.iter().map(move |f| (*f, self.get(*f)))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Authenticated user context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub first_name: String,
}

/// Bound login/signup form
#[derive(Debug, Clone, Default, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub first_name: String,
}

impl Credentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        first_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            first_name: first_name.into(),
        }
    }
}

/// Display theme stored with the user profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User profile as returned by `/profile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(default)]
    pub theme: Theme,
}

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub company_name: String,
    pub risk_score: f64,
    pub confidence: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub risk_factors: BTreeMap<String, f64>,
    #[serde(default)]
    pub input_data: BTreeMap<String, serde_json::Value>,
}

impl PredictionResult {
    pub fn risk_band(&self) -> RiskBand {
        RiskBand::from_score(self.risk_score)
    }
}

/// Coarse classification of a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            RiskBand::High
        } else if score < LOW_RISK_THRESHOLD {
            RiskBand::Low
        } else {
            RiskBand::Moderate
        }
    }

    /// Report colour for this band
    pub fn color(&self) -> &'static str {
        match self {
            RiskBand::Low => "#2e7d32",
            RiskBand::Moderate => "#f9a825",
            RiskBand::High => "#d32f2f",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Moderate => "moderate",
            RiskBand::High => "high",
        }
    }
}

/// One past prediction, as listed by `/history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub company_name: String,
    pub risk_score: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub risk_factors: BTreeMap<String, f64>,
}

/// Aggregates computed server-side over a user's predictions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    #[serde(default)]
    pub total_predictions: u64,
    #[serde(default)]
    pub avg_risk: f64,
    #[serde(default)]
    pub high_risk_count: u64,
    #[serde(default)]
    pub monthly_trends: Vec<MonthlyTrend>,
}

/// Per-month aggregate, keyed by `YYYY-MM`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// The backend groups under `_id`
    #[serde(alias = "_id")]
    pub period: String,
    pub avg_risk: f64,
    #[serde(default)]
    pub total_predictions: Option<u64>,
    #[serde(default)]
    pub high_risk_count: Option<u64>,
}

/// Parse timestamps in the formats the backend has been seen to emit
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {}", raw)))
}

/// Accounts created without a first name come back with `null`
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
