//! Mock backend for testing
//!
//! An in-memory stand-in for the prediction API. It keeps users and
//! predictions like the real service does, scores input with fixed rules,
//! and can be told to fail or slow down per endpoint.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::{
    Analytics, Credentials, Field, FinancialInput, HistoryRecord, MonthlyTrend, PredictionResult,
    Profile, Session, Theme, HIGH_RISK_THRESHOLD,
};
use crate::validate::parse_number;

use super::PredictionBackend;

/// Number of records `/history` returns
pub const HISTORY_LIMIT: usize = 10;

/// Email predictions are filed under when the form leaves it blank
pub const GUEST_EMAIL: &str = "guest";

/// Mock model output for every prediction
pub const MOCK_CONFIDENCE: f64 = 95.0;

/// Column headers of the history export
pub const EXPORT_HEADERS: [&str; 12] = [
    "Company Name",
    "Risk Score",
    "Confidence",
    "Risk Factors",
    "Timestamp",
    "Total Assets",
    "Total Liabilities",
    "Net Income",
    "Cash Flow",
    "Debt-to-Equity",
    "Current Ratio",
    "Revenue",
];

/// Endpoints that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockEndpoint {
    Login,
    Signup,
    Analyze,
    History,
    Analytics,
    Profile,
    Export,
}

#[derive(Debug, Clone)]
struct StoredUser {
    password: String,
    first_name: String,
    theme: Theme,
}

/// A prediction as the mock service files it
#[derive(Debug, Clone)]
pub struct StoredPrediction {
    pub company_name: String,
    pub user_email: String,
    pub input_data: BTreeMap<String, f64>,
    pub risk_score: f64,
    pub confidence: f64,
    pub risk_factors: BTreeMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

/// Users and predictions held by the mock service
#[derive(Debug, Default)]
pub struct MockStore {
    users: HashMap<String, StoredUser>,
    predictions: Vec<StoredPrediction>,
}

impl MockStore {
    pub fn add_user(&mut self, email: &str, password: &str, first_name: &str, theme: Theme) {
        self.users.insert(
            email.to_string(),
            StoredUser {
                password: password.to_string(),
                first_name: first_name.to_string(),
                theme,
            },
        );
    }

    pub fn insert_prediction(&mut self, prediction: StoredPrediction) {
        self.predictions.push(prediction);
    }

    pub fn prediction_count(&self) -> usize {
        self.predictions.len()
    }

    pub fn login(&self, credentials: &Credentials) -> Result<Session> {
        match self.users.get(&credentials.email) {
            Some(user) if user.password == credentials.password => Ok(Session {
                email: credentials.email.clone(),
                first_name: user.first_name.clone(),
            }),
            _ => Err(api_error(401, "Invalid credentials")),
        }
    }

    pub fn signup(&mut self, credentials: &Credentials) -> Result<Session> {
        if self.users.contains_key(&credentials.email) {
            return Err(api_error(400, "User already exists"));
        }
        self.add_user(
            &credentials.email,
            &credentials.password,
            &credentials.first_name,
            Theme::Light,
        );
        Ok(Session {
            email: credentials.email.clone(),
            first_name: credentials.first_name.clone(),
        })
    }

    pub fn profile(&self, email: &str) -> Result<Profile> {
        self.users
            .get(email)
            .map(|user| Profile {
                email: email.to_string(),
                first_name: user.first_name.clone(),
                theme: user.theme,
            })
            .ok_or_else(|| api_error(404, "User not found"))
    }

    /// Score the input and file it under the form's email
    pub fn analyze(&mut self, input: &FinancialInput) -> Result<PredictionResult> {
        let mut input_data = BTreeMap::new();
        for field in Field::ALL.into_iter().filter(|f| f.is_numeric()) {
            let raw = input.get(field);
            let value = parse_number(raw).ok_or_else(|| {
                api_error(400, &format!("could not convert string to float: '{}'", raw))
            })?;
            input_data.insert(backend_feature_name(field).to_string(), value);
        }

        let company_name = input.get(Field::CompanyName).to_string();
        let user_email = match input.get(Field::Email).trim() {
            "" => GUEST_EMAIL.to_string(),
            email => email.to_string(),
        };

        let risk_factors = score_risk_factors(input);
        let risk_score = risk_factors.values().sum::<f64>().min(100.0);

        self.predictions.push(StoredPrediction {
            company_name: company_name.clone(),
            user_email,
            input_data: input_data.clone(),
            risk_score,
            confidence: MOCK_CONFIDENCE,
            risk_factors: risk_factors.clone(),
            timestamp: Utc::now(),
        });

        Ok(PredictionResult {
            summary: format!(
                "{} has a {}% likelihood of bankruptcy.",
                company_name, risk_score
            ),
            company_name,
            risk_score,
            confidence: MOCK_CONFIDENCE,
            risk_factors,
            input_data: input_data
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::from(v)))
                .collect(),
        })
    }

    /// A user's predictions, newest first
    fn predictions_for(&self, email: &str) -> Vec<&StoredPrediction> {
        let mut records: Vec<&StoredPrediction> = self
            .predictions
            .iter()
            .rev()
            .filter(|p| p.user_email == email)
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    pub fn history(&self, email: &str) -> Vec<HistoryRecord> {
        self.predictions_for(email)
            .into_iter()
            .take(HISTORY_LIMIT)
            .map(|p| HistoryRecord {
                company_name: p.company_name.clone(),
                risk_score: p.risk_score,
                timestamp: p.timestamp,
                confidence: Some(p.confidence),
                risk_factors: p.risk_factors.clone(),
            })
            .collect()
    }

    pub fn analytics(&self, email: &str) -> Analytics {
        let mut months: BTreeMap<String, (u64, f64, u64)> = BTreeMap::new();
        for p in self.predictions.iter().filter(|p| p.user_email == email) {
            let entry = months
                .entry(p.timestamp.format("%Y-%m").to_string())
                .or_default();
            entry.0 += 1;
            entry.1 += p.risk_score;
            if p.risk_score > HIGH_RISK_THRESHOLD {
                entry.2 += 1;
            }
        }

        let total: u64 = months.values().map(|m| m.0).sum();
        let risk_sum: f64 = months.values().map(|m| m.1).sum();
        Analytics {
            total_predictions: total,
            avg_risk: risk_sum / total.max(1) as f64,
            high_risk_count: months.values().map(|m| m.2).sum(),
            monthly_trends: months
                .into_iter()
                .map(|(period, (count, sum, high))| MonthlyTrend {
                    period,
                    avg_risk: sum / count as f64,
                    total_predictions: Some(count),
                    high_risk_count: Some(high),
                })
                .collect(),
        }
    }

    /// Full history (not capped) as CSV
    pub fn export_csv(&self, email: &str) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(EXPORT_HEADERS)?;
        for p in self.predictions_for(email) {
            let factors = p
                .risk_factors
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            let mut row = vec![
                p.company_name.clone(),
                p.risk_score.to_string(),
                p.confidence.to_string(),
                factors,
                p.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            ];
            for field in Field::ALL.into_iter().filter(|f| f.is_numeric()) {
                let value = p
                    .input_data
                    .get(backend_feature_name(field))
                    .copied()
                    .unwrap_or_default();
                row.push(value.to_string());
            }
            writer.write_record(&row)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::InvalidData(format!("Failed to finish CSV: {}", e)))
    }
}

/// Feature name the backend model uses for a numeric field
pub fn backend_feature_name(field: Field) -> &'static str {
    match field {
        Field::Assets => "Total Assets",
        Field::Liabilities => "Total Liabilities",
        Field::NetIncome => "Net Income",
        Field::CashFlow => "Cash Flow",
        Field::DebtEquity => "Debt-to-Equity",
        Field::CurrentRatio => "Current Ratio",
        Field::Revenue => "Revenue",
        Field::CompanyName => "Company Name",
        Field::Email => "Email",
    }
}

/// Fixed-weight risk factors, mirroring the service's rule layer
fn score_risk_factors(input: &FinancialInput) -> BTreeMap<String, f64> {
    let rules: [(Field, fn(f64) -> bool, &str, f64); 4] = [
        (Field::DebtEquity, |v| v > 2.0, "High Debt-to-Equity", 40.0),
        (Field::CurrentRatio, |v| v < 1.0, "Low Liquidity", 30.0),
        (Field::NetIncome, |v| v < 0.0, "Negative Profitability", 20.0),
        (Field::CashFlow, |v| v < 0.0, "Negative Cash Flow", 10.0),
    ];
    rules
        .iter()
        .filter(|(field, triggers, _, _)| input.number(*field).is_some_and(|v| triggers(v)))
        .map(|(_, _, name, weight)| (name.to_string(), *weight))
        .collect()
}

fn api_error(status: u16, message: &str) -> Error {
    Error::Api {
        status,
        message: message.to_string(),
    }
}

#[derive(Debug, Default)]
struct MockState {
    store: MockStore,
    failures: HashMap<MockEndpoint, (u16, String)>,
    calls: HashMap<MockEndpoint, usize>,
    latency: Duration,
}

/// Mock prediction backend
///
/// Clones share state, so a test can keep a handle for seeding and
/// inspection while the dashboard owns another.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    /// Whether health_check should return true
    pub healthy: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create an empty, healthy mock backend
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            healthy: true,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Register a user
    pub fn with_user(self, email: &str, password: &str, first_name: &str) -> Self {
        self.with_user_theme(email, password, first_name, Theme::Light)
    }

    pub fn with_user_theme(
        self,
        email: &str,
        password: &str,
        first_name: &str,
        theme: Theme,
    ) -> Self {
        if let Ok(mut state) = self.state() {
            state.store.add_user(email, password, first_name, theme);
        }
        self
    }

    /// Make an endpoint answer with an error status until cleared
    pub fn fail(&self, endpoint: MockEndpoint, status: u16, message: &str) {
        if let Ok(mut state) = self.state() {
            state
                .failures
                .insert(endpoint, (status, message.to_string()));
        }
    }

    pub fn clear_failure(&self, endpoint: MockEndpoint) {
        if let Ok(mut state) = self.state() {
            state.failures.remove(&endpoint);
        }
    }

    /// Delay every call by this much
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut state) = self.state() {
            state.latency = latency;
        }
    }

    /// How many times an endpoint has been called
    pub fn calls(&self, endpoint: MockEndpoint) -> usize {
        self.state()
            .map(|s| s.calls.get(&endpoint).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Direct access to the stored data
    pub fn with_store<T>(&self, f: impl FnOnce(&mut MockStore) -> T) -> Result<T> {
        Ok(f(&mut self.state()?.store))
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>> {
        self.state
            .lock()
            .map_err(|_| Error::InvalidData("Mock backend state lock poisoned".into()))
    }

    /// Count the call, apply latency and any injected failure
    async fn enter(&self, endpoint: MockEndpoint) -> Result<()> {
        let latency = {
            let mut state = self.state()?;
            *state.calls.entry(endpoint).or_default() += 1;
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match self.state()?.failures.get(&endpoint) {
            Some((status, message)) => Err(api_error(*status, message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PredictionBackend for MockBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        self.enter(MockEndpoint::Login).await?;
        self.state()?.store.login(credentials)
    }

    async fn signup(&self, credentials: &Credentials) -> Result<Session> {
        self.enter(MockEndpoint::Signup).await?;
        self.state()?.store.signup(credentials)
    }

    async fn analyze(&self, input: &FinancialInput) -> Result<PredictionResult> {
        self.enter(MockEndpoint::Analyze).await?;
        self.state()?.store.analyze(input)
    }

    async fn history(&self, user_email: &str) -> Result<Vec<HistoryRecord>> {
        self.enter(MockEndpoint::History).await?;
        Ok(self.state()?.store.history(user_email))
    }

    async fn analytics(&self, user_email: &str) -> Result<Analytics> {
        self.enter(MockEndpoint::Analytics).await?;
        Ok(self.state()?.store.analytics(user_email))
    }

    async fn profile(&self, email: &str) -> Result<Profile> {
        self.enter(MockEndpoint::Profile).await?;
        self.state()?.store.profile(email)
    }

    async fn export_csv(&self, user_email: &str) -> Result<Vec<u8>> {
        self.enter(MockEndpoint::Export).await?;
        self.state()?.store.export_csv(user_email)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn host(&self) -> &str {
        "mock://prediction-api"
    }
}
