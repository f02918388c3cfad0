//! Solvency Core Library
//!
//! Client-side logic for the Solvency bankruptcy-risk dashboard:
//! - Prediction API client with HTTP and in-memory backends
//! - Session/data controller with concurrent, epoch-guarded refreshes
//! - Input validation, live insights and the form submission state machine
//! - Chart-ready views and summary widgets
//! - HTML/text reports and CSV history export
//! - Layered client configuration (defaults, TOML file, environment)

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod form;
pub mod insights;
pub mod models;
pub mod validate;

/// Test utilities including mock prediction API server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use api::{ApiClient, HttpBackend, MockBackend, MockEndpoint, PredictionBackend};
pub use config::ClientConfig;
pub use dashboard::{
    ChartSeries, Dashboard, DashboardState, ErrorKind, ErrorNotice, RefreshOutcome, Widgets,
};
pub use error::{Error, Result};
pub use export::{ExportRow, ExportSummary};
pub use form::{InputForm, SubmissionPhase};
pub use insights::advise_insights;
pub use models::{
    Analytics, Credentials, Field, FinancialInput, HistoryRecord, MonthlyTrend, PredictionResult,
    Profile, RiskBand, Session, Theme,
};
pub use validate::{validate, FieldError, ValidationErrors};
