//! Prediction API backend abstraction
//!
//! # Architecture
//!
//! - `PredictionBackend` trait: one method per API endpoint
//! - `ApiClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `HttpBackend` (reqwest), `MockBackend` (in-memory)
//!
//! # Configuration
//!
//! Environment variables:
//! - `SOLVENCY_BACKEND`: `http` (default) or `mock`
//! - `SOLVENCY_API_URL`, `SOLVENCY_TIMEOUT_SECS`: see [`crate::config`]

mod http;
pub mod mock;
pub mod types;

pub use http::HttpBackend;
pub use mock::{MockBackend, MockEndpoint, MockStore, StoredPrediction};
pub use types::*;

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{
    Analytics, Credentials, FinancialInput, HistoryRecord, PredictionResult, Profile, Session,
};

/// Interface to the remote prediction service
///
/// Non-success responses surface as `Error::Api` carrying the status and the
/// server's message; transport failures as `Error::Http`.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    /// `POST /login`
    async fn login(&self, credentials: &Credentials) -> Result<Session>;

    /// `POST /signup`
    async fn signup(&self, credentials: &Credentials) -> Result<Session>;

    /// `POST /analyze` with the input as a multipart form
    async fn analyze(&self, input: &FinancialInput) -> Result<PredictionResult>;

    /// `GET /history?user_email=`
    async fn history(&self, user_email: &str) -> Result<Vec<HistoryRecord>>;

    /// `GET /analytics?user_email=`
    async fn analytics(&self, user_email: &str) -> Result<Analytics>;

    /// `GET /profile?email=`
    async fn profile(&self, email: &str) -> Result<Profile>;

    /// `GET /export?user_email=`, raw CSV bytes
    async fn export_csv(&self, user_email: &str) -> Result<Vec<u8>>;

    /// Check if the service is reachable
    async fn health_check(&self) -> bool;

    /// Base URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete API client enum
#[derive(Clone)]
pub enum ApiClient {
    /// Remote service over HTTP
    Http(HttpBackend),
    /// In-memory backend for testing and demos
    Mock(MockBackend),
}

impl ApiClient {
    /// Create a client from resolved configuration
    ///
    /// `SOLVENCY_BACKEND=mock` selects the in-memory backend.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let backend = std::env::var("SOLVENCY_BACKEND").unwrap_or_else(|_| "http".to_string());

        match backend.to_lowercase().as_str() {
            "mock" => Ok(ApiClient::Mock(MockBackend::new())),
            "http" => Ok(ApiClient::Http(HttpBackend::from_config(config)?)),
            _ => {
                tracing::warn!(backend = %backend, "Unknown SOLVENCY_BACKEND, falling back to http");
                Ok(ApiClient::Http(HttpBackend::from_config(config)?))
            }
        }
    }

    /// Create an HTTP client directly
    pub fn http(base_url: &str) -> Self {
        ApiClient::Http(HttpBackend::new(base_url))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ApiClient::Mock(MockBackend::new())
    }
}

impl From<MockBackend> for ApiClient {
    fn from(backend: MockBackend) -> Self {
        ApiClient::Mock(backend)
    }
}

impl From<HttpBackend> for ApiClient {
    fn from(backend: HttpBackend) -> Self {
        ApiClient::Http(backend)
    }
}

// Implement PredictionBackend for ApiClient by delegating to the inner backend
#[async_trait]
impl PredictionBackend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        match self {
            ApiClient::Http(b) => b.login(credentials).await,
            ApiClient::Mock(b) => b.login(credentials).await,
        }
    }

    async fn signup(&self, credentials: &Credentials) -> Result<Session> {
        match self {
            ApiClient::Http(b) => b.signup(credentials).await,
            ApiClient::Mock(b) => b.signup(credentials).await,
        }
    }

    async fn analyze(&self, input: &FinancialInput) -> Result<PredictionResult> {
        match self {
            ApiClient::Http(b) => b.analyze(input).await,
            ApiClient::Mock(b) => b.analyze(input).await,
        }
    }

    async fn history(&self, user_email: &str) -> Result<Vec<HistoryRecord>> {
        match self {
            ApiClient::Http(b) => b.history(user_email).await,
            ApiClient::Mock(b) => b.history(user_email).await,
        }
    }

    async fn analytics(&self, user_email: &str) -> Result<Analytics> {
        match self {
            ApiClient::Http(b) => b.analytics(user_email).await,
            ApiClient::Mock(b) => b.analytics(user_email).await,
        }
    }

    async fn profile(&self, email: &str) -> Result<Profile> {
        match self {
            ApiClient::Http(b) => b.profile(email).await,
            ApiClient::Mock(b) => b.profile(email).await,
        }
    }

    async fn export_csv(&self, user_email: &str) -> Result<Vec<u8>> {
        match self {
            ApiClient::Http(b) => b.export_csv(user_email).await,
            ApiClient::Mock(b) => b.export_csv(user_email).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ApiClient::Http(b) => b.health_check().await,
            ApiClient::Mock(b) => b.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            ApiClient::Http(b) => b.host(),
            ApiClient::Mock(b) => b.host(),
        }
    }
}
