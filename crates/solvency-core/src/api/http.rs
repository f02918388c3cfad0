//! HTTP backend for the prediction API

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, Response};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{
    Analytics, Credentials, FinancialInput, HistoryRecord, PredictionResult, Profile, Session,
};

use super::types::{ApiErrorBody, AuthRequest, AuthResponse};
use super::PredictionBackend;

/// reqwest-backed client for the prediction API
#[derive(Clone)]
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend with reqwest defaults (no timeout)
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a backend honouring the configured timeout
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authenticate(&self, path: &str, credentials: &Credentials) -> Result<Session> {
        let request = AuthRequest {
            email: credentials.email.clone(),
            password: credentials.password.clone(),
            first_name: credentials.first_name.clone(),
        };

        debug!(path, email = %credentials.email, "Authenticating");
        let response = self
            .http_client
            .post(self.url(path))
            .json(&request)
            .send()
            .await?;

        let auth: AuthResponse = ensure_success(response).await?.json().await?;
        Ok(auth.into())
    }
}

/// Turn a non-success response into `Error::Api`
///
/// The backend reports failures as `{"error": "..."}`; anything else is
/// passed through as raw text, or the status reason when the body is empty.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };

    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PredictionBackend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticate("/login", credentials).await
    }

    async fn signup(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticate("/signup", credentials).await
    }

    async fn analyze(&self, input: &FinancialInput) -> Result<PredictionResult> {
        let form = input
            .iter()
            .fold(Form::new(), |form, (field, value)| {
                form.text(field.as_str(), value.to_string())
            });

        debug!(company = %input.get(crate::models::Field::CompanyName), "Submitting analysis");
        let response = self
            .http_client
            .post(self.url("/analyze"))
            .multipart(form)
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    async fn history(&self, user_email: &str) -> Result<Vec<HistoryRecord>> {
        let response = self
            .http_client
            .get(self.url("/history"))
            .query(&[("user_email", user_email)])
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    async fn analytics(&self, user_email: &str) -> Result<Analytics> {
        let response = self
            .http_client
            .get(self.url("/analytics"))
            .query(&[("user_email", user_email)])
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    async fn profile(&self, email: &str) -> Result<Profile> {
        let response = self
            .http_client
            .get(self.url("/profile"))
            .query(&[("email", email)])
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    async fn export_csv(&self, user_email: &str) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(self.url("/export"))
            .query(&[("user_email", user_email)])
            .send()
            .await?;

        let bytes = ensure_success(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn health_check(&self) -> bool {
        // The API has no health route; any HTTP answer means it is reachable
        match self.http_client.get(self.url("/")).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
