//! Test utilities for solvency-core
//!
//! This module provides a mock prediction API server that speaks the same
//! HTTP contract as the real service, backed by a [`MockBackend`]. Use it to
//! exercise [`crate::api::HttpBackend`] end to end.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    extract::{Json, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::sync::oneshot;

use crate::api::{ApiErrorBody, AuthRequest, AuthResponse, MockBackend, PredictionBackend};
use crate::error::Result;
use crate::models::{Credentials, Field, FinancialInput, Session};

/// Mock prediction API server for testing and development
pub struct MockApiServer {
    addr: SocketAddr,
    backend: MockBackend,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockApiServer {
    /// Start an empty server on an available port
    pub async fn start() -> Self {
        Self::start_with(MockBackend::new()).await
    }

    /// Start a server over an existing (possibly seeded) backend
    pub async fn start_with(backend: MockBackend) -> Self {
        let app = Router::new()
            .route("/", get(handle_root))
            .route("/login", post(handle_login))
            .route("/signup", post(handle_signup))
            .route("/analyze", post(handle_analyze))
            .route("/history", get(handle_history))
            .route("/analytics", get(handle_analytics))
            .route("/profile", get(handle_profile))
            .route("/export", get(handle_export))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            backend,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Handle on the backing store, for seeding and failure injection
    pub fn backend(&self) -> &MockBackend {
        &self.backend
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `{"error": ...}` with the backend's status, like the real service
fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            let status = e
                .status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(ApiErrorBody { error: e.details() })).into_response()
        }
    }
}

fn auth_body(session: Session, message: &str) -> AuthResponse {
    AuthResponse {
        message: Some(message.to_string()),
        email: session.email,
        first_name: session.first_name,
    }
}

fn credentials(req: AuthRequest) -> Credentials {
    Credentials::new(req.email, req.password, req.first_name)
}

fn query_param(params: &HashMap<String, String>, key: &str) -> String {
    params.get(key).cloned().unwrap_or_default()
}

async fn handle_root() -> &'static str {
    "Prediction API is running"
}

async fn handle_login(
    State(backend): State<MockBackend>,
    Json(req): Json<AuthRequest>,
) -> Response {
    let result = backend.login(&credentials(req)).await;
    respond(result.map(|s| auth_body(s, "Login successful")))
}

async fn handle_signup(
    State(backend): State<MockBackend>,
    Json(req): Json<AuthRequest>,
) -> Response {
    let result = backend.signup(&credentials(req)).await;
    respond(result.map(|s| auth_body(s, "User registered successfully")))
}

async fn handle_analyze(State(backend): State<MockBackend>, mut multipart: Multipart) -> Response {
    let mut input = FinancialInput::new();
    while let Ok(Some(part)) = multipart.next_field().await {
        let Some(field) = part.name().and_then(|n| n.parse::<Field>().ok()) else {
            continue;
        };
        if let Ok(text) = part.text().await {
            input.set(field, text);
        }
    }
    respond(backend.analyze(&input).await)
}

/// Timestamps go out in HTTP-date form, as the service's JSON encoder emits them
async fn handle_history(
    State(backend): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let result = backend.history(&query_param(&params, "user_email")).await;
    respond(result.map(|records| {
        records
            .into_iter()
            .map(|r| {
                json!({
                    "company_name": r.company_name,
                    "risk_score": r.risk_score,
                    "confidence": r.confidence,
                    "risk_factors": r.risk_factors,
                    "timestamp": r.timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
                })
            })
            .collect::<Vec<_>>()
    }))
}

/// Monthly groups are keyed `_id`, as the aggregation pipeline names them
async fn handle_analytics(
    State(backend): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let result = backend.analytics(&query_param(&params, "user_email")).await;
    respond(result.map(|analytics| {
        let trends: Vec<_> = analytics
            .monthly_trends
            .iter()
            .map(|t| json!({ "_id": t.period, "avg_risk": t.avg_risk }))
            .collect();
        json!({
            "total_predictions": analytics.total_predictions,
            "avg_risk": analytics.avg_risk,
            "high_risk_count": analytics.high_risk_count,
            "monthly_trends": trends,
        })
    }))
}

async fn handle_profile(
    State(backend): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    respond(backend.profile(&query_param(&params, "email")).await)
}

async fn handle_export(
    State(backend): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match backend.export_csv(&query_param(&params, "user_email")).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=prediction_history.csv",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => respond::<()>(Err(e)),
    }
}
