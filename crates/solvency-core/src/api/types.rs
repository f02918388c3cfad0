//! Wire types for the prediction API that are not domain models

use serde::{Deserialize, Serialize};

use crate::models::{null_as_empty, Session};

/// Body of `POST /login` and `POST /signup`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
}

/// Successful auth response; the backend also sends a `message`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
}

impl From<AuthResponse> for Session {
    fn from(resp: AuthResponse) -> Self {
        Session {
            email: resp.email,
            first_name: resp.first_name,
        }
    }
}

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}
