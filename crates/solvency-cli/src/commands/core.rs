//! Shared command plumbing: config, client construction and sessions

use std::path::Path;

use anyhow::{bail, Context, Result};
use solvency_core::{
    ApiClient, ClientConfig, Credentials, Dashboard, Error, FinancialInput, Session,
    ValidationErrors,
};

use crate::cli::AuthArgs;

/// Environment variable consulted when --password is not given
pub const PASSWORD_ENV: &str = "SOLVENCY_PASSWORD";

/// Resolve config from defaults, file, environment, then the --api-url flag
pub fn load_config(config_path: Option<&Path>, api_url: Option<&str>) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(config_path).context("Failed to load config")?;
    config.apply_overrides(api_url.map(str::to_string), None)?;
    tracing::debug!(api_url = %config.api_url, timeout = ?config.timeout, "Resolved config");
    Ok(config)
}

/// Build a dashboard over the configured backend
pub fn open_dashboard(config: &ClientConfig) -> Result<Dashboard> {
    let client = ApiClient::from_config(config).context("Failed to create API client")?;
    Ok(Dashboard::new(client))
}

fn resolve_password(auth: &AuthArgs) -> Result<String> {
    if let Some(password) = &auth.password {
        return Ok(password.clone());
    }
    match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => Ok(password),
        _ => bail!("Password required: pass --password or set {}", PASSWORD_ENV),
    }
}

/// Log in (or sign up) and load the account's data
pub async fn start_session(dashboard: &Dashboard, auth: &AuthArgs) -> Result<Session> {
    let credentials = Credentials::new(
        auth.email.clone(),
        resolve_password(auth)?,
        auth.first_name.clone().unwrap_or_default(),
    );

    let result = if auth.signup {
        dashboard.signup(&credentials).await
    } else {
        dashboard.login(&credentials).await
    };
    result.map_err(|e| notice_error(dashboard, e))
}

/// Prefer the dashboard's user-facing notice over the raw error
pub fn notice_error(dashboard: &Dashboard, err: Error) -> anyhow::Error {
    match dashboard.error() {
        Some(notice) => match notice.status {
            Some(status) => {
                anyhow::anyhow!("{}: {} (HTTP {})", notice.message, notice.details, status)
            }
            None => anyhow::anyhow!("{}: {}", notice.message, notice.details),
        },
        None => err.into(),
    }
}

pub fn print_insights(input: &FinancialInput) {
    let insights = solvency_core::advise_insights(input);
    if insights.is_empty() {
        return;
    }
    println!("💡 Insights");
    for (field, message) in &insights {
        println!("   {:<22} {}", field.label(), message);
    }
    println!();
}

pub fn print_field_errors(errors: &ValidationErrors) {
    println!("❌ Invalid input");
    for (field, error) in &errors.0 {
        println!("   {:<22} {}", field.label(), error);
    }
    println!();
}
