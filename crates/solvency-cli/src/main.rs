//! Solvency CLI - Bankruptcy risk dashboard client
//!
//! Usage:
//!   solvency check --company Acme --assets 1000 ...     Validate and show insights offline
//!   solvency analyze --email you@x.com --company ...    Submit a prediction
//!   solvency history --email you@x.com                  Recent predictions and analytics
//!   solvency export --email you@x.com -o ./             Download history as CSV
//!   solvency health                                     Check the service

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    // Offline command needs no client
    if let Commands::Check { form } = &cli.command {
        return commands::cmd_check(form);
    }

    let config = commands::load_config(cli.config.as_deref(), cli.api_url.as_deref())?;
    let dashboard = commands::open_dashboard(&config)?;

    match cli.command {
        Commands::Check { .. } => Ok(()),
        Commands::Analyze {
            auth,
            form,
            report,
            json,
        } => {
            let auth = auth.into_auth();
            commands::cmd_analyze(&dashboard, auth.as_ref(), &form, report.as_deref(), json)
                .await
                .map(|_| ())
        }
        Commands::History { auth, json } => commands::cmd_history(&dashboard, &auth, json).await,
        Commands::Profile { auth } => commands::cmd_profile(&dashboard, &auth).await.map(|_| ()),
        Commands::Export { auth, output } => commands::cmd_export(&dashboard, &auth, &output)
            .await
            .map(|_| ()),
        Commands::Report {
            auth,
            form,
            format,
            output,
        } => {
            let auth = auth.into_auth();
            commands::cmd_report(&dashboard, auth.as_ref(), &form, format, output.as_deref())
                .await
                .map(|_| ())
        }
        Commands::Health => {
            if commands::cmd_health(&dashboard).await? {
                Ok(())
            } else {
                anyhow::bail!("Prediction service unreachable")
            }
        }
    }
}
