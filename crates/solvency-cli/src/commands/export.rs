//! CSV history export

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use solvency_core::export::{parse_history_csv, save_csv, summarize};
use solvency_core::Dashboard;

use super::{notice_error, start_session};
use crate::cli::AuthArgs;

/// Download the account's history and save it as CSV
pub async fn cmd_export(dashboard: &Dashboard, auth: &AuthArgs, output: &Path) -> Result<PathBuf> {
    start_session(dashboard, auth).await?;

    let bytes = dashboard
        .export_csv()
        .await
        .map_err(|e| notice_error(dashboard, e))?;
    let path = save_csv(output, &bytes)
        .with_context(|| format!("Failed to save export to {}", output.display()))?;

    println!("💾 Exported history to {}", path.display());
    match parse_history_csv(&bytes) {
        Ok(rows) => {
            let summary = summarize(&rows);
            println!(
                "   {} predictions, avg risk {:.2}%, {} high risk",
                summary.rows, summary.avg_risk, summary.high_risk_count
            );
        }
        Err(e) => tracing::warn!(error = %e, "Could not summarise export"),
    }
    Ok(path)
}
