//! Account commands (history, profile)

use anyhow::Result;
use solvency_core::{Dashboard, Profile};

use super::{start_session, truncate};
use crate::cli::AuthArgs;

/// Show recent predictions, monthly trends and summary widgets
pub async fn cmd_history(dashboard: &Dashboard, auth: &AuthArgs, json: bool) -> Result<()> {
    let session = start_session(dashboard, auth).await?;

    if let Some(notice) = dashboard.error() {
        println!("⚠️  {}: {}", notice.message, notice.details);
    }

    let history = dashboard.history();
    let analytics = dashboard.analytics();

    if json {
        let out = serde_json::json!({
            "history": history,
            "analytics": analytics,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let widgets = dashboard.widgets();
    println!();
    println!("📊 {} ({})", session.first_name, session.email);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total predictions: {}", widgets.total_predictions);
    println!("   Average risk:      {}", widgets.avg_risk_display());
    println!("   High risk:         {}", widgets.high_risk_count);
    println!();

    if history.is_empty() {
        println!("   No predictions yet.");
        println!();
        return Ok(());
    }

    println!("   {:<30} {:>8}  {}", "Company", "Risk", "Date");
    for record in &history {
        println!(
            "   {:<30} {:>7}%  {}",
            truncate(&record.company_name, 30),
            record.risk_score,
            record.timestamp.format("%Y-%m-%d %H:%M")
        );
    }
    println!();

    let monthly = dashboard.monthly_trend_chart();
    if !monthly.is_empty() {
        println!("   Monthly average risk:");
        for (period, avg) in monthly.points() {
            println!("     {:<10} {:>6.2}%", period, avg);
        }
        println!();
    }

    Ok(())
}

/// Show the account profile
pub async fn cmd_profile(dashboard: &Dashboard, auth: &AuthArgs) -> Result<Option<Profile>> {
    let session = start_session(dashboard, auth).await?;

    let profile = dashboard.profile();
    println!();
    println!("👤 Profile");
    println!("   Email:      {}", session.email);
    match &profile {
        Some(profile) => {
            println!("   First name: {}", profile.first_name);
            println!("   Theme:      {}", profile.theme);
        }
        None => {
            println!("   First name: {}", session.first_name);
            println!("   (profile could not be loaded)");
        }
    }
    println!();
    Ok(profile)
}
