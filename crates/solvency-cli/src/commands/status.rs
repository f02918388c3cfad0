//! Service status command

use anyhow::Result;
use solvency_core::{Dashboard, PredictionBackend};

/// Check that the prediction service answers
pub async fn cmd_health(dashboard: &Dashboard) -> Result<bool> {
    let client = dashboard.client();
    print!("Checking prediction service at {}... ", client.host());
    let healthy = client.health_check().await;
    if healthy {
        println!("✅ Reachable");
    } else {
        println!("❌ Unreachable");
        println!("\n⚠️  Could not connect to {}", client.host());
        println!("   Set the URL with --api-url, SOLVENCY_API_URL or api_url in the config file");
    }
    Ok(healthy)
}
