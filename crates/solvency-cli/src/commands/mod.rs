//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Prediction commands (check, analyze, report)
//! - `core` - Shared utilities (config, dashboard, sessions, printing)
//! - `export` - CSV history export
//! - `history` - Account commands (history, profile)
//! - `status` - Service health

pub mod analyze;
pub mod core;
pub mod export;
pub mod history;
pub mod status;

// Re-export command functions for main.rs
pub use analyze::*;
pub use core::*;
pub use export::*;
pub use history::*;
pub use status::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
