//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use solvency_core::models::{Field, FinancialInput};

/// Solvency - Bankruptcy risk from a handful of financial figures
#[derive(Parser)]
#[command(name = "solvency")]
#[command(about = "Client for the Solvency bankruptcy prediction service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Prediction API base URL
    ///
    /// Overrides the config file and SOLVENCY_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: ~/.config/solvency/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate figures and show insights without contacting the service
    Check {
        #[command(flatten)]
        form: FormArgs,
    },

    /// Submit figures for a bankruptcy risk prediction
    Analyze {
        #[command(flatten)]
        auth: OptionalAuthArgs,

        #[command(flatten)]
        form: FormArgs,

        /// Also write a report to this file (.html for HTML, anything else for text)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the prediction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent predictions and analytics for an account
    History {
        #[command(flatten)]
        auth: AuthArgs,

        /// Print history and analytics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the account profile
    Profile {
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Download the full prediction history as CSV
    Export {
        #[command(flatten)]
        auth: AuthArgs,

        /// Output file or directory (a directory gets prediction_history.csv)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Run a prediction and render a printable report
    Report {
        #[command(flatten)]
        auth: OptionalAuthArgs,

        #[command(flatten)]
        form: FormArgs,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Html)]
        format: ReportFormat,

        /// Output file (stdout if not given)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that the prediction service is reachable
    Health,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Html,
    Text,
}

/// Account credentials for commands that need a session
#[derive(Args, Clone, Debug)]
pub struct AuthArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password (falls back to SOLVENCY_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// First name, used when signing up
    #[arg(long)]
    pub first_name: Option<String>,

    /// Create the account instead of logging in
    #[arg(long)]
    pub signup: bool,
}

/// Credentials for commands that work with or without a session
#[derive(Args, Clone, Debug, Default)]
pub struct OptionalAuthArgs {
    /// Account email; when given, the prediction is filed under this account
    #[arg(long)]
    pub email: Option<String>,

    /// Account password (falls back to SOLVENCY_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// First name, used when signing up
    #[arg(long)]
    pub first_name: Option<String>,

    /// Create the account instead of logging in
    #[arg(long)]
    pub signup: bool,
}

impl OptionalAuthArgs {
    pub fn into_auth(self) -> Option<AuthArgs> {
        self.email.map(|email| AuthArgs {
            email,
            password: self.password,
            first_name: self.first_name,
            signup: self.signup,
        })
    }
}

/// The nine financial input fields
///
/// Values are passed through as typed; validation happens before submission.
#[derive(Args, Clone, Debug, Default)]
pub struct FormArgs {
    /// Company name
    #[arg(long)]
    pub company: Option<String>,

    /// Email for alerts (defaults to the account email)
    #[arg(long)]
    pub alert_email: Option<String>,

    /// Total assets
    #[arg(long, allow_hyphen_values = true)]
    pub assets: Option<String>,

    /// Total liabilities
    #[arg(long, allow_hyphen_values = true)]
    pub liabilities: Option<String>,

    /// Net income
    #[arg(long, allow_hyphen_values = true)]
    pub net_income: Option<String>,

    /// Cash flow
    #[arg(long, allow_hyphen_values = true)]
    pub cash_flow: Option<String>,

    /// Debt-to-equity ratio
    #[arg(long, allow_hyphen_values = true)]
    pub debt_equity: Option<String>,

    /// Current ratio
    #[arg(long, allow_hyphen_values = true)]
    pub current_ratio: Option<String>,

    /// Revenue
    #[arg(long, allow_hyphen_values = true)]
    pub revenue: Option<String>,
}

impl FormArgs {
    /// Build the form input; missing values stay empty
    pub fn to_input(&self, default_email: Option<&str>) -> FinancialInput {
        let alert_email = self.alert_email.as_deref().or(default_email);
        [
            (Field::CompanyName, self.company.as_deref()),
            (Field::Email, alert_email),
            (Field::Assets, self.assets.as_deref()),
            (Field::Liabilities, self.liabilities.as_deref()),
            (Field::NetIncome, self.net_income.as_deref()),
            (Field::CashFlow, self.cash_flow.as_deref()),
            (Field::DebtEquity, self.debt_equity.as_deref()),
            (Field::CurrentRatio, self.current_ratio.as_deref()),
            (Field::Revenue, self.revenue.as_deref()),
        ]
        .into_iter()
        .fold(FinancialInput::new(), |input, (field, value)| {
            input.with(field, value.unwrap_or_default())
        })
    }
}
