//! Prediction commands (check, analyze, report)

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Local;
use solvency_core::export::{render_html_report, render_text_report};
use solvency_core::{
    validate, Dashboard, Error, FinancialInput, InputForm, PredictionResult, Session,
};

use super::{notice_error, print_field_errors, print_insights, start_session};
use crate::cli::{AuthArgs, FormArgs, ReportFormat};

/// Validate figures and show insights offline
pub fn cmd_check(form: &FormArgs) -> Result<()> {
    let input = form.to_input(None);
    print_insights(&input);

    let errors = validate::check(&input);
    if !errors.is_empty() {
        print_field_errors(&errors);
        bail!("{} field(s) need attention", errors.len());
    }
    println!("✅ All fields valid");
    Ok(())
}

/// Log in when credentials were given, then submit the form
async fn submit(
    dashboard: &Dashboard,
    auth: Option<&AuthArgs>,
    form: &FormArgs,
) -> Result<(Option<Session>, PredictionResult)> {
    let session = match auth {
        Some(auth) => Some(start_session(dashboard, auth).await?),
        None => None,
    };

    let input = form.to_input(session.as_ref().map(|s| s.email.as_str()));
    tracing::debug!(input = %describe_input(&input), "Submitting form");
    print_insights(&input);

    let mut input_form = InputForm::from_input(input);
    match dashboard.submit(&mut input_form).await {
        Ok(prediction) => Ok((session, prediction)),
        Err(Error::Validation(errors)) => {
            print_field_errors(&errors);
            bail!("{} field(s) need attention", errors.len())
        }
        Err(e) => Err(notice_error(dashboard, e)),
    }
}

fn print_prediction(prediction: &PredictionResult) {
    println!();
    println!("📈 Prediction: {}", prediction.company_name);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Risk score:  {}% ({})",
        prediction.risk_score,
        prediction.risk_band().as_str()
    );
    println!("   Confidence:  {}%", prediction.confidence);
    if !prediction.summary.is_empty() {
        println!("   {}", prediction.summary);
    }
    if !prediction.risk_factors.is_empty() {
        println!();
        println!("   Risk factors:");
        for (name, impact) in &prediction.risk_factors {
            println!("     {:<28} {:>6}", name, impact);
        }
    }
    println!();
}

/// Write a report, picking HTML or text from the file extension
fn write_report(prediction: &PredictionResult, path: &Path) -> Result<()> {
    let is_html = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
    let now = Local::now();
    let content = if is_html {
        render_html_report(prediction, &now)
    } else {
        render_text_report(prediction, &now)
    };
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    println!("📄 Report written to {}", path.display());
    Ok(())
}

/// Submit figures and print the prediction
pub async fn cmd_analyze(
    dashboard: &Dashboard,
    auth: Option<&AuthArgs>,
    form: &FormArgs,
    report: Option<&Path>,
    json: bool,
) -> Result<PredictionResult> {
    let (session, prediction) = submit(dashboard, auth, form).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        print_prediction(&prediction);
        if session.is_some() {
            let widgets = dashboard.widgets();
            println!(
                "   Account: {} predictions, avg risk {}, {} high risk",
                widgets.total_predictions,
                widgets.avg_risk_display(),
                widgets.high_risk_count
            );
            println!();
        }
    }

    if let Some(path) = report {
        write_report(&prediction, path)?;
    }
    Ok(prediction)
}

/// Submit figures and render the printable report
pub async fn cmd_report(
    dashboard: &Dashboard,
    auth: Option<&AuthArgs>,
    form: &FormArgs,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<String> {
    let (_, prediction) = submit(dashboard, auth, form).await?;

    let now = Local::now();
    let content = match format {
        ReportFormat::Html => render_html_report(&prediction, &now),
        ReportFormat::Text => render_text_report(&prediction, &now),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("📄 Report written to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(content)
}

/// `field=value` pairs for debug logging
fn describe_input(input: &FinancialInput) -> String {
    input
        .iter()
        .map(|(field, value)| format!("{}={}", field.as_str(), value))
        .collect::<Vec<_>>()
        .join(" ")
}
