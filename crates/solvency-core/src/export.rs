//! Client-side exports
//!
//! Supports:
//! - Printable HTML report for the current prediction
//! - Plain-text report with the same content
//! - Saving and summarising the server's CSV history export

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use serde::Deserialize;

use crate::error::Result;
use crate::models::{PredictionResult, HIGH_RISK_THRESHOLD};

/// Default file name for the history download
pub const CSV_FILE_NAME: &str = "prediction_history.csv";

pub const REPORT_TITLE: &str = "Bankruptcy Prediction Report";

/// Long US-style date, e.g. `Monday, October 19, 2026 02:05:09 PM`
pub fn format_generated_on<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format("%A, %B %-d, %Y %I:%M:%S %p").to_string()
}

fn format_number(value: f64) -> String {
    value.to_string()
}

fn format_json_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| n.to_string()),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `name: value` pairs joined with commas
fn join_risk_factors(prediction: &PredictionResult) -> String {
    prediction
        .risk_factors
        .iter()
        .map(|(k, v)| format!("{}: {}", k, format_number(*v)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_input_data(prediction: &PredictionResult) -> String {
    prediction
        .input_data
        .iter()
        .map(|(k, v)| format!("{}: {}", k, format_json_value(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Standalone printable HTML page for a prediction
pub fn render_html_report<Tz: TimeZone>(
    prediction: &PredictionResult,
    generated_at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: fmt::Display,
{
    let color = prediction.risk_band().color();
    let rows = [
        ("Company Name", escape_html(&prediction.company_name), false),
        (
            "Risk Score",
            format!("{}%", format_number(prediction.risk_score)),
            true,
        ),
        (
            "Confidence",
            format!("{}%", format_number(prediction.confidence)),
            false,
        ),
        ("Summary", escape_html(&prediction.summary), false),
        ("Risk Factors", escape_html(&join_risk_factors(prediction)), false),
        ("Input Data", escape_html(&join_input_data(prediction)), false),
    ];

    let mut html = String::new();
    html.push_str("<html>\n<head>\n");
    let _ = writeln!(html, "<title>{}</title>", REPORT_TITLE);
    html.push_str("<style>\n");
    html.push_str("body { font-family: Arial, sans-serif; padding: 20px; color: #1a3c34; }\n");
    html.push_str(".report-container { max-width: 800px; margin: 0 auto; padding: 20px; }\n");
    html.push_str("h1 { color: #2e7d32; text-align: center; }\n");
    html.push_str("table { width: 100%; border-collapse: collapse; margin: 20px 0; }\n");
    html.push_str("th, td { padding: 10px; border: 1px solid #ddd; text-align: left; }\n");
    html.push_str("th { background: #e8f5e9; color: #2e7d32; }\n");
    let _ = writeln!(
        html,
        ".risk-score {{ font-size: 1.5em; font-weight: bold; color: {}; }}",
        color
    );
    html.push_str(".footer { text-align: center; font-size: 0.9em; margin-top: 20px; color: #666; }\n");
    html.push_str("</style>\n</head>\n<body>\n<div class=\"report-container\">\n");
    let _ = writeln!(html, "<h1>{}</h1>", REPORT_TITLE);
    html.push_str("<table>\n<tr><th>Field</th><th>Value</th></tr>\n");
    for (label, value, is_score) in rows {
        let class = if is_score { " class=\"risk-score\"" } else { "" };
        let _ = writeln!(html, "<tr><td>{}</td><td{}>{}</td></tr>", label, class, value);
    }
    html.push_str("</table>\n");
    let _ = writeln!(
        html,
        "<div class=\"footer\">Generated on: {}</div>",
        escape_html(&format_generated_on(generated_at))
    );
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// Line-by-line text rendition of the report
pub fn render_text_report<Tz: TimeZone>(
    prediction: &PredictionResult,
    generated_at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "{}", REPORT_TITLE);
    let _ = writeln!(out);
    let _ = writeln!(out, "Company: {}", prediction.company_name);
    let _ = writeln!(
        out,
        "Risk Score: {}% ({})",
        format_number(prediction.risk_score),
        prediction.risk_band().as_str()
    );
    let _ = writeln!(out, "Confidence: {}%", format_number(prediction.confidence));
    let _ = writeln!(out, "Summary: {}", prediction.summary);
    let _ = writeln!(out, "Risk Factors: {}", join_risk_factors(prediction));
    let _ = writeln!(out, "Input Data: {}", join_input_data(prediction));
    let _ = writeln!(out);
    let _ = writeln!(out, "Generated on: {}", format_generated_on(generated_at));
    out
}

/// One row of the server's history export
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Risk Score")]
    pub risk_score: f64,
    #[serde(rename = "Confidence", default)]
    pub confidence: Option<f64>,
    #[serde(rename = "Risk Factors", default)]
    pub risk_factors: String,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
    #[serde(rename = "Total Assets", default)]
    pub total_assets: Option<f64>,
    #[serde(rename = "Total Liabilities", default)]
    pub total_liabilities: Option<f64>,
    #[serde(rename = "Net Income", default)]
    pub net_income: Option<f64>,
    #[serde(rename = "Cash Flow", default)]
    pub cash_flow: Option<f64>,
    #[serde(rename = "Debt-to-Equity", default)]
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "Current Ratio", default)]
    pub current_ratio: Option<f64>,
    #[serde(rename = "Revenue", default)]
    pub revenue: Option<f64>,
}

/// Aggregate view of an export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub rows: usize,
    pub avg_risk: f64,
    pub high_risk_count: usize,
}

/// Parse the CSV bytes returned by `/export`
pub fn parse_history_csv(bytes: &[u8]) -> Result<Vec<ExportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

pub fn summarize(rows: &[ExportRow]) -> ExportSummary {
    if rows.is_empty() {
        return ExportSummary::default();
    }
    let total: f64 = rows.iter().map(|r| r.risk_score).sum();
    ExportSummary {
        rows: rows.len(),
        avg_risk: total / rows.len() as f64,
        high_risk_count: rows
            .iter()
            .filter(|r| r.risk_score > HIGH_RISK_THRESHOLD)
            .count(),
    }
}

/// Write the export; a directory target gets [`CSV_FILE_NAME`] inside it
pub fn save_csv(target: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let path = if target.is_dir() {
        target.join(CSV_FILE_NAME)
    } else {
        target.to_path_buf()
    };
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn prediction(score: f64) -> PredictionResult {
        PredictionResult {
            company_name: "Acme & Sons <Ltd>".into(),
            risk_score: score,
            confidence: 95.0,
            summary: "Acme has a 70% likelihood of bankruptcy.".into(),
            risk_factors: BTreeMap::from([
                ("High Debt-to-Equity".to_string(), 40.0),
                ("Low Liquidity".to_string(), 30.0),
            ]),
            input_data: BTreeMap::from([
                ("Revenue".to_string(), serde_json::json!(5000.0)),
                ("Current Ratio".to_string(), serde_json::json!(0.5)),
            ]),
        }
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_format_generated_on() {
        assert_eq!(
            format_generated_on(&generated_at()),
            "Monday, October 19, 2026 02:05:09 PM"
        );
        let morning = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        assert_eq!(format_generated_on(&morning), "Tuesday, March 5, 2024 09:00:00 AM");
    }

    #[test]
    fn test_html_report_escapes_and_colours() {
        let html = render_html_report(&prediction(70.0), &generated_at());
        assert!(html.contains("Acme &amp; Sons &lt;Ltd&gt;"));
        assert!(!html.contains("<Ltd>"));
        assert!(html.contains("color: #d32f2f"));
        assert!(html.contains("<td class=\"risk-score\">70%</td>"));
        assert!(html.contains("High Debt-to-Equity: 40, Low Liquidity: 30"));
        assert!(html.contains("Current Ratio: 0.5, Revenue: 5000"));
        assert!(html.contains("Generated on: Monday, October 19, 2026 02:05:09 PM"));
    }

    #[test]
    fn test_html_report_band_colours() {
        let low = render_html_report(&prediction(10.0), &generated_at());
        assert!(low.contains("font-weight: bold; color: #2e7d32;"));
        let moderate = render_html_report(&prediction(60.0), &generated_at());
        assert!(moderate.contains("font-weight: bold; color: #f9a825;"));
    }

    #[test]
    fn test_text_report() {
        let text = render_text_report(&prediction(70.0), &generated_at());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], REPORT_TITLE);
        assert!(lines.contains(&"Company: Acme & Sons <Ltd>"));
        assert!(lines.contains(&"Risk Score: 70% (high)"));
        assert!(lines.contains(&"Confidence: 95%"));
        assert_eq!(
            lines.last(),
            Some(&"Generated on: Monday, October 19, 2026 02:05:09 PM")
        );
    }

    const SAMPLE_CSV: &str = "\
Company Name,Risk Score,Confidence,Risk Factors,Timestamp,Total Assets,Total Liabilities,Net Income,Cash Flow,Debt-to-Equity,Current Ratio,Revenue
Acme,70,95,\"High Debt-to-Equity: 40; Low Liquidity: 30\",2024-05-01 10:00:00,1000,800,-5,10,3,0.5,5000
Beta,10,95,,2024-04-01 10:00:00,2000,100,50,20,0.2,3,9000
";

    #[test]
    fn test_parse_history_csv() {
        let rows = parse_history_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].company_name, "Acme");
        assert_eq!(rows[0].risk_factors, "High Debt-to-Equity: 40; Low Liquidity: 30");
        assert_eq!(rows[0].debt_to_equity, Some(3.0));
        assert_eq!(rows[1].risk_factors, "");

        let summary = summarize(&rows);
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.avg_risk, 40.0);
        assert_eq!(summary.high_risk_count, 1);
    }

    #[test]
    fn test_parse_history_csv_rejects_bad_score() {
        let bad = "Company Name,Risk Score\nAcme,high\n";
        assert!(parse_history_csv(bad.as_bytes()).is_err());
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), ExportSummary::default());
    }

    #[test]
    fn test_save_csv_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_csv(dir.path(), SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(path, dir.path().join(CSV_FILE_NAME));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SAMPLE_CSV);

        let explicit = dir.path().join("mine.csv");
        assert_eq!(save_csv(&explicit, b"x").unwrap(), explicit);
    }
}
