//! Advisory insights shown while the form is being filled in
//!
//! Insights are a pure function of the current field values. Only three
//! fields have rules; the others never produce advice.

use std::collections::BTreeMap;

use crate::models::{Field, FinancialInput};

/// A threshold check on one numeric field
struct InsightRule {
    field: Field,
    triggers: fn(f64) -> bool,
    message: &'static str,
}

const RULES: &[InsightRule] = &[
    InsightRule {
        field: Field::DebtEquity,
        triggers: |v| v > 2.0,
        message: "High debt-to-equity may indicate risk.",
    },
    InsightRule {
        field: Field::CurrentRatio,
        triggers: |v| v < 1.0,
        message: "Low liquidity could be a concern.",
    },
    InsightRule {
        field: Field::NetIncome,
        triggers: |v| v < 0.0,
        message: "Negative profitability detected.",
    },
];

/// Advisory messages keyed by field
///
/// Fields that are empty or not numeric produce nothing.
pub fn advise_insights(input: &FinancialInput) -> BTreeMap<Field, String> {
    RULES
        .iter()
        .filter(|rule| input.number(rule.field).is_some_and(rule.triggers))
        .map(|rule| (rule.field, rule.message.to_string()))
        .collect()
}
