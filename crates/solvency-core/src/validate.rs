//! Field-by-field validation of financial input
//!
//! Rules:
//! - every field must be non-empty
//! - every field except `company_name` and `email` must parse as a float
//!
//! There are no range checks; a negative net income is valid input (it only
//! triggers an insight, see [`crate::insights`]).

use std::collections::BTreeMap;
use std::fmt;

use crate::models::{Field, FinancialInput};

/// Why a single field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    NotANumber,
}

impl FieldError {
    pub fn message(&self) -> &'static str {
        match self {
            FieldError::Required => "This field is required",
            FieldError::NotANumber => "Must be a number",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Per-field errors for a rejected submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub BTreeMap<Field, FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<FieldError> {
        self.0.get(&field).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, err)| format!("{}: {}", field, err))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Parse a user-typed number
///
/// Surrounding whitespace is ignored. `NaN` is not a number for our purposes.
/// The only spelled-out value accepted is a signed or unsigned `Infinity`;
/// overflowing literals such as `1e999` also parse as infinite.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) && unsigned != "Infinity" {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Check one field's value
pub fn field_error(field: Field, value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        Some(FieldError::Required)
    } else if field.is_numeric() && parse_number(value).is_none() {
        Some(FieldError::NotANumber)
    } else {
        None
    }
}

/// Collect every field error in the input
pub fn check(input: &FinancialInput) -> ValidationErrors {
    ValidationErrors(
        input
            .iter()
            .filter_map(|(field, value)| field_error(field, value).map(|e| (field, e)))
            .collect(),
    )
}

/// Whether the input may be submitted
pub fn validate(input: &FinancialInput) -> bool {
    input
        .iter()
        .all(|(field, value)| field_error(field, value).is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> FinancialInput {
        FinancialInput::new()
            .with(Field::CompanyName, "Acme")
            .with(Field::Email, "a@b.com")
            .with(Field::Assets, "100")
            .with(Field::Liabilities, "50")
            .with(Field::NetIncome, "10")
            .with(Field::CashFlow, "5")
            .with(Field::DebtEquity, "1")
            .with(Field::CurrentRatio, "2")
            .with(Field::Revenue, "200")
    }

    #[test]
    fn test_validate_accepts_complete_numeric_input() {
        assert!(validate(&valid_input()));
        assert!(check(&valid_input()).is_empty());
    }

    #[test]
    fn test_validate_rejects_any_empty_field() {
        for field in Field::ALL {
            let input = valid_input().with(field, "");
            assert!(!validate(&input), "empty {} should be rejected", field);
            assert_eq!(check(&input).get(field), Some(FieldError::Required));
        }
    }

    #[test]
    fn test_validate_rejects_whitespace_only() {
        let input = valid_input().with(Field::CompanyName, "   ");
        assert!(!validate(&input));
    }

    #[test]
    fn test_validate_rejects_non_numeric_numeric_fields() {
        for field in Field::ALL.into_iter().filter(|f| f.is_numeric()) {
            for bad in ["abc", "12abc", "1,000", "NaN", "$5"] {
                let input = valid_input().with(field, bad);
                assert!(!validate(&input), "{}={:?} should be rejected", field, bad);
                assert_eq!(check(&input).get(field), Some(FieldError::NotANumber));
            }
        }
    }

    #[test]
    fn test_only_exact_infinity_spelling_parses() {
        assert_eq!(parse_number("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_number(" -Infinity "), Some(f64::NEG_INFINITY));
        assert_eq!(parse_number("1e999"), Some(f64::INFINITY));
        for bad in ["inf", "-INF", "infinity", "+inf", "INFINITY"] {
            assert_eq!(parse_number(bad), None, "{:?} should be rejected", bad);
            let input = valid_input().with(Field::Revenue, bad);
            assert_eq!(check(&input).get(Field::Revenue), Some(FieldError::NotANumber));
        }
    }

    #[test]
    fn test_text_fields_accept_anything_non_empty() {
        let input = valid_input()
            .with(Field::CompanyName, "123")
            .with(Field::Email, "not an email");
        assert!(validate(&input));
    }

    #[test]
    fn test_numbers_allow_sign_exponent_and_padding() {
        let input = valid_input()
            .with(Field::NetIncome, "-2500.75")
            .with(Field::Revenue, "1e6")
            .with(Field::Assets, " 42 ");
        assert!(validate(&input));
    }

    #[test]
    fn test_check_reports_every_failing_field() {
        let input = valid_input()
            .with(Field::Assets, "")
            .with(Field::Revenue, "lots");
        let errors = check(&input);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "assets: This field is required, revenue: Must be a number"
        );
    }
}
