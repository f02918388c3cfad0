//! Bound state for the financial input form
//!
//! Tracks the raw values, the per-field errors shown under each input, the
//! live insights, and where the form is in the submission cycle:
//!
//! ```text
//! Editing -> Validating -> Rejected -> Editing (per-field errors)
//!                       -> Submitting -> Succeeded -> Editing (cleared)
//!                                     -> Failed    -> Editing (error shown)
//! ```

use std::collections::BTreeMap;

use crate::insights::advise_insights;
use crate::models::{Field, FinancialInput};
use crate::validate::{self, FieldError, ValidationErrors};

/// Where the form is in the submission cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Editing,
    Validating,
    Submitting,
}

#[derive(Debug, Clone, Default)]
pub struct InputForm {
    input: FinancialInput,
    errors: BTreeMap<Field, FieldError>,
    insights: BTreeMap<Field, String>,
    phase: SubmissionPhase,
}

impl InputForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from already-filled values (e.g. CLI flags)
    pub fn from_input(input: FinancialInput) -> Self {
        let insights = advise_insights(&input);
        Self {
            input,
            insights,
            ..Self::default()
        }
    }

    /// Update one field, re-checking it and recomputing insights
    ///
    /// Ignored while a submission is in flight.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        if self.is_locked() {
            return;
        }
        self.input.set(field, value);
        match validate::field_error(field, self.input.get(field)) {
            Some(err) => {
                self.errors.insert(field, err);
            }
            None => {
                self.errors.remove(&field);
            }
        }
        self.insights = advise_insights(&self.input);
    }

    pub fn input(&self) -> &FinancialInput {
        &self.input
    }

    pub fn errors(&self) -> &BTreeMap<Field, FieldError> {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    pub fn insights(&self) -> &BTreeMap<Field, String> {
        &self.insights
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    /// Inputs are disabled while submitting
    pub fn is_locked(&self) -> bool {
        self.phase == SubmissionPhase::Submitting
    }

    /// Run full validation before submission
    ///
    /// On success the form moves to `Submitting` and returns the input to
    /// send. On rejection it returns to `Editing` with every field error
    /// populated.
    pub fn begin_submit(&mut self) -> Result<FinancialInput, ValidationErrors> {
        self.phase = SubmissionPhase::Validating;
        let errors = validate::check(&self.input);
        if errors.is_empty() {
            self.errors.clear();
            self.phase = SubmissionPhase::Submitting;
            Ok(self.input.clone())
        } else {
            self.errors = errors.0.clone();
            self.phase = SubmissionPhase::Editing;
            Err(errors)
        }
    }

    /// The prediction came back: clear the form for the next company
    pub fn submit_succeeded(&mut self) {
        self.reset();
    }

    /// The prediction failed: keep the values so the user can retry
    pub fn submit_failed(&mut self) {
        self.phase = SubmissionPhase::Editing;
    }

    /// Clear values, errors and insights
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
