//! Dashboard state container and its reducer
//!
//! All mutation goes through [`DashboardState::reduce`] with a typed
//! [`Action`]; the controller never pokes fields directly.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Error;
use crate::models::{Analytics, HistoryRecord, PredictionResult, Profile, Session, Theme};

/// Which flow produced an error notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Fetch,
    Analysis,
    Export,
}

/// Dismissible error shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    /// One-line summary, e.g. "Prediction failed"
    pub message: String,
    /// Server detail or transport message
    pub details: String,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
}

impl ErrorNotice {
    pub fn new(kind: ErrorKind, message: &str, error: &Error) -> Self {
        Self {
            kind,
            message: message.to_string(),
            details: error.details(),
            status: error.status(),
        }
    }
}

/// Typed state transitions
#[derive(Debug, Clone)]
pub enum Action {
    /// Login or signup succeeded; starts a new epoch
    SessionStarted(Session),
    HistoryLoaded(Vec<HistoryRecord>),
    AnalyticsLoaded(Analytics),
    /// Also applies the stored theme
    ProfileLoaded(Profile),
    /// A new analysis is being submitted; clears the old result and error
    PredictionStarted,
    PredictionReceived(PredictionResult),
    Failed(ErrorNotice),
    ErrorDismissed,
    /// Clears prediction and error only
    Reset,
    /// Clears the session and everything derived from it; starts a new epoch
    LoggedOut,
    ThemeToggled,
    RequestStarted,
    RequestFinished,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardState {
    pub session: Option<Session>,
    /// Bumped on every session change; responses from older epochs are stale
    pub epoch: u64,
    pub history: Vec<HistoryRecord>,
    pub analytics: Analytics,
    pub profile: Option<Profile>,
    pub theme: Theme,
    pub prediction: Option<PredictionResult>,
    pub error: Option<ErrorNotice>,
    /// Requests in flight
    pub pending: usize,
    pub last_updated: DateTime<Utc>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            session: None,
            epoch: 0,
            history: Vec::new(),
            analytics: Analytics::default(),
            profile: None,
            theme: Theme::default(),
            prediction: None,
            error: None,
            pending: 0,
            last_updated: Utc::now(),
        }
    }
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    fn clear_session_data(&mut self) {
        self.history.clear();
        self.analytics = Analytics::default();
        self.profile = None;
        self.prediction = None;
        self.error = None;
    }

    pub fn reduce(&mut self, action: Action) {
        match action {
            Action::SessionStarted(session) => {
                self.epoch += 1;
                self.clear_session_data();
                self.session = Some(session);
            }
            Action::HistoryLoaded(records) => {
                self.history = records;
                self.last_updated = Utc::now();
                // A successful reload supersedes an earlier fetch failure
                if matches!(&self.error, Some(e) if e.kind == ErrorKind::Fetch) {
                    self.error = None;
                }
            }
            Action::AnalyticsLoaded(analytics) => {
                self.analytics = analytics;
            }
            Action::ProfileLoaded(profile) => {
                self.theme = profile.theme;
                self.profile = Some(profile);
            }
            Action::PredictionStarted => {
                self.prediction = None;
                self.error = None;
            }
            Action::PredictionReceived(result) => {
                self.prediction = Some(result);
            }
            Action::Failed(notice) => {
                self.error = Some(notice);
            }
            Action::ErrorDismissed => {
                self.error = None;
            }
            Action::Reset => {
                self.prediction = None;
                self.error = None;
                self.last_updated = Utc::now();
            }
            Action::LoggedOut => {
                self.epoch += 1;
                self.session = None;
                self.clear_session_data();
            }
            Action::ThemeToggled => {
                self.theme = self.theme.toggled();
            }
            Action::RequestStarted => {
                self.pending += 1;
            }
            Action::RequestFinished => {
                self.pending = self.pending.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn session() -> Session {
        Session {
            email: "a@b.com".into(),
            first_name: "Ada".into(),
        }
    }

    fn prediction() -> PredictionResult {
        PredictionResult {
            company_name: "Acme".into(),
            risk_score: 40.0,
            confidence: 95.0,
            summary: String::new(),
            risk_factors: BTreeMap::new(),
            input_data: BTreeMap::new(),
        }
    }

    fn notice(kind: ErrorKind) -> ErrorNotice {
        ErrorNotice {
            kind,
            message: "x".into(),
            details: "y".into(),
            status: None,
        }
    }

    #[test]
    fn test_session_started_bumps_epoch() {
        let mut state = DashboardState::default();
        state.reduce(Action::SessionStarted(session()));
        assert_eq!(state.epoch, 1);
        assert_eq!(state.session, Some(session()));
    }

    #[test]
    fn test_reset_keeps_session_and_history() {
        let mut state = DashboardState::default();
        state.reduce(Action::SessionStarted(session()));
        state.reduce(Action::HistoryLoaded(vec![HistoryRecord {
            company_name: "Acme".into(),
            risk_score: 40.0,
            timestamp: Utc::now(),
            confidence: None,
            risk_factors: BTreeMap::new(),
        }]));
        state.reduce(Action::PredictionReceived(prediction()));
        state.reduce(Action::Failed(notice(ErrorKind::Analysis)));

        state.reduce(Action::Reset);
        assert!(state.prediction.is_none());
        assert!(state.error.is_none());
        assert!(state.session.is_some());
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_logout_clears_derived_state() {
        let mut state = DashboardState::default();
        state.reduce(Action::SessionStarted(session()));
        state.reduce(Action::AnalyticsLoaded(Analytics {
            total_predictions: 3,
            ..Analytics::default()
        }));
        state.reduce(Action::ProfileLoaded(Profile {
            email: "a@b.com".into(),
            first_name: "Ada".into(),
            theme: Theme::Dark,
        }));
        state.reduce(Action::LoggedOut);

        assert!(state.session.is_none());
        assert!(state.profile.is_none());
        assert_eq!(state.analytics, Analytics::default());
        assert_eq!(state.epoch, 2);
        // Theme is a display preference, not session data
        assert_eq!(state.theme, Theme::Dark);
    }

    #[test]
    fn test_history_reload_clears_only_fetch_errors() {
        let mut state = DashboardState::default();
        state.reduce(Action::Failed(notice(ErrorKind::Fetch)));
        state.reduce(Action::HistoryLoaded(vec![]));
        assert!(state.error.is_none());

        state.reduce(Action::Failed(notice(ErrorKind::Analysis)));
        state.reduce(Action::HistoryLoaded(vec![]));
        assert!(state.error.is_some());
    }

    #[test]
    fn test_pending_counter_never_underflows() {
        let mut state = DashboardState::default();
        state.reduce(Action::RequestStarted);
        state.reduce(Action::RequestStarted);
        assert!(state.is_loading());
        state.reduce(Action::RequestFinished);
        state.reduce(Action::RequestFinished);
        state.reduce(Action::RequestFinished);
        assert!(!state.is_loading());
        assert_eq!(state.pending, 0);
    }

    #[test]
    fn test_prediction_started_clears_previous_result() {
        let mut state = DashboardState::default();
        state.reduce(Action::PredictionReceived(prediction()));
        state.reduce(Action::Failed(notice(ErrorKind::Analysis)));
        state.reduce(Action::PredictionStarted);
        assert!(state.prediction.is_none());
        assert!(state.error.is_none());
    }
}
