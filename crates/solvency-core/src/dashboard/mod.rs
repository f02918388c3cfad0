//! Session and data controller
//!
//! The [`Dashboard`] owns an [`ApiClient`] and a [`DashboardState`], and runs
//! every user-facing flow: authentication, analysis, refreshes and exports.
//!
//! # Concurrency
//!
//! Operations take `&self`; the state lives behind a mutex that is only held
//! for the duration of a reducer call, never across an await. Background
//! fetches capture the session epoch when they start and their results are
//! dropped if the epoch has moved on (login, signup or logout in between).
//!
//! ```text
//! login ──► SessionStarted ──► refresh_all ─┬─ history   ─► HistoryLoaded | Failed
//!                                           ├─ analytics ─► AnalyticsLoaded | warn
//!                                           └─ profile   ─► ProfileLoaded | warn
//! ```

mod state;
mod views;

pub use state::{Action, DashboardState, ErrorKind, ErrorNotice};
pub use views::{monthly_trend_chart, risk_factor_chart, risk_trend, widgets, ChartSeries, Widgets};

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, PredictionBackend};
use crate::error::{Error, Result};
use crate::form::InputForm;
use crate::models::{
    Analytics, Credentials, FinancialInput, HistoryRecord, PredictionResult, Profile, Session,
    Theme,
};
use crate::validate;

/// Which parts of a refresh landed in state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub history: bool,
    pub analytics: bool,
    pub profile: bool,
}

#[derive(Debug, Clone, Copy)]
enum AuthFlow {
    Login,
    Signup,
}

impl AuthFlow {
    fn failure_message(self) -> &'static str {
        match self {
            AuthFlow::Login => "Login Failed",
            AuthFlow::Signup => "Signup Failed",
        }
    }
}

/// Decrements the pending counter when dropped
struct PendingRequest<'a> {
    dashboard: &'a Dashboard,
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        self.dashboard.dispatch(Action::RequestFinished);
    }
}

pub struct Dashboard {
    client: ApiClient,
    state: Mutex<DashboardState>,
}

impl Dashboard {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Mutex::new(DashboardState::default()),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // ========== State plumbing ==========

    fn with_state<T>(&self, f: impl FnOnce(&mut DashboardState) -> T) -> T {
        // A panic inside a reducer leaves the state usable
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    fn dispatch(&self, action: Action) {
        self.with_state(|state| state.reduce(action));
    }

    /// Apply the action only if no session change happened since `epoch`
    fn dispatch_if_current(&self, epoch: u64, action: Action) -> bool {
        self.with_state(|state| {
            if state.epoch != epoch {
                debug!(
                    started = epoch,
                    current = state.epoch,
                    "Discarding stale response"
                );
                return false;
            }
            state.reduce(action);
            true
        })
    }

    fn begin_request(&self) -> PendingRequest<'_> {
        self.dispatch(Action::RequestStarted);
        PendingRequest { dashboard: self }
    }

    fn epoch(&self) -> u64 {
        self.with_state(|state| state.epoch)
    }

    fn current_session(&self) -> Option<(u64, String)> {
        self.with_state(|state| {
            state
                .session
                .as_ref()
                .map(|s| (state.epoch, s.email.clone()))
        })
    }

    // ========== Snapshots ==========

    /// Copy of the whole state
    pub fn snapshot(&self) -> DashboardState {
        self.with_state(|state| state.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.with_state(|state| state.session.clone())
    }

    pub fn history(&self) -> Vec<HistoryRecord> {
        self.with_state(|state| state.history.clone())
    }

    pub fn analytics(&self) -> Analytics {
        self.with_state(|state| state.analytics.clone())
    }

    pub fn profile(&self) -> Option<Profile> {
        self.with_state(|state| state.profile.clone())
    }

    pub fn prediction(&self) -> Option<PredictionResult> {
        self.with_state(|state| state.prediction.clone())
    }

    pub fn error(&self) -> Option<ErrorNotice> {
        self.with_state(|state| state.error.clone())
    }

    pub fn theme(&self) -> Theme {
        self.with_state(|state| state.theme)
    }

    pub fn is_loading(&self) -> bool {
        self.with_state(|state| state.is_loading())
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.with_state(|state| state.last_updated)
    }

    // ========== Views ==========

    pub fn risk_trend(&self) -> ChartSeries {
        self.with_state(|state| views::risk_trend(&state.history))
    }

    pub fn risk_factor_chart(&self) -> Option<ChartSeries> {
        self.with_state(|state| views::risk_factor_chart(state.prediction.as_ref()))
    }

    pub fn monthly_trend_chart(&self) -> ChartSeries {
        self.with_state(|state| views::monthly_trend_chart(&state.analytics))
    }

    pub fn widgets(&self) -> Widgets {
        self.with_state(|state| views::widgets(&state.analytics))
    }

    // ========== Session ==========

    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticate(AuthFlow::Login, credentials).await
    }

    pub async fn signup(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticate(AuthFlow::Signup, credentials).await
    }

    async fn authenticate(&self, flow: AuthFlow, credentials: &Credentials) -> Result<Session> {
        let result = {
            let _pending = self.begin_request();
            match flow {
                AuthFlow::Login => self.client.login(credentials).await,
                AuthFlow::Signup => self.client.signup(credentials).await,
            }
        };

        match result {
            Ok(session) => {
                info!(email = %session.email, ?flow, "Session started");
                self.dispatch(Action::SessionStarted(session.clone()));
                self.refresh_all().await;
                Ok(session)
            }
            Err(e) => {
                warn!(email = %credentials.email, ?flow, error = %e, "Authentication failed");
                self.dispatch(Action::Failed(ErrorNotice::new(
                    ErrorKind::Auth,
                    flow.failure_message(),
                    &e,
                )));
                Err(Error::Auth(e.details()))
            }
        }
    }

    /// Clear the session and everything loaded for it
    pub fn logout(&self) {
        if let Some(session) = self.session() {
            info!(email = %session.email, "Logged out");
        }
        self.dispatch(Action::LoggedOut);
    }

    // ========== Refresh ==========

    /// Load history, analytics and profile concurrently
    ///
    /// Does nothing without a session. Only a history failure is surfaced
    /// to the user.
    pub async fn refresh_all(&self) -> RefreshOutcome {
        let Some((epoch, email)) = self.current_session() else {
            debug!("No session, skipping refresh");
            return RefreshOutcome::default();
        };

        let _pending = self.begin_request();
        let (history, analytics, profile) = tokio::join!(
            self.load_history(epoch, &email),
            self.load_analytics(epoch, &email),
            self.load_profile(epoch, &email),
        );
        RefreshOutcome {
            history,
            analytics,
            profile,
        }
    }

    /// Reload what an analysis changes
    pub async fn refresh_history_and_analytics(&self) -> RefreshOutcome {
        let Some((epoch, email)) = self.current_session() else {
            debug!("No session, skipping refresh");
            return RefreshOutcome::default();
        };

        let _pending = self.begin_request();
        let (history, analytics) = tokio::join!(
            self.load_history(epoch, &email),
            self.load_analytics(epoch, &email),
        );
        RefreshOutcome {
            history,
            analytics,
            profile: false,
        }
    }

    async fn load_history(&self, epoch: u64, email: &str) -> bool {
        match self.client.history(email).await {
            Ok(records) => {
                debug!(count = records.len(), "History loaded");
                self.dispatch_if_current(epoch, Action::HistoryLoaded(records))
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch history");
                self.dispatch_if_current(
                    epoch,
                    Action::Failed(ErrorNotice::new(
                        ErrorKind::Fetch,
                        "Failed to fetch history",
                        &e,
                    )),
                );
                false
            }
        }
    }

    async fn load_analytics(&self, epoch: u64, email: &str) -> bool {
        match self.client.analytics(email).await {
            Ok(analytics) => self.dispatch_if_current(epoch, Action::AnalyticsLoaded(analytics)),
            Err(e) => {
                warn!(error = %e, "Failed to fetch analytics");
                false
            }
        }
    }

    async fn load_profile(&self, epoch: u64, email: &str) -> bool {
        match self.client.profile(email).await {
            Ok(profile) => self.dispatch_if_current(epoch, Action::ProfileLoaded(profile)),
            Err(e) => {
                warn!(error = %e, "Failed to fetch profile");
                false
            }
        }
    }

    // ========== Analysis ==========

    /// Validate and submit one company's figures
    ///
    /// Invalid input is rejected before any network call. On success the
    /// result is stored and, with a session, history and analytics are
    /// reloaded.
    pub async fn analyze(&self, input: &FinancialInput) -> Result<PredictionResult> {
        let errors = validate::check(input);
        if !errors.is_empty() {
            debug!(%errors, "Rejected invalid input");
            return Err(Error::Validation(errors));
        }

        let epoch = self.epoch();
        self.dispatch(Action::PredictionStarted);
        let result = {
            let _pending = self.begin_request();
            self.client.analyze(input).await
        };

        match result {
            Ok(prediction) => {
                info!(
                    company = %prediction.company_name,
                    risk_score = prediction.risk_score,
                    "Prediction received"
                );
                self.dispatch_if_current(epoch, Action::PredictionReceived(prediction.clone()));
                self.refresh_history_and_analytics().await;
                Ok(prediction)
            }
            Err(e) => {
                warn!(error = %e, "Prediction failed");
                let notice = ErrorNotice::new(ErrorKind::Analysis, "Prediction failed", &e);
                let err = Error::Analysis {
                    status: notice.status,
                    details: notice.details.clone(),
                };
                self.dispatch_if_current(epoch, Action::Failed(notice));
                Err(err)
            }
        }
    }

    /// Drive a bound form through submission
    ///
    /// The form is cleared on success and keeps its values on failure.
    pub async fn submit(&self, form: &mut InputForm) -> Result<PredictionResult> {
        let input = form.begin_submit().map_err(Error::Validation)?;
        match self.analyze(&input).await {
            Ok(prediction) => {
                form.submit_succeeded();
                Ok(prediction)
            }
            Err(e) => {
                form.submit_failed();
                Err(e)
            }
        }
    }

    /// Clear the current prediction and error
    pub fn reset(&self) {
        self.dispatch(Action::Reset);
    }

    pub fn dismiss_error(&self) {
        self.dispatch(Action::ErrorDismissed);
    }

    pub fn toggle_theme(&self) -> Theme {
        self.with_state(|state| {
            state.reduce(Action::ThemeToggled);
            state.theme
        })
    }

    // ========== Export ==========

    /// Download the session's full history as CSV
    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let Some((epoch, email)) = self.current_session() else {
            return Err(Error::NoSession);
        };

        let result = {
            let _pending = self.begin_request();
            self.client.export_csv(&email).await
        };

        match result {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "History exported");
                Ok(bytes)
            }
            Err(e) => {
                warn!(error = %e, "CSV export failed");
                self.dispatch_if_current(
                    epoch,
                    Action::Failed(ErrorNotice::new(
                        ErrorKind::Export,
                        "CSV Export Failed",
                        &e,
                    )),
                );
                Err(Error::Fetch {
                    what: "export",
                    details: e.details(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests;
