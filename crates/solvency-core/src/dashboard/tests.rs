use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;

use super::*;
use crate::api::{MockBackend, MockEndpoint, StoredPrediction};
use crate::models::Field;

const EMAIL: &str = "ada@acme.test";
const PASSWORD: &str = "hunter2";

fn backend() -> MockBackend {
    MockBackend::new().with_user_theme(EMAIL, PASSWORD, "Ada", Theme::Dark)
}

fn credentials() -> Credentials {
    Credentials::new(EMAIL, PASSWORD, "")
}

fn input(company: &str, debt_equity: &str) -> FinancialInput {
    FinancialInput::new()
        .with(Field::CompanyName, company)
        .with(Field::Email, EMAIL)
        .with(Field::Assets, "1000")
        .with(Field::Liabilities, "400")
        .with(Field::NetIncome, "-10")
        .with(Field::CashFlow, "25")
        .with(Field::DebtEquity, debt_equity)
        .with(Field::CurrentRatio, "1.5")
        .with(Field::Revenue, "2000")
}

fn seed_prediction(backend: &MockBackend, company: &str, score: f64) {
    backend
        .with_store(|store| {
            store.insert_prediction(StoredPrediction {
                company_name: company.to_string(),
                user_email: EMAIL.to_string(),
                input_data: BTreeMap::new(),
                risk_score: score,
                confidence: 95.0,
                risk_factors: BTreeMap::new(),
                timestamp: Utc::now(),
            })
        })
        .unwrap();
}

async fn logged_in(backend: &MockBackend) -> Dashboard {
    let dashboard = Dashboard::new(backend.clone().into());
    dashboard.login(&credentials()).await.unwrap();
    dashboard
}

#[tokio::test]
async fn test_login_loads_everything() {
    let backend = backend();
    seed_prediction(&backend, "Seeded", 30.0);

    let dashboard = logged_in(&backend).await;

    assert_eq!(dashboard.session().unwrap().first_name, "Ada");
    assert_eq!(dashboard.history().len(), 1);
    assert_eq!(dashboard.analytics().total_predictions, 1);
    assert_eq!(dashboard.profile().unwrap().email, EMAIL);
    // Stored theme applied from the profile
    assert_eq!(dashboard.theme(), Theme::Dark);
    assert!(dashboard.error().is_none());
    assert!(!dashboard.is_loading());
}

#[tokio::test]
async fn test_login_failure_sets_notice() {
    let dashboard = Dashboard::new(backend().into());

    let err = dashboard
        .login(&Credentials::new(EMAIL, "wrong", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(ref d) if d == "Invalid credentials"));

    let notice = dashboard.error().unwrap();
    assert_eq!(notice.kind, ErrorKind::Auth);
    assert_eq!(notice.message, "Login Failed");
    assert_eq!(notice.status, Some(401));
    assert!(dashboard.session().is_none());
}

#[tokio::test]
async fn test_signup_then_duplicate() {
    let backend = MockBackend::new();
    let dashboard = Dashboard::new(backend.clone().into());
    let creds = Credentials::new("new@acme.test", "pw", "Grace");

    let session = dashboard.signup(&creds).await.unwrap();
    assert_eq!(session.first_name, "Grace");
    assert_eq!(backend.calls(MockEndpoint::Profile), 1);

    let err = dashboard.signup(&creds).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    assert_eq!(dashboard.error().unwrap().message, "Signup Failed");
}

#[tokio::test]
async fn test_analyze_refreshes_history_and_analytics() {
    let backend = backend();
    let dashboard = logged_in(&backend).await;
    assert!(dashboard.history().is_empty());

    let prediction = dashboard.analyze(&input("Acme", "3")).await.unwrap();
    assert_eq!(prediction.risk_score, 60.0);

    assert_eq!(dashboard.prediction(), Some(prediction));
    assert_eq!(dashboard.history().len(), 1);
    assert_eq!(dashboard.history()[0].company_name, "Acme");
    assert_eq!(dashboard.analytics().total_predictions, 1);
    assert_eq!(dashboard.widgets().avg_risk, 60.0);
    assert_eq!(dashboard.risk_trend().labels, vec!["Acme"]);
    assert_eq!(dashboard.risk_factor_chart().unwrap().len(), 2);
    // Profile is not part of the post-analysis refresh
    assert_eq!(backend.calls(MockEndpoint::Profile), 1);
}

#[tokio::test]
async fn test_analyze_without_session_skips_refresh() {
    let backend = backend();
    let dashboard = Dashboard::new(backend.clone().into());

    dashboard.analyze(&input("Acme", "1")).await.unwrap();
    assert!(dashboard.prediction().is_some());
    assert_eq!(backend.calls(MockEndpoint::History), 0);
}

#[tokio::test]
async fn test_invalid_input_makes_no_network_call() {
    let backend = backend();
    let dashboard = Dashboard::new(backend.clone().into());

    let err = dashboard
        .analyze(&input("Acme", "lots"))
        .await
        .unwrap_err();
    match err {
        Error::Validation(errors) => assert!(errors.get(Field::DebtEquity).is_some()),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(backend.calls(MockEndpoint::Analyze), 0);
    assert!(dashboard.error().is_none());
}

#[tokio::test]
async fn test_analysis_failure_carries_status_and_details() {
    let backend = backend();
    let dashboard = logged_in(&backend).await;
    backend.fail(MockEndpoint::Analyze, 500, "model not loaded");

    let err = dashboard.analyze(&input("Acme", "1")).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Analysis { status: Some(500), ref details } if details == "model not loaded"
    ));

    let notice = dashboard.error().unwrap();
    assert_eq!(notice.kind, ErrorKind::Analysis);
    assert_eq!(notice.message, "Prediction failed");
    assert_eq!(notice.details, "model not loaded");
    assert_eq!(notice.status, Some(500));
    assert!(dashboard.prediction().is_none());
}

#[tokio::test]
async fn test_new_analysis_clears_previous_result() {
    let backend = backend();
    let dashboard = logged_in(&backend).await;
    dashboard.analyze(&input("Acme", "1")).await.unwrap();

    backend.fail(MockEndpoint::Analyze, 503, "busy");
    dashboard.analyze(&input("Beta", "1")).await.unwrap_err();
    assert!(dashboard.prediction().is_none());
}

#[tokio::test]
async fn test_reset_keeps_session_and_history() {
    let backend = backend();
    let dashboard = logged_in(&backend).await;
    dashboard.analyze(&input("Acme", "3")).await.unwrap();
    let before = dashboard.last_updated();

    dashboard.reset();

    assert!(dashboard.prediction().is_none());
    assert!(dashboard.error().is_none());
    assert!(dashboard.session().is_some());
    assert_eq!(dashboard.history().len(), 1);
    assert_eq!(dashboard.analytics().total_predictions, 1);
    assert!(dashboard.last_updated() >= before);
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let backend = backend();
    let dashboard = logged_in(&backend).await;
    dashboard.analyze(&input("Acme", "3")).await.unwrap();

    dashboard.logout();

    let state = dashboard.snapshot();
    assert!(state.session.is_none());
    assert!(state.history.is_empty());
    assert_eq!(state.analytics, Analytics::default());
    assert!(state.profile.is_none());
    assert!(state.prediction.is_none());
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_analytics_and_profile_failures_are_swallowed() {
    let backend = backend();
    seed_prediction(&backend, "Seeded", 10.0);
    backend.fail(MockEndpoint::Analytics, 500, "aggregation failed");
    backend.fail(MockEndpoint::Profile, 404, "User not found");

    let dashboard = logged_in(&backend).await;

    assert!(dashboard.error().is_none());
    assert_eq!(dashboard.history().len(), 1);
    assert!(dashboard.profile().is_none());
}

#[tokio::test]
async fn test_history_failure_sets_notice_without_aborting_others() {
    let backend = backend();
    seed_prediction(&backend, "Seeded", 10.0);
    let dashboard = logged_in(&backend).await;
    backend.fail(MockEndpoint::History, 500, "database offline");

    let outcome = dashboard.refresh_all().await;

    assert_eq!(
        outcome,
        RefreshOutcome {
            history: false,
            analytics: true,
            profile: true,
        }
    );
    let notice = dashboard.error().unwrap();
    assert_eq!(notice.kind, ErrorKind::Fetch);
    assert_eq!(notice.message, "Failed to fetch history");
    assert_eq!(notice.details, "database offline");

    // Next successful reload clears the fetch notice
    backend.clear_failure(MockEndpoint::History);
    dashboard.refresh_all().await;
    assert!(dashboard.error().is_none());
}

#[tokio::test]
async fn test_refresh_after_logout_is_discarded() {
    let backend = backend();
    let dashboard = logged_in(&backend).await;
    seed_prediction(&backend, "Late", 80.0);
    backend.set_latency(Duration::from_millis(50));

    let (outcome, ()) = tokio::join!(dashboard.refresh_all(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        dashboard.logout();
    });

    assert_eq!(outcome, RefreshOutcome::default());
    let state = dashboard.snapshot();
    assert!(state.session.is_none());
    assert!(state.history.is_empty());
    assert!(state.profile.is_none());
    assert_eq!(state.analytics.total_predictions, 0);
    assert!(!state.is_loading());
}

#[tokio::test]
async fn test_analysis_after_logout_is_discarded() {
    let backend = backend();
    let dashboard = logged_in(&backend).await;
    backend.set_latency(Duration::from_millis(50));

    let late = input("Late", "3");
    let (result, ()) = tokio::join!(dashboard.analyze(&late), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        dashboard.logout();
    });

    assert_eq!(result.unwrap().company_name, "Late");
    let state = dashboard.snapshot();
    assert!(state.session.is_none());
    assert!(state.prediction.is_none());
    assert!(state.history.is_empty());
    assert!(!state.is_loading());

    // A failure from the old session leaves no notice behind
    let dashboard = logged_in(&backend).await;
    backend.fail(MockEndpoint::Analyze, 500, "boom");
    let late = input("Late", "3");
    let (result, ()) = tokio::join!(dashboard.analyze(&late), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        dashboard.logout();
    });

    assert!(matches!(result, Err(Error::Analysis { .. })));
    assert!(dashboard.error().is_none());
    assert!(!dashboard.is_loading());
}

#[tokio::test]
async fn test_refresh_without_session_is_noop() {
    let backend = backend();
    let dashboard = Dashboard::new(backend.clone().into());

    assert_eq!(dashboard.refresh_all().await, RefreshOutcome::default());
    assert_eq!(backend.calls(MockEndpoint::History), 0);
}

#[tokio::test]
async fn test_submit_drives_form() {
    let backend = backend();
    let dashboard = logged_in(&backend).await;

    let mut form = InputForm::from_input(input("Acme", "3"));
    dashboard.submit(&mut form).await.unwrap();
    assert_eq!(form.input(), &FinancialInput::default());

    backend.fail(MockEndpoint::Analyze, 500, "boom");
    let mut form = InputForm::from_input(input("Beta", "1"));
    dashboard.submit(&mut form).await.unwrap_err();
    assert_eq!(form.input().get(Field::CompanyName), "Beta");
    assert!(!form.is_locked());

    let mut form = InputForm::new();
    let err = dashboard.submit(&mut form).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(form.errors().len(), Field::ALL.len());
}

#[tokio::test]
async fn test_export_requires_session() {
    let dashboard = Dashboard::new(backend().into());
    assert!(matches!(
        dashboard.export_csv().await,
        Err(Error::NoSession)
    ));
}

#[tokio::test]
async fn test_export_csv() {
    let backend = backend();
    let dashboard = logged_in(&backend).await;
    dashboard.analyze(&input("Acme", "3")).await.unwrap();

    let bytes = dashboard.export_csv().await.unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("Company Name,Risk Score"));
    assert!(text.contains("Acme"));

    backend.fail(MockEndpoint::Export, 500, "disk full");
    let err = dashboard.export_csv().await.unwrap_err();
    assert!(matches!(err, Error::Fetch { what: "export", .. }));
    assert_eq!(dashboard.error().unwrap().message, "CSV Export Failed");
}

#[tokio::test]
async fn test_dismiss_error_and_toggle_theme() {
    let dashboard = Dashboard::new(backend().into());
    dashboard
        .login(&Credentials::new(EMAIL, "wrong", ""))
        .await
        .unwrap_err();
    assert!(dashboard.error().is_some());

    dashboard.dismiss_error();
    assert!(dashboard.error().is_none());

    assert_eq!(dashboard.toggle_theme(), Theme::Dark);
    assert_eq!(dashboard.toggle_theme(), Theme::Light);
}
