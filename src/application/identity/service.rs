//! Authentication service: application-layer orchestration
//!
//! Validates the login form, delegates to the credential provider, times
//! every attempt and records it through the login metrics recorder.
//! HTTP handlers are thin wrappers around this service.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use regex::Regex;
use tracing::{info, warn};

use crate::application::metrics::{LoginMetricsRecorder, LoginOutcome};
use crate::domain::{CredentialProvider, DomainError, DomainResult, Identity, Session};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

fn validate_form(email: &str, password: &str) -> DomainResult<()> {
    if !is_valid_email(email) {
        return Err(DomainError::Validation("Invalid email address".into()));
    }
    if !is_valid_password(password) {
        return Err(DomainError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub struct AuthService {
    credentials: Arc<dyn CredentialProvider>,
    recorder: LoginMetricsRecorder,
}

impl AuthService {
    pub fn new(credentials: Arc<dyn CredentialProvider>, recorder: LoginMetricsRecorder) -> Self {
        Self {
            credentials,
            recorder,
        }
    }

    // ── Authentication ──────────────────────────────────────────

    /// Sign in and record the attempt. Malformed input is rejected before
    /// the provider is called and is not recorded as an attempt.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<Session> {
        validate_form(email, password)?;

        let start = Instant::now();
        let result = self.credentials.sign_in(email, password).await;
        let elapsed = start.elapsed();

        let outcome = match &result {
            Ok(_) => LoginOutcome::Succeeded,
            Err(e) => LoginOutcome::failed(e),
        };
        let label = if outcome.is_success() { "success" } else { "failure" };
        metrics::counter!("login_attempts_total", "outcome" => label).increment(1);
        metrics::histogram!("login_duration_seconds").record(elapsed.as_secs_f64());

        let response_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if let Err(e) = self.recorder.record(&outcome, response_time_ms).await {
            warn!(error = %e, "Failed to record login metrics");
        }

        match &result {
            Ok(session) => info!(uid = %session.identity.uid, response_time_ms, "Login succeeded"),
            Err(e) => warn!(error = %e, response_time_ms, "Login failed"),
        }
        result
    }

    pub async fn logout(&self, token: &str) -> DomainResult<()> {
        self.credentials.sign_out(token).await
    }

    pub async fn current_identity(&self, token: &str) -> DomainResult<Identity> {
        self.credentials.verify(token).await
    }

    // ── Registration ────────────────────────────────────────────

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> DomainResult<Identity> {
        validate_form(email, password)?;
        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());
        self.credentials.register(email, password, display_name).await
    }
}
