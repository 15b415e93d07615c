//! Login, signup and logout flows.
//!
//! Each flow talks to the [`PaperService`], updates the [`Session`] and
//! returns an [`AuthOutcome`] holding the alert text to show and the view to
//! move to. Service errors never escape these functions; only a failure to
//! persist the session is returned as `Err`.

use crate::api::PaperService;
use crate::error::PaperDeskError;
use crate::navigation::View;
use crate::session::Session;
use tracing::{info, warn};

pub const LOGIN_FAILED_MESSAGE: &str = "Invalid email or password";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match";
pub const SIGNUP_SUCCESS_MESSAGE: &str = "Signup successful! Please log in.";
pub const SIGNUP_FAILED_MESSAGE: &str = "Signup failed. Please try again.";

/// What a flow produced for the screen that triggered it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOutcome {
    /// Success alert text.
    pub message: Option<String>,
    /// Error alert text.
    pub error: Option<String>,
    /// Where to go next; `None` means stay on the current view.
    pub navigate_to: Option<View>,
}

impl AuthOutcome {
    fn error(text: &str) -> Self {
        Self {
            error: Some(text.to_string()),
            ..Self::default()
        }
    }
}

/// Log in and store the returned token.
///
/// A success response without a token stores nothing and stays put.
pub async fn login(
    service: &dyn PaperService,
    session: &Session,
    email: &str,
    password: &str,
) -> Result<AuthOutcome, PaperDeskError> {
    match service.login(email, password).await {
        Ok(response) => match response.access_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                session.set_token(token)?;
                info!("logged in as {}", email);
                Ok(AuthOutcome {
                    navigate_to: Some(View::Collection),
                    ..AuthOutcome::default()
                })
            }
            None => {
                warn!("login for {} succeeded without a token", email);
                Ok(AuthOutcome::default())
            }
        },
        Err(e) => {
            warn!("login for {} failed: {}", email, e);
            Ok(AuthOutcome::error(LOGIN_FAILED_MESSAGE))
        }
    }
}

/// Create an account. Nothing is sent when `confirm` differs from `password`.
///
/// When the server returns a token it is stored, so the new account is
/// already signed in.
pub async fn signup(
    service: &dyn PaperService,
    session: &Session,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<AuthOutcome, PaperDeskError> {
    if password != confirm {
        return Ok(AuthOutcome::error(PASSWORD_MISMATCH_MESSAGE));
    }

    match service.signup(email, password).await {
        Ok(response) => {
            if let Some(token) = response.access_token.filter(|t| !t.is_empty()) {
                session.set_token(token)?;
            }
            info!("signed up {}", email);
            Ok(AuthOutcome {
                message: Some(SIGNUP_SUCCESS_MESSAGE.to_string()),
                navigate_to: Some(View::Login),
                ..AuthOutcome::default()
            })
        }
        Err(e) => {
            warn!("signup for {} failed: {}", email, e);
            Ok(AuthOutcome::error(SIGNUP_FAILED_MESSAGE))
        }
    }
}

/// Forget the stored token and return to the login view.
pub fn logout(session: &Session) -> Result<View, PaperDeskError> {
    session.clear()?;
    info!("logged out");
    Ok(View::Login)
}
