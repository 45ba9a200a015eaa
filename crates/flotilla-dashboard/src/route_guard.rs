use std::sync::Arc;

use flotilla_api::{AuthApi, UserProfile};
use flotilla_session::AuthSession;

pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Enter the protected section. `user` is `None` only when the host has no
    /// persistence and the check was skipped.
    Allow { user: Option<UserProfile> },
    Redirect { location: &'static str },
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Gates the dashboard route group on a server-validated token.
pub struct RouteGuard {
    session: AuthSession,
    api: Arc<dyn AuthApi>,
}

impl RouteGuard {
    pub fn new(session: AuthSession, api: Arc<dyn AuthApi>) -> Self {
        Self { session, api }
    }

    /// Run on every entry into the protected section. A locally present token
    /// is never trusted until `me()` confirms it.
    pub async fn check(&self) -> GuardOutcome {
        if !self.session.persistence().is_available() {
            return GuardOutcome::Allow { user: None };
        }

        if self.session.token().is_none() {
            tracing::debug!("no cached token; redirecting to login");
            return GuardOutcome::Redirect {
                location: LOGIN_ROUTE,
            };
        }

        let response = self.api.me().await;
        match response.data {
            Some(user) if response.error.is_none() => GuardOutcome::Allow { user: Some(user) },
            _ => {
                tracing::info!(
                    error = ?response.error,
                    "cached token rejected; purging credentials"
                );
                self.session.purge_credentials();
                GuardOutcome::Redirect {
                    location: LOGIN_ROUTE,
                }
            }
        }
    }
}
