//! Access guard
//!
//! Gates the dashboard on a valid session and on `role == "admin"` in the
//! caller's `users/{uid}` profile. Transitions are a pure function of the
//! current state and an event; [`AccessGuard`] feeds it real lookups.
//! Any doubt about the role ends in `Forbidden`.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{
    collections, CredentialProvider, DocumentStore, FromDocument, Identity, UserRecord,
};

/// Relative route unauthenticated callers are sent to.
pub const LOGIN_ROUTE: &str = "/login";

pub const NOT_ADMIN_MESSAGE: &str =
    "You do not have permission to access the dashboard because your role is not an admin.";
pub const ROLE_CHECK_FAILED_MESSAGE: &str =
    "Unable to verify your role. Access to the dashboard is denied.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AccessState {
    Loading,
    CheckingRole { identity: Identity },
    Authenticated { identity: Identity },
    Unauthenticated { redirect_to: String },
    Forbidden { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccessEvent {
    /// A fresh login; restarts evaluation from any state.
    SessionStarted,
    /// No credential, or one that did not verify.
    NoSession,
    SessionResolved(Identity),
    /// Role read from the profile; `None` when the document or the
    /// attribute is missing.
    RoleLoaded(Option<String>),
    RoleLookupFailed(String),
}

impl AccessState {
    pub fn on(self, event: AccessEvent) -> AccessState {
        use AccessEvent as E;
        use AccessState as S;

        match (self, event) {
            (_, E::SessionStarted) => S::Loading,

            (S::Loading, E::NoSession) => S::Unauthenticated {
                redirect_to: LOGIN_ROUTE.to_string(),
            },
            (S::Loading, E::SessionResolved(identity)) => S::CheckingRole { identity },

            (S::CheckingRole { identity }, E::RoleLoaded(role)) => {
                if role.as_deref() == Some(collections::ADMIN_ROLE) {
                    S::Authenticated { identity }
                } else {
                    S::Forbidden {
                        reason: NOT_ADMIN_MESSAGE.to_string(),
                    }
                }
            }
            (S::CheckingRole { .. }, E::RoleLookupFailed(_)) => S::Forbidden {
                reason: ROLE_CHECK_FAILED_MESSAGE.to_string(),
            },
            (S::CheckingRole { .. }, E::NoSession) => S::Unauthenticated {
                redirect_to: LOGIN_ROUTE.to_string(),
            },

            // Terminal states, and events that do not apply to the
            // current state, leave it unchanged.
            (state, _) => state,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Authenticated { .. } | Self::Unauthenticated { .. } | Self::Forbidden { .. }
        )
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated { identity } | Self::CheckingRole { identity } => Some(identity),
            _ => None,
        }
    }
}

/// Drives [`AccessState`] with the credential provider and the store.
#[derive(Clone)]
pub struct AccessGuard {
    credentials: Arc<dyn CredentialProvider>,
    store: Arc<dyn DocumentStore>,
}

impl AccessGuard {
    pub fn new(credentials: Arc<dyn CredentialProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { credentials, store }
    }

    /// Evaluate a request's credential to a terminal state.
    pub async fn evaluate(&self, token: Option<&str>) -> AccessState {
        let mut state = AccessState::Loading;

        let session = match token.filter(|t| !t.trim().is_empty()) {
            Some(token) => match self.credentials.verify(token).await {
                Ok(identity) => AccessEvent::SessionResolved(identity),
                Err(e) => {
                    debug!(error = %e, "Credential rejected");
                    AccessEvent::NoSession
                }
            },
            None => AccessEvent::NoSession,
        };
        state = state.on(session);

        let uid = match &state {
            AccessState::CheckingRole { identity } => identity.uid.clone(),
            _ => return state,
        };

        let role_event = match self.store.get(collections::USERS, &uid).await {
            Ok(doc) => AccessEvent::RoleLoaded(
                doc.map(|d| UserRecord::from_document(&d))
                    .and_then(|user| user.role),
            ),
            Err(e) => {
                warn!(uid = %uid, error = %e, "Role lookup failed, denying access");
                AccessEvent::RoleLookupFailed(e.to_string())
            }
        };
        state.on(role_event)
    }
}
