//! Startup identity resolution.

use std::sync::Arc;

use crate::client::AuthorizedClient;
use crate::error::LmsError;
use crate::session::UserProfile;

/// How startup identity resolution ended.
#[derive(Debug)]
pub enum BootstrapOutcome {
    /// No stored credential; no request was made.
    Anonymous,
    Authenticated(UserProfile),
    /// The identity fetch failed; the session is now unauthenticated.
    Failed(LmsError),
}

impl BootstrapOutcome {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Populates the session from the identity endpoint when a credential is
/// stored. The path defaults to the client's configured identity path.
#[derive(Debug, Clone)]
pub struct IdentityBootstrap {
    client: Arc<AuthorizedClient>,
    identity_path: String,
}

impl IdentityBootstrap {
    pub fn new(client: Arc<AuthorizedClient>) -> Self {
        let identity_path = client.identity_path().to_string();
        Self {
            client,
            identity_path,
        }
    }

    pub fn with_identity_path(mut self, path: impl Into<String>) -> Self {
        self.identity_path = path.into();
        self
    }

    /// Resolve the current user. Always leaves the session with
    /// `is_loading == false`.
    pub async fn run(&self) -> BootstrapOutcome {
        let session = self.client.session();
        if !self.client.tokens().has_credential() {
            tracing::debug!("no stored credential; skipping identity fetch");
            // A cached user without a credential is stale.
            session.set_user(None);
            return BootstrapOutcome::Anonymous;
        }

        match self.client.get_json::<UserProfile>(&self.identity_path).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "session restored");
                session.set_user(Some(user.clone()));
                BootstrapOutcome::Authenticated(user)
            }
            Err(error) => {
                tracing::warn!(error = %error, "identity fetch failed");
                session.set_user(None);
                BootstrapOutcome::Failed(error)
            }
        }
    }
}
