//! Process-wide session state: who is logged in and whether that is known yet.

pub mod user;

pub use user::{Role, UserProfile};

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::TokenStore;
use crate::storage::{keys, SafeStorage};

/// Snapshot of the session as seen by route guards and views.
///
/// `is_authenticated` always equals `user.is_some()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl SessionState {
    fn with_user(user: Option<UserProfile>, is_loading: bool) -> Self {
        Self {
            is_authenticated: user.is_some(),
            user,
            is_loading,
        }
    }
}

/// Single owner of [`SessionState`].
///
/// Construct one per process (or per test) and share it by `Arc`. Changes are
/// published on a watch channel so observers always see the latest state.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use lms_client::auth::TokenStore;
/// use lms_client::session::Session;
/// use lms_client::storage::{MemoryStorage, SafeStorage};
///
/// let storage = SafeStorage::new(Arc::new(MemoryStorage::new()));
/// let tokens = Arc::new(TokenStore::load(storage.clone()));
/// let session = Session::new(tokens, storage);
/// assert!(session.is_loading());
/// assert!(!session.has_role("admin"));
/// ```
#[derive(Debug)]
pub struct Session {
    tokens: Arc<TokenStore>,
    storage: SafeStorage,
    state: watch::Sender<SessionState>,
}

impl Session {
    /// Create the session, restoring a cached user profile if one was stored.
    pub fn new(tokens: Arc<TokenStore>, storage: SafeStorage) -> Self {
        let cached = restore_user(&storage);
        let (state, _) = watch::channel(SessionState::with_user(cached, true));
        Self {
            tokens,
            storage,
            state,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Replace the current user. Either way, loading is over.
    pub fn set_user(&self, user: Option<UserProfile>) {
        match &user {
            Some(profile) => match serde_json::to_string(profile) {
                Ok(json) => self.storage.set(keys::USER, &json),
                Err(error) => tracing::warn!(error = %error, "failed to serialize user profile"),
            },
            None => self.storage.remove(keys::USER),
        }
        self.state.send_modify(|state| {
            *state = SessionState::with_user(user, false);
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.is_loading != loading;
            state.is_loading = loading;
            changed
        });
    }

    /// Clear user, credential, and CSRF token. Safe to call repeatedly.
    pub fn logout(&self) {
        self.tokens.clear();
        self.storage.remove(keys::USER);
        self.state.send_modify(|state| {
            state.user = None;
            state.is_authenticated = false;
        });
        tracing::debug!("session cleared");
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.state
            .borrow()
            .user
            .as_ref()
            .is_some_and(|user| user.has_role(role))
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        let state = self.state.borrow();
        match state.user.as_ref() {
            Some(user) => roles.iter().any(|role| user.has_role(role)),
            None => false,
        }
    }
}

fn restore_user(storage: &SafeStorage) -> Option<UserProfile> {
    let raw = storage.get(keys::USER)?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(error) => {
            tracing::warn!(error = %error, "discarding unreadable cached user profile");
            storage.remove(keys::USER);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenGrant;
    use crate::storage::MemoryStorage;
    use pretty_assertions::assert_eq;

    fn session_with(backend: Arc<MemoryStorage>) -> Session {
        let storage = SafeStorage::new(backend);
        let tokens = Arc::new(TokenStore::load(storage.clone()));
        Session::new(tokens, storage)
    }

    fn instructor() -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.edu".to_string(),
            roles: vec![Role::Instructor],
        }
    }

    #[test]
    fn starts_loading_and_anonymous() {
        let session = session_with(Arc::new(MemoryStorage::new()));
        assert_eq!(
            session.snapshot(),
            SessionState {
                user: None,
                is_authenticated: false,
                is_loading: true,
            }
        );
    }

    #[test]
    fn cached_user_is_restored_but_still_loading() {
        let json = serde_json::to_string(&instructor()).unwrap();
        let session = session_with(Arc::new(MemoryStorage::seeded([(keys::USER, json.as_str())])));
        let state = session.snapshot();
        assert!(state.is_authenticated);
        assert!(state.is_loading);
    }

    #[test]
    fn corrupt_cached_user_is_discarded() {
        let backend = Arc::new(MemoryStorage::seeded([(keys::USER, "{not json")]));
        let session = session_with(backend.clone());
        assert!(!session.is_authenticated());
        assert!(!backend.contains(keys::USER));
    }

    #[test]
    fn set_user_persists_and_finishes_loading() {
        let backend = Arc::new(MemoryStorage::new());
        let session = session_with(backend.clone());
        session.set_user(Some(instructor()));
        assert!(session.is_authenticated());
        assert!(!session.is_loading());
        assert!(backend.contains(keys::USER));

        session.set_user(None);
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
        assert!(!backend.contains(keys::USER));
    }

    #[test]
    fn logout_leaves_loading_untouched() {
        let session = session_with(Arc::new(MemoryStorage::new()));
        session.set_user(Some(instructor()));
        session.set_loading(true);
        session.logout();
        let state = session.snapshot();
        assert!(state.user.is_none());
        assert!(!state.is_authenticated);
        assert!(state.is_loading);
    }

    #[test]
    fn logout_twice_leaves_storage_empty() {
        let backend = Arc::new(MemoryStorage::new());
        let session = session_with(backend.clone());
        session.tokens().apply_grant(&TokenGrant {
            access_token: "access".to_string(),
            csrf_token: Some("csrf".to_string()),
        });
        session.set_user(Some(instructor()));

        session.logout();
        assert!(backend.is_empty());
        session.logout();
        assert!(backend.is_empty());
        assert!(session.tokens().credential().is_none());
    }

    #[test]
    fn role_queries() {
        let session = session_with(Arc::new(MemoryStorage::new()));
        for role in ["Admin", "admin", "student", "", "anything"] {
            assert!(!session.has_role(role));
        }
        assert!(!session.has_any_role(&["admin", "instructor"]));
        assert!(!session.has_any_role(&[]));

        session.set_user(Some(instructor()));
        assert!(session.has_role("instructor"));
        assert!(!session.has_role("Admin"));
        assert!(session.has_any_role(&["admin", "Instructor"]));
        assert!(!session.has_any_role(&["admin", "student"]));
    }

    #[tokio::test]
    async fn observers_see_updates() {
        let session = session_with(Arc::new(MemoryStorage::new()));
        let mut rx = session.subscribe();
        session.set_user(Some(instructor()));
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_authenticated);
    }
}
