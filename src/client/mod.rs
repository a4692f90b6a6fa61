//! Authorized request pipeline with self-healing credentials.
//!
//! Every call made through [`AuthorizedClient::request`] carries the current
//! bearer credential. A 401 triggers at most one concurrent refresh; callers
//! that hit a 401 while a refresh is in flight park behind it and are
//! replayed once it settles. A failed refresh ends the session and is
//! announced as [`SessionEvent::ForcedLogout`].

pub mod refresh;

pub use refresh::{Admission, RefreshGate, RefreshLease, RefreshWaiter};

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::auth::{AuthError, TokenGrant, TokenStore};
use crate::config::{ClientConfig, DEFAULT_IDENTITY_PATH, DEFAULT_REFRESH_PATH};
use crate::error::Result;
use crate::session::Session;
use crate::storage::{FileStorage, FileStorageConfig, SafeStorage};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, CSRF_HEADER};

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications for the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new credential was stored after a 401.
    CredentialRefreshed,
    /// The refresh failed and the session was cleared; the UI should route
    /// to its login screen.
    ForcedLogout { reason: AuthError },
}

/// The request authorization manager.
pub struct AuthorizedClient {
    transport: Arc<dyn HttpTransport>,
    session: Arc<Session>,
    gate: RefreshGate,
    events: broadcast::Sender<SessionEvent>,
    refresh_path: String,
    identity_path: String,
}

impl fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("session", &self.session)
            .field("gate", &self.gate)
            .field("refresh_path", &self.refresh_path)
            .field("identity_path", &self.identity_path)
            .finish_non_exhaustive()
    }
}

impl AuthorizedClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: Arc<Session>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            session,
            gate: RefreshGate::new(),
            events,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            identity_path: DEFAULT_IDENTITY_PATH.to_string(),
        }
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_identity_path(mut self, path: impl Into<String>) -> Self {
        self.identity_path = path.into();
        self
    }

    /// Path of the endpoint returning the signed-in user.
    pub fn identity_path(&self) -> &str {
        &self.identity_path
    }

    /// Wire up file storage, token store, session, and a reqwest transport.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let backend = FileStorage::new(FileStorageConfig::new(config.storage_dir.clone()));
        let storage = SafeStorage::new(Arc::new(backend));
        let tokens = Arc::new(TokenStore::load(storage.clone()));
        let session = Arc::new(Session::new(tokens, storage));
        let transport = Arc::new(ReqwestTransport::from_config(config)?);
        Ok(Self::new(transport, session)
            .with_refresh_path(config.refresh_path.clone())
            .with_identity_path(config.identity_path.clone()))
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        self.session.tokens()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.gate.is_refreshing()
    }

    /// Requests parked behind the in-flight refresh.
    pub fn queued_requests(&self) -> usize {
        self.gate.queued()
    }

    /// Send `request` with the current credential, refreshing it on a 401.
    ///
    /// A request is retried at most once. Non-2xx responses come back as
    /// errors mapped from their status; transport errors are returned
    /// unchanged and never trigger a refresh.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut retry = request.clone();
        let response = self.send_authorized(request).await?;
        if response.status != StatusCode::UNAUTHORIZED || retry.is_retried() {
            return response.into_result();
        }
        retry.mark_retried();

        match self.gate.admit() {
            Admission::Waiter(waiter) => {
                tracing::debug!(request_id = %retry.id, "refresh in flight; queueing request");
                waiter.wait().await?;
            }
            Admission::Leader(lease) => {
                tracing::debug!(request_id = %retry.id, "credential rejected; refreshing");
                let outcome = self.refresh().await;
                self.commit(&outcome);
                let released = lease.settle(outcome.as_ref().map(|_| ()).map_err(Clone::clone));
                tracing::debug!(released, "refresh settled");
                outcome?;
            }
        }

        tracing::debug!(request_id = %retry.id, "replaying request");
        self.send_authorized(retry).await?.into_result()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::post(path).with_json(body)?)
            .await?
            .json()
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(ApiRequest::put(path).with_json(body)?)
            .await?
            .json()
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(ApiRequest::delete(path)).await
    }

    async fn send_authorized(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        request.set_bearer(self.tokens().credential().as_deref());
        self.transport.send(request).await
    }

    async fn refresh(&self) -> std::result::Result<TokenGrant, AuthError> {
        let csrf = self.tokens().csrf_token().unwrap_or_default();
        let csrf = HeaderValue::from_str(&csrf).unwrap_or_else(|_| {
            tracing::warn!("stored CSRF token is not a valid header value; sending empty");
            HeaderValue::from_static("")
        });
        let request = ApiRequest::post(self.refresh_path.as_str())
            .with_header(HeaderName::from_static(CSRF_HEADER), csrf)
            .without_refresh();

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !response.is_success() {
            return Err(AuthError::RefreshRejected {
                status: response.status.as_u16(),
                message: response.text(),
            });
        }
        let grant: TokenGrant = serde_json::from_slice(&response.body)?;
        if grant.access_token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "refresh response carried an empty access token".to_string(),
            ));
        }
        Ok(grant)
    }

    /// Make the refresh outcome visible before any waiter is released.
    fn commit(&self, outcome: &std::result::Result<TokenGrant, AuthError>) {
        match outcome {
            Ok(grant) => {
                self.tokens().apply_grant(grant);
                tracing::info!("credential refreshed");
                let _ = self.events.send(SessionEvent::CredentialRefreshed);
            }
            Err(error) => {
                tracing::warn!(error = %error, "credential refresh failed; forcing logout");
                self.session.logout();
                let _ = self.events.send(SessionEvent::ForcedLogout {
                    reason: error.clone(),
                });
            }
        }
    }
}
