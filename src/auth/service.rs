use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::AuthorizedClient;
use crate::error::Result;
use crate::session::{Role, UserProfile};
use crate::transport::ApiRequest;

use super::token::TokenGrant;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const LOGOUT_PATH: &str = "/auth/logout";

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Body returned by login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub grant: TokenGrant,
    pub user: UserProfile,
}

/// Account flows that establish or end a session.
///
/// All I/O decisions (printing, prompting, navigation) belong to the caller;
/// `AuthService` only updates the token store and session and returns typed
/// results.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: Arc<AuthorizedClient>,
}

impl AuthService {
    pub fn new(client: Arc<AuthorizedClient>) -> Self {
        Self { client }
    }

    /// Sign in. A 401 here means bad credentials and is returned as
    /// [`crate::error::LmsError::Unauthorized`] without a refresh attempt.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<UserProfile> {
        let request = ApiRequest::post(LOGIN_PATH)
            .with_json(credentials)?
            .without_refresh();
        self.establish(request).await
    }

    pub async fn register(&self, registration: &RegisterRequest) -> Result<UserProfile> {
        let request = ApiRequest::post(REGISTER_PATH)
            .with_json(registration)?
            .without_refresh();
        self.establish(request).await
    }

    /// End the session. The server call is best-effort; local state is
    /// always cleared.
    pub async fn logout(&self) {
        let request = ApiRequest::post(LOGOUT_PATH).without_refresh();
        if let Err(error) = self.client.request(request).await {
            tracing::warn!(error = %error, "server logout failed; clearing local session anyway");
        }
        self.client.session().logout();
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.client.get_json(self.client.identity_path()).await
    }

    async fn establish(&self, request: ApiRequest) -> Result<UserProfile> {
        let response: AuthResponse = self.client.request(request).await?.json()?;
        let tokens = self.client.tokens();
        tokens.set_credential(Some(response.grant.access_token.clone()));
        tokens.set_csrf_token(response.grant.csrf_token.as_deref());
        self.client.session().set_user(Some(response.user.clone()));
        tracing::info!(user_id = %response.user.id, "signed in");
        Ok(response.user)
    }
}
