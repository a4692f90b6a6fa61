use serde::{Deserialize, Serialize};

/// Credential pair issued by login, registration, and refresh.
///
/// # Example
/// ```
/// use lms_client::auth::TokenGrant;
///
/// let grant: TokenGrant =
///     serde_json::from_str(r#"{"accessToken":"abc","csrfToken":"xyz"}"#).unwrap();
/// assert_eq!(grant.access_token, "abc");
/// assert_eq!(grant.csrf_token.as_deref(), Some("xyz"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}
