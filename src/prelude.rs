//! Convenience re-exports for common use.

pub use crate::auth::{AuthError, AuthService, LoginRequest, TokenStore};
pub use crate::bootstrap::{BootstrapOutcome, IdentityBootstrap};
pub use crate::client::{AuthorizedClient, SessionEvent};
pub use crate::config::ClientConfig;
pub use crate::error::{LmsError, Result};
pub use crate::session::{Role, Session, SessionState, UserProfile};
pub use crate::storage::{KeyValueStorage, SafeStorage};
pub use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
