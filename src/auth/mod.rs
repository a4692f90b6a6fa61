//! Credentials, their persistence, and the account flows that issue them.

pub mod error;
pub mod service;
pub mod store;
pub mod token;

pub use error::AuthError;
pub use service::{AuthResponse, AuthService, LoginRequest, RegisterRequest};
pub use store::TokenStore;
pub use token::TokenGrant;
