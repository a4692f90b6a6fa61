//! LMS client core.
//!
//! Owns the session lifecycle of an LMS front end: the bearer credential and
//! its CSRF companion, the logged-in user, and a request pipeline that
//! refreshes an expired credential at most once no matter how many requests
//! notice the expiry at the same time.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use lms_client::prelude::*;
//!
//! # async fn example() -> lms_client::error::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let client = Arc::new(AuthorizedClient::from_config(&config)?);
//!
//! let outcome = IdentityBootstrap::new(client.clone()).run().await;
//! if outcome.user().is_none() {
//!     AuthService::new(client.clone())
//!         .login(&LoginRequest::new("ada@example.edu", "hunter2"))
//!         .await?;
//! }
//! let courses: serde_json::Value = client.get_json("/courses").await?;
//! println!("{courses}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod session;
pub mod storage;
pub mod transport;

#[cfg(feature = "cli")]
pub mod cli;
