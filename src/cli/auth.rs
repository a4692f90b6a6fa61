//! CLI command handlers.

use std::str::FromStr;
use std::sync::Arc;

use crate::auth::{AuthService, LoginRequest, RegisterRequest};
use crate::bootstrap::{BootstrapOutcome, IdentityBootstrap};
use crate::client::{AuthorizedClient, SessionEvent};
use crate::session::{Role, UserProfile};
use crate::transport::ApiRequest;

use super::{GetArgs, LoginArgs, RegisterArgs};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Handle `lms login`.
pub async fn handle_login(client: Arc<AuthorizedClient>, args: &LoginArgs) -> CliResult {
    let user = AuthService::new(client)
        .login(&LoginRequest::new(&args.email, &args.password))
        .await?;
    println!("Signed in as {}", describe(&user));
    Ok(())
}

/// Handle `lms register`.
pub async fn handle_register(client: Arc<AuthorizedClient>, args: &RegisterArgs) -> CliResult {
    let role = args.role.as_deref().map(parse_role).transpose()?;
    let user = AuthService::new(client)
        .register(&RegisterRequest {
            name: args.name.clone(),
            email: args.email.clone(),
            password: args.password.clone(),
            role,
        })
        .await?;
    println!("Registered {}", describe(&user));
    Ok(())
}

/// Parse a role the server will accept.
fn parse_role(raw: &str) -> Result<Role, String> {
    match Role::from_str(raw.trim()) {
        Ok(Role::Unknown) | Err(_) => Err(format!("unknown role: {raw}")),
        Ok(role) => Ok(role),
    }
}

/// Handle `lms whoami`.
pub async fn handle_whoami(client: Arc<AuthorizedClient>) -> CliResult {
    match IdentityBootstrap::new(client).run().await {
        BootstrapOutcome::Anonymous => println!("Not signed in"),
        BootstrapOutcome::Authenticated(user) => println!("{}", describe(&user)),
        BootstrapOutcome::Failed(error) => return Err(error.into()),
    }
    Ok(())
}

/// Handle `lms logout`.
pub async fn handle_logout(client: Arc<AuthorizedClient>) -> CliResult {
    AuthService::new(client).logout().await;
    println!("Signed out");
    Ok(())
}

/// Handle `lms get <path>`.
pub async fn handle_get(client: Arc<AuthorizedClient>, args: &GetArgs) -> CliResult {
    let mut events = client.subscribe();
    let result = client.request(ApiRequest::get(args.path.as_str())).await;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::ForcedLogout { .. } = event {
            eprintln!("Session expired; run `lms login` again");
        }
    }
    let response = result?;
    println!("{}", response.text());
    Ok(())
}

fn describe(user: &UserProfile) -> String {
    let roles = user
        .roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} <{}> [{roles}]", user.name, user.email)
}
