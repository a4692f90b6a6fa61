//! CLI entry point for the LMS client.

pub mod auth;

use clap::{Parser, Subcommand};

/// LMS session CLI
#[derive(Parser, Debug)]
#[command(name = "lms", version, about = "LMS client session tool")]
pub struct Cli {
    /// Backend base URL (overrides LMS_API_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login(LoginArgs),
    /// Create an account and store the session
    Register(RegisterArgs),
    /// Show the signed-in user
    Whoami,
    /// Sign out and clear the stored session
    Logout,
    /// Issue an authorized GET and print the body
    Get(GetArgs),
}

/// Arguments for `lms login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,
    #[arg(short, long)]
    pub password: String,
}

/// Arguments for `lms register`.
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub name: String,
    #[arg(short, long)]
    pub email: String,
    #[arg(short, long)]
    pub password: String,
    /// student, instructor, or admin
    #[arg(short, long)]
    pub role: Option<String>,
}

/// Arguments for `lms get`.
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// API path, e.g. /courses
    pub path: String,
}
