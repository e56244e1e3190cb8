//! CLI entry point for Insur.

pub mod auth;
pub mod resources;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::auth::AuthEvent;
use crate::config::ClientConfig;
use crate::error::InsurError;
use crate::http::ApiClient;
use crate::types::UserRole;

/// Insur command-line client
#[derive(Parser, Debug)]
#[command(name = "insur", version, about = "Insur insurance platform CLI")]
pub struct Cli {
    /// Backend base URL (overrides INSUR_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Session profile; each profile keeps its own stored login
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session management
    Auth(AuthArgs),
    /// Insurance claims
    Claims(ClaimsArgs),
    /// Policy documents
    Policies(PoliciesArgs),
    /// Policy applications and held policies
    UserPolicies(UserPoliciesArgs),
}

#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in and store the session
    Login(LoginArgs),
    /// Create an account
    Register(RegisterArgs),
    /// Show the stored session
    Status,
    /// Forget the stored session
    Logout,
}

/// Arguments for `insur auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    pub username: String,
    #[arg(long, env = "INSUR_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for `insur auth register`.
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    pub username: String,
    #[arg(long, env = "INSUR_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// USER, BROKER or ADMIN
    #[arg(long, default_value = "USER")]
    pub role: UserRole,
}

#[derive(Parser, Debug)]
pub struct ClaimsArgs {
    #[command(subcommand)]
    pub command: ClaimsCommands,
}

#[derive(Subcommand, Debug)]
pub enum ClaimsCommands {
    /// Claims of the current user
    List,
    /// Every claim (admin)
    All,
    /// Claims waiting for manual review
    Pending,
    Get { id: i64 },
    /// Submit a claim document
    SubmitFile {
        path: PathBuf,
        #[arg(long)]
        policy: i64,
    },
    Approve {
        id: i64,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    Reject {
        id: i64,
        #[arg(long)]
        reason: String,
    },
}

#[derive(Parser, Debug)]
pub struct PoliciesArgs {
    #[command(subcommand)]
    pub command: PoliciesCommands,
}

#[derive(Subcommand, Debug)]
pub enum PoliciesCommands {
    List,
    /// Policies open for applications
    Public,
    Get { id: i64 },
    /// Upload a policy document (broker/admin)
    Upload {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct UserPoliciesArgs {
    #[command(subcommand)]
    pub command: UserPoliciesCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserPoliciesCommands {
    /// Policies held by the current user
    Mine,
    /// Applications waiting for approval (admin)
    Pending,
    Approve {
        id: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    Reject {
        id: i64,
        #[arg(long)]
        reason: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Config from file or env, with command-line overrides applied.
    pub fn client_config(&self) -> Result<ClientConfig, InsurError> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::from_env()?,
        };
        if let Some(url) = &self.api_url {
            config = config.with_base_url(url)?;
        }
        if let Some(profile) = &self.profile {
            config = config.with_profile(profile);
        }
        Ok(config)
    }
}

/// Build the shared client and hook the re-login hint to session expiry.
pub fn connect(config: &ClientConfig) -> Result<ApiClient, InsurError> {
    let client = ApiClient::from_config(config)?;
    client.on_auth_event(Arc::new(|event| {
        if let AuthEvent::SessionExpired { reason } = event {
            eprintln!(
                "Session expired ({reason}). Please log in again: insur auth login <username>"
            );
        }
    }));
    Ok(client)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), InsurError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
