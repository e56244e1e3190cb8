//! Insur: Rust client for the Insur policy and claims platform
//!
//! Provides an authenticated HTTP client that keeps a bearer-token session
//! alive (expiry detection, single-flight refresh, one retry on 401) and
//! typed clients for claims, policies and policy applications on top of it.
//!
//! # Quick Start
//!
//! ```no_run
//! use insur::auth::AuthService;
//! use insur::config::ClientConfig;
//! use insur::http::ApiClient;
//! use insur::resources::ClaimClient;
//!
//! # async fn example() -> insur::error::Result<()> {
//! let client = ApiClient::from_config(&ClientConfig::from_env()?)?;
//! AuthService::new(client.clone()).login("jdoe", "secret").await?;
//! let claims = ClaimClient::new(client).list().await?;
//! println!("{} claims", claims.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod resources;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
