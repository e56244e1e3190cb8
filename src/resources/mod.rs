//! Typed clients for the backend's resource endpoints.
//!
//! Every call goes through [`ApiClient`], so token handling is shared.
//! Failures are normalized with [`InsurError::into_operation`]: the
//! backend's `message` when it sent one, else a fixed per-operation string.
//! [`InsurError::Auth`] passes through untouched.

pub mod claims;
pub mod policies;
pub mod user_policies;

pub use claims::ClaimClient;
pub use policies::PolicyClient;
pub use user_policies::UserPolicyClient;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{InsurError, Result};
use crate::http::{ApiClient, RequestBody, RequestOptions};

/// Issue one resource call and normalize its failure.
async fn call<T: DeserializeOwned>(
    client: &ApiClient,
    method: Method,
    path: &str,
    body: RequestBody,
    options: RequestOptions,
    failure: &str,
) -> Result<T> {
    client
        .send(method, path, body, options)
        .await
        .map_err(|err| {
            debug!(error = %err, path, "resource call failed");
            err.into_operation(failure)
        })
}

async fn fetch<T: DeserializeOwned>(client: &ApiClient, path: &str, failure: &str) -> Result<T> {
    call(
        client,
        Method::GET,
        path,
        RequestBody::Empty,
        RequestOptions::default(),
        failure,
    )
    .await
}

fn reject_blank(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InsurError::InvalidArgument(format!("{what} must not be empty")));
    }
    Ok(())
}
