//! Token refresh with single-flight coalescing.
//!
//! Every request that finds an expired token, and every request that gets a
//! 401, goes through [`RefreshCoordinator::refresh`]. At most one call to
//! the underlying [`TokenRefresher`] is in flight at any time; concurrent
//! callers await the same shared handle and observe the same outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::events::{AuthEvent, AuthEvents};
use super::store::SessionStore;
use super::token::AccessToken;
use crate::util::timeout::{with_timeout, TimedOut};

/// Outcome of a successful refresh call.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub access_token: AccessToken,
    /// Rotated refresh token, if the backend issued a new one.
    pub refresh_token: Option<String>,
}

/// Obtains a new access token without user interaction.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, store: &dyn SessionStore) -> Result<RefreshedTokens, AuthError>;
}

const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh";

/// Refreshes through the backend's refresh endpoint.
///
/// Sends `{"refreshToken": ...}` without any bearer header and expects
/// `{"token": ..., "refreshToken"?: ...}` back.
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    refresh_url: String,
}

impl HttpTokenRefresher {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            refresh_url: format!("{}{DEFAULT_REFRESH_PATH}", base_url.trim_end_matches('/')),
        }
    }

    pub fn with_refresh_path(mut self, base_url: &str, path: &str) -> Self {
        self.refresh_url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        self
    }

    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    token: Option<String>,
    refresh_token: Option<String>,
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, store: &dyn SessionStore) -> Result<RefreshedTokens, AuthError> {
        let refresh_token = store.refresh_token()?.ok_or(AuthError::NoRefreshToken)?;
        let resp = self
            .client
            .post(&self.refresh_url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::RefreshFailed(format!(
                "refresh endpoint returned status {status}"
            )));
        }
        let payload: RefreshResponse = resp
            .json()
            .await
            .map_err(|err| AuthError::InvalidResponse(err.to_string()))?;
        let token = payload
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AuthError::InvalidResponse("refresh response missing token".into()))?;
        Ok(RefreshedTokens {
            access_token: AccessToken::new(token),
            refresh_token: payload.refresh_token,
        })
    }
}

impl From<TimedOut> for AuthError {
    fn from(value: TimedOut) -> Self {
        AuthError::Network(format!(
            "token refresh timed out after {}ms",
            value.0.as_millis()
        ))
    }
}

type PendingRefresh = Shared<BoxFuture<'static, Result<AccessToken, AuthError>>>;

/// Coalesces concurrent refresh requests into one underlying call.
///
/// On success the new token (and rotated refresh token) is written to the
/// store before any waiter resumes. On failure the store is cleared and a
/// [`AuthEvent::SessionExpired`] is emitted once. The pending handle is
/// dropped as soon as the call settles, so the next expiry starts a fresh
/// refresh.
pub struct RefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    store: Arc<dyn SessionStore>,
    events: AuthEvents,
    timeout: Duration,
    pending: Arc<Mutex<Option<(u64, PendingRefresh)>>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        refresher: Arc<dyn TokenRefresher>,
        store: Arc<dyn SessionStore>,
        events: AuthEvents,
        timeout: Duration,
    ) -> Self {
        Self {
            refresher,
            store,
            events,
            timeout,
            pending: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether a refresh call is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Refresh the access token, joining an in-flight refresh if there is one.
    pub async fn refresh(&self) -> Result<AccessToken, AuthError> {
        let handle = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            match pending.as_ref() {
                Some((generation, handle)) => {
                    debug!(generation, "joining in-flight token refresh");
                    handle.clone()
                }
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(generation, "starting token refresh");
                    let handle = self.start(generation);
                    *pending = Some((generation, handle.clone()));
                    handle
                }
            }
        };
        handle.await
    }

    fn start(&self, generation: u64) -> PendingRefresh {
        let refresher = self.refresher.clone();
        let store = self.store.clone();
        let events = self.events.clone();
        let pending = self.pending.clone();
        let timeout = self.timeout;

        async move {
            let outcome = with_timeout(timeout, refresher.refresh(store.as_ref())).await;
            let result = match outcome {
                Ok(tokens) => persist(store.as_ref(), tokens),
                Err(err) => Err(err),
            };

            match &result {
                Ok(_) => {
                    info!(generation, "access token refreshed");
                    events.emit(AuthEvent::TokenRefreshed);
                }
                Err(err) => {
                    warn!(generation, error = %err, "token refresh failed; clearing session");
                    if let Err(clear_err) = store.clear() {
                        warn!(error = %clear_err, "failed to clear session store");
                    }
                    events.emit(AuthEvent::SessionExpired {
                        reason: err.to_string(),
                    });
                }
            }

            let mut slot = pending.lock().unwrap_or_else(PoisonError::into_inner);
            if matches!(slot.as_ref(), Some((current, _)) if *current == generation) {
                *slot = None;
            }
            result
        }
        .boxed()
        .shared()
    }
}

fn persist(store: &dyn SessionStore, tokens: RefreshedTokens) -> Result<AccessToken, AuthError> {
    store.set_access_token(&tokens.access_token)?;
    if let Some(refresh_token) = tokens.refresh_token.as_deref() {
        store.set_refresh_token(refresh_token)?;
    }
    Ok(tokens.access_token)
}
