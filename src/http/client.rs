//! Bearer-token HTTP client with one-shot refresh-and-retry.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn, Instrument};

use super::parse_body;
use super::request::{RequestBody, RequestDescriptor, RequestOptions};
use crate::auth::error::AuthError;
use crate::auth::events::{AuthEvent, AuthEventSink, AuthEvents};
use crate::auth::refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
use crate::auth::store::{FileSessionStore, SessionStore, SessionStoreConfig};
use crate::auth::token::AccessToken;
use crate::config::ClientConfig;
use crate::error::{InsurError, Result};

/// Authenticated client for the Insur backend.
///
/// Cheap to clone; clones share the session store, the pending refresh and
/// the event subscribers.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use insur::auth::MemorySessionStore;
/// use insur::config::ClientConfig;
/// use insur::http::ApiClient;
///
/// # async fn example() -> insur::error::Result<()> {
/// let config = ClientConfig::default().with_base_url("http://localhost:8080")?;
/// let client = ApiClient::with_store(&config, Arc::new(MemorySessionStore::new()))?;
/// let claims: serde_json::Value = client.get("/api/claims").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    refresh: RefreshCoordinator,
    events: AuthEvents,
    expiry_skew: chrono::Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("events", &self.inner.events)
            .finish()
    }
}

impl ApiClient {
    /// Client with the file-backed session store and the HTTP refresher.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let store = Arc::new(FileSessionStore::new(
            SessionStoreConfig::new(config.session_dir.clone()).with_profile(&config.profile),
        ));
        Self::with_store(config, store)
    }

    /// Client with a custom session store and the HTTP refresher.
    pub fn with_store(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let http = super::build_http_client(config.timeout())?;
        let refresher = HttpTokenRefresher::new(http.clone(), &config.base_url)
            .with_refresh_path(&config.base_url, &config.refresh_path);
        Self::assemble(config, http, store, Arc::new(refresher))
    }

    /// Client with both collaborators injected.
    pub fn with_parts(
        config: &ClientConfig,
        store: Arc<dyn SessionStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Result<Self> {
        let http = super::build_http_client(config.timeout())?;
        Self::assemble(config, http, store, refresher)
    }

    fn assemble(
        config: &ClientConfig,
        http: reqwest::Client,
        store: Arc<dyn SessionStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Result<Self> {
        config.validate()?;
        let events = AuthEvents::new();
        let refresh =
            RefreshCoordinator::new(refresher, store.clone(), events.clone(), config.timeout());
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                store,
                refresh,
                events,
                expiry_skew: chrono::Duration::seconds(config.expiry_skew_secs),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    pub fn events(&self) -> &AuthEvents {
        &self.inner.events
    }

    /// Subscribe to session events (login, refresh, expiry, logout).
    pub fn on_auth_event(&self, sink: AuthEventSink) {
        self.inner.events.subscribe(sink);
    }

    /// Issue a request and return the parsed response body.
    ///
    /// Attaches the stored bearer token, refreshing it first when its
    /// embedded expiry has passed. A 401 triggers exactly one
    /// refresh-and-retry; if that also fails the session is cleared and
    /// [`InsurError::Auth`] is returned.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<serde_json::Value> {
        let mut descriptor = RequestDescriptor::new(method, path, body, options);
        let span = tracing::debug_span!(
            "api_request",
            id = %descriptor.id(),
            method = %descriptor.method(),
            path = descriptor.path(),
        );
        self.execute(&mut descriptor).instrument(span).await
    }

    /// Issue a request and deserialize the response body into `T`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<T> {
        let value = self.request(method, path, body, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, RequestBody::Empty, RequestOptions::default())
            .await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(
            Method::POST,
            path,
            RequestBody::Json(serde_json::to_value(body)?),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(
            Method::PUT,
            path,
            RequestBody::Json(serde_json::to_value(body)?),
            RequestOptions::default(),
        )
        .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::DELETE, path, RequestBody::Empty, RequestOptions::default())
            .await
    }

    async fn execute(&self, descriptor: &mut RequestDescriptor) -> Result<serde_json::Value> {
        let anonymous = descriptor.options().anonymous;
        let token = if anonymous {
            None
        } else {
            self.resolve_token().await?
        };

        let response = self.send_once(descriptor, token.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || anonymous || !descriptor.mark_retried()
        {
            return read_response(response).await;
        }

        let token = self.renewed_token(token.as_ref()).await?;
        match self.send_once(descriptor, Some(&token)).await {
            Ok(retry) if retry.status() == StatusCode::UNAUTHORIZED => {
                Err(self.session_lost(AuthError::Unauthorized))
            }
            Ok(retry) => read_response(retry).await,
            Err(InsurError::Network(message)) => {
                Err(self.session_lost(AuthError::Network(message)))
            }
            Err(other) => Err(other),
        }
    }

    /// Current token, refreshed first if it has expired.
    async fn resolve_token(&self) -> Result<Option<AccessToken>> {
        let Some(token) = self.stored_token()? else {
            debug!("no stored token; sending unauthenticated");
            return Ok(None);
        };
        if !token.is_expired_at(chrono::Utc::now(), self.inner.expiry_skew) {
            return Ok(Some(token));
        }
        debug!(expires_at = ?token.expires_at(), "stored token expired; refreshing before send");
        Ok(Some(self.inner.refresh.refresh().await?))
    }

    /// Token to retry with after `rejected` drew a 401.
    ///
    /// A concurrent request may already have replaced the rejected token; in
    /// that case the stored one is reused and no new refresh is started.
    async fn renewed_token(&self, rejected: Option<&AccessToken>) -> Result<AccessToken> {
        if let Some(stored) = self.stored_token()? {
            let replaced = rejected != Some(&stored);
            if replaced && !stored.is_expired_at(chrono::Utc::now(), self.inner.expiry_skew) {
                debug!("token already renewed by another request; retrying with it");
                return Ok(stored);
            }
        }
        warn!("request unauthorized; refreshing token and retrying once");
        Ok(self.inner.refresh.refresh().await?)
    }

    /// Stored access token; an unreadable session counts as lost.
    fn stored_token(&self) -> Result<Option<AccessToken>> {
        self.inner
            .store
            .access_token()
            .map_err(|err| self.session_lost(err))
    }

    async fn send_once(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&AccessToken>,
    ) -> Result<reqwest::Response> {
        let url = format!(
            "{}/{}",
            self.inner.base_url,
            descriptor.path().trim_start_matches('/')
        );
        let mut builder = self.inner.http.request(descriptor.method().clone(), url);
        let options = descriptor.options();
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }
        builder = match descriptor.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(body) => builder.multipart(body.to_form()?),
        };

        debug!(retried = descriptor.is_retried(), authenticated = token.is_some(), "sending");
        let response = builder.send().await?;
        debug!(status = response.status().as_u16(), "received");
        Ok(response)
    }

    fn session_lost(&self, error: AuthError) -> InsurError {
        warn!(error = %error, "session lost; clearing session");
        if let Err(clear_err) = self.inner.store.clear() {
            warn!(error = %clear_err, "failed to clear session store");
        }
        self.inner.events.emit(AuthEvent::SessionExpired {
            reason: error.to_string(),
        });
        InsurError::Auth(error)
    }
}

async fn read_response(response: reqwest::Response) -> Result<serde_json::Value> {
    let status = response.status();
    let text = response.text().await?;
    if status.is_success() {
        return Ok(parse_body(&text));
    }
    let payload = (!text.trim().is_empty()).then(|| parse_body(&text));
    Err(InsurError::http(status.as_u16(), payload))
}
