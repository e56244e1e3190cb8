#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use insur::auth::{
    AccessToken, AuthError, AuthEvent, MemorySessionStore, RefreshedTokens, SessionStore,
    TokenRefresher,
};
use insur::config::ClientConfig;
use insur::http::ApiClient;
use wiremock::MockServer;

/// Unsigned JWT whose `exp` lies `offset_secs` from now.
pub fn jwt(subject: &str, offset_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let exp = Utc::now().timestamp() + offset_secs;
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{subject}","exp":{exp}}}"#));
    format!("{header}.{claims}.signature")
}

pub fn fresh_jwt(subject: &str) -> String {
    jwt(subject, 3600)
}

pub fn expired_jwt(subject: &str) -> String {
    jwt(subject, -3600)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::default()
        .with_base_url(server.uri())
        .expect("mock server uri is a valid base url")
        .with_timeout(Duration::from_secs(5))
}

/// Store holding an access token and a refresh token.
pub fn session(access: &str, refresh: &str) -> Arc<MemorySessionStore> {
    let store = Arc::new(MemorySessionStore::with_token(access));
    store.set_refresh_token(refresh).expect("seed refresh token");
    store
}

/// Client using the real HTTP refresher against the mock server.
pub fn client(server: &MockServer, store: Arc<MemorySessionStore>) -> ApiClient {
    ApiClient::with_store(&config_for(server), store).expect("client builds")
}

/// Client using an injected refresher.
pub fn client_with_refresher(
    server: &MockServer,
    store: Arc<MemorySessionStore>,
    refresher: Arc<CountingRefresher>,
) -> ApiClient {
    ApiClient::with_parts(&config_for(server), store, refresher).expect("client builds")
}

/// Records every auth event the client emits.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<AuthEvent>>>,
}

impl EventLog {
    pub fn attach(client: &ApiClient) -> Self {
        let log = Self::default();
        let events = log.events.clone();
        client.on_auth_event(Arc::new(move |event| {
            events.lock().expect("event log lock poisoned").push(event);
        }));
        log
    }

    pub fn events(&self) -> Vec<AuthEvent> {
        self.events.lock().expect("event log lock poisoned").clone()
    }

    pub fn session_expired_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, AuthEvent::SessionExpired { .. }))
            .count()
    }
}

/// Refresher that counts calls and answers with a fixed outcome.
pub struct CountingRefresher {
    calls: AtomicUsize,
    outcome: Result<String, AuthError>,
    delay: Duration,
}

impl CountingRefresher {
    pub fn succeeding(token: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome: Ok(token.into()),
            delay: Duration::ZERO,
        })
    }

    pub fn failing(error: AuthError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome: Err(error),
            delay: Duration::ZERO,
        })
    }

    pub fn slow(token: impl Into<String>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome: Ok(token.into()),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh(&self, _store: &dyn SessionStore) -> Result<RefreshedTokens, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone().map(|token| RefreshedTokens {
            access_token: AccessToken::new(token),
            refresh_token: None,
        })
    }
}
