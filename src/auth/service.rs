use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::Serialize;
use tracing::info;

use super::error::AuthError;
use super::events::AuthEvent;
use crate::error::{InsurError, Result};
use crate::http::{ApiClient, RequestBody, RequestOptions};
use crate::types::{LoginRequest, LoginResponse, RegisterRequest, User, UserProfile, UserRole};

/// Tokens closer than this to expiry are reported as near expiry.
const NEAR_EXPIRY_MINUTES: i64 = 10;

/// Snapshot of the stored session, computed without network access.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub logged_in: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
    pub near_expiry: bool,
    pub user: Option<UserProfile>,
}

/// Login, registration and session inspection on top of [`ApiClient`].
///
/// Shares the client's session store and event bus, so a login here is
/// immediately visible to every resource client built from the same
/// `ApiClient`.
///
/// # Example
/// ```no_run
/// use insur::auth::service::AuthService;
/// use insur::config::ClientConfig;
/// use insur::http::ApiClient;
///
/// # async fn example() -> insur::error::Result<()> {
/// let client = ApiClient::from_config(&ClientConfig::from_env()?)?;
/// let auth = AuthService::new(client);
/// let profile = auth.login("jdoe", "secret").await?;
/// println!("welcome {}", profile.display_name());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Authenticate and persist the returned token, refresh token and profile.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
        let body = RequestBody::json(&LoginRequest { username, password })?;
        let response: LoginResponse = self
            .client
            .send(Method::POST, "/api/auth/login", body, RequestOptions::anonymous())
            .await
            .map_err(|err| err.into_operation("Login failed"))?;

        let token = response
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AuthError::InvalidResponse("login response carried no token".into()))?;

        let store = self.client.store();
        store.clear()?;
        store.set_access_token(&token.into())?;
        if let Some(refresh) = response.refresh_token.as_deref() {
            store.set_refresh_token(refresh)?;
        }
        let profile = response.profile();
        store.set_user_profile(&profile)?;

        info!(username = %profile.username, "logged in");
        self.client.events().emit(AuthEvent::LoggedIn {
            username: profile.username.clone(),
        });
        Ok(profile)
    }

    /// Create an account. Nothing is stored; the caller logs in afterwards.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
    ) -> Result<LoginResponse> {
        let body = RequestBody::json(&RegisterRequest {
            username,
            password,
            role,
        })?;
        self.client
            .send(Method::POST, "/api/auth/register", body, RequestOptions::anonymous())
            .await
            .map_err(|err| err.into_operation("Registration failed"))
    }

    /// Drop every stored credential.
    pub fn logout(&self) -> Result<()> {
        self.client.store().clear()?;
        info!("logged out");
        self.client.events().emit(AuthEvent::LoggedOut);
        Ok(())
    }

    /// Account of the current session, `None` when there is no session.
    pub async fn me(&self) -> Result<Option<User>> {
        if self.client.store().access_token()?.is_none() {
            return Ok(None);
        }
        match self.client.get::<User>("/api/auth/me").await {
            Ok(user) => Ok(Some(user)),
            Err(InsurError::Auth(_)) => Ok(None),
            Err(err) => Err(err.into_operation("Failed to fetch current user")),
        }
    }

    pub fn status(&self) -> Result<SessionStatus> {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> Result<SessionStatus> {
        let store = self.client.store();
        let user = store.user_profile()?;
        let Some(token) = store.access_token()? else {
            return Ok(SessionStatus {
                logged_in: false,
                expires_at: None,
                expired: false,
                near_expiry: false,
                user,
            });
        };
        let expires_at = token.expires_at();
        let expired = token.is_expired_at(now, Duration::zero());
        let near_expiry =
            !expired && token.is_expired_at(now, Duration::minutes(NEAR_EXPIRY_MINUTES));
        Ok(SessionStatus {
            logged_in: !expired,
            expires_at,
            expired,
            near_expiry,
            user,
        })
    }
}
