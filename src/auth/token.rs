use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Bearer credential sent on every authenticated request.
///
/// The string is opaque to the client except for the JWT `exp` claim, which
/// is decoded locally to decide whether a refresh is needed before sending.
/// Tokens that are not JWTs, or carry no `exp`, never count as expired; the
/// backend's 401 is then the only signal.
///
/// # Example
/// ```
/// use insur::auth::AccessToken;
///
/// let token = AccessToken::new("opaque-session-token");
/// assert!(token.expires_at().is_none());
/// assert!(!token.is_expired());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Expiry embedded in the token, if it is a JWT with an `exp` claim.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims().ok()?.exp.and_then(|exp| {
            let secs = exp.trunc() as i64;
            DateTime::<Utc>::from_timestamp(secs, 0)
        })
    }

    /// Whether the token expired before `now + skew`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at()
            .map(|exp| exp < now + skew)
            .unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now(), Duration::zero())
    }

    /// Whether the token expires within `window` from now.
    pub fn expires_within(&self, window: Duration) -> bool {
        self.is_expired_at(Utc::now(), window)
    }

    /// Subject claim (`sub`), usually the username.
    pub fn subject(&self) -> Option<String> {
        self.claims().ok()?.sub
    }

    fn claims(&self) -> Result<JwtClaims, AuthError> {
        let mut parts = self.0.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken("not a JWT".to_string()));
        };
        let decoded = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| AuthError::InvalidToken("payload is not base64url".to_string()))?;
        serde_json::from_slice(&decoded)
            .map_err(|_| AuthError::InvalidToken("payload is not JSON".to_string()))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 8;
        let prefix: String = if self.0.chars().count() > SHOWN {
            self.0.chars().take(SHOWN).collect()
        } else {
            String::new()
        };
        f.debug_tuple("AccessToken")
            .field(&format_args!("{prefix}…"))
            .finish()
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    exp: Option<f64>,
    sub: Option<String>,
}
