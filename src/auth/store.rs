use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::token::AccessToken;
use crate::types::UserProfile;

/// Slot holding the serialized access token.
pub const AUTH_TOKEN_SLOT: &str = "auth_token";
/// Slot holding the refresh token, when the backend issues one.
pub const REFRESH_TOKEN_SLOT: &str = "refresh_token";
/// Slot holding the JSON-encoded profile of the logged-in user.
pub const USER_DATA_SLOT: &str = "user_data";

/// Client-side key-value storage for session credentials.
///
/// Implementations must be internally synchronized; the HTTP client shares
/// one store across every in-flight request.
pub trait SessionStore: Send + Sync {
    fn get(&self, slot: &str) -> Result<Option<String>, AuthError>;
    fn set(&self, slot: &str, value: &str) -> Result<(), AuthError>;
    fn remove(&self, slot: &str) -> Result<(), AuthError>;
    /// Remove every slot.
    fn clear(&self) -> Result<(), AuthError>;

    fn access_token(&self) -> Result<Option<AccessToken>, AuthError> {
        Ok(self
            .get(AUTH_TOKEN_SLOT)?
            .filter(|raw| !raw.trim().is_empty())
            .map(AccessToken::new))
    }

    fn set_access_token(&self, token: &AccessToken) -> Result<(), AuthError> {
        self.set(AUTH_TOKEN_SLOT, token.as_str())
    }

    fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self
            .get(REFRESH_TOKEN_SLOT)?
            .filter(|raw| !raw.trim().is_empty()))
    }

    fn set_refresh_token(&self, token: &str) -> Result<(), AuthError> {
        self.set(REFRESH_TOKEN_SLOT, token)
    }

    fn user_profile(&self) -> Result<Option<UserProfile>, AuthError> {
        match self.get(USER_DATA_SLOT)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_user_profile(&self, profile: &UserProfile) -> Result<(), AuthError> {
        self.set(USER_DATA_SLOT, &serde_json::to_string(profile)?)
    }
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with an access token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(AUTH_TOKEN_SLOT.to_string(), token.into());
        store
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, slot: &str) -> Result<Option<String>, AuthError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), AuthError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), AuthError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(slot);
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

/// Configuration for file-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    pub base_dir: PathBuf,
    pub profile: String,
}

impl SessionStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            profile: "default".to_string(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn default_dir() -> PathBuf {
        default_insur_dir()
    }
}

/// File-backed session store using one TOML file per profile.
///
/// # Example
/// ```no_run
/// use insur::auth::{FileSessionStore, SessionStore, SessionStoreConfig};
///
/// let store = FileSessionStore::new(SessionStoreConfig::new("/tmp/insur".into()));
/// store.set("auth_token", "header.payload.signature")?;
/// # Ok::<(), insur::auth::AuthError>(())
/// ```
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        let profile = normalize_label(&config.profile);
        let name = if profile == "default" {
            "session.toml".to_string()
        } else {
            format!("session.{profile}.toml")
        };
        Self {
            path: config.base_dir.join(name),
            lock: Mutex::new(()),
        }
    }

    pub fn new_default() -> Self {
        Self::new(SessionStoreConfig::new(default_insur_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: SessionFile = toml::from_str(&raw)?;
        Ok(file.slots)
    }

    fn write(&self, slots: BTreeMap<String, String>) -> Result<(), AuthError> {
        if slots.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(AuthError::Io(err.to_string())),
            };
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = SessionFile {
            version: 1,
            saved_at: Utc::now(),
            slots,
        };
        fs::write(&self.path, toml::to_string(&file)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), AuthError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slots = self.read()?;
        apply(&mut slots);
        self.write(slots)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, slot: &str) -> Result<Option<String>, AuthError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.remove(slot))
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), AuthError> {
        self.update(|slots| {
            slots.insert(slot.to_string(), value.to_string());
        })
    }

    fn remove(&self, slot: &str) -> Result<(), AuthError> {
        self.update(|slots| {
            slots.remove(slot);
        })
    }

    fn clear(&self) -> Result<(), AuthError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write(BTreeMap::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    saved_at: DateTime<Utc>,
    slots: BTreeMap<String, String>,
}

fn default_insur_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".insur"))
        .unwrap_or_else(|| PathBuf::from(".insur"))
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let out: String = trimmed
        .chars()
        .map(|ch| {
            let lower = ch.to_ascii_lowercase();
            if lower.is_ascii_alphanumeric() || lower == '-' {
                lower
            } else {
                '-'
            }
        })
        .collect();
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
