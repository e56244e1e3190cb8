//! Session lifecycle events for the hosting application.
//!
//! The client never navigates anywhere itself. A host subscribes a sink and
//! reacts, typically by sending the user to a login view on
//! [`AuthEvent::SessionExpired`].

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Something that happened to the stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn { username: String },
    TokenRefreshed,
    /// Credentials were cleared because they could not be renewed.
    SessionExpired { reason: String },
    LoggedOut,
}

/// Callback invoked for every [`AuthEvent`].
pub type AuthEventSink = Arc<dyn Fn(AuthEvent) + Send + Sync>;

/// Fan-out of auth events to every subscribed sink.
#[derive(Clone, Default)]
pub struct AuthEvents {
    sinks: Arc<RwLock<Vec<AuthEventSink>>>,
}

impl fmt::Debug for AuthEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .sinks
            .read()
            .map(|sinks| sinks.len())
            .unwrap_or_default();
        f.debug_struct("AuthEvents").field("sinks", &count).finish()
    }
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, sink: AuthEventSink) {
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    pub fn emit(&self, event: AuthEvent) {
        let sinks = self
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for sink in sinks {
            sink(event.clone());
        }
    }
}
