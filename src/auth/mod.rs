//! Session credentials, token refresh and login flows.

pub mod error;
pub mod events;
pub mod refresh;
pub mod service;
pub mod store;
pub mod token;

pub use error::AuthError;
pub use events::{AuthEvent, AuthEventSink, AuthEvents};
pub use refresh::{HttpTokenRefresher, RefreshCoordinator, RefreshedTokens, TokenRefresher};
pub use service::{AuthService, SessionStatus};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, SessionStoreConfig};
pub use token::AccessToken;
