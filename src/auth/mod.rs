pub mod keycloak;
pub mod session;

use async_trait::async_trait;
use std::fmt;

#[derive(Debug)]
pub enum SessionError {
    NotInitialized,
    Handshake(String),
    Refresh(String),
    Redirect(String),
    Storage(String),
    Login(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotInitialized => write!(f, "identity client not initialized"),
            SessionError::Handshake(msg) => write!(f, "session check failed: {msg}"),
            SessionError::Refresh(msg) => write!(f, "token refresh failed: {msg}"),
            SessionError::Redirect(msg) => write!(f, "could not start redirect: {msg}"),
            SessionError::Storage(msg) => write!(f, "token storage error: {msg}"),
            SessionError::Login(msg) => write!(f, "login failed: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Target of a redirect-based flow. Following it leaves the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub url: String,
}

/// The identity provider's client library, treated as an opaque capability.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Silent session check. Resolves to whether a session exists.
    async fn init(&self) -> Result<bool, SessionError>;

    async fn login(&self, redirect_uri: &str) -> Result<Redirect, SessionError>;

    async fn register(&self, redirect_uri: &str) -> Result<Redirect, SessionError>;

    async fn logout(&self, redirect_uri: &str) -> Result<Redirect, SessionError>;

    /// Wait for the browser to return from a started login or registration
    /// and establish the session. `Ok(false)` when no such flow is pending.
    async fn complete_login(&self) -> Result<bool, SessionError>;

    /// `None` until `init` has completed once.
    fn authenticated(&self) -> Option<bool>;

    /// Refresh the access token if it expires within `min_validity_secs`.
    /// Resolves to whether a refresh happened.
    async fn update_token(&self, min_validity_secs: i64) -> Result<bool, SessionError>;

    fn token(&self) -> Option<String>;

    /// String claim from the parsed identity token.
    fn claim(&self, name: &str) -> Option<String>;
}
