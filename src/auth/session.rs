use crate::auth::{IdentityClient, Redirect, SessionError};
use log::warn;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Access tokens must stay valid at least this long before being used.
pub const MIN_TOKEN_VALIDITY_SECS: i64 = 30;

const USERNAME_CLAIM: &str = "preferred_username";

/// Thin adapter over the identity provider client. The view-model only ever
/// observes the session through this type.
pub struct SessionAdapter {
    client: Arc<dyn IdentityClient>,
    redirect_uri: String,
    initialized: AtomicBool,
}

impl SessionAdapter {
    pub fn new(client: Arc<dyn IdentityClient>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client,
            redirect_uri: redirect_uri.into(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Run the session handshake once. Later calls return the cached flag.
    /// A failed handshake clears the flag so the next call retries.
    pub async fn initialize(&self) -> Result<bool, SessionError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(self.client.authenticated().unwrap_or(false));
        }

        match self.client.init().await {
            Ok(authenticated) => Ok(authenticated),
            Err(e) => {
                self.initialized.store(false, Ordering::SeqCst);
                warn!("session handshake failed: {e}");
                Err(e)
            }
        }
    }

    pub async fn login(&self) -> Result<Redirect, SessionError> {
        self.client.login(&self.redirect_uri).await
    }

    pub async fn register(&self) -> Result<Redirect, SessionError> {
        self.client.register(&self.redirect_uri).await
    }

    pub async fn logout(&self) -> Result<Redirect, SessionError> {
        self.client.logout(&self.redirect_uri).await
    }

    /// Finish a login or registration started with a redirect. A completed
    /// flow counts as an initialized session.
    pub async fn complete_login(&self) -> Result<bool, SessionError> {
        let completed = self.client.complete_login().await?;
        if completed {
            self.initialized.store(true, Ordering::SeqCst);
        }
        Ok(completed)
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.authenticated().unwrap_or(false)
    }

    pub fn username(&self) -> Option<String> {
        if !self.is_logged_in() {
            return None;
        }
        self.client.claim(USERNAME_CLAIM)
    }

    /// A token valid for at least `MIN_TOKEN_VALIDITY_SECS`, refreshed first
    /// when needed.
    pub async fn token(&self) -> Result<String, SessionError> {
        self.client
            .update_token(MIN_TOKEN_VALIDITY_SECS)
            .await
            .inspect_err(|e| warn!("could not obtain access token: {e}"))?;
        self.client
            .token()
            .ok_or_else(|| SessionError::Refresh("no access token in session".into()))
    }
}
