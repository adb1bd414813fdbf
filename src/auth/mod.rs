//! Bearer credentials for the detection service.
//!
//! Credentials are only ever attached to requests for the configured default
//! endpoint. Any other base URL is treated as a trusted local deployment and
//! gets no `Authorization` header at all.

mod cache;
mod device;

use tracing::{debug, info};

pub use cache::{unix_now, Credential, CredentialStore, TokenCache, EXPIRY_SKEW_SECS};
pub use device::DeviceCodeAcquirer;

use crate::config::Settings;
use crate::error::BboxerError;

/// The identity provider, seen from the client.
pub trait TokenAcquirer {
    /// Returns an access token without user interaction, if the cache allows.
    fn acquire_silent(&self, cache: &mut TokenCache) -> Option<String>;

    /// Runs a user-facing sign-in and blocks until it completes or fails.
    fn acquire_interactive(&self, cache: &mut TokenCache) -> Result<String, BboxerError>;
}

/// Produces the `Authorization` header for a target endpoint.
pub struct TokenProvider<'a, A> {
    settings: &'a Settings,
    store: &'a mut CredentialStore,
    acquirer: A,
}

impl<'a, A: TokenAcquirer> TokenProvider<'a, A> {
    pub fn new(settings: &'a Settings, store: &'a mut CredentialStore, acquirer: A) -> Self {
        Self {
            settings,
            store,
            acquirer,
        }
    }

    /// `Some("Bearer <token>")` for the default endpoint, `None` otherwise.
    ///
    /// Tries the cache first and falls back to interactive sign-in.
    pub fn auth_header(&mut self, target_url: &str) -> Result<Option<String>, BboxerError> {
        if !self.settings.is_default_endpoint(target_url) {
            debug!(target_url, "non-default endpoint, sending no credentials");
            return Ok(None);
        }

        let cache = self.store.cache_mut();
        let token = match self.acquirer.acquire_silent(cache) {
            Some(token) => token,
            None => {
                info!("no usable cached token, starting interactive sign-in");
                self.acquirer.acquire_interactive(cache)?
            }
        };

        if token.is_empty() {
            return Err(BboxerError::AuthenticationFailed(
                "no access token returned".to_string(),
            ));
        }
        Ok(Some(format!("Bearer {token}")))
    }
}
