//! Persisted token cache.
//!
//! The cache is a small JSON blob. [`CredentialStore`] owns it for the whole
//! invocation and writes it back when dropped, but only if something in it
//! changed since it was loaded.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BboxerError;

/// Tokens expiring within this many seconds are treated as expired.
pub const EXPIRY_SKEW_SECS: u64 = 300;

/// A bearer credential issued for one client of one authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub client_id: String,
    pub authority: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix time in seconds.
    pub expires_at: u64,
}

impl Credential {
    /// True if the access token is still usable at `now` (unix seconds).
    pub fn is_fresh(&self, now: u64) -> bool {
        self.expires_at > now.saturating_add(EXPIRY_SKEW_SECS)
    }

    fn issued_for(&self, client_id: &str, authority: &str) -> bool {
        self.client_id == client_id && self.authority == authority
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CacheBlob {
    #[serde(default)]
    credentials: Vec<Credential>,
}

/// In-memory token cache that remembers whether it was modified.
#[derive(Clone, Debug, Default)]
pub struct TokenCache {
    blob: CacheBlob,
    changed: bool,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a cache from its serialized form. The result starts unchanged.
    pub fn deserialize(data: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            blob: serde_json::from_str(data)?,
            changed: false,
        })
    }

    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.blob)
    }

    pub fn has_state_changed(&self) -> bool {
        self.changed
    }

    /// The credential cached for this client and authority, if any.
    pub fn find(&self, client_id: &str, authority: &str) -> Option<&Credential> {
        self.blob
            .credentials
            .iter()
            .find(|credential| credential.issued_for(client_id, authority))
    }

    /// Inserts or replaces the credential for its client and authority.
    ///
    /// Storing an identical credential leaves the cache unchanged.
    pub fn store(&mut self, credential: Credential) {
        let existing = self
            .blob
            .credentials
            .iter_mut()
            .find(|c| c.issued_for(&credential.client_id, &credential.authority));
        match existing {
            Some(current) if *current == credential => {}
            Some(current) => {
                *current = credential;
                self.changed = true;
            }
            None => {
                self.blob.credentials.push(credential);
                self.changed = true;
            }
        }
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Token cache bound to a file for the lifetime of the value.
///
/// Dropping the store flushes a changed cache. Call [`CredentialStore::persist`]
/// to flush earlier and observe write errors.
pub struct CredentialStore {
    path: PathBuf,
    cache: TokenCache,
}

impl CredentialStore {
    /// Opens the cache file at `path`; a missing file yields an empty cache
    /// and an unreadable blob is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BboxerError> {
        let path = path.into();
        let cache = match std::fs::read_to_string(&path) {
            Ok(data) => TokenCache::deserialize(&data).unwrap_or_else(|err| {
                warn!(path = %path.display(), "ignoring unreadable token cache: {err}");
                TokenCache::new()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => TokenCache::new(),
            Err(err) => return Err(BboxerError::Io(err)),
        };
        Ok(Self { path, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TokenCache {
        &mut self.cache
    }

    /// Writes the cache if it changed. Returns whether a write happened.
    pub fn persist(&mut self) -> Result<bool, BboxerError> {
        if !self.cache.has_state_changed() {
            return Ok(false);
        }
        let data = self
            .cache
            .serialize()
            .map_err(|err| BboxerError::Io(err.into()))?;
        std::fs::write(&self.path, data)?;
        self.cache.changed = false;
        debug!(path = %self.path.display(), "token cache written");
        Ok(true)
    }
}

impl Drop for CredentialStore {
    fn drop(&mut self) {
        if let Err(err) = self.persist() {
            warn!(path = %self.path.display(), "failed to write token cache: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(token: &str) -> Credential {
        Credential {
            client_id: "client".into(),
            authority: "https://login.example.com/tenant".into(),
            access_token: token.into(),
            refresh_token: Some("refresh".into()),
            expires_at: 10_000,
        }
    }

    #[test]
    fn test_freshness_uses_skew() {
        let c = credential("a");
        assert!(c.is_fresh(10_000 - EXPIRY_SKEW_SECS - 1));
        assert!(!c.is_fresh(10_000 - EXPIRY_SKEW_SECS));
        assert!(!c.is_fresh(20_000));
    }

    #[test]
    fn test_store_marks_changed_only_on_difference() {
        let mut cache = TokenCache::new();
        assert!(!cache.has_state_changed());

        cache.store(credential("a"));
        assert!(cache.has_state_changed());

        let mut reloaded = TokenCache::deserialize(&cache.serialize().unwrap()).unwrap();
        assert!(!reloaded.has_state_changed());
        reloaded.store(credential("a"));
        assert!(!reloaded.has_state_changed());
        reloaded.store(credential("b"));
        assert!(reloaded.has_state_changed());
        assert_eq!(
            reloaded
                .find("client", "https://login.example.com/tenant")
                .map(|c| c.access_token.as_str()),
            Some("b")
        );
    }

    #[test]
    fn test_find_is_scoped_to_client_and_authority() {
        let mut cache = TokenCache::new();
        cache.store(credential("a"));
        assert!(cache.find("other", "https://login.example.com/tenant").is_none());
        assert!(cache.find("client", "https://login.example.com/other").is_none());
    }

    #[test]
    fn test_store_not_written_when_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".token.cache");
        {
            let store = CredentialStore::open(&path).unwrap();
            assert!(!store.cache().has_state_changed());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_store_flushes_on_drop_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".token.cache");
        {
            let mut store = CredentialStore::open(&path).unwrap();
            store.cache_mut().store(credential("a"));
        }
        let reopened = CredentialStore::open(&path).unwrap();
        assert_eq!(
            reopened
                .cache()
                .find("client", "https://login.example.com/tenant")
                .map(|c| c.access_token.as_str()),
            Some("a")
        );
    }

    #[test]
    fn test_unchanged_store_does_not_clobber_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".token.cache");
        std::fs::write(&path, "{\"credentials\": []}").unwrap();
        {
            let _store = CredentialStore::open(&path).unwrap();
            std::fs::write(&path, "written by another process").unwrap();
        }
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "written by another process"
        );
    }

    #[test]
    fn test_corrupt_cache_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".token.cache");
        std::fs::write(&path, "not json").unwrap();
        let store = CredentialStore::open(&path).unwrap();
        assert!(store.cache().find("client", "x").is_none());
        assert!(!store.cache().has_state_changed());
    }
}
