//! Persisted credential storage

use crate::error::Result;
use crate::types::SessionTokens;
use papaya::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Store key holding the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Store key holding the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Asynchronous key-value store the session tokens are persisted in
///
/// On a device this is backed by encrypted storage; the client only needs
/// `get` and `set` for [`ACCESS_TOKEN_KEY`] and [`REFRESH_TOKEN_KEY`].
pub trait CredentialStore: Send + Sync + 'static {
    /// Read a value, `None` if the key was never written
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Read the persisted token pair. Returns `None` when no refresh token is stored.
///
/// A missing access token is read as an empty string.
pub async fn load_tokens<S: CredentialStore>(store: &S) -> Result<Option<SessionTokens>> {
    let Some(refresh_token) = store.get(REFRESH_TOKEN_KEY).await? else {
        return Ok(None);
    };
    let access_token = store.get(ACCESS_TOKEN_KEY).await?.unwrap_or_default();

    Ok(Some(SessionTokens {
        access_token,
        refresh_token,
    }))
}

/// Persist both tokens of the pair
pub async fn save_tokens<S: CredentialStore>(store: &S, tokens: &SessionTokens) -> Result<()> {
    store.set(ACCESS_TOKEN_KEY, &tokens.access_token).await?;
    store.set(REFRESH_TOKEN_KEY, &tokens.refresh_token).await?;
    Ok(())
}

/// Thread-safe in-memory credential store using Papaya HashMap
#[derive(Clone)]
pub struct MemoryCredentialStore {
    entries: Arc<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: Arc::new(HashMap::new()),
        }
    }

    /// Create a store pre-filled with a token pair
    pub fn with_tokens(tokens: &SessionTokens) -> Self {
        let store = Self::new();
        {
            let entries = store.entries.pin();
            entries.insert(ACCESS_TOKEN_KEY.to_string(), tokens.access_token.clone());
            entries.insert(REFRESH_TOKEN_KEY.to_string(), tokens.refresh_token.clone());
        }
        store
    }

    /// Remove a key
    pub fn remove(&self, key: &str) {
        self.entries.pin().remove(key);
    }

    /// Check if a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.pin().contains_key(key)
    }

    /// Clear all stored entries
    pub fn clear(&self) {
        self.entries.pin().clear();
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.pin().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.pin().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCredentialStore::new();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);

        store.set(ACCESS_TOKEN_KEY, "access_token_123").await.unwrap();
        assert_eq!(
            store.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
            Some("access_token_123")
        );
        assert!(store.contains(ACCESS_TOKEN_KEY));

        store.remove(ACCESS_TOKEN_KEY);
        assert!(!store.contains(ACCESS_TOKEN_KEY));
    }

    #[tokio::test]
    async fn test_load_and_save_tokens() {
        let store = MemoryCredentialStore::new();
        assert_eq!(load_tokens(&store).await.unwrap(), None);

        save_tokens(&store, &SessionTokens::new("OLD", "R1")).await.unwrap();
        assert_eq!(
            load_tokens(&store).await.unwrap(),
            Some(SessionTokens::new("OLD", "R1"))
        );

        // access token may be missing while the refresh token is present
        store.remove(ACCESS_TOKEN_KEY);
        assert_eq!(
            load_tokens(&store).await.unwrap(),
            Some(SessionTokens::new("", "R1"))
        );

        store.clear();
        assert_eq!(load_tokens(&store).await.unwrap(), None);
    }
}
