//! Session context holding the current access token

use std::sync::{Arc, RwLock};

/// Per-login session state
///
/// Holds the access token the authenticated client reads whenever it builds a
/// request. Written after login and after every successful refresh;
/// last write wins. The id keys refresh coalescing, so concurrent requests of
/// the same session share one refresh exchange.
#[derive(Debug)]
pub struct Session {
    id: String,
    access_token: RwLock<String>,
}

impl Session {
    /// Create a session with no access token yet
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Self::with_access_token(id, String::new())
    }

    /// Create a session that already has an access token (e.g. restored at startup)
    pub fn with_access_token(id: impl Into<String>, access_token: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            access_token: RwLock::new(access_token.into()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current access token, empty when not logged in
    pub fn access_token(&self) -> String {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_access_token(&self, access_token: impl Into<String>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = access_token.into();
    }

    pub fn clear(&self) {
        self.set_access_token(String::new());
    }

    pub fn is_authenticated(&self) -> bool {
        !self
            .access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_slot() {
        let session = Session::new("user@example.com");
        assert_eq!(session.id(), "user@example.com");
        assert!(!session.is_authenticated());

        session.set_access_token("OLD");
        session.set_access_token("NEW");
        assert_eq!(session.access_token(), "NEW");
        assert!(session.is_authenticated());

        session.clear();
        assert_eq!(session.access_token(), "");
    }

    #[test]
    fn test_shared_across_clones() {
        let session = Session::with_access_token("s1", "OLD");
        let other = Arc::clone(&session);

        other.set_access_token("NEW");
        assert_eq!(session.access_token(), "NEW");
    }
}
