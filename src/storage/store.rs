//! Typed session persistence.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{FileBackend, MemoryBackend, StorageBackend};
use crate::error::SessionError;
use crate::session::{Token, User};
use crate::Result;

/// Logical storage slots holding the persisted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSlot {
    /// Raw access token string.
    AccessToken,
    /// JSON-encoded user record.
    AuthUser,
}

impl StorageSlot {
    /// Both slots, in write order.
    pub const ALL: [StorageSlot; 2] = [StorageSlot::AccessToken, StorageSlot::AuthUser];

    /// Key used in the backing store.
    pub fn key(&self) -> &'static str {
        match self {
            StorageSlot::AccessToken => "accessToken",
            StorageSlot::AuthUser => "authUser",
        }
    }
}

impl fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Durable storage for the access token and cached user.
///
/// Reads never fail: missing, unreadable, or corrupt data reads as absent.
/// Writes report failure so the caller knows the session will not survive
/// a restart. The store gives no atomicity across slots.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
}

impl SessionStore {
    /// Create a store over the given backend.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Create a store persisted to a JSON file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileBackend::new(path)))
    }

    /// Create a store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Read the raw value of a slot.
    pub async fn get(&self, slot: StorageSlot) -> Option<String> {
        match self.backend.get_item(slot.key()).await {
            Ok(value) => {
                debug!(%slot, present = value.is_some(), "read slot");
                value
            }
            Err(e) => {
                warn!(%slot, error = %e, "failed to read slot, treating as absent");
                None
            }
        }
    }

    /// Write the raw value of a slot.
    pub async fn set(&self, slot: StorageSlot, value: &str) -> Result<()> {
        self.backend
            .set_item(slot.key(), value)
            .await
            .map_err(|e| storage_error(slot, "write", e))
    }

    /// Delete a slot. Deleting an absent slot succeeds.
    pub async fn remove(&self, slot: StorageSlot) -> Result<()> {
        self.backend
            .remove_item(slot.key())
            .await
            .map_err(|e| storage_error(slot, "remove", e))
    }

    /// Read the stored token. Empty strings read as absent.
    pub async fn get_token(&self) -> Option<Token> {
        self.get(StorageSlot::AccessToken)
            .await
            .filter(|raw| !raw.is_empty())
            .map(Token::new)
    }

    /// Persist the token.
    pub async fn set_token(&self, token: &Token) -> Result<()> {
        self.set(StorageSlot::AccessToken, token.as_str()).await
    }

    /// Read and decode the stored user.
    ///
    /// Returns `CorruptPersistedData` when the slot holds something that is
    /// not a user record.
    pub async fn load_user(&self) -> Result<Option<User>> {
        let Some(raw) = self.get(StorageSlot::AuthUser).await else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SessionError::CorruptPersistedData {
                slot: StorageSlot::AuthUser,
                reason: e.to_string(),
            })
    }

    /// Read the stored user, treating corrupt data as absent.
    pub async fn get_user(&self) -> Option<User> {
        match self.load_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "ignoring stored user");
                None
            }
        }
    }

    /// Persist the user as JSON.
    pub async fn set_user(&self, user: &User) -> Result<()> {
        let json = serde_json::to_string(user)
            .map_err(|e| storage_error(StorageSlot::AuthUser, "encode", e.into()))?;
        self.set(StorageSlot::AuthUser, &json).await
    }

    /// Delete both slots.
    ///
    /// Both removals are attempted even if the first fails; the first
    /// error is returned.
    pub async fn clear(&self) -> Result<()> {
        let mut first_err = None;
        for slot in StorageSlot::ALL {
            if let Err(e) = self.remove(slot).await {
                warn!(%slot, error = %e, "failed to clear slot");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

fn storage_error(slot: StorageSlot, op: &str, err: SessionError) -> SessionError {
    match err {
        SessionError::Storage(msg) => SessionError::Storage(format!("{op} {slot}: {msg}")),
        other => SessionError::Storage(format!("{op} {slot}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> (SessionStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (SessionStore::new(backend.clone()), backend)
    }

    #[test]
    fn test_slot_keys() {
        assert_eq!(StorageSlot::AccessToken.key(), "accessToken");
        assert_eq!(StorageSlot::AuthUser.key(), "authUser");
        assert_eq!(StorageSlot::AuthUser.to_string(), "authUser");
    }

    #[tokio::test]
    async fn test_token_roundtrip() {
        let (store, backend) = memory_store();
        store.set_token(&Token::new("mock-token-123")).await.unwrap();

        assert_eq!(backend.peek("accessToken").as_deref(), Some("mock-token-123"));
        assert_eq!(store.get_token().await, Some(Token::new("mock-token-123")));
    }

    #[tokio::test]
    async fn test_user_stored_as_json() {
        let (store, backend) = memory_store();
        store.set_user(&User::new("test@example.com")).await.unwrap();

        assert_eq!(
            backend.peek("authUser").as_deref(),
            Some(r#"{"email":"test@example.com"}"#)
        );
        assert_eq!(store.get_user().await, Some(User::new("test@example.com")));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = SessionStore::in_memory();
        assert!(store.get(StorageSlot::AccessToken).await.is_none());
        assert!(store.get_token().await.is_none());
        assert!(store.get_user().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_token_reads_absent() {
        let (store, backend) = memory_store();
        backend.insert_raw("accessToken", "");
        assert!(store.get_token().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_user() {
        let (store, backend) = memory_store();
        backend.insert_raw("authUser", "{broken");

        assert!(matches!(
            store.load_user().await,
            Err(SessionError::CorruptPersistedData {
                slot: StorageSlot::AuthUser,
                ..
            })
        ));
        assert!(store.get_user().await.is_none());
    }

    #[tokio::test]
    async fn test_read_failure_is_absent() {
        let (store, backend) = memory_store();
        backend.insert_raw("accessToken", "abc");
        backend.fail_reads(true);

        assert!(store.get_token().await.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let (store, backend) = memory_store();
        backend.fail_writes(true);

        let err = store.set_token(&Token::new("abc")).await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert!(err.to_string().contains("accessToken"));
        assert!(store.remove(StorageSlot::AuthUser).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = SessionStore::in_memory();
        store.remove(StorageSlot::AccessToken).await.unwrap();
        store.remove(StorageSlot::AccessToken).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_removes_both() {
        let (store, backend) = memory_store();
        store.set_token(&Token::new("abc")).await.unwrap();
        store.set_user(&User::new("a@b.c")).await.unwrap();

        store.clear().await.unwrap();
        assert!(backend.is_empty());
    }
}
