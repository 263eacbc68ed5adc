use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The single authenticated identity held by the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: String,
    pub identity: String,
    pub issued_at: DateTime<Utc>,
}

/// Holds zero or one [`Session`]. Every mutation swaps the whole value under
/// the write lock, so readers see either the previous or the next session.
#[derive(Debug, Default)]
pub struct CredentialStore {
    slot: RwLock<Option<Session>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.slot.read().unwrap_or_else(|err| err.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.slot.write().unwrap_or_else(|err| err.into_inner())
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|session| session.token.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn set_session(&self, token: impl Into<String>, identity: impl Into<String>) {
        let session = Session {
            token: token.into(),
            identity: identity.into(),
            issued_at: Utc::now(),
        };
        *self.write() = Some(session);
    }

    /// Drops the current session. Clearing an empty store is a no-op.
    pub fn clear(&self) {
        *self.write() = None;
    }

    /// Removes and returns the current session in one step.
    pub fn take(&self) -> Option<Session> {
        self.write().take()
    }

    /// Clears the store only if it still holds `stale_token`. Returns whether
    /// anything was removed; a newer session from a concurrent login survives.
    pub fn invalidate(&self, stale_token: &str) -> bool {
        let mut slot = self.write();
        if slot.as_ref().map(|s| s.token == stale_token).unwrap_or(false) {
            *slot = None;
            return true;
        }
        false
    }
}
