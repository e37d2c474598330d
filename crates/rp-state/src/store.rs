//! Single-writer session owner

use parking_lot::RwLock;

use crate::intent::{Intent, IntentError};
use crate::session::{Phase, Session};
use crate::snapshot::{SaveOutcome, SnapshotStore};

/// Owns the current [`Session`] and serializes every change through the
/// reducer.
///
/// When a [`SnapshotStore`] is attached, each accepted intent is persisted
/// once slots exist. Persistence problems are logged and never surface here.
pub struct SessionStore {
    session: RwLock<Session>,
    snapshots: Option<SnapshotStore>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_session(Session::new())
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(session),
            snapshots: None,
        }
    }

    /// Start from the stored snapshot (or the initial session) and keep
    /// saving to it
    pub fn restore(snapshots: SnapshotStore) -> Self {
        let session = snapshots.load().unwrap_or_default();
        Self {
            session: RwLock::new(session),
            snapshots: Some(snapshots),
        }
    }

    pub fn with_snapshots(mut self, snapshots: SnapshotStore) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn snapshots(&self) -> Option<&SnapshotStore> {
        self.snapshots.as_ref()
    }

    /// Copy of the current session
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    /// Read the current session without cloning
    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.session.read())
    }

    pub fn phase(&self) -> Phase {
        self.session.read().phase()
    }

    /// Apply an intent and make the result current
    pub fn dispatch(&self, intent: Intent) -> Result<Session, IntentError> {
        let mut current = self.session.write();
        let next = current.apply(intent)?;
        *current = next.clone();

        // Saved under the lock so snapshots land in dispatch order
        self.persist(&next);
        Ok(next)
    }

    /// Save the current session now
    pub fn save(&self) -> Option<SaveOutcome> {
        let current = self.session.read();
        self.snapshots.as_ref().map(|store| store.save(&current))
    }

    fn persist(&self, session: &Session) {
        let Some(store) = &self.snapshots else {
            return;
        };
        if session.slot_count() == 0 {
            return;
        }
        if let SaveOutcome::Skipped { reason } = store.save(session) {
            log::warn!("[SessionStore] Snapshot not saved: {}", reason);
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_core::ValidationError;

    #[test]
    fn test_dispatch_updates_current() {
        let store = SessionStore::new();
        let next = store.dispatch(Intent::set_title("Weekend")).unwrap();
        assert_eq!(next.phase(), Phase::CountSetup);
        assert_eq!(store.session(), next);
        assert_eq!(store.read(|s| s.title().to_string()), "Weekend");
    }

    #[test]
    fn test_rejected_dispatch_leaves_session() {
        let store = SessionStore::new();
        store.dispatch(Intent::set_title("Weekend")).unwrap();
        let before = store.session();

        let err = store.dispatch(Intent::SetSlotCount { count: 0 }).unwrap_err();
        assert_eq!(err.reason, ValidationError::ZeroSlotCount);
        assert_eq!(store.session(), before);
    }

    #[test]
    fn test_save_without_snapshots() {
        assert!(SessionStore::new().save().is_none());
    }
}
