//! Snapshot Persistence
//!
//! Saves the session as JSON so it survives restarts:
//! - Size cap with an image-stripped fallback
//! - Corrupt snapshots are removed on load
//! - Restore replays intents through the reducer

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rp_core::{ImageRef, Item, MAX_SNAPSHOT_BYTES, RpError};

use crate::intent::{Intent, IntentError, ItemPatch};
use crate::session::{Cursor, Phase, Session};

// ============ Snapshot Config ============

/// Snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Snapshot file
    pub path: PathBuf,
    /// Largest serialized snapshot that will be written
    pub max_bytes: usize,
}

impl SnapshotConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
            max_bytes: MAX_SNAPSHOT_BYTES,
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ReelPick")
        .join("session.json")
}

// ============ Snapshot Format ============

/// Persisted item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// Persisted slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub item_count: usize,
    #[serde(default)]
    pub items: Vec<ItemSnapshot>,
}

/// Persisted session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slot_count: usize,
    #[serde(default)]
    pub slots: Vec<SlotSnapshot>,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub cursor: Cursor,
    #[serde(default)]
    pub result: Vec<Item>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// Capture the current session
    pub fn capture(session: &Session) -> Self {
        Self {
            title: session.title().to_string(),
            slot_count: session.slot_count(),
            slots: session
                .slots()
                .iter()
                .map(|slot| SlotSnapshot {
                    item_count: slot.item_count,
                    items: slot
                        .items
                        .iter()
                        .map(|item| ItemSnapshot {
                            text: item.text.clone(),
                            image: item.image.clone(),
                        })
                        .collect(),
                })
                .collect(),
            phase: session.phase(),
            cursor: session.cursor(),
            result: session.result().to_vec(),
            saved_at: Some(Utc::now()),
        }
    }

    /// Copy with every image dropped (slots and result)
    pub fn without_images(&self) -> Self {
        let mut stripped = self.clone();
        for item in stripped.slots.iter_mut().flat_map(|slot| slot.items.iter_mut()) {
            item.image = None;
        }
        for item in &mut stripped.result {
            item.image = None;
        }
        stripped
    }

    pub fn has_images(&self) -> bool {
        self.slots
            .iter()
            .flat_map(|slot| &slot.items)
            .any(|item| item.image.is_some())
    }

    /// A snapshot without a title or slots is not worth restoring
    pub fn is_restorable(&self) -> bool {
        !self.title.trim().is_empty() && self.slot_count > 0
    }

    /// Phase a restored session resumes in: never a stale result view, never
    /// a draw that no longer runs
    pub fn resume_phase(&self) -> Phase {
        match self.phase {
            Phase::Result | Phase::Playing => Phase::Ready,
            phase => phase,
        }
    }

    /// Rebuild a session by replaying intents through the reducer.
    ///
    /// Returns `Ok(None)` for snapshots that fail the restore rule. The drawn
    /// result is not restored.
    pub fn restore(&self) -> Result<Option<Session>, IntentError> {
        if !self.is_restorable() {
            return Ok(None);
        }

        let mut session = Session::new()
            .apply(Intent::set_title(self.title.as_str()))?
            .apply(Intent::SetSlotCount {
                count: self.slot_count,
            })?;

        for (slot_id, slot) in self.slots.iter().take(self.slot_count).enumerate() {
            if slot.item_count == 0 {
                continue;
            }
            session = session.apply(Intent::SetSlotItemCount {
                slot_id,
                count: slot.item_count,
            })?;

            for (item_id, item) in slot.items.iter().take(slot.item_count).enumerate() {
                session = session.apply(Intent::UpdateItem {
                    slot_id,
                    item_id,
                    patch: ItemPatch {
                        text: Some(item.text.clone()),
                        image: Some(item.image.clone()),
                    },
                })?;
            }
        }

        if session.cursor_in_bounds(self.cursor) {
            session = session.apply(Intent::MoveCursor {
                cursor: self.cursor,
            })?;
        }

        let phase = self.settled_phase(&session);
        if phase == Phase::Inputting && phase != self.resume_phase() {
            if let Some((slot_index, item_index)) = session.first_incomplete_item() {
                session = session.apply(Intent::move_cursor(slot_index, item_index))?;
            }
        }
        session = session.apply(Intent::SetPhase { phase })?;

        Ok(Some(session))
    }

    /// [`SessionSnapshot::resume_phase`], stepped back when the replayed
    /// session cannot support it: a slot without items goes to item count
    /// setup, a blank item goes back to input.
    fn settled_phase(&self, session: &Session) -> Phase {
        let phase = self.resume_phase();
        if !matches!(phase, Phase::Inputting | Phase::Ready) {
            return phase;
        }
        if session.slots().iter().any(|slot| slot.items.is_empty()) {
            log::warn!("[Snapshot] Restored session has a slot without items");
            return Phase::ItemCountSetup;
        }
        if phase == Phase::Ready && !session.all_items_complete() {
            log::warn!("[Snapshot] Restored session has blank items");
            return Phase::Inputting;
        }
        phase
    }
}

// ============ Snapshot Store ============

/// Outcome of a save attempt. Saving never fails the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Full snapshot written
    Saved { bytes: usize },
    /// Written after stripping images
    SavedWithoutImages { bytes: usize },
    /// Nothing written
    Skipped { reason: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }
}

/// Loads and saves session snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    config: SnapshotConfig,
}

impl SnapshotStore {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self::new(SnapshotConfig::at(path))
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn exists(&self) -> bool {
        self.config.path.exists()
    }

    /// Save the session, degrading to an image-free snapshot when needed
    pub fn save(&self, session: &Session) -> SaveOutcome {
        let snapshot = SessionSnapshot::capture(session);

        let first_error = match self.write_snapshot(&snapshot) {
            Ok(bytes) => {
                log::debug!("[Snapshot] Saved {} bytes to {:?}", bytes, self.config.path);
                return SaveOutcome::Saved { bytes };
            }
            Err(err) => err,
        };

        if !snapshot.has_images() {
            log::error!("[Snapshot] Save skipped: {}", first_error);
            return SaveOutcome::Skipped {
                reason: first_error.to_string(),
            };
        }

        log::warn!(
            "[Snapshot] Full save failed ({}), retrying without images",
            first_error
        );

        match self.write_snapshot(&snapshot.without_images()) {
            Ok(bytes) => SaveOutcome::SavedWithoutImages { bytes },
            Err(err) => {
                log::error!("[Snapshot] Save without images also failed: {}", err);
                SaveOutcome::Skipped {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn write_snapshot(&self, snapshot: &SessionSnapshot) -> Result<usize, PersistenceError> {
        let json = serde_json::to_string(snapshot)?;

        if json.len() > self.config.max_bytes {
            return Err(PersistenceError::TooLarge {
                size: json.len(),
                limit: self.config.max_bytes,
            });
        }

        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&self.config.path, &json)?;
        Ok(json.len())
    }

    /// Read the raw snapshot
    pub fn read_snapshot(&self) -> Result<SessionSnapshot, PersistenceError> {
        if !self.config.path.exists() {
            return Err(PersistenceError::NotFound);
        }
        let json = std::fs::read_to_string(&self.config.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load and restore the stored session.
    ///
    /// Missing or non-restorable snapshots yield `None`. A snapshot that cannot
    /// be parsed or replayed is deleted.
    pub fn load(&self) -> Option<Session> {
        let snapshot = match self.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(PersistenceError::NotFound) => return None,
            Err(err) => {
                log::error!("[Snapshot] Failed to load {:?}: {}", self.config.path, err);
                self.discard();
                return None;
            }
        };

        match snapshot.restore() {
            Ok(Some(session)) => {
                log::info!(
                    "[Snapshot] Restored \"{}\" ({} slots, phase {})",
                    session.title(),
                    session.slot_count(),
                    session.phase()
                );
                Some(session)
            }
            Ok(None) => {
                log::debug!("[Snapshot] Stored session has no title or slots, ignoring");
                None
            }
            Err(err) => {
                log::error!("[Snapshot] Stored session could not be replayed: {}", err);
                self.discard();
                None
            }
        }
    }

    /// Delete the stored snapshot. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool, PersistenceError> {
        if !self.config.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.config.path)?;
        log::info!("[Snapshot] Cleared {:?}", self.config.path);
        Ok(true)
    }

    fn discard(&self) {
        if let Err(err) = self.clear() {
            log::warn!("[Snapshot] Failed to remove bad snapshot: {}", err);
        }
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(SnapshotConfig::default())
    }
}

/// Snapshot errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Snapshot is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("No snapshot found")]
    NotFound,
}

impl From<PersistenceError> for RpError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Io(e) => RpError::Io(e),
            PersistenceError::Serialize(e) => RpError::Serialization(e.to_string()),
            other => RpError::Persistence(other.to_string()),
        }
    }
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;

    fn lunch_picker() -> Session {
        let mut session = Session::new()
            .apply(Intent::set_title("Lunch Picker"))
            .unwrap()
            .apply(Intent::SetSlotCount { count: 2 })
            .unwrap();
        for slot_id in 0..2 {
            session = session
                .apply(Intent::SetSlotItemCount { slot_id, count: 2 })
                .unwrap();
        }
        session = session.apply(Intent::BeginInput).unwrap();
        for (slot_id, texts) in [["A", "B"], ["C", "D"]].iter().enumerate() {
            for (item_id, text) in texts.iter().enumerate() {
                session = session
                    .apply(Intent::update_text(slot_id, item_id, *text))
                    .unwrap();
            }
        }
        session.apply(Intent::Complete).unwrap()
    }

    #[test]
    fn test_resume_phase_mapping() {
        let mut snapshot = SessionSnapshot::capture(&lunch_picker());
        snapshot.phase = Phase::Result;
        assert_eq!(snapshot.resume_phase(), Phase::Ready);
        snapshot.phase = Phase::Playing;
        assert_eq!(snapshot.resume_phase(), Phase::Ready);
        snapshot.phase = Phase::Inputting;
        assert_eq!(snapshot.resume_phase(), Phase::Inputting);
    }

    #[test]
    fn test_restore_rule_discards_untitled_or_empty() {
        let mut snapshot = SessionSnapshot::capture(&lunch_picker());
        snapshot.title = "  ".into();
        assert_eq!(snapshot.restore().unwrap(), None);

        let mut snapshot = SessionSnapshot::capture(&lunch_picker());
        snapshot.slot_count = 0;
        assert_eq!(snapshot.restore().unwrap(), None);
    }

    #[test]
    fn test_restore_replays_session() {
        let session = lunch_picker();
        let restored = SessionSnapshot::capture(&session).restore().unwrap().unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_restore_steps_back_when_not_ready() {
        let mut snapshot = SessionSnapshot::capture(&lunch_picker());
        snapshot.slots[1].items[0].text = "   ".into();
        let restored = snapshot.restore().unwrap().unwrap();
        assert_eq!(restored.phase(), Phase::Inputting);
        assert_eq!(restored.cursor(), Cursor::new(1, 0));

        let mut snapshot = SessionSnapshot::capture(&lunch_picker());
        snapshot.slots[1].item_count = 0;
        let restored = snapshot.restore().unwrap().unwrap();
        assert_eq!(restored.phase(), Phase::ItemCountSetup);

        let mut snapshot = SessionSnapshot::capture(&lunch_picker());
        snapshot.phase = Phase::Inputting;
        snapshot.slots.truncate(1);
        let restored = snapshot.restore().unwrap().unwrap();
        assert_eq!(restored.phase(), Phase::ItemCountSetup);
    }

    #[test]
    fn test_restore_rejects_bad_item_count() {
        let mut snapshot = SessionSnapshot::capture(&lunch_picker());
        snapshot.slots[0].item_count = 500;
        assert!(snapshot.restore().is_err());
    }

    #[test]
    fn test_without_images() {
        let session = lunch_picker()
            .apply(Intent::UpdateItem {
                slot_id: 1,
                item_id: 0,
                patch: ItemPatch::image(ImageRef::from_uri("data:image/png;base64,AAAA")),
            })
            .unwrap();
        let snapshot = SessionSnapshot::capture(&session);
        assert!(snapshot.has_images());

        let stripped = snapshot.without_images();
        assert!(!stripped.has_images());
        assert_eq!(stripped.slots[1].items[0].text, "C");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_value(SessionSnapshot::capture(&lunch_picker())).unwrap();
        assert_eq!(json["title"], "Lunch Picker");
        assert_eq!(json["slot_count"], 2);
        assert_eq!(json["phase"], "ready");
        assert_eq!(json["slots"][1]["items"][1]["text"], "D");
        assert!(json["slots"][0]["items"][0]["image"].is_null());
    }

    #[test]
    fn test_default_config() {
        let config = SnapshotConfig::default();
        assert_eq!(config.max_bytes, MAX_SNAPSHOT_BYTES);
        assert!(config.path.ends_with("ReelPick/session.json"));
    }

    #[test]
    fn test_persistence_error_into_rp_error() {
        let err = PersistenceError::TooLarge { size: 10, limit: 4 };
        assert!(matches!(RpError::from(err), RpError::Persistence(_)));

        let err = PersistenceError::Serialize(serde_json::from_str::<u8>("x").unwrap_err());
        assert!(matches!(RpError::from(err), RpError::Serialization(_)));
    }
}
