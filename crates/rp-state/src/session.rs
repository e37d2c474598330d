//! Session value and phases

use std::fmt;

use serde::{Deserialize, Serialize};

use rp_core::{Item, Slot};

/// Stage of configuration/play progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for a title
    #[default]
    TitleInput,
    /// Choosing how many slots
    CountSetup,
    /// Choosing how many items per slot
    ItemCountSetup,
    /// Filling in items one by one
    Inputting,
    /// All items valid, draw can start
    Ready,
    /// Draw in flight
    Playing,
    /// Showing the drawn combination
    Result,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::TitleInput,
        Phase::CountSetup,
        Phase::ItemCountSetup,
        Phase::Inputting,
        Phase::Ready,
        Phase::Playing,
        Phase::Result,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TitleInput => "title_input",
            Self::CountSetup => "count_setup",
            Self::ItemCountSetup => "item_count_setup",
            Self::Inputting => "inputting",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Result => "result",
        }
    }

    /// Phases from which a draw may be started
    pub fn can_start_draw(&self) -> bool {
        matches!(self, Self::Ready | Self::Result)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Item currently being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub slot_index: usize,
    pub item_index: usize,
}

impl Cursor {
    pub const fn new(slot_index: usize, item_index: usize) -> Self {
        Self {
            slot_index,
            item_index,
        }
    }

    pub const fn origin() -> Self {
        Self::new(0, 0)
    }
}

/// Complete configuration and play state.
///
/// Only the reducer produces new values; [`crate::SessionStore`] holds the
/// current one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    pub(crate) title: String,
    pub(crate) slot_count: usize,
    pub(crate) slots: Vec<Slot>,
    pub(crate) phase: Phase,
    pub(crate) cursor: Cursor,
    pub(crate) result: Vec<Item>,
}

impl Session {
    /// Initial value: empty title, no slots, title entry phase
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, slot_id: usize) -> Option<&Slot> {
        self.slots.get(slot_id)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Item under the cursor
    pub fn current_item(&self) -> Option<&Item> {
        self.slots
            .get(self.cursor.slot_index)?
            .item(self.cursor.item_index)
    }

    /// Drawn combination; empty or exactly `slot_count` long
    pub fn result(&self) -> &[Item] {
        &self.result
    }

    pub fn has_result(&self) -> bool {
        !self.result.is_empty()
    }

    pub fn is_initial(&self) -> bool {
        *self == Self::default()
    }

    pub fn total_items(&self) -> usize {
        self.slots.iter().map(|slot| slot.item_count).sum()
    }

    /// Whether the cursor addresses an existing item
    pub fn cursor_in_bounds(&self, cursor: Cursor) -> bool {
        self.slots
            .get(cursor.slot_index)
            .is_some_and(|slot| cursor.item_index < slot.items.len())
    }

    /// First `(slot_id, item_id)` that has neither text nor image
    pub fn first_incomplete_item(&self) -> Option<(usize, usize)> {
        self.slots.iter().find_map(|slot| {
            slot.first_invalid_item()
                .map(|item_id| (slot.id, item_id))
        })
    }

    /// Every item in every slot has text or an image
    pub fn all_items_complete(&self) -> bool {
        self.first_incomplete_item().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_session() {
        let session = Session::new();
        assert_eq!(session.title(), "");
        assert_eq!(session.slot_count(), 0);
        assert!(session.slots().is_empty());
        assert_eq!(session.phase(), Phase::TitleInput);
        assert_eq!(session.cursor(), Cursor::origin());
        assert!(!session.has_result());
        assert!(session.is_initial());
    }

    #[test]
    fn test_phase_serde_names() {
        let json = serde_json::to_string(&Phase::ItemCountSetup).unwrap();
        assert_eq!(json, "\"item_count_setup\"");
        for phase in Phase::ALL {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase.name()));
        }
    }

    #[test]
    fn test_draw_start_phases() {
        let startable: Vec<_> = Phase::ALL
            .into_iter()
            .filter(Phase::can_start_draw)
            .collect();
        assert_eq!(startable, vec![Phase::Ready, Phase::Result]);
    }
}
