//! Intents accepted by the session reducer

use thiserror::Error;

use rp_core::{ImageRef, IngestedItem, Item, RpError, ValidationError};

use crate::session::{Cursor, Phase};

/// Field-level update for a single item.
///
/// `None` leaves a field untouched. For the image, `Some(None)` removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub text: Option<String>,
    pub image: Option<Option<ImageRef>>,
}

impl ItemPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn image(image: ImageRef) -> Self {
        Self {
            text: None,
            image: Some(Some(image)),
        }
    }

    pub fn clear_image() -> Self {
        Self {
            text: None,
            image: Some(None),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none()
    }

    pub(crate) fn merge_into(self, item: &mut Item) {
        if let Some(text) = self.text {
            item.text = text;
        }
        if let Some(image) = self.image {
            item.image = image;
        }
    }
}

impl From<IngestedItem> for ItemPatch {
    fn from(item: IngestedItem) -> Self {
        Self {
            text: Some(item.text),
            image: Some(item.image),
        }
    }
}

/// Everything that can change a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Set the title and move on to slot count selection
    SetTitle { title: String },

    /// Rebuild the slot list with `count` empty slots
    SetSlotCount { count: usize },

    /// Replace a slot's items with `count` blank ones (previous content is lost)
    SetSlotItemCount { slot_id: usize, count: usize },

    /// Enter item editing
    BeginInput,

    /// Merge fields into one item
    UpdateItem {
        slot_id: usize,
        item_id: usize,
        patch: ItemPatch,
    },

    /// Point the cursor at an item (caller computes adjacency)
    MoveCursor { cursor: Cursor },

    /// Finish item editing
    Complete,

    /// Begin a draw
    StartDraw,

    /// Record the drawn combination (empty clears it)
    SetResult { items: Vec<Item> },

    /// Explicit phase override
    SetPhase { phase: Phase },

    /// Back to the initial session
    Reset,

    /// Leave the result view for another draw
    PlayAgain,

    /// Go back to item count setup, dropping any result
    EditSlots,
}

impl Intent {
    /// Get intent name
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetTitle { .. } => "set_title",
            Self::SetSlotCount { .. } => "set_slot_count",
            Self::SetSlotItemCount { .. } => "set_slot_item_count",
            Self::BeginInput => "begin_input",
            Self::UpdateItem { .. } => "update_item",
            Self::MoveCursor { .. } => "move_cursor",
            Self::Complete => "complete",
            Self::StartDraw => "start_draw",
            Self::SetResult { .. } => "set_result",
            Self::SetPhase { .. } => "set_phase",
            Self::Reset => "reset",
            Self::PlayAgain => "play_again",
            Self::EditSlots => "edit_slots",
        }
    }

    pub fn set_title(title: impl Into<String>) -> Self {
        Self::SetTitle {
            title: title.into(),
        }
    }

    pub fn update_text(slot_id: usize, item_id: usize, text: impl Into<String>) -> Self {
        Self::UpdateItem {
            slot_id,
            item_id,
            patch: ItemPatch::text(text),
        }
    }

    pub fn move_cursor(slot_index: usize, item_index: usize) -> Self {
        Self::MoveCursor {
            cursor: Cursor::new(slot_index, item_index),
        }
    }
}

/// An intent whose precondition did not hold. The session is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Intent {intent} rejected: {reason}")]
pub struct IntentError {
    pub intent: &'static str,
    #[source]
    pub reason: ValidationError,
}

impl From<IntentError> for RpError {
    fn from(err: IntentError) -> Self {
        RpError::Validation(err.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_merge_keeps_untouched_fields() {
        let mut item = Item {
            id: 0,
            text: "Tacos".into(),
            image: Some(ImageRef::from_uri("data:image/png;base64,AA")),
        };

        ItemPatch::text("Burritos").merge_into(&mut item);
        assert_eq!(item.text, "Burritos");
        assert!(item.image.is_some());

        ItemPatch::clear_image().merge_into(&mut item);
        assert_eq!(item.text, "Burritos");
        assert!(item.image.is_none());
    }

    #[test]
    fn test_ingested_patch_replaces_both_fields() {
        let patch = ItemPatch::from(IngestedItem {
            text: "Pho".into(),
            image: None,
        });
        assert_eq!(patch.text.as_deref(), Some("Pho"));
        assert_eq!(patch.image, Some(None));
        assert!(!patch.is_empty());
        assert!(ItemPatch::default().is_empty());
    }

    #[test]
    fn test_intent_names() {
        assert_eq!(Intent::set_title("x").name(), "set_title");
        assert_eq!(Intent::move_cursor(0, 1).name(), "move_cursor");
        assert_eq!(Intent::Reset.name(), "reset");
    }

    #[test]
    fn test_intent_error_into_rp_error() {
        let err = IntentError {
            intent: "set_slot_count",
            reason: ValidationError::ZeroSlotCount,
        };
        assert_eq!(
            err.to_string(),
            format!("Intent set_slot_count rejected: {}", ValidationError::ZeroSlotCount)
        );
        assert!(matches!(
            RpError::from(err),
            RpError::Validation(ValidationError::ZeroSlotCount)
        ));
    }
}
