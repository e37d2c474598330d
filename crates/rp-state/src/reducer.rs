//! Pure transition function for [`Session`]

use rp_core::{MAX_ITEMS_PER_SLOT, Slot, ValidationError};

use crate::intent::{Intent, IntentError};
use crate::session::{Cursor, Phase, Session};

impl Session {
    /// Apply an intent, producing the next session value.
    ///
    /// `self` is never modified. A violated precondition yields an
    /// [`IntentError`] and no new value.
    pub fn apply(&self, intent: Intent) -> Result<Session, IntentError> {
        let name = intent.name();
        self.transition(intent).map_err(|reason| IntentError {
            intent: name,
            reason,
        })
    }

    /// Total form of [`Session::apply`]: a rejected intent returns an
    /// unchanged copy.
    pub fn reduce(&self, intent: Intent) -> Session {
        match self.apply(intent) {
            Ok(next) => next,
            Err(err) => {
                log::warn!("[Session] {}", err);
                self.clone()
            }
        }
    }

    fn transition(&self, intent: Intent) -> Result<Session, ValidationError> {
        let mut next = self.clone();

        match intent {
            Intent::SetTitle { title } => {
                let title = title.trim();
                if title.is_empty() {
                    return Err(ValidationError::EmptyTitle);
                }
                next.title = title.to_string();
                next.phase = Phase::CountSetup;
            }

            Intent::SetSlotCount { count } => {
                if count == 0 {
                    return Err(ValidationError::ZeroSlotCount);
                }
                next.slot_count = count;
                next.slots = (0..count).map(Slot::empty).collect();
                next.phase = Phase::ItemCountSetup;
                next.cursor = Cursor::origin();
                next.result.clear();
            }

            Intent::SetSlotItemCount { slot_id, count } => {
                if next.phase == Phase::Playing {
                    return Err(wrong_phase(next.phase));
                }
                if slot_id >= next.slots.len() {
                    return Err(ValidationError::UnknownSlot(slot_id));
                }
                if count == 0 || count > MAX_ITEMS_PER_SLOT {
                    return Err(ValidationError::ItemCountOutOfRange {
                        slot_id,
                        count,
                        max: MAX_ITEMS_PER_SLOT,
                    });
                }
                next.slots[slot_id] = Slot::with_blank_items(slot_id, count);

                // Shrinking the slot under the cursor must not leave it dangling
                if next.phase == Phase::Inputting && !next.cursor_in_bounds(next.cursor) {
                    next.cursor = Cursor::origin();
                }
            }

            Intent::BeginInput => {
                if next.slots.is_empty() {
                    return Err(ValidationError::NoSlots);
                }
                if let Some(slot) = next.slots.iter().find(|slot| slot.item_count == 0) {
                    return Err(ValidationError::SlotWithoutItems(slot.id));
                }
                next.phase = Phase::Inputting;
                next.cursor = Cursor::origin();
            }

            Intent::UpdateItem {
                slot_id,
                item_id,
                patch,
            } => {
                // Reels are spinning over these items
                if next.phase == Phase::Playing {
                    return Err(wrong_phase(next.phase));
                }
                let slot = next
                    .slots
                    .get_mut(slot_id)
                    .ok_or(ValidationError::UnknownSlot(slot_id))?;
                let item = slot
                    .items
                    .get_mut(item_id)
                    .ok_or(ValidationError::UnknownItem { slot_id, item_id })?;
                patch.merge_into(item);
            }

            Intent::MoveCursor { cursor } => {
                if !next.cursor_in_bounds(cursor) {
                    return Err(ValidationError::CursorOutOfBounds {
                        slot_index: cursor.slot_index,
                        item_index: cursor.item_index,
                    });
                }
                next.cursor = cursor;
            }

            Intent::Complete => {
                if let Some((slot_id, item_id)) = next.first_incomplete_item() {
                    return Err(ValidationError::IncompleteItem { slot_id, item_id });
                }
                next.phase = Phase::Ready;
            }

            Intent::StartDraw => {
                if !next.phase.can_start_draw() {
                    return Err(wrong_phase(next.phase));
                }
                next.phase = Phase::Playing;
                next.result.clear();
            }

            Intent::SetResult { items } => {
                if !items.is_empty() && items.len() != next.slot_count {
                    return Err(ValidationError::ResultLength {
                        expected: next.slot_count,
                        actual: items.len(),
                    });
                }
                next.result = items;
            }

            Intent::SetPhase { phase } => {
                if phase == Phase::Inputting && !next.cursor_in_bounds(next.cursor) {
                    return Err(ValidationError::CursorOutOfBounds {
                        slot_index: next.cursor.slot_index,
                        item_index: next.cursor.item_index,
                    });
                }
                next.phase = phase;
            }

            Intent::PlayAgain => {
                if next.phase != Phase::Result {
                    return Err(wrong_phase(next.phase));
                }
                next.phase = Phase::Ready;
                next.result.clear();
            }

            Intent::EditSlots => {
                if !matches!(next.phase, Phase::Ready | Phase::Playing | Phase::Result) {
                    return Err(wrong_phase(next.phase));
                }
                next.phase = Phase::ItemCountSetup;
                next.result.clear();
            }

            Intent::Reset => {
                next = Session::default();
            }
        }

        Ok(next)
    }
}

fn wrong_phase(phase: Phase) -> ValidationError {
    ValidationError::WrongPhase {
        phase: phase.to_string(),
    }
}
