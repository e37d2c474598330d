//! Cursor adjacency for item entry
//!
//! The reducer only sets the cursor absolutely; these helpers compute the
//! neighbouring positions the way the entry screen walks through items: one
//! item at a time, wrapping across slot boundaries, stopping at both ends.

use crate::session::{Cursor, Session};

/// Position after the cursor, or `None` at the last item
pub fn next_cursor(session: &Session) -> Option<Cursor> {
    let Cursor {
        slot_index,
        item_index,
    } = session.cursor();
    let slot = session.slot(slot_index)?;

    if item_index + 1 < slot.item_count {
        return Some(Cursor::new(slot_index, item_index + 1));
    }

    // First non-empty slot after this one
    session
        .slots()
        .iter()
        .skip(slot_index + 1)
        .find(|slot| slot.item_count > 0)
        .map(|slot| Cursor::new(slot.id, 0))
}

/// Position before the cursor, or `None` at the first item
pub fn previous_cursor(session: &Session) -> Option<Cursor> {
    let Cursor {
        slot_index,
        item_index,
    } = session.cursor();

    if item_index > 0 {
        return Some(Cursor::new(slot_index, item_index - 1));
    }

    // Last item of the nearest non-empty slot before this one
    session
        .slots()
        .iter()
        .take(slot_index)
        .rev()
        .find(|slot| slot.item_count > 0)
        .map(|slot| Cursor::new(slot.id, slot.item_count - 1))
}

pub fn is_first_item(session: &Session) -> bool {
    previous_cursor(session).is_none()
}

pub fn is_last_item(session: &Session) -> bool {
    next_cursor(session).is_none()
}

/// Input progress as `(position, total)`.
///
/// `position` is the 1-based ordinal of the cursor across all items,
/// `total` the sum of every slot's item count.
pub fn input_progress(session: &Session) -> (usize, usize) {
    let Cursor {
        slot_index,
        item_index,
    } = session.cursor();

    let before: usize = session
        .slots()
        .iter()
        .take(slot_index)
        .map(|slot| slot.item_count)
        .sum();

    let total = session.total_items();
    ((before + item_index + 1).min(total), total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;

    fn inputting(counts: &[usize]) -> Session {
        let mut session = Session::new()
            .apply(Intent::set_title("nav"))
            .unwrap()
            .apply(Intent::SetSlotCount {
                count: counts.len(),
            })
            .unwrap();
        for (slot_id, &count) in counts.iter().enumerate() {
            session = session
                .apply(Intent::SetSlotItemCount { slot_id, count })
                .unwrap();
        }
        session.apply(Intent::BeginInput).unwrap()
    }

    fn at(session: &Session, cursor: Cursor) -> Session {
        session.apply(Intent::MoveCursor { cursor }).unwrap()
    }

    #[test]
    fn test_next_within_slot() {
        let session = inputting(&[3, 2]);
        assert_eq!(next_cursor(&session), Some(Cursor::new(0, 1)));
    }

    #[test]
    fn test_next_wraps_to_next_slot() {
        let session = at(&inputting(&[3, 2]), Cursor::new(0, 2));
        assert_eq!(next_cursor(&session), Some(Cursor::new(1, 0)));
    }

    #[test]
    fn test_next_stops_at_last_item() {
        let session = at(&inputting(&[3, 2]), Cursor::new(1, 1));
        assert_eq!(next_cursor(&session), None);
        assert!(is_last_item(&session));
    }

    #[test]
    fn test_previous_wraps_to_last_item_of_previous_slot() {
        let session = at(&inputting(&[3, 2]), Cursor::new(1, 0));
        assert_eq!(previous_cursor(&session), Some(Cursor::new(0, 2)));
    }

    #[test]
    fn test_previous_stops_at_first_item() {
        let session = inputting(&[3, 2]);
        assert_eq!(previous_cursor(&session), None);
        assert!(is_first_item(&session));
    }

    #[test]
    fn test_walk_visits_every_item_once() {
        let mut session = inputting(&[2, 1, 3]);
        let mut visited = vec![session.cursor()];
        while let Some(cursor) = next_cursor(&session) {
            session = at(&session, cursor);
            visited.push(cursor);
        }
        assert_eq!(visited.len(), 6);
        assert_eq!(visited.last(), Some(&Cursor::new(2, 2)));

        let mut back = 1;
        while let Some(cursor) = previous_cursor(&session) {
            session = at(&session, cursor);
            back += 1;
        }
        assert_eq!(back, 6);
        assert_eq!(session.cursor(), Cursor::origin());
    }

    #[test]
    fn test_input_progress() {
        let session = inputting(&[3, 2]);
        assert_eq!(input_progress(&session), (1, 5));

        let session = at(&session, Cursor::new(1, 1));
        assert_eq!(input_progress(&session), (5, 5));
    }
}
