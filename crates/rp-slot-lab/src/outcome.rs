//! Draw outcomes and the reveal plan

use std::time::Duration;

use rp_core::{Item, Slot};
use serde::{Deserialize, Serialize};

use crate::timing::ms_to_duration;

/// Monotonic draw identifier, unique per engine
pub type DrawId = u64;

/// The item chosen for one slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOutcome {
    pub slot_index: usize,
    pub item_index: usize,
    pub item: Item,
}

/// One scheduled reel stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelReveal {
    pub outcome: DrawOutcome,
    /// Offset from draw start (ms)
    pub offset_ms: f64,
    /// Jitter component of `offset_ms`
    pub jitter_ms: f64,
}

impl ReelReveal {
    pub fn delay(&self) -> Duration {
        ms_to_duration(self.offset_ms)
    }
}

/// Everything a draw will do, decided up front.
///
/// `reveals` is in slot order; [`DrawPlan::timeline`] gives firing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawPlan {
    pub draw_id: DrawId,
    pub reveals: Vec<ReelReveal>,
    pub settle_ms: f64,
}

impl DrawPlan {
    pub fn reel_count(&self) -> usize {
        self.reveals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reveals.is_empty()
    }

    /// Reveals sorted by firing time; ties keep slot order
    pub fn timeline(&self) -> Vec<&ReelReveal> {
        let mut timeline: Vec<&ReelReveal> = self.reveals.iter().collect();
        timeline.sort_by(|a, b| a.offset_ms.total_cmp(&b.offset_ms));
        timeline
    }

    /// True when some reel stops before a lower-indexed one
    pub fn is_out_of_order(&self) -> bool {
        self.reveals
            .windows(2)
            .any(|pair| pair[1].offset_ms < pair[0].offset_ms)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &DrawOutcome> {
        self.reveals.iter().map(|reveal| &reveal.outcome)
    }

    /// True while every chosen item still sits where it was drawn from
    pub fn matches_slots(&self, slots: &[Slot]) -> bool {
        slots.len() == self.reel_count()
            && self.outcomes().all(|outcome| {
                slots
                    .get(outcome.slot_index)
                    .and_then(|slot| slot.items.get(outcome.item_index))
                    == Some(&outcome.item)
            })
    }

    /// Chosen items in slot order
    pub fn result(&self) -> Vec<Item> {
        self.outcomes().map(|outcome| outcome.item.clone()).collect()
    }

    /// Offset of the last reel stop (ms)
    pub fn last_reveal_ms(&self) -> f64 {
        self.reveals
            .iter()
            .map(|reveal| reveal.offset_ms)
            .fold(0.0, f64::max)
    }

    /// Time from draw start until the result is committed (ms)
    pub fn total_duration_ms(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.last_reveal_ms() + self.settle_ms
    }

    pub fn settle_delay(&self) -> Duration {
        ms_to_duration(self.settle_ms)
    }
}
