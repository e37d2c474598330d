//! Draw lifecycle events

use rp_core::Item;
use serde::{Deserialize, Serialize};

use crate::outcome::{DrawId, DrawOutcome};

/// Broadcast by [`crate::SlotMachine`] as a draw progresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DrawEvent {
    Started {
        draw_id: DrawId,
        slot_count: usize,
    },
    ReelStopped {
        draw_id: DrawId,
        outcome: DrawOutcome,
        offset_ms: f64,
    },
    Completed {
        draw_id: DrawId,
        result: Vec<Item>,
    },
    Cancelled {
        draw_id: DrawId,
    },
}

impl DrawEvent {
    pub fn draw_id(&self) -> DrawId {
        match self {
            Self::Started { draw_id, .. }
            | Self::ReelStopped { draw_id, .. }
            | Self::Completed { draw_id, .. }
            | Self::Cancelled { draw_id } => *draw_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::ReelStopped { .. } => "reel_stopped",
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// True for `Completed` and `Cancelled`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Cancelled { .. })
    }
}
