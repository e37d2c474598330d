//! Error types for ReelPick

use thiserror::Error;

use crate::ingest::IngestError;

/// Caller input rejected before any state mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is empty")]
    EmptyTitle,

    #[error("Slot count must be at least 1")]
    ZeroSlotCount,

    #[error("Item count {count} for slot {slot_id} is outside 1..={max}")]
    ItemCountOutOfRange {
        slot_id: usize,
        count: usize,
        max: usize,
    },

    #[error("No slots configured")]
    NoSlots,

    #[error("Slot {0} does not exist")]
    UnknownSlot(usize),

    #[error("Item {item_id} does not exist in slot {slot_id}")]
    UnknownItem { slot_id: usize, item_id: usize },

    #[error("Slot {0} has no items")]
    SlotWithoutItems(usize),

    #[error("Item {item_id} in slot {slot_id} has neither text nor image")]
    IncompleteItem { slot_id: usize, item_id: usize },

    #[error("Not allowed in phase {phase}")]
    WrongPhase { phase: String },

    #[error("Result has {actual} items, expected {expected}")]
    ResultLength { expected: usize, actual: usize },

    #[error("Cursor ({slot_index}, {item_index}) is out of bounds")]
    CursorOutOfBounds { slot_index: usize, item_index: usize },
}

/// Umbrella error for callers that want a single type
#[derive(Error, Debug)]
pub enum RpError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Engine contract violated: {0}")]
    EngineContract(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
