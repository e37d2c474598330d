//! rp-core: Shared types, limits, and errors for ReelPick
//!
//! This crate provides the foundational types used across all ReelPick crates:
//! the item/slot data model, the ingestion contract for item payloads, and the
//! error taxonomy.

mod error;
mod ingest;
mod item;

pub use error::*;
pub use ingest::*;
pub use item::*;

/// Maximum number of items a single slot may hold
pub const MAX_ITEMS_PER_SLOT: usize = 20;

/// Item count offered by default when a slot is first configured
pub const DEFAULT_ITEMS_PER_SLOT: usize = 3;

/// Slot counts offered by the count picker
pub const SLOT_COUNT_PRESETS: [usize; 5] = [3, 4, 5, 6, 8];

/// Largest image payload accepted by ingestion (20 MiB)
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Largest serialized snapshot written by the persistence adapter (8 MiB)
pub const MAX_SNAPSHOT_BYTES: usize = 8 * 1024 * 1024;
