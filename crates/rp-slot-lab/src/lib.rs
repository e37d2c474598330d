//! # rp-slot-lab: Reel Resolution Engine for ReelPick
//!
//! Performs one independent uniform draw per slot, reveals each reel on a
//! staggered and jittered schedule, and commits the aggregated result into
//! the session once every reel has stopped.
//!
//! ## Architecture
//!
//! ```text
//! SlotMachine (async driver, one draw in flight)
//!     │
//!     ├── SessionStore (rp-state, single writer)
//!     ├── DrawEngine
//!     │     ├── DrawRng (seedable randomness)
//!     │     └── TimingConfig (base / interval / jitter / settle)
//!     └── ReelTimer (tokio clock)
//!           │
//!           v
//!     DrawPlan → ReelStopped × N → RevealBarrier → Completed
//! ```

pub mod barrier;
pub mod engine;
pub mod events;
pub mod machine;
pub mod outcome;
pub mod rng;
pub mod timer;
pub mod timing;

pub use barrier::*;
pub use engine::*;
pub use events::*;
pub use machine::*;
pub use outcome::*;
pub use rng::*;
pub use timer::*;
pub use timing::*;
