//! rp-state: Session state machine and persistence
//!
//! The session is an immutable value advanced by a pure reducer
//! ([`Session::apply`]). [`SessionStore`] owns the current value and is the
//! only writer; [`SnapshotStore`] persists it across restarts.

mod intent;
mod navigation;
mod reducer;
mod session;
mod snapshot;
mod store;

pub use intent::*;
pub use navigation::*;
pub use session::*;
pub use snapshot::*;
pub use store::*;
