//! Subtitle timing synchronization.
//!
//! Synchronization is an enhancement, never a requirement: every outcome
//! leaves the caller with a usable subtitle path. An aligned copy lives in
//! a [`SyncedSubtitle`] guard that deletes the file once the caller drops it.

mod ffsubsync;
mod traits;
mod types;

pub use ffsubsync::FfsubsyncSynchronizer;
pub use traits::Synchronizer;
pub use types::{SyncOutcome, SyncSkipReason, SyncedSubtitle};
