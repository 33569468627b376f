//! Coordination of swap steps across the swap node and the ledgers
//!
//! The synchronizer:
//! 1. Polls the swap until the expected action is recommended
//! 2. Executes it and dispatches the resulting ledger action
//! 3. Polls the swap's event log until the step is confirmed

pub mod poll;
pub mod synchronizer;

pub use poll::{poll_until, retry, PollSchedule};
pub use synchronizer::{SyncConfig, SyncState, Synchronizer};
