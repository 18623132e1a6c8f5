//! Payload types carried inside events.
//!
//! - [`lobby`]: roster, room errors, full-state snapshots
//! - [`board`]: difficulty presets, cell views, board snapshots

pub mod board;
pub mod lobby;
