//! Board engine for coopsweep.
//!
//! Pure game logic with no networking or async runtime:
//!
//! ```text
//! coopsweep-core
//!   ├─ BoardConfig   (validated rows/cols/mines, difficulty presets)
//!   ├─ Board / Cell  (grid storage, neighbour iteration)
//!   ├─ BoardEngine   (lazy mine placement, flood-fill reveal, flags, win)
//!   └─ Environment   (time, sleep, randomness for the server layer)
//! ```
//!
//! Mines are placed on the first reveal. With a fixed seed the same first
//! click produces the same layout, which the tests rely on.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod board;
mod config;
pub mod engine;
pub mod env;
mod error;

pub use board::{Board, Cell, Neighbors};
pub use config::BoardConfig;
pub use engine::{BoardEngine, FlagOutcome, RevealOutcome};
pub use env::Environment;
pub use error::BoardError;
