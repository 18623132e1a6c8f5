//! Wire vocabulary for the coopsweep room protocol.
//!
//! Every message is a single JSON object, adjacently tagged:
//!
//! ```text
//! {"event": "revealCell", "data": {"row": 4, "col": 4}}
//! ```
//!
//! ## Layout
//!
//! ```text
//! coopsweep-proto
//!   ├─ ids        (SessionId, PlayerId, RoomCode)
//!   ├─ payloads   (Player, GameState, CellView, ...)
//!   ├─ event      (ClientEvent, ServerEvent)
//!   └─ codec      (line-oriented JSON encode/decode)
//! ```
//!
//! This crate has no runtime dependencies and no knowledge of rooms or boards;
//! it only describes what crosses the wire.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod event;
pub mod ids;
pub mod payloads;

pub use codec::{
    MAX_LINE_BYTES, decode_client_event, decode_server_event, encode_client_event,
    encode_server_event,
};
pub use error::ProtoError;
pub use event::{ClientEvent, ServerEvent};
pub use ids::{PlayerId, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode, SessionId};
pub use payloads::{
    board::{CellView, Difficulty, GameDimensions, GameSnapshot, RevealedCell},
    lobby::{GameState, MAX_PLAYERS, PLAYER_PALETTE, Player, RoomErrorKind},
};
