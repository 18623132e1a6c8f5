//! Fuzz target for [`Room`] membership and gameplay
//!
//! # Strategy
//!
//! - Session pool: a handful of sessions so joins, leaves and rejoins
//!   collide
//! - Mixed commands: lobby traffic interleaved with games, moves and chat
//! - Garbage input: arbitrary rejoin ids, coordinates and chat text
//!
//! # Invariants
//!
//! - Roster never exceeds capacity
//! - Exactly one host while the room is non-empty
//! - Player ids are unique and every seat maps to one session
//! - `Close` is only requested by an empty room
//! - NEVER panic on any command sequence

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use coopsweep_proto::{Difficulty, MAX_PLAYERS, RoomCode, SessionId};
use coopsweep_server::{Room, RoomAction, RoomConfig};
use libfuzzer_sys::fuzz_target;

const SESSIONS: u8 = 10;

#[derive(Debug, Clone, Arbitrary)]
enum Command {
    Join { session: u8, name: String },
    Leave { session: u8 },
    Disconnect { session: u8 },
    Expire { session: u8 },
    Rejoin { old_id: String, session: u8 },
    RejoinKnown { old: u8, session: u8 },
    NewGame { session: u8, difficulty: u8, seed: u64 },
    Reveal { session: u8, row: i64, col: i64 },
    Flag { session: u8, row: i64, col: i64 },
    Chat { session: u8, text: String, timestamp: u64 },
}

fn session(raw: u8) -> SessionId {
    SessionId::new(u64::from(raw % SESSIONS))
}

fn difficulty(raw: u8) -> Difficulty {
    match raw % 3 {
        0 => Difficulty::Beginner,
        1 => Difficulty::Intermediate,
        _ => Difficulty::Expert,
    }
}

fuzz_target!(|commands: Vec<Command>| {
    let Ok(code) = RoomCode::parse("FUZZ01") else { return };
    let mut room = Room::new(code, RoomConfig::default());

    for command in commands {
        let actions = match command {
            Command::Join { session: s, name } => room.join(session(s), &name).unwrap_or_default(),
            Command::Leave { session: s } => room.leave(session(s)),
            Command::Disconnect { session: s } => room.disconnect(session(s)),
            Command::Expire { session: s } => room.expire(session(s)),
            Command::Rejoin { old_id, session: s } => {
                room.rejoin(&old_id, session(s)).unwrap_or_default()
            },
            Command::RejoinKnown { old, session: s } => {
                room.rejoin(&session(old).to_string(), session(s)).unwrap_or_default()
            },
            Command::NewGame { session: s, difficulty: d, seed } => {
                room.start_game(session(s), difficulty(d), seed).unwrap_or_default()
            },
            Command::Reveal { session: s, row, col } => room.reveal(session(s), row, col),
            Command::Flag { session: s, row, col } => room.toggle_flag(session(s), row, col),
            Command::Chat { session: s, text, timestamp } => {
                room.chat(session(s), &text, timestamp)
            },
        };

        let roster = room.roster();
        assert!(roster.len() <= MAX_PLAYERS);

        let hosts = roster.iter().filter(|p| p.is_host).count();
        assert_eq!(hosts, usize::from(!roster.is_empty()));

        let ids: HashSet<_> = roster.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), roster.len());
        for player in &roster {
            let owner = room.session_of(player.id).expect("seat without session");
            assert_eq!(room.player_id(owner), Some(player.id));
        }

        if actions.contains(&RoomAction::Close) {
            assert!(room.is_empty());
        }
    }
});
