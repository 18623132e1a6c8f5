//! Fuzz target for [`BoardEngine`] moves
//!
//! # Strategy
//!
//! - Board shapes: small arbitrary dimensions and mine counts
//! - Move sequences: reveals and flags at arbitrary (often out-of-range)
//!   coordinates
//!
//! # Invariants
//!
//! - Mines are placed exactly once, never under the first reveal
//! - `total_revealed` equals the number of revealed cells
//! - Revealed cells are never flagged
//! - A won game has every safe cell revealed
//! - No move changes the board after game over

#![no_main]

use arbitrary::Arbitrary;
use coopsweep_core::{BoardConfig, BoardEngine};
use coopsweep_proto::PlayerId;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Move {
    Reveal { row: u8, col: u8, player: u8 },
    Flag { row: u8, col: u8, player: u8 },
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    rows: u8,
    cols: u8,
    mines: u16,
    seed: u64,
    moves: Vec<Move>,
}

fuzz_target!(|input: FuzzInput| {
    let rows = usize::from(input.rows % 24) + 1;
    let cols = usize::from(input.cols % 24) + 1;
    let Ok(config) = BoardConfig::new(rows, cols, usize::from(input.mines)) else { return };
    let mut engine = BoardEngine::from_config(config, input.seed);
    let mut first_reveal = None;

    for mv in input.moves {
        let before = engine.board().clone();
        let was_over = engine.is_game_over();

        match mv {
            Move::Reveal { row, col, player } => {
                let (row, col) = (usize::from(row), usize::from(col));
                let outcome = engine.reveal_cell(row, col, PlayerId(u32::from(player)));
                if outcome.is_some() && first_reveal.is_none() {
                    first_reveal = Some((row, col));
                }
            },
            Move::Flag { row, col, player } => {
                engine.toggle_flag(usize::from(row), usize::from(col), PlayerId(u32::from(player)));
            },
        }

        if was_over {
            assert_eq!(&before, engine.board());
        }

        let revealed = engine.board().iter().filter(|(_, cell)| cell.revealed).count();
        assert_eq!(revealed, engine.total_revealed());
        assert!(engine.board().iter().all(|(_, cell)| !(cell.revealed && cell.flagged)));

        if engine.mines_placed() {
            assert_eq!(engine.board().mine_count(), engine.mine_count());
            if let Some((row, col)) = first_reveal {
                assert!(!engine.cell(row, col).expect("first reveal in range").mine);
            }
        }

        if engine.is_won() {
            assert!(engine.is_game_over());
            assert_eq!(engine.total_revealed() + engine.mine_count(), rows * cols);
        }
    }
});
