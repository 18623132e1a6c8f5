//! Property-based tests for the board engine
//!
//! These tests check the board invariants that every game relies on:
//! mine count, adjacency counts, flood-fill closure, determinism and win
//! detection.

use std::collections::BTreeSet;

use coopsweep_core::{Board, BoardEngine, RevealOutcome};
use coopsweep_proto::{Difficulty, PlayerId};
use proptest::prelude::*;

const ALICE: PlayerId = PlayerId(0);
const BOB: PlayerId = PlayerId(1);

fn difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Beginner),
        Just(Difficulty::Intermediate),
        Just(Difficulty::Expert),
    ]
}

/// Start a seeded game and make the first click, wrapping the click into
/// the board's bounds.
fn first_click(
    difficulty: Difficulty,
    seed: u64,
    row: usize,
    col: usize,
) -> (BoardEngine, (usize, usize), RevealOutcome) {
    let mut engine = BoardEngine::with_seed(difficulty, seed);
    let click = (row % engine.rows(), col % engine.cols());
    let outcome = engine.reveal_cell(click.0, click.1, ALICE).expect("first reveal applies");
    (engine, click, outcome)
}

/// Cells a reveal at `click` must open on an unflagged board: the zero
/// region connected to the click plus the numbered cells bordering it.
fn expected_region(board: &Board, click: (usize, usize)) -> BTreeSet<(usize, usize)> {
    let mut region = BTreeSet::from([click]);
    let mut stack = vec![click];
    while let Some((r, c)) = stack.pop() {
        if board.get(r, c).expect("in bounds").count != 0 {
            continue;
        }
        for next in board.neighbors(r, c) {
            if region.insert(next) {
                stack.push(next);
            }
        }
    }
    region
}

fn revealed_coords(outcome: &RevealOutcome) -> Vec<(usize, usize)> {
    outcome.cells.iter().map(|&(r, c, _)| (r, c)).collect()
}

#[test]
fn prop_first_reveal_places_exact_mine_count_away_from_click() {
    proptest!(|(difficulty in difficulty(), seed in any::<u64>(), row in 0usize..16, col in 0usize..30)| {
        let (engine, (r, c), outcome) = first_click(difficulty, seed, row, col);

        // PROPERTY: exactly `mines` cells are mines
        prop_assert_eq!(engine.board().mine_count(), engine.mine_count());

        // PROPERTY: no mine within Chebyshev distance 1 of the first click
        for (nr, nc) in engine.board().neighbors(r, c).chain(std::iter::once((r, c))) {
            prop_assert!(!engine.cell(nr, nc).expect("in bounds").mine);
        }

        // The first click is safe, so it opens a zero region.
        prop_assert!(!engine.is_game_over() || engine.is_won());
        prop_assert!(!outcome.cells.is_empty());
    });
}

#[test]
fn prop_counts_match_mine_neighbors() {
    proptest!(|(difficulty in difficulty(), seed in any::<u64>(), row in 0usize..16, col in 0usize..30)| {
        let (engine, _, _) = first_click(difficulty, seed, row, col);
        let board = engine.board();

        // PROPERTY: a non-mine cell's count equals its mine neighbours
        for ((r, c), cell) in board.iter() {
            if cell.mine {
                continue;
            }
            let expected = board
                .neighbors(r, c)
                .filter(|&(nr, nc)| board.get(nr, nc).is_some_and(|n| n.mine))
                .count();
            prop_assert_eq!(usize::from(cell.count), expected, "cell ({}, {})", r, c);
        }
    });
}

#[test]
fn prop_flood_fill_is_closed_over_zero_cells() {
    proptest!(|(difficulty in difficulty(), seed in any::<u64>(), row in 0usize..16, col in 0usize..30)| {
        let (engine, _, outcome) = first_click(difficulty, seed, row, col);
        let board = engine.board();

        // PROPERTY: every revealed zero cell has all its neighbours revealed
        for &(r, c, cell) in &outcome.cells {
            prop_assert!(cell.revealed);
            prop_assert!(!cell.mine);
            if cell.count == 0 {
                for (nr, nc) in board.neighbors(r, c) {
                    prop_assert!(board.get(nr, nc).expect("in bounds").revealed);
                }
            }
        }

        // PROPERTY: total revealed equals the reported cells
        prop_assert_eq!(engine.total_revealed(), outcome.cells.len());
    });
}

#[test]
fn prop_flood_fill_reveals_exactly_the_connected_region() {
    proptest!(|(difficulty in difficulty(), seed in any::<u64>(), row in 0usize..16, col in 0usize..30)| {
        let (engine, click, outcome) = first_click(difficulty, seed, row, col);
        let coords = revealed_coords(&outcome);
        let reported: BTreeSet<_> = coords.iter().copied().collect();

        // PROPERTY: each cell is reported once
        prop_assert_eq!(reported.len(), coords.len());

        // PROPERTY: nothing outside the zero region and its border is opened
        prop_assert_eq!(&reported, &expected_region(engine.board(), click));

        // PROPERTY: the board agrees with the report
        let on_board: BTreeSet<_> = engine
            .board()
            .iter()
            .filter(|(_, cell)| cell.revealed)
            .map(|(coords, _)| coords)
            .collect();
        prop_assert_eq!(on_board, reported);
    });
}

#[test]
fn prop_flags_bound_the_flood_fill() {
    proptest!(|(seed in any::<u64>(), flag_row in 0usize..9, flag_col in 0usize..9)| {
        let mut engine = BoardEngine::with_seed(Difficulty::Beginner, seed);
        prop_assume!(flag_row.abs_diff(4) > 1 || flag_col.abs_diff(4) > 1);
        engine.toggle_flag(flag_row, flag_col, BOB).expect("flag applies");

        let outcome = engine.reveal_cell(4, 4, ALICE).expect("first reveal applies");

        // PROPERTY: a flagged cell is never opened by the fill
        prop_assert!(!revealed_coords(&outcome).contains(&(flag_row, flag_col)));
        prop_assert!(engine.cell(flag_row, flag_col).expect("in bounds").flagged);
    });
}

#[test]
fn prop_same_seed_same_outcomes() {
    proptest!(|(
        difficulty in difficulty(),
        seed in any::<u64>(),
        clicks in prop::collection::vec((0usize..16, 0usize..30), 1..20),
    )| {
        let mut outcomes = Vec::new();

        for _ in 0..2 {
            let mut engine = BoardEngine::with_seed(difficulty, seed);
            let mut run = Vec::new();
            for &(row, col) in &clicks {
                run.push(engine.reveal_cell(row % engine.rows(), col % engine.cols(), BOB));
            }
            outcomes.push((run, engine.board().clone()));
        }

        // PROPERTY: determinism, same seed and clicks give the same game
        prop_assert_eq!(&outcomes[0], &outcomes[1]);
    });
}

#[test]
fn prop_revealing_every_safe_cell_wins_once() {
    proptest!(|(seed in any::<u64>(), row in 0usize..9, col in 0usize..9)| {
        let (mut engine, _, first) = first_click(Difficulty::Beginner, seed, row, col);

        let safe: Vec<(usize, usize)> = engine
            .board()
            .iter()
            .filter(|(_, cell)| !cell.mine)
            .map(|(coords, _)| coords)
            .collect();

        let mut wins = usize::from(first.won);
        for (r, c) in safe {
            if let Some(outcome) = engine.reveal_cell(r, c, BOB) {
                wins += usize::from(outcome.won);
            }
        }

        // PROPERTY: the game is won exactly once, on the last safe cell
        prop_assert_eq!(wins, 1);
        prop_assert!(engine.is_won());
        prop_assert_eq!(engine.total_revealed(), 81 - 10);

        // PROPERTY: nothing applies after the win
        prop_assert!(engine.reveal_cell(0, 0, ALICE).is_none());
        prop_assert!(engine.toggle_flag(0, 0, ALICE).is_none());
    });
}

#[test]
fn beginner_first_reveal_at_center() {
    let mut engine = BoardEngine::with_seed(Difficulty::Beginner, 2024);

    let outcome = engine.reveal_cell(4, 4, ALICE).expect("first reveal applies");

    assert_eq!(engine.board().mine_count(), 10);
    for r in 3..=5 {
        for c in 3..=5 {
            assert!(!engine.cell(r, c).expect("in bounds").mine);
        }
    }
    let reported: BTreeSet<_> = revealed_coords(&outcome).into_iter().collect();
    assert_eq!(reported, expected_region(engine.board(), (4, 4)));
    assert_eq!(reported.len(), outcome.cells.len());
    assert!(reported.len() >= 9);
    assert!(outcome.cells.iter().all(|(_, _, cell)| cell.last_revealed_by == Some(ALICE)));
}

#[test]
fn flag_then_reveal_is_noop() {
    let mut engine = BoardEngine::with_seed(Difficulty::Beginner, 5);

    let flag = engine.toggle_flag(2, 3, ALICE).expect("flag applies");
    assert!(flag.flagged);

    assert!(engine.reveal_cell(2, 3, BOB).is_none());
    assert_eq!(engine.total_revealed(), 0);
    assert!(!engine.mines_placed());
    assert!(engine.cell(2, 3).expect("in bounds").flagged);

    // Unflagging makes the cell revealable again.
    engine.toggle_flag(2, 3, BOB).expect("unflag applies");
    assert!(engine.reveal_cell(2, 3, BOB).is_some());
}
