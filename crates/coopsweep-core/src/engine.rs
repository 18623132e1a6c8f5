//! Board engine.
//!
//! Owns one board for the lifetime of a game. Mines are placed lazily on
//! the first reveal so the first click (and, when the board allows it, its
//! 3×3 neighbourhood) is always safe.
//!
//! Reveal and flag are infallible: actions that cannot apply (game over,
//! flagged target, revealed target, out-of-range coordinates) return `None`
//! and leave the board untouched.

use coopsweep_proto::{Difficulty, GameSnapshot, PlayerId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{Board, BoardConfig, BoardError, Cell};

/// Cells revealed by one `reveal_cell` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealOutcome {
    /// Newly revealed cells, in reveal order.
    pub cells: Vec<(usize, usize, Cell)>,
    /// `true` if this call revealed the last safe cell.
    pub won: bool,
}

/// New flag state after `toggle_flag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagOutcome {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
    /// Whether the cell is now flagged.
    pub flagged: bool,
}

/// Authoritative state of one game.
#[derive(Debug, Clone)]
pub struct BoardEngine {
    config: BoardConfig,
    difficulty: Option<Difficulty>,
    board: Board,
    total_revealed: usize,
    game_over: bool,
    won: bool,
    mines_placed: bool,
    rng: ChaCha8Rng,
}

impl BoardEngine {
    /// New game for a preset, seeded from OS entropy.
    pub fn new(difficulty: Difficulty) -> Self {
        Self::build(difficulty.into(), Some(difficulty), ChaCha8Rng::from_entropy())
    }

    /// New game for a preset with a fixed seed.
    ///
    /// The same seed and the same first click always produce the same layout.
    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Self::build(difficulty.into(), Some(difficulty), ChaCha8Rng::seed_from_u64(seed))
    }

    /// New game on a custom board with a fixed seed.
    pub fn from_config(config: BoardConfig, seed: u64) -> Self {
        Self::build(config, None, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Game with mines at fixed positions.
    ///
    /// Counts are computed immediately and the first reveal does not move any
    /// mine. Duplicate positions collapse into one mine.
    pub fn from_mine_positions(
        rows: usize,
        cols: usize,
        mines: &[(usize, usize)],
    ) -> Result<Self, BoardError> {
        let mut board = Board::new(rows, cols);
        for &(row, col) in mines {
            let cell = board.get_mut(row, col).ok_or(BoardError::OutOfBounds { row, col })?;
            cell.mine = true;
        }
        let config = BoardConfig::new(rows, cols, board.mine_count())?;
        board.compute_counts();

        let mut engine = Self::build(config, None, ChaCha8Rng::seed_from_u64(0));
        engine.board = board;
        engine.mines_placed = true;
        Ok(engine)
    }

    fn build(config: BoardConfig, difficulty: Option<Difficulty>, rng: ChaCha8Rng) -> Self {
        Self {
            config,
            difficulty,
            board: Board::new(config.rows(), config.cols()),
            total_revealed: 0,
            game_over: false,
            won: false,
            mines_placed: false,
            rng,
        }
    }

    /// Number of rows.
    pub const fn rows(&self) -> usize {
        self.config.rows()
    }

    /// Number of columns.
    pub const fn cols(&self) -> usize {
        self.config.cols()
    }

    /// Number of mines.
    pub const fn mine_count(&self) -> usize {
        self.config.mines()
    }

    /// Preset this game was created from, if any.
    pub const fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Cells revealed so far, including a detonated mine.
    pub const fn total_revealed(&self) -> usize {
        self.total_revealed
    }

    /// Whether the game has ended (won or lost).
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Whether the game ended in a win.
    pub const fn is_won(&self) -> bool {
        self.won
    }

    /// Whether mines have been laid out yet.
    pub const fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    /// Number of flagged cells.
    pub fn flag_count(&self) -> usize {
        self.board.flag_count()
    }

    /// Cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.board.get(row, col)
    }

    /// Read-only access to the grid.
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Reveal a cell on behalf of `player`.
    ///
    /// Returns `None` when nothing changes: the game is over, the target is
    /// flagged or already revealed, or the coordinates are off the board.
    pub fn reveal_cell(&mut self, row: usize, col: usize, player: PlayerId) -> Option<RevealOutcome> {
        if self.game_over {
            return None;
        }
        let target = self.board.get(row, col)?;
        if target.flagged || target.revealed {
            return None;
        }

        if !self.mines_placed {
            self.place_mines(row, col);
        }

        let mut cells = Vec::new();
        let mut hit_mine = false;
        let mut stack = vec![(row, col)];

        while let Some((r, c)) = stack.pop() {
            let Some(cell) = self.board.get_mut(r, c) else { continue };
            if cell.revealed || cell.flagged {
                continue;
            }

            cell.revealed = true;
            cell.last_revealed_by = Some(player);
            let revealed = *cell;
            self.total_revealed += 1;
            cells.push((r, c, revealed));

            if revealed.mine {
                hit_mine = true;
                self.game_over = true;
                continue;
            }
            if revealed.count == 0 {
                stack.extend(self.board.neighbors(r, c));
            }
        }

        let won = !hit_mine && self.total_revealed == self.config.safe_cells();
        if won {
            self.game_over = true;
            self.won = true;
        }

        tracing::trace!(row, col, %player, revealed = cells.len(), hit_mine, won, "reveal");
        Some(RevealOutcome { cells, won })
    }

    /// Flip the flag on a hidden cell.
    ///
    /// Returns `None` when the game is over, the cell is revealed, or the
    /// coordinates are off the board.
    pub fn toggle_flag(&mut self, row: usize, col: usize, player: PlayerId) -> Option<FlagOutcome> {
        if self.game_over {
            return None;
        }
        let cell = self.board.get_mut(row, col)?;
        if cell.revealed {
            return None;
        }
        cell.flagged = !cell.flagged;
        let flagged = cell.flagged;

        tracing::trace!(row, col, %player, flagged, "toggle flag");
        Some(FlagOutcome { row, col, flagged })
    }

    /// Wire snapshot of this game.
    ///
    /// With `with_board`, the grid is included; hidden cells are only
    /// disclosed once the game is over.
    pub fn snapshot(&self, with_board: bool) -> GameSnapshot {
        GameSnapshot {
            difficulty: self.difficulty,
            rows: self.rows(),
            cols: self.cols(),
            mines: self.mine_count(),
            total_revealed: self.total_revealed,
            game_over: self.game_over,
            board: with_board.then(|| self.board.view(self.game_over)),
        }
    }

    /// Lay out mines by rejection sampling, keeping the first click and its
    /// neighbourhood clear.
    ///
    /// If the board is too dense for a 3×3 clear zone, only the clicked cell
    /// is kept clear. `BoardConfig` guarantees at least one safe cell, so the
    /// loop always terminates.
    fn place_mines(&mut self, first_row: usize, first_col: usize) {
        let rows = self.rows();
        let cols = self.cols();
        let mines = self.mine_count();

        let zone = self.board.neighbors(first_row, first_col).count() + 1;
        let keep_zone = self.config.total_cells() - zone >= mines;
        if !keep_zone {
            tracing::warn!(
                rows,
                cols,
                mines,
                "board too dense for a clear first-click zone, only the clicked cell is safe"
            );
        }

        let mut placed = 0;
        while placed < mines {
            let row = self.rng.gen_range(0..rows);
            let col = self.rng.gen_range(0..cols);

            let excluded = if keep_zone {
                row.abs_diff(first_row) <= 1 && col.abs_diff(first_col) <= 1
            } else {
                row == first_row && col == first_col
            };
            if excluded {
                continue;
            }

            if let Some(cell) = self.board.get_mut(row, col)
                && !cell.mine
            {
                cell.mine = true;
                placed += 1;
            }
        }

        self.board.compute_counts();
        self.mines_placed = true;
        tracing::debug!(rows, cols, mines, first_row, first_col, "mines placed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    fn layout(rows: usize, cols: usize, mines: &[(usize, usize)]) -> BoardEngine {
        BoardEngine::from_mine_positions(rows, cols, mines).unwrap()
    }

    fn coords(outcome: &RevealOutcome) -> Vec<(usize, usize)> {
        let mut coords: Vec<_> = outcome.cells.iter().map(|&(r, c, _)| (r, c)).collect();
        coords.sort_unstable();
        coords
    }

    #[test]
    fn new_engine_is_empty_and_unfinished() {
        let engine = BoardEngine::new(Difficulty::Intermediate);
        assert_eq!((engine.rows(), engine.cols(), engine.mine_count()), (16, 16, 40));
        assert_eq!(engine.total_revealed(), 0);
        assert!(!engine.is_game_over());
        assert!(!engine.mines_placed());
        assert_eq!(engine.board().mine_count(), 0);
    }

    #[test]
    fn reveal_hits_mine_and_ends_game() {
        let mut engine = layout(2, 2, &[(0, 0)]);

        let outcome = engine.reveal_cell(0, 0, P1).unwrap();

        assert_eq!(coords(&outcome), vec![(0, 0)]);
        assert!(!outcome.won);
        assert!(engine.is_game_over());
        assert!(!engine.is_won());
        // Only the detonated mine is disclosed.
        assert!(!engine.cell(1, 1).unwrap().revealed);
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region() {
        let mut engine = layout(3, 3, &[(2, 2)]);

        let outcome = engine.reveal_cell(0, 0, P1).unwrap();

        assert!(outcome.won);
        assert_eq!(outcome.cells.len(), 8);
        assert_eq!(engine.cell(0, 0).unwrap().count, 0);
        assert_eq!(engine.cell(1, 1).unwrap().count, 1);
        assert!(!engine.cell(2, 2).unwrap().revealed);
    }

    #[test]
    fn flood_fill_stops_at_numbered_border() {
        // Column 2 is a wall of mines; columns 0-1 form the open region.
        let mut engine = layout(3, 5, &[(0, 2), (1, 2), (2, 2)]);

        let outcome = engine.reveal_cell(1, 0, P1).unwrap();

        let expected = vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)];
        assert_eq!(coords(&outcome), expected);
        assert!(!outcome.won);
        assert!(!engine.cell(0, 3).unwrap().revealed);
    }

    #[test]
    fn flood_fill_treats_flags_as_boundary() {
        let mut engine = layout(1, 4, &[(0, 3)]);
        engine.toggle_flag(0, 1, P2).unwrap();

        let outcome = engine.reveal_cell(0, 0, P1).unwrap();

        assert_eq!(coords(&outcome), vec![(0, 0)]);
        assert!(engine.cell(0, 1).unwrap().flagged);
        assert!(!engine.cell(0, 2).unwrap().revealed);
    }

    #[test]
    fn reveal_stamps_acting_player() {
        let mut engine = layout(1, 3, &[(0, 2)]);
        let outcome = engine.reveal_cell(0, 0, P2).unwrap();
        assert!(outcome.cells.iter().all(|(_, _, cell)| cell.last_revealed_by == Some(P2)));
    }

    #[test]
    fn reveal_on_flagged_cell_is_noop() {
        let mut engine = layout(2, 2, &[(1, 1)]);
        engine.toggle_flag(0, 0, P1).unwrap();

        assert!(engine.reveal_cell(0, 0, P1).is_none());
        assert!(engine.cell(0, 0).unwrap().flagged);
        assert_eq!(engine.total_revealed(), 0);
    }

    #[test]
    fn reveal_on_revealed_cell_is_noop() {
        let mut engine = layout(2, 3, &[(1, 2)]);
        engine.reveal_cell(0, 0, P1).unwrap();
        assert!(engine.reveal_cell(0, 0, P1).is_none());
    }

    #[test]
    fn out_of_range_actions_are_noops() {
        let mut engine = BoardEngine::with_seed(Difficulty::Beginner, 7);
        assert!(engine.reveal_cell(9, 0, P1).is_none());
        assert!(engine.toggle_flag(0, 9, P1).is_none());
        assert!(!engine.mines_placed());
    }

    #[test]
    fn winning_blocks_further_moves() {
        let mut engine = layout(2, 1, &[(0, 0)]);

        let outcome = engine.reveal_cell(1, 0, P1).unwrap();

        assert!(outcome.won);
        assert!(engine.is_won());
        assert!(engine.reveal_cell(0, 0, P1).is_none());
        assert!(engine.toggle_flag(0, 0, P1).is_none());
    }

    #[test]
    fn toggle_flag_flips_and_reports() {
        let mut engine = layout(2, 2, &[(1, 1)]);

        assert_eq!(engine.toggle_flag(1, 1, P1), Some(FlagOutcome { row: 1, col: 1, flagged: true }));
        assert_eq!(engine.flag_count(), 1);
        assert_eq!(engine.toggle_flag(1, 1, P2), Some(FlagOutcome { row: 1, col: 1, flagged: false }));
        assert_eq!(engine.flag_count(), 0);
    }

    #[test]
    fn toggle_flag_on_revealed_cell_is_noop() {
        let mut engine = layout(2, 3, &[(1, 2)]);
        engine.reveal_cell(0, 0, P1).unwrap();
        assert!(engine.toggle_flag(0, 0, P1).is_none());
    }

    #[test]
    fn first_reveal_places_mines_away_from_click() {
        let mut engine = BoardEngine::with_seed(Difficulty::Beginner, 42);

        let outcome = engine.reveal_cell(4, 4, P1).unwrap();

        assert_eq!(engine.board().mine_count(), 10);
        for row in 3..=5 {
            for col in 3..=5 {
                assert!(!engine.cell(row, col).unwrap().mine, "mine at ({row}, {col})");
            }
        }
        assert_eq!(engine.cell(4, 4).unwrap().count, 0);
        assert!(coords(&outcome).contains(&(4, 4)));
    }

    #[test]
    fn same_seed_same_layout() {
        let mut a = BoardEngine::with_seed(Difficulty::Expert, 99);
        let mut b = BoardEngine::with_seed(Difficulty::Expert, 99);
        a.reveal_cell(0, 0, P1);
        b.reveal_cell(0, 0, P1);
        assert_eq!(a.board(), b.board());
    }

    #[test]
    fn dense_board_falls_back_to_safe_click_only() {
        // 3x3 with 8 mines: no room for a clear zone.
        let config = BoardConfig::new(3, 3, 8).unwrap();
        let mut engine = BoardEngine::from_config(config, 1);

        let outcome = engine.reveal_cell(1, 1, P1).unwrap();

        assert_eq!(engine.board().mine_count(), 8);
        assert!(!engine.cell(1, 1).unwrap().mine);
        assert!(outcome.won);
    }

    #[test]
    fn snapshot_hides_unrevealed_until_game_over() {
        let mut engine = layout(2, 3, &[(1, 2)]);
        engine.reveal_cell(0, 0, P1).unwrap();

        let board = engine.snapshot(true).board.unwrap();
        assert!(!engine.is_game_over());
        assert!(!board[1][2].mine);
        assert_eq!(board[1][2].count, 0);

        engine.reveal_cell(1, 2, P1).unwrap();
        let board = engine.snapshot(true).board.unwrap();
        assert!(board[1][2].mine);
        assert!(board[0][2].count > 0);
        assert!(engine.snapshot(false).board.is_none());
    }

    #[test]
    fn from_mine_positions_rejects_out_of_bounds() {
        let result = BoardEngine::from_mine_positions(2, 2, &[(2, 0)]);
        assert_eq!(result.err(), Some(BoardError::OutOfBounds { row: 2, col: 0 }));
    }
}
