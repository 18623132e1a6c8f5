//! Board error types.

use thiserror::Error;

/// Errors from constructing a board.
///
/// Gameplay never returns errors: invalid reveals and flags are ignored.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// The grid has no cells.
    #[error("board must have at least one row and one column, got {rows}x{cols}")]
    EmptyBoard {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },

    /// At least one cell must stay free of mines.
    #[error("too many mines: {mines} on a board of {cells} cells")]
    TooManyMines {
        /// Requested mines.
        mines: usize,
        /// Cells on the board.
        cells: usize,
    },

    /// A fixed mine position lies outside the board.
    #[error("mine position ({row}, {col}) is out of bounds")]
    OutOfBounds {
        /// Row of the rejected position.
        row: usize,
        /// Column of the rejected position.
        col: usize,
    },
}
