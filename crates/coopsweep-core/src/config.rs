use coopsweep_proto::Difficulty;

use crate::BoardError;

/// Board geometry and mine count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    rows: usize,
    cols: usize,
    mines: usize,
}

impl BoardConfig {
    /// Validate and build a config.
    ///
    /// At least one cell must remain safe so the first click can never be
    /// a mine.
    pub fn new(rows: usize, cols: usize, mines: usize) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::EmptyBoard { rows, cols });
        }
        let cells = rows.saturating_mul(cols);
        if mines >= cells {
            return Err(BoardError::TooManyMines { mines, cells });
        }
        Ok(Self { rows, cols, mines })
    }

    /// Number of rows.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of mines.
    pub const fn mines(&self) -> usize {
        self.mines
    }

    /// Total number of cells.
    pub const fn total_cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Number of cells that must be revealed to win.
    pub const fn safe_cells(&self) -> usize {
        self.total_cells() - self.mines
    }
}

impl From<Difficulty> for BoardConfig {
    fn from(difficulty: Difficulty) -> Self {
        let (rows, cols, mines) = difficulty.dimensions();
        Self { rows, cols, mines }
    }
}
