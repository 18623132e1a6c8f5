//! Board payload types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// Difficulty preset chosen by the host when starting a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// 9×9, 10 mines.
    #[default]
    Beginner,
    /// 16×16, 40 mines.
    Intermediate,
    /// 16×30, 99 mines.
    Expert,
}

impl Difficulty {
    /// `(rows, cols, mines)` for this preset.
    pub const fn dimensions(self) -> (usize, usize, usize) {
        match self {
            Self::Beginner => (9, 9, 10),
            Self::Intermediate => (16, 16, 40),
            Self::Expert => (16, 30, 99),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        })
    }
}

/// Wire form of a single cell.
///
/// Snapshots of a game in progress zero out `mine` and `count` on cells that
/// are not yet revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    /// Whether the cell holds a mine.
    pub mine: bool,
    /// Whether the cell has been revealed.
    pub revealed: bool,
    /// Whether the cell carries a flag.
    pub flagged: bool,
    /// Number of adjacent mines (0..=8).
    pub count: u8,
    /// Player whose action revealed the cell.
    pub last_revealed_by: Option<PlayerId>,
}

/// A cell revealed by a single action, with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCell {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
    /// Cell state after the reveal.
    pub cell: CellView,
}

/// Board dimensions announced when a game starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDimensions {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Number of mines.
    pub mines: usize,
}

/// Snapshot of the current game.
///
/// `board` is only present in full snapshots; roster-only updates carry the
/// dimensions and progress so clients can tell whether a game exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Preset the game was started with; absent for custom layouts.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub difficulty: Option<Difficulty>,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Number of mines.
    pub mines: usize,
    /// Cells revealed so far.
    pub total_revealed: usize,
    /// Whether the game has ended.
    pub game_over: bool,
    /// Row-major board, one `Vec` per row.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub board: Option<Vec<Vec<CellView>>>,
}
