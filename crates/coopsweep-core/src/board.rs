//! Cell grid and neighbour iteration.

use coopsweep_proto::{CellView, PlayerId};

/// State of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    /// Whether the cell holds a mine.
    pub mine: bool,
    /// Whether the cell has been revealed.
    pub revealed: bool,
    /// Whether the cell carries a flag.
    pub flagged: bool,
    /// Adjacent mines; fixed once mines are placed.
    pub count: u8,
    /// Player whose action revealed the cell.
    pub last_revealed_by: Option<PlayerId>,
}

impl Cell {
    /// Wire view of this cell.
    ///
    /// Unless `disclose` is set, an unrevealed cell hides its mine bit and
    /// count.
    pub fn view(&self, disclose: bool) -> CellView {
        let visible = disclose || self.revealed;
        CellView {
            mine: visible && self.mine,
            revealed: self.revealed,
            flagged: self.flagged,
            count: if visible { self.count } else { 0 },
            last_revealed_by: self.last_revealed_by,
        }
    }
}

/// Row-major grid of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// All-hidden, mine-free board.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols, cells: vec![Cell::default(); rows * cols] }
    }

    /// Number of rows.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Whether `(row, col)` lies on the board.
    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Cell at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        if self.contains(row, col) { self.cells.get(row * self.cols + col) } else { None }
    }

    pub(crate) fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        if self.contains(row, col) { self.cells.get_mut(row * self.cols + col) } else { None }
    }

    /// In-bounds neighbours of `(row, col)`, up to 8.
    pub fn neighbors(&self, row: usize, col: usize) -> Neighbors {
        Neighbors::new((row, col), (self.rows, self.cols))
    }

    /// Number of mines on the board.
    pub fn mine_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.mine).count()
    }

    /// Number of flagged cells.
    pub fn flag_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.flagged).count()
    }

    /// Every cell with its coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &Cell)> {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(i, cell)| ((i / cols, i % cols), cell))
    }

    /// Count mine neighbours for every non-mine cell.
    pub(crate) fn compute_counts(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let count = self
                    .neighbors(row, col)
                    .filter(|&(r, c)| self.get(r, c).is_some_and(|cell| cell.mine))
                    .count();
                if let Some(cell) = self.get_mut(row, col)
                    && !cell.mine
                {
                    cell.count = u8::try_from(count).unwrap_or(u8::MAX);
                }
            }
        }
    }

    /// Rows of wire cell views.
    pub fn view(&self, disclose: bool) -> Vec<Vec<CellView>> {
        self.cells
            .chunks(self.cols.max(1))
            .map(|row| row.iter().map(|c| c.view(disclose)).collect())
            .collect()
    }
}

const DISPLACEMENTS: [(isize, isize); 8] =
    [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(
    coords: (usize, usize),
    delta: (isize, isize),
    bounds: (usize, usize),
) -> Option<(usize, usize)> {
    let row = coords.0.checked_add_signed(delta.0)?;
    let col = coords.1.checked_add_signed(delta.1)?;
    (row < bounds.0 && col < bounds.1).then_some((row, col))
}

/// Iterator over the in-bounds neighbours of a cell.
#[derive(Debug)]
pub struct Neighbors {
    center: (usize, usize),
    bounds: (usize, usize),
    index: usize,
}

impl Neighbors {
    const fn new(center: (usize, usize), bounds: (usize, usize)) -> Self {
        Self { center, bounds, index: 0 }
    }
}

impl Iterator for Neighbors {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&delta) = DISPLACEMENTS.get(self.index) {
            self.index += 1;
            if let Some(next) = apply_delta(self.center, delta, self.bounds) {
                return Some(next);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_has_three_neighbors() {
        let board = Board::new(3, 3);
        let mut neighbors: Vec<_> = board.neighbors(0, 0).collect();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn center_has_eight_neighbors() {
        assert_eq!(Board::new(3, 3).neighbors(1, 1).count(), 8);
    }

    #[test]
    fn single_cell_board_has_no_neighbors() {
        assert_eq!(Board::new(1, 1).neighbors(0, 0).count(), 0);
    }

    #[test]
    fn out_of_bounds_lookup_is_none() {
        let board = Board::new(2, 3);
        assert!(board.get(1, 2).is_some());
        assert!(board.get(2, 0).is_none());
        assert!(board.get(0, 3).is_none());
    }

    #[test]
    fn counts_skip_mines() {
        let mut board = Board::new(2, 2);
        if let Some(cell) = board.get_mut(0, 0) {
            cell.mine = true;
        }
        board.compute_counts();
        assert_eq!(board.get(0, 0).map(|c| c.count), Some(0));
        assert_eq!(board.get(1, 1).map(|c| c.count), Some(1));
    }

    #[test]
    fn hidden_view_conceals_mine_and_count() {
        let cell = Cell { mine: true, count: 3, ..Cell::default() };
        let hidden = cell.view(false);
        assert!(!hidden.mine);
        assert_eq!(hidden.count, 0);
        assert!(cell.view(true).mine);
    }
}
