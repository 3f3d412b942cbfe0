use std::{cell::OnceCell, iter};

use stackplan_engine::BitBoard;

/// Board metrics shared by the features, each computed on first use.
#[derive(Debug)]
pub struct BoardAnalysis {
    board: BitBoard,
    column_heights: OnceCell<[u8; BitBoard::PLAYABLE_WIDTH]>,
    column_occupied_cells: OnceCell<[u8; BitBoard::PLAYABLE_WIDTH]>,
    num_holes: OnceCell<u32>,
    empty_top_rows: OnceCell<u32>,
    surface_changes: OnceCell<u32>,
    bottom_stack: OnceCell<BottomStack>,
}

/// Occupied cells of the contiguous non-empty rows at the bottom of the board.
#[derive(Debug, Clone, Copy, Default)]
struct BottomStack {
    cells: u32,
    // sum of the row index (0 = bottom row) of every counted cell
    height_sum: u32,
}

impl BoardAnalysis {
    #[must_use]
    pub fn from_board(board: &BitBoard) -> Self {
        Self {
            board: board.clone(),
            column_heights: OnceCell::new(),
            column_occupied_cells: OnceCell::new(),
            num_holes: OnceCell::new(),
            empty_top_rows: OnceCell::new(),
            surface_changes: OnceCell::new(),
            bottom_stack: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &BitBoard {
        &self.board
    }

    /// Height of every playable column, measured from the bottom to its topmost
    /// occupied cell. Empty columns have height 0.
    #[must_use]
    pub fn column_heights(&self) -> &[u8; BitBoard::PLAYABLE_WIDTH] {
        self.column_heights.get_or_init(|| {
            let mut column_heights = [0; BitBoard::PLAYABLE_WIDTH];
            for (x, h) in iter::zip(BitBoard::PLAYABLE_X_RANGE, &mut column_heights) {
                let top = self
                    .board
                    .playable_rows()
                    .position(|row| row.is_cell_occupied(x));
                if let Some(top) = top {
                    *h = u8::try_from(BitBoard::PLAYABLE_HEIGHT - top).unwrap_or(u8::MAX);
                }
            }
            column_heights
        })
    }

    #[must_use]
    pub fn column_occupied_cells(&self) -> &[u8; BitBoard::PLAYABLE_WIDTH] {
        self.column_occupied_cells.get_or_init(|| {
            let mut column_occupied_cells = [0; BitBoard::PLAYABLE_WIDTH];
            for (x, o) in iter::zip(BitBoard::PLAYABLE_X_RANGE, &mut column_occupied_cells) {
                for row in self.board.playable_rows() {
                    if row.is_cell_occupied(x) {
                        *o += 1;
                    }
                }
            }
            column_occupied_cells
        })
    }

    /// Empty cells with at least one occupied cell above them in the same column.
    #[must_use]
    pub fn num_holes(&self) -> u32 {
        *self.num_holes.get_or_init(|| {
            iter::zip(self.column_heights(), self.column_occupied_cells())
                .map(|(h, occ)| u32::from(h - occ))
                .sum()
        })
    }

    /// Rows above the topmost occupied cell.
    #[must_use]
    pub fn empty_top_rows(&self) -> u32 {
        *self.empty_top_rows.get_or_init(|| {
            let empty = self
                .board
                .playable_rows()
                .take_while(|row| row.is_playable_empty())
                .count();
            u32::try_from(empty).unwrap_or(u32::MAX)
        })
    }

    /// Number of adjacent column pairs whose heights differ.
    #[must_use]
    pub fn surface_changes(&self) -> u32 {
        *self.surface_changes.get_or_init(|| {
            let changes = self
                .column_heights()
                .windows(2)
                .filter(|w| w[0] != w[1])
                .count();
            u32::try_from(changes).unwrap_or(u32::MAX)
        })
    }

    /// Mean row index (0 = bottom row) of the cells in the contiguous non-empty bottom
    /// rows, or `None` when the bottom row is empty.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn bottom_stack_mean_height(&self) -> Option<f32> {
        let stack = self.bottom_stack.get_or_init(|| {
            let mut stack = BottomStack::default();
            for (index, row) in iter::zip(0.., self.board.playable_rows().rev()) {
                let cells = row.playable_occupied_count();
                if cells == 0 {
                    break;
                }
                stack.cells += cells;
                stack.height_sum += index * cells;
            }
            stack
        });
        (stack.cells > 0).then(|| stack.height_sum as f32 / stack.cells as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board() {
        let analysis = BoardAnalysis::from_board(&BitBoard::INITIAL);
        assert_eq!(analysis.column_heights(), &[0; BitBoard::PLAYABLE_WIDTH]);
        assert_eq!(analysis.num_holes(), 0);
        assert_eq!(analysis.empty_top_rows(), 20);
        assert_eq!(analysis.surface_changes(), 0);
        assert_eq!(analysis.bottom_stack_mean_height(), None);
    }

    #[test]
    fn test_heights_and_holes() {
        let board = BitBoard::from_ascii(
            r"
            .#........
            ...#......
            .#.#......
            ##.##.....
            ",
        );
        let analysis = BoardAnalysis::from_board(&board);
        assert_eq!(
            analysis.column_heights(),
            &[1, 4, 0, 3, 1, 0, 0, 0, 0, 0]
        );
        // column 1 has one hole, column 3 none
        assert_eq!(analysis.num_holes(), 1);
        assert_eq!(analysis.empty_top_rows(), 16);
        assert_eq!(analysis.surface_changes(), 5);
    }

    #[test]
    fn test_bottom_stack_stops_at_empty_row() {
        let board = BitBoard::from_ascii(
            r"
            ##########
            ..........
            #.........
            ###.......
            ",
        );
        let analysis = BoardAnalysis::from_board(&board);
        // 3 cells at index 0 and 1 cell at index 1; the floating row is ignored
        let mean = analysis.bottom_stack_mean_height().unwrap();
        assert!((mean - 0.25).abs() < f32::EPSILON);
    }
}
