use std::{fmt::Write, ops::Range};

use serde::{Deserialize, Serialize};

use crate::core::piece::Piece;

use super::{
    PLAYABLE_HEIGHT, PLAYABLE_WIDTH, SENTINEL_MARGIN_LEFT, SENTINEL_MARGIN_TOP, TOTAL_HEIGHT,
    TOTAL_WIDTH,
};

pub(super) const PIECE_SPAWN_X: usize = 5;
pub(super) const PIECE_SPAWN_Y: usize = 0;

// Left wall: bits 0-1, right wall: bits 12-13
const LEFT_SENTINEL_MASK: u16 = 0b11;
const RIGHT_SENTINEL_MASK: u16 = 0b11 << (SENTINEL_MARGIN_LEFT + PLAYABLE_WIDTH);
const SENTINEL_MASK: u16 = LEFT_SENTINEL_MASK | RIGHT_SENTINEL_MASK;
const FULL_ROW_MASK: u16 = (1 << TOTAL_WIDTH) - 1;
const PLAYABLE_MASK: u16 = FULL_ROW_MASK & !SENTINEL_MASK;

/// One board row stored as a 16-bit mask, bit `x` is column `x` of the total width.
///
/// Wall bits are always set so that a piece mask shifted onto a wall collides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRow {
    bits: u16,
}

impl BitRow {
    pub const EMPTY: Self = Self {
        bits: SENTINEL_MASK,
    };
    pub const FULL_SENTINEL: Self = Self {
        bits: FULL_ROW_MASK,
    };

    #[inline]
    #[must_use]
    pub fn is_playable_filled(self) -> bool {
        (self.bits & PLAYABLE_MASK) == PLAYABLE_MASK
    }

    #[inline]
    #[must_use]
    pub fn is_playable_empty(self) -> bool {
        (self.bits & PLAYABLE_MASK) == 0
    }

    /// Number of occupied cells inside the playable area.
    #[inline]
    #[must_use]
    pub fn playable_occupied_count(self) -> u32 {
        (self.bits & PLAYABLE_MASK).count_ones()
    }

    /// Checks a cell by its total-width x coordinate (walls included).
    #[inline]
    #[must_use]
    pub fn is_cell_occupied(self, x: usize) -> bool {
        (self.bits & (1 << x)) != 0
    }

    #[inline]
    fn is_any_cell_occupied(self, x0: usize, mask: u16) -> bool {
        (self.bits & (mask << x0)) != 0
    }

    #[inline]
    fn occupy_cells(&mut self, x0: usize, mask: u16) {
        self.bits |= mask << x0;
    }

    /// Occupied status of the playable cells, left to right.
    #[inline]
    pub fn iter_playable_cells(self) -> impl Iterator<Item = bool> {
        BitBoard::PLAYABLE_X_RANGE.map(move |x| self.is_cell_occupied(x))
    }
}

/// Settled cells of the board, used for collision detection and line clearing.
///
/// The playable 10×20 area is surrounded by 2-cell sentinel margins. Pieces are
/// positioned by the top-left corner of a 4×4 bounding box, and the I piece has two
/// empty columns on one side of its vertical orientation, so two wall columns are
/// needed for it to reach the outermost playable columns. The two top margin rows
/// are open (pieces spawn there), the two bottom rows are solid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBoard {
    rows: [BitRow; TOTAL_HEIGHT],
}

impl Serialize for BitBoard {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // "3003,3003,...,3fff": one 4-digit hex value per row, top to bottom
        let mut hex = String::with_capacity(TOTAL_HEIGHT * 5);
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                hex.push(',');
            }
            write!(&mut hex, "{:04x}", row.bits).unwrap();
        }
        serializer.serialize_str(&hex)
    }
}

impl<'de> Deserialize<'de> for BitBoard {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != TOTAL_HEIGHT {
            return Err(serde::de::Error::custom(format!(
                "expected {TOTAL_HEIGHT} comma-separated hex rows, got {}",
                parts.len()
            )));
        }

        let mut rows = [BitRow::EMPTY; TOTAL_HEIGHT];
        for (row, hex) in rows.iter_mut().zip(parts) {
            let bits = u16::from_str_radix(hex, 16).map_err(|e| {
                serde::de::Error::custom(format!("invalid hex row: {hex} ({e})"))
            })?;
            if bits & SENTINEL_MASK != SENTINEL_MASK {
                return Err(serde::de::Error::custom(format!(
                    "row {hex} is missing sentinel walls"
                )));
            }
            *row = BitRow { bits };
        }
        Ok(Self { rows })
    }
}

impl BitBoard {
    pub const TOTAL_WIDTH: usize = TOTAL_WIDTH;
    pub const TOTAL_HEIGHT: usize = TOTAL_HEIGHT;
    pub const PLAYABLE_WIDTH: usize = PLAYABLE_WIDTH;
    pub const PLAYABLE_HEIGHT: usize = PLAYABLE_HEIGHT;
    pub const PLAYABLE_X_RANGE: Range<usize> =
        SENTINEL_MARGIN_LEFT..(SENTINEL_MARGIN_LEFT + PLAYABLE_WIDTH);
    pub const PLAYABLE_Y_RANGE: Range<usize> =
        SENTINEL_MARGIN_TOP..(SENTINEL_MARGIN_TOP + PLAYABLE_HEIGHT);

    pub const INITIAL: Self = {
        let mut rows = [BitRow::EMPTY; TOTAL_HEIGHT];
        let mut y = SENTINEL_MARGIN_TOP + PLAYABLE_HEIGHT;
        while y < TOTAL_HEIGHT {
            rows[y] = BitRow::FULL_SENTINEL;
            y += 1;
        }
        Self { rows }
    };

    /// Returns a playable row, `y = 0` being the top of the playable area.
    #[must_use]
    pub fn playable_row(&self, y: usize) -> BitRow {
        self.rows[y + SENTINEL_MARGIN_TOP]
    }

    /// Playable rows from top to bottom.
    pub fn playable_rows(&self) -> impl DoubleEndedIterator<Item = BitRow> + '_ {
        self.rows[SENTINEL_MARGIN_TOP..][..PLAYABLE_HEIGHT]
            .iter()
            .copied()
    }

    #[must_use]
    pub fn is_colliding(&self, piece: Piece) -> bool {
        let x0 = piece.position().x();
        let y0 = piece.position().y();
        piece
            .mask()
            .into_iter()
            .zip(&self.rows[y0..])
            .any(|(mask, row)| row.is_any_cell_occupied(x0, mask))
    }

    /// Locks a piece onto the board.
    pub fn fill_piece(&mut self, piece: Piece) {
        let x0 = piece.position().x();
        let y0 = piece.position().y();
        for (mask, row) in piece.mask().into_iter().zip(&mut self.rows[y0..]) {
            row.occupy_cells(x0, mask);
        }
    }

    /// Removes filled playable rows, shifting the rows above down, and returns how many
    /// were removed.
    pub fn clear_lines(&mut self) -> usize {
        let playable_rows = &mut self.rows[SENTINEL_MARGIN_TOP..][..PLAYABLE_HEIGHT];
        let mut count = 0;
        for y in (0..PLAYABLE_HEIGHT).rev() {
            if playable_rows[y].is_playable_filled() {
                count += 1;
                continue;
            }
            if count > 0 {
                playable_rows[y + count] = playable_rows[y];
            }
        }
        playable_rows[..count].fill(BitRow::EMPTY);
        count
    }

    /// Builds a board from ASCII art, `#` for an occupied cell and `.` for an empty one.
    ///
    /// Every non-blank line must hold exactly 10 cells. The lines are aligned to the
    /// bottom of the playable area, so a short picture describes the lowest rows.
    ///
    /// # Panics
    ///
    /// Panics on a malformed picture. Use [`Self::parse_ascii`] for untrusted input.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        match Self::parse_ascii(art) {
            Ok(board) => board,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn parse_ascii(art: &str) -> Result<Self, BoardParseError> {
        let lines: Vec<&str> = art.lines().filter(|line| !line.trim().is_empty()).collect();
        if lines.len() > PLAYABLE_HEIGHT {
            return Err(BoardParseError::TooManyRows { rows: lines.len() });
        }

        let mut board = Self::INITIAL;
        let top = SENTINEL_MARGIN_TOP + PLAYABLE_HEIGHT - lines.len();
        for (i, line) in lines.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| *c == '#' || *c == '.').collect();
            if cells.len() != PLAYABLE_WIDTH {
                return Err(BoardParseError::RowWidth {
                    line: i,
                    cells: cells.len(),
                });
            }
            for (x, &c) in cells.iter().enumerate() {
                if c == '#' {
                    board.rows[top + i].occupy_cells(x + SENTINEL_MARGIN_LEFT, 0b1);
                }
            }
        }
        Ok(board)
    }

    /// Renders the playable area as ASCII art in the [`Self::from_ascii`] format.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut art = String::with_capacity(PLAYABLE_HEIGHT * (PLAYABLE_WIDTH + 1));
        for row in self.playable_rows() {
            art.extend(row.iter_playable_cells().map(|c| if c { '#' } else { '.' }));
            art.push('\n');
        }
        art
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum BoardParseError {
    #[display("board has {rows} rows, more than the playable height")]
    TooManyRows { rows: usize },
    #[display("line {line} has {cells} cells, expected one per playable column")]
    RowWidth { line: usize, cells: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_playable_row(board: &mut BitBoard, y: usize) {
        for x in BitBoard::PLAYABLE_X_RANGE {
            board.rows[y].occupy_cells(x, 0b1);
        }
    }

    #[test]
    fn test_initial_board_walls() {
        let board = BitBoard::INITIAL;
        for y in 0..TOTAL_HEIGHT {
            for x in 0..TOTAL_WIDTH {
                let cell = board.rows[y].is_cell_occupied(x);
                let expected = y >= SENTINEL_MARGIN_TOP + PLAYABLE_HEIGHT
                    || !BitBoard::PLAYABLE_X_RANGE.contains(&x);
                assert_eq!(cell, expected, "unexpected cell at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_clear_lines_shifts_rows_down() {
        let mut board = BitBoard::from_ascii(
            r"
            #.........
            ##########
            .#........
            ##########
            ",
        );
        assert_eq!(board.clear_lines(), 2);
        let expected = BitBoard::from_ascii(
            r"
            #.........
            .#........
            ",
        );
        assert_eq!(board, expected);
    }

    #[test]
    fn test_clear_lines_all_filled() {
        let mut board = BitBoard::INITIAL;
        for y in BitBoard::PLAYABLE_Y_RANGE {
            fill_playable_row(&mut board, y);
        }
        assert_eq!(board.clear_lines(), PLAYABLE_HEIGHT);
        assert_eq!(board, BitBoard::INITIAL);
    }

    #[test]
    fn test_partial_line_is_kept() {
        let mut board = BitBoard::from_ascii("#########.");
        assert_eq!(board.clear_lines(), 0);
        assert_eq!(board.playable_row(PLAYABLE_HEIGHT - 1).playable_occupied_count(), 9);
    }

    #[test]
    fn test_from_ascii_aligns_to_bottom() {
        let board = BitBoard::from_ascii(
            r"
            ..#.......
            ##########
            ",
        );
        assert!(board.playable_row(PLAYABLE_HEIGHT - 1).is_playable_filled());
        let row = board.playable_row(PLAYABLE_HEIGHT - 2);
        assert_eq!(row.playable_occupied_count(), 1);
        assert!(row.is_cell_occupied(SENTINEL_MARGIN_LEFT + 2));
        assert!(board.playable_row(0).is_playable_empty());
    }

    #[test]
    fn test_ascii_roundtrip() {
        let art = "..#.......\n.####.....\n";
        let board = BitBoard::from_ascii(art);
        assert!(board.to_ascii().ends_with(art));
        assert_eq!(BitBoard::from_ascii(&board.to_ascii()), board);
    }

    #[test]
    fn test_parse_ascii_errors() {
        assert!(matches!(
            BitBoard::parse_ascii("###"),
            Err(BoardParseError::RowWidth { line: 0, cells: 3 })
        ));
        let tall = "..........\n".repeat(PLAYABLE_HEIGHT + 1);
        assert!(matches!(
            BitBoard::parse_ascii(&tall),
            Err(BoardParseError::TooManyRows { .. })
        ));
    }

    #[test]
    fn test_serialized_format() {
        let board = BitBoard::from_ascii("##........");
        let serialized = serde_json::to_string(&board).unwrap();
        assert!(serialized.contains("300f"));
        assert!(serialized.contains("3003"));
        assert!(serialized.ends_with("3fff,3fff\""));
        assert_eq!(serialized.len(), TOTAL_HEIGHT * 4 + (TOTAL_HEIGHT - 1) + 2);

        let deserialized: BitBoard = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, board);
    }

    #[test]
    fn test_deserialize_rejects_missing_walls() {
        let mut rows = vec!["3003"; TOTAL_HEIGHT];
        rows[3] = "0000";
        let json = format!("\"{}\"", rows.join(","));
        assert!(serde_json::from_str::<BitBoard>(&json).is_err());
    }
}
