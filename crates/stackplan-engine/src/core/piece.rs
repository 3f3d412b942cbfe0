use std::fmt;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use super::{
    SENTINEL_MARGIN_LEFT,
    bit_board::{BitBoard, PIECE_SPAWN_X, PIECE_SPAWN_Y},
};

/// A piece kind at a position and rotation.
///
/// Pieces are values: moving or rotating returns a new `Piece`. The position is the
/// top-left corner of the 4×4 bounding box in board coordinates (sentinel margins
/// included), so the playable column of the piece's leftmost cell is reported
/// separately by [`Piece::column`].
///
/// # Example
///
/// ```
/// use stackplan_engine::{Piece, PieceKind};
///
/// let piece = Piece::new(PieceKind::T);
/// assert_eq!(piece.column(), 3);
/// assert_eq!(piece.width(), 3);
///
/// let rotated = piece.rotated_right();
/// assert_eq!(rotated.width(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    position: PiecePosition,
    rotation: PieceRotation,
    kind: PieceKind,
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // "kind#rotation@x,y", e.g. "S#1@4,18"
        write!(
            f,
            "{}#{}@{},{}",
            self.kind.as_char(),
            self.rotation.0,
            self.position.x,
            self.position.y
        )
    }
}

impl Piece {
    /// Creates a piece of the given kind at the spawn position in its spawn rotation.
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        Self {
            position: PiecePosition::SPAWN_POSITION,
            rotation: PieceRotation::default(),
            kind,
        }
    }

    #[must_use]
    pub fn position(&self) -> PiecePosition {
        self.position
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub(crate) fn mask(&self) -> PieceMask {
        self.kind.mask(self.rotation)
    }

    /// Canonical cell pattern of the current rotation.
    #[must_use]
    pub fn orientation(&self) -> PieceOrientation {
        self.kind.orientation(self.rotation)
    }

    /// Playable column (0-based) of the leftmost occupied cell.
    #[must_use]
    pub fn column(&self) -> usize {
        let (left, _) = mask_columns(self.mask());
        (self.position.x() + left).saturating_sub(SENTINEL_MARGIN_LEFT)
    }

    /// Number of columns spanned by the occupied cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.orientation().width()
    }

    /// Occupied cells in board coordinates.
    pub fn occupied_positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (x0, y0) = (self.position.x(), self.position.y());
        self.mask().into_iter().enumerate().flat_map(move |(dy, row)| {
            (0..4)
                .filter(move |dx| row & (1 << dx) != 0)
                .map(move |dx| (x0 + dx, y0 + dy))
        })
    }

    #[must_use]
    pub fn left(&self) -> Option<Self> {
        Some(Self {
            position: self.position.left()?,
            ..*self
        })
    }

    #[must_use]
    pub fn right(&self) -> Option<Self> {
        Some(Self {
            position: self.position.right()?,
            ..*self
        })
    }

    #[must_use]
    pub fn up(&self) -> Option<Self> {
        Some(Self {
            position: self.position.up()?,
            ..*self
        })
    }

    #[must_use]
    pub fn down(&self) -> Option<Self> {
        Some(Self {
            position: self.position.down()?,
            ..*self
        })
    }

    #[must_use]
    pub fn rotated_right(&self) -> Self {
        Self {
            rotation: self.rotation.rotated_right(),
            ..*self
        }
    }

    /// Rotates clockwise, trying a one-cell kick when the rotated piece collides.
    ///
    /// Kicks are tried in the order up, right, down, left. Returns `None` when every
    /// candidate collides.
    #[must_use]
    pub fn kicked_rotated_right(self, board: &BitBoard) -> Option<Self> {
        let piece = self.rotated_right();
        if !board.is_colliding(piece) {
            return Some(piece);
        }
        [piece.up(), piece.right(), piece.down(), piece.left()]
            .into_iter()
            .flatten()
            .find(|kicked| !board.is_colliding(*kicked))
    }

    /// Position the piece would lock at if dropped straight down.
    #[must_use]
    pub fn simulate_drop_position(&self, board: &BitBoard) -> Self {
        let mut dropped = *self;
        while let Some(piece) = dropped.down().filter(|p| !board.is_colliding(*p)) {
            dropped = piece;
        }
        dropped
    }
}

/// Anchor of a piece's bounding box, in board coordinates including the sentinel margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiecePosition {
    x: u8,
    y: u8,
}

impl PiecePosition {
    #[expect(clippy::cast_possible_truncation)]
    pub const SPAWN_POSITION: Self = Self::new(PIECE_SPAWN_X as u8, PIECE_SPAWN_Y as u8);

    #[must_use]
    pub const fn new(x: u8, y: u8) -> Self {
        assert!((x as usize) < BitBoard::TOTAL_WIDTH);
        assert!((y as usize) < BitBoard::TOTAL_HEIGHT);
        Self { x, y }
    }

    #[must_use]
    pub fn x(self) -> usize {
        usize::from(self.x)
    }

    #[must_use]
    pub fn y(self) -> usize {
        usize::from(self.y)
    }

    #[must_use]
    pub const fn left(&self) -> Option<Self> {
        if self.x == 0 {
            None
        } else {
            Some(Self::new(self.x - 1, self.y))
        }
    }

    #[must_use]
    pub const fn right(&self) -> Option<Self> {
        if self.x as usize >= BitBoard::TOTAL_WIDTH - 1 {
            None
        } else {
            Some(Self::new(self.x + 1, self.y))
        }
    }

    #[must_use]
    pub const fn up(&self) -> Option<Self> {
        if self.y == 0 {
            None
        } else {
            Some(Self::new(self.x, self.y - 1))
        }
    }

    #[must_use]
    pub const fn down(&self) -> Option<Self> {
        if self.y as usize >= BitBoard::TOTAL_HEIGHT - 1 {
            None
        } else {
            Some(Self::new(self.x, self.y + 1))
        }
    }
}

/// Clockwise rotation state, `0` being the spawn rotation. Wraps modulo 4.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceRotation(u8);

impl PieceRotation {
    #[must_use]
    pub fn rotated_right(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    #[must_use]
    pub fn rotated_right_by(self, turns: usize) -> Self {
        #[expect(clippy::cast_possible_truncation)]
        let turns = (turns % 4) as u8;
        Self((self.0 + turns) % 4)
    }

    #[must_use]
    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

/// Canonical cell pattern of a piece rotation.
///
/// The rotated mask is shifted so that its topmost occupied row is row 0 and its
/// leftmost occupied column is column 0. Two rotations with the same pattern
/// (e.g. the two horizontal rotations of an I piece) compare equal, which is what
/// makes them the same placement target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceOrientation([u16; 4]);

impl PieceOrientation {
    #[must_use]
    fn from_mask(mask: PieceMask) -> Self {
        let (left, _) = mask_columns(mask);
        let mut rows = [0; 4];
        for (dst, src) in rows
            .iter_mut()
            .zip(mask.into_iter().skip_while(|row| *row == 0))
        {
            *dst = src >> left;
        }
        Self(rows)
    }

    #[must_use]
    pub fn width(self) -> usize {
        let (left, right) = mask_columns(self.0);
        right + 1 - left
    }

    #[must_use]
    pub fn height(self) -> usize {
        self.0.iter().filter(|row| **row != 0).count()
    }
}

impl fmt::Display for PieceOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // rows joined by '/', e.g. ".#./###" for an upright T
        let width = self.width();
        for (i, row) in self.0.iter().take(self.height()).enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            for x in 0..width {
                f.write_str(if row & (1 << x) != 0 { "#" } else { "." })?;
            }
        }
        Ok(())
    }
}

/// The seven tetromino kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::FromStr,
)]
#[repr(u8)]
pub enum PieceKind {
    I = 0,
    O = 1,
    S = 2,
    Z = 3,
    J = 4,
    L = 5,
    T = 6,
}

impl PieceKind {
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        Self::I,
        Self::O,
        Self::S,
        Self::Z,
        Self::J,
        Self::L,
        Self::T,
    ];

    pub(crate) fn mask(self, rotation: PieceRotation) -> PieceMask {
        PIECE_MASKS[self as usize][rotation.as_usize()]
    }

    #[must_use]
    pub fn orientation(self, rotation: PieceRotation) -> PieceOrientation {
        PieceOrientation::from_mask(self.mask(rotation))
    }

    /// Rotations with pairwise distinct orientations, in clockwise order from spawn.
    ///
    /// O has one, I, S and Z have two, J, L and T have four.
    #[must_use]
    pub fn distinct_rotations(self) -> ArrayVec<PieceRotation, 4> {
        let mut rotations = ArrayVec::<PieceRotation, 4>::new();
        let mut rotation = PieceRotation::default();
        for _ in 0..4 {
            let orientation = self.orientation(rotation);
            if rotations
                .iter()
                .all(|r| self.orientation(*r) != orientation)
            {
                rotations.push(rotation);
            }
            rotation = rotation.rotated_right();
        }
        rotations
    }

    /// Number of clockwise turns from `from` until the piece shows `target`.
    ///
    /// Returns `None` if no rotation of this kind has that orientation.
    #[must_use]
    pub fn turns_to(self, from: PieceRotation, target: PieceOrientation) -> Option<usize> {
        (0..4).find(|turns| self.orientation(from.rotated_right_by(*turns)) == target)
    }

    /// # Examples
    ///
    /// ```
    /// use stackplan_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

/// Piece cells within the 4×4 bounding box, one `u16` per row, bit `x` for column `x`.
pub(crate) type PieceMask = [u16; 4];

/// Leftmost and rightmost occupied columns of a mask.
fn mask_columns(mask: PieceMask) -> (usize, usize) {
    let bits = mask.iter().fold(0, |acc, row| acc | row);
    debug_assert!(bits != 0, "piece mask must not be empty");
    let left = bits.trailing_zeros() as usize;
    let right = (u16::BITS - 1 - bits.leading_zeros()) as usize;
    (left, right)
}

/// All 4 rotation states of a mask, each obtained by a clockwise quarter turn of the
/// `size`×`size` box holding the piece (2 for O, 4 for I, 3 otherwise).
const fn mask_rotations(size: usize, mask: PieceMask) -> [PieceMask; 4] {
    let mut rotations = [mask; 4];
    let mut i = 1;
    while i < 4 {
        let mut rotated = [0; 4];
        let mut y = 0;
        while y < size {
            let mut x = 0;
            while x < size {
                if (rotations[i - 1][size - 1 - x] & (1 << y)) != 0 {
                    rotated[y] |= 1 << x;
                }
                x += 1;
            }
            y += 1;
        }
        rotations[i] = rotated;
        i += 1;
    }
    rotations
}

const PIECE_MASKS: [[PieceMask; 4]; PieceKind::LEN] = {
    const fn row(cells: [bool; 4]) -> u16 {
        let mut bits = 0;
        let mut i = 0;
        while i < 4 {
            if cells[i] {
                bits |= 1 << i;
            }
            i += 1;
        }
        bits
    }

    const C: bool = true;
    const E: bool = false;
    const EEEE: u16 = row([E; 4]);

    [
        mask_rotations(4, [EEEE, row([C, C, C, C]), EEEE, EEEE]),
        mask_rotations(2, [row([C, C, E, E]), row([C, C, E, E]), EEEE, EEEE]),
        mask_rotations(3, [row([E, C, C, E]), row([C, C, E, E]), EEEE, EEEE]),
        mask_rotations(3, [row([C, C, E, E]), row([E, C, C, E]), EEEE, EEEE]),
        mask_rotations(3, [row([C, E, E, E]), row([C, C, C, E]), EEEE, EEEE]),
        mask_rotations(3, [row([E, E, C, E]), row([C, C, C, E]), EEEE, EEEE]),
        mask_rotations(3, [row([E, C, E, E]), row([C, C, C, E]), EEEE, EEEE]),
    ]
};
