//! Moves the planner reasons about.
//!
//! A [`PrimitiveAction`] is one input applied to the game. A [`Placement`] names where
//! the falling piece should end up, and [`Placement::unroll`] turns it into the
//! primitives that put it there.

use std::fmt;

use serde::Serialize;
use stackplan_engine::{BitBoard, GameWorld, PieceOrientation};

/// A single atomic move. Applying one never fails: a blocked move does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveAction {
    #[display("shift-left")]
    ShiftLeft,
    #[display("shift-right")]
    ShiftRight,
    #[display("rotate-clockwise")]
    RotateClockwise,
    #[display("drop-to-bottom")]
    DropToBottom,
}

impl PrimitiveAction {
    pub fn apply(self, world: &mut GameWorld) {
        match self {
            Self::ShiftLeft => {
                world.shift_left();
            }
            Self::ShiftRight => {
                world.shift_right();
            }
            Self::RotateClockwise => {
                world.rotate_clockwise();
            }
            Self::DropToBottom => {
                world.drop_to_bottom();
            }
        }
    }
}

/// Target orientation and column for the falling piece, followed by a drop.
///
/// `column` is the playable column of the piece's leftmost cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub orientation: PieceOrientation,
    pub column: usize,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at column {}", self.orientation, self.column)
    }
}

impl Placement {
    /// Primitive moves that bring the falling piece of `world` to this placement.
    ///
    /// Rotations come first, then shifts, then exactly one drop. Rotations are
    /// replayed on a private copy of the world so that the shift count starts from
    /// the column the piece really has after any wall kick.
    #[must_use]
    pub fn unroll(&self, world: &GameWorld) -> Vec<PrimitiveAction> {
        let (mut actions, _) = self.steer(world);
        actions.push(PrimitiveAction::DropToBottom);
        actions
    }

    /// Whether the moves of [`Self::unroll`] really put the piece at this placement.
    ///
    /// Cells locked above the visible rows can stop a rotation or a shift short of
    /// the target.
    #[must_use]
    pub fn is_reachable(&self, world: &GameWorld) -> bool {
        let (_, steered) = self.steer(world);
        let piece = steered.falling_piece();
        piece.orientation() == self.orientation && piece.column() == self.column
    }

    /// Rotation and shift moves, along with a copy of `world` they were applied to.
    fn steer(&self, world: &GameWorld) -> (Vec<PrimitiveAction>, GameWorld) {
        let piece = world.falling_piece();
        let turns = piece
            .kind()
            .turns_to(piece.rotation(), self.orientation)
            .unwrap_or(0);

        let mut actions = Vec::with_capacity(turns + BitBoard::PLAYABLE_WIDTH + 1);
        let mut probe = world.clone();
        for _ in 0..turns {
            probe.rotate_clockwise();
            actions.push(PrimitiveAction::RotateClockwise);
        }

        let column = probe.falling_piece().column();
        let shift = if self.column < column {
            PrimitiveAction::ShiftLeft
        } else {
            PrimitiveAction::ShiftRight
        };
        for _ in 0..self.column.abs_diff(column) {
            shift.apply(&mut probe);
            actions.push(shift);
        }
        (actions, probe)
    }

    pub fn apply(&self, world: &mut GameWorld) {
        for action in self.unroll(world) {
            action.apply(world);
        }
    }

    #[must_use]
    pub fn apply_to_copy(&self, world: &GameWorld) -> GameWorld {
        let mut copy = world.clone();
        self.apply(&mut copy);
        copy
    }
}

/// Every reachable placement of the falling piece: each distinct orientation at each
/// column where it fits and that its moves actually reach, orientation-major and
/// column-ascending.
///
/// A terminal world has no placements.
#[must_use]
pub fn available_placements(world: &GameWorld) -> Vec<Placement> {
    if world.is_terminal() {
        return vec![];
    }
    let kind = world.falling_piece().kind();
    let mut placements = Vec::with_capacity(4 * BitBoard::PLAYABLE_WIDTH);
    for rotation in kind.distinct_rotations() {
        let orientation = kind.orientation(rotation);
        let columns = 0..=BitBoard::PLAYABLE_WIDTH - orientation.width();
        placements.extend(
            columns
                .map(|column| Placement {
                    orientation,
                    column,
                })
                .filter(|placement| placement.is_reachable(world)),
        );
    }
    placements
}
