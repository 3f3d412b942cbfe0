//! Board and piece primitives.
//!
//! - [`BitBoard`] - Row bitmasks with sentinel walls for collision and line clearing
//! - [`Piece`] - A piece kind at a position and rotation
//! - [`PieceOrientation`] - Canonical cell pattern of a rotation, independent of position

pub use self::{bit_board::*, piece::*};

pub(crate) mod bit_board;
pub(crate) mod piece;

const SENTINEL_MARGIN_LEFT: usize = 2;
const SENTINEL_MARGIN_RIGHT: usize = 2;
const SENTINEL_MARGIN_TOP: usize = 2;
const SENTINEL_MARGIN_BOTTOM: usize = 2;

const PLAYABLE_WIDTH: usize = 10;
const PLAYABLE_HEIGHT: usize = 20;

const TOTAL_WIDTH: usize = SENTINEL_MARGIN_LEFT + PLAYABLE_WIDTH + SENTINEL_MARGIN_RIGHT;
const TOTAL_HEIGHT: usize = SENTINEL_MARGIN_TOP + PLAYABLE_HEIGHT + SENTINEL_MARGIN_BOTTOM;
