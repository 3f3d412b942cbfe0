//! Game rules on top of the [`core`](crate::core) primitives.
//!
//! - [`GameWorld`] - Board, falling piece, piece generator and statistics as one value
//! - [`GameStats`] - Score and line-clear counters
//! - [`PieceBuffer`] - 7-bag piece generation
//! - [`PieceSeed`] - Seed for deterministic piece generation
//!
//! A game alternates moves of the falling piece ([`GameWorld::shift_left`],
//! [`GameWorld::shift_right`], [`GameWorld::rotate_clockwise`]) with
//! [`GameWorld::drop_to_bottom`], which locks the piece, clears lines, and spawns the
//! next one. The game is over once [`GameWorld::is_terminal`] reports that the new
//! piece overlaps the stack.

pub use self::{game_stats::*, game_world::*, piece_buffer::*};

mod game_stats;
mod game_world;
mod piece_buffer;
