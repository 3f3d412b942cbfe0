use crate::core::{
    bit_board::BitBoard,
    piece::{Piece, PieceKind},
};

use super::{
    game_stats::GameStats,
    piece_buffer::{PieceBuffer, PieceSeed},
};

/// Complete game state: settled cells, the falling piece, the piece generator, and
/// statistics.
///
/// `GameWorld` is a value type. Cloning yields an independent snapshot that produces
/// the same future pieces, and two worlds reached by the same moves from the same
/// world compare equal.
///
/// Moves never fail: a move that would collide leaves the world unchanged.
///
/// # Example
///
/// ```
/// use stackplan_engine::{GameWorld, PieceSeed};
///
/// let mut world = GameWorld::with_seed(PieceSeed::from(3));
/// let mut copy = world.clone();
///
/// world.shift_left();
/// world.drop_to_bottom();
/// copy.shift_left();
/// copy.drop_to_bottom();
///
/// assert_eq!(world, copy);
/// assert_eq!(world.stats().completed_pieces(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameWorld {
    board: BitBoard,
    falling_piece: Piece,
    piece_buffer: PieceBuffer,
    stats: GameStats,
}

impl Default for GameWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl GameWorld {
    /// Creates a world with an empty board and a random piece sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::from_buffer(BitBoard::INITIAL, PieceBuffer::new())
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self::with_board(BitBoard::INITIAL, seed)
    }

    /// Creates a world on an existing board, e.g. one built with [`BitBoard::from_ascii`].
    #[must_use]
    pub fn with_board(board: BitBoard, seed: PieceSeed) -> Self {
        Self::from_buffer(board, PieceBuffer::with_seed(seed))
    }

    fn from_buffer(board: BitBoard, mut piece_buffer: PieceBuffer) -> Self {
        let falling_piece = Piece::new(piece_buffer.pop_next());
        Self {
            board,
            falling_piece,
            piece_buffer,
            stats: GameStats::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &BitBoard {
        &self.board
    }

    #[must_use]
    pub fn falling_piece(&self) -> Piece {
        self.falling_piece
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.piece_buffer.next_pieces()
    }

    /// Returns `true` when the falling piece overlaps settled cells.
    ///
    /// A freshly spawned piece that collides means the stack reached the spawn area
    /// and the game is over.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.board.is_colliding(self.falling_piece)
    }

    /// Replaces the falling piece with a new piece of `kind` at the spawn position.
    ///
    /// The piece generator is left untouched. The resulting world may be terminal.
    pub fn replace_falling_piece(&mut self, kind: PieceKind) {
        self.falling_piece = Piece::new(kind);
    }

    fn try_move(&mut self, piece: Option<Piece>) -> bool {
        match piece {
            Some(piece) if !self.is_terminal() && !self.board.is_colliding(piece) => {
                self.falling_piece = piece;
                true
            }
            _ => false,
        }
    }

    pub fn shift_left(&mut self) -> bool {
        self.try_move(self.falling_piece.left())
    }

    pub fn shift_right(&mut self) -> bool {
        self.try_move(self.falling_piece.right())
    }

    /// Rotates the falling piece clockwise, kicking it one cell if needed.
    pub fn rotate_clockwise(&mut self) -> bool {
        self.try_move(self.falling_piece.kicked_rotated_right(&self.board))
    }

    /// Drops the falling piece, locks it, clears filled lines, and spawns the next
    /// piece. Returns the number of lines cleared.
    ///
    /// Does nothing on a terminal world.
    pub fn drop_to_bottom(&mut self) -> usize {
        if self.is_terminal() {
            return 0;
        }
        let dropped = self.falling_piece.simulate_drop_position(&self.board);
        self.board.fill_piece(dropped);
        let cleared_lines = self.board.clear_lines();
        self.stats.complete_piece_drop(cleared_lines);
        self.falling_piece = Piece::new(self.piece_buffer.pop_next());
        cleared_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(art: &str) -> GameWorld {
        GameWorld::with_board(BitBoard::from_ascii(art), PieceSeed::from(0))
    }

    #[test]
    fn test_shift_stops_at_walls() {
        let mut world = GameWorld::with_seed(PieceSeed::from(11));
        world.replace_falling_piece(PieceKind::O);
        let mut shifts = 0;
        while world.shift_left() {
            shifts += 1;
        }
        assert_eq!(world.falling_piece().column(), 0);
        assert_eq!(shifts, 3);

        while world.shift_right() {}
        assert_eq!(world.falling_piece().column(), BitBoard::PLAYABLE_WIDTH - 2);
    }

    #[test]
    fn test_rotate_changes_orientation() {
        let mut world = GameWorld::with_seed(PieceSeed::from(11));
        world.replace_falling_piece(PieceKind::T);
        let before = world.falling_piece().orientation();
        assert!(world.rotate_clockwise());
        assert_ne!(world.falling_piece().orientation(), before);
        for _ in 0..3 {
            assert!(world.rotate_clockwise());
        }
        assert_eq!(world.falling_piece().orientation(), before);
    }

    #[test]
    fn test_drop_clears_lines_and_spawns_next() {
        let mut world = world(
            r"
            #.........
            ###....###
            ",
        );
        world.replace_falling_piece(PieceKind::I);
        let next = world.next_pieces().next().unwrap();

        assert_eq!(world.drop_to_bottom(), 1);
        assert_eq!(world.stats().score(), 100);
        assert_eq!(world.falling_piece().kind(), next);
        assert_eq!(world.board(), &BitBoard::from_ascii("#........."));
    }

    #[test]
    fn test_full_stack_becomes_terminal() {
        let art = ".#########\n".repeat(BitBoard::PLAYABLE_HEIGHT);
        let mut world = world(&art);
        assert!(!world.is_terminal());

        world.replace_falling_piece(PieceKind::O);
        world.drop_to_bottom();
        world.replace_falling_piece(PieceKind::O);
        assert!(world.is_terminal());

        let snapshot = world.clone();
        assert!(!world.shift_left());
        assert_eq!(world.drop_to_bottom(), 0);
        assert_eq!(world, snapshot);
    }

    #[test]
    fn test_clones_are_independent() {
        let original = GameWorld::with_seed(PieceSeed::from(5));
        let mut copy = original.clone();
        copy.drop_to_bottom();
        assert_ne!(copy, original);
        assert_eq!(original.stats().completed_pieces(), 0);
    }
}
