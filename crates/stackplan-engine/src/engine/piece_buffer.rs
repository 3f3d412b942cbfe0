use std::{collections::VecDeque, fmt::Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Piece generator using the 7-bag randomization algorithm.
///
/// Each bag holds one piece of every kind in shuffled order. The queue is topped up
/// with a fresh bag whenever 7 or fewer pieces remain, so at least 7 upcoming
/// pieces are always visible.
///
/// Buffers are plain values: cloning a buffer clones its random state, so a clone
/// yields the same pieces as the original. Hypothetical states built by the planner
/// rely on this.
///
/// # Example
///
/// ```
/// use stackplan_engine::{PieceBuffer, PieceSeed};
///
/// let mut buffer = PieceBuffer::with_seed(PieceSeed::from(42));
/// let mut copy = buffer.clone();
///
/// assert_eq!(buffer.pop_next(), copy.pop_next());
/// assert_eq!(buffer, copy);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceBuffer {
    rng: Pcg32,
    bag: VecDeque<PieceKind>,
}

impl Default for PieceBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// 128-bit seed for deterministic piece generation.
///
/// Serialized as a 32-character hex string. Small integer seeds (as taken on the
/// command line) are expanded with [`From<u64>`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl From<u64> for PieceSeed {
    fn from(value: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(value);
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        Self(seed)
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl PieceBuffer {
    /// Creates a buffer with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        let mut this = Self {
            rng: Pcg32::from_seed(seed.0),
            bag: VecDeque::with_capacity(PieceKind::LEN * 2),
        };
        this.fill_bag();
        this
    }

    fn fill_bag(&mut self) {
        while self.bag.len() <= PieceKind::LEN {
            let mut new_bag = PieceKind::ALL;
            new_bag.shuffle(&mut self.rng);
            self.bag.extend(new_bag);
        }
    }

    pub fn pop_next(&mut self) -> PieceKind {
        let next = self
            .bag
            .pop_front()
            .expect("piece bag should never be empty");
        self.fill_bag();
        next
    }

    /// Upcoming pieces in draw order. Always yields more than 7 pieces.
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_each_bag_holds_every_kind() {
        let mut buffer = PieceBuffer::with_seed(PieceSeed::from(7));
        for _ in 0..5 {
            let bag: HashSet<PieceKind> = (0..PieceKind::LEN).map(|_| buffer.pop_next()).collect();
            assert_eq!(bag.len(), PieceKind::LEN);
        }
    }

    #[test]
    fn test_preview_matches_draws() {
        let mut buffer = PieceBuffer::with_seed(PieceSeed::from(1));
        let preview: Vec<_> = buffer.next_pieces().take(7).collect();
        let drawn: Vec<_> = (0..7).map(|_| buffer.pop_next()).collect();
        assert_eq!(preview, drawn);
        assert!(buffer.next_pieces().count() > PieceKind::LEN);
    }

    #[test]
    fn test_clone_yields_same_sequence() {
        let mut buffer = PieceBuffer::with_seed(PieceSeed::from(99));
        buffer.pop_next();
        let mut copy = buffer.clone();
        for _ in 0..30 {
            assert_eq!(buffer.pop_next(), copy.pop_next());
        }
        assert_eq!(buffer, copy);
    }

    #[test]
    fn test_u64_seeds_differ() {
        assert_ne!(PieceSeed::from(0), PieceSeed::from(1));
        assert_eq!(PieceSeed::from(5), PieceSeed::from(5));
    }

    #[test]
    fn test_seed_known_values() {
        let seed = PieceSeed([
            0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
            0x32, 0x10,
        ]);
        let serialized = serde_json::to_string(&seed).unwrap();
        assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");
        let deserialized: PieceSeed = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, seed);

        let upper: PieceSeed =
            serde_json::from_str("\"0123456789ABCDEFFEDCBA9876543210\"").unwrap();
        assert_eq!(upper, seed);
    }

    #[test]
    fn test_seed_rejects_bad_hex() {
        for json in [
            "\"ghijklmnopqrstuvwxyzghijklmnopqr\"",
            "\"0123456789abcdef0123456789abcde\"",
            "\"\"",
        ] {
            let err = serde_json::from_str::<PieceSeed>(json).unwrap_err();
            assert!(err.to_string().contains("invalid hex"), "{json}");
        }
    }

    #[test]
    fn test_deserialized_seed_preserves_sequence() {
        let seed: PieceSeed = rand::rng().random();
        let json = serde_json::to_string(&seed).unwrap();
        let restored: PieceSeed = serde_json::from_str(&json).unwrap();
        let mut a = PieceBuffer::with_seed(seed);
        let mut b = PieceBuffer::with_seed(restored);
        for _ in 0..20 {
            assert_eq!(a.pop_next(), b.pop_next());
        }
    }
}
