//! Seeded random number generation.
//!
//! Every source of randomness in a match (shuffle, dealer seat, bot
//! fallbacks) flows through one `GameRng`, so a match is fully reproducible
//! from its seed. The orchestrator owns a root `GameRng` and forks a fresh
//! one for each match it launches.
//!
//! ```
//! use okey_server::core::GameRng;
//!
//! let mut root = GameRng::new(42);
//! let mut a = root.fork();
//! let mut b = GameRng::new(42).fork();
//! assert_eq!(a.gen_range_usize(0..1000), b.gen_range_usize(0..1000));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic RNG with forking for per-match streams.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Seed from OS entropy. Used when no seed is configured.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed this generator was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork an independent, deterministic child stream.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(fork_seed)
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let draws = |seed| {
            let mut rng = GameRng::new(seed);
            (0..50).map(|_| rng.gen_range_usize(0..106)).collect::<Vec<_>>()
        };
        assert_eq!(draws(42), draws(42));
        assert_ne!(draws(42), draws(43));
    }

    #[test]
    fn test_fork_is_independent_of_parent() {
        let mut root = GameRng::new(42);
        let mut child = root.fork();

        let parent: Vec<_> = (0..10).map(|_| root.gen_range_usize(0..106)).collect();
        let forked: Vec<_> = (0..10).map(|_| child.gen_range_usize(0..106)).collect();
        assert_ne!(parent, forked);
    }

    #[test]
    fn test_successive_forks_differ() {
        let mut rng = GameRng::new(42);
        let first = rng.fork();
        let second = rng.fork();
        assert_ne!(first.seed(), second.seed());
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = GameRng::new(42);
        let mut data: Vec<u16> = (0..106).collect();
        rng.shuffle(&mut data);

        assert_ne!(data, (0..106).collect::<Vec<_>>());
        data.sort_unstable();
        assert_eq!(data, (0..106).collect::<Vec<_>>());
    }

    #[test]
    fn test_choose() {
        let mut rng = GameRng::new(42);
        let items = [1, 2, 3];
        assert!(items.contains(rng.choose(&items).unwrap()));

        let empty: [i32; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }
}
