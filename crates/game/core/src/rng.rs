//! Seedable random number generation.
//!
//! All randomness in the game flows through an explicitly passed generator so
//! a given seed always reproduces the same variants and combat rolls. The
//! default generator is [`PcgRng`], which implements [`rand_core::RngCore`] and
//! therefore works with every sampling helper in `rand`.

use rand_core::{RngCore, SeedableRng, impls};

/// PCG random number generator (Permuted Congruential Generator).
///
/// This implementation uses PCG-XSH-RR, which produces 32-bit output from
/// 64-bit state.
///
/// # Properties
///
/// - **Deterministic**: Same seed always produces same output
/// - **Fast**: Single multiply + xorshift + rotate
/// - **Small state**: Only 64 bits
///
/// # References
///
/// - PCG paper: <https://www.pcg-random.org/>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcgRng {
    state: u64,
}

impl PcgRng {
    /// PCG multiplier constant.
    const MULTIPLIER: u64 = 6364136223846793005;

    /// PCG increment constant.
    const INCREMENT: u64 = 1442695040888963407;

    /// Creates a generator from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            state: Self::pcg_step(seed.wrapping_add(Self::INCREMENT)),
        }
    }

    /// Creates a generator for one independent stream of a game session.
    ///
    /// See [`compute_seed`] for how the components are mixed.
    pub fn for_stream(game_seed: u64, nonce: u64, actor_id: u32, context: u32) -> Self {
        Self::new(compute_seed(game_seed, nonce, actor_id, context))
    }

    /// Advance the PCG state by one step.
    ///
    /// `state' = (state * multiplier + increment) mod 2^64`
    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// PCG output function using XSH-RR (xorshift high, random rotate).
    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl Default for PcgRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RngCore for PcgRng {
    fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = Self::pcg_step(old);
        Self::pcg_output(old)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for PcgRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

/// Compute a deterministic seed from session components.
///
/// # Arguments
///
/// * `game_seed` - Base seed set at session start
/// * `nonce` - Sequence number (e.g. encounter or generation counter)
/// * `actor_id` - Entity the stream belongs to
/// * `context` - Distinguishes several streams for the same actor
pub fn compute_seed(game_seed: u64, nonce: u64, actor_id: u32, context: u32) -> u64 {
    // SplitMix64 and FxHash style combiners
    let mut hash = game_seed;

    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (actor_id as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // Final avalanche
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = PcgRng::new(42);
        let mut b = PcgRng::seed_from_u64(42);
        let xs: Vec<u32> = (0..16).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..16).map(|_| b.next_u32()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = PcgRng::new(1);
        let mut b = PcgRng::new(2);
        let xs: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn works_with_rand_helpers() {
        let mut rng = PcgRng::new(7);
        for _ in 0..1000 {
            let roll = rng.gen_range(1..=10);
            assert!((1..=10).contains(&roll));
        }
    }

    #[test]
    fn compute_seed_separates_streams() {
        let base = compute_seed(99, 0, 0, 0);
        assert_ne!(base, compute_seed(99, 1, 0, 0));
        assert_ne!(base, compute_seed(99, 0, 1, 0));
        assert_ne!(base, compute_seed(99, 0, 0, 1));
        assert_eq!(base, compute_seed(99, 0, 0, 0));
    }
}
