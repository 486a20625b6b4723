//! Seeded random source for bandit draws and the simulation harness
//!
//! The generator is `rand_xoshiro`'s SplitMix64: identical output for
//! identical seeds on every platform, which is what decision replay needs.
//! This module only decides how seeds are scoped.

use rand::{RngCore, SeedableRng};

pub use rand_xoshiro::SplitMix64;

/// Independent stream for a named scope (e.g. a user id) under a base seed
pub fn derive(seed: u64, scope: &str) -> SplitMix64 {
    // FNV-1a over the scope, mixed into the base seed
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in scope.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    let mut mixer = SplitMix64::seed_from_u64(seed ^ hash);
    SplitMix64::seed_from_u64(mixer.next_u64())
}
