#![allow(dead_code)]

use lanes::{Descriptor, Lane, Target};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

pub const SEEDS: [u8; 4] = [7, 11, 42, 255];

pub fn rng(seed: u8) -> ChaCha12Rng {
    ChaCha12Rng::from_seed([seed; 32])
}

/// Every distinct shape a vector of `T` can take: full registers of each
/// target, and every power-of-two cap below them.
pub fn descriptors<T: Lane>() -> Vec<Descriptor<T>> {
    let mut result = Vec::new();
    for target in Target::ALL {
        let full = Descriptor::<T>::new(target);
        let mut limit = full.lanes();
        while limit >= 1 {
            let d = full.capped(limit);
            if !result.contains(&d) {
                result.push(d);
            }
            limit /= 2;
        }
    }
    result
}
