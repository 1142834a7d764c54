// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

//! Typed sort entry points routed through the dispatcher.

pub mod engine;
mod order;

pub use order::{Ascending, Descending, Order};

use crate::Lane;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A lane type that can be sorted. Floating-point keys use their total order,
/// so `-0.0` sorts before `0.0` and NaNs sort to the ends.
pub trait Key: Lane {
    fn less(lhs: &Self, rhs: &Self) -> bool;

    fn sort_ascending(keys: &mut [Self], scratch: &mut [Self]);

    fn sort_descending(keys: &mut [Self], scratch: &mut [Self]);
}

/// Sorts `keys` in place in the direction of `O`.
///
/// `scratch` must hold at least `keys.len()` elements; its contents
/// afterwards are unspecified.
pub fn sort<K: Key, O: Order>(keys: &mut [K], scratch: &mut [K]) {
    assert!(
        scratch.len() >= keys.len(),
        "scratch of {} elements cannot sort {} keys",
        scratch.len(),
        keys.len()
    );
    if O::DESCENDING {
        K::sort_descending(keys, scratch)
    } else {
        K::sort_ascending(keys, scratch)
    }
}

macro_rules! key {
    ($($t:ident: $less:expr),*) => {
        paste::paste! {
            $(
                impl Key for $t {
                    #[inline(always)]
                    fn less(lhs: &$t, rhs: &$t) -> bool {
                        let less: fn(&$t, &$t) -> bool = $less;
                        less(lhs, rhs)
                    }

                    #[inline(always)]
                    fn sort_ascending(keys: &mut [$t], scratch: &mut [$t]) {
                        [<dispatch_ $t _asc>]::sort(keys, scratch)
                    }

                    #[inline(always)]
                    fn sort_descending(keys: &mut [$t], scratch: &mut [$t]) {
                        [<dispatch_ $t _desc>]::sort(keys, scratch)
                    }
                }

                #[cfg_attr(feature = "internal", simd_macros::public)]
                mod [<dispatch_ $t _asc>] {
                    #[crate::multiversion(Sort, "v4", "v3", "v2", "a2")]
                    pub fn sort(keys: &mut [$t], scratch: &mut [$t]) {
                        super::engine::sort(keys, scratch, <$t as super::Key>::less)
                    }
                }

                #[cfg_attr(feature = "internal", simd_macros::public)]
                mod [<dispatch_ $t _desc>] {
                    #[crate::multiversion(Sort, "v4", "v3", "v2", "a2")]
                    pub fn sort(keys: &mut [$t], scratch: &mut [$t]) {
                        super::engine::sort(keys, scratch, |lhs, rhs| {
                            <$t as super::Key>::less(rhs, lhs)
                        })
                    }
                }

                pub fn [<sort_ $t _asc>](keys: &mut [$t], scratch: &mut [$t]) {
                    sort::<$t, Ascending>(keys, scratch)
                }

                pub fn [<sort_ $t _desc>](keys: &mut [$t], scratch: &mut [$t]) {
                    sort::<$t, Descending>(keys, scratch)
                }
            )*
        }
    };
}

key!(
    u16: |lhs, rhs| lhs < rhs,
    i16: |lhs, rhs| lhs < rhs,
    u32: |lhs, rhs| lhs < rhs,
    i32: |lhs, rhs| lhs < rhs,
    u64: |lhs, rhs| lhs < rhs,
    i64: |lhs, rhs| lhs < rhs,
    f32: |lhs, rhs| lhs.total_cmp(rhs).is_lt(),
    f64: |lhs, rhs| lhs.total_cmp(rhs).is_lt()
);

#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, align(64))]
struct Block([u8; 64]);

/// Sorts with a scratch buffer it owns and reuses across calls.
#[derive(Default)]
pub struct Sorter {
    arena: Vec<Block>,
}

impl Sorter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of scratch currently held.
    pub fn capacity(&self) -> usize {
        self.arena.len() * size_of::<Block>()
    }

    fn scratch<K: Key>(&mut self, count: usize) -> &mut [K] {
        let bytes = count * size_of::<K>();
        let blocks = bytes.div_ceil(size_of::<Block>());
        if self.arena.len() < blocks {
            log::trace!("sorter: growing scratch to {} bytes", blocks * size_of::<Block>());
            self.arena.resize(blocks, Block([0; 64]));
        }
        let bytes = &mut self.arena.as_mut_bytes()[..bytes];
        match <[K]>::mut_from_bytes(bytes) {
            Ok(scratch) => scratch,
            Err(_) => unreachable!(),
        }
    }

    pub fn sort<K: Key, O: Order>(&mut self, keys: &mut [K]) {
        let scratch = self.scratch::<K>(keys.len());
        sort::<K, O>(keys, scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn both_directions() {
        let mut rng = rand::rng();
        let mut sorter = Sorter::new();
        for n in [0, 1, 7, 16, 100, 1000] {
            let keys = (0..n).map(|_| rng.random::<i16>()).collect::<Vec<_>>();
            let mut ascending = keys.clone();
            sorter.sort::<i16, Ascending>(&mut ascending);
            assert!(Ascending::is_sorted(&ascending));
            let mut descending = keys.clone();
            sorter.sort::<i16, Descending>(&mut descending);
            assert!(Descending::is_sorted(&descending));
            ascending.reverse();
            assert_eq!(ascending, descending);
        }
        assert!(sorter.capacity() >= 1000 * size_of::<i16>());
    }

    #[test]
    fn float_total_order() {
        let mut keys = [1.0f32, f32::NAN, -0.0, 0.0, f32::NEG_INFINITY, -1.0];
        let mut scratch = [0.0; 6];
        sort_f32_asc(&mut keys, &mut scratch);
        assert_eq!(
            keys.map(f32::to_bits)[..5],
            [f32::NEG_INFINITY, -1.0, -0.0, 0.0, 1.0].map(f32::to_bits)
        );
        assert!(keys[5].is_nan());
        sort_f32_desc(&mut keys, &mut scratch);
        assert!(keys[0].is_nan());
        assert_eq!(keys[3].to_bits(), (-0.0f32).to_bits());
    }

    #[test]
    #[should_panic]
    fn scratch_too_small() {
        sort::<u64, Ascending>(&mut [3, 2, 1], &mut [0; 2]);
    }
}
