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

use super::Key;

/// Direction of a sort, fixed at compile time.
pub trait Order: Copy + Default + Send + Sync + 'static {
    const DESCENDING: bool;

    /// Whether `lhs` goes strictly before `rhs`.
    #[inline(always)]
    fn precedes<K: Key>(lhs: &K, rhs: &K) -> bool {
        if Self::DESCENDING {
            K::less(rhs, lhs)
        } else {
            K::less(lhs, rhs)
        }
    }

    fn is_sorted<K: Key>(keys: &[K]) -> bool {
        keys.is_sorted_by(|lhs, rhs| !Self::precedes(rhs, lhs))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ascending;

impl Order for Ascending {
    const DESCENDING: bool = false;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Descending;

impl Order for Descending {
    const DESCENDING: bool = true;
}
