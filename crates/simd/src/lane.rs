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

use crate::{Kind, f16};
use zerocopy::{FromBytes, Immutable, IntoBytes};

/// A scalar that can occupy one lane of a vector.
pub trait Lane:
    Copy
    + Send
    + Sync
    + std::fmt::Debug
    + Default
    + PartialEq
    + PartialOrd
    + 'static
    + FromBytes
    + IntoBytes
    + Immutable
{
    const KIND: Kind;

    /// Converts a lane index, wrapping for integers.
    fn from_usize(x: usize) -> Self;

    fn scalar_add(lhs: Self, rhs: Self) -> Self;
    fn scalar_min(lhs: Self, rhs: Self) -> Self;
    fn scalar_max(lhs: Self, rhs: Self) -> Self;

    fn reduce_sum(this: &[Self]) -> Self;
    fn reduce_min(this: &[Self]) -> Self;
    fn reduce_max(this: &[Self]) -> Self;
}

/// One widening step: the type holding the sum of two lanes without overflow.
pub trait Widen: Lane {
    type Wide: Lane;

    fn widen(self) -> Self::Wide;

    fn sums_of_2(this: &[Self], result: &mut [Self::Wide]);
}

pub type Wide2<T> = <<T as Widen>::Wide as Widen>::Wide;

pub type Wide3<T> = <Wide2<T> as Widen>::Wide;

/// Lanes that widen twice; groups of four are summed into [`Wide2`].
pub trait SumsOf4: Widen<Wide: Widen> {
    fn sums_of_4(this: &[Self], result: &mut [Wide2<Self>]);
}

/// Lanes that widen three times; groups of eight are summed into [`Wide3`].
pub trait SumsOf8: SumsOf4<Wide: Widen<Wide: Widen>> {
    fn sums_of_8(this: &[Self], result: &mut [Wide3<Self>]);
}

/// Byte lanes supporting the absolute-difference-sum family.
pub trait AbsDiff: SumsOf8 {
    fn sums_of_8_abs_diff(a: &[Self], b: &[Self], result: &mut [Wide3<Self>]);

    fn sums_of_adj_quad_abs_diff(
        a: &[Self],
        b: &[Self],
        a_offset: usize,
        b_offset: usize,
        result: &mut [Self::Wide],
    );

    /// `indices[k]` is the sub-block of `a` that lands at position `k`.
    fn sums_of_shuffled_quad_abs_diff(
        a: &[Self],
        b: &[Self],
        indices: [usize; 4],
        result: &mut [Self::Wide],
    );
}

macro_rules! integer {
    ($($t:ident => $kind:ident),*) => {
        paste::paste! {
            $(
                impl Lane for $t {
                    const KIND: Kind = Kind::$kind;

                    #[inline(always)]
                    fn from_usize(x: usize) -> Self {
                        x as $t
                    }

                    #[inline(always)]
                    fn scalar_add(lhs: Self, rhs: Self) -> Self {
                        lhs.wrapping_add(rhs)
                    }

                    #[inline(always)]
                    fn scalar_min(lhs: Self, rhs: Self) -> Self {
                        Ord::min(lhs, rhs)
                    }

                    #[inline(always)]
                    fn scalar_max(lhs: Self, rhs: Self) -> Self {
                        Ord::max(lhs, rhs)
                    }

                    #[inline(always)]
                    fn reduce_sum(this: &[Self]) -> Self {
                        crate::reduce::[<reduce_sum_ $t>]::reduce_sum(this)
                    }

                    #[inline(always)]
                    fn reduce_min(this: &[Self]) -> Self {
                        crate::reduce::[<reduce_min_ $t>]::reduce_min(this)
                    }

                    #[inline(always)]
                    fn reduce_max(this: &[Self]) -> Self {
                        crate::reduce::[<reduce_max_ $t>]::reduce_max(this)
                    }
                }
            )*
        }
    };
}

integer!(
    u8 => U8, i8 => I8, u16 => U16, i16 => I16,
    u32 => U32, i32 => I32, u64 => U64, i64 => I64
);

macro_rules! floating {
    ($($t:ident => $kind:ident),*) => {
        paste::paste! {
            $(
                impl Lane for $t {
                    const KIND: Kind = Kind::$kind;

                    #[inline(always)]
                    fn from_usize(x: usize) -> Self {
                        x as $t
                    }

                    #[inline(always)]
                    fn scalar_add(lhs: Self, rhs: Self) -> Self {
                        lhs + rhs
                    }

                    #[inline(always)]
                    fn scalar_min(lhs: Self, rhs: Self) -> Self {
                        if rhs < lhs { rhs } else { lhs }
                    }

                    #[inline(always)]
                    fn scalar_max(lhs: Self, rhs: Self) -> Self {
                        if rhs > lhs { rhs } else { lhs }
                    }

                    #[inline(always)]
                    fn reduce_sum(this: &[Self]) -> Self {
                        crate::reduce::[<reduce_sum_ $t>]::reduce_sum(this)
                    }

                    #[inline(always)]
                    fn reduce_min(this: &[Self]) -> Self {
                        crate::reduce::[<reduce_min_ $t>]::reduce_min(this)
                    }

                    #[inline(always)]
                    fn reduce_max(this: &[Self]) -> Self {
                        crate::reduce::[<reduce_max_ $t>]::reduce_max(this)
                    }
                }
            )*
        }
    };
}

floating!(f32 => F32, f64 => F64);

impl Lane for f16 {
    const KIND: Kind = Kind::F16;

    #[inline(always)]
    fn from_usize(x: usize) -> Self {
        f16::from_f32(x as f32)
    }

    #[inline(always)]
    fn scalar_add(lhs: Self, rhs: Self) -> Self {
        f16::from_f32(lhs.to_f32() + rhs.to_f32())
    }

    #[inline(always)]
    fn scalar_min(lhs: Self, rhs: Self) -> Self {
        if rhs < lhs { rhs } else { lhs }
    }

    #[inline(always)]
    fn scalar_max(lhs: Self, rhs: Self) -> Self {
        if rhs > lhs { rhs } else { lhs }
    }

    #[inline(always)]
    fn reduce_sum(this: &[Self]) -> Self {
        crate::reduce::reduce_sum_f16::reduce_sum(this)
    }

    #[inline(always)]
    fn reduce_min(this: &[Self]) -> Self {
        crate::reduce::reduce_min_f16::reduce_min(this)
    }

    #[inline(always)]
    fn reduce_max(this: &[Self]) -> Self {
        crate::reduce::reduce_max_f16::reduce_max(this)
    }
}
