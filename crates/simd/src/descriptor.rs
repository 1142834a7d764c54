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

use crate::Lane;
use crate::dispatch::Target;
use std::fmt::{Debug, Display};
use std::marker::PhantomData;

/// The widest register any target has, in bytes.
pub const MAX_BYTES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F16,
    F32,
    F64,
}

impl Kind {
    pub const fn bits(self) -> usize {
        match self {
            Kind::U8 | Kind::I8 => 8,
            Kind::U16 | Kind::I16 | Kind::F16 => 16,
            Kind::U32 | Kind::I32 | Kind::F32 => 32,
            Kind::U64 | Kind::I64 | Kind::F64 => 64,
        }
    }

    pub const fn is_signed(self) -> bool {
        !matches!(self, Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Kind::F16 | Kind::F32 | Kind::F64)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Kind::U8 => "u8",
            Kind::I8 => "i8",
            Kind::U16 => "u16",
            Kind::I16 => "i16",
            Kind::U32 => "u32",
            Kind::I32 => "i32",
            Kind::U64 => "u64",
            Kind::I64 => "i64",
            Kind::F16 => "f16",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Element type, target and lane count of a vector.
///
/// The lane count is derived from the target's register width and an
/// optional cap; it is always a power of two between 1 and 64.
pub struct Descriptor<T> {
    target: Target,
    lanes: usize,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Lane> Descriptor<T> {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            lanes: target.bytes() / size_of::<T>(),
            _phantom: PhantomData,
        }
    }

    /// A full vector of the most capable target of this host.
    pub fn native() -> Self {
        Self::new(crate::dispatch::native())
    }

    /// A partial vector of at most `limit` lanes.
    pub fn capped(self, limit: usize) -> Self {
        assert!(limit.is_power_of_two(), "lane limit {limit} is not a power of two");
        Self {
            target: self.target,
            lanes: self.lanes.min(limit),
            _phantom: PhantomData,
        }
    }

    /// The same bytes viewed as lanes of `W`.
    pub fn repartition<W: Lane>(self) -> Descriptor<W> {
        let lanes = self.lanes * size_of::<T>() / size_of::<W>();
        assert!(
            lanes >= 1,
            "{} lanes of {} cannot be viewed as {}",
            self.lanes,
            T::KIND,
            W::KIND
        );
        Descriptor {
            target: self.target,
            lanes,
            _phantom: PhantomData,
        }
    }

    pub fn lanes(self) -> usize {
        self.lanes
    }

    pub fn target(self) -> Target {
        self.target
    }

    pub fn kind(self) -> Kind {
        T::KIND
    }
}

impl<T> Clone for Descriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Descriptor<T> {}

impl<T> PartialEq for Descriptor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.lanes == other.lanes
    }
}

impl<T> Eq for Descriptor<T> {}

impl<T: Lane> Debug for Descriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}@{}", T::KIND, self.lanes, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::f16;

    #[test]
    fn lanes_follow_target() {
        assert_eq!(Descriptor::<u8>::new(Target::V4).lanes(), 64);
        assert_eq!(Descriptor::<u8>::new(Target::V3).lanes(), 32);
        assert_eq!(Descriptor::<u8>::new(Target::V2).lanes(), 16);
        assert_eq!(Descriptor::<f16>::new(Target::A2).lanes(), 8);
        assert_eq!(Descriptor::<f32>::new(Target::V3).lanes(), 8);
        assert_eq!(Descriptor::<f64>::new(Target::Fallback).lanes(), 2);
        assert_eq!(Descriptor::<i64>::new(Target::V4).lanes(), 8);
    }

    #[test]
    fn capped_and_repartitioned() {
        let d = Descriptor::<u8>::new(Target::V3).capped(8);
        assert_eq!(d.lanes(), 8);
        assert_eq!(d.capped(64).lanes(), 8);
        assert_eq!(d.repartition::<u16>().lanes(), 4);
        assert_eq!(d.repartition::<u64>().lanes(), 1);
        assert_eq!(d.repartition::<u16>().target(), Target::V3);
        assert_eq!(d.kind(), Kind::U8);
    }

    #[test]
    #[should_panic]
    fn cap_must_be_power_of_two() {
        let _ = Descriptor::<u8>::new(Target::V2).capped(6);
    }

    #[test]
    #[should_panic]
    fn repartition_must_keep_a_lane() {
        let _ = Descriptor::<u8>::new(Target::V2).capped(4).repartition::<u64>();
    }
}
