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

use crate::descriptor::MAX_BYTES;
use crate::{Descriptor, Lane};
use std::fmt::Debug;
use std::ops::Index;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, align(64))]
struct Storage([u8; MAX_BYTES]);

/// A value of `d.lanes()` lanes of `T`, stored in an aligned register-sized
/// buffer.
#[derive(Clone, Copy)]
pub struct Vector<T> {
    descriptor: Descriptor<T>,
    storage: Storage,
}

impl<T: Lane> Vector<T> {
    pub fn zero(d: Descriptor<T>) -> Self {
        Self {
            descriptor: d,
            storage: Storage::new_zeroed(),
        }
    }

    pub fn splat(d: Descriptor<T>, value: T) -> Self {
        let mut result = Self::zero(d);
        result.as_mut_slice().fill(value);
        result
    }

    /// Lane `i` is `T::from_usize(start + i)`.
    pub fn iota(d: Descriptor<T>, start: usize) -> Self {
        Self::from_fn(d, |i| T::from_usize(start.wrapping_add(i)))
    }

    pub fn from_fn(d: Descriptor<T>, mut f: impl FnMut(usize) -> T) -> Self {
        let mut result = Self::zero(d);
        for (i, x) in result.as_mut_slice().iter_mut().enumerate() {
            *x = f(i);
        }
        result
    }

    /// Reads the first `d.lanes()` elements of `src`.
    pub fn load(d: Descriptor<T>, src: &[T]) -> Self {
        let n = d.lanes();
        assert!(
            src.len() >= n,
            "loading {n} lanes from a slice of {}",
            src.len()
        );
        let mut result = Self::zero(d);
        result.as_mut_slice().copy_from_slice(&src[..n]);
        result
    }

    pub fn store(&self, dst: &mut [T]) {
        let n = self.lanes();
        assert!(
            dst.len() >= n,
            "storing {n} lanes into a slice of {}",
            dst.len()
        );
        dst[..n].copy_from_slice(self.as_slice());
    }

    pub fn lanes(&self) -> usize {
        self.descriptor.lanes()
    }

    pub fn descriptor(&self) -> Descriptor<T> {
        self.descriptor
    }

    pub fn as_slice(&self) -> &[T] {
        let n = self.lanes() * size_of::<T>();
        match <[T]>::ref_from_bytes(&self.storage.0[..n]) {
            Ok(slice) => slice,
            Err(_) => unreachable!(),
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let n = self.lanes() * size_of::<T>();
        match <[T]>::mut_from_bytes(&mut self.storage.0[..n]) {
            Ok(slice) => slice,
            Err(_) => unreachable!(),
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }
}

impl<T: Lane> Index<usize> for Vector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Lane> PartialEq for Vector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor && self.as_slice() == other.as_slice()
    }
}

impl<T: Lane> Debug for Vector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.descriptor)?;
        f.debug_list().entries(self.as_slice()).finish()
    }
}
