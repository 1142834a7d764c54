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

//! Horizontal reductions of one vector.
//!
//! Integer sums wrap in the lane type. Floating-point sums fold the upper half
//! of the vector onto the lower half until one lane is left, in every variant,
//! so results are reproducible across targets.

use crate::{Lane, Vector};

pub fn reduce_sum<T: Lane>(v: &Vector<T>) -> T {
    T::reduce_sum(v.as_slice())
}

pub fn reduce_min<T: Lane>(v: &Vector<T>) -> T {
    T::reduce_min(v.as_slice())
}

pub fn reduce_max<T: Lane>(v: &Vector<T>) -> T {
    T::reduce_max(v.as_slice())
}

/// [`reduce_sum`] broadcast to every lane.
pub fn sum_of_lanes<T: Lane>(v: &Vector<T>) -> Vector<T> {
    Vector::splat(v.descriptor(), reduce_sum(v))
}

/// [`reduce_min`] broadcast to every lane.
pub fn min_of_lanes<T: Lane>(v: &Vector<T>) -> Vector<T> {
    Vector::splat(v.descriptor(), reduce_min(v))
}

/// [`reduce_max`] broadcast to every lane.
pub fn max_of_lanes<T: Lane>(v: &Vector<T>) -> Vector<T> {
    Vector::splat(v.descriptor(), reduce_max(v))
}

macro_rules! integer {
    ($($t:ident),*) => {
        paste::paste! {
            $(
                #[cfg_attr(feature = "internal", simd_macros::public)]
                pub(crate) mod [<reduce_sum_ $t>] {
                    #[crate::multiversion(ReduceSum, "v4", "v3", "v2", "a2")]
                    pub fn reduce_sum(this: &[$t]) -> $t {
                        let mut sum: $t = 0;
                        for &x in this {
                            sum = sum.wrapping_add(x);
                        }
                        sum
                    }
                }

                #[cfg_attr(feature = "internal", simd_macros::public)]
                pub(crate) mod [<reduce_min_ $t>] {
                    #[crate::multiversion(ReduceMin, "v4", "v3", "v2", "a2")]
                    pub fn reduce_min(this: &[$t]) -> $t {
                        assert!(!this.is_empty(), "reducing an empty vector");
                        let mut min = this[0];
                        for &x in &this[1..] {
                            min = min.min(x);
                        }
                        min
                    }
                }

                #[cfg_attr(feature = "internal", simd_macros::public)]
                pub(crate) mod [<reduce_max_ $t>] {
                    #[crate::multiversion(ReduceMax, "v4", "v3", "v2", "a2")]
                    pub fn reduce_max(this: &[$t]) -> $t {
                        assert!(!this.is_empty(), "reducing an empty vector");
                        let mut max = this[0];
                        for &x in &this[1..] {
                            max = max.max(x);
                        }
                        max
                    }
                }
            )*
        }
    };
}

integer!(u8, i8, u16, i16, u32, i32, u64, i64);

macro_rules! floating_min_max {
    ($($t:ident),*) => {
        paste::paste! {
            $(
                #[cfg_attr(feature = "internal", simd_macros::public)]
                pub(crate) mod [<reduce_min_ $t>] {
                    #[allow(unused_imports)]
                    use crate::f16;

                    #[crate::multiversion(ReduceMin, "v4", "v3", "v2", "a2")]
                    pub fn reduce_min(this: &[$t]) -> $t {
                        assert!(!this.is_empty(), "reducing an empty vector");
                        let mut min = this[0];
                        for &x in &this[1..] {
                            if x < min {
                                min = x;
                            }
                        }
                        min
                    }
                }

                #[cfg_attr(feature = "internal", simd_macros::public)]
                pub(crate) mod [<reduce_max_ $t>] {
                    #[allow(unused_imports)]
                    use crate::f16;

                    #[crate::multiversion(ReduceMax, "v4", "v3", "v2", "a2")]
                    pub fn reduce_max(this: &[$t]) -> $t {
                        assert!(!this.is_empty(), "reducing an empty vector");
                        let mut max = this[0];
                        for &x in &this[1..] {
                            if x > max {
                                max = x;
                            }
                        }
                        max
                    }
                }
            )*
        }
    };
}

floating_min_max!(f16, f32, f64);

#[cfg_attr(feature = "internal", simd_macros::public)]
pub(crate) mod reduce_sum_f16 {
    use crate::f16;

    #[crate::multiversion(ReduceSum, "v4", "v3", "v2", "a2")]
    pub fn reduce_sum(this: &[f16]) -> f16 {
        crate::emulate::fold_halves(this, |x, y| f16::from_f32(x.to_f32() + y.to_f32()))
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
pub(crate) mod reduce_sum_f64 {
    #[crate::multiversion(ReduceSum, "v4", "v3", "v2", "a2")]
    pub fn reduce_sum(this: &[f64]) -> f64 {
        crate::emulate::fold_halves(this, |x, y| x + y)
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
pub(crate) mod reduce_sum_f32 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn reduce_sum_v4(this: &[f32]) -> f32 {
        use crate::emulate::emulate_mm256_reduce_add_ps;
        use core::arch::x86_64::*;
        if this.len() != 16 {
            return reduce_sum_v3(this);
        }
        let x = unsafe { _mm512_loadu_ps(this.as_ptr()) };
        let lo = _mm512_castps512_ps256(x);
        let hi = _mm512_extractf32x8_ps::<1>(x);
        emulate_mm256_reduce_add_ps(_mm256_add_ps(lo, hi))
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn reduce_sum_v4_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [1, 2, 4, 8, 16] {
                let this = (0..n)
                    .map(|_| rng.random_range(-1000.0..=1000.0))
                    .collect::<Vec<f32>>();
                let specialized = unsafe { reduce_sum_v4(&this) };
                let fallback = fallback(&this);
                assert_eq!(
                    specialized.to_bits(),
                    fallback.to_bits(),
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn reduce_sum_v3(this: &[f32]) -> f32 {
        use crate::emulate::emulate_mm256_reduce_add_ps;
        use core::arch::x86_64::*;
        let a = this.as_ptr();
        let x = match this.len() {
            8 => unsafe { _mm256_loadu_ps(a) },
            16 => {
                let (x0, x1) = unsafe { (_mm256_loadu_ps(a), _mm256_loadu_ps(a.add(8))) };
                _mm256_add_ps(x0, x1)
            }
            _ => return reduce_sum_v2(this),
        };
        emulate_mm256_reduce_add_ps(x)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn reduce_sum_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [1, 2, 4, 8, 16] {
                let this = (0..n)
                    .map(|_| rng.random_range(-1000.0..=1000.0))
                    .collect::<Vec<f32>>();
                let specialized = unsafe { reduce_sum_v3(&this) };
                let fallback = fallback(&this);
                assert_eq!(
                    specialized.to_bits(),
                    fallback.to_bits(),
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn reduce_sum_v2(this: &[f32]) -> f32 {
        use crate::emulate::emulate_mm_reduce_add_ps;
        use core::arch::x86_64::*;
        let a = this.as_ptr();
        let x = match this.len() {
            4 => unsafe { _mm_loadu_ps(a) },
            8 => {
                let (x0, x1) = unsafe { (_mm_loadu_ps(a), _mm_loadu_ps(a.add(4))) };
                _mm_add_ps(x0, x1)
            }
            16 => {
                let (x0, x1, x2, x3) = unsafe {
                    (
                        _mm_loadu_ps(a),
                        _mm_loadu_ps(a.add(4)),
                        _mm_loadu_ps(a.add(8)),
                        _mm_loadu_ps(a.add(12)),
                    )
                };
                _mm_add_ps(_mm_add_ps(x0, x2), _mm_add_ps(x1, x3))
            }
            _ => return fallback(this),
        };
        emulate_mm_reduce_add_ps(x)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn reduce_sum_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [1, 2, 4, 8, 16] {
                let this = (0..n)
                    .map(|_| rng.random_range(-1000.0..=1000.0))
                    .collect::<Vec<f32>>();
                let specialized = unsafe { reduce_sum_v2(&this) };
                let fallback = fallback(&this);
                assert_eq!(
                    specialized.to_bits(),
                    fallback.to_bits(),
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn reduce_sum_a2(this: &[f32]) -> f32 {
        use core::arch::aarch64::*;
        let a = this.as_ptr();
        let x = match this.len() {
            4 => unsafe { vld1q_f32(a) },
            8 => {
                let (x0, x1) = unsafe { (vld1q_f32(a), vld1q_f32(a.add(4))) };
                vaddq_f32(x0, x1)
            }
            16 => {
                let (x0, x1, x2, x3) = unsafe {
                    (
                        vld1q_f32(a),
                        vld1q_f32(a.add(4)),
                        vld1q_f32(a.add(8)),
                        vld1q_f32(a.add(12)),
                    )
                };
                vaddq_f32(vaddq_f32(x0, x2), vaddq_f32(x1, x3))
            }
            _ => return fallback(this),
        };
        let x = vadd_f32(vget_low_f32(x), vget_high_f32(x));
        vpadds_f32(x)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn reduce_sum_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [1, 2, 4, 8, 16] {
                let this = (0..n)
                    .map(|_| rng.random_range(-1000.0..=1000.0))
                    .collect::<Vec<f32>>();
                let specialized = unsafe { reduce_sum_a2(&this) };
                let fallback = fallback(&this);
                assert_eq!(
                    specialized.to_bits(),
                    fallback.to_bits(),
                    "specialized = {specialized}, fallback = {fallback}."
                );
            }
        }
    }

    #[crate::multiversion(ReduceSum, @"v4", @"v3", @"v2", @"a2")]
    pub fn reduce_sum(this: &[f32]) -> f32 {
        crate::emulate::fold_halves(this, |x, y| x + y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Descriptor, Target, f16};

    #[test]
    fn integer_sums_wrap() {
        let d = Descriptor::<u8>::new(Target::V2);
        assert_eq!(reduce_sum(&Vector::splat(d, 255u8)), 240);
        let d = Descriptor::<i16>::new(Target::V4);
        assert_eq!(reduce_sum(&Vector::splat(d, i16::MAX)), -32);
        let d = Descriptor::<u64>::new(Target::Fallback);
        assert_eq!(reduce_sum(&Vector::splat(d, u64::MAX)), u64::MAX - 1);
    }

    #[test]
    fn float_sums_fold_halves() {
        let d = Descriptor::<f32>::new(Target::V2);
        let v = Vector::load(d, &[1.0e8, 1.0, -1.0e8, 1.0]);
        // (1e8 + -1e8) + (1 + 1)
        assert_eq!(reduce_sum(&v), 2.0);
        let d = Descriptor::<f16>::new(Target::V2);
        let v = Vector::iota(d, 1);
        assert_eq!(reduce_sum(&v), f16::from_f32(36.0));
        let d = Descriptor::<f64>::new(Target::V3);
        assert_eq!(reduce_sum(&Vector::iota(d, 0)), 6.0);
    }

    #[test]
    fn min_max_and_broadcast() {
        let d = Descriptor::<i32>::new(Target::V3);
        let v = Vector::from_fn(d, |i| if i % 2 == 0 { -(i as i32) } else { i as i32 * 3 });
        assert_eq!(reduce_min(&v), -6);
        assert_eq!(reduce_max(&v), 21);
        assert_eq!(min_of_lanes(&v), Vector::splat(d, -6));
        assert_eq!(max_of_lanes(&v), Vector::splat(d, 21));
        assert_eq!(sum_of_lanes(&v), Vector::splat(d, 48 - 12));
        let d = Descriptor::<f32>::new(Target::V2).capped(2);
        let v = Vector::load(d, &[-0.5, 3.5]);
        assert_eq!(reduce_min(&v), -0.5);
        assert_eq!(reduce_max(&v), 3.5);
    }
}
