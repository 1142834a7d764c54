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

//! Sums of 2, 4 or 8 adjacent lanes into widened lanes.

use crate::{SumsOf4, SumsOf8, Vector, Wide2, Wide3, Widen};

/// Lane `g` of the result is `v[2g] + v[2g + 1]`, computed in `T::Wide`.
pub fn sums_of_2<T: Widen>(v: &Vector<T>) -> Vector<T::Wide> {
    let d = v.descriptor();
    assert!(d.lanes() >= 2, "summing pairs of a {d:?}");
    let mut result = Vector::zero(d.repartition::<T::Wide>());
    T::sums_of_2(v.as_slice(), result.as_mut_slice());
    result
}

/// Lane `g` of the result is the sum of `v[4g..4g + 4]`, computed in
/// [`Wide2<T>`].
pub fn sums_of_4<T: SumsOf4>(v: &Vector<T>) -> Vector<Wide2<T>> {
    let d = v.descriptor();
    assert!(d.lanes() >= 4, "summing quads of a {d:?}");
    let mut result = Vector::zero(d.repartition::<Wide2<T>>());
    T::sums_of_4(v.as_slice(), result.as_mut_slice());
    result
}

/// Lane `g` of the result is the sum of `v[8g..8g + 8]`, computed in
/// [`Wide3<T>`].
pub fn sums_of_8<T: SumsOf8>(v: &Vector<T>) -> Vector<Wide3<T>> {
    let d = v.descriptor();
    assert!(d.lanes() >= 8, "summing octets of a {d:?}");
    let mut result = Vector::zero(d.repartition::<Wide3<T>>());
    T::sums_of_8(v.as_slice(), result.as_mut_slice());
    result
}

macro_rules! widen {
    ($($t:ident => $w:ident),*) => {
        paste::paste! {
            $(
                impl Widen for $t {
                    type Wide = $w;

                    #[inline(always)]
                    fn widen(self) -> $w {
                        $w::from(self)
                    }

                    #[inline(always)]
                    fn sums_of_2(this: &[$t], result: &mut [$w]) {
                        [<sums_of_2_ $t>]::sums_of_2(this, result)
                    }
                }
            )*
        }
    };
}

widen!(
    u8 => u16, i8 => i16, u16 => u32, i16 => i32,
    u32 => u64, i32 => i64, f32 => f64
);

macro_rules! sums_of_4 {
    ($($t:ident => $w:ident),*) => {
        paste::paste! {
            $(
                impl SumsOf4 for $t {
                    #[inline(always)]
                    fn sums_of_4(this: &[$t], result: &mut [$w]) {
                        [<sums_of_4_ $t>]::sums_of_4(this, result)
                    }
                }
            )*
        }
    };
}

sums_of_4!(u8 => u32, i8 => i32, u16 => u64, i16 => i64);

macro_rules! sums_of_8 {
    ($($t:ident => $w:ident),*) => {
        paste::paste! {
            $(
                impl SumsOf8 for $t {
                    #[inline(always)]
                    fn sums_of_8(this: &[$t], result: &mut [$w]) {
                        [<sums_of_8_ $t>]::sums_of_8(this, result)
                    }
                }
            )*
        }
    };
}

sums_of_8!(u8 => u64, i8 => i64);

macro_rules! portable {
    ($k:literal, $algorithm:ident: $($t:ident => $w:ident),*) => {
        paste::paste! {
            $(
                #[cfg_attr(feature = "internal", simd_macros::public)]
                pub(crate) mod [<sums_of_ $k _ $t>] {
                    #[crate::multiversion($algorithm, "v3", "v2", "a2")]
                    pub fn [<sums_of_ $k>](this: &[$t], result: &mut [$w]) {
                        crate::emulate::group_sums::<_, _, $k>(this, result, $w::from, |x, y| x + y)
                    }
                }
            )*
        }
    };
}

portable!(2, SumsOf2: u16 => u32, i16 => i32, u32 => u64, i32 => i64, f32 => f64);
portable!(4, SumsOf4: u16 => u64, i16 => i64);

#[cfg_attr(feature = "internal", simd_macros::public)]
pub(crate) mod sums_of_2_u8 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_2_v3(this: &[u8], result: &mut [u16]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 2);
        let (this, this_tail) = this.as_chunks::<32>();
        let (result, result_tail) = result.as_chunks_mut::<16>();
        let ones = _mm256_set1_epi8(1);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            let s = _mm256_maddubs_epi16(x, ones);
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), s) };
        }
        sums_of_2_v2(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_2_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [2, 4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_2_v3(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_2_v2(this: &[u8], result: &mut [u16]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 2);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        let ones = _mm_set1_epi8(1);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            let s = _mm_maddubs_epi16(x, ones);
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), s) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_2_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [2, 4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_2_v2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_2_a2(this: &[u8], result: &mut [u16]) {
        use core::arch::aarch64::*;
        assert_eq!(this.len(), result.len() * 2);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { vld1q_u8(x.as_ptr()) };
            unsafe { vst1q_u16(r.as_mut_ptr(), vpaddlq_u8(x)) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_2_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [2, 4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_2_a2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(SumsOf2, @"v3", @"v2", @"a2")]
    pub fn sums_of_2(this: &[u8], result: &mut [u16]) {
        crate::emulate::group_sums::<_, _, 2>(this, result, u16::from, |x, y| x + y)
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
pub(crate) mod sums_of_2_i8 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_2_v3(this: &[i8], result: &mut [i16]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 2);
        let (this, this_tail) = this.as_chunks::<32>();
        let (result, result_tail) = result.as_chunks_mut::<16>();
        let ones = _mm256_set1_epi8(1);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            let s = _mm256_maddubs_epi16(ones, x);
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), s) };
        }
        sums_of_2_v2(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_2_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [2, 4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_2_v3(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_2_v2(this: &[i8], result: &mut [i16]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 2);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        let ones = _mm_set1_epi8(1);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            let s = _mm_maddubs_epi16(ones, x);
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), s) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_2_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [2, 4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_2_v2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_2_a2(this: &[i8], result: &mut [i16]) {
        use core::arch::aarch64::*;
        assert_eq!(this.len(), result.len() * 2);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { vld1q_s8(x.as_ptr()) };
            unsafe { vst1q_s16(r.as_mut_ptr(), vpaddlq_s8(x)) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_2_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [2, 4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_2_a2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(SumsOf2, @"v3", @"v2", @"a2")]
    pub fn sums_of_2(this: &[i8], result: &mut [i16]) {
        crate::emulate::group_sums::<_, _, 2>(this, result, i16::from, |x, y| x + y)
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
pub(crate) mod sums_of_4_u8 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_4_v3(this: &[u8], result: &mut [u32]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 4);
        let (this, this_tail) = this.as_chunks::<32>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        let ones8 = _mm256_set1_epi8(1);
        let ones16 = _mm256_set1_epi16(1);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            let s = _mm256_madd_epi16(_mm256_maddubs_epi16(x, ones8), ones16);
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), s) };
        }
        sums_of_4_v2(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_4_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 4];
                let mut fallback = vec![0; n / 4];
                unsafe { sums_of_4_v3(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_4_v2(this: &[u8], result: &mut [u32]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 4);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<4>();
        let ones8 = _mm_set1_epi8(1);
        let ones16 = _mm_set1_epi16(1);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            let s = _mm_madd_epi16(_mm_maddubs_epi16(x, ones8), ones16);
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), s) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_4_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 4];
                let mut fallback = vec![0; n / 4];
                unsafe { sums_of_4_v2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_4_a2(this: &[u8], result: &mut [u32]) {
        use core::arch::aarch64::*;
        assert_eq!(this.len(), result.len() * 4);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<4>();
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { vld1q_u8(x.as_ptr()) };
            unsafe { vst1q_u32(r.as_mut_ptr(), vpaddlq_u16(vpaddlq_u8(x))) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_4_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 4];
                let mut fallback = vec![0; n / 4];
                unsafe { sums_of_4_a2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(SumsOf4, @"v3", @"v2", @"a2")]
    pub fn sums_of_4(this: &[u8], result: &mut [u32]) {
        crate::emulate::group_sums::<_, _, 4>(this, result, u32::from, |x, y| x + y)
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
pub(crate) mod sums_of_4_i8 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_4_v3(this: &[i8], result: &mut [i32]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 4);
        let (this, this_tail) = this.as_chunks::<32>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        let ones8 = _mm256_set1_epi8(1);
        let ones16 = _mm256_set1_epi16(1);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            let s = _mm256_madd_epi16(_mm256_maddubs_epi16(ones8, x), ones16);
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), s) };
        }
        sums_of_4_v2(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_4_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 4];
                let mut fallback = vec![0; n / 4];
                unsafe { sums_of_4_v3(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_4_v2(this: &[i8], result: &mut [i32]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 4);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<4>();
        let ones8 = _mm_set1_epi8(1);
        let ones16 = _mm_set1_epi16(1);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            let s = _mm_madd_epi16(_mm_maddubs_epi16(ones8, x), ones16);
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), s) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_4_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 4];
                let mut fallback = vec![0; n / 4];
                unsafe { sums_of_4_v2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_4_a2(this: &[i8], result: &mut [i32]) {
        use core::arch::aarch64::*;
        assert_eq!(this.len(), result.len() * 4);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<4>();
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { vld1q_s8(x.as_ptr()) };
            unsafe { vst1q_s32(r.as_mut_ptr(), vpaddlq_s16(vpaddlq_s8(x))) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_4_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [4, 8, 16, 32, 64, 96] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 4];
                let mut fallback = vec![0; n / 4];
                unsafe { sums_of_4_a2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(SumsOf4, @"v3", @"v2", @"a2")]
    pub fn sums_of_4(this: &[i8], result: &mut [i32]) {
        crate::emulate::group_sums::<_, _, 4>(this, result, i32::from, |x, y| x + y)
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
pub(crate) mod sums_of_8_u8 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_v4(this: &[u8], result: &mut [u64]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 8);
        let (this, this_tail) = this.as_chunks::<64>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        let zero = _mm512_setzero_si512();
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm512_loadu_si512(x.as_ptr().cast()) };
            unsafe { _mm512_storeu_si512(r.as_mut_ptr().cast(), _mm512_sad_epu8(x, zero)) };
        }
        sums_of_8_v3(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_v4_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_v4(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_v3(this: &[u8], result: &mut [u64]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 8);
        let (this, this_tail) = this.as_chunks::<32>();
        let (result, result_tail) = result.as_chunks_mut::<4>();
        let zero = _mm256_setzero_si256();
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), _mm256_sad_epu8(x, zero)) };
        }
        sums_of_8_v2(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_v3(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_v2(this: &[u8], result: &mut [u64]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 8);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<2>();
        let zero = _mm_setzero_si128();
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), _mm_sad_epu8(x, zero)) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_v2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_a2(this: &[u8], result: &mut [u64]) {
        use core::arch::aarch64::*;
        assert_eq!(this.len(), result.len() * 8);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<2>();
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { vld1q_u8(x.as_ptr()) };
            let s = vpaddlq_u32(vpaddlq_u16(vpaddlq_u8(x)));
            unsafe { vst1q_u64(r.as_mut_ptr(), s) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_8_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_a2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(SumsOf8, @"v4", @"v3", @"v2", @"a2")]
    pub fn sums_of_8(this: &[u8], result: &mut [u64]) {
        crate::emulate::group_sums::<_, _, 8>(this, result, u64::from, |x, y| x + y)
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
pub(crate) mod sums_of_8_i8 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_v4(this: &[i8], result: &mut [i64]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 8);
        let (this, this_tail) = this.as_chunks::<64>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        let zero = _mm512_setzero_si512();
        let flip = _mm512_set1_epi8(i8::MIN);
        let bias = _mm512_set1_epi64(8 * 128);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm512_loadu_si512(x.as_ptr().cast()) };
            let s = _mm512_sub_epi64(_mm512_sad_epu8(_mm512_xor_si512(x, flip), zero), bias);
            unsafe { _mm512_storeu_si512(r.as_mut_ptr().cast(), s) };
        }
        sums_of_8_v3(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_v4_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_v4(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_v3(this: &[i8], result: &mut [i64]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 8);
        let (this, this_tail) = this.as_chunks::<32>();
        let (result, result_tail) = result.as_chunks_mut::<4>();
        let zero = _mm256_setzero_si256();
        let flip = _mm256_set1_epi8(i8::MIN);
        let bias = _mm256_set1_epi64x(8 * 128);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            let s = _mm256_sub_epi64(_mm256_sad_epu8(_mm256_xor_si256(x, flip), zero), bias);
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), s) };
        }
        sums_of_8_v2(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_v3(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_v2(this: &[i8], result: &mut [i64]) {
        use core::arch::x86_64::*;
        assert_eq!(this.len(), result.len() * 8);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<2>();
        let zero = _mm_setzero_si128();
        let flip = _mm_set1_epi8(i8::MIN);
        let bias = _mm_set1_epi64x(8 * 128);
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            let s = _mm_sub_epi64(_mm_sad_epu8(_mm_xor_si128(x, flip), zero), bias);
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), s) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_v2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_a2(this: &[i8], result: &mut [i64]) {
        use core::arch::aarch64::*;
        assert_eq!(this.len(), result.len() * 8);
        let (this, this_tail) = this.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<2>();
        for (x, r) in this.iter().zip(result.iter_mut()) {
            let x = unsafe { vld1q_s8(x.as_ptr()) };
            let s = vpaddlq_s32(vpaddlq_s16(vpaddlq_s8(x)));
            unsafe { vst1q_s64(r.as_mut_ptr(), s) };
        }
        fallback(this_tail, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_8_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let this = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_a2(&this, &mut specialized) };
                self::fallback(&this, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(SumsOf8, @"v4", @"v3", @"v2", @"a2")]
    pub fn sums_of_8(this: &[i8], result: &mut [i64]) {
        crate::emulate::group_sums::<_, _, 8>(this, result, i64::from, |x, y| x + y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Descriptor, Target};

    #[test]
    fn pairs_quads_and_octets() {
        let d = Descriptor::<u8>::new(Target::V2);
        let v = Vector::splat(d, 255u8);
        assert_eq!(sums_of_2(&v), Vector::splat(d.repartition::<u16>(), 510));
        assert_eq!(sums_of_4(&v), Vector::splat(d.repartition::<u32>(), 1020));
        assert_eq!(sums_of_8(&v), Vector::splat(d.repartition::<u64>(), 2040));
        let d = Descriptor::<i8>::new(Target::V3);
        let v = Vector::splat(d, i8::MIN);
        assert_eq!(sums_of_8(&v).to_vec(), vec![-1024i64; 4]);
        let d = Descriptor::<u16>::new(Target::V2);
        let v = Vector::iota(d, 65532);
        assert_eq!(sums_of_2(&v).to_vec(), vec![131065u32, 131069, 1, 5]);
        assert_eq!(sums_of_4(&v).to_vec(), vec![262134u64, 6]);
        let d = Descriptor::<f32>::new(Target::V2);
        let v = Vector::load(d, &[f32::MAX, f32::MAX, 0.5, 0.25]);
        assert_eq!(sums_of_2(&v).to_vec(), vec![2.0 * f32::MAX as f64, 0.75]);
    }

    #[test]
    #[should_panic]
    fn octets_need_eight_lanes() {
        let d = Descriptor::<u8>::new(Target::V2).capped(4);
        let _ = sums_of_8(&Vector::zero(d));
    }
}
