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

//! Sums of absolute differences of byte lanes.
//!
//! The quad kernels work on independent 16-lane blocks. Output lane `i`
//! belongs to block `i / 8` and compares a sliding 4-lane window of the first
//! operand against a fixed quad of the second. Lanes whose windows do not fit
//! inside the vector are zero.

use crate::{AbsDiff, Descriptor, Vector, Wide3};

fn descriptor_of<T: AbsDiff>(a: &Vector<T>, b: &Vector<T>) -> Descriptor<T> {
    let d = a.descriptor();
    assert_eq!(d, b.descriptor(), "operands have different shapes");
    d
}

/// Lane `g` of the result is `Σ |a[8g + k] - b[8g + k]|` over `k < 8`.
pub fn sums_of_8_abs_diff<T: AbsDiff>(a: &Vector<T>, b: &Vector<T>) -> Vector<Wide3<T>> {
    let d = descriptor_of(a, b);
    assert!(d.lanes() >= 8, "summing octets of a {d:?}");
    let mut result = Vector::zero(d.repartition::<Wide3<T>>());
    T::sums_of_8_abs_diff(a.as_slice(), b.as_slice(), result.as_mut_slice());
    result
}

/// Lane `i` of the result, with `block = 16 * (i / 8)` and `j = i % 8`, is
/// `Σ |a[block + 4A + j + k] - b[block + 4B + k]|` over `k < 4`.
pub fn sums_of_adj_quad_abs_diff<const A: usize, const B: usize, T: AbsDiff>(
    a: &Vector<T>,
    b: &Vector<T>,
) -> Vector<T::Wide> {
    const { assert!(A <= 1 && B <= 3, "quad offsets out of range") };
    let d = descriptor_of(a, b);
    let mut result = Vector::zero(d.repartition::<T::Wide>());
    T::sums_of_adj_quad_abs_diff(a.as_slice(), b.as_slice(), A, B, result.as_mut_slice());
    result
}

/// Within every 16-lane block, quad `k` of the query is quad `Ik` of `a`.
/// Lane `i` of the result, with `block = 16 * (i / 8)` and `j = i % 8`, is
/// `Σ |query[block + 8 (j / 4) + j % 4 + k] - b[block + 4 (j / 2) + k]|` over
/// `k < 4`. A lane that reads a quad missing from a narrow vector is zero.
pub fn sums_of_shuffled_quad_abs_diff<
    const I3: usize,
    const I2: usize,
    const I1: usize,
    const I0: usize,
    T: AbsDiff,
>(
    a: &Vector<T>,
    b: &Vector<T>,
) -> Vector<T::Wide> {
    const { assert!(I0 <= 3 && I1 <= 3 && I2 <= 3 && I3 <= 3, "quad index out of range") };
    let d = descriptor_of(a, b);
    let indices = [I0, I1, I2, I3];
    let mut result = Vector::zero(d.repartition::<T::Wide>());
    T::sums_of_shuffled_quad_abs_diff(a.as_slice(), b.as_slice(), indices, result.as_mut_slice());
    result
}

impl AbsDiff for u8 {
    #[inline(always)]
    fn sums_of_8_abs_diff(a: &[u8], b: &[u8], result: &mut [u64]) {
        sums_of_8_abs_diff_u8::sums_of_8_abs_diff(a, b, result)
    }

    #[inline(always)]
    fn sums_of_adj_quad_abs_diff(
        a: &[u8],
        b: &[u8],
        a_offset: usize,
        b_offset: usize,
        result: &mut [u16],
    ) {
        sums_of_adj_quad_abs_diff_u8::sums_of_adj_quad_abs_diff(a, b, a_offset, b_offset, result)
    }

    #[inline(always)]
    fn sums_of_shuffled_quad_abs_diff(
        a: &[u8],
        b: &[u8],
        indices: [usize; 4],
        result: &mut [u16],
    ) {
        sums_of_shuffled_quad_abs_diff_u8::sums_of_shuffled_quad_abs_diff(a, b, indices, result)
    }
}

impl AbsDiff for i8 {
    #[inline(always)]
    fn sums_of_8_abs_diff(a: &[i8], b: &[i8], result: &mut [i64]) {
        sums_of_8_abs_diff_i8::sums_of_8_abs_diff(a, b, result)
    }

    #[inline(always)]
    fn sums_of_adj_quad_abs_diff(
        a: &[i8],
        b: &[i8],
        a_offset: usize,
        b_offset: usize,
        result: &mut [i16],
    ) {
        sums_of_adj_quad_abs_diff_i8::sums_of_adj_quad_abs_diff(a, b, a_offset, b_offset, result)
    }

    #[inline(always)]
    fn sums_of_shuffled_quad_abs_diff(
        a: &[i8],
        b: &[i8],
        indices: [usize; 4],
        result: &mut [i16],
    ) {
        sums_of_shuffled_quad_abs_diff_i8::sums_of_shuffled_quad_abs_diff(a, b, indices, result)
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
mod sums_of_8_abs_diff_u8 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_abs_diff_v4(a: &[u8], b: &[u8], result: &mut [u64]) {
        use core::arch::x86_64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 8);
        let (a, a_tail) = a.as_chunks::<64>();
        let (b, b_tail) = b.as_chunks::<64>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let x = unsafe { _mm512_loadu_si512(x.as_ptr().cast()) };
            let y = unsafe { _mm512_loadu_si512(y.as_ptr().cast()) };
            unsafe { _mm512_storeu_si512(r.as_mut_ptr().cast(), _mm512_sad_epu8(x, y)) };
        }
        sums_of_8_abs_diff_v3(a_tail, b_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_abs_diff_v4_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_abs_diff_v4(&a, &b, &mut specialized) };
                self::fallback(&a, &b, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_abs_diff_v3(a: &[u8], b: &[u8], result: &mut [u64]) {
        use core::arch::x86_64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 8);
        let (a, a_tail) = a.as_chunks::<32>();
        let (b, b_tail) = b.as_chunks::<32>();
        let (result, result_tail) = result.as_chunks_mut::<4>();
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            let y = unsafe { _mm256_loadu_si256(y.as_ptr().cast()) };
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), _mm256_sad_epu8(x, y)) };
        }
        sums_of_8_abs_diff_v2(a_tail, b_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_abs_diff_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_abs_diff_v3(&a, &b, &mut specialized) };
                self::fallback(&a, &b, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_abs_diff_v2(a: &[u8], b: &[u8], result: &mut [u64]) {
        use core::arch::x86_64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 8);
        let (a, a_tail) = a.as_chunks::<16>();
        let (b, b_tail) = b.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<2>();
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            let y = unsafe { _mm_loadu_si128(y.as_ptr().cast()) };
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), _mm_sad_epu8(x, y)) };
        }
        fallback(a_tail, b_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_abs_diff_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_abs_diff_v2(&a, &b, &mut specialized) };
                self::fallback(&a, &b, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_abs_diff_a2(a: &[u8], b: &[u8], result: &mut [u64]) {
        use core::arch::aarch64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 8);
        let (a, a_tail) = a.as_chunks::<16>();
        let (b, b_tail) = b.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<2>();
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let (x, y) = unsafe { (vld1q_u8(x.as_ptr()), vld1q_u8(y.as_ptr())) };
            let s = vpaddlq_u32(vpaddlq_u16(vpaddlq_u8(vabdq_u8(x, y))));
            unsafe { vst1q_u64(r.as_mut_ptr(), s) };
        }
        fallback(a_tail, b_tail, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_8_abs_diff_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_abs_diff_a2(&a, &b, &mut specialized) };
                self::fallback(&a, &b, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(SumsOf8AbsDiff, @"v4", @"v3", @"v2", @"a2")]
    pub fn sums_of_8_abs_diff(a: &[u8], b: &[u8], result: &mut [u64]) {
        crate::emulate::octet_abs_diff(a, b, result, |x, y| u64::from(x.abs_diff(y)))
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
mod sums_of_8_abs_diff_i8 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_abs_diff_v4(a: &[i8], b: &[i8], result: &mut [i64]) {
        use core::arch::x86_64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 8);
        let (a, a_tail) = a.as_chunks::<64>();
        let (b, b_tail) = b.as_chunks::<64>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        let flip = _mm512_set1_epi8(i8::MIN);
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let x = unsafe { _mm512_loadu_si512(x.as_ptr().cast()) };
            let y = unsafe { _mm512_loadu_si512(y.as_ptr().cast()) };
            let s = _mm512_sad_epu8(_mm512_xor_si512(x, flip), _mm512_xor_si512(y, flip));
            unsafe { _mm512_storeu_si512(r.as_mut_ptr().cast(), s) };
        }
        sums_of_8_abs_diff_v3(a_tail, b_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_abs_diff_v4_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_abs_diff_v4(&a, &b, &mut specialized) };
                self::fallback(&a, &b, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_abs_diff_v3(a: &[i8], b: &[i8], result: &mut [i64]) {
        use core::arch::x86_64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 8);
        let (a, a_tail) = a.as_chunks::<32>();
        let (b, b_tail) = b.as_chunks::<32>();
        let (result, result_tail) = result.as_chunks_mut::<4>();
        let flip = _mm256_set1_epi8(i8::MIN);
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            let y = unsafe { _mm256_loadu_si256(y.as_ptr().cast()) };
            let s = _mm256_sad_epu8(_mm256_xor_si256(x, flip), _mm256_xor_si256(y, flip));
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), s) };
        }
        sums_of_8_abs_diff_v2(a_tail, b_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_abs_diff_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_abs_diff_v3(&a, &b, &mut specialized) };
                self::fallback(&a, &b, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_abs_diff_v2(a: &[i8], b: &[i8], result: &mut [i64]) {
        use core::arch::x86_64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 8);
        let (a, a_tail) = a.as_chunks::<16>();
        let (b, b_tail) = b.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<2>();
        let flip = _mm_set1_epi8(i8::MIN);
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            let y = unsafe { _mm_loadu_si128(y.as_ptr().cast()) };
            let s = _mm_sad_epu8(_mm_xor_si128(x, flip), _mm_xor_si128(y, flip));
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), s) };
        }
        fallback(a_tail, b_tail, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_8_abs_diff_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_abs_diff_v2(&a, &b, &mut specialized) };
                self::fallback(&a, &b, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_8_abs_diff_a2(a: &[i8], b: &[i8], result: &mut [i64]) {
        use core::arch::aarch64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 8);
        let (a, a_tail) = a.as_chunks::<16>();
        let (b, b_tail) = b.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<2>();
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let (x, y) = unsafe { (vld1q_s8(x.as_ptr()), vld1q_s8(y.as_ptr())) };
            let d = vreinterpretq_u8_s8(vabdq_s8(x, y));
            let s = vreinterpretq_s64_u64(vpaddlq_u32(vpaddlq_u16(vpaddlq_u8(d))));
            unsafe { vst1q_s64(r.as_mut_ptr(), s) };
        }
        fallback(a_tail, b_tail, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_8_abs_diff_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [8, 16, 32, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<i8>>();
                let mut specialized = vec![0; n / 8];
                let mut fallback = vec![0; n / 8];
                unsafe { sums_of_8_abs_diff_a2(&a, &b, &mut specialized) };
                self::fallback(&a, &b, &mut fallback);
                assert_eq!(specialized, fallback);
            }
        }
    }

    #[crate::multiversion(SumsOf8AbsDiff, @"v4", @"v3", @"v2", @"a2")]
    pub fn sums_of_8_abs_diff(a: &[i8], b: &[i8], result: &mut [i64]) {
        crate::emulate::octet_abs_diff(a, b, result, |x, y| i64::from(x.abs_diff(y)))
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
mod sums_of_adj_quad_abs_diff_u8 {
    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_adj_quad_abs_diff_v3(
        a: &[u8],
        b: &[u8],
        a_offset: usize,
        b_offset: usize,
        result: &mut [u16],
    ) {
        use core::arch::x86_64::*;
        assert!(a_offset <= 1 && b_offset <= 3);
        assert!(a.len() == b.len() && a.len() == result.len() * 2);
        let (a, a_tail) = a.as_chunks::<32>();
        let (b, b_tail) = b.as_chunks::<32>();
        let (result, result_tail) = result.as_chunks_mut::<16>();
        let selector = (a_offset << 2) | b_offset;
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            let y = unsafe { _mm256_loadu_si256(y.as_ptr().cast()) };
            let s = seq_macro::seq!(
                S in 0..8 {
                    match selector {
                        #(S => _mm256_mpsadbw_epu8::<{ S | (S << 3) }>(x, y),)*
                        _ => unreachable!(),
                    }
                }
            );
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), s) };
        }
        sums_of_adj_quad_abs_diff_v2(a_tail, b_tail, a_offset, b_offset, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_adj_quad_abs_diff_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [4, 8, 16, 32, 48, 64, 128] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let (a_offset, b_offset) = (rng.random_range(0..2), rng.random_range(0..4));
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe {
                    sums_of_adj_quad_abs_diff_v3(&a, &b, a_offset, b_offset, &mut specialized)
                };
                self::fallback(&a, &b, a_offset, b_offset, &mut fallback);
                assert_eq!(specialized, fallback, "offsets = ({a_offset}, {b_offset})");
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_adj_quad_abs_diff_v2(
        a: &[u8],
        b: &[u8],
        a_offset: usize,
        b_offset: usize,
        result: &mut [u16],
    ) {
        use core::arch::x86_64::*;
        assert!(a_offset <= 1 && b_offset <= 3);
        assert!(a.len() == b.len() && a.len() == result.len() * 2);
        let (a, a_tail) = a.as_chunks::<16>();
        let (b, b_tail) = b.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        let selector = (a_offset << 2) | b_offset;
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            let y = unsafe { _mm_loadu_si128(y.as_ptr().cast()) };
            let s = seq_macro::seq!(
                S in 0..8 {
                    match selector {
                        #(S => _mm_mpsadbw_epu8::<S>(x, y),)*
                        _ => unreachable!(),
                    }
                }
            );
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), s) };
        }
        fallback(a_tail, b_tail, a_offset, b_offset, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_adj_quad_abs_diff_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [4, 8, 16, 32, 48, 64, 128] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let (a_offset, b_offset) = (rng.random_range(0..2), rng.random_range(0..4));
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe {
                    sums_of_adj_quad_abs_diff_v2(&a, &b, a_offset, b_offset, &mut specialized)
                };
                self::fallback(&a, &b, a_offset, b_offset, &mut fallback);
                assert_eq!(specialized, fallback, "offsets = ({a_offset}, {b_offset})");
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_adj_quad_abs_diff_a2(
        a: &[u8],
        b: &[u8],
        a_offset: usize,
        b_offset: usize,
        result: &mut [u16],
    ) {
        use core::arch::aarch64::*;
        assert!(a_offset <= 1 && b_offset <= 3);
        assert!(a.len() == b.len() && a.len() == result.len() * 2);
        let (a, a_tail) = a.as_chunks::<16>();
        let (b, b_tail) = b.as_chunks::<16>();
        let (result, result_tail) = result.as_chunks_mut::<8>();
        for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
            let mut sum = vdupq_n_u16(0);
            for k in 0..4 {
                // at most 8 bytes from offset 7
                let window = unsafe { vld1_u8(x.as_ptr().add(4 * a_offset + k)) };
                sum = vabal_u8(sum, window, vdup_n_u8(y[4 * b_offset + k]));
            }
            unsafe { vst1q_u16(r.as_mut_ptr(), sum) };
        }
        fallback(a_tail, b_tail, a_offset, b_offset, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_adj_quad_abs_diff_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [4, 8, 16, 32, 48, 64, 128] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let (a_offset, b_offset) = (rng.random_range(0..2), rng.random_range(0..4));
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe {
                    sums_of_adj_quad_abs_diff_a2(&a, &b, a_offset, b_offset, &mut specialized)
                };
                self::fallback(&a, &b, a_offset, b_offset, &mut fallback);
                assert_eq!(specialized, fallback, "offsets = ({a_offset}, {b_offset})");
            }
        }
    }

    #[crate::multiversion(SumsOfAdjQuadAbsDiff, @"v3", @"v2", @"a2")]
    pub fn sums_of_adj_quad_abs_diff(
        a: &[u8],
        b: &[u8],
        a_offset: usize,
        b_offset: usize,
        result: &mut [u16],
    ) {
        crate::emulate::adj_quad_abs_diff(a, b, a_offset, b_offset, result, |x, y| {
            u16::from(x.abs_diff(y))
        })
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
mod sums_of_adj_quad_abs_diff_i8 {
    #[crate::multiversion(SumsOfAdjQuadAbsDiff, "v3", "v2", "a2")]
    pub fn sums_of_adj_quad_abs_diff(
        a: &[i8],
        b: &[i8],
        a_offset: usize,
        b_offset: usize,
        result: &mut [i16],
    ) {
        crate::emulate::adj_quad_abs_diff(a, b, a_offset, b_offset, result, |x, y| {
            i16::from(x.abs_diff(y))
        })
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
mod sums_of_shuffled_quad_abs_diff_u8 {
    /// `pshufb` control moving quad `indices[k]` to quad `k`.
    #[cfg(target_arch = "x86_64")]
    fn control(indices: [usize; 4]) -> [u8; 16] {
        assert!(indices.iter().all(|&index| index <= 3));
        std::array::from_fn(|p| (4 * indices[p / 4] + p % 4) as u8)
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v4")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_shuffled_quad_abs_diff_v4(
        a: &[u8],
        b: &[u8],
        indices: [usize; 4],
        result: &mut [u16],
    ) {
        use core::arch::x86_64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 2);
        let control = control(indices);
        let control = _mm512_broadcast_i32x4(unsafe { _mm_loadu_si128(control.as_ptr().cast()) });
        let (a_chunks, a_tail) = a.as_chunks::<64>();
        let (b_chunks, b_tail) = b.as_chunks::<64>();
        let (result_chunks, result_tail) = result.as_chunks_mut::<32>();
        for ((x, y), r) in a_chunks.iter().zip(b_chunks).zip(result_chunks.iter_mut()) {
            let x = unsafe { _mm512_loadu_si512(x.as_ptr().cast()) };
            let y = unsafe { _mm512_loadu_si512(y.as_ptr().cast()) };
            let query = _mm512_shuffle_epi8(x, control);
            // the first operand holds the fixed quads, the second slides
            let s = _mm512_dbsad_epu8::<0b11_10_01_00>(y, query);
            unsafe { _mm512_storeu_si512(r.as_mut_ptr().cast(), s) };
        }
        sums_of_shuffled_quad_abs_diff_v3(a_tail, b_tail, indices, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_shuffled_quad_abs_diff_v4_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v4") {
            println!("test {} ... skipped (v4)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [16, 32, 48, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let indices = std::array::from_fn(|_| rng.random_range(0..4));
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_shuffled_quad_abs_diff_v4(&a, &b, indices, &mut specialized) };
                self::fallback(&a, &b, indices, &mut fallback);
                assert_eq!(specialized, fallback, "indices = {indices:?}");
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v3")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_shuffled_quad_abs_diff_v3(
        a: &[u8],
        b: &[u8],
        indices: [usize; 4],
        result: &mut [u16],
    ) {
        use core::arch::x86_64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 2);
        let control = control(indices);
        let control =
            _mm256_broadcastsi128_si256(unsafe { _mm_loadu_si128(control.as_ptr().cast()) });
        let (a_chunks, a_tail) = a.as_chunks::<32>();
        let (b_chunks, b_tail) = b.as_chunks::<32>();
        let (result_chunks, result_tail) = result.as_chunks_mut::<16>();
        for ((x, y), r) in a_chunks.iter().zip(b_chunks).zip(result_chunks.iter_mut()) {
            let x = unsafe { _mm256_loadu_si256(x.as_ptr().cast()) };
            let y = unsafe { _mm256_loadu_si256(y.as_ptr().cast()) };
            let query = _mm256_shuffle_epi8(x, control);
            let m00 = _mm256_mpsadbw_epu8::<0b000_000>(query, y);
            let m01 = _mm256_mpsadbw_epu8::<0b001_001>(query, y);
            let m12 = _mm256_mpsadbw_epu8::<0b110_110>(query, y);
            let m13 = _mm256_mpsadbw_epu8::<0b111_111>(query, y);
            let lo = _mm256_blend_epi16::<0b0000_1100>(m00, m01);
            let hi = _mm256_blend_epi16::<0b1100_0000>(m12, m13);
            let s = _mm256_blend_epi16::<0b1111_0000>(lo, hi);
            unsafe { _mm256_storeu_si256(r.as_mut_ptr().cast(), s) };
        }
        sums_of_shuffled_quad_abs_diff_v2(a_tail, b_tail, indices, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_shuffled_quad_abs_diff_v3_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v3") {
            println!("test {} ... skipped (v3)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [16, 32, 48, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let indices = std::array::from_fn(|_| rng.random_range(0..4));
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_shuffled_quad_abs_diff_v3(&a, &b, indices, &mut specialized) };
                self::fallback(&a, &b, indices, &mut fallback);
                assert_eq!(specialized, fallback, "indices = {indices:?}");
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "x86_64")]
    #[crate::target_cpu(enable = "v2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_shuffled_quad_abs_diff_v2(
        a: &[u8],
        b: &[u8],
        indices: [usize; 4],
        result: &mut [u16],
    ) {
        use core::arch::x86_64::*;
        assert!(a.len() == b.len() && a.len() == result.len() * 2);
        let control = control(indices);
        let control = unsafe { _mm_loadu_si128(control.as_ptr().cast()) };
        let (a_chunks, a_tail) = a.as_chunks::<16>();
        let (b_chunks, b_tail) = b.as_chunks::<16>();
        let (result_chunks, result_tail) = result.as_chunks_mut::<8>();
        for ((x, y), r) in a_chunks.iter().zip(b_chunks).zip(result_chunks.iter_mut()) {
            let x = unsafe { _mm_loadu_si128(x.as_ptr().cast()) };
            let y = unsafe { _mm_loadu_si128(y.as_ptr().cast()) };
            let query = _mm_shuffle_epi8(x, control);
            // lanes 0..2 against quad 0, 2..4 against quad 1, 4..6 against
            // quad 2 and 6..8 against quad 3, windows of lanes 4..8 from 8
            let m00 = _mm_mpsadbw_epu8::<0b000>(query, y);
            let m01 = _mm_mpsadbw_epu8::<0b001>(query, y);
            let m12 = _mm_mpsadbw_epu8::<0b110>(query, y);
            let m13 = _mm_mpsadbw_epu8::<0b111>(query, y);
            let lo = _mm_blend_epi16::<0b0000_1100>(m00, m01);
            let hi = _mm_blend_epi16::<0b1100_0000>(m12, m13);
            let s = _mm_blend_epi16::<0b1111_0000>(lo, hi);
            unsafe { _mm_storeu_si128(r.as_mut_ptr().cast(), s) };
        }
        fallback(a_tail, b_tail, indices, result_tail)
    }

    #[cfg(all(target_arch = "x86_64", test))]
    #[test]
    fn sums_of_shuffled_quad_abs_diff_v2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("v2") {
            println!("test {} ... skipped (v2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [16, 32, 48, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let indices = std::array::from_fn(|_| rng.random_range(0..4));
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_shuffled_quad_abs_diff_v2(&a, &b, indices, &mut specialized) };
                self::fallback(&a, &b, indices, &mut fallback);
                assert_eq!(specialized, fallback, "indices = {indices:?}");
            }
        }
    }

    #[inline]
    #[cfg(target_arch = "aarch64")]
    #[crate::target_cpu(enable = "a2")]
    #[cfg_attr(feature = "internal", simd_macros::public)]
    fn sums_of_shuffled_quad_abs_diff_a2(
        a: &[u8],
        b: &[u8],
        indices: [usize; 4],
        result: &mut [u16],
    ) {
        use core::arch::aarch64::*;
        assert!(indices.iter().all(|&index| index <= 3));
        assert!(a.len() == b.len() && a.len() == result.len() * 2);
        // table lookups gathering the k-th lane of every window
        let mut lookup_a = [[0u8; 8]; 4];
        let mut lookup_b = [[0u8; 8]; 4];
        for k in 0..4 {
            for j in 0..8 {
                let p = 8 * (j / 4) + j % 4 + k;
                lookup_a[k][j] = (4 * indices[p / 4] + p % 4) as u8;
                lookup_b[k][j] = (4 * (j / 2) + k) as u8;
            }
        }
        let (a_chunks, a_tail) = a.as_chunks::<16>();
        let (b_chunks, b_tail) = b.as_chunks::<16>();
        let (result_chunks, result_tail) = result.as_chunks_mut::<8>();
        for ((x, y), r) in a_chunks.iter().zip(b_chunks).zip(result_chunks.iter_mut()) {
            let (x, y) = unsafe { (vld1q_u8(x.as_ptr()), vld1q_u8(y.as_ptr())) };
            let mut sum = vdupq_n_u16(0);
            for k in 0..4 {
                let u = unsafe { vld1_u8(lookup_a[k].as_ptr()) };
                let v = unsafe { vld1_u8(lookup_b[k].as_ptr()) };
                sum = vabal_u8(sum, vqtbl1_u8(x, u), vqtbl1_u8(y, v));
            }
            unsafe { vst1q_u16(r.as_mut_ptr(), sum) };
        }
        fallback(a_tail, b_tail, indices, result_tail)
    }

    #[cfg(all(target_arch = "aarch64", test))]
    #[test]
    #[cfg_attr(miri, ignore)]
    fn sums_of_shuffled_quad_abs_diff_a2_test() {
        use rand::Rng;
        if !crate::is_cpu_detected!("a2") {
            println!("test {} ... skipped (a2)", module_path!());
            return;
        }
        let mut rng = rand::rng();
        for _ in 0..if cfg!(not(miri)) { 256 } else { 1 } {
            for n in [16, 32, 48, 64, 128, 192] {
                let a = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let b = (0..n).map(|_| rng.random()).collect::<Vec<u8>>();
                let indices = std::array::from_fn(|_| rng.random_range(0..4));
                let mut specialized = vec![0; n / 2];
                let mut fallback = vec![0; n / 2];
                unsafe { sums_of_shuffled_quad_abs_diff_a2(&a, &b, indices, &mut specialized) };
                self::fallback(&a, &b, indices, &mut fallback);
                assert_eq!(specialized, fallback, "indices = {indices:?}");
            }
        }
    }

    #[crate::multiversion(SumsOfShuffledQuadAbsDiff, @"v4", @"v3", @"v2", @"a2")]
    pub fn sums_of_shuffled_quad_abs_diff(
        a: &[u8],
        b: &[u8],
        indices: [usize; 4],
        result: &mut [u16],
    ) {
        crate::emulate::shuffled_quad_abs_diff(a, b, indices, result, |x, y| {
            u16::from(x.abs_diff(y))
        })
    }
}

#[cfg_attr(feature = "internal", simd_macros::public)]
mod sums_of_shuffled_quad_abs_diff_i8 {
    #[crate::multiversion(SumsOfShuffledQuadAbsDiff, "v4", "v3", "v2", "a2")]
    pub fn sums_of_shuffled_quad_abs_diff(
        a: &[i8],
        b: &[i8],
        indices: [usize; 4],
        result: &mut [i16],
    ) {
        crate::emulate::shuffled_quad_abs_diff(a, b, indices, result, |x, y| {
            i16::from(x.abs_diff(y))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Target;

    #[test]
    fn octets() {
        let d = Descriptor::<i8>::new(Target::V2);
        let a = Vector::splat(d, i8::MIN);
        let b = Vector::splat(d, i8::MAX);
        assert_eq!(sums_of_8_abs_diff(&a, &b).to_vec(), vec![8 * 255i64; 2]);
        let d = Descriptor::<u8>::new(Target::V3);
        let a = Vector::iota(d, 0);
        let b = Vector::splat(d, 8u8);
        assert_eq!(sums_of_8_abs_diff(&a, &b).to_vec(), vec![36, 28, 92, 156]);
    }

    #[test]
    fn adjacent_quads() {
        let d = Descriptor::<u8>::new(Target::V2);
        let a = Vector::iota(d, 0);
        let b = Vector::zero(d);
        let r = sums_of_adj_quad_abs_diff::<1, 3, _>(&a, &b);
        let expected = (0..8u16).map(|j| 4 * (4 + j) + 6).collect::<Vec<_>>();
        assert_eq!(r.to_vec(), expected);
        let d = d.capped(8);
        let r = sums_of_adj_quad_abs_diff::<1, 0, _>(&Vector::iota(d, 0), &Vector::zero(d));
        assert_eq!(r.to_vec(), vec![22, 0, 0, 0]);
    }

    #[test]
    fn shuffled_quads() {
        let d = Descriptor::<u8>::new(Target::V2);
        let a = Vector::iota(d, 0);
        let b = Vector::zero(d);
        let r = sums_of_shuffled_quad_abs_diff::<0, 1, 2, 3, _>(&a, &b);
        // the query is [12..16, 8..12, 4..8, 0..4]
        let query = [12, 13, 14, 15, 8, 9, 10, 11, 4, 5, 6, 7, 0, 1, 2, 3u16];
        let expected = (0..8)
            .map(|j| {
                let x = 8 * (j / 4) + j % 4;
                query[x..x + 4].iter().sum::<u16>()
            })
            .collect::<Vec<_>>();
        assert_eq!(r.to_vec(), expected);
    }

    #[test]
    fn quads_outside_narrow_vectors() {
        let d = Descriptor::<u8>::new(Target::Fallback).capped(8);
        let (a, b) = (Vector::iota(d, 0), Vector::zero(d));
        assert_eq!(sums_of_adj_quad_abs_diff::<0, 2, _>(&a, &b).to_vec(), vec![0; 4]);
        assert_eq!(sums_of_adj_quad_abs_diff::<0, 3, _>(&a, &b).to_vec(), vec![0; 4]);
        assert_eq!(sums_of_adj_quad_abs_diff::<1, 1, _>(&a, &b).to_vec(), vec![22, 0, 0, 0]);
        // quad 1 of the query would come from quad 2
        let r = sums_of_shuffled_quad_abs_diff::<0, 0, 2, 0, _>(&a, &b);
        assert_eq!(r.to_vec(), vec![6, 0, 0, 0]);
        let r = sums_of_shuffled_quad_abs_diff::<0, 0, 1, 3, _>(&a, &b);
        assert_eq!(r.to_vec(), vec![0; 4]);
        let d = d.capped(4);
        let (a, b) = (Vector::iota(d, 0), Vector::zero(d));
        assert_eq!(sums_of_adj_quad_abs_diff::<1, 0, _>(&a, &b).to_vec(), vec![0, 0]);
        assert_eq!(sums_of_adj_quad_abs_diff::<0, 0, _>(&a, &b).to_vec(), vec![6, 0]);
        let r = sums_of_shuffled_quad_abs_diff::<3, 2, 1, 1, _>(&a, &b);
        assert_eq!(r.to_vec(), vec![0, 0]);
    }
}
