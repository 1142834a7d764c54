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

use std::ops::Add;

/// Folds the upper half of `this` onto the lower half until one lane is
/// left, the way a register-level horizontal reduction does.
#[inline(always)]
pub fn fold_halves<T: Copy>(this: &[T], f: impl Fn(T, T) -> T) -> T {
    let n = this.len();
    assert!(
        n.is_power_of_two() && n <= 64,
        "cannot fold {n} lanes pairwise"
    );
    let mut buffer = [this[0]; 64];
    buffer[..n].copy_from_slice(this);
    let mut m = n;
    while m > 1 {
        m /= 2;
        for i in 0..m {
            buffer[i] = f(buffer[i], buffer[i + m]);
        }
    }
    buffer[0]
}

/// Sums lanes in groups of `K` into `result`, widening each lane first.
#[inline(always)]
pub fn group_sums<T: Copy, W: Copy, const K: usize>(
    this: &[T],
    result: &mut [W],
    widen: impl Fn(T) -> W,
    add: impl Fn(W, W) -> W,
) {
    assert!(result.len() * K == this.len());
    for (group, r) in this.as_chunks::<K>().0.iter().zip(result.iter_mut()) {
        let mut sum = widen(group[0]);
        for &x in &group[1..] {
            sum = add(sum, widen(x));
        }
        *r = sum;
    }
}

/// Sums `|a - b|` over groups of eight lanes.
#[inline(always)]
pub fn octet_abs_diff<T: Copy, W: Copy + Add<Output = W>>(
    a: &[T],
    b: &[T],
    result: &mut [W],
    diff: impl Fn(T, T) -> W,
) {
    assert!(a.len() == b.len() && a.len() == result.len() * 8);
    let (a, _) = a.as_chunks::<8>();
    let (b, _) = b.as_chunks::<8>();
    for ((x, y), r) in a.iter().zip(b).zip(result.iter_mut()) {
        let mut sum = diff(x[0], y[0]);
        for k in 1..8 {
            sum = sum + diff(x[k], y[k]);
        }
        *r = sum;
    }
}

/// Lane `i` compares the window of `a` starting at `4 * a_offset + i % 8`
/// against quad `b_offset` of `b`, inside the 16-lane block of `i`. Lanes whose
/// windows leave the slice are zero.
#[inline(always)]
pub fn adj_quad_abs_diff<T: Copy, W: Copy + Default + Add<Output = W>>(
    a: &[T],
    b: &[T],
    a_offset: usize,
    b_offset: usize,
    result: &mut [W],
    diff: impl Fn(T, T) -> W,
) {
    let n = a.len();
    assert!(b.len() == n && result.len() * 2 == n);
    assert!(a_offset <= 1 && b_offset <= 3);
    for (i, r) in result.iter_mut().enumerate() {
        let block = 16 * (i / 8);
        let x = block + 4 * a_offset + i % 8;
        let y = block + 4 * b_offset;
        *r = if x + 4 <= n && y + 4 <= n {
            let mut sum = W::default();
            for k in 0..4 {
                sum = sum + diff(a[x + k], b[y + k]);
            }
            sum
        } else {
            W::default()
        };
    }
}

/// Like [`adj_quad_abs_diff`], but `a` first has its quads permuted within
/// every 16-lane block, quad `k` taking quad `indices[k]`. Windows reading a
/// quad that `a` does not have are zero too.
#[inline(always)]
pub fn shuffled_quad_abs_diff<T: Copy, W: Copy + Default + Add<Output = W>>(
    a: &[T],
    b: &[T],
    indices: [usize; 4],
    result: &mut [W],
    diff: impl Fn(T, T) -> W,
) {
    let n = a.len();
    assert!(b.len() == n && result.len() * 2 == n);
    assert!(indices.iter().all(|&index| index <= 3));
    for (i, r) in result.iter_mut().enumerate() {
        let block = 16 * (i / 8);
        let j = i % 8;
        let x = 8 * (j / 4) + j % 4;
        let y = block + 4 * (j / 2);
        let sources: [usize; 4] = std::array::from_fn(|k| {
            let p = x + k;
            block + 4 * indices[p / 4] + p % 4
        });
        *r = if block + x + 4 <= n && y + 4 <= n && sources.iter().all(|&s| s < n) {
            let mut sum = W::default();
            for k in 0..4 {
                sum = sum + diff(a[sources[k]], b[y + k]);
            }
            sum
        } else {
            W::default()
        };
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
#[crate::target_cpu(enable = "v2")]
pub fn emulate_mm_reduce_add_ps(x: core::arch::x86_64::__m128) -> f32 {
    use core::arch::x86_64::*;
    let x = _mm_add_ps(x, _mm_movehl_ps(x, x));
    let x = _mm_add_ss(x, _mm_shuffle_ps::<0b01>(x, x));
    _mm_cvtss_f32(x)
}

#[cfg(target_arch = "x86_64")]
#[inline]
#[crate::target_cpu(enable = "v3")]
pub fn emulate_mm256_reduce_add_ps(x: core::arch::x86_64::__m256) -> f32 {
    use core::arch::x86_64::*;
    let x = _mm_add_ps(_mm256_castps256_ps128(x), _mm256_extractf128_ps::<1>(x));
    emulate_mm_reduce_add_ps(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_halves_order() {
        let x = [1, 2, 4, 8, 16, 32, 64, 128];
        assert_eq!(fold_halves(&x, |a, b| a + b), 255);
        // ((1, 3), (2, 4))
        assert_eq!(fold_halves(&[1, 2, 3, 4], |a, b| a * 100 + b), 103 * 100 + 204);
        assert_eq!(fold_halves(&[5u8], |a, b| a + b), 5);
    }

    #[test]
    fn group_sums_widen() {
        let x = [250u8, 250, 1, 2, 3, 4, 255, 255];
        let mut result = [0u16; 4];
        group_sums::<_, _, 2>(&x, &mut result, u16::from, |a, b| a + b);
        assert_eq!(result, [500, 3, 7, 510]);
    }

    #[test]
    fn quads_out_of_range_are_zero() {
        let a = (0..8u8).collect::<Vec<_>>();
        let b = [0u8; 8];
        let mut result = [0u16; 4];
        adj_quad_abs_diff(&a, &b, 1, 0, &mut result, |x, y| u16::from(x.abs_diff(y)));
        // windows start at 4, 5, 6, 7; only the first fits
        assert_eq!(result, [4 + 5 + 6 + 7, 0, 0, 0]);
        shuffled_quad_abs_diff(&a, &b, [1, 0, 0, 0], &mut result, |x, y| {
            u16::from(x.abs_diff(y))
        });
        // the query is [4, 5, 6, 7, 0, 1, 2, 3]
        assert_eq!(result, [22, 5 + 6 + 7, 6 + 7 + 1, 7 + 1 + 2]);
        shuffled_quad_abs_diff(&a, &b, [0, 3, 0, 0], &mut result, |x, y| {
            u16::from(x.abs_diff(y))
        });
        // the second quad of the query has no source
        assert_eq!(result, [6, 0, 0, 0]);
    }
}
