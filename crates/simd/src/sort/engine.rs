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

//! Introsort partitioning through a scratch buffer.
//!
//! Every round splits the keys three ways around a pivot: smaller keys are
//! compacted in place, larger and equal keys are parked in the scratch buffer
//! and copied back. Equal keys are never visited again, so runs of duplicates
//! cost one pass.

const INSERTION: usize = 16;
const NINTHER: usize = 128;

/// Sorts `keys` so that no key precedes an earlier one under `less`.
///
/// `less` must be a strict total order. `scratch` needs at least as many
/// elements as `keys`; its contents afterwards are unspecified.
#[inline]
pub fn sort<T: Copy, F: Fn(&T, &T) -> bool + Copy>(keys: &mut [T], scratch: &mut [T], less: F) {
    let n = keys.len();
    assert!(
        scratch.len() >= n,
        "scratch of {} elements cannot sort {n} keys",
        scratch.len()
    );
    let limit = 2 * (usize::BITS - n.leading_zeros());
    introsort(keys, &mut scratch[..n], less, limit);
}

#[inline]
fn introsort<T: Copy, F: Fn(&T, &T) -> bool + Copy>(
    keys: &mut [T],
    scratch: &mut [T],
    less: F,
    limit: u32,
) {
    let n = keys.len();
    if n <= INSERTION {
        insertion_sort(keys, less);
        return;
    }
    if limit == 0 {
        heapsort(keys, less);
        return;
    }
    let pivot = keys[choose_pivot(keys, less)];
    let (l, g) = partition(keys, scratch, pivot, less);
    let (left, rest) = keys.split_at_mut(l);
    let right = &mut rest[n - l - g..];
    introsort(left, &mut scratch[..l], less, limit - 1);
    introsort(right, &mut scratch[..g], less, limit - 1);
}

/// Returns the number of keys before and after the pivot's run.
#[inline]
fn partition<T: Copy, F: Fn(&T, &T) -> bool>(
    keys: &mut [T],
    scratch: &mut [T],
    pivot: T,
    less: F,
) -> (usize, usize) {
    let n = keys.len();
    let (mut l, mut g, mut e) = (0, 0, 0);
    for i in 0..n {
        let x = keys[i];
        if less(&x, &pivot) {
            keys[l] = x;
            l += 1;
        } else if less(&pivot, &x) {
            scratch[g] = x;
            g += 1;
        } else {
            e += 1;
            scratch[n - e] = x;
        }
    }
    keys[l..l + e].copy_from_slice(&scratch[n - e..]);
    keys[l + e..].copy_from_slice(&scratch[..g]);
    (l, g)
}

#[inline]
fn choose_pivot<T: Copy, F: Fn(&T, &T) -> bool + Copy>(keys: &[T], less: F) -> usize {
    let n = keys.len();
    let m = n / 2;
    if n < NINTHER {
        return median_of_3(keys, less, 0, m, n - 1);
    }
    let s = n / 8;
    let a = median_of_3(keys, less, 0, s, 2 * s);
    let b = median_of_3(keys, less, m - s, m, m + s);
    let c = median_of_3(keys, less, n - 1 - 2 * s, n - 1 - s, n - 1);
    median_of_3(keys, less, a, b, c)
}

#[inline]
fn median_of_3<T, F: Fn(&T, &T) -> bool>(
    keys: &[T],
    less: F,
    a: usize,
    b: usize,
    c: usize,
) -> usize {
    let (x, y, z) = (&keys[a], &keys[b], &keys[c]);
    if less(x, y) {
        if less(y, z) {
            b
        } else if less(x, z) {
            c
        } else {
            a
        }
    } else if less(x, z) {
        a
    } else if less(y, z) {
        c
    } else {
        b
    }
}

#[inline]
fn insertion_sort<T: Copy, F: Fn(&T, &T) -> bool>(keys: &mut [T], less: F) {
    for i in 1..keys.len() {
        let x = keys[i];
        let mut j = i;
        while j > 0 && less(&x, &keys[j - 1]) {
            keys[j] = keys[j - 1];
            j -= 1;
        }
        keys[j] = x;
    }
}

#[inline]
fn heapsort<T: Copy, F: Fn(&T, &T) -> bool + Copy>(keys: &mut [T], less: F) {
    let n = keys.len();
    for i in (0..n / 2).rev() {
        sift_down(keys, i, less);
    }
    for end in (1..n).rev() {
        keys.swap(0, end);
        sift_down(&mut keys[..end], 0, less);
    }
}

#[inline]
fn sift_down<T: Copy, F: Fn(&T, &T) -> bool>(keys: &mut [T], mut i: usize, less: F) {
    let n = keys.len();
    loop {
        let mut child = 2 * i + 1;
        if child >= n {
            break;
        }
        if child + 1 < n && less(&keys[child], &keys[child + 1]) {
            child += 1;
        }
        if !less(&keys[i], &keys[child]) {
            break;
        }
        keys.swap(i, child);
        i = child;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn sorts_like_std() {
        let mut rng = rand::rng();
        for n in [0, 1, 2, 3, 15, 16, 17, 100, 127, 128, 129, 1000, 4099] {
            for range in [4u32, 1000, u32::MAX] {
                let mut keys = (0..n).map(|_| rng.random_range(0..range)).collect::<Vec<_>>();
                let mut expected = keys.clone();
                expected.sort_unstable();
                let mut scratch = vec![0; n + 3];
                sort(&mut keys, &mut scratch, |a, b| a < b);
                assert_eq!(keys, expected, "n = {n}, range = {range}");
            }
        }
    }

    #[test]
    fn heapsort_fallback() {
        let mut rng = rand::rng();
        let mut keys = (0..300).map(|_| rng.random::<i64>()).collect::<Vec<_>>();
        let mut expected = keys.clone();
        expected.sort_unstable();
        let mut scratch = vec![0; 300];
        introsort(&mut keys, &mut scratch, |a, b| a < b, 0);
        assert_eq!(keys, expected);
        heapsort(&mut keys, |a, b| a > b);
        expected.reverse();
        assert_eq!(keys, expected);
    }

    #[test]
    fn adversarial_inputs() {
        let n = 5000;
        let inputs: [Vec<u16>; 4] = [
            (0..n).collect(),
            (0..n).rev().collect(),
            (0..n).map(|i| i % 2).collect(),
            (0..n).map(|i| if i < n / 2 { i } else { n - i }).collect(),
        ];
        for mut keys in inputs {
            let mut expected = keys.clone();
            expected.sort_unstable();
            let mut scratch = vec![0; keys.len()];
            sort(&mut keys, &mut scratch, |a, b| a < b);
            assert_eq!(keys, expected);
        }
    }

    #[test]
    fn median() {
        let keys = [3, 1, 2];
        assert_eq!(median_of_3(&keys, |a, b| a < b, 0, 1, 2), 2);
        assert_eq!(median_of_3(&keys, |a, b| a < b, 1, 0, 2), 2);
        assert_eq!(median_of_3(&keys, |a, b| a > b, 2, 1, 0), 2);
        assert_eq!(median_of_3(&[5, 5, 5], |a: &i32, b| a < b, 0, 1, 2), 1);
    }

    #[test]
    #[should_panic]
    fn scratch_too_small() {
        sort(&mut [3, 2, 1], &mut [0; 2], |a, b| a < b);
    }
}
