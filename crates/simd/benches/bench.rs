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

#![allow(unsafe_code)]

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn reduce_sum_f32(c: &mut Criterion) {
    use rand::Rng;
    let mut rng = rand::rng();
    let x = (0..16)
        .map(|_| rng.random_range(-1.0..=1.0f32))
        .collect::<Vec<_>>();
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v4") {
        c.bench_function("reduce::reduce_sum_f32::v4", |b| {
            b.iter(|| unsafe { simd::reduce::reduce_sum_f32::reduce_sum_v4(black_box(&x)) })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v3") {
        c.bench_function("reduce::reduce_sum_f32::v3", |b| {
            b.iter(|| unsafe { simd::reduce::reduce_sum_f32::reduce_sum_v3(black_box(&x)) })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v2") {
        c.bench_function("reduce::reduce_sum_f32::v2", |b| {
            b.iter(|| unsafe { simd::reduce::reduce_sum_f32::reduce_sum_v2(black_box(&x)) })
        });
    }
    #[cfg(target_arch = "aarch64")]
    if simd::is_cpu_detected!("a2") {
        c.bench_function("reduce::reduce_sum_f32::a2", |b| {
            b.iter(|| unsafe { simd::reduce::reduce_sum_f32::reduce_sum_a2(black_box(&x)) })
        });
    }
    c.bench_function("reduce::reduce_sum_f32::dispatch", |b| {
        b.iter(|| simd::reduce::reduce_sum_f32::reduce_sum(black_box(&x)))
    });
}

fn sums_of_8_u8(c: &mut Criterion) {
    use rand::Rng;
    let mut rng = rand::rng();
    let x = (0..4096).map(|_| rng.random::<u8>()).collect::<Vec<_>>();
    let mut r = vec![0u64; 4096 / 8];
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v4") {
        c.bench_function("sums::sums_of_8_u8::v4", |b| {
            b.iter(|| unsafe { simd::sums::sums_of_8_u8::sums_of_8_v4(black_box(&x), &mut r) })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v3") {
        c.bench_function("sums::sums_of_8_u8::v3", |b| {
            b.iter(|| unsafe { simd::sums::sums_of_8_u8::sums_of_8_v3(black_box(&x), &mut r) })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v2") {
        c.bench_function("sums::sums_of_8_u8::v2", |b| {
            b.iter(|| unsafe { simd::sums::sums_of_8_u8::sums_of_8_v2(black_box(&x), &mut r) })
        });
    }
    #[cfg(target_arch = "aarch64")]
    if simd::is_cpu_detected!("a2") {
        c.bench_function("sums::sums_of_8_u8::a2", |b| {
            b.iter(|| unsafe { simd::sums::sums_of_8_u8::sums_of_8_a2(black_box(&x), &mut r) })
        });
    }
}

fn sums_of_adj_quad_abs_diff_u8(c: &mut Criterion) {
    use rand::Rng;
    use simd::abs_diff::sums_of_adj_quad_abs_diff_u8 as kernel;
    let mut rng = rand::rng();
    let x = (0..4096).map(|_| rng.random::<u8>()).collect::<Vec<_>>();
    let y = (0..4096).map(|_| rng.random::<u8>()).collect::<Vec<_>>();
    let mut r = vec![0u16; 4096 / 2];
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v3") {
        c.bench_function("abs_diff::sums_of_adj_quad_abs_diff_u8::v3", |b| {
            b.iter(|| unsafe {
                kernel::sums_of_adj_quad_abs_diff_v3(black_box(&x), &y, 1, 2, &mut r)
            })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v2") {
        c.bench_function("abs_diff::sums_of_adj_quad_abs_diff_u8::v2", |b| {
            b.iter(|| unsafe {
                kernel::sums_of_adj_quad_abs_diff_v2(black_box(&x), &y, 1, 2, &mut r)
            })
        });
    }
    #[cfg(target_arch = "aarch64")]
    if simd::is_cpu_detected!("a2") {
        c.bench_function("abs_diff::sums_of_adj_quad_abs_diff_u8::a2", |b| {
            b.iter(|| unsafe {
                kernel::sums_of_adj_quad_abs_diff_a2(black_box(&x), &y, 1, 2, &mut r)
            })
        });
    }
}

fn sums_of_shuffled_quad_abs_diff_u8(c: &mut Criterion) {
    use rand::Rng;
    use simd::abs_diff::sums_of_shuffled_quad_abs_diff_u8 as kernel;
    let mut rng = rand::rng();
    let x = (0..4096).map(|_| rng.random::<u8>()).collect::<Vec<_>>();
    let y = (0..4096).map(|_| rng.random::<u8>()).collect::<Vec<_>>();
    let mut r = vec![0u16; 4096 / 2];
    let indices = [3, 1, 2, 0];
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v4") {
        c.bench_function("abs_diff::sums_of_shuffled_quad_abs_diff_u8::v4", |b| {
            b.iter(|| unsafe {
                kernel::sums_of_shuffled_quad_abs_diff_v4(black_box(&x), &y, indices, &mut r)
            })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v3") {
        c.bench_function("abs_diff::sums_of_shuffled_quad_abs_diff_u8::v3", |b| {
            b.iter(|| unsafe {
                kernel::sums_of_shuffled_quad_abs_diff_v3(black_box(&x), &y, indices, &mut r)
            })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simd::is_cpu_detected!("v2") {
        c.bench_function("abs_diff::sums_of_shuffled_quad_abs_diff_u8::v2", |b| {
            b.iter(|| unsafe {
                kernel::sums_of_shuffled_quad_abs_diff_v2(black_box(&x), &y, indices, &mut r)
            })
        });
    }
    #[cfg(target_arch = "aarch64")]
    if simd::is_cpu_detected!("a2") {
        c.bench_function("abs_diff::sums_of_shuffled_quad_abs_diff_u8::a2", |b| {
            b.iter(|| unsafe {
                kernel::sums_of_shuffled_quad_abs_diff_a2(black_box(&x), &y, indices, &mut r)
            })
        });
    }
}

fn sort_i16_desc(c: &mut Criterion) {
    use rand::Rng;
    use simd::sort::{Descending, Sorter};
    let mut rng = rand::rng();
    let keys = (0..100_000).map(|_| rng.random::<i16>()).collect::<Vec<_>>();
    let mut sorter = Sorter::new();
    c.bench_function("sort::sort_i16_desc", |b| {
        b.iter_batched_ref(
            || keys.clone(),
            |keys| sorter.sort::<i16, Descending>(keys),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    reduce_sum_f32,
    sums_of_8_u8,
    sums_of_adj_quad_abs_diff_u8,
    sums_of_shuffled_quad_abs_diff_u8,
    sort_i16_desc,
);
criterion_main!(benches);
