mod common;

use common::{SEEDS, rng};
use lanes::{Algorithm, Ascending, Descending, Key, Order, Sorter};
use rand::Rng;

fn round_trip<K: Key>(keys: &[K], same: impl Fn(&[K], &[K]) -> bool) {
    let mut sorter = Sorter::new();
    let mut ascending = keys.to_vec();
    sorter.sort::<K, Ascending>(&mut ascending);
    assert!(Ascending::is_sorted(&ascending));
    let mut descending = keys.to_vec();
    sorter.sort::<K, Descending>(&mut descending);
    assert!(Descending::is_sorted(&descending));
    let sorted = ascending.clone();
    sorter.sort::<K, Ascending>(&mut ascending);
    assert!(same(&ascending, &sorted), "sorting sorted keys moved them");
    ascending.reverse();
    assert!(same(&ascending, &descending));
}

fn equal<K: Key>(lhs: &[K], rhs: &[K]) -> bool {
    lhs == rhs
}

#[test]
fn integers() {
    for seed in SEEDS {
        let mut rng = rng(seed);
        for n in [0, 1, 2, 31, 32, 33, 255, 4096] {
            round_trip::<u16>(&(0..n).map(|_| rng.random()).collect::<Vec<_>>(), equal);
            round_trip::<i16>(&(0..n).map(|_| rng.random()).collect::<Vec<_>>(), equal);
            round_trip::<u32>(&(0..n).map(|_| rng.random()).collect::<Vec<_>>(), equal);
            round_trip::<i32>(&(0..n).map(|_| rng.random_range(-8..8)).collect::<Vec<_>>(), equal);
            round_trip::<u64>(&(0..n).map(|_| rng.random()).collect::<Vec<_>>(), equal);
            round_trip::<i64>(&(0..n).map(|_| rng.random()).collect::<Vec<_>>(), equal);
        }
    }
}

#[test]
fn floats() {
    fn bits32(lhs: &[f32], rhs: &[f32]) -> bool {
        lhs.iter().map(|x| x.to_bits()).eq(rhs.iter().map(|x| x.to_bits()))
    }
    fn bits64(lhs: &[f64], rhs: &[f64]) -> bool {
        lhs.iter().map(|x| x.to_bits()).eq(rhs.iter().map(|x| x.to_bits()))
    }
    let specials32 = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 0.0, -0.0, f32::MIN_POSITIVE];
    let specials64 = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0, -0.0, f64::MIN_POSITIVE];
    for seed in SEEDS {
        let mut rng = rng(seed);
        for n in [0, 1, 6, 100, 3000] {
            let mut keys = (0..n).map(|_| rng.random_range(-1e3..1e3)).collect::<Vec<f32>>();
            keys.extend(specials32);
            round_trip(&keys, bits32);
            let mut keys = (0..n).map(|_| rng.random_range(-1e3..1e3)).collect::<Vec<f64>>();
            keys.extend(specials64);
            round_trip(&keys, bits64);
        }
    }
}

#[test]
fn typed_entry_points() {
    let mut keys = [5u32, 3, 9, 1, 3];
    let mut scratch = [0u32; 5];
    lanes::typed::sort_u32_asc(&mut keys, &mut scratch);
    assert_eq!(keys, [1, 3, 3, 5, 9]);
    lanes::typed::sort_u32_desc(&mut keys, &mut scratch);
    assert_eq!(keys, [9, 5, 3, 3, 1]);
    let mut keys = [-1i64, i64::MIN, i64::MAX, 0];
    let mut scratch = [0i64; 8];
    lanes::sort::<i64, Descending>(&mut keys, &mut scratch);
    assert_eq!(keys, [i64::MAX, 0, -1, i64::MIN]);
}

#[test]
fn concurrent_sorts_share_a_target() {
    let targets = std::thread::scope(|scope| {
        let handles = (0..2u64)
            .map(|t| {
                scope.spawn(move || {
                    let mut rng = rng(t as u8);
                    let mut keys = (0..10_000).map(|_| rng.random::<u64>()).collect::<Vec<_>>();
                    let mut scratch = vec![0; keys.len()];
                    lanes::typed::sort_u64_asc(&mut keys, &mut scratch);
                    assert!(keys.is_sorted());
                    lanes::select(Algorithm::Sort)
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });
    assert_eq!(targets[0], targets[1]);
    assert_eq!(targets[0], lanes::select(Algorithm::Sort));
    assert!(targets[0].is_detected());
}
