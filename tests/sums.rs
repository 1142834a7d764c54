mod common;

use common::{SEEDS, descriptors, rng};
use lanes::{Descriptor, Lane, SumsOf4, SumsOf8, Target, Vector, Widen};
use rand::Rng;

fn widened_sum<W: Lane>(group: impl Iterator<Item = W>) -> W {
    group.fold(W::default(), W::scalar_add)
}

fn pairs<T: Widen>(mut random: impl FnMut() -> T) {
    for d in descriptors::<T>().into_iter().filter(|d| d.lanes() >= 2) {
        let v = Vector::from_fn(d, |_| random());
        let r = lanes::sums_of_2(&v);
        assert_eq!(r.lanes(), d.lanes() / 2, "{d:?}");
        for (g, group) in v.as_slice().chunks(2).enumerate() {
            let expected = widened_sum(group.iter().map(|&x| x.widen()));
            assert_eq!(r[g], expected, "group {g} of {v:?}");
        }
    }
}

fn quads<T: SumsOf4>(mut random: impl FnMut() -> T) {
    for d in descriptors::<T>().into_iter().filter(|d| d.lanes() >= 4) {
        let v = Vector::from_fn(d, |_| random());
        let r = lanes::sums_of_4(&v);
        assert_eq!(r.lanes(), d.lanes() / 4, "{d:?}");
        for (g, group) in v.as_slice().chunks(4).enumerate() {
            let expected = widened_sum(group.iter().map(|&x| x.widen().widen()));
            assert_eq!(r[g], expected, "group {g} of {v:?}");
        }
    }
}

fn octets<T: SumsOf8>(mut random: impl FnMut() -> T) {
    for d in descriptors::<T>().into_iter().filter(|d| d.lanes() >= 8) {
        let v = Vector::from_fn(d, |_| random());
        let r = lanes::sums_of_8(&v);
        assert_eq!(r.lanes(), d.lanes() / 8, "{d:?}");
        for (g, group) in v.as_slice().chunks(8).enumerate() {
            let expected = widened_sum(group.iter().map(|&x| x.widen().widen().widen()));
            assert_eq!(r[g], expected, "group {g} of {v:?}");
        }
    }
}

#[test]
fn grouped_sums_widen() {
    for seed in SEEDS {
        let mut rng = rng(seed);
        for _ in 0..16 {
            pairs::<u8>(|| rng.random());
            pairs::<i8>(|| rng.random());
            pairs::<u16>(|| rng.random());
            pairs::<i16>(|| rng.random());
            pairs::<u32>(|| rng.random());
            pairs::<i32>(|| rng.random());
            pairs::<f32>(|| rng.random_range(-1e3..1e3));
            quads::<u8>(|| rng.random());
            quads::<i8>(|| rng.random());
            quads::<u16>(|| rng.random());
            quads::<i16>(|| rng.random());
            octets::<u8>(|| rng.random());
            octets::<i8>(|| rng.random());
        }
    }
}

#[test]
fn extremes_do_not_overflow() {
    for d in descriptors::<u8>().into_iter().filter(|d| d.lanes() >= 8) {
        let v = Vector::splat(d, u8::MAX);
        assert!(lanes::sums_of_2(&v).as_slice().iter().all(|&x| x == 510));
        assert!(lanes::sums_of_4(&v).as_slice().iter().all(|&x| x == 1020));
        assert!(lanes::sums_of_8(&v).as_slice().iter().all(|&x| x == 2040));
    }
    for d in descriptors::<i8>().into_iter().filter(|d| d.lanes() >= 8) {
        let v = Vector::splat(d, i8::MIN);
        assert!(lanes::sums_of_2(&v).as_slice().iter().all(|&x| x == -256));
        assert!(lanes::sums_of_4(&v).as_slice().iter().all(|&x| x == -512));
        assert!(lanes::sums_of_8(&v).as_slice().iter().all(|&x| x == -1024));
    }
    for d in descriptors::<i16>().into_iter().filter(|d| d.lanes() >= 4) {
        let v = Vector::splat(d, i16::MAX);
        assert!(lanes::sums_of_4(&v).as_slice().iter().all(|&x| x == 4 * i64::from(i16::MAX)));
    }
}

#[test]
fn powers_of_two() {
    let d = Descriptor::<u8>::new(Target::Fallback).capped(8);
    let v = Vector::load(d, &[1, 2, 4, 8, 16, 32, 64, 128]);
    let r = lanes::sums_of_2(&v);
    assert_eq!(r.descriptor(), Descriptor::<u16>::new(Target::Fallback).capped(4));
    assert_eq!(r.to_vec(), [3, 12, 48, 192]);
    assert_eq!(lanes::sums_of_4(&v).to_vec(), [15, 240]);
    assert_eq!(lanes::sums_of_8(&v).to_vec(), [255]);
    let d = Descriptor::<i8>::new(Target::Fallback).capped(8);
    let v = Vector::from_fn(d, |i| (1u8 << i) as i8);
    assert_eq!(lanes::sums_of_2(&v).to_vec(), [3, 12, 48, -64]);
}

#[test]
#[should_panic]
fn quads_need_four_lanes() {
    let d = Descriptor::<u16>::new(Target::V2).capped(2);
    lanes::sums_of_4(&Vector::iota(d, 0));
}
