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

//! Target registry and per-algorithm variant selection.
//!
//! Every exported kernel family has one [`Algorithm`] identity. The first call
//! to [`select`] for an identity probes the host, picks the most capable
//! target the family is built for, and publishes it; the choice never changes
//! afterwards.

use std::fmt::Display;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Target {
    /// x86-64-v4, AVX-512.
    V4 = 1,
    /// x86-64-v3, AVX2.
    V3 = 2,
    /// x86-64-v2, SSE4.2.
    V2 = 3,
    /// AArch64 with NEON.
    A2 = 4,
    Fallback = 5,
}

impl Target {
    /// All targets, most capable first.
    pub const ALL: [Target; 5] = [
        Target::V4,
        Target::V3,
        Target::V2,
        Target::A2,
        Target::Fallback,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Target::V4 => "v4",
            Target::V3 => "v3",
            Target::V2 => "v2",
            Target::A2 => "a2",
            Target::Fallback => "fallback",
        }
    }

    /// Width of one vector register of this target, in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            Target::V4 => 64,
            Target::V3 => 32,
            Target::V2 | Target::A2 | Target::Fallback => 16,
        }
    }

    const fn family(self) -> u8 {
        match self {
            Target::V4 | Target::V3 | Target::V2 => 1,
            Target::A2 => 2,
            Target::Fallback => 0,
        }
    }

    const fn level(self) -> u8 {
        match self {
            Target::V4 => 3,
            Target::V3 => 2,
            Target::V2 => 1,
            Target::A2 => 1,
            Target::Fallback => 0,
        }
    }

    /// Whether code built for `other` may run wherever `self` runs.
    pub const fn implies(self, other: Target) -> bool {
        matches!(other, Target::Fallback)
            || (self.family() == other.family() && self.level() >= other.level())
    }

    pub fn is_detected(self) -> bool {
        match self {
            #[cfg(target_arch = "x86_64")]
            Target::V4 => crate::is_cpu_detected!("v4"),
            #[cfg(target_arch = "x86_64")]
            Target::V3 => crate::is_cpu_detected!("v3"),
            #[cfg(target_arch = "x86_64")]
            Target::V2 => crate::is_cpu_detected!("v2"),
            #[cfg(target_arch = "aarch64")]
            Target::A2 => crate::is_cpu_detected!("a2"),
            Target::Fallback => true,
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    const fn from_u8(x: u8) -> Option<Target> {
        match x {
            1 => Some(Target::V4),
            2 => Some(Target::V3),
            3 => Some(Target::V2),
            4 => Some(Target::A2),
            5 => Some(Target::Fallback),
            _ => None,
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    ReduceSum,
    ReduceMin,
    ReduceMax,
    SumsOf2,
    SumsOf4,
    SumsOf8,
    SumsOf8AbsDiff,
    SumsOfAdjQuadAbsDiff,
    SumsOfShuffledQuadAbsDiff,
    Sort,
}

impl Algorithm {
    pub const ALL: [Algorithm; 10] = [
        Algorithm::ReduceSum,
        Algorithm::ReduceMin,
        Algorithm::ReduceMax,
        Algorithm::SumsOf2,
        Algorithm::SumsOf4,
        Algorithm::SumsOf8,
        Algorithm::SumsOf8AbsDiff,
        Algorithm::SumsOfAdjQuadAbsDiff,
        Algorithm::SumsOfShuffledQuadAbsDiff,
        Algorithm::Sort,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::ReduceSum => "reduce_sum",
            Algorithm::ReduceMin => "reduce_min",
            Algorithm::ReduceMax => "reduce_max",
            Algorithm::SumsOf2 => "sums_of_2",
            Algorithm::SumsOf4 => "sums_of_4",
            Algorithm::SumsOf8 => "sums_of_8",
            Algorithm::SumsOf8AbsDiff => "sums_of_8_abs_diff",
            Algorithm::SumsOfAdjQuadAbsDiff => "sums_of_adj_quad_abs_diff",
            Algorithm::SumsOfShuffledQuadAbsDiff => "sums_of_shuffled_quad_abs_diff",
            Algorithm::Sort => "sort",
        }
    }

    /// Targets this family is built for, most capable first.
    pub const fn targets(self) -> &'static [Target] {
        use Target::*;
        match self {
            Algorithm::ReduceSum | Algorithm::ReduceMin | Algorithm::ReduceMax => {
                &[V4, V3, V2, A2, Fallback]
            }
            Algorithm::SumsOf2 | Algorithm::SumsOf4 => &[V3, V2, A2, Fallback],
            Algorithm::SumsOf8 | Algorithm::SumsOf8AbsDiff => &[V4, V3, V2, A2, Fallback],
            Algorithm::SumsOfAdjQuadAbsDiff => &[V3, V2, A2, Fallback],
            Algorithm::SumsOfShuffledQuadAbsDiff => &[V4, V3, V2, A2, Fallback],
            Algorithm::Sort => &[V4, V3, V2, A2, Fallback],
        }
    }

    /// Whether `target` is in the registry of this family.
    pub const fn lists(self, target: Target) -> bool {
        let targets = self.targets();
        let mut i = 0;
        while i < targets.len() {
            if targets[i] as u8 == target as u8 {
                return true;
            }
            i += 1;
        }
        false
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

static SELECTED: [AtomicU8; Algorithm::COUNT] = [const { AtomicU8::new(0) }; Algorithm::COUNT];

static NATIVE: AtomicU8 = AtomicU8::new(0);

fn resolve(algorithm: Algorithm) -> Target {
    match algorithm.targets().iter().find(|target| target.is_detected()) {
        Some(&target) => target,
        None => panic!("no target variant of `{algorithm}` is supported by this host"),
    }
}

/// Returns the target variant that serves `algorithm` for the rest of the
/// process.
pub fn select(algorithm: Algorithm) -> Target {
    select_in(&SELECTED, algorithm)
}

/// Resolves `algorithm` into `table`, where 0 marks an empty slot.
fn select_in(table: &[AtomicU8; Algorithm::COUNT], algorithm: Algorithm) -> Target {
    let slot = &table[algorithm.index()];
    if let Some(target) = Target::from_u8(slot.load(Ordering::Acquire)) {
        return target;
    }
    let target = resolve(algorithm);
    match slot.compare_exchange(0, target as u8, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {
            log::debug!("dispatch: `{algorithm}` uses target `{target}`");
            target
        }
        Err(published) => Target::from_u8(published).unwrap_or(target),
    }
}

/// The most capable target of this host.
pub fn native() -> Target {
    if let Some(target) = Target::from_u8(NATIVE.load(Ordering::Acquire)) {
        return target;
    }
    let target = Target::ALL
        .into_iter()
        .find(|target| target.is_detected())
        .unwrap_or(Target::Fallback);
    NATIVE.store(target as u8, Ordering::Release);
    target
}

/// Resolves every algorithm now instead of on first use.
pub fn init() {
    for algorithm in Algorithm::ALL {
        select(algorithm);
    }
    log::info!("dispatch: native target is `{}`", native());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_ordered() {
        for algorithm in Algorithm::ALL {
            let targets = algorithm.targets();
            assert_eq!(targets.last(), Some(&Target::Fallback), "{algorithm}");
            for pair in targets.windows(2) {
                let (i, j) = (
                    Target::ALL.iter().position(|t| *t == pair[0]),
                    Target::ALL.iter().position(|t| *t == pair[1]),
                );
                assert!(i < j, "{algorithm}: {} before {}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn registry_membership() {
        for algorithm in Algorithm::ALL {
            for target in Target::ALL {
                assert_eq!(algorithm.lists(target), algorithm.targets().contains(&target));
            }
            assert!(algorithm.lists(Target::Fallback));
        }
        assert!(!Algorithm::SumsOf2.lists(Target::V4));
        assert!(!Algorithm::SumsOfAdjQuadAbsDiff.lists(Target::V4));
        assert!(Algorithm::SumsOfShuffledQuadAbsDiff.lists(Target::V4));
    }

    #[test]
    fn implication() {
        assert!(Target::V4.implies(Target::V3));
        assert!(Target::V4.implies(Target::V2));
        assert!(Target::V3.implies(Target::V2));
        assert!(!Target::V2.implies(Target::V3));
        assert!(!Target::A2.implies(Target::V2));
        assert!(!Target::V4.implies(Target::A2));
        for target in Target::ALL {
            assert!(target.implies(target));
            assert!(target.implies(Target::Fallback));
        }
        assert!(!Target::Fallback.implies(Target::V2));
    }

    #[test]
    fn select_is_idempotent() {
        for algorithm in Algorithm::ALL {
            let first = select(algorithm);
            assert!(first.is_detected());
            assert!(algorithm.targets().contains(&first));
            for _ in 0..16 {
                assert_eq!(select(algorithm), first);
            }
        }
        assert!(native().is_detected());
        assert!(Target::Fallback.is_detected());
    }

    #[test]
    fn select_prefers_the_most_capable() {
        for algorithm in Algorithm::ALL {
            let selected = select(algorithm);
            for &target in algorithm.targets() {
                if target == selected {
                    break;
                }
                assert!(!target.is_detected(), "{algorithm}: {target} was skipped");
            }
        }
    }

    #[test]
    fn concurrent_first_use() {
        use std::sync::Barrier;
        // `SELECTED` may already be filled at load time, so race a fresh table
        for _ in 0..if cfg!(not(miri)) { 64 } else { 1 } {
            let table = [const { AtomicU8::new(0) }; Algorithm::COUNT];
            let barrier = Barrier::new(8);
            let results = std::thread::scope(|scope| {
                let handles = (0..8)
                    .map(|_| {
                        scope.spawn(|| {
                            barrier.wait();
                            Algorithm::ALL.map(|algorithm| select_in(&table, algorithm))
                        })
                    })
                    .collect::<Vec<_>>();
                handles
                    .into_iter()
                    .map(|handle| handle.join().expect("thread panicked"))
                    .collect::<Vec<_>>()
            });
            for result in &results {
                assert_eq!(result, &results[0]);
            }
            for (algorithm, target) in Algorithm::ALL.into_iter().zip(results[0]) {
                let published = table[algorithm.index()].load(Ordering::Acquire);
                assert_eq!(Target::from_u8(published), Some(target));
                assert_eq!(select(algorithm), target);
            }
        }
    }

    #[test]
    fn fresh_table_starts_empty() {
        let table = [const { AtomicU8::new(0) }; Algorithm::COUNT];
        assert!(table.iter().all(|slot| slot.load(Ordering::Relaxed) == 0));
        let target = select_in(&table, Algorithm::Sort);
        assert_eq!(table[Algorithm::Sort.index()].load(Ordering::Relaxed), target as u8);
        assert_eq!(
            table.iter().filter(|slot| slot.load(Ordering::Relaxed) != 0).count(),
            1
        );
    }
}
