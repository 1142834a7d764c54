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

pub struct TargetCpu {
    pub target_cpu: &'static str,
    pub target_arch: &'static str,
    pub target_features: &'static [&'static str],
    /// Name of the matching `dispatch::Target` variant.
    pub variant: &'static str,
}

pub const TARGET_CPUS: &[TargetCpu] = &[
    TargetCpu {
        target_cpu: "v4",
        target_arch: "x86_64",
        target_features: &[
            "avx512bw", "avx512cd", "avx512dq", "avx512vl", // simd
            "bmi1", "bmi2", "lzcnt", "movbe", "popcnt", // bit-operations
        ],
        variant: "V4",
    },
    TargetCpu {
        target_cpu: "v3",
        target_arch: "x86_64",
        target_features: &[
            "avx2", "f16c", "fma", // simd
            "bmi1", "bmi2", "lzcnt", "movbe", "popcnt", // bit-operations
        ],
        variant: "V3",
    },
    TargetCpu {
        target_cpu: "v2",
        target_arch: "x86_64",
        target_features: &[
            "sse4.2", // simd
            "popcnt", // bit-operations
        ],
        variant: "V2",
    },
    TargetCpu {
        target_cpu: "a2",
        target_arch: "aarch64",
        target_features: &[
            "neon", // simd
        ],
        variant: "A2",
    },
];
