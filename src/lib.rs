//! Lane reductions, grouped sums, sums of absolute differences and sorting,
//! each resolved once per process to the best target of the host.

pub use simd::abs_diff::{
    sums_of_8_abs_diff, sums_of_adj_quad_abs_diff, sums_of_shuffled_quad_abs_diff,
};
pub use simd::dispatch::{init, native, select};
pub use simd::reduce::{
    max_of_lanes, min_of_lanes, reduce_max, reduce_min, reduce_sum, sum_of_lanes,
};
pub use simd::sort::{Ascending, Descending, Key, Order, Sorter, sort};
pub use simd::sums::{sums_of_2, sums_of_4, sums_of_8};
pub use simd::{
    AbsDiff, Algorithm, Descriptor, Kind, Lane, SumsOf4, SumsOf8, Target, Vector, Wide2, Wide3,
    Widen, f16,
};

pub mod typed {
    //! Monomorphic sort entry points.

    pub use simd::sort::{
        sort_f32_asc, sort_f32_desc, sort_f64_asc, sort_f64_desc, sort_i16_asc, sort_i16_desc,
        sort_i32_asc, sort_i32_desc, sort_i64_asc, sort_i64_desc, sort_u16_asc, sort_u16_desc,
        sort_u32_asc, sort_u32_desc, sort_u64_asc, sort_u64_desc,
    };
}

#[cfg(not(target_endian = "little"))]
compile_error!("Target architecture is not supported.");
