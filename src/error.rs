//! Errors reported by checked constructors and deserialization.

use thiserror::Error;

/// Error returned when a box or a tree fails validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BvhError {
    /// The lower corner exceeds the upper corner on `axis`.
    #[error("inverted bounds on axis {axis}: min {min} > max {max}")]
    InvertedAxis {
        /// Index of the offending axis.
        axis: usize,
        /// Lower coordinate, widened to `f64` for reporting.
        min: f64,
        /// Upper coordinate, widened to `f64` for reporting.
        max: f64,
    },

    /// A corner coordinate on `axis` is NaN.
    #[error("bound on axis {axis} is NaN")]
    NanBound {
        /// Index of the offending axis.
        axis: usize,
    },

    /// A deserialized [`BvhTree`](crate::bvh::BvhTree) has dangling or cyclic links,
    /// loose boxes, or entries that are missing or referenced twice.
    #[error("inconsistent bvh node arena")]
    InconsistentTree,
}
