//! Small maths helpers shared by the executables

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Euclidean distance between two points of any dimension.
///
/// `None` if the points have different numbers of dimensions.
pub fn norm<T: Float>(point_0: &[T], point_1: &[T]) -> Option<T> {
    if point_0.len() != point_1.len() {
        return None;
    }

    let sum_sq = point_0
        .iter()
        .zip(point_1)
        .fold(T::zero(), |acc, (&a, &b)| acc + (a - b) * (a - b));

    Some(sum_sq.sqrt())
}

/// Forward distance from `from` to `to` along a cyclic sequence of `len` elements.
///
/// The result is always in `[0, len)`. `len` must not be zero.
pub fn cyclic_offset(from: i64, to: i64, len: i64) -> i64 {
    (to - from).rem_euclid(len)
}
