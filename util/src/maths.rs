//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap `value` into the range `[min, max)` by adding or subtracting whole multiples of the range.
pub fn input_modulus<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let r = rem_euclid(value - min, max - min) + min;

    // Round-off in rem_euclid may land exactly on the upper bound
    if r >= max {
        min
    } else {
        r
    }
}

/// Wrap an angle into the range (-pi, pi].
pub fn wrap_pi<T>(value: T) -> T
where
    T: Float + FloatConst,
{
    let r = input_modulus(value, -T::PI(), T::PI());

    if r <= -T::PI() {
        T::PI()
    } else {
        r
    }
}

/// Wrap an angle into the range [0, 2pi).
pub fn wrap_2pi<T>(value: T) -> T
where
    T: Float + FloatConst,
{
    input_modulus(value, T::zero(), T::TAU())
}

/// Get the signed angular distance from `from` to `to`.
///
/// This function will return the shortest signed distance in the range (-pi, pi], so that
/// `from + get_ang_dist(from, to)` points in the same direction as `to`.
pub fn get_ang_dist<T>(from: T, to: T) -> T
where
    T: Float + FloatConst,
{
    wrap_pi(to - from)
}
