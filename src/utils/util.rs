//! # Utility Module
//!
//! Small numeric helpers shared by the BSP writer and the lightmap baker.
//!
//! ## Example Function: `clamp`
//!
//! The `clamp` function restricts a value to lie within a specified range. If the value
//! is below the minimum, it returns the minimum; if it's above the maximum, it returns the
//! maximum; otherwise, it returns the value unchanged.

/// Clamps a value between a minimum and maximum.
///
/// # Arguments
///
/// * `value` - The input value to be clamped.
/// * `min` - The minimum allowable value.
/// * `max` - The maximum allowable value.
///
/// # Examples
///
/// ```
/// use q1bake::utils::util::clamp;
///
/// assert_eq!(clamp(5, 0, 10), 5);
/// assert_eq!(clamp(-5, 0, 10), 0);
/// assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
/// ```
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Rounds to the nearest integer, halves away from zero.
pub fn i_round(value: f64) -> i32 {
    value.round() as i32
}

/// Converts a 16.8 fixed-point light value to a stored luxel byte.
pub fn fixed_to_byte(value: i32) -> u8 {
    clamp(value >> 8, 0, 255) as u8
}
