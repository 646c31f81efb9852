//! # Utility Module
//!
//! Small numeric helpers shared by the partitioner and the grammar.
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
/// use city_grammar::utils::util::clamp;
///
/// assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
/// assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
/// assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
/// ```
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Linear interpolation from `a` to `b`; `t` is clamped to `[0, 1]`.
///
/// ```
/// use city_grammar::utils::util::lerp;
///
/// assert_eq!(lerp(2.0, 6.0, 0.5), 4.0);
/// assert_eq!(lerp(2.0, 6.0, 3.0), 6.0);
/// ```
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * clamp(t, 0.0, 1.0)
}

/// Where `value` sits between `a` and `b`, clamped to `[0, 1]`.
/// Returns 0 when the range is empty.
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        return 0.0;
    }
    clamp((value - a) / (b - a), 0.0, 1.0)
}

/// Derives an independent seed from a base seed and integer plot coordinates.
/// SplitMix64 finaliser, so neighbouring coordinates give unrelated streams.
pub fn mix_seed(seed: u64, x: i64, y: i64) -> u64 {
    let mut z = seed
        ^ (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
