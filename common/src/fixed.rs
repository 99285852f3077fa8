//! Scaled-integer decimal arithmetic with configurable rounding
//!
//! Prices and quantities are canonicalized as `i64` values scaled by a
//! power of ten. Conversions saturate at the `i64` range; negative scales
//! are treated as 0.

use serde::{Deserialize, Serialize};

/// Rounding behavior for scaled conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundingMode {
    /// Round half away from zero
    HalfUp,
    /// Round toward negative infinity
    Down,
    /// Round toward positive infinity
    Up,
}

fn pow10(scale: i32) -> i64 {
    if scale <= 0 {
        return 1;
    }
    let mut value = 1i64;
    for _ in 0..scale {
        if value > i64::MAX / 10 {
            return i64::MAX;
        }
        value *= 10;
    }
    value
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_to_i64(value: f64) -> i64 {
    if value >= i64::MAX as f64 {
        return i64::MAX;
    }
    if value <= i64::MIN as f64 {
        return i64::MIN;
    }
    value as i64
}

fn round_with_mode(value: f64, mode: RoundingMode) -> i64 {
    match mode {
        RoundingMode::Down => clamp_to_i64(value.floor()),
        RoundingMode::Up => clamp_to_i64(value.ceil()),
        RoundingMode::HalfUp => {
            if value >= 0.0 {
                clamp_to_i64((value + 0.5).floor())
            } else {
                clamp_to_i64((value - 0.5).ceil())
            }
        }
    }
}

/// Convert a floating-point value to a scaled integer
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_scaled(value: f64, scale: i32, mode: RoundingMode) -> i64 {
    let factor = pow10(scale.max(0)) as f64;
    round_with_mode(value * factor, mode)
}

/// Re-express a scaled value under a different scale
#[must_use]
pub fn rescale(scaled_value: i64, from_scale: i32, to_scale: i32, mode: RoundingMode) -> i64 {
    let safe_from = from_scale.max(0);
    let safe_to = to_scale.max(0);
    if safe_from == safe_to {
        return scaled_value;
    }
    to_scaled(to_f64(scaled_value, safe_from), safe_to, mode)
}

/// Convert a scaled integer back to floating point
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_f64(scaled_value: i64, scale: i32) -> f64 {
    scaled_value as f64 / pow10(scale.max(0)) as f64
}
