//! Fixed-point fractions
//!
//! Fractional values are stored as integers in `[0, TYPE_MAX]`, where
//! `TYPE_MAX` stands for 100%. Products of two fractions are rescaled by
//! `TYPE_MAX` so that 100% x 100% stays 100%.

/// Fixed-point unit for int16 fractions
pub const INT16_ONE: i32 = i16::MAX as i32;

/// Integer percentage to int16 fraction (`p * TYPE_MAX / 100`)
#[inline]
pub fn percent_to_i16(percent: i32) -> i16 {
    (percent.clamp(0, 100) * INT16_ONE / 100) as i16
}

/// Float percentage to int16 fraction (`round(p / 100 * TYPE_MAX)`)
#[inline]
pub fn percent_f32_to_i16(percent: f32) -> i16 {
    fraction_to_i16(percent as f64 / 100.0)
}

/// Fraction in `[0, 1]` to int16 fixed point
#[inline]
pub fn fraction_to_i16(fraction: f64) -> i16 {
    (fraction.clamp(0.0, 1.0) * INT16_ONE as f64).round() as i16
}

/// Int16 fixed point to fraction
#[inline]
pub fn i16_to_fraction(raw: i16) -> f32 {
    raw as f32 / INT16_ONE as f32
}

/// Product of two int16 fractions
#[inline]
pub fn mul(a: i32, b: i32) -> i32 {
    let product = a as i64 * b as i64;
    ((product + INT16_ONE as i64 / 2) / INT16_ONE as i64) as i32
}

/// Quotient of two int16 fractions. Returns `a` unchanged for a zero divisor.
#[inline]
pub fn div(a: i32, b: i32) -> i32 {
    if b == 0 {
        return a;
    }
    ((a as i64 * INT16_ONE as i64) / b as i64) as i32
}

/// Clamp into the valid fraction range
#[inline]
pub fn clamp(raw: i64) -> i32 {
    raw.clamp(0, INT16_ONE as i64) as i32
}
