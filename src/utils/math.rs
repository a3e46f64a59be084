// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Arbitrary precision math utilities
//!
//! Thin helpers over `dashu` binary floats. Every value built here carries an
//! explicit precision in bits, so divisions never run at unlimited precision.

use dashu::float::FBig;
use dashu::integer::IBig;

/// Binary floating point number with an explicit precision in bits
pub type Float = FBig;

/// Smallest working precision accepted anywhere in the engine
pub const MIN_PRECISION: usize = 64;

/// Upper bound on the iterations of any series expansion
const MAX_SERIES_TERMS: usize = 1 << 16;

/// Build a float from an integer at the given precision
pub fn from_i64(value: i64, precision: usize) -> Float {
    from_ibig(IBig::from(value), precision)
}

/// Build a float from a big integer at the given precision
pub fn from_ibig(value: IBig, precision: usize) -> Float {
    Float::from_parts(value, 0)
        .with_precision(precision.max(MIN_PRECISION))
        .value()
}

/// 2^-bits
pub fn epsilon(bits: usize) -> Float {
    Float::from_parts(IBig::ONE, -(bits as isize))
}

pub fn abs(x: &Float) -> Float {
    if *x < Float::ZERO {
        -x.clone()
    } else {
        x.clone()
    }
}

/// Check whether a float holds an integer value
pub fn is_integral(x: &Float) -> bool {
    x.trunc() == *x
}

/// Integer part of a float, truncating toward zero
pub fn to_ibig(x: &Float) -> IBig {
    x.trunc().to_int().value()
}

/// Exact conversion to `i64`; `None` for fractional or out-of-range values
pub fn to_i64_exact(x: &Float) -> Option<i64> {
    if !is_integral(x) {
        return None;
    }
    i64::try_from(to_ibig(x)).ok()
}

/// Round to the nearest integer, ties away from zero
pub fn round_half_away(x: &Float) -> Float {
    let half = Float::from_parts(IBig::ONE, -1);
    if *x >= Float::ZERO {
        (x + &half).trunc()
    } else {
        (x - &half).trunc()
    }
}

/// Number of bits in the integer part of |x|, `None` if |x| is out of `f64` range
pub fn magnitude_bits(x: &Float) -> Option<usize> {
    let approx = x.to_f64().value().abs();
    if !approx.is_finite() {
        return None;
    }
    if approx < 1.0 {
        return Some(0);
    }
    Some(approx.log2().ceil() as usize)
}

/// Number of bits in the integer part of |x|, read off the representation
///
/// Unlike [`magnitude_bits`] this works for values beyond the `f64` range.
pub fn integer_bits(x: &Float) -> usize {
    let repr = x.repr();
    if repr.is_zero() {
        return 0;
    }
    let top = repr.exponent().saturating_add(repr.digits() as isize);
    usize::try_from(top).unwrap_or(0)
}

/// π computed with Machin's formula
pub fn pi(precision: usize) -> Float {
    let work = precision.max(MIN_PRECISION) + 16;
    let a = arctan_inverse(5, work);
    let b = arctan_inverse(239, work);
    let pi = &(&from_i64(16, work) * &a) - &(&from_i64(4, work) * &b);
    pi.with_precision(precision.max(MIN_PRECISION)).value()
}

/// arctan(1/m) for an integer m > 1
fn arctan_inverse(m: i64, work: usize) -> Float {
    let eps = epsilon(work);
    let m_squared = from_i64(m * m, work);
    let mut power = &from_i64(1, work) / &from_i64(m, work);
    let mut sum = power.clone();

    for k in 1..MAX_SERIES_TERMS as i64 {
        power = &power / &m_squared;
        if power < eps {
            break;
        }
        let term = &power / &from_i64(2 * k + 1, work);
        sum = if k % 2 == 1 { &sum - &term } else { &sum + &term };
    }

    sum
}

/// Sine, `None` if the argument is too large to reduce
pub fn sin(x: &Float, precision: usize) -> Option<Float> {
    let (reduced, work) = reduce_angle(x, precision)?;
    Some(
        taylor(&reduced, work, true)
            .with_precision(precision.max(MIN_PRECISION))
            .value(),
    )
}

/// Cosine, `None` if the argument is too large to reduce
pub fn cos(x: &Float, precision: usize) -> Option<Float> {
    let (reduced, work) = reduce_angle(x, precision)?;
    Some(
        taylor(&reduced, work, false)
            .with_precision(precision.max(MIN_PRECISION))
            .value(),
    )
}

/// Reduce x into [-π, π]; the working precision grows with |x|
fn reduce_angle(x: &Float, precision: usize) -> Option<(Float, usize)> {
    let work = precision.max(MIN_PRECISION) + magnitude_bits(x)? + 32;
    let x = x.clone().with_precision(work).value();
    let two_pi = &pi(work) * &from_i64(2, work);
    let turns = round_half_away(&(&x / &two_pi));
    let reduced = &x - &(&turns * &two_pi);
    Some((reduced, work))
}

/// Taylor expansion of sin (odd) or cos (even) around zero
fn taylor(r: &Float, work: usize, odd: bool) -> Float {
    let eps = epsilon(work);
    let r_squared = r * r;
    let mut term = if odd { r.clone() } else { from_i64(1, work) };
    let mut sum = term.clone();
    let mut k: i64 = if odd { 1 } else { 0 };

    for _ in 0..MAX_SERIES_TERMS {
        let denominator = from_i64((k + 1) * (k + 2), work);
        term = -(&(&term * &r_squared) / &denominator);
        k += 2;
        if abs(&term) < eps {
            break;
        }
        sum = &sum + &term;
    }

    sum
}

/// Parse a decimal string such as `-3.14159e0` into a float
pub fn parse_decimal(text: &str, precision: usize) -> Option<Float> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (mantissa, exponent) = match body.find(|c| c == 'e' || c == 'E') {
        Some(idx) => (&body[..idx], body[idx + 1..].parse::<i64>().ok()?),
        None => (body, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part
        .bytes()
        .chain(frac_part.bytes())
        .all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut digits = IBig::from_str_radix(&format!("{int_part}{frac_part}"), 10).ok()?;
    if negative {
        digits = -digits;
    }

    let scale = exponent.checked_sub(frac_part.len() as i64)?;
    let magnitude = usize::try_from(scale.unsigned_abs()).ok()?;
    if magnitude > 100_000 {
        return None;
    }
    let power = IBig::from(10u8).pow(magnitude);

    if scale >= 0 {
        Some(from_ibig(digits * power, precision))
    } else {
        Some(&from_ibig(digits, precision) / &from_ibig(power, precision))
    }
}

/// Format a float with a fixed number of decimal places
pub fn to_decimal_string(x: &Float, digits: usize) -> String {
    let negative = *x < Float::ZERO;
    let work = x.precision().max(MIN_PRECISION) + digits * 4;
    let magnitude = abs(x).with_precision(work).value();
    let scale = from_ibig(IBig::from(10u8).pow(digits), work);
    let scaled = round_half_away(&(&magnitude * &scale));

    let mut text = to_ibig(&scaled).to_string();
    if text.len() <= digits {
        text = format!("{}{}", "0".repeat(digits + 1 - text.len()), text);
    }
    let (int_part, frac_part) = text.split_at(text.len() - digits);
    let sign = if negative { "-" } else { "" };

    if digits == 0 {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    }
}

/// Number of correct decimal digits of `value` relative to `target`
///
/// Returns `None` when the target is zero or the relative error underflows.
pub fn correct_digits(value: &Float, target: &Float) -> Option<f64> {
    if *target == Float::ZERO {
        return None;
    }
    let relative = &abs(&(value - target)) / &abs(target);
    let relative = relative.to_f64().value();
    if relative > 0.0 {
        Some(-relative.log10())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn as_f64(x: &Float) -> f64 {
        x.to_f64().value()
    }

    #[test]
    fn test_pi() {
        let pi = pi(256);
        assert_eq!(
            to_decimal_string(&pi, 30),
            "3.141592653589793238462643383280"
        );
    }

    #[test]
    fn test_sin_cos() {
        let x = from_i64(1, 128);
        assert_relative_eq!(as_f64(&sin(&x, 128).unwrap()), 1f64.sin(), epsilon = 1e-15);
        assert_relative_eq!(as_f64(&cos(&x, 128).unwrap()), 1f64.cos(), epsilon = 1e-15);

        let big = from_i64(1_000_000, 128);
        assert_relative_eq!(
            as_f64(&sin(&big, 128).unwrap()),
            1_000_000f64.sin(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_rounding() {
        let x = parse_decimal("2.5", 128).unwrap();
        assert_eq!(to_i64_exact(&round_half_away(&x)), Some(3));
        let y = parse_decimal("-2.5", 128).unwrap();
        assert_eq!(to_i64_exact(&round_half_away(&y)), Some(-3));
        let z = parse_decimal("-0.4", 128).unwrap();
        assert_eq!(to_i64_exact(&round_half_away(&z)), Some(0));
    }

    #[test]
    fn test_integrality() {
        assert!(is_integral(&from_i64(-17, 128)));
        assert!(!is_integral(&parse_decimal("0.5", 128).unwrap()));
        assert_eq!(to_i64_exact(&from_i64(i64::MAX, 128)), Some(i64::MAX));
        assert_eq!(to_i64_exact(&parse_decimal("1e30", 128).unwrap()), None);
    }

    #[test]
    fn test_integer_bits() {
        assert_eq!(integer_bits(&from_i64(0, 128)), 0);
        assert_eq!(integer_bits(&from_i64(1, 128)), 1);
        assert_eq!(integer_bits(&from_i64(255, 128)), 8);
        assert_eq!(integer_bits(&from_i64(-256, 128)), 9);
        assert_eq!(integer_bits(&parse_decimal("0.5", 128).unwrap()), 0);

        let huge = parse_decimal("1e400", 128).unwrap();
        assert_eq!(magnitude_bits(&huge), None);
        assert_eq!(integer_bits(&huge), 1329);
    }

    #[test]
    fn test_decimal_io() {
        assert!(parse_decimal("abc", 128).is_none());
        assert!(parse_decimal("", 128).is_none());
        let x = parse_decimal("-12.25e1", 128).unwrap();
        assert_eq!(to_decimal_string(&x, 2), "-122.50");
        assert_eq!(to_decimal_string(&parse_decimal("0.005", 128).unwrap(), 3), "0.005");
    }

    #[test]
    fn test_correct_digits() {
        let target = pi(256);
        let approx = parse_decimal("3.14159", 256).unwrap();
        let digits = correct_digits(&approx, &target).unwrap();
        assert!(digits > 5.0 && digits < 7.0);
        assert!(correct_digits(&target, &target).is_none());
    }
}
