//! Conversion between major currency units (e.g. dollars), which the API
//! accepts, and minor units (e.g. cents), which everything else stores.

use crate::Error;

/// The largest number of minor units an amount may have.
///
/// This is the largest integer a JSON client using doubles can represent exactly.
pub const MAX_MINOR_UNITS: i64 = 9_007_199_254_740_991;

/// Convert an amount in major units into minor units, rounding half away from zero.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `major` is not finite, is negative, or
/// is larger than [MAX_MINOR_UNITS] once converted.
pub fn to_minor_units(major: f64) -> Result<i64, Error> {
    if !major.is_finite() {
        return Err(Error::InvalidAmount("must be a finite number"));
    }

    if major < 0.0 {
        return Err(Error::InvalidAmount("must be zero or greater"));
    }

    let minor = (major * 100.0).round();

    if minor > MAX_MINOR_UNITS as f64 {
        return Err(Error::InvalidAmount("is too large"));
    }

    Ok(minor as i64)
}

/// Format minor units as a dollar amount with two decimal places, e.g. `$12.50`.
pub fn format_minor_units(minor: i128) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let magnitude = minor.unsigned_abs();

    format!("{sign}${}.{:02}", magnitude / 100, magnitude % 100)
}
