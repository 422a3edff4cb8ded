// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Web Mercator (EPSG:3857) to geographic (EPSG:4326) conversion.
//!
//! The arithmetic follows the degree-scaled form used to produce the
//! published conservation-area tiles, including the truncated value of `e`.
//! Output must stay bit-for-bit identical to that form, so do not simplify
//! it to `f64::exp` or `to_degrees`.

use crate::models::CoordinatePair;
use std::f64::consts::PI;

/// Half the circumference of the Web Mercator square, in meters.
pub const HALF_CIRCUMFERENCE: f64 = 20037508.34;

/// Euler's number as published with the source data.
pub const E: f64 = 2.7182818284;

/// Convert one EPSG:3857 pair to EPSG:4326 (longitude, latitude).
///
/// Total: inputs outside the projected square give longitudes beyond ±180,
/// and NaN inputs give NaN outputs. Use [`convert_checked`] to detect those.
pub fn convert(pair: CoordinatePair) -> CoordinatePair {
    let longitude = (pair.x * 180.0) / HALF_CIRCUMFERENCE;

    let lat_scaled = pair.y / (HALF_CIRCUMFERENCE / 180.0);
    let exponent = (PI / 180.0) * lat_scaled;
    let mut latitude = E.powf(exponent).atan();
    latitude /= PI / 360.0;
    latitude -= 90.0;

    CoordinatePair::new(longitude, latitude)
}

/// Convert and validate. Emits one diagnostic and returns `Err` carrying the
/// converted value when the result falls outside the geographic domain.
pub fn convert_checked(pair: CoordinatePair) -> Result<CoordinatePair, CoordinatePair> {
    let converted = convert(pair);
    if converted.is_valid_geographic() {
        Ok(converted)
    } else {
        tracing::warn!(
            x = pair.x,
            y = pair.y,
            longitude = converted.x,
            latitude = converted.y,
            "Coordinate conversion parameter error"
        );
        Err(converted)
    }
}

/// Inverse of [`convert`]: EPSG:4326 (longitude, latitude) to EPSG:3857.
///
/// Uses the same constants, so `convert(project(p))` returns `p` to within
/// floating point error.
pub fn project(pair: CoordinatePair) -> CoordinatePair {
    let x = (pair.x * HALF_CIRCUMFERENCE) / 180.0;

    let half_angle = (pair.y + 90.0) * (PI / 360.0);
    let exponent = half_angle.tan().ln() / E.ln();
    let lat_scaled = exponent / (PI / 180.0);
    let y = lat_scaled * (HALF_CIRCUMFERENCE / 180.0);

    CoordinatePair::new(x, y)
}
