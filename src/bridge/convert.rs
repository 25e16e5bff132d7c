//! Pure parameter conversions between host and backend conventions.

use crate::error::Error;

/// Converts host `(c12, c6)` Lennard-Jones coefficients into the backend's
/// `(sigma, epsilon)` form.
///
/// Both zero means a non-interacting particle and maps to `(1.0, 0.0)`.
/// Both strictly positive map through `epsilon = c6²/(4·c12)`,
/// `sigma = (c12/c6)^(1/6)`. Any other combination cannot be expressed by
/// the backend (it has no purely repulsive or purely attractive form) and is
/// an inconsistent host model.
pub fn lj_from_c12_c6(c12: f64, c6: f64) -> Result<(f64, f64), Error> {
    if c12 == 0.0 && c6 == 0.0 {
        Ok((1.0, 0.0))
    } else if c12 > 0.0 && c6 > 0.0 {
        let epsilon = (c6 * c6) / (4.0 * c12);
        let sigma = (c12 / c6).powf(1.0 / 6.0);
        Ok((sigma, epsilon))
    } else {
        Err(Error::translation(format!(
            "pair coefficients must both be positive or both zero, got c12 = {c12}, c6 = {c6}"
        )))
    }
}

/// Degrees to radians; the host stores angles and torsion phases in degrees,
/// the backend expects radians.
#[inline]
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}
