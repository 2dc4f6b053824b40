//! Geodetic conversions between latitude/longitude, ECEF and local NED.
//!
//! ```text
//! N    = re / sqrt(1 - ecc^2 sin^2(lat))
//! ECEF = [N cos(lat) cos(lon), N cos(lat) sin(lon), N (1 - ecc^2) sin(lat)]
//! NED  = Rne (ECEF - ECEF_origin)
//! ```
//!
//! Altitude does not enter the ECEF computation, so positions lie on the
//! ellipsoid surface. The poles are not handled specially.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Reference ellipsoid parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Equatorial radius in meters
    pub re: f64,
    /// Polar radius in meters
    pub rp: f64,
    /// First eccentricity
    pub ecc: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self {
            re: 6378137.0,
            rp: 6356752.0,
            ecc: 0.0818,
        }
    }
}

impl Ellipsoid {
    /// Eccentricity implied by the two radii, for comparison with `ecc`
    pub fn eccentricity_from_radii(&self) -> f64 {
        (self.re * self.re - self.rp * self.rp).sqrt() / self.re
    }

    /// Prime vertical radius of curvature at `lat` (radians)
    pub fn prime_vertical_radius(&self, lat: f64) -> f64 {
        let s = lat.sin();
        self.re / (1.0 - self.ecc * self.ecc * s * s).sqrt()
    }

    /// ECEF position of the surface point at `lat`, `lon` (radians)
    pub fn lla_to_ecef(&self, lat: f64, lon: f64) -> Vector3<f64> {
        let n = self.prime_vertical_radius(lat);
        Vector3::new(
            n * lat.cos() * lon.cos(),
            n * lat.cos() * lon.sin(),
            n * (1.0 - self.ecc * self.ecc) * lat.sin(),
        )
    }
}

/// Rotation taking ECEF offsets into the NED frame at `lat`, `lon` (radians)
#[rustfmt::skip]
pub fn ecef_to_ned_rotation(lat: f64, lon: f64) -> Matrix3<f64> {
    let (slat, clat) = lat.sin_cos();
    let (slon, clon) = lon.sin_cos();
    Matrix3::new(
        -slat * clon, -slat * slon, clat,
        -slon, clon, 0.0,
        -clat * clon, -clat * slon, -slat,
    )
}

/// North, east, down offset of `ecef` from `origin`
pub fn ecef_to_ned(
    rotation: &Matrix3<f64>,
    origin: &Vector3<f64>,
    ecef: &Vector3<f64>,
) -> Vector3<f64> {
    rotation * (ecef - origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equator_prime_meridian() {
        let e = Ellipsoid::default();
        let p = e.lla_to_ecef(0.0, 0.0);
        assert_relative_eq!(p.x, 6378137.0);
        assert_eq!(p.y, 0.0);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_equator_90_east() {
        let e = Ellipsoid::default();
        let p = e.lla_to_ecef(0.0, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 6378137.0);
    }

    #[test]
    fn test_north_pole_z() {
        let e = Ellipsoid::default();
        let p = e.lla_to_ecef(std::f64::consts::FRAC_PI_2, 0.0);
        let expected = 6378137.0 * (1.0 - 0.0818f64.powi(2)) / (1.0 - 0.0818f64.powi(2)).sqrt();
        assert_relative_eq!(p.z, expected, max_relative = 1e-12);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ned_at_origin_is_zero() {
        let e = Ellipsoid::default();
        let (lat, lon) = (45f64.to_radians(), (-122f64).to_radians());
        let origin = e.lla_to_ecef(lat, lon);
        let r = ecef_to_ned_rotation(lat, lon);
        let ned = ecef_to_ned(&r, &origin, &origin);
        assert_eq!(ned, Vector3::zeros());
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let r = ecef_to_ned_rotation(0.7, -2.1);
        let identity = r * r.transpose();
        assert_relative_eq!(identity, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_small_offsets_point_the_right_way() {
        let e = Ellipsoid::default();
        let (lat, lon) = (45f64.to_radians(), (-122f64).to_radians());
        let origin = e.lla_to_ecef(lat, lon);
        let r = ecef_to_ned_rotation(lat, lon);

        let north = ecef_to_ned(&r, &origin, &e.lla_to_ecef(lat + 1e-6, lon));
        assert!(north.x > 0.0);
        assert_relative_eq!(north.y, 0.0, epsilon = 1e-6);

        let east = ecef_to_ned(&r, &origin, &e.lla_to_ecef(lat, lon + 1e-6));
        assert!(east.y > 0.0);
        assert_relative_eq!(east.x, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_eccentricity_close_to_radii() {
        let e = Ellipsoid::default();
        assert_relative_eq!(e.eccentricity_from_radii(), e.ecc, epsilon = 1e-3);
    }
}
