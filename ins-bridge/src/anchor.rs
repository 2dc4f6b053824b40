//! Local frame origin latched from the first valid position fix.
//!
//! The anchor starts unset. The first fix with a non-zero latitude becomes the
//! origin of the local NED frame and stays fixed until [`ReferenceAnchor::reset`]
//! is called, after which the next valid fix latches again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nalgebra::{Matrix3, Vector3};
use tracing::info;

use crate::geodetic::{ecef_to_ned, ecef_to_ned_rotation};

/// Origin of the local tangent frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFix {
    pub origin_ecef: Vector3<f64>,
    /// Latitude, longitude in radians
    pub origin_lla: [f64; 2],
    pub rotation_ecef_to_ned: Matrix3<f64>,
}

impl ReferenceFix {
    /// Build the fix from an LLA origin (radians) and its ECEF position
    pub fn new(lat: f64, lon: f64, origin_ecef: Vector3<f64>) -> Self {
        Self {
            origin_ecef,
            origin_lla: [lat, lon],
            rotation_ecef_to_ned: ecef_to_ned_rotation(lat, lon),
        }
    }

    /// NED offset of `ecef` from this origin
    pub fn to_ned(&self, ecef: &Vector3<f64>) -> Vector3<f64> {
        ecef_to_ned(&self.rotation_ecef_to_ned, &self.origin_ecef, ecef)
    }

    /// Origin latitude in degrees
    pub fn latitude_deg(&self) -> f64 {
        self.origin_lla[0].to_degrees()
    }

    /// Origin longitude in degrees
    pub fn longitude_deg(&self) -> f64 {
        self.origin_lla[1].to_degrees()
    }
}

/// Latch holding the reference fix
#[derive(Debug, Default)]
pub struct ReferenceAnchor {
    fix: Option<ReferenceFix>,
}

impl ReferenceAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the fix at `lat`, `lon` (radians) if the anchor is unset and
    /// the latitude is non-zero. Returns true only when this call latched.
    pub fn try_initialize(&mut self, lat: f64, lon: f64, ecef: Vector3<f64>) -> bool {
        if self.fix.is_some() || lat == 0.0 {
            return false;
        }
        let fix = ReferenceFix::new(lat, lon, ecef);
        info!(
            "reference fix latched at lat {:.7} lon {:.7}",
            fix.latitude_deg(),
            fix.longitude_deg()
        );
        self.fix = Some(fix);
        true
    }

    /// Forget the fix; the next valid packet latches a new one
    pub fn reset(&mut self) {
        if self.fix.take().is_some() {
            info!("reference fix cleared");
        }
    }

    pub fn get(&self) -> Option<ReferenceFix> {
        self.fix
    }

    pub fn is_set(&self) -> bool {
        self.fix.is_some()
    }
}

/// Anchor shared between the frame path and reset requests
#[derive(Debug, Clone, Default)]
pub struct SharedAnchor(Arc<Mutex<ReferenceAnchor>>);

impl SharedAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the anchor. A poisoned lock still holds a consistent value
    /// since every mutation is a single assignment.
    pub fn lock(&self) -> MutexGuard<'_, ReferenceAnchor> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn get(&self) -> Option<ReferenceFix> {
        self.lock().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodetic::Ellipsoid;
    use approx::assert_relative_eq;

    fn fix_at(lat_deg: f64, lon_deg: f64) -> (f64, f64, Vector3<f64>) {
        let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
        (lat, lon, Ellipsoid::default().lla_to_ecef(lat, lon))
    }

    #[test]
    fn test_latches_once() {
        let mut anchor = ReferenceAnchor::new();
        let (lat, lon, ecef) = fix_at(45.0, -122.0);
        assert!(anchor.try_initialize(lat, lon, ecef));

        let (lat2, lon2, ecef2) = fix_at(46.0, -121.0);
        assert!(!anchor.try_initialize(lat2, lon2, ecef2));

        let fix = anchor.get().unwrap();
        assert_relative_eq!(fix.latitude_deg(), 45.0, epsilon = 1e-12);
        assert_relative_eq!(fix.longitude_deg(), -122.0, epsilon = 1e-12);
        assert_eq!(fix.origin_ecef, ecef);
    }

    #[test]
    fn test_zero_latitude_ignored() {
        let mut anchor = ReferenceAnchor::new();
        let (_, lon, ecef) = fix_at(0.0, 10.0);
        for _ in 0..5 {
            assert!(!anchor.try_initialize(0.0, lon, ecef));
            assert!(!anchor.is_set());
            assert!(anchor.get().is_none());
        }

        let (lat, lon, ecef) = fix_at(45.0, -122.0);
        assert!(anchor.try_initialize(lat, lon, ecef));
        assert_relative_eq!(anchor.get().unwrap().latitude_deg(), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_allows_relatch() {
        let mut anchor = ReferenceAnchor::new();
        let (lat, lon, ecef) = fix_at(45.0, -122.0);
        anchor.try_initialize(lat, lon, ecef);
        anchor.reset();
        assert!(!anchor.is_set());

        let (lat2, lon2, ecef2) = fix_at(10.0, 20.0);
        assert!(anchor.try_initialize(lat2, lon2, ecef2));
        assert_relative_eq!(anchor.get().unwrap().latitude_deg(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fix_origin_maps_to_zero() {
        let (lat, lon, ecef) = fix_at(-33.9, 151.2);
        let fix = ReferenceFix::new(lat, lon, ecef);
        assert_eq!(fix.to_ned(&ecef), Vector3::zeros());
    }

    #[test]
    fn test_shared_reset_from_other_thread() {
        let shared = SharedAnchor::new();
        let (lat, lon, ecef) = fix_at(45.0, -122.0);
        assert!(shared.lock().try_initialize(lat, lon, ecef));

        let handle = shared.clone();
        std::thread::spawn(move || handle.reset()).join().unwrap();
        assert!(shared.get().is_none());
    }
}
