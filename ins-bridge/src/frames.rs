//! Output frame convention.
//!
//! The sensor reports attitude in a NED-style body convention. Consumers may
//! ask for ENU instead, either by swapping axes (x and y exchanged, z negated)
//! or by pre-multiplying the attitude with a fixed NED to ENU rotation.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Selected output convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConvention {
    pub convert_to_enu: bool,
    pub use_frame_based_rotation: bool,
}

/// Rotation applied under the frame-based policy
pub fn ned_to_enu_rotation() -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(PI, 0.0, FRAC_PI_2)
}

impl FrameConvention {
    pub fn native() -> Self {
        Self::default()
    }

    fn swaps_axes(&self) -> bool {
        self.convert_to_enu && !self.use_frame_based_rotation
    }

    /// Convert a sensor quaternion given as (x, y, z, w)
    pub fn orientation(&self, q: [f64; 4]) -> Quaternion<f64> {
        let [x, y, z, w] = q;
        let native = Quaternion::new(w, x, y, z);
        match (self.convert_to_enu, self.use_frame_based_rotation) {
            (false, _) => native,
            (true, true) => ned_to_enu_rotation().into_inner() * native,
            (true, false) => Quaternion::new(w, y, x, -z),
        }
    }

    /// Convert a body vector (angular rate or acceleration).
    ///
    /// Only the axis-swap policy changes vectors.
    pub fn vector(&self, v: [f64; 3]) -> Vector3<f64> {
        let [x, y, z] = v;
        if self.swaps_axes() {
            Vector3::new(y, x, -z)
        } else {
            Vector3::new(x, y, z)
        }
    }

    /// Orientation covariance diagonal from attitude variances given in the
    /// sensor's (yaw, pitch, roll) order.
    ///
    /// Natively the diagonal is (roll, pitch, yaw). The axis swap exchanges
    /// the first two entries of the sensor vector instead.
    pub fn attitude_variances(&self, variances: [f64; 3]) -> [f64; 3] {
        let [yaw, pitch, roll] = variances;
        if self.swaps_axes() {
            [pitch, yaw, roll]
        } else {
            [roll, pitch, yaw]
        }
    }
}

/// Quaternion components in (x, y, z, w) order
pub fn xyzw(q: &Quaternion<f64>) -> [f64; 4] {
    [q.i, q.j, q.k, q.w]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const IDENTITY: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

    fn swap() -> FrameConvention {
        FrameConvention {
            convert_to_enu: true,
            use_frame_based_rotation: false,
        }
    }

    fn frame_based() -> FrameConvention {
        FrameConvention {
            convert_to_enu: true,
            use_frame_based_rotation: true,
        }
    }

    #[test]
    fn test_native_passthrough() {
        let c = FrameConvention::native();
        let q = [0.1, 0.2, 0.3, 0.9];
        assert_eq!(xyzw(&c.orientation(q)), q);
        assert_eq!(c.vector([1.0, 2.0, 3.0]), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(c.attitude_variances([1.0, 2.0, 3.0]), [3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_native_ignores_rotation_flag() {
        let c = FrameConvention {
            convert_to_enu: false,
            use_frame_based_rotation: true,
        };
        assert_eq!(xyzw(&c.orientation([0.1, 0.2, 0.3, 0.9])), [0.1, 0.2, 0.3, 0.9]);
    }

    #[test]
    fn test_axis_swap_vector() {
        let v = swap().vector([1.0, 2.0, 3.0]);
        assert_eq!(v, Vector3::new(2.0, 1.0, -3.0));
        // the swap is its own inverse; the output is labelled ENU, so it is
        // never fed back through the adapter
        assert_eq!(swap().vector([v.x, v.y, v.z]), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_axis_swap_quaternion_and_variances() {
        let c = swap();
        assert_eq!(xyzw(&c.orientation([0.1, 0.2, 0.3, 0.9])), [0.2, 0.1, -0.3, 0.9]);
        assert_eq!(c.attitude_variances([1.0, 2.0, 3.0]), [2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_frame_based_identity() {
        let q = frame_based().orientation(IDENTITY);
        let expected = UnitQuaternion::from_euler_angles(PI, 0.0, FRAC_PI_2).into_inner();
        assert_relative_eq!(q.w, expected.w, epsilon = 1e-9);
        assert_relative_eq!(q.i, expected.i, epsilon = 1e-9);
        assert_relative_eq!(q.j, expected.j, epsilon = 1e-9);
        assert_relative_eq!(q.k, expected.k, epsilon = 1e-9);
        // roll pi then yaw pi/2: x = y = sqrt(2)/2
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(q.i, half, epsilon = 1e-9);
        assert_relative_eq!(q.j, half, epsilon = 1e-9);
        assert_relative_eq!(q.k, 0.0, epsilon = 1e-9);
        assert_relative_eq!(q.w, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_frame_based_leaves_vectors() {
        let c = frame_based();
        assert_eq!(c.vector([1.0, 2.0, 3.0]), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(c.attitude_variances([1.0, 2.0, 3.0]), [3.0, 2.0, 1.0]);
    }
}
