//! Device family identification
//!
//! The family is read once at session start from the model number register
//! and consulted only where the product lines actually behave differently:
//! the VN-100 is an AHRS without a GNSS receiver, so it never reports an
//! INS position or velocity solution.

use strum::{Display, EnumIter};

/// VectorNav product family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum DeviceFamily {
    /// IMU/AHRS, no GNSS
    #[strum(to_string = "VN-100")]
    Vn100,
    /// GNSS-aided INS
    #[strum(to_string = "VN-200")]
    Vn200,
    /// Dual-antenna GNSS-aided INS
    #[strum(to_string = "VN-300")]
    Vn300,
    /// Unrecognized model number
    #[strum(to_string = "unknown")]
    Unknown,
}

impl DeviceFamily {
    /// Determine the family from a model number such as `VN-100T-CR`.
    pub fn from_model_number(model: &str) -> Self {
        let model = model.trim().to_ascii_uppercase();
        if model.starts_with("VN-100") || model.starts_with("VN-110") {
            DeviceFamily::Vn100
        } else if model.starts_with("VN-200") || model.starts_with("VN-210") {
            DeviceFamily::Vn200
        } else if model.starts_with("VN-300") || model.starts_with("VN-310") {
            DeviceFamily::Vn300
        } else {
            DeviceFamily::Unknown
        }
    }

    /// Whether the device produces a GNSS/INS position solution.
    ///
    /// Unknown devices are assumed capable so their data is not discarded.
    pub fn has_gnss(&self) -> bool {
        !matches!(self, DeviceFamily::Vn100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_from_model_number() {
        assert_eq!(
            DeviceFamily::from_model_number("VN-100T-CR"),
            DeviceFamily::Vn100
        );
        assert_eq!(DeviceFamily::from_model_number("vn-200"), DeviceFamily::Vn200);
        assert_eq!(
            DeviceFamily::from_model_number(" VN-300T-SMD "),
            DeviceFamily::Vn300
        );
        assert_eq!(DeviceFamily::from_model_number("XYZ"), DeviceFamily::Unknown);
    }

    #[test]
    fn test_gnss_capability() {
        let without: Vec<_> = DeviceFamily::iter().filter(|f| !f.has_gnss()).collect();
        assert_eq!(without, vec![DeviceFamily::Vn100]);
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceFamily::Vn300.to_string(), "VN-300");
    }
}
