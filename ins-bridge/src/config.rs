//! Bridge configuration.
//!
//! Loaded once from a JSON file (every field optional) and then read-only.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::frames::FrameConvention;
use crate::geodetic::Ellipsoid;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{name} covariance {reason}")]
    Covariance { name: &'static str, reason: String },

    #[error("{0}")]
    Invalid(String),
}

/// Row-major 3x3 covariance; all zeros means unknown
pub type Covariance = [f64; 9];

/// Configured measurement covariances
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Covariances {
    pub linear_acceleration: Covariance,
    pub angular_velocity: Covariance,
    pub orientation: Covariance,
}

fn validate_covariance(name: &'static str, cov: &Covariance) -> Result<(), ConfigError> {
    let fail = |reason: String| Err(ConfigError::Covariance { name, reason });
    if let Some(v) = cov.iter().find(|v| !v.is_finite()) {
        return fail(format!("has non-finite entry {v}"));
    }
    for row in 0..3 {
        if cov[row * 3 + row] < 0.0 {
            return fail(format!("has negative variance at ({row}, {row})"));
        }
        for col in (row + 1)..3 {
            let (a, b) = (cov[row * 3 + col], cov[col * 3 + row]);
            if (a - b).abs() > 1e-12 * a.abs().max(b.abs()).max(1.0) {
                return fail(format!("is not symmetric at ({row}, {col})"));
            }
        }
    }
    Ok(())
}

impl Covariances {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_covariance("linear_acceleration", &self.linear_acceleration)?;
        validate_covariance("angular_velocity", &self.angular_velocity)?;
        validate_covariance("orientation", &self.orientation)
    }
}

/// Everything the bridge needs to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub serial_port: String,
    /// Baud rate the device is switched to after connecting
    pub serial_baud: u32,
    /// Binary output rate in Hz
    pub async_output_rate: u32,
    /// Internal IMU rate of the device in Hz
    pub imu_rate: u32,
    #[serde(flatten)]
    pub frames: FrameConvention,
    /// Also emit the frame-converted IMU record
    pub publish_imu: bool,
    pub covariances: Covariances,
    pub ellipsoid: Ellipsoid,
    /// Capacity of the publication channel
    pub channel_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyUSB0".to_string(),
            serial_baud: 921600,
            async_output_rate: 200,
            imu_rate: 800,
            frames: FrameConvention::default(),
            publish_imu: false,
            covariances: Covariances::default(),
            ellipsoid: Ellipsoid::default(),
            channel_capacity: 1000,
        }
    }
}

impl BridgeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.covariances.validate()?;
        if self.async_output_rate == 0 {
            return Err(ConfigError::Invalid(
                "async_output_rate must be positive".to_string(),
            ));
        }
        if self.imu_rate < self.async_output_rate {
            return Err(ConfigError::Invalid(format!(
                "imu_rate {} is below async_output_rate {}",
                self.imu_rate, self.async_output_rate
            )));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be positive".to_string(),
            ));
        }
        if self.frame_options_unused() {
            warn!("frame convention set but publish_imu is off; no record uses it");
        }
        Ok(())
    }

    /// True when a non-native frame convention is requested but nothing
    /// published would use it
    pub fn frame_options_unused(&self) -> bool {
        self.frames != FrameConvention::native() && !self.publish_imu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_frame_options_without_imu_flagged() {
        let mut config = BridgeConfig::default();
        assert!(!config.frame_options_unused());

        config.frames.convert_to_enu = true;
        assert!(config.frame_options_unused());
        // still valid, only warned about
        assert!(config.validate().is_ok());

        config.publish_imu = true;
        assert!(!config.frame_options_unused());
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert!(!config.frames.convert_to_enu);
        assert!(!config.frames.use_frame_based_rotation);
        assert_eq!(config.ellipsoid.re, 6378137.0);
        assert_eq!(config.covariances.orientation, [0.0; 9]);
    }

    #[test]
    fn test_flags_and_covariance_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "convert_to_enu": true,
                "publish_imu": true,
                "covariances": {{
                    "angular_velocity": [0.01, 0, 0, 0, 0.01, 0, 0, 0, 0.02]
                }}
            }}"#
        )
        .unwrap();

        let config = BridgeConfig::load_from_file(file.path()).unwrap();
        assert!(config.frames.convert_to_enu);
        assert!(config.publish_imu);
        assert_eq!(config.covariances.angular_velocity[8], 0.02);
        assert_eq!(config.covariances.linear_acceleration, [0.0; 9]);
    }

    #[test]
    fn test_asymmetric_covariance_rejected() {
        let json = r#"{"covariances": {"orientation": [1, 0.5, 0, 0, 1, 0, 0, 0, 1]}}"#;
        let err = BridgeConfig::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Covariance {
                name: "orientation",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_variance_rejected() {
        let json = r#"{"covariances": {"linear_acceleration": [-1, 0, 0, 0, 1, 0, 0, 0, 1]}}"#;
        assert!(BridgeConfig::from_json(json).is_err());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let json = r#"{"covariances": {"orientation": [1, 0, 0]}}"#;
        assert!(matches!(
            BridgeConfig::from_json(json),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_rates_checked() {
        let json = r#"{"imu_rate": 100, "async_output_rate": 200}"#;
        assert!(matches!(
            BridgeConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }
}
