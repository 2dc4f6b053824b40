//! Output records and their publication envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record produced from a decoded packet, tagged by topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum OutputRecord {
    /// Roll, pitch, yaw in radians
    #[serde(rename = "ins_2d/att_rpy")]
    AttitudeRpy { roll: f64, pitch: f64, yaw: f64 },

    /// Body angular rate in rad/s, sensor frame
    #[serde(rename = "ins_2d/ang_rate")]
    AngularRate { x: f64, y: f64, z: f64 },

    /// Body acceleration in m/s^2, sensor frame
    #[serde(rename = "ins_2d/accel")]
    Acceleration { x: f64, y: f64, z: f64 },

    /// Latitude, longitude in degrees and heading in radians
    #[serde(rename = "ins_2d/ins_pose")]
    PositionLla {
        latitude: f64,
        longitude: f64,
        yaw: f64,
    },

    /// Offset from the reference fix in meters, heading in radians
    #[serde(rename = "ins_2d/NED_pose")]
    PositionNed { north: f64, east: f64, yaw: f64 },

    #[serde(rename = "ins_2d/ECEF_pose")]
    PositionEcef { x: f64, y: f64, z: f64 },

    /// Reference fix, emitted once each time the anchor latches
    #[serde(rename = "ins_2d/ins_ref")]
    ReferenceSnapshot {
        latitude: f64,
        longitude: f64,
        yaw: f64,
        ecef: [f64; 3],
    },

    /// Frame-converted inertial sample with row-major 3x3 covariances
    #[serde(rename = "IMU")]
    Imu {
        /// (x, y, z, w)
        orientation: [f64; 4],
        angular_velocity: [f64; 3],
        linear_acceleration: [f64; 3],
        orientation_covariance: [f64; 9],
        angular_velocity_covariance: [f64; 9],
        linear_acceleration_covariance: [f64; 9],
    },
}

impl OutputRecord {
    pub fn topic(&self) -> &'static str {
        match self {
            OutputRecord::AttitudeRpy { .. } => "ins_2d/att_rpy",
            OutputRecord::AngularRate { .. } => "ins_2d/ang_rate",
            OutputRecord::Acceleration { .. } => "ins_2d/accel",
            OutputRecord::PositionLla { .. } => "ins_2d/ins_pose",
            OutputRecord::PositionNed { .. } => "ins_2d/NED_pose",
            OutputRecord::PositionEcef { .. } => "ins_2d/ECEF_pose",
            OutputRecord::ReferenceSnapshot { .. } => "ins_2d/ins_ref",
            OutputRecord::Imu { .. } => "IMU",
        }
    }
}

/// A record together with when it was received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub received_at: DateTime<Utc>,
    /// GPS time of week of the source packet, seconds
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gps_tow: Option<f64>,
    #[serde(flatten)]
    pub record: OutputRecord,
}

impl Publication {
    pub fn topic(&self) -> &'static str {
        self.record.topic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_tag_matches_topic() {
        let record = OutputRecord::PositionNed {
            north: 1.0,
            east: 2.0,
            yaw: 0.5,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["topic"], record.topic());
        assert_eq!(json["north"], 1.0);
    }

    #[test]
    fn test_publication_json_roundtrip() {
        let publication = Publication {
            received_at: DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            gps_tow: Some(345600.25),
            record: OutputRecord::AttitudeRpy {
                roll: 0.1,
                pitch: 0.2,
                yaw: 0.3,
            },
        };
        let json = serde_json::to_string(&publication).unwrap();
        assert!(json.contains("\"topic\":\"ins_2d/att_rpy\""));
        let parsed: Publication = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, publication);
    }

    #[test]
    fn test_missing_tow_not_serialized() {
        let publication = Publication {
            received_at: Utc::now(),
            gps_tow: None,
            record: OutputRecord::AngularRate {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        };
        let json = serde_json::to_string(&publication).unwrap();
        assert!(!json.contains("gps_tow"));
        assert_eq!(publication.topic(), "ins_2d/ang_rate");
    }
}
