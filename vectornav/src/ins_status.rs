//! INS status word reported in the Common and INS groups

use bitflags::bitflags;

bitflags! {
    /// INS filter status register
    ///
    /// Bits 0-1 hold the filter mode (see [`InsMode`]); the remaining bits
    /// are independent flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InsStatus: u16 {
        const MODE_LOW = 1 << 0;
        const MODE_HIGH = 1 << 1;
        /// GNSS receiver has a valid fix
        const GNSS_FIX = 1 << 2;
        const IMU_ERROR = 1 << 4;
        const MAG_PRES_ERROR = 1 << 5;
        const GNSS_ERROR = 1 << 6;
        /// VN-300 only: GNSS compass heading is aiding the INS
        const GNSS_HEADING_INS = 1 << 8;
        /// VN-300 only: GNSS compass is operational
        const GNSS_COMPASS = 1 << 9;
    }
}

/// Filter mode encoded in the two low bits of [`InsStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsMode {
    /// Not tracking; insufficient dynamic motion to align
    NotTracking,
    /// Aligning or degraded solution
    Aligning,
    /// Tracking with a healthy solution
    Tracking,
    /// GNSS lost for more than 45 seconds
    GnssLost,
}

impl InsStatus {
    /// Build from a raw register value, keeping undefined bits
    pub fn from_raw(raw: u16) -> Self {
        Self::from_bits_retain(raw)
    }

    pub fn mode(&self) -> InsMode {
        match self.bits() & 0b11 {
            0 => InsMode::NotTracking,
            1 => InsMode::Aligning,
            2 => InsMode::Tracking,
            _ => InsMode::GnssLost,
        }
    }

    /// True when any of the sensor error flags is raised
    pub fn has_error(&self) -> bool {
        self.intersects(Self::IMU_ERROR | Self::MAG_PRES_ERROR | Self::GNSS_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_decoding() {
        assert_eq!(InsStatus::from_raw(0x0000).mode(), InsMode::NotTracking);
        assert_eq!(InsStatus::from_raw(0x0001).mode(), InsMode::Aligning);
        assert_eq!(InsStatus::from_raw(0x0006).mode(), InsMode::Tracking);
        assert_eq!(InsStatus::from_raw(0x0003).mode(), InsMode::GnssLost);
    }

    #[test]
    fn test_flags() {
        let status = InsStatus::from_raw(0x0046);
        assert!(status.contains(InsStatus::GNSS_FIX));
        assert!(status.contains(InsStatus::GNSS_ERROR));
        assert!(status.has_error());
        assert!(!InsStatus::from_raw(0x0006).has_error());
    }

    #[test]
    fn test_undefined_bits_retained() {
        let status = InsStatus::from_raw(0x8002);
        assert_eq!(status.bits(), 0x8002);
    }
}
