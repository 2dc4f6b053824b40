//! ASCII register commands
//!
//! Configuration happens over the same serial link as the binary output,
//! using text commands of the form `$VNRRG,<reg>*XX\r\n` (read register)
//! and `$VNWRG,<reg>,<values..>*XX\r\n` (write register). The device echoes
//! the register and its values, or answers `$VNERR,<code>`.

use thiserror::Error;

use crate::checksum::ascii_checksum;
use crate::groups::{
    AttitudeField, BinaryGroup, CommonField, GpsField, ImuField, InsField, TimeField,
};

/// Registers used by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    ModelNumber = 1,
    SerialNumber = 3,
    FirmwareVersion = 4,
    SerialBaudRate = 5,
    AsyncDataOutputFrequency = 7,
    BinaryOutput1 = 75,
}

impl Register {
    /// Register number as sent on the wire
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Errors from command responses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("response is not a VectorNav message: {0:?}")]
    Malformed(String),

    #[error("response checksum {received:#04x} does not match computed {computed:#04x}")]
    BadChecksum { received: u8, computed: u8 },

    #[error("device reported error code {0}")]
    Device(u8),

    #[error("expected register {expected} in response, got {actual}")]
    UnexpectedRegister { expected: u8, actual: u8 },
}

/// Wrap a command body with `$`, checksum and line ending
pub fn frame_command(body: &str) -> String {
    format!("${}*{:02X}\r\n", body, ascii_checksum(body))
}

/// Read-register command
pub fn read_register(register: Register) -> String {
    frame_command(&format!("VNRRG,{:02}", register.id()))
}

/// Write-register command with comma-separated values
pub fn write_register(register: Register, values: &str) -> String {
    frame_command(&format!("VNWRG,{:02},{}", register.id(), values))
}

/// Parsed register response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub register: u8,
    pub values: Vec<String>,
}

impl Response {
    /// First value, trimmed; most registers of interest hold one string
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(|v| v.trim())
    }

    /// Check the response answers the expected register
    pub fn expect_register(self, register: Register) -> Result<Self, CommandError> {
        if self.register != register.id() {
            return Err(CommandError::UnexpectedRegister {
                expected: register.id(),
                actual: self.register,
            });
        }
        Ok(self)
    }
}

/// Parse a `$VNRRG`/`$VNWRG`/`$VNERR` response line.
///
/// A checksum of `XX` is accepted unchecked, as the device allows.
pub fn parse_response(line: &str) -> Result<Response, CommandError> {
    let line = line.trim();
    let malformed = || CommandError::Malformed(line.to_string());

    let text = line.strip_prefix('$').ok_or_else(malformed)?;
    let (body, checksum) = match text.rsplit_once('*') {
        Some((body, checksum)) => (body, Some(checksum)),
        None => (text, None),
    };
    if let Some(checksum) = checksum.filter(|c| !c.eq_ignore_ascii_case("XX")) {
        let received = u8::from_str_radix(checksum, 16).map_err(|_| malformed())?;
        let computed = ascii_checksum(body);
        if received != computed {
            return Err(CommandError::BadChecksum { received, computed });
        }
    }

    let mut parts = body.split(',');
    match parts.next() {
        Some("VNERR") => {
            let code = parts
                .next()
                .and_then(|c| c.trim().parse().ok())
                .ok_or_else(malformed)?;
            Err(CommandError::Device(code))
        }
        Some("VNRRG") | Some("VNWRG") => {
            let register = parts
                .next()
                .and_then(|r| r.trim().parse().ok())
                .ok_or_else(malformed)?;
            Ok(Response {
                register,
                values: parts.map(str::to_string).collect(),
            })
        }
        _ => Err(malformed()),
    }
}

/// Contents of binary output register 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOutputConfig {
    /// Serial port selection for asynchronous output (1 = port 1)
    pub async_mode: u8,
    /// Output rate divisor relative to the IMU rate
    pub rate_divisor: u16,
    pub common: CommonField,
    pub time: TimeField,
    pub imu: ImuField,
    pub gps: GpsField,
    pub attitude: AttitudeField,
    pub ins: InsField,
}

impl BinaryOutputConfig {
    /// Output selection used by the bridge: attitude, rates, acceleration,
    /// GPS time, attitude uncertainty and the full INS solution, on port 1.
    pub fn navigation(imu_rate_hz: u32, output_rate_hz: u32) -> Self {
        let rate_divisor =
            (imu_rate_hz / output_rate_hz.max(1)).clamp(1, u16::MAX as u32) as u16;
        Self {
            async_mode: 1,
            rate_divisor,
            common: CommonField::QUATERNION
                | CommonField::YAW_PITCH_ROLL
                | CommonField::ANGULAR_RATE
                | CommonField::POSITION
                | CommonField::ACCEL
                | CommonField::MAG_PRES,
            time: TimeField::GPS_TOW | TimeField::GPS_WEEK | TimeField::TIME_UTC,
            imu: ImuField::empty(),
            gps: GpsField::empty(),
            attitude: AttitudeField::YPR_U,
            ins: InsField::INS_STATUS
                | InsField::POS_LLA
                | InsField::POS_ECEF
                | InsField::VEL_BODY
                | InsField::ACCEL_ECEF
                | InsField::VEL_NED
                | InsField::POS_U
                | InsField::VEL_U,
        }
    }

    /// Group byte implied by the non-empty field selections
    pub fn groups(&self) -> BinaryGroup {
        let mut groups = BinaryGroup::empty();
        groups.set(BinaryGroup::COMMON, !self.common.is_empty());
        groups.set(BinaryGroup::TIME, !self.time.is_empty());
        groups.set(BinaryGroup::IMU, !self.imu.is_empty());
        groups.set(BinaryGroup::GPS, !self.gps.is_empty());
        groups.set(BinaryGroup::ATTITUDE, !self.attitude.is_empty());
        groups.set(BinaryGroup::INS, !self.ins.is_empty());
        groups
    }

    /// Write-register command for binary output 1
    pub fn to_command(&self) -> String {
        let mut values = format!(
            "{},{},{:02X}",
            self.async_mode,
            self.rate_divisor,
            self.groups().bits()
        );
        let words = [
            self.common.bits(),
            self.time.bits(),
            self.imu.bits(),
            self.gps.bits(),
            self.attitude.bits(),
            self.ins.bits(),
        ];
        for word in words.into_iter().filter(|w| *w != 0) {
            values.push_str(&format!(",{word:04X}"));
        }
        write_register(Register::BinaryOutput1, &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_register_command() {
        assert_eq!(read_register(Register::ModelNumber), "$VNRRG,01*72\r\n");
    }

    #[test]
    fn test_write_baud_command() {
        let cmd = write_register(Register::SerialBaudRate, "921600");
        assert!(cmd.starts_with("$VNWRG,05,921600*"));
        assert!(cmd.ends_with("\r\n"));
        let body = &cmd[1..cmd.find('*').unwrap()];
        let checksum = &cmd[cmd.find('*').unwrap() + 1..cmd.len() - 2];
        assert_eq!(checksum, format!("{:02X}", ascii_checksum(body)));
    }

    #[test]
    fn test_parse_model_response() {
        let line = frame_command("VNRRG,01,VN-300T-CR");
        let resp = parse_response(&line).unwrap();
        assert_eq!(resp.register, 1);
        assert_eq!(resp.first_value(), Some("VN-300T-CR"));
        assert!(resp.expect_register(Register::ModelNumber).is_ok());
    }

    #[test]
    fn test_parse_error_response() {
        assert_eq!(
            parse_response("$VNERR,03*XX"),
            Err(CommandError::Device(3))
        );
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        let result = parse_response("$VNRRG,01,VN-100*00");
        assert!(matches!(result, Err(CommandError::BadChecksum { .. })));
    }

    #[test]
    fn test_parse_rejects_non_vn() {
        assert!(matches!(
            parse_response("$GPGGA,123"),
            Err(CommandError::Malformed(_))
        ));
        assert!(matches!(
            parse_response("garbage"),
            Err(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn test_unexpected_register() {
        let resp = parse_response("$VNRRG,04,1.2.3.4*XX").unwrap();
        assert_eq!(
            resp.expect_register(Register::ModelNumber),
            Err(CommandError::UnexpectedRegister {
                expected: 1,
                actual: 4
            })
        );
    }

    #[test]
    fn test_navigation_output_command() {
        let config = BinaryOutputConfig::navigation(800, 200);
        assert_eq!(config.rate_divisor, 4);
        assert_eq!(
            config.groups(),
            BinaryGroup::COMMON | BinaryGroup::TIME | BinaryGroup::ATTITUDE | BinaryGroup::INS
        );
        let cmd = config.to_command();
        assert!(cmd.starts_with("$VNWRG,75,1,4,33,0578,004C,0100,069F*"));
    }
}
