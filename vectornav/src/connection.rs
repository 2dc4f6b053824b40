//! Serial connection and baud-rate negotiation
//!
//! The sensor may be left at any supported baud rate. [`Connector`] walks the
//! list of rates, asking for the model number at each, and once the device
//! answers switches it to the target rate and reopens the link there.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use strum::{EnumIter, IntoEnumIterator};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::command::{
    parse_response, read_register, write_register, BinaryOutputConfig, CommandError, Register,
    Response,
};
use crate::device::DeviceFamily;

/// Baud rates the sensor can be configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B128000,
    B230400,
    B460800,
    B921600,
}

impl BaudRate {
    pub fn bps(self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
            BaudRate::B128000 => 128000,
            BaudRate::B230400 => 230400,
            BaudRate::B460800 => 460800,
            BaudRate::B921600 => 921600,
        }
    }

    pub fn from_bps(bps: u32) -> Option<Self> {
        BaudRate::iter().find(|b| b.bps() == bps)
    }

    /// 128000 is listed by the device but does not work reliably on host
    /// serial drivers.
    pub fn is_usable(self) -> bool {
        self != BaudRate::B128000
    }
}

/// Errors raised while talking to the device
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport is not open")]
    NotOpen,

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("device did not answer at any supported baud rate (target {target} bps)")]
    Exhausted { target: u32 },
}

/// Line-oriented access to the device
pub trait Transport {
    /// Open (or reopen) the link at `baud` bps
    fn open(&mut self, baud: u32) -> Result<(), ConnectionError>;

    fn close(&mut self);

    fn write_line(&mut self, line: &str) -> Result<(), ConnectionError>;

    /// Next `$VN` response line, skipping binary output and other traffic
    fn read_response(&mut self, timeout: Duration) -> Result<String, ConnectionError>;
}

/// Identity of a connected device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub model: String,
    pub family: DeviceFamily,
    pub baud: BaudRate,
}

/// Negotiation progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// Trying the rate at this index of [`BaudRate`] order
    Probing(usize),
    Connected(DeviceInfo),
    Failed,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Connected(_) | ConnectionState::Failed)
    }
}

/// Send a command and wait for the matching response
pub fn transact<T: Transport>(
    transport: &mut T,
    command: &str,
    register: Register,
    timeout: Duration,
) -> Result<Response, ConnectionError> {
    transport.write_line(command)?;
    let line = transport.read_response(timeout)?;
    Ok(parse_response(&line)?.expect_register(register)?)
}

fn read_string<T: Transport>(
    transport: &mut T,
    register: Register,
    timeout: Duration,
) -> Result<String, ConnectionError> {
    let response = transact(transport, &read_register(register), register, timeout)?;
    Ok(response.first_value().unwrap_or_default().to_string())
}

/// Baud rate state machine over a [`Transport`]
pub struct Connector<T: Transport> {
    transport: T,
    target: BaudRate,
    timeout: Duration,
    state: ConnectionState,
}

impl<T: Transport> Connector<T> {
    pub fn new(transport: T, target: BaudRate) -> Self {
        Self {
            transport,
            target,
            timeout: Duration::from_millis(500),
            state: ConnectionState::Disconnected,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Advance the state machine by one transition
    pub fn step(&mut self) -> &ConnectionState {
        let next = match self.state.clone() {
            ConnectionState::Disconnected => ConnectionState::Probing(0),
            ConnectionState::Probing(index) => self.probe_at(index),
            terminal => terminal,
        };
        self.state = next;
        &self.state
    }

    fn probe_at(&mut self, index: usize) -> ConnectionState {
        let Some(rate) = BaudRate::iter().nth(index) else {
            warn!("no supported baud rate answered");
            return ConnectionState::Failed;
        };
        if !rate.is_usable() || !self.target.is_usable() {
            return ConnectionState::Probing(index + 1);
        }
        match self.probe(rate) {
            Ok(info) => {
                info!(
                    "connected to {} ({}) at {} bps",
                    info.model,
                    info.family,
                    info.baud.bps()
                );
                ConnectionState::Connected(info)
            }
            Err(e) => {
                debug!("no answer at {} bps: {}", rate.bps(), e);
                self.transport.close();
                ConnectionState::Probing(index + 1)
            }
        }
    }

    fn probe(&mut self, rate: BaudRate) -> Result<DeviceInfo, ConnectionError> {
        self.transport.open(rate.bps())?;
        let model = read_string(&mut self.transport, Register::ModelNumber, self.timeout)?;
        debug!("device answered at {} bps with model {}", rate.bps(), model);

        if rate != self.target {
            let target = self.target.bps().to_string();
            self.transport
                .write_line(&write_register(Register::SerialBaudRate, &target))?;
            // The acknowledgement may already arrive at the new rate
            if let Err(e) = self.transport.read_response(self.timeout) {
                debug!("baud change not acknowledged: {}", e);
            }
            self.transport.close();
            self.transport.open(self.target.bps())?;
            read_string(&mut self.transport, Register::ModelNumber, self.timeout)?;
        }

        Ok(DeviceInfo {
            family: DeviceFamily::from_model_number(&model),
            model,
            baud: self.target,
        })
    }

    /// Run the state machine to completion
    pub fn connect(&mut self) -> Result<DeviceInfo, ConnectionError> {
        while !self.state.is_terminal() {
            self.step();
        }
        match &self.state {
            ConnectionState::Connected(info) => Ok(info.clone()),
            _ => Err(ConnectionError::Exhausted {
                target: self.target.bps(),
            }),
        }
    }
}

/// Firmware version and serial number of a connected device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDetails {
    pub firmware_version: String,
    pub serial_number: String,
}

pub fn query_device_details<T: Transport>(
    transport: &mut T,
    timeout: Duration,
) -> Result<DeviceDetails, ConnectionError> {
    Ok(DeviceDetails {
        firmware_version: read_string(transport, Register::FirmwareVersion, timeout)?,
        serial_number: read_string(transport, Register::SerialNumber, timeout)?,
    })
}

/// Set the async output rate and binary output register 1
pub fn configure_output<T: Transport>(
    transport: &mut T,
    async_rate_hz: u32,
    output: &BinaryOutputConfig,
    timeout: Duration,
) -> Result<(), ConnectionError> {
    let register = Register::AsyncDataOutputFrequency;
    transact(
        transport,
        &write_register(register, &async_rate_hz.to_string()),
        register,
        timeout,
    )?;
    transact(
        transport,
        &output.to_command(),
        Register::BinaryOutput1,
        timeout,
    )?;
    info!(
        "binary output configured: groups {:#04x}, divisor {}",
        output.groups().bits(),
        output.rate_divisor
    );
    Ok(())
}

/// [`Transport`] over a host serial port
pub struct SerialTransport {
    path: String,
    port: Option<Box<dyn serialport::SerialPort>>,
    pending: Vec<u8>,
}

impl SerialTransport {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            port: None,
            pending: Vec::new(),
        }
    }

    /// Hand over the open port for streaming binary output
    pub fn take_stream(&mut self) -> Option<Box<dyn serialport::SerialPort>> {
        self.pending.clear();
        self.port.take()
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.windows(2).position(|w| w == b"\r\n")?;
        let line: Vec<u8> = self.pending.drain(..end + 2).collect();
        Some(String::from_utf8_lossy(&line[..end]).into_owned())
    }
}

impl Transport for SerialTransport {
    fn open(&mut self, baud: u32) -> Result<(), ConnectionError> {
        self.close();
        let port = serialport::new(&self.path, baud)
            .timeout(Duration::from_millis(50))
            .open()?;
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        self.port = None;
        self.pending.clear();
    }

    fn write_line(&mut self, line: &str) -> Result<(), ConnectionError> {
        let port = self.port.as_mut().ok_or(ConnectionError::NotOpen)?;
        port.write_all(line.as_bytes())?;
        port.flush()?;
        Ok(())
    }

    fn read_response(&mut self, timeout: Duration) -> Result<String, ConnectionError> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; 256];
        loop {
            while let Some(line) = self.take_line() {
                if let Some(start) = line.find("$VN") {
                    return Ok(line[start..].to_string());
                }
            }
            if Instant::now() >= deadline {
                return Err(ConnectionError::Timeout(timeout));
            }
            let port = self.port.as_mut().ok_or(ConnectionError::NotOpen)?;
            match port.read(&mut chunk) {
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::frame_command;
    use std::collections::VecDeque;

    /// Simulated device listening at one baud rate
    struct MockDevice {
        device_baud: u32,
        open_baud: Option<u32>,
        model: &'static str,
        replies: VecDeque<String>,
        opened: Vec<u32>,
    }

    impl MockDevice {
        fn new(device_baud: u32, model: &'static str) -> Self {
            Self {
                device_baud,
                open_baud: None,
                model,
                replies: VecDeque::new(),
                opened: Vec::new(),
            }
        }

        fn listening(&self) -> bool {
            self.open_baud == Some(self.device_baud)
        }
    }

    impl Transport for MockDevice {
        fn open(&mut self, baud: u32) -> Result<(), ConnectionError> {
            self.open_baud = Some(baud);
            self.opened.push(baud);
            self.replies.clear();
            Ok(())
        }

        fn close(&mut self) {
            self.open_baud = None;
        }

        fn write_line(&mut self, line: &str) -> Result<(), ConnectionError> {
            if !self.listening() {
                return Ok(());
            }
            let body = &line[1..line.find('*').unwrap()];
            let mut parts = body.split(',');
            let reply = match (parts.next(), parts.next()) {
                (Some("VNRRG"), Some("01")) => format!("VNRRG,01,{}", self.model),
                (Some("VNRRG"), Some("03")) => "VNRRG,03,0100012345".to_string(),
                (Some("VNRRG"), Some("04")) => "VNRRG,04,2.1.0.0".to_string(),
                (Some("VNWRG"), Some("05")) => {
                    let rate: u32 = parts.next().unwrap().parse().unwrap();
                    self.device_baud = rate;
                    format!("VNWRG,05,{rate}")
                }
                (Some("VNWRG"), Some(reg)) => format!("VNWRG,{reg}"),
                _ => "VNERR,01".to_string(),
            };
            self.replies.push_back(frame_command(&reply));
            Ok(())
        }

        fn read_response(&mut self, timeout: Duration) -> Result<String, ConnectionError> {
            self.replies
                .pop_front()
                .ok_or(ConnectionError::Timeout(timeout))
        }
    }

    #[test]
    fn test_connects_and_switches_baud() {
        let device = MockDevice::new(115200, "VN-300T-CR");
        let mut connector = Connector::new(device, BaudRate::B921600);

        let info = connector.connect().unwrap();
        assert_eq!(info.model, "VN-300T-CR");
        assert_eq!(info.family, DeviceFamily::Vn300);
        assert_eq!(info.baud, BaudRate::B921600);

        let device = connector.into_transport();
        assert_eq!(device.device_baud, 921600);
        assert_eq!(
            device.opened,
            vec![9600, 19200, 38400, 57600, 115200, 921600]
        );
    }

    #[test]
    fn test_step_sequence() {
        let device = MockDevice::new(19200, "VN-100");
        let mut connector = Connector::new(device, BaudRate::B19200);
        assert_eq!(connector.state(), &ConnectionState::Disconnected);
        assert_eq!(connector.step(), &ConnectionState::Probing(0));
        assert_eq!(connector.step(), &ConnectionState::Probing(1));
        let state = connector.step().clone();
        assert!(matches!(
            state,
            ConnectionState::Connected(ref info) if info.family == DeviceFamily::Vn100
        ));
        // terminal states are sticky
        assert_eq!(connector.step(), &state);
    }

    #[test]
    fn test_skips_128000() {
        let device = MockDevice::new(230400, "VN-200");
        let mut connector = Connector::new(device, BaudRate::B230400);
        connector.connect().unwrap();
        assert!(!connector.transport_mut().opened.contains(&128000));
    }

    #[test]
    fn test_fails_when_device_silent() {
        // device stuck at a rate the connector never tries
        let device = MockDevice::new(128000, "VN-200");
        let mut connector = Connector::new(device, BaudRate::B921600);
        let err = connector.connect().unwrap_err();
        assert!(matches!(err, ConnectionError::Exhausted { target: 921600 }));
        assert_eq!(connector.state(), &ConnectionState::Failed);
    }

    #[test]
    fn test_query_details_and_configure() {
        let mut device = MockDevice::new(115200, "VN-300");
        device.open(115200).unwrap();
        let details = query_device_details(&mut device, Duration::from_millis(10)).unwrap();
        assert_eq!(details.firmware_version, "2.1.0.0");
        assert_eq!(details.serial_number, "0100012345");

        let output = BinaryOutputConfig::navigation(800, 200);
        configure_output(&mut device, 200, &output, Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn test_baud_rate_lookup() {
        assert_eq!(BaudRate::from_bps(460800), Some(BaudRate::B460800));
        assert_eq!(BaudRate::from_bps(1234), None);
        assert_eq!(BaudRate::iter().filter(|b| b.is_usable()).count(), 8);
    }
}
