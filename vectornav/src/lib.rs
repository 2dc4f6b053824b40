//! VectorNav binary protocol decoding
//!
//! This crate provides frame synchronization, decoding and encoding of the
//! VectorNav binary output protocol, plus the ASCII register commands and
//! baud-rate negotiation needed to bring a device up over a serial link.

pub mod builder;
mod checksum;
pub mod command;
mod composite;
pub mod connection;
mod device;
pub mod groups;
mod ins_status;
mod parser;
mod sync;
mod time;

pub use builder::FrameBuilder;
pub use checksum::{append_crc, ascii_checksum, compute_crc, verify_crc};
pub use command::{BinaryOutputConfig, CommandError, Register};
pub use composite::{CompositeData, FieldKind};
pub use connection::{
    BaudRate, ConnectionError, ConnectionState, Connector, DeviceInfo, SerialTransport, Transport,
};
pub use device::DeviceFamily;
pub use groups::{BinaryGroup, SYNC_BYTE};
pub use ins_status::{InsMode, InsStatus};
pub use parser::{parse, FrameHeader, ParseError};
pub use sync::{FrameSync, MAX_FRAME_LEN};
pub use time::{tow_nanos, tow_seconds, UtcTime};
