//! VectorNav INS bridge
//!
//! Decoded VectorNav packets are turned into attitude, rate, acceleration and
//! position records. Positions are expressed as latitude/longitude, ECEF, and
//! as north/east offsets in a local frame anchored at the first valid fix.

pub mod anchor;
pub mod config;
pub mod context;
pub mod emitter;
pub mod frames;
pub mod geodetic;
pub mod records;
pub mod sink;

pub use anchor::{ReferenceAnchor, ReferenceFix, SharedAnchor};
pub use config::{BridgeConfig, ConfigError, Covariances};
pub use context::{Counters, NavContext, ResetHandle};
pub use emitter::RecordEmitter;
pub use frames::FrameConvention;
pub use geodetic::Ellipsoid;
pub use records::{OutputRecord, Publication};
pub use sink::{ChannelSink, JsonLinesSink, RecordSink};
