//! Shared types for the reliable-data-transfer lab: packets, checksums, the
//! capability interface a protocol talks through and the protocol contract itself.

pub mod checksum;
pub mod config;
pub mod error;
pub mod interface;
pub mod packet;
pub mod recording;
pub mod scenario;

pub use interface::{SystemContext, TransportProtocol};
pub use packet::{HEADER_LEN, Packet, SeqBit, TcpHeader};
pub use packet::flags;

pub use config::SimConfig;
pub use error::{ConfigError, PacketError};
pub use recording::{RecordingContext, TimerOp};
pub use scenario::{SimConfigOverride, TestAction, TestAssertion, TestScenario};
