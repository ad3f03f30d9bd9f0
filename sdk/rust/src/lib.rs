//! Reference transport protocols for the lab.
//!
//! - [`rdt1`]: pass-through over a perfect channel.
//! - [`rdt2`]: stop-and-wait with the Internet checksum and send queueing.
//! - [`rdt3_sender`] / [`rdt3_receiver`]: alternating-bit ARQ with retransmission timers.

pub mod builtin;
pub mod rdt1;
pub mod rdt2;
pub mod rdt3_receiver;
pub mod rdt3_sender;

pub use builtin::{BuiltinProtocol, UnknownProtocol};
pub use rdt_lab_abstract::checksum;
pub use rdt_lab_abstract::{Packet, SystemContext, TcpHeader, TransportProtocol, flags};
pub use rdt3_receiver::Rdt3Receiver;
pub use rdt3_sender::Rdt3Sender;
