//! Reference driver for transport protocols: a discrete-event loop and a
//! simulated channel that drops, corrupts and delays packets.

pub mod engine;
pub mod scenario_runner;
pub mod trace;

pub use engine::{DEFAULT_EVENT_LIMIT, LinkEventSummary, NodeId, Simulator};
pub use trace::SimulationReport;
