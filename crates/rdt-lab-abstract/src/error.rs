use thiserror::Error;

/// Errors raised when building or decoding packets from untrusted input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet truncated: need at least {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("reserved header byte must be zero, got {0:#04x}")]
    Reserved(u8),

    #[error("sequence number {0} is outside the alternating-bit space {{0, 1}}")]
    InvalidSequence(u32),
}

/// Errors raised by [`SimConfig::validate`](crate::SimConfig::validate).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },

    #[error("min_latency ({min}) exceeds max_latency ({max})")]
    LatencyRange { min: u64, max: u64 },
}
