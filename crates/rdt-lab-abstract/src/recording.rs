//! An in-memory [`SystemContext`] that records every call, for unit tests
//! and for drivers that apply a handler's effects after it returns.

use crate::interface::SystemContext;
use crate::packet::Packet;

/// A timer request, kept in the order the protocol issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOp {
    Start { delay_ms: u64, timer_id: u32 },
    Cancel { timer_id: u32 },
}

#[derive(Debug, Default)]
pub struct RecordingContext {
    pub sent: Vec<Packet>,
    pub timers: Vec<TimerOp>,
    pub delivered: Vec<Vec<u8>>,
    pub logs: Vec<String>,
    pub metrics: Vec<(String, f64)>,
    now: u64,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(now: u64) -> Self {
        Self {
            now,
            ..Default::default()
        }
    }

    /// Ids of started timers, in order.
    pub fn started(&self) -> Vec<u32> {
        self.timers
            .iter()
            .filter_map(|op| match op {
                TimerOp::Start { timer_id, .. } => Some(*timer_id),
                TimerOp::Cancel { .. } => None,
            })
            .collect()
    }

    /// Ids of cancelled timers, in order.
    pub fn cancelled(&self) -> Vec<u32> {
        self.timers
            .iter()
            .filter_map(|op| match op {
                TimerOp::Cancel { timer_id } => Some(*timer_id),
                TimerOp::Start { .. } => None,
            })
            .collect()
    }

    /// Forget everything recorded so far, keeping the clock.
    pub fn clear(&mut self) {
        self.sent.clear();
        self.timers.clear();
        self.delivered.clear();
        self.logs.clear();
        self.metrics.clear();
    }

    pub fn is_quiet(&self) -> bool {
        self.sent.is_empty() && self.timers.is_empty() && self.delivered.is_empty()
    }
}

impl SystemContext for RecordingContext {
    fn send_packet(&mut self, packet: Packet) {
        self.sent.push(packet);
    }

    fn start_timer(&mut self, delay_ms: u64, timer_id: u32) {
        self.timers.push(TimerOp::Start { delay_ms, timer_id });
    }

    fn cancel_timer(&mut self, timer_id: u32) {
        self.timers.push(TimerOp::Cancel { timer_id });
    }

    fn deliver_data(&mut self, data: &[u8]) {
        self.delivered.push(data.to_vec());
    }

    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }

    fn now(&self) -> u64 {
        self.now
    }

    fn record_metric(&mut self, name: &str, value: f64) {
        self.metrics.push((name.to_string(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_timer_order() {
        let mut ctx = RecordingContext::at(42);
        ctx.start_timer(10, 0);
        ctx.cancel_timer(0);
        ctx.start_timer(10, 0);
        assert_eq!(ctx.started(), vec![0, 0]);
        assert_eq!(ctx.cancelled(), vec![0]);
        assert_eq!(ctx.timers[1], TimerOp::Cancel { timer_id: 0 });
        assert_eq!(ctx.now(), 42);

        ctx.clear();
        assert!(ctx.is_quiet());
        assert_eq!(ctx.now(), 42);
    }
}
