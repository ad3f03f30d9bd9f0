use serde::Serialize;
use std::collections::HashMap;
use rdt_lab_abstract::SimConfig;

use crate::engine::LinkEventSummary;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub config: SimConfig,
    pub duration_ms: u64,
    /// False when the run stopped at the event limit instead of draining the queue.
    pub completed: bool,
    pub delivered_data: Vec<Vec<u8>>,
    pub sender_packet_count: u32,
    pub metrics: HashMap<String, Vec<(u64, f64)>>,
    pub link_events: Vec<LinkEventSummary>,
}

impl SimulationReport {
    pub fn delivered_strings(&self) -> Vec<String> {
        self.delivered_data
            .iter()
            .map(|d| String::from_utf8_lossy(d).into_owned())
            .collect()
    }
}
