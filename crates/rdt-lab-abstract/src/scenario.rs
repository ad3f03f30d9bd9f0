use crate::config::SimConfig;
use serde::Deserialize;

/// A scripted run: channel overrides, timed actions and the checks applied afterwards.
#[derive(Deserialize, Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: SimConfigOverride,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub assertions: Vec<TestAssertion>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SimConfigOverride {
    pub loss_rate: Option<f64>,
    pub corrupt_rate: Option<f64>,
    pub min_latency: Option<u64>,
    pub max_latency: Option<u64>,
    pub seed: Option<u64>,
}

impl SimConfigOverride {
    pub fn apply_to(&self, config: &mut SimConfig) {
        if let Some(v) = self.loss_rate {
            config.loss_rate = v;
        }
        if let Some(v) = self.corrupt_rate {
            config.corrupt_rate = v;
        }
        if let Some(v) = self.min_latency {
            config.min_latency = v;
        }
        if let Some(v) = self.max_latency {
            config.max_latency = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAction {
    /// Application sends data at a specific time
    AppSend { time: u64, data: String },
    /// Drop the first packet sent by Sender with given seq number
    DropNextFromSenderSeq { seq: u32 },
    /// Drop the first ACK sent by Receiver with given ack number
    DropNextFromReceiverAck { ack: u32 },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAssertion {
    /// Data was delivered to the application layer
    DataDelivered { data: String },
    /// Total packets sent by Sender is within range
    SenderPacketCount { min: u32, max: Option<u32> },
    /// Simulation finishes within time
    MaxDuration { ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_only_touches_given_fields() {
        let mut cfg = SimConfig::default();
        let ov = SimConfigOverride {
            loss_rate: Some(0.25),
            seed: Some(7),
            ..Default::default()
        };
        ov.apply_to(&mut cfg);
        assert_eq!(cfg.loss_rate, 0.25);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.min_latency, SimConfig::default().min_latency);
    }
}
