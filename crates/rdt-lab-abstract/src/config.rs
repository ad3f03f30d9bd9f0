use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Channel parameters for the reference driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Probability that a packet is dropped.
    pub loss_rate: f64,
    /// Probability that a delivered packet arrives with a damaged checksum.
    pub corrupt_rate: f64,
    pub min_latency: u64,
    pub max_latency: u64,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            min_latency: 10,
            max_latency: 100,
            seed: 0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("loss_rate", self.loss_rate),
            ("corrupt_rate", self.corrupt_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        if self.min_latency > self.max_latency {
            return Err(ConfigError::LatencyRange {
                min: self.min_latency,
                max: self.max_latency,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_rates_and_latency() {
        let cfg = SimConfig {
            loss_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RateOutOfRange { name: "loss_rate", .. })
        ));

        let cfg = SimConfig {
            corrupt_rate: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = SimConfig {
            min_latency: 200,
            max_latency: 100,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::LatencyRange { min: 200, max: 100 })
        );
    }
}
