use anyhow::{Context, Result, ensure};
use rdt_lab_abstract::{SimConfig, TestAction, TestAssertion, TestScenario, TransportProtocol};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::engine::Simulator;
use crate::trace::SimulationReport;

pub fn load_scenario(path: impl AsRef<Path>) -> Result<TestScenario> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    parse_scenario(&content)
        .with_context(|| format!("Failed to parse scenario file {}", path.display()))
}

pub fn parse_scenario(content: &str) -> Result<TestScenario> {
    Ok(toml::from_str(content)?)
}

/// Build a simulator with the scenario's channel overrides and scheduled actions.
pub fn build_simulator(
    scenario: &TestScenario,
    sender: Box<dyn TransportProtocol>,
    receiver: Box<dyn TransportProtocol>,
) -> Result<Simulator> {
    let mut config = SimConfig::default();
    scenario.config.apply_to(&mut config);
    let mut sim = Simulator::new(config, sender, receiver)
        .with_context(|| format!("Invalid channel config in scenario '{}'", scenario.name))?;
    configure_actions(&mut sim, &scenario.actions);
    Ok(sim)
}

pub fn configure_actions(sim: &mut Simulator, actions: &[TestAction]) {
    for action in actions {
        match action {
            TestAction::AppSend { time, data } => {
                sim.schedule_app_send(*time, data.as_bytes().to_vec());
            }
            TestAction::DropNextFromSenderSeq { seq } => {
                sim.add_drop_sender_seq_once(*seq);
            }
            TestAction::DropNextFromReceiverAck { ack } => {
                sim.add_drop_receiver_ack_once(*ack);
            }
        }
    }
}

/// Run a parsed scenario to completion and check every assertion.
pub fn run_loaded(
    scenario: &TestScenario,
    sender: Box<dyn TransportProtocol>,
    receiver: Box<dyn TransportProtocol>,
) -> Result<SimulationReport> {
    info!("Running scenario '{}': {}", scenario.name, scenario.description);
    let mut sim = build_simulator(scenario, sender, receiver)?;
    sim.run_until_complete();
    let report = sim.export_report();
    check_assertions(&report, &scenario.assertions)
        .with_context(|| format!("Scenario '{}' failed", scenario.name))?;
    info!("Scenario '{}' passed", scenario.name);
    Ok(report)
}

pub fn run_scenario(
    path: impl AsRef<Path>,
    sender: Box<dyn TransportProtocol>,
    receiver: Box<dyn TransportProtocol>,
) -> Result<SimulationReport> {
    let scenario = load_scenario(path)?;
    run_loaded(&scenario, sender, receiver)
}

/// Fails with the first assertion the report violates.
pub fn check_assertions(report: &SimulationReport, assertions: &[TestAssertion]) -> Result<()> {
    for assertion in assertions {
        match assertion {
            TestAssertion::DataDelivered { data } => {
                ensure!(
                    report.delivered_data.iter().any(|d| d == data.as_bytes()),
                    "expected {:?} to be delivered, got {:?}",
                    data,
                    report.delivered_strings()
                );
            }
            TestAssertion::SenderPacketCount { min, max } => {
                let count = report.sender_packet_count;
                ensure!(count >= *min, "sender sent {count} packets, expected at least {min}");
                if let Some(max) = max {
                    ensure!(count <= *max, "sender sent {count} packets, expected at most {max}");
                }
            }
            TestAssertion::MaxDuration { ms } => {
                ensure!(report.completed, "simulation did not finish");
                ensure!(
                    report.duration_ms <= *ms,
                    "simulation took {}ms, limit {ms}ms",
                    report.duration_ms
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn report() -> SimulationReport {
        SimulationReport {
            config: SimConfig::default(),
            duration_ms: 500,
            completed: true,
            delivered_data: vec![b"hi".to_vec()],
            sender_packet_count: 3,
            metrics: HashMap::new(),
            link_events: Vec::new(),
        }
    }

    #[test]
    fn parses_tagged_actions_and_assertions() {
        let scenario = parse_scenario(
            r#"
            name = "lossy"
            description = "one drop"

            [config]
            loss_rate = 0.0
            seed = 3

            [[actions]]
            type = "app_send"
            time = 0
            data = "hi"

            [[actions]]
            type = "drop_next_from_sender_seq"
            seq = 0

            [[assertions]]
            type = "sender_packet_count"
            min = 2
            "#,
        )
        .unwrap();
        assert_eq!(scenario.actions.len(), 2);
        assert!(matches!(scenario.actions[1], TestAction::DropNextFromSenderSeq { seq: 0 }));
        assert!(matches!(
            scenario.assertions[0],
            TestAssertion::SenderPacketCount { min: 2, max: None }
        ));
        assert_eq!(scenario.config.seed, Some(3));
    }

    #[test]
    fn assertions_pass_and_fail() {
        let r = report();
        let ok = [
            TestAssertion::DataDelivered { data: "hi".into() },
            TestAssertion::SenderPacketCount { min: 3, max: Some(3) },
            TestAssertion::MaxDuration { ms: 500 },
        ];
        check_assertions(&r, &ok).unwrap();

        assert!(check_assertions(&r, &[TestAssertion::DataDelivered { data: "x".into() }]).is_err());
        assert!(check_assertions(&r, &[TestAssertion::MaxDuration { ms: 499 }]).is_err());
        assert!(
            check_assertions(&r, &[TestAssertion::SenderPacketCount { min: 4, max: None }]).is_err()
        );
        assert!(
            check_assertions(&r, &[TestAssertion::SenderPacketCount { min: 0, max: Some(2) }])
                .is_err()
        );
    }

    #[test]
    fn unfinished_run_fails_duration_check() {
        let r = SimulationReport {
            completed: false,
            ..report()
        };
        let err = check_assertions(&r, &[TestAssertion::MaxDuration { ms: 10_000 }]).unwrap_err();
        assert!(err.to_string().contains("did not finish"));
    }

    #[test]
    fn window_assertions_are_not_part_of_the_format() {
        let parsed = parse_scenario(
            r#"
            name = "window"
            [[assertions]]
            type = "sender_window_max"
            min = 4
            "#,
        );
        assert!(parsed.is_err());
    }
}
