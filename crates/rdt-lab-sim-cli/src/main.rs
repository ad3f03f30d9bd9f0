use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rdt_lab_abstract::SimConfig;
use rdt_lab_sdk::BuiltinProtocol;
use rdt_lab_simulator::{SimulationReport, Simulator, scenario_runner};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless reliable-data-transfer simulator")]
struct Args {
    /// Builtin protocol for the sending side (rdt1, rdt2, rdt3).
    #[arg(long, default_value = "rdt3")]
    sender: BuiltinProtocol,

    /// Builtin protocol for the receiving side (rdt1, rdt2, rdt3).
    #[arg(long, default_value = "rdt3")]
    receiver: BuiltinProtocol,

    /// Load a scenario from disk and check its assertions.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Loss probability for the default run.
    #[arg(long, default_value_t = 0.1)]
    loss_rate: f64,

    /// Corruption probability for the default run.
    #[arg(long, default_value_t = 0.0)]
    corrupt_rate: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write a JSON trace of the finished simulation.
    #[arg(long)]
    trace_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();
    info!("rdt-lab-sim-cli starting…");

    let sender = args.sender.sender();
    let receiver = args.receiver.receiver();

    let report = match &args.scenario {
        Some(path) => scenario_runner::run_scenario(path, sender, receiver)?,
        None => {
            let config = SimConfig {
                loss_rate: args.loss_rate,
                corrupt_rate: args.corrupt_rate,
                min_latency: 100,
                max_latency: 500,
                seed: args.seed,
            };
            let mut sim = Simulator::new(config, sender, receiver)
                .context("Invalid channel parameters")?;
            sim.schedule_app_send(1000, b"Packet 1".to_vec());
            sim.schedule_app_send(5000, b"Packet 2".to_vec());
            sim.schedule_app_send(10000, b"Packet 3".to_vec());
            info!(
                "Starting default headless simulation ({} -> {})…",
                args.sender, args.receiver
            );
            sim.run_until_complete();
            sim.export_report()
        }
    };

    log_summary(&report);

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &report)?;
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn log_summary(report: &SimulationReport) {
    info!(
        "Simulation finished at {}ms (completed: {}), {} packets from sender, {} messages delivered",
        report.duration_ms,
        report.completed,
        report.sender_packet_count,
        report.delivered_data.len()
    );
    for (idx, data) in report.delivered_strings().iter().enumerate() {
        info!("  #{idx}: {data:?}");
    }
}

fn write_trace(path: &Path, report: &SimulationReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize simulation trace")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    Ok(())
}
