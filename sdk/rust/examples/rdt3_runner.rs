use clap::Parser;
use rdt_lab_abstract::SimConfig;
use rdt_lab_sdk::{Rdt3Receiver, Rdt3Sender};
use rdt_lab_simulator::Simulator;
use tracing::info;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value_t = 0.2)]
    loss_rate: f64,
    #[arg(long, default_value_t = 0.1)]
    corrupt_rate: f64,
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    info!("Starting RDT3 Runner Example");

    let config = SimConfig {
        loss_rate: args.loss_rate,
        corrupt_rate: args.corrupt_rate,
        seed: args.seed,
        ..Default::default()
    };
    let mut sim = Simulator::new(
        config,
        Box::new(Rdt3Sender::new()),
        Box::new(Rdt3Receiver::new()),
    )?;
    for (i, msg) in ["stop", "and", "wait"].iter().enumerate() {
        sim.schedule_app_send(i as u64 * 30_000, msg.as_bytes().to_vec());
    }
    sim.run_until_complete();

    let report = sim.export_report();
    info!(
        "Delivered {:?} using {} sender packets",
        report.delivered_strings(),
        report.sender_packet_count
    );
    Ok(())
}
