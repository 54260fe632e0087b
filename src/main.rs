use cardledger::config::validation::Validate;
use cardledger::infrastructure::in_memory_broker::InMemoryBroker;
use cardledger::infrastructure::in_memory_card::InMemoryCardReader;
use cardledger::infrastructure::in_memory_network::InMemoryNetwork;
use cardledger::interfaces::csv::publication_writer::PublicationWriter;
use cardledger::interfaces::csv::scenario_reader::ScenarioReader;
use cardledger::interfaces::replay::ScenarioReplay;
use cardledger::{ConnectionSupervisor, ControllerConfig, TopUpEngine, logger};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Replays a card/command scenario through the top-up controller and prints
/// every message it publishes.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario CSV file (tick,event,uid,value)
    scenario: PathBuf,

    /// Controller configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Topic namespace, overrides the configuration file
    #[arg(long)]
    namespace: Option<String>,

    /// Delay between ticks in milliseconds, overrides the configuration file
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Delay between broker connection attempts in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Number of ticks to run (default: until the script has played out)
    #[arg(long)]
    ticks: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ControllerConfig::from_file(path).into_diagnostic()?,
        None => ControllerConfig::default(),
    };
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
    }
    if let Some(tick_interval_ms) = cli.tick_interval_ms {
        config.timing.tick_interval_ms = tick_interval_ms;
    }
    if let Some(retry_delay_ms) = cli.retry_delay_ms {
        config.timing.retry_delay_ms = retry_delay_ms;
    }
    config.validate().into_diagnostic()?;
    let config = Arc::new(config);

    let file = File::open(&cli.scenario).into_diagnostic()?;
    let mut events = Vec::new();
    for event in ScenarioReader::new(file).events() {
        match event {
            Ok(event) => events.push(event),
            Err(e) => tracing::error!(error = %e, "Error reading scenario event"),
        }
    }

    let reader = InMemoryCardReader::new();
    let broker = InMemoryBroker::new();
    let engine = TopUpEngine::new(
        Box::new(reader.clone()),
        Box::new(broker.clone()),
        Arc::clone(&config),
    );
    let supervisor =
        ConnectionSupervisor::new(Box::new(InMemoryNetwork::available()), Arc::clone(&config));

    let replay = ScenarioReplay::new(events, reader, broker, &engine, config.card.block);
    let ticks = cli.ticks.unwrap_or_else(|| replay.natural_length());
    let (publications, summary) = replay
        .run(&engine, &supervisor, ticks, config.timing.tick_interval())
        .await;

    tracing::info!(
        ticks = summary.ticks,
        top_ups = summary.top_ups_applied,
        rejected = summary.commands_rejected,
        observations = summary.observations,
        scan_failures = summary.scan_failures,
        reconnects = summary.reconnects,
        "Replay finished"
    );
    for (uid, balance) in replay.balances().await {
        tracing::info!(uid = %uid, balance = ?balance, "Final card state");
    }

    let stdout = io::stdout();
    let mut writer = PublicationWriter::new(stdout.lock());
    writer.write_publications(&publications).into_diagnostic()?;

    Ok(())
}
