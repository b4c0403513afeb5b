use clap::Parser;
use eyre::bail;
use example_harness::broker::Broker;
use example_harness::cli::{Cli, Config};
use example_harness::{sasl, scenarios, suite, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_cli(cli)?;

    if config.list {
        for scenario in scenarios::all() {
            println!("{}", scenario.name);
        }
        return Ok(());
    }

    // Credentials first: every SSL/SASL scenario depends on this, so any
    // failure here aborts the run before a single process is spawned.
    sasl::provision(&config)?;

    info!("starting shared broker");
    let broker = Broker::start(config.bin("broker"))?;
    let filter = config.filter.clone();
    let ctx = suite::Ctx::new(config, broker);

    let summary = suite::run(&ctx, &scenarios::all(), filter.as_deref());

    info!(
        passed = summary.passed.len(),
        failed = summary.failed.len(),
        skipped = summary.skipped.len(),
        "suite finished"
    );
    if !summary.ok() {
        for (name, report) in &summary.failed {
            error!(scenario = name, "failure: {report:#}");
        }
        bail!("{} scenario(s) failed", summary.failed.len());
    }
    Ok(())
}
