use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use ma_cross_alert::{
    config::AppConfig,
    logging::init_logging,
    notifier::build_notifier,
    orchestrator::{Orchestrator, RunOutcome, RunPlan},
    providers::build_provider,
};
use market_data_ingestor::providers::synthetic::Scenario;
use tracing::{error, info};

#[derive(Parser)]
#[command(version, about = "Moving-average crossover alert")]
struct Cli {
    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,
    /// Log the alert instead of emailing it
    #[arg(long)]
    dry_run: bool,
    /// Use synthetic bars ending in a golden or death cross
    #[arg(long, value_name = "SCENARIO")]
    synthetic: Option<Scenario>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Nothing can be logged before the config and subscriber exist.
    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(fatal = true, error = %e, "failed to start async runtime");
            return ExitCode::SUCCESS;
        }
    };

    // A run that fails is still a completed invocation; the next scheduled
    // run starts fresh.
    match runtime.block_on(run(cli, config)) {
        Ok(outcome) => info!(?outcome, "done"),
        Err(e) => error!(fatal = true, "unhandled failure in strategy run: {e:#}"),
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli, config: AppConfig) -> Result<RunOutcome> {
    let plan = RunPlan::from_config(&config)?;
    let provider =
        build_provider(&config.provider, cli.synthetic).context("failed to set up data provider")?;
    let notifier = build_notifier(&config, cli.dry_run).context("failed to set up notifier")?;
    if let Some(scenario) = cli.synthetic {
        info!(%scenario, "using synthetic bars");
    }

    let orchestrator = Orchestrator::new(provider, notifier, plan);
    tokio::spawn(async move { orchestrator.run().await })
        .await
        .map_err(|e| anyhow!("strategy run panicked: {e}"))
}
