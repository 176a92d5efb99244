use clap::Parser;
use drivesync::commands::{self, run_with_retry};
use drivesync::config::Cli;
use drivesync::diff::Decider;
use drivesync::ui::{ConsolePrompt, ProgressReporter};
use drivesync::{logging, Config, MemoryRemote, SyncDirection};
use std::sync::Arc;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Convert CLI args to Config - this validates immediately
    let config = Config::try_from(cli)?;
    logging::init(config.verbose, config.log_file.as_deref())?;
    info!("drivesync v{}", drivesync::VERSION);

    // Refuse an interactive run before anything is touched if nobody can answer
    let mut prompt = match config.direction {
        SyncDirection::Interactive => Some(ConsolePrompt::open()?),
        _ => None,
    };
    let result = run_with_retry(&config.retry, |attempt| {
        if attempt > 1 {
            info!("Starting attempt {}", attempt);
        }
        let mut remote = MemoryRemote::load(&config.remote_store)?;
        let decider = prompt.as_mut().map(|prompt| prompt as &mut dyn Decider);
        let reporter = Arc::new(ProgressReporter::new());
        let outcome = commands::run(&config, &mut remote, decider, reporter);
        // Whatever was mutated before a failure has happened remotely
        remote.save(&config.remote_store)?;
        outcome
    });

    match result {
        Ok(report) => {
            println!("{}", report.stats);
            Ok(())
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            Err(e.into())
        }
    }
}
