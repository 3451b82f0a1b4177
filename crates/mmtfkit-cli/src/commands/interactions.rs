use crate::cli::InteractionsArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mmtfkit::engine::progress::ProgressReporter;
use mmtfkit::workflows::interactions::{self, InteractionDataset, OutcomeStatus};
use std::fs::File;
use std::io::{self, BufWriter};
use tracing::{info, warn};

pub fn run(args: InteractionsArgs) -> Result<()> {
    let config = build_config(&args)?;
    info!(
        "Searching for '{}' interactions within {} in {} structure(s).",
        config.target_group,
        config.cutoff,
        args.inputs.len()
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let dataset = interactions::run(args.inputs.as_slice(), &config, &reporter)?;

    report_failures(&dataset);

    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?;
            interactions::write_csv(&dataset.records, BufWriter::new(file))?;
            info!("Wrote {} interaction(s) to {:?}", dataset.records.len(), path);
        }
        None => interactions::write_csv(&dataset.records, io::stdout().lock())?,
    }

    eprintln!(
        "✓ {} interaction(s) from {} structure(s) ({} skipped, {} failed).",
        dataset.records.len(),
        dataset.processed(),
        dataset.skipped(),
        dataset.failed()
    );
    Ok(())
}

fn report_failures(dataset: &InteractionDataset) {
    for outcome in &dataset.outcomes {
        if let OutcomeStatus::Failed { message } = &outcome.status {
            warn!("{}", message);
        }
    }
}
