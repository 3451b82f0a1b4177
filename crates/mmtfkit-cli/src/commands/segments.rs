use crate::cli::SegmentsArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mmtfkit::engine::progress::ProgressReporter;
use mmtfkit::workflows::interactions::OutcomeStatus;
use mmtfkit::workflows::secondary_structure;
use std::fs::File;
use std::io::{self, BufWriter};
use tracing::{info, warn};

pub fn run(args: SegmentsArgs) -> Result<()> {
    info!(
        "Extracting {}-residue segments from {} structure(s).",
        args.length,
        args.inputs.len()
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let dataset = secondary_structure::run(args.inputs.as_slice(), args.length, &reporter)?;

    for outcome in &dataset.outcomes {
        if let OutcomeStatus::Failed { message } = &outcome.status {
            warn!("{}", message);
        }
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?;
            secondary_structure::write_csv(&dataset.records, BufWriter::new(file))?;
            info!("Wrote {} segment(s) to {:?}", dataset.records.len(), path);
        }
        None => secondary_structure::write_csv(&dataset.records, io::stdout().lock())?,
    }

    eprintln!(
        "✓ {} segment(s) from {} structure(s) ({} skipped, {} failed).",
        dataset.records.len(),
        dataset.processed(),
        dataset.skipped(),
        dataset.failed()
    );
    Ok(())
}
