use super::outcome;
use crate::core::models::structure::Structure;
use crate::engine::config::InteractionConfig;
use crate::engine::error::EngineError;
use crate::engine::interactions::{COLUMNS, InteractionRecord, find_interactions};
use crate::engine::progress::{Progress, ProgressReporter};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, instrument};

pub use super::outcome::{OutcomeStatus, StructureOutcome};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct InteractionDataset {
    pub records: Vec<InteractionRecord>,
    /// One entry per input, in input order.
    pub outcomes: Vec<StructureOutcome>,
}

impl InteractionDataset {
    pub fn processed(&self) -> usize {
        outcome::processed(&self.outcomes)
    }

    pub fn skipped(&self) -> usize {
        outcome::skipped(&self.outcomes)
    }

    pub fn failed(&self) -> usize {
        outcome::failed(&self.outcomes)
    }
}

/// Runs the search on one decoded structure.
///
/// Returns `Ok(None)` when the configuration filters the structure out.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] if the configured cutoff is invalid.
pub fn extract(
    structure: &Structure,
    config: &InteractionConfig,
) -> Result<Option<Vec<InteractionRecord>>, EngineError> {
    if config.exclude_alternative_locations && structure.has_alternative_locations() {
        return Ok(None);
    }
    let records = find_interactions(structure, &config.target_group, config.cutoff)?.collect();
    Ok(Some(records))
}

fn process_input(
    path: &Path,
    config: &InteractionConfig,
) -> Result<(StructureOutcome, Vec<InteractionRecord>), EngineError> {
    let structure = match outcome::read_input(path) {
        Ok(s) => s,
        Err(failed) => return Ok((failed, Vec::new())),
    };
    let id = structure.structure_id();

    match extract(&structure, config)? {
        Some(records) => {
            debug!(structure_id = id, interactions = records.len(), "Structure processed");
            let status = OutcomeStatus::Processed {
                rows: records.len(),
            };
            Ok((StructureOutcome::new(path, Some(id), status), records))
        }
        None => {
            debug!(
                structure_id = id,
                "Structure skipped: contains alternative locations"
            );
            let status = OutcomeStatus::Skipped {
                reason: "contains alternative locations".to_string(),
            };
            Ok((StructureOutcome::new(path, Some(id), status), Vec::new()))
        }
    }
}

/// Decodes every input MMTF file and collects the interactions of
/// `config.target_group` within `config.cutoff`.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] if the cutoff is invalid. Unreadable
/// or malformed inputs do not fail the batch; they are reported in
/// [`InteractionDataset::outcomes`].
#[instrument(skip_all, name = "interactions_workflow", fields(target = %config.target_group, cutoff = config.cutoff))]
pub fn run<P>(
    inputs: &[P],
    config: &InteractionConfig,
    reporter: &ProgressReporter,
) -> Result<InteractionDataset, EngineError>
where
    P: AsRef<Path> + Sync,
{
    info!(inputs = inputs.len(), "Starting interaction extraction.");
    reporter.report(Progress::BatchStart {
        total_structures: inputs.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = inputs.iter();

    #[cfg(feature = "parallel")]
    let iterator = inputs.par_iter();

    let results: Vec<_> = iterator
        .map(|input| {
            let result = process_input(input.as_ref(), config);
            reporter.report(Progress::StructureFinished {
                structure: input.as_ref().display().to_string(),
            });
            result
        })
        .collect();

    let mut dataset = InteractionDataset::default();
    for result in results {
        let (outcome, records) = result?;
        dataset.outcomes.push(outcome);
        dataset.records.extend(records);
    }

    reporter.report(Progress::BatchFinish);
    info!(
        processed = dataset.processed(),
        skipped = dataset.skipped(),
        failed = dataset.failed(),
        interactions = dataset.records.len(),
        "Interaction extraction finished."
    );
    Ok(dataset)
}

/// Writes `records` as CSV with a header row, in dataset column order.
///
/// # Errors
///
/// Returns [`EngineError::Output`] if serialization or the writer fails.
pub fn write_csv<W: Write>(records: &[InteractionRecord], writer: W) -> Result<(), EngineError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::mmtf::{MmtfFile, MmtfWriteOptions};
    use crate::core::io::traits::StructureFile;
    use crate::core::metadata::GroupRecord;
    use crate::core::models::atom::AtomSite;
    use crate::core::models::builder::StructureBuilder;
    use crate::engine::config::InteractionConfigBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn zinc_site(id: &str, alt_loc: char) -> Structure {
        let mut builder = StructureBuilder::new();
        builder.start_group(GroupRecord::new("ZN", "NON-POLYMER", '?', &[("ZN", "Zn")]), 1, '\0');
        builder.add_atom(AtomSite::at(0.0, 0.0, 0.0));
        builder.start_group(
            GroupRecord::new("HIS", "L-PEPTIDE LINKING", 'H', &[("NE2", "N")]),
            2,
            '\0',
        );
        builder.add_atom(AtomSite::at(0.0, 0.0, 1.5).with_alt_loc(alt_loc));
        builder.start_group(
            GroupRecord::new("HIS", "L-PEPTIDE LINKING", 'H', &[("NE2", "N")]),
            3,
            '\0',
        );
        builder.add_atom(AtomSite::at(10.0, 10.0, 10.0));
        builder.build(id).unwrap()
    }

    fn config(exclude_alt_locs: bool) -> InteractionConfig {
        InteractionConfigBuilder::new()
            .target_group("ZN")
            .cutoff(3.0)
            .exclude_alternative_locations(exclude_alt_locs)
            .build()
            .unwrap()
    }

    #[test]
    fn extract_respects_alternative_location_filter() {
        let s = zinc_site("1ALT", 'A');
        assert_eq!(extract(&s, &config(false)).unwrap().unwrap().len(), 1);
        assert_eq!(extract(&s, &config(true)).unwrap(), None);
    }

    #[test]
    fn run_reports_outcome_for_every_input() {
        let dir = tempdir().unwrap();
        let options = MmtfWriteOptions::default();
        let good = dir.path().join("1znc.mmtf");
        let alt = dir.path().join("1alt.mmtf");
        let bad = dir.path().join("broken.mmtf");
        MmtfFile::write_to_path(&zinc_site("1ZNC", '\0'), &options, &good).unwrap();
        MmtfFile::write_to_path(&zinc_site("1ALT", 'B'), &options, &alt).unwrap();
        std::fs::write(&bad, b"not msgpack at all").unwrap();

        let finished = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StructureFinished { .. } = event {
                finished.fetch_add(1, Ordering::SeqCst);
            }
        }));
        let inputs = vec![good.clone(), alt.clone(), bad.clone()];
        let dataset = run(inputs.as_slice(), &config(true), &reporter).unwrap();

        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert_eq!((dataset.processed(), dataset.skipped(), dataset.failed()), (1, 1, 1));
        assert_eq!(dataset.outcomes[0].structure_id.as_deref(), Some("1ZNC"));
        assert_eq!(dataset.outcomes[1].source, alt);
        assert!(matches!(dataset.outcomes[2].status, OutcomeStatus::Failed { .. }));
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].structure_id, "1ZNC");
    }

    #[test]
    fn run_rejects_invalid_cutoff_in_hand_built_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1znc.mmtf");
        MmtfFile::write_to_path(&zinc_site("1ZNC", '\0'), &MmtfWriteOptions::default(), &path)
            .unwrap();
        let config = InteractionConfig {
            target_group: "ZN".into(),
            cutoff: -1.0,
            exclude_alternative_locations: false,
        };
        assert!(matches!(
            run(&[path], &config, &ProgressReporter::new()),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn csv_has_header_in_column_order() {
        let records = extract(&zinc_site("1ZNC", '\0'), &config(false))
            .unwrap()
            .unwrap();
        let mut out = Vec::new();
        write_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("structureId,residue1,atom1,element1,index1,residue2,atom2,element2,index2,distance")
        );
        assert_eq!(lines.next(), Some("1ZNC,ZN,ZN,Zn,0,HIS,NE2,N,1,1.5"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_dataset_still_writes_header() {
        let mut out = Vec::new();
        write_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
