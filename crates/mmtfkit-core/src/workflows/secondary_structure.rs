use super::outcome::{self, OutcomeStatus, StructureOutcome};
use crate::core::error::ValidationError;
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// DSSP classes as stored in an MMTF `secStructList`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DsspSecondaryStructure {
    PiHelix,
    Bend,
    AlphaHelix,
    Extended,
    ThreeTenHelix,
    Bridge,
    Turn,
    Coil,
    Undefined,
}

impl DsspSecondaryStructure {
    /// Maps a stored code to its class. Codes outside `0..=7` are undefined.
    pub fn from_code(code: i8) -> Self {
        match code {
            0 => Self::PiHelix,
            1 => Self::Bend,
            2 => Self::AlphaHelix,
            3 => Self::Extended,
            4 => Self::ThreeTenHelix,
            5 => Self::Bridge,
            6 => Self::Turn,
            7 => Self::Coil,
            _ => Self::Undefined,
        }
    }

    /// One-letter DSSP Q8 code.
    pub fn q8_code(self) -> char {
        match self {
            Self::PiHelix => 'I',
            Self::Bend => 'S',
            Self::AlphaHelix => 'H',
            Self::Extended => 'E',
            Self::ThreeTenHelix => 'G',
            Self::Bridge => 'B',
            Self::Turn => 'T',
            Self::Coil => 'C',
            Self::Undefined => 'X',
        }
    }

    /// Three-state reduction: `H` for helices, `E` for strands and bridges,
    /// `C` for everything else that was assigned.
    pub fn q3_code(self) -> char {
        match self {
            Self::PiHelix | Self::AlphaHelix | Self::ThreeTenHelix => 'H',
            Self::Extended | Self::Bridge => 'E',
            Self::Bend | Self::Turn | Self::Coil => 'C',
            Self::Undefined => 'X',
        }
    }
}

/// Sequence and per-residue DSSP annotation of one polymer chain.
///
/// Positions without an observed, assigned residue are `X` in both code
/// strings. The fractions are over the assigned positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSecondaryStructure {
    #[serde(rename = "structureChainId")]
    pub structure_chain_id: String,
    pub sequence: String,
    pub alpha: f64,
    pub beta: f64,
    pub coil: f64,
    #[serde(rename = "dsspQ8Code")]
    pub dssp_q8: String,
    #[serde(rename = "dsspQ3Code")]
    pub dssp_q3: String,
}

/// A sequence window and the DSSP labels of its centre residue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRecord {
    #[serde(rename = "structureChainId")]
    pub structure_chain_id: String,
    pub sequence: String,
    #[serde(rename = "labelQ8")]
    pub label_q8: char,
    #[serde(rename = "labelQ3")]
    pub label_q3: char,
}

pub const SEGMENT_COLUMNS: [&str; 4] = ["structureChainId", "sequence", "labelQ8", "labelQ3"];

#[derive(Debug, Clone, Default)]
pub struct SegmentDataset {
    pub records: Vec<SegmentRecord>,
    /// One entry per input, in input order.
    pub outcomes: Vec<StructureOutcome>,
}

impl SegmentDataset {
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

/// Builds the DSSP annotation of every polymer chain in the first model.
///
/// Chains are identified as `<structure id>.<chain name>`. Groups are placed
/// by their entity sequence index; groups without one are ignored.
///
/// # Errors
///
/// Returns a [`ValidationError`] when a polymer entity lacks its sequence or
/// chain list, or names a chain the structure does not have.
pub fn extract_chains(
    structure: &Structure,
) -> Result<Vec<ChainSecondaryStructure>, ValidationError> {
    let mut chains = Vec::new();
    for entity in structure.entities() {
        let is_polymer = entity
            .entity_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("polymer"));
        if !is_polymer {
            continue;
        }
        let sequence = entity.sequence()?;
        let length = sequence.chars().count();

        for chain_index in entity.chain_indices()? {
            let chain = structure
                .chain(chain_index)
                .ok_or_else(|| ValidationError::UnexpectedType {
                    field: "chainIndexList".to_string(),
                    expected: "indices of existing chains",
                })?;
            if chain.model_index != 0 {
                continue;
            }

            let mut q8 = vec!['X'; length];
            let mut q3 = vec!['X'; length];
            let (mut alpha, mut beta, mut coil) = (0usize, 0usize, 0usize);
            for group in chain.group_range().filter_map(|g| structure.group(g)) {
                let Some(position) = usize::try_from(group.sequence_index)
                    .ok()
                    .filter(|&p| p < length)
                else {
                    continue;
                };
                let dssp = DsspSecondaryStructure::from_code(group.sec_struct);
                q8[position] = dssp.q8_code();
                q3[position] = dssp.q3_code();
                match dssp.q3_code() {
                    'H' => alpha += 1,
                    'E' => beta += 1,
                    'C' => coil += 1,
                    _ => {}
                }
            }

            let assigned = (alpha + beta + coil) as f64;
            let fraction = |n: usize| if assigned > 0.0 { n as f64 / assigned } else { 0.0 };
            chains.push(ChainSecondaryStructure {
                structure_chain_id: format!("{}.{}", structure.structure_id(), chain.name),
                sequence: sequence.to_string(),
                alpha: fraction(alpha),
                beta: fraction(beta),
                coil: fraction(coil),
                dssp_q8: q8.into_iter().collect(),
                dssp_q3: q3.into_iter().collect(),
            });
        }
    }
    Ok(chains)
}

fn check_length(length: usize) -> Result<(), ValidationError> {
    if length % 2 == 0 {
        return Err(ValidationError::EvenSegmentLength(length));
    }
    Ok(())
}

/// Cuts `chain` into every window of `length` residues, labelled by the
/// centre residue. Windows whose centre is unassigned (`X`) are dropped.
///
/// # Errors
///
/// Returns [`ValidationError::EvenSegmentLength`] if `length` is even.
pub fn segments(
    chain: &ChainSecondaryStructure,
    length: usize,
) -> Result<Vec<SegmentRecord>, ValidationError> {
    check_length(length)?;
    let residues: Vec<char> = chain.sequence.chars().collect();
    let q8: Vec<char> = chain.dssp_q8.chars().collect();
    let q3: Vec<char> = chain.dssp_q3.chars().collect();
    let centre = length / 2;

    Ok(residues
        .windows(length)
        .enumerate()
        .filter_map(|(start, window)| {
            let label_q8 = *q8.get(start + centre)?;
            let label_q3 = *q3.get(start + centre)?;
            (label_q8 != 'X' && label_q3 != 'X').then(|| SegmentRecord {
                structure_chain_id: chain.structure_chain_id.clone(),
                sequence: window.iter().collect(),
                label_q8,
                label_q3,
            })
        })
        .collect())
}

fn process_input(
    path: &Path,
    length: usize,
) -> Result<(StructureOutcome, Vec<SegmentRecord>), EngineError> {
    let structure = match outcome::read_input(path) {
        Ok(s) => s,
        Err(failed) => return Ok((failed, Vec::new())),
    };
    let id = structure.structure_id();

    let chains = match extract_chains(&structure) {
        Ok(chains) => chains,
        Err(e) => {
            let status = OutcomeStatus::Failed {
                message: format!("Invalid polymer metadata in '{id}': {e}"),
            };
            return Ok((StructureOutcome::new(path, Some(id), status), Vec::new()));
        }
    };
    if chains.is_empty() {
        let status = OutcomeStatus::Skipped {
            reason: "no polymer chains".to_string(),
        };
        return Ok((StructureOutcome::new(path, Some(id), status), Vec::new()));
    }

    let mut records = Vec::new();
    for chain in &chains {
        records.extend(segments(chain, length)?);
    }
    debug!(
        structure_id = id,
        chains = chains.len(),
        segments = records.len(),
        "Structure processed"
    );
    let status = OutcomeStatus::Processed {
        rows: records.len(),
    };
    Ok((StructureOutcome::new(path, Some(id), status), records))
}

/// Decodes every input MMTF file and collects the labelled sequence segments
/// of its polymer chains.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] if `length` is even. Unreadable or
/// malformed inputs do not fail the batch; they are reported in
/// [`SegmentDataset::outcomes`].
#[instrument(skip_all, name = "segments_workflow", fields(length = length))]
pub fn run<P>(
    inputs: &[P],
    length: usize,
    reporter: &ProgressReporter,
) -> Result<SegmentDataset, EngineError>
where
    P: AsRef<Path> + Sync,
{
    check_length(length)?;
    info!(inputs = inputs.len(), "Starting segment extraction.");
    reporter.report(Progress::BatchStart {
        total_structures: inputs.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = inputs.iter();

    #[cfg(feature = "parallel")]
    let iterator = inputs.par_iter();

    let results: Vec<_> = iterator
        .map(|input| {
            let result = process_input(input.as_ref(), length);
            reporter.report(Progress::StructureFinished {
                structure: input.as_ref().display().to_string(),
            });
            result
        })
        .collect();

    let mut dataset = SegmentDataset::default();
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
        segments = dataset.records.len(),
        "Segment extraction finished."
    );
    Ok(dataset)
}

/// Writes `records` as CSV with a header row.
///
/// # Errors
///
/// Returns [`EngineError::Output`] if serialization or the writer fails.
pub fn write_csv<W: Write>(records: &[SegmentRecord], writer: W) -> Result<(), EngineError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(SEGMENT_COLUMNS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
