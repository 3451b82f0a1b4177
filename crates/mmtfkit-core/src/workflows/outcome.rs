use crate::core::io::mmtf::MmtfFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    /// Decoded and processed; `rows` dataset rows were produced.
    Processed { rows: usize },
    Skipped { reason: String },
    Failed { message: String },
}

/// What happened to one input of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureOutcome {
    pub source: PathBuf,
    /// `None` when the input could not be decoded.
    pub structure_id: Option<String>,
    pub status: OutcomeStatus,
}

impl StructureOutcome {
    pub fn new(source: &Path, structure_id: Option<&str>, status: OutcomeStatus) -> Self {
        Self {
            source: source.to_path_buf(),
            structure_id: structure_id.map(str::to_string),
            status,
        }
    }
}

/// Decodes one batch input. A failure is logged and returned as the input's
/// `Failed` outcome so the batch can carry on.
pub(crate) fn read_input(path: &Path) -> Result<Structure, StructureOutcome> {
    MmtfFile::read_from_path(path).map_err(|source| {
        let error = EngineError::Read {
            path: path.to_path_buf(),
            source,
        };
        warn!("Skipping input: {}", error);
        StructureOutcome::new(
            path,
            None,
            OutcomeStatus::Failed {
                message: error.to_string(),
            },
        )
    })
}

pub(crate) fn processed(outcomes: &[StructureOutcome]) -> usize {
    count(outcomes, |s| matches!(s, OutcomeStatus::Processed { .. }))
}

pub(crate) fn skipped(outcomes: &[StructureOutcome]) -> usize {
    count(outcomes, |s| matches!(s, OutcomeStatus::Skipped { .. }))
}

pub(crate) fn failed(outcomes: &[StructureOutcome]) -> usize {
    count(outcomes, |s| matches!(s, OutcomeStatus::Failed { .. }))
}

fn count(outcomes: &[StructureOutcome], pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
    outcomes.iter().filter(|o| pred(&o.status)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn unreadable_input_becomes_failed_outcome() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.mmtf");
        let outcome = read_input(&path).unwrap_err();
        assert_eq!(outcome.source, path);
        assert_eq!(outcome.structure_id, None);
        match outcome.status {
            OutcomeStatus::Failed { message } => assert!(message.contains("missing.mmtf")),
            other => panic!("expected a failed outcome, got {other:?}"),
        }
    }

    #[test]
    fn counts_each_status() {
        let path = Path::new("x.mmtf");
        let outcomes = vec![
            StructureOutcome::new(path, Some("1ABC"), OutcomeStatus::Processed { rows: 3 }),
            StructureOutcome::new(path, Some("1ABD"), OutcomeStatus::Processed { rows: 0 }),
            StructureOutcome::new(
                path,
                None,
                OutcomeStatus::Failed {
                    message: "bad".into(),
                },
            ),
        ];
        assert_eq!(processed(&outcomes), 2);
        assert_eq!(skipped(&outcomes), 0);
        assert_eq!(failed(&outcomes), 1);
    }
}
