use thiserror::Error;

use super::config::ConfigError;
use crate::core::error::ValidationError;
use crate::core::io::mmtf::MmtfError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid parameters: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to read structure from '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: MmtfError,
    },

    #[error("Failed to write dataset: {0}")]
    Output(#[from] csv::Error),
}
