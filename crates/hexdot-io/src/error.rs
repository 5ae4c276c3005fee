use std::io;
use std::path::PathBuf;

use hexdot_core::LatticeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CifError {
    #[error("Template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid job file: {0}")]
    Job(#[from] serde_json::Error),

    #[error("Invalid array parameters: {0}")]
    Lattice(#[from] LatticeError),
}

impl CifError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CifError::Io {
            path: path.into(),
            source,
        }
    }
}
