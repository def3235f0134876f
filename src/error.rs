use crate::engine::EngineError;

use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures that stop the whole batch before any scan is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot list directory {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write run log {path}: {source}")]
    RunLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },
}

/// Failures confined to a single scan. The batch driver logs them and moves on.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no initiator file found matching {pattern}")]
    Resolution { pattern: String },

    #[error("cannot classify scan {scan}: {reason}")]
    Classification { scan: String, reason: String },

    #[error("no single reconstructed stack found ({found} candidates), check metadata completeness")]
    AmbiguousStack { found: usize },

    #[error("cannot read scan directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("imaging engine failed: {0}")]
    Engine(#[from] EngineError),
}
