//! Error types for scenario loading and particle bookkeeping.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by persistence and particle-list operations.
///
/// Load operations fail atomically: a returned error means no system state
/// was changed. Degenerate geometry is never an error; those contributions
/// are skipped and logged instead.
#[derive(Debug, Error)]
pub enum SimError {
    /// Reading or writing a persisted file failed.
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted document did not match the schema.
    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A stored particle reference points outside the particle list.
    #[error("particle index {index} out of range (count: {count})")]
    ParticleOutOfRange { index: usize, count: usize },

    /// The particle is still referenced by a coherent force or constraint.
    #[error("particle {index} is still referenced by a coherent force or constraint")]
    ParticleReferenced { index: usize },
}
