// ============================================================
// Layer 3 — Checkpoint Errors
// ============================================================
// Every failure the checkpoint writer and reader can report.
// These are typed (thiserror) so callers can match on the kind
// of failure; the application layer wraps them in anyhow with
// extra context before they reach the user.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, writing, or reading a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The architecture descriptor is internally inconsistent
    /// (no hidden layers, or a zero-width layer).
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    /// The persisted record is missing a field, has a field of the
    /// wrong type, or carries a parameter set that doesn't match
    /// its own architecture key-for-key.
    #[error("malformed checkpoint: {0}")]
    MalformedCheckpoint(String),

    /// A named parameter's shape disagrees with the slot it is
    /// being loaded into.
    #[error("shape mismatch for '{key}': expected {expected:?}, found {actual:?}")]
    ShapeMismatch {
        /// Parameter name, e.g. `hidden_layers.0.weight`.
        key: String,
        /// Shape implied by the architecture / target model.
        expected: Vec<usize>,
        /// Shape found in the checkpoint.
        actual: Vec<usize>,
    },

    /// The file extension doesn't map to a known encoding.
    #[error("unsupported checkpoint format: {0}")]
    UnsupportedFormat(String),

    /// The record could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reading or writing the checkpoint file failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CheckpointError {
    pub fn invalid_architecture(reason: impl Into<String>) -> Self {
        Self::InvalidArchitecture(reason.into())
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedCheckpoint(reason.into())
    }

    pub fn shape_mismatch(
        key:      impl Into<String>,
        expected: &[usize],
        actual:   &[usize],
    ) -> Self {
        Self::ShapeMismatch {
            key:      key.into(),
            expected: expected.to_vec(),
            actual:   actual.to_vec(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_names_key_and_both_shapes() {
        let err = CheckpointError::shape_mismatch("hidden_layers.0.weight", &[512, 784], &[400, 784]);
        let msg = err.to_string();
        assert!(msg.contains("hidden_layers.0.weight"));
        assert!(msg.contains("[512, 784]"));
        assert!(msg.contains("[400, 784]"));
    }

    #[test]
    fn io_error_mentions_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = CheckpointError::io("/tmp/model.ckpt", source);
        assert!(err.to_string().contains("/tmp/model.ckpt"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
