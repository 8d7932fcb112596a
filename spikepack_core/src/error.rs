use std::path::PathBuf;

/// Result alias for everything that happens to a single recording.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while discovering, resolving, or compressing a recording.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The walk root does not exist or is not a directory.
    #[error("invalid directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A path handed to the pipeline does not carry the recording suffix.
    #[error("not a recording file: {}", .0.display())]
    NotARecording(PathBuf),

    /// A sidecar line could not be decoded or split into `key=value`.
    #[error("meta file is corrupt at line {line}: {reason}")]
    CorruptMeta { line: usize, reason: String },

    /// A key required to resolve acquisition parameters is absent.
    #[error("required metadata key '{0}' is missing")]
    MissingKey(&'static str),

    /// A required key is present but its value does not parse.
    #[error("metadata key '{key}' has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },

    /// The compressor backend reported a failure.
    #[error("{compressor} compressor failed: {cause:#}")]
    Compressor {
        compressor: &'static str,
        cause: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
