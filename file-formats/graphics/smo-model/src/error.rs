use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for model loading, writing, and validation
#[derive(Error, Debug)]
pub enum ModelError {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A model file or one of its member files could not be opened
    #[error("Could not open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file extension does not name a supported model format
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// A record could not be parsed
    #[error("Parse error in {file} at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    /// The file ended before every declared record was read
    #[error("Unexpected end of {file}: expected {expected}")]
    UnexpectedEof { file: String, expected: String },

    /// Reference error: a record names a bone, material, or vertex that does not exist
    #[error("Reference error: {0}")]
    Reference(String),

    /// Error during validation of structural invariants
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
