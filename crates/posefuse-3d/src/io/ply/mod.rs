mod parser;
mod properties;
mod writer;

pub use parser::*;
pub use properties::*;
pub use writer::*;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to read or write the PLY file
    #[error("Failed to read or write PLY file")]
    Io(#[from] std::io::Error),

    /// Failed to deserialize a binary vertex
    #[error("Failed to deserialize PLY vertex")]
    Deserialize(#[from] bincode::error::DecodeError),

    /// Failed to serialize a binary vertex
    #[error("Failed to serialize PLY vertex")]
    Serialize(#[from] bincode::error::EncodeError),

    /// The header is missing or malformed
    #[error("Invalid PLY header: {0}")]
    InvalidHeader(String),

    /// Unsupported PLY property
    #[error("Unsupported PLY property: {0}")]
    UnsupportedProperty(String),

    /// A vertex record could not be parsed
    #[error("Invalid PLY vertex {0}: {1}")]
    InvalidVertex(usize, String),
}
