//! Error types for the GEMM engine.

use thiserror::Error;

/// Errors reported by the GEMM entry points.
///
/// Everything except [`GemmError::Allocation`] is a caller contract
/// violation and is reported before any element of C is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GemmError {
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("{what} view needs {required} elements but its buffer holds {len}")]
    OutOfBounds {
        what: &'static str,
        required: usize,
        len: usize,
    },

    #[error("unsupported output layout: {0}")]
    UnsupportedLayout(String),

    #[error("packed B was built for {expected}, engine expects {actual}")]
    PackedLayoutMismatch { expected: String, actual: String },

    #[error("packed B buffer too small: need {required} floats, got {len}")]
    PackedBufferTooSmall { required: usize, len: usize },

    #[error("failed to allocate {bytes} bytes for packed panels")]
    Allocation { bytes: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, GemmError>;
