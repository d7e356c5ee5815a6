use crate::types::Handle;

/// All errors that can occur in attention bank operations.
///
/// Every variant is a caller contract violation. Calls racing a shutdown
/// are not errors and never produce one.
#[derive(Debug, thiserror::Error)]
pub enum AttentionBankError {
    /// Stimulus was negative, NaN or infinite.
    #[error("invalid stimulus: {stimulus} (must be finite and non-negative)")]
    InvalidStimulus { stimulus: f64 },

    /// The item table does not know this handle.
    #[error("unknown item: {handle}")]
    UnknownItem { handle: Handle },

    /// Configuration rejected at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for attention bank results.
pub type Result<T> = std::result::Result<T, AttentionBankError>;
