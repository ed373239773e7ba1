//! Error types for session registry operations.
//!
//! Lookups that miss (unknown id, unknown user, expired session) are not
//! errors; they are reported through `bool` and `Option` results.

/// Error type for session registry operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration value rejected at the boundary.
    #[error("Invalid registry configuration: {0}")]
    InvalidConfig(String),

    /// Every id of the configured length is already bound to a session.
    #[error("Session id space exhausted: all {space} ids of length {id_length} are in use")]
    IdSpaceExhausted { id_length: usize, space: u128 },
}

/// Result type for session registry operations.
pub type Result<T> = std::result::Result<T, Error>;
