//! Error types for notesync-core

use thiserror::Error;

use crate::auth::AuthError;

/// Result type alias using notesync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notesync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local snapshot could not be read or written
    #[error("Local snapshot error: {0}")]
    Snapshot(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation needs an authenticated identity
    #[error("Not signed in")]
    NotSignedIn,

    /// Identity provider error
    #[error(transparent)]
    Auth(#[from] AuthError),
}
