//! Error types for the FreightView environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Broadcasting a snapshot failed (channel closed, etc.)
    #[error("Publish error: {0}")]
    PublishError(String),

    /// Writing or reading persisted state failed
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// Snapshot serialization/deserialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EnvError {
    /// Creates a publish error.
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::PublishError(msg.into())
    }

    /// Creates a persistence error.
    pub fn persistence(msg: impl std::fmt::Display) -> Self {
        Self::PersistenceError(msg.to_string())
    }

    /// Creates a serialization error.
    pub fn serialization(msg: impl std::fmt::Display) -> Self {
        Self::SerializationError(msg.to_string())
    }
}
