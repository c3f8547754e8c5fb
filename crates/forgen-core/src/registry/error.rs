//! Error types for the registry persistence layer.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("I/O error during operation '{operation}' on path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize registry '{}': {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to deserialize registry '{}': {source}", path.display())]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// Helper for creating Io errors, ensuring path is always included.
impl RegistryError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        RegistryError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }
}
