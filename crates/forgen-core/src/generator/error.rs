//! Error types for generator invocation and artifact emission.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Generator '{generator}' failed for '{}': {message}", source_file.display())]
    GenerationFailed {
        generator: String,
        source_file: PathBuf,
        message: String,
    },

    #[error("Failed to read source '{}': {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write artifact '{}': {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
