//! Error types for plugin resolution and loading.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginSystemError {
    #[error(
        "Could not resolve generator plugin '{requested}'; searched reference paths [{}] and directories [{}]",
        display_paths(.reference_paths),
        display_paths(.search_paths)
    )]
    ResolutionFailed {
        requested: String,
        reference_paths: Vec<PathBuf>,
        search_paths: Vec<PathBuf>,
    },

    #[error("Plugin loading failed for '{module}': {message}")]
    LoadingError {
        module: String,
        path: Option<PathBuf>,
        message: String,
    },

    #[error("Dependency manifest error for '{}': {message}", path.display())]
    ManifestError {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to instantiate generator from '{module}': {message}")]
    InstantiationError { module: String, message: String },

    #[error("Internal plugin system error: {0}")]
    InternalError(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
