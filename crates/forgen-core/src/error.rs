//! Crate-level error type aggregating the subsystem errors.

use thiserror::Error;

use crate::generator::error::GeneratorError;
use crate::plugin_system::error::PluginSystemError;
use crate::registry::error::RegistryError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Generation error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Neither source files nor generator names were supplied.
    #[error("No source files are specified")]
    NoInputs,
}

/// Shorthand for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
