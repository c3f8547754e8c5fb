//! Generator callable interface and the units it consumes and produces.

use std::path::PathBuf;

use crate::generator::descriptor::GeneratorDescriptor;
use crate::generator::error::GeneratorError;

/// One source input handed to the generators.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub text: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// File stem of the source path, used when deriving artifact keys.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("source")
    }
}

/// One generated syntax artifact. The driver derives the persisted asset
/// key from `name` when the generator supplies one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub name: Option<String>,
    pub text: String,
}

impl GeneratedUnit {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            name: None,
            text: text.into(),
        }
    }

    pub fn named(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            text: text.into(),
        }
    }
}

/// A code generator loaded from a plugin module.
///
/// Generators append their output to the shared invocation descriptor so
/// that several generators invoked for one source unit compose rather than
/// replace each other's results.
pub trait CodeGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(
        &self,
        source: &SourceUnit,
        descriptor: &mut GeneratorDescriptor,
    ) -> Result<(), GeneratorError>;
}
