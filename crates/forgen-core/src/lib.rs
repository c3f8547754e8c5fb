//! forgen core: build-time code-generation driver.
//!
//! Given a compilation's source files and a set of generator plugins, the
//! driver locates and loads the plugins, resolves their transitive runtime
//! dependencies, invokes them to produce derived source artifacts, and
//! tracks which artifacts came from which inputs so subsequent builds skip
//! unchanged work.

pub mod constants;
pub mod error;
pub mod generator;
pub mod logging;
pub mod plugin_system;
pub mod registry;

// Re-export key public types for the binary and plugins.
pub use error::{Error, Result};
pub use generator::{
    CodeGenerator, DriverConfig, GenerationDriver, GeneratedUnit, GeneratorDescriptor,
    RunSummary, SourceUnit,
};
pub use logging::{DiagnosticLogger, Severity};
pub use plugin_system::{LibraryModuleHost, ModuleHost, PluginModule, PluginResolver, ResolverConfig};
pub use registry::{GeneratedEntry, GenerationRegistry, ModuleRegistry};
