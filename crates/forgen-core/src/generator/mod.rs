//! # Generator invocation
//!
//! The generator-facing surface: the [`CodeGenerator`](traits::CodeGenerator)
//! callable interface, the per-invocation
//! [`GeneratorDescriptor`](descriptor::GeneratorDescriptor) accumulator, and
//! the [`GenerationDriver`](driver::GenerationDriver) that orchestrates a
//! whole run.

pub mod descriptor;
pub mod driver;
pub mod error;
pub mod traits;

pub use descriptor::GeneratorDescriptor;
pub use driver::{DriverConfig, GenerationDriver, RunSummary};
pub use error::GeneratorError;
pub use traits::{CodeGenerator, GeneratedUnit, SourceUnit};

#[cfg(test)]
mod tests;
