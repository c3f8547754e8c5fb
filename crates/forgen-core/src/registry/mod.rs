//! # Descriptor registries
//!
//! Persistence layer for the sets of descriptors that survive across build
//! invocations. A generic [`DescriptorStore`](store::DescriptorStore) handles
//! load/save round-tripping over a single backing file per registry;
//! [`ModuleRegistry`](module::ModuleRegistry) records located plugin modules
//! and [`GenerationRegistry`](generation::GenerationRegistry) records which
//! artifacts were generated from which source inputs, providing the
//! staleness and purge queries the incremental driver relies on.

pub mod error;
pub mod generation;
pub mod module;
pub mod store;

pub use error::RegistryError;
pub use generation::{GeneratedEntry, GenerationRegistry};
pub use module::{ModuleRegistry, PluginModuleDescriptor};
pub use store::{Descriptor, DescriptorSet, DescriptorStore};
