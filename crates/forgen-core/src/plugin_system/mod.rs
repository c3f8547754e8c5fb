//! # Plugin system
//!
//! Runtime discovery, loading, and dependency resolution for generator
//! plugin modules.
//!
//! ## Key submodules:
//!
//! - **[`resolver`]**: resolves requested plugin names to on-disk modules
//!   through an ordered strategy chain, loads each module at most once, and
//!   answers transitive-dependency lookups the host loader cannot satisfy.
//! - **[`dependency`]**: the append/merge-only index of every dependency
//!   declared by the modules loaded so far.
//! - **[`manifest`]**: sidecar dependency manifests (`<stem>.deps.json`)
//!   and the records they declare.
//! - **[`assets`]**: strategies that turn a matched dependency record into
//!   concrete on-disk candidate paths.
//! - **[`host`]**: the loading seam; production loading goes through
//!   `libloading`.
//! - **[`error`]**: plugin-system error types.

pub mod assets;
pub mod dependency;
pub mod error;
pub mod host;
pub mod manifest;
pub mod resolver;

pub use dependency::DependencyIndex;
pub use error::PluginSystemError;
pub use host::{LibraryModuleHost, ModuleHost, PluginModule};
pub use manifest::{DependencyManifest, DependencyRecord};
pub use resolver::{ModuleLocator, PluginResolver, ResolverConfig};
