//! Module loading seam.
//!
//! [`ModuleHost`] abstracts the act of loading one plugin module so that the
//! resolver's search, caching, and dependency-merge logic can be exercised
//! without touching the dynamic linker. [`LibraryModuleHost`] is the
//! production implementation over `libloading`.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};

use crate::constants::GENERATOR_ENTRY_SYMBOL;
use crate::generator::traits::CodeGenerator;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::DependencyManifest;

/// Signature of the entry point every generator module exports.
pub type GeneratorCreate = unsafe fn() -> Box<dyn CodeGenerator>;

/// Handle to one loaded plugin module.
pub trait PluginModule: Send + Sync + Debug {
    /// Path the module was loaded from. For system-resolved modules this is
    /// the platform file name the host handed to the loader.
    fn path(&self) -> &Path;

    /// The dependency manifest the module declared, if any.
    fn dependency_manifest(&self) -> Option<&DependencyManifest>;

    /// Construct the module's generator callable.
    fn instantiate(&self) -> Result<Box<dyn CodeGenerator>, PluginSystemError>;
}

/// Loads plugin modules into the process.
pub trait ModuleHost: Debug {
    /// Load the module at `path`.
    fn load(&self, path: &Path) -> Result<Arc<dyn PluginModule>, PluginSystemError>;

    /// Fall back to the host runtime's own lookup: hand the platform module
    /// file name for `name` to the system loader and let it search its
    /// default locations.
    fn load_by_name(&self, name: &str) -> Result<Arc<dyn PluginModule>, PluginSystemError>;
}

/// Platform file name for a module called `name`, e.g. `libfoo.so` on
/// Linux or `foo.dll` on Windows.
pub fn platform_module_file_name(name: &str) -> String {
    format!(
        "{}{}{}",
        std::env::consts::DLL_PREFIX,
        name,
        std::env::consts::DLL_SUFFIX
    )
}

/// A module backed by a dynamically loaded library.
pub struct LibraryPluginModule {
    path: PathBuf,
    manifest: Option<DependencyManifest>,
    library: Library,
}

impl Debug for LibraryPluginModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryPluginModule")
            .field("path", &self.path)
            .field("manifest", &self.manifest.is_some())
            .finish()
    }
}

impl PluginModule for LibraryPluginModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn dependency_manifest(&self) -> Option<&DependencyManifest> {
        self.manifest.as_ref()
    }

    fn instantiate(&self) -> Result<Box<dyn CodeGenerator>, PluginSystemError> {
        let create: Symbol<GeneratorCreate> = unsafe {
            self.library.get(GENERATOR_ENTRY_SYMBOL).map_err(|e| {
                PluginSystemError::InstantiationError {
                    module: self.path.display().to_string(),
                    message: format!("missing entry symbol forgen_generator_create: {}", e),
                }
            })?
        };
        // The entry point hands ownership of a boxed generator to the host.
        // The library stays alive as long as this module handle does, which
        // the resolver's load cache guarantees for the process lifetime.
        Ok(unsafe { create() })
    }
}

/// Production host loading modules through the dynamic linker.
#[derive(Debug, Default)]
pub struct LibraryModuleHost;

impl LibraryModuleHost {
    pub fn new() -> Self {
        Self
    }

    fn load_library(&self, path: &Path) -> Result<Arc<dyn PluginModule>, PluginSystemError> {
        let library = unsafe { Library::new(path) }.map_err(|e| PluginSystemError::LoadingError {
            module: path.display().to_string(),
            path: Some(path.to_path_buf()),
            message: format!("libloading error: {}", e),
        })?;
        let manifest = DependencyManifest::load_for_module(path)?;
        Ok(Arc::new(LibraryPluginModule {
            path: path.to_path_buf(),
            manifest,
            library,
        }))
    }
}

impl ModuleHost for LibraryModuleHost {
    fn load(&self, path: &Path) -> Result<Arc<dyn PluginModule>, PluginSystemError> {
        self.load_library(path)
    }

    fn load_by_name(&self, name: &str) -> Result<Arc<dyn PluginModule>, PluginSystemError> {
        let file_name = platform_module_file_name(name);
        self.load_library(Path::new(&file_name))
    }
}
