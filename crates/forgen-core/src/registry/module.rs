//! Registry of plugin module locations discovered in prior builds.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::registry::error::RegistryError;
use crate::registry::store::{modified_time, Descriptor, DescriptorSet, DescriptorStore};

/// Records one plugin module located on disk. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginModuleDescriptor {
    pub module_path: PathBuf,
}

impl PluginModuleDescriptor {
    pub fn new(module_path: impl Into<PathBuf>) -> Self {
        Self {
            module_path: module_path.into(),
        }
    }
}

impl Descriptor for PluginModuleDescriptor {
    type Key = PathBuf;

    fn identity(&self) -> PathBuf {
        self.module_path.clone()
    }
}

/// Persisted set of located plugin modules.
#[derive(Debug)]
pub struct ModuleRegistry {
    store: DescriptorStore<PluginModuleDescriptor>,
    set: DescriptorSet<PluginModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new(output_directory: &Path, registry_file_name: &str) -> Self {
        Self {
            store: DescriptorStore::new(output_directory, registry_file_name),
            set: DescriptorSet::new(),
        }
    }

    /// Populate from the backing file. An absent file leaves the registry
    /// empty.
    pub fn load(&mut self) -> Result<(), RegistryError> {
        if let Some(set) = self.store.try_load()? {
            self.set = set;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<(), RegistryError> {
        self.store.try_save(&self.set)
    }

    pub fn registry_path(&self) -> &Path {
        self.store.registry_path()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn contains(&self, module_path: &Path) -> bool {
        self.set.contains_key(module_path)
    }

    /// Record a located module. Re-registering the same path is a no-op.
    pub fn register(&mut self, module_path: &Path) {
        self.set
            .entry(module_path.to_path_buf())
            .or_insert_with(|| PluginModuleDescriptor::new(module_path));
    }

    pub fn module_paths(&self) -> impl Iterator<Item = &Path> {
        self.set.values().map(|d| d.module_path.as_path())
    }

    /// Remove every descriptor whose module no longer exists on disk, then
    /// persist. A no-op when no registry file has been written yet.
    pub fn purge_not_exists(&mut self) -> Result<usize, RegistryError> {
        if self.set.is_empty() && !self.store.exists() {
            return Ok(0);
        }
        let before = self.set.len();
        self.set.retain(|path, _| path.exists());
        let removed = before - self.set.len();
        self.save()?;
        Ok(removed)
    }

    /// The most recent last-modified time across all recorded module files,
    /// or `None` when the registry is empty. Callers use this to decide
    /// whether any module changed since the previous run.
    pub fn last_written_timestamp(&self) -> Option<SystemTime> {
        self.set
            .values()
            .filter_map(|d| modified_time(&d.module_path))
            .max()
    }
}
