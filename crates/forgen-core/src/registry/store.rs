//! Generic descriptor persistence over a single backing file.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::registry::error::RegistryError;

/// A persistable descriptor with a stable identity key. Descriptors with the
/// same key are the same logical entry; later insertions replace earlier
/// ones.
pub trait Descriptor: Serialize + DeserializeOwned {
    type Key: Ord + Clone;

    fn identity(&self) -> Self::Key;
}

/// Descriptor set keyed by identity.
pub type DescriptorSet<D> = BTreeMap<<D as Descriptor>::Key, D>;

/// Loads and saves a descriptor set to one file under the configured output
/// directory. Absence of the backing file is a normal first-run state, not
/// an error; save failures always propagate.
#[derive(Debug, Clone)]
pub struct DescriptorStore<D: Descriptor> {
    registry_path: PathBuf,
    _descriptor: PhantomData<D>,
}

impl<D: Descriptor> DescriptorStore<D> {
    /// Create a store backed by `<output_directory>/<registry_file_name>`.
    pub fn new(output_directory: &Path, registry_file_name: &str) -> Self {
        Self {
            registry_path: output_directory.join(registry_file_name),
            _descriptor: PhantomData,
        }
    }

    /// Full path of the backing file.
    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// Whether the backing file exists on disk.
    pub fn exists(&self) -> bool {
        self.registry_path.is_file()
    }

    /// Load the persisted set. Returns `Ok(None)` when no registry has been
    /// written yet. Duplicate identities in the file collapse to the last
    /// occurrence.
    pub fn try_load(&self) -> Result<Option<DescriptorSet<D>>, RegistryError> {
        if !self.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.registry_path)
            .map_err(|e| RegistryError::io(e, "read_registry", self.registry_path.clone()))?;
        let descriptors: Vec<D> =
            serde_json::from_str(&contents).map_err(|source| RegistryError::Deserialization {
                path: self.registry_path.clone(),
                source,
            })?;
        let mut set = DescriptorSet::<D>::new();
        for descriptor in descriptors {
            set.insert(descriptor.identity(), descriptor);
        }
        Ok(Some(set))
    }

    /// Persist the whole set atomically: the contents are written to a
    /// temporary file in the target directory and renamed over the backing
    /// file, so a failed save leaves the prior file untouched.
    pub fn try_save(&self, set: &DescriptorSet<D>) -> Result<(), RegistryError> {
        let parent = match self.registry_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.is_dir() {
            fs::create_dir_all(&parent)
                .map_err(|e| RegistryError::io(e, "create_output_directory", parent.clone()))?;
        }

        let descriptors: Vec<&D> = set.values().collect();
        let contents = serde_json::to_string_pretty(&descriptors).map_err(|source| {
            RegistryError::Serialization {
                path: self.registry_path.clone(),
                source,
            }
        })?;

        let temp_file = NamedTempFile::new_in(&parent)
            .map_err(|e| RegistryError::io(e, "create_temp_file", parent.clone()))?;
        temp_file
            .as_file()
            .write_all(contents.as_bytes())
            .map_err(|e| RegistryError::io(e, "write_temp_file", temp_file.path().to_path_buf()))?;
        temp_file
            .persist(&self.registry_path)
            .map_err(|e| RegistryError::io(e.error, "persist_registry", self.registry_path.clone()))?;

        Ok(())
    }
}

/// Last-modified time of `path`, or `None` when the file is missing or its
/// metadata cannot be read.
pub(crate) fn modified_time(path: &Path) -> Option<std::time::SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
