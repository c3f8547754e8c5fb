//! Incremental generation registry: maps each source input to the artifacts
//! generated from it, with timestamp-based staleness detection.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::constants::GENERATED_INFIX;
use crate::registry::error::RegistryError;
use crate::registry::store::{modified_time, Descriptor, DescriptorSet, DescriptorStore};

/// One source input and the artifacts generated from it. Identity is the
/// source path; asset keys are replaced wholesale on regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedEntry {
    pub source_file_path: PathBuf,
    pub generated_asset_keys: Vec<String>,
    pub output_directory: PathBuf,
}

impl GeneratedEntry {
    pub fn new(
        source_file_path: impl Into<PathBuf>,
        generated_asset_keys: Vec<String>,
        output_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_file_path: source_file_path.into(),
            generated_asset_keys,
            output_directory: output_directory.into(),
        }
    }

    /// On-disk path of one generated asset:
    /// `<output_directory>/<key>.g.<extension>`.
    pub fn asset_path(&self, key: &str, extension: &str) -> PathBuf {
        self.output_directory
            .join(format!("{}{}{}", key, GENERATED_INFIX, extension))
    }

    /// Paths of every recorded asset, in key order.
    pub fn asset_paths(&self, extension: &str) -> Vec<PathBuf> {
        self.generated_asset_keys
            .iter()
            .map(|key| self.asset_path(key, extension))
            .collect()
    }
}

impl Descriptor for GeneratedEntry {
    type Key = PathBuf;

    fn identity(&self) -> PathBuf {
        self.source_file_path.clone()
    }
}

/// Persisted source-to-artifact mapping. The registry, not the filesystem,
/// is the source of truth for what was generated from what.
#[derive(Debug)]
pub struct GenerationRegistry {
    store: DescriptorStore<GeneratedEntry>,
    set: DescriptorSet<GeneratedEntry>,
}

impl GenerationRegistry {
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

    pub fn entry(&self, source_file_path: &Path) -> Option<&GeneratedEntry> {
        self.set.get(source_file_path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &GeneratedEntry> {
        self.set.values()
    }

    /// Insert or replace the entry for the source file the entry names.
    pub fn upsert(&mut self, entry: GeneratedEntry) {
        self.set.insert(entry.identity(), entry);
    }

    pub fn remove(&mut self, source_file_path: &Path) -> Option<GeneratedEntry> {
        self.set.remove(source_file_path)
    }

    /// An entry is stale when the source's last-modified time is strictly
    /// greater than the minimum last-modified time across its recorded
    /// assets, or when any recorded asset is missing on disk. Equal
    /// timestamps (same-build resolution) are fresh. An entry with no
    /// recorded assets is stale; a missing source is not (purge handles
    /// those).
    pub fn is_stale(&self, entry: &GeneratedEntry, extension: &str) -> bool {
        if entry.generated_asset_keys.is_empty() {
            return true;
        }
        let source_modified = match modified_time(&entry.source_file_path) {
            Some(t) => t,
            None => return false,
        };
        let mut oldest_asset: Option<SystemTime> = None;
        for path in entry.asset_paths(extension) {
            match modified_time(&path) {
                Some(t) => {
                    oldest_asset = Some(match oldest_asset {
                        Some(min) => min.min(t),
                        None => t,
                    });
                }
                // Recorded asset missing on disk
                None => return true,
            }
        }
        match oldest_asset {
            Some(oldest) => source_modified > oldest,
            None => true,
        }
    }

    /// Remove every entry whose source file no longer exists, then persist.
    /// A no-op when no registry file has been written yet.
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

    /// The most recent last-modified time across all recorded source files,
    /// or `None` when the registry is empty or absent.
    pub fn last_written_timestamp(&self) -> Option<SystemTime> {
        self.set
            .values()
            .filter_map(|e| modified_time(&e.source_file_path))
            .max()
    }

    /// Every generated artifact path across all entries, in entry order.
    /// This is the list the build-system response surface consumes.
    pub fn artifact_paths(&self, extension: &str) -> Vec<PathBuf> {
        self.set
            .values()
            .flat_map(|entry| entry.asset_paths(extension))
            .collect()
    }
}
