//! Running index of every dependency declared by the modules loaded so far.

use std::path::Path;

use crate::plugin_system::manifest::{DependencyManifest, DependencyRecord};

/// Append/merge-only dependency index. Records keep insertion order so that
/// lookups are first-match-by-iteration-order; once a record for a name
/// exists, later merges only add asset paths and sub-dependency names,
/// never remove.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    records: Vec<DependencyRecord>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.records.iter()
    }

    /// Merge every record of `manifest` into the index.
    pub fn merge_manifest(&mut self, manifest: &DependencyManifest) {
        for record in &manifest.libraries {
            self.merge_record(record);
        }
    }

    /// Merge one record: union the asset paths and sub-dependency names of
    /// any existing record with the same name (case-insensitive), preserving
    /// order and dropping duplicates; the first-declared version and hash
    /// win. Unknown names append.
    pub fn merge_record(&mut self, record: &DependencyRecord) {
        match self
            .records
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&record.name))
        {
            Some(existing) => {
                for asset in &record.asset_paths {
                    if !existing.asset_paths.contains(asset) {
                        existing.asset_paths.push(asset.clone());
                    }
                }
                for dependency in &record.dependencies {
                    if !existing
                        .dependencies
                        .iter()
                        .any(|d| d.eq_ignore_ascii_case(dependency))
                    {
                        existing.dependencies.push(dependency.clone());
                    }
                }
                existing.serviceable = existing.serviceable || record.serviceable;
            }
            None => self.records.push(record.clone()),
        }
    }

    /// Find the record satisfying `requested`. Each record is checked for an
    /// exact name match (case-insensitive) and then for a match against any
    /// declared asset's base file name (with or without extension); the
    /// first record matching either way wins. Exact-name matches are not
    /// preferred globally across records.
    pub fn find(&self, requested: &str) -> Option<&DependencyRecord> {
        self.records.iter().find(|record| {
            record.name.eq_ignore_ascii_case(requested)
                || record.asset_base_names().any(|base| {
                    base.eq_ignore_ascii_case(requested)
                        || Path::new(base)
                            .file_stem()
                            .and_then(|s| s.to_str())
                            .is_some_and(|stem| stem.eq_ignore_ascii_case(requested))
                })
        })
    }
}
