//! Asset-path resolution strategies for dependency records.
//!
//! A matched dependency record names candidate assets; the composite
//! resolver turns those into concrete on-disk paths by trying an ordered
//! chain of strategies. One local-directory strategy is absorbed per new
//! base directory encountered while loading modules, so assets shipped next
//! to an already-loaded module resolve without further configuration.

use std::path::{Path, PathBuf};

use crate::plugin_system::manifest::DependencyRecord;

/// Produces zero or more on-disk candidate paths for a dependency record.
pub trait AssetPathResolver: std::fmt::Debug + Send {
    fn name(&self) -> &str;

    fn resolve(&self, record: &DependencyRecord) -> Vec<PathBuf>;
}

/// Resolves asset base names against explicitly configured reference
/// directories.
#[derive(Debug)]
pub struct ReferenceDirectoryResolver {
    directories: Vec<PathBuf>,
}

impl ReferenceDirectoryResolver {
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self { directories }
    }
}

impl AssetPathResolver for ReferenceDirectoryResolver {
    fn name(&self) -> &str {
        "reference-directory"
    }

    fn resolve(&self, record: &DependencyRecord) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        for base in record.asset_base_names() {
            for directory in &self.directories {
                let candidate = directory.join(base);
                if candidate.is_file() {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }
}

/// Resolves serviceable records out of an installed-package cache laid out
/// as `<root>/<name>/<version>/<asset path>`.
#[derive(Debug)]
pub struct PackageCacheResolver {
    root: PathBuf,
}

impl PackageCacheResolver {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl AssetPathResolver for PackageCacheResolver {
    fn name(&self) -> &str {
        "package-cache"
    }

    fn resolve(&self, record: &DependencyRecord) -> Vec<PathBuf> {
        if !record.serviceable {
            return Vec::new();
        }
        let package_root = self.root.join(&record.name).join(&record.version);
        record
            .asset_paths
            .iter()
            .map(|asset| package_root.join(asset))
            .filter(|candidate| candidate.is_file())
            .collect()
    }
}

/// Resolves asset base names against one directory a module was loaded
/// from.
#[derive(Debug)]
pub struct LocalDirectoryResolver {
    base: PathBuf,
}

impl LocalDirectoryResolver {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl AssetPathResolver for LocalDirectoryResolver {
    fn name(&self) -> &str {
        "local-directory"
    }

    fn resolve(&self, record: &DependencyRecord) -> Vec<PathBuf> {
        record
            .asset_base_names()
            .map(|base| self.base.join(base))
            .filter(|candidate| candidate.is_file())
            .collect()
    }
}

/// Ordered chain of resolution strategies. The first strategy producing any
/// candidates wins.
#[derive(Debug, Default)]
pub struct CompositeAssetResolver {
    resolvers: Vec<Box<dyn AssetPathResolver>>,
}

impl CompositeAssetResolver {
    pub fn new(resolvers: Vec<Box<dyn AssetPathResolver>>) -> Self {
        Self { resolvers }
    }

    /// Append a strategy to the end of the chain.
    pub fn absorb(&mut self, resolver: Box<dyn AssetPathResolver>) {
        self.resolvers.push(resolver);
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    pub fn resolve(&self, record: &DependencyRecord) -> Vec<PathBuf> {
        for resolver in &self.resolvers {
            let candidates = resolver.resolve(record);
            if !candidates.is_empty() {
                log::debug!(
                    "asset resolver '{}' produced {} candidate(s) for '{}'",
                    resolver.name(),
                    candidates.len(),
                    record.name
                );
                return candidates;
            }
        }
        Vec::new()
    }
}
