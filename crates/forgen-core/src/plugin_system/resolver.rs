//! Plugin resolution and load-once caching.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::plugin_system::assets::{
    CompositeAssetResolver, LocalDirectoryResolver, PackageCacheResolver,
    ReferenceDirectoryResolver,
};
use crate::plugin_system::dependency::DependencyIndex;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::host::{platform_module_file_name, ModuleHost, PluginModule};

/// Whether `path` names a module called `requested`: the file stem matches
/// case-insensitively, with or without the platform library prefix.
fn stem_matches(path: &Path, requested: &str) -> bool {
    let stem = match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem,
        None => return false,
    };
    let prefixed = format!("{}{}", std::env::consts::DLL_PREFIX, requested);
    stem.eq_ignore_ascii_case(requested) || stem.eq_ignore_ascii_case(&prefixed)
}

fn has_module_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(std::env::consts::DLL_EXTENSION))
}

/// One step in the module resolution chain. The chain is an explicit,
/// ordered list tried in sequence; first match wins.
#[derive(Debug, Clone)]
pub enum ModuleLocator {
    /// Explicit, user-declared module locations, matched by base name
    /// before any directory is scanned.
    ReferencePaths(Vec<PathBuf>),
    /// Directories scanned non-recursively for a file named after the
    /// requested module with the platform module extension.
    SearchDirectories(Vec<PathBuf>),
}

impl ModuleLocator {
    pub fn locate(&self, requested: &str) -> Option<PathBuf> {
        match self {
            ModuleLocator::ReferencePaths(paths) => paths
                .iter()
                .find(|path| stem_matches(path, requested))
                .cloned(),
            ModuleLocator::SearchDirectories(directories) => {
                for directory in directories {
                    let entries = match fs::read_dir(directory) {
                        Ok(entries) => entries,
                        Err(e) => {
                            log::debug!(
                                "skipping search directory '{}': {}",
                                directory.display(),
                                e
                            );
                            continue;
                        }
                    };
                    for entry in entries.flatten() {
                        let path = entry.path();
                        if path.is_file()
                            && has_module_extension(&path)
                            && stem_matches(&path, requested)
                        {
                            return Some(path);
                        }
                    }
                }
                None
            }
        }
    }
}

/// Configuration for one resolver instance. The reference path list and
/// search directory list are required; an empty list is valid.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Explicit module locations, checked before any directory scan
    pub reference_paths: Vec<PathBuf>,
    /// Directories scanned (non-recursively) for module files
    pub search_paths: Vec<PathBuf>,
    /// Root of an installed-package cache, if one is configured
    pub package_cache: Option<PathBuf>,
}

/// Resolves requested plugin names to on-disk modules, loads each module at
/// most once, and merges every loaded module's declared dependencies into a
/// running index used to satisfy transitive references.
///
/// One resolver is constructed per driver invocation; there is no ambient
/// shared state. The load cache is keyed by resolved path (canonicalized
/// when possible), since the same logical name can resolve to different
/// paths under different search roots. System-fallback loads are keyed
/// under the platform file name handed to the loader.
#[derive(Debug)]
pub struct PluginResolver {
    locators: Vec<ModuleLocator>,
    host: Arc<dyn ModuleHost>,
    cache: HashMap<PathBuf, Arc<dyn PluginModule>>,
    index: DependencyIndex,
    assets: CompositeAssetResolver,
    directories_with_resolver: HashSet<PathBuf>,
}

impl PluginResolver {
    pub fn new(config: ResolverConfig, host: Arc<dyn ModuleHost>) -> Self {
        let mut reference_directories: Vec<PathBuf> = Vec::new();
        for path in &config.reference_paths {
            if let Some(parent) = path.parent() {
                let parent = parent.to_path_buf();
                if !reference_directories.contains(&parent) {
                    reference_directories.push(parent);
                }
            }
        }

        let mut resolvers: Vec<Box<dyn crate::plugin_system::assets::AssetPathResolver>> =
            vec![Box::new(ReferenceDirectoryResolver::new(reference_directories))];
        if let Some(root) = &config.package_cache {
            resolvers.push(Box::new(PackageCacheResolver::new(root.clone())));
        }

        Self {
            locators: vec![
                ModuleLocator::ReferencePaths(config.reference_paths),
                ModuleLocator::SearchDirectories(config.search_paths),
            ],
            host,
            cache: HashMap::new(),
            index: DependencyIndex::new(),
            assets: CompositeAssetResolver::new(resolvers),
            directories_with_resolver: HashSet::new(),
        }
    }

    /// The resolution strategy chain, in the order it is applied.
    pub fn locators(&self) -> &[ModuleLocator] {
        &self.locators
    }

    /// The running dependency index, merged from every module loaded so far.
    pub fn dependency_index(&self) -> &DependencyIndex {
        &self.index
    }

    /// Number of modules loaded (and cached) by this resolver.
    pub fn loaded_count(&self) -> usize {
        self.cache.len()
    }

    fn reference_paths(&self) -> Vec<PathBuf> {
        self.locators
            .iter()
            .filter_map(|l| match l {
                ModuleLocator::ReferencePaths(paths) => Some(paths.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn search_paths(&self) -> Vec<PathBuf> {
        self.locators
            .iter()
            .filter_map(|l| match l {
                ModuleLocator::SearchDirectories(paths) => Some(paths.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn resolution_failed(&self, requested: &str) -> PluginSystemError {
        PluginSystemError::ResolutionFailed {
            requested: requested.to_string(),
            reference_paths: self.reference_paths(),
            search_paths: self.search_paths(),
        }
    }

    /// Resolve `requested` through the locator chain, falling back to the
    /// host runtime's own lookup, and load the result through the cache.
    /// Repeated requests for the same resolved module return the cached
    /// handle without re-loading or re-scanning.
    pub fn load_plugin(
        &mut self,
        requested: &str,
    ) -> Result<Arc<dyn PluginModule>, PluginSystemError> {
        let located = self.locators.iter().find_map(|l| l.locate(requested));
        if let Some(path) = located {
            return self.load_path(&path);
        }

        // System/global fallback: let the platform loader search its own
        // default locations.
        let key = PathBuf::from(platform_module_file_name(requested));
        if let Some(module) = self.cache.get(&key) {
            return Ok(Arc::clone(module));
        }
        match self.host.load_by_name(requested) {
            Ok(module) => {
                self.register_loaded(key, Arc::clone(&module));
                Ok(module)
            }
            Err(e) => {
                log::debug!("system fallback failed for '{}': {}", requested, e);
                Err(self.resolution_failed(requested))
            }
        }
    }

    /// Load the module at `path` exactly once per resolver. On first load
    /// the module's dependency manifest (if any) is merged into the index
    /// and a local-directory asset strategy is absorbed for the module's
    /// base directory when that directory is new.
    pub fn load_path(
        &mut self,
        path: &Path,
    ) -> Result<Arc<dyn PluginModule>, PluginSystemError> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some(module) = self.cache.get(&key) {
            return Ok(Arc::clone(module));
        }

        let module = self.host.load(path)?;
        self.register_loaded(key, Arc::clone(&module));
        Ok(module)
    }

    fn register_loaded(&mut self, key: PathBuf, module: Arc<dyn PluginModule>) {
        if let Some(manifest) = module.dependency_manifest() {
            self.index.merge_manifest(manifest);
        }
        if let Some(base) = key.parent().filter(|p| !p.as_os_str().is_empty()) {
            if self.directories_with_resolver.insert(base.to_path_buf()) {
                self.assets
                    .absorb(Box::new(LocalDirectoryResolver::new(base.to_path_buf())));
            }
        }
        self.cache.insert(key, module);
    }

    /// Satisfy a reference the host loader could not resolve itself,
    /// typically a transitive dependency of an already-loaded module.
    ///
    /// Tiers, in order: (a) the dependency index, matched by declared name
    /// or any declared asset base name, first record in iteration order;
    /// (b) the composite asset resolver's candidates for the matched
    /// record, first loadable candidate wins; (c) only when no record
    /// matched, a flat base-name scan of the reference path list;
    /// (d) unresolved, `Ok(None)`.
    pub fn resolve_dependency(
        &mut self,
        requested: &str,
    ) -> Result<Option<Arc<dyn PluginModule>>, PluginSystemError> {
        let (record_matched, candidates): (bool, Vec<PathBuf>) =
            match self.index.find(requested) {
                Some(record) => (true, self.assets.resolve(record)),
                None => (false, Vec::new()),
            };

        for candidate in &candidates {
            match self.load_path(candidate) {
                Ok(module) => return Ok(Some(module)),
                Err(e) => {
                    log::debug!(
                        "candidate '{}' for '{}' failed to load: {}",
                        candidate.display(),
                        requested,
                        e
                    );
                }
            }
        }

        // A matched record is authoritative: when none of its candidates
        // loaded, the reference is unresolved. Simple single-file plugins
        // frequently declare no manifest at all; only those fall back to
        // the flat reference-path scan.
        if record_matched {
            return Ok(None);
        }
        let fallback = self
            .reference_paths()
            .into_iter()
            .find(|path| stem_matches(path, requested));
        match fallback {
            Some(path) => self.load_path(&path).map(Some),
            None => Ok(None),
        }
    }
}
