//! Dependency manifests declared by plugin modules.
//!
//! A module may ship a sidecar file `<stem>.deps.json` next to the module
//! itself, declaring the runtime units its generators rely on. Simple
//! single-file plugins frequently have no manifest at all; that is a normal
//! state, not an error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEPENDENCY_MANIFEST_SUFFIX;
use crate::plugin_system::error::PluginSystemError;

/// One resolvable unit in a module's dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Declared unit name, matched case-insensitively during resolution
    pub name: String,

    /// Opaque version label, used only for package-cache path layout
    #[serde(default)]
    pub version: String,

    /// Content hash, if the packaging pipeline recorded one
    #[serde(default)]
    pub content_hash: Option<String>,

    /// Candidate asset paths, relative to whichever base a resolution
    /// strategy supplies; order is preserved
    #[serde(default)]
    pub asset_paths: Vec<String>,

    /// Names of further records this unit depends on
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Whether the unit can be serviced from a package cache
    #[serde(default)]
    pub serviceable: bool,
}

impl DependencyRecord {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            content_hash: None,
            asset_paths: Vec::new(),
            dependencies: Vec::new(),
            serviceable: false,
        }
    }

    /// Base file names of the declared assets.
    pub fn asset_base_names(&self) -> impl Iterator<Item = &str> {
        self.asset_paths
            .iter()
            .filter_map(|asset| Path::new(asset).file_name().and_then(|n| n.to_str()))
    }
}

/// The full manifest declared by one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    #[serde(default)]
    pub libraries: Vec<DependencyRecord>,
}

impl DependencyManifest {
    /// Path of the manifest sidecar for a module at `module_path`:
    /// `<directory>/<stem>.deps.json`.
    pub fn sidecar_path(module_path: &Path) -> Option<PathBuf> {
        let stem = module_path.file_stem()?.to_str()?;
        Some(
            module_path
                .with_file_name(format!("{}{}", stem, DEPENDENCY_MANIFEST_SUFFIX)),
        )
    }

    /// Read and parse the sidecar manifest for `module_path`. Returns
    /// `Ok(None)` when the module declares no manifest.
    pub fn load_for_module(module_path: &Path) -> Result<Option<Self>, PluginSystemError> {
        let sidecar = match Self::sidecar_path(module_path) {
            Some(path) if path.is_file() => path,
            _ => return Ok(None),
        };
        let contents = fs::read_to_string(&sidecar).map_err(|e| PluginSystemError::ManifestError {
            path: sidecar.clone(),
            message: "failed to read manifest".to_string(),
            source: Some(Box::new(e)),
        })?;
        let manifest: DependencyManifest =
            serde_json::from_str(&contents).map_err(|e| PluginSystemError::ManifestError {
                path: sidecar.clone(),
                message: "failed to parse manifest".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(Some(manifest))
    }
}
