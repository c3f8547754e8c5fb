//! Drives one code-generation run end to end.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::constants::{
    CODE_GENERATION_FAILED, CODE_NO_INPUTS, CODE_RESOLUTION_FAILED, DEFAULT_ARTIFACT_EXTENSION,
    GENERATION_REGISTRY_FILE_NAME, MODULE_REGISTRY_FILE_NAME, NO_INPUTS_MESSAGE,
};
use crate::error::{Error, Result};
use crate::generator::descriptor::GeneratorDescriptor;
use crate::generator::traits::{CodeGenerator, SourceUnit};
use crate::logging::{DiagnosticLogger, Severity};
use crate::plugin_system::host::ModuleHost;
use crate::plugin_system::resolver::{PluginResolver, ResolverConfig};
use crate::registry::generation::{GeneratedEntry, GenerationRegistry};
use crate::registry::module::ModuleRegistry;

/// Configuration for one driver invocation.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Directory generated artifacts and registry files are written to
    pub output_directory: PathBuf,
    /// Source inputs, generated from in command-line order
    pub source_files: Vec<PathBuf>,
    /// Requested generator plugin names
    pub generator_names: Vec<String>,
    /// Plugin resolution configuration
    pub resolver: ResolverConfig,
    /// Extension of emitted artifacts (`<key>.g.<extension>`)
    pub artifact_extension: String,
    pub module_registry_file_name: String,
    pub generation_registry_file_name: String,
    /// Preamble override; `None` keeps the canned default
    pub preamble: Option<String>,
    pub include_trailing_newline: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::new(),
            source_files: Vec::new(),
            generator_names: Vec::new(),
            resolver: ResolverConfig::default(),
            artifact_extension: DEFAULT_ARTIFACT_EXTENSION.to_string(),
            module_registry_file_name: MODULE_REGISTRY_FILE_NAME.to_string(),
            generation_registry_file_name: GENERATION_REGISTRY_FILE_NAME.to_string(),
            preamble: None,
            include_trailing_newline: false,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Source units regenerated this run
    pub generated: usize,
    /// Source units skipped because their registry entry was fresh
    pub skipped: usize,
    /// Source units whose generation was aborted
    pub failed: usize,
    /// Every artifact path recorded in the registry after the run; this is
    /// the list the build-system response surface consumes
    pub artifact_paths: Vec<PathBuf>,
}

/// Owns the resolver, the registries, and the logger for the lifetime of
/// one invocation and runs generation over every source unit.
///
/// Failures isolate: a plugin that resolves to nothing is skipped with an
/// Error diagnostic and the run continues; a generator failure aborts the
/// current source unit only. Registry save failures are fatal.
pub struct GenerationDriver {
    config: DriverConfig,
    resolver: PluginResolver,
    modules: ModuleRegistry,
    generation: GenerationRegistry,
    logger: DiagnosticLogger,
}

impl GenerationDriver {
    pub fn new(config: DriverConfig, host: Arc<dyn ModuleHost>, logger: DiagnosticLogger) -> Self {
        let resolver = PluginResolver::new(config.resolver.clone(), host);
        let modules = ModuleRegistry::new(
            &config.output_directory,
            &config.module_registry_file_name,
        );
        let generation = GenerationRegistry::new(
            &config.output_directory,
            &config.generation_registry_file_name,
        );
        Self {
            config,
            resolver,
            modules,
            generation,
            logger,
        }
    }

    pub fn logger(&mut self) -> &mut DiagnosticLogger {
        &mut self.logger
    }

    pub fn generation_registry(&self) -> &GenerationRegistry {
        &self.generation
    }

    /// Run generation. Returns `Error::NoInputs` (after an Information
    /// diagnostic, without touching any registry file) when neither source
    /// files nor generator names were supplied.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.config.source_files.is_empty() && self.config.generator_names.is_empty() {
            self.logger
                .log(Severity::Information, NO_INPUTS_MESSAGE, Some(CODE_NO_INPUTS));
            return Err(Error::NoInputs);
        }
        if self.config.output_directory.as_os_str().is_empty() {
            return Err(Error::Config(
                "an output directory is required".to_string(),
            ));
        }

        self.modules.load()?;
        self.generation.load()?;
        self.modules.purge_not_exists()?;
        self.generation.purge_not_exists()?;

        let generators = self.resolve_generators()?;

        let mut summary = RunSummary::default();
        let sources = self.config.source_files.clone();
        for source_path in &sources {
            match self.generate_for_source(source_path, &generators) {
                Ok(SourceOutcome::Generated) => summary.generated += 1,
                Ok(SourceOutcome::Fresh) => summary.skipped += 1,
                Err(e) => {
                    // Abort this source unit's generation, not the run.
                    self.logger.error(&e.to_string(), CODE_GENERATION_FAILED);
                    summary.failed += 1;
                }
            }
        }

        // Save failures are fatal; the caller maps them to the failing
        // exit code after logging.
        self.generation.save()?;
        summary.artifact_paths = self
            .generation
            .artifact_paths(&self.config.artifact_extension);
        log::info!(
            "generation finished: {} generated, {} fresh, {} failed",
            summary.generated,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// Resolve and instantiate every requested generator. Resolution misses
    /// are recoverable per plugin: logged at Error level and skipped. A
    /// module-registry save failure is fatal and propagates.
    fn resolve_generators(&mut self) -> Result<Vec<(String, Box<dyn CodeGenerator>)>> {
        let mut generators = Vec::new();
        let names = self.config.generator_names.clone();
        for name in names {
            let module = match self.resolver.load_plugin(&name) {
                Ok(module) => module,
                Err(e) => {
                    self.logger.error(&e.to_string(), CODE_RESOLUTION_FAILED);
                    continue;
                }
            };
            self.modules.register(module.path());
            match module.instantiate() {
                Ok(generator) => generators.push((name, generator)),
                Err(e) => {
                    self.logger.error(&e.to_string(), CODE_RESOLUTION_FAILED);
                }
            }
        }
        if !self.modules.is_empty() {
            self.modules.save()?;
        }
        Ok(generators)
    }

    fn generate_for_source(
        &mut self,
        source_path: &PathBuf,
        generators: &[(String, Box<dyn CodeGenerator>)],
    ) -> Result<SourceOutcome> {
        let extension = self.config.artifact_extension.clone();
        if let Some(entry) = self.generation.entry(source_path) {
            if !self.generation.is_stale(entry, &extension) {
                log::debug!("'{}' is up to date", source_path.display());
                return Ok(SourceOutcome::Fresh);
            }
        }

        let text = fs::read_to_string(source_path).map_err(|source| {
            crate::generator::error::GeneratorError::SourceRead {
                path: source_path.clone(),
                source,
            }
        })?;
        let source = SourceUnit::new(source_path.clone(), text);

        let mut descriptor = GeneratorDescriptor::new()
            .with_trailing_newline(self.config.include_trailing_newline);
        if let Some(preamble) = &self.config.preamble {
            descriptor = descriptor.with_preamble(preamble.clone());
        }

        for (name, generator) in generators {
            generator.generate(&source, &mut descriptor).map_err(|e| {
                crate::generator::error::GeneratorError::GenerationFailed {
                    generator: name.clone(),
                    source_file: source_path.clone(),
                    message: e.to_string(),
                }
            })?;
        }

        let entry = self.emit_artifacts(&source, &descriptor)?;
        self.generation.upsert(entry);
        Ok(SourceOutcome::Generated)
    }

    /// Write every accumulated unit to the output directory and build the
    /// registry entry whose asset keys correspond 1:1 with the files
    /// written.
    fn emit_artifacts(
        &mut self,
        source: &SourceUnit,
        descriptor: &GeneratorDescriptor,
    ) -> Result<GeneratedEntry> {
        let output_directory = self.config.output_directory.clone();
        if !output_directory.is_dir() {
            fs::create_dir_all(&output_directory).map_err(|e| {
                crate::generator::error::GeneratorError::ArtifactWrite {
                    path: output_directory.clone(),
                    source: e,
                }
            })?;
        }

        let mut keys: Vec<String> = Vec::new();
        let mut entry = GeneratedEntry::new(source.path.clone(), Vec::new(), output_directory);
        for (ordinal, unit) in descriptor.generated_units.iter().enumerate() {
            let mut key = unit
                .name
                .clone()
                .unwrap_or_else(|| format!("{}_g{}", source.stem(), ordinal));
            // Keys must stay unique within one entry.
            while keys.contains(&key) {
                key.push_str("_dup");
            }
            let artifact_path = entry.asset_path(&key, &self.config.artifact_extension);
            fs::write(&artifact_path, descriptor.render_unit(unit)).map_err(|e| {
                crate::generator::error::GeneratorError::ArtifactWrite {
                    path: artifact_path.clone(),
                    source: e,
                }
            })?;
            keys.push(key);
        }
        entry.generated_asset_keys = keys;
        Ok(entry)
    }
}

enum SourceOutcome {
    Generated,
    Fresh,
}
