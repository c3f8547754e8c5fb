use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use crate::constants::{
    CODE_GENERATION_FAILED, CODE_NO_INPUTS, CODE_RESOLUTION_FAILED, DEFAULT_PREAMBLE,
    GENERATION_REGISTRY_FILE_NAME, MODULE_REGISTRY_FILE_NAME, NO_INPUTS_MESSAGE,
};
use crate::error::Error;
use crate::generator::descriptor::GeneratorDescriptor;
use crate::generator::driver::{DriverConfig, GenerationDriver};
use crate::generator::error::GeneratorError;
use crate::generator::traits::{CodeGenerator, GeneratedUnit, SourceUnit};
use crate::logging::{DiagnosticLogger, Severity};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::host::{platform_module_file_name, ModuleHost, PluginModule};
use crate::plugin_system::manifest::DependencyManifest;
use crate::plugin_system::resolver::ResolverConfig;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Emits one named and one anonymous unit per source.
#[derive(Debug)]
struct SplittingGenerator;

impl CodeGenerator for SplittingGenerator {
    fn name(&self) -> &str {
        "splitter"
    }

    fn generate(
        &self,
        source: &SourceUnit,
        descriptor: &mut GeneratorDescriptor,
    ) -> Result<(), GeneratorError> {
        descriptor.push(GeneratedUnit::named(
            "types",
            format!("// types for {}\n", source.stem()),
        ));
        descriptor.push(GeneratedUnit::new("// extras\n"));
        Ok(())
    }
}

/// Fails for any source whose text contains "boom".
#[derive(Debug)]
struct BoomGenerator;

impl CodeGenerator for BoomGenerator {
    fn name(&self) -> &str {
        "boom"
    }

    fn generate(
        &self,
        source: &SourceUnit,
        descriptor: &mut GeneratorDescriptor,
    ) -> Result<(), GeneratorError> {
        if source.text.contains("boom") {
            return Err(GeneratorError::GenerationFailed {
                generator: self.name().to_string(),
                source_file: source.path.clone(),
                message: "refused".to_string(),
            });
        }
        descriptor.push(GeneratedUnit::new("// ok\n"));
        Ok(())
    }
}

/// Emits two units that claim the same name.
#[derive(Debug)]
struct CollidingGenerator;

impl CodeGenerator for CollidingGenerator {
    fn name(&self) -> &str {
        "collider"
    }

    fn generate(
        &self,
        _source: &SourceUnit,
        descriptor: &mut GeneratorDescriptor,
    ) -> Result<(), GeneratorError> {
        descriptor.push(GeneratedUnit::named("same", "// first\n"));
        descriptor.push(GeneratedUnit::named("same", "// second\n"));
        Ok(())
    }
}

type GeneratorFactory = fn() -> Box<dyn CodeGenerator>;

#[derive(Debug)]
struct FixtureModule {
    path: PathBuf,
    factory: GeneratorFactory,
}

impl PluginModule for FixtureModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn dependency_manifest(&self) -> Option<&DependencyManifest> {
        None
    }

    fn instantiate(&self) -> Result<Box<dyn CodeGenerator>, PluginSystemError> {
        Ok((self.factory)())
    }
}

/// Host that maps module file stems to in-process generator factories.
#[derive(Debug, Default)]
struct FixtureHost {
    factories: HashMap<String, GeneratorFactory>,
}

impl FixtureHost {
    fn with(name: &str, factory: GeneratorFactory) -> Self {
        let mut factories = HashMap::new();
        factories.insert(name.to_string(), factory);
        Self { factories }
    }
}

impl ModuleHost for FixtureHost {
    fn load(&self, path: &Path) -> Result<Arc<dyn PluginModule>, PluginSystemError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .trim_start_matches(std::env::consts::DLL_PREFIX)
            .to_string();
        match self.factories.get(&stem) {
            Some(factory) => Ok(Arc::new(FixtureModule {
                path: path.to_path_buf(),
                factory: *factory,
            })),
            None => Err(PluginSystemError::LoadingError {
                module: stem,
                path: Some(path.to_path_buf()),
                message: "unknown fixture module".to_string(),
            }),
        }
    }

    fn load_by_name(&self, name: &str) -> Result<Arc<dyn PluginModule>, PluginSystemError> {
        Err(PluginSystemError::LoadingError {
            module: name.to_string(),
            path: None,
            message: "fixture host has no system loader".to_string(),
        })
    }
}

fn write_module(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(platform_module_file_name(name));
    fs::write(&path, b"module").expect("Failed to write module file");
    path
}

fn write_source(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("Failed to write source file");
    path
}

fn buffered_logger() -> (DiagnosticLogger, SharedBuffer) {
    let buffer = SharedBuffer::default();
    (DiagnosticLogger::new(Box::new(buffer.clone())), buffer)
}

fn driver_for(
    output_directory: PathBuf,
    source_files: Vec<PathBuf>,
    generator_names: Vec<&str>,
    reference_paths: Vec<PathBuf>,
    host: Arc<dyn ModuleHost>,
) -> (GenerationDriver, SharedBuffer) {
    let (logger, buffer) = buffered_logger();
    let config = DriverConfig {
        output_directory,
        source_files,
        generator_names: generator_names.iter().map(|n| n.to_string()).collect(),
        resolver: ResolverConfig {
            reference_paths,
            search_paths: Vec::new(),
            package_cache: None,
        },
        ..Default::default()
    };
    (GenerationDriver::new(config, host, logger), buffer)
}

#[test]
fn test_run_without_inputs_reports_and_touches_nothing() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out");

    let (mut driver, buffer) = driver_for(
        output.clone(),
        vec![],
        vec![],
        vec![],
        Arc::new(FixtureHost::default()),
    );
    let result = driver.run();

    assert!(matches!(result, Err(Error::NoInputs)));
    assert_eq!(buffer.contents(), format!("{}\n", NO_INPUTS_MESSAGE));
    assert!(!output.join(MODULE_REGISTRY_FILE_NAME).exists());
    assert!(!output.join(GENERATION_REGISTRY_FILE_NAME).exists());
}

#[test]
fn test_no_inputs_diagnostic_carries_its_code() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let buffer = SharedBuffer::default();
    let mut logger = DiagnosticLogger::new(Box::new(buffer.clone()));
    logger.set_callback(
        Severity::Information,
        Box::new(|writer, _level, line, code| {
            let _ = writeln!(writer, "[{}] {}", code.unwrap_or(""), line);
        }),
    );

    let config = DriverConfig {
        output_directory: temp_dir.path().join("out"),
        ..Default::default()
    };
    let mut driver = GenerationDriver::new(config, Arc::new(FixtureHost::default()), logger);

    assert!(matches!(driver.run(), Err(Error::NoInputs)));
    assert_eq!(
        buffer.contents(),
        format!("[{}] {}\n", CODE_NO_INPUTS, NO_INPUTS_MESSAGE)
    );
}

#[test]
fn test_run_requires_an_output_directory() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let source = write_source(temp_dir.path(), "widget.in", "struct Widget;");

    let (mut driver, _buffer) = driver_for(
        PathBuf::new(),
        vec![source],
        vec![],
        vec![],
        Arc::new(FixtureHost::default()),
    );
    assert!(matches!(driver.run(), Err(Error::Config(_))));
}

#[test]
fn test_run_writes_artifacts_and_registries() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out");
    let module = write_module(temp_dir.path(), "splitter");
    let source = write_source(temp_dir.path(), "widget.in", "struct Widget;");
    let host = Arc::new(FixtureHost::with("splitter", || Box::new(SplittingGenerator)));

    let (mut driver, _buffer) = driver_for(
        output.clone(),
        vec![source.clone()],
        vec!["splitter"],
        vec![module],
        host,
    );
    let summary = driver.run().expect("run should succeed");

    assert_eq!(summary.generated, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 0);

    let named = output.join("types.g.rs");
    let anonymous = output.join("widget_g1.g.rs");
    assert!(named.is_file());
    assert!(anonymous.is_file());
    let text = fs::read_to_string(&named).expect("Failed to read artifact");
    assert!(text.starts_with(DEFAULT_PREAMBLE));
    assert!(text.contains("// types for widget"));

    assert!(output.join(MODULE_REGISTRY_FILE_NAME).is_file());
    assert!(output.join(GENERATION_REGISTRY_FILE_NAME).is_file());

    let entry = driver
        .generation_registry()
        .entry(&source)
        .expect("entry should be recorded");
    assert_eq!(entry.generated_asset_keys, vec!["types", "widget_g1"]);

    assert!(summary.artifact_paths.contains(&named));
    assert!(summary.artifact_paths.contains(&anonymous));
}

#[test]
fn test_module_registry_save_failure_is_fatal() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out");
    // A directory squatting on the registry path makes the save fail.
    fs::create_dir_all(output.join(MODULE_REGISTRY_FILE_NAME))
        .expect("Failed to create blocking directory");
    let module = write_module(temp_dir.path(), "splitter");
    let source = write_source(temp_dir.path(), "widget.in", "struct Widget;");
    let host = Arc::new(FixtureHost::with("splitter", || Box::new(SplittingGenerator)));

    let (mut driver, _buffer) = driver_for(
        output,
        vec![source],
        vec!["splitter"],
        vec![module],
        host,
    );
    assert!(matches!(driver.run(), Err(Error::Registry(_))));
}

#[test]
fn test_second_run_skips_fresh_sources() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out");
    let module = write_module(temp_dir.path(), "splitter");
    let source = write_source(temp_dir.path(), "widget.in", "struct Widget;");

    let (mut first, _buffer) = driver_for(
        output.clone(),
        vec![source.clone()],
        vec!["splitter"],
        vec![module.clone()],
        Arc::new(FixtureHost::with("splitter", || Box::new(SplittingGenerator))),
    );
    first.run().expect("first run should succeed");

    // A fresh driver reloads its state from the persisted registries.
    let (mut second, _buffer) = driver_for(
        output,
        vec![source],
        vec!["splitter"],
        vec![module],
        Arc::new(FixtureHost::with("splitter", || Box::new(SplittingGenerator))),
    );
    let summary = second.run().expect("second run should succeed");
    assert_eq!(summary.generated, 0);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn test_generator_failure_aborts_one_source_not_the_run() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out");
    let module = write_module(temp_dir.path(), "boom");
    let good = write_source(temp_dir.path(), "good.in", "struct Good;");
    let bad = write_source(temp_dir.path(), "bad.in", "boom");
    let host = Arc::new(FixtureHost::with("boom", || Box::new(BoomGenerator)));

    let (mut driver, buffer) = driver_for(
        output,
        vec![good.clone(), bad.clone()],
        vec!["boom"],
        vec![module],
        host,
    );
    let summary = driver.run().expect("run should still succeed");

    assert_eq!(summary.generated, 1);
    assert_eq!(summary.failed, 1);
    assert!(buffer.contents().contains(CODE_GENERATION_FAILED));
    assert!(driver.generation_registry().entry(&good).is_some());
    assert!(driver.generation_registry().entry(&bad).is_none());
}

#[test]
fn test_unresolvable_generator_is_logged_and_skipped() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out");
    let source = write_source(temp_dir.path(), "widget.in", "struct Widget;");

    let (mut driver, buffer) = driver_for(
        output,
        vec![source],
        vec!["ghost"],
        vec![],
        Arc::new(FixtureHost::default()),
    );
    let summary = driver.run().expect("run should still succeed");

    assert!(buffer.contents().contains(CODE_RESOLUTION_FAILED));
    assert!(buffer.contents().contains("ghost"));
    assert_eq!(summary.failed, 0);
}

#[test]
fn test_colliding_unit_names_are_disambiguated() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out");
    let module = write_module(temp_dir.path(), "collider");
    let source = write_source(temp_dir.path(), "widget.in", "struct Widget;");
    let host = Arc::new(FixtureHost::with("collider", || Box::new(CollidingGenerator)));

    let (mut driver, _buffer) = driver_for(
        output.clone(),
        vec![source.clone()],
        vec!["collider"],
        vec![module],
        host,
    );
    driver.run().expect("run should succeed");

    let entry = driver
        .generation_registry()
        .entry(&source)
        .expect("entry should be recorded");
    assert_eq!(entry.generated_asset_keys, vec!["same", "same_dup"]);
    assert!(output.join("same.g.rs").is_file());
    assert!(output.join("same_dup.g.rs").is_file());
}
