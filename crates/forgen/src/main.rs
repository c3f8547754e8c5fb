use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::builder::TypedValueParser as _;
use clap::Parser;
use log::debug;

use forgen_core::constants::{TOOL_NAME, TOOL_VERSION};
use forgen_core::{
    DiagnosticLogger, DriverConfig, Error, GenerationDriver, LibraryModuleHost, ResolverConfig,
};

/// forgen: build-time code-generation driver
#[derive(Parser, Debug)]
#[command(name = "forgen", about, disable_version_flag = true)]
struct CliArgs {
    /// Source files to generate from
    #[arg(value_name = "SOURCE")]
    sources: Vec<PathBuf>,

    /// Generator plugin name (repeatable)
    #[arg(short = 'g', long = "generator", value_name = "NAME")]
    generators: Vec<String>,

    /// Explicit plugin module location, checked before any directory scan
    /// (repeatable)
    #[arg(short = 'r', long = "reference", value_name = "PATH")]
    references: Vec<PathBuf>,

    /// Directory scanned (non-recursively) for plugin modules (repeatable)
    #[arg(short = 's', long = "search-path", value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// Output directory for generated artifacts and registry files
    // clap's built-in PathBuf parser rejects the empty default, so parse via
    // OsString instead.
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = "",
          value_parser = clap::builder::OsStringValueParser::new().map(PathBuf::from))]
    output: PathBuf,

    /// Root of an installed-package cache used for dependency resolution
    #[arg(long = "packages", value_name = "DIR")]
    packages: Option<PathBuf>,

    /// Response file listing every generated artifact path, one per line
    #[arg(long = "response", value_name = "FILE")]
    response: Option<PathBuf>,

    /// File whose contents replace the default generated-file preamble
    #[arg(long = "preamble-file", value_name = "FILE")]
    preamble_file: Option<PathBuf>,

    /// Emit a trailing newline after each generated unit
    #[arg(long = "trailing-newline")]
    trailing_newline: bool,

    /// Extension of emitted artifacts (default: rs)
    #[arg(long = "extension", value_name = "EXT")]
    extension: Option<String>,

    /// Print tool version and exit
    #[arg(long = "version")]
    version: bool,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let mut logger = DiagnosticLogger::stdout();

    if args.version {
        logger.information(&format!("{} {}", TOOL_NAME, TOOL_VERSION));
        // Version queries complete with a non-zero code so the build does
        // not mistake them for a generation run.
        return ExitCode::from(1);
    }

    let preamble = match args.preamble_file {
        Some(path) => match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                logger.error(
                    &format!("Failed to read preamble file '{}': {}", path.display(), e),
                    forgen_core::constants::CODE_GENERATION_FAILED,
                );
                return ExitCode::from(1);
            }
        },
        None => None,
    };

    let mut config = DriverConfig {
        output_directory: args.output,
        source_files: args.sources,
        generator_names: args.generators,
        resolver: ResolverConfig {
            reference_paths: args.references,
            search_paths: args.search_paths,
            package_cache: args.packages,
        },
        preamble,
        include_trailing_newline: args.trailing_newline,
        ..DriverConfig::default()
    };
    if let Some(extension) = args.extension {
        config.artifact_extension = extension;
    }

    let host = Arc::new(LibraryModuleHost::new());
    let mut driver = GenerationDriver::new(config, host, logger);

    let summary = match driver.run() {
        Ok(summary) => summary,
        Err(Error::NoInputs) => return ExitCode::from(1),
        Err(e) => {
            let code = match &e {
                Error::Registry(_) => forgen_core::constants::CODE_REGISTRY_SAVE_FAILED,
                _ => forgen_core::constants::CODE_GENERATION_FAILED,
            };
            driver.logger().error(&e.to_string(), code);
            return ExitCode::from(1);
        }
    };
    debug!(
        "run summary: {} generated, {} skipped, {} failed",
        summary.generated, summary.skipped, summary.failed
    );

    // Response surface for the host build system: exactly the registry's
    // artifact path list, one per line.
    if let Some(response_path) = args.response {
        let mut contents = summary
            .artifact_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        contents.push('\n');
        if let Err(e) = fs::write(&response_path, contents) {
            driver.logger().error(
                &format!(
                    "Failed to write response file '{}': {}",
                    response_path.display(),
                    e
                ),
                forgen_core::constants::CODE_REGISTRY_SAVE_FAILED,
            );
            return ExitCode::from(1);
        }
    }

    if summary.failed > 0 {
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
