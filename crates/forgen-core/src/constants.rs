/// Tool name, used as the diagnostic line prefix
pub const TOOL_NAME: &str = "forgen";

/// Tool version
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default registry file for located plugin modules
pub const MODULE_REGISTRY_FILE_NAME: &str = "forgen.modules.json";

/// Default registry file for generated-artifact entries
pub const GENERATION_REGISTRY_FILE_NAME: &str = "forgen.generated.json";

/// Infix placed between the asset key and the artifact extension
pub const GENERATED_INFIX: &str = ".g.";

/// Default generated-artifact file extension
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "rs";

/// Sidecar suffix for a module's dependency manifest, appended to the
/// module file stem: `<stem>.deps.json`
pub const DEPENDENCY_MANIFEST_SUFFIX: &str = ".deps.json";

/// Entry-point symbol every generator module must export
pub const GENERATOR_ENTRY_SYMBOL: &[u8] = b"forgen_generator_create\0";

/// Default preamble emitted at the top of every generated file
pub const DEFAULT_PREAMBLE: &str = "\
// <auto-generated>
//     This code was generated by forgen.
//     Changes to this file may cause incorrect behavior and will be lost
//     if the code is regenerated.
// </auto-generated>
";

/// Message printed when neither source files nor generators are supplied
pub const NO_INPUTS_MESSAGE: &str = "No source files are specified.";

/// Diagnostic code: no inputs specified
pub const CODE_NO_INPUTS: &str = "CG0001";

/// Diagnostic code: plugin resolution failure
pub const CODE_RESOLUTION_FAILED: &str = "CG0100";

/// Diagnostic code: generation failure for one source unit
pub const CODE_GENERATION_FAILED: &str = "CG0200";

/// Diagnostic code: registry persistence failure
pub const CODE_REGISTRY_SAVE_FAILED: &str = "CG0300";
