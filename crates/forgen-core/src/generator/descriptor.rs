//! Per-invocation accumulator for generated units and formatting options.

use crate::constants::DEFAULT_PREAMBLE;
use crate::generator::traits::GeneratedUnit;

/// Platform line ending used when emitting generated text.
#[cfg(windows)]
const NATIVE_LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const NATIVE_LINE_ENDING: &str = "\n";

/// Carries one invocation's accumulated generated units plus the generation
/// preamble and formatting options. Passed by reference to every generator
/// invoked for one source unit; not persisted.
#[derive(Debug, Clone)]
pub struct GeneratorDescriptor {
    preamble_text: String,
    /// Ordered units generators append to
    pub generated_units: Vec<GeneratedUnit>,
    include_trailing_newline: bool,
}

impl Default for GeneratorDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorDescriptor {
    /// Descriptor with the canned default preamble and no trailing newline.
    pub fn new() -> Self {
        Self {
            preamble_text: DEFAULT_PREAMBLE.to_string(),
            generated_units: Vec::new(),
            include_trailing_newline: false,
        }
    }

    /// Override the default preamble.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble_text = preamble.into();
        self
    }

    /// Toggle emission of a trailing newline after each generated unit.
    pub fn with_trailing_newline(mut self, include: bool) -> Self {
        self.include_trailing_newline = include;
        self
    }

    /// Preamble text normalized agnostic of checkout policies: embedded
    /// CRLF sequences collapse to LF, then every LF becomes the platform's
    /// native line ending.
    pub fn preamble_text(&self) -> String {
        self.preamble_text
            .replace("\r\n", "\n")
            .replace('\n', NATIVE_LINE_ENDING)
    }

    pub fn include_trailing_newline(&self) -> bool {
        self.include_trailing_newline
    }

    /// Append one generated unit.
    pub fn push(&mut self, unit: GeneratedUnit) {
        self.generated_units.push(unit);
    }

    /// Full emitted text for one unit: preamble, unit text, and the
    /// optional trailing newline.
    pub fn render_unit(&self, unit: &GeneratedUnit) -> String {
        let mut text = self.preamble_text();
        text.push_str(&unit.text);
        if self.include_trailing_newline && !text.ends_with('\n') {
            text.push_str(NATIVE_LINE_ENDING);
        }
        text
    }
}
