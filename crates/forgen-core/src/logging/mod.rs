//! Leveled diagnostic logger writing build-recognized output lines.
//!
//! The logger is an explicit instance owned by the driver, with one
//! independently assignable callback per severity. A request dispatches to
//! the callback assigned at the highest severity less than or equal to the
//! requested level, so a level without a dedicated handler falls back to the
//! nearest lower one. Messages are split on line boundaries (CRLF normalized
//! to LF first) and the chosen callback runs once per line.

use std::io::Write;

use crate::constants::TOOL_NAME;

/// Diagnostic severity, ordered Information < Warning < Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Information = 0,
    Warning = 1,
    Error = 2,
}

impl Severity {
    /// Numeric level as it appears in diagnostic lines
    pub fn level(self) -> usize {
        self as usize
    }
}

/// Callback invoked once per physical output line.
pub type LoggerCallback = Box<dyn Fn(&mut dyn Write, Severity, &str, Option<&str>) + Send>;

/// Writes leveled messages to a build-recognized output stream.
pub struct DiagnosticLogger {
    writer: Box<dyn Write + Send>,
    callbacks: [Option<LoggerCallback>; 3],
}

impl std::fmt::Debug for DiagnosticLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticLogger")
            .field(
                "callbacks",
                &self.callbacks.iter().map(Option::is_some).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn default_information(writer: &mut dyn Write, _level: Severity, line: &str, _code: Option<&str>) {
    let _ = writeln!(writer, "{}", line);
}

fn default_warning_or_error(writer: &mut dyn Write, level: Severity, line: &str, code: Option<&str>) {
    let _ = writeln!(
        writer,
        "{}[{}]: [{}] {}",
        TOOL_NAME,
        level.level(),
        code.unwrap_or(""),
        line
    );
}

impl DiagnosticLogger {
    /// Create a logger with the default callback for every severity:
    /// Information writes the bare line, Warning and Error write
    /// `forgen[<level>]: [<code>] <line>`.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer,
            callbacks: [
                Some(Box::new(default_information)),
                Some(Box::new(default_warning_or_error)),
                Some(Box::new(default_warning_or_error)),
            ],
        }
    }

    /// Create a logger with no callbacks assigned. Log calls are dropped
    /// until at least one callback is set.
    pub fn unassigned(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer,
            callbacks: [None, None, None],
        }
    }

    /// Logger writing to standard output with default callbacks.
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Assign the callback for one severity.
    pub fn set_callback(&mut self, severity: Severity, callback: LoggerCallback) -> &mut Self {
        self.callbacks[severity.level()] = Some(callback);
        self
    }

    /// Log an Information message.
    pub fn information(&mut self, message: &str) {
        self.log(Severity::Information, message, None);
    }

    /// Log a Warning message. Warnings are advisory and do not by
    /// themselves fail the build.
    pub fn warning(&mut self, message: &str, code: &str) {
        self.log(Severity::Warning, message, Some(code));
    }

    /// Log an Error message. Error-level output signals build failure to
    /// the host.
    pub fn error(&mut self, message: &str, code: &str) {
        self.log(Severity::Error, message, Some(code));
    }

    /// Dispatch `message` at the requested severity. The message may be LF
    /// or CRLF delimited; each physical line is passed to the callback
    /// separately, empty lines included.
    pub fn log(&mut self, severity: Severity, message: &str, code: Option<&str>) {
        let callback = match (0..=severity.level())
            .rev()
            .find_map(|level| self.callbacks[level].as_ref())
        {
            Some(callback) => callback,
            None => return,
        };

        let normalized = message.replace("\r\n", "\n");
        for line in normalized.split('\n') {
            callback(&mut self.writer, severity, line, code);
        }
        let _ = self.writer.flush();
    }
}
