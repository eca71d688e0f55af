//! Terminal output for upload progress.

use mapship_types::Reporter;

/// How much the CLI prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Success summaries, warnings and errors only.
    Quiet,
    Normal,
    /// Everything, including debug detail.
    Verbose,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }
}

/// Writes `[level] message` lines to stderr.
pub struct CliReporter {
    verbosity: Verbosity,
}

impl CliReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn shows(&self, level: &str) -> bool {
        self.verbosity >= threshold(level)
    }

    fn emit(&self, level: &str, msg: &str) {
        if self.shows(level) {
            eprintln!("[{level}] {msg}");
        }
    }
}

/// Lowest verbosity at which `level` is printed.
fn threshold(level: &str) -> Verbosity {
    match level {
        "debug" => Verbosity::Verbose,
        "info" => Verbosity::Normal,
        _ => Verbosity::Quiet,
    }
}

impl Reporter for CliReporter {
    fn debug(&mut self, msg: &str) {
        self.emit("debug", msg);
    }

    fn info(&mut self, msg: &str) {
        self.emit("info", msg);
    }

    fn success(&mut self, msg: &str) {
        self.emit("success", msg);
    }

    fn warn(&mut self, msg: &str) {
        self.emit("warn", msg);
    }

    fn error(&mut self, msg: &str) {
        self.emit("error", msg);
    }
}
