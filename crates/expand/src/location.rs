use std::fmt;
use std::path::{Path, PathBuf};

/// Where a piece of pipeline text came from: a source file and a 1-based line number.
///
/// Every expander error carries one of these so the CLI can render `source:line` diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub source: PathBuf,
    pub lineno: usize,
}

impl Location {
    pub fn new(source: impl Into<PathBuf>, lineno: usize) -> Self {
        Location {
            source: source.into(),
            lineno,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Render as `parsing error on line N: msg`, the exact phrasing the CLI boundary uses.
    pub fn diagnostic(&self, message: &str) -> String {
        format!(
            "{}: parsing error on line {}: {}",
            self.source.display(),
            self.lineno,
            message
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.display(), self.lineno)
    }
}
