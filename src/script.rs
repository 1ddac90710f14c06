use std::path::{Path, PathBuf};

/// One script submitted for execution: immutable source text plus the
/// optional path it was loaded from.
///
/// The path is informational — it feeds error reporting and lets the
/// interpreter resolve imports relative to the script's directory. The core
/// never reads the file system itself; loading is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    source: String,
    path: Option<PathBuf>,
}

impl Script {
    /// Script loaded from a file. The source is what the caller read; the
    /// path is kept for diagnostics and relative-import resolution.
    pub fn new(source: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            path: Some(path.into()),
        }
    }

    /// Script with no backing file (typed into a REPL, pasted, generated).
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Name used in log lines and diagnostics: the file name when there is
    /// one, `<untitled>` otherwise.
    pub fn display_name(&self) -> &str {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .unwrap_or("<untitled>")
    }
}
