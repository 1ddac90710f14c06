use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{error, warn};

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // Blue - informational
    Warning,  // Yellow - recoverable
    Error,    // Red - operation failed
    Critical, // Red + modal - requires user action
}

/// Domain-specific errors for the console subsystem.
///
/// These cover contract violations and engine lifecycle problems. Failures
/// raised *by* a running script are not errors of this crate — they are an
/// expected terminal state, carried as [`ScriptFailure`] inside
/// [`crate::engine::RunOutcome::Failure`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsoleError {
    #[error("a script is already running")]
    AlreadyRunning,

    #[error("input submitted with no pending request")]
    NoPendingRequest,

    #[error("input requested while another request is pending")]
    DoubleRequest,

    #[error("run interrupted by a stop request")]
    Interrupted,

    #[error("configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadyRunning => ErrorSeverity::Warning,
            // Contract violations: loud in development, recoverable at runtime.
            Self::NoPendingRequest => ErrorSeverity::Error,
            Self::DoubleRequest => ErrorSeverity::Error,
            Self::Interrupted => ErrorSeverity::Info,
            Self::Config(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyRunning => {
                "A script is already running. Wait for it to finish.".to_string()
            }
            Self::NoPendingRequest => "The script is not waiting for input right now.".to_string(),
            Self::DoubleRequest => "The script requested input twice without waiting.".to_string(),
            Self::Interrupted => "Script stopped.".to_string(),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Terminal diagnostic of a failed run: what the script raised, and where.
///
/// `path` and `line` are best-effort — present when the interpreter's
/// diagnostic output carried a usable location, absent otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptFailure {
    pub message: String,
    pub path: Option<PathBuf>,
    pub line: Option<u32>,
}

/// Matches the `File "<path>", line <n>` location lines that interpreter
/// tracebacks emit.
fn location_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"File "([^"]+)", line (\d+)"#).expect("valid location regex"))
}

impl ScriptFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            line: None,
        }
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>, line: u32) -> Self {
        self.path = Some(path.into());
        self.line = Some(line);
        self
    }

    /// Failure reported when a run is stopped cooperatively.
    pub fn interrupted() -> Self {
        Self::new("script terminated by stop request")
    }

    /// Parse an interpreter diagnostic (typically a traceback) into a
    /// failure.
    ///
    /// The message is the last non-empty line — tracebacks put the error
    /// type and text there. The location is the *last* `File "...", line N`
    /// entry, which points at the frame where the error was raised. When the
    /// diagnostic carries no location, `fallback_path` fills in the path so
    /// the user at least sees which script failed.
    pub fn from_diagnostic(diagnostic: &str, fallback_path: Option<&Path>) -> Self {
        let message = diagnostic
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("script execution failed")
            .to_string();

        let mut failure = Self::new(message);
        if let Some(caps) = location_regex().captures_iter(diagnostic).last() {
            failure.path = Some(PathBuf::from(&caps[1]));
            failure.line = caps[2].parse::<u32>().ok();
        } else {
            failure.path = fallback_path.map(Path::to_path_buf);
        }
        failure
    }
}

impl fmt::Display for ScriptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(path), Some(line)) => {
                write!(f, "{} ({}:{})", self.message, path.display(), line)
            }
            (Some(path), None) => write!(f, "{} ({})", self.message, path.display()),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Extension trait for ergonomic error logging
pub trait ResultExt<T> {
    fn log_err(self) -> Option<T>;
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    fn log_err(self) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                error!(error = ?e, "Operation failed");
                None
            }
        }
    }

    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = ?e, "Operation warning");
                None
            }
        }
    }
}
