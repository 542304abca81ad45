//! Domain error types.
//!
//! Three families, matching where in the pipeline they can occur:
//! - [`SyntaxError`] / [`SecurityViolation`] — compile time, carried inside a
//!   `ValidationReport` and never seen by the executor
//! - [`ExecutionError`] — per-invocation failures attributed to one run
//! - [`EngineError`] — top-level error for callers and the CLI

use serde::{Deserialize, Serialize};

/// A syntax error with line/column position for editor-grade diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("syntax error at {line}:{col}: {message}")]
pub struct SyntaxError {
    pub line: u32,
    pub col: u32,
    pub message: String,
    /// Token the parser wanted, where determinable.
    pub expected: Option<String>,
    /// Token the parser actually saw.
    pub found: Option<String>,
}

impl SyntaxError {
    /// Format the error with a caret pointing at the offending column.
    pub fn display_with_context(&self, source: &str) -> String {
        let line_text = source
            .lines()
            .nth(self.line.saturating_sub(1) as usize)
            .unwrap_or("");
        let caret = " ".repeat(self.col.saturating_sub(1) as usize) + "^";
        format!("{line_text}\n{caret}\n{self}")
    }
}

/// A sandbox rule violation with a stable rule code.
///
/// Violations are never recoverable by retry, only by rewriting the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("security violation [{rule}] at {line}:{col}: {message}")]
pub struct SecurityViolation {
    pub rule: String,
    pub line: u32,
    pub col: u32,
    pub message: String,
}

/// Which resource ceiling an execution breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Time,
    Memory,
    Output,
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitKind::Time => write!(f, "TIME"),
            LimitKind::Memory => write!(f, "MEMORY"),
            LimitKind::Output => write!(f, "OUTPUT"),
        }
    }
}

/// Failure of a single artifact invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("parameter mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    ParamMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("runtime fault: {message}")]
    RuntimeFault { message: String },

    #[error("resource limit exceeded: {kind} (limit {limit}, observed {observed})")]
    ResourceLimitExceeded {
        kind: LimitKind,
        limit: u64,
        observed: u64,
    },
}

/// Top-level error type for signalscript.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("cache error: {reason}")]
    Cache { reason: String },

    #[error("bar data error: {reason}")]
    BarData { reason: String },

    #[error("program rejected: {0} error(s)")]
    CompileRejected(usize),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. } => 2,
            EngineError::Cache { .. } => 3,
            EngineError::CompileRejected(_) => 4,
            EngineError::Execution(_) => 5,
            EngineError::BarData { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
