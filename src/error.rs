/// Errors surfaced by the I/O edges: trace loading, the terminal viewer,
/// and result persistence. The decision core never fails.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read trace {path}: {source}")]
    TraceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trace line {line}: {reason}")]
    Trace { line: usize, reason: String },

    #[error("trace has no frames")]
    EmptyTrace,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
