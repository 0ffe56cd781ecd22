use thiserror::Error;
use trestle_expand::ExpandError;

/// Errors from registering or dispatching to a code-block runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn runner process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("runner exited with status {status}")]
    NonZeroExit { status: i32 },

    #[error("unknown language tag: {tag}")]
    UnknownLanguageTag { tag: String },

    #[error("duplicate language tag registered: {tag}")]
    DuplicateTag { tag: String },

    #[error("runner configuration error: {0}")]
    ConfigError(#[source] std::io::Error),
}

/// Errors from running a task (or a whole pipeline) to completion.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("an abstract pipeline cannot be run: {pipeline}")]
    AbstractRunRefused { pipeline: std::path::PathBuf },

    #[error("task {task} failed: {source}")]
    BlockFailed {
        task: String,
        #[source]
        source: RunnerError,
    },

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error(transparent)]
    Resolve(#[from] trestle_core::ResolveError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
