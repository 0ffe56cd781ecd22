use thiserror::Error;
use trestle_expand::{ExpandError, Location};
use trestle_parse::ParseError;

/// Errors raised while loading, linking, or otherwise resolving a pipeline and its
/// dependencies. Parse errors and expansion errors are wrapped rather than flattened so the
/// CLI can still recover the originating [`Location`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unable to find pipeline: {0}")]
    PipelineNotFound(std::path::PathBuf),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error("circular pipeline reference to {0}")]
    Cycle(std::path::PathBuf),

    #[error("{0}: conflicting alias for used pipeline: {1}")]
    AliasConflict(Location, String),

    #[error("{0}: undefined pipeline alias in task {1}: {2}")]
    UnknownAlias(Location, String, String),

    #[error("{0}: dependency of {1} not found: {2}")]
    UnknownDependency(Location, String, String),

    #[error("I/O error for {0}: {1}")]
    Io(std::path::PathBuf, #[source] std::io::Error),
}
