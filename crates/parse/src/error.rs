use thiserror::Error;
use trestle_expand::Location;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}: could not read pipeline file: {1}")]
    Io(Location, #[source] std::io::Error),

    #[error("{0}: expected a task definition, got: {1}")]
    ExpectedTaskDefinition(Location, String),

    #[error("{0}: expected a dependency, got: {1}")]
    InvalidDependency(Location, String),

    #[error("{0}: all lines in a comment block must be indented")]
    UnindentedCommentLine(Location),

    #[error("{0}: export block does not accept an argument string")]
    ExportBlockHasArgString(Location),

    #[error("{0}: expected a variable assignment, got: {1}")]
    ExpectedVariableAssignment(Location, String),
}

impl ParseError {
    pub fn location(&self) -> &Location {
        match self {
            ParseError::Io(l, _) => l,
            ParseError::ExpectedTaskDefinition(l, _) => l,
            ParseError::InvalidDependency(l, _) => l,
            ParseError::UnindentedCommentLine(l) => l,
            ParseError::ExportBlockHasArgString(l) => l,
            ParseError::ExpectedVariableAssignment(l, _) => l,
        }
    }

    /// The message portion alone, without the `source:line` location prefix `Display` includes —
    /// the CLI boundary reports location as `line N` instead, per the original's
    /// `'parsing error on line %d: %s' % (e.lineno, e.message)`.
    pub fn message(&self) -> String {
        match self {
            ParseError::Io(_, e) => format!("could not read pipeline file: {e}"),
            ParseError::ExpectedTaskDefinition(_, s) => format!("expected a task definition, got: {s}"),
            ParseError::InvalidDependency(_, s) => format!("expected a dependency, got: {s}"),
            ParseError::UnindentedCommentLine(_) => "all lines in a comment block must be indented".to_string(),
            ParseError::ExportBlockHasArgString(_) => "export block does not accept an argument string".to_string(),
            ParseError::ExpectedVariableAssignment(_, s) => format!("expected a variable assignment, got: {s}"),
        }
    }
}
