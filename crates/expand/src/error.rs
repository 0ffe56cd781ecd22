use crate::Location;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("{}: incomplete escape sequence at end of line", .0)]
    UnterminatedEscape(Location),

    #[error("{}: invalid escape sequence \\{}", .loc, .ch)]
    IllegalEscape { loc: Location, ch: char },

    #[error("{}: incomplete variable reference", .0)]
    IncompleteVariableReference(Location),

    #[error("{}: invalid variable reference", .0)]
    InvalidVariableReference(Location),

    #[error("{}: variable {} does not exist", .loc, .name)]
    UnknownVariable { loc: Location, name: String },

    #[error("{}: pipeline {} is unknown", .loc, .alias)]
    UnknownAlias { loc: Location, alias: String },

    #[error("{}: invalid builtin function name: {}", .loc, .name)]
    UnknownBuiltinFunction { loc: Location, name: String },

    #[error("{}: too many arguments for ${}(...)", .loc, .function)]
    TooManyArguments { loc: Location, function: &'static str },

    #[error("{}: expected to find a \")\", none found", .0)]
    UnterminatedFunctionCall(Location),

    #[error("{}: failed to run shell function", .loc)]
    ShellCallFailed {
        loc: Location,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: shell function exited with status {}", .loc, .status)]
    ShellCallNonZero { loc: Location, status: i32 },

    #[error("{}: inline shell functions cannot return strings containing newlines", .loc)]
    ShellCallMultilineOutput { loc: Location },
}

impl ExpandError {
    pub fn location(&self) -> &Location {
        match self {
            ExpandError::UnterminatedEscape(l) => l,
            ExpandError::IllegalEscape { loc, .. } => loc,
            ExpandError::IncompleteVariableReference(l) => l,
            ExpandError::InvalidVariableReference(l) => l,
            ExpandError::UnknownVariable { loc, .. } => loc,
            ExpandError::UnknownAlias { loc, .. } => loc,
            ExpandError::UnknownBuiltinFunction { loc, .. } => loc,
            ExpandError::TooManyArguments { loc, .. } => loc,
            ExpandError::UnterminatedFunctionCall(l) => l,
            ExpandError::ShellCallFailed { loc, .. } => loc,
            ExpandError::ShellCallNonZero { loc, .. } => loc,
            ExpandError::ShellCallMultilineOutput { loc } => loc,
        }
    }
}
