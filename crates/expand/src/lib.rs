//! Recursive variable and function expansion for pipeline text.
//!
//! Expands `$VAR`, `${VAR}`, `${ALIAS.VAR}`, `$PLN(file)`, `$PLN(alias,file)`, inline
//! `$( shell )` calls, and `\$`/`\\` escapes, one line at a time, reporting precise
//! source-file/line-number diagnostics on failure.

mod context;
mod error;
mod expand;
mod location;

pub use context::{total_context, AliasResolver, Context, NoAliases, PIPELINE_PREFIX_VAR};
pub use error::ExpandError;
pub use expand::{expand, expand_nested};
pub use location::Location;
