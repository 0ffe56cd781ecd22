//! Indentation-sensitive lexer/parser for pipeline definition files.
//!
//! Turns pipeline source text into the unresolved [`ast::RawPipeline`] tree: preamble
//! statements, task headers with their dependency names, and the export/code blocks nested
//! under each task. Cross-file references (`extend`, `use`) and variable expansion are left to
//! `trestle-core`, which walks this tree to build the resolved data model.

mod ast;
mod error;
mod parser;

pub use ast::{ExportStmt, PrefixKind, PreambleStmt, RawBlock, RawPipeline, RawTask};
pub use error::ParseError;
pub use parser::{parse_pipeline_file, parse_pipeline_str};
