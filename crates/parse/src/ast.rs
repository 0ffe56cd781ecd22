use std::collections::BTreeMap;
use std::path::PathBuf;
use trestle_expand::Location;

/// One statement at the top of a pipeline file, before any task headers.
#[derive(Debug, Clone)]
pub enum PreambleStmt {
    VariableAssignment {
        name: String,
        value: String,
        loc: Location,
    },
    DeleteVariable {
        name: String,
        loc: Location,
    },
    Prefix {
        kind: PrefixKind,
        value: Option<String>,
        loc: Location,
    },
    Extend {
        path: String,
        loc: Location,
    },
    Use {
        path: String,
        alias: Option<String>,
        loc: Location,
    },
}

impl PreambleStmt {
    pub fn loc(&self) -> &Location {
        match self {
            PreambleStmt::VariableAssignment { loc, .. } => loc,
            PreambleStmt::DeleteVariable { loc, .. } => loc,
            PreambleStmt::Prefix { loc, .. } => loc,
            PreambleStmt::Extend { loc, .. } => loc,
            PreambleStmt::Use { loc, .. } => loc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixKind {
    File,
    Dir,
}

/// A statement inside an `export:` block — the only things an export block may contain.
#[derive(Debug, Clone)]
pub enum ExportStmt {
    Assign {
        name: String,
        value: String,
        loc: Location,
    },
    Delete {
        name: String,
        loc: Location,
    },
}

#[derive(Debug, Clone)]
pub enum RawBlock {
    Export {
        statements: Vec<ExportStmt>,
        loc: Location,
    },
    Code {
        lang: String,
        arg_str: String,
        content: Vec<String>,
        content_linenos: Vec<usize>,
        loc: Location,
    },
}

/// A task as lexed straight out of the file, with dependency names unresolved.
#[derive(Debug, Clone)]
pub struct RawTask {
    pub name: String,
    pub dep_names: Vec<String>,
    pub blocks: Vec<RawBlock>,
    pub properties: BTreeMap<String, String>,
    pub loc: Location,
}

/// The full, unresolved parse of one pipeline file.
#[derive(Debug, Clone)]
pub struct RawPipeline {
    pub source: PathBuf,
    pub statements: Vec<PreambleStmt>,
    pub tasks: Vec<RawTask>,
}
