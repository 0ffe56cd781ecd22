use crate::error::ResolveError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Weak;
use std::time::SystemTime;
use trestle_expand::Location;
use trestle_parse::RawBlock;

/// Force modes controlling whether a task re-runs even when its mark file is fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Force {
    /// Skip a marked task unless a dependency's mark is newer.
    None,
    /// Force the explicitly-named task; its dependencies follow `None` semantics.
    Top,
    /// Force every task encountered in the recursion.
    All,
    /// Force the explicitly-named task and run none of its dependencies.
    Solo,
}

/// A statement inside an export block, already expansion-ready.
#[derive(Debug, Clone)]
pub enum ExportStmt {
    Assign { name: String, value: String, loc: Location },
    Delete { name: String, loc: Location },
}

/// A block of work nested under a task.
#[derive(Debug, Clone)]
pub enum Block {
    Export {
        statements: Vec<ExportStmt>,
    },
    Code {
        lang: String,
        arg_str: String,
        content: Vec<String>,
        loc: Location,
        /// Absolute 1-based source line number of each `content` line, so expansion
        /// diagnostics can report the originating source line exactly.
        content_linenos: Vec<usize>,
    },
}

impl Block {
    pub(crate) fn from_raw(raw: &RawBlock) -> Block {
        match raw {
            RawBlock::Export { statements, .. } => Block::Export {
                statements: statements
                    .iter()
                    .map(|s| match s {
                        trestle_parse::ExportStmt::Assign { name, value, loc } => ExportStmt::Assign {
                            name: name.clone(),
                            value: value.clone(),
                            loc: loc.clone(),
                        },
                        trestle_parse::ExportStmt::Delete { name, loc } => ExportStmt::Delete {
                            name: name.clone(),
                            loc: loc.clone(),
                        },
                    })
                    .collect(),
            },
            RawBlock::Code {
                lang,
                arg_str,
                content,
                content_linenos,
                loc,
            } => Block::Code {
                lang: lang.clone(),
                arg_str: arg_str.clone(),
                content: content.clone(),
                loc: loc.clone(),
                content_linenos: content_linenos.iter().map(|ln| ln + 1).collect(),
            },
        }
    }
}

/// A reference to a task that survives pipeline copies made during `extend`: the pipeline
/// pointer is resolved lazily through a weak back-reference so a task never outlives the
/// pipeline that owns it, but also never keeps it alive on its own.
#[derive(Debug, Clone)]
pub struct TaskRef {
    pub(crate) pipeline: Weak<crate::pipeline::Pipeline>,
    pub(crate) index: usize,
}

impl TaskRef {
    /// Resolve this reference to the actual task, if the owning pipeline is still alive.
    pub fn get(&self) -> Option<std::rc::Rc<Task>> {
        let pipeline = self.pipeline.upgrade()?;
        pipeline.tasks.get(self.index).cloned()
    }
}

/// One task definition: a name, its declared dependency names (pre-resolution), and its blocks.
#[derive(Debug)]
pub struct Task {
    pub name: String,
    pub dep_names: Vec<String>,
    pub blocks: Vec<Block>,
    pub properties: BTreeMap<String, String>,
    pub loc: Location,

    pub(crate) pipeline: RefCell<Weak<crate::pipeline::Pipeline>>,
    pub(crate) dependencies: RefCell<Vec<TaskRef>>,
}

impl Task {
    pub(crate) fn from_raw(raw: &trestle_parse::RawTask) -> Task {
        Task {
            name: raw.name.clone(),
            dep_names: raw.dep_names.clone(),
            blocks: raw.blocks.iter().map(Block::from_raw).collect(),
            properties: raw.properties.clone(),
            loc: raw.loc.clone(),
            pipeline: RefCell::new(Weak::new()),
            dependencies: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn copy_unlinked(&self) -> Task {
        Task {
            name: self.name.clone(),
            dep_names: self.dep_names.clone(),
            blocks: self.blocks.clone(),
            properties: self.properties.clone(),
            loc: self.loc.clone(),
            pipeline: RefCell::new(Weak::new()),
            dependencies: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn set_pipeline(&self, pipeline: &std::rc::Rc<crate::pipeline::Pipeline>) {
        *self.pipeline.borrow_mut() = std::rc::Rc::downgrade(pipeline);
    }

    pub(crate) fn clear_dependencies(&self) {
        self.dependencies.borrow_mut().clear();
    }

    pub(crate) fn add_dependency(&self, pipeline: Weak<crate::pipeline::Pipeline>, index: usize) {
        self.dependencies.borrow_mut().push(TaskRef { pipeline, index });
    }

    pub fn dependencies(&self) -> Vec<TaskRef> {
        self.dependencies.borrow().clone()
    }

    /// The pipeline that owns this task, if it is still alive.
    pub fn pipeline(&self) -> Option<std::rc::Rc<crate::pipeline::Pipeline>> {
        self.pipeline.borrow().upgrade()
    }

    fn mark_file(&self) -> Option<PathBuf> {
        let pipeline = self.pipeline.borrow().upgrade()?;
        Some(pipeline.abs_path().join(format!(".{}-{}.mark", pipeline.name, self.name)))
    }

    pub fn is_marked(&self) -> bool {
        self.mark_file().map(|p| p.exists()).unwrap_or(false)
    }

    pub fn mark_timestamp(&self) -> Option<SystemTime> {
        let path = self.mark_file()?;
        std::fs::metadata(path).ok()?.modified().ok()
    }

    /// Create the mark file (touch semantics: zero-byte, mtime = now).
    pub fn mark(&self) -> Result<(), ResolveError> {
        if let Some(path) = self.mark_file() {
            std::fs::write(&path, []).map_err(|e| ResolveError::Io(path, e))?;
        }
        Ok(())
    }

    pub fn unmark(&self) -> Result<(), ResolveError> {
        if let Some(path) = self.mark_file() {
            if path.exists() {
                std::fs::remove_file(&path).map_err(|e| ResolveError::Io(path, e))?;
            }
        }
        Ok(())
    }
}
