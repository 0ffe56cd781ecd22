use crate::error::ResolveError;
use crate::prefix::Prefix;
use crate::resolver::Resolver;
use crate::task::{Task, TaskRef};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::OnceLock;
use trestle_expand::{expand, AliasResolver, Context, Location, PIPELINE_PREFIX_VAR};
use trestle_parse::RawPipeline;

pub const DEFAULT_PIPELINE_SUFFIX: &str = "pln";
pub const ABSTRACT_PIPELINE_SUFFIX: &str = "abstract.pln";

/// A variable-context statement replayed whenever a pipeline's context is (re)built. Prefix,
/// extend, and use statements are consumed during pipeline construction and never appear here.
#[derive(Debug, Clone)]
pub enum ContextStmt {
    Assign { name: String, value: String, loc: Location },
    Delete { name: String, loc: Location },
}

/// Strip the default (or abstract) pipeline file suffix from a path, preserving its directory.
pub fn normalize_pipeline_fname(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(stripped) = s.strip_suffix(&format!(".{ABSTRACT_PIPELINE_SUFFIX}")) {
        PathBuf::from(stripped)
    } else if let Some(stripped) = s.strip_suffix(&format!(".{DEFAULT_PIPELINE_SUFFIX}")) {
        PathBuf::from(stripped)
    } else {
        path.to_path_buf()
    }
}

fn alias_dep_pattern() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^(\w[\w\d_]*)\.(\w[\w\d_]*)$")
            .unwrap_or_else(|e| unreachable!("invalid static regex: {e}"))
    })
}

/// A fully resolved pipeline: its tasks are linked to their dependencies (possibly in other
/// pipelines reached through `use`), and its context is ready to expand code blocks against.
pub struct Pipeline {
    pub name: String,
    pub abs_filename: PathBuf,
    pub is_abstract: bool,

    prefix: Prefix,
    preamble: Vec<ContextStmt>,
    tasks: Vec<Rc<Task>>,
    task_index: HashMap<String, usize>,
    used_pipelines: HashMap<String, Rc<Pipeline>>,
    context: RefCell<HashMap<String, String>>,

    self_ref: Weak<Pipeline>,
}

impl Pipeline {
    pub fn abs_path(&self) -> &Path {
        self.abs_filename.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    pub fn resolved_prefix(&self) -> String {
        self.prefix.resolve(&self.abs_filename)
    }

    pub fn tasks(&self) -> &[Rc<Task>] {
        &self.tasks
    }

    pub fn get_task(&self, name: &str) -> Option<Rc<Task>> {
        self.task_index.get(name).map(|&i| self.tasks[i].clone())
    }

    pub fn used_pipelines(&self) -> &HashMap<String, Rc<Pipeline>> {
        &self.used_pipelines
    }

    pub fn context(&self) -> Context {
        self.context.borrow().clone()
    }

    /// Replay the preamble against a fresh context. Called once at construction and again by
    /// the engine at the start of every `run`, since expansions may depend on external state
    /// (shell captures) that can change between runs.
    pub fn rebuild_context(&self) -> Result<(), ResolveError> {
        let mut ctx: HashMap<String, String> = HashMap::new();
        ctx.insert(PIPELINE_PREFIX_VAR.to_string(), self.resolved_prefix());

        let cwd = self.abs_path().to_path_buf();
        for stmt in &self.preamble {
            match stmt {
                ContextStmt::Assign { name, value, loc } => {
                    let expanded = expand(value, &ctx, &cwd, self, loc)?;
                    ctx.insert(name.clone(), expanded);
                }
                ContextStmt::Delete { name, .. } => {
                    ctx.remove(name);
                }
            }
        }

        *self.context.borrow_mut() = ctx;
        Ok(())
    }

    /// Ensure the prefix's artifact space exists (creates the directory chain for a dir-prefix).
    pub fn pre_run(&self) -> Result<(), ResolveError> {
        self.prefix.ensure_exists(&self.abs_filename)
    }

    pub fn mark_all_tasks(&self, recur: bool) -> Result<(), ResolveError> {
        for t in &self.tasks {
            t.mark()?;
        }
        if recur {
            for p in self.used_pipelines.values() {
                p.mark_all_tasks(true)?;
            }
        }
        Ok(())
    }

    pub fn unmark_all_tasks(&self, recur: bool) -> Result<(), ResolveError> {
        for t in &self.tasks {
            t.unmark()?;
        }
        if recur {
            for p in self.used_pipelines.values() {
                p.unmark_all_tasks(true)?;
            }
        }
        Ok(())
    }

    pub fn get_all_tasks(&self) -> Vec<Rc<Task>> {
        get_all_tasks(&self.tasks)
    }

    pub fn get_visitation_list(&self) -> Vec<(Rc<Task>, usize)> {
        get_visitation_list(&self.get_all_tasks())
    }

    pub(crate) fn build(
        abs_filename: PathBuf,
        raw: RawPipeline,
        default_prefix: Prefix,
        resolver: &Resolver,
    ) -> Result<Rc<Pipeline>, ResolveError> {
        let is_abstract = abs_filename
            .to_string_lossy()
            .ends_with(&format!(".{ABSTRACT_PIPELINE_SUFFIX}"));
        let name = normalize_pipeline_fname(Path::new(
            abs_filename.file_name().unwrap_or_default(),
        ))
        .to_string_lossy()
        .into_owned();

        let mut prefix = default_prefix;
        let mut used_pipelines: HashMap<String, Rc<Pipeline>> = HashMap::new();
        let mut preamble: Vec<ContextStmt> = Vec::new();

        // Tasks accumulated so far; an `extend` statement prepends the extended pipeline's
        // (already-copied) tasks ahead of whatever has been collected up to that point.
        let mut pending_tasks: Vec<Rc<Task>> = raw
            .tasks
            .iter()
            .map(|t| Rc::new(Task::from_raw(t)))
            .collect();

        for stmt in &raw.statements {
            use trestle_parse::PreambleStmt as P;
            match stmt {
                P::VariableAssignment { name, value, loc } => {
                    preamble.push(ContextStmt::Assign {
                        name: name.clone(),
                        value: value.clone(),
                        loc: loc.clone(),
                    });
                }
                P::DeleteVariable { name, loc } => {
                    preamble.push(ContextStmt::Delete {
                        name: name.clone(),
                        loc: loc.clone(),
                    });
                }
                P::Prefix { kind, value, .. } => {
                    prefix = Prefix::new(*kind, value.clone());
                }
                P::Extend { path, loc } => {
                    let dir = abs_filename.parent().unwrap_or_else(|| Path::new("."));
                    let extended = resolver.get_pipeline(&dir.join(path), Prefix::default_dir())?;

                    preamble.extend(extended.preamble.clone());

                    let copied: Vec<Rc<Task>> = extended
                        .tasks
                        .iter()
                        .map(|t| Rc::new(t.copy_unlinked()))
                        .collect();
                    let existing = std::mem::take(&mut pending_tasks);
                    pending_tasks = copied.into_iter().chain(existing).collect();

                    for (alias, used) in &extended.used_pipelines {
                        match used_pipelines.get(alias) {
                            Some(existing) if !Rc::ptr_eq(existing, used) => {
                                return Err(ResolveError::AliasConflict(
                                    loc.clone(),
                                    alias.clone(),
                                ));
                            }
                            _ => {
                                used_pipelines.insert(alias.clone(), used.clone());
                            }
                        }
                    }
                }
                P::Use { path, alias, .. } => {
                    let dir = abs_filename.parent().unwrap_or_else(|| Path::new("."));
                    let used = resolver.get_pipeline(&dir.join(path), Prefix::default_dir())?;
                    let alias = alias.clone().unwrap_or_else(|| used.name.clone());
                    used_pipelines.insert(alias, used);
                }
            }
        }

        // Later definitions override earlier ones by name, but keep the earlier definition's
        // position (matches dict-overwrite semantics: the key's slot, not its value, is stable).
        let mut ordered: IndexMap<String, Rc<Task>> = IndexMap::new();
        for t in pending_tasks {
            ordered.insert(t.name.clone(), t);
        }
        let tasks: Vec<Rc<Task>> = ordered.values().cloned().collect();
        let task_index: HashMap<String, usize> = ordered
            .keys()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        let pipeline = Rc::new_cyclic(|self_ref: &Weak<Pipeline>| {
            Pipeline {
                name,
                abs_filename: abs_filename.clone(),
                is_abstract,
                prefix,
                preamble,
                tasks,
                task_index,
                used_pipelines,
                context: RefCell::new(HashMap::new()),
                self_ref: self_ref.clone(),
            }
        });

        for t in pipeline.tasks.iter() {
            t.set_pipeline(&pipeline);
        }

        for t in pipeline.tasks.iter() {
            for dep in &t.dep_names {
                if let Some(caps) = alias_dep_pattern().captures(dep) {
                    let alias = &caps[1];
                    let task_name = &caps[2];
                    let used = pipeline.used_pipelines.get(alias).ok_or_else(|| {
                        ResolveError::UnknownAlias(t.loc.clone(), t.name.clone(), alias.to_string())
                    })?;
                    let idx = used.task_index.get(task_name).ok_or_else(|| {
                        ResolveError::UnknownDependency(
                            t.loc.clone(),
                            t.name.clone(),
                            dep.clone(),
                        )
                    })?;
                    t.add_dependency(Rc::downgrade(used), *idx);
                } else if let Some(&idx) = pipeline.task_index.get(dep) {
                    t.add_dependency(pipeline.self_ref.clone(), idx);
                } else {
                    return Err(ResolveError::UnknownDependency(
                        t.loc.clone(),
                        t.name.clone(),
                        dep.clone(),
                    ));
                }
            }
        }

        pipeline.rebuild_context()?;

        Ok(pipeline)
    }
}

impl AliasResolver for Pipeline {
    fn context_var(&self, alias: &str, name: &str) -> Option<String> {
        self.used_pipelines.get(alias)?.context().get(name).cloned()
    }

    fn prefix(&self, alias: &str) -> Option<String> {
        Some(self.used_pipelines.get(alias)?.resolved_prefix())
    }
}

fn task_identity(t: &Rc<Task>) -> usize {
    Rc::as_ptr(t) as usize
}

/// Tasks on which nothing else in `tasks` depends.
pub fn get_leaves(tasks: &[Rc<Task>]) -> Vec<Rc<Task>> {
    let mut depended_on: HashSet<usize> = HashSet::new();
    for t in tasks {
        for dep in t.dependencies() {
            if let Some(d) = dep.get() {
                depended_on.insert(task_identity(&d));
            }
        }
    }
    tasks
        .iter()
        .filter(|t| !depended_on.contains(&task_identity(t)))
        .cloned()
        .collect()
}

/// The transitive closure of `tasks` under the dependency relation.
pub fn get_all_tasks(tasks: &[Rc<Task>]) -> Vec<Rc<Task>> {
    let mut seen: HashMap<usize, Rc<Task>> = HashMap::new();
    for t in tasks {
        seen.insert(task_identity(t), t.clone());
    }
    let mut frontier: Vec<Rc<Task>> = tasks.to_vec();
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for t in &frontier {
            for dep in t.dependencies() {
                if let Some(d) = dep.get() {
                    let id = task_identity(&d);
                    if !seen.contains_key(&id) {
                        seen.insert(id, d.clone());
                        next.push(d);
                    }
                }
            }
        }
        frontier = next;
    }
    seen.into_values().collect()
}

/// Order tasks with roots first and leaves last: leaves sit at depth 0, and each step away from
/// a leaf across a dependency edge increases depth by one. A task reached by more than one path
/// keeps whichever depth was assigned last — an ordering aid, not a numeric guarantee.
pub fn get_visitation_list(tasks: &[Rc<Task>]) -> Vec<(Rc<Task>, usize)> {
    let leaves = get_leaves(tasks);
    let mut depths: HashMap<usize, (Rc<Task>, usize)> = HashMap::new();
    for l in &leaves {
        depths.insert(task_identity(l), (l.clone(), 0));
    }

    let mut cur_layer = leaves;
    let mut depth = 0usize;
    while !cur_layer.is_empty() {
        depth += 1;
        let mut next_layer = Vec::new();
        for t in &cur_layer {
            for dep in t.dependencies() {
                if let Some(d) = dep.get() {
                    depths.insert(task_identity(&d), (d.clone(), depth));
                    next_layer.push(d);
                }
            }
        }
        cur_layer = next_layer;
    }

    let mut list: Vec<(Rc<Task>, usize)> = depths.into_values().collect();
    list.sort_by(|a, b| b.1.cmp(&a.1));
    list
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
