use crate::error::ResolveError;
use crate::pipeline::Pipeline;
use crate::prefix::Prefix;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Loads, caches, and links pipeline files. Replaces the teacher's module-level globals with an
/// explicit value so the CLI can own (and, in tests, discard) its own cache instead of leaking
/// process-wide state.
#[derive(Default)]
pub struct Resolver {
    cache: RefCell<HashMap<PathBuf, Rc<Pipeline>>>,
    under_construction: RefCell<HashSet<PathBuf>>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver::default()
    }

    /// Resolve `filename` to a fully linked [`Pipeline`], loading it (and anything it extends
    /// or uses) as needed. Repeated calls for the same canonical path return the same `Rc`.
    pub fn get_pipeline(&self, filename: &Path, default_prefix: Prefix) -> Result<Rc<Pipeline>, ResolveError> {
        let canonical = std::fs::canonicalize(filename)
            .map_err(|_| ResolveError::PipelineNotFound(filename.to_path_buf()))?;

        if let Some(cached) = self.cache.borrow().get(&canonical) {
            return Ok(cached.clone());
        }

        if self.under_construction.borrow().contains(&canonical) {
            return Err(ResolveError::Cycle(canonical));
        }

        self.under_construction.borrow_mut().insert(canonical.clone());
        let result = self.load(&canonical, default_prefix);
        self.under_construction.borrow_mut().remove(&canonical);

        let pipeline = result?;
        self.cache.borrow_mut().insert(canonical, pipeline.clone());
        Ok(pipeline)
    }

    fn load(&self, canonical: &Path, default_prefix: Prefix) -> Result<Rc<Pipeline>, ResolveError> {
        let raw = trestle_parse::parse_pipeline_file(canonical)?;
        Pipeline::build(canonical.to_path_buf(), raw, default_prefix, self)
    }

    /// Number of pipelines currently cached. Mostly useful for tests asserting memoization.
    pub fn cached_count(&self) -> usize {
        self.cache.borrow().len()
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
