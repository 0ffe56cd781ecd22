//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::pipeline::Pipeline;
use crate::prefix::Prefix;
use crate::resolver::Resolver;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Write `contents` to `dir/name` and return the path, for pipelines that need an on-disk file.
pub fn write_pipeline(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write test pipeline");
    path
}

/// Load `path` through a throwaway resolver with the default dir-prefix.
pub fn load_pipeline(path: &Path) -> Rc<Pipeline> {
    let resolver = Resolver::new();
    resolver
        .get_pipeline(path, Prefix::default_dir())
        .expect("load test pipeline")
}
