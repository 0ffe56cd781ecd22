use crate::error::ResolveError;
use std::path::{Path, PathBuf};
use trestle_parse::PrefixKind;

/// Where artifacts produced by a pipeline's tasks land. Every pipeline has exactly one, either
/// the explicit `prefix file|dir …` preamble statement or a default derived from the pipeline's
/// own filename.
#[derive(Debug, Clone)]
pub struct Prefix {
    kind: PrefixKind,
    value: Option<String>,
}

impl Prefix {
    pub fn new(kind: PrefixKind, value: Option<String>) -> Self {
        Prefix { kind, value }
    }

    pub fn default_dir() -> Self {
        Prefix {
            kind: PrefixKind::Dir,
            value: None,
        }
    }

    /// Resolve the prefix string for a pipeline located at `abs_filename`, stripping the
    /// default file suffix the way [`crate::pipeline::normalize_pipeline_fname`] does.
    pub fn resolve(&self, abs_filename: &Path) -> String {
        match (&self.kind, &self.value) {
            (PrefixKind::File, None) => {
                format!("{}_", crate::pipeline::normalize_pipeline_fname(abs_filename).display())
            }
            (PrefixKind::Dir, None) => {
                let base = crate::pipeline::normalize_pipeline_fname(abs_filename);
                let dir_prefix = PathBuf::from(format!("{}_data", base.display()));
                join_with_trailing_sep(&dir_prefix)
            }
            (PrefixKind::File, Some(v)) => {
                let dir = abs_filename.parent().unwrap_or_else(|| Path::new("."));
                dir.join(v).to_string_lossy().into_owned()
            }
            (PrefixKind::Dir, Some(v)) => {
                let dir = abs_filename.parent().unwrap_or_else(|| Path::new("."));
                join_with_trailing_sep(&dir.join(v))
            }
        }
    }

    /// For a dir-prefix, create the directory chain beneath the pipeline directory. A
    /// no-op for file-prefixes.
    pub fn ensure_exists(&self, abs_filename: &Path) -> Result<(), ResolveError> {
        if self.kind != PrefixKind::Dir {
            return Ok(());
        }

        let resolved = self.resolve(abs_filename);
        let dir = PathBuf::from(&resolved);
        std::fs::create_dir_all(&dir).map_err(|e| ResolveError::Io(dir, e))
    }
}

fn join_with_trailing_sep(p: &Path) -> String {
    let mut s = p.to_string_lossy().into_owned();
    if !s.ends_with(std::path::MAIN_SEPARATOR) {
        s.push(std::path::MAIN_SEPARATOR);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_prefix_appends_underscore() {
        let p = Prefix::new(PrefixKind::File, None);
        let resolved = p.resolve(Path::new("/a/b/task.pln"));
        assert_eq!(resolved, "/a/b/task_");
    }

    #[test]
    fn default_dir_prefix_appends_data_and_separator() {
        let p = Prefix::new(PrefixKind::Dir, None);
        let resolved = p.resolve(Path::new("/a/b/task.pln"));
        assert_eq!(resolved, format!("/a/b/task_data{}", std::path::MAIN_SEPARATOR));
    }

    #[test]
    fn explicit_file_prefix_is_relative_to_pipeline_dir() {
        let p = Prefix::new(PrefixKind::File, Some("out/run1_".to_string()));
        let resolved = p.resolve(Path::new("/a/b/task.pln"));
        assert_eq!(resolved, "/a/b/out/run1_");
    }

    #[test]
    fn explicit_dir_prefix_gets_trailing_separator() {
        let p = Prefix::new(PrefixKind::Dir, Some("out".to_string()));
        let resolved = p.resolve(Path::new("/a/b/task.pln"));
        assert_eq!(resolved, format!("/a/b/out{}", std::path::MAIN_SEPARATOR));
    }
}
