//! Reads an optional configuration file selecting which built-in code-block runners are active,
//! and under which tag. Grounded on `xp/config.py`'s `ConfigParser`-based
//! `[KernelImpl] active_kernels` mechanism, adapted to a closed set of runners: Rust has no
//! equivalent to Python's class-path loading, so the config file can only select and rename
//! among the fixed built-ins rather than load arbitrary code.

use anyhow::{Context, Result};
use std::path::Path;
use trestle_engine::Registry;

const KERNELIMPL_SECTION: &str = "kernels";
const ACTIVE_OPT: &str = "active";

/// Build a [`Registry`] from `path`, if given. With no path, or a file with no `[kernels]
/// active = ...` entry, returns the registry with every built-in runner under its default tag.
pub fn load_registry(path: Option<&Path>) -> Result<Registry> {
    let Some(path) = path else {
        return Ok(Registry::with_builtins());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;

    match find_active_line(&text) {
        Some(active) => {
            let selections: Vec<(&str, &str)> = active
                .split_whitespace()
                .map(parse_selection)
                .collect::<Result<_>>()?;
            Registry::with_selected(selections).map_err(anyhow::Error::from)
        }
        None => Ok(Registry::with_builtins()),
    }
}

/// Find the `active = ...` line inside the `[kernels]` section, ignoring everything outside it.
fn find_active_line(text: &str) -> Option<&str> {
    let mut in_section = false;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            in_section = trimmed.trim_matches(['[', ']']) == KERNELIMPL_SECTION;
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            if key.trim() == ACTIVE_OPT {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Parse one whitespace-separated token from `active`: `tag` or `tag(alias)`.
fn parse_selection(token: &str) -> Result<(&str, &str)> {
    match token.strip_suffix(')').and_then(|t| t.split_once('(')) {
        Some((tag, alias)) => Ok((tag, alias)),
        None => Ok((token, token)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_uses_builtins() {
        let registry = load_registry(None).unwrap();
        assert!(registry.tags().contains(&"shell"));
    }

    #[test]
    fn active_line_selects_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[kernels]\nactive = shell python(py)\n").unwrap();

        let registry = load_registry(Some(&path)).unwrap();
        assert_eq!(registry.tags(), vec!["py", "shell"]);
    }

    #[test]
    fn missing_active_line_falls_back_to_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[kernels]\n# nothing here\n").unwrap();

        let registry = load_registry(Some(&path)).unwrap();
        assert!(registry.tags().contains(&"test"));
    }
}
