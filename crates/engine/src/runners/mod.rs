//! Built-in [`crate::registry::Runner`] implementations, one per language tag.

pub mod awk;
pub mod gnuplot;
pub mod pyhmr;
pub mod python;
pub mod shell;
pub mod test;

use crate::error::RunnerError;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use trestle_expand::{total_context, Context};

/// Write `content` (already joined with newlines) to a fresh temp file with the given filename
/// suffix, and return its path. The file is not deleted by this helper: the caller's command
/// needs it to still exist while it runs.
pub(crate) fn write_temp_file(content: &[String], suffix: &str) -> Result<tempfile::TempPath, RunnerError> {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .map_err(RunnerError::SpawnFailed)?;
    file.write_all(content.join("\n").as_bytes())
        .map_err(RunnerError::SpawnFailed)?;
    Ok(file.into_temp_path())
}

/// Run `cmd` through the host shell, in `cwd`, with the OS environment overlaid by `context`.
/// Mirrors `xp/blocks.py`'s `subprocess.call(cmd, shell=True, cwd=cwd, env=get_total_context(context))`.
pub(crate) fn run_shell_line(cmd: &str, context: &Context, cwd: &Path) -> Result<(), RunnerError> {
    let status = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .current_dir(cwd)
        .envs(total_context(context))
        .status()
        .map_err(RunnerError::SpawnFailed)?;

    if !status.success() {
        return Err(RunnerError::NonZeroExit {
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}
