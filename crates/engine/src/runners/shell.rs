use crate::error::RunnerError;
use crate::registry::{EnvVarHelp, Runner};
use crate::runners::run_shell_line;
use std::path::Path;
use trestle_expand::Context;

/// `shell` — runs the block content with the host shell. Grounded on `xp/blocks.py`'s `run_shell`.
pub struct ShellRunner;

impl Runner for ShellRunner {
    fn short_help(&self) -> &'static str {
        "run a shell script (OS-specific)"
    }

    fn long_help(&self) -> &'static str {
        "run the commands in whatever the default shell on the host operating system is"
    }

    fn env_vars_help(&self) -> EnvVarHelp {
        &[]
    }

    fn run(&self, arg_str: &str, context: &Context, cwd: &Path, content: &[String]) -> Result<(), RunnerError> {
        if !arg_str.trim().is_empty() {
            tracing::warn!(arg_str, "shell block ignoring argument string");
        }
        let cmd = content.join("\n");
        run_shell_line(&cmd, context, cwd)
    }
}
