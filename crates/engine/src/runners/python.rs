use crate::error::RunnerError;
use crate::registry::{EnvVarHelp, Runner};
use crate::runners::{run_shell_line, write_temp_file};
use std::path::Path;
use trestle_expand::Context;

/// `python` — writes the block content to a temp file and runs it with the configured
/// interpreter. Grounded on `xp/blocks.py`'s `run_python`.
pub struct PythonRunner;

impl Runner for PythonRunner {
    fn short_help(&self) -> &'static str {
        "run python code"
    }

    fn long_help(&self) -> &'static str {
        "run the commands in whatever the default python VM is on the host system"
    }

    fn env_vars_help(&self) -> EnvVarHelp {
        &[("PYTHON_CMD", "the python executable to invoke. Default is \"python\"")]
    }

    fn run(&self, arg_str: &str, context: &Context, cwd: &Path, content: &[String]) -> Result<(), RunnerError> {
        let tmp_path = write_temp_file(content, ".py")?;
        let exec_name = context.get("PYTHON_CMD").cloned().unwrap_or_else(|| "python".to_string());
        let cmd = format!("{} {} {}", exec_name, arg_str, tmp_path.display());
        run_shell_line(&cmd, context, cwd)
    }
}
