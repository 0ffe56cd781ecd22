use crate::error::RunnerError;
use crate::registry::{EnvVarHelp, Runner};
use crate::runners::{run_shell_line, write_temp_file};
use std::path::Path;
use trestle_expand::Context;

/// `awk` — writes the block content to a temp script and runs it with AWK. The argument string
/// is passed after the script, for the files AWK should read. Grounded on `xp/blocks.py`'s
/// `run_awk`.
pub struct AwkRunner;

impl Runner for AwkRunner {
    fn short_help(&self) -> &'static str {
        "run an AWK script"
    }

    fn long_help(&self) -> &'static str {
        "run an awk script. Note that in order to read/write particular files, use the BEGIN preamble."
    }

    fn env_vars_help(&self) -> EnvVarHelp {
        &[("AWK", "the awk executable to invoke. Default is \"awk\"")]
    }

    fn run(&self, arg_str: &str, context: &Context, cwd: &Path, content: &[String]) -> Result<(), RunnerError> {
        let tmp_path = write_temp_file(content, ".awk")?;
        let exec_name = context.get("AWK").cloned().unwrap_or_else(|| "awk".to_string());
        let cmd = format!("{} -f {} {}", exec_name, tmp_path.display(), arg_str);
        run_shell_line(&cmd, context, cwd)
    }
}
