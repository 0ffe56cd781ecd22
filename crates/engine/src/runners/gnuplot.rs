use crate::error::RunnerError;
use crate::registry::{EnvVarHelp, Runner};
use crate::runners::{run_shell_line, write_temp_file};
use std::path::Path;
use trestle_expand::Context;

/// `gnuplot` — writes the block content to a temp script and runs it with GNUPlot. Grounded on
/// `xp/blocks.py`'s `run_gnuplot`.
pub struct GnuplotRunner;

impl Runner for GnuplotRunner {
    fn short_help(&self) -> &'static str {
        "run a gnuplot script"
    }

    fn long_help(&self) -> &'static str {
        "run the commands in GNUPlot"
    }

    fn env_vars_help(&self) -> EnvVarHelp {
        &[("GNUPLOT", "the gnuplot executable to invoke. Default is \"gnuplot\"")]
    }

    fn run(&self, arg_str: &str, context: &Context, cwd: &Path, content: &[String]) -> Result<(), RunnerError> {
        let tmp_path = write_temp_file(content, ".gp")?;
        let exec_name = context.get("GNUPLOT").cloned().unwrap_or_else(|| "gnuplot".to_string());
        let cmd = format!("{} {} {}", exec_name, arg_str, tmp_path.display());
        run_shell_line(&cmd, context, cwd)
    }
}
