use crate::error::RunnerError;
use crate::registry::{EnvVarHelp, Runner};
use std::fs::File;
use std::path::Path;
use trestle_expand::Context;

/// `test` — for internal tests. Creates an empty file for each whitespace-separated name in the
/// argument string, then prints the content. Grounded on `xp/blocks.py`'s `run_test`.
pub struct TestRunner;

impl Runner for TestRunner {
    fn short_help(&self) -> &'static str {
        "a codeblock for internal testing"
    }

    fn long_help(&self) -> &'static str {
        "this codeblock will write the content to the file named in the argument string"
    }

    fn env_vars_help(&self) -> EnvVarHelp {
        &[]
    }

    fn run(&self, arg_str: &str, _context: &Context, cwd: &Path, content: &[String]) -> Result<(), RunnerError> {
        for fname in arg_str.split_whitespace() {
            File::create(cwd.join(fname)).map_err(RunnerError::SpawnFailed)?;
        }
        println!("{}", content.join("\n"));
        Ok(())
    }
}
