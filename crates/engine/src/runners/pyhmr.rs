use crate::error::RunnerError;
use crate::registry::{EnvVarHelp, Runner};
use crate::runners::{run_shell_line, write_temp_file};
use std::path::Path;
use trestle_expand::Context;

const HADOOP_CMD_EV: &str = "PYHMR_HADOOP_CMD";
const PYTHON_CMD_EV: &str = "PYHMR_PYTHON_CMD";
const STREAMING_API_JAR_EV: &str = "PYHMR_STREAMING_API_JAR";
const INPUT_EV: &str = "PYHMR_INPUT";
const OUTPUT_EV: &str = "PYHMR_OUTPUT";
const EXTRA_FILES_EV: &str = "PYHMR_EXTRA_FILES";
const NUM_REDUCERS_EV: &str = "PYHMR_NUM_REDUCERS";
const TEST_CMD_EV: &str = "PYHMR_TEST_CMD";
const TEST_OUTPUT_EV: &str = "PYHMR_TEST_OUTPUT";

const MAPPER_TRAMPOLINE: &str = "\n\nif __name__ == '__main__':\n    import sys\n    map(sys.stdin)\n";
const REDUCER_TRAMPOLINE: &str = "\n\nif __name__ == '__main__':\n    import sys\n    reduce(sys.stdin)\n";

/// `python-hadoop-mapreduce` — a Hadoop streaming map-reduce task implemented as a Python
/// `map(stream)`/`reduce(stream)` pair. Grounded on `xp/kernels/pyhmr.py`'s
/// `PythonHadoopMapReduceKernel.run`.
pub struct PyHmrRunner;

impl Runner for PyHmrRunner {
    fn short_help(&self) -> &'static str {
        "Hadoop map-reduce in python"
    }

    fn long_help(&self) -> &'static str {
        "This code block type encapsulates a Hadoop map-reduce task implemented in \
Python. The map-reduce capability is mediated through the Hadoop streaming API. \
This code block should contain two functions: map(stream) and reduce(stream). \
\n\nFor map(stream), stream is an iterable over string lines, no format assumed. \
The output should be printed to stdout with the format, string key-value pairs \
with some character separator (tab separators are typical). \
\n\nFor reduce(stream), stream is an iterable over the output of one or more \
map(stream) functions. The output of the reduce should also be string key-value \
pairs. \
\n\nNote that in order for this block to run, three environment variables MUST be \
set: PYHMR_INPUT, PYHMR_OUTPUT, and PYHMR_STREAMING_API_JAR."
    }

    fn env_vars_help(&self) -> EnvVarHelp {
        &[
            (HADOOP_CMD_EV, "the Hadoop executable that should be invoked. Default is \"hadoop\""),
            (PYTHON_CMD_EV, "the Python executable that should be invoked on the DataNodes. Default is \"python\""),
            (INPUT_EV, "the input files in the HDFS (required)"),
            (OUTPUT_EV, "the output location on the HDFS (required)"),
            (STREAMING_API_JAR_EV, "the absolute path to the streaming API jar included with the Hadoop installation (required)"),
            (EXTRA_FILES_EV, "any extra files that should be bundled with the task on the DataNodes"),
            (NUM_REDUCERS_EV, "the number of reducers that should be used in performing this task"),
            (
                TEST_CMD_EV,
                "a command that can be used to test this map-reduce task. If this is set, then the task will be run in test mode (Hadoop will not be run, the HDFS will not be accessed). The output of this command will be used as input to the mapper (which will then be used as input to the reducer). The output will be printed to STDOUT.",
            ),
            (TEST_OUTPUT_EV, "the file that the result of the test will be written to. If not specified, STDOUT will be used."),
        ]
    }

    fn run(&self, _arg_str: &str, context: &Context, cwd: &Path, content: &[String]) -> Result<(), RunnerError> {
        let hadoop_cmd = context.get(HADOOP_CMD_EV).cloned().unwrap_or_else(|| "hadoop".to_string());
        let python_cmd = context.get(PYTHON_CMD_EV).cloned().unwrap_or_else(|| "python".to_string());
        let streaming_api_jar = context.get(STREAMING_API_JAR_EV).cloned().unwrap_or_default();
        let input_location = context.get(INPUT_EV).cloned().unwrap_or_default();
        let output_location = context.get(OUTPUT_EV).cloned().unwrap_or_default();
        let extra_files = context.get(EXTRA_FILES_EV).cloned().unwrap_or_default();
        let num_reducers = context.get(NUM_REDUCERS_EV);
        let test_cmd = context.get(TEST_CMD_EV);
        let test_output = context.get(TEST_OUTPUT_EV);

        let mut mapper_source = content.join("\n");
        mapper_source.push_str(MAPPER_TRAMPOLINE);
        let mapper_path = write_temp_file(&[mapper_source], "_mapper.py")?;

        let mut reducer_source = content.join("\n");
        reducer_source.push_str(REDUCER_TRAMPOLINE);
        let reducer_path = write_temp_file(&[reducer_source], "_reducer.py")?;

        let cmd = if let Some(test_cmd) = test_cmd {
            tracing::warn!("running map-reduce task in test mode");
            let mut cmd = format!(
                "{test_cmd} | {python_cmd} {mapper} | {python_cmd} {reducer}",
                mapper = mapper_path.display(),
                reducer = reducer_path.display(),
            );
            if let Some(test_output) = test_output {
                cmd.push_str(&format!(" > {test_output}"));
            }
            cmd
        } else {
            tracing::info!("running map-reduce task in normal mode");
            let mut cmd = format!("{hadoop_cmd} jar {streaming_api_jar}");
            cmd.push_str(&format!(" -input \"{input_location}\" -output \"{output_location}\""));
            cmd.push_str(&format!(
                " -mapper \"{python_cmd} {}\" -reducer \"{python_cmd} {}\"",
                mapper_path.display(),
                reducer_path.display()
            ));
            cmd.push_str(&format!(
                " -files \"{},{},{}\"",
                mapper_path.display(),
                reducer_path.display(),
                extra_files
            ));
            if let Some(num_reducers) = num_reducers {
                cmd.push_str(&format!(" -D mapred.reduce.tasks={num_reducers}"));
            }
            cmd
        };

        run_shell_line(&cmd, context, cwd)
    }
}
