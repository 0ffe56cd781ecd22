use crate::error::RunnerError;
use crate::runners;
use std::collections::HashMap;
use std::path::Path;
use trestle_expand::Context;

/// One environment variable a runner reads, and what it means — purely descriptive, surfaced by
/// the `codeblock_info` CLI subcommand.
pub type EnvVarHelp = &'static [(&'static str, &'static str)];

/// A pluggable code-block executor, keyed in the [`Registry`] by language tag.
pub trait Runner {
    fn short_help(&self) -> &'static str;
    fn long_help(&self) -> &'static str;
    fn env_vars_help(&self) -> EnvVarHelp;

    /// Run the block. `content` is already variable-expanded.
    fn run(&self, arg_str: &str, context: &Context, cwd: &Path, content: &[String]) -> Result<(), RunnerError>;
}

/// Process-wide mapping from language tag (the bit after `code.` in a task block header) to the
/// runner that executes it.
pub struct Registry {
    runners: HashMap<String, Box<dyn Runner>>,
}

impl Registry {
    pub fn empty() -> Self {
        Registry {
            runners: HashMap::new(),
        }
    }

    /// The registry with every built-in runner installed under its default tag.
    pub fn with_builtins() -> Self {
        let mut registry = Registry::empty();
        registry.insert_unchecked("shell", Box::new(runners::shell::ShellRunner));
        registry.insert_unchecked("python", Box::new(runners::python::PythonRunner));
        registry.insert_unchecked("gnuplot", Box::new(runners::gnuplot::GnuplotRunner));
        registry.insert_unchecked("awk", Box::new(runners::awk::AwkRunner));
        registry.insert_unchecked("test", Box::new(runners::test::TestRunner));
        registry.insert_unchecked("python-hadoop-mapreduce", Box::new(runners::pyhmr::PyHmrRunner));
        registry
    }

    /// A registry built from a closed subset of the built-in runners, each optionally installed
    /// under a custom tag. `selections` is `(default_tag, install_as)`. Used by the
    /// configuration-driven registration style: Rust has no equivalent to the original tool's
    /// class-path loading, so a config file can only select and rename among the fixed built-ins
    /// rather than load arbitrary code.
    pub fn with_selected<'a>(selections: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, RunnerError> {
        let mut registry = Registry::empty();
        for (default_tag, install_as) in selections {
            let runner = builtin_runner(default_tag).ok_or_else(|| RunnerError::UnknownLanguageTag {
                tag: default_tag.to_string(),
            })?;
            registry.register(install_as, runner)?;
        }
        Ok(registry)
    }

    fn insert_unchecked(&mut self, tag: &str, runner: Box<dyn Runner>) {
        self.runners.insert(tag.to_string(), runner);
    }

    pub fn register(&mut self, tag: &str, runner: Box<dyn Runner>) -> Result<(), RunnerError> {
        if self.runners.contains_key(tag) {
            return Err(RunnerError::DuplicateTag { tag: tag.to_string() });
        }
        self.runners.insert(tag.to_string(), runner);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Result<&dyn Runner, RunnerError> {
        self.runners
            .get(tag)
            .map(|b| b.as_ref())
            .ok_or_else(|| RunnerError::UnknownLanguageTag { tag: tag.to_string() })
    }

    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.runners.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::with_builtins()
    }
}

fn builtin_runner(tag: &str) -> Option<Box<dyn Runner>> {
    match tag {
        "shell" => Some(Box::new(runners::shell::ShellRunner)),
        "python" => Some(Box::new(runners::python::PythonRunner)),
        "gnuplot" => Some(Box::new(runners::gnuplot::GnuplotRunner)),
        "awk" => Some(Box::new(runners::awk::AwkRunner)),
        "test" => Some(Box::new(runners::test::TestRunner)),
        "python-hadoop-mapreduce" => Some(Box::new(runners::pyhmr::PyHmrRunner)),
        _ => None,
    }
}
