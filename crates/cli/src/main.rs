//! trestle - run indentation-driven task pipelines

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod config;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use trestle_core::{Force, Prefix, ResolveError, Resolver};
use trestle_engine::{run_pipeline, run_task};
use trestle_parse::ParseError;

#[derive(Parser)]
#[command(name = "trestle", version, about = "Run indentation-driven task pipelines")]
struct Cli {
    /// Logging verbosity
    #[arg(short = 'l', long = "log-level", global = true, default_value = "warn")]
    log_level: String,

    /// Configuration file selecting active code-block runners
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one line per task in visitation order
    Tasks(TasksArgs),
    /// Create mark files
    Mark(MarkArgs),
    /// Delete mark files
    Unmark(MarkArgs),
    /// Run a pipeline, or a single named task within it
    Run(RunArgs),
    /// List runners, or print the long help for one
    CodeblockInfo(CodeblockInfoArgs),
}

#[derive(clap::Args)]
struct TasksArgs {
    pipeline_file: PathBuf,
}

#[derive(clap::Args)]
struct MarkArgs {
    /// Permit marking/unmarking an entire pipeline with no tasks named
    #[arg(short = 'f', long = "force")]
    force: bool,
    /// Cascade into used pipelines
    #[arg(short = 'r', long = "recur")]
    recur: bool,
    pipeline_file: PathBuf,
    /// If omitted, the entire pipeline is marked/unmarked
    task_names: Vec<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
enum ForceFlag {
    None,
    Top,
    All,
    Solo,
}

impl From<ForceFlag> for Force {
    fn from(f: ForceFlag) -> Force {
        match f {
            ForceFlag::None => Force::None,
            ForceFlag::Top => Force::Top,
            ForceFlag::All => Force::All,
            ForceFlag::Solo => Force::Solo,
        }
    }
}

#[derive(clap::Args)]
struct RunArgs {
    /// Force tasks to run even if already marked
    #[arg(short = 'f', long = "force", value_enum, default_value = "NONE")]
    force: ForceFlag,
    /// Force the named (or top-level) task(s) to run. Equivalent to --force=TOP
    #[arg(short = 'T')]
    top: bool,
    /// Force every task encountered to run. Equivalent to --force=ALL
    #[arg(short = 'A')]
    all: bool,
    /// Force the named task, but not its dependencies. Equivalent to --force=SOLO
    #[arg(short = 'S')]
    solo: bool,
    pipeline_file: PathBuf,
    /// If omitted, the entire pipeline is run
    task_name: Option<String>,
}

#[derive(clap::Args)]
struct CodeblockInfoArgs {
    lang: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = dispatch(cli) {
        eprintln!("{}", CliError::from(e));
        std::process::exit(1);
    }
}

fn init_logging(log_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

/// The CLI's rendering of a failure: a parse error gets the original's special-cased
/// `parsing error on line N: msg` (no source path — matches `xp/app.py`'s `main()`); anything
/// else is a single-line message. Full chains surface at DEBUG/INFO via `tracing::error!`'s
/// structured fields rather than here.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("parsing error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("{0}")]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        let parse_err = match err.downcast_ref::<ResolveError>() {
            Some(ResolveError::Parse(p)) => Some(p),
            _ => err.downcast_ref::<ParseError>(),
        };
        match parse_err {
            Some(p) => CliError::Parse {
                line: p.location().lineno,
                message: p.message(),
            },
            None => CliError::Other(err),
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let resolver = Resolver::new();

    match cli.command {
        Command::Tasks(args) => do_tasks(&resolver, &args),
        Command::Mark(args) => do_mark(&resolver, &args),
        Command::Unmark(args) => do_unmark(&resolver, &args),
        Command::Run(args) => do_run(&resolver, &cli.config, &args),
        Command::CodeblockInfo(args) => do_codeblock_info(&cli.config, &args),
    }
}

fn load_pipeline(resolver: &Resolver, path: &std::path::Path) -> Result<std::rc::Rc<trestle_core::Pipeline>> {
    Ok(resolver.get_pipeline(path, Prefix::default_dir())?)
}

fn do_tasks(resolver: &Resolver, args: &TasksArgs) -> Result<()> {
    let pipeline = load_pipeline(resolver, &args.pipeline_file)?;
    let visitation_list = pipeline.get_visitation_list();

    let width = visitation_list
        .iter()
        .map(|(t, _)| task_display_name(t).len())
        .max()
        .unwrap_or(0)
        + 4;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (task, _depth) in visitation_list {
        let name = task_display_name(&task);
        let stamp = match task.mark_timestamp() {
            Some(ts) => format_timestamp(ts),
            None => "--".to_string(),
        };
        writeln!(out, "{name:width$}{stamp}")?;
    }
    Ok(())
}

fn task_display_name(task: &trestle_core::Task) -> String {
    match task.pipeline() {
        Some(p) => format!("{}/{}", p.name, task.name),
        None => task.name.clone(),
    }
}

fn format_timestamp(ts: std::time::SystemTime) -> String {
    match ts.duration_since(UNIX_EPOCH) {
        Ok(d) => format!("{}", d.as_secs()),
        Err(_) => "--".to_string(),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} (y/n) ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn do_mark(resolver: &Resolver, args: &MarkArgs) -> Result<()> {
    let pipeline = load_pipeline(resolver, &args.pipeline_file)?;

    if args.task_names.is_empty() {
        let proceed = args.force || confirm("are you sure you want to mark the entire pipeline?")?;
        if !proceed {
            println!("marking operation aborted");
            return Ok(());
        }
        pipeline.mark_all_tasks(args.recur)?;
    } else {
        for name in &args.task_names {
            let task = pipeline
                .get_task(name)
                .ok_or_else(|| anyhow::anyhow!("task {name} does not exist"))?;
            task.mark()?;
        }
    }
    Ok(())
}

fn do_unmark(resolver: &Resolver, args: &MarkArgs) -> Result<()> {
    let pipeline = load_pipeline(resolver, &args.pipeline_file)?;

    if args.task_names.is_empty() {
        let proceed = args.force || confirm("are you sure you want to unmark the entire pipeline?")?;
        if !proceed {
            println!("unmarking operation aborted");
            return Ok(());
        }
        pipeline.unmark_all_tasks(args.recur)?;
    } else {
        for name in &args.task_names {
            let task = pipeline
                .get_task(name)
                .ok_or_else(|| anyhow::anyhow!("task {name} does not exist"))?;
            task.unmark()?;
        }
    }
    Ok(())
}

fn do_run(resolver: &Resolver, config: &Option<PathBuf>, args: &RunArgs) -> Result<()> {
    let num_forcings =
        (args.force != ForceFlag::None) as u8 + args.top as u8 + args.all as u8 + args.solo as u8;
    if num_forcings > 1 {
        bail!("force status specified too many times. Forcing can only be specified once");
    }

    let mut force: Force = args.force.into();
    if args.top {
        force = Force::Top;
    } else if args.all {
        force = Force::All;
    } else if args.solo {
        force = Force::Solo;
    }

    if args.task_name.is_none() && force == Force::Solo {
        bail!("force status SOLO can only be used when a task has been explicitly specified");
    }

    let pipeline = load_pipeline(resolver, &args.pipeline_file)?;
    let registry = config::load_registry(config.as_deref())?;

    let tasks_run = match &args.task_name {
        None => run_pipeline(&pipeline, &registry, force)?,
        Some(name) => {
            let task = pipeline
                .get_task(name)
                .ok_or_else(|| anyhow::anyhow!("task {name} does not exist"))?;
            run_task(&task, &registry, force)?
        }
    };

    if tasks_run.is_empty() {
        tracing::warn!("nothing to do: every task is already marked and up to date");
    }
    Ok(())
}

fn do_codeblock_info(config: &Option<PathBuf>, args: &CodeblockInfoArgs) -> Result<()> {
    let registry = config::load_registry(config.as_deref())?;

    match &args.lang {
        None => {
            let tags = registry.tags();
            let width = tags.iter().map(|t| t.len()).max().unwrap_or(0) + 2;
            println!("Supported code blocks:");
            for tag in tags {
                let runner = registry.get(tag)?;
                println!("  {tag:width$}{}", runner.short_help());
            }
        }
        Some(lang) => match registry.get(lang) {
            Ok(runner) => {
                println!("Code block type \"{lang}\":");
                println!();
                println!("{}", runner.long_help());
                for (var, help) in runner.env_vars_help() {
                    println!("  {var}: {help}");
                }
            }
            Err(_) => println!("code prefix \"{lang}\" is unknown"),
        },
    }
    Ok(())
}
