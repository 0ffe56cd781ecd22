use crate::error::RunError;
use crate::registry::Registry;
use std::rc::Rc;
use trestle_core::{get_leaves, Block, Force, Pipeline, Task};
use trestle_expand::{expand, Context, Location};

/// Run every leaf task of `pipeline`, recursing into dependencies as each task's forcing mode
/// dictates. Returns the tasks that actually executed, in the order they finished.
pub fn run_pipeline(pipeline: &Rc<Pipeline>, registry: &Registry, force: Force) -> Result<Vec<Rc<Task>>, RunError> {
    if pipeline.is_abstract {
        return Err(RunError::AbstractRunRefused {
            pipeline: pipeline.abs_filename.clone(),
        });
    }

    pipeline.rebuild_context()?;

    let mut tasks_run = Vec::new();
    for leaf in get_leaves(pipeline.tasks()) {
        tracing::debug!(task = %leaf.name, "running task");
        tasks_run.extend(run_task(&leaf, registry, force)?);
    }
    Ok(tasks_run)
}

/// Run a single task (and, depending on `force`, its dependencies). Mirrors
/// `xp/pipeline.py`'s `Task.run`.
pub fn run_task(task: &Rc<Task>, registry: &Registry, force: Force) -> Result<Vec<Rc<Task>>, RunError> {
    let pipeline = task
        .pipeline()
        .unwrap_or_else(|| unreachable!("task outlived the pipeline that owns it"));

    let span = tracing::info_span!("task_run", pipeline = %pipeline.name, task = %task.name);
    let _guard = span.enter();

    if pipeline.is_abstract {
        return Err(RunError::AbstractRunRefused {
            pipeline: pipeline.abs_filename.clone(),
        });
    }

    pipeline.pre_run()?;

    let mut tasks_run = Vec::new();

    if force != Force::Solo {
        let dep_force = if force == Force::All { Force::All } else { Force::None };
        for dep in task.dependencies() {
            if let Some(d) = dep.get() {
                tasks_run.extend(run_task(&d, registry, dep_force)?);
            }
        }
    } else {
        tracing::debug!("skipping dependencies, solo mode");
    }

    let run_now = if force != Force::None {
        true
    } else if !task.is_marked() {
        true
    } else {
        let mst = task.mark_timestamp();
        task.dependencies().iter().any(|dep| {
            dep.get()
                .is_some_and(|d| mst < d.mark_timestamp())
        })
    };

    if !run_now {
        return Ok(tasks_run);
    }

    let mut context = pipeline.context();
    let cwd = pipeline.abs_path().to_path_buf();

    for block in &task.blocks {
        run_block(block, &mut context, &cwd, &pipeline, task, registry)?;
    }

    task.mark()?;
    tasks_run.push(task.clone());

    Ok(tasks_run)
}

fn run_block(
    block: &Block,
    context: &mut Context,
    cwd: &std::path::Path,
    pipeline: &Rc<Pipeline>,
    task: &Rc<Task>,
    registry: &Registry,
) -> Result<(), RunError> {
    match block {
        Block::Export { statements } => {
            for stmt in statements {
                match stmt {
                    trestle_core::ExportStmt::Assign { name, value, loc } => {
                        let expanded = expand(value, context, cwd, pipeline.as_ref(), loc)?;
                        context.insert(name.clone(), expanded);
                    }
                    trestle_core::ExportStmt::Delete { name, .. } => {
                        context.remove(name);
                    }
                }
            }
            Ok(())
        }
        Block::Code {
            lang,
            arg_str,
            content,
            loc,
            content_linenos,
        } => {
            let expanded_arg = expand(arg_str, context, cwd, pipeline.as_ref(), loc)?;

            let mut expanded_content = Vec::with_capacity(content.len());
            for (line, lineno) in content.iter().zip(content_linenos) {
                let line_loc = Location::new(loc.source(), *lineno);
                expanded_content.push(expand(line, context, cwd, pipeline.as_ref(), &line_loc)?);
            }

            tracing::info!(tag = %lang, arg_str = %expanded_arg, "dispatching code block");
            let runner = registry.get(lang).map_err(|e| RunError::BlockFailed {
                task: task.name.clone(),
                source: e,
            })?;
            runner
                .run(&expanded_arg, context, cwd, &expanded_content)
                .map_err(|e| RunError::BlockFailed {
                    task: task.name.clone(),
                    source: e,
                })
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
