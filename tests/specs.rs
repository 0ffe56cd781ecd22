//! End-to-end coverage of the literal scenarios, run through the compiled binary.

use assert_cmd::Command;
use std::fs;
use std::path::Path;

fn trestle() -> Command {
    Command::cargo_bin("trestle").unwrap()
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn tasks2_run_produces_marks_and_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "tasks2.pln",
        "\
PYTHON_CMD=python3

task1:
    code.shell:
        touch task1_artifact

task2: task1
    code.shell:
        touch task2_foobar.sh
    code.python:
        open('task2_foobar.py', 'w').close()
",
    );

    trestle().arg("run").arg(&path).assert().success();

    for name in [
        ".tasks2-task1.mark",
        ".tasks2-task2.mark",
        "task2_foobar.sh",
        "task2_foobar.py",
    ] {
        assert!(dir.path().join(name).exists(), "missing {name}");
    }
}

#[test]
fn extend_overriding_runs_inherited_and_new_tasks() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "tasks2.pln",
        "\
task1:
    code.shell:
        touch task1_artifact

task2: task1
    code.shell:
        touch task2_foobar.sh
",
    );
    let extend_path = write(
        dir.path(),
        "extend1.pln",
        "\
extend tasks2.pln

extra1: task2
    code.shell:
        touch extend1_2.txt
",
    );

    trestle().arg("run").arg(&extend_path).assert().success();

    for name in [
        ".extend1-task1.mark",
        ".extend1-task2.mark",
        ".extend1-extra1.mark",
        "extend1_2.txt",
    ] {
        assert!(dir.path().join(name).exists(), "missing {name}");
    }
}

#[test]
fn force_top_skips_the_already_marked_leaf_dependency() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "force_test.pln",
        "\
t1:
    code.shell:
        touch t1_artifact

t2: t1
    code.shell:
        touch t2_artifact

t3: t2
    code.shell:
        touch t3_artifact
",
    );

    trestle().arg("mark").arg(&path).arg("t1").assert().success();
    trestle().arg("mark").arg(&path).arg("t3").assert().success();

    trestle().arg("run").arg("-T").arg(&path).arg("t3").assert().success();

    assert!(!dir.path().join("t1_artifact").exists());
    assert!(dir.path().join("t2_artifact").exists());
    assert!(dir.path().join("t3_artifact").exists());
}

#[test]
fn mtime_rerun_recreates_a_stale_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "tasks2.pln",
        "\
task1:
    code.shell:
        touch task1_artifact

task2: task1
    code.shell:
        touch task2_foobar.sh
",
    );

    trestle().arg("run").arg(&path).assert().success();
    fs::remove_file(dir.path().join("task2_foobar.sh")).unwrap();

    let task1_mark = dir.path().join(".tasks2-task1.mark");
    let task2_mark = dir.path().join(".tasks2-task2.mark");
    let task2_mtime =
        filetime::FileTime::from_last_modification_time(&fs::metadata(&task2_mark).unwrap());
    let newer = filetime::FileTime::from_unix_time(task2_mtime.seconds() + 5, 0);
    filetime::set_file_mtime(&task1_mark, newer).unwrap();

    trestle().arg("run").arg(&path).arg("task2").assert().success();

    assert!(dir.path().join("task2_foobar.sh").exists());
}

#[test]
fn mark_then_unmark_restores_absence() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "single.pln",
        "\
t1:
    code.shell:
        touch t1_artifact
",
    );

    trestle().arg("mark").arg(&path).arg("t1").assert().success();
    assert!(dir.path().join(".single-t1.mark").exists());

    trestle().arg("unmark").arg(&path).arg("t1").assert().success();
    assert!(!dir.path().join(".single-t1.mark").exists());
}

#[test]
fn solo_runs_only_the_named_task() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "solo_test.pln",
        "\
t1:
    code.shell:
        touch t1_artifact

t2: t1
    code.shell:
        touch t2_artifact
",
    );

    trestle().arg("run").arg("-S").arg(&path).arg("t2").assert().success();

    assert!(!dir.path().join("t1_artifact").exists());
    assert!(dir.path().join("t2_artifact").exists());
}

#[test]
fn fully_marked_pipeline_under_force_none_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "noop.pln",
        "\
t1:
    code.shell:
        touch t1_artifact
",
    );

    trestle().arg("run").arg(&path).assert().success();
    fs::remove_file(dir.path().join("t1_artifact")).unwrap();

    trestle().arg("run").arg(&path).assert().success();
    assert!(!dir.path().join("t1_artifact").exists());
}

#[test]
fn a_parse_error_reports_source_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "broken.pln",
        "\
task1:
    !!! not a block
",
    );

    let assert = trestle().arg("run").arg(&path).assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("broken.pln:2"), "stderr was: {stderr}");
}

#[test]
fn codeblock_info_lists_every_builtin_runner() {
    let assert = trestle().arg("codeblock-info").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    for tag in ["shell", "python", "gnuplot", "awk", "python-hadoop-mapreduce"] {
        assert!(stdout.contains(tag), "missing tag {tag} in: {stdout}");
    }
}

#[test]
fn tasks_subcommand_prints_unmarked_tasks_as_dashes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "listing.pln",
        "\
t1:
    code.shell:
        touch t1_artifact
",
    );

    let assert = trestle().arg("tasks").arg(&path).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    similar_asserts::assert_eq!(stdout.trim_end(), "listing/t1    --");
}
