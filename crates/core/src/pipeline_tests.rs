use super::*;
use crate::resolver::Resolver;
use crate::test_support::write_pipeline;
use tempfile::tempdir;

#[test]
fn basic_preamble_builds_with_no_tasks() {
    let dir = tempdir().unwrap();
    let path = write_pipeline(dir.path(), "preamble1.pln", "X=1\nunset X\nY=2\n");

    let resolver = Resolver::new();
    let pipeline = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();

    assert!(pipeline.tasks().is_empty());
    let ctx = pipeline.context();
    assert_eq!(ctx.get("Y").map(String::as_str), Some("2"));
    assert!(!ctx.contains_key("X"));
}

#[test]
fn task_dependencies_link_in_declared_order() {
    let dir = tempdir().unwrap();
    let path = write_pipeline(
        dir.path(),
        "deps.pln",
        "task1:\ntask2:\ntask3: task1 task2\n",
    );

    let resolver = Resolver::new();
    let pipeline = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();

    let t3 = pipeline.get_task("task3").unwrap();
    let deps: Vec<String> = t3
        .dependencies()
        .iter()
        .map(|d| d.get().unwrap().name.clone())
        .collect();
    assert_eq!(deps, vec!["task1".to_string(), "task2".to_string()]);
}

#[test]
fn unknown_dependency_is_a_resolution_error() {
    let dir = tempdir().unwrap();
    let path = write_pipeline(dir.path(), "bad.pln", "task1: nope\n");

    let resolver = Resolver::new();
    let err = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap_err();
    assert!(matches!(err, ResolveError::UnknownDependency(_, _, _)));
}

#[test]
fn extend_overrides_task_by_name_and_prepends_base_tasks() {
    let dir = tempdir().unwrap();
    write_pipeline(dir.path(), "base.pln", "task1:\ntask2: task1\n");
    let path = write_pipeline(
        dir.path(),
        "extend1.pln",
        "extend base.pln\ntask2: task1\nextra1: task2\n",
    );

    let resolver = Resolver::new();
    let pipeline = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();

    let names: Vec<&str> = pipeline.tasks().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["task1", "task2", "extra1"]);

    let extra1 = pipeline.get_task("extra1").unwrap();
    assert_eq!(extra1.dependencies()[0].get().unwrap().name, "task2");
}

#[test]
fn use_statement_allows_cross_pipeline_dependency() {
    let dir = tempdir().unwrap();
    write_pipeline(dir.path(), "lib.pln", "libtask:\n");
    let path = write_pipeline(
        dir.path(),
        "main.pln",
        "use lib.pln as lib\nmaintask: lib.libtask\n",
    );

    let resolver = Resolver::new();
    let pipeline = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();

    let maintask = pipeline.get_task("maintask").unwrap();
    let dep = maintask.dependencies()[0].get().unwrap();
    assert_eq!(dep.name, "libtask");
}

#[test]
fn unknown_alias_in_dependency_is_a_resolution_error() {
    let dir = tempdir().unwrap();
    let path = write_pipeline(dir.path(), "main.pln", "maintask: missing.libtask\n");

    let resolver = Resolver::new();
    let err = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap_err();
    assert!(matches!(err, ResolveError::UnknownAlias(_, _, _)));
}

#[test]
fn extend_cycle_is_detected() {
    let dir = tempdir().unwrap();
    write_pipeline(dir.path(), "a.pln", "extend b.pln\n");
    let b = write_pipeline(dir.path(), "b.pln", "extend a.pln\n");

    let resolver = Resolver::new();
    let err = resolver.get_pipeline(&b, Prefix::default_dir()).unwrap_err();
    assert!(matches!(err, ResolveError::Cycle(_)));
}

#[test]
fn abstract_pipeline_suffix_is_recognized() {
    let dir = tempdir().unwrap();
    let path = write_pipeline(dir.path(), "lib.abstract.pln", "task1:\n");

    let resolver = Resolver::new();
    let pipeline = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();
    assert!(pipeline.is_abstract);
    assert_eq!(pipeline.name, "lib");
}

#[test]
fn visitation_list_orders_roots_before_leaves() {
    let dir = tempdir().unwrap();
    let path = write_pipeline(
        dir.path(),
        "chain.pln",
        "task1:\ntask2: task1\ntask3: task2\n",
    );

    let resolver = Resolver::new();
    let pipeline = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();

    let list = pipeline.get_visitation_list();
    let names: Vec<&str> = list.iter().map(|(t, _)| t.name.as_str()).collect();
    assert_eq!(names, vec!["task1", "task2", "task3"]);
}

#[test]
fn leaves_are_tasks_nothing_else_depends_on() {
    let dir = tempdir().unwrap();
    let path = write_pipeline(
        dir.path(),
        "chain.pln",
        "task1:\ntask2: task1\ntask3: task2\n",
    );

    let resolver = Resolver::new();
    let pipeline = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();

    let leaves = get_leaves(pipeline.tasks());
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].name, "task3");
}

#[test]
fn task_properties_survive_into_resolved_pipeline() {
    let dir = tempdir().unwrap();
    let path = write_pipeline(dir.path(), "props.pln", "# owner: alice\ntask1:\n");

    let resolver = Resolver::new();
    let pipeline = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();
    let t = pipeline.get_task("task1").unwrap();
    assert_eq!(t.properties.get("owner").map(String::as_str), Some("alice"));
}
