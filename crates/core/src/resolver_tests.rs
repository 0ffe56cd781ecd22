use super::*;
use crate::prefix::Prefix;
use crate::test_support::write_pipeline;
use std::rc::Rc;
use tempfile::tempdir;

#[test]
fn repeated_loads_of_the_same_path_return_the_same_pipeline() {
    let dir = tempdir().unwrap();
    let path = write_pipeline(dir.path(), "p.pln", "task1:\n");

    let resolver = Resolver::new();
    let a = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();
    let b = resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();

    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(resolver.cached_count(), 1);
}

#[test]
fn missing_pipeline_file_is_reported() {
    let resolver = Resolver::new();
    let err = resolver
        .get_pipeline(Path::new("/no/such/pipeline.pln"), Prefix::default_dir())
        .unwrap_err();
    assert!(matches!(err, ResolveError::PipelineNotFound(_)));
}

#[test]
fn extended_and_used_pipelines_are_cached_too() {
    let dir = tempdir().unwrap();
    write_pipeline(dir.path(), "lib.pln", "libtask:\n");
    let path = write_pipeline(
        dir.path(),
        "main.pln",
        "use lib.pln as lib\nmaintask: lib.libtask\n",
    );

    let resolver = Resolver::new();
    resolver.get_pipeline(&path, Prefix::default_dir()).unwrap();

    assert_eq!(resolver.cached_count(), 2);
}
