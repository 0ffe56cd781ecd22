use super::*;
use crate::ast::{ExportStmt, PrefixKind, PreambleStmt, RawBlock};
use std::path::PathBuf;

fn src() -> PathBuf {
    PathBuf::from("test.pln")
}

#[test]
fn basic_preamble_three_statements_no_tasks() {
    let text = "X=1\nunset X\nY=2\n";
    let p = parse_pipeline_str(&src(), text).unwrap();

    assert_eq!(p.statements.len(), 3);
    assert_eq!(p.tasks.len(), 0);
    assert!(matches!(p.statements[0], PreambleStmt::VariableAssignment { .. }));
    assert!(matches!(p.statements[1], PreambleStmt::DeleteVariable { .. }));
    assert!(matches!(p.statements[2], PreambleStmt::VariableAssignment { .. }));
}

#[test]
fn preamble_recognizes_prefix_extend_and_use() {
    let text = "prefix dir output\nextend other.pln\nuse other.pln as other\n";
    let p = parse_pipeline_str(&src(), text).unwrap();

    assert_eq!(p.statements.len(), 3);
    match &p.statements[0] {
        PreambleStmt::Prefix { kind, value, .. } => {
            assert_eq!(*kind, PrefixKind::Dir);
            assert_eq!(value.as_deref(), Some("output"));
        }
        other => panic!("expected Prefix, got {other:?}"),
    }
    assert!(matches!(p.statements[1], PreambleStmt::Extend { .. }));
    match &p.statements[2] {
        PreambleStmt::Use { alias, .. } => assert_eq!(alias.as_deref(), Some("other")),
        other => panic!("expected Use, got {other:?}"),
    }
}

#[test]
fn comment_and_blank_lines_are_skipped_in_preamble() {
    let text = "# a comment\n\nX=1\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    assert_eq!(p.statements.len(), 1);
}

#[test]
fn multiline_comment_block_is_skipped_in_preamble() {
    let text = "###\nthis is not a statement = broken\n###\nX=1\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    assert_eq!(p.statements.len(), 1);
}

#[test]
fn single_task_with_no_dependencies_and_no_blocks() {
    let text = "task1:\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    assert_eq!(p.tasks.len(), 1);
    assert_eq!(p.tasks[0].name, "task1");
    assert!(p.tasks[0].dep_names.is_empty());
    assert!(p.tasks[0].blocks.is_empty());
}

#[test]
fn task_dependencies_are_parsed_in_order() {
    let text = "task1:\ntask2: task1\ntask3: task1 task2\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    assert_eq!(p.tasks[2].dep_names, vec!["task1".to_string(), "task2".to_string()]);
}

#[test]
fn invalid_dependency_token_is_a_parse_error() {
    let text = "task1: not-valid\n";
    let err = parse_pipeline_str(&src(), text).unwrap_err();
    assert!(matches!(err, ParseError::InvalidDependency(_, _)));
}

#[test]
fn task_with_code_block() {
    let text = "task1:\n    code.shell:\n        echo hi\n        echo bye\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    assert_eq!(p.tasks[0].blocks.len(), 1);
    match &p.tasks[0].blocks[0] {
        RawBlock::Code { lang, content, .. } => {
            assert_eq!(lang, "shell");
            assert_eq!(content, &vec!["echo hi".to_string(), "echo bye".to_string()]);
        }
        other => panic!("expected Code block, got {other:?}"),
    }
}

#[test]
fn code_block_content_linenos_track_original_file() {
    let text = "task1:\n    code.shell:\n        echo hi\n        echo bye\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    match &p.tasks[0].blocks[0] {
        RawBlock::Code { content_linenos, .. } => {
            // 1-based: lines 3 and 4 in the source file.
            assert_eq!(content_linenos, &vec![2, 3]);
        }
        other => panic!("expected Code block, got {other:?}"),
    }
}

#[test]
fn export_block_parses_assignments_and_unset_with_correct_linenos() {
    let text = "task1:\n    export:\n        A=1\n        unset B\n        C=3\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    match &p.tasks[0].blocks[0] {
        RawBlock::Export { statements, .. } => {
            assert_eq!(statements.len(), 3);
            match &statements[0] {
                ExportStmt::Assign { name, value, loc } => {
                    assert_eq!(name, "A");
                    assert_eq!(value, "1");
                    assert_eq!(loc.lineno, 3);
                }
                other => panic!("expected Assign, got {other:?}"),
            }
            match &statements[1] {
                ExportStmt::Delete { name, loc } => {
                    assert_eq!(name, "B");
                    assert_eq!(loc.lineno, 4);
                }
                other => panic!("expected Delete, got {other:?}"),
            }
        }
        other => panic!("expected Export block, got {other:?}"),
    }
}

#[test]
fn export_block_rejects_an_argument_string() {
    let text = "task1:\n    export: foo\n        A=1\n";
    let err = parse_pipeline_str(&src(), text).unwrap_err();
    assert!(matches!(err, ParseError::ExportBlockHasArgString(_)));
}

#[test]
fn export_block_rejects_a_non_assignment_line() {
    let text = "task1:\n    export:\n        not an assignment\n";
    let err = parse_pipeline_str(&src(), text).unwrap_err();
    assert!(matches!(err, ParseError::ExpectedVariableAssignment(_, _)));
}

#[test]
fn task_properties_captured_from_preceding_comments() {
    let text = "# owner: alice\n# priority: high\ntask1:\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    assert_eq!(p.tasks[0].properties.get("owner").map(String::as_str), Some("alice"));
    assert_eq!(p.tasks[0].properties.get("priority").map(String::as_str), Some("high"));
}

#[test]
fn blank_line_between_comments_and_task_clears_properties() {
    let text = "# owner: alice\n\ntask1:\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    assert!(p.tasks[0].properties.is_empty());
}

#[test]
fn unindented_comment_line_between_blocks_is_an_error() {
    let text = "task1:\n    code.shell:\n        echo hi\n    ###\nnot indented\n    ###\n    code.python:\n        print(1)\n";
    let err = parse_pipeline_str(&src(), text).unwrap_err();
    assert!(matches!(err, ParseError::UnindentedCommentLine(_)));
}

#[test]
fn two_tasks_each_with_their_own_block() {
    let text = "task1:\n    code.shell:\n        echo one\ntask2: task1\n    code.python:\n        print(2)\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    assert_eq!(p.tasks.len(), 2);
    assert_eq!(p.tasks[1].dep_names, vec!["task1".to_string()]);
    match &p.tasks[1].blocks[0] {
        RawBlock::Code { lang, .. } => assert_eq!(lang, "python"),
        other => panic!("expected Code block, got {other:?}"),
    }
}

#[test]
fn dependency_comment_after_hash_is_ignored() {
    let text = "task1:\ntask2: task1 # why we depend\n";
    let p = parse_pipeline_str(&src(), text).unwrap();
    assert_eq!(p.tasks[1].dep_names, vec!["task1".to_string()]);
}
