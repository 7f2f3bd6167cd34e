use shoal_lang::ast::{Expression, PipelineElement, Statement};
use shoal_lang::{parser, ErrorKind};

#[test]
fn declarations_and_statements_keep_their_order() {
    let program = parser::parse(
        r#"
        import "lib/strings" as strs
        struct Point { x: int, y: int }
        func origin(): Point {
            return Point { x: 0, y: 0 }
        }
        let p = origin()
        print(p.x)
        "#,
    )
    .unwrap();

    assert_eq!(program.imports.len(), 1);
    assert_eq!(program.imports[0].alias, "strs");
    assert_eq!(program.structs.len(), 1);
    assert_eq!(program.functions.len(), 1);
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn import_alias_defaults_to_the_last_path_segment() {
    let program = parser::parse(r#"import "lib/strings""#).unwrap();
    assert_eq!(program.imports[0].alias, "strings");
}

#[test]
fn duplicate_top_level_names_are_rejected() {
    let e = parser::parse(
        r#"
        func f() {}
        struct f { x: int }
        "#,
    )
    .unwrap_err();
    assert_eq!(e.kind, ErrorKind::Structural);
}

#[test]
fn open_constructs_report_incomplete_input() {
    for source in [
        "func f() {",
        "let x = ",
        "if x < 1 {\n  print(x)",
        r#"let s = "unterminated"#,
        "[1, 2,",
        "import",
    ] {
        let e = parser::parse(source).unwrap_err();
        assert!(e.is_incomplete(), "{:?} should be incomplete: {}", source, e);
    }
}

#[test]
fn plain_syntax_errors_are_not_incomplete() {
    let e = parser::parse("let 5 = 3").unwrap_err();
    assert_eq!(e.kind, ErrorKind::Parser);

    let e = parser::parse("func f() { } }").unwrap_err();
    assert_eq!(e.kind, ErrorKind::Parser);
}

#[test]
fn an_if_condition_never_starts_a_struct_literal() {
    let program = parser::parse("if x { print(1) }").unwrap();
    match &program.statements[0] {
        Statement::If { condition, .. } => {
            assert!(matches!(condition, Expression::Identifier { .. }));
        }
        other => panic!("expected an if statement, got {:?}", other),
    }
}

#[test]
fn parenthesized_conditions_allow_struct_literals() {
    let program = parser::parse("if (Point { x: 1 } == p) { print(1) }").unwrap();
    assert!(matches!(program.statements[0], Statement::If { .. }));
}

#[test]
fn else_if_chains_nest_as_blocks() {
    let program = parser::parse(
        r#"
        if a {
            print(1)
        } else if b {
            print(2)
        } else {
            print(3)
        }
        "#,
    )
    .unwrap();
    match &program.statements[0] {
        Statement::If { else_block, .. } => {
            let nested = else_block.as_ref().expect("else block");
            assert_eq!(nested.statements.len(), 1);
            assert!(matches!(nested.statements[0], Statement::If { .. }));
        }
        other => panic!("expected an if statement, got {:?}", other),
    }
}

#[test]
fn pipelines_split_into_elements() {
    let program = parser::parse(r#"input | $grep("x") | $sort() | let out, err"#).unwrap();
    match &program.statements[0] {
        Statement::Pipeline(pipeline) => {
            assert_eq!(pipeline.elements.len(), 4);
            match &pipeline.elements[3] {
                PipelineElement::Let { names, .. } => {
                    assert_eq!(names, &["out".to_string(), "err".to_string()]);
                }
                other => panic!("expected a capture, got {:?}", other),
            }
        }
        other => panic!("expected a pipeline, got {:?}", other),
    }
}

#[test]
fn pipelines_may_continue_after_the_pipe() {
    let program = parser::parse(
        r#"
        input |
            $sort() |
            let out
        "#,
    )
    .unwrap();
    assert!(matches!(program.statements[0], Statement::Pipeline(_)));
}

#[test]
fn semicolons_and_newlines_both_separate_statements() {
    let program = parser::parse("let a = 1; let b = 2\nlet c = 3").unwrap();
    assert_eq!(program.statements.len(), 3);
}

#[test]
fn comments_are_ignored() {
    let program = parser::parse(
        r#"
        # leading comment
        let a = 1 # trailing comment
        "#,
    )
    .unwrap();
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn power_is_right_associative() {
    let program = parser::parse("a ^ b ^ c").unwrap();
    match &program.statements[0] {
        Statement::Expression(Expression::Binary { right, .. }) => {
            assert!(matches!(**right, Expression::Binary { .. }));
        }
        other => panic!("expected a binary expression, got {:?}", other),
    }
}

#[test]
fn process_calls_carry_their_command() {
    let program = parser::parse(r#"$grep("pattern", path)"#).unwrap();
    match &program.statements[0] {
        Statement::Expression(Expression::ProcessCall { command, args, .. }) => {
            assert_eq!(command, "grep");
            assert_eq!(args.len(), 2);
        }
        other => panic!("expected a process call, got {:?}", other),
    }
}

#[test]
fn multi_target_assignment_parses() {
    let program = parser::parse("a, b = b, a").unwrap();
    match &program.statements[0] {
        Statement::Assign {
            targets, values, ..
        } => {
            assert_eq!(targets.len(), 2);
            assert_eq!(values.len(), 2);
        }
        other => panic!("expected an assignment, got {:?}", other),
    }
}
