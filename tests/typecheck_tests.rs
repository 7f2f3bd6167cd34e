use shoal_lang::{
    parser, Completeness, ErrorKind, ScopeTree, ShoalError, Type, TypeList, Typechecker,
};

fn check(source: &str) -> Result<(TypeList, Completeness), ShoalError> {
    let program = parser::parse(source)?;
    let mut checker = Typechecker::new(".");
    let mut scope = ScopeTree::new();
    checker.check_program(&program, &mut scope)
}

fn check_types(source: &str) -> TypeList {
    let (types, _) = check(source).expect("program should type-check");
    types
}

fn check_err(source: &str) -> ShoalError {
    check(source).expect_err("program should be rejected")
}

#[test]
fn trailing_call_yields_the_program_type() {
    let types = check_types(
        r#"
        func f(): int {
            return 1337
        }
        f()
        "#,
    );
    assert_eq!(types, TypeList::single(Type::Integer));
}

#[test]
fn empty_array_without_annotation_is_rejected() {
    let e = check_err("let a = []");
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn empty_array_with_annotation_is_accepted() {
    let types = check_types(
        r#"
        let a: []int = []
        a
        "#,
    );
    assert_eq!(
        types,
        TypeList::single(Type::Array(Box::new(Type::Integer)))
    );
}

#[test]
fn annotation_must_agree_with_the_value() {
    let e = check_err(r#"let a: []int = [1.0]"#);
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn comparing_int_to_str_is_rejected() {
    let e = check_err(r#"5 == "asdf""#);
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn both_branches_returning_satisfies_the_declared_type() {
    check(
        r#"
        func sign(x: int): int {
            if x < 0 {
                return -1
            } else {
                return 1
            }
        }
        "#,
    )
    .unwrap();
}

#[test]
fn a_missing_else_path_is_incomplete() {
    let e = check_err(
        r#"
        func f(x: int): int {
            if x < 0 {
                return -1
            }
        }
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Completeness);
}

#[test]
fn a_loop_alone_never_guarantees_a_return() {
    let e = check_err(
        r#"
        func f(x: int): int {
            while x < 10 {
                return x
            }
        }
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Completeness);
}

#[test]
fn return_after_a_loop_completes_the_function() {
    check(
        r#"
        func f(x: int): int {
            while x < 10 {
                return x
            }
            return 10
        }
        "#,
    )
    .unwrap();
}

#[test]
fn diverging_return_types_are_rejected() {
    let e = check_err(
        r#"
        func f(x: int): int {
            if x < 0 {
                return 1
            } else {
                return "no"
            }
        }
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn a_failed_let_leaves_no_binding_behind() {
    let program = parser::parse(r#"let a = 5 == "x""#).unwrap();
    let mut checker = Typechecker::new(".");
    let mut scope = ScopeTree::new();
    assert!(checker.check_program(&program, &mut scope).is_err());
    assert!(!scope.contains("a"));
}

#[test]
fn multi_value_rhs_splices_flat() {
    let types = check_types(
        r#"
        func two(): int, str {
            return 1, "x"
        }
        let a, b, c = two(), 5
        b
        "#,
    );
    assert_eq!(types, TypeList::single(Type::Str));
}

#[test]
fn let_arity_mismatch_is_structural() {
    let e = check_err(
        r#"
        func two(): int, str {
            return 1, "x"
        }
        let a = two()
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Structural);
}

#[test]
fn struct_literal_checks_against_the_declaration() {
    let types = check_types(
        r#"
        struct Point {
            x: int
            y: int
        }
        let p = Point { x: 1, y: 2 }
        p.x + p.y
        "#,
    );
    assert_eq!(types, TypeList::single(Type::Integer));
}

#[test]
fn struct_literal_missing_a_field_is_rejected() {
    let e = check_err(
        r#"
        struct Point {
            x: int
            y: int
        }
        let p = Point { x: 1 }
        "#,
    );
    assert!(matches!(e.kind, ErrorKind::Type | ErrorKind::Structural));
}

#[test]
fn unknown_struct_field_access_is_rejected() {
    let e = check_err(
        r#"
        struct Point { x: int }
        let p = Point { x: 1 }
        p.z
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Resolution);
}

#[test]
fn recursive_struct_definitions_are_rejected() {
    let e = check_err(
        r#"
        struct A { b: B }
        struct B { a: A }
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Resolution);
}

#[test]
fn forward_struct_references_resolve_by_demand() {
    check(
        r#"
        struct Outer { inner: Inner }
        struct Inner { x: int }
        "#,
    )
    .unwrap();
}

#[test]
fn call_results_are_not_assignable() {
    let e = check_err(
        r#"
        func f(): int {
            return 1
        }
        f() = 5
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Writability);
}

#[test]
fn index_targets_inherit_writability_from_their_base() {
    check(
        r#"
        let xs = [1, 2, 3]
        xs[0] = 9
        "#,
    )
    .unwrap();
}

#[test]
fn a_shadow_dies_with_its_block() {
    let types = check_types(
        r#"
        let x = 1
        if true {
            let x = "inner"
            print(x)
        }
        x + 1
        "#,
    );
    assert_eq!(types, TypeList::single(Type::Integer));
}

#[test]
fn conditions_must_be_bool() {
    let e = check_err("if 1 { print(1) }");
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn undefined_names_are_resolution_errors() {
    let e = check_err("ghost + 1");
    assert_eq!(e.kind, ErrorKind::Resolution);
}

#[test]
fn call_arity_is_enforced() {
    let e = check_err(
        r#"
        func inc(x: int): int {
            return x + 1
        }
        inc(1, 2)
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Structural);
}

#[test]
fn type_names_are_not_callable() {
    let e = check_err("int(5)");
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn builtin_calls_check_through_their_rules() {
    let types = check_types(r#"len(split("a,b", ","))"#);
    assert_eq!(types, TypeList::single(Type::Integer));

    let e = check_err("len(5)");
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn process_arguments_must_be_strings() {
    let e = check_err("$wc(5)");
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn a_pipeline_types_as_the_exit_code() {
    let types = check_types(
        r#"
        "some input" | $sort() | $uniq()
        "#,
    );
    assert_eq!(types, TypeList::single(Type::Integer));
}

#[test]
fn pipeline_capture_binds_fresh_strings() {
    let types = check_types(
        r#"
        "data" | $sort() | let out
        out
        "#,
    );
    assert_eq!(types, TypeList::single(Type::Str));
}

#[test]
fn pipeline_capture_of_three_names_rolls_back() {
    let program = parser::parse(r#""data" | $sort() | let a, b, c"#).unwrap();
    let mut checker = Typechecker::new(".");
    let mut scope = ScopeTree::new();
    let e = checker.check_program(&program, &mut scope).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Structural);
    assert!(!scope.contains("a"));
    assert!(!scope.contains("b"));
    assert!(!scope.contains("c"));
}

#[test]
fn pipeline_sinks_must_be_writable_strings() {
    check(
        r#"
        let out = ""
        let err = ""
        "data" | $sort() | out, err
        "#,
    )
    .unwrap();

    let e = check_err(r#""data" | $sort() | 5"#);
    assert_eq!(e.kind, ErrorKind::Writability);

    let e = check_err(
        r#"
        let n = 0
        "data" | $sort() | n
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn interior_pipeline_stages_must_be_process_calls() {
    let e = check_err(
        r#"
        let out = ""
        "data" | "not a process" | out
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn pipeline_sources_must_produce_a_string() {
    let e = check_err("5 | $sort()");
    assert_eq!(e.kind, ErrorKind::Type);
}

#[test]
fn checking_is_deterministic() {
    let source = r#"
        struct Point { x: int, y: float }
        func norm(p: Point): float {
            return p.y
        }
        let p = Point { x: 1, y: 2.0 }
        norm(p)
    "#;
    let first = check(source).unwrap();
    let second = check(source).unwrap();
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
}

#[test]
fn functions_without_a_return_type_cannot_return_values() {
    let e = check_err(
        r#"
        func shout(msg: str) {
            return msg
        }
        "#,
    );
    assert_eq!(e.kind, ErrorKind::Structural);
}

#[test]
fn bare_returns_are_fine_without_a_declared_type() {
    check(
        r#"
        func maybe_print(flag: bool) {
            if flag {
                return
            }
            print("continuing")
        }
        "#,
    )
    .unwrap();
}
