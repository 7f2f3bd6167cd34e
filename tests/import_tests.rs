use std::fs;
use std::path::PathBuf;

use shoal_lang::{parser, ErrorKind, ScopeTree, Type, TypeList, Typechecker};

fn module_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("shoal_{}_{}", test, std::process::id()));
    fs::create_dir_all(&dir).expect("failed to create module directory");
    dir
}

fn write_module(dir: &PathBuf, name: &str, source: &str) {
    fs::write(dir.join(format!("{}.shoal", name)), source).expect("failed to write module");
}

fn check_in(dir: &PathBuf, source: &str) -> shoal_lang::Result<TypeList> {
    let program = parser::parse(source)?;
    let mut checker = Typechecker::new(dir);
    let mut scope = ScopeTree::new();
    let (types, _) = checker.check_program(&program, &mut scope)?;
    Ok(types)
}

#[test]
fn module_functions_resolve_through_their_alias() {
    let dir = module_dir("alias");
    write_module(
        &dir,
        "mathlib",
        r#"
        func double(x: int): int {
            return x * 2
        }
        "#,
    );

    let types = check_in(
        &dir,
        r#"
        import "mathlib" as m
        m.double(21)
        "#,
    )
    .unwrap();
    assert_eq!(types, TypeList::single(Type::Integer));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn module_structs_work_as_type_annotations() {
    let dir = module_dir("qualified_type");
    write_module(
        &dir,
        "geometry",
        r#"
        struct Pair {
            a: int
            b: int
        }
        func origin(): Pair {
            return Pair { a: 0, b: 0 }
        }
        "#,
    );

    let types = check_in(
        &dir,
        r#"
        import "geometry" as geo
        let p: geo.Pair = geo.origin()
        p.a
        "#,
    )
    .unwrap();
    assert_eq!(types, TypeList::single(Type::Integer));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_modules_are_module_errors() {
    let dir = module_dir("missing");
    let e = check_in(&dir, r#"import "nowhere""#).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Module);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn import_cycles_are_detected() {
    let dir = module_dir("cycle");
    write_module(
        &dir,
        "a",
        r#"
        import "b"
        func fa(): int {
            return 1
        }
        "#,
    );
    write_module(
        &dir,
        "b",
        r#"
        import "a"
        func fb(): int {
            return 2
        }
        "#,
    );

    let e = check_in(&dir, r#"import "a""#).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Module);
    assert!(e.message.contains("circular"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn a_module_is_checked_once_per_session() {
    let dir = module_dir("shared");
    write_module(
        &dir,
        "shared",
        r#"
        func answer(): int {
            return 42
        }
        "#,
    );
    write_module(
        &dir,
        "middle",
        r#"
        import "shared"
        func indirect(): int {
            return shared.answer()
        }
        "#,
    );

    // A diamond: the main unit and `middle` both import `shared`.
    let types = check_in(
        &dir,
        r#"
        import "shared"
        import "middle"
        shared.answer() + middle.indirect()
        "#,
    )
    .unwrap();
    assert_eq!(types, TypeList::single(Type::Integer));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn module_members_are_not_plain_values() {
    let dir = module_dir("not_value");
    write_module(
        &dir,
        "lib",
        r#"
        func f(): int {
            return 1
        }
        "#,
    );

    let e = check_in(
        &dir,
        r#"
        import "lib"
        let x = lib.f
        "#,
    )
    .unwrap_err();
    assert_eq!(e.kind, ErrorKind::Type);

    fs::remove_dir_all(&dir).ok();
}
