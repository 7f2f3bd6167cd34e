use std::io::Cursor;

use shoal_lang::repl::Repl;
use shoal_lang::{ErrorKind, Type, TypeList};

#[test]
fn multi_line_input_accumulates_until_it_closes() {
    let mut repl = Repl::new(".");

    assert!(repl.feed("func add(a: int, b: int): int {").is_none());
    assert!(repl.pending());
    assert!(repl.feed("    return a + b").is_none());

    let result = repl.feed("}").expect("construct closed").unwrap();
    assert!(result.is_empty());
    assert!(!repl.pending());

    let result = repl.feed("add(1, 2)").expect("complete line").unwrap();
    assert_eq!(result, TypeList::single(Type::Integer));
}

#[test]
fn bindings_persist_across_rounds() {
    let mut repl = Repl::new(".");
    repl.feed("let x = 41").unwrap().unwrap();
    let result = repl.feed("x + 1").unwrap().unwrap();
    assert_eq!(result, TypeList::single(Type::Integer));
}

#[test]
fn struct_definitions_persist_across_rounds() {
    let mut repl = Repl::new(".");
    repl.feed("struct Point { x: int, y: int }").unwrap().unwrap();
    repl.feed("let p = Point { x: 1, y: 2 }").unwrap().unwrap();
    let result = repl.feed("p.y").unwrap().unwrap();
    assert_eq!(result, TypeList::single(Type::Integer));
}

#[test]
fn a_failed_round_leaves_the_session_intact() {
    let mut repl = Repl::new(".");
    repl.feed("let x = 1").unwrap().unwrap();

    let e = repl.feed("let y = []").unwrap().unwrap_err();
    assert_eq!(e.kind, ErrorKind::Type);

    // The failed let rolled back, so y never existed.
    let e = repl.feed("y").unwrap().unwrap_err();
    assert_eq!(e.kind, ErrorKind::Resolution);

    let result = repl.feed("x").unwrap().unwrap();
    assert_eq!(result, TypeList::single(Type::Integer));
}

#[test]
fn a_syntax_error_clears_the_buffer() {
    let mut repl = Repl::new(".");
    let e = repl.feed("let 5 = 3").unwrap().unwrap_err();
    assert_eq!(e.kind, ErrorKind::Parser);
    assert!(!repl.pending());

    let result = repl.feed("1 + 1").unwrap().unwrap();
    assert_eq!(result, TypeList::single(Type::Integer));
}

#[test]
fn run_prints_prompts_and_types() {
    colored::control::set_override(false);

    let input = Cursor::new("let x = 1\nx\n");
    let mut output = Vec::new();
    let mut repl = Repl::new(".");
    repl.run(input, &mut output).unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains(">> "));
    assert!(text.contains("int"));
}

#[test]
fn run_shows_a_continuation_prompt() {
    colored::control::set_override(false);

    let input = Cursor::new("func f(): int {\nreturn 7\n}\nf()\n");
    let mut output = Vec::new();
    let mut repl = Repl::new(".");
    repl.run(input, &mut output).unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains(".. "));
    assert!(text.contains("int"));
}
