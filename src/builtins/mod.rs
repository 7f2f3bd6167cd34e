//! The builtin registry: a fixed table from name to a pure checking rule.
//! Runtime behavior belongs to the execution engine and is opaque here;
//! the checker treats every builtin identically through its rule.

use crate::ast::Span;
use crate::error::{Result, ShoalError};
use crate::types::{Type, TypeList};

/// Checks a builtin's argument list and yields its result types.
pub type CheckRule = fn(&TypeList, Span) -> Result<TypeList>;

pub struct Builtin {
    pub name: &'static str,
    pub check: CheckRule,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "print",
        check: check_print,
    },
    Builtin {
        name: "len",
        check: check_len,
    },
    Builtin {
        name: "to_str",
        check: check_str,
    },
    Builtin {
        name: "to_int",
        check: check_int,
    },
    Builtin {
        name: "split",
        check: check_split,
    },
    Builtin {
        name: "join",
        check: check_join,
    },
    Builtin {
        name: "env",
        check: check_env,
    },
    Builtin {
        name: "exit",
        check: check_exit,
    },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

fn arity(args: &TypeList, expected: usize, name: &str, span: Span) -> Result<()> {
    if args.len() != expected {
        return Err(ShoalError::structural_error(
            span,
            format!("{} expects {} argument(s), found {}", name, expected, args.len()),
        ));
    }
    Ok(())
}

fn check_print(args: &TypeList, span: Span) -> Result<TypeList> {
    for ty in args.iter() {
        if !ty.is_value_type() {
            return Err(ShoalError::type_error(
                span,
                format!("print cannot take a {}", ty),
            ));
        }
    }
    Ok(TypeList::new())
}

fn check_len(args: &TypeList, span: Span) -> Result<TypeList> {
    arity(args, 1, "len", span)?;
    match args.get(0) {
        Some(Type::Str) | Some(Type::Array(_)) => Ok(TypeList::single(Type::Integer)),
        Some(other) => Err(ShoalError::type_error(
            span,
            format!("len expects str or array, found {}", other),
        )),
        None => unreachable!(),
    }
}

fn check_str(args: &TypeList, span: Span) -> Result<TypeList> {
    arity(args, 1, "to_str", span)?;
    match args.get(0) {
        Some(Type::Integer) | Some(Type::Float) | Some(Type::Boolean) | Some(Type::Str) => {
            Ok(TypeList::single(Type::Str))
        }
        Some(other) => Err(ShoalError::type_error(
            span,
            format!("to_str expects a primitive value, found {}", other),
        )),
        None => unreachable!(),
    }
}

fn check_int(args: &TypeList, span: Span) -> Result<TypeList> {
    arity(args, 1, "to_int", span)?;
    match args.get(0) {
        Some(Type::Str) | Some(Type::Integer) | Some(Type::Float) => {
            Ok(TypeList::single(Type::Integer))
        }
        Some(other) => Err(ShoalError::type_error(
            span,
            format!("to_int expects str, int or float, found {}", other),
        )),
        None => unreachable!(),
    }
}

fn check_split(args: &TypeList, span: Span) -> Result<TypeList> {
    arity(args, 2, "split", span)?;
    match (args.get(0), args.get(1)) {
        (Some(Type::Str), Some(Type::Str)) => {
            Ok(TypeList::single(Type::Array(Box::new(Type::Str))))
        }
        _ => Err(ShoalError::type_error(
            span,
            "split expects (str, str)".to_string(),
        )),
    }
}

fn check_join(args: &TypeList, span: Span) -> Result<TypeList> {
    arity(args, 2, "join", span)?;
    let elems_ok = matches!(args.get(0), Some(Type::Array(elem)) if elem.is_same_type(&Type::Str));
    if elems_ok && matches!(args.get(1), Some(Type::Str)) {
        Ok(TypeList::single(Type::Str))
    } else {
        Err(ShoalError::type_error(
            span,
            "join expects ([]str, str)".to_string(),
        ))
    }
}

fn check_env(args: &TypeList, span: Span) -> Result<TypeList> {
    arity(args, 1, "env", span)?;
    match args.get(0) {
        Some(Type::Str) => Ok(TypeList::single(Type::Str)),
        _ => Err(ShoalError::type_error(
            span,
            "env expects a str name".to_string(),
        )),
    }
}

fn check_exit(args: &TypeList, span: Span) -> Result<TypeList> {
    arity(args, 1, "exit", span)?;
    match args.get(0) {
        Some(Type::Integer) => Ok(TypeList::new()),
        _ => Err(ShoalError::type_error(
            span,
            "exit expects an int status".to_string(),
        )),
    }
}
