pub mod merge;
pub mod ops;

pub use merge::{merge, merge_lists};
pub use ops::{binary_result, unary_result};

use std::fmt;

/// The central type representation. Value types (primitives, arrays,
/// structs, a resolved `Auto`) can be held by runtime values; the rest are
/// meta-types that only ever live in the symbol table.
#[derive(Debug, Clone)]
pub enum Type {
    Integer,
    Float,
    Boolean,
    Str,
    Array(Box<Type>),
    Struct {
        name: String,
        fields: Vec<(String, Type)>,
    },
    /// Not yet determined; produced by empty array literals and
    /// annotation-less `let`. Must never survive into a final binding.
    Auto,
    /// Parse-time placeholder for a name that could not be resolved yet.
    Unknown,
    /// The symbol names a type rather than holding a value. `int`, `str`
    /// and struct names resolve through this.
    Typedef(Box<Type>),
    /// The symbol is an imported unit, keyed by its canonical path.
    Module(String),
    Function {
        params: TypeList,
        returns: TypeList,
    },
    /// A builtin callable; the checking rule lives in the builtin registry.
    Builtin(String),
}

impl Type {
    /// Structural equality. Struct fields compare order-independently;
    /// `Auto` is equal only to another `Auto` (merging, not equality, is
    /// the operator that resolves `Auto` against concrete types).
    pub fn is_same_type(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Integer, Type::Integer)
            | (Type::Float, Type::Float)
            | (Type::Boolean, Type::Boolean)
            | (Type::Str, Type::Str)
            | (Type::Auto, Type::Auto)
            | (Type::Unknown, Type::Unknown) => true,
            (Type::Array(a), Type::Array(b)) => a.is_same_type(b),
            (
                Type::Struct {
                    name: na,
                    fields: fa,
                },
                Type::Struct {
                    name: nb,
                    fields: fb,
                },
            ) => {
                na == nb
                    && fa.len() == fb.len()
                    && fa.iter().all(|(fname, fty)| {
                        fb.iter()
                            .any(|(gname, gty)| fname == gname && fty.is_same_type(gty))
                    })
            }
            (Type::Typedef(a), Type::Typedef(b)) => a.is_same_type(b),
            (Type::Module(a), Type::Module(b)) => a == b,
            (
                Type::Function {
                    params: pa,
                    returns: ra,
                },
                Type::Function {
                    params: pb,
                    returns: rb,
                },
            ) => pa == pb && ra == rb,
            (Type::Builtin(a), Type::Builtin(b)) => a == b,
            _ => false,
        }
    }

    /// True for types a runtime value can actually hold.
    pub fn is_value_type(&self) -> bool {
        match self {
            Type::Integer | Type::Float | Type::Boolean | Type::Str | Type::Auto => true,
            Type::Array(_) | Type::Struct { .. } => true,
            Type::Unknown
            | Type::Typedef(_)
            | Type::Module(_)
            | Type::Function { .. }
            | Type::Builtin(_) => false,
        }
    }

    /// True if any `Auto` remains anywhere inside this type.
    pub fn contains_auto(&self) -> bool {
        match self {
            Type::Auto => true,
            Type::Array(elem) => elem.contains_auto(),
            Type::Struct { fields, .. } => fields.iter().any(|(_, t)| t.contains_auto()),
            Type::Typedef(t) => t.contains_auto(),
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_type(other)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Boolean => write!(f, "bool"),
            Type::Str => write!(f, "str"),
            Type::Array(elem) => write!(f, "[]{}", elem),
            Type::Struct { name, .. } => write!(f, "{}", name),
            Type::Auto => write!(f, "auto"),
            Type::Unknown => write!(f, "unknown"),
            Type::Typedef(t) => write!(f, "type {}", t),
            Type::Module(path) => write!(f, "module {}", path),
            Type::Function { params, returns } => {
                if returns.is_empty() {
                    write!(f, "func({})", params)
                } else {
                    write!(f, "func({}): {}", params, returns)
                }
            }
            Type::Builtin(name) => write!(f, "builtin {}", name),
        }
    }
}

/// An ordered sequence of types for multi-value expressions: call
/// arguments, function returns, `let`/assignment right-hand sides.
/// Appending another list splices its elements rather than nesting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeList(Vec<Type>);

impl TypeList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(ty: Type) -> Self {
        Self(vec![ty])
    }

    pub fn push(&mut self, ty: Type) {
        self.0.push(ty);
    }

    /// The flattening append: splice, never nest.
    pub fn append(&mut self, mut other: TypeList) {
        self.0.append(&mut other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Type> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Type> {
        self.0.iter()
    }

    pub fn types(&self) -> &[Type] {
        &self.0
    }

    /// The one type in a single-element list, if it is one.
    pub fn as_single(&self) -> Option<&Type> {
        if self.0.len() == 1 {
            self.0.first()
        } else {
            None
        }
    }
}

impl From<Vec<Type>> for TypeList {
    fn from(types: Vec<Type>) -> Self {
        Self(types)
    }
}

impl FromIterator<Type> for TypeList {
    fn from_iter<I: IntoIterator<Item = Type>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TypeList {
    type Item = Type;
    type IntoIter = std::vec::IntoIter<Type>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for TypeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(fields: Vec<(&str, Type)>) -> Type {
        Type::Struct {
            name: "Point".into(),
            fields: fields.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }

    #[test]
    fn same_type_is_reflexive_and_symmetric() {
        let types = [
            Type::Integer,
            Type::Float,
            Type::Str,
            Type::Array(Box::new(Type::Boolean)),
            point(vec![("x", Type::Integer)]),
            Type::Auto,
        ];
        for a in &types {
            assert!(a.is_same_type(a));
            for b in &types {
                assert_eq!(a.is_same_type(b), b.is_same_type(a));
            }
        }
    }

    #[test]
    fn auto_equals_only_auto() {
        assert!(Type::Auto.is_same_type(&Type::Auto));
        assert!(!Type::Auto.is_same_type(&Type::Integer));
        assert!(!Type::Integer.is_same_type(&Type::Auto));
    }

    #[test]
    fn struct_field_order_is_irrelevant() {
        let a = point(vec![("x", Type::Integer), ("y", Type::Float)]);
        let b = point(vec![("y", Type::Float), ("x", Type::Integer)]);
        assert!(a.is_same_type(&b));
    }

    #[test]
    fn struct_name_must_match() {
        let a = point(vec![("x", Type::Integer)]);
        let b = Type::Struct {
            name: "Vec2".into(),
            fields: vec![("x".into(), Type::Integer)],
        };
        assert!(!a.is_same_type(&b));
    }

    #[test]
    fn type_list_append_splices() {
        let mut list = TypeList::single(Type::Integer);
        list.append(TypeList::from(vec![Type::Str, Type::Boolean]));
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1), Some(&Type::Str));
    }
}
