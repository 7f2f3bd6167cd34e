use super::source_location::Span;

/// A type annotation as written in source, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `int`, `str`, `Point`, ...
    Named { name: String, span: Span },
    /// `mod.Point`
    Qualified {
        module: String,
        name: String,
        span: Span,
    },
    /// `[]T`
    Array { element: Box<TypeExpr>, span: Span },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. }
            | TypeExpr::Qualified { span, .. }
            | TypeExpr::Array { span, .. } => *span,
        }
    }
}
