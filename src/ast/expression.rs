use super::operator::{BinaryOperator, UnaryOperator};
use super::source_location::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    IntLiteral {
        value: i64,
        span: Span,
    },
    FloatLiteral {
        value: f64,
        span: Span,
    },
    BoolLiteral {
        value: bool,
        span: Span,
    },
    StrLiteral {
        value: String,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    /// `[a, b, c]`
    Array {
        elements: Vec<Expression>,
        span: Span,
    },
    /// `Point { x: 1, y: 2.0 }`
    StructLiteral {
        name: String,
        fields: Vec<(String, Expression)>,
        span: Span,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
        span: Span,
    },
    /// `base[index]`
    Index {
        base: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },
    /// `base.field`: struct field or module member access.
    Dot {
        base: Box<Expression>,
        field: String,
        span: Span,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        span: Span,
    },
    /// `$name(arg, ...)`: an external process invocation.
    ProcessCall {
        command: String,
        args: Vec<Expression>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::IntLiteral { span, .. }
            | Expression::FloatLiteral { span, .. }
            | Expression::BoolLiteral { span, .. }
            | Expression::StrLiteral { span, .. }
            | Expression::Identifier { span, .. }
            | Expression::Array { span, .. }
            | Expression::StructLiteral { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Index { span, .. }
            | Expression::Dot { span, .. }
            | Expression::Call { span, .. }
            | Expression::ProcessCall { span, .. } => *span,
        }
    }
}
