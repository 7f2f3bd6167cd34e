use super::expression::Expression;
use super::source_location::Span;
use super::types::TypeExpr;

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let a, b: int = expr, expr`
    Let {
        names: Vec<(String, Option<TypeExpr>)>,
        values: Vec<Expression>,
        span: Span,
    },
    /// `lhs, lhs = rhs, rhs`
    Assign {
        targets: Vec<Expression>,
        values: Vec<Expression>,
        span: Span,
    },
    Expression(Expression),
    If {
        condition: Expression,
        then_block: Block,
        else_block: Option<Block>,
        span: Span,
    },
    While {
        condition: Expression,
        body: Block,
        span: Span,
    },
    Return {
        values: Vec<Expression>,
        span: Span,
    },
    Pipeline(Pipeline),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Let { span, .. }
            | Statement::Assign { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::Return { span, .. } => *span,
            Statement::Expression(expr) => expr.span(),
            Statement::Pipeline(p) => p.span,
        }
    }
}

/// `head | $cmd(...) | ... | tail`: a chained sequence of process
/// invocations with typed input/output endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub elements: Vec<PipelineElement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineElement {
    /// One or more expressions. A single expression is a source, a stage or
    /// a sink; two expressions are only legal as a sink pair.
    Exprs { exprs: Vec<Expression>, span: Span },
    /// `let out` or `let out, err`: capture the final stage's output into
    /// fresh string variables.
    Let { names: Vec<String>, span: Span },
}

impl PipelineElement {
    pub fn span(&self) -> Span {
        match self {
            PipelineElement::Exprs { span, .. } | PipelineElement::Let { span, .. } => *span,
        }
    }
}
