pub mod expression;
pub mod module;
pub mod operator;
pub mod source_location;
pub mod statement;
pub mod types;

pub use expression::Expression;
pub use module::{FunctionDecl, ImportDecl, Program, StructDecl};
pub use operator::{BinaryOperator, UnaryOperator};
pub use source_location::{Position, Span};
pub use statement::{Block, Pipeline, PipelineElement, Statement};
pub use types::TypeExpr;
