use crate::ast::{BinaryOperator, Span, UnaryOperator};
use crate::error::{Result, ShoalError};

use super::Type;

/// Result type of a binary operation, or an error when the operator does
/// not apply to the operand variants. No implicit widening anywhere:
/// `int` and `float` only combine with themselves.
pub fn binary_result(op: BinaryOperator, lhs: &Type, rhs: &Type, span: Span) -> Result<Type> {
    use BinaryOperator::*;
    match op {
        Add => match (lhs, rhs) {
            (Type::Integer, Type::Integer) => Ok(Type::Integer),
            (Type::Float, Type::Float) => Ok(Type::Float),
            (Type::Str, Type::Str) => Ok(Type::Str),
            (Type::Array(ea), Type::Array(eb)) if ea.is_same_type(eb) => {
                Ok(Type::Array(ea.clone()))
            }
            _ => Err(binary_error(op, lhs, rhs, span)),
        },
        Sub | Mul | Div | Mod | Pow => match (lhs, rhs) {
            (Type::Integer, Type::Integer) => Ok(Type::Integer),
            (Type::Float, Type::Float) => Ok(Type::Float),
            _ => Err(binary_error(op, lhs, rhs, span)),
        },
        Eq | NotEq => match (lhs, rhs) {
            (Type::Integer, Type::Integer)
            | (Type::Float, Type::Float)
            | (Type::Boolean, Type::Boolean)
            | (Type::Str, Type::Str) => Ok(Type::Boolean),
            _ => Err(binary_error(op, lhs, rhs, span)),
        },
        Lt | LtEq | Gt | GtEq => match (lhs, rhs) {
            (Type::Integer, Type::Integer) | (Type::Float, Type::Float) => Ok(Type::Boolean),
            _ => Err(binary_error(op, lhs, rhs, span)),
        },
        And | Or => {
            if !matches!(lhs, Type::Boolean) {
                return Err(ShoalError::type_error(
                    span,
                    format!("left operand of {} is {}, expected bool", op, lhs),
                ));
            }
            if !matches!(rhs, Type::Boolean) {
                return Err(ShoalError::type_error(
                    span,
                    format!("right operand of {} is {}, expected bool", op, rhs),
                ));
            }
            Ok(Type::Boolean)
        }
    }
}

pub fn unary_result(op: UnaryOperator, operand: &Type, span: Span) -> Result<Type> {
    match op {
        UnaryOperator::Neg => match operand {
            Type::Integer => Ok(Type::Integer),
            Type::Float => Ok(Type::Float),
            _ => Err(ShoalError::type_error(
                span,
                format!("operator - does not apply to {}", operand),
            )),
        },
        UnaryOperator::Not => match operand {
            Type::Boolean => Ok(Type::Boolean),
            _ => Err(ShoalError::type_error(
                span,
                format!("operator ! does not apply to {}", operand),
            )),
        },
    }
}

fn binary_error(op: BinaryOperator, lhs: &Type, rhs: &Type, span: Span) -> ShoalError {
    ShoalError::type_error(
        span,
        format!("operator {} does not apply to {} and {}", op, lhs, rhs),
    )
}
