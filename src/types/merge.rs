use crate::ast::Span;
use crate::error::{Result, ShoalError};

use super::{Type, TypeList};

/// Unify two types. `Auto` absorbs into the other side, arrays merge
/// element-wise, structs with the same name merge field-by-field, and
/// anything else must already be structurally equal.
///
/// This is the operator behind array-literal element inference, `let`
/// annotation-versus-value reconciliation and struct-literal checking.
pub fn merge(a: &Type, b: &Type, span: Span) -> Result<Type> {
    match (a, b) {
        (Type::Auto, other) => Ok(other.clone()),
        (other, Type::Auto) => Ok(other.clone()),
        (Type::Array(ea), Type::Array(eb)) => Ok(Type::Array(Box::new(merge(ea, eb, span)?))),
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
            if na != nb {
                return Err(ShoalError::type_error(
                    span,
                    format!("cannot merge struct {} with struct {}", na, nb),
                ));
            }
            let mut fields = Vec::with_capacity(fa.len());
            for (fname, fty) in fa {
                match fb.iter().find(|(gname, _)| gname == fname) {
                    Some((_, gty)) => fields.push((fname.clone(), merge(fty, gty, span)?)),
                    None => {
                        return Err(ShoalError::type_error(
                            span,
                            format!("struct {} is missing field {}", nb, fname),
                        ))
                    }
                }
            }
            for (gname, _) in fb {
                if !fa.iter().any(|(fname, _)| fname == gname) {
                    return Err(ShoalError::type_error(
                        span,
                        format!("struct {} has no field {}", na, gname),
                    ));
                }
            }
            Ok(Type::Struct {
                name: na.clone(),
                fields,
            })
        }
        _ => {
            if a.is_same_type(b) {
                Ok(a.clone())
            } else {
                Err(ShoalError::type_error(
                    span,
                    format!("incompatible types {} and {}", a, b),
                ))
            }
        }
    }
}

/// Element-wise merge of two type lists of equal length.
pub fn merge_lists(a: &TypeList, b: &TypeList, span: Span) -> Result<TypeList> {
    if a.len() != b.len() {
        return Err(ShoalError::structural_error(
            span,
            format!("expected {} values, found {}", a.len(), b.len()),
        ));
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| merge(x, y, span))
        .collect()
}
