//! Operand coercion
//!
//! Before a binary operator runs, both operands are brought to a type the
//! operator accepts. Mixed numeric operands widen to the highest numeric
//! type present, ranked Float64 > Int64 > Float32 > Int32.

use super::convert::convert;
use super::{Type, TypeError};
use crate::parser::ast::BinaryOp;
use crate::runtime::Value;

/// The wider of two numeric types, or `None` if either is not numeric
pub fn highest_numeric_type(left: Type, right: Type) -> Option<Type> {
    let left_rank = left.numeric_rank()?;
    let right_rank = right.numeric_rank()?;
    Some(if left_rank >= right_rank { left } else { right })
}

/// Bring both operands of `op` to a shared, valid type
pub fn coerce_for_operation(
    left: &Value,
    op: BinaryOp,
    right: &Value,
) -> Result<(Value, Value), TypeError> {
    let (left_type, right_type) = (left.type_of(), right.type_of());

    match op {
        BinaryOp::Add if left_type == Type::String || right_type == Type::String => {
            if left_type == right_type {
                Ok((left.clone(), right.clone()))
            } else {
                Err(TypeError::new(format!(
                    "cannot concatenate {} and {}",
                    left_type, right_type
                )))
            }
        }

        BinaryOp::And | BinaryOp::Or => {
            if left_type == Type::Bool && right_type == Type::Bool {
                Ok((left.clone(), right.clone()))
            } else {
                Err(TypeError::new(format!(
                    "logical operator {} requires bool operands, got {} and {}",
                    op, left_type, right_type
                )))
            }
        }

        BinaryOp::Equal | BinaryOp::NotEqual => {
            if left_type == Type::Null || right_type == Type::Null || left_type == right_type {
                Ok((left.clone(), right.clone()))
            } else {
                coerce_to_same_type(left, right)
            }
        }

        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            if left_type == Type::String && right_type == Type::String {
                Ok((left.clone(), right.clone()))
            } else {
                widen(left, right).ok_or_else(|| {
                    TypeError::new(format!(
                        "cannot compare {} and {} with {}",
                        left_type, right_type, op
                    ))
                })?
            }
        }

        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
            widen(left, right).ok_or_else(|| {
                TypeError::new(format!(
                    "unsupported operand types for {}: {} and {}",
                    op, left_type, right_type
                ))
            })?
        }

        BinaryOp::Assign => Err(TypeError::new("assignment is not a value operation")),
    }
}

/// Convert two numeric operands to their highest type; `None` if either
/// is not numeric
fn widen(left: &Value, right: &Value) -> Option<Result<(Value, Value), TypeError>> {
    let target = highest_numeric_type(left.type_of(), right.type_of())?;
    Some(convert(left, target).and_then(|left| Ok((left, convert(right, target)?))))
}

fn preferred_type(left: Type, right: Type) -> Result<Type, TypeError> {
    if let Some(numeric) = highest_numeric_type(left, right) {
        return Ok(numeric);
    }
    if left == Type::String || right == Type::String {
        return Ok(Type::String);
    }
    if left == Type::Bool && right == Type::Bool {
        return Ok(Type::Bool);
    }
    Err(TypeError::new(format!("cannot compare {} and {}", left, right)))
}

fn coerce_to_same_type(left: &Value, right: &Value) -> Result<(Value, Value), TypeError> {
    let target = preferred_type(left.type_of(), right.type_of())?;
    Ok((convert(left, target)?, convert(right, target)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NUMERIC: [Type; 4] = [Type::Int32, Type::Float32, Type::Int64, Type::Float64];

    #[test]
    fn test_highest_numeric_type_is_commutative() {
        for a in NUMERIC {
            for b in NUMERIC {
                assert_eq!(highest_numeric_type(a, b), highest_numeric_type(b, a));
            }
        }
    }

    #[test]
    fn test_highest_numeric_type_ranking() {
        assert_eq!(highest_numeric_type(Type::Int32, Type::Int64), Some(Type::Int64));
        assert_eq!(highest_numeric_type(Type::Float32, Type::Int64), Some(Type::Int64));
        assert_eq!(highest_numeric_type(Type::Int64, Type::Float64), Some(Type::Float64));
        assert_eq!(highest_numeric_type(Type::String, Type::Int64), None);
    }

    #[test]
    fn test_numeric_widening() {
        let (left, right) =
            coerce_for_operation(&Value::Int32(2), BinaryOp::Add, &Value::Float64(0.5)).unwrap();
        assert_eq!(left, Value::Float64(2.0));
        assert_eq!(right, Value::Float64(0.5));
    }

    #[test]
    fn test_string_concatenation_requires_strings() {
        let err = coerce_for_operation(&Value::from("hello"), BinaryOp::Add, &Value::Int64(42))
            .unwrap_err();
        assert_eq!(err.to_string(), "Type error: cannot concatenate string and int64");
    }

    #[test]
    fn test_logical_requires_bools() {
        assert!(coerce_for_operation(&Value::Bool(true), BinaryOp::And, &Value::Int64(1)).is_err());
        assert!(coerce_for_operation(&Value::Bool(true), BinaryOp::Or, &Value::Bool(false)).is_ok());
    }

    #[test]
    fn test_equality_coercion() {
        let (left, right) =
            coerce_for_operation(&Value::Null, BinaryOp::Equal, &Value::Int64(1)).unwrap();
        assert_eq!((left, right), (Value::Null, Value::Int64(1)));

        let (left, right) =
            coerce_for_operation(&Value::from("1"), BinaryOp::Equal, &Value::Int64(1)).unwrap();
        assert_eq!((left, right), (Value::from("1"), Value::from("1")));

        assert!(coerce_for_operation(
            &Value::Array(vec![]),
            BinaryOp::NotEqual,
            &Value::Bool(true)
        )
        .is_err());
    }

    #[test]
    fn test_ordering_coercion() {
        assert!(coerce_for_operation(&Value::from("a"), BinaryOp::Less, &Value::from("b")).is_ok());
        let err = coerce_for_operation(&Value::from("a"), BinaryOp::Less, &Value::Int64(1))
            .unwrap_err();
        assert_eq!(err.to_string(), "Type error: cannot compare string and int64 with <");
    }
}
