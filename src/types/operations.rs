//! Operator dispatch
//!
//! Operands are coerced first, so every arm below sees two values of the
//! same type (or a null on one side of an equality).

use std::cmp::Ordering;

use super::coerce::coerce_for_operation;
use super::TypeError;
use crate::parser::ast::{BinaryOp, UnaryOp};
use crate::runtime::Value;

fn overflow() -> TypeError {
    TypeError::new("integer overflow")
}

macro_rules! int_arith {
    ($variant:ident, $a:expr, $op:expr, $b:expr) => {
        match $op {
            BinaryOp::Add => $a.checked_add($b),
            BinaryOp::Subtract => $a.checked_sub($b),
            BinaryOp::Multiply => $a.checked_mul($b),
            _ => $a.checked_div($b),
        }
        .map(Value::$variant)
        .ok_or_else(overflow)
    };
}

macro_rules! float_arith {
    ($variant:ident, $a:expr, $op:expr, $b:expr) => {
        Ok(Value::$variant(match $op {
            BinaryOp::Add => $a + $b,
            BinaryOp::Subtract => $a - $b,
            BinaryOp::Multiply => $a * $b,
            _ => $a / $b,
        }))
    };
}

/// Apply a binary operator to two evaluated operands
///
/// `and`/`or` are accepted here for completeness; the interpreter
/// short-circuits them before both sides are evaluated.
pub fn binary_op(left: &Value, op: BinaryOp, right: &Value) -> Result<Value, TypeError> {
    let (left, right) = coerce_for_operation(left, op, right)?;

    match op {
        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
            arithmetic(&left, op, &right)
        }

        BinaryOp::Equal | BinaryOp::NotEqual => {
            let equal = if left.is_null() || right.is_null() {
                left.is_null() && right.is_null()
            } else {
                left == right
            };
            Ok(Value::Bool(if op == BinaryOp::Equal { equal } else { !equal }))
        }

        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let ordering = compare(&left, &right)?;
            Ok(Value::Bool(match (op, ordering) {
                (_, None) => false,
                (BinaryOp::Less, Some(o)) => o == Ordering::Less,
                (BinaryOp::LessEqual, Some(o)) => o != Ordering::Greater,
                (BinaryOp::Greater, Some(o)) => o == Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            }))
        }

        BinaryOp::And | BinaryOp::Or => match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinaryOp::And {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(unsupported(op, &left, &right)),
        },

        BinaryOp::Assign => Err(TypeError::new("assignment is not a value operation")),
    }
}

fn arithmetic(left: &Value, op: BinaryOp, right: &Value) -> Result<Value, TypeError> {
    if op == BinaryOp::Divide && !right.is_truthy() {
        return Err(TypeError::new("division by zero"));
    }

    match (left, right) {
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (Value::Int32(a), Value::Int32(b)) => int_arith!(Int32, a, op, *b),
        (Value::Int64(a), Value::Int64(b)) => int_arith!(Int64, a, op, *b),
        (Value::Float32(a), Value::Float32(b)) => float_arith!(Float32, a, op, b),
        (Value::Float64(a), Value::Float64(b)) => float_arith!(Float64, a, op, b),
        _ => Err(unsupported(op, left, right)),
    }
}

fn compare(left: &Value, right: &Value) -> Result<Option<Ordering>, TypeError> {
    Ok(match (left, right) {
        (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
        (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
        (Value::Float32(a), Value::Float32(b)) => a.partial_cmp(b),
        (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            return Err(TypeError::new(format!(
                "cannot compare {} and {}",
                left.type_of(),
                right.type_of()
            )))
        }
    })
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> TypeError {
    TypeError::new(format!(
        "unsupported operand types for {}: {} and {}",
        op,
        left.type_of(),
        right.type_of()
    ))
}

/// Apply a unary operator
pub fn unary_op(op: UnaryOp, operand: &Value) -> Result<Value, TypeError> {
    match (op, operand) {
        (UnaryOp::Negate, Value::Int32(n)) => n.checked_neg().map(Value::Int32).ok_or_else(overflow),
        (UnaryOp::Negate, Value::Int64(n)) => n.checked_neg().map(Value::Int64).ok_or_else(overflow),
        (UnaryOp::Negate, Value::Float32(f)) => Ok(Value::Float32(-f)),
        (UnaryOp::Negate, Value::Float64(f)) => Ok(Value::Float64(-f)),
        (UnaryOp::Negate, other) => Err(TypeError::new(format!(
            "unary - requires a numeric operand, got {}",
            other.type_of()
        ))),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Not, other) => Err(TypeError::new(format!(
            "not requires a bool operand, got {}",
            other.type_of()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(left: Value, op: BinaryOp, right: Value) -> Result<Value, TypeError> {
        binary_op(&left, op, &right)
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(eval(Value::Int64(2), BinaryOp::Add, Value::Int64(3)).unwrap(), Value::Int64(5));
        assert_eq!(eval(Value::Int64(7), BinaryOp::Divide, Value::Int64(2)).unwrap(), Value::Int64(3));
        assert_eq!(
            eval(Value::Int32(4), BinaryOp::Multiply, Value::Int64(5)).unwrap(),
            Value::Int64(20)
        );
    }

    #[test]
    fn test_mixed_arithmetic_widens() {
        assert_eq!(
            eval(Value::Int64(1), BinaryOp::Add, Value::Float64(0.5)).unwrap(),
            Value::Float64(1.5)
        );
    }

    #[test]
    fn test_division_by_zero() {
        let zeroes = [Value::Int32(0), Value::Int64(0), Value::Float32(0.0), Value::Float64(0.0)];
        for zero in zeroes {
            let err = eval(Value::Int64(10), BinaryOp::Divide, zero).unwrap_err();
            assert_eq!(err.to_string(), "Type error: division by zero");
        }
    }

    #[test]
    fn test_integer_overflow() {
        let err = eval(Value::Int64(i64::MAX), BinaryOp::Add, Value::Int64(1)).unwrap_err();
        assert_eq!(err.to_string(), "Type error: integer overflow");
        assert!(unary_op(UnaryOp::Negate, &Value::Int32(i32::MIN)).is_err());
    }

    #[test]
    fn test_string_operations() {
        assert_eq!(
            eval(Value::from("foo"), BinaryOp::Add, Value::from("bar")).unwrap(),
            Value::from("foobar")
        );
        assert!(eval(Value::from("a"), BinaryOp::Subtract, Value::from("b")).is_err());
        assert_eq!(
            eval(Value::from("apple"), BinaryOp::Less, Value::from("banana")).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval(Value::Int64(3), BinaryOp::LessEqual, Value::Int64(3)).unwrap(), Value::Bool(true));
        assert_eq!(eval(Value::Int64(3), BinaryOp::Greater, Value::Float64(3.5)).unwrap(), Value::Bool(false));
        assert_eq!(
            eval(Value::Float64(f64::NAN), BinaryOp::GreaterEqual, Value::Float64(1.0)).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_null_equality() {
        assert_eq!(eval(Value::Null, BinaryOp::Equal, Value::Null).unwrap(), Value::Bool(true));
        assert_eq!(eval(Value::Null, BinaryOp::Equal, Value::Int64(0)).unwrap(), Value::Bool(false));
        assert_eq!(eval(Value::from("x"), BinaryOp::NotEqual, Value::Null).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_collection_equality() {
        let a = Value::Array(vec![Value::Int64(1), Value::Int64(2)]);
        let b = Value::Array(vec![Value::Int64(1), Value::Int64(2)]);
        assert_eq!(eval(a, BinaryOp::Equal, b).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary_op(UnaryOp::Negate, &Value::Float64(2.5)).unwrap(), Value::Float64(-2.5));
        assert_eq!(unary_op(UnaryOp::Not, &Value::Bool(false)).unwrap(), Value::Bool(true));

        let err = unary_op(UnaryOp::Not, &Value::Int64(1)).unwrap_err();
        assert_eq!(err.to_string(), "Type error: not requires a bool operand, got int64");
        assert!(unary_op(UnaryOp::Negate, &Value::from("x")).is_err());
    }
}
