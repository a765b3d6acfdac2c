//! Explicit value conversion
//!
//! Narrowing numeric conversions are range checked and fail instead of
//! truncating silently. Float to integer conversion drops the fraction.

use super::{Type, TypeError};
use crate::runtime::Value;

/// Convert `value` to `target`
pub fn convert(value: &Value, target: Type) -> Result<Value, TypeError> {
    if value.type_of() == target {
        return Ok(value.clone());
    }

    match target {
        Type::String => Ok(Value::String(value.to_string())),
        Type::Bool => to_bool(value),
        Type::Int32 => to_int32(value),
        Type::Int64 => to_int64(value),
        Type::Float32 => to_float32(value),
        Type::Float64 => to_float64(value),
        _ => Err(cannot_convert(value, target)),
    }
}

/// Fit a value into a binding or parameter declared as `declared`
///
/// Null passes through (nullability is the environment's concern) and
/// numbers convert between numeric types. Anything else must already
/// have the declared type.
pub fn conform(value: Value, declared: Type) -> Result<Value, TypeError> {
    let actual = value.type_of();

    if actual == declared || actual == Type::Null {
        Ok(value)
    } else if actual.is_numeric() && declared.is_numeric() {
        convert(&value, declared)
    } else {
        Err(TypeError::new(format!(
            "cannot use {} value as {}",
            actual, declared
        )))
    }
}

fn cannot_convert(value: &Value, target: Type) -> TypeError {
    match value {
        Value::String(s) => TypeError::new(format!("cannot convert \"{}\" to {}", s, target)),
        _ => TypeError::new(format!("cannot convert {} to {}", value.type_of(), target)),
    }
}

fn out_of_range(value: impl std::fmt::Display, target: Type) -> TypeError {
    TypeError::new(format!("value {} out of range for {}", value, target))
}

fn to_bool(value: &Value) -> Result<Value, TypeError> {
    match value {
        Value::String(s) => match s.as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" | "" => Ok(Value::Bool(false)),
            _ => Err(cannot_convert(value, Type::Bool)),
        },
        Value::Null => Ok(Value::Bool(false)),
        v if v.type_of().is_numeric() => Ok(Value::Bool(v.is_truthy())),
        _ => Err(cannot_convert(value, Type::Bool)),
    }
}

fn float_to_int32(f: f64) -> Result<i32, TypeError> {
    if f.is_finite() && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Ok(f.trunc() as i32)
    } else {
        Err(out_of_range(f, Type::Int32))
    }
}

fn float_to_int64(f: f64) -> Result<i64, TypeError> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f.trunc() as i64)
    } else {
        Err(out_of_range(f, Type::Int64))
    }
}

fn to_int32(value: &Value) -> Result<Value, TypeError> {
    let n = match value {
        Value::Int64(n) => i32::try_from(*n).map_err(|_| out_of_range(n, Type::Int32))?,
        Value::Float32(f) => float_to_int32(f64::from(*f))?,
        Value::Float64(f) => float_to_int32(*f)?,
        Value::String(s) => s.parse().map_err(|_| cannot_convert(value, Type::Int32))?,
        Value::Bool(b) => i32::from(*b),
        Value::Null => 0,
        _ => return Err(cannot_convert(value, Type::Int32)),
    };
    Ok(Value::Int32(n))
}

fn to_int64(value: &Value) -> Result<Value, TypeError> {
    let n = match value {
        Value::Int32(n) => i64::from(*n),
        Value::Float32(f) => float_to_int64(f64::from(*f))?,
        Value::Float64(f) => float_to_int64(*f)?,
        Value::String(s) => s.parse().map_err(|_| cannot_convert(value, Type::Int64))?,
        Value::Bool(b) => i64::from(*b),
        Value::Null => 0,
        _ => return Err(cannot_convert(value, Type::Int64)),
    };
    Ok(Value::Int64(n))
}

fn to_float32(value: &Value) -> Result<Value, TypeError> {
    let f = match value {
        Value::Int32(n) => *n as f32,
        Value::Int64(n) => *n as f32,
        Value::Float64(f) => {
            if f.is_finite() && f.abs() > f64::from(f32::MAX) {
                return Err(out_of_range(f, Type::Float32));
            }
            *f as f32
        }
        Value::String(s) => s.parse().map_err(|_| cannot_convert(value, Type::Float32))?,
        Value::Bool(b) => f32::from(u8::from(*b)),
        Value::Null => 0.0,
        _ => return Err(cannot_convert(value, Type::Float32)),
    };
    Ok(Value::Float32(f))
}

fn to_float64(value: &Value) -> Result<Value, TypeError> {
    let f = match value {
        Value::Int32(n) => f64::from(*n),
        Value::Int64(n) => *n as f64,
        Value::Float32(f) => f64::from(*f),
        Value::String(s) => s.parse().map_err(|_| cannot_convert(value, Type::Float64))?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        _ => return Err(cannot_convert(value, Type::Float64)),
    };
    Ok(Value::Float64(f))
}
