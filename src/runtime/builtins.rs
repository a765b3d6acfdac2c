//! Built-in functions
//!
//! Builtins take positional arguments and a [`CallContext`]. They are
//! registered in the global scope before any user code runs.

use std::io::Write;

use log::debug;

use super::environment::{Environment, ScopeError};
use super::value::{Arity, BuiltinFn, NativeFunctionValue, Value};
use crate::types::{convert, Type};

/// What a builtin can reach while it runs
pub struct CallContext<'a> {
    pub env: &'a mut Environment,
    pub out: &'a mut dyn Write,
}

const BUILTINS: &[(&str, Arity, BuiltinFn)] = &[
    ("print", Arity::Variadic, print),
    ("len", Arity::Exact(1), len),
    ("type_of", Arity::Exact(1), type_of),
    ("to_string", Arity::Exact(1), to_string),
    ("to_int", Arity::Exact(1), to_int),
    ("to_float", Arity::Exact(1), to_float),
];

/// Define every builtin in the global scope of `env`
pub fn register_builtins(env: &mut Environment) -> Result<(), ScopeError> {
    for &(name, arity, func) in BUILTINS {
        env.define_global(
            name,
            Value::BuiltinFunction(NativeFunctionValue {
                name: name.to_string(),
                arity,
                func,
            }),
        )?;
    }
    debug!("registered {} builtins", BUILTINS.len());
    Ok(())
}

/// Write the arguments separated by spaces, then a newline
fn print(ctx: &mut CallContext<'_>, args: &[Value]) -> Result<Value, String> {
    let line = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(ctx.out, "{}", line).map_err(|e| e.to_string())?;
    Ok(Value::Bool(true))
}

fn len(_ctx: &mut CallContext<'_>, args: &[Value]) -> Result<Value, String> {
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Map(map) => map.len(),
        other => return Err(format!("cannot take the length of {}", other.type_of())),
    };
    i64::try_from(n)
        .map(Value::Int64)
        .map_err(|e| e.to_string())
}

fn type_of(_ctx: &mut CallContext<'_>, args: &[Value]) -> Result<Value, String> {
    Ok(Value::from(args[0].type_name()))
}

fn to_string(_ctx: &mut CallContext<'_>, args: &[Value]) -> Result<Value, String> {
    convert(&args[0], Type::String).map_err(|e| e.to_string())
}

fn to_int(_ctx: &mut CallContext<'_>, args: &[Value]) -> Result<Value, String> {
    convert(&args[0], Type::Int64).map_err(|e| e.to_string())
}

fn to_float(_ctx: &mut CallContext<'_>, args: &[Value]) -> Result<Value, String> {
    convert(&args[0], Type::Float64).map_err(|e| e.to_string())
}
