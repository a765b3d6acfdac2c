//! Runtime value representation
//!
//! This module defines runtime values for Zen. Values are immutable once
//! built; operators and assignments produce new values.

use std::fmt;
use std::rc::Rc;

use super::builtins::CallContext;
use super::environment::ScopeId;
use crate::parser::ast::FunctionDecl;
use crate::types::{Type, TypeError};

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    Int32(i32),
    Float32(f32),
    Int64(i64),
    Float64(f64),
    String(String),
    Bool(bool),
    Null,
    Array(Vec<Value>),
    Map(MapValue),
    Function(Rc<FunctionValue>),
    BuiltinFunction(NativeFunctionValue),
}

/// Insertion-ordered map
///
/// Keys are strings, integers or bools. Integer keys are stored as Int64 so
/// `m[1]` finds an entry whatever width the index expression had.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapValue {
    entries: Vec<(Value, Value)>,
}

impl MapValue {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize_key(key: &Value) -> Result<Value, TypeError> {
        match key {
            Value::Int32(n) => Ok(Value::Int64(i64::from(*n))),
            Value::Int64(_) | Value::String(_) | Value::Bool(_) => Ok(key.clone()),
            other => Err(TypeError::new(format!(
                "map keys must be string, int or bool, got {}",
                other.type_of()
            ))),
        }
    }

    pub fn get(&self, key: &Value) -> Result<Option<&Value>, TypeError> {
        let key = Self::normalize_key(key)?;
        Ok(self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v))
    }

    /// Insert or replace, keeping the original position of an existing key
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), TypeError> {
        let key = Self::normalize_key(&key)?;
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

/// User-defined function
///
/// `scope` is the scope the declaration was evaluated in. A call links its
/// parameter scope to it while that scope is still live.
#[derive(Debug)]
pub struct FunctionValue {
    pub declaration: Rc<FunctionDecl>,
    pub scope: ScopeId,
}

impl FunctionValue {
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// Number of parameters without a default value
    pub fn required_params(&self) -> usize {
        self.declaration
            .params
            .iter()
            .filter(|p| p.default.is_none())
            .count()
    }
}

/// Number of arguments a builtin accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => *n == count,
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Variadic => write!(f, "any number of"),
        }
    }
}

pub type BuiltinFn = fn(&mut CallContext<'_>, &[Value]) -> Result<Value, String>;

/// Native function value (built-in functions)
#[derive(Clone)]
pub struct NativeFunctionValue {
    pub name: String,
    pub arity: Arity,
    pub func: BuiltinFn,
}

impl fmt::Debug for NativeFunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

impl Value {
    pub fn type_of(&self) -> Type {
        match self {
            Value::Int32(_) => Type::Int32,
            Value::Float32(_) => Type::Float32,
            Value::Int64(_) => Type::Int64,
            Value::Float64(_) => Type::Float64,
            Value::String(_) => Type::String,
            Value::Bool(_) => Type::Bool,
            Value::Null => Type::Null,
            Value::Array(_) => Type::Array,
            Value::Map(_) => Type::Map,
            Value::Function(_) => Type::Function,
            Value::BuiltinFunction(_) => Type::BuiltinFunction,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    /// Numbers are truthy when non-zero and strings when non-empty
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int32(n) => *n != 0,
            Value::Float32(f) => *f != 0.0,
            Value::Int64(n) => *n != 0,
            Value::Float64(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Null => false,
            _ => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(n) => write!(f, "{}", n),
            Value::Float32(fl) => write!(f, "{}", fl),
            Value::Int64(n) => write!(f, "{}", n),
            Value::Float64(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    key.fmt_nested(f)?;
                    write!(f, ": ")?;
                    value.fmt_nested(f)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<func {}>", func.name()),
            Value::BuiltinFunction(func) => write!(f, "<builtin {}>", func.name),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::BuiltinFunction(a), Value::BuiltinFunction(b)) => a.name == b.name,
            _ => false,
        }
    }
}

// ===== Conversions from Rust values =====

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float32(f)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truthiness() {
        assert!(Value::Int64(3).is_truthy());
        assert!(!Value::Int32(0).is_truthy());
        assert!(!Value::Float64(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn test_equality_requires_same_variant() {
        assert_eq!(Value::Int64(1), Value::Int64(1));
        assert_ne!(Value::Int32(1), Value::Int64(1));
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float64(2.5).to_string(), "2.5");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from("plain").to_string(), "plain");

        let nested = Value::Array(vec![Value::Int64(1), Value::from("two"), Value::Bool(true)]);
        assert_eq!(nested.to_string(), "[1, \"two\", true]");
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let mut map = MapValue::new();
        map.insert(Value::from("b"), Value::Int64(2)).unwrap();
        map.insert(Value::from("a"), Value::Int64(1)).unwrap();
        map.insert(Value::from("b"), Value::Int64(3)).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(Value::Map(map).to_string(), "{\"b\": 3, \"a\": 1}");
    }

    #[test]
    fn test_map_integer_keys_normalize() {
        let mut map = MapValue::new();
        map.insert(Value::Int32(1), Value::from("one")).unwrap();
        assert_eq!(map.get(&Value::Int64(1)).unwrap(), Some(&Value::from("one")));
        assert_eq!(map.get(&Value::Int64(2)).unwrap(), None);
    }

    #[test]
    fn test_map_rejects_unhashable_keys() {
        let mut map = MapValue::new();
        let err = map.insert(Value::Float64(1.0), Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "Type error: map keys must be string, int or bool, got float64");
    }

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Int64(1).type_of(), Type::Int64);
        assert_eq!(Value::Map(MapValue::new()).type_of(), Type::Map);
        assert_eq!(Value::from(vec![Value::Null]).type_name(), "array");
    }
}
