//! Runtime type tags

use std::fmt;

use thiserror::Error;

/// The type tag carried by every runtime value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int32,
    Float32,
    Int64,
    Float64,
    String,
    Bool,
    Null,
    Void,
    Array,
    Map,
    Function,
    BuiltinFunction,
    Lambda,
    Class,
    Object,
}

impl Type {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int32 => "int",
            Self::Float32 => "float",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Null => "null",
            Self::Void => "void",
            Self::Array => "array",
            Self::Map => "map",
            Self::Function | Self::BuiltinFunction => "function",
            Self::Lambda => "lambda",
            Self::Class => "class",
            Self::Object => "object",
        }
    }

    /// Resolve the base name of a type annotation
    ///
    /// Returns `None` for names the runtime does not check, such as user
    /// class names.
    pub fn from_annotation(name: &str) -> Option<Self> {
        match name {
            "int" | "int32" => Some(Self::Int32),
            "float" | "float32" => Some(Self::Float32),
            "int64" => Some(Self::Int64),
            "float64" => Some(Self::Float64),
            "string" => Some(Self::String),
            "bool" => Some(Self::Bool),
            "void" => Some(Self::Void),
            "Array" | "array" => Some(Self::Array),
            "Map" | "map" => Some(Self::Map),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int32 | Self::Float32 | Self::Int64 | Self::Float64)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function | Self::BuiltinFunction | Self::Lambda)
    }

    /// Rank used when widening mixed numeric operands
    pub(crate) fn numeric_rank(&self) -> Option<u8> {
        match self {
            Self::Int32 => Some(1),
            Self::Float32 => Some(2),
            Self::Int64 => Some(3),
            Self::Float64 => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value had the wrong type for an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Type error: {0}")]
pub struct TypeError(pub String);

impl TypeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_names() {
        assert_eq!(Type::from_annotation("int"), Some(Type::Int32));
        assert_eq!(Type::from_annotation("float64"), Some(Type::Float64));
        assert_eq!(Type::from_annotation("Array"), Some(Type::Array));
        assert_eq!(Type::from_annotation("Person"), None);
    }

    #[test]
    fn test_type_error_display() {
        assert_eq!(TypeError::new("oops").to_string(), "Type error: oops");
    }
}
