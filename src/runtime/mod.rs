//! Runtime module
//!
//! This module handles interpretation and execution of Zen programs:
//! values, the scope chain, built-in functions and the evaluator.

pub mod value;
pub mod environment;
pub mod builtins;
pub mod interpreter;

pub use value::{Arity, FunctionValue, MapValue, NativeFunctionValue, Value};
pub use environment::{Environment, ScopeError, ScopeId, VarInfo};
pub use builtins::{register_builtins, CallContext};
pub use interpreter::Interpreter;
