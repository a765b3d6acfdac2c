//! Lexical scopes
//!
//! Scopes live in an arena owned by the [`Environment`]. Index 0 is the
//! global scope and the last entry is always the current one, so scope
//! lifetimes follow block entry and exit strictly. Each scope links to its
//! parent by id; for blocks that is the scope below it, for function calls
//! it is the scope the function was declared in.

use std::collections::HashMap;

use log::trace;
use thiserror::Error;

use super::value::Value;
use crate::types::Type;

/// Environment failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("Cannot redefine variable: {0}")]
    Redefinition(String),

    #[error("Undefined variable: {0}")]
    Undefined(String),

    #[error("Cannot assign to constant: {0}")]
    ConstantAssignment(String),

    #[error("Cannot assign null to non-nullable variable: {0}")]
    NullAssignment(String),

    #[error("Cannot define constant with null value: {0}")]
    NullConstant(String),

    #[error("Cannot end global scope")]
    GlobalScopeEnd,
}

/// Identity of a scope in the arena
///
/// The generation tells apart scopes that reuse the same slot after an
/// earlier scope was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId {
    index: usize,
    generation: u64,
}

/// A binding and its modifiers
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub value: Value,
    pub is_constant: bool,
    pub is_nullable: bool,
    pub declared_type: Option<Type>,
}

impl VarInfo {
    pub fn variable(value: Value) -> Self {
        Self {
            value,
            is_constant: false,
            is_nullable: false,
            declared_type: None,
        }
    }

    pub fn constant(value: Value) -> Self {
        Self {
            is_constant: true,
            ..Self::variable(value)
        }
    }

    pub fn nullable(value: Value) -> Self {
        Self {
            is_nullable: true,
            ..Self::variable(value)
        }
    }

    pub fn with_type(mut self, declared_type: Option<Type>) -> Self {
        self.declared_type = declared_type;
        self
    }
}

/// One level of name bindings
#[derive(Debug)]
pub struct Scope {
    parent: Option<ScopeId>,
    generation: u64,
    bindings: HashMap<String, VarInfo>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, generation: u64) -> Self {
        Self {
            parent,
            generation,
            bindings: HashMap::new(),
        }
    }

    fn declare(&mut self, name: &str, info: VarInfo) -> Result<(), ScopeError> {
        if self.bindings.contains_key(name) {
            return Err(ScopeError::Redefinition(name.to_string()));
        }
        self.bindings.insert(name.to_string(), info);
        Ok(())
    }

    fn set(&mut self, name: &str, value: Value) -> Option<Result<(), ScopeError>> {
        let info = self.bindings.get_mut(name)?;
        if info.is_constant {
            return Some(Err(ScopeError::ConstantAssignment(name.to_string())));
        }
        if !info.is_nullable && value.is_null() {
            return Some(Err(ScopeError::NullAssignment(name.to_string())));
        }
        info.value = value;
        Some(Ok(()))
    }
}

/// Scope chain with a global anchor
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    next_generation: u64,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None, 0)],
            next_generation: 1,
        }
    }

    // ===== Scope lifetime =====

    fn id_of(&self, index: usize) -> ScopeId {
        ScopeId {
            index,
            generation: self.scopes[index].generation,
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.id_of(self.scopes.len() - 1)
    }

    pub fn global_scope(&self) -> ScopeId {
        self.id_of(0)
    }

    fn push(&mut self, parent: ScopeId) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.scopes.push(Scope::new(Some(parent), generation));
        trace!("begin scope {} (parent {})", self.scopes.len() - 1, parent.index);
    }

    /// Open a scope nested in the current one
    pub fn begin_scope(&mut self) {
        self.push(self.current_scope());
    }

    /// Open a function call scope whose parent is `parent`
    pub fn begin_call_scope(&mut self, parent: ScopeId) {
        self.push(parent);
    }

    /// Close the current scope
    pub fn end_scope(&mut self) -> Result<(), ScopeError> {
        if self.scopes.len() == 1 {
            return Err(ScopeError::GlobalScopeEnd);
        }
        self.scopes.pop();
        trace!("end scope {}", self.scopes.len());
        Ok(())
    }

    /// Whether `id` is the current scope or one of its ancestors
    pub fn is_active(&self, id: ScopeId) -> bool {
        self.chain().any(|index| self.id_of(index) == id)
    }

    /// Length of the current scope chain, global included
    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    fn chain(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(self.scopes.len() - 1), move |&index| {
            self.scopes[index].parent.map(|parent| parent.index)
        })
    }

    fn current(&mut self) -> &mut Scope {
        let index = self.scopes.len() - 1;
        &mut self.scopes[index]
    }

    // ===== Definitions =====

    /// Define a variable; a null value makes the binding nullable
    pub fn define(&mut self, name: &str, value: Value) -> Result<(), ScopeError> {
        let info = if value.is_null() {
            VarInfo::nullable(value)
        } else {
            VarInfo::variable(value)
        };
        self.declare(name, info)
    }

    pub fn define_const(&mut self, name: &str, value: Value) -> Result<(), ScopeError> {
        if value.is_null() {
            return Err(ScopeError::NullConstant(name.to_string()));
        }
        self.declare(name, VarInfo::constant(value))
    }

    pub fn define_nullable(&mut self, name: &str, value: Value) -> Result<(), ScopeError> {
        self.declare(name, VarInfo::nullable(value))
    }

    /// Insert a fully described binding into the current scope
    pub fn declare(&mut self, name: &str, info: VarInfo) -> Result<(), ScopeError> {
        if info.is_constant && info.value.is_null() {
            return Err(ScopeError::NullConstant(name.to_string()));
        }
        self.current().declare(name, info)
    }

    pub fn define_global(&mut self, name: &str, value: Value) -> Result<(), ScopeError> {
        self.scopes[0].declare(name, VarInfo::variable(value))
    }

    // ===== Lookup and assignment =====

    /// Find the binding for `name` along the current chain
    pub fn lookup(&self, name: &str) -> Result<&VarInfo, ScopeError> {
        self.chain()
            .find_map(|index| self.scopes[index].bindings.get(name))
            .ok_or_else(|| ScopeError::Undefined(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Result<Value, ScopeError> {
        self.lookup(name).map(|info| info.value.clone())
    }

    pub fn get_global(&self, name: &str) -> Result<Value, ScopeError> {
        self.scopes[0]
            .bindings
            .get(name)
            .map(|info| info.value.clone())
            .ok_or_else(|| ScopeError::Undefined(name.to_string()))
    }

    /// Update the nearest binding of `name`
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ScopeError> {
        let owner = self
            .chain()
            .find(|&index| self.scopes[index].bindings.contains_key(name))
            .ok_or_else(|| ScopeError::Undefined(name.to_string()))?;

        self.scopes[owner]
            .set(name, value)
            .unwrap_or_else(|| Err(ScopeError::Undefined(name.to_string())))
    }

    pub fn assign_global(&mut self, name: &str, value: Value) -> Result<(), ScopeError> {
        self.scopes[0]
            .set(name, value)
            .unwrap_or_else(|| Err(ScopeError::Undefined(name.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("x", Value::Int64(1)).unwrap();
        assert_eq!(env.get("x").unwrap(), Value::Int64(1));
        assert_eq!(env.get("y"), Err(ScopeError::Undefined("y".to_string())));
    }

    #[test]
    fn test_redefinition_in_same_scope() {
        let mut env = Environment::new();
        env.define("x", Value::Int64(1)).unwrap();
        let err = env.define("x", Value::Int64(2)).unwrap_err();
        assert_eq!(err.to_string(), "Cannot redefine variable: x");
    }

    #[test]
    fn test_shadowing() {
        let mut env = Environment::new();
        env.define("x", Value::Int64(1)).unwrap();

        env.begin_scope();
        env.define("x", Value::Int64(2)).unwrap();
        assert_eq!(env.get("x").unwrap(), Value::Int64(2));
        env.end_scope().unwrap();

        assert_eq!(env.get("x").unwrap(), Value::Int64(1));
    }

    #[test]
    fn test_assign_reaches_parent() {
        let mut env = Environment::new();
        env.define("x", Value::Int64(1)).unwrap();

        env.begin_scope();
        env.assign("x", Value::Int64(5)).unwrap();
        env.end_scope().unwrap();

        assert_eq!(env.get("x").unwrap(), Value::Int64(5));
    }

    #[test]
    fn test_constants() {
        let mut env = Environment::new();
        env.define_const("PI", Value::Float64(3.14)).unwrap();

        let err = env.assign("PI", Value::Float64(3.0)).unwrap_err();
        assert_eq!(err, ScopeError::ConstantAssignment("PI".to_string()));
        assert_eq!(
            env.define_const("NOTHING", Value::Null),
            Err(ScopeError::NullConstant("NOTHING".to_string()))
        );
    }

    #[test]
    fn test_nullability() {
        let mut env = Environment::new();
        env.define("count", Value::Int64(0)).unwrap();
        env.define_nullable("maybe", Value::Int64(1)).unwrap();

        assert_eq!(
            env.assign("count", Value::Null),
            Err(ScopeError::NullAssignment("count".to_string()))
        );
        env.assign("maybe", Value::Null).unwrap();
        assert_eq!(env.get("maybe").unwrap(), Value::Null);

        // defining with null makes the binding nullable
        env.define("empty", Value::Null).unwrap();
        assert!(env.lookup("empty").unwrap().is_nullable);
    }

    #[test]
    fn test_cannot_end_global_scope() {
        let mut env = Environment::new();
        assert_eq!(env.end_scope(), Err(ScopeError::GlobalScopeEnd));
        env.begin_scope();
        assert_eq!(env.depth(), 2);
        env.end_scope().unwrap();
        assert_eq!(env.depth(), 1);
    }

    #[test]
    fn test_global_operations_bypass_chain() {
        let mut env = Environment::new();
        env.define_global("g", Value::Int64(1)).unwrap();

        env.begin_scope();
        env.define("g", Value::Int64(2)).unwrap();
        assert_eq!(env.get_global("g").unwrap(), Value::Int64(1));
        env.assign_global("g", Value::Int64(3)).unwrap();
        assert_eq!(env.get("g").unwrap(), Value::Int64(2));
        env.end_scope().unwrap();

        assert_eq!(env.get("g").unwrap(), Value::Int64(3));
    }

    #[test]
    fn test_call_scope_skips_caller_bindings() {
        let mut env = Environment::new();
        let global = env.global_scope();

        env.begin_scope();
        env.define("local", Value::Int64(1)).unwrap();

        env.begin_call_scope(global);
        assert!(env.get("local").is_err());
        env.end_scope().unwrap();

        assert!(env.get("local").is_ok());
    }

    #[test]
    fn test_closed_scope_is_inactive() {
        let mut env = Environment::new();
        env.begin_scope();
        let block = env.current_scope();
        assert!(env.is_active(block));
        env.end_scope().unwrap();

        // same slot, different scope
        env.begin_scope();
        assert!(!env.is_active(block));
        assert!(env.is_active(env.global_scope()));
    }
}
