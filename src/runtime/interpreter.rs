//! Interpreter implementation
//!
//! This module implements the tree-walking interpreter for Zen.

use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, error, trace};

use super::builtins::{register_builtins, CallContext};
use super::environment::{Environment, ScopeError, VarInfo};
use super::value::{FunctionValue, MapValue, NativeFunctionValue, Value};
use crate::error::{RuntimeError, RuntimeErrorKind, SourceLocation};
use crate::parser::ast::{BinaryOp, Expr, Literal, Program, Stmt};
use crate::types::{binary_op, conform, unary_op, Type};

/// Default limit on nested user function calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

type EvalResult<T> = Result<T, RuntimeError>;

/// Control flow signals
#[derive(Debug, Clone)]
enum ControlFlow {
    None,
    Return(Value),
    Break,
    Continue,
}

/// Build a `map_err` adapter that attaches `location`
fn at<E: Into<RuntimeErrorKind>>(location: &SourceLocation) -> impl FnOnce(E) -> RuntimeError + '_ {
    move |error| error.into().at(location)
}

/// Interpreter
pub struct Interpreter {
    env: Environment,
    control_flow: ControlFlow,
    loop_depth: usize,
    call_depth: usize,
    max_call_depth: usize,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let mut env = Environment::new();
        if let Err(err) = register_builtins(&mut env) {
            error!("failed to register builtins: {}", err);
        }

        Self {
            env,
            control_flow: ControlFlow::None,
            loop_depth: 0,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            output: Box::new(io::stdout()),
        }
    }

    /// Send `print` output somewhere other than stdout
    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.output = output;
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Value bound to `name` in the current scope chain
    pub fn get_value(&self, name: &str) -> EvalResult<Value> {
        Ok(self.env.get(name)?)
    }

    /// Run every statement of `program`
    ///
    /// Stops at the first runtime error or at a top-level `return`.
    pub fn execute(&mut self, program: &Program) -> EvalResult<()> {
        debug!("executing {} statements", program.statements.len());
        self.control_flow = ControlFlow::None;

        for stmt in &program.statements {
            self.execute_statement(stmt)?;
            if let ControlFlow::Return(_) = self.control_flow {
                debug!("top-level return at {}", stmt.location());
                self.control_flow = ControlFlow::None;
                break;
            }
        }

        self.output.flush().map_err(|e| {
            RuntimeErrorKind::Builtin {
                name: "print".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    // ===== Scopes =====

    /// Run `f` in a fresh nested scope, closing it on every path
    fn in_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        self.env.begin_scope();
        let result = f(self);
        self.env.end_scope()?;
        result
    }

    fn in_loop<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        self.loop_depth += 1;
        let result = f(self);
        self.loop_depth -= 1;
        result
    }

    fn run_statements(&mut self, statements: &[Stmt]) -> EvalResult<()> {
        for stmt in statements {
            self.execute_statement(stmt)?;
            if !matches!(self.control_flow, ControlFlow::None) {
                break;
            }
        }
        Ok(())
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> EvalResult<()> {
        self.in_scope(|this| this.run_statements(statements))
    }

    /// Consume a pending break or continue; true when the loop must stop
    fn loop_should_exit(&mut self) -> bool {
        match self.control_flow {
            ControlFlow::Break => {
                self.control_flow = ControlFlow::None;
                true
            }
            ControlFlow::Continue => {
                self.control_flow = ControlFlow::None;
                false
            }
            ControlFlow::Return(_) => true,
            ControlFlow::None => false,
        }
    }

    fn condition(&mut self, expr: &Expr, construct: &'static str) -> EvalResult<bool> {
        match self.evaluate_expression(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeErrorKind::NonBooleanCondition {
                construct,
                found: other.type_of(),
            }
            .at(expr.location())),
        }
    }

    // ===== Statements =====

    pub fn execute_statement(&mut self, stmt: &Stmt) -> EvalResult<()> {
        trace!("statement at {}", stmt.location());

        match stmt {
            Stmt::VarDecl {
                name,
                type_annotation,
                initializer,
                is_const,
                is_nullable,
                location,
            } => {
                let declared_type = type_annotation
                    .as_ref()
                    .and_then(|annotation| Type::from_annotation(annotation.name()));

                let value = match initializer {
                    Some(init) => {
                        let value = self.evaluate_expression(init)?;
                        match declared_type {
                            Some(ty) => conform(value, ty).map_err(at(location))?,
                            None => value,
                        }
                    }
                    None if *is_const => {
                        return Err(RuntimeErrorKind::UninitializedConstant(name.clone()).at(location))
                    }
                    None if *is_nullable => Value::Null,
                    None => {
                        return Err(RuntimeErrorKind::UninitializedVariable(name.clone()).at(location))
                    }
                };

                let defined = match declared_type {
                    None if *is_const => self.env.define_const(name, value),
                    None if *is_nullable => self.env.define_nullable(name, value),
                    None => self.env.define(name, value),
                    Some(ty) => {
                        let info = if *is_const {
                            VarInfo::constant(value)
                        } else if *is_nullable || value.is_null() {
                            VarInfo::nullable(value)
                        } else {
                            VarInfo::variable(value)
                        };
                        self.env.declare(name, info.with_type(Some(ty)))
                    }
                };
                defined.map_err(at(location))
            }

            Stmt::FunctionDecl(declaration) => {
                let function = FunctionValue {
                    declaration: Rc::clone(declaration),
                    scope: self.env.current_scope(),
                };
                self.env
                    .define(&declaration.name, Value::Function(Rc::new(function)))
                    .map_err(at(&declaration.location))
            }

            Stmt::Expression { expr, .. } => {
                self.evaluate_expression(expr)?;
                Ok(())
            }

            Stmt::If {
                condition,
                then_branch,
                elif_branches,
                else_branch,
                ..
            } => {
                if self.condition(condition, "If")? {
                    return self.execute_block(then_branch);
                }
                for branch in elif_branches {
                    if self.condition(&branch.condition, "Elif")? {
                        return self.execute_block(&branch.body);
                    }
                }
                match else_branch {
                    Some(body) => self.execute_block(body),
                    None => Ok(()),
                }
            }

            Stmt::While { condition, body, .. } => self.in_loop(|this| {
                while this.condition(condition, "While")? {
                    this.execute_block(body)?;
                    if this.loop_should_exit() {
                        break;
                    }
                }
                Ok(())
            }),

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
                ..
            } => self.in_scope(|this| {
                if let Some(init) = initializer {
                    this.execute_statement(init)?;
                }

                this.in_loop(|this| {
                    loop {
                        if let Some(cond) = condition {
                            if !this.condition(cond, "For")? {
                                break;
                            }
                        }

                        this.execute_block(body)?;
                        if this.loop_should_exit() {
                            break;
                        }

                        if let Some(inc) = increment {
                            this.evaluate_expression(inc)?;
                        }
                    }
                    Ok(())
                })
            }),

            Stmt::ForIn {
                key,
                value,
                container,
                body,
                location,
            } => {
                let entries = self.iteration_entries(container)?;
                trace!("for-in over {} entries", entries.len());

                self.in_loop(|this| {
                    for (entry_key, entry_value) in entries {
                        this.in_scope(|this| {
                            if let Some(key) = key {
                                this.env.define(key, entry_key).map_err(at(location))?;
                            }
                            this.env.define(value, entry_value).map_err(at(location))?;
                            this.run_statements(body)
                        })?;

                        if this.loop_should_exit() {
                            break;
                        }
                    }
                    Ok(())
                })
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Null,
                };
                self.control_flow = ControlFlow::Return(value);
                Ok(())
            }

            Stmt::Break { location } => {
                if self.loop_depth == 0 {
                    return Err(RuntimeErrorKind::OutsideLoop("break").at(location));
                }
                self.control_flow = ControlFlow::Break;
                Ok(())
            }

            Stmt::Continue { location } => {
                if self.loop_depth == 0 {
                    return Err(RuntimeErrorKind::OutsideLoop("continue").at(location));
                }
                self.control_flow = ControlFlow::Continue;
                Ok(())
            }
        }
    }

    /// Key/value pairs a for-in loop visits, in order
    fn iteration_entries(&mut self, container: &Expr) -> EvalResult<Vec<(Value, Value)>> {
        let position = |i: usize| Value::Int64(i as i64);

        match self.evaluate_expression(container)? {
            Value::Array(items) => Ok(items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (position(i), item))
                .collect()),
            Value::Map(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            Value::String(s) => Ok(s
                .chars()
                .enumerate()
                .map(|(i, c)| (position(i), Value::String(c.to_string())))
                .collect()),
            other => Err(RuntimeErrorKind::NotIterable(other.type_of()).at(container.location())),
        }
    }

    // ===== Expressions =====

    pub fn evaluate_expression(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Integer(n) => Value::Int64(*n),
                Literal::Float(f) => Value::Float64(*f),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Boolean(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),

            Expr::Identifier { name, location } => self.env.get(name).map_err(at(location)),

            Expr::Binary {
                left,
                operator,
                right,
                location,
            } => match operator {
                BinaryOp::Assign => self.assign(left, right, location),
                BinaryOp::And | BinaryOp::Or => self.logical(left, *operator, right),
                _ => {
                    let left = self.evaluate_expression(left)?;
                    let right = self.evaluate_expression(right)?;
                    binary_op(&left, *operator, &right).map_err(at(location))
                }
            },

            Expr::Unary {
                operator,
                operand,
                location,
            } => {
                let operand = self.evaluate_expression(operand)?;
                unary_op(*operator, &operand).map_err(at(location))
            }

            Expr::Call {
                callee,
                arguments,
                location,
            } => {
                let callee = self.evaluate_expression(callee)?;
                let args = arguments
                    .iter()
                    .map(|arg| self.evaluate_expression(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.call_value(callee, args, location)
            }

            Expr::MemberAccess {
                object,
                member,
                location,
            } => {
                let object = self.evaluate_expression(object)?;
                member_of(&object, member).map_err(at(location))
            }

            Expr::ArrayLiteral { elements, .. } => elements
                .iter()
                .map(|element| self.evaluate_expression(element))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array),

            Expr::ArrayAccess {
                array,
                index,
                location,
            } => {
                let array = self.evaluate_expression(array)?;
                let index = self.evaluate_expression(index)?;
                element_of(&array, &index).map_err(at(location))
            }

            Expr::MapLiteral { entries, .. } => {
                let mut map = MapValue::new();
                for (key_expr, value_expr) in entries {
                    let key = self.evaluate_expression(key_expr)?;
                    let value = self.evaluate_expression(value_expr)?;
                    map.insert(key, value).map_err(at(key_expr.location()))?;
                }
                Ok(Value::Map(map))
            }

            Expr::MapAccess { map, key, location } => {
                let map = self.evaluate_expression(map)?;
                let key = self.evaluate_expression(key)?;
                match map {
                    Value::Map(map) => entry_of(&map, &key).map_err(at(location)),
                    other => Err(RuntimeErrorKind::NotIndexable(other.type_of()).at(location)),
                }
            }

            // no task model yet; the awaited value is the value itself
            Expr::Await { expression, .. } => self.evaluate_expression(expression),
        }
    }

    /// `and`/`or` with short-circuiting; both sides must be bool
    fn logical(&mut self, left: &Expr, operator: BinaryOp, right: &Expr) -> EvalResult<Value> {
        let left_value = self.bool_operand(left, "Left", operator)?;
        let short_circuit = match operator {
            BinaryOp::And => !left_value,
            _ => left_value,
        };
        if short_circuit {
            return Ok(Value::Bool(left_value));
        }
        self.bool_operand(right, "Right", operator).map(Value::Bool)
    }

    fn bool_operand(&mut self, expr: &Expr, side: &'static str, operator: BinaryOp) -> EvalResult<bool> {
        match self.evaluate_expression(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeErrorKind::NonBooleanOperand {
                side,
                operator: operator.as_str(),
                found: other.type_of(),
            }
            .at(expr.location())),
        }
    }

    // ===== Assignment =====

    fn assign(&mut self, target: &Expr, value: &Expr, location: &SourceLocation) -> EvalResult<Value> {
        let value = self.evaluate_expression(value)?;
        self.store(target, value, location)
    }

    /// Write `value` through `target`, returning what was stored
    ///
    /// Collections are rebuilt with the new element and written back
    /// through their own target.
    fn store(&mut self, target: &Expr, value: Value, location: &SourceLocation) -> EvalResult<Value> {
        match target {
            Expr::Identifier { name, .. } => {
                let declared_type = self.env.lookup(name).map_err(at(location))?.declared_type;
                let value = match declared_type {
                    Some(ty) => conform(value, ty).map_err(at(location))?,
                    None => value,
                };
                self.env.assign(name, value.clone()).map_err(at(location))?;
                Ok(value)
            }

            Expr::ArrayAccess { array, index, .. } => {
                let container = self.evaluate_expression(array)?;
                let index = self.evaluate_expression(index)?;
                let updated = match container {
                    Value::Array(mut items) => {
                        let i = array_position(&index, items.len()).map_err(at(location))?;
                        items[i] = value.clone();
                        Value::Array(items)
                    }
                    other => return Err(RuntimeErrorKind::NotIndexable(other.type_of()).at(location)),
                };
                self.store(array, updated, location)?;
                Ok(value)
            }

            Expr::MapAccess { map, key, .. } => {
                let container = self.evaluate_expression(map)?;
                let key = self.evaluate_expression(key)?;
                let updated = match container {
                    Value::Map(mut entries) => {
                        entries.insert(key, value.clone()).map_err(at(location))?;
                        Value::Map(entries)
                    }
                    other => return Err(RuntimeErrorKind::NotIndexable(other.type_of()).at(location)),
                };
                self.store(map, updated, location)?;
                Ok(value)
            }

            Expr::MemberAccess { object, member, .. } => {
                let container = self.evaluate_expression(object)?;
                let updated = match container {
                    Value::Map(mut entries) => {
                        entries
                            .insert(Value::from(member.as_str()), value.clone())
                            .map_err(at(location))?;
                        Value::Map(entries)
                    }
                    other => {
                        return Err(RuntimeErrorKind::UnknownMember {
                            member: member.clone(),
                            ty: other.type_of(),
                        }
                        .at(location))
                    }
                };
                self.store(object, updated, location)?;
                Ok(value)
            }

            _ => Err(RuntimeErrorKind::InvalidAssignmentTarget.at(location)),
        }
    }

    // ===== Calls =====

    fn call_value(&mut self, callee: Value, args: Vec<Value>, location: &SourceLocation) -> EvalResult<Value> {
        match callee {
            Value::BuiltinFunction(native) => self.call_builtin(&native, &args, location),
            Value::Function(function) => self.call_function(&function, args, location),
            other => Err(RuntimeErrorKind::NotCallable(other.type_of()).at(location)),
        }
    }

    fn call_builtin(
        &mut self,
        native: &NativeFunctionValue,
        args: &[Value],
        location: &SourceLocation,
    ) -> EvalResult<Value> {
        if !native.arity.accepts(args.len()) {
            return Err(RuntimeErrorKind::Arity {
                name: native.name.clone(),
                expected: native.arity.to_string(),
                found: args.len(),
            }
            .at(location));
        }

        trace!("builtin {} with {} argument(s)", native.name, args.len());
        let mut ctx = CallContext {
            env: &mut self.env,
            out: &mut *self.output,
        };
        (native.func)(&mut ctx, args).map_err(|message| {
            RuntimeErrorKind::Builtin {
                name: native.name.clone(),
                message,
            }
            .at(location)
        })
    }

    fn call_function(
        &mut self,
        function: &FunctionValue,
        args: Vec<Value>,
        location: &SourceLocation,
    ) -> EvalResult<Value> {
        let required = function.required_params();
        let total = function.declaration.params.len();
        if args.len() < required || args.len() > total {
            let expected = if required == total {
                total.to_string()
            } else {
                format!("{} to {}", required, total)
            };
            return Err(RuntimeErrorKind::Arity {
                name: function.name().to_string(),
                expected,
                found: args.len(),
            }
            .at(location));
        }

        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeErrorKind::CallDepthExceeded(self.max_call_depth).at(location));
        }

        // a function declared in a scope that has since closed sees globals only
        let parent = if self.env.is_active(function.scope) {
            function.scope
        } else {
            self.env.global_scope()
        };

        debug!(
            "call {} (depth {}, scope depth {})",
            function.name(),
            self.call_depth + 1,
            self.env.depth()
        );

        self.env.begin_call_scope(parent);
        self.call_depth += 1;
        let outer_loop_depth = std::mem::replace(&mut self.loop_depth, 0);

        let result = self.run_function(function, args);

        self.loop_depth = outer_loop_depth;
        self.call_depth -= 1;
        self.env.end_scope()?;
        result
    }

    fn run_function(&mut self, function: &FunctionValue, args: Vec<Value>) -> EvalResult<Value> {
        let declaration = &function.declaration;
        let mut args = args.into_iter();

        for param in &declaration.params {
            let value = match (args.next(), &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.evaluate_expression(default)?,
                (None, None) => Value::Null,
            };

            let declared_type = Type::from_annotation(param.type_annotation.name());
            let value = match declared_type {
                Some(ty) => conform(value, ty).map_err(at(&param.location))?,
                None => value,
            };

            let info = if param.is_nullable {
                VarInfo::nullable(value)
            } else if value.is_null() {
                return Err(RuntimeErrorKind::from(ScopeError::NullAssignment(param.name.clone()))
                    .at(&param.location));
            } else {
                VarInfo::variable(value)
            };
            self.env
                .declare(&param.name, info.with_type(declared_type))
                .map_err(at(&param.location))?;
        }

        self.run_statements(&declaration.body)?;

        let value = match std::mem::replace(&mut self.control_flow, ControlFlow::None) {
            ControlFlow::Return(value) => value,
            _ => Value::Null,
        };

        let return_type = declaration
            .return_type
            .as_ref()
            .and_then(|annotation| Type::from_annotation(annotation.name()));
        match return_type {
            None | Some(Type::Void) => Ok(value),
            Some(ty) => conform(value, ty).map_err(at(&declaration.location)),
        }
    }
}

// ===== Indexing =====

fn array_position(index: &Value, len: usize) -> Result<usize, RuntimeErrorKind> {
    let index = match index {
        Value::Int32(n) => i64::from(*n),
        Value::Int64(n) => *n,
        other => return Err(RuntimeErrorKind::InvalidIndex(other.type_of())),
    };
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(RuntimeErrorKind::IndexOutOfRange { index, len })
}

/// `container[index]` on arrays and strings
fn element_of(container: &Value, index: &Value) -> Result<Value, RuntimeErrorKind> {
    match container {
        Value::Array(items) => Ok(items[array_position(index, items.len())?].clone()),
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = array_position(index, chars.len())?;
            Ok(Value::String(chars[i].to_string()))
        }
        other => Err(RuntimeErrorKind::NotIndexable(other.type_of())),
    }
}

fn entry_of(map: &MapValue, key: &Value) -> Result<Value, RuntimeErrorKind> {
    match map.get(key)? {
        Some(value) => Ok(value.clone()),
        None => Err(RuntimeErrorKind::MissingKey(match key {
            Value::String(s) => format!("{:?}", s),
            other => other.to_string(),
        })),
    }
}

fn member_of(object: &Value, member: &str) -> Result<Value, RuntimeErrorKind> {
    let length = |n: usize| Value::Int64(n as i64);

    match (object, member) {
        (Value::Map(map), _) => entry_of(map, &Value::from(member)),
        (Value::String(s), "length") => Ok(length(s.chars().count())),
        (Value::Array(items), "length") => Ok(length(items.len())),
        (other, _) => Err(RuntimeErrorKind::UnknownMember {
            member: member.to_string(),
            ty: other.type_of(),
        }),
    }
}
