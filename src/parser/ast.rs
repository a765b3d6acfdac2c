//! Abstract Syntax Tree definitions
//!
//! This module defines the AST node types for the Zen language.

use std::fmt;
use std::rc::Rc;

use crate::source::SourceLocation;

/// Root AST node representing a complete program
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Variable declaration: var x: int? = 42
    VarDecl {
        name: String,
        type_annotation: Option<TypeAnnotation>,
        initializer: Option<Expr>,
        is_const: bool,
        is_nullable: bool,
        location: SourceLocation,
    },

    /// Function declaration, shared with the function values it creates
    FunctionDecl(Rc<FunctionDecl>),

    /// Expression statement
    Expression {
        expr: Expr,
        location: SourceLocation,
    },

    /// If statement with its elif chain
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        elif_branches: Vec<ElifBranch>,
        else_branch: Option<Vec<Stmt>>,
        location: SourceLocation,
    },

    /// While loop
    While {
        condition: Expr,
        body: Vec<Stmt>,
        location: SourceLocation,
    },

    /// C-style for loop, every clause optional
    For {
        initializer: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Vec<Stmt>,
        location: SourceLocation,
    },

    /// for [key,] value in container
    ForIn {
        key: Option<String>,
        value: String,
        container: Expr,
        body: Vec<Stmt>,
        location: SourceLocation,
    },

    /// Return statement
    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },

    /// Break statement
    Break {
        location: SourceLocation,
    },

    /// Continue statement
    Continue {
        location: SourceLocation,
    },
}

/// One `elif cond { ... }` arm
#[derive(Debug, Clone, PartialEq)]
pub struct ElifBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// func name(params) [: ReturnType] { body }
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeAnnotation>,
    pub body: Vec<Stmt>,
    pub is_async: bool,
    pub location: SourceLocation,
}

/// Function parameter: name : Type [?] [= default]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: TypeAnnotation,
    pub is_nullable: bool,
    pub default: Option<Expr>,
    pub location: SourceLocation,
}

/// Type annotation
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnnotation {
    /// A bare name: int, string, Person
    Basic {
        name: String,
        location: SourceLocation,
    },

    /// A name with parameters: Array<int, 5>, Map<string, int>
    Parametric {
        base: String,
        params: Vec<TypeParam>,
        location: SourceLocation,
    },
}

/// One parameter inside `<...>`
#[derive(Debug, Clone, PartialEq)]
pub enum TypeParam {
    Type(TypeAnnotation),
    Size(i64),
}

impl TypeAnnotation {
    /// The base name, without parameters
    pub fn name(&self) -> &str {
        match self {
            Self::Basic { name, .. } => name,
            Self::Parametric { base, .. } => base,
        }
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { name, .. } => write!(f, "{}", name),
            Self::Parametric { base, params, .. } => {
                write!(f, "{}<", base)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match param {
                        TypeParam::Type(ty) => write!(f, "{}", ty)?,
                        TypeParam::Size(size) => write!(f, "{}", size)?,
                    }
                }
                write!(f, ">")
            }
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal {
        value: Literal,
        location: SourceLocation,
    },

    /// Variable reference
    Identifier {
        name: String,
        location: SourceLocation,
    },

    /// Binary operation, including `=` and the desugared compound forms
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        location: SourceLocation,
    },

    /// Unary operation
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },

    /// Function call
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        location: SourceLocation,
    },

    /// object.member
    MemberAccess {
        object: Box<Expr>,
        member: String,
        location: SourceLocation,
    },

    /// [a, b, c]
    ArrayLiteral {
        elements: Vec<Expr>,
        location: SourceLocation,
    },

    /// array[index]
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
        location: SourceLocation,
    },

    /// {key: value, ...}
    MapLiteral {
        entries: Vec<(Expr, Expr)>,
        location: SourceLocation,
    },

    /// map{key}
    MapAccess {
        map: Box<Expr>,
        key: Box<Expr>,
        location: SourceLocation,
    },

    /// await expr
    Await {
        expression: Box<Expr>,
        location: SourceLocation,
    },
}

impl Expr {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::Literal { location, .. }
            | Self::Identifier { location, .. }
            | Self::Binary { location, .. }
            | Self::Unary { location, .. }
            | Self::Call { location, .. }
            | Self::MemberAccess { location, .. }
            | Self::ArrayLiteral { location, .. }
            | Self::ArrayAccess { location, .. }
            | Self::MapLiteral { location, .. }
            | Self::MapAccess { location, .. }
            | Self::Await { location, .. } => location,
        }
    }

    /// Whether a map access appears anywhere in this expression
    pub fn contains_map_access(&self) -> bool {
        match self {
            Self::MapAccess { .. } => true,
            Self::Literal { .. } | Self::Identifier { .. } => false,
            Self::Binary { left, right, .. } => {
                left.contains_map_access() || right.contains_map_access()
            }
            Self::Unary { operand, .. } => operand.contains_map_access(),
            Self::Call { callee, arguments, .. } => {
                callee.contains_map_access() || arguments.iter().any(Expr::contains_map_access)
            }
            Self::MemberAccess { object, .. } => object.contains_map_access(),
            Self::ArrayLiteral { elements, .. } => elements.iter().any(Expr::contains_map_access),
            Self::ArrayAccess { array, index, .. } => {
                array.contains_map_access() || index.contains_map_access()
            }
            Self::MapLiteral { entries, .. } => entries
                .iter()
                .any(|(key, value)| key.contains_map_access() || value.contains_map_access()),
            Self::Await { expression, .. } => expression.contains_map_access(),
        }
    }
}

impl Stmt {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::FunctionDecl(decl) => &decl.location,
            Self::VarDecl { location, .. }
            | Self::Expression { location, .. }
            | Self::If { location, .. }
            | Self::While { location, .. }
            | Self::For { location, .. }
            | Self::ForIn { location, .. }
            | Self::Return { location, .. }
            | Self::Break { location }
            | Self::Continue { location } => location,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Assign,
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Or => "or",
            Self::And => "and",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Less | Self::LessEqual | Self::Greater | Self::GreaterEqual
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negate => write!(f, "-"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{:?}", n),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
        }
    }
}
