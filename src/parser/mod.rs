//! Parser module
//!
//! This module handles parsing tokens into an Abstract Syntax Tree (AST).

pub mod ast;
pub mod parser;
pub mod printer;

pub use ast::{Expr, Program, Stmt};
pub use parser::Parser;
pub use printer::print_program;
