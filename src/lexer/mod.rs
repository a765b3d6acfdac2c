//! Lexical analysis module
//!
//! This module handles tokenization of Zen source code.

pub mod token;
pub mod scanner;

pub use token::{Keyword, Token, TokenType};
pub use scanner::Lexer;
