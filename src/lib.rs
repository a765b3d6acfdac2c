//! # Zen Programming Language
//!
//! A tree-walking interpreter for Zen, a small gradually typed scripting
//! language with `var`/`const` bindings, nullable types, maps and arrays.
//!
//! ## Architecture
//!
//! Source text flows through three stages:
//! - `lexer`: Tokenization of source code
//! - `parser`: Parsing tokens into an Abstract Syntax Tree (AST), with
//!   error recovery so one pass reports every syntax error
//! - `runtime`: Evaluation of the AST against a scope chain
//!
//! Supporting modules:
//! - `source`: Source text and locations
//! - `types`: Type tags, coercion, conversion and operators
//! - `error`: Error types and diagnostics

pub mod source;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod types;
pub mod runtime;

use std::rc::Rc;

use log::debug;

// Re-export commonly used types
pub use error::{RuntimeError, SyntaxError, ZenError, ZenResult};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{Parser, Program};
pub use runtime::{Interpreter, Value};
pub use source::{SourceCode, SourceLocation};
pub use types::Type;

/// Version of the Zen language
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lex and parse `source`, collecting every syntax error
///
/// Lexical errors stop the pipeline before parsing.
pub fn parse_source(source: &Rc<SourceCode>) -> ZenResult<Program> {
    let tokens = Lexer::new(Rc::clone(source)).scan()?;
    debug!("lexed {} tokens", tokens.len());
    Parser::new(tokens).parse_program()
}

/// Compile and run a Zen program from source code
///
/// This is the main entry point for executing Zen programs. `print`
/// writes to stdout.
///
/// # Arguments
///
/// * `source` - The source code to run
/// * `filename` - Optional filename for error reporting
pub fn run(source: &str, filename: Option<&str>) -> ZenResult<()> {
    let source = match filename {
        Some(path) => SourceCode::with_path(path, source),
        None => SourceCode::inline(source),
    };

    let program = parse_source(&source)?;
    debug!("parsed {} statements", program.statements.len());

    Interpreter::new().execute(&program)?;
    Ok(())
}
