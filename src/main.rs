//! Zen Language CLI
//!
//! Command-line interface for the Zen programming language.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use clap::Parser;
use log::{debug, LevelFilter};

use zen_lang::error::Diagnostic;
use zen_lang::parser::{print_program, Parser as ZenParser};
use zen_lang::{Interpreter, Lexer, Program, SourceCode, ZenError, ZenResult, VERSION};

/// Zen is a small gradually typed scripting language.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script to run. Starts the interactive REPL when omitted.
    file: Option<PathBuf>,

    /// Show tokenization output (lexer only)
    #[arg(short, long)]
    tokens: bool,

    /// Print the syntax tree instead of running the script
    #[arg(long)]
    ast: bool,

    /// Stop parsing at the first syntax error
    #[arg(long)]
    fail_fast: bool,

    /// Start the REPL, after running FILE if one is given
    #[arg(short, long)]
    interactive: bool,

    /// Log pipeline progress (RUST_LOG overrides this)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let mut interpreter = Interpreter::new();

    if let Some(path) = &args.file {
        if let Err(code) = run_file(path, &args, &mut interpreter) {
            process::exit(code);
        }
    }

    if args.file.is_none() || args.interactive {
        println!("Zen v{} - Language Interpreter", VERSION);
        println!("Type 'exit' to quit\n");
        repl(&mut interpreter, args.fail_fast);
    }
}

fn report(err: &ZenError) {
    eprint!("{}", Diagnostic::new(err));
}

fn parse(source: &Rc<SourceCode>, fail_fast: bool) -> ZenResult<Program> {
    let tokens = Lexer::new(Rc::clone(source)).scan()?;
    ZenParser::new(tokens)
        .stop_at_first_error(fail_fast)
        .parse_program()
}

/// Run, dump or tokenize a script; `Err` carries the exit code
fn run_file(path: &Path, args: &Args, interpreter: &mut Interpreter) -> Result<(), i32> {
    let source = SourceCode::load(path).map_err(|e| {
        eprintln!("Failed to read file '{}': {}", path.display(), e);
        1
    })?;
    debug!("loaded {} ({} chars)", path.display(), source.len());

    if args.tokens {
        return show_tokens(&source).map_err(|e| {
            report(&e);
            1
        });
    }

    let program = parse(&source, args.fail_fast).map_err(|e| {
        report(&e);
        1
    })?;

    if args.ast {
        print!("{}", print_program(&program));
        return Ok(());
    }

    interpreter.execute(&program).map_err(|e| {
        report(&ZenError::Runtime(e));
        1
    })
}

/// Show tokens from lexing a file
fn show_tokens(source: &Rc<SourceCode>) -> ZenResult<()> {
    let tokens = Lexer::new(Rc::clone(source)).scan()?;

    println!("{}", "=".repeat(60));
    for (i, token) in tokens.iter().enumerate() {
        println!(
            "{:4}: {:20} | {:?} @ {}",
            i,
            token.token_type.to_string(),
            token.lexeme,
            token.location
        );
    }
    println!("{}", "=".repeat(60));
    println!("Total tokens: {}", tokens.len());

    Ok(())
}

/// Start an interactive REPL (Read-Eval-Print Loop)
///
/// One interpreter serves every line, so definitions persist.
fn repl(interpreter: &mut Interpreter, fail_fast: bool) {
    let mut line_number = 1;

    loop {
        print!("zen:{} > ", line_number);
        if let Err(e) = io::stdout().flush() {
            eprintln!("Error writing prompt: {}", e);
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break, // EOF
            Ok(_) => {
                let input = input.trim();

                if input == "exit" || input == "quit" {
                    break;
                }

                if input.is_empty() {
                    continue;
                }

                let source = SourceCode::inline(input);
                let result = parse(&source, fail_fast)
                    .and_then(|program| Ok(interpreter.execute(&program)?));
                if let Err(e) = result {
                    report(&e);
                }

                line_number += 1;
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }

    println!("\nGoodbye!");
}
