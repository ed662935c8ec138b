//! Code to configure and run the interpreter front end: file-driven
//! evaluation and the interactive read-eval-print loop. Everything here is
//! thin plumbing over the core `read_term` and `evaluate` entry points.

use std::fs;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::lexical_analysis::{ReaderAction, Readtable, Token, TokenStream};
use crate::macro_expansion::{expand, MacroTable};
use crate::sexpr_parsing::{parse_expression, SurfaceExpr, SyntaxError};
use crate::term_elaboration::{elaborate_term, read_term_with_tables};
use crate::term_reduction::{evaluate, Environment, EvalError};
use crate::term_representation::{HostValue, Term};

/// Config for the interpreter front end. Instantiate via
/// `InterpreterConfig::parse()`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct InterpreterConfig {
    /// Source file holding one expression to evaluate. Starts the
    /// interactive loop when absent.
    #[arg(short, long)]
    pub src_filepath: Option<String>,

    /// Print each expression after reading, before evaluation.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Errors that may be thrown when running the front end.
#[derive(Debug)]
pub enum RunError {
    FileError(std::io::Error),
    SyntaxError(SyntaxError),
    EvalError(EvalError),
    LineEditorError(ReadlineError),
}

/// Display trait implementation for RunError.
impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileError(io_err) => {
                return write!(f, "File error: {}", io_err);
            }

            Self::SyntaxError(syntax_err) => {
                return write!(f, "Syntax error: {}", syntax_err);
            }

            Self::EvalError(eval_err) => {
                return write!(f, "Evaluation error: {}", eval_err);
            }

            Self::LineEditorError(readline_err) => {
                return write!(f, "Line editor error: {}", readline_err);
            }
        };
    }
}

/// Type conversions for errors.
impl From<std::io::Error> for RunError {
    fn from(value: std::io::Error) -> Self {
        return Self::FileError(value);
    }
}

impl From<SyntaxError> for RunError {
    fn from(value: SyntaxError) -> Self {
        return Self::SyntaxError(value);
    }
}

impl From<EvalError> for RunError {
    fn from(value: EvalError) -> Self {
        return Self::EvalError(value);
    }
}

impl From<ReadlineError> for RunError {
    fn from(value: ReadlineError) -> Self {
        return Self::LineEditorError(value);
    }
}

// Reader callback for identifier tokens: the token text as a symbol.
fn reader_identifier(
    token: &Token,
    _tokens: &mut TokenStream,
    _readtable: &Readtable,
) -> Result<SurfaceExpr, SyntaxError> {
    return Ok(SurfaceExpr::symbol(token.token_text.as_str()));
}

// Reader callback for integer literal tokens.
fn reader_integer(
    token: &Token,
    _tokens: &mut TokenStream,
    _readtable: &Readtable,
) -> Result<SurfaceExpr, SyntaxError> {
    match token.token_text.parse::<i64>() {
        Ok(int_value) => {
            return Ok(SurfaceExpr::integer(int_value));
        }

        Err(_) => {
            return Err(SyntaxError::MalformedLiteral {
                token_text: token.token_text.clone(),
            });
        }
    };
}

/// The readtable used by the front end: the standard delimiters plus
/// identifier and integer literal rules.
pub fn repl_readtable() -> Readtable {
    let mut readtable = Readtable::standard();

    readtable
        .add_rule(
            r"[a-zA-Z][a-zA-Z_0-9]*",
            ReaderAction::Callback(reader_identifier),
        )
        .expect("Unable to compile identifier rule regex.");

    readtable
        .add_rule(r"-?[0-9]+", ReaderAction::Callback(reader_integer))
        .expect("Unable to compile integer rule regex.");

    return readtable;
}

// Host function that increments a host integer.
fn host_increment(actual_arg: &Term) -> Result<Term, EvalError> {
    if let Term::Host {
        host_value: HostValue::Integer { int_value },
    } = actual_arg
    {
        return Ok(Term::host_integer(int_value + 1));
    }

    return Err(EvalError::HostApplicationError {
        fn_id: String::from("increment"),
        reason: format!("expected a host integer, found {}", actual_arg),
    });
}

/// The front end's starting environment. Binds `natify`, which applies a
/// Church numeral to a host increment function and host zero, so evaluating
/// `(natify n)` yields the host integer that `n` encodes.
pub fn standard_environment() -> Environment {
    let mut environment = Environment::new();

    environment.define(
        "natify",
        Term::host_function("natify", |actual_arg: &Term| {
            return Ok(Term::app(
                Term::app(
                    actual_arg.clone(),
                    Term::host_function("increment", host_increment),
                ),
                Term::host_integer(0),
            ));
        }),
    );

    return environment;
}

// Macro-expands, elaborates, and evaluates one parsed surface expression.
fn evaluate_surface_expr(
    surface_expr: &SurfaceExpr,
    environment: &Environment,
    macros: &MacroTable,
) -> Result<Term, RunError> {
    let expanded_expr = expand(surface_expr, macros)?;

    let mut binder_stack: Vec<String> = Vec::new();
    let elaborated_term = elaborate_term(&expanded_expr, &mut binder_stack)?;

    return Ok(evaluate(&elaborated_term, environment)?);
}

// Handles `(set name expr)`: evaluates expr and binds the result.
fn run_set_form(
    form_args: &[SurfaceExpr],
    environment: &mut Environment,
    macros: &MacroTable,
) -> Result<Option<String>, RunError> {
    if form_args.len() != 2 {
        return Err(RunError::SyntaxError(SyntaxError::MalformedForm {
            form_name: String::from("set"),
            reason: format!("expected a name and an expression, found {} forms", form_args.len()),
        }));
    }

    let bound_name = match &form_args[0] {
        SurfaceExpr::Symbol { symbol_name } => symbol_name.clone(),
        _ => {
            return Err(RunError::SyntaxError(SyntaxError::MalformedForm {
                form_name: String::from("set"),
                reason: String::from("name must be a symbol"),
            }));
        }
    };

    let evaluated_term = evaluate_surface_expr(&form_args[1], environment, macros)?;
    environment.define(bound_name.as_str(), evaluated_term);

    return Ok(None);
}

// Handles `(save filename expr)`: evaluates expr and writes its rendering to
// the named file.
fn run_save_form(
    form_args: &[SurfaceExpr],
    environment: &mut Environment,
    macros: &MacroTable,
) -> Result<Option<String>, RunError> {
    if form_args.len() != 2 {
        return Err(RunError::SyntaxError(SyntaxError::MalformedForm {
            form_name: String::from("save"),
            reason: format!(
                "expected a filename and an expression, found {} forms",
                form_args.len()
            ),
        }));
    }

    let out_filepath = match &form_args[0] {
        SurfaceExpr::Symbol { symbol_name } => symbol_name.clone(),
        _ => {
            return Err(RunError::SyntaxError(SyntaxError::MalformedForm {
                form_name: String::from("save"),
                reason: String::from("filename must be a symbol"),
            }));
        }
    };

    let evaluated_term = evaluate_surface_expr(&form_args[1], environment, macros)?;
    fs::write(out_filepath.as_str(), evaluated_term.to_string())?;

    return Ok(None);
}

/// Evaluates one line of interactive input against the environment, handling
/// the `set` and `save` forms. Returns the rendering to print, if any, and
/// binds the name `_` to the most recent plain evaluation result.
pub fn run_repl_line(
    line: &str,
    environment: &mut Environment,
    readtable: &Readtable,
    macros: &MacroTable,
) -> Result<Option<String>, RunError> {
    let mut tokens = TokenStream::new(line, readtable);

    let surface_expr = match parse_expression(&mut tokens, readtable)? {
        Some(surface_expr) => surface_expr,
        None => {
            return Ok(None);
        }
    };

    if let SurfaceExpr::List { list_items } = &surface_expr {
        if let Some(SurfaceExpr::Symbol { symbol_name }) = list_items.first() {
            if symbol_name == "set" {
                return run_set_form(&list_items[1..], environment, macros);
            }

            if symbol_name == "save" {
                return run_save_form(&list_items[1..], environment, macros);
            }
        }
    }

    let evaluated_term = evaluate_surface_expr(&surface_expr, environment, macros)?;
    let result_rendering = evaluated_term.to_string();

    environment.define("_", evaluated_term);

    return Ok(Some(result_rendering));
}

/// Reads one expression from the given source file and evaluates it under
/// the standard environment.
pub fn run_source_file(config: &InterpreterConfig, src_filepath: &str) -> Result<String, RunError> {
    // Read the input file into a string.
    let program_string = fs::read_to_string(src_filepath)?;

    // Run the reader pipeline.
    let read_result =
        read_term_with_tables(&program_string, &repl_readtable(), &MacroTable::standard())?;

    let elaborated_term = match read_result {
        Some(elaborated_term) => elaborated_term,
        None => {
            return Ok(String::new());
        }
    };

    if config.verbose {
        println!("Read expression: {}", elaborated_term);
    }

    // Evaluate the expression.
    let evaluated_term = evaluate(&elaborated_term, &standard_environment())?;

    // Return the rendering of the result.
    return Ok(evaluated_term.to_string());
}

/// Runs the interactive loop until end of input, printing results and
/// errors as they happen.
pub fn run_repl(config: &InterpreterConfig) -> Result<(), RunError> {
    let readtable = repl_readtable();
    let macros = MacroTable::standard();
    let mut environment = standard_environment();

    let mut line_editor = DefaultEditor::new()?;

    loop {
        match line_editor.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                let _ = line_editor.add_history_entry(line.as_str());

                if config.verbose {
                    println!("Read line: {}", line.trim());
                }

                match run_repl_line(line.as_str(), &mut environment, &readtable, &macros) {
                    Ok(Some(result_rendering)) => {
                        println!("{}", result_rendering);
                    }

                    Ok(None) => {}

                    Err(run_error) => {
                        println!("{}", run_error);
                    }
                }
            }

            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                return Ok(());
            }

            Err(readline_err) => {
                return Err(RunError::LineEditorError(readline_err));
            }
        };
    }
}

/// Runs the front end (the file mode or the interactive loop) based on the
/// given config. Returns the rendering to print, if any.
pub fn run_interpreter(config: &InterpreterConfig) -> Result<Option<String>, RunError> {
    match &config.src_filepath {
        Some(src_filepath) => {
            return run_source_file(config, src_filepath.as_str()).map(Some);
        }

        None => {
            return run_repl(config).map(|_| None);
        }
    };
}
