//! Read lambda calculus expressions, evaluate them, and print the results.
//!
//! Example usage:
//!
//!     cargo run -- --src-filepath demos/church_two.lc
//!
//! Running without a source file starts the interactive loop.

use clap::Parser;
use sexpr_lambda_calc::end_to_end::{run_interpreter, InterpreterConfig};

fn main() {
    let interpreter_config = InterpreterConfig::parse();

    let interpreter_result = run_interpreter(&interpreter_config);

    match interpreter_result {
        Ok(Some(execution_result)) => {
            println!("{}", execution_result);
        }

        Ok(None) => {}

        Err(run_error) => {
            println!("{}", run_error);
        }
    }
}
