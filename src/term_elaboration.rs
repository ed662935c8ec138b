//! Elaboration of expanded surface S-expressions into de Bruijn terms, plus
//! the composed `read_term` entry point driving the whole reading pipeline:
//! tokenize, parse, macro-expand, elaborate.

use crate::lexical_analysis::{Readtable, TokenStream};
use crate::macro_expansion::{expand, MacroTable};
use crate::sexpr_parsing::{parse_expression, SurfaceExpr, SyntaxError};
use crate::term_representation::{HostValue, Term};

// Both spellings of the abstraction keyword accepted in surface syntax.
fn is_abstraction_keyword(symbol_name: &str) -> bool {
    return symbol_name == "λ" || symbol_name == "\\";
}

/// Elaborates an expanded surface expression into a term, resolving symbols
/// to de Bruijn indices against `binder_stack` (innermost binder last).
/// Symbols not on the stack become free-name leaves, to be resolved against
/// an environment at evaluation time; integer literals and the empty value
/// become opaque host leaves.
pub fn elaborate_term(
    expr: &SurfaceExpr,
    binder_stack: &mut Vec<String>,
) -> Result<Term, SyntaxError> {
    match expr {
        SurfaceExpr::List { list_items } => {
            // Abstraction form: (λ param body).
            if let Some(SurfaceExpr::Symbol { symbol_name }) = list_items.first() {
                if is_abstraction_keyword(symbol_name.as_str()) {
                    return elaborate_abstraction(&list_items[1..], binder_stack);
                }
            }

            // Any other list is a left-associated application chain.
            let mut list_iter = list_items.iter();

            let first_item = match list_iter.next() {
                Some(first_item) => first_item,
                None => {
                    return Ok(Term::host(HostValue::Empty));
                }
            };

            let mut out_term = elaborate_term(first_item, binder_stack)?;

            for next_item in list_iter {
                out_term = Term::app(out_term, elaborate_term(next_item, binder_stack)?);
            }

            return Ok(out_term);
        }

        SurfaceExpr::Symbol { symbol_name } => {
            // A symbol on the binder stack becomes an index counting binders
            // from the innermost one outward.
            let binder_position = binder_stack
                .iter()
                .rev()
                .position(|binder_name| binder_name == symbol_name);

            match binder_position {
                Some(var_index) => {
                    return Ok(Term::var(var_index));
                }
                None => {
                    return Ok(Term::free_name(symbol_name.as_str()));
                }
            };
        }

        SurfaceExpr::Integer { int_value } => {
            return Ok(Term::host_integer(*int_value));
        }

        SurfaceExpr::Empty => {
            return Ok(Term::host(HostValue::Empty));
        }
    };
}

// Elaborates the parameter-and-body tail of an abstraction form.
fn elaborate_abstraction(
    abstraction_args: &[SurfaceExpr],
    binder_stack: &mut Vec<String>,
) -> Result<Term, SyntaxError> {
    if abstraction_args.len() != 2 {
        return Err(SyntaxError::MalformedAbstraction {
            reason: format!(
                "expected a parameter name and a body, found {} forms",
                abstraction_args.len()
            ),
        });
    }

    let formal_param = match &abstraction_args[0] {
        SurfaceExpr::Symbol { symbol_name } => symbol_name.clone(),
        _ => {
            return Err(SyntaxError::MalformedAbstraction {
                reason: String::from("parameter name must be a symbol"),
            });
        }
    };

    binder_stack.push(formal_param);
    let abs_body = elaborate_term(&abstraction_args[1], binder_stack);
    binder_stack.pop();

    return Ok(Term::abs(abs_body?));
}

/// Reads one term from source text using caller-supplied tables. Returns
/// `Ok(None)` when the input holds no expression.
pub fn read_term_with_tables(
    source_text: &str,
    readtable: &Readtable,
    macros: &MacroTable,
) -> Result<Option<Term>, SyntaxError> {
    let mut tokens = TokenStream::new(source_text, readtable);

    let surface_expr = match parse_expression(&mut tokens, readtable)? {
        Some(surface_expr) => surface_expr,
        None => {
            return Ok(None);
        }
    };

    let expanded_expr = expand(&surface_expr, macros)?;

    let mut binder_stack: Vec<String> = Vec::new();

    return elaborate_term(&expanded_expr, &mut binder_stack).map(Some);
}

/// Reads one term from source text with the standard readtable and macro
/// table.
pub fn read_term(source_text: &str) -> Result<Option<Term>, SyntaxError> {
    return read_term_with_tables(source_text, &Readtable::standard(), &MacroTable::standard());
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reads source text with the standard tables, unwrapping the result.
    fn read_standard(source_text: &str) -> Term {
        return read_term(source_text)
            .expect("read_term returned unexpected syntax error")
            .expect("read_term returned no term");
    }

    // Test if the identity abstraction elaborates to a single binder.
    #[test]
    fn test_elaborate_identity() {
        let elaborated_term = read_standard("(λ x x)");

        assert_eq!(elaborated_term, Term::abs(Term::var(0)));
    }

    // Test if both spellings of the abstraction keyword are accepted.
    #[test]
    fn test_elaborate_backslash_keyword() {
        let lambda_spelling = read_standard("(λ x x)");
        let backslash_spelling = read_standard(r"(\ x x)");

        assert_eq!(lambda_spelling, backslash_spelling);
    }

    // Test if indices count binders from the innermost one outward.
    #[test]
    fn test_elaborate_binder_indices() {
        let elaborated_term = read_standard("(λ x (λ y (x y)))");

        let expected_term = Term::abs(Term::abs(Term::app(Term::var(1), Term::var(0))));
        assert_eq!(elaborated_term, expected_term);
    }

    // Test if an inner binder shadows an outer one with the same name.
    #[test]
    fn test_elaborate_shadowing() {
        let elaborated_term = read_standard("(λ x (λ x x))");

        let expected_term = Term::abs(Term::abs(Term::var(0)));
        assert_eq!(elaborated_term, expected_term);
    }

    // Test if application chains associate to the left.
    #[test]
    fn test_elaborate_application_left_associative() {
        let elaborated_term = read_standard("(f x y z)");

        let expected_term = Term::app(
            Term::app(
                Term::app(Term::free_name("f"), Term::free_name("x")),
                Term::free_name("y"),
            ),
            Term::free_name("z"),
        );

        assert_eq!(elaborated_term, expected_term);
    }

    // Test if symbols with no binder elaborate to free-name leaves.
    #[test]
    fn test_elaborate_free_symbol() {
        let elaborated_term = read_standard("(λ x (x free))");

        let expected_term = Term::abs(Term::app(Term::var(0), Term::free_name("free")));
        assert_eq!(elaborated_term, expected_term);
    }

    // Test if the lambda macro and its expansion elaborate to equal terms.
    #[test]
    fn test_elaborate_lambda_macro_equivalence() {
        let sugared_term = read_standard("(lambda (x y) (x y))");
        let primitive_term = read_standard("(λ x (λ y (x y)))");

        assert_eq!(sugared_term, primitive_term);
    }

    // Test if the let macro elaborates to an immediately-applied
    // abstraction.
    #[test]
    fn test_elaborate_let_macro_equivalence() {
        let sugared_term = read_standard("(let ((x (λ y y))) (x x))");
        let primitive_term = read_standard("((λ x (x x)) (λ y y))");

        assert_eq!(sugared_term, primitive_term);
    }

    // Test if the empty list elaborates to the empty host value.
    #[test]
    fn test_elaborate_empty_list() {
        let elaborated_term = read_standard("()");

        assert_eq!(elaborated_term, Term::host(HostValue::Empty));
    }

    // Test if blank input reads to no term at all.
    #[test]
    fn test_read_blank_input() {
        let read_result = read_term("  \n ").expect("read_term returned unexpected syntax error");

        assert_eq!(read_result, None);
    }

    // Test if an abstraction with a missing body is rejected.
    #[test]
    fn test_elaborate_abstraction_wrong_arity() {
        let read_result = read_term("(λ x)");

        assert!(matches!(
            read_result,
            Err(SyntaxError::MalformedAbstraction { .. })
        ));
    }

    // Test if an abstraction with a non-symbol parameter is rejected.
    #[test]
    fn test_elaborate_abstraction_bad_parameter() {
        let read_result = read_term("(λ (x y) x)");

        assert!(matches!(
            read_result,
            Err(SyntaxError::MalformedAbstraction { .. })
        ));
    }

    // Test if delimiter errors surface through the composed entry point.
    #[test]
    fn test_read_delimiter_errors() {
        assert!(matches!(
            read_term("(a b]"),
            Err(SyntaxError::MismatchedDelimiters { .. })
        ));
        assert!(matches!(
            read_term("(a (b)"),
            Err(SyntaxError::UnmatchedOpenDelimiter { .. })
        ));
    }
}
