//! Recursive-descent reader that turns a token stream into surface
//! S-expression values, using the readtable's reader actions to recognize
//! list structure, literals, and delimiters.

use crate::lexical_analysis::{ReaderAction, Readtable, Token, TokenStream};

/// A surface S-expression as produced by the reader. Surface values are
/// transient: they exist only between parsing and elaboration.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SurfaceExpr {
    /// A bare symbol.
    Symbol { symbol_name: String },
    /// A host integer literal, produced by a reader callback.
    Integer { int_value: i64 },
    /// The distinguished value that `()` reads as. This is an atom, not an
    /// empty sequence, so it cannot be confused with exhausted input.
    Empty,
    /// A delimited sequence of sub-expressions.
    List { list_items: Vec<SurfaceExpr> },
}

impl SurfaceExpr {
    /// Convenience constructor for a symbol.
    pub fn symbol(symbol_name: &str) -> SurfaceExpr {
        return SurfaceExpr::Symbol {
            symbol_name: String::from(symbol_name),
        };
    }

    /// Convenience constructor for an integer literal.
    pub fn integer(int_value: i64) -> SurfaceExpr {
        return SurfaceExpr::Integer { int_value };
    }

    /// Convenience constructor for a list.
    pub fn list(list_items: Vec<SurfaceExpr>) -> SurfaceExpr {
        return SurfaceExpr::List { list_items };
    }
}

// Helper function to produce the surface-syntax rendering of an expression.
fn surface_expr_to_string_helper(expr: &SurfaceExpr, string_so_far: &mut String) {
    match expr {
        SurfaceExpr::Symbol { symbol_name } => {
            string_so_far.push_str(symbol_name.as_str());
        }

        SurfaceExpr::Integer { int_value } => {
            string_so_far.push_str(int_value.to_string().as_str());
        }

        SurfaceExpr::Empty => {
            string_so_far.push_str("()");
        }

        SurfaceExpr::List { list_items } => {
            string_so_far.push('(');

            for (item_idx, list_item) in list_items.iter().enumerate() {
                if item_idx > 0 {
                    string_so_far.push(' ');
                }

                surface_expr_to_string_helper(list_item, string_so_far);
            }

            string_so_far.push(')');
        }
    };
}

/// Display trait implementation rendering the expression back into surface
/// syntax with normalized whitespace and parenthesis delimiters.
impl std::fmt::Display for SurfaceExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out_string = String::new();
        surface_expr_to_string_helper(self, &mut out_string);
        return write!(f, "{}", out_string.as_str());
    }
}

/// Represents a structural error found while reading or elaborating surface
/// syntax. All structural errors are detected eagerly and propagated
/// immediately; the reader performs no partial-result recovery.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SyntaxError {
    /// The input ended while at least one list was still open.
    UnmatchedOpenDelimiter { open_text: String },
    /// A closing delimiter appeared with no list open.
    UnmatchedCloseDelimiter { close_text: String },
    /// A closing delimiter did not pair with the most recent opener.
    MismatchedDelimiters {
        open_text: String,
        close_text: String,
    },
    /// An abstraction form had the wrong shape.
    MalformedAbstraction { reason: String },
    /// A macro invocation or reader-level form had the wrong shape.
    MalformedForm { form_name: String, reason: String },
    /// A literal token could not be converted by its reader callback.
    MalformedLiteral { token_text: String },
}

/// Display trait implementation for SyntaxError.
impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmatchedOpenDelimiter { open_text } => {
                return write!(f, "Unmatched {:?} at end of input.", open_text);
            }

            Self::UnmatchedCloseDelimiter { close_text } => {
                return write!(f, "Unmatched {:?} with no open list.", close_text);
            }

            Self::MismatchedDelimiters {
                open_text,
                close_text,
            } => {
                return write!(
                    f,
                    "Mismatched delimiters: {:?} closed by {:?}.",
                    open_text, close_text
                );
            }

            Self::MalformedAbstraction { reason } => {
                return write!(f, "Malformed abstraction: {}.", reason);
            }

            Self::MalformedForm { form_name, reason } => {
                return write!(f, "Malformed {} form: {}.", form_name, reason);
            }

            Self::MalformedLiteral { token_text } => {
                return write!(f, "Malformed literal token {:?}.", token_text);
            }
        };
    }
}

/// Reads one surface expression from the token stream. Returns `Ok(None)`
/// when the stream is exhausted.
pub fn parse_expression(
    tokens: &mut TokenStream,
    readtable: &Readtable,
) -> Result<Option<SurfaceExpr>, SyntaxError> {
    let head_token = match tokens.next() {
        Some(head_token) => head_token,
        None => {
            return Ok(None);
        }
    };

    let mut open_stack: Vec<(usize, String)> = Vec::new();

    return parse_tail(&head_token, tokens, readtable, &mut open_stack).map(Some);
}

/// Parses the first expression in `source_text`. Convenience wrapper over
/// `parse_expression` for callers holding raw text.
pub fn parse_source_text(
    source_text: &str,
    readtable: &Readtable,
) -> Result<Option<SurfaceExpr>, SyntaxError> {
    let mut tokens = TokenStream::new(source_text, readtable);
    return parse_expression(&mut tokens, readtable);
}

// Parses the expression beginning at `head_token`, consuming further tokens
// as needed. `open_stack` tracks delimiters opened but not yet closed, so a
// closer can be checked against the opener it pairs with.
fn parse_tail(
    head_token: &Token,
    tokens: &mut TokenStream,
    readtable: &Readtable,
    open_stack: &mut Vec<(usize, String)>,
) -> Result<SurfaceExpr, SyntaxError> {
    let head_rule_idx = match head_token.rule_idx {
        Some(head_rule_idx) => head_rule_idx,
        None => {
            return Ok(SurfaceExpr::symbol(head_token.token_text.as_str()));
        }
    };

    match readtable.action_at(head_rule_idx) {
        None => {
            return Ok(SurfaceExpr::symbol(head_token.token_text.as_str()));
        }

        Some(ReaderAction::Callback(reader_callback)) => {
            return reader_callback(head_token, tokens, readtable);
        }

        Some(ReaderAction::Close) => {
            return Err(SyntaxError::UnmatchedCloseDelimiter {
                close_text: head_token.token_text.clone(),
            });
        }

        Some(ReaderAction::Open) => {
            open_stack.push((head_rule_idx, head_token.token_text.clone()));

            let mut list_items: Vec<SurfaceExpr> = Vec::new();

            loop {
                let next_token = match tokens.next() {
                    Some(next_token) => next_token,
                    None => {
                        let (_, open_text) = open_stack
                            .pop()
                            .expect("Open stack cannot be empty inside a list.");

                        return Err(SyntaxError::UnmatchedOpenDelimiter { open_text });
                    }
                };

                // A close token ends this list, provided it pairs with the
                // opener on top of the stack.
                let close_action = next_token
                    .rule_idx
                    .and_then(|close_rule_idx| readtable.action_at(close_rule_idx));

                if let Some(ReaderAction::Close) = close_action {
                    let close_rule_idx = next_token
                        .rule_idx
                        .expect("Close token cannot be untagged.");
                    let (open_rule_idx, open_text) = open_stack
                        .pop()
                        .expect("Open stack cannot be empty inside a list.");

                    if close_rule_idx != open_rule_idx + 1 {
                        return Err(SyntaxError::MismatchedDelimiters {
                            open_text,
                            close_text: next_token.token_text.clone(),
                        });
                    }

                    if list_items.is_empty() {
                        return Ok(SurfaceExpr::Empty);
                    }

                    return Ok(SurfaceExpr::List { list_items });
                }

                list_items.push(parse_tail(&next_token, tokens, readtable, open_stack)?);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    // Parses source text with the standard readtable, unwrapping the result.
    fn parse_standard(source_text: &str) -> SurfaceExpr {
        return parse_source_text(source_text, &Readtable::standard())
            .expect("parse_source_text returned unexpected syntax error")
            .expect("parse_source_text returned no expression");
    }

    // Test if a flat list parses into its elements in order.
    #[test]
    fn test_parse_flat_list() {
        let parsed_expr = parse_standard("(f x y)");

        let expected_expr = SurfaceExpr::list(vec![
            SurfaceExpr::symbol("f"),
            SurfaceExpr::symbol("x"),
            SurfaceExpr::symbol("y"),
        ]);

        assert_eq!(parsed_expr, expected_expr);
    }

    // Test if nested lists parse recursively.
    #[test]
    fn test_parse_nested_list() {
        let parsed_expr = parse_standard("(f (g x) y)");

        let expected_expr = SurfaceExpr::list(vec![
            SurfaceExpr::symbol("f"),
            SurfaceExpr::list(vec![SurfaceExpr::symbol("g"), SurfaceExpr::symbol("x")]),
            SurfaceExpr::symbol("y"),
        ]);

        assert_eq!(parsed_expr, expected_expr);
    }

    // Test if brackets and parentheses are interchangeable list delimiters.
    #[test]
    fn test_parse_bracket_delimiters() {
        let parsed_expr = parse_standard("[f (g x) [h y]]");

        let expected_expr = SurfaceExpr::list(vec![
            SurfaceExpr::symbol("f"),
            SurfaceExpr::list(vec![SurfaceExpr::symbol("g"), SurfaceExpr::symbol("x")]),
            SurfaceExpr::list(vec![SurfaceExpr::symbol("h"), SurfaceExpr::symbol("y")]),
        ]);

        assert_eq!(parsed_expr, expected_expr);
    }

    // Test if the empty list parses to the distinguished empty value.
    #[test]
    fn test_parse_empty_list() {
        assert_eq!(parse_standard("()"), SurfaceExpr::Empty);
        assert_eq!(parse_standard("[]"), SurfaceExpr::Empty);
    }

    // Test if exhausted input parses to no expression at all.
    #[test]
    fn test_parse_exhausted_input() {
        let parse_result = parse_source_text("   ", &Readtable::standard())
            .expect("parse_source_text returned unexpected syntax error");

        assert_eq!(parse_result, None);
    }

    // Test if a bracket closing a parenthesis is rejected.
    #[test]
    fn test_parse_mismatched_delimiters() {
        let parse_result = parse_source_text("(a b]", &Readtable::standard());

        assert_eq!(
            parse_result,
            Err(SyntaxError::MismatchedDelimiters {
                open_text: String::from("("),
                close_text: String::from("]"),
            })
        );
    }

    // Test if an unterminated list is rejected at end of input.
    #[test]
    fn test_parse_unterminated_list() {
        let parse_result = parse_source_text("(a (b)", &Readtable::standard());

        assert_eq!(
            parse_result,
            Err(SyntaxError::UnmatchedOpenDelimiter {
                open_text: String::from("("),
            })
        );
    }

    // Test if a stray closing delimiter is rejected.
    #[test]
    fn test_parse_stray_close() {
        let parse_result = parse_source_text(") x", &Readtable::standard());

        assert_eq!(
            parse_result,
            Err(SyntaxError::UnmatchedCloseDelimiter {
                close_text: String::from(")"),
            })
        );
    }

    // Test if a callback rule builds its value directly from the token.
    #[test]
    fn test_parse_callback_rule() {
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

        let mut readtable = Readtable::standard();
        readtable
            .add_rule(r"-?[0-9]+", ReaderAction::Callback(reader_integer))
            .expect("Unable to compile integer rule regex.");

        let parsed_expr = parse_source_text("(f 42 -7)", &readtable)
            .expect("parse_source_text returned unexpected syntax error")
            .expect("parse_source_text returned no expression");

        let expected_expr = SurfaceExpr::list(vec![
            SurfaceExpr::symbol("f"),
            SurfaceExpr::integer(42),
            SurfaceExpr::integer(-7),
        ]);

        assert_eq!(parsed_expr, expected_expr);
    }

    // Test if serialization round-trips: parsing rendered output and
    // rendering again is idempotent.
    #[test]
    fn test_parse_serialize_round_trip() {
        let source_texts = vec![
            "( f   (g x)\n [h y] )",
            "(λ x (x x))",
            "()",
            "((a) ((b c)) d)",
        ];

        for source_text in source_texts {
            let first_rendering = parse_standard(source_text).to_string();
            let second_rendering = parse_standard(first_rendering.as_str()).to_string();

            assert_eq!(first_rendering, second_rendering);
        }
    }
}
