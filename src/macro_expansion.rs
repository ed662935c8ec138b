//! Syntactic macro expansion over surface S-expressions. A macro table maps
//! head symbols to expansion functions; expansion rewrites macro forms
//! recursively until no list head names a macro. Macros may expand into
//! other macro invocations; termination is the macro author's
//! responsibility.

use std::collections::HashMap;

use crate::sexpr_parsing::{SurfaceExpr, SyntaxError};

/// Signature of a macro expansion function: receives the elements after the
/// macro's head symbol and produces the replacement expression.
pub type MacroFn = fn(&[SurfaceExpr]) -> Result<SurfaceExpr, SyntaxError>;

/// A mapping from head symbol to expansion function.
pub struct MacroTable {
    macros: HashMap<String, MacroFn>,
}

impl MacroTable {
    /// Creates an empty macro table.
    pub fn new() -> MacroTable {
        return MacroTable {
            macros: HashMap::new(),
        };
    }

    /// The standard table: the multi-argument `lambda` sugar and the `let`
    /// binding sugar.
    pub fn standard() -> MacroTable {
        let mut macro_table = MacroTable::new();
        macro_table.add_macro("lambda", expand_lambda_macro);
        macro_table.add_macro("let", expand_let_macro);
        return macro_table;
    }

    /// Registers a macro under `macro_name`, replacing any previous entry.
    pub fn add_macro(&mut self, macro_name: &str, expansion_fn: MacroFn) {
        self.macros.insert(String::from(macro_name), expansion_fn);
    }

    /// Looks up the expansion function registered under `macro_name`.
    pub fn lookup(&self, macro_name: &str) -> Option<MacroFn> {
        return self.macros.get(macro_name).copied();
    }
}

impl Default for MacroTable {
    fn default() -> MacroTable {
        return MacroTable::standard();
    }
}

// Desugars `(lambda (x y z) body)` into nested single-binder abstractions
// `(λ x (λ y (λ z body)))`. Zero parameters bind the placeholder name `_`.
fn expand_lambda_macro(macro_args: &[SurfaceExpr]) -> Result<SurfaceExpr, SyntaxError> {
    if macro_args.len() != 2 {
        return Err(SyntaxError::MalformedForm {
            form_name: String::from("lambda"),
            reason: format!(
                "expected a parameter list and a body, found {} forms",
                macro_args.len()
            ),
        });
    }

    let formal_params = &macro_args[0];
    let lambda_body = macro_args[1].clone();

    match formal_params {
        SurfaceExpr::Empty => {
            return Ok(SurfaceExpr::list(vec![
                SurfaceExpr::symbol("λ"),
                SurfaceExpr::symbol("_"),
                lambda_body,
            ]));
        }

        SurfaceExpr::List { list_items } => {
            let first_param = list_items[0].clone();

            // One parameter binds directly; more peel off one binder and
            // recurse through the macro itself.
            let inner_body = match list_items.len() {
                1 => lambda_body,
                _ => SurfaceExpr::list(vec![
                    SurfaceExpr::symbol("lambda"),
                    SurfaceExpr::list(list_items[1..].to_vec()),
                    lambda_body,
                ]),
            };

            return Ok(SurfaceExpr::list(vec![
                SurfaceExpr::symbol("λ"),
                first_param,
                inner_body,
            ]));
        }

        _ => {
            return Err(SyntaxError::MalformedForm {
                form_name: String::from("lambda"),
                reason: String::from("parameter list must be a list of names"),
            });
        }
    };
}

// Desugars `(let ((x v) (y w)) body)` into nested immediately-applied
// abstractions `((λ x (let ((y w)) body)) v)`, bottoming out at plain `body`
// when no bindings remain.
fn expand_let_macro(macro_args: &[SurfaceExpr]) -> Result<SurfaceExpr, SyntaxError> {
    if macro_args.len() != 2 {
        return Err(SyntaxError::MalformedForm {
            form_name: String::from("let"),
            reason: format!(
                "expected a binding list and a body, found {} forms",
                macro_args.len()
            ),
        });
    }

    let let_bindings = &macro_args[0];
    let let_body = macro_args[1].clone();

    match let_bindings {
        SurfaceExpr::Empty => {
            return Ok(let_body);
        }

        SurfaceExpr::List { list_items } => {
            let (bound_name, bound_value) = match &list_items[0] {
                SurfaceExpr::List {
                    list_items: binding_pair,
                } if binding_pair.len() == 2 => (binding_pair[0].clone(), binding_pair[1].clone()),

                _ => {
                    return Err(SyntaxError::MalformedForm {
                        form_name: String::from("let"),
                        reason: String::from("each binding must be a (name value) pair"),
                    });
                }
            };

            let inner_body = match list_items.len() {
                1 => let_body,
                _ => SurfaceExpr::list(vec![
                    SurfaceExpr::symbol("let"),
                    SurfaceExpr::list(list_items[1..].to_vec()),
                    let_body,
                ]),
            };

            return Ok(SurfaceExpr::list(vec![
                SurfaceExpr::list(vec![
                    SurfaceExpr::symbol("λ"),
                    bound_name,
                    inner_body,
                ]),
                bound_value,
            ]));
        }

        _ => {
            return Err(SyntaxError::MalformedForm {
                form_name: String::from("let"),
                reason: String::from("bindings must be a list of (name value) pairs"),
            });
        }
    };
}

/// Recursively rewrites every list whose head symbol names a macro,
/// re-expanding each macro's output until no macro forms remain.
pub fn expand(expr: &SurfaceExpr, macros: &MacroTable) -> Result<SurfaceExpr, SyntaxError> {
    match expr {
        SurfaceExpr::List { list_items } => {
            if let Some(SurfaceExpr::Symbol { symbol_name }) = list_items.first() {
                if let Some(expansion_fn) = macros.lookup(symbol_name.as_str()) {
                    let expanded_expr = expansion_fn(&list_items[1..])?;
                    return expand(&expanded_expr, macros);
                }
            }

            let mut expanded_items = Vec::new();

            for list_item in list_items {
                expanded_items.push(expand(list_item, macros)?);
            }

            return Ok(SurfaceExpr::List {
                list_items: expanded_items,
            });
        }

        _ => {
            return Ok(expr.clone());
        }
    };
}
