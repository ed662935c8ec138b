//! Reduction rules and whole-term evaluation strategies. Detects and
//! contracts beta- and eta-redexes, fully normalizes terms, and performs
//! normal-order (leftmost-outermost) evaluation with host-function
//! injection. Everything here operates purely over the term algebra,
//! independent of how terms were produced.
//!
//! Neither strategy imposes a step limit: a term with no normal form (such
//! as the self-application term) makes `normalize` and
//! `normal_order_evaluate` diverge, exactly as the underlying calculus does.
//! Callers wanting bounded evaluation must impose a limit externally.

use std::collections::HashMap;

use crate::term_representation::{is_free_in, shift, substitute, Term};

/// Represents an evaluation error.
#[derive(Debug, PartialEq, Clone)]
pub enum EvalError {
    UnboundName {
        var_name: String,
    },
    HostApplicationError {
        fn_id: String,
        reason: String,
    },
}

/// Display trait implementation for EvalError.
impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundName { var_name } => {
                return write!(f, "Unbound name in evaluated expression: {}.", var_name);
            }

            Self::HostApplicationError { fn_id, reason } => {
                return write!(f, "Host function {} failed: {}.", fn_id, reason);
            }
        };
    }
}

/// A term is a beta-redex iff it is an application whose function position is
/// an abstraction.
pub fn is_beta_redex(term: &Term) -> bool {
    if let Term::App { fn_body, .. } = term {
        if let Term::Abs { .. } = &**fn_body {
            return true;
        }
    }

    return false;
}

/// A term is an eta-redex iff it is an abstraction whose body applies some
/// function to exactly the bound variable, and the bound variable does not
/// occur free in that function.
pub fn is_eta_redex(term: &Term) -> bool {
    if let Term::Abs { abs_body } = term {
        if let Term::App {
            fn_body,
            actual_arg,
        } = &**abs_body
        {
            if **actual_arg == Term::var(0) && !is_free_in(fn_body, 0) {
                return true;
            }
        }
    }

    return false;
}

/// Contracts the beta-redex at the root of `term`. The caller must have
/// checked `is_beta_redex` first.
pub fn contract_beta_redex(term: &Term) -> Term {
    assert!(
        is_beta_redex(term),
        "Beta contraction attempted on a term that is not a beta-redex."
    );

    if let Term::App {
        fn_body,
        actual_arg,
    } = term
    {
        if let Term::Abs { abs_body } = &**fn_body {
            // The argument crosses the abstraction's binder, so its free
            // variables move up by one.
            let shifted_arg = shift(actual_arg, 1, 0);
            let substituted_body = substitute(abs_body, 0, &shifted_arg);

            // One binder was just eliminated, so free variables move back
            // down by one.
            return shift(&substituted_body, -1, 0);
        }
    }

    unreachable!();
}

/// Contracts the eta-redex at the root of `term`. The caller must have
/// checked `is_eta_redex` first.
pub fn contract_eta_redex(term: &Term) -> Term {
    assert!(
        is_eta_redex(term),
        "Eta contraction attempted on a term that is not an eta-redex."
    );

    if let Term::Abs { abs_body } = term {
        if let Term::App { fn_body, .. } = &**abs_body {
            // Eta-contraction removes one binder.
            return shift(fn_body, -1, 0);
        }
    }

    unreachable!();
}

/// Controls optional behavior of full normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeConfig {
    /// Whether eta-redexes are contracted in addition to beta-redexes.
    pub apply_eta: bool,
}

/// Fully normalizes a term under the given config: both sides of every
/// application and the body of every abstraction are normalized, and any
/// beta-redex (plus any eta-redex, when enabled) formed along the way is
/// contracted and re-normalized. Host leaves are inert; this strategy treats
/// the term purely symbolically.
pub fn normalize_with_config(term: &Term, config: NormalizeConfig) -> Term {
    match term {
        Term::App {
            fn_body,
            actual_arg,
        } => {
            let reduced_term = Term::app(
                normalize_with_config(fn_body, config),
                normalize_with_config(actual_arg, config),
            );

            if is_beta_redex(&reduced_term) {
                return normalize_with_config(&contract_beta_redex(&reduced_term), config);
            }

            return reduced_term;
        }

        Term::Abs { abs_body } => {
            let reduced_term = Term::abs(normalize_with_config(abs_body, config));

            if config.apply_eta && is_eta_redex(&reduced_term) {
                return normalize_with_config(&contract_eta_redex(&reduced_term), config);
            }

            return reduced_term;
        }

        _ => {
            return term.clone();
        }
    };
}

/// Fully normalizes a term, contracting beta-redexes only.
pub fn normalize(term: &Term) -> Term {
    return normalize_with_config(term, NormalizeConfig::default());
}

/// Evaluates a term in normal order (leftmost-outermost). The function
/// position of an application is evaluated first; if it comes out as an
/// applicable host value, the argument is evaluated and handed to the host
/// function, and the host function's result is evaluated in turn. If it
/// comes out as an abstraction, the beta-redex is contracted. Otherwise the
/// partially-reduced application is returned with the argument untouched.
/// Terms that are not applications are returned as-is.
pub fn normal_order_evaluate(term: &Term) -> Result<Term, EvalError> {
    match term {
        Term::App {
            fn_body,
            actual_arg,
        } => {
            let evaluated_fn = normal_order_evaluate(fn_body)?;

            if let Term::Host { host_value } = &evaluated_fn {
                if host_value.is_applicable() {
                    let evaluated_arg = normal_order_evaluate(actual_arg)?;
                    let applied_term = host_value.apply(&evaluated_arg)?;
                    return normal_order_evaluate(&applied_term);
                }
            }

            let reduced_term = Term::app(evaluated_fn, (**actual_arg).clone());

            if is_beta_redex(&reduced_term) {
                return normal_order_evaluate(&contract_beta_redex(&reduced_term));
            }

            return Ok(reduced_term);
        }

        _ => {
            return Ok(term.clone());
        }
    };
}

/// A symbol table supplying bindings for free names left unresolved by
/// elaboration. The environment is owned by the caller and threaded
/// explicitly into evaluation; the engine itself holds no state.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    bindings: HashMap<String, Term>,
}

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Environment {
        return Environment {
            bindings: HashMap::new(),
        };
    }

    /// Binds `var_name` to `bound_term`, replacing any previous binding.
    pub fn define(&mut self, var_name: &str, bound_term: Term) {
        self.bindings.insert(String::from(var_name), bound_term);
    }

    /// Looks up the binding for `var_name`.
    pub fn lookup(&self, var_name: &str) -> Option<&Term> {
        return self.bindings.get(var_name);
    }
}

/// Replaces every free-name leaf in `term` with its binding from the
/// environment, failing on names with no binding.
pub fn resolve_free_names(term: &Term, environment: &Environment) -> Result<Term, EvalError> {
    match term {
        Term::FreeName { var_name } => {
            match environment.lookup(var_name.as_str()) {
                Some(bound_term) => {
                    return Ok(bound_term.clone());
                }

                None => {
                    return Err(EvalError::UnboundName {
                        var_name: var_name.clone(),
                    });
                }
            };
        }

        Term::Abs { abs_body } => {
            return Ok(Term::abs(resolve_free_names(abs_body, environment)?));
        }

        Term::App {
            fn_body,
            actual_arg,
        } => {
            return Ok(Term::app(
                resolve_free_names(fn_body, environment)?,
                resolve_free_names(actual_arg, environment)?,
            ));
        }

        Term::Var { .. } | Term::Host { .. } => {
            return Ok(term.clone());
        }
    };
}

/// Resolves free names against the environment, then evaluates the term in
/// normal order.
pub fn evaluate(term: &Term, environment: &Environment) -> Result<Term, EvalError> {
    let resolved_term = resolve_free_names(term, environment)?;
    return normal_order_evaluate(&resolved_term);
}
