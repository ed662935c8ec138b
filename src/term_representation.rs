//! Data structures to represent lambda-calculus terms in de Bruijn index
//! form, and the index-shifting and capture-avoiding substitution operations
//! that the reduction engine is built on.

use std::rc::Rc;

use crate::term_reduction::EvalError;

/// Signature of a host function embedded into a term. The function receives
/// the already-evaluated argument term and produces a replacement term.
pub type HostFn = Rc<dyn Fn(&Term) -> Result<Term, EvalError>>;

/// An opaque host-level value embedded into a term as a leaf. These values
/// bridge the term algebra with host computation: the distinguished empty
/// value that `()` reads as, host integers, and host functions.
///
/// Host functions compare equal by identifier, never by code pointer.
#[derive(Clone)]
pub enum HostValue {
    Empty,
    Integer {
        int_value: i64,
    },
    Function {
        fn_id: String,
        fn_impl: HostFn,
    },
}

impl HostValue {
    /// Reports whether this host value may be applied to an argument.
    pub fn is_applicable(&self) -> bool {
        match self {
            HostValue::Function { .. } => {
                return true;
            }
            _ => {
                return false;
            }
        };
    }

    /// Invokes this host value on the given argument term. Callers must check
    /// `is_applicable` first; applying a non-function host value is an
    /// evaluation error.
    pub fn apply(&self, actual_arg: &Term) -> Result<Term, EvalError> {
        match self {
            HostValue::Function { fn_impl, .. } => {
                return fn_impl(actual_arg);
            }

            _ => {
                return Err(EvalError::HostApplicationError {
                    fn_id: self.to_string(),
                    reason: String::from("this host value is not applicable"),
                });
            }
        };
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Empty, HostValue::Empty) => {
                return true;
            }

            (
                HostValue::Integer { int_value },
                HostValue::Integer {
                    int_value: other_int_value,
                },
            ) => {
                return int_value == other_int_value;
            }

            (
                HostValue::Function { fn_id, .. },
                HostValue::Function {
                    fn_id: other_fn_id, ..
                },
            ) => {
                return fn_id == other_fn_id;
            }

            _ => {
                return false;
            }
        };
    }
}

impl std::fmt::Debug for HostValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostValue::Empty => {
                return write!(f, "Empty");
            }
            HostValue::Integer { int_value } => {
                return write!(f, "Integer({})", int_value);
            }
            HostValue::Function { fn_id, .. } => {
                return write!(f, "Function({})", fn_id);
            }
        };
    }
}

impl std::fmt::Display for HostValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostValue::Empty => {
                return write!(f, "()");
            }
            HostValue::Integer { int_value } => {
                return write!(f, "{}", int_value);
            }
            HostValue::Function { fn_id, .. } => {
                return write!(f, "<{}>", fn_id);
            }
        };
    }
}

/// Represents a lambda-calculus term. A `Var` holds a de Bruijn index
/// counting binders from the nearest enclosing `Abs` outward; an index larger
/// than the number of enclosing binders is free. `FreeName` holds a symbolic
/// name that elaboration could not resolve to a binder; it is resolved
/// against a caller-supplied environment at evaluation time. `Host` holds an
/// opaque host value.
///
/// Terms are immutable once constructed: every transformation in this module
/// and in `term_reduction` produces a new term.
#[derive(Debug, PartialEq, Clone)]
pub enum Term {
    Var {
        var_index: usize,
    },
    Abs {
        abs_body: Box<Term>,
    },
    App {
        fn_body: Box<Term>,
        actual_arg: Box<Term>,
    },
    FreeName {
        var_name: String,
    },
    Host {
        host_value: HostValue,
    },
}

impl Term {
    /// Convenience constructor for a variable term.
    pub fn var(var_index: usize) -> Term {
        return Term::Var { var_index };
    }

    /// Convenience constructor for an abstraction term.
    pub fn abs(abs_body: Term) -> Term {
        return Term::Abs {
            abs_body: Box::new(abs_body),
        };
    }

    /// Convenience constructor for an application term.
    pub fn app(fn_body: Term, actual_arg: Term) -> Term {
        return Term::App {
            fn_body: Box::new(fn_body),
            actual_arg: Box::new(actual_arg),
        };
    }

    /// Convenience constructor for a free-name leaf.
    pub fn free_name(var_name: &str) -> Term {
        return Term::FreeName {
            var_name: String::from(var_name),
        };
    }

    /// Convenience constructor for a host-value leaf.
    pub fn host(host_value: HostValue) -> Term {
        return Term::Host { host_value };
    }

    /// Convenience constructor for a host integer leaf.
    pub fn host_integer(int_value: i64) -> Term {
        return Term::Host {
            host_value: HostValue::Integer { int_value },
        };
    }

    /// Convenience constructor for a host function leaf.
    pub fn host_function<F>(fn_id: &str, fn_impl: F) -> Term
    where
        F: Fn(&Term) -> Result<Term, EvalError> + 'static,
    {
        return Term::Host {
            host_value: HostValue::Function {
                fn_id: String::from(fn_id),
                fn_impl: Rc::new(fn_impl),
            },
        };
    }
}

// Helper function to produce a string representation of a term.
fn term_to_string_helper(term: &Term, string_so_far: &mut String) {
    match term {
        Term::Var { var_index } => {
            string_so_far.push_str(var_index.to_string().as_str());
        }

        Term::Abs { abs_body } => {
            string_so_far.push_str("λ ");
            term_to_string_helper(abs_body, string_so_far);
        }

        Term::App {
            fn_body,
            actual_arg,
        } => {
            string_so_far.push('(');
            term_to_string_helper(fn_body, string_so_far);
            string_so_far.push(' ');
            term_to_string_helper(actual_arg, string_so_far);
            string_so_far.push(')');
        }

        Term::FreeName { var_name } => {
            string_so_far.push_str(var_name.as_str());
        }

        Term::Host { host_value } => {
            string_so_far.push_str(host_value.to_string().as_str());
        }
    };
}

/// Converts a term to a string.
pub fn term_to_string(term: &Term) -> String {
    let mut out_string = String::new();
    term_to_string_helper(term, &mut out_string);
    return out_string;
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", term_to_string(self).as_str());
    }
}

/// Adds `shift_amount` to every variable index in `term` that is at or above
/// `cutoff_depth`. Crossing a binder raises the threshold by one, so bound
/// variables are never touched. This re-indexes the free variables of a term
/// being moved into a context with more or fewer enclosing binders.
pub fn shift(term: &Term, shift_amount: isize, cutoff_depth: usize) -> Term {
    match term {
        Term::Var { var_index } => {
            if *var_index >= cutoff_depth {
                return Term::var((*var_index as isize + shift_amount) as usize);
            }

            return term.clone();
        }

        Term::Abs { abs_body } => {
            return Term::abs(shift(abs_body, shift_amount, cutoff_depth + 1));
        }

        Term::App {
            fn_body,
            actual_arg,
        } => {
            return Term::app(
                shift(fn_body, shift_amount, cutoff_depth),
                shift(actual_arg, shift_amount, cutoff_depth),
            );
        }

        Term::FreeName { .. } | Term::Host { .. } => {
            return term.clone();
        }
    };
}

/// Reports whether the variable index `var_index` occurs free in `term`.
pub fn is_free_in(term: &Term, var_index: usize) -> bool {
    match term {
        Term::Var {
            var_index: curr_var_index,
        } => {
            return *curr_var_index == var_index;
        }

        Term::Abs { abs_body } => {
            return is_free_in(abs_body, var_index + 1);
        }

        Term::App {
            fn_body,
            actual_arg,
        } => {
            return is_free_in(fn_body, var_index) || is_free_in(actual_arg, var_index);
        }

        Term::FreeName { .. } | Term::Host { .. } => {
            return false;
        }
    };
}

/// Replaces every free occurrence of the variable index `var_index` in `term`
/// with `replacement`. On entering an abstraction both the target index and
/// the free variables of `replacement` move up by one, so a free variable in
/// the replacement can never be captured by a binder in the target.
pub fn substitute(term: &Term, var_index: usize, replacement: &Term) -> Term {
    match term {
        Term::Var {
            var_index: curr_var_index,
        } => {
            if *curr_var_index == var_index {
                return replacement.clone();
            }

            return term.clone();
        }

        Term::Abs { abs_body } => {
            let shifted_replacement = shift(replacement, 1, 0);
            return Term::abs(substitute(abs_body, var_index + 1, &shifted_replacement));
        }

        Term::App {
            fn_body,
            actual_arg,
        } => {
            return Term::app(
                substitute(fn_body, var_index, replacement),
                substitute(actual_arg, var_index, replacement),
            );
        }

        Term::FreeName { .. } | Term::Host { .. } => {
            return term.clone();
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test if shifting respects the cutoff and leaves bound variables alone.
    #[test]
    fn test_shift_respects_cutoff() {
        // λ (0 1): index 0 is bound, index 1 is free.
        let test_term = Term::abs(Term::app(Term::var(0), Term::var(1)));

        let shifted_term = shift(&test_term, 5, 0);

        let expected_term = Term::abs(Term::app(Term::var(0), Term::var(6)));
        assert_eq!(shifted_term, expected_term);
    }

    // Test if two shifts at the same cutoff compose into one combined shift.
    #[test]
    fn test_shift_composition() {
        let test_term = Term::abs(Term::app(Term::var(1), Term::var(0)));

        let shifted_twice = shift(&shift(&test_term, 1, 0), 2, 0);
        let shifted_once = shift(&test_term, 3, 0);

        assert_eq!(shifted_twice, shifted_once);
    }

    // Test if negative shift amounts decrement free variables.
    #[test]
    fn test_shift_negative_amount() {
        let test_term = Term::app(Term::var(2), Term::abs(Term::var(3)));

        let shifted_term = shift(&test_term, -1, 0);

        let expected_term = Term::app(Term::var(1), Term::abs(Term::var(2)));
        assert_eq!(shifted_term, expected_term);
    }

    // Test if is_free_in counts binders crossed on the way down.
    #[test]
    fn test_is_free_in() {
        // λ (1 0): inside the binder, index 1 refers to outer index 0.
        let test_term = Term::abs(Term::app(Term::var(1), Term::var(0)));

        assert!(is_free_in(&test_term, 0));
        assert!(!is_free_in(&test_term, 1));

        // λ 0 has no free variables at all.
        let identity_term = Term::abs(Term::var(0));
        assert!(!is_free_in(&identity_term, 0));
    }

    // Test if substitution replaces exactly the requested free index.
    #[test]
    fn test_substitute_simple() {
        let test_term = Term::app(Term::var(0), Term::var(1));

        let substituted_term = substitute(&test_term, 0, &Term::free_name("y"));

        let expected_term = Term::app(Term::free_name("y"), Term::var(1));
        assert_eq!(substituted_term, expected_term);
    }

    // Test if a free variable in the replacement stays free when it crosses a
    // binder in the target term.
    #[test]
    fn test_substitute_avoids_capture() {
        // λ 1: the body refers to outer index 0.
        let test_term = Term::abs(Term::var(1));

        // Substituting the variable 0 itself must re-index it to 1 under the
        // binder rather than letting the binder capture it.
        let substituted_term = substitute(&test_term, 0, &Term::var(0));

        let expected_term = Term::abs(Term::var(1));
        assert_eq!(substituted_term, expected_term);
    }

    // Test if substituting a closed replacement leaves no residual free
    // occurrence of the substituted index.
    #[test]
    fn test_substitute_no_residual_occurrence() {
        let test_term = Term::app(Term::var(0), Term::abs(Term::var(1)));
        let replacement = Term::free_name("n");

        let substituted_term = substitute(&test_term, 0, &replacement);

        assert!(!is_free_in(&substituted_term, 0));
    }

    // Test if terms render in surface form.
    #[test]
    fn test_term_to_string() {
        // λ λ λ (1 ((2 1) 0)), the successor of a Church numeral.
        let successor_term = Term::abs(Term::abs(Term::abs(Term::app(
            Term::var(1),
            Term::app(Term::app(Term::var(2), Term::var(1)), Term::var(0)),
        ))));

        assert_eq!(
            term_to_string(&successor_term),
            "λ λ λ (1 ((2 1) 0))"
        );
    }

    // Test if host values compare by identifier rather than code pointer.
    #[test]
    fn test_host_function_equality_by_id() {
        let first_fn = Term::host_function("increment", |actual_arg: &Term| Ok(actual_arg.clone()));
        let second_fn = Term::host_function("increment", |_: &Term| Ok(Term::host_integer(0)));
        let other_fn = Term::host_function("decrement", |actual_arg: &Term| Ok(actual_arg.clone()));

        assert_eq!(first_fn, second_fn);
        assert_ne!(first_fn, other_fn);
    }
}
