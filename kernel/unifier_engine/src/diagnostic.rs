//! Contains the human-readable renderings of the engine state and its errors.
//!
//! None of the produced text is meant to be parsed back.

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

use itertools::Itertools;
use log::info;
use unifier_term::Term;

use crate::{
    error::{Arity, MissingLabel, NameClash, Occurs, Top},
    Unifier,
};

/// Appends ` (in lhs == rhs)` unless the local mismatch is the top-level pair
/// itself.
fn context<T: Term>(
    f: &mut fmt::Formatter<'_>,
    lhs: &str,
    rhs: &str,
    top: &Top<T>,
) -> fmt::Result {
    let top_lhs = top.lhs.render().to_string();
    let top_rhs = top.rhs.render().to_string();

    if top_lhs != lhs || top_rhs != rhs {
        write!(f, " (in {top_lhs} == {top_rhs})")?;
    }

    Ok(())
}

fn fields<T: Term>(labelled: &BTreeMap<T::Identifier, T>) -> String {
    labelled
        .iter()
        .map(|(label, value)| format!("{label}: {}", value.render()))
        .join(", ")
}

impl<T: Term> Display for Occurs<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identifier = self.identifier.to_string();
        let term = self.term.render().to_string();

        write!(f, "occurs check failed: {identifier} occurs in {term}")?;

        match &self.top {
            Some(top) => context(f, &identifier, &term, top),
            None => Ok(()),
        }
    }
}

impl<T: Term> std::error::Error for Occurs<T> {}

impl<T: Term> Display for NameClash<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lhs = self.lhs.render().to_string();
        let rhs = self.rhs.render().to_string();

        write!(
            f,
            "failed to unify {lhs} and {rhs}: functor {} differs from {}",
            self.lhs_functor, self.rhs_functor
        )?;

        context(f, &lhs, &rhs, &self.top)
    }
}

impl<T: Term> std::error::Error for NameClash<T> {}

impl<T: Term> Display for Arity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lhs = self.lhs.render().to_string();
        let rhs = self.rhs.render().to_string();

        write!(
            f,
            "failed to unify {lhs} and {rhs}: {} subterm(s) against {}",
            self.lhs_arity, self.rhs_arity
        )?;

        context(f, &lhs, &rhs, &self.top)
    }
}

impl<T: Term> std::error::Error for Arity<T> {}

impl<T: Term> Display for MissingLabel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to unify {} and {}: ",
            self.top.lhs.render(),
            self.top.rhs.render()
        )?;

        let mut unmatched = Vec::with_capacity(2);
        if !self.lhs_only.is_empty() {
            unmatched.push(format!("unmatched left labels ({})", fields(&self.lhs_only)));
        }
        if !self.rhs_only.is_empty() {
            unmatched.push(format!("unmatched right labels ({})", fields(&self.rhs_only)));
        }

        write!(f, "{}", unmatched.join("; "))
    }
}

impl<T: Term> std::error::Error for MissingLabel<T> {}

impl<T: Term, R> Unifier<T, R> {
    /// Renders the substitution as `x => term` lines joined by `separator`,
    /// in insertion order.
    #[must_use]
    pub fn substitution_string(&self, separator: &str) -> String {
        self.substitution
            .entries()
            .map(|(identifier, term)| format!("{identifier} => {}", term.render()))
            .join(separator)
    }

    /// Renders the recorded error, or an empty string if the engine hasn't
    /// failed.
    #[must_use]
    pub fn error_string(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Renders a term in the notation used by the diagnostics.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn term_to_string(&self, term: &T) -> String { term.render().to_string() }

    pub(crate) fn trace_step(&self, depth: usize, lhs: &T, rhs: &T, bound: bool) {
        let indent = " ".repeat(depth * 2);

        info!(
            target: "unifier_engine",
            "{indent}unify {} == {}",
            lhs.render(),
            rhs.render()
        );

        if bound {
            let separator = format!("\n{indent}  ");
            info!(
                target: "unifier_engine",
                "{indent}\\\n{indent}  {}",
                self.substitution_string(&separator)
            );
        }
    }
}

/// Renders the substitution listing while the engine unifies, and the error
/// otherwise.
impl<T: Term, R> Display for Unifier<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.error.is_none() {
            f.write_str(&self.substitution_string("\n"))
        } else {
            f.write_str(&self.error_string())
        }
    }
}
