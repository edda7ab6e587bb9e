//! Contains the first-order unification engine.
//!
//! [`Unifier`] consumes pairs of terms and accumulates the most general
//! substitution making every pair equal, or records the first [`Error`] that
//! makes this impossible. Unification is driven by an explicit work stack so
//! that deeply nested terms can't overflow the call stack.
//!
//! Records (applications with labelled subterms) are matched label by label.
//! When the label sets differ, a [`RowExtension`] may synthesize fresh row
//! tails that reconcile both sides; without one, the mismatch is an error.

use derive_new::new;
use getset::{CopyGetters, Getters};
use log::debug;
use unifier_term::{Application, Fresh, Shape, Term};

pub mod diagnostic;
pub mod error;
pub mod occurs;
pub mod row;
pub mod substitution;

pub use error::{Error, Kind};
pub use row::{Closed, FreshTail, RowExtension};
pub use substitution::Substitution;

use crate::error::{Arity, MissingLabel, NameClash, Top};

/// The configuration bundle of a [`Unifier`].
#[derive(Debug, Clone)]
pub struct Config<T: Term, R = Closed> {
    /// The bindings the engine starts from.
    pub initial_substitution: Substitution<T>,

    /// The extension used to reconcile records with different label sets.
    /// Without it, such records fail to unify.
    pub row_extension: Option<R>,

    /// Logs every unification step at `info` level.
    pub trace: bool,
}

impl<T: Term> Default for Config<T> {
    fn default() -> Self {
        Self {
            initial_substitution: Substitution::new(),
            row_extension: None,
            trace: false,
        }
    }
}

impl<T: Term> Config<T> {
    /// Creates a configuration with an empty substitution, no row extension,
    /// and tracing disabled.
    #[must_use]
    pub fn new() -> Self { Self::default() }
}

impl<T: Term, R> Config<T, R> {
    /// Sets the bindings the engine starts from.
    #[must_use]
    pub fn with_initial_substitution(
        mut self,
        initial_substitution: Substitution<T>,
    ) -> Self {
        self.initial_substitution = initial_substitution;
        self
    }

    /// Enables or disables step tracing.
    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Enables row extension with the given strategy.
    #[must_use]
    pub fn with_row_extension<U: RowExtension<T>>(
        self,
        row_extension: U,
    ) -> Config<T, U> {
        Config {
            initial_substitution: self.initial_substitution,
            row_extension: Some(row_extension),
            trace: self.trace,
        }
    }
}

/// A pending pair of terms on the work stack.
#[derive(Debug, new)]
struct Work<T> {
    lhs: T,
    rhs: T,
    depth: usize,
}

/// The outcome of a single unification step.
enum Step<T> {
    /// Nothing changed; the two sides were already equal variables.
    Unchanged,

    /// A variable was bound.
    Bound,

    /// The two applications decomposed into further pairs.
    Decomposed(Vec<(T, T)>),
}

/// The unification engine.
///
/// The engine is either active or failed. Once an [`Error`] is recorded the
/// substitution is frozen and every further call is a no-op; clone the engine
/// before a speculative unification to keep a fallback.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Unifier<T: Term, R = Closed> {
    /// The accumulated substitution.
    #[get = "pub"]
    substitution: Substitution<T>,

    error: Option<Error<T>>,

    row_extension: Option<R>,

    fresh: Fresh,

    /// Whether every step is logged.
    #[get_copy = "pub"]
    trace: bool,
}

impl<T: Term> Default for Unifier<T> {
    fn default() -> Self { Self::new(Config::default()) }
}

impl<T: Term, R: RowExtension<T>> Unifier<T, R> {
    /// Creates an engine from the given configuration.
    #[must_use]
    pub fn new(config: Config<T, R>) -> Self {
        Self {
            substitution: config.initial_substitution,
            error: None,
            row_extension: config.row_extension,
            fresh: Fresh::new(),
            trace: config.trace,
        }
    }

    /// Returns `true` if no error has been recorded.
    #[must_use]
    pub const fn unifies(&self) -> bool { self.error.is_none() }

    /// Returns the error that terminated the engine, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&Error<T>> { self.error.as_ref() }

    /// Returns the bindings in insertion order.
    pub fn entries(
        &self,
    ) -> impl ExactSizeIterator<Item = (&T::Identifier, &T)> + '_ {
        self.substitution.entries()
    }

    /// Applies the accumulated substitution to the given term.
    #[must_use]
    pub fn substitute(&self, term: &T) -> T { self.substitution.apply(term) }

    /// Binds `identifier` to `term` directly, without structural matching.
    ///
    /// The binding is occurs-checked; a failure is recorded like any other
    /// unification error.
    pub fn add_mapping(&mut self, identifier: T::Identifier, term: T) -> &mut Self {
        if self.error.is_some() {
            return self;
        }

        if let Err(occurs) = self.substitution.bind(identifier, term) {
            self.fail(occurs.into());
        }

        self
    }

    /// Unifies every pair in order, stopping at the first failure.
    pub fn solve(&mut self, pairs: impl IntoIterator<Item = (T, T)>) -> &mut Self {
        for (lhs, rhs) in pairs {
            if self.error.is_some() {
                break;
            }

            self.unify(&lhs, &rhs);
        }

        self
    }

    /// Unifies the two terms, extending the substitution or recording an
    /// error.
    pub fn unify(&mut self, lhs: &T, rhs: &T) -> &mut Self {
        let mut stack = vec![Work::new(lhs.clone(), rhs.clone(), 0)];

        while let Some(Work { lhs: left, rhs: right, depth }) = stack.pop() {
            if self.error.is_some() {
                break;
            }

            let left = self.substitution.apply(&left);
            let right = self.substitution.apply(&right);

            let bound = match self.step(&left, &right, lhs, rhs) {
                Ok(Step::Unchanged) => false,
                Ok(Step::Bound) => true,
                Ok(Step::Decomposed(pairs)) => {
                    stack.extend(
                        pairs
                            .into_iter()
                            .rev()
                            .map(|(lhs, rhs)| Work::new(lhs, rhs, depth + 1)),
                    );
                    false
                }
                Err(error) => {
                    self.fail(error);
                    false
                }
            };

            if self.trace {
                self.trace_step(depth, &left, &right, bound);
            }
        }

        self
    }

    fn fail(&mut self, error: Error<T>) {
        debug!("unification failed: {error}");
        self.error = Some(error);
    }

    fn step(
        &mut self,
        left: &T,
        right: &T,
        lhs: &T,
        rhs: &T,
    ) -> Result<Step<T>, Error<T>> {
        let top = || Top::new(lhs.clone(), rhs.clone());

        match (left.extract(), right.extract()) {
            (Shape::Variable(x), Shape::Variable(y)) if x == y => {
                Ok(Step::Unchanged)
            }

            // the greater identifier is bound, whichever side it's on
            (Shape::Variable(x), Shape::Variable(y)) => {
                let (identifier, term) =
                    if x > y { (x, right.clone()) } else { (y, left.clone()) };

                self.substitution
                    .bind(identifier, term)
                    .map(|()| Step::Bound)
                    .map_err(|occurs| occurs.within(top()).into())
            }

            (Shape::Variable(x), _) => self
                .substitution
                .bind(x, right.clone())
                .map(|()| Step::Bound)
                .map_err(|occurs| occurs.within(top()).into()),

            (_, Shape::Variable(y)) => self
                .substitution
                .bind(y, left.clone())
                .map(|()| Step::Bound)
                .map_err(|occurs| occurs.within(top()).into()),

            (Shape::Application(a), Shape::Application(b)) => {
                self.decompose(left, right, &a, &b, top).map(Step::Decomposed)
            }
        }
    }

    fn decompose(
        &mut self,
        left: &T,
        right: &T,
        a: &Application<T>,
        b: &Application<T>,
        top: impl Fn() -> Top<T>,
    ) -> Result<Vec<(T, T)>, Error<T>> {
        if a.functor != b.functor {
            return Err(NameClash::new(
                a.functor.clone(),
                b.functor.clone(),
                left.clone(),
                right.clone(),
                top(),
            )
            .into());
        }

        if a.subterms.len() != b.subterms.len() {
            return Err(Arity::new(
                a.subterms.len(),
                b.subterms.len(),
                left.clone(),
                right.clone(),
                top(),
            )
            .into());
        }

        let mut pairs = a
            .subterms
            .iter()
            .cloned()
            .zip(b.subterms.iter().cloned())
            .collect::<Vec<_>>();

        let labelled =
            row::reconcile(a, b, self.row_extension.as_ref(), &mut self.fresh)
                .map_err(|residual| {
                    MissingLabel::new(residual.lhs_only, residual.rhs_only, top())
                })?;

        pairs.extend(labelled);

        Ok(pairs)
    }
}

#[cfg(test)]
mod test;
