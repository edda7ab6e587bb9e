//! Contains the term abstraction consumed by the unification engine.
//!
//! The engine never inspects a host term directly. Instead, every term kind
//! implements [`Term`], which decomposes a term into either a variable or an
//! application ([`Shape`]) and rebuilds an application from its parts. The
//! [`tree`] module provides a ready-made representation for hosts that don't
//! bring their own.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::{self, Debug, Display},
    hash::{BuildHasher, Hash},
};

use derive_new::new;
use enum_as_inner::EnumAsInner;

pub mod fresh;
pub mod tree;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;

pub use fresh::Fresh;

/// A token naming a variable, a functor, or a label.
///
/// Identifiers are compared by value. The [`Display`] implementation is used
/// when terms are rendered for diagnostics.
pub trait Identifier:
    Debug + Display + Clone + PartialEq + Eq + PartialOrd + Ord + Hash + Send + Sync + 'static
{
}

impl<
        T: Debug
            + Display
            + Clone
            + PartialEq
            + Eq
            + PartialOrd
            + Ord
            + Hash
            + Send
            + Sync
            + 'static,
    > Identifier for T
{
}

/// The decomposed form of a non-variable term.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Application<T: Term> {
    /// The functor (or record key) of the application.
    pub functor: T::Identifier,

    /// The ordered positional subterms.
    pub subterms: Vec<T>,

    /// The labelled subterms, keyed by their label.
    pub labelled: BTreeMap<T::Identifier, T>,

    /// The extension tail standing for more fields that are possibly
    /// present but not named yet.
    pub row: Option<T>,
}

impl<T: Term> Application<T> {
    /// Creates an application with only positional subterms.
    #[must_use]
    pub const fn positional(functor: T::Identifier, subterms: Vec<T>) -> Self {
        Self { functor, subterms, labelled: BTreeMap::new(), row: None }
    }

    /// Returns `true` if the application has no positional subterms, no
    /// labelled subterms, and no row.
    #[must_use]
    pub fn is_nullary(&self) -> bool {
        self.subterms.is_empty() && self.labelled.is_empty() && self.row.is_none()
    }
}

/// The result of [`Term::extract`].
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Shape<T: Term> {
    /// The term is a variable with the given identifier.
    Variable(T::Identifier),

    /// The term is an application.
    Application(Application<T>),
}

/// A read-only mapping from variable identifiers to terms.
pub trait Lookup<T: Term> {
    /// Returns the term bound to the given identifier, if any.
    fn lookup(&self, identifier: &T::Identifier) -> Option<&T>;
}

impl<T: Term> Lookup<T> for BTreeMap<T::Identifier, T> {
    fn lookup(&self, identifier: &T::Identifier) -> Option<&T> {
        self.get(identifier)
    }
}

impl<T: Term, S: BuildHasher> Lookup<T> for HashMap<T::Identifier, T, S> {
    fn lookup(&self, identifier: &T::Identifier) -> Option<&T> {
        self.get(identifier)
    }
}

/// A term that can be consumed by the unification engine.
pub trait Term: Debug + Clone + 'static {
    /// The identifier type naming variables, functors, and labels.
    type Identifier: Identifier;

    /// Decomposes the term into a variable or an application.
    fn extract(&self) -> Shape<Self>;

    /// Rebuilds a term from a functor and its (already rebuilt) parts.
    fn construct(application: Application<Self>) -> Self;

    /// Applies the given mapping to the term bottom-up.
    ///
    /// When the rewritten row of an application turns out to be an
    /// application itself, its positional subterms are appended, its labelled
    /// subterms are merged in, and its own row becomes the row of the result.
    /// This keeps records flat: `F(foo: x | r)` under `r => F(bar: y | s)`
    /// becomes `F(bar: y, foo: x | s)`.
    ///
    /// The provided implementation recurses once per level of nesting, so
    /// the depth of terms it accepts is bounded by the stack of the calling
    /// thread.
    fn substitute(&self, substitution: &impl Lookup<Self>) -> Self {
        let mut application = match self.extract() {
            Shape::Variable(identifier) => {
                return substitution
                    .lookup(&identifier)
                    .cloned()
                    .unwrap_or_else(|| self.clone());
            }
            Shape::Application(application) => application,
        };

        for subterm in &mut application.subterms {
            *subterm = subterm.substitute(substitution);
        }

        for value in application.labelled.values_mut() {
            *value = value.substitute(substitution);
        }

        if let Some(row) = application.row.take() {
            let row = row.substitute(substitution);

            match row.extract() {
                Shape::Variable(_) => application.row = Some(row),
                Shape::Application(extension) => {
                    application.subterms.extend(extension.subterms);
                    application.labelled.extend(extension.labelled);
                    application.row = extension.row;
                }
            }
        }

        Self::construct(application)
    }

    /// Returns a [`Display`] adapter rendering the term through
    /// [`Term::extract`].
    fn render(&self) -> Rendered<'_, Self> { Rendered { term: self } }
}

/// A term that can mint variables from the indices of a [`Fresh`] generator.
pub trait FreshVariable: Term {
    /// Creates the variable term for the given fresh index.
    ///
    /// Distinct indices must produce distinct variables, and none of them may
    /// collide with a variable written by the host.
    fn fresh_variable(index: usize) -> Self;
}

/// Renders a term in the `F(a, b, label: c | row)` notation.
///
/// Created by [`Term::render`]. Like [`Term::substitute`], rendering
/// recurses once per level of nesting.
#[derive(Debug, Clone, Copy)]
pub struct Rendered<'a, T: Term> {
    term: &'a T,
}

impl<T: Term> Display for Rendered<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let application = match self.term.extract() {
            Shape::Variable(identifier) => return write!(f, "{identifier}"),
            Shape::Application(application) => application,
        };

        write!(f, "{}", application.functor)?;

        if application.is_nullary() {
            return Ok(());
        }

        f.write_str("(")?;

        let mut separator = "";
        for subterm in &application.subterms {
            write!(f, "{separator}{}", subterm.render())?;
            separator = ", ";
        }

        for (label, value) in &application.labelled {
            write!(f, "{separator}{label}: {}", value.render())?;
            separator = ", ";
        }

        if let Some(row) = &application.row {
            if separator.is_empty() {
                write!(f, "| {}", row.render())?;
            } else {
                write!(f, " | {}", row.render())?;
            }
        }

        f.write_str(")")
    }
}
