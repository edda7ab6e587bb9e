//! Contains the definition of [`Substitution`].

use std::collections::HashMap;

use unifier_term::{Lookup, Term};

use crate::{error::Occurs, occurs::occurs};

/// A mapping from variable identifiers to terms, kept in fully composed form.
///
/// No variable appearing in a bound term is itself bound, so a single lookup
/// resolves any variable. Every [`Substitution::bind`] rewrites the existing
/// bindings through the new one to maintain this; insertion is linear in the
/// size of the store while application stays a single pass over the term.
///
/// Bindings are listed in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution<T: Term> {
    bindings: Vec<(T::Identifier, T)>,
    indices: HashMap<T::Identifier, usize>,
}

impl<T: Term> Default for Substitution<T> {
    fn default() -> Self { Self { bindings: Vec::new(), indices: HashMap::new() } }
}

/// A single binding viewed as a [`Lookup`].
struct Binding<'a, T: Term> {
    identifier: &'a T::Identifier,
    term: &'a T,
}

impl<T: Term> Lookup<T> for Binding<'_, T> {
    fn lookup(&self, identifier: &T::Identifier) -> Option<&T> {
        (identifier == self.identifier).then_some(self.term)
    }
}

impl<T: Term> Lookup<T> for Substitution<T> {
    fn lookup(&self, identifier: &T::Identifier) -> Option<&T> {
        Self::lookup(self, identifier)
    }
}

impl<T: Term> Substitution<T> {
    /// Creates an empty substitution.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Creates a substitution by binding each entry in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`Occurs`] error raised by [`Substitution::bind`].
    pub fn try_from_entries(
        entries: impl IntoIterator<Item = (T::Identifier, T)>,
    ) -> Result<Self, Occurs<T>> {
        let mut substitution = Self::new();

        for (identifier, term) in entries {
            substitution.bind(identifier, term)?;
        }

        Ok(substitution)
    }

    /// Returns the number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize { self.bindings.len() }

    /// Returns `true` if no variable is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.bindings.is_empty() }

    /// Returns the term bound to the given variable.
    #[must_use]
    pub fn lookup(&self, identifier: &T::Identifier) -> Option<&T> {
        self.indices.get(identifier).map(|index| &self.bindings[*index].1)
    }

    /// Returns `true` if the given variable is bound.
    #[must_use]
    pub fn contains(&self, identifier: &T::Identifier) -> bool {
        self.indices.contains_key(identifier)
    }

    /// Returns the bindings in insertion order.
    pub fn entries(
        &self,
    ) -> impl ExactSizeIterator<Item = (&T::Identifier, &T)> + '_ {
        self.bindings.iter().map(|(identifier, term)| (identifier, term))
    }

    /// Applies the substitution to the given term.
    #[must_use]
    pub fn apply(&self, term: &T) -> T { term.substitute(self) }

    /// Binds `identifier` to `term`.
    ///
    /// The term is first resolved through the current bindings. Every
    /// existing binding is then rewritten through the new one before it is
    /// appended. Binding an identifier that is already bound replaces its
    /// term and keeps its position.
    ///
    /// # Errors
    ///
    /// Returns [`Occurs`] without modifying the substitution if `identifier`
    /// appears in `term`, either as given or once resolved.
    pub fn bind(
        &mut self,
        identifier: T::Identifier,
        term: T,
    ) -> Result<(), Occurs<T>> {
        if occurs(&identifier, &term) {
            return Err(Occurs::new(identifier, term, None));
        }

        let term = self.apply(&term);

        if occurs(&identifier, &term) {
            return Err(Occurs::new(identifier, term, None));
        }

        let binding = Binding { identifier: &identifier, term: &term };
        for (_, bound) in &mut self.bindings {
            *bound = bound.substitute(&binding);
        }

        if let Some(&index) = self.indices.get(&identifier) {
            self.bindings[index].1 = term;
        } else {
            self.indices.insert(identifier.clone(), self.bindings.len());
            self.bindings.push((identifier, term));
        }

        Ok(())
    }
}
