//! Contains the errors that terminate a unification.
//!
//! The [`std::fmt::Display`] implementations of the payload structs live in
//! [`crate::diagnostic`].

use std::collections::BTreeMap;

use derive_new::new;
use enum_as_inner::EnumAsInner;
use unifier_term::Term;

/// The pair of terms given to the [`crate::Unifier::unify`] call that failed.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Top<T> {
    /// The left-hand side of the call.
    pub lhs: T,

    /// The right-hand side of the call.
    pub rhs: T,
}

/// The variable occurs in the term it's being bound to; binding it would
/// create a cyclic substitution.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Occurs<T: Term> {
    /// The variable that was being bound.
    pub identifier: T::Identifier,

    /// The term the variable occurs in.
    pub term: T,

    /// The top-level pair, absent when the binding was requested directly
    /// through [`crate::Unifier::add_mapping`].
    pub top: Option<Top<T>>,
}

impl<T: Term> Occurs<T> {
    /// Attaches the top-level pair of the unification that attempted the
    /// binding.
    #[must_use]
    pub fn within(mut self, top: Top<T>) -> Self {
        self.top = Some(top);
        self
    }
}

/// Two applications have different functors.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct NameClash<T: Term> {
    /// The functor of the left application.
    pub lhs_functor: T::Identifier,

    /// The functor of the right application.
    pub rhs_functor: T::Identifier,

    /// The left application (substituted).
    pub lhs: T,

    /// The right application (substituted).
    pub rhs: T,

    /// The top-level pair.
    pub top: Top<T>,
}

/// Two applications with the same functor have a different number of
/// positional subterms.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Arity<T: Term> {
    /// The number of positional subterms on the left.
    pub lhs_arity: usize,

    /// The number of positional subterms on the right.
    pub rhs_arity: usize,

    /// The left application (substituted).
    pub lhs: T,

    /// The right application (substituted).
    pub rhs: T,

    /// The top-level pair.
    pub top: Top<T>,
}

/// Two records have labels the other side can't absorb.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MissingLabel<T: Term> {
    /// The labelled subterms present only on the left.
    pub lhs_only: BTreeMap<T::Identifier, T>,

    /// The labelled subterms present only on the right.
    pub rhs_only: BTreeMap<T::Identifier, T>,

    /// The top-level pair.
    pub top: Top<T>,
}

/// The reason a unification failed.
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner, thiserror::Error)]
#[allow(missing_docs)]
pub enum Error<T: Term> {
    #[error(transparent)]
    Occurs(#[from] Occurs<T>),

    #[error(transparent)]
    NameClash(#[from] NameClash<T>),

    #[error(transparent)]
    Arity(#[from] Arity<T>),

    #[error(transparent)]
    MissingLabel(#[from] MissingLabel<T>),
}

/// The discriminant of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum Kind {
    Occurs,
    NameClash,
    Arity,
    MissingLabel,
}

impl Kind {
    /// Returns `true` for failures caused by mismatching shapes rather than
    /// by a cyclic binding.
    #[must_use]
    pub const fn is_structural(self) -> bool { !matches!(self, Self::Occurs) }
}

impl<T: Term> Error<T> {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Occurs(_) => Kind::Occurs,
            Self::NameClash(_) => Kind::NameClash,
            Self::Arity(_) => Kind::Arity,
            Self::MissingLabel(_) => Kind::MissingLabel,
        }
    }

    /// Returns the top-level pair of the unification that failed, if known.
    #[must_use]
    pub const fn top(&self) -> Option<&Top<T>> {
        match self {
            Self::Occurs(occurs) => occurs.top.as_ref(),
            Self::NameClash(NameClash { top, .. })
            | Self::Arity(Arity { top, .. })
            | Self::MissingLabel(MissingLabel { top, .. }) => Some(top),
        }
    }
}
