//! Contains the row extension logic reconciling the labelled subterms of two
//! applications.

use std::collections::{BTreeMap, BTreeSet};

use unifier_term::{Application, Fresh, FreshVariable, Shape, Term};

/// Synthesizes the extension terms used to close a label-set mismatch
/// between two records.
pub trait RowExtension<T: Term> {
    /// Creates an application with the functor of `record`, retaining only
    /// the labelled subterms whose labels are in `labels`, and ending in a
    /// fresh row tail drawn from `fresh`.
    fn create_row_type(
        &self,
        record: &Application<T>,
        labels: &BTreeSet<T::Identifier>,
        fresh: &mut Fresh,
    ) -> T;
}

/// A row extension that can't be constructed.
///
/// An engine parameterized with [`Closed`] (the default) treats every record
/// as closed: labels present on only one side are reported as
/// [`crate::error::MissingLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Closed {}

impl<T: Term> RowExtension<T> for Closed {
    fn create_row_type(
        &self,
        _: &Application<T>,
        _: &BTreeSet<T::Identifier>,
        _: &mut Fresh,
    ) -> T {
        match *self {}
    }
}

/// The row extension for terms that can mint their own fresh variables.
///
/// The synthesized term has no positional subterms and its tail is
/// [`FreshVariable::fresh_variable`] of the next fresh index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FreshTail;

impl<T: FreshVariable> RowExtension<T> for FreshTail {
    fn create_row_type(
        &self,
        record: &Application<T>,
        labels: &BTreeSet<T::Identifier>,
        fresh: &mut Fresh,
    ) -> T {
        T::construct(Application {
            functor: record.functor.clone(),
            subterms: Vec::new(),
            labelled: record
                .labelled
                .iter()
                .filter(|(label, _)| labels.contains(*label))
                .map(|(label, value)| (label.clone(), value.clone()))
                .collect(),
            row: Some(T::fresh_variable(fresh.generate())),
        })
    }
}

/// The labelled subterms that couldn't be matched by the other side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Residual<T: Term> {
    pub(crate) lhs_only: BTreeMap<T::Identifier, T>,
    pub(crate) rhs_only: BTreeMap<T::Identifier, T>,
}

impl<T: Term> Residual<T> {
    fn is_empty(&self) -> bool {
        self.lhs_only.is_empty() && self.rhs_only.is_empty()
    }
}

fn tail<T: Term>(term: &T) -> Option<T> {
    term.extract().into_application().ok().and_then(|application| application.row)
}

fn row_variable<T: Term>(row: &T) -> Option<T::Identifier> {
    row.extract().into_variable().ok()
}

/// Drops the row tail of a synthesized extension.
fn close<T: Term>(term: T) -> T {
    match term.extract() {
        Shape::Application(mut application) => {
            application.row = None;
            T::construct(application)
        }
        Shape::Variable(_) => term,
    }
}

fn same_variable<T: Term>(lhs: &T, rhs: &T) -> bool {
    matches!(
        (lhs.extract(), rhs.extract()),
        (Shape::Variable(lhs), Shape::Variable(rhs)) if lhs == rhs
    )
}

/// Produces the pairs that must be unified for the labelled subterms and rows
/// of two applications with the same functor to agree.
///
/// The pairs are ordered: common labels (in label order), then each
/// synthesized extension against the opposite row (ordered by that row's
/// variable), then the two fresh tails. An extension built from a closed
/// record is closed as well, so the opposite row receives exactly the
/// missing fields.
///
/// Returns the unmatched labelled subterms if they can't be absorbed: no
/// extension is available, the opposite record is closed, or both records
/// share the same row variable.
pub(crate) fn reconcile<T: Term, R: RowExtension<T>>(
    lhs: &Application<T>,
    rhs: &Application<T>,
    extension: Option<&R>,
    fresh: &mut Fresh,
) -> Result<Vec<(T, T)>, Residual<T>> {
    let mut pairs = Vec::new();
    let mut residual =
        Residual { lhs_only: BTreeMap::new(), rhs_only: BTreeMap::new() };

    for (label, value) in &lhs.labelled {
        if let Some(other) = rhs.labelled.get(label) {
            pairs.push((value.clone(), other.clone()));
        } else {
            residual.lhs_only.insert(label.clone(), value.clone());
        }
    }

    for (label, value) in &rhs.labelled {
        if !lhs.labelled.contains_key(label) {
            residual.rhs_only.insert(label.clone(), value.clone());
        }
    }

    if residual.is_empty() {
        if let (Some(lhs_row), Some(rhs_row)) = (&lhs.row, &rhs.row) {
            pairs.push((lhs_row.clone(), rhs_row.clone()));
        }

        return Ok(pairs);
    }

    let Some(extension) = extension else {
        return Err(residual);
    };

    // a residual can only flow into an open row on the opposite side
    if (!residual.lhs_only.is_empty() && rhs.row.is_none())
        || (!residual.rhs_only.is_empty() && lhs.row.is_none())
    {
        return Err(residual);
    }

    if let (Some(lhs_row), Some(rhs_row)) = (&lhs.row, &rhs.row) {
        if same_variable(lhs_row, rhs_row) {
            return Err(residual);
        }
    }

    // ordered by the row they extend, so swapping the arguments yields the
    // same pairs
    let mut extensions = Vec::with_capacity(2);
    if let Some(rhs_row) = &rhs.row {
        extensions.push((lhs, &residual.lhs_only, rhs_row));
    }
    if let Some(lhs_row) = &lhs.row {
        extensions.push((rhs, &residual.rhs_only, lhs_row));
    }
    extensions.sort_by_key(|(_, _, row)| row_variable(*row));

    let mut tails = Vec::with_capacity(2);
    for (record, fields, row) in extensions {
        let labels = fields.keys().cloned().collect();
        let synthesized = extension.create_row_type(record, &labels, fresh);

        // a closed record admits no further fields beyond its own
        let synthesized = if record.row.is_none() {
            close(synthesized)
        } else {
            tails.extend(tail(&synthesized));
            synthesized
        };

        pairs.push((synthesized, row.clone()));
    }

    if let Ok([first, second]) = <[T; 2]>::try_from(tails) {
        pairs.push((first, second));
    }

    Ok(pairs)
}
