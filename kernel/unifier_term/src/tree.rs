//! Contains the definition of [`Tree`], a general-purpose term representation.

use std::{collections::BTreeMap, fmt};

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::{Application, FreshVariable, Shape, Term};

/// The identifier of a [`Tree`] variable, functor, or label.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::From,
)]
#[serde(untagged)]
pub enum Name {
    /// A name written by the host.
    Symbol(String),

    /// A name minted from a [`crate::Fresh`] index. These never collide with
    /// host symbols.
    Fresh(usize),
}

impl From<&str> for Name {
    fn from(value: &str) -> Self { Self::Symbol(value.to_owned()) }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(symbol) => f.write_str(symbol),
            Self::Fresh(index) => write!(f, "_r{index}"),
        }
    }
}

/// An application node of a [`Tree`].
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Node {
    /// The functor of the application.
    pub functor: Name,

    /// The positional subterms.
    pub subterms: Vec<Tree>,

    /// The labelled subterms.
    pub labelled: BTreeMap<Name, Tree>,

    /// The extension tail of the record, if it is open.
    pub row: Option<Box<Tree>>,
}

/// A first-order term with optional labelled fields and row tail.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumAsInner,
    derive_more::From,
)]
#[allow(missing_docs)]
pub enum Tree {
    Variable(Name),
    Application(Node),
}

impl Tree {
    /// Creates a variable term.
    #[must_use]
    pub fn variable(name: impl Into<Name>) -> Self {
        Self::Variable(name.into())
    }

    /// Creates an application without any subterms.
    #[must_use]
    pub fn constant(functor: impl Into<Name>) -> Self {
        Self::application(functor, [])
    }

    /// Creates an application with positional subterms only.
    #[must_use]
    pub fn application(
        functor: impl Into<Name>,
        subterms: impl IntoIterator<Item = Self>,
    ) -> Self {
        Self::record(functor, subterms, std::iter::empty::<(Name, Self)>(), None)
    }

    /// Creates an application with positional subterms, labelled subterms,
    /// and an optional row tail.
    #[must_use]
    pub fn record<L: Into<Name>>(
        functor: impl Into<Name>,
        subterms: impl IntoIterator<Item = Self>,
        labelled: impl IntoIterator<Item = (L, Self)>,
        row: Option<Self>,
    ) -> Self {
        Self::Application(Node {
            functor: functor.into(),
            subterms: subterms.into_iter().collect(),
            labelled: labelled
                .into_iter()
                .map(|(label, value)| (label.into(), value))
                .collect(),
            row: row.map(Box::new),
        })
    }
}

impl Term for Tree {
    type Identifier = Name;

    fn extract(&self) -> Shape<Self> {
        match self {
            Self::Variable(name) => Shape::Variable(name.clone()),
            Self::Application(node) => Shape::Application(Application {
                functor: node.functor.clone(),
                subterms: node.subterms.clone(),
                labelled: node.labelled.clone(),
                row: node.row.as_deref().cloned(),
            }),
        }
    }

    fn construct(application: Application<Self>) -> Self {
        Self::Application(Node {
            functor: application.functor,
            subterms: application.subterms,
            labelled: application.labelled,
            row: application.row.map(Box::new),
        })
    }
}

impl FreshVariable for Tree {
    fn fresh_variable(index: usize) -> Self { Self::Variable(Name::Fresh(index)) }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
