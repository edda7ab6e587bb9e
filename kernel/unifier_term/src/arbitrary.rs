//! Implements the [`Arbitrary`] trait for testing purposes.

use proptest::{
    arbitrary::Arbitrary,
    collection, option, prop_oneof, sample,
    strategy::{BoxedStrategy, Strategy},
};

use crate::tree::{Name, Tree};

const VARIABLES: &[&str] = &["a", "b", "c", "x", "y", "z"];
const FUNCTORS: &[&str] = &["F", "G", "H"];
const LABELS: &[&str] = &["foo", "bar", "baz"];

/// Selects which application forms the generated trees may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Forms {
    /// Allows applications to carry labelled subterms and a row tail.
    pub records: bool,
}

fn name(pool: &'static [&'static str]) -> impl Strategy<Value = Name> {
    sample::select(pool).prop_map(Name::from)
}

/// Generates a variable from a small pool, so that independently generated
/// trees tend to share variables.
#[must_use]
pub fn variable() -> BoxedStrategy<Tree> {
    name(VARIABLES).prop_map(Tree::Variable).boxed()
}

impl Arbitrary for Tree {
    type Parameters = Forms;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(forms: Self::Parameters) -> Self::Strategy {
        let leaf = prop_oneof![
            3 => variable(),
            1 => name(FUNCTORS).prop_map(|functor| Self::constant(functor)),
        ];

        leaf.prop_recursive(4, 24, 3, move |inner| {
            let positional =
                (name(FUNCTORS), collection::vec(inner.clone(), 1..=3))
                    .prop_map(|(functor, subterms)| {
                        Self::application(functor, subterms)
                    });

            if !forms.records {
                return positional.boxed();
            }

            let record = (
                name(FUNCTORS),
                collection::vec(inner.clone(), 0..=2),
                collection::btree_map(name(LABELS), inner, 0..=3),
                option::of(variable()),
            )
                .prop_map(|(functor, subterms, labelled, row)| {
                    Self::record(functor, subterms, labelled, row)
                });

            prop_oneof![positional, record].boxed()
        })
        .boxed()
    }
}
