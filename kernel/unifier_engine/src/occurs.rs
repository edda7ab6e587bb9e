//! Contains the occurs check and related traversals.
//!
//! Both traversals use an explicit stack so that deeply nested terms can't
//! overflow the call stack.

use std::collections::BTreeSet;

use unifier_term::{Shape, Term};

/// Returns `true` if the variable `identifier` appears anywhere in `term`:
/// the term itself, its row, its labelled subterms, or its positional
/// subterms (recursively).
pub fn occurs<T: Term>(identifier: &T::Identifier, term: &T) -> bool {
    let mut stack = vec![term.clone()];

    while let Some(term) = stack.pop() {
        match term.extract() {
            Shape::Variable(variable) => {
                if &variable == identifier {
                    return true;
                }
            }
            Shape::Application(application) => {
                stack.extend(application.row);
                stack.extend(application.labelled.into_values());
                stack.extend(application.subterms);
            }
        }
    }

    false
}

/// Collects every variable appearing in `term`.
pub fn variables<T: Term>(term: &T) -> BTreeSet<T::Identifier> {
    let mut variables = BTreeSet::new();
    let mut stack = vec![term.clone()];

    while let Some(term) = stack.pop() {
        match term.extract() {
            Shape::Variable(variable) => {
                variables.insert(variable);
            }
            Shape::Application(application) => {
                stack.extend(application.row);
                stack.extend(application.labelled.into_values());
                stack.extend(application.subterms);
            }
        }
    }

    variables
}

#[cfg(test)]
mod tests {
    use unifier_term::tree::{Name, Tree};

    use super::{occurs, variables};

    fn var(name: &str) -> Tree { Tree::variable(name) }

    #[test]
    fn occurs_in_itself() {
        assert!(occurs(&Name::from("x"), &var("x")));
        assert!(!occurs(&Name::from("x"), &var("y")));
    }

    #[test]
    fn occurs_through_every_position() {
        let x = Name::from("x");

        let positional = Tree::application("F", [var("a"), Tree::application("G", [var("x")])]);
        let labelled = Tree::record("F", [], [("foo", var("x"))], None);
        let row = Tree::record("F", [], [("foo", var("a"))], Some(var("x")));
        let nested_row = Tree::application(
            "H",
            [Tree::record("F", [], [("foo", var("a"))], Some(var("x")))],
        );

        assert!(occurs(&x, &positional));
        assert!(occurs(&x, &labelled));
        assert!(occurs(&x, &row));
        assert!(occurs(&x, &nested_row));
        assert!(!occurs(&x, &Tree::constant("x")));
    }

    #[test]
    fn collects_variables() {
        let term = Tree::record(
            "F",
            [var("a"), Tree::application("G", [var("b"), var("a")])],
            [("foo", var("c"))],
            Some(var("r")),
        );

        assert_eq!(
            variables(&term).into_iter().collect::<Vec<_>>(),
            vec![Name::from("a"), Name::from("b"), Name::from("c"), Name::from("r")]
        );
    }

    #[test]
    fn deep_terms_do_not_overflow() {
        let mut term = var("x");
        for _ in 0..512 {
            term = Tree::application("S", [term]);
        }

        assert!(occurs(&Name::from("x"), &term));
        assert!(!occurs(&Name::from("y"), &term));
    }
}
