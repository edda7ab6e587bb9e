use std::{
    io::{self, Write},
    sync::Mutex,
};

use log::LevelFilter;
use proptest::{
    arbitrary::Arbitrary, prop_assert, prop_assert_eq, proptest,
    strategy::Strategy,
};
use unifier_term::{
    arbitrary::Forms,
    tree::{Name, Tree},
};

use crate::{
    occurs::variables, Config, Error, FreshTail, Kind, Substitution, Unifier,
};

fn var(name: &str) -> Tree { Tree::variable(name) }

fn constant(name: &str) -> Tree { Tree::constant(name) }

fn app<const N: usize>(functor: &str, subterms: [Tree; N]) -> Tree {
    Tree::application(functor, subterms)
}

fn unifier() -> Unifier<Tree> { Unifier::default() }

fn row_unifier() -> Unifier<Tree, FreshTail> {
    Unifier::new(Config::new().with_row_extension(FreshTail))
}

static CAPTURED: Mutex<Vec<u8>> = Mutex::new(Vec::new());

/// Appends everything the logger writes to [`CAPTURED`].
struct Capture;

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        CAPTURED.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

/// Routes the engine's `info` records, message only, into [`CAPTURED`].
fn init_logger() {
    let _ = env_logger::Builder::new()
        .is_test(true)
        .filter_module("unifier_engine", LevelFilter::Info)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .target(env_logger::Target::Pipe(Box::new(Capture)))
        .try_init();
}

fn captured() -> String {
    String::from_utf8_lossy(&CAPTURED.lock().unwrap()).into_owned()
}

/// Asserts that the engine unifies and makes both terms equal.
fn assert_unified<R: crate::RowExtension<Tree>>(
    unifier: &Unifier<Tree, R>,
    lhs: &Tree,
    rhs: &Tree,
) {
    assert!(unifier.unifies(), "{}", unifier.error_string());
    assert_eq!(unifier.substitute(lhs), unifier.substitute(rhs));
}

#[test]
fn bound_variable_is_reused() {
    let lhs = app("F", [var("x"), var("x"), var("x")]);
    let rhs = app(
        "F",
        [
            var("y"),
            app("G", [var("y0"), var("y0")]),
            app("G", [var("z"), var("z")]),
        ],
    );

    let mut unifier = unifier();
    unifier.unify(&var("z"), &app("F", [var("a"), var("a")]));
    unifier.unify(&lhs, &rhs);

    assert_unified(&unifier, &lhs, &rhs);

    let expected = app(
        "G",
        [app("F", [var("a"), var("a")]), app("F", [var("a"), var("a")])],
    );
    assert_eq!(unifier.substitute(&var("x")), expected);
}

#[test]
fn repeated_variables_replicate() {
    for n in [1, 4, 7] {
        let x = |i: usize| var(&format!("x{i}"));

        let mut unifier = unifier();
        for i in (1..=n).rev() {
            unifier.unify(&x(i), &app("G", [x(i + 1), x(i + 1)]));
        }

        let rhs = app("G", [x(1), x(1)]);
        unifier.unify(&x(0), &rhs);

        assert_unified(&unifier, &x(0), &rhs);
        assert_eq!(unifier.entries().len(), n + 1);
    }
}

#[test]
fn cycle_through_store_fails_occurs_check() {
    let mut unifier = unifier();

    unifier
        .unify(
            &var("w"),
            &app("F", [app("G", [constant("A"), constant("B"), var("x")])]),
        )
        .unify(&var("x"), &app("H", [var("y")]))
        .unify(&var("z"), &app("Foo", [var("w"), var("w")]))
        .unify(&var("y"), &app("Q", [constant("A"), constant("B"), var("z")]));

    assert!(!unifier.unifies());

    let error = unifier.error().unwrap();
    assert_eq!(error.kind(), Kind::Occurs);

    assert!(!error.kind().is_structural());
    assert_eq!(error.top().unwrap().lhs, var("y"));

    let occurs = error.as_occurs().unwrap();
    assert_eq!(occurs.identifier, Name::from("y"));
    assert!(unifier.error_string().starts_with("occurs check failed: y occurs in Q(A, B, Foo("));
    assert!(unifier.error_string().ends_with("(in y == Q(A, B, z))"));
}

#[test]
fn functor_mismatch_fails_with_name_clash() {
    let mut unifier = unifier();

    unifier
        .unify(&app("F", [var("x")]), &app("F", [app("G", [var("y")])]))
        .unify(&var("x"), &app("H", [var("y")]));

    let error = unifier.error().unwrap();
    assert!(error.kind().is_structural());
    assert_eq!(error.top().unwrap().rhs, app("H", [var("y")]));

    let clash = error.as_name_clash().unwrap();

    assert_eq!(clash.lhs_functor, Name::from("G"));
    assert_eq!(clash.rhs_functor, Name::from("H"));
    assert_eq!(
        unifier.error_string(),
        "failed to unify G(y) and H(y): functor G differs from H (in x == H(y))"
    );
}

#[test]
fn subterm_count_mismatch_fails_with_arity() {
    let mut unifier = unifier();

    unifier
        .unify(&app("F", [var("x")]), &app("F", [app("G", [var("y")])]))
        .unify(&var("x"), &app("G", [var("y"), var("y")]));

    let arity = unifier.error().unwrap().as_arity().unwrap();

    assert_eq!((arity.lhs_arity, arity.rhs_arity), (1, 2));
    assert_eq!(
        unifier.error_string(),
        "failed to unify G(y) and G(y, y): 1 subterm(s) against 2 (in x == G(y, y))"
    );
}

#[test]
fn top_level_mismatch_has_no_context() {
    let mut unifier = unifier();

    unifier.unify(&app("F", [var("a")]), &app("F", [var("a"), var("b")]));

    assert_eq!(
        unifier.error_string(),
        "failed to unify F(a) and F(a, b): 1 subterm(s) against 2"
    );
}

#[test]
fn name_clash_takes_precedence_over_arity() {
    let mut unifier = unifier();

    unifier.unify(&app("F", [var("a")]), &app("G", [var("a"), var("b")]));

    assert_eq!(unifier.error().unwrap().kind(), Kind::NameClash);
}

#[test]
fn variable_shared_across_positions() {
    let lhs = app("F", [var("x"), var("x")]);
    let rhs = app("F", [constant("Number"), var("y")]);

    let mut unifier = unifier();
    unifier.unify(&lhs, &rhs);

    assert_unified(&unifier, &lhs, &rhs);
    assert_eq!(unifier.substitute(&var("y")), constant("Number"));
}

#[test]
fn records_with_different_labels_unify_through_fresh_rows() {
    let lhs = Tree::record("F", [], [("foo", var("x"))], Some(var("r1")));
    let rhs = Tree::record(
        "F",
        [],
        [("bar", var("y")), ("foo", app("F", [var("y")]))],
        Some(var("r2")),
    );

    let mut unifier = row_unifier();
    unifier.unify(&lhs, &rhs);

    assert_unified(&unifier, &lhs, &rhs);
    assert_eq!(unifier.substitute(&lhs).to_string(), "F(bar: y, foo: F(y) | _r0)");
}

#[test]
fn records_with_different_labels_fail_without_extension() {
    let lhs = Tree::record("F", [], [("foo", var("x"))], Some(var("r1")));
    let rhs = Tree::record(
        "F",
        [],
        [("bar", var("y")), ("foo", app("F", [var("y")]))],
        Some(var("r2")),
    );

    let mut unifier = unifier();
    unifier.unify(&lhs, &rhs);

    let error = unifier.error().unwrap();
    assert!(error.kind().is_structural());
    assert_eq!(error.top().unwrap().lhs, lhs);

    let missing = error.as_missing_label().unwrap();

    assert!(missing.lhs_only.is_empty());
    assert_eq!(missing.rhs_only.keys().collect::<Vec<_>>(), [&Name::from("bar")]);
    assert_eq!(
        unifier.error_string(),
        "failed to unify F(foo: x | r1) and F(bar: y, foo: F(y) | r2): \
         unmatched right labels (bar: y)"
    );
}

#[test]
fn record_cannot_extend_itself() {
    let lhs = Tree::record("F", [], [("foo", var("x"))], Some(var("r")));
    let rhs = Tree::record("F", [], [("bar", var("y"))], Some(var("r")));

    let mut unifier = row_unifier();
    unifier.unify(&lhs, &rhs);

    assert_eq!(unifier.error().unwrap().kind(), Kind::MissingLabel);
}

#[test]
fn swapped_records_fail_alike() {
    let lhs = Tree::record(
        "H",
        [app("F", [app("F", [var("a")])]), var("a")],
        [("baz", var("c"))],
        Some(var("b")),
    );
    let rhs = Tree::record(
        "H",
        [var("y"), Tree::record("F", [], std::iter::empty::<(Name, Tree)>(), Some(var("b")))],
        [
            ("baz", app("F", [var("a")])),
            ("foo", Tree::record("F", [], [("foo", var("y"))], None)),
        ],
        Some(var("c")),
    );

    let mut forward = row_unifier();
    let mut backward = row_unifier();

    forward.unify(&lhs, &rhs);
    backward.unify(&rhs, &lhs);

    assert!(!forward.unifies());
    assert_eq!(
        forward.error().map(Error::kind),
        backward.error().map(Error::kind)
    );
    assert_eq!(forward.substitution(), backward.substitution());
}

#[test]
fn variables_bind_the_same_way_in_either_order() {
    let mut forward = unifier();
    let mut backward = unifier();

    forward.unify(&var("a"), &var("b"));
    backward.unify(&var("b"), &var("a"));

    assert_eq!(forward.substitution(), backward.substitution());
    assert_eq!(forward.to_string(), "b => a");
}

#[test]
fn closed_record_closes_the_open_row() {
    let lhs = Tree::record("F", [], [("foo", var("x"))], None);
    let rhs = Tree::record("F", [], std::iter::empty::<(Name, Tree)>(), Some(var("r")));

    let mut unifier = row_unifier();
    unifier.unify(&lhs, &rhs);

    assert_unified(&unifier, &lhs, &rhs);
    assert_eq!(unifier.substitute(&rhs).to_string(), "F(foo: x)");
}

#[test]
fn failure_is_sticky() {
    let mut unifier = unifier();

    unifier.unify(&constant("A"), &constant("B"));
    let error = unifier.error().cloned();

    unifier.unify(&var("x"), &constant("C")).add_mapping(Name::from("y"), constant("D"));

    assert!(unifier.substitution().is_empty());
    assert_eq!(unifier.error().cloned(), error);
    assert_eq!(unifier.to_string(), unifier.error_string());
}

#[test]
fn clone_is_independent() {
    let mut original = unifier();
    original.unify(&var("x"), &constant("A"));

    let mut copy = original.clone();
    copy.unify(&var("y"), &constant("B"));
    copy.unify(&var("x"), &constant("C"));

    assert!(original.unifies());
    assert_eq!(original.entries().len(), 1);
    assert!(!copy.unifies());
    assert_eq!(copy.entries().len(), 2);
}

#[test]
fn add_mapping_rejects_cycle() {
    let mut unifier = unifier();

    unifier.add_mapping(Name::from("x"), app("F", [var("x")]));

    let error = unifier.error().unwrap();
    assert!(error.top().is_none());

    let occurs = error.as_occurs().unwrap();
    assert!(occurs.top.is_none());
    assert!(unifier.substitution().is_empty());
    assert_eq!(unifier.error_string(), "occurs check failed: x occurs in F(x)");
}

#[test]
fn add_mapping_keeps_store_composed() {
    let mut unifier = unifier();

    unifier
        .add_mapping(Name::from("x"), app("F", [var("y")]))
        .add_mapping(Name::from("y"), constant("A"));

    assert!(unifier.unifies());
    assert_eq!(
        unifier.substitution().lookup(&Name::from("x")),
        Some(&app("F", [constant("A")]))
    );
}

#[test]
fn solve_stops_at_first_failure() {
    let mut unifier = unifier();

    unifier.solve([
        (var("x"), constant("A")),
        (app("F", [var("x")]), app("G", [var("x")])),
        (var("y"), constant("B")),
    ]);

    assert_eq!(unifier.error().unwrap().kind(), Kind::NameClash);
    assert!(!unifier.substitution().contains(&Name::from("y")));
}

#[test]
fn initial_substitution_is_honoured() {
    let initial =
        Substitution::try_from_entries([(Name::from("x"), constant("A"))]).unwrap();

    let mut unifier = Unifier::new(Config::new().with_initial_substitution(initial));
    unifier.unify(&var("x"), &var("y"));

    assert!(unifier.unifies());
    assert_eq!(unifier.substitute(&var("y")), constant("A"));
}

#[test]
fn display_lists_bindings_in_order() {
    let mut unifier = unifier();

    unifier
        .unify(&var("x"), &constant("A"))
        .unify(&var("y"), &app("G", [var("x")]));

    assert_eq!(unifier.to_string(), "x => A\ny => G(A)");
    assert_eq!(unifier.substitution_string(", "), "x => A, y => G(A)");
    assert!(unifier.error_string().is_empty());
    assert_eq!(unifier.term_to_string(&app("F", [var("x")])), "F(x)");
}

#[test]
fn trace_logs_each_step() {
    init_logger();

    let lhs = Tree::record("F", [], [("foo", var("x"))], Some(var("r1")));
    let rhs = Tree::record(
        "F",
        [],
        [("bar", var("y")), ("foo", app("F", [var("y")]))],
        Some(var("r2")),
    );

    let mut traced = Unifier::new(
        Config::new().with_row_extension(FreshTail).with_trace(true),
    );
    let mut silent = row_unifier();

    traced.unify(&lhs, &rhs);
    silent.unify(&lhs, &rhs);

    assert!(traced.trace());
    assert!(!silent.trace());
    assert_eq!(traced.substitution(), silent.substitution());

    let mut traced = Unifier::new(Config::new().with_trace(true));
    traced.unify(
        &app("Traced", [var("p"), app("Pair", [var("q")])]),
        &app("Traced", [constant("Only"), app("Pair", [constant("Other")])]),
    );

    let log = captured();

    // decomposition lists nothing; each binding lists the whole store
    assert!(log.contains(
        "unify Traced(p, Pair(q)) == Traced(Only, Pair(Other))\n  unify p == Only\n"
    ));
    assert!(log.contains("  unify p == Only\n  \\\n    p => Only\n"));
    assert!(log.contains(
        "    p => Only\n  unify Pair(q) == Pair(Other)\n    unify q == Other\n"
    ));
    assert!(log.contains(
        "    unify q == Other\n    \\\n      p => Only\n      q => Other\n"
    ));
}

#[test]
fn deep_terms_unify() {
    let mut lhs = var("x");
    let mut rhs = constant("A");
    for _ in 0..512 {
        lhs = app("F", [lhs]);
        rhs = app("F", [rhs]);
    }

    let mut unifier = unifier();
    unifier.unify(&lhs, &rhs);

    assert_unified(&unifier, &lhs, &rhs);
    assert_eq!(unifier.substitute(&var("x")), constant("A"));
}

fn pairs(forms: Forms) -> impl Strategy<Value = Vec<(Tree, Tree)>> {
    proptest::collection::vec(
        (Tree::arbitrary_with(forms), Tree::arbitrary_with(forms)),
        0..6,
    )
}

proptest! {
    #[test]
    fn substitution_is_idempotent(
        seed in pairs(Forms { records: true }),
        lhs in Tree::arbitrary_with(Forms { records: true }),
        rhs in Tree::arbitrary_with(Forms { records: true }),
    ) {
        let mut unifier = row_unifier();
        unifier.solve(seed).unify(&lhs, &rhs);

        for term in [&lhs, &rhs] {
            let once = unifier.substitute(term);
            prop_assert_eq!(unifier.substitute(&once), once);
        }
    }

    #[test]
    fn unifying_term_with_itself_binds_nothing(
        term in Tree::arbitrary_with(Forms { records: true }),
    ) {
        let mut unifier = row_unifier();
        unifier.unify(&term, &term);

        prop_assert!(unifier.unifies());
        prop_assert!(unifier.substitution().is_empty());
    }

    #[test]
    fn unification_is_symmetric(
        lhs in Tree::arbitrary_with(Forms { records: true }),
        rhs in Tree::arbitrary_with(Forms { records: true }),
    ) {
        let mut forward = row_unifier();
        let mut backward = row_unifier();

        forward.unify(&lhs, &rhs);
        backward.unify(&rhs, &lhs);

        prop_assert_eq!(
            forward.error().map(Error::kind),
            backward.error().map(Error::kind)
        );

        if forward.unifies() {
            prop_assert_eq!(forward.substitution(), backward.substitution());
        }
    }

    #[test]
    fn positional_solution_equates_both_sides(
        lhs in Tree::arbitrary(),
        rhs in Tree::arbitrary(),
    ) {
        let mut forward = unifier();
        let mut backward = unifier();

        forward.unify(&lhs, &rhs);
        backward.unify(&rhs, &lhs);

        prop_assert_eq!(forward.unifies(), backward.unifies());

        if forward.unifies() {
            prop_assert_eq!(forward.substitute(&lhs), forward.substitute(&rhs));
            prop_assert_eq!(backward.substitute(&lhs), backward.substitute(&rhs));
        }
    }

    #[test]
    fn store_stays_composed(pairs in pairs(Forms { records: true })) {
        let mut unifier = row_unifier();
        unifier.solve(pairs);

        for (_, term) in unifier.entries() {
            for variable in variables(term) {
                prop_assert!(!unifier.substitution().contains(&variable));
            }
        }
    }
}
