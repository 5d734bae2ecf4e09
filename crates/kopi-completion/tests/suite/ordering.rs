use std::cmp::Ordering;

use kopi_completion::{compare, sort_candidates, Candidate, SortKey};
use kopi_core::{TypeKind, VariableKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::support::{arb_candidate, local, names};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn comparator_is_a_strict_total_order(
        a in arb_candidate(),
        b in arb_candidate(),
        c in arb_candidate(),
    ) {
        let ab = compare(&a, &b);
        let bc = compare(&b, &c);
        let ac = compare(&a, &c);

        prop_assert_eq!(compare(&b, &a), ab.reverse());
        prop_assert_eq!(compare(&a, &a), Ordering::Equal);
        if ab != Ordering::Greater && bc != Ordering::Greater {
            prop_assert_ne!(ac, Ordering::Greater);
        }
        if ab == Ordering::Equal && bc == Ordering::Equal {
            prop_assert_eq!(ac, Ordering::Equal);
        }
    }

    #[test]
    fn sort_text_orders_like_the_key(a in arb_candidate(), b in arb_candidate()) {
        let (ka, kb) = (SortKey::of(&a), SortKey::of(&b));
        prop_assert_eq!(ka.cmp(&kb), ka.sort_text().cmp(&kb.sort_text()));
    }

    #[test]
    fn unique_keys_sort_independently_of_insertion_order(
        (original, shuffled) in prop::collection::btree_set("[a-e]{1,4}", 1..12)
            .prop_map(|names| names.iter().map(|n| local(n)).collect::<Vec<_>>())
            .prop_flat_map(|candidates| {
                (Just(candidates.clone()), Just(candidates).prop_shuffle())
            }),
    ) {
        prop_assert_eq!(sort_candidates(original), sort_candidates(shuffled));
    }

    #[test]
    fn smart_typed_candidates_precede_their_plain_twin(candidate in arb_candidate()) {
        prop_assume!(!candidate.kind().always_smart());
        let smart = candidate.clone().smart_typed(true);
        let plain = candidate.smart_typed(false);
        prop_assert_eq!(compare(&smart, &plain), Ordering::Less);
    }

    #[test]
    fn deprecation_demotes_without_changing_bucket(candidate in arb_candidate()) {
        let current = candidate.clone().deprecated(false);
        let deprecated = candidate.deprecated(true);
        let (kc, kd) = (SortKey::of(&current), SortKey::of(&deprecated));

        prop_assert_eq!(kc.bucket(), kd.bucket());
        prop_assert_eq!(compare(&current, &deprecated), Ordering::Less);
    }
}

#[test]
fn equal_keys_keep_discovery_order() {
    let lists = [
        Candidate::ty(TypeKind::Interface, "java.util.List"),
        Candidate::ty(TypeKind::Class, "java.awt.List"),
        Candidate::ty(TypeKind::Interface, "com.acme.List"),
    ];
    let reversed: Vec<Candidate> = lists.iter().rev().cloned().collect();

    let sorted = sort_candidates(lists.to_vec());
    assert_eq!(sorted, lists.to_vec());
    assert_eq!(sort_candidates(reversed.clone()), reversed);
}

#[test]
fn smart_typing_crosses_kind_buckets() {
    let smart_method = Candidate::method("size", Vec::<&str>::new()).smart_typed(true);
    let plain_local = local("sum");
    let smart_type = Candidate::ty(TypeKind::Class, "java.lang.Integer").smart_typed(true);

    let sorted = sort_candidates(vec![plain_local, smart_type, smart_method]);
    assert_eq!(names(&sorted), vec!["size", "Integer", "sum"]);
}

#[test]
fn deprecated_candidates_stay_within_their_kind() {
    let deprecated_local = local("old").deprecated(true);
    let field = Candidate::variable(VariableKind::Field, "fresh");
    let deprecated_field = Candidate::variable(VariableKind::Field, "aged").deprecated(true);

    let sorted = sort_candidates(vec![deprecated_field, field, deprecated_local]);
    assert_eq!(names(&sorted), vec!["old", "fresh", "aged"]);
}

#[test]
fn overloads_break_ties_on_parameter_text() {
    let sorted = sort_candidates(vec![
        Candidate::method("append", ["int"]),
        Candidate::method("append", ["char"]),
        Candidate::method("append", ["CharSequence"]),
        Candidate::method("append", ["char[]", "int", "int"]),
    ]);
    let params: Vec<&str> = sorted
        .iter()
        .map(|c| c.signature().unwrap()[0].as_str())
        .collect();
    assert_eq!(params, vec!["CharSequence", "char", "int", "char[]"]);
}
