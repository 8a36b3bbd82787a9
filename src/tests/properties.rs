/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

use proptest::collection::vec;
use proptest::prelude::*;

use super::{accepted_by, all_accepted, config, run_items};
use crate::predicate::Predicate;
use crate::predicate::PredicateKind::{self, Any, Even, Odd, Prime};

/// Checks everything that must hold for a run whose predicates cover every item
fn check_covering_run(capacity: usize, consumers: &[(&str, PredicateKind)], items: &[i64]) {
    let (summary, events) = run_items(config(capacity, consumers), items);

    // every item is accepted exactly once
    let mut expected = items.to_vec();
    expected.sort_unstable();
    assert_eq!(all_accepted(&events), expected);
    assert_eq!(summary.total_accepted(), items.len() as u64);
    assert_eq!(summary.total_sum(), items.iter().copied().map(i128::from).sum::<i128>());

    // each consumer only accepted what its predicate accepts, and its tally matches
    for &(label, predicate) in consumers {
        let accepted = accepted_by(&events, label);
        assert!(accepted.iter().all(|&item| predicate.accepts(item)));
        let tally = summary.tally(label).unwrap();
        assert_eq!(tally.count, accepted.len() as u64);
        assert_eq!(tally.sum, accepted.iter().copied().map(i128::from).sum::<i128>());
    }

    // the buffer never overflowed and ended empty
    assert!(summary.stats.high_water <= capacity);
    assert_eq!(summary.stats.deposits, items.len() as u64);
    assert_eq!(summary.stats.present(), 0);
    assert_eq!(summary.stats.accepted, items.len() as u64);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn even_and_odd_accept_everything_once(items in vec(-100_i64..1_000, 0..80), capacity in 1_usize..8) {
        check_covering_run(capacity, &[("Even", Even), ("Odd", Odd)], &items);
    }

    #[test]
    fn overlapping_predicates_accept_everything_once(items in vec(-20_i64..120, 0..80), capacity in 1_usize..8) {
        check_covering_run(capacity, &[("Even", Even), ("Odd", Odd), ("Prime", Prime)], &items);
    }

    #[test]
    fn catch_all_collects_the_rest(items in vec(0_i64..500, 0..80), capacity in 1_usize..8) {
        check_covering_run(capacity, &[("Prime", Prime), ("Rest", Any)], &items);
    }
}
