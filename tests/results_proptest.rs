//! Property-based tests for result persistence, consolidation and override
//! resolution.

use archrules_core::consolidate::consolidate;
use archrules_core::sink::{decode_results, encode_results};
use archrules_core::{Priority, PriorityOverrides, Rule, RuleResult, RuleResultStatus};
use proptest::prelude::*;

fn any_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High)
    ]
}

fn any_status() -> impl Strategy<Value = RuleResultStatus> {
    prop_oneof![
        Just(RuleResultStatus::Pass),
        Just(RuleResultStatus::Fail),
        Just(RuleResultStatus::NoMatch)
    ]
}

fn any_result() -> impl Strategy<Value = RuleResult> {
    (
        "[a-c]\\.[A-C]",
        "[a-d]",
        ".{0,20}",
        any_priority(),
        ".{0,40}",
        any_status(),
    )
        .prop_map(|(class, name, description, priority, message, status)| {
            RuleResult::new(Rule::new(class, name, description, priority), message, status)
        })
}

proptest::proptest! {
    /// Persisting then reading back yields the same list.
    #[test]
    fn prop_sink_round_trip(results in proptest::collection::vec(any_result(), 0..40)) {
        let mut bytes = Vec::new();
        encode_results(&mut bytes, &results).expect("encode");
        let decoded = decode_results(&mut bytes.as_slice()).expect("decode");
        prop_assert_eq!(decoded, results);
    }

    /// Any strict prefix of an encoded file is rejected.
    #[test]
    fn prop_truncated_input_rejected(
        results in proptest::collection::vec(any_result(), 1..10),
        cut in 0usize..1000,
    ) {
        let mut bytes = Vec::new();
        encode_results(&mut bytes, &results).expect("encode");
        let cut = cut % bytes.len();
        prop_assert!(decode_results(&mut &bytes[..cut]).is_err());
    }

    /// Consolidating the same list twice yields identical groups.
    #[test]
    fn prop_consolidation_is_idempotent(results in proptest::collection::vec(any_result(), 0..40)) {
        prop_assert_eq!(consolidate(&results), consolidate(&results));
    }

    /// Failure counts equal the number of distinct FAIL entries per rule.
    #[test]
    fn prop_failure_count_counts_distinct_failures(
        results in proptest::collection::vec(any_result(), 0..40)
    ) {
        for group in consolidate(&results) {
            let mut fails: Vec<&RuleResult> = results
                .iter()
                .filter(|r| r.rule == group.rule && r.status == RuleResultStatus::Fail)
                .collect();
            fails.sort();
            fails.dedup();
            prop_assert_eq!(group.failure_count(), fails.len());
            prop_assert!(group.reportable.iter().all(|r| r.status != RuleResultStatus::Pass));
        }
    }

    /// The longest matching prefix decides the priority.
    #[test]
    fn prop_longest_prefix_wins(
        segments in proptest::collection::vec("[a-z]{1,4}", 1..5),
        priorities in proptest::collection::vec(any_priority(), 5),
    ) {
        let provider = format!("{}.Provider", segments.join("."));
        let mut overrides = PriorityOverrides::new();
        for depth in 1..=segments.len() {
            overrides.insert(segments[..depth].join("."), priorities[depth - 1]);
        }
        prop_assert_eq!(overrides.resolve(&provider), Some(priorities[segments.len() - 1]));
    }
}
