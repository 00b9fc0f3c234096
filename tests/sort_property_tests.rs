//! Property-based testing for the parallel radix sort
//!
//! Checks the position-map contract, ordering, stability and worker-count
//! invariance over random inputs, digit widths and team sizes.

use proptest::prelude::*;
use pradsort::{RadixSorter, SortConfig, U128x2};

// =============================================================================
// HELPERS
// =============================================================================

fn sort_with(values: &[u64], digit_bits: u32, threads: usize) -> (Vec<u64>, Vec<u32>) {
    let config = SortConfig::builder()
        .digit_bits(digit_bits)
        .num_threads(threads)
        .build()
        .unwrap();
    let mut sorted = values.to_vec();
    let mut keys = vec![0u32; values.len()];
    RadixSorter::with_config(config)
        .sort(&mut sorted, &mut keys, values.len(), None)
        .unwrap();
    (sorted, keys)
}

fn is_permutation(keys: &[u32]) -> bool {
    let mut seen = vec![false; keys.len()];
    for &k in keys {
        let k = k as usize;
        if k >= keys.len() || seen[k] {
            return false;
        }
        seen[k] = true;
    }
    true
}

/// Values with few distinct entries so that ties are common
fn tie_heavy_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..8, 0..2000)
}

fn value_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop_oneof![
        prop::collection::vec(any::<u64>(), 0..2000),
        prop::collection::vec(0u64..1024, 0..2000),
        tie_heavy_strategy(),
    ]
}

// =============================================================================
// POSITION MAP PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_keys_are_permutation(
        values in value_strategy(),
        digit_bits in 1u32..=16,
        threads in 1usize..=6,
    ) {
        let (_, keys) = sort_with(&values, digit_bits, threads);
        prop_assert!(is_permutation(&keys));
    }

    #[test]
    fn prop_sorted_and_mapped(
        values in value_strategy(),
        digit_bits in 1u32..=16,
        threads in 1usize..=6,
    ) {
        let (sorted, keys) = sort_with(&values, digit_bits, threads);

        prop_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
        for (i, &k) in keys.iter().enumerate() {
            prop_assert_eq!(values[i], sorted[k as usize]);
        }

        let mut expected = values.clone();
        expected.sort_unstable();
        prop_assert_eq!(sorted, expected);
    }

    #[test]
    fn prop_stable_for_equal_values(
        values in tie_heavy_strategy(),
        digit_bits in 1u32..=8,
        threads in 1usize..=5,
    ) {
        let (_, keys) = sort_with(&values, digit_bits, threads);

        // Earlier originals of the same value land earlier
        for i in 0..values.len() {
            for j in (i + 1)..values.len().min(i + 32) {
                if values[i] == values[j] {
                    prop_assert!(keys[i] < keys[j]);
                }
            }
        }
    }

    #[test]
    fn prop_worker_count_invariance(
        values in value_strategy(),
        digit_bits in 1u32..=12,
        threads in 2usize..=8,
    ) {
        let single = sort_with(&values, digit_bits, 1);
        let many = sort_with(&values, digit_bits, threads);
        prop_assert_eq!(single, many);
    }

    #[test]
    fn prop_resort_is_identity(
        values in value_strategy(),
        digit_bits in 1u32..=16,
        threads in 1usize..=4,
    ) {
        let (sorted, _) = sort_with(&values, digit_bits, threads);
        let (resorted, keys) = sort_with(&sorted, digit_bits, threads);

        prop_assert_eq!(&resorted, &sorted);
        prop_assert!(keys.iter().enumerate().all(|(i, &k)| k as usize == i));
    }

    #[test]
    fn prop_wide_values_sorted(
        words in prop::collection::vec((any::<u64>(), 0u64..4), 0..500),
        digit_bits in 4u32..=16,
        threads in 1usize..=4,
    ) {
        let original: Vec<U128x2> = words
            .iter()
            .map(|&(lo, hi)| U128x2::from_words([lo, hi]))
            .collect();
        let config = SortConfig::builder()
            .digit_bits(digit_bits)
            .num_threads(threads)
            .build()
            .unwrap();

        let mut sorted = original.clone();
        let mut keys = vec![0usize; original.len()];
        RadixSorter::with_config(config)
            .sort(&mut sorted, &mut keys, original.len(), None)
            .unwrap();

        let mut expected = original.clone();
        expected.sort();
        prop_assert_eq!(&sorted, &expected);
        for (i, &k) in keys.iter().enumerate() {
            prop_assert_eq!(original[i], sorted[k]);
        }
    }
}

// =============================================================================
// ZERO CASE
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_all_zero_is_identity(
        len in 0usize..3000,
        digit_bits in 1u32..=16,
        threads in 1usize..=4,
    ) {
        let values = vec![0u64; len];
        let config = SortConfig::builder()
            .digit_bits(digit_bits)
            .num_threads(threads)
            .build()
            .unwrap();
        let mut sorter = RadixSorter::with_config(config);
        let mut sorted = values.clone();
        let mut keys = vec![0u32; len];
        sorter.sort(&mut sorted, &mut keys, len, None).unwrap();

        prop_assert_eq!(sorter.stats().passes, 0);
        prop_assert_eq!(sorted, values);
        prop_assert!(keys.iter().enumerate().all(|(i, &k)| k as usize == i));
    }
}
