//! Bit extent and per-pass digit histograms
//!
//! Both kernels run on one worker's partition. The extent is a plain OR over
//! the values: only the highest occupied bit decides how many passes are
//! needed, so no comparison is required.

use crate::algorithms::radix_key::RadixKey;

/// Bitwise OR of every value in `values`
pub fn bit_or_extent<T: RadixKey>(values: &[T]) -> T {
    values.iter().fold(T::default(), |acc, &v| acc.bit_or(v))
}

/// Combine per-worker extents into the global one
pub fn combine_extents<T: RadixKey>(extents: impl IntoIterator<Item = T>) -> T {
    extents.into_iter().fold(T::default(), |acc, v| acc.bit_or(v))
}

/// Passes needed to consume every occupied bit of `extent`
pub fn pass_count<T: RadixKey>(extent: &T, digit_bits: u32) -> usize {
    let mut passes = 0;
    let mut processed = 0u32;
    while extent.has_bits_from(processed) {
        passes += 1;
        processed = processed.saturating_add(digit_bits);
    }
    passes
}

/// Count the digit at `shift` of every value into `counts`.
///
/// `counts` is cleared first and must hold `mask + 1` buckets.
pub fn count_digits<T: RadixKey>(values: &[T], shift: u32, mask: usize, counts: &mut [usize]) {
    debug_assert_eq!(counts.len(), mask + 1);
    counts.fill(0);
    for value in values {
        counts[value.digit(shift, mask)] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::radix_key::U128x2;

    #[test]
    fn test_bit_or_extent() {
        assert_eq!(bit_or_extent::<u32>(&[]), 0);
        assert_eq!(bit_or_extent(&[1u32, 4, 16]), 21);
        assert_eq!(combine_extents(vec![1u64, 8, 0]), 9);

        let wide = [U128x2::from(1), U128x2::from_words([0, 2])];
        assert_eq!(bit_or_extent(&wide).words(), &[1, 2]);
    }

    #[test]
    fn test_pass_count() {
        assert_eq!(pass_count(&0u32, 8), 0);
        assert_eq!(pass_count(&1u32, 8), 1);
        assert_eq!(pass_count(&255u32, 8), 1);
        assert_eq!(pass_count(&256u32, 8), 2);
        assert_eq!(pass_count(&5u32, 1), 3);
        assert_eq!(pass_count(&u64::MAX, 16), 4);
        assert_eq!(pass_count(&u8::MAX, 3), 3);
        assert_eq!(pass_count(&U128x2::from_words([0, 1]), 16), 5);
    }

    #[test]
    fn test_count_digits() {
        let values = [5u32, 3, 3, 1];
        let mut counts = vec![9; 2];

        count_digits(&values, 0, 1, &mut counts);
        assert_eq!(counts, vec![0, 4]);

        count_digits(&values, 1, 1, &mut counts);
        assert_eq!(counts, vec![2, 2]);

        count_digits(&values, 2, 1, &mut counts);
        assert_eq!(counts, vec![3, 1]);
    }

    #[test]
    fn test_count_digits_sums_to_len() {
        let values: Vec<u64> = (0..1000).map(|i| i * 7919 % 4096).collect();
        let mut counts = vec![0; 256];
        count_digits(&values, 4, 255, &mut counts);
        assert_eq!(counts.iter().sum::<usize>(), values.len());
    }
}
