//! Sortable value and index types
//!
//! [`RadixKey`] is implemented by every fixed-width unsigned type the sorter
//! accepts, including the multi-word [`WideUint`]. [`SortIndex`] is implemented
//! by the integer types usable for the position map.

use crate::memory::ZeroInit;
use std::cmp::Ordering;
use std::fmt;

/// Fixed-width unsigned value ordered by its bit pattern.
pub trait RadixKey: ZeroInit + Send + Sync + Default + Ord + fmt::Debug {
    /// Width of the value in bits
    const BITS: u32;

    /// Bitwise OR of two values
    fn bit_or(self, other: Self) -> Self;

    /// `(self >> shift) & mask`, zero once `shift` reaches `BITS`
    fn digit(&self, shift: u32, mask: usize) -> usize;

    /// True when any bit at position `shift` or above is set
    fn has_bits_from(&self, shift: u32) -> bool;
}

macro_rules! impl_radix_key {
    ($($t:ty),*) => {
        $(
            impl RadixKey for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline(always)]
                fn bit_or(self, other: Self) -> Self {
                    self | other
                }

                #[inline(always)]
                fn digit(&self, shift: u32, mask: usize) -> usize {
                    if shift >= Self::BITS {
                        0
                    } else {
                        ((*self >> shift) as usize) & mask
                    }
                }

                #[inline(always)]
                fn has_bits_from(&self, shift: u32) -> bool {
                    shift < Self::BITS && (*self >> shift) != 0
                }
            }
        )*
    };
}

impl_radix_key!(u8, u16, u32, u64, u128, usize);

/// Integer type usable as an entry of the position map
pub trait SortIndex: ZeroInit + Send + Sync + Default + Eq + fmt::Debug {
    /// Largest position this type can hold
    const MAX_INDEX: usize;

    /// Convert from a position; callers check `MAX_INDEX` first
    fn from_index(index: usize) -> Self;

    /// Convert to a position
    fn to_index(self) -> usize;
}

impl SortIndex for u32 {
    const MAX_INDEX: usize = u32::MAX as usize;

    #[inline(always)]
    fn from_index(index: usize) -> Self {
        index as u32
    }

    #[inline(always)]
    fn to_index(self) -> usize {
        self as usize
    }
}

impl SortIndex for u64 {
    const MAX_INDEX: usize = usize::MAX;

    #[inline(always)]
    fn from_index(index: usize) -> Self {
        index as u64
    }

    #[inline(always)]
    fn to_index(self) -> usize {
        self as usize
    }
}

impl SortIndex for usize {
    const MAX_INDEX: usize = usize::MAX;

    #[inline(always)]
    fn from_index(index: usize) -> Self {
        index
    }

    #[inline(always)]
    fn to_index(self) -> usize {
        self
    }
}

/// Multi-word unsigned integer, `WORDS` little-endian 64-bit words.
///
/// `words[0]` holds the least significant bits. Ordering compares the most
/// significant word first, so the type sorts by its full unsigned bit pattern.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WideUint<const WORDS: usize> {
    words: [u64; WORDS],
}

/// 128-bit value built from two words
pub type U128x2 = WideUint<2>;

/// 256-bit value built from four words
pub type U256 = WideUint<4>;

impl<const WORDS: usize> WideUint<WORDS> {
    /// Zero value
    pub const ZERO: Self = Self { words: [0; WORDS] };

    /// Build from little-endian words
    pub const fn from_words(words: [u64; WORDS]) -> Self {
        Self { words }
    }

    /// Build from a single `u64` placed in the lowest word
    pub fn from_u64(value: u64) -> Self {
        let mut words = [0; WORDS];
        if WORDS > 0 {
            words[0] = value;
        }
        Self { words }
    }

    /// Little-endian words
    pub fn words(&self) -> &[u64; WORDS] {
        &self.words
    }

    /// True when every word is zero
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }
}

impl<const WORDS: usize> Default for WideUint<WORDS> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const WORDS: usize> Ord for WideUint<WORDS> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.words.iter().rev().cmp(other.words.iter().rev())
    }
}

impl<const WORDS: usize> PartialOrd for WideUint<WORDS> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const WORDS: usize> fmt::Debug for WideUint<WORDS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for (i, word) in self.words.iter().rev().enumerate() {
            if i == 0 {
                write!(f, "{:x}", word)?;
            } else {
                write!(f, "_{:016x}", word)?;
            }
        }
        Ok(())
    }
}

impl<const WORDS: usize> From<u64> for WideUint<WORDS> {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl<const WORDS: usize> RadixKey for WideUint<WORDS> {
    const BITS: u32 = 64 * WORDS as u32;

    #[inline]
    fn bit_or(self, other: Self) -> Self {
        let mut words = self.words;
        for (w, o) in words.iter_mut().zip(other.words.iter()) {
            *w |= *o;
        }
        Self { words }
    }

    #[inline]
    fn digit(&self, shift: u32, mask: usize) -> usize {
        if shift >= Self::BITS {
            return 0;
        }
        let word = (shift / 64) as usize;
        let offset = shift % 64;
        let mut bits = self.words[word] >> offset;
        // Digit straddles into the next word
        if offset > 0 && word + 1 < WORDS {
            bits |= self.words[word + 1] << (64 - offset);
        }
        (bits as usize) & mask
    }

    #[inline]
    fn has_bits_from(&self, shift: u32) -> bool {
        if shift >= Self::BITS {
            return false;
        }
        let word = (shift / 64) as usize;
        let offset = shift % 64;
        (self.words[word] >> offset) != 0 || self.words[word + 1..].iter().any(|&w| w != 0)
    }
}
