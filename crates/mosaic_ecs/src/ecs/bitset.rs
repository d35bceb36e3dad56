//! # Growable Bitset
//!
//! Multi-word bitset used for per-entity component flags, system
//! requirement sets and system active sets.
//!
//! Bit `n` lives in word `n >> 6`. The word vector grows on insert, so there
//! is no ceiling on component type count or entity count. Reads past the
//! last word are treated as unset.

/// Bits per storage word.
const WORD_BITS: usize = 64;

/// A growable set of non-negative integers backed by `u64` words.
///
/// ## Performance
///
/// - Insert / remove / contains: O(1) (insert may grow the word vector)
/// - Superset test: O(words)
/// - Iterate set bits: O(words + set bits)
#[derive(Clone, Debug, Default)]
pub struct BitSet {
    /// Bit storage: 1 = member. 64 members per word.
    words: Vec<u64>,
}

impl BitSet {
    /// Creates an empty bitset without allocating.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Creates an empty bitset with room for `bits` members before growing.
    #[must_use]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0u64; bits.div_ceil(WORD_BITS)],
        }
    }

    #[inline]
    const fn locate(bit: usize) -> (usize, u64) {
        (bit / WORD_BITS, 1u64 << (bit % WORD_BITS))
    }

    /// Sets `bit`. Returns `true` if it was previously unset.
    #[inline]
    pub fn insert(&mut self, bit: usize) -> bool {
        let (word, mask) = Self::locate(bit);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let was_clear = self.words[word] & mask == 0;
        self.words[word] |= mask;
        was_clear
    }

    /// Clears `bit`. Returns `true` if it was previously set.
    #[inline]
    pub fn remove(&mut self, bit: usize) -> bool {
        let (word, mask) = Self::locate(bit);
        match self.words.get_mut(word) {
            Some(w) if *w & mask != 0 => {
                *w &= !mask;
                true
            }
            _ => false,
        }
    }

    /// Checks whether `bit` is set.
    #[inline]
    #[must_use]
    pub fn contains(&self, bit: usize) -> bool {
        let (word, mask) = Self::locate(bit);
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Clears every bit, keeping the word allocation.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of set bits.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if every bit set in `other` is also set in `self`.
    ///
    /// The empty set is a subset of everything.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        other.words.iter().enumerate().all(|(i, &required)| {
            let have = self.words.get(i).copied().unwrap_or(0);
            have & required == required
        })
    }

    /// Iterates over set bits in ascending order.
    ///
    /// Uses `trailing_zeros` to skip clear regions.
    #[must_use]
    pub fn iter(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl PartialEq for BitSet {
    /// Equality by membership; trailing zero words are ignored.
    fn eq(&self, other: &Self) -> bool {
        let len = self.words.len().max(other.words.len());
        (0..len).all(|i| {
            self.words.get(i).copied().unwrap_or(0) == other.words.get(i).copied().unwrap_or(0)
        })
    }
}

impl Eq for BitSet {}

impl FromIterator<usize> for BitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        for bit in iter {
            set.insert(bit);
        }
        set
    }
}

impl<'a> IntoIterator for &'a BitSet {
    type Item = usize;
    type IntoIter = Ones<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the set bits of a [`BitSet`].
pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current_word: u64,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit = self.current_word.trailing_zeros() as usize;
                // Clear lowest set bit
                self.current_word &= self.current_word - 1;
                return Some(self.word_idx * WORD_BITS + bit);
            }

            self.word_idx += 1;
            if self.word_idx >= self.words.len() {
                return None;
            }
            self.current_word = self.words[self.word_idx];
        }
    }
}
