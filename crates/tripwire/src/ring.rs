// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-capacity ring of outcome bits backed by atomic words.
///
/// A set bit marks a failed call, a cleared bit a successful one. Every bit
/// lives in exactly one word and is mutated with a compare-and-swap loop on
/// that word, so concurrent writers to neighbouring bits never lose updates.
#[derive(Debug)]
pub(crate) struct OutcomeRing {
    words: Box<[AtomicU64]>,
}

impl OutcomeRing {
    /// Creates a ring holding at least `bits` slots, rounded up to whole words.
    pub(crate) fn new(bits: usize) -> Self {
        let word_count = bits.div_ceil(WORD_BITS).max(1);

        Self {
            words: (0..word_count).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Number of slots; always a multiple of 64.
    pub(crate) fn size(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    pub(crate) fn set(&self, index: usize) -> bool {
        let (word, mask) = self.locate(index);
        let previous = Self::update(word, |bits| bits | mask);
        previous & mask != 0
    }

    pub(crate) fn clear(&self, index: usize) -> bool {
        let (word, mask) = self.locate(index);
        let previous = Self::update(word, |bits| bits & !mask);
        previous & mask != 0
    }

    pub(crate) fn get(&self, index: usize) -> bool {
        let (word, mask) = self.locate(index);
        word.load(Ordering::Acquire) & mask != 0
    }

    /// Counts the set bits across all words.
    pub(crate) fn cardinality(&self) -> usize {
        self.words.iter().map(|word| word.load(Ordering::Acquire).count_ones() as usize).sum()
    }

    pub(crate) fn reset(&self) {
        for word in &self.words {
            word.store(0, Ordering::Release);
        }
    }

    fn locate(&self, index: usize) -> (&AtomicU64, u64) {
        let index = index % self.size();
        (&self.words[index / WORD_BITS], 1_u64 << (index % WORD_BITS))
    }

    fn update(word: &AtomicU64, f: impl Fn(u64) -> u64) -> u64 {
        let mut current = word.load(Ordering::Acquire);

        loop {
            let next = f(current);
            if next == current {
                return current;
            }

            match word.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(previous) => return previous,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Display for OutcomeRing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for index in 0..self.size() {
            f.write_str(if self.get(index) { "1" } else { "0" })?;
        }

        Ok(())
    }
}
