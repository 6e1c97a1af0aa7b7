//! # Character sets
//! A [CharSet] is a set of byte values in `0..=127`, stored as a canonical, sorted,
//! disjoint sequence of inclusive ranges. This is the alphabet algebra the rest of the
//! crate builds on: [Ast::advance](crate::ast::Ast::advance) labels derivative edges
//! with [CharSet]s, and [RegexGraph::compile](crate::graph::RegexGraph::compile) uses
//! [CharSet::intersect] to keep a DFA state's outgoing transitions pairwise disjoint.
//!
//! The empty [CharSet] doubles as the EPSILON marker used throughout the derivative
//! engine to mean "no character consumed, but derivation progressed" (see
//! [CharSet::is_epsilon]). There is no pointer identity involved; EPSILON is simply the
//! canonical form with zero ranges.

use std::fmt::{self, Display, Formatter};

/// Lower bound of the supported alphabet, inclusive.
pub const MIN_CHAR: u8 = 0;
/// Upper bound of the supported alphabet, inclusive.
pub const MAX_CHAR: u8 = 127;

/// A canonical set of bytes in `[MIN_CHAR, MAX_CHAR]`, represented as sorted, disjoint,
/// non-touching inclusive ranges. Two [CharSet]s with the same member bytes always
/// compare equal, since construction always normalizes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CharSet {
    ranges: Vec<(u8, u8)>,
}

impl CharSet {
    /// The empty set, also used as the EPSILON marker on derivative edges.
    pub fn epsilon() -> Self {
        CharSet { ranges: Vec::new() }
    }

    /// True iff this is the empty set (the EPSILON marker).
    pub fn is_epsilon(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The full alphabet `MIN_CHAR..=MAX_CHAR` (the distinguished `STAR` set).
    pub fn full() -> Self {
        CharSet {
            ranges: vec![(MIN_CHAR, MAX_CHAR)],
        }
    }

    /// A set containing exactly one byte.
    pub fn single(c: u8) -> Self {
        Self::from_ranges([(c, c)], false)
    }

    /// Builds a canonical [CharSet] from a collection of (possibly unsorted, possibly
    /// overlapping) inclusive ranges. If `inverted`, the result is the complement of
    /// those ranges within `[MIN_CHAR, MAX_CHAR]`.
    pub fn from_ranges(ranges: impl IntoIterator<Item = (u8, u8)>, inverted: bool) -> Self {
        let mut sorted: Vec<(u8, u8)> = ranges.into_iter().collect();
        sorted.sort_unstable();

        let mut merged: Vec<(u8, u8)> = Vec::with_capacity(sorted.len());
        let mut last: i16 = MIN_CHAR as i16 - 1;
        for (mut lo, mut hi) in sorted {
            if lo as i16 <= last {
                let (old_lo, old_hi) = merged.pop().expect("last only tracks a pushed range");
                lo = old_lo;
                hi = hi.max(old_hi);
            }
            last = hi as i16 + 1;
            merged.push((lo, hi));
        }

        let plain = CharSet { ranges: merged };
        if inverted {
            Self::full().intersect(&plain).0
        } else {
            plain
        }
    }

    /// The ranges of this set, in canonical (sorted, disjoint) order.
    pub fn ranges(&self) -> &[(u8, u8)] {
        &self.ranges
    }

    /// Linear membership test; range lists are small in practice so no hashing is used.
    pub fn contains(&self, c: u8) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
    }

    /// Union of two sets. Relies on [CharSet::from_ranges]'s normalisation to merge and
    /// dedupe the concatenated range lists.
    pub fn union(&self, other: &Self) -> Self {
        Self::from_ranges(
            self.ranges.iter().chain(other.ranges.iter()).copied(),
            false,
        )
    }

    /// Three-way intersection: splits `self` and `other` into the part only in `self`,
    /// the part only in `other`, and the part in both. The three results are pairwise
    /// disjoint and each is in canonical form.
    ///
    /// `union(only_self, both) == self`, `union(only_other, both) == other`.
    pub fn intersect(&self, other: &Self) -> (Self, Self, Self) {
        const SENTINEL: u16 = MAX_CHAR as u16 + 1;

        let get = |ranges: &[(u8, u8)], i: usize| -> (u16, u16) {
            ranges
                .get(i)
                .map(|&(lo, hi)| (lo as u16, hi as u16))
                .unwrap_or((SENTINEL, SENTINEL))
        };

        let mut only_self = Vec::new();
        let mut only_other = Vec::new();
        let mut both = Vec::new();

        let mut i = 0usize;
        let mut j = 0usize;
        let (mut self_min, mut self_max) = get(&self.ranges, i);
        let (mut other_min, mut other_max) = get(&other.ranges, j);

        while i < self.ranges.len() || j < other.ranges.len() {
            if self_max < other_min {
                i += 1;
                only_self.push((self_min as u8, self_max as u8));
                (self_min, self_max) = get(&self.ranges, i);
                continue;
            }
            if other_max < self_min {
                j += 1;
                only_other.push((other_min as u8, other_max as u8));
                (other_min, other_max) = get(&other.ranges, j);
                continue;
            }

            if self_min < other_min {
                only_self.push((self_min as u8, other_min as u8 - 1));
                self_min = other_min;
            }
            if other_min < self_min {
                only_other.push((other_min as u8, self_min as u8 - 1));
                other_min = self_min;
            }

            if self_max < other_max {
                i += 1;
                both.push((self_min as u8, self_max as u8));
                other_min = self_max + 1;
                (self_min, self_max) = get(&self.ranges, i);
            } else if other_max < self_max {
                j += 1;
                both.push((other_min as u8, other_max as u8));
                self_min = other_max + 1;
                (other_min, other_max) = get(&other.ranges, j);
            } else {
                i += 1;
                j += 1;
                both.push((self_min as u8, self_max as u8));
                (self_min, self_max) = get(&self.ranges, i);
                (other_min, other_max) = get(&other.ranges, j);
            }
        }

        (
            CharSet { ranges: only_self },
            CharSet { ranges: only_other },
            CharSet { ranges: both },
        )
    }
}

impl Display for CharSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.ranges.len() == 1 && self.ranges[0].0 == self.ranges[0].1 {
            return write!(f, "{}", self.ranges[0].0);
        }
        write!(f, "[")?;
        for (idx, (lo, hi)) in self.ranges.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            if lo == hi {
                write!(f, "{lo}")?;
            } else {
                write!(f, "{lo}-{hi}")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_ranges() -> impl Strategy<Value = Vec<(u8, u8)>> {
        prop::collection::vec(
            (0..=MAX_CHAR, 0..=MAX_CHAR).prop_map(|(a, b)| (a.min(b), a.max(b))),
            0..8,
        )
    }

    fn arb_charset() -> impl Strategy<Value = CharSet> {
        arb_ranges().prop_map(|ranges| CharSet::from_ranges(ranges, false))
    }

    #[test]
    fn epsilon_is_empty() {
        assert!(CharSet::epsilon().is_epsilon());
        assert!(!CharSet::full().is_epsilon());
    }

    #[test]
    fn union_merges_touching_ranges() {
        let a = CharSet::from_ranges([(0, 2)], false);
        let b = CharSet::from_ranges([(3, 5)], false);
        assert_eq!(a.union(&b), CharSet::from_ranges([(0, 5)], false));
    }

    #[test]
    fn inverted_excludes_only_listed_chars() {
        let excl = CharSet::from_ranges([(b'a', b'a'), (b'b', b'b'), (b'c', b'c')], true);
        assert!(!excl.contains(b'a'));
        assert!(!excl.contains(b'b'));
        assert!(!excl.contains(b'c'));
        assert!(excl.contains(b'd'));
        assert!(excl.contains(0));
        assert!(excl.contains(MAX_CHAR));
    }

    #[test]
    fn intersect_self_is_epsilon_epsilon_self() {
        let a = CharSet::from_ranges([(5, 10), (20, 30)], false);
        let (only_a, only_b, both) = a.intersect(&a);
        assert!(only_a.is_epsilon());
        assert!(only_b.is_epsilon());
        assert_eq!(both, a);
    }

    #[test]
    fn union_with_epsilon_is_identity() {
        let a = CharSet::from_ranges([(5, 10), (20, 30)], false);
        assert_eq!(a.union(&CharSet::epsilon()), a);
    }

    proptest! {
        #[test]
        fn intersect_partitions_recombine(a in arb_charset(), b in arb_charset()) {
            let (only_a, only_b, both) = a.intersect(&b);
            prop_assert_eq!(only_a.union(&both), a.clone());
            prop_assert_eq!(only_b.union(&both), b.clone());
            for c in MIN_CHAR..=MAX_CHAR {
                let in_a = only_a.contains(c) as u8 + both.contains(c) as u8;
                let in_b = only_b.contains(c) as u8 + both.contains(c) as u8;
                prop_assert!(in_a <= 1);
                prop_assert!(in_b <= 1);
                prop_assert_eq!(only_a.contains(c), a.contains(c) && !b.contains(c));
                prop_assert_eq!(only_b.contains(c), b.contains(c) && !a.contains(c));
                prop_assert_eq!(both.contains(c), a.contains(c) && b.contains(c));
            }
        }

        #[test]
        fn construction_is_canonical(ranges in arb_ranges()) {
            let once = CharSet::from_ranges(ranges.clone(), false);
            let twice = CharSet::from_ranges(once.ranges.iter().copied(), false);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn union_matches_pointwise_membership(a in arb_charset(), b in arb_charset()) {
            let u = a.union(&b);
            for c in MIN_CHAR..=MAX_CHAR {
                prop_assert_eq!(u.contains(c), a.contains(c) || b.contains(c));
            }
        }
    }
}
