use core::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::text::SentencePair;
use crate::types::*;

/// One fully specified alignment of a sentence pair.
///
/// Positions are 1-indexed on both sides. `src_sentence[0]` is NULL and
/// `trg_sentence[0]` / `alignment[0]` are unused, so that `alignment[j] = i`
/// reads directly. `cepts[i]` is the tablet of source position `i`, kept
/// sorted ascending.
#[derive(Clone, Debug)]
pub struct AlignmentInfo {
    pub(crate) alignment: Vec<usize>,
    pub src_sentence: Arc<[Token]>,
    pub trg_sentence: Arc<[Token]>,
    pub(crate) cepts: Vec<Vec<usize>>,
}

impl AlignmentInfo {
    /// Builds the 1-indexed sentences used by every alignment of `pair`.
    pub fn sentences(pair: &SentencePair) -> (Arc<[Token]>, Arc<[Token]>) {
        let src: Vec<Token> = core::iter::once(NULL).chain(pair.source.iter().copied()).collect();
        let trg: Vec<Token> = core::iter::once(NULL).chain(pair.target.iter().copied()).collect();
        (src.into(), trg.into())
    }

    /// `alignment[j]` for j in 1..=m; index 0 is ignored. Tablets are derived.
    pub fn new(alignment: Vec<usize>, src_sentence: Arc<[Token]>, trg_sentence: Arc<[Token]>) -> Self {
        let mut cepts = vec![Vec::new(); src_sentence.len()];
        for (j, &i) in alignment.iter().enumerate().skip(1) {
            cepts[i].push(j);
        }
        AlignmentInfo { alignment, src_sentence, trg_sentence, cepts }
    }

    /// `alignment()[j]` is the source position of target word `j`.
    #[inline] pub fn alignment(&self) -> &[usize] { &self.alignment }

    /// Tablet of every source position, NULL first.
    #[inline] pub fn cepts(&self) -> &[Vec<usize>] { &self.cepts }

    /// Source length, NULL excluded.
    #[inline] pub fn l(&self) -> usize { self.src_sentence.len() - 1 }
    /// Target length.
    #[inline] pub fn m(&self) -> usize { self.trg_sentence.len() - 1 }

    #[inline]
    pub fn fertility_of_i(&self, i: usize) -> usize {
        self.cepts[i].len()
    }

    #[inline]
    pub fn is_head_word(&self, j: usize) -> bool {
        let i = self.alignment[j];
        self.cepts[i].first() == Some(&j)
    }

    /// Ceiling of the mean position of the tablet of `i`; 0 when there is
    /// no cept.
    pub fn center_of_cept(&self, i: Option<usize>) -> usize {
        let Some(i) = i else { return 0 };
        let tablet = &self.cepts[i];
        if tablet.is_empty() {
            return 0;
        }
        let sum: usize = tablet.iter().sum();
        sum.div_ceil(tablet.len())
    }

    /// Nearest source position left of `j`'s cept with non-zero fertility.
    /// `None` if there is none, and for words aligned to NULL, which has no
    /// position.
    pub fn previous_cept(&self, j: usize) -> Option<usize> {
        let i = self.alignment[j];
        (1..i).rev().find(|&k| self.fertility_of_i(k) > 0)
    }

    /// Target position preceding `j` in its own tablet.
    pub fn previous_in_tablet(&self, j: usize) -> Option<usize> {
        let tablet = &self.cepts[self.alignment[j]];
        let pos = tablet.iter().position(|&k| k == j)?;
        if pos == 0 { None } else { Some(tablet[pos - 1]) }
    }

    /// `(j, i)` pairs shifted to 0-indexing, NULL as `None`.
    pub fn zero_indexed_alignment(&self) -> Alignment {
        (1..=self.m())
            .map(|j| (j - 1, self.alignment[j].checked_sub(1)))
            .collect()
    }

    /// Moves `j` to source position `i`, keeping tablets sorted.
    pub(crate) fn relink(&mut self, j: usize, i: usize) {
        let old_i = self.alignment[j];
        if old_i == i {
            return;
        }
        self.alignment[j] = i;
        self.cepts[old_i].retain(|&k| k != j);
        let tablet = &mut self.cepts[i];
        let pos = tablet.partition_point(|&k| k < j);
        tablet.insert(pos, j);
    }
}

impl PartialEq for AlignmentInfo {
    fn eq(&self, other: &Self) -> bool {
        self.alignment == other.alignment
    }
}

impl Eq for AlignmentInfo {}

impl Hash for AlignmentInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.alignment.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(links: &[usize], l: usize) -> AlignmentInfo {
        let src: Vec<Token> = (0..=l as Token).collect();
        let trg: Vec<Token> = (0..=links.len() as Token).collect();
        let mut alignment = vec![0];
        alignment.extend_from_slice(links);
        AlignmentInfo::new(alignment, src.into(), trg.into())
    }

    #[test]
    fn center_of_cept_takes_ceiling() {
        // tablet of source position 1 is [2, 5, 6]
        let a = info(&[0, 1, 0, 0, 1, 1], 1);
        assert_eq!(a.cepts[1], vec![2, 5, 6]);
        assert_eq!(a.center_of_cept(Some(1)), 5);
        assert_eq!(a.center_of_cept(None), 0);
    }

    #[test]
    fn heads_and_tablets() {
        // j:1->2, 2->0, 3->2, 4->3
        let a = info(&[2, 0, 2, 3], 3);
        assert_eq!(a.fertility_of_i(0), 1);
        assert_eq!(a.fertility_of_i(1), 0);
        assert_eq!(a.fertility_of_i(2), 2);
        assert!(a.is_head_word(1));
        assert!(!a.is_head_word(3));
        assert!(a.is_head_word(4));
        assert_eq!(a.previous_in_tablet(3), Some(1));
        assert_eq!(a.previous_in_tablet(1), None);
    }

    #[test]
    fn previous_cept_skips_empty_positions() {
        let a = info(&[2, 0, 2, 3], 3);
        // source 1 has no words, so the cept before 2 does not exist
        assert_eq!(a.previous_cept(1), None);
        assert_eq!(a.previous_cept(4), Some(2));
        assert_eq!(a.previous_cept(2), None);
    }

    #[test]
    fn zero_indexed_marks_null() {
        let a = info(&[1, 2, 0], 2);
        assert_eq!(a.zero_indexed_alignment(), vec![(0, Some(0)), (1, Some(1)), (2, None)]);
    }

    #[test]
    fn relink_keeps_tablets_sorted() {
        let mut a = info(&[1, 2, 1, 2], 2);
        a.relink(4, 1);
        assert_eq!(a.cepts[1], vec![1, 3, 4]);
        assert_eq!(a.cepts[2], vec![2]);
        a.relink(1, 2);
        assert_eq!(a.cepts[2], vec![1, 2]);
        assert_eq!(a, info(&[2, 2, 1, 1], 2));
    }

    #[test]
    fn accessors_agree_after_relink() {
        let mut a = info(&[1, 1, 2], 2);
        a.relink(2, 0);
        assert_eq!(a.alignment(), &[0, 1, 0, 2]);
        assert_eq!(a.cepts(), &[vec![2], vec![1], vec![3]]);
        for (j, &i) in a.alignment().iter().enumerate().skip(1) {
            assert!(a.cepts()[i].contains(&j));
        }
    }
}
