//! Weighted counts collected during the E step, and the M step that turns
//! them into probabilities.

use hashbrown::HashMap;

use crate::alignment::AlignmentInfo;
use crate::classes::WordClasses;
use crate::model4::{placement, Placement};
use crate::tables::{AlignmentTable, FertilityTable, ProbabilityTables, TranslationTable};
use crate::types::*;

fn merge_into<K: core::hash::Hash + Eq>(into: &mut HashMap<K, Prob>, from: HashMap<K, Prob>) {
    for (k, v) in from {
        *into.entry(k).or_insert(0.0) += v;
    }
}

/// Counts shared by Models 1 to 4: lexical translation, fertility and NULL
/// insertion.
#[derive(Debug, Clone, Default)]
pub struct Counts {
    /// `(t, s)` -> count
    pub t_given_s: HashMap<(Token, Token), Prob>,
    pub any_t_given_s: HashMap<Token, Prob>,
    /// `(phi, s)` -> count
    pub fertility: HashMap<(usize, Token), Prob>,
    pub fertility_for_any_phi: HashMap<Token, Prob>,
    pub p0: Prob,
    pub p1: Prob,
}

impl Counts {
    pub fn new() -> Self { Self::default() }

    #[inline]
    pub fn update_lexical_translation(&mut self, count: Prob, t: Token, s: Token) {
        *self.t_given_s.entry((t, s)).or_insert(0.0) += count;
        *self.any_t_given_s.entry(s).or_insert(0.0) += count;
    }

    #[inline]
    pub fn update_lexical_translation_at(&mut self, count: Prob, info: &AlignmentInfo, j: usize) {
        let t = info.trg_sentence[j];
        let s = info.src_sentence[info.alignment[j]];
        self.update_lexical_translation(count, t, s);
    }

    pub fn update_null_generation(&mut self, count: Prob, info: &AlignmentInfo) {
        let m = info.m() as Prob;
        let null_fertility = info.fertility_of_i(0) as Prob;
        self.p1 += null_fertility * count;
        self.p0 += (m - 2.0 * null_fertility) * count;
    }

    /// Includes the NULL position, whose fertility is counted like any word.
    pub fn update_fertility(&mut self, count: Prob, info: &AlignmentInfo) {
        for i in 0..=info.l() {
            let s = info.src_sentence[i];
            let phi = info.fertility_of_i(i);
            *self.fertility.entry((phi, s)).or_insert(0.0) += count;
            *self.fertility_for_any_phi.entry(s).or_insert(0.0) += count;
        }
    }

    pub fn merge(&mut self, other: Counts) {
        merge_into(&mut self.t_given_s, other.t_given_s);
        merge_into(&mut self.any_t_given_s, other.any_t_given_s);
        merge_into(&mut self.fertility, other.fertility);
        merge_into(&mut self.fertility_for_any_phi, other.fertility_for_any_phi);
        self.p0 += other.p0;
        self.p1 += other.p1;
    }

    pub fn maximize_lexical_translation(&self, table: &mut TranslationTable) {
        for (&(t, s), &count) in &self.t_given_s {
            let estimate = count / self.any_t_given_s[&s];
            table.insert(t, s, clamp_floor(estimate));
        }
    }

    pub fn maximize_fertility(&self, table: &mut FertilityTable) {
        for (&(phi, s), &count) in &self.fertility {
            let estimate = count / self.fertility_for_any_phi[&s];
            table.insert(phi, s, clamp_floor(estimate));
        }
    }

    /// New `p1`, kept inside `[MIN_PROB, 1 - MIN_PROB]` so that p0 never
    /// drops below the floor either. `None` when nothing was observed.
    pub fn maximize_null_generation(&self) -> Option<Prob> {
        let total = self.p1 + self.p0;
        if total <= 0.0 {
            return None;
        }
        let estimate = clamp_floor(self.p1 / total);
        Some(estimate.min(1.0 - MIN_PROB))
    }
}

/// Model 4 counts: the shared counts plus both distortion models.
#[derive(Debug, Clone, Default)]
pub struct Model4Counts {
    pub base: Counts,
    /// `(dj, previous cept class, head word class)` -> count
    pub head_distortion: HashMap<(Displacement, Option<Class>, Class), Prob>,
    pub head_distortion_for_any_dj: HashMap<(Option<Class>, Class), Prob>,
    /// `(dj, word class)` -> count
    pub non_head_distortion: HashMap<(Displacement, Class), Prob>,
    pub non_head_distortion_for_any_dj: HashMap<Class, Prob>,
}

impl Model4Counts {
    pub fn new() -> Self { Self::default() }

    pub fn update_distortion(&mut self, count: Prob, info: &AlignmentInfo, j: usize, classes: &WordClasses) {
        match placement(info, classes, j) {
            Placement::Null => {}
            Placement::Head { dj, src_class, trg_class } => {
                *self.head_distortion.entry((dj, src_class, trg_class)).or_insert(0.0) += count;
                *self.head_distortion_for_any_dj.entry((src_class, trg_class)).or_insert(0.0) += count;
            }
            Placement::NonHead { dj, trg_class } => {
                *self.non_head_distortion.entry((dj, trg_class)).or_insert(0.0) += count;
                *self.non_head_distortion_for_any_dj.entry(trg_class).or_insert(0.0) += count;
            }
        }
    }

    /// Adds one weighted candidate alignment to every count family.
    pub fn accumulate(&mut self, count: Prob, info: &AlignmentInfo, classes: &WordClasses) {
        for j in 1..=info.m() {
            self.base.update_lexical_translation_at(count, info, j);
            self.update_distortion(count, info, j, classes);
        }
        self.base.update_null_generation(count, info);
        self.base.update_fertility(count, info);
    }

    pub fn merge(&mut self, other: Model4Counts) {
        self.base.merge(other.base);
        merge_into(&mut self.head_distortion, other.head_distortion);
        merge_into(&mut self.head_distortion_for_any_dj, other.head_distortion_for_any_dj);
        merge_into(&mut self.non_head_distortion, other.non_head_distortion);
        merge_into(&mut self.non_head_distortion_for_any_dj, other.non_head_distortion_for_any_dj);
    }

    /// M step. Builds fresh tables from these counts alone; the alignment
    /// table is carried through untouched.
    pub fn maximize(&self, alignment: &AlignmentTable) -> ProbabilityTables {
        let mut tables = ProbabilityTables { alignment: alignment.clone(), ..ProbabilityTables::default() };
        self.base.maximize_lexical_translation(&mut tables.translation);
        self.maximize_distortion(&mut tables);
        self.base.maximize_fertility(&mut tables.fertility);
        if let Some(p1) = self.base.maximize_null_generation() {
            tables.p1 = p1;
        }
        tables
    }

    fn maximize_distortion(&self, tables: &mut ProbabilityTables) {
        for (&(dj, s_cls, t_cls), &count) in &self.head_distortion {
            let estimate = count / self.head_distortion_for_any_dj[&(s_cls, t_cls)];
            tables.head_distortion.insert(dj, (s_cls, t_cls), clamp_floor(estimate));
        }
        for (&(dj, t_cls), &count) in &self.non_head_distortion {
            let estimate = count / self.non_head_distortion_for_any_dj[&t_cls];
            tables.non_head_distortion.insert(dj, t_cls, clamp_floor(estimate));
        }
    }
}
