//! IBM Model 2: Model 1 plus a position based alignment table
//! `a(i | j, l, m)`.

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::counts::Counts;
use crate::ibm1::Model1;
use crate::tables::{AlignmentTable, TranslationTable};
use crate::text::Corpus;
use crate::types::*;

#[derive(Debug, Clone, Default)]
struct Model2Counts {
    base: Counts,
    /// `(i, j, l, m)` -> count
    alignment: HashMap<(usize, usize, usize, usize), Prob>,
    /// `(j, l, m)` -> count
    alignment_for_any_i: HashMap<(usize, usize, usize), Prob>,
}

impl Model2Counts {
    fn update_alignment(&mut self, count: Prob, i: usize, j: usize, l: usize, m: usize) {
        *self.alignment.entry((i, j, l, m)).or_insert(0.0) += count;
        *self.alignment_for_any_i.entry((j, l, m)).or_insert(0.0) += count;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Model2 {
    pub translation: TranslationTable,
    pub alignment: AlignmentTable,
}

impl Model2 {
    /// Takes translation probabilities from `translation` and sets
    /// `a(i | j, l, m) = 1 / (l + 1)` for every sentence shape in the corpus.
    pub fn new(corpus: &Corpus, translation: TranslationTable) -> Self {
        let mut alignment = AlignmentTable::new();
        let mut shapes = HashSet::new();
        for pair in &corpus.pairs {
            let l = pair.source.len();
            let m = pair.target.len();
            if !shapes.insert((l, m)) {
                continue;
            }
            let initial_prob = 1.0 / (l + 1) as Prob;
            for i in 0..=l {
                for j in 1..=m {
                    alignment.insert(i, (j, l, m), initial_prob);
                }
            }
        }
        Model2 { translation, alignment }
    }

    /// Model 1 runs twice as many iterations first, being the cheaper model.
    pub fn fit(corpus: &Corpus, iterations: usize) -> Self {
        let model1 = Model1::fit(corpus, 2 * iterations);
        let mut model = Model2::new(corpus, model1.translation);
        for it in 0..iterations {
            model.train(corpus);
            debug!(iteration = it + 1, "model 2 pass done");
        }
        model
    }

    #[inline]
    fn prob_alignment_point(&self, i: usize, j: usize, src: &[Token], trg: &[Token]) -> Prob {
        let l = src.len() - 1;
        let m = trg.len() - 1;
        self.translation.get_or_floor(&trg[j], &src[i]) * self.alignment.get_or_floor(&i, &(j, l, m))
    }

    pub fn train(&mut self, corpus: &Corpus) {
        let mut counts = Model2Counts::default();
        for pair in &corpus.pairs {
            let src: Vec<Token> = core::iter::once(NULL).chain(pair.source.iter().copied()).collect();
            let trg: Vec<Token> = core::iter::once(NULL).chain(pair.target.iter().copied()).collect();
            let l = pair.source.len();
            let m = pair.target.len();

            let mut total: HashMap<Token, Prob> = HashMap::new();
            for j in 1..=m {
                for i in 0..=l {
                    *total.entry(trg[j]).or_insert(0.0) += self.prob_alignment_point(i, j, &src, &trg);
                }
            }

            for j in 1..=m {
                let t = trg[j];
                for i in 0..=l {
                    let count = self.prob_alignment_point(i, j, &src, &trg);
                    let normalized_count = count / total[&t];
                    counts.base.update_lexical_translation(normalized_count, t, src[i]);
                    counts.update_alignment(normalized_count, i, j, l, m);
                }
            }
        }

        counts.base.maximize_lexical_translation(&mut self.translation);
        for (&(i, j, l, m), &count) in &counts.alignment {
            let estimate = count / counts.alignment_for_any_i[&(j, l, m)];
            self.alignment.insert(i, (j, l, m), clamp_floor(estimate));
        }
    }
}
