//! IBM Model 3: adds fertility, NULL insertion and an absolute distortion
//! table `d(j | i, l, m)`. Only used to seed Model 4.

use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::alignment::AlignmentInfo;
use crate::counts::Counts;
use crate::ibm2::Model2;
use crate::sampler::{AlignmentScorer, Sampler};
use crate::table::ProbTable;
use crate::tables::ProbabilityTables;
use crate::text::Corpus;
use crate::types::*;

/// `distortion[j][(i, l, m)]`: P(j | i, l, m).
pub type DistortionTable = ProbTable<usize, (usize, usize, usize)>;

#[derive(Debug, Clone, Default)]
struct Model3Counts {
    base: Counts,
    /// `(j, i, l, m)` -> count
    distortion: HashMap<(usize, usize, usize, usize), Prob>,
    /// `(i, l, m)` -> count
    distortion_for_any_j: HashMap<(usize, usize, usize), Prob>,
}

impl Model3Counts {
    fn update_distortion(&mut self, count: Prob, info: &AlignmentInfo, j: usize, l: usize, m: usize) {
        let i = info.alignment[j];
        *self.distortion.entry((j, i, l, m)).or_insert(0.0) += count;
        *self.distortion_for_any_j.entry((i, l, m)).or_insert(0.0) += count;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Model3 {
    /// Translation, alignment, fertility and p1. The Model 4 distortion
    /// tables stay empty.
    pub tables: ProbabilityTables,
    pub distortion: DistortionTable,
}

impl Model3 {
    /// Starts from Model 2's translation and alignment tables, a uniform
    /// distortion table and the GIZA++ fertility defaults.
    pub fn new(corpus: &Corpus, model2: Model2) -> Self {
        let mut tables = ProbabilityTables {
            translation: model2.translation,
            alignment: model2.alignment,
            ..ProbabilityTables::default()
        };

        let mut distortion = DistortionTable::new();
        let mut shapes = HashSet::new();
        for pair in &corpus.pairs {
            let l = pair.source.len();
            let m = pair.target.len();
            if m == 0 || !shapes.insert((l, m)) {
                continue;
            }
            let initial_prob = 1.0 / m as Prob;
            if initial_prob < MIN_PROB {
                warn!(length = m, "target sentence too long for uniform distortion");
            }
            for j in 1..=m {
                for i in 0..=l {
                    distortion.insert(j, (i, l, m), initial_prob);
                }
            }
        }

        tables.fertility.reset_row(0, 0.2);
        tables.fertility.reset_row(1, 0.65);
        tables.fertility.reset_row(2, 0.1);
        tables.fertility.reset_row(3, 0.04);
        let initial_fert_prob = 0.01 / (MAX_FERTILITY - 4) as Prob;
        for phi in 4..MAX_FERTILITY {
            tables.fertility.reset_row(phi, initial_fert_prob);
        }
        tables.p1 = 0.5;

        Model3 { tables, distortion }
    }

    pub fn fit<S: Sampler + ?Sized>(corpus: &mut Corpus, iterations: usize, sampler: &S) -> Self {
        let model2 = Model2::fit(corpus, iterations);
        let mut model = Model3::new(corpus, model2);
        for it in 0..iterations {
            model.train(corpus, sampler);
            debug!(iteration = it + 1, p1 = model.tables.p1, "model 3 pass done");
        }
        model
    }

    pub fn train<S: Sampler + ?Sized>(&mut self, corpus: &mut Corpus, sampler: &S) {
        let mut counts = Model3Counts::default();
        for pair in corpus.pairs.iter_mut() {
            let l = pair.source.len();
            let m = pair.target.len();

            let sample = sampler.sample(pair, &*self);
            pair.alignment = Some(sample.best.zero_indexed_alignment());

            let total_count: Prob = sample.alignments.iter().map(|a| self.prob_t_a_given_s(a)).sum();
            if total_count <= 0.0 {
                continue;
            }

            for info in &sample.alignments {
                let normalized_count = self.prob_t_a_given_s(info) / total_count;
                for j in 1..=m {
                    counts.base.update_lexical_translation_at(normalized_count, info, j);
                    counts.update_distortion(normalized_count, info, j, l, m);
                }
                counts.base.update_null_generation(normalized_count, info);
                counts.base.update_fertility(normalized_count, info);
            }
        }

        // alignment table is not retrained
        self.tables = self.tables.reset_keeping_alignment();
        self.distortion = DistortionTable::new();

        counts.base.maximize_lexical_translation(&mut self.tables.translation);
        for (&(j, i, l, m), &count) in &counts.distortion {
            let estimate = count / counts.distortion_for_any_j[&(i, l, m)];
            self.distortion.insert(j, (i, l, m), clamp_floor(estimate));
        }
        counts.base.maximize_fertility(&mut self.tables.fertility);
        if let Some(p1) = counts.base.maximize_null_generation() {
            self.tables.p1 = p1;
        }
    }

    pub fn prob_t_a_given_s(&self, info: &AlignmentInfo) -> Prob {
        let l = info.l();
        let m = info.m();
        let p1 = self.tables.p1;
        let p0 = self.tables.p0();

        let null_fertility = info.fertility_of_i(0);
        let mut probability = p1.powi(null_fertility as i32) * p0.powi(m as i32 - 2 * null_fertility as i32);
        if probability < MIN_PROB {
            return MIN_PROB;
        }

        // (m - null_fertility) choose null_fertility
        for k in 1..=null_fertility {
            probability *= (m as Prob - null_fertility as Prob - k as Prob + 1.0) / k as Prob;
            if probability < MIN_PROB {
                return MIN_PROB;
            }
        }

        for i in 1..=l {
            let fertility = info.fertility_of_i(i);
            probability *= factorial(fertility) * self.tables.fertility.get_or_floor(&fertility, &info.src_sentence[i]);
            if probability < MIN_PROB {
                return MIN_PROB;
            }
        }

        for j in 1..=m {
            let t = info.trg_sentence[j];
            let i = info.alignment[j];
            let s = info.src_sentence[i];
            probability *= self.tables.translation.get_or_floor(&t, &s) * self.distortion.get_or_floor(&j, &(i, l, m));
            if probability < MIN_PROB {
                return MIN_PROB;
            }
        }

        probability
    }

    pub fn into_tables(self) -> ProbabilityTables {
        self.tables
    }
}

impl AlignmentScorer for Model3 {
    fn tables(&self) -> &ProbabilityTables {
        &self.tables
    }

    fn prob_t_a_given_s(&self, info: &AlignmentInfo) -> Prob {
        Model3::prob_t_a_given_s(self, info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::HillClimbSampler;

    fn corpus() -> Corpus {
        let mut c = Corpus::new();
        c.push(&["the", "house"], &["das", "haus"]);
        c.push(&["the", "book"], &["das", "buch"]);
        c.push(&["a", "book"], &["ein", "buch"]);
        c
    }

    #[test]
    fn seeded_defaults() {
        let c = corpus();
        let m = Model3::new(&c, Model2::new(&c, Default::default()));
        let book = c.source_vocab.token("book").unwrap();
        assert_eq!(m.tables.fertility.get_or_floor(&1, &book), 0.65);
        assert_eq!(m.tables.fertility.get_or_floor(&5, &book), 0.01 / 6.0);
        assert_eq!(m.tables.fertility.get_or_floor(&MAX_FERTILITY, &book), MIN_PROB);
        assert_eq!(m.distortion.get_or_floor(&2, &(0, 2, 2)), 0.5);
        assert_eq!(m.tables.p1, 0.5);
    }

    #[test]
    fn training_learns_one_to_one_fertility() {
        let mut c = corpus();
        let m = Model3::fit(&mut c, 3, &HillClimbSampler::new());
        let book = c.source_vocab.token("book").unwrap();
        assert!(m.tables.fertility.get_or_floor(&1, &book) > 0.5);
        assert!(m.tables.p1 + m.tables.p0() == 1.0);
        // every sentence got a best alignment recorded
        assert!(c.pairs.iter().all(|p| p.alignment.as_ref().map(|a| a.len()) == Some(2)));
    }

    #[test]
    fn null_insertion_underflow_returns_floor() {
        let c = corpus();
        let mut m = Model3::new(&c, Model2::new(&c, Default::default()));
        m.tables.p1 = 1e-9;
        let (src, trg) = AlignmentInfo::sentences(&c.pairs[0]);
        // both words generated by NULL
        let a = AlignmentInfo::new(vec![0, 0, 0], src, trg);
        assert_eq!(m.prob_t_a_given_s(&a), MIN_PROB);
    }
}
