//! Model 4 training.
//!
//! Each pass samples candidate alignments for every sentence pair, weights
//! them by their normalized Model 4 probability, and re-estimates every table
//! from the resulting counts. The alignment table learned by Model 2 is
//! carried through unchanged. All sentences of a pass read the same table
//! snapshot, so the E step can run in parallel. Every worker fills private
//! counts, and they are summed before the M step.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alignment::AlignmentInfo;
use crate::classes::{WordClassMap, WordClasses};
use crate::counts::Model4Counts;
use crate::error::Error;
use crate::model4;
use crate::sampler::{AlignmentScorer, HillClimbSampler, Sampler};
use crate::seed::{Model3Seed, SeedModel};
use crate::tables::{ProbabilityTables, SeedTables};
use crate::text::{Corpus, SentencePair};
use crate::types::*;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    /// EM passes, also used for each seeding stage.
    pub iterations: usize,
    /// Run the E step on the rayon thread pool.
    pub parallel: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions { iterations: 5, parallel: false }
    }
}

/// Non-fatal conditions noticed while setting up training.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// The uniform distortion value for a target sentence of this length
    /// falls below `MIN_PROB`. Results may be less accurate.
    SentenceTooLong { length: usize },
}

/// Uniform probability over the `2 (max_m - 1)` non-zero displacements a
/// sentence of length `max_m` allows.
pub fn uniform_distortion_probability(max_m: usize) -> (Prob, Option<Diagnostic>) {
    let initial_prob = if max_m <= 1 { MIN_PROB } else { 1.0 / (2 * (max_m - 1)) as Prob };
    if initial_prob < MIN_PROB {
        warn!(length = max_m, "a target sentence is too long, results may be less accurate");
        return (initial_prob, Some(Diagnostic::SentenceTooLong { length: max_m }));
    }
    (initial_prob, None)
}

/// Sets every displacement row in `±1..±(max_m - 1)` of both distortion
/// tables to the uniform value.
pub fn set_uniform_distortion(tables: &mut ProbabilityTables, max_m: usize) -> Option<Diagnostic> {
    let (initial_prob, diagnostic) = uniform_distortion_probability(max_m);
    for dj in 1..max_m as Displacement {
        tables.head_distortion.reset_row(dj, initial_prob);
        tables.head_distortion.reset_row(-dj, initial_prob);
        tables.non_head_distortion.reset_row(dj, initial_prob);
        tables.non_head_distortion.reset_row(-dj, initial_prob);
    }
    diagnostic
}

#[derive(Clone, Debug)]
pub struct Model4 {
    tables: ProbabilityTables,
    classes: WordClasses,
    options: TrainOptions,
    diagnostics: Vec<Diagnostic>,
}

impl Model4 {
    /// Wraps already seeded tables. No training happens here.
    pub fn new(tables: ProbabilityTables, classes: WordClasses, options: TrainOptions) -> Self {
        Model4 { tables, classes, options, diagnostics: Vec::new() }
    }

    /// Seeds the tables and runs `options.iterations` passes over `corpus`.
    ///
    /// Without `probability_tables` the tables come from IBM Model 3 and the
    /// distortion tables start uniform. Supplied tables must be complete.
    pub fn fit(
        corpus: &mut Corpus,
        source_classes: &WordClassMap,
        target_classes: &WordClassMap,
        options: TrainOptions,
        probability_tables: Option<SeedTables>,
    ) -> Result<Self, Error> {
        Self::fit_with(
            corpus,
            source_classes,
            target_classes,
            options,
            probability_tables,
            &Model3Seed::<HillClimbSampler>::default(),
            &HillClimbSampler::new(),
        )
    }

    pub fn fit_with<M, S>(
        corpus: &mut Corpus,
        source_classes: &WordClassMap,
        target_classes: &WordClassMap,
        options: TrainOptions,
        probability_tables: Option<SeedTables>,
        seed_model: &M,
        sampler: &S,
    ) -> Result<Self, Error>
    where
        M: SeedModel + ?Sized,
        S: Sampler + Sync,
    {
        let classes = WordClasses::resolve(corpus, source_classes, target_classes)?;
        let mut diagnostics = Vec::new();
        let tables = match probability_tables {
            Some(seed) => ProbabilityTables::try_from(seed)?,
            None => {
                let mut tables = seed_model.seed(corpus, options.iterations);
                debug!(p1 = tables.p1, "seeding done");
                diagnostics.extend(set_uniform_distortion(&mut tables, corpus.longest_target_sentence_length()));
                tables
            }
        };

        let mut model = Model4::new(tables, classes, options);
        model.diagnostics = diagnostics;
        for it in 0..model.options.iterations {
            model.train_with(corpus, sampler);
            info!(iteration = it + 1, p1 = model.tables.p1, "model 4 pass done");
        }
        Ok(model)
    }

    /// One EM pass with a fresh [`HillClimbSampler`]. A sampler passed to
    /// [`Model4::fit_with`] is not kept; use [`Model4::train_with`] to go on
    /// training with it.
    pub fn train(&mut self, corpus: &mut Corpus) {
        self.train_with(corpus, &HillClimbSampler::new());
    }

    /// One EM pass. Replaces every table except the alignment table and
    /// records each sentence pair's best alignment.
    pub fn train_with<S: Sampler + Sync>(&mut self, corpus: &mut Corpus, sampler: &S) {
        let counts = if self.options.parallel {
            let (counts, best) = corpus
                .pairs
                .par_iter()
                .enumerate()
                .fold(
                    || (Model4Counts::new(), Vec::new()),
                    |(mut counts, mut best), (idx, pair)| {
                        best.push((idx, self.expect(pair, sampler, &mut counts)));
                        (counts, best)
                    },
                )
                .reduce(
                    || (Model4Counts::new(), Vec::new()),
                    |(mut a, mut a_best), (b, b_best)| {
                        a.merge(b);
                        a_best.extend(b_best);
                        (a, a_best)
                    },
                );
            for (idx, alignment) in best {
                corpus.pairs[idx].alignment = Some(alignment);
            }
            counts
        } else {
            let mut counts = Model4Counts::new();
            for pair in corpus.pairs.iter_mut() {
                let best = self.expect(pair, sampler, &mut counts);
                pair.alignment = Some(best);
            }
            counts
        };

        self.tables = counts.maximize(&self.tables.alignment);
    }

    /// E step for one sentence pair. Returns its best alignment.
    fn expect<S: Sampler + ?Sized>(&self, pair: &SentencePair, sampler: &S, counts: &mut Model4Counts) -> Alignment {
        let sample = sampler.sample(pair, self);
        let scores: Vec<Prob> = sample.alignments.iter().map(|a| self.prob_t_a_given_s(a)).collect();
        let total_count: Prob = scores.iter().sum();
        if total_count > 0.0 {
            for (info, score) in sample.alignments.iter().zip(scores) {
                counts.accumulate(score / total_count, info, &self.classes);
            }
        }
        sample.best.zero_indexed_alignment()
    }

    pub fn prob_t_a_given_s(&self, info: &AlignmentInfo) -> Prob {
        model4::prob_t_a_given_s(info, &self.tables, &self.classes)
    }

    pub fn tables(&self) -> &ProbabilityTables { &self.tables }
    pub fn into_tables(self) -> ProbabilityTables { self.tables }
    pub fn classes(&self) -> &WordClasses { &self.classes }
    pub fn options(&self) -> &TrainOptions { &self.options }
    pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }

    pub fn p1(&self) -> Prob { self.tables.p1 }
    pub fn p0(&self) -> Prob { self.tables.p0() }

    /// P(t | s) by word; `None` as the source word means NULL.
    pub fn translation_prob(&self, corpus: &Corpus, t: &str, s: Option<&str>) -> Prob {
        let Some(t) = corpus.target_vocab.token(t) else { return MIN_PROB };
        let s = match s {
            None => NULL,
            Some(w) => match corpus.source_vocab.token(w) {
                Some(s) => s,
                None => return MIN_PROB,
            },
        };
        self.tables.translation.get_or_floor(&t, &s)
    }

    pub fn fertility_prob(&self, corpus: &Corpus, phi: usize, s: &str) -> Prob {
        match corpus.source_vocab.token(s) {
            Some(s) => self.tables.fertility.get_or_floor(&phi, &s),
            None => MIN_PROB,
        }
    }

    pub fn head_distortion_prob(&self, dj: Displacement, src_class: Option<Class>, trg_class: Class) -> Prob {
        self.tables.head_distortion.get_or_floor(&dj, &(src_class, trg_class))
    }

    pub fn non_head_distortion_prob(&self, dj: Displacement, trg_class: Class) -> Prob {
        self.tables.non_head_distortion.get_or_floor(&dj, &trg_class)
    }
}

impl AlignmentScorer for Model4 {
    fn tables(&self) -> &ProbabilityTables {
        &self.tables
    }

    fn prob_t_a_given_s(&self, info: &AlignmentInfo) -> Prob {
        model4::prob_t_a_given_s(info, &self.tables, &self.classes)
    }
}
