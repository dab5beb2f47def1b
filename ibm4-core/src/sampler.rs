//! Sampling of the alignment space.
//!
//! There are too many alignments to score them all, so training looks only at
//! the neighbourhoods of good alignments found by hill climbing. The search
//! starts from the best Model 2 alignment and from every pegged variant of it.
//! A peg forces one target position to a given source position.

use hashbrown::HashSet;

use crate::alignment::AlignmentInfo;
use crate::tables::ProbabilityTables;
use crate::text::SentencePair;
use crate::types::*;

/// Scores alignments for the sampler. The tables must contain translation
/// and alignment probabilities for the Model 2 starting points.
pub trait AlignmentScorer {
    fn tables(&self) -> &ProbabilityTables;
    fn prob_t_a_given_s(&self, info: &AlignmentInfo) -> Prob;
}

/// Weighted candidate alignments of one sentence pair.
#[derive(Clone, Debug)]
pub struct Sample {
    /// Distinct candidates, in the order they were first found.
    pub alignments: Vec<AlignmentInfo>,
    pub best: AlignmentInfo,
    pub best_score: Prob,
}

pub trait Sampler {
    fn sample(&self, pair: &SentencePair, scorer: &dyn AlignmentScorer) -> Sample;
}

/// Target position `j` pegged to source position `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Peg {
    pub j: usize,
    pub i: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HillClimbSampler;

impl HillClimbSampler {
    pub fn new() -> Self { HillClimbSampler }

    /// Most probable alignment under the lexical and alignment tables alone.
    /// Ties go to the later source position.
    pub fn best_model2_alignment(
        &self,
        pair: &SentencePair,
        tables: &ProbabilityTables,
        peg: Option<Peg>,
    ) -> AlignmentInfo {
        let (src, trg) = AlignmentInfo::sentences(pair);
        let l = src.len() - 1;
        let m = trg.len() - 1;
        let mut alignment = vec![0; m + 1];

        for j in 1..=m {
            alignment[j] = match peg {
                Some(p) if p.j == j => p.i,
                _ => {
                    let t = trg[j];
                    let mut best_i = 0;
                    let mut max_alignment_prob = MIN_PROB;
                    for (i, s) in src.iter().enumerate() {
                        let alignment_prob = tables.translation.get_or_floor(&t, s)
                            * tables.alignment.get_or_floor(&i, &(j, l, m));
                        if alignment_prob >= max_alignment_prob {
                            max_alignment_prob = alignment_prob;
                            best_i = i;
                        }
                    }
                    best_i
                }
            };
        }

        AlignmentInfo::new(alignment, src, trg)
    }

    /// Climbs to the local maximum by moving to the best neighbour until none
    /// improves on the current alignment.
    pub fn hillclimb(
        &self,
        info: AlignmentInfo,
        scorer: &dyn AlignmentScorer,
        peg: Option<Peg>,
    ) -> (AlignmentInfo, Prob) {
        let mut alignment = info;
        let mut max_probability = scorer.prob_t_a_given_s(&alignment);

        loop {
            let mut improved = false;
            for neighbor in self.neighboring(&alignment, peg) {
                let neighbor_probability = scorer.prob_t_a_given_s(&neighbor);
                if neighbor_probability > max_probability {
                    alignment = neighbor;
                    max_probability = neighbor_probability;
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }

        (alignment, max_probability)
    }

    /// Alignments that differ by one move or one swap, leaving any pegged
    /// position alone. The input alignment itself is included.
    pub fn neighboring(&self, info: &AlignmentInfo, peg: Option<Peg>) -> Vec<AlignmentInfo> {
        let l = info.l();
        let m = info.m();
        let pegged = peg.map(|p| p.j);
        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut neighbors = Vec::new();
        let mut push = |n: AlignmentInfo| {
            if seen.insert(n.alignment.clone()) {
                neighbors.push(n);
            }
        };

        for j in (1..=m).filter(|&j| Some(j) != pegged) {
            for i in 0..=l {
                let mut n = info.clone();
                n.relink(j, i);
                push(n);
            }
        }

        for j in (1..=m).filter(|&j| Some(j) != pegged) {
            for other_j in (1..=m).filter(|&k| Some(k) != pegged && k != j) {
                let i = info.alignment[j];
                let other_i = info.alignment[other_j];
                let mut n = info.clone();
                n.relink(j, other_i);
                n.relink(other_j, i);
                push(n);
            }
        }

        neighbors
    }
}

impl Sampler for HillClimbSampler {
    fn sample(&self, pair: &SentencePair, scorer: &dyn AlignmentScorer) -> Sample {
        let tables = scorer.tables();
        let l = pair.source.len();
        let m = pair.target.len();
        let mut seen: HashSet<AlignmentInfo> = HashSet::new();
        let mut alignments = Vec::new();
        let mut gather = |neighbors: Vec<AlignmentInfo>| {
            for n in neighbors {
                if !seen.contains(&n) {
                    seen.insert(n.clone());
                    alignments.push(n);
                }
            }
        };

        let initial = self.best_model2_alignment(pair, tables, None);
        let (mut best, mut best_score) = self.hillclimb(initial, scorer, None);
        gather(self.neighboring(&best, None));

        for j in 1..=m {
            for i in 0..=l {
                let peg = Some(Peg { j, i });
                let initial = self.best_model2_alignment(pair, tables, peg);
                let (potential, score) = self.hillclimb(initial, scorer, peg);
                gather(self.neighboring(&potential, peg));
                if score > best_score {
                    best = potential;
                    best_score = score;
                }
            }
        }

        Sample { alignments, best, best_score }
    }
}
