//! IBM Model 1: lexical translation only, all alignments equally likely.

use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::counts::Counts;
use crate::tables::TranslationTable;
use crate::text::Corpus;
use crate::types::*;

#[derive(Clone, Debug, Default)]
pub struct Model1 {
    pub translation: TranslationTable,
}

impl Model1 {
    /// Uniform `t(t | s) = 1 / |target vocabulary|` for every target word.
    pub fn new(corpus: &Corpus) -> Self {
        let mut translation = TranslationTable::new();
        let n = corpus.target_vocab.len();
        if n > 0 {
            let initial_prob = 1.0 / n as Prob;
            if initial_prob < MIN_PROB {
                warn!(vocabulary = n, "target vocabulary too large for uniform initialization");
            }
            for (t, _) in corpus.target_vocab.iter() {
                translation.reset_row(t, initial_prob);
            }
        }
        Model1 { translation }
    }

    pub fn fit(corpus: &Corpus, iterations: usize) -> Self {
        let mut model = Model1::new(corpus);
        for it in 0..iterations {
            model.train(corpus);
            debug!(iteration = it + 1, "model 1 pass done");
        }
        model
    }

    pub fn train(&mut self, corpus: &Corpus) {
        let mut counts = Counts::new();
        for pair in &corpus.pairs {
            let src: Vec<Token> = core::iter::once(NULL).chain(pair.source.iter().copied()).collect();

            // normalization per target word, summed over its occurrences
            let mut total: HashMap<Token, Prob> = HashMap::new();
            for &t in &pair.target {
                for s in &src {
                    *total.entry(t).or_insert(0.0) += self.translation.get_or_floor(&t, s);
                }
            }

            for &t in &pair.target {
                for &s in &src {
                    let count = self.translation.get_or_floor(&t, &s);
                    counts.update_lexical_translation(count / total[&t], t, s);
                }
            }
        }
        counts.maximize_lexical_translation(&mut self.translation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        let mut c = Corpus::new();
        c.push(&["the", "house"], &["das", "haus"]);
        c.push(&["the", "book"], &["das", "buch"]);
        c.push(&["a", "book"], &["ein", "buch"]);
        c
    }

    #[test]
    fn uniform_start() {
        let c = corpus();
        let m = Model1::new(&c);
        let das = c.target_vocab.token("das").unwrap();
        let book = c.source_vocab.token("book").unwrap();
        assert_eq!(m.translation.get_or_floor(&das, &book), 0.25);
        assert_eq!(m.translation.get_or_floor(&das, &NULL), 0.25);
    }

    #[test]
    fn training_prefers_cooccurring_words() {
        let c = corpus();
        let m = Model1::fit(&c, 10);
        let t = |w: &str| c.target_vocab.token(w).unwrap();
        let s = |w: &str| c.source_vocab.token(w).unwrap();
        assert!(m.translation.get_or_floor(&t("buch"), &s("book")) > m.translation.get_or_floor(&t("das"), &s("book")));
        assert!(m.translation.get_or_floor(&t("das"), &s("the")) > m.translation.get_or_floor(&t("haus"), &s("the")));
    }
}
