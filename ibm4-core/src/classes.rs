use hashbrown::HashMap;

use crate::error::{Error, Side};
use crate::text::{Corpus, Vocabulary};
use crate::types::*;

/// Lookup table from a word to its precomputed class id.
#[derive(Clone, Debug, Default)]
pub struct WordClassMap {
    classes: HashMap<String, Class>,
}

impl WordClassMap {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, word: &str, class: Class) {
        self.classes.insert(word.to_string(), class);
    }

    pub fn get(&self, word: &str) -> Option<Class> {
        self.classes.get(word).copied()
    }

    #[inline] pub fn len(&self) -> usize { self.classes.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.classes.is_empty() }

    /// Resolves every word of `vocab` to its class. Fails on the first word
    /// without one.
    pub fn index(&self, vocab: &Vocabulary, side: Side) -> Result<ClassIndex, Error> {
        let mut classes = vec![0; vocab.len() + 1];
        for (token, word) in vocab.iter() {
            classes[token as usize] = self
                .get(word)
                .ok_or_else(|| Error::MissingWordClass { side, word: word.to_string() })?;
        }
        Ok(ClassIndex { classes })
    }
}

impl<'a> FromIterator<(&'a str, Class)> for WordClassMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, Class)>>(iter: I) -> Self {
        let mut map = WordClassMap::new();
        for (word, class) in iter {
            map.insert(word, class);
        }
        map
    }
}

/// Dense token to class lookup, complete for one vocabulary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassIndex {
    classes: Vec<Class>,
}

impl ClassIndex {
    #[inline]
    pub fn class_of(&self, token: Token) -> Class {
        self.classes[token as usize]
    }
}

/// Source and target class indices for one corpus.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WordClasses {
    pub source: ClassIndex,
    pub target: ClassIndex,
}

impl WordClasses {
    pub fn resolve(
        corpus: &Corpus,
        source_classes: &WordClassMap,
        target_classes: &WordClassMap,
    ) -> Result<Self, Error> {
        Ok(WordClasses {
            source: source_classes.index(&corpus.source_vocab, Side::Source)?,
            target: target_classes.index(&corpus.target_vocab, Side::Target)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_resolves_every_word() {
        let mut corpus = Corpus::new();
        corpus.push(&["the", "house"], &["das", "haus"]);
        let src: WordClassMap = [("the", 0), ("house", 2)].into_iter().collect();
        let trg: WordClassMap = [("das", 0), ("haus", 1)].into_iter().collect();
        let classes = WordClasses::resolve(&corpus, &src, &trg).unwrap();
        let haus = corpus.target_vocab.token("haus").unwrap();
        let house = corpus.source_vocab.token("house").unwrap();
        assert_eq!(classes.target.class_of(haus), 1);
        assert_eq!(classes.source.class_of(house), 2);
    }

    #[test]
    fn missing_word_is_an_error() {
        let mut corpus = Corpus::new();
        corpus.push(&["the", "house"], &["das", "haus"]);
        let src: WordClassMap = [("the", 0), ("house", 2)].into_iter().collect();
        let trg: WordClassMap = [("das", 0)].into_iter().collect();
        let err = WordClasses::resolve(&corpus, &src, &trg).unwrap_err();
        assert_eq!(err, Error::MissingWordClass { side: Side::Target, word: "haus".into() });
    }
}
