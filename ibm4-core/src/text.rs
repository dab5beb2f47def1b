use hashbrown::HashMap;

use crate::classes::WordClassMap;
use crate::error::Error;
use crate::types::*;

/// Interns words to tokens. Token 0 is reserved for NULL.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    words: Vec<String>,
    ids: HashMap<String, Token>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary { words: vec![String::new()], ids: HashMap::new() }
    }
}

impl Vocabulary {
    pub fn new() -> Self { Self::default() }

    pub fn intern(&mut self, word: &str) -> Token {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.words.len() as Token;
        self.words.push(word.to_string());
        self.ids.insert(word.to_string(), id);
        id
    }

    pub fn token(&self, word: &str) -> Option<Token> {
        self.ids.get(word).copied()
    }

    /// `None` for NULL and for tokens this vocabulary never issued.
    pub fn word(&self, token: Token) -> Option<&str> {
        if token == NULL { return None; }
        self.words.get(token as usize).map(|w| w.as_str())
    }

    /// Number of real words, NULL excluded.
    #[inline] pub fn len(&self) -> usize { self.words.len() - 1 }
    #[inline] pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Every real word with its token, in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, &str)> {
        self.words.iter().enumerate().skip(1).map(|(t, w)| (t as Token, w.as_str()))
    }
}

#[derive(Clone, Debug, Default)]
pub struct SentencePair {
    pub source: Vec<Token>,
    pub target: Vec<Token>,
    /// Best alignment recorded by the latest training pass.
    pub alignment: Option<Alignment>,
}

#[derive(Clone, Debug, Default)]
pub struct Corpus {
    pub source_vocab: Vocabulary,
    pub target_vocab: Vocabulary,
    pub pairs: Vec<SentencePair>,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, source: &[&str], target: &[&str]) {
        let source = source.iter().map(|w| self.source_vocab.intern(w)).collect();
        let target = target.iter().map(|w| self.target_vocab.intern(w)).collect();
        self.pairs.push(SentencePair { source, target, alignment: None });
    }

    #[inline] pub fn len(&self) -> usize { self.pairs.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    pub fn longest_target_sentence_length(&self) -> usize {
        self.pairs.iter().map(|p| p.target.len()).max().unwrap_or(0)
    }
}

/// Reads a parallel corpus of whitespace tokenized lines. Blank lines become
/// empty sentence pairs so output stays line aligned with the input.
pub fn parse_plaintext(source: &str, target: &str) -> Result<Corpus, Error> {
    let src_lines: Vec<&str> = source.lines().collect();
    let tgt_lines: Vec<&str> = target.lines().collect();
    if src_lines.len() != tgt_lines.len() {
        return Err(Error::LengthMismatch { source: src_lines.len(), target: tgt_lines.len() });
    }
    let mut corpus = Corpus::new();
    for (s, t) in src_lines.iter().zip(tgt_lines.iter()) {
        let s: Vec<&str> = s.split_whitespace().collect();
        let t: Vec<&str> = t.split_whitespace().collect();
        corpus.push(&s, &t);
    }
    Ok(corpus)
}

/// Reads `word class` lines. Blank lines and `#` comments are skipped.
pub fn parse_word_classes(s: &str) -> Result<WordClassMap, Error> {
    let mut map = WordClassMap::new();
    for (n, line) in s.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut it = trimmed.split_whitespace();
        let word = it.next().ok_or_else(|| Error::Parse { line: n + 1, message: "missing word".into() })?;
        let class: Class = it
            .next()
            .ok_or_else(|| Error::Parse { line: n + 1, message: format!("missing class for {word:?}") })?
            .parse()
            .map_err(|_| Error::Parse { line: n + 1, message: format!("bad class for {word:?}") })?;
        if it.next().is_some() {
            return Err(Error::Parse { line: n + 1, message: "trailing fields".into() });
        }
        map.insert(word, class);
    }
    Ok(map)
}

// Moses alignment writer, one line per sentence pair, `source-target`
pub fn write_moses(corpus: &Corpus) -> String {
    let mut out = String::new();
    for pair in &corpus.pairs {
        let mut first = true;
        for &(j, i) in pair.alignment.iter().flatten() {
            if let Some(i) = i {
                if !first { out.push(' '); }
                out.push_str(&format!("{i}-{j}"));
                first = false;
            }
        }
        out.push('\n');
    }
    out
}
