//! Vocabulary: the set of word types a model knows about.
//!
//! A word is "known" once it has been seen at least `unk_cutoff` times during
//! training. Everything else is folded into a single unknown-word sentinel
//! (`unk_label`) by [`Vocabulary::lookup`]. The sentinel always counts as one
//! entry of the vocabulary, so `len()` is never zero.

use ahash::AHashMap;

use crate::error::{LmError, Result};

/// Default label substituted for out-of-vocabulary words.
pub const DEFAULT_UNK_LABEL: &str = "<UNK>";

#[derive(Debug, Clone)]
pub struct Vocabulary {
    counts: AHashMap<String, u64>,
    /// Words at or above the cutoff, excluding the sentinel.
    known: usize,
    unk_cutoff: u64,
    unk_label: String,
}

impl Vocabulary {
    /// Create an empty vocabulary.
    ///
    /// Fails with `InvalidParameter` when `unk_cutoff` is zero: every word
    /// would then count as known, including words never seen.
    pub fn new(unk_cutoff: u64, unk_label: impl Into<String>) -> Result<Self> {
        if unk_cutoff < 1 {
            return Err(LmError::invalid(
                "unk_cutoff",
                unk_cutoff as f64,
                "cutoff must be at least 1",
            ));
        }
        Ok(Self {
            counts: AHashMap::new(),
            known: 0,
            unk_cutoff,
            unk_label: unk_label.into(),
        })
    }

    /// Build a vocabulary from a token stream with the default `<UNK>` label.
    pub fn from_tokens<I, S>(tokens: I, unk_cutoff: u64) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self::new(unk_cutoff, DEFAULT_UNK_LABEL)?;
        vocab.update(tokens);
        Ok(vocab)
    }

    /// Add more occurrences. Only meaningful while training.
    pub fn update<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tok in tokens {
            let tok = tok.as_ref();
            let count = match self.counts.get_mut(tok) {
                Some(c) => {
                    *c += 1;
                    *c
                }
                None => {
                    self.counts.insert(tok.to_string(), 1);
                    1
                }
            };
            if count == self.unk_cutoff && tok != self.unk_label {
                self.known += 1;
            }
        }
    }

    pub fn unk_label(&self) -> &str {
        &self.unk_label
    }

    /// Raw training count of a word, known or not.
    pub fn count(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// True iff `word` was seen at least `unk_cutoff` times.
    pub fn contains(&self, word: &str) -> bool {
        self.count(word) >= self.unk_cutoff
    }

    /// Number of known words plus one for the unknown sentinel.
    pub fn len(&self) -> usize {
        self.known + 1
    }

    /// Always false: the unknown sentinel is a member of every vocabulary.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Map a word to itself if known, otherwise to the unknown label.
    pub fn lookup<'a>(&'a self, word: &'a str) -> &'a str {
        if self.contains(word) {
            word
        } else {
            &self.unk_label
        }
    }

    /// Element-wise [`lookup`](Self::lookup).
    pub fn lookup_seq<'a, S: AsRef<str>>(&'a self, words: &'a [S]) -> Vec<&'a str> {
        words.iter().map(|w| self.lookup(w.as_ref())).collect()
    }

    /// Known words in sorted order, followed by the unknown label.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let mut known: Vec<&str> = self
            .known_words()
            .filter(|w| *w != self.unk_label)
            .collect();
        known.sort_unstable();
        known.into_iter().chain(std::iter::once(self.unk_label.as_str()))
    }

    fn known_words(&self) -> impl Iterator<Item = &str> {
        self.counts
            .iter()
            .filter(move |(_, c)| **c >= self.unk_cutoff)
            .map(|(w, _)| w.as_str())
    }
}
