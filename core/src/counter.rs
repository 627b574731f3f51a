//! N-gram frequency tables.
//!
//! `NgramCounter` keeps one `FreqDist` per context: the unigram distribution
//! for the empty context, and for every order n >= 2 the distribution of the
//! word that follows each (n-1)-token context.
//! Tables are filled during training and then frozen behind an `Arc`.

use ahash::AHashMap;

/// Frequency distribution of the words following one context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreqDist {
    counts: AHashMap<String, u64>,
    total: u64,
}

impl FreqDist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` occurrences of `word`.
    pub fn add(&mut self, word: &str, n: u64) {
        if n == 0 {
            return;
        }
        match self.counts.get_mut(word) {
            Some(c) => *c += n,
            None => {
                self.counts.insert(word.to_string(), n);
            }
        }
        self.total += n;
    }

    /// Count of `word` in this distribution.
    pub fn count(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Total number of tokens observed (N).
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct word types with a nonzero count (T).
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Relative frequency of `word`; 0 when the distribution is empty.
    pub fn freq(&self, word: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(word) as f64 / self.total as f64
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(w, c)| (w.as_str(), *c))
    }
}

/// One node of the context tree: the distribution of words following the
/// context spelled by the path from the root.
#[derive(Debug, Clone, Default)]
struct ContextNode {
    dist: FreqDist,
    children: AHashMap<String, ContextNode>,
}

impl ContextNode {
    fn types_at_depth(&self, depth: usize) -> usize {
        if depth == 0 {
            return self.dist.distinct();
        }
        self.children
            .values()
            .map(|c| c.types_at_depth(depth - 1))
            .sum()
    }

    /// Depth of the deepest node with a non-empty distribution.
    fn deepest(&self) -> Option<usize> {
        let below = self.children.values().filter_map(ContextNode::deepest).max();
        match below {
            Some(d) => Some(d + 1),
            None if self.dist.is_empty() => None,
            None => Some(0),
        }
    }
}

/// Counts for every order up to the longest n-gram ingested.
///
/// Contexts live in a tree keyed token by token, so a lookup walks borrowed
/// `&str` keys and never allocates. The root's distribution is the unigram
/// table.
#[derive(Debug, Clone, Default)]
pub struct NgramCounter {
    root: ContextNode,
    /// Distinct left neighbours per word, over bigram types.
    continuation: AHashMap<String, u64>,
    bigram_types: u64,
    empty: FreqDist,
}

impl NgramCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a batch of n-grams. Each n-gram's last token is the word, the
    /// tokens before it form the context. Empty n-grams are skipped.
    pub fn update<I, N, S>(&mut self, ngrams: I)
    where
        I: IntoIterator<Item = N>,
        N: AsRef<[S]>,
        S: AsRef<str>,
    {
        for ngram in ngrams {
            self.add_ngram(ngram.as_ref());
        }
    }

    fn add_ngram<S: AsRef<str>>(&mut self, ngram: &[S]) {
        let Some((word, context)) = ngram.split_last() else {
            return;
        };
        let word = word.as_ref();

        let mut node = &mut self.root;
        for tok in context {
            node = node.children.entry(tok.as_ref().to_string()).or_default();
        }
        let first_sighting = node.dist.count(word) == 0;
        node.dist.add(word, 1);

        if context.len() == 1 && first_sighting {
            *self.continuation.entry(word.to_string()).or_insert(0) += 1;
            self.bigram_types += 1;
        }
    }

    /// The unigram distribution over the whole corpus.
    pub fn unigrams(&self) -> &FreqDist {
        &self.root.dist
    }

    /// Distribution of words following `context`. The empty context yields
    /// the unigram distribution; an unseen context yields an empty one.
    pub fn context_counts<S: AsRef<str>>(&self, context: &[S]) -> &FreqDist {
        let mut node = &self.root;
        for tok in context {
            match node.children.get(tok.as_ref()) {
                Some(child) => node = child,
                None => return &self.empty,
            }
        }
        &node.dist
    }

    /// Number of distinct words `v` such that the bigram `(v, word)` was seen.
    pub fn continuation_count(&self, word: &str) -> u64 {
        self.continuation.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct bigram types, i.e. the sum of all continuation counts.
    pub fn continuation_total(&self) -> u64 {
        self.bigram_types
    }

    /// Longest n-gram order with at least one recorded n-gram (0 when empty).
    pub fn highest_order(&self) -> usize {
        self.root.deepest().map_or(0, |d| d + 1)
    }

    /// Number of distinct n-gram types of the given order.
    pub fn ngram_types(&self, order: usize) -> usize {
        match order {
            0 => 0,
            n => self.root.types_at_depth(n - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NgramCounter {
        let mut c = NgramCounter::new();
        c.update([
            vec!["a"],
            vec!["b"],
            vec!["a", "b"],
            vec!["a", "b"],
            vec!["a", "c"],
            vec!["d", "b"],
            vec!["a", "b", "c"],
        ]);
        c
    }

    #[test]
    fn context_distribution() {
        let c = sample();
        let dist = c.context_counts(&["a"]);
        assert_eq!(dist.count("b"), 2);
        assert_eq!(dist.count("c"), 1);
        assert_eq!(dist.total(), 3);
        assert_eq!(dist.distinct(), 2);
        assert!((dist.freq("b") - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_context_is_unigrams() {
        let c = sample();
        let uni = c.context_counts::<&str>(&[]);
        assert_eq!(uni.total(), 2);
        assert_eq!(uni.count("a"), 1);
    }

    #[test]
    fn unseen_context_is_empty() {
        let c = sample();
        let dist = c.context_counts(&["zzz"]);
        assert_eq!(dist.total(), 0);
        assert_eq!(dist.freq("a"), 0.0);
        // a context longer than anything counted
        assert!(c.context_counts(&["a", "b", "c", "d"]).is_empty());
    }

    #[test]
    fn continuation_counts_distinct_left_neighbours() {
        let c = sample();
        // b follows a and d
        assert_eq!(c.continuation_count("b"), 2);
        assert_eq!(c.continuation_count("c"), 1);
        assert_eq!(c.continuation_count("a"), 0);
        // (a,b) (a,c) (d,b)
        assert_eq!(c.continuation_total(), 3);
    }

    #[test]
    fn order_statistics() {
        let c = sample();
        assert_eq!(c.highest_order(), 3);
        assert_eq!(c.ngram_types(1), 2);
        assert_eq!(c.ngram_types(2), 3);
        assert_eq!(c.ngram_types(3), 1);
        assert_eq!(c.ngram_types(4), 0);
        assert!(NgramCounter::new().highest_order() == 0);
    }

    #[test]
    fn empty_ngrams_are_ignored() {
        let mut c = NgramCounter::new();
        c.update([Vec::<&str>::new()]);
        assert_eq!(c.highest_order(), 0);
        assert!(c.unigrams().is_empty());
    }

    #[test]
    fn longer_context_without_shorter_counts() {
        let mut c = NgramCounter::new();
        c.update([vec!["x", "y", "z"]]);
        // the path x -> y exists but x alone has no followers
        assert!(c.context_counts(&["x"]).is_empty());
        assert_eq!(c.context_counts(&["x", "y"]).count("z"), 1);
        assert_eq!(c.ngram_types(2), 0);
        assert_eq!(c.ngram_types(3), 1);
        assert_eq!(c.highest_order(), 3);
        assert_eq!(c.continuation_total(), 0);
    }

    #[test]
    fn lookup_accepts_owned_and_borrowed_tokens() {
        let c = sample();
        let owned = vec!["a".to_string(), "b".to_string()];
        assert_eq!(c.context_counts(owned.as_slice()).count("c"), 1);
        assert_eq!(c.context_counts(&["a", "b"]).count("c"), 1);
    }
}
