//! Language model variants.
//!
//! Every variant implements [`LanguageModel`]. Only `unmasked_score` differs
//! between them; masking, log scores and the aggregate metrics are shared.
//!
//! - [`Mle`]: relative frequency, 0 for contexts never seen.
//! - [`Lidstone`]: additive smoothing with a fixed `gamma`; [`Lidstone::laplace`]
//!   builds the add-one case.
//! - [`InterpolatedLanguageModel`]: recursive back-off driven by a
//!   [`Smoothing`] estimator (Witten-Bell or Kneser-Ney).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::counter::{FreqDist, NgramCounter};
use crate::error::{LmError, Result};
use crate::smoothing::{Estimator, Smoothing, SmoothingParams, SmoothingScheme};
use crate::vocabulary::Vocabulary;

/// `log2(score)`, with a zero score mapped to negative infinity.
pub fn log_base2(score: f64) -> f64 {
    if score == 0.0 {
        f64::NEG_INFINITY
    } else {
        score.log2()
    }
}

/// Scoring interface shared by all model variants.
///
/// Implementations are immutable once built, so a model can be shared across
/// threads and queried concurrently.
pub trait LanguageModel {
    /// Highest n-gram order the model conditions on.
    fn order(&self) -> usize;

    fn vocab(&self) -> &Vocabulary;

    fn counts(&self) -> &NgramCounter;

    /// Variant-specific probability of `word` after `context`, with no
    /// unknown-word masking. An empty context is the unigram case.
    fn unmasked_score(&self, word: &str, context: &[&str]) -> f64;

    fn context_counts(&self, context: &[&str]) -> &FreqDist {
        self.counts().context_counts(context)
    }

    /// Mask `word` and `context` through the vocabulary, keep the last
    /// `order - 1` context tokens and score.
    fn score(&self, word: &str, context: &[&str]) -> f64 {
        let vocab = self.vocab();
        let keep = self.order().saturating_sub(1);
        let context = &context[context.len().saturating_sub(keep)..];
        let masked: Vec<&str> = context.iter().map(|w| vocab.lookup(w)).collect();
        self.unmasked_score(vocab.lookup(word), &masked)
    }

    /// `log2` of [`score`](Self::score); `-inf` when the score is 0.
    fn logscore(&self, word: &str, context: &[&str]) -> f64 {
        log_base2(self.score(word, context))
    }

    /// Negative mean log score of each n-gram's last token given the rest.
    /// Empty input has entropy 0.
    fn entropy(&self, ngrams: &[Vec<String>]) -> f64 {
        let mut total = 0.0;
        let mut n = 0usize;
        for ngram in ngrams {
            let Some((word, context)) = ngram.split_last() else {
                continue;
            };
            let context: Vec<&str> = context.iter().map(String::as_str).collect();
            let ls = self.logscore(word, &context);
            if ls == f64::NEG_INFINITY {
                warn!(word = %word, context = ?context, "zero-probability n-gram");
            }
            total += ls;
            n += 1;
        }
        if n == 0 {
            return 0.0;
        }
        -total / n as f64
    }

    /// `2^entropy`.
    fn perplexity(&self, ngrams: &[Vec<String>]) -> f64 {
        2f64.powf(self.entropy(ngrams))
    }
}

fn check_order(order: usize) -> Result<()> {
    if order == 0 {
        return Err(LmError::invalid("order", 0.0, "model order must be at least 1"));
    }
    Ok(())
}

/// Maximum-likelihood estimator: `count(w | ctx) / N(ctx)`.
#[derive(Debug, Clone)]
pub struct Mle {
    order: usize,
    vocab: Arc<Vocabulary>,
    counts: Arc<NgramCounter>,
}

impl Mle {
    pub fn new(order: usize, vocab: Arc<Vocabulary>, counts: Arc<NgramCounter>) -> Result<Self> {
        check_order(order)?;
        debug!(order, "building MLE model");
        Ok(Self {
            order,
            vocab,
            counts,
        })
    }
}

impl LanguageModel for Mle {
    fn order(&self) -> usize {
        self.order
    }

    fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    fn counts(&self) -> &NgramCounter {
        &self.counts
    }

    fn unmasked_score(&self, word: &str, context: &[&str]) -> f64 {
        self.context_counts(context).freq(word)
    }
}

/// Additive smoothing: `(count + gamma) / (N + |V| * gamma)`.
#[derive(Debug, Clone)]
pub struct Lidstone {
    gamma: f64,
    order: usize,
    vocab: Arc<Vocabulary>,
    counts: Arc<NgramCounter>,
}

impl Lidstone {
    /// Fails with `InvalidParameter` unless `gamma` is positive and finite.
    pub fn new(
        gamma: f64,
        order: usize,
        vocab: Arc<Vocabulary>,
        counts: Arc<NgramCounter>,
    ) -> Result<Self> {
        if !(gamma > 0.0 && gamma.is_finite()) {
            return Err(LmError::invalid(
                "gamma",
                gamma,
                "additive smoothing constant must be positive",
            ));
        }
        check_order(order)?;
        debug!(order, gamma, "building Lidstone model");
        Ok(Self {
            gamma,
            order,
            vocab,
            counts,
        })
    }

    /// Add-one smoothing.
    pub fn laplace(order: usize, vocab: Arc<Vocabulary>, counts: Arc<NgramCounter>) -> Result<Self> {
        Self::new(1.0, order, vocab, counts)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl LanguageModel for Lidstone {
    fn order(&self) -> usize {
        self.order
    }

    fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    fn counts(&self) -> &NgramCounter {
        &self.counts
    }

    fn unmasked_score(&self, word: &str, context: &[&str]) -> f64 {
        let dist = self.context_counts(context);
        let num = dist.count(word) as f64 + self.gamma;
        let denom = dist.total() as f64 + self.vocab.len() as f64 * self.gamma;
        num / denom
    }
}

/// Interpolated back-off over a smoothing estimator.
///
/// `score(w, ctx) = alpha(w, ctx) + gamma(ctx) * score(w, ctx[1..])`, bottoming
/// out in the estimator's unigram score at the empty context.
#[derive(Debug, Clone)]
pub struct InterpolatedLanguageModel {
    order: usize,
    vocab: Arc<Vocabulary>,
    counts: Arc<NgramCounter>,
    estimator: Estimator,
}

impl InterpolatedLanguageModel {
    pub fn new(
        scheme: SmoothingScheme,
        order: usize,
        vocab: Arc<Vocabulary>,
        counts: Arc<NgramCounter>,
        params: SmoothingParams,
    ) -> Result<Self> {
        check_order(order)?;
        let estimator = Estimator::build(scheme, vocab.clone(), counts.clone(), params)?;
        debug!(order, scheme = %scheme, ?params, "building interpolated model");
        Ok(Self {
            order,
            vocab,
            counts,
            estimator,
        })
    }

    /// Like [`new`](Self::new) but takes the scheme by name. Unknown names
    /// fail with `TypeMismatch`.
    pub fn with_scheme_name(
        scheme: &str,
        order: usize,
        vocab: Arc<Vocabulary>,
        counts: Arc<NgramCounter>,
        params: SmoothingParams,
    ) -> Result<Self> {
        Self::new(scheme.parse()?, order, vocab, counts, params)
    }

    pub fn witten_bell(
        order: usize,
        vocab: Arc<Vocabulary>,
        counts: Arc<NgramCounter>,
    ) -> Result<Self> {
        Self::new(
            SmoothingScheme::WittenBell,
            order,
            vocab,
            counts,
            SmoothingParams::default(),
        )
    }

    pub fn kneser_ney(
        order: usize,
        vocab: Arc<Vocabulary>,
        counts: Arc<NgramCounter>,
        discount: f64,
    ) -> Result<Self> {
        Self::new(
            SmoothingScheme::KneserNey,
            order,
            vocab,
            counts,
            SmoothingParams { discount },
        )
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }
}

impl LanguageModel for InterpolatedLanguageModel {
    fn order(&self) -> usize {
        self.order
    }

    fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    fn counts(&self) -> &NgramCounter {
        &self.counts
    }

    fn unmasked_score(&self, word: &str, context: &[&str]) -> f64 {
        // Build up from the unigram floor, prepending one older token per step.
        let mut score = self.estimator.unigram_score(word);
        for start in (0..context.len()).rev() {
            let (alpha, gamma) = self.estimator.alpha_gamma(word, &context[start..]);
            score = alpha + gamma * score;
        }
        score
    }
}

/// Model variants selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Mle,
    Lidstone,
    Laplace,
    WittenBell,
    KneserNey,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Mle => "mle",
            ModelKind::Lidstone => "lidstone",
            ModelKind::Laplace => "laplace",
            ModelKind::WittenBell => "witten_bell",
            ModelKind::KneserNey => "kneser_ney",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = LmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mle" => Ok(ModelKind::Mle),
            "lidstone" => Ok(ModelKind::Lidstone),
            "laplace" => Ok(ModelKind::Laplace),
            other => match other.parse::<SmoothingScheme>() {
                Ok(SmoothingScheme::WittenBell) => Ok(ModelKind::WittenBell),
                Ok(SmoothingScheme::KneserNey) => Ok(ModelKind::KneserNey),
                Err(_) => Err(LmError::UnknownModel(s.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> (Arc<Vocabulary>, Arc<NgramCounter>) {
        let vocab = Vocabulary::from_tokens(["a", "b", "c", "a", "b", "a"], 1).unwrap();
        let mut counts = NgramCounter::new();
        counts.update([
            vec!["a"],
            vec!["b"],
            vec!["a", "b"],
            vec!["a", "b"],
            vec!["a", "b"],
            vec!["a", "c"],
        ]);
        (Arc::new(vocab), Arc::new(counts))
    }

    #[test]
    fn mle_relative_frequency() {
        let (vocab, counts) = stats();
        let lm = Mle::new(2, vocab, counts).unwrap();
        assert_eq!(lm.unmasked_score("b", &["a"]), 0.75);
        assert_eq!(lm.unmasked_score("c", &["a"]), 0.25);
        assert_eq!(lm.unmasked_score("a", &[]), 0.5);
        assert_eq!(lm.unmasked_score("b", &["c"]), 0.0);
    }

    #[test]
    fn lidstone_scenario() {
        let (vocab, counts) = stats();
        let lm = Lidstone::new(1.0, 2, vocab, counts).unwrap();
        assert_eq!(lm.score("b", &["a"]), 0.5);
        assert_eq!(lm.score("never-seen", &["a"]), 0.125);
        // unseen context: uniform over a, b, c, <UNK>
        assert_eq!(lm.score("a", &["c"]), 0.25);
    }

    #[test]
    fn lidstone_denominator_uses_vocabulary_size() {
        let vocab = Vocabulary::from_tokens(["a", "a", "b", "b", "c", "<UNK>", "<UNK>"], 2)
            .unwrap();
        // a, b and the sentinel
        assert_eq!(vocab.len(), 3);
        let lm = Lidstone::new(0.5, 2, Arc::new(vocab), Arc::new(NgramCounter::new())).unwrap();
        assert_eq!(lm.vocab().len(), 3);
        for w in ["a", "b", "<UNK>"] {
            assert_eq!(lm.unmasked_score(w, &["a"]), 0.5 / 1.5);
        }
    }

    #[test]
    fn score_masks_unknown_tokens() {
        let vocab = Arc::new(Vocabulary::from_tokens(["a", "b"], 1).unwrap());
        let mut counts = NgramCounter::new();
        counts.update([vec!["<UNK>", "b"], vec!["a", "<UNK>"]]);
        let lm = Mle::new(2, vocab, Arc::new(counts)).unwrap();
        assert_eq!(lm.score("b", &["zzz"]), 1.0);
        assert_eq!(lm.score("qqq", &["a"]), 1.0);
        assert_eq!(lm.unmasked_score("b", &["zzz"]), 0.0);
    }

    #[test]
    fn score_keeps_only_recent_context() {
        let (vocab, counts) = stats();
        let lm = Mle::new(2, vocab, counts).unwrap();
        assert_eq!(lm.score("b", &["c", "c", "a"]), lm.score("b", &["a"]));
        let unigram = Mle::new(1, lm.vocab.clone(), lm.counts.clone()).unwrap();
        assert_eq!(unigram.score("a", &["b"]), 0.5);
    }

    #[test]
    fn logscore_of_zero_is_negative_infinity() {
        let (vocab, counts) = stats();
        let lm = Mle::new(2, vocab, counts).unwrap();
        assert_eq!(lm.logscore("b", &["a"]), 0.75f64.log2());
        assert_eq!(lm.logscore("a", &["a"]), f64::NEG_INFINITY);
    }

    #[test]
    fn interpolated_recursion_matches_manual_blend() {
        let (vocab, counts) = stats();
        let lm = InterpolatedLanguageModel::kneser_ney(3, vocab, counts, 0.1).unwrap();
        let est = lm.estimator();
        let (a1, g1) = est.alpha_gamma("b", &["a"]);
        let expected = a1 + g1 * est.unigram_score("b");
        assert_eq!(lm.unmasked_score("b", &["a"]), expected);
        let (a2, g2) = est.alpha_gamma("b", &["c", "a"]);
        assert_eq!(a2, 0.0);
        assert_eq!(g2, 1.0);
        assert_eq!(lm.unmasked_score("b", &["c", "a"]), expected);
    }

    #[test]
    fn construction_validation() {
        let (vocab, counts) = stats();
        assert!(matches!(
            Lidstone::new(0.0, 2, vocab.clone(), counts.clone()),
            Err(LmError::InvalidParameter { name: "gamma", .. })
        ));
        assert!(matches!(
            Lidstone::new(-1.0, 2, vocab.clone(), counts.clone()),
            Err(LmError::InvalidParameter { name: "gamma", .. })
        ));
        for gamma in [f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Lidstone::new(gamma, 2, vocab.clone(), counts.clone()),
                Err(LmError::InvalidParameter { name: "gamma", .. })
            ));
        }
        assert!(matches!(
            Mle::new(0, vocab.clone(), counts.clone()),
            Err(LmError::InvalidParameter { name: "order", .. })
        ));
        assert!(matches!(
            InterpolatedLanguageModel::kneser_ney(2, vocab.clone(), counts.clone(), 1.5),
            Err(LmError::InvalidParameter { name: "discount", .. })
        ));
        assert!(matches!(
            InterpolatedLanguageModel::with_scheme_name(
                "absolute",
                2,
                vocab,
                counts,
                SmoothingParams::default()
            ),
            Err(LmError::TypeMismatch(_))
        ));
    }

    #[test]
    fn entropy_and_perplexity() {
        let (vocab, counts) = stats();
        let lm = Mle::new(2, vocab, counts).unwrap();
        let ngrams = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["a".to_string(), "c".to_string()],
        ];
        let expected = -(0.75f64.log2() + 0.25f64.log2()) / 2.0;
        assert!((lm.entropy(&ngrams) - expected).abs() < 1e-12);
        assert!((lm.perplexity(&ngrams) - 2f64.powf(expected)).abs() < 1e-12);
        assert_eq!(lm.entropy(&[]), 0.0);
        assert_eq!(lm.perplexity(&[]), 1.0);
        let unseen = vec![vec!["c".to_string(), "a".to_string()]];
        assert_eq!(lm.perplexity(&unseen), f64::INFINITY);
    }

    #[test]
    fn model_kind_names() {
        assert_eq!("MLE".parse::<ModelKind>().unwrap(), ModelKind::Mle);
        assert_eq!("kn".parse::<ModelKind>().unwrap(), ModelKind::KneserNey);
        assert_eq!(
            "witten-bell".parse::<ModelKind>().unwrap(),
            ModelKind::WittenBell
        );
        assert!(matches!(
            "katz".parse::<ModelKind>(),
            Err(LmError::UnknownModel(_))
        ));
    }
}
