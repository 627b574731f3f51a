//! Smoothing estimators for interpolated back-off.
//!
//! An estimator supplies two things to the interpolation driver:
//!
//! - `unigram_score(w)`: the base distribution at the empty context;
//! - `alpha_gamma(w, ctx)`: the discounted estimate at `ctx` (alpha) and the
//!   weight given to the next-lower order (gamma).
//!
//! For a fixed context the alphas over the vocabulary sum to `1 - gamma`, so
//! `alpha + gamma * lower` stays a probability distribution whenever `lower`
//! is one.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::counter::NgramCounter;
use crate::error::{LmError, Result};
use crate::vocabulary::Vocabulary;

/// Default absolute discount for Kneser-Ney.
pub const DEFAULT_DISCOUNT: f64 = 0.1;

/// Capability pair an interpolated model needs from its estimator.
pub trait Smoothing {
    fn unigram_score(&self, word: &str) -> f64;

    /// Returns `(alpha, gamma)` for `word` following a non-empty `context`.
    fn alpha_gamma(&self, word: &str, context: &[&str]) -> (f64, f64);
}

/// Names of the available smoothing schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingScheme {
    WittenBell,
    KneserNey,
}

impl SmoothingScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmoothingScheme::WittenBell => "witten_bell",
            SmoothingScheme::KneserNey => "kneser_ney",
        }
    }
}

impl fmt::Display for SmoothingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmoothingScheme {
    type Err = LmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "witten_bell" | "wittenbell" | "wb" => Ok(SmoothingScheme::WittenBell),
            "kneser_ney" | "kneserney" | "kn" => Ok(SmoothingScheme::KneserNey),
            _ => Err(LmError::TypeMismatch(s.to_string())),
        }
    }
}

/// Optional estimator parameters. Schemes ignore the ones they don't use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    pub discount: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            discount: DEFAULT_DISCOUNT,
        }
    }
}

/// Uniform fallback used when no counts exist at the unigram floor.
fn uniform(vocab: &Vocabulary) -> f64 {
    1.0 / vocab.len() as f64
}

/// Witten-Bell: reserve mass for unseen continuations in proportion to the
/// number of distinct word types seen after the context.
#[derive(Debug, Clone)]
pub struct WittenBell {
    vocab: Arc<Vocabulary>,
    counts: Arc<NgramCounter>,
}

impl WittenBell {
    pub fn new(vocab: Arc<Vocabulary>, counts: Arc<NgramCounter>) -> Self {
        Self { vocab, counts }
    }

    /// `T / (N + T)`, or 1 for a context never seen.
    pub fn gamma(&self, context: &[&str]) -> f64 {
        let dist = self.counts.context_counts(context);
        let t = dist.distinct() as f64;
        let n = dist.total() as f64;
        if n + t > 0.0 {
            t / (n + t)
        } else {
            1.0
        }
    }
}

impl Smoothing for WittenBell {
    fn unigram_score(&self, word: &str) -> f64 {
        let unigrams = self.counts.unigrams();
        if unigrams.is_empty() {
            return uniform(&self.vocab);
        }
        unigrams.freq(word)
    }

    fn alpha_gamma(&self, word: &str, context: &[&str]) -> (f64, f64) {
        let gamma = self.gamma(context);
        let dist = self.counts.context_counts(context);
        let alpha = if dist.total() > 0 {
            (1.0 - gamma) * dist.freq(word)
        } else {
            0.0
        };
        (alpha, gamma)
    }
}

/// Interpolated Kneser-Ney: absolute discounting at every order, with a
/// continuation-count unigram at the floor.
#[derive(Debug, Clone)]
pub struct KneserNey {
    vocab: Arc<Vocabulary>,
    counts: Arc<NgramCounter>,
    discount: f64,
}

impl KneserNey {
    /// Fails with `InvalidParameter` unless `0 <= discount <= 1`. Outside that
    /// range the discounted alphas and gamma no longer sum to one.
    pub fn new(vocab: Arc<Vocabulary>, counts: Arc<NgramCounter>, discount: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&discount) {
            return Err(LmError::invalid(
                "discount",
                discount,
                "discount must lie in [0, 1]",
            ));
        }
        Ok(Self {
            vocab,
            counts,
            discount,
        })
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }
}

impl Smoothing for KneserNey {
    /// Share of distinct bigram types that end in `word`.
    fn unigram_score(&self, word: &str) -> f64 {
        let total = self.counts.continuation_total();
        if total == 0 {
            return uniform(&self.vocab);
        }
        self.counts.continuation_count(word) as f64 / total as f64
    }

    fn alpha_gamma(&self, word: &str, context: &[&str]) -> (f64, f64) {
        let dist = self.counts.context_counts(context);
        if dist.total() == 0 {
            return (0.0, 1.0);
        }
        let n = dist.total() as f64;
        let alpha = (dist.count(word) as f64 - self.discount).max(0.0) / n;
        let gamma = self.discount * dist.distinct() as f64 / n;
        (alpha, gamma)
    }
}

/// The estimator bound to an interpolated model.
#[derive(Debug, Clone)]
pub enum Estimator {
    WittenBell(WittenBell),
    KneserNey(KneserNey),
}

impl Estimator {
    /// Instantiate `scheme` over the given vocabulary and counts.
    pub fn build(
        scheme: SmoothingScheme,
        vocab: Arc<Vocabulary>,
        counts: Arc<NgramCounter>,
        params: SmoothingParams,
    ) -> Result<Self> {
        Ok(match scheme {
            SmoothingScheme::WittenBell => Estimator::WittenBell(WittenBell::new(vocab, counts)),
            SmoothingScheme::KneserNey => {
                Estimator::KneserNey(KneserNey::new(vocab, counts, params.discount)?)
            }
        })
    }

    pub fn scheme(&self) -> SmoothingScheme {
        match self {
            Estimator::WittenBell(_) => SmoothingScheme::WittenBell,
            Estimator::KneserNey(_) => SmoothingScheme::KneserNey,
        }
    }
}

impl Smoothing for Estimator {
    fn unigram_score(&self, word: &str) -> f64 {
        match self {
            Estimator::WittenBell(e) => e.unigram_score(word),
            Estimator::KneserNey(e) => e.unigram_score(word),
        }
    }

    fn alpha_gamma(&self, word: &str, context: &[&str]) -> (f64, f64) {
        match self {
            Estimator::WittenBell(e) => e.alpha_gamma(word, context),
            Estimator::KneserNey(e) => e.alpha_gamma(word, context),
        }
    }
}
