//! lmscore-core
//!
//! N-gram language models that estimate the probability of a word given the
//! words before it, with several answers to sparsity: maximum likelihood,
//! additive (Lidstone / Laplace) smoothing, and interpolated back-off with
//! Witten-Bell or Kneser-Ney discounting.
//!
//! Public API:
//! - `Vocabulary` - known words plus an unknown-word sentinel
//! - `NgramCounter` / `FreqDist` - frozen n-gram frequency tables
//! - `LanguageModel` - scoring interface (`score`, `logscore`, `perplexity`)
//! - `Mle`, `Lidstone`, `InterpolatedLanguageModel` - model variants
//! - `WittenBell`, `KneserNey` - smoothing estimators
//! - `Config` / `Model` - TOML configuration and a trained, ready-to-score bundle
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub mod error;
pub use error::{LmError, Result};

pub mod vocabulary;
pub use vocabulary::{Vocabulary, DEFAULT_UNK_LABEL};

pub mod counter;
pub use counter::{FreqDist, NgramCounter};

pub mod preprocessing;

pub mod smoothing;
pub use smoothing::{
    Estimator, KneserNey, Smoothing, SmoothingParams, SmoothingScheme, WittenBell,
    DEFAULT_DISCOUNT,
};

pub mod models;
pub use models::{
    log_base2, InterpolatedLanguageModel, LanguageModel, Lidstone, Mle, ModelKind,
};

/// A boxed model that can be shared between scoring threads.
pub type DynModel = Box<dyn LanguageModel + Send + Sync>;

/// Model configuration.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Highest n-gram order (1 = unigram model)
    pub order: usize,

    /// One of "mle", "lidstone", "laplace", "witten_bell", "kneser_ney"
    pub model: String,

    /// Additive constant for the Lidstone model. Must be > 0.
    pub gamma: f64,

    /// Absolute discount for Kneser-Ney. Must lie in [0, 1].
    pub discount: f64,

    /// Minimum training count for a word to be in the vocabulary
    pub unk_cutoff: u64,

    /// Label that replaces out-of-vocabulary words
    pub unk_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            order: 3,
            model: ModelKind::KneserNey.as_str().to_string(),
            gamma: 1.0,
            discount: DEFAULT_DISCOUNT,
            unk_cutoff: 1,
            unk_label: DEFAULT_UNK_LABEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse the `model` field.
    pub fn model_kind(&self) -> Result<ModelKind> {
        self.model.parse()
    }

    /// Build the configured model over already-trained counts.
    pub fn build_model(&self, trained: &TrainedCounts) -> Result<DynModel> {
        let vocab = trained.vocab.clone();
        let counts = trained.counts.clone();
        let order = self.order;
        let lm: DynModel = match self.model_kind()? {
            ModelKind::Mle => Box::new(Mle::new(order, vocab, counts)?),
            ModelKind::Lidstone => Box::new(Lidstone::new(self.gamma, order, vocab, counts)?),
            ModelKind::Laplace => Box::new(Lidstone::laplace(order, vocab, counts)?),
            ModelKind::WittenBell => {
                Box::new(InterpolatedLanguageModel::witten_bell(order, vocab, counts)?)
            }
            ModelKind::KneserNey => Box::new(InterpolatedLanguageModel::kneser_ney(
                order,
                vocab,
                counts,
                self.discount,
            )?),
        };
        Ok(lm)
    }
}

/// Immutable snapshot produced by training: vocabulary plus n-gram counts.
#[derive(Debug, Clone)]
pub struct TrainedCounts {
    pub vocab: Arc<Vocabulary>,
    pub counts: Arc<NgramCounter>,
}

impl TrainedCounts {
    /// Count the padded everygrams of `text` up to `order`.
    ///
    /// The vocabulary is built from the padded tokens first; every token is
    /// then masked through it before counting, so rare words are counted as
    /// the unknown label.
    pub fn fit<S: AsRef<str>>(
        order: usize,
        text: &[Vec<S>],
        unk_cutoff: u64,
        unk_label: &str,
    ) -> Result<Self> {
        if order == 0 {
            return Err(LmError::invalid("order", 0.0, "model order must be at least 1"));
        }
        let (grams, tokens) = preprocessing::padded_everygram_pipeline(order, text);
        let mut vocab = Vocabulary::new(unk_cutoff, unk_label)?;
        vocab.update(&tokens);

        let mut counts = NgramCounter::new();
        for sentence in &grams {
            counts.update(sentence.iter().map(|g| vocab.lookup_seq(g)));
        }
        debug!(
            order,
            sentences = text.len(),
            vocab_size = vocab.len(),
            unigram_types = counts.ngram_types(1),
            bigram_types = counts.ngram_types(2),
            "fitted n-gram counts"
        );
        Ok(Self {
            vocab: Arc::new(vocab),
            counts: Arc::new(counts),
        })
    }
}

/// High-level handle: configuration, trained counts and the built model.
pub struct Model {
    pub config: Config,
    pub trained: TrainedCounts,
    lm: DynModel,
}

impl Model {
    /// Fit counts on a tokenized text and build the configured model.
    pub fn train<S: AsRef<str>>(config: Config, text: &[Vec<S>]) -> Result<Self> {
        let trained = TrainedCounts::fit(config.order, text, config.unk_cutoff, &config.unk_label)?;
        let lm = config.build_model(&trained)?;
        Ok(Self {
            config,
            trained,
            lm,
        })
    }

    pub fn lm(&self) -> &(dyn LanguageModel + Send + Sync) {
        self.lm.as_ref()
    }

    pub fn score(&self, word: &str, context: &[&str]) -> f64 {
        self.lm.score(word, context)
    }

    pub fn logscore(&self, word: &str, context: &[&str]) -> f64 {
        self.lm.logscore(word, context)
    }

    /// Sum of log2 scores over a padded sentence, predicting every token
    /// after the leading start symbols.
    pub fn sentence_logprob<S: AsRef<str>>(&self, sentence: &[S]) -> f64 {
        self.test_ngrams(sentence)
            .iter()
            .filter_map(|g| g.split_last())
            .map(|(word, context)| {
                let context: Vec<&str> = context.iter().map(String::as_str).collect();
                self.lm.logscore(word, &context)
            })
            .sum()
    }

    /// Entropy over the padded order-n n-grams of every sentence.
    pub fn entropy_of<S: AsRef<str>>(&self, text: &[Vec<S>]) -> f64 {
        let ngrams: Vec<Vec<String>> = text.iter().flat_map(|s| self.test_ngrams(s)).collect();
        self.lm.entropy(&ngrams)
    }

    /// Perplexity over the padded order-n n-grams of every sentence.
    pub fn perplexity_of<S: AsRef<str>>(&self, text: &[Vec<S>]) -> f64 {
        let ngrams: Vec<Vec<String>> = text.iter().flat_map(|s| self.test_ngrams(s)).collect();
        self.lm.perplexity(&ngrams)
    }

    fn test_ngrams<S: AsRef<str>>(&self, sentence: &[S]) -> Vec<Vec<String>> {
        let order = self.config.order;
        preprocessing::ngrams(&preprocessing::pad_both_ends(sentence, order), order)
    }
}
