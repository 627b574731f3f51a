//! Error type shared by every fallible constructor in the crate.
//!
//! Scoring never fails: once a model is built, every `(word, context)` pair
//! yields a number. All validation therefore happens here, at construction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmError {
    /// A numeric parameter lies outside its valid domain.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The requested smoothing scheme does not provide the estimator
    /// capabilities (`unigram_score`, `alpha_gamma`) an interpolated model needs.
    #[error("`{0}` is not a smoothing scheme (expected witten_bell or kneser_ney)")]
    TypeMismatch(String),

    #[error("unknown model kind `{0}` (expected mle, lidstone, laplace, witten_bell or kneser_ney)")]
    UnknownModel(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("failed to write config: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl LmError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        LmError::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, LmError>;
