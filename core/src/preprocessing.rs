//! Sentence padding and n-gram extraction used to prepare training and
//! evaluation text.

use unicode_normalization::UnicodeNormalization;

/// Left padding symbol (sentence start).
pub const BOS: &str = "<s>";
/// Right padding symbol (sentence end).
pub const EOS: &str = "</s>";

/// NFC-normalize a line and split it on whitespace.
pub fn tokenize(line: &str) -> Vec<String> {
    let normalized: String = line.nfc().collect();
    normalized.split_whitespace().map(str::to_string).collect()
}

/// Surround a sentence with `n - 1` start and end symbols.
pub fn pad_both_ends<S: AsRef<str>>(sentence: &[S], n: usize) -> Vec<String> {
    let pad = n.saturating_sub(1);
    let mut out = Vec::with_capacity(sentence.len() + 2 * pad);
    out.extend(std::iter::repeat(BOS.to_string()).take(pad));
    out.extend(sentence.iter().map(|s| s.as_ref().to_string()));
    out.extend(std::iter::repeat(EOS.to_string()).take(pad));
    out
}

/// Contiguous windows of length `n`. Empty when `n` is 0 or longer than the
/// sequence.
pub fn ngrams<S: AsRef<str>>(sequence: &[S], n: usize) -> Vec<Vec<String>> {
    if n == 0 {
        return Vec::new();
    }
    sequence
        .windows(n)
        .map(|w| w.iter().map(|s| s.as_ref().to_string()).collect())
        .collect()
}

/// Every n-gram of length `1..=max_len`, ordered by start position then by
/// length.
pub fn everygrams<S: AsRef<str>>(sequence: &[S], max_len: usize) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    for start in 0..sequence.len() {
        let longest = max_len.min(sequence.len() - start);
        for len in 1..=longest {
            out.push(
                sequence[start..start + len]
                    .iter()
                    .map(|s| s.as_ref().to_string())
                    .collect(),
            );
        }
    }
    out
}

/// Everygrams of a sentence padded for a model of the given order.
pub fn padded_everygrams<S: AsRef<str>>(order: usize, sentence: &[S]) -> Vec<Vec<String>> {
    everygrams(&pad_both_ends(sentence, order), order)
}

/// Prepare a tokenized text for training.
///
/// Returns the padded everygrams of each sentence and the flat padded token
/// stream from which a vocabulary is built.
pub fn padded_everygram_pipeline<S: AsRef<str>>(
    order: usize,
    text: &[Vec<S>],
) -> (Vec<Vec<Vec<String>>>, Vec<String>) {
    let grams = text
        .iter()
        .map(|sent| padded_everygrams(order, sent))
        .collect();
    let tokens = text
        .iter()
        .flat_map(|sent| pad_both_ends(sent, order))
        .collect();
    (grams, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_for_trigrams() {
        let padded = pad_both_ends(&["a", "b"], 3);
        assert_eq!(padded, vec!["<s>", "<s>", "a", "b", "</s>", "</s>"]);
        assert_eq!(pad_both_ends(&["a"], 1), vec!["a"]);
    }

    #[test]
    fn ngram_windows() {
        let grams = ngrams(&["a", "b", "c"], 2);
        assert_eq!(grams, vec![vec!["a", "b"], vec!["b", "c"]]);
        assert!(ngrams(&["a"], 2).is_empty());
        assert!(ngrams(&["a"], 0).is_empty());
    }

    #[test]
    fn everygrams_ordering() {
        let grams = everygrams(&["a", "b", "c"], 2);
        assert_eq!(
            grams,
            vec![
                vec!["a"],
                vec!["a", "b"],
                vec!["b"],
                vec!["b", "c"],
                vec!["c"],
            ]
        );
    }

    #[test]
    fn pipeline_pads_each_sentence() {
        let text = vec![vec!["a", "b"], vec!["c"]];
        let (grams, tokens) = padded_everygram_pipeline(2, &text);
        assert_eq!(grams.len(), 2);
        // <s> a b </s> -> 4 unigrams + 3 bigrams
        assert_eq!(grams[0].len(), 7);
        assert_eq!(
            tokens,
            vec!["<s>", "a", "b", "</s>", "<s>", "c", "</s>"]
        );
    }

    #[test]
    fn tokenize_normalizes() {
        // "e" + combining acute accent composes to U+00E9
        let toks = tokenize("  caf\u{0065}\u{0301}  au   lait ");
        assert_eq!(toks, vec!["caf\u{00e9}", "au", "lait"]);
    }
}
