//! Train an n-gram model on a text file and evaluate it.
//!
//! Usage:
//!   cargo run -p lm_eval -- --train corpus.txt --test heldout.txt --model kneser_ney --order 3
//!   cargo run -p lm_eval -- --train corpus.txt --word sat --context "the cat" --json
//!
//! Input files hold one sentence per line, tokens separated by whitespace.

use anyhow::{Context, Result};
use clap::Parser;
use lmscore_core::{preprocessing, Config, Model};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "lm_eval")]
#[command(about = "Train an n-gram language model and score text with it")]
struct Args {
    /// Training text, one sentence per line
    #[arg(long)]
    train: PathBuf,

    /// Held-out text to compute perplexity on
    #[arg(long)]
    test: Option<PathBuf>,

    /// TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// N-gram order
    #[arg(long)]
    order: Option<usize>,

    /// mle, lidstone, laplace, witten_bell or kneser_ney
    #[arg(short, long)]
    model: Option<String>,

    /// Lidstone additive constant
    #[arg(long)]
    gamma: Option<f64>,

    /// Kneser-Ney absolute discount
    #[arg(long)]
    discount: Option<f64>,

    /// Minimum count for a word to enter the vocabulary
    #[arg(long)]
    unk_cutoff: Option<u64>,

    /// Score this single word
    #[arg(short, long)]
    word: Option<String>,

    /// Whitespace-separated context for --word
    #[arg(long, default_value = "")]
    context: String,

    /// Print a JSON report instead of plain text
    #[arg(long)]
    json: bool,

    /// Debug-level logging (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize, Debug)]
struct WordReport {
    word: String,
    context: Vec<String>,
    score: f64,
    logscore: f64,
}

#[derive(Serialize, Debug)]
struct SentenceReport {
    sentence: String,
    logprob: f64,
}

#[derive(Serialize, Debug)]
struct Report {
    model: String,
    order: usize,
    vocab_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    word: Option<WordReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sentences: Vec<SentenceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entropy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    perplexity: Option<f64>,
}

fn read_sentences(path: &Path) -> Result<Vec<Vec<String>>> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        let tokens = preprocessing::tokenize(&line);
        if !tokens.is_empty() {
            out.push(tokens);
        }
    }
    Ok(out)
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::load_toml(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(order) = args.order {
        cfg.order = order;
    }
    if let Some(model) = &args.model {
        cfg.model = model.clone();
    }
    if let Some(gamma) = args.gamma {
        cfg.gamma = gamma;
    }
    if let Some(discount) = args.discount {
        cfg.discount = discount;
    }
    if let Some(cutoff) = args.unk_cutoff {
        cfg.unk_cutoff = cutoff;
    }
    Ok(cfg)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let cfg = resolve_config(&args)?;
    let train = read_sentences(&args.train)?;
    if train.is_empty() {
        anyhow::bail!("training file {} has no sentences", args.train.display());
    }
    info!(sentences = train.len(), model = %cfg.model, order = cfg.order, "training");
    let model = Model::train(cfg, &train).context("build model")?;

    let mut report = Report {
        model: model.config.model.clone(),
        order: model.config.order,
        vocab_size: model.trained.vocab.len(),
        word: None,
        sentences: Vec::new(),
        entropy: None,
        perplexity: None,
    };

    if let Some(word) = &args.word {
        let context: Vec<&str> = args.context.split_whitespace().collect();
        report.word = Some(WordReport {
            word: word.clone(),
            context: context.iter().map(|s| s.to_string()).collect(),
            score: model.score(word, &context),
            logscore: model.logscore(word, &context),
        });
    }

    if let Some(path) = &args.test {
        let test = read_sentences(path)?;
        for sentence in &test {
            report.sentences.push(SentenceReport {
                sentence: sentence.join(" "),
                logprob: model.sentence_logprob(sentence),
            });
        }
        let entropy = model.entropy_of(&test);
        report.entropy = Some(entropy);
        report.perplexity = Some(2f64.powf(entropy));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_plain(&report);
    }
    Ok(())
}

fn print_plain(report: &Report) {
    println!(
        "model: {} (order {}, vocabulary {})",
        report.model, report.order, report.vocab_size
    );
    if let Some(w) = &report.word {
        println!(
            "P({} | {}) = {:.6}  log2 = {:.4}",
            w.word,
            w.context.join(" "),
            w.score,
            w.logscore
        );
    }
    for s in &report.sentences {
        println!("{:>10.4}  {}", s.logprob, s.sentence);
    }
    if let (Some(h), Some(ppl)) = (report.entropy, report.perplexity) {
        println!("entropy: {:.4} bits  perplexity: {:.4}", h, ppl);
    }
}
