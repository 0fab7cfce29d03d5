//! IBM Model 2: lexical table plus a distortion table
//! Q(source-position-or-null | target position, source length, target length).
//!
//! A candidate link (j -> i) of target word t scores
//! `Q(i | j, l, m) * P(t | s_i)`. Conditioning on both lengths lets the
//! positional prior differ between sentence-length pairs. The lexical table
//! can be warm-started from a trained Model 1.

use core::iter::once;
use std::path::Path;

use tracing::info;

use crate::alignment::{best_log_score, decode, Aligner, Alignment};
use crate::error::{AlignError, Result};
use crate::model1::seed_lexical;
use crate::params::{source_link, Context, DistortionTable, LexicalTable};
use crate::persist::load_lexical;
use crate::table::SparseJointTable;
use crate::text::{Corpus, EncodedPair, SentencePair, Vocabulary};
use crate::train::{
    renormalize, run_em, IterationReport, TrainOptions, TrainingSummary, ZeroCounts,
};
use crate::types::*;

#[derive(Clone, Debug)]
pub struct Model2Trainer {
    options: TrainOptions,
    warm_start: Option<LexicalTable>,
}

impl Default for Model2Trainer {
    fn default() -> Self {
        Model2Trainer { options: TrainOptions::model2(), warm_start: None }
    }
}

impl Model2Trainer {
    pub fn new(options: TrainOptions) -> Self {
        Model2Trainer { options, warm_start: None }
    }

    /// Starts the lexical table from `lexical` instead of uniform weights.
    pub fn with_warm_start(mut self, lexical: LexicalTable) -> Self {
        self.warm_start = Some(lexical);
        self
    }

    /// Loads a persisted lexical table to warm-start from. Any failure is a
    /// hard error: without it the distortion updates have nothing to work on.
    pub fn with_warm_start_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let lexical = load_lexical(path).map_err(|e| AlignError::warm_start(path, e))?;
        info!(path = %path.display(), entries = lexical.table().len(), "loaded warm start");
        Ok(self.with_warm_start(lexical))
    }

    pub fn options(&self) -> &TrainOptions {
        &self.options
    }

    pub fn warm_start(&self) -> Option<&LexicalTable> {
        self.warm_start.as_ref()
    }

    pub fn train(&self, pairs: &[SentencePair]) -> Result<Model2> {
        self.train_with(pairs, |_| {})
    }

    pub fn train_with<F>(&self, pairs: &[SentencePair], observer: F) -> Result<Model2>
    where
        F: FnMut(&IterationReport),
    {
        self.options.validate()?;
        let (corpus, mut lexical) = match &self.warm_start {
            Some(warm) => {
                let corpus =
                    Corpus::encode(pairs, warm.source_vocab.clone(), warm.target_vocab.clone())?;
                (corpus, warm.probs.clone())
            }
            None => {
                let corpus = Corpus::encode(pairs, Vocabulary::new(), Vocabulary::new())?;
                let probs = seed_lexical(&corpus);
                (corpus, probs)
            }
        };
        let mut distortion = seed_distortion(&corpus);

        let summary = run_em(
            "model2",
            &self.options,
            |iteration| {
                let (lex_counts, dist_counts) = expected_counts(&corpus, &lexical, &distortion);
                let stats = renormalize(&mut lexical, lex_counts, ZeroCounts::Keep)
                    .merge(renormalize(&mut distortion, dist_counts, ZeroCounts::Drop));
                IterationReport {
                    iteration,
                    log_likelihood: log_likelihood(&corpus, &lexical, &distortion),
                    max_delta: stats.max_delta,
                    degenerate_rows: stats.degenerate_rows,
                }
            },
            observer,
        );

        let Corpus { source_vocab, target_vocab, .. } = corpus;
        Ok(Model2 {
            lexical: LexicalTable::new(source_vocab, target_vocab, lexical),
            distortion: DistortionTable { probs: distortion },
            summary,
        })
    }
}

#[inline]
fn context(pair: &EncodedPair, target_pos: usize) -> Context {
    // lengths were bounded by MAX_SENT_LEN when the corpus was encoded
    Context {
        target_pos: target_pos as Link,
        source_len: pair.source.len() as Link,
        target_len: pair.target.len() as Link,
    }
}

#[inline]
fn link(source_pos: Option<usize>) -> Link {
    source_pos.map_or(NULL_LINK, |i| i as Link)
}

/// Every observed context gives each candidate position, null included,
/// probability 1 / (source length + 1).
fn seed_distortion(corpus: &Corpus) -> SparseJointTable<Context, Link> {
    let mut probs = SparseJointTable::new();
    for pair in &corpus.pairs {
        let uniform = 1.0 / (pair.source.len() + 1) as Prob;
        for j in 0..pair.target.len() {
            let ctx = context(pair, j);
            for i in once(None).chain((0..pair.source.len()).map(Some)) {
                probs.set(ctx, link(i), uniform);
            }
        }
    }
    probs
}

fn expected_counts(
    corpus: &Corpus,
    lexical: &SparseJointTable<Token, Token>,
    distortion: &SparseJointTable<Context, Link>,
) -> (SparseJointTable<Token, Token>, SparseJointTable<Context, Link>) {
    let mut lex_counts = SparseJointTable::new();
    let mut dist_counts = SparseJointTable::new();
    let mut scores: Vec<Prob> = Vec::new();

    for pair in &corpus.pairs {
        let src = &pair.source.tokens;
        for (j, &t) in pair.target.tokens.iter().enumerate() {
            let ctx = context(pair, j);
            // scores[0] is null, scores[i + 1] is source position i
            scores.clear();
            scores.extend(
                once((NULL_TOKEN, NULL_LINK))
                    .chain(src.iter().enumerate().map(|(i, &s)| (s, i as Link)))
                    .map(|(s, l)| distortion.get(&ctx, &l) * lexical.get(&s, &t)),
            );
            let denom: Prob = scores.iter().sum();
            let usable = usable_denominator(denom);

            for (k, &score) in scores.iter().enumerate() {
                let (s, l) = match k {
                    0 => (NULL_TOKEN, NULL_LINK),
                    _ => (src[k - 1], (k - 1) as Link),
                };
                let r = if usable { score / denom } else { 0.0 };
                lex_counts.increment(s, t, r);
                dist_counts.increment(ctx, l, r);
            }
        }
    }
    (lex_counts, dist_counts)
}

fn log_likelihood(
    corpus: &Corpus,
    lexical: &SparseJointTable<Token, Token>,
    distortion: &SparseJointTable<Context, Link>,
) -> f64 {
    corpus
        .pairs
        .iter()
        .map(|pair| {
            let src = &pair.source.tokens;
            let tgt = &pair.target.tokens;
            best_log_score(src.len(), tgt.len(), |i, j| {
                let s = i.map_or(NULL_TOKEN, |i| src[i]);
                distortion.get(&context(pair, j), &link(i)) * lexical.get(&s, &tgt[j])
            })
        })
        .sum()
}

/// A trained Model 2.
#[derive(Clone, Debug)]
pub struct Model2 {
    lexical: LexicalTable,
    distortion: DistortionTable,
    summary: TrainingSummary,
}

impl Model2 {
    pub fn lexical(&self) -> &LexicalTable {
        &self.lexical
    }

    pub fn distortion(&self) -> &DistortionTable {
        &self.distortion
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    pub fn into_parts(self) -> (LexicalTable, DistortionTable) {
        (self.lexical, self.distortion)
    }
}

impl Aligner for Model2 {
    fn align(&self, pair: &SentencePair) -> Alignment {
        let lex = &self.lexical;
        let src = lex.source_vocab().lookup_all(pair.source());
        let tgt = lex.target_vocab().lookup_all(pair.target());
        let (l, m) = (src.len(), tgt.len());
        decode(l, m, |i, j| {
            let s = match i {
                None => Some(NULL_TOKEN),
                Some(i) => src[i],
            };
            let ctx = Context::new(j, l, m);
            match (s, tgt[j], ctx, source_link(i)) {
                (Some(s), Some(t), Some(ctx), Some(link)) => {
                    self.distortion.prob_at(&ctx, link) * lex.prob_ids(s, t)
                }
                _ => 0.0,
            }
        })
    }
}
