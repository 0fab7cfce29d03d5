//! IBM Model 1: EM over the lexical table P(target | source-or-null).

use core::iter::once;

use crate::alignment::{best_log_score, decode, Aligner, Alignment};
use crate::error::Result;
use crate::params::LexicalTable;
use crate::table::SparseJointTable;
use crate::text::{Corpus, SentencePair, Vocabulary};
use crate::train::{renormalize, run_em, IterationReport, TrainOptions, TrainingSummary, ZeroCounts};
use crate::types::*;

#[derive(Clone, Debug)]
pub struct Model1Trainer {
    options: TrainOptions,
}

impl Default for Model1Trainer {
    fn default() -> Self {
        Model1Trainer { options: TrainOptions::model1() }
    }
}

impl Model1Trainer {
    pub fn new(options: TrainOptions) -> Self {
        Model1Trainer { options }
    }

    pub fn options(&self) -> &TrainOptions {
        &self.options
    }

    pub fn train(&self, pairs: &[SentencePair]) -> Result<Model1> {
        self.train_with(pairs, |_| {})
    }

    /// Like [`train`](Self::train), calling `observer` after every iteration.
    pub fn train_with<F>(&self, pairs: &[SentencePair], observer: F) -> Result<Model1>
    where
        F: FnMut(&IterationReport),
    {
        self.options.validate()?;
        let corpus = Corpus::encode(pairs, Vocabulary::new(), Vocabulary::new())?;
        let mut probs = seed_lexical(&corpus);

        let summary = run_em(
            "model1",
            &self.options,
            |iteration| {
                let counts = expected_counts(&corpus, &probs);
                let stats = renormalize(&mut probs, counts, ZeroCounts::Keep);
                IterationReport {
                    iteration,
                    log_likelihood: log_likelihood(&corpus, &probs),
                    max_delta: stats.max_delta,
                    degenerate_rows: stats.degenerate_rows,
                }
            },
            observer,
        );

        let Corpus { source_vocab, target_vocab, .. } = corpus;
        Ok(Model1 {
            lexical: LexicalTable::new(source_vocab, target_vocab, probs),
            summary,
        })
    }
}

/// Every co-occurring (source, target) pair, plus (null, target) for every
/// target, starts with the same weight.
pub(crate) fn seed_lexical(corpus: &Corpus) -> SparseJointTable<Token, Token> {
    let mut probs = SparseJointTable::new();
    for pair in &corpus.pairs {
        for &t in &pair.target.tokens {
            for &s in once(&NULL_TOKEN).chain(pair.source.tokens.iter()) {
                probs.set(s, t, SEED_WEIGHT);
            }
        }
    }
    probs
}

// E-step: posterior of each source (and null) generating each target word
fn expected_counts(
    corpus: &Corpus,
    probs: &SparseJointTable<Token, Token>,
) -> SparseJointTable<Token, Token> {
    let mut counts = SparseJointTable::new();
    for pair in &corpus.pairs {
        let src = &pair.source.tokens;
        for &t in &pair.target.tokens {
            let denom: Prob = once(&NULL_TOKEN).chain(src.iter()).map(|s| probs.get(s, &t)).sum();
            let usable = usable_denominator(denom);
            for &s in once(&NULL_TOKEN).chain(src.iter()) {
                let r = if usable { probs.get(&s, &t) / denom } else { 0.0 };
                counts.increment(s, t, r);
            }
        }
    }
    counts
}

fn log_likelihood(corpus: &Corpus, probs: &SparseJointTable<Token, Token>) -> f64 {
    corpus
        .pairs
        .iter()
        .map(|pair| {
            let src = &pair.source.tokens;
            let tgt = &pair.target.tokens;
            best_log_score(src.len(), tgt.len(), |i, j| {
                let s = i.map_or(NULL_TOKEN, |i| src[i]);
                probs.get(&s, &tgt[j])
            })
        })
        .sum()
}

/// A trained Model 1.
#[derive(Clone, Debug)]
pub struct Model1 {
    lexical: LexicalTable,
    summary: TrainingSummary,
}

impl Model1 {
    pub fn lexical(&self) -> &LexicalTable {
        &self.lexical
    }

    pub fn into_lexical(self) -> LexicalTable {
        self.lexical
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }
}

impl Aligner for Model1 {
    fn align(&self, pair: &SentencePair) -> Alignment {
        let lex = &self.lexical;
        let src = lex.source_vocab().lookup_all(pair.source());
        let tgt = lex.target_vocab().lookup_all(pair.target());
        decode(src.len(), tgt.len(), |i, j| {
            let s = match i {
                None => Some(NULL_TOKEN),
                Some(i) => src[i],
            };
            match (s, tgt[j]) {
                (Some(s), Some(t)) => lex.prob_ids(s, t),
                _ => 0.0,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(source: &[&str], target: &[&str]) -> SentencePair {
        SentencePair::new(source.iter().copied(), target.iter().copied())
    }

    fn assert_rows_normalized(lex: &LexicalTable) {
        let table = lex.table();
        for s in table.keys_of1() {
            let sum = table.row_sum(s);
            assert!((sum - 1.0).abs() < 1e-9, "row {s} sums to {sum}");
        }
    }

    #[test]
    fn seeding_covers_null_and_cooccurrences() {
        let corpus = Corpus::encode(
            &[pair(&["le", "chat"], &["the", "cat"])],
            Vocabulary::new(),
            Vocabulary::new(),
        )
        .unwrap();
        let seeded = seed_lexical(&corpus);
        assert_eq!(seeded.len(), 6);
        assert!(seeded.iter().all(|(_, _, p)| p == SEED_WEIGHT));
    }

    #[test]
    fn single_pair_stays_symmetric() {
        // Every source (and null) explains both targets equally, so nothing
        // beats the null baseline.
        let corpus = vec![pair(&["le", "chat"], &["the", "cat"])];
        let model = Model1Trainer::default().train(&corpus).unwrap();
        let lex = model.lexical();
        assert!((lex.prob(Some("le"), "the") - 0.5).abs() < 1e-12);
        assert!((lex.prob(Some("chat"), "the") - lex.prob(None, "the")).abs() < 1e-12);
        assert!(model.align(&corpus[0]).is_empty());
        assert!(model.summary().converged);
        assert_rows_normalized(lex);
    }

    fn three_pairs() -> Vec<SentencePair> {
        vec![
            pair(&["le", "chat"], &["the", "cat"]),
            pair(&["le", "chien"], &["the", "dog"]),
            pair(&["un", "chat"], &["a", "cat"]),
        ]
    }

    #[test]
    fn learns_unambiguous_translations() {
        let corpus = three_pairs();
        let model = Model1Trainer::default().train(&corpus).unwrap();
        let a = model.align(&corpus[0]);
        assert_eq!(a.source_for(0), Some(0));
        assert_eq!(a.source_for(1), Some(1));
        assert_rows_normalized(model.lexical());
    }

    #[test]
    fn unambiguous_source_beats_ambiguous_one() {
        let corpus = vec![
            pair(&["le"], &["the"]),
            pair(&["le"], &["a"]),
            pair(&["chat"], &["cat"]),
        ];
        let model = Model1Trainer::default().train(&corpus).unwrap();
        let lex = model.lexical();
        let cat = lex.prob(Some("chat"), "cat");
        assert!(cat > lex.prob(Some("le"), "the"));
        assert!(cat > lex.prob(Some("le"), "a"));
        assert_rows_normalized(lex);
    }

    #[test]
    fn unseen_target_is_left_unaligned() {
        let model = Model1Trainer::default().train(&three_pairs()).unwrap();
        let a = model.align(&pair(&["le", "chat"], &["the", "zebra"]));
        assert_eq!(a.source_for(0), Some(0));
        assert_eq!(a.source_for(1), None);
        assert_eq!(a.target_len(), 2);
    }

    #[test]
    fn decoding_is_deterministic() {
        let corpus = three_pairs();
        let model = Model1Trainer::default().train(&corpus).unwrap();
        for p in &corpus {
            assert_eq!(model.align(p), model.align(p));
        }
    }

    #[test]
    fn observer_sees_every_iteration() {
        let corpus = vec![pair(&["le", "chat"], &["the", "cat"]), pair(&["le"], &["the"])];
        let mut reports = Vec::new();
        let model = Model1Trainer::new(TrainOptions::model1().with_max_iterations(3))
            .train_with(&corpus, |r| reports.push(r.clone()))
            .unwrap();
        assert_eq!(reports, model.summary().history);
        assert!(!reports.is_empty() && reports.len() <= 3);
        assert!(reports.iter().enumerate().all(|(k, r)| r.iteration == k));
    }

    #[test]
    fn empty_sides_are_harmless() {
        let corpus = vec![pair(&[], &["the"]), pair(&["le"], &[]), pair(&["le"], &["the"])];
        let model = Model1Trainer::default().train(&corpus).unwrap();
        assert_rows_normalized(model.lexical());
        assert!(model.align(&corpus[1]).is_empty());
        assert_eq!(model.align(&corpus[0]).target_len(), 1);
    }
}
