use hashbrown::HashMap;

use crate::alignment::Alignment;
use crate::error::{AlignError, Result};
use crate::types::*;

/// Word <-> id mapping for one side of the corpus. Id 0 is the null word.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    ids: HashMap<String, Token>,
    words: Vec<String>, // words[0] is a placeholder for NULL
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary { ids: HashMap::new(), words: vec![String::new()] }
    }
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, word: &str) -> Token {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.words.len() as Token;
        self.ids.insert(word.to_string(), id);
        self.words.push(word.to_string());
        id
    }

    #[inline]
    pub fn get(&self, word: &str) -> Option<Token> {
        self.ids.get(word).copied()
    }

    /// The word behind `id`; `None` for the null word and unknown ids.
    pub fn word(&self, id: Token) -> Option<&str> {
        if id == NULL_TOKEN {
            return None;
        }
        self.words.get(id as usize).map(String::as_str)
    }

    /// Number of ids handed out, counting the reserved null id.
    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn lookup_all<S: AsRef<str>>(&self, words: &[S]) -> Vec<Option<Token>> {
        words.iter().map(|w| self.get(w.as_ref())).collect()
    }
}

/// A parallel sentence pair of raw tokens. Positions are 0-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentencePair {
    source: Vec<String>,
    target: Vec<String>,
}

impl SentencePair {
    pub fn new<S, T>(source: S, target: T) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        SentencePair {
            source: source.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
        }
    }

    pub fn source(&self) -> &[String] {
        &self.source
    }

    pub fn target(&self) -> &[String] {
        &self.target
    }
}

#[derive(Clone, Debug)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}
impl Sentence {
    #[inline] pub fn len(&self) -> usize { self.tokens.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.tokens.is_empty() }
}

#[derive(Clone, Debug)]
pub struct EncodedPair {
    pub source: Sentence,
    pub target: Sentence,
}

/// Training corpus interned against a pair of vocabularies.
#[derive(Clone, Debug)]
pub struct Corpus {
    pub source_vocab: Vocabulary,
    pub target_vocab: Vocabulary,
    pub pairs: Vec<EncodedPair>,
}

impl Corpus {
    /// Interns `pairs` on top of the given vocabularies, which lets a warm
    /// start keep the ids of an earlier model.
    pub fn encode(
        pairs: &[SentencePair],
        mut source_vocab: Vocabulary,
        mut target_vocab: Vocabulary,
    ) -> Result<Corpus> {
        let mut encoded = Vec::with_capacity(pairs.len());
        for (index, pair) in pairs.iter().enumerate() {
            check_len(index, "source", pair.source.len())?;
            check_len(index, "target", pair.target.len())?;
            let source = pair.source.iter().map(|w| source_vocab.intern(w)).collect();
            let target = pair.target.iter().map(|w| target_vocab.intern(w)).collect();
            encoded.push(EncodedPair {
                source: Sentence { tokens: source },
                target: Sentence { tokens: target },
            });
        }
        Ok(Corpus { source_vocab, target_vocab, pairs: encoded })
    }

    pub fn n_sentences(&self) -> usize {
        self.pairs.len()
    }
}

fn check_len(index: usize, side: &'static str, len: usize) -> Result<()> {
    if len > MAX_SENT_LEN {
        return Err(AlignError::SentenceTooLong { index, side, len, max: MAX_SENT_LEN });
    }
    Ok(())
}

/// One sentence per line, whitespace tokenized. Blank lines are empty sentences.
pub fn parse_plaintext(source: &str, target: &str) -> Result<Vec<SentencePair>> {
    let src: Vec<&str> = source.lines().collect();
    let tgt: Vec<&str> = target.lines().collect();
    if src.len() != tgt.len() {
        return Err(AlignError::LineCountMismatch {
            source_lines: src.len(),
            target_lines: tgt.len(),
        });
    }
    Ok(src
        .iter()
        .zip(tgt.iter())
        .map(|(s, t)| SentencePair::new(s.split_whitespace(), t.split_whitespace()))
        .collect())
}

// Moses alignment writer: "source-target" links, one line per sentence pair
pub fn write_moses(alignments: &[Alignment]) -> String {
    let mut out = String::new();
    for alignment in alignments {
        let mut first = true;
        for (j, i) in alignment.pairs() {
            if !first { out.push(' '); }
            out.push_str(&format!("{i}-{j}"));
            first = false;
        }
        out.push('\n');
    }
    out
}
