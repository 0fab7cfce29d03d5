//! Trained parameter tables.

use crate::table::SparseJointTable;
use crate::text::Vocabulary;
use crate::types::*;

/// Conditioning context of the distortion table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Context {
    pub target_pos: Link,
    pub source_len: Link,
    pub target_len: Link,
}

impl Context {
    /// `None` when a field does not fit in `Link`; such a context was never
    /// trained and scores 0.
    pub fn new(target_pos: usize, source_len: usize, target_len: usize) -> Option<Context> {
        Some(Context {
            target_pos: Link::try_from(target_pos).ok()?,
            source_len: Link::try_from(source_len).ok()?,
            target_len: Link::try_from(target_len).ok()?,
        })
    }
}

/// Distortion key for a source position, `None` being the null word.
#[inline]
pub fn source_link(source_pos: Option<usize>) -> Option<Link> {
    match source_pos {
        None => Some(NULL_LINK),
        Some(i) => Link::try_from(i).ok().filter(|&l| l != NULL_LINK),
    }
}

/// P(target | source-or-null).
#[derive(Clone, Debug, Default)]
pub struct LexicalTable {
    pub(crate) source_vocab: Vocabulary,
    pub(crate) target_vocab: Vocabulary,
    pub(crate) probs: SparseJointTable<Token, Token>,
}

impl LexicalTable {
    pub fn new(
        source_vocab: Vocabulary,
        target_vocab: Vocabulary,
        probs: SparseJointTable<Token, Token>,
    ) -> Self {
        LexicalTable { source_vocab, target_vocab, probs }
    }

    /// P(target | source); `source == None` asks about the null word. Unknown
    /// words score 0.
    pub fn prob(&self, source: Option<&str>, target: &str) -> Prob {
        let s = match source {
            None => NULL_TOKEN,
            Some(w) => match self.source_vocab.get(w) {
                Some(id) => id,
                None => return 0.0,
            },
        };
        match self.target_vocab.get(target) {
            Some(t) => self.probs.get(&s, &t),
            None => 0.0,
        }
    }

    #[inline]
    pub fn prob_ids(&self, source: Token, target: Token) -> Prob {
        self.probs.get(&source, &target)
    }

    pub fn source_vocab(&self) -> &Vocabulary {
        &self.source_vocab
    }

    pub fn target_vocab(&self) -> &Vocabulary {
        &self.target_vocab
    }

    pub fn table(&self) -> &SparseJointTable<Token, Token> {
        &self.probs
    }

    /// `(source, target, prob)` for every stored entry, the null source as `None`.
    pub fn entries(&self) -> impl Iterator<Item = (Option<&str>, &str, Prob)> + '_ {
        self.probs.iter().filter_map(move |(&s, &t, p)| {
            let target = self.target_vocab.word(t)?;
            Some((self.source_vocab.word(s), target, p))
        })
    }

    /// Builds a table from word-level entries, interning as it goes.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, &'a str, Prob)>,
    {
        let mut table = LexicalTable::default();
        for (source, target, p) in entries {
            let s = source.map_or(NULL_TOKEN, |w| table.source_vocab.intern(w));
            let t = table.target_vocab.intern(target);
            table.probs.set(s, t, p);
        }
        table
    }
}

/// Q(source-position-or-null | target position, source length, target length).
#[derive(Clone, Debug, Default)]
pub struct DistortionTable {
    pub(crate) probs: SparseJointTable<Context, Link>,
}

impl DistortionTable {
    pub fn prob(
        &self,
        source_pos: Option<usize>,
        target_pos: usize,
        source_len: usize,
        target_len: usize,
    ) -> Prob {
        match (Context::new(target_pos, source_len, target_len), source_link(source_pos)) {
            (Some(ctx), Some(link)) => self.probs.get(&ctx, &link),
            _ => 0.0,
        }
    }

    #[inline]
    pub fn prob_at(&self, ctx: &Context, link: Link) -> Prob {
        self.probs.get(ctx, &link)
    }

    pub fn table(&self) -> &SparseJointTable<Context, Link> {
        &self.probs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_lookup_by_word() {
        let table = LexicalTable::from_entries([
            (Some("le"), "the", 0.75),
            (Some("le"), "a", 0.25),
            (None, "the", 1.0),
        ]);
        assert_eq!(table.prob(Some("le"), "the"), 0.75);
        assert_eq!(table.prob(None, "the"), 1.0);
        assert_eq!(table.prob(Some("chat"), "the"), 0.0);
        assert_eq!(table.prob(Some("le"), "dog"), 0.0);
        assert_eq!(table.entries().count(), 3);
    }

    #[test]
    fn distortion_lookup_handles_null_and_overflow() {
        let mut d = DistortionTable::default();
        let ctx = Context::new(1, 2, 3).unwrap();
        d.probs.set(ctx, NULL_LINK, 0.25);
        d.probs.set(ctx, 0, 0.75);
        assert_eq!(d.prob(None, 1, 2, 3), 0.25);
        assert_eq!(d.prob(Some(0), 1, 2, 3), 0.75);
        assert_eq!(d.prob(Some(1), 1, 2, 3), 0.0);
        assert_eq!(d.prob(Some(0), 1, 100_000, 3), 0.0);
        assert_eq!(source_link(Some(NULL_LINK as usize)), None);
    }
}
