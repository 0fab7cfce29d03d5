use crate::text::SentencePair;
use crate::types::Prob;

/// Word alignment of one sentence pair: for each target position, the source
/// position it links to, or `None` for the null word.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Alignment {
    links: Vec<Option<usize>>,
}

impl Alignment {
    pub fn from_links(links: Vec<Option<usize>>) -> Self {
        Alignment { links }
    }

    #[inline]
    pub fn source_for(&self, target_pos: usize) -> Option<usize> {
        self.links.get(target_pos).copied().flatten()
    }

    /// `(target, source)` for every linked target position, in target order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(j, link)| link.map(|i| (j, i)))
    }

    /// Number of target positions linked to a real source word.
    pub fn len(&self) -> usize {
        self.links.iter().filter(|l| l.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn target_len(&self) -> usize {
        self.links.len()
    }
}

/// Decoding shared by the trained models.
pub trait Aligner {
    /// Most likely alignment of `pair` under the trained parameters.
    fn align(&self, pair: &SentencePair) -> Alignment;

    fn align_all(&self, pairs: &[SentencePair]) -> Vec<Alignment> {
        pairs.iter().map(|p| self.align(p)).collect()
    }
}

/// Picks the best source for one target position. Null (`None`) is scored
/// first and is the baseline; a real position has to be strictly better, so
/// among equal reals the lowest index wins.
#[inline]
pub(crate) fn best_source<F>(source_len: usize, mut score: F) -> (Option<usize>, Prob)
where
    F: FnMut(Option<usize>) -> Prob,
{
    let mut best_i = None;
    let mut best_p = score(None);
    for i in 0..source_len {
        let p = score(Some(i));
        if p > best_p {
            best_i = Some(i);
            best_p = p;
        }
    }
    (best_i, best_p)
}

/// Runs `best_source` independently for every target position.
pub(crate) fn decode<F>(source_len: usize, target_len: usize, mut score: F) -> Alignment
where
    F: FnMut(Option<usize>, usize) -> Prob,
{
    let links = (0..target_len)
        .map(|j| best_source(source_len, |i| score(i, j)).0)
        .collect();
    Alignment { links }
}

/// Sum of `ln(best score)` over target positions of one sentence pair.
/// Positions with no positive candidate contribute nothing.
pub(crate) fn best_log_score<F>(source_len: usize, target_len: usize, mut score: F) -> f64
where
    F: FnMut(Option<usize>, usize) -> Prob,
{
    let mut llh = 0.0;
    for j in 0..target_len {
        let (_, p) = best_source(source_len, |i| score(i, j));
        if p > 0.0 {
            llh += p.ln();
        }
    }
    llh
}
