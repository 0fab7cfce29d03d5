pub type Link = u16;
pub type Token = u32;
pub type Prob = f64;

/// Id of the synthetic null source word in every vocabulary.
pub const NULL_TOKEN: Token = 0;
/// Null source position in distortion keys.
pub const NULL_LINK: Link = 0xffff;

pub const MAX_SENT_LEN: usize = 0x400;

pub const MODEL1_MAX_ITERATIONS: usize = 50;
pub const MODEL2_MAX_ITERATIONS: usize = 100;
pub const IMPROVEMENT_RATIO: f64 = 1.0005;

/// Initial lexical weight for every observed (source, target) pair.
pub const SEED_WEIGHT: Prob = 1.0;

#[inline]
pub fn usable_denominator(d: Prob) -> bool {
    d > 0.0 && d.is_finite()
}
