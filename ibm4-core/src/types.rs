pub type Token = u32;
pub type Class = u32;
pub type Prob = f64;

/// Signed offset used to index the distortion tables.
pub type Displacement = isize;

/// Zero-indexed `(target position, source position)` links; `None` is NULL.
pub type Alignment = Vec<(usize, Option<usize>)>;

/// Token 0 of every vocabulary is the NULL word.
pub const NULL: Token = 0;

/// Probabilities below this value are treated as zero.
pub const MIN_PROB: Prob = 1.0e-12;

/// Model 3 seeds fertility rows for 0..MAX_FERTILITY only.
pub const MAX_FERTILITY: usize = 10;

#[inline]
pub fn factorial(n: usize) -> Prob {
    (2..=n).fold(1.0, |acc, k| acc * k as Prob)
}

#[inline]
pub fn clamp_floor(p: Prob) -> Prob {
    if p < MIN_PROB { MIN_PROB } else { p }
}
