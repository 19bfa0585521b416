// 2025 Steven Chiacchira
use std::error::Error;
use std::fmt;

use num_traits::PrimInt;
use rand::{Rng as _, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Error arising from a sampler operation.
#[derive(Debug)]
pub enum SamplerError {
    /// `lo >= hi` where a half-open range `[lo, hi)` was required.
    InvalidRange { lo: f64, hi: f64 },
    /// A bound was NaN or +/-infinite where a finite value was required.
    InvalidValue(),
    /// A weight vector or choice slice was empty.
    EmptySlice(),
    /// A weight at `index` was negative.
    Negative { index: usize },
    /// A weight at `index` was NaN.
    NaN { index: usize },
    /// A weight at `index` was +/-infinite.
    Infinite { index: usize },
}

impl Error for SamplerError {}
impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidRange { lo, hi } => write!(f, "invalid range: lo={lo} >= hi={hi}"),
            Self::InvalidValue() => write!(f, "invalid value: NaN or infinite where finite required"),
            Self::EmptySlice() => write!(f, "empty slice"),
            Self::Negative { index } => write!(f, "negative weight at index {index}"),
            Self::NaN { index } => write!(f, "NaN weight at index {index}"),
            Self::Infinite { index } => write!(f, "infinite weight at index {index}"),
        }
    }
}

/// An opaque random-number-generator handle.
///
/// Wraps a `ChaCha12`-based [`rand::rngs::StdRng`]; the concrete PRNG family is an
/// implementation detail (spec requires only a splittable generator of uniform 64-bit
/// words with period >= 2^64). See `DESIGN.md` for why this, rather than a PCG crate,
/// was chosen.
pub struct Rng(rand::rngs::StdRng);

impl Rng {
    /// Creates an RNG seeded from OS entropy, independent of any other call's stream.
    #[must_use]
    pub fn new_rng_from_global_seed() -> Self {
        Rng(rand::rngs::StdRng::from_os_rng())
    }

    /// Draws a uniform `u64`.
    pub fn uint64(&mut self) -> u64 {
        self.0.random()
    }

    /// Draws a uniform `u64` in `[0, max)`. Returns `0` if `max == 0`.
    pub fn uint64n(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        self.0.random_range(0..max)
    }

    /// Draws a uniform `f64` in `[0, 1)`.
    pub fn float64_open_unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }

    /// Draws a standard-normal (mean 0, std 1) `f64`.
    pub fn normal_float_standard(&mut self) -> f64 {
        Normal::new(0.0, 1.0).unwrap().sample(&mut self.0)
    }
}

/// Draws a uniform integer on the half-open interval `[lo, hi)`.
///
/// Internally widens to `u64` so negative and full-range bounds are handled safely.
pub fn int_range<I>(lo: I, hi: I, rng: &mut Rng) -> Result<I, SamplerError>
where
    I: PrimInt,
{
    if lo >= hi {
        let lo_f = lo.to_f64().unwrap_or(f64::NAN);
        let hi_f = hi.to_f64().unwrap_or(f64::NAN);
        tracing::trace!(lo = lo_f, hi = hi_f, "invalid int_range");
        return Err(SamplerError::InvalidRange { lo: lo_f, hi: hi_f });
    }
    // Widen to i128 so both the difference and the final sum are computed safely
    // regardless of sign, width, or whether `lo + offset` would overflow `I` on its
    // own before being recognized as back in range.
    let lo_wide = lo.to_i128().unwrap();
    let diff = (hi.to_i128().unwrap() - lo_wide) as u64;
    let offset = rng.uint64n(diff);
    Ok(I::from(lo_wide + offset as i128).unwrap())
}

/// Draws a uniform `f64` on the half-open interval `[lo, hi)`.
pub fn float_range(lo: f64, hi: f64, rng: &mut Rng) -> Result<f64, SamplerError> {
    if lo >= hi {
        return Err(SamplerError::InvalidRange { lo, hi });
    }
    if lo.is_nan() || lo.is_infinite() || hi.is_nan() || hi.is_infinite() {
        return Err(SamplerError::InvalidValue());
    }
    Ok(rng.float64_open_unit() * (hi - lo) + lo)
}

/// Draws index `i` with probability `w[i] / sum(w)`.
///
/// Falls back to a uniform draw over indices if `sum(w) == 0`.
pub fn int_by_weight(w: &[f64], rng: &mut Rng) -> Result<usize, SamplerError> {
    if w.is_empty() {
        return Err(SamplerError::EmptySlice());
    }

    let mut sum = 0.0f64;
    for (i, &wi) in w.iter().enumerate() {
        if wi.is_nan() {
            return Err(SamplerError::NaN { index: i });
        }
        if wi.is_infinite() {
            return Err(SamplerError::Infinite { index: i });
        }
        if wi < 0.0 {
            return Err(SamplerError::Negative { index: i });
        }
        sum += wi;
    }

    if sum == 0.0 {
        return Ok(rng.uint64n(w.len() as u64) as usize);
    }

    let threshold = float_range(0.0, sum, rng)?;
    let mut current = 0.0f64;
    for (i, &wi) in w.iter().enumerate() {
        current += wi;
        if current >= threshold {
            return Ok(i);
        }
    }
    Ok(w.len() - 1)
}

/// Draws a fair Bernoulli(1/2) bit, using the low bit of a freshly drawn word.
pub fn bool_(rng: &mut Rng) -> bool {
    (rng.uint64() & 1) != 0
}

/// Draws one element of `s` uniformly at random.
pub fn choice<'a, T>(s: &'a [T], rng: &mut Rng) -> Result<&'a T, SamplerError> {
    if s.is_empty() {
        return Err(SamplerError::EmptySlice());
    }
    let idx = rng.uint64n(s.len() as u64) as usize;
    Ok(&s[idx])
}

/// Draws a normally-distributed value with mean `mean`, std `std`, clamped to `[lo,
/// hi]` and rounded to the nearest integer, retrying rejected draws.
pub fn normal_int(
    lo: i64,
    hi: i64,
    mean: f64,
    std: f64,
    rng: &mut Rng,
) -> Result<i64, SamplerError> {
    if std < 0.0 {
        return Err(SamplerError::InvalidValue());
    }
    if mean < lo as f64 || mean > hi as f64 {
        return Err(SamplerError::InvalidRange {
            lo: lo as f64,
            hi: hi as f64,
        });
    }
    if std == 0.0 {
        return Ok(mean.round().clamp(lo as f64, hi as f64) as i64);
    }

    loop {
        let draw = mean + std * rng.normal_float_standard();
        let rounded = draw.round();
        if rounded >= lo as f64 && rounded <= hi as f64 {
            return Ok(rounded as i64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_range_bounds() {
        let mut rng = Rng::new_rng_from_global_seed();
        for _ in 0..1000 {
            let v = int_range::<i32>(-5, 5, &mut rng).unwrap();
            assert!((-5..5).contains(&v));
        }
    }

    #[test]
    fn test_int_range_wide_span_does_not_overflow_narrow_type() {
        let mut rng = Rng::new_rng_from_global_seed();
        for _ in 0..1000 {
            let v = int_range::<i8>(-100, 100, &mut rng).unwrap();
            assert!((-100..100).contains(&v));
        }
    }

    #[test]
    fn test_int_range_full_width_bounds() {
        let mut rng = Rng::new_rng_from_global_seed();
        for _ in 0..1000 {
            let v = int_range::<i32>(i32::MIN, i32::MAX, &mut rng).unwrap();
            assert!(v >= i32::MIN && v < i32::MAX);
        }
    }

    #[test]
    fn test_int_range_invalid() {
        let mut rng = Rng::new_rng_from_global_seed();
        assert!(matches!(
            int_range::<i32>(5, 5, &mut rng),
            Err(SamplerError::InvalidRange { .. })
        ));
        assert!(matches!(
            int_range::<i32>(6, 5, &mut rng),
            Err(SamplerError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_float_range_bounds() {
        let mut rng = Rng::new_rng_from_global_seed();
        for _ in 0..1000 {
            let v = float_range(1.0, 2.0, &mut rng).unwrap();
            assert!((1.0..2.0).contains(&v));
        }
    }

    #[test]
    fn test_float_range_invalid_value() {
        let mut rng = Rng::new_rng_from_global_seed();
        assert!(matches!(
            float_range(f64::NAN, 2.0, &mut rng),
            Err(SamplerError::InvalidValue())
        ));
        assert!(matches!(
            float_range(0.0, f64::INFINITY, &mut rng),
            Err(SamplerError::InvalidValue())
        ));
    }

    #[test]
    fn test_int_by_weight_distribution() {
        let mut rng = Rng::new_rng_from_global_seed();
        let w = [0.2, 0.3, 0.1, 0.4];
        let n_samples = 10_000;
        let mut counts = [0usize; 4];
        for _ in 0..n_samples {
            let idx = int_by_weight(&w, &mut rng).unwrap();
            counts[idx] += 1;
        }
        for (i, &wi) in w.iter().enumerate() {
            let empirical = counts[i] as f64 / n_samples as f64;
            assert!((empirical - wi).abs() < 0.03, "index {i}: {empirical} vs {wi}");
        }
    }

    #[test]
    fn test_int_by_weight_empty() {
        let mut rng = Rng::new_rng_from_global_seed();
        assert!(matches!(
            int_by_weight(&[], &mut rng),
            Err(SamplerError::EmptySlice())
        ));
    }

    #[test]
    fn test_int_by_weight_zero_sum_uniform_fallback() {
        let mut rng = Rng::new_rng_from_global_seed();
        let w = [0.0, 0.0, 0.0];
        let mut seen = [false; 3];
        for _ in 0..500 {
            let idx = int_by_weight(&w, &mut rng).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_int_by_weight_negative() {
        let mut rng = Rng::new_rng_from_global_seed();
        assert!(matches!(
            int_by_weight(&[1.0, -1.0], &mut rng),
            Err(SamplerError::Negative { index: 1 })
        ));
    }

    #[test]
    fn test_choice_empty() {
        let mut rng = Rng::new_rng_from_global_seed();
        let empty: [i32; 0] = [];
        assert!(matches!(
            choice(&empty, &mut rng),
            Err(SamplerError::EmptySlice())
        ));
    }

    #[test]
    fn test_bool_is_fair_ish() {
        let mut rng = Rng::new_rng_from_global_seed();
        let n = 20_000;
        let trues = (0..n).filter(|_| bool_(&mut rng)).count();
        let ratio = trues as f64 / n as f64;
        assert!((ratio - 0.5).abs() < 0.03);
    }

    #[test]
    fn test_normal_int_zero_std() {
        let mut rng = Rng::new_rng_from_global_seed();
        assert_eq!(normal_int(0, 10, 4.2, 0.0, &mut rng).unwrap(), 4);
    }

    #[test]
    fn test_normal_int_clamped_range() {
        let mut rng = Rng::new_rng_from_global_seed();
        for _ in 0..2000 {
            let v = normal_int(-3, 3, 0.0, 5.0, &mut rng).unwrap();
            assert!((-3..=3).contains(&v));
        }
    }

    #[test]
    fn test_normal_int_invalid() {
        let mut rng = Rng::new_rng_from_global_seed();
        assert!(matches!(
            normal_int(0, 10, 20.0, 1.0, &mut rng),
            Err(SamplerError::InvalidRange { .. })
        ));
        assert!(matches!(
            normal_int(0, 10, 5.0, -1.0, &mut rng),
            Err(SamplerError::InvalidValue())
        ));
    }
}
