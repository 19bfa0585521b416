// 2025 Steven Chiacchira
use crate::matrix::{Matrix, MatrixError};
use crate::sampler::Rng;

/// Dense ternary matrix with cells in `{-1, 0, +1}`, represented as a pair of coupled
/// bit-matrices `(sign, non_zero)`.
///
/// | `non_zero` | `sign` | value |
/// |---|---|---|
/// | 0 | 0 | 0 |
/// | 0 | 1 | 0 (canonical form forbids; enforced post-mutation) |
/// | 1 | 1 | +1 |
/// | 1 | 0 | -1 |
///
/// Invariant T1: whenever `non_zero(r, c) == 0`, `sign(r, c)` must also be 0. Every
/// mutator that can clear a cell clears its sign bit as part of the same call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TernaryMatrix {
    sign: Matrix,
    non_zero: Matrix,
}

/// Result of [`TernaryMatrix::dot`]: per-cell match/active counts from which the
/// signed score `z = 2*match - non_zero` is reconstructed.
#[derive(Debug, Clone)]
pub struct TernaryDotResult {
    rows: usize,
    cols: usize,
    match_counts: Vec<u64>,
    non_zero_counts: Vec<u64>,
}

impl TernaryDotResult {
    #[must_use]
    pub fn match_count(&self, i: usize, j: usize) -> u64 {
        self.match_counts[i * self.cols + j]
    }

    #[must_use]
    pub fn non_zero_count(&self, i: usize, j: usize) -> u64 {
        self.non_zero_counts[i * self.cols + j]
    }

    /// The signed inner-product score `2*match - non_zero` at `(i, j)`.
    #[must_use]
    pub fn score(&self, i: usize, j: usize) -> i64 {
        2 * self.match_count(i, j) as i64 - self.non_zero_count(i, j) as i64
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }
}

impl TernaryMatrix {
    fn enforce_t1(&mut self) {
        // T1 is a post-mutation invariant, not a precondition (per spec.md design
        // note (ii)): whatever order a caller writes sign/non_zero in, clear any
        // sign bit left set where non_zero is 0.
        self.sign = self.sign.and(&self.non_zero).expect("same shape by construction");
    }

    /// An all-zero ternary matrix of shape `(rows, cols)`.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        Ok(TernaryMatrix {
            sign: Matrix::zeros(rows, cols)?,
            non_zero: Matrix::zeros(rows, cols)?,
        })
    }

    /// A ternary matrix of shape `(rows, cols)` with every cell set to `+1`.
    pub fn ones(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        Ok(TernaryMatrix {
            sign: Matrix::ones(rows, cols)?,
            non_zero: Matrix::ones(rows, cols)?,
        })
    }

    /// A random ternary matrix: `non_zero` is drawn with bias `k_non_zero`, `sign`
    /// with bias `k_sign`, then T1 is enforced (cells where `non_zero == 0` are
    /// forced to `sign == 0`).
    pub fn random(
        rows: usize,
        cols: usize,
        k_sign: i32,
        k_non_zero: i32,
        rng: &mut Rng,
    ) -> Result<Self, MatrixError> {
        let mut m = TernaryMatrix {
            sign: Matrix::random(rows, cols, k_sign, rng)?,
            non_zero: Matrix::random(rows, cols, k_non_zero, rng)?,
        };
        m.enforce_t1();
        Ok(m)
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.sign.rows()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.sign.cols()
    }

    #[must_use]
    pub fn sign_matrix(&self) -> &Matrix {
        &self.sign
    }

    #[must_use]
    pub fn non_zero_matrix(&self) -> &Matrix {
        &self.non_zero
    }

    /// The value of cell `(r, c)`: `-1`, `0`, or `+1`.
    pub fn value(&self, r: usize, c: usize) -> Result<i8, MatrixError> {
        if !self.non_zero.bit(r, c)? {
            return Ok(0);
        }
        Ok(if self.sign.bit(r, c)? { 1 } else { -1 })
    }

    /// Sets cell `(r, c)` to `0`: clears both `non_zero` and `sign`.
    pub fn set_zero(&mut self, r: usize, c: usize) -> Result<(), MatrixError> {
        self.non_zero.clear(r, c)?;
        self.sign.clear(r, c)?;
        Ok(())
    }

    /// Sets cell `(r, c)` to `+1`: sets `non_zero` first, then `sign`.
    pub fn set_plus(&mut self, r: usize, c: usize) -> Result<(), MatrixError> {
        self.non_zero.set(r, c)?;
        self.sign.set(r, c)?;
        Ok(())
    }

    /// Sets cell `(r, c)` to `-1`: sets `non_zero` first, then clears `sign`.
    pub fn set_minus(&mut self, r: usize, c: usize) -> Result<(), MatrixError> {
        self.non_zero.set(r, c)?;
        self.sign.clear(r, c)?;
        Ok(())
    }

    /// Ternary-times-ternary dot product: for every row pair `(i, j)`,
    /// `match_count` is the count of positions where both operands are non-zero
    /// and agree in sign, `non_zero_count` is the count of positions where both
    /// operands are non-zero.
    pub fn dot(&self, other: &TernaryMatrix) -> Result<TernaryDotResult, MatrixError> {
        if self.cols() != other.cols() {
            return Err(MatrixError::DimensionMismatch {
                self_rows: self.rows(),
                self_cols: self.cols(),
                other_rows: other.rows(),
                other_cols: other.cols(),
            });
        }
        if self.non_zero.stride() != other.non_zero.stride() {
            return Err(MatrixError::StrideMismatch {
                self_stride: self.non_zero.stride(),
                other_stride: other.non_zero.stride(),
            });
        }
        if self.non_zero.tail_mask() != other.non_zero.tail_mask() {
            return Err(MatrixError::MaskMismatch {
                self_mask: self.non_zero.tail_mask(),
                other_mask: other.non_zero.tail_mask(),
            });
        }

        let out_rows = self.rows();
        let out_cols = other.rows();
        let stride = self.non_zero.stride();
        let mask = self.non_zero.tail_mask();

        let self_sign = self.sign.data();
        let self_nz = self.non_zero.data();
        let other_sign = other.sign.data();
        let other_nz = other.non_zero.data();

        let mut match_counts = vec![0u64; out_rows * out_cols];
        let mut non_zero_counts = vec![0u64; out_rows * out_cols];

        for i in 0..out_rows {
            let self_off = i * stride;
            let y_off = i * out_cols;
            for j in 0..out_cols {
                let other_off = j * stride;
                let mut match_count = 0u64;
                let mut non_zero_count = 0u64;
                for k in 0..stride {
                    let mut both_nz = self_nz[self_off + k] & other_nz[other_off + k];
                    if k == stride - 1 {
                        both_nz &= mask;
                    }
                    let same_sign = !(self_sign[self_off + k] ^ other_sign[other_off + k]);
                    match_count += (both_nz & same_sign).count_ones() as u64;
                    non_zero_count += both_nz.count_ones() as u64;
                }
                match_counts[y_off + j] = match_count;
                non_zero_counts[y_off + j] = non_zero_count;
            }
        }

        Ok(TernaryDotResult {
            rows: out_rows,
            cols: out_cols,
            match_counts,
            non_zero_counts,
        })
    }

    /// The pair-wise transpose of the underlying `sign` and `non_zero` matrices.
    #[must_use]
    pub fn transpose(&self) -> TernaryMatrix {
        TernaryMatrix {
            sign: self.sign.transpose(),
            non_zero: self.non_zero.transpose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_all_zero() {
        let t = TernaryMatrix::zeros(2, 2).unwrap();
        for r in 0..2 {
            for c in 0..2 {
                assert_eq!(t.value(r, c).unwrap(), 0);
            }
        }
    }

    #[test]
    fn test_ones_all_plus() {
        let t = TernaryMatrix::ones(2, 2).unwrap();
        for r in 0..2 {
            for c in 0..2 {
                assert_eq!(t.value(r, c).unwrap(), 1);
            }
        }
    }

    #[test]
    fn test_set_plus_minus_zero() {
        let mut t = TernaryMatrix::zeros(2, 2).unwrap();
        t.set_plus(0, 0).unwrap();
        assert_eq!(t.value(0, 0).unwrap(), 1);
        t.set_minus(0, 0).unwrap();
        assert_eq!(t.value(0, 0).unwrap(), -1);
        t.set_zero(0, 0).unwrap();
        assert_eq!(t.value(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_t1_enforced_after_random() {
        let mut rng = Rng::new_rng_from_global_seed();
        let t = TernaryMatrix::random(20, 130, 0, 0, &mut rng).unwrap();
        for r in 0..20 {
            for c in 0..130 {
                if !t.non_zero_matrix().bit(r, c).unwrap() {
                    assert!(!t.sign_matrix().bit(r, c).unwrap());
                }
            }
        }
    }

    #[test]
    fn test_dot_matches_inner_product() {
        let mut t1 = TernaryMatrix::zeros(1, 4).unwrap();
        t1.set_plus(0, 0).unwrap();
        t1.set_minus(0, 1).unwrap();
        t1.set_zero(0, 2).unwrap();
        t1.set_plus(0, 3).unwrap();

        let mut t2 = TernaryMatrix::zeros(1, 4).unwrap();
        t2.set_plus(0, 0).unwrap(); // agrees (+1, +1)
        t2.set_plus(0, 1).unwrap(); // disagrees (-1, +1)
        t2.set_plus(0, 2).unwrap(); // self is zero, doesn't count
        t2.set_minus(0, 3).unwrap(); // disagrees (+1, -1)

        let result = t1.dot(&t2).unwrap();
        assert_eq!(result.non_zero_count(0, 0), 3);
        assert_eq!(result.match_count(0, 0), 1);
        assert_eq!(result.score(0, 0), 2 * 1 - 3);
    }

    #[test]
    fn test_transpose_pairwise() {
        let mut rng = Rng::new_rng_from_global_seed();
        let t = TernaryMatrix::random(40, 70, 0, 0, &mut rng).unwrap();
        let tt = t.transpose().transpose();
        assert_eq!(tt, t);
    }
}
