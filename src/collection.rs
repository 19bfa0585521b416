// 2025 Steven Chiacchira
use std::error::Error;
use std::f64::consts::PI;
use std::fmt;

use itertools::Itertools;

use crate::matrix::{Matrix, MatrixError};
use crate::sampler::Rng;

/// Error arising from constructing or operating on a [`Matrices`] collection.
#[derive(Debug)]
pub enum CollectionError {
    /// A constructor requires at least `needed` matrices but was asked for `got`.
    TooFewMatrices { needed: usize, got: usize },
    /// An underlying per-matrix operation failed.
    Matrix(MatrixError),
}

impl Error for CollectionError {}
impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TooFewMatrices { needed, got } => {
                write!(f, "too few matrices: needed >= {needed}, got {got}")
            }
            Self::Matrix(e) => write!(f, "{e}"),
        }
    }
}

impl From<MatrixError> for CollectionError {
    fn from(e: MatrixError) -> Self {
        CollectionError::Matrix(e)
    }
}

/// An owned, ordered sequence of binary matrices of identical shape.
#[derive(Debug, Clone)]
pub struct Matrices(Vec<Matrix>);

impl Matrices {
    #[must_use]
    pub fn as_slice(&self) -> &[Matrix] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Matrix> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum-of-negative-distances-plus-variance cost over every unordered pair.
    ///
    /// A *smaller* cost means *larger*, more uniform pairwise Hamming distances: this
    /// is a minimization problem by construction, not to be sign-inverted.
    pub fn cost(&self) -> Result<f64, CollectionError> {
        cost_of(&self.0)
    }

    /// Randomized local-search construction of `n` matrices whose pairwise Hamming
    /// distances are simultaneously large and low-variance (an Equiangular Tight
    /// Frame approximated over binary matrices).
    #[tracing::instrument(skip(rng), level = "trace")]
    pub fn new_etf(
        n: usize,
        rows: usize,
        cols: usize,
        iters: usize,
        rng: &mut Rng,
    ) -> Result<Matrices, CollectionError> {
        if n < 1 {
            return Err(CollectionError::TooFewMatrices { needed: 1, got: n });
        }

        let mut protos = Vec::with_capacity(n);
        for _ in 0..n {
            protos.push(Matrix::random(rows, cols, 0, rng)?);
        }

        let mut current_cost = cost_of(&protos)?;

        for _ in 0..iters {
            let n_idx = rng.uint64n(n as u64) as usize;
            let r_idx = rng.uint64n(rows as u64) as usize;
            let c_idx = rng.uint64n(cols as u64) as usize;

            protos[n_idx].toggle(r_idx, c_idx)?;
            let cost = cost_of(&protos)?;

            if cost < current_cost {
                current_cost = cost;
            } else {
                // XOR (toggle) is its own inverse: toggling the same bit again is an
                // exact revert.
                protos[n_idx].toggle(r_idx, c_idx)?;
            }
        }

        Ok(Matrices(protos))
    }

    /// Random-Fourier-Feature binarized construction: one frequency/phase pair is
    /// drawn per cell position, and matrix `i`'s bit at that position is the sign of
    /// `cos(omega * u_i + phi)` where `u_i = i / (n - 1)`. Requires `n >= 2`.
    #[tracing::instrument(skip(rng), level = "trace")]
    pub fn new_rff(
        n: usize,
        rows: usize,
        cols: usize,
        sigma: f64,
        rng: &mut Rng,
    ) -> Result<Matrices, CollectionError> {
        if n < 2 {
            return Err(CollectionError::TooFewMatrices { needed: 2, got: n });
        }

        let n_cells = rows * cols;
        let omegas: Vec<f64> = (0..n_cells)
            .map(|_| sigma * rng.normal_float_standard())
            .collect();
        let phases: Vec<f64> = (0..n_cells)
            .map(|_| rng.float64_open_unit() * 2.0 * PI)
            .collect();

        let mut matrices = Vec::with_capacity(n);
        for i in 0..n {
            let u_i = i as f64 / (n - 1) as f64;
            let bits: Vec<bool> = (0..n_cells)
                .map(|k| (omegas[k] * u_i + phases[k]).cos() >= 0.0)
                .collect();
            matrices.push(Matrix::from_row_iter(rows, cols, bits)?);
        }

        Ok(Matrices(matrices))
    }

    /// Deterministic thermometer-encoding construction: matrix `i` has the first
    /// `floor(i * rows * cols / (n - 1))` cells (in row-major order) set to 1, the
    /// rest 0. Requires `n >= 2`.
    pub fn new_thermometer(n: usize, rows: usize, cols: usize) -> Result<Matrices, CollectionError> {
        if n < 2 {
            return Err(CollectionError::TooFewMatrices { needed: 2, got: n });
        }

        let n_cells = rows * cols;
        let mut matrices = Vec::with_capacity(n);
        for i in 0..n {
            let n_set = (i * n_cells) / (n - 1);
            let bits = (0..n_cells).map(|k| k < n_set);
            matrices.push(Matrix::from_row_iter(rows, cols, bits)?);
        }

        Ok(Matrices(matrices))
    }
}

fn cost_of(matrices: &[Matrix]) -> Result<f64, CollectionError> {
    let mut distances = Vec::new();
    let mut sum = 0.0f64;

    for (a, b) in (0..matrices.len()).tuple_combinations() {
        let d = matrices[a].hamming_distance(&matrices[b])? as f64;
        distances.push(d);
        sum += d;
    }

    if distances.is_empty() {
        return Ok(0.0);
    }

    let mean = sum / distances.len() as f64;
    let variance =
        distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / distances.len() as f64;

    Ok(-sum + variance)
}
