//! # xnorpop
//! A bit-packed binary/ternary matrix engine for XNOR-popcount linear algebra.
//!
//! Rows are packed 64 bits per word, row-major, with the tail bits of the last
//! word of each row always zeroed. [`matrix::Matrix::dot`] computes
//! per-row-pair agreement counts via `popcount(!(a ^ b))`, the binary analog of
//! an inner product; [`ternary::TernaryMatrix`] extends this to `{-1, 0, +1}`
//! cells via a coupled pair of bit-matrices. [`collection::Matrices`] builds
//! structured sequences of such matrices (ETF, RFF, thermometer encodings);
//! [`parallel::parallel_for`] is the fork-join primitive callers use to
//! parallelize work across those sequences or across a matrix's output rows.
#![feature(trait_alias)]

/// Deterministic, ordered fork-join primitive over `[0, n)`.
pub mod parallel;
/// Structured sequences of binary matrices: ETF, RFF, and thermometer constructions.
pub mod collection;
/// Dense binary bit-matrix core: packed storage, XNOR-popcount dot product, transpose.
pub mod matrix;
/// Weighted and biased random sampling over an opaque RNG handle.
pub mod sampler;
/// Dense ternary (`{-1, 0, +1}`) matrix core built atop [`matrix::Matrix`].
pub mod ternary;
/// Bit-set operations on a single machine word, generic over unsigned width.
pub mod word;
