// 2025 Steven Chiacchira
//! Dense binary bit-matrix core (spec §4.B): [`Matrix`] stores an `R x C` matrix of
//! single bits packed 64 bits per word and exposes element access, bulk bit-wise row
//! operations, the XNOR-popcount [`Matrix::dot`] product, its ternary variant
//! [`Matrix::dot_ternary`], and an in-register [`Matrix::transpose`].

mod dense;
mod error;
mod scan;

pub use dense::Matrix;
pub use error::MatrixError;
pub use scan::WordWindow;
