// 2025 Steven Chiacchira
use crate::matrix::error::MatrixError;
use crate::matrix::scan::WordWindow;
use crate::sampler::Rng;

const WORD_BITS: usize = u64::BITS as usize;

/// Dense row-major matrix of single bits, packed 64 bits per word.
///
/// Row `r` occupies backing-storage indices `[r*stride, r*stride + stride)`; bit
/// `(r, c)` lives in word `r*stride + c/64` at position `c % 64`. Every bit of the
/// last word of a row beyond column `cols - 1` is always zero (invariant M1):
/// every constructor and mutator that could set a padding bit re-applies
/// `tail_mask` before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    stride: usize,
    tail_mask: u64,
    data: Vec<u64>,
}

fn derive_shape(rows: usize, cols: usize) -> (usize, u64) {
    let stride = cols.div_ceil(WORD_BITS);
    let r = cols % WORD_BITS;
    let tail_mask = if r == 0 { u64::MAX } else { (1u64 << r) - 1 };
    (stride, tail_mask)
}

impl Matrix {
    fn new_zeroed(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        if rows == 0 || cols == 0 {
            tracing::trace!(rows, cols, "invalid matrix shape");
            return Err(MatrixError::InvalidShape {
                rows: rows as isize,
                cols: cols as isize,
            });
        }
        let (stride, tail_mask) = derive_shape(rows, cols);
        Ok(Matrix {
            rows,
            cols,
            stride,
            tail_mask,
            data: vec![0u64; rows * stride],
        })
    }

    /// Applies `tail_mask` to the last word of every row, restoring invariant M1.
    fn apply_mask(&mut self) {
        if self.stride == 0 {
            return;
        }
        for r in 0..self.rows {
            let last = r * self.stride + self.stride - 1;
            self.data[last] &= self.tail_mask;
        }
    }

    /// A zero-filled matrix of shape `(rows, cols)`.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        Self::new_zeroed(rows, cols)
    }

    /// A matrix of shape `(rows, cols)` with every bit set to 1.
    pub fn ones(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        let mut m = Self::new_zeroed(rows, cols)?;
        for w in m.data.iter_mut() {
            *w = u64::MAX;
        }
        m.apply_mask();
        Ok(m)
    }

    /// A random matrix of shape `(rows, cols)` with bit density controlled by the
    /// bias exponent `k`: `k > 0` OR-folds `k` extra draws per word (raising
    /// density), `k < 0` AND-folds `|k|` extra draws (lowering density), `k == 0`
    /// is uniform.
    #[tracing::instrument(skip(rng), level = "trace")]
    pub fn random(rows: usize, cols: usize, k: i32, rng: &mut Rng) -> Result<Self, MatrixError> {
        let mut m = Self::new_zeroed(rows, cols)?;
        for w in m.data.iter_mut() {
            let mut p = rng.uint64();
            if k < 0 {
                for _ in 0..(-k) {
                    p &= rng.uint64();
                }
            } else if k > 0 {
                for _ in 0..k {
                    p |= rng.uint64();
                }
            }
            *w = p;
        }
        m.apply_mask();
        Ok(m)
    }

    /// A matrix of shape `(rows, cols)` whose bit `(r, c)` is 1 iff `x[r*cols + c]
    /// >= 0`. Requires `x.len() >= rows * cols`.
    pub fn sign_of(rows: usize, cols: usize, x: &[i64]) -> Result<Self, MatrixError> {
        let needed = rows * cols;
        if x.len() < needed {
            tracing::trace!(needed, got = x.len(), "insufficient input for sign_of");
            return Err(MatrixError::InsufficientInput {
                needed,
                got: x.len(),
            });
        }
        let mut m = Self::new_zeroed(rows, cols)?;
        for r in 0..rows {
            for c in 0..cols {
                if x[r * cols + c] >= 0 {
                    m.set_unchecked(r, c, true);
                }
            }
        }
        m.apply_mask();
        Ok(m)
    }

    /// Builds a matrix of shape `(rows, cols)` from a flat, row-major iterator of
    /// bits. Fails with [`MatrixError::InsufficientInput`] if the iterator yields
    /// fewer than `rows * cols` items.
    pub fn from_row_iter<I>(rows: usize, cols: usize, bits: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = bool>,
    {
        let mut m = Self::new_zeroed(rows, cols)?;
        let mut count = 0usize;
        for (i, bit) in bits.into_iter().enumerate() {
            if i >= m.rows * m.cols {
                break;
            }
            if bit {
                m.set_unchecked(i / cols, i % cols, true);
            }
            count += 1;
        }
        let needed = rows * cols;
        if count < needed {
            tracing::trace!(needed, got = count, "insufficient input for from_row_iter");
            return Err(MatrixError::InsufficientInput { needed, got: count });
        }
        m.apply_mask();
        Ok(m)
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[must_use]
    pub fn tail_mask(&self) -> u64 {
        self.tail_mask
    }

    /// Raw packed storage, exposed crate-internally for callers (e.g.
    /// [`crate::ternary`]) that need word-level access to the same XNOR-popcount
    /// machinery [`Matrix::dot`] uses.
    #[must_use]
    pub(crate) fn data(&self) -> &[u64] {
        &self.data
    }

    fn check_index(&self, r: usize, c: usize) -> Result<(), MatrixError> {
        if r >= self.rows {
            return Err(MatrixError::IndexOutOfRange {
                index: r,
                bound: self.rows,
            });
        }
        if c >= self.cols {
            return Err(MatrixError::IndexOutOfRange {
                index: c,
                bound: self.cols,
            });
        }
        Ok(())
    }

    fn word_bit(&self, r: usize, c: usize) -> (usize, usize) {
        (r * self.stride + c / WORD_BITS, c % WORD_BITS)
    }

    fn set_unchecked(&mut self, r: usize, c: usize, val: bool) {
        let (word_idx, bit_idx) = self.word_bit(r, c);
        if val {
            self.data[word_idx] |= 1u64 << bit_idx;
        } else {
            self.data[word_idx] &= !(1u64 << bit_idx);
        }
    }

    /// Returns the state of bit `(r, c)`.
    pub fn bit(&self, r: usize, c: usize) -> Result<bool, MatrixError> {
        self.check_index(r, c)?;
        let (word_idx, bit_idx) = self.word_bit(r, c);
        Ok((self.data[word_idx] >> bit_idx) & 1 != 0)
    }

    /// Sets bit `(r, c)` to 1, returning its previous value.
    pub fn set(&mut self, r: usize, c: usize) -> Result<bool, MatrixError> {
        self.check_index(r, c)?;
        let prev = self.bit(r, c)?;
        self.set_unchecked(r, c, true);
        Ok(prev)
    }

    /// Clears bit `(r, c)` to 0, returning its previous value.
    pub fn clear(&mut self, r: usize, c: usize) -> Result<bool, MatrixError> {
        self.check_index(r, c)?;
        let prev = self.bit(r, c)?;
        self.set_unchecked(r, c, false);
        Ok(prev)
    }

    /// Toggles bit `(r, c)`, returning its previous value.
    pub fn toggle(&mut self, r: usize, c: usize) -> Result<bool, MatrixError> {
        self.check_index(r, c)?;
        let prev = self.bit(r, c)?;
        self.set_unchecked(r, c, !prev);
        Ok(prev)
    }

    /// Total number of set bits in the matrix.
    #[must_use]
    pub fn ones_count(&self) -> u64 {
        let mut total = 0u64;
        for r in 0..self.rows {
            let base = r * self.stride;
            for k in 0..self.stride {
                let mut w = self.data[base + k];
                if k == self.stride - 1 {
                    w &= self.tail_mask;
                }
                total += w.count_ones() as u64;
            }
        }
        total
    }

    fn check_same_shape(&self, other: &Matrix) -> Result<(), MatrixError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(MatrixError::DimensionMismatch {
                self_rows: self.rows,
                self_cols: self.cols,
                other_rows: other.rows,
                other_cols: other.cols,
            });
        }
        if self.stride != other.stride {
            return Err(MatrixError::StrideMismatch {
                self_stride: self.stride,
                other_stride: other.stride,
            });
        }
        if self.tail_mask != other.tail_mask {
            return Err(MatrixError::MaskMismatch {
                self_mask: self.tail_mask,
                other_mask: other.tail_mask,
            });
        }
        Ok(())
    }

    /// Element-wise AND; requires identical shape.
    pub fn and(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape(other)?;
        let mut result = self.clone();
        for (a, b) in result.data.iter_mut().zip(other.data.iter()) {
            *a &= *b;
        }
        result.apply_mask();
        Ok(result)
    }

    /// Element-wise XOR; requires identical shape.
    pub fn xor(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape(other)?;
        let mut result = self.clone();
        for (a, b) in result.data.iter_mut().zip(other.data.iter()) {
            *a ^= *b;
        }
        result.apply_mask();
        Ok(result)
    }

    /// Count of differing bits between `self` and `other`; requires identical
    /// shape.
    pub fn hamming_distance(&self, other: &Matrix) -> Result<u64, MatrixError> {
        Ok(self.xor(other)?.ones_count())
    }

    /// XNOR-popcount dot product: for every `(i, j)` with `i` a row of `self` and
    /// `j` a row of `other`, counts the positions where the two rows agree.
    /// Returns a dense row-major buffer of length `self.rows() * other.rows()`.
    pub fn dot(&self, other: &Matrix) -> Result<Vec<u64>, MatrixError> {
        if self.cols != other.cols {
            return Err(MatrixError::DimensionMismatch {
                self_rows: self.rows,
                self_cols: self.cols,
                other_rows: other.rows,
                other_cols: other.cols,
            });
        }
        if self.stride != other.stride {
            return Err(MatrixError::StrideMismatch {
                self_stride: self.stride,
                other_stride: other.stride,
            });
        }
        if self.tail_mask != other.tail_mask {
            return Err(MatrixError::MaskMismatch {
                self_mask: self.tail_mask,
                other_mask: other.tail_mask,
            });
        }

        let out_rows = self.rows;
        let out_cols = other.rows;
        let stride = self.stride;
        let mask = self.tail_mask;
        let mut counts = vec![0u64; out_rows * out_cols];

        for i in 0..out_rows {
            let m_off = i * stride;
            let y_off = i * out_cols;
            for j in 0..out_cols {
                let o_off = j * stride;
                let mut count = 0u64;
                for k in 0..stride {
                    let mw = self.data[m_off + k];
                    let ow = other.data[o_off + k];
                    let mut xnor = !(mw ^ ow);
                    if k == stride - 1 {
                        xnor &= mask;
                    }
                    count += xnor.count_ones() as u64;
                }
                counts[y_off + j] = count;
            }
        }
        Ok(counts)
    }

    /// Binary-times-ternary dot product: interprets `self` as `{-1, +1}` rows and
    /// `(sign, non_zero)` as ternary `{-1, 0, +1}` rows. Returns `(match_counts,
    /// active_counts)`, from which the signed score is `2*match - active`.
    pub fn dot_ternary(
        &self,
        sign: &Matrix,
        non_zero: &Matrix,
    ) -> Result<(Vec<u64>, Vec<u64>), MatrixError> {
        if self.cols != sign.cols {
            return Err(MatrixError::DimensionMismatch {
                self_rows: self.rows,
                self_cols: self.cols,
                other_rows: sign.rows,
                other_cols: sign.cols,
            });
        }
        sign.check_same_shape(non_zero)?;
        if self.stride != sign.stride {
            return Err(MatrixError::StrideMismatch {
                self_stride: self.stride,
                other_stride: sign.stride,
            });
        }
        if self.tail_mask != sign.tail_mask {
            return Err(MatrixError::MaskMismatch {
                self_mask: self.tail_mask,
                other_mask: sign.tail_mask,
            });
        }

        let out_rows = self.rows;
        let out_cols = sign.rows;
        let stride = self.stride;
        let mask = self.tail_mask;
        let mut match_counts = vec![0u64; out_rows * out_cols];
        let mut active_counts = vec![0u64; out_rows * out_cols];

        for i in 0..out_rows {
            let m_off = i * stride;
            let y_off = i * out_cols;
            for j in 0..out_cols {
                let o_off = j * stride;
                let mut match_count = 0u64;
                let mut active_count = 0u64;
                for k in 0..stride {
                    let mw = self.data[m_off + k];
                    let sw = sign.data[o_off + k];
                    let mut nw = non_zero.data[o_off + k];
                    let same_sign = !(mw ^ sw);
                    let mut valid_match = same_sign & nw;
                    if k == stride - 1 {
                        valid_match &= mask;
                        nw &= mask;
                    }
                    match_count += valid_match.count_ones() as u64;
                    active_count += nw.count_ones() as u64;
                }
                match_counts[y_off + j] = match_count;
                active_counts[y_off + j] = active_count;
            }
        }
        Ok((match_counts, active_counts))
    }

    /// The `cols x rows` transpose of this matrix.
    #[must_use]
    pub fn transpose(&self) -> Matrix {
        let mut dst =
            Matrix::new_zeroed(self.cols, self.rows).expect("transpose of a valid matrix");

        let src_stride = self.stride;
        let dst_stride = dst.stride;

        let mut r = 0usize;
        while r < self.rows {
            let remaining_rows = self.rows - r;
            let rows_to_process = remaining_rows.min(WORD_BITS);

            for c_word in 0..src_stride {
                let mut block = [0u64; WORD_BITS];
                let mut src_idx = r * src_stride + c_word;
                for slot in block.iter_mut().take(rows_to_process) {
                    *slot = self.data[src_idx];
                    src_idx += src_stride;
                }

                transpose_64_block(&mut block);

                let dst_row_base = c_word * WORD_BITS;
                let dst_col_word = r / WORD_BITS;
                let dst_rows_to_write = if dst_row_base + WORD_BITS > dst.rows {
                    dst.rows - dst_row_base
                } else {
                    WORD_BITS
                };

                let mut dst_idx = dst_row_base * dst_stride + dst_col_word;
                for slot in block.iter().take(dst_rows_to_write) {
                    dst.data[dst_idx] = *slot;
                    dst_idx += dst_stride;
                }
            }
            r += WORD_BITS;
        }

        dst.apply_mask();
        dst
    }

    /// Yields a [`WordWindow`] descriptor (and mutable access to the underlying
    /// word) for every row in `row_idxs` (or every row if `row_idxs` is `None`)
    /// and every word-slot in that row. `f` may mutate the word freely but must
    /// itself preserve invariant M1 if it writes to the last word of a row.
    pub fn scan_rows_word<F>(&mut self, row_idxs: Option<&[usize]>, mut f: F) -> Result<(), MatrixError>
    where
        F: FnMut(WordWindow, &mut u64),
    {
        let rows = self.rows;
        let cols = self.cols;
        let stride = self.stride;

        let owned_idxs: Vec<usize>;
        let idxs: &[usize] = match row_idxs {
            Some(idxs) => idxs,
            None => {
                owned_idxs = (0..rows).collect();
                &owned_idxs
            }
        };

        for &r in idxs {
            if r >= rows {
                return Err(MatrixError::IndexOutOfRange { index: r, bound: rows });
            }
            let row_word_offset = r * stride;
            let row_bit_offset = r * cols;
            for s in 0..stride {
                let col_start = s * WORD_BITS;
                let col_end = (col_start + WORD_BITS).min(cols);
                let window = WordWindow {
                    word_index: row_word_offset + s,
                    row: r,
                    col_start,
                    col_end,
                    global_start: row_bit_offset + col_start,
                    global_end: row_bit_offset + col_end,
                };
                f(window, &mut self.data[row_word_offset + s]);
            }
        }
        Ok(())
    }
}

/// Branch-free 64x64 in-register bit transpose, via the standard five-layer
/// divide-and-conquer butterfly.
fn transpose_64_block(block: &mut [u64; WORD_BITS]) {
    let mut swap = |j_range: std::ops::Range<usize>, step: usize, shift: u32, mask: u64| {
        for j in j_range.step_by(step * 2) {
            for i in j..j + step {
                let a = block[i];
                let b = block[i + step];
                let t = (b ^ (a >> shift)) & mask;
                block[i] = a ^ (t << shift);
                block[i + step] = b ^ t;
            }
        }
    };

    swap(0..32, 32, 32, 0x0000_0000_FFFF_FFFF);
    swap(0..64, 16, 16, 0x0000_FFFF_0000_FFFF);
    swap(0..64, 8, 8, 0x00FF_00FF_00FF_00FF);
    swap(0..64, 4, 4, 0x0F0F_0F0F_0F0F_0F0F);
    swap(0..64, 2, 2, 0x3333_3333_3333_3333);
    swap(0..64, 1, 1, 0x5555_5555_5555_5555);
}
