// 2025 Steven Chiacchira

/// Descriptor for one word-slot of one row, yielded by
/// [`super::Matrix::scan_rows_word`].
///
/// `col_start`/`col_end` describe the column window `[col_start, col_end)` this word
/// covers (the last window in a row is clipped to the matrix's column count).
/// `global_start`/`global_end` are the corresponding flat bit offsets
/// `row * cols + col`, useful for mapping a word back to a position in a flat
/// row-major buffer (e.g. the vector consumed by
/// [`super::Matrix::sign_of`](crate::matrix::Matrix::sign_of)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordWindow {
    /// Absolute index of this word in the matrix's backing storage.
    pub word_index: usize,
    /// Row this word belongs to.
    pub row: usize,
    /// Inclusive-start, exclusive-end column window covered by this word.
    pub col_start: usize,
    pub col_end: usize,
    /// Flat bit offsets `row * cols + col_start` / `row * cols + col_end`.
    pub global_start: usize,
    pub global_end: usize,
}
