// 2025 Steven Chiacchira
use std::error::Error;
use std::fmt;

/// Error arising from a [`parallel_for`] call.
pub enum ParallelForError<E> {
    /// `n` was negative.
    NegativeN { n: i64 },
    /// `p` was less than 1.
    InvalidP { p: i64 },
    /// One or more workers' callbacks returned an error. Each entry is
    /// `(worker_id, index, inner error)`, preserving enough causal context to tell
    /// one failing index apart from another.
    Callback(Vec<(usize, usize, E)>),
}

impl<E: fmt::Debug> Error for ParallelForError<E> {}

impl<E: fmt::Debug> fmt::Debug for ParallelForError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NegativeN { n } => f.debug_struct("NegativeN").field("n", n).finish(),
            Self::InvalidP { p } => f.debug_struct("InvalidP").field("p", p).finish(),
            Self::Callback(errs) => f.debug_tuple("Callback").field(errs).finish(),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for ParallelForError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NegativeN { n } => write!(f, "n must be >= 0, got {n}"),
            Self::InvalidP { p } => write!(f, "p must be >= 1, got {p}"),
            Self::Callback(errs) => {
                write!(f, "{} worker callback(s) failed: ", errs.len())?;
                for (worker_id, index, e) in errs {
                    write!(f, "(worker {worker_id}, index {index}: {e:?}) ")?;
                }
                Ok(())
            }
        }
    }
}

/// Partitions `[0, n)` into `p` contiguous, ascending ranges: the first `n % p`
/// partitions get `n / p + 1` indices, the rest get `n / p`.
fn partition(n: usize, p: usize) -> Vec<(usize, usize)> {
    let q = n / p;
    let r = n % p;
    let mut ranges = Vec::with_capacity(p);
    let mut start = 0;
    for worker_id in 0..p {
        let len = if worker_id < r { q + 1 } else { q };
        ranges.push((start, start + len));
        start += len;
    }
    ranges
}

/// Runs `f(worker_id, index)` for every `index` in `[0, n)`, split across `p`
/// scoped worker threads.
///
/// `n` and `p` are taken as `i64` so a caller passing a negative `n` surfaces
/// [`ParallelForError::NegativeN`] instead of panicking on an `as usize` wraparound.
/// `p` is clamped to `min(p, n)` once both are known valid. Within a worker, the
/// first error `f` returns stops that worker; other workers run to completion
/// regardless. All recorded errors are returned together, never just the first.
pub fn parallel_for<F, E>(n: i64, p: i64, f: F) -> Result<(), ParallelForError<E>>
where
    F: Fn(usize, usize) -> Result<(), E> + Sync,
    E: Send,
{
    if n < 0 {
        tracing::trace!(n, "negative n passed to parallel_for");
        return Err(ParallelForError::NegativeN { n });
    }
    if p < 1 {
        tracing::trace!(p, "invalid p passed to parallel_for");
        return Err(ParallelForError::InvalidP { p });
    }

    let n = n as usize;
    if n == 0 {
        return Ok(());
    }
    let p = (p as usize).min(n);

    let ranges = partition(n, p);
    let mut errors: Vec<(usize, usize, E)> = Vec::new();

    std::thread::scope(|scope| {
        let handles: Vec<_> = ranges
            .into_iter()
            .enumerate()
            .map(|(worker_id, (start, end))| {
                let f = &f;
                scope.spawn(move || {
                    let mut worker_errors = Vec::new();
                    for index in start..end {
                        if let Err(e) = f(worker_id, index) {
                            worker_errors.push((worker_id, index, e));
                            break;
                        }
                    }
                    worker_errors
                })
            })
            .collect();

        for handle in handles {
            let worker_errors = handle.join().expect("parallel_for worker thread panicked");
            errors.extend(worker_errors);
        }
    });

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ParallelForError::Callback(errors))
    }
}
